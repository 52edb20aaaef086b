//! Fundamental types for the cohort governance engine.
//!
//! This crate defines the value types shared across every other crate in the
//! workspace: addresses, exact decimals, timestamps and sequential ids.

pub mod address;
pub mod decimal;
pub mod error;
pub mod id;
pub mod time;

pub use address::{blake2b_256, blake2b_256_multi, validate_address, Address};
pub use decimal::Dec;
pub use error::TypesError;
pub use id::{GroupId, ProposalId};
pub use time::Timestamp;
