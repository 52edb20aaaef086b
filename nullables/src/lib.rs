//! Nullable infrastructure for deterministic testing.
//!
//! Test-friendly stand-ins for everything the group keeper touches from the
//! outside world. They:
//! - return deterministic values
//! - can be controlled programmatically
//! - never touch the filesystem or network
//!
//! Usage: build a `GroupKeeper` over a [`NullStore`], register [`NullBank`]
//! on its router, and drive time with a [`NullClock`].

pub mod bank;
pub mod clock;
pub mod store;

pub use bank::{NullBank, SendPayload};
pub use clock::NullClock;
pub use store::NullStore;

use cohort_types::Address;

/// A well-formed address derived from a single seed byte.
pub fn test_address(seed: u8) -> Address {
    Address::from_key(&[seed; 32])
}
