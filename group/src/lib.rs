//! Group-based collective authority.
//!
//! Groups are weighted member sets owned by an admin. A group policy is an
//! account derived from the group that acts only through proposals: members
//! vote, the policy's decision rule tallies the weighted votes, and an
//! accepted proposal executes its actions atomically as the policy account.
//!
//! Lifecycle: SUBMITTED → ACCEPTED | REJECTED | WITHDRAWN. A proposal that
//! executes successfully is pruned together with its votes.
//!
//! All state goes through a [`cohort_store::KvStore`]; every operation either
//! commits as a whole or leaves the store untouched.

pub mod action;
pub mod config;
pub mod error;
pub mod events;
pub mod genesis;
pub mod invariants;
pub mod keeper;
pub mod msgs;
pub mod policy;
pub mod state;
pub mod tally;
pub mod types;

pub use action::{Action, ActionError, ActionHandler, Router};
pub use config::GroupConfig;
pub use error::{ErrorKind, GroupError};
pub use events::GroupEvent;
pub use genesis::GenesisState;
pub use invariants::check_invariants;
pub use keeper::GroupKeeper;
pub use msgs::*;
pub use policy::{DecisionPolicy, DecisionPolicyResult, DecisionPolicyWindows};
pub use types::*;
