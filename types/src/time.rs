//! Timestamp type used throughout the engine.
//!
//! Timestamps are Unix epoch seconds (UTC) supplied by the host. The engine
//! never reads a wall clock while processing an operation; the host passes
//! `now` explicitly so that replaying the same operations gives the same
//! state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::TypesError;

/// A Unix timestamp in seconds since epoch (UTC).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The epoch (time zero).
    pub const EPOCH: Self = Self(0);

    pub fn new(secs: u64) -> Self {
        Self(secs)
    }

    /// Read the system clock. Hosts use this to stamp a processing cycle;
    /// engine code only ever receives the resulting value.
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Seconds elapsed since this timestamp (relative to `now`), zero if `now` is earlier.
    pub fn elapsed_since(&self, now: Timestamp) -> u64 {
        now.0.saturating_sub(self.0)
    }

    /// Whether this timestamp + duration has passed relative to `now`.
    pub fn has_expired(&self, duration_secs: u64, now: Timestamp) -> bool {
        now.0 >= self.0.saturating_add(duration_secs)
    }

    /// This timestamp shifted forward by `secs`.
    pub fn checked_add_secs(&self, secs: u64) -> Result<Timestamp, TypesError> {
        self.0
            .checked_add(secs)
            .map(Self)
            .ok_or(TypesError::TimestampOverflow)
    }

    /// Big-endian bytes, so that byte order equals time order in key encodings.
    pub fn to_be_bytes(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_expired_is_inclusive() {
        let t = Timestamp::new(100);
        assert!(!t.has_expired(10, Timestamp::new(109)));
        assert!(t.has_expired(10, Timestamp::new(110)));
    }

    #[test]
    fn test_checked_add_overflow() {
        assert!(Timestamp::new(u64::MAX).checked_add_secs(1).is_err());
        assert_eq!(Timestamp::new(1).checked_add_secs(2).unwrap(), Timestamp::new(3));
    }
}
