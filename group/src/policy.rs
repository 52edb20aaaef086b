//! Decision policies: when is a tally decisive, and is it accepted?
//!
//! The variant set is closed. A policy is stored on its group policy account
//! as a tagged value and dispatched with a `match`.

use cohort_types::Dec;
use serde::{Deserialize, Serialize};

use crate::config::GroupConfig;
use crate::types::TallyResult;
use crate::GroupError;

/// Time windows shared by every policy variant, in seconds from submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionPolicyWindows {
    /// How long votes are accepted.
    pub voting_period_secs: u64,
    /// How long before an accepted proposal may first be executed.
    pub min_execution_period_secs: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionPolicy {
    /// Accept once YES weight reaches a fixed amount.
    Threshold {
        threshold: Dec,
        windows: DecisionPolicyWindows,
    },
    /// Accept once YES weight reaches a fraction of the group's current
    /// total weight.
    Percentage {
        percentage: Dec,
        windows: DecisionPolicyWindows,
    },
}

/// Verdict of [`DecisionPolicy::allow`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecisionPolicyResult {
    /// Whether the proposal passes. Only meaningful when `is_final`.
    pub allow: bool,
    /// Whether further votes can no longer change the outcome.
    pub is_final: bool,
}

impl DecisionPolicyResult {
    const PENDING: Self = Self { allow: false, is_final: false };
    const ACCEPTED: Self = Self { allow: true, is_final: true };
    const REJECTED: Self = Self { allow: false, is_final: true };
}

impl DecisionPolicy {
    /// Threshold policy from a decimal string; the threshold must be positive.
    pub fn threshold(
        threshold: &str,
        voting_period_secs: u64,
        min_execution_period_secs: u64,
    ) -> Result<Self, GroupError> {
        let policy = Self::Threshold {
            threshold: Dec::parse_positive(threshold)?,
            windows: DecisionPolicyWindows {
                voting_period_secs,
                min_execution_period_secs,
            },
        };
        policy.validate_basic()?;
        Ok(policy)
    }

    /// Percentage policy from a decimal string in `(0, 1]`.
    pub fn percentage(
        percentage: &str,
        voting_period_secs: u64,
        min_execution_period_secs: u64,
    ) -> Result<Self, GroupError> {
        let policy = Self::Percentage {
            percentage: Dec::parse(percentage)?,
            windows: DecisionPolicyWindows {
                voting_period_secs,
                min_execution_period_secs,
            },
        };
        policy.validate_basic()?;
        Ok(policy)
    }

    pub fn windows(&self) -> &DecisionPolicyWindows {
        match self {
            Self::Threshold { windows, .. } | Self::Percentage { windows, .. } => windows,
        }
    }

    pub fn voting_period(&self) -> u64 {
        self.windows().voting_period_secs
    }

    pub fn min_execution_period(&self) -> u64 {
        self.windows().min_execution_period_secs
    }

    /// Structural checks that need no context.
    pub fn validate_basic(&self) -> Result<(), GroupError> {
        match self {
            Self::Threshold { threshold, .. } => {
                if !threshold.is_positive() {
                    return Err(GroupError::InvalidPolicy(format!(
                        "threshold must be positive, got {threshold}"
                    )));
                }
            }
            Self::Percentage { percentage, .. } => {
                if !percentage.is_positive() || *percentage > Dec::ONE {
                    return Err(GroupError::InvalidPolicy(
                        "percentage must be > 0 and <= 1".into(),
                    ));
                }
            }
        }
        if self.voting_period() == 0 {
            return Err(GroupError::InvalidPolicy(
                "voting period must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Full validation before the policy is attached to a group.
    ///
    /// A threshold above the group's current total weight is accepted: the
    /// policy is merely unreachable until members are added.
    pub fn validate(&self, config: &GroupConfig) -> Result<(), GroupError> {
        self.validate_basic()?;
        let latest_exec = self
            .voting_period()
            .saturating_add(config.max_execution_period_secs);
        if self.min_execution_period() > latest_exec {
            return Err(GroupError::InvalidPolicy(format!(
                "min execution period {}s exceeds voting period plus max execution period ({latest_exec}s)",
                self.min_execution_period()
            )));
        }
        Ok(())
    }

    /// Judge a tally.
    ///
    /// `total_power` is the group's current total weight and `voting_elapsed`
    /// the seconds since submission. The tally is final once the threshold is
    /// met, once even an all-YES remainder could not reach it, or once the
    /// voting period has elapsed.
    pub fn allow(
        &self,
        tally: &TallyResult,
        total_power: Dec,
        voting_elapsed: u64,
    ) -> Result<DecisionPolicyResult, GroupError> {
        let threshold = match self {
            Self::Threshold { threshold, .. } => *threshold,
            Self::Percentage { percentage, .. } => {
                if total_power.is_zero() {
                    return Ok(DecisionPolicyResult::REJECTED);
                }
                percentage.checked_mul(total_power)?
            }
        };

        if tally.yes_count >= threshold {
            return Ok(DecisionPolicyResult::ACCEPTED);
        }

        let undecided = total_power.saturating_sub(tally.total_counts()?);
        if tally.yes_count.checked_add(undecided)? < threshold {
            return Ok(DecisionPolicyResult::REJECTED);
        }

        if voting_elapsed >= self.voting_period() {
            return Ok(DecisionPolicyResult::REJECTED);
        }
        Ok(DecisionPolicyResult::PENDING)
    }
}
