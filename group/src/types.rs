//! Stored entities: groups, members, policies, proposals and votes.

use cohort_types::{Address, Dec, GroupId, ProposalId, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::action::Action;
use crate::policy::DecisionPolicy;
use crate::GroupError;

/// A weighted set of members under an admin.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupInfo {
    pub id: GroupId,
    pub admin: Address,
    pub metadata: String,
    /// Bumped on every admin, metadata or membership change.
    pub version: u64,
    /// Always equal to the sum of the current members' weights.
    pub total_weight: Dec,
    pub created_at: Timestamp,
}

/// One weighted member of a group. Stored only while `weight > 0`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub address: Address,
    pub weight: Dec,
    pub metadata: String,
    pub added_at: Timestamp,
}

/// A member together with the group it belongs to (query results, genesis).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    pub group_id: GroupId,
    pub member: Member,
}

/// An addressable account bound to a group and a decision policy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupPolicyInfo {
    /// Derived at creation and never changed.
    pub address: Address,
    pub group_id: GroupId,
    pub admin: Address,
    pub metadata: String,
    pub version: u64,
    pub decision_policy: DecisionPolicy,
    pub created_at: Timestamp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalStatus {
    Submitted,
    Accepted,
    Rejected,
    Withdrawn,
}

impl ProposalStatus {
    pub fn is_final(&self) -> bool {
        !matches!(self, Self::Submitted)
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Submitted => "SUBMITTED",
            Self::Accepted => "ACCEPTED",
            Self::Rejected => "REJECTED",
            Self::Withdrawn => "WITHDRAWN",
        };
        f.write_str(s)
    }
}

/// Outcome of the last attempt to run an accepted proposal's actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutorResult {
    NotRun,
    Success,
    /// Not terminal: the proposal may be executed again.
    Failure,
}

impl fmt::Display for ExecutorResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotRun => "NOT_RUN",
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub group_policy_address: Address,
    pub metadata: String,
    pub proposers: Vec<Address>,
    pub submit_time: Timestamp,
    /// Group version at submission. Informational only.
    pub group_version: u64,
    /// Policy version at submission. Informational only.
    pub group_policy_version: u64,
    pub status: ProposalStatus,
    /// Zero until the proposal reaches a final status through a tally.
    pub final_tally_result: TallyResult,
    pub voting_period_end: Timestamp,
    pub executor_result: ExecutorResult,
    pub actions: Vec<Action>,
}

/// A ballot choice. `Unspecified` is never accepted in a vote.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteOption {
    Unspecified,
    Yes,
    Abstain,
    No,
    NoWithVeto,
}

impl TryFrom<i32> for VoteOption {
    type Error = GroupError;

    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Self::Unspecified),
            1 => Ok(Self::Yes),
            2 => Ok(Self::Abstain),
            3 => Ok(Self::No),
            4 => Ok(Self::NoWithVeto),
            other => Err(GroupError::invalid(format!("unknown vote option {other}"))),
        }
    }
}

impl fmt::Display for VoteOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unspecified => "UNSPECIFIED",
            Self::Yes => "YES",
            Self::Abstain => "ABSTAIN",
            Self::No => "NO",
            Self::NoWithVeto => "NO_WITH_VETO",
        };
        f.write_str(s)
    }
}

/// A cast vote. Unique per (proposal, voter) and never modified.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub proposal_id: ProposalId,
    pub voter: Address,
    pub option: VoteOption,
    pub metadata: String,
    pub submit_time: Timestamp,
}

/// Weighted sum of votes per option.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyResult {
    pub yes_count: Dec,
    pub abstain_count: Dec,
    pub no_count: Dec,
    pub no_with_veto_count: Dec,
}

impl TallyResult {
    /// Add `weight` to the bucket for `option`.
    pub fn add(&mut self, option: VoteOption, weight: Dec) -> Result<(), GroupError> {
        let bucket = match option {
            VoteOption::Yes => &mut self.yes_count,
            VoteOption::Abstain => &mut self.abstain_count,
            VoteOption::No => &mut self.no_count,
            VoteOption::NoWithVeto => &mut self.no_with_veto_count,
            VoteOption::Unspecified => {
                return Err(GroupError::invalid("vote option unspecified"));
            }
        };
        *bucket = bucket.checked_add(weight)?;
        Ok(())
    }

    /// Weight cast across every option.
    pub fn total_counts(&self) -> Result<Dec, GroupError> {
        Ok(self
            .yes_count
            .checked_add(self.abstain_count)?
            .checked_add(self.no_count)?
            .checked_add(self.no_with_veto_count)?)
    }
}
