//! Operation requests.
//!
//! Every request carries a stateless `validate_basic` that the keeper runs
//! before touching the store. Addresses are typed, so their format is
//! already checked when the request is built.

use cohort_types::{Address, Dec, GroupId, ProposalId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::action::Action;
use crate::policy::DecisionPolicy;
use crate::types::VoteOption;
use crate::GroupError;

/// A member as written in a request. The weight stays a string until the
/// keeper parses it, so malformed input is reported rather than unrepresentable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRequest {
    pub address: Address,
    pub weight: String,
    pub metadata: String,
}

impl MemberRequest {
    pub fn new(address: Address, weight: impl Into<String>) -> Self {
        Self {
            address,
            weight: weight.into(),
            metadata: String::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: impl Into<String>) -> Self {
        self.metadata = metadata.into();
        self
    }
}

/// Whether to try executing right after the operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Exec {
    #[default]
    Unspecified,
    Try,
}

fn ensure_unique<'a>(
    addresses: impl IntoIterator<Item = &'a Address>,
    what: &str,
) -> Result<(), GroupError> {
    let mut seen = BTreeSet::new();
    for addr in addresses {
        if !seen.insert(addr) {
            return Err(GroupError::invalid(format!("duplicate {what} {addr}")));
        }
    }
    Ok(())
}

fn validate_new_members(members: &[MemberRequest]) -> Result<(), GroupError> {
    ensure_unique(members.iter().map(|m| &m.address), "member")?;
    for m in members {
        Dec::parse_positive(&m.weight)?;
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgCreateGroup {
    pub admin: Address,
    pub members: Vec<MemberRequest>,
    pub metadata: String,
}

impl MsgCreateGroup {
    pub fn validate_basic(&self) -> Result<(), GroupError> {
        validate_new_members(&self.members)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUpdateGroupMembers {
    pub admin: Address,
    pub group_id: GroupId,
    /// Weight `"0"` removes the member.
    pub member_updates: Vec<MemberRequest>,
}

impl MsgUpdateGroupMembers {
    pub fn validate_basic(&self) -> Result<(), GroupError> {
        if self.member_updates.is_empty() {
            return Err(GroupError::invalid("member updates cannot be empty"));
        }
        ensure_unique(self.member_updates.iter().map(|m| &m.address), "member")?;
        for m in &self.member_updates {
            Dec::parse_non_negative(&m.weight)?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUpdateGroupAdmin {
    pub admin: Address,
    pub group_id: GroupId,
    pub new_admin: Address,
}

impl MsgUpdateGroupAdmin {
    pub fn validate_basic(&self) -> Result<(), GroupError> {
        if self.admin == self.new_admin {
            return Err(GroupError::invalid("new and old admin are the same"));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUpdateGroupMetadata {
    pub admin: Address,
    pub group_id: GroupId,
    pub metadata: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgCreateGroupPolicy {
    pub admin: Address,
    pub group_id: GroupId,
    pub metadata: String,
    pub decision_policy: DecisionPolicy,
}

impl MsgCreateGroupPolicy {
    pub fn validate_basic(&self) -> Result<(), GroupError> {
        self.decision_policy.validate_basic()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgCreateGroupWithPolicy {
    pub admin: Address,
    pub members: Vec<MemberRequest>,
    pub group_metadata: String,
    pub group_policy_metadata: String,
    /// Make the new policy account the admin of both the group and itself.
    pub group_policy_as_admin: bool,
    pub decision_policy: DecisionPolicy,
}

impl MsgCreateGroupWithPolicy {
    pub fn validate_basic(&self) -> Result<(), GroupError> {
        validate_new_members(&self.members)?;
        self.decision_policy.validate_basic()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUpdateGroupPolicyAdmin {
    pub admin: Address,
    pub group_policy_address: Address,
    pub new_admin: Address,
}

impl MsgUpdateGroupPolicyAdmin {
    pub fn validate_basic(&self) -> Result<(), GroupError> {
        if self.admin == self.new_admin {
            return Err(GroupError::invalid("new and old admin are the same"));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUpdateGroupPolicyDecisionPolicy {
    pub admin: Address,
    pub group_policy_address: Address,
    pub decision_policy: DecisionPolicy,
}

impl MsgUpdateGroupPolicyDecisionPolicy {
    pub fn validate_basic(&self) -> Result<(), GroupError> {
        self.decision_policy.validate_basic()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUpdateGroupPolicyMetadata {
    pub admin: Address,
    pub group_policy_address: Address,
    pub metadata: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgLeaveGroup {
    pub address: Address,
    pub group_id: GroupId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSubmitProposal {
    pub group_policy_address: Address,
    pub proposers: Vec<Address>,
    pub metadata: String,
    pub actions: Vec<Action>,
    pub exec: Exec,
}

impl MsgSubmitProposal {
    pub fn validate_basic(&self) -> Result<(), GroupError> {
        if self.proposers.is_empty() {
            return Err(GroupError::invalid("proposers cannot be empty"));
        }
        ensure_unique(&self.proposers, "proposer")
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgWithdrawProposal {
    pub proposal_id: ProposalId,
    pub address: Address,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgVote {
    pub proposal_id: ProposalId,
    pub voter: Address,
    pub option: VoteOption,
    pub metadata: String,
    pub exec: Exec,
}

impl MsgVote {
    pub fn validate_basic(&self) -> Result<(), GroupError> {
        if self.option == VoteOption::Unspecified {
            return Err(GroupError::invalid("vote option unspecified"));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgExec {
    pub proposal_id: ProposalId,
    pub executor: Address,
}
