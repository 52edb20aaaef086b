//! Consistency checks over the whole group state.

use cohort_store::KvStore;
use cohort_types::Dec;

use crate::keeper::GroupKeeper;
use crate::state::{self, IndexEntry};
use crate::types::ProposalStatus;
use crate::GroupError;

/// Verify that every group's total weight equals the sum of its members'
/// weights, that stored weights are positive, and that every primary row and
/// every secondary index entry agree with each other.
pub fn check_invariants(s: &dyn KvStore) -> Result<(), GroupError> {
    for group in state::all_groups(s)? {
        let mut sum = Dec::ZERO;
        for member in state::members_of(s, group.id)? {
            if !member.weight.is_positive() {
                return Err(GroupError::Invariant(format!(
                    "member {} of group {} has non-positive weight {}",
                    member.address, group.id, member.weight
                )));
            }
            if !state::member_index_exists(s, &member.address, group.id)? {
                return Err(GroupError::Invariant(format!(
                    "member {} of group {} missing from address index",
                    member.address, group.id
                )));
            }
            sum = sum.checked_add(member.weight)?;
        }
        if sum != group.total_weight {
            return Err(GroupError::Invariant(format!(
                "group {} total weight {} != member sum {}",
                group.id, group.total_weight, sum
            )));
        }
        if !state::group_admin_index_exists(s, &group)? {
            return Err(GroupError::Invariant(format!(
                "group {} missing from admin index",
                group.id
            )));
        }
    }

    for (group_id, member) in state::all_members(s)? {
        if state::get_group(s, group_id)?.is_none() {
            return Err(GroupError::Invariant(format!(
                "member {} belongs to unknown group {group_id}",
                member.address
            )));
        }
    }

    for policy in state::all_policies(s)? {
        if state::get_group(s, policy.group_id)?.is_none() {
            return Err(GroupError::Invariant(format!(
                "policy {} belongs to unknown group {}",
                policy.address, policy.group_id
            )));
        }
    }

    for proposal in state::all_proposals(s)? {
        if state::get_policy(s, &proposal.group_policy_address)?.is_none() {
            return Err(GroupError::Invariant(format!(
                "proposal {} targets unknown policy {}",
                proposal.id, proposal.group_policy_address
            )));
        }
        if proposal.status == ProposalStatus::Submitted
            && !state::pending_index_exists(s, &proposal)?
        {
            return Err(GroupError::Invariant(format!(
                "submitted proposal {} missing from pending index",
                proposal.id
            )));
        }
    }

    for vote in state::all_votes(s)? {
        if state::get_proposal(s, vote.proposal_id)?.is_none() {
            return Err(GroupError::Invariant(format!(
                "vote by {} on pruned or unknown proposal {}",
                vote.voter, vote.proposal_id
            )));
        }
        if !state::vote_index_exists(s, &vote.voter, vote.proposal_id)? {
            return Err(GroupError::Invariant(format!(
                "vote by {} on proposal {} missing from voter index",
                vote.voter, vote.proposal_id
            )));
        }
    }

    for entry in state::index_entries(s)? {
        check_index_entry(s, &entry)?;
    }
    Ok(())
}

fn check_index_entry(s: &dyn KvStore, entry: &IndexEntry) -> Result<(), GroupError> {
    let ok = match entry {
        IndexEntry::GroupByAdmin(admin, id) => {
            state::get_group(s, *id)?.is_some_and(|g| &g.admin == admin)
        }
        IndexEntry::MemberByAddr(addr, id) => state::get_member(s, *id, addr)?.is_some(),
        IndexEntry::PolicyByGroup(id, addr) => {
            state::get_policy(s, addr)?.is_some_and(|p| p.group_id == *id)
        }
        IndexEntry::PolicyByAdmin(admin, addr) => {
            state::get_policy(s, addr)?.is_some_and(|p| &p.admin == admin)
        }
        IndexEntry::ProposalByPolicy(addr, id) => {
            state::get_proposal(s, *id)?.is_some_and(|p| &p.group_policy_address == addr)
        }
        IndexEntry::ProposalByVpEnd(end, id) => {
            state::get_proposal(s, *id)?.is_some_and(|p| p.voting_period_end == *end)
        }
        IndexEntry::PendingByVpEnd(end, id) => state::get_proposal(s, *id)?.is_some_and(|p| {
            p.voting_period_end == *end && p.status == ProposalStatus::Submitted
        }),
        IndexEntry::VoteByVoter(voter, id) => state::get_vote(s, *id, voter)?.is_some(),
    };
    if !ok {
        return Err(GroupError::Invariant(format!("dangling index entry {entry:?}")));
    }
    Ok(())
}

impl<S: KvStore> GroupKeeper<S> {
    pub fn check_invariants(&self) -> Result<(), GroupError> {
        check_invariants(self.store())
    }
}
