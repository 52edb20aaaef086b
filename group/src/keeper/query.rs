//! Read-only lookups. None of these touch the event log or the working copy.

use cohort_store::KvStore;
use cohort_types::{Address, GroupId, ProposalId, Timestamp};

use super::GroupKeeper;
use crate::state;
use crate::tally;
use crate::types::{
    GroupInfo, GroupMember, GroupPolicyInfo, Proposal, ProposalStatus, TallyResult, Vote,
};
use crate::GroupError;

impl<S: KvStore> GroupKeeper<S> {
    pub fn group_info(&self, id: GroupId) -> Result<GroupInfo, GroupError> {
        state::load_group(&self.store, id)
    }

    pub fn group_members(&self, id: GroupId) -> Result<Vec<GroupMember>, GroupError> {
        state::load_group(&self.store, id)?;
        Ok(state::members_of(&self.store, id)?
            .into_iter()
            .map(|member| GroupMember { group_id: id, member })
            .collect())
    }

    pub fn groups_by_admin(&self, admin: &Address) -> Result<Vec<GroupInfo>, GroupError> {
        state::group_ids_by_admin(&self.store, admin)?
            .into_iter()
            .map(|id| state::load_group(&self.store, id))
            .collect()
    }

    pub fn groups_by_member(&self, address: &Address) -> Result<Vec<GroupInfo>, GroupError> {
        state::group_ids_by_member(&self.store, address)?
            .into_iter()
            .map(|id| state::load_group(&self.store, id))
            .collect()
    }

    pub fn group_policy_info(&self, address: &Address) -> Result<GroupPolicyInfo, GroupError> {
        state::load_policy(&self.store, address)
    }

    pub fn group_policies_by_group(&self, id: GroupId) -> Result<Vec<GroupPolicyInfo>, GroupError> {
        state::policies_by_group(&self.store, id)
    }

    pub fn group_policies_by_admin(
        &self,
        admin: &Address,
    ) -> Result<Vec<GroupPolicyInfo>, GroupError> {
        state::policies_by_admin(&self.store, admin)
    }

    pub fn proposal(&self, id: ProposalId) -> Result<Proposal, GroupError> {
        state::load_proposal(&self.store, id)
    }

    pub fn proposals_by_group_policy(&self, address: &Address) -> Result<Vec<Proposal>, GroupError> {
        state::proposals_by_policy(&self.store, address)
    }

    /// Proposals whose voting period ends at or before `until`, earliest first.
    pub fn proposals_by_voting_period_end(
        &self,
        until: Timestamp,
    ) -> Result<Vec<Proposal>, GroupError> {
        state::proposal_ids_by_vp_end(&self.store, until)?
            .into_iter()
            .map(|id| state::load_proposal(&self.store, id))
            .collect()
    }

    pub fn vote_by_proposal_voter(
        &self,
        proposal: ProposalId,
        voter: &Address,
    ) -> Result<Vote, GroupError> {
        state::get_vote(&self.store, proposal, voter)?.ok_or_else(|| GroupError::VoteNotFound {
            proposal,
            voter: voter.clone(),
        })
    }

    /// Empty for unknown or pruned proposals.
    pub fn votes_by_proposal(&self, proposal: ProposalId) -> Result<Vec<Vote>, GroupError> {
        state::votes_by_proposal(&self.store, proposal)
    }

    pub fn votes_by_voter(&self, voter: &Address) -> Result<Vec<Vote>, GroupError> {
        state::votes_by_voter(&self.store, voter)
    }

    /// Live tally of a proposal against the group's current membership.
    pub fn tally_result(&self, id: ProposalId) -> Result<TallyResult, GroupError> {
        let proposal = state::load_proposal(&self.store, id)?;
        if proposal.status == ProposalStatus::Withdrawn {
            return Err(GroupError::InvalidState(format!(
                "cannot tally proposal {id} with status {}",
                proposal.status
            )));
        }
        let policy = state::load_policy(&self.store, &proposal.group_policy_address)?;
        tally::tally(&self.store, &proposal, policy.group_id)
    }
}
