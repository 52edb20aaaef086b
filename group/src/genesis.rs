//! Full-state export and import.
//!
//! A [`GenesisState`] captures every table and sequence. It round-trips
//! through JSON, so a host can snapshot one keeper and boot another from it.

use cohort_store::KvStore;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::invariants::check_invariants;
use crate::keeper::GroupKeeper;
use crate::state::{self, Sequence};
use crate::types::{GroupInfo, GroupMember, GroupPolicyInfo, Proposal, Vote};
use crate::GroupError;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisState {
    pub group_seq: u64,
    pub groups: Vec<GroupInfo>,
    pub group_members: Vec<GroupMember>,
    pub group_policy_seq: u64,
    pub group_policies: Vec<GroupPolicyInfo>,
    pub proposal_seq: u64,
    pub proposals: Vec<Proposal>,
    pub votes: Vec<Vote>,
}

impl GenesisState {
    pub fn to_json(&self) -> Result<String, GroupError> {
        serde_json::to_string_pretty(self).map_err(|e| GroupError::Codec(e.to_string()))
    }

    pub fn from_json(raw: &str) -> Result<Self, GroupError> {
        serde_json::from_str(raw).map_err(|e| GroupError::Codec(e.to_string()))
    }

    /// Sequences must be at least the largest id they have handed out.
    fn check_sequences(&self) -> Result<(), GroupError> {
        if let Some(max) = self.groups.iter().map(|g| g.id.raw()).max() {
            if self.group_seq < max {
                return Err(GroupError::Invariant(format!(
                    "group sequence {} below highest group id {max}",
                    self.group_seq
                )));
            }
        }
        if let Some(max) = self.proposals.iter().map(|p| p.id.raw()).max() {
            if self.proposal_seq < max {
                return Err(GroupError::Invariant(format!(
                    "proposal sequence {} below highest proposal id {max}",
                    self.proposal_seq
                )));
            }
        }
        if self.group_policy_seq < self.group_policies.len() as u64 {
            return Err(GroupError::Invariant(format!(
                "policy account sequence {} below policy count {}",
                self.group_policy_seq,
                self.group_policies.len()
            )));
        }
        Ok(())
    }
}

impl<S: KvStore> GroupKeeper<S> {
    pub fn export_genesis(&self) -> Result<GenesisState, GroupError> {
        let s = self.store();
        Ok(GenesisState {
            group_seq: state::get_sequence(s, Sequence::Group)?,
            groups: state::all_groups(s)?,
            group_members: state::all_members(s)?
                .into_iter()
                .map(|(group_id, member)| GroupMember { group_id, member })
                .collect(),
            group_policy_seq: state::get_sequence(s, Sequence::PolicyAccount)?,
            group_policies: state::all_policies(s)?,
            proposal_seq: state::get_sequence(s, Sequence::Proposal)?,
            proposals: state::all_proposals(s)?,
            votes: state::all_votes(s)?,
        })
    }

    /// Load `genesis` into an empty keeper. Nothing is written unless the
    /// resulting state passes [`check_invariants`].
    pub fn init_genesis(&mut self, genesis: GenesisState) -> Result<(), GroupError> {
        self.apply("init_genesis", |ctx| {
            if !state::all_groups(&ctx.store)?.is_empty()
                || state::get_sequence(&ctx.store, Sequence::Group)? != 0
            {
                return Err(GroupError::InvalidState(
                    "genesis requires an empty store".into(),
                ));
            }
            genesis.check_sequences()?;

            state::set_sequence(&mut ctx.store, Sequence::Group, genesis.group_seq)?;
            state::set_sequence(&mut ctx.store, Sequence::PolicyAccount, genesis.group_policy_seq)?;
            state::set_sequence(&mut ctx.store, Sequence::Proposal, genesis.proposal_seq)?;
            for group in &genesis.groups {
                state::save_group(&mut ctx.store, group)?;
            }
            for gm in &genesis.group_members {
                state::save_member(&mut ctx.store, gm.group_id, &gm.member)?;
            }
            for policy in &genesis.group_policies {
                state::save_policy(&mut ctx.store, policy)?;
            }
            for proposal in &genesis.proposals {
                state::save_proposal(&mut ctx.store, proposal)?;
            }
            for vote in &genesis.votes {
                state::save_vote(&mut ctx.store, vote)?;
            }

            check_invariants(&ctx.store)?;
            info!(
                groups = genesis.groups.len(),
                policies = genesis.group_policies.len(),
                proposals = genesis.proposals.len(),
                "genesis loaded"
            );
            Ok(())
        })
    }
}
