//! Typed events emitted by successful operations.

use cohort_types::{Address, GroupId, ProposalId};
use serde::{Deserialize, Serialize};

use crate::types::{ExecutorResult, ProposalStatus, TallyResult};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupEvent {
    CreateGroup { group_id: GroupId },
    UpdateGroup { group_id: GroupId },
    CreateGroupPolicy { address: Address },
    UpdateGroupPolicy { address: Address },
    SubmitProposal { proposal_id: ProposalId },
    WithdrawProposal { proposal_id: ProposalId },
    Vote { proposal_id: ProposalId },
    /// A tally moved the proposal out of SUBMITTED.
    ProposalFinalized {
        proposal_id: ProposalId,
        status: ProposalStatus,
        tally: TallyResult,
    },
    Exec {
        proposal_id: ProposalId,
        result: ExecutorResult,
        /// Failure reason of the first failing action, if any.
        logs: Option<String>,
    },
    LeaveGroup { group_id: GroupId, address: Address },
}
