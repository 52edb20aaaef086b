use cohort_store::StoreError;
use cohort_types::{Address, GroupId, ProposalId, TypesError};
use thiserror::Error;

use crate::action::ActionError;
use crate::types::ProposalStatus;

/// Coarse classification of a [`GroupError`], for hosts that map failures
/// onto their own status codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Unauthorized,
    InvalidArgument,
    InvalidState,
    Internal,
}

#[derive(Debug, Error)]
pub enum GroupError {
    #[error("group {0}: not found")]
    GroupNotFound(GroupId),

    #[error("group policy {0}: not found")]
    PolicyNotFound(Address),

    #[error("load proposal {0}: not found")]
    ProposalNotFound(ProposalId),

    #[error("vote by {voter} on proposal {proposal}: not found")]
    VoteNotFound { proposal: ProposalId, voter: Address },

    #[error("{0}: unauthorized")]
    Unauthorized(String),

    #[error("address {address} not part of group {group}")]
    NotMember { address: Address, group: GroupId },

    #[error("{field}: limit exceeded (max {max} bytes)")]
    MetadataTooLong { field: &'static str, max: usize },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Types(#[from] TypesError),

    #[error("invalid decision policy: {0}")]
    InvalidPolicy(String),

    #[error("unknown action type {0}")]
    UnknownAction(String),

    #[error("action: {0}")]
    Action(#[from] ActionError),

    #[error("cannot withdraw a proposal with the status of {0}")]
    WithdrawClosed(ProposalStatus),

    #[error("proposal {id} is {status}, not open for voting")]
    ProposalClosed { id: ProposalId, status: ProposalStatus },

    #[error("voting period for proposal {0} has ended")]
    VotingPeriodEnded(ProposalId),

    #[error("{0} has already voted on this proposal")]
    AlreadyVoted(Address),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("store: {0}")]
    Store(#[from] StoreError),

    #[error("codec: {0}")]
    Codec(String),

    #[error("invariant broken: {0}")]
    Invariant(String),
}

impl GroupError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::GroupNotFound(_)
            | Self::PolicyNotFound(_)
            | Self::ProposalNotFound(_)
            | Self::VoteNotFound { .. } => ErrorKind::NotFound,
            Self::Unauthorized(_) | Self::NotMember { .. } => ErrorKind::Unauthorized,
            Self::MetadataTooLong { .. }
            | Self::InvalidArgument(_)
            | Self::Types(_)
            | Self::InvalidPolicy(_)
            | Self::UnknownAction(_)
            | Self::Action(_)
            | Self::Config(_) => ErrorKind::InvalidArgument,
            Self::WithdrawClosed(_)
            | Self::ProposalClosed { .. }
            | Self::VotingPeriodEnded(_)
            | Self::AlreadyVoted(_)
            | Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::Store(_) | Self::Codec(_) | Self::Invariant(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

impl From<bincode::Error> for GroupError {
    fn from(e: bincode::Error) -> Self {
        Self::Codec(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(GroupError::GroupNotFound(GroupId(3)).kind(), ErrorKind::NotFound);
        assert_eq!(
            GroupError::unauthorized("not group admin").kind(),
            ErrorKind::Unauthorized
        );
        assert_eq!(
            GroupError::WithdrawClosed(ProposalStatus::Withdrawn).kind(),
            ErrorKind::InvalidState
        );
        assert_eq!(
            GroupError::Store(StoreError::Backend("io".into())).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_messages_carry_context() {
        let e = GroupError::WithdrawClosed(ProposalStatus::Withdrawn);
        assert_eq!(e.to_string(), "cannot withdraw a proposal with the status of WITHDRAWN");
        let e = GroupError::MetadataTooLong { field: "group metadata", max: 255 };
        assert!(e.to_string().contains("limit exceeded"));
        assert!(GroupError::ProposalNotFound(ProposalId(9))
            .to_string()
            .contains("not found"));
    }
}
