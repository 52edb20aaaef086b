//! Proposal submission, withdrawal and voting.

use cohort_store::KvStore;
use cohort_types::{ProposalId, Timestamp};
use tracing::info;

use super::exec::try_exec;
use super::{GroupKeeper, OpContext};
use crate::action::ActionError;
use crate::events::GroupEvent;
use crate::msgs::{Exec, MsgSubmitProposal, MsgVote, MsgWithdrawProposal};
use crate::state::{self, Sequence};
use crate::tally::tally_and_update;
use crate::types::{
    ExecutorResult, GroupPolicyInfo, Proposal, ProposalStatus, TallyResult, Vote, VoteOption,
};
use crate::GroupError;

impl<S: KvStore> GroupKeeper<S> {
    /// Submit a proposal against a policy account. Returns the proposal id.
    ///
    /// With [`Exec::Try`], the first proposer immediately votes YES and the
    /// proposal is executed if that vote makes it ACCEPTED.
    pub fn submit_proposal(
        &mut self,
        msg: MsgSubmitProposal,
        now: Timestamp,
    ) -> Result<ProposalId, GroupError> {
        self.apply("submit_proposal", |ctx| {
            let id = submit(ctx, &msg, now)?;
            if msg.exec == Exec::Try {
                if let Some(first) = msg.proposers.first() {
                    let vote = MsgVote {
                        proposal_id: id,
                        voter: first.clone(),
                        option: VoteOption::Yes,
                        metadata: String::new(),
                        exec: Exec::Try,
                    };
                    vote_on(ctx, &vote, now)?;
                }
            }
            Ok(id)
        })
    }

    /// Withdraw a SUBMITTED proposal. Allowed for any proposer, the policy
    /// admin, or the policy account itself.
    pub fn withdraw_proposal(&mut self, msg: MsgWithdrawProposal) -> Result<(), GroupError> {
        self.apply("withdraw_proposal", |ctx| {
            let mut proposal = state::load_proposal(&ctx.store, msg.proposal_id)?;
            if proposal.status != ProposalStatus::Submitted {
                return Err(GroupError::WithdrawClosed(proposal.status));
            }
            let policy = state::load_policy(&ctx.store, &proposal.group_policy_address)?;
            let allowed = msg.address == policy.address
                || msg.address == policy.admin
                || proposal.proposers.contains(&msg.address);
            if !allowed {
                return Err(GroupError::unauthorized(format!(
                    "{} is neither a proposer nor the group policy admin",
                    msg.address
                )));
            }

            proposal.status = ProposalStatus::Withdrawn;
            state::save_proposal(&mut ctx.store, &proposal)?;
            ctx.emit(GroupEvent::WithdrawProposal {
                proposal_id: proposal.id,
            });
            info!(proposal_id = %proposal.id, by = %msg.address, "proposal withdrawn");
            Ok(())
        })
    }

    /// Cast a vote, then re-tally. With [`Exec::Try`] the proposal is also
    /// executed if the vote made it ACCEPTED.
    pub fn vote(&mut self, msg: MsgVote, now: Timestamp) -> Result<(), GroupError> {
        self.apply("vote", |ctx| vote_on(ctx, &msg, now))
    }
}

fn submit(
    ctx: &mut OpContext<'_>,
    msg: &MsgSubmitProposal,
    now: Timestamp,
) -> Result<ProposalId, GroupError> {
    msg.validate_basic()?;
    ctx.check_metadata("proposal metadata", &msg.metadata)?;

    let policy = state::load_policy(&ctx.store, &msg.group_policy_address)?;
    let group = state::load_group(&ctx.store, policy.group_id)?;

    for proposer in &msg.proposers {
        if state::get_member(&ctx.store, group.id, proposer)?.is_none() {
            return Err(GroupError::NotMember {
                address: proposer.clone(),
                group: group.id,
            });
        }
    }
    check_action_signers(ctx, msg, &policy)?;

    let voting_period_end = now.checked_add_secs(policy.decision_policy.voting_period())?;
    let id = ProposalId(state::next_sequence(&mut ctx.store, Sequence::Proposal)?);
    let proposal = Proposal {
        id,
        group_policy_address: policy.address.clone(),
        metadata: msg.metadata.clone(),
        proposers: msg.proposers.clone(),
        submit_time: now,
        group_version: group.version,
        group_policy_version: policy.version,
        status: ProposalStatus::Submitted,
        final_tally_result: TallyResult::default(),
        voting_period_end,
        executor_result: ExecutorResult::NotRun,
        actions: msg.actions.clone(),
    };
    state::save_proposal(&mut ctx.store, &proposal)?;

    ctx.emit(GroupEvent::SubmitProposal { proposal_id: id });
    info!(
        proposal_id = %id,
        policy = %policy.address,
        actions = proposal.actions.len(),
        voting_period_end = %voting_period_end,
        "proposal submitted"
    );
    Ok(id)
}

/// Every action must be authorized by the policy account and nobody else.
fn check_action_signers(
    ctx: &OpContext<'_>,
    msg: &MsgSubmitProposal,
    policy: &GroupPolicyInfo,
) -> Result<(), GroupError> {
    for (i, action) in msg.actions.iter().enumerate() {
        let signers = ctx.router.required_signers(action).map_err(|e| match e {
            ActionError::UnknownRoute(url) => GroupError::UnknownAction(url),
            other => GroupError::Action(other),
        })?;
        if signers.len() != 1 || signers[0] != policy.address {
            return Err(GroupError::invalid(format!(
                "action {i} ({}) must be authorized by the group policy account {} alone",
                action.type_url, policy.address
            )));
        }
    }
    Ok(())
}

fn vote_on(
    ctx: &mut OpContext<'_>,
    msg: &MsgVote,
    now: Timestamp,
) -> Result<(), GroupError> {
    msg.validate_basic()?;
    ctx.check_metadata("vote metadata", &msg.metadata)?;

    let mut proposal = state::load_proposal(&ctx.store, msg.proposal_id)?;
    if proposal.status != ProposalStatus::Submitted {
        return Err(GroupError::ProposalClosed {
            id: proposal.id,
            status: proposal.status,
        });
    }
    if now >= proposal.voting_period_end {
        return Err(GroupError::VotingPeriodEnded(proposal.id));
    }

    let policy = state::load_policy(&ctx.store, &proposal.group_policy_address)?;
    let group = state::load_group(&ctx.store, policy.group_id)?;
    if state::get_member(&ctx.store, group.id, &msg.voter)?.is_none() {
        return Err(GroupError::NotMember {
            address: msg.voter.clone(),
            group: group.id,
        });
    }
    if state::get_vote(&ctx.store, proposal.id, &msg.voter)?.is_some() {
        return Err(GroupError::AlreadyVoted(msg.voter.clone()));
    }

    let vote = Vote {
        proposal_id: proposal.id,
        voter: msg.voter.clone(),
        option: msg.option,
        metadata: msg.metadata.clone(),
        submit_time: now,
    };
    state::save_vote(&mut ctx.store, &vote)?;
    ctx.emit(GroupEvent::Vote {
        proposal_id: proposal.id,
    });

    if tally_and_update(&ctx.store, &mut proposal, &group, &policy, now)? {
        state::save_proposal(&mut ctx.store, &proposal)?;
        emit_finalized(ctx, &proposal);
    }

    if msg.exec == Exec::Try && proposal.status == ProposalStatus::Accepted {
        try_exec(ctx, proposal, &policy, now)?;
    }
    Ok(())
}

pub(super) fn emit_finalized(ctx: &mut OpContext<'_>, proposal: &Proposal) {
    ctx.emit(GroupEvent::ProposalFinalized {
        proposal_id: proposal.id,
        status: proposal.status,
        tally: proposal.final_tally_result,
    });
    info!(
        proposal_id = %proposal.id,
        status = %proposal.status,
        yes = %proposal.final_tally_result.yes_count,
        "proposal finalized"
    );
}
