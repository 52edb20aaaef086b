//! Execution of accepted proposals.
//!
//! All actions of a proposal run inside one nested [`CacheStore`] scope on
//! top of the operation's working copy. If every action succeeds the scope is
//! merged and the proposal is pruned together with its votes. If any action
//! fails the scope is dropped, the proposal records `Failure` and stays
//! stored so that a later `exec` can retry it.

use cohort_store::{CacheStore, KvStore};
use cohort_types::Timestamp;
use tracing::{debug, info, warn};

use super::proposal::emit_finalized;
use super::{GroupKeeper, OpContext};
use crate::events::GroupEvent;
use crate::msgs::MsgExec;
use crate::state;
use crate::tally::tally_and_update;
use crate::types::{ExecutorResult, GroupPolicyInfo, Proposal, ProposalStatus};
use crate::GroupError;

impl<S: KvStore> GroupKeeper<S> {
    /// Execute a proposal.
    ///
    /// A SUBMITTED proposal is tallied first; if it does not become ACCEPTED
    /// the call returns `NotRun` and keeps the tally's status change. A
    /// REJECTED proposal also returns `NotRun` and is left untouched, so the
    /// call gives the same answer before and after finalization. WITHDRAWN
    /// proposals cannot be executed.
    pub fn exec(&mut self, msg: MsgExec, now: Timestamp) -> Result<ExecutorResult, GroupError> {
        self.apply("exec", |ctx| {
            let mut proposal = state::load_proposal(&ctx.store, msg.proposal_id)?;
            let policy = state::load_policy(&ctx.store, &proposal.group_policy_address)?;

            match proposal.status {
                ProposalStatus::Submitted => {
                    let group = state::load_group(&ctx.store, policy.group_id)?;
                    if tally_and_update(&ctx.store, &mut proposal, &group, &policy, now)? {
                        state::save_proposal(&mut ctx.store, &proposal)?;
                        emit_finalized(ctx, &proposal);
                    }
                    if proposal.status != ProposalStatus::Accepted {
                        return Ok(ExecutorResult::NotRun);
                    }
                }
                ProposalStatus::Rejected => {
                    debug!(proposal_id = %proposal.id, "proposal rejected, nothing to run");
                    return Ok(ExecutorResult::NotRun);
                }
                ProposalStatus::Withdrawn => {
                    return Err(GroupError::InvalidState(format!(
                        "proposal {} is {}, cannot execute",
                        proposal.id, proposal.status
                    )));
                }
                ProposalStatus::Accepted => {}
            }

            if proposal.executor_result == ExecutorResult::Success {
                return Err(GroupError::InvalidState(format!(
                    "proposal {} was already executed",
                    proposal.id
                )));
            }
            check_window(ctx, &proposal, &policy, now)?;
            debug!(proposal_id = %proposal.id, executor = %msg.executor, "executing proposal");
            run(ctx, proposal)
        })
    }
}

/// Execute from a vote or a submission. Silently skipped when the proposal
/// is not yet, or no longer, executable.
pub(super) fn try_exec(
    ctx: &mut OpContext<'_>,
    proposal: Proposal,
    policy: &GroupPolicyInfo,
    now: Timestamp,
) -> Result<(), GroupError> {
    if let Err(reason) = check_window(ctx, &proposal, policy, now) {
        debug!(proposal_id = %proposal.id, %reason, "skipping execution");
        return Ok(());
    }
    run(ctx, proposal)?;
    Ok(())
}

/// `submit_time + min_execution_period <= now <= voting_period_end + max_execution_period`.
fn check_window(
    ctx: &OpContext<'_>,
    proposal: &Proposal,
    policy: &GroupPolicyInfo,
    now: Timestamp,
) -> Result<(), GroupError> {
    let earliest = proposal
        .submit_time
        .checked_add_secs(policy.decision_policy.min_execution_period())?;
    if now < earliest {
        return Err(GroupError::InvalidState(format!(
            "must wait until {earliest} to execute proposal {}",
            proposal.id
        )));
    }
    let deadline = proposal
        .voting_period_end
        .checked_add_secs(ctx.config.max_execution_period_secs)?;
    if now > deadline {
        return Err(GroupError::InvalidState(format!(
            "proposal {} expired at {deadline}",
            proposal.id
        )));
    }
    Ok(())
}

fn run(ctx: &mut OpContext<'_>, mut proposal: Proposal) -> Result<ExecutorResult, GroupError> {
    let outcome = {
        let mut scope = CacheStore::new(&ctx.store);
        let mut failure = None;
        for (i, action) in proposal.actions.iter().enumerate() {
            if let Err(e) = ctx.router.dispatch(&mut scope, action) {
                failure = Some(format!("action {i} ({}): {e}", action.type_url));
                break;
            }
        }
        match failure {
            None => Ok(scope.into_batch()),
            Some(reason) => Err(reason),
        }
    };

    match outcome {
        Ok(batch) => {
            ctx.store.write_batch(batch)?;
            proposal.executor_result = ExecutorResult::Success;
            let pruned_votes = state::delete_votes(&mut ctx.store, proposal.id)?;
            state::delete_proposal(&mut ctx.store, &proposal)?;
            ctx.emit(GroupEvent::Exec {
                proposal_id: proposal.id,
                result: ExecutorResult::Success,
                logs: None,
            });
            info!(
                proposal_id = %proposal.id,
                actions = proposal.actions.len(),
                pruned_votes,
                "proposal executed and pruned"
            );
            Ok(ExecutorResult::Success)
        }
        Err(reason) => {
            proposal.executor_result = ExecutorResult::Failure;
            state::save_proposal(&mut ctx.store, &proposal)?;
            warn!(proposal_id = %proposal.id, %reason, "proposal execution failed");
            ctx.emit(GroupEvent::Exec {
                proposal_id: proposal.id,
                result: ExecutorResult::Failure,
                logs: Some(reason),
            });
            Ok(ExecutorResult::Failure)
        }
    }
}
