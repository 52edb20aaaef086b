//! Weighted tally against live membership.

use cohort_store::KvStore;
use cohort_types::{GroupId, Timestamp};
use tracing::debug;

use crate::state;
use crate::types::{GroupInfo, GroupPolicyInfo, Proposal, ProposalStatus, TallyResult};
use crate::GroupError;

/// Sum the votes on `proposal`, weighting each voter by their *current*
/// weight in `group_id`. Voters who have since left the group count zero.
///
/// Reads only; calling it twice without intervening writes gives the same
/// result.
pub fn tally(
    s: &dyn KvStore,
    proposal: &Proposal,
    group_id: GroupId,
) -> Result<TallyResult, GroupError> {
    let mut result = TallyResult::default();
    for vote in state::votes_by_proposal(s, proposal.id)? {
        let Some(member) = state::get_member(s, group_id, &vote.voter)? else {
            continue;
        };
        result.add(vote.option, member.weight)?;
    }
    Ok(result)
}

/// Tally a SUBMITTED proposal and, if the policy judges the tally final,
/// move it to ACCEPTED or REJECTED. Returns whether the status changed.
///
/// Once `now` reaches the proposal's own voting period end the tally is
/// always final, even if the policy's window was lengthened afterwards.
pub(crate) fn tally_and_update(
    s: &dyn KvStore,
    proposal: &mut Proposal,
    group: &GroupInfo,
    policy: &GroupPolicyInfo,
    now: Timestamp,
) -> Result<bool, GroupError> {
    if proposal.status != ProposalStatus::Submitted {
        return Ok(false);
    }
    let result = tally(s, proposal, group.id)?;
    let elapsed = if now >= proposal.voting_period_end {
        u64::MAX
    } else {
        proposal.submit_time.elapsed_since(now)
    };
    let verdict = policy
        .decision_policy
        .allow(&result, group.total_weight, elapsed)?;
    debug!(
        proposal_id = %proposal.id,
        yes = %result.yes_count,
        no = %result.no_count,
        abstain = %result.abstain_count,
        veto = %result.no_with_veto_count,
        total = %group.total_weight,
        is_final = verdict.is_final,
        "tallied proposal"
    );
    if !verdict.is_final {
        return Ok(false);
    }
    proposal.final_tally_result = result;
    proposal.status = if verdict.allow {
        ProposalStatus::Accepted
    } else {
        ProposalStatus::Rejected
    };
    Ok(true)
}
