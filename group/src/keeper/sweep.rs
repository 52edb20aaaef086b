use cohort_store::KvStore;
use cohort_types::{ProposalId, Timestamp};
use tracing::debug;

use super::proposal::emit_finalized;
use super::GroupKeeper;
use crate::state;
use crate::tally::tally_and_update;
use crate::types::ProposalStatus;
use crate::GroupError;

impl<S: KvStore> GroupKeeper<S> {
    /// Maintenance pass, run by the host once per processing cycle.
    ///
    /// Finalizes every SUBMITTED proposal whose voting period has ended at or
    /// before `now`. Never deletes anything, and running it again over the
    /// same proposals changes nothing. Returns the ids it finalized.
    pub fn sweep(&mut self, now: Timestamp) -> Result<Vec<ProposalId>, GroupError> {
        self.apply("sweep", |ctx| {
            let mut finalized = Vec::new();
            for id in state::pending_ids_by_vp_end(&ctx.store, now)? {
                let mut proposal = state::load_proposal(&ctx.store, id)?;
                if proposal.status != ProposalStatus::Submitted {
                    continue;
                }
                let policy = state::load_policy(&ctx.store, &proposal.group_policy_address)?;
                let group = state::load_group(&ctx.store, policy.group_id)?;
                if tally_and_update(&ctx.store, &mut proposal, &group, &policy, now)? {
                    state::save_proposal(&mut ctx.store, &proposal)?;
                    emit_finalized(ctx, &proposal);
                    finalized.push(id);
                }
            }
            debug!(now = %now, finalized = finalized.len(), "sweep complete");
            Ok(finalized)
        })
    }
}
