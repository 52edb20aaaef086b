//! The group keeper: every state-changing operation and every query.
//!
//! Each operation runs against a fresh [`CacheStore`] over the keeper's
//! store. The cache is committed as one [`cohort_store::WriteBatch`] only
//! when the operation returns `Ok`; on error it is dropped, so a failed
//! operation never leaves partial state behind. Events follow the same rule.
//!
//! The keeper never reads a clock. Operations that depend on time take the
//! host's `now`.

mod exec;
mod group;
mod policy;
mod proposal;
mod query;
mod sweep;

use cohort_store::{CacheStore, KvStore};
use cohort_types::{Address, GroupId};
use tracing::debug;

use crate::action::Router;
use crate::config::GroupConfig;
use crate::events::GroupEvent;
use crate::state;
use crate::types::{GroupInfo, GroupPolicyInfo};
use crate::GroupError;

pub struct GroupKeeper<S: KvStore> {
    store: S,
    router: Router,
    config: GroupConfig,
    events: Vec<GroupEvent>,
}

/// Working state of one in-flight operation.
pub(crate) struct OpContext<'a> {
    pub store: CacheStore<'a>,
    pub router: &'a Router,
    pub config: &'a GroupConfig,
    pub events: Vec<GroupEvent>,
}

impl OpContext<'_> {
    pub fn emit(&mut self, event: GroupEvent) {
        self.events.push(event);
    }

    pub fn check_metadata(&self, field: &'static str, metadata: &str) -> Result<(), GroupError> {
        let max = self.config.max_metadata_len;
        if metadata.len() > max {
            return Err(GroupError::MetadataTooLong { field, max });
        }
        Ok(())
    }

    pub fn load_group_as_admin(
        &self,
        id: GroupId,
        admin: &Address,
    ) -> Result<GroupInfo, GroupError> {
        let group = state::load_group(&self.store, id)?;
        if &group.admin != admin {
            return Err(GroupError::unauthorized("not group admin"));
        }
        Ok(group)
    }

    pub fn load_policy_as_admin(
        &self,
        address: &Address,
        admin: &Address,
    ) -> Result<GroupPolicyInfo, GroupError> {
        let policy = state::load_policy(&self.store, address)?;
        if &policy.admin != admin {
            return Err(GroupError::unauthorized("not group policy admin"));
        }
        Ok(policy)
    }
}

impl<S: KvStore> GroupKeeper<S> {
    pub fn new(store: S, router: Router, config: GroupConfig) -> Self {
        Self {
            store,
            router,
            config,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &GroupConfig {
        &self.config
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Direct access for the host, e.g. to seed balances a payload action
    /// will read. Writes made here bypass the keeper's validation.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Drain the events emitted by successful operations since the last call.
    pub fn take_events(&mut self) -> Vec<GroupEvent> {
        std::mem::take(&mut self.events)
    }

    /// Run `f` on an isolated working copy and commit it only on success.
    pub(crate) fn apply<T>(
        &mut self,
        op: &'static str,
        f: impl FnOnce(&mut OpContext<'_>) -> Result<T, GroupError>,
    ) -> Result<T, GroupError> {
        let (out, batch, events) = {
            let mut ctx = OpContext {
                store: CacheStore::new(&self.store),
                router: &self.router,
                config: &self.config,
                events: Vec::new(),
            };
            let out = match f(&mut ctx) {
                Ok(out) => out,
                Err(e) => {
                    debug!(op, error = %e, "operation rejected");
                    return Err(e);
                }
            };
            let OpContext { store, events, .. } = ctx;
            (out, store.into_batch(), events)
        };
        debug!(op, writes = batch.len(), "committing operation");
        self.store.write_batch(batch)?;
        self.events.extend(events);
        Ok(out)
    }
}
