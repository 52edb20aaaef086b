//! Group policy accounts.

use cohort_store::KvStore;
use cohort_types::{Address, GroupId, Timestamp};
use tracing::{debug, info};

use super::group::create_group;
use super::{GroupKeeper, OpContext};
use crate::events::GroupEvent;
use crate::msgs::{
    MsgCreateGroup, MsgCreateGroupPolicy, MsgCreateGroupWithPolicy, MsgUpdateGroupPolicyAdmin,
    MsgUpdateGroupPolicyDecisionPolicy, MsgUpdateGroupPolicyMetadata,
};
use crate::state::{self, Sequence};
use crate::types::GroupPolicyInfo;
use crate::GroupError;

/// Domain tag mixed into every derived policy account key.
const POLICY_ACCOUNT_DOMAIN: &[u8] = b"group_policy";

impl<S: KvStore> GroupKeeper<S> {
    /// Attach a new policy account to a group. Returns its address.
    pub fn create_group_policy(
        &mut self,
        msg: MsgCreateGroupPolicy,
        now: Timestamp,
    ) -> Result<Address, GroupError> {
        self.apply("create_group_policy", |ctx| {
            msg.validate_basic()?;
            ctx.load_group_as_admin(msg.group_id, &msg.admin)?;
            create_policy(ctx, &msg, now)
        })
    }

    /// Create a group and one policy account for it in a single operation.
    pub fn create_group_with_policy(
        &mut self,
        msg: MsgCreateGroupWithPolicy,
        now: Timestamp,
    ) -> Result<(GroupId, Address), GroupError> {
        self.apply("create_group_with_policy", |ctx| {
            msg.validate_basic()?;
            ctx.check_metadata("group policy metadata", &msg.group_policy_metadata)?;
            let group_id = create_group(
                ctx,
                &MsgCreateGroup {
                    admin: msg.admin.clone(),
                    members: msg.members.clone(),
                    metadata: msg.group_metadata.clone(),
                },
                now,
            )?;
            let address = create_policy(
                ctx,
                &MsgCreateGroupPolicy {
                    admin: msg.admin.clone(),
                    group_id,
                    metadata: msg.group_policy_metadata.clone(),
                    decision_policy: msg.decision_policy.clone(),
                },
                now,
            )?;

            if msg.group_policy_as_admin {
                let mut group = state::load_group(&ctx.store, group_id)?;
                group.admin = address.clone();
                state::save_group(&mut ctx.store, &group)?;

                let mut policy = state::load_policy(&ctx.store, &address)?;
                policy.admin = address.clone();
                state::save_policy(&mut ctx.store, &policy)?;
            }
            Ok((group_id, address))
        })
    }

    /// Returns the new policy version.
    pub fn update_group_policy_admin(
        &mut self,
        msg: MsgUpdateGroupPolicyAdmin,
    ) -> Result<u64, GroupError> {
        self.apply("update_group_policy_admin", |ctx| {
            msg.validate_basic()?;
            let mut policy = ctx.load_policy_as_admin(&msg.group_policy_address, &msg.admin)?;
            policy.admin = msg.new_admin.clone();
            bump_and_save(ctx, &mut policy)
        })
    }

    /// Replace the decision policy. Proposals already submitted keep their
    /// voting period end; later tallies use the new rule.
    pub fn update_group_policy_decision_policy(
        &mut self,
        msg: MsgUpdateGroupPolicyDecisionPolicy,
    ) -> Result<u64, GroupError> {
        self.apply("update_group_policy_decision_policy", |ctx| {
            msg.validate_basic()?;
            let mut policy = ctx.load_policy_as_admin(&msg.group_policy_address, &msg.admin)?;
            msg.decision_policy.validate(ctx.config)?;
            policy.decision_policy = msg.decision_policy.clone();
            bump_and_save(ctx, &mut policy)
        })
    }

    pub fn update_group_policy_metadata(
        &mut self,
        msg: MsgUpdateGroupPolicyMetadata,
    ) -> Result<u64, GroupError> {
        self.apply("update_group_policy_metadata", |ctx| {
            ctx.check_metadata("group policy metadata", &msg.metadata)?;
            let mut policy = ctx.load_policy_as_admin(&msg.group_policy_address, &msg.admin)?;
            policy.metadata = msg.metadata.clone();
            bump_and_save(ctx, &mut policy)
        })
    }
}

/// Shared by both creation paths. The caller has checked admin rights.
fn create_policy(
    ctx: &mut OpContext<'_>,
    msg: &MsgCreateGroupPolicy,
    now: Timestamp,
) -> Result<Address, GroupError> {
    ctx.check_metadata("group policy metadata", &msg.metadata)?;
    msg.decision_policy.validate(ctx.config)?;

    // Skip sequence values whose account is already taken.
    let address = loop {
        let seq = state::next_sequence(&mut ctx.store, Sequence::PolicyAccount)?;
        let candidate = Address::derive(POLICY_ACCOUNT_DOMAIN, &seq.to_be_bytes());
        if state::get_policy(&ctx.store, &candidate)?.is_none() {
            break candidate;
        }
        debug!(seq, policy = %candidate, "policy account taken, advancing sequence");
    };

    let policy = GroupPolicyInfo {
        address: address.clone(),
        group_id: msg.group_id,
        admin: msg.admin.clone(),
        metadata: msg.metadata.clone(),
        version: 1,
        decision_policy: msg.decision_policy.clone(),
        created_at: now,
    };
    state::save_policy(&mut ctx.store, &policy)?;

    ctx.emit(GroupEvent::CreateGroupPolicy {
        address: address.clone(),
    });
    info!(group_id = %msg.group_id, policy = %address, "group policy created");
    Ok(address)
}

fn bump_and_save(ctx: &mut OpContext<'_>, policy: &mut GroupPolicyInfo) -> Result<u64, GroupError> {
    policy.version = policy
        .version
        .checked_add(1)
        .ok_or_else(|| GroupError::InvalidState("group policy version overflow".into()))?;
    state::save_policy(&mut ctx.store, policy)?;
    ctx.emit(GroupEvent::UpdateGroupPolicy {
        address: policy.address.clone(),
    });
    Ok(policy.version)
}
