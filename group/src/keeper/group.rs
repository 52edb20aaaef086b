//! Group and membership operations.

use cohort_store::KvStore;
use cohort_types::{Dec, GroupId, Timestamp};
use tracing::info;

use super::{GroupKeeper, OpContext};
use crate::events::GroupEvent;
use crate::msgs::{
    MemberRequest, MsgCreateGroup, MsgLeaveGroup, MsgUpdateGroupAdmin, MsgUpdateGroupMembers,
    MsgUpdateGroupMetadata,
};
use crate::state::{self, Sequence};
use crate::types::{GroupInfo, Member};
use crate::GroupError;

impl<S: KvStore> GroupKeeper<S> {
    /// Create a group with its initial members. Returns the new group id.
    pub fn create_group(&mut self, msg: MsgCreateGroup, now: Timestamp) -> Result<GroupId, GroupError> {
        self.apply("create_group", |ctx| create_group(ctx, &msg, now))
    }

    /// Hand the group to a new admin. Returns the new group version.
    pub fn update_group_admin(&mut self, msg: MsgUpdateGroupAdmin) -> Result<u64, GroupError> {
        self.apply("update_group_admin", |ctx| {
            msg.validate_basic()?;
            let mut group = ctx.load_group_as_admin(msg.group_id, &msg.admin)?;
            group.admin = msg.new_admin.clone();
            bump_and_save(ctx, &mut group)
        })
    }

    /// Replace the group's metadata. Returns the new group version.
    pub fn update_group_metadata(&mut self, msg: MsgUpdateGroupMetadata) -> Result<u64, GroupError> {
        self.apply("update_group_metadata", |ctx| {
            ctx.check_metadata("group metadata", &msg.metadata)?;
            let mut group = ctx.load_group_as_admin(msg.group_id, &msg.admin)?;
            group.metadata = msg.metadata.clone();
            bump_and_save(ctx, &mut group)
        })
    }

    /// Add, reweight or remove members. A weight of `"0"` removes the member.
    /// Returns the new group version.
    pub fn update_group_members(
        &mut self,
        msg: MsgUpdateGroupMembers,
        now: Timestamp,
    ) -> Result<u64, GroupError> {
        self.apply("update_group_members", |ctx| {
            msg.validate_basic()?;
            let mut group = ctx.load_group_as_admin(msg.group_id, &msg.admin)?;
            for update in &msg.member_updates {
                apply_member_update(ctx, &mut group, update, now)?;
            }
            bump_and_save(ctx, &mut group)
        })
    }

    /// Remove `msg.address` from the group on its own request.
    pub fn leave_group(&mut self, msg: MsgLeaveGroup) -> Result<(), GroupError> {
        self.apply("leave_group", |ctx| {
            let mut group = state::load_group(&ctx.store, msg.group_id)?;
            let member = state::get_member(&ctx.store, msg.group_id, &msg.address)?.ok_or_else(
                || GroupError::NotMember {
                    address: msg.address.clone(),
                    group: msg.group_id,
                },
            )?;
            state::delete_member(&mut ctx.store, group.id, &member.address)?;
            group.total_weight = group.total_weight.checked_sub(member.weight)?;
            bump_and_save(ctx, &mut group)?;
            ctx.emit(GroupEvent::LeaveGroup {
                group_id: group.id,
                address: msg.address.clone(),
            });
            info!(group_id = %group.id, member = %msg.address, "member left group");
            Ok(())
        })
    }
}

pub(super) fn create_group(
    ctx: &mut OpContext<'_>,
    msg: &MsgCreateGroup,
    now: Timestamp,
) -> Result<GroupId, GroupError> {
    msg.validate_basic()?;
    ctx.check_metadata("group metadata", &msg.metadata)?;

    let mut total_weight = Dec::ZERO;
    let mut members = Vec::with_capacity(msg.members.len());
    for m in &msg.members {
        ctx.check_metadata("member metadata", &m.metadata)?;
        let weight = Dec::parse_positive(&m.weight)?;
        total_weight = total_weight.checked_add(weight)?;
        members.push(Member {
            address: m.address.clone(),
            weight,
            metadata: m.metadata.clone(),
            added_at: now,
        });
    }

    let id = GroupId(state::next_sequence(&mut ctx.store, Sequence::Group)?);
    let group = GroupInfo {
        id,
        admin: msg.admin.clone(),
        metadata: msg.metadata.clone(),
        version: 1,
        total_weight,
        created_at: now,
    };
    state::save_group(&mut ctx.store, &group)?;
    for member in &members {
        state::save_member(&mut ctx.store, id, member)?;
    }

    ctx.emit(GroupEvent::CreateGroup { group_id: id });
    info!(group_id = %id, admin = %group.admin, members = members.len(), total_weight = %total_weight, "group created");
    Ok(id)
}

fn apply_member_update(
    ctx: &mut OpContext<'_>,
    group: &mut GroupInfo,
    update: &MemberRequest,
    now: Timestamp,
) -> Result<(), GroupError> {
    ctx.check_metadata("member metadata", &update.metadata)?;
    let weight = Dec::parse_non_negative(&update.weight)?;
    let existing = state::get_member(&ctx.store, group.id, &update.address)?;

    if weight.is_zero() {
        let Some(old) = existing else {
            return Err(GroupError::NotMember {
                address: update.address.clone(),
                group: group.id,
            });
        };
        group.total_weight = group.total_weight.checked_sub(old.weight)?;
        state::delete_member(&mut ctx.store, group.id, &update.address)?;
        return Ok(());
    }

    let added_at = match &existing {
        Some(old) => {
            group.total_weight = group.total_weight.checked_sub(old.weight)?;
            old.added_at
        }
        None => now,
    };
    group.total_weight = group.total_weight.checked_add(weight)?;
    let member = Member {
        address: update.address.clone(),
        weight,
        metadata: update.metadata.clone(),
        added_at,
    };
    state::save_member(&mut ctx.store, group.id, &member)
}

fn bump_and_save(ctx: &mut OpContext<'_>, group: &mut GroupInfo) -> Result<u64, GroupError> {
    group.version = group
        .version
        .checked_add(1)
        .ok_or_else(|| GroupError::InvalidState("group version overflow".into()))?;
    state::save_group(&mut ctx.store, group)?;
    ctx.emit(GroupEvent::UpdateGroup { group_id: group.id });
    Ok(group.version)
}
