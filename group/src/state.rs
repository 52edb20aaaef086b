//! Table layout and typed accessors over a [`KvStore`].
//!
//! Every entity lives under a one-byte table prefix. Integer ids are encoded
//! big-endian and addresses are length-prefixed, so a prefix scan returns
//! rows in id (or time) order and never bleeds into a neighbouring address.
//!
//! Secondary indexes are maintained by the `save_*` / `delete_*` helpers;
//! callers never write index keys directly.

use cohort_store::KvStore;
use cohort_types::{Address, GroupId, ProposalId, Timestamp};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::types::{GroupInfo, GroupPolicyInfo, Member, Proposal, ProposalStatus, Vote};
use crate::GroupError;

const SEQ: u8 = 0x00;
const GROUP: u8 = 0x01;
const GROUP_BY_ADMIN: u8 = 0x02;
const MEMBER: u8 = 0x10;
const MEMBER_BY_ADDR: u8 = 0x11;
const POLICY: u8 = 0x21;
const POLICY_BY_GROUP: u8 = 0x22;
const POLICY_BY_ADMIN: u8 = 0x23;
const PROPOSAL: u8 = 0x31;
const PROPOSAL_BY_POLICY: u8 = 0x32;
const PROPOSAL_BY_VP_END: u8 = 0x33;
const PENDING_BY_VP_END: u8 = 0x34;
const VOTE: u8 = 0x40;
const VOTE_BY_VOTER: u8 = 0x41;

/// Named counters. Each yields 1, 2, 3, … and never reuses a value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sequence {
    Group = 0,
    PolicyAccount = 1,
    Proposal = 2,
}

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, GroupError> {
    Ok(bincode::serialize(value)?)
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, GroupError> {
    Ok(bincode::deserialize(bytes)?)
}

fn key(prefix: u8, parts: &[&[u8]]) -> Vec<u8> {
    let len = 1 + parts.iter().map(|p| p.len()).sum::<usize>();
    let mut k = Vec::with_capacity(len);
    k.push(prefix);
    for part in parts {
        k.extend_from_slice(part);
    }
    k
}

/// Length-prefixed address bytes.
fn lp(addr: &Address) -> Vec<u8> {
    let bytes = addr.as_bytes();
    let mut out = Vec::with_capacity(bytes.len() + 1);
    out.push(bytes.len() as u8);
    out.extend_from_slice(bytes);
    out
}

fn u64_suffix(key: &[u8]) -> Result<u64, GroupError> {
    let start = key
        .len()
        .checked_sub(8)
        .ok_or_else(|| GroupError::Codec(format!("index key too short: {} bytes", key.len())))?;
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&key[start..]);
    Ok(u64::from_be_bytes(raw))
}

fn address_value(value: &[u8]) -> Result<Address, GroupError> {
    let s = std::str::from_utf8(value).map_err(|e| GroupError::Codec(e.to_string()))?;
    Ok(Address::parse(s)?)
}

// ── Sequences ───────────────────────────────────────────────────────────

pub fn get_sequence(s: &dyn KvStore, seq: Sequence) -> Result<u64, GroupError> {
    match s.get(&[SEQ, seq as u8])? {
        Some(raw) => u64_suffix(&raw),
        None => Ok(0),
    }
}

pub fn set_sequence(s: &mut dyn KvStore, seq: Sequence, value: u64) -> Result<(), GroupError> {
    s.put(&[SEQ, seq as u8], &value.to_be_bytes())?;
    Ok(())
}

pub fn next_sequence(s: &mut dyn KvStore, seq: Sequence) -> Result<u64, GroupError> {
    let next = get_sequence(s, seq)?
        .checked_add(1)
        .ok_or_else(|| GroupError::InvalidState(format!("{seq:?} sequence exhausted")))?;
    set_sequence(s, seq, next)?;
    Ok(next)
}

// ── Groups ──────────────────────────────────────────────────────────────

fn group_key(id: GroupId) -> Vec<u8> {
    key(GROUP, &[&id.to_be_bytes()])
}

pub fn get_group(s: &dyn KvStore, id: GroupId) -> Result<Option<GroupInfo>, GroupError> {
    s.get(&group_key(id))?.map(|raw| decode(&raw)).transpose()
}

pub fn load_group(s: &dyn KvStore, id: GroupId) -> Result<GroupInfo, GroupError> {
    get_group(s, id)?.ok_or(GroupError::GroupNotFound(id))
}

pub fn save_group(s: &mut dyn KvStore, info: &GroupInfo) -> Result<(), GroupError> {
    if let Some(prev) = get_group(s, info.id)? {
        if prev.admin != info.admin {
            s.delete(&key(GROUP_BY_ADMIN, &[&lp(&prev.admin), &info.id.to_be_bytes()]))?;
        }
    }
    s.put(&group_key(info.id), &encode(info)?)?;
    s.put(&key(GROUP_BY_ADMIN, &[&lp(&info.admin), &info.id.to_be_bytes()]), &[])?;
    Ok(())
}

pub fn all_groups(s: &dyn KvStore) -> Result<Vec<GroupInfo>, GroupError> {
    s.scan_prefix(&[GROUP])?
        .iter()
        .map(|(_, v)| decode(v))
        .collect()
}

pub fn group_ids_by_admin(s: &dyn KvStore, admin: &Address) -> Result<Vec<GroupId>, GroupError> {
    s.scan_prefix(&key(GROUP_BY_ADMIN, &[&lp(admin)]))?
        .iter()
        .map(|(k, _)| u64_suffix(k).map(GroupId))
        .collect()
}

// ── Members ─────────────────────────────────────────────────────────────

fn member_key(group: GroupId, addr: &Address) -> Vec<u8> {
    key(MEMBER, &[&group.to_be_bytes(), &lp(addr)])
}

pub fn get_member(
    s: &dyn KvStore,
    group: GroupId,
    addr: &Address,
) -> Result<Option<Member>, GroupError> {
    s.get(&member_key(group, addr))?.map(|raw| decode(&raw)).transpose()
}

pub fn save_member(s: &mut dyn KvStore, group: GroupId, member: &Member) -> Result<(), GroupError> {
    s.put(&member_key(group, &member.address), &encode(member)?)?;
    s.put(&key(MEMBER_BY_ADDR, &[&lp(&member.address), &group.to_be_bytes()]), &[])?;
    Ok(())
}

pub fn delete_member(s: &mut dyn KvStore, group: GroupId, addr: &Address) -> Result<(), GroupError> {
    s.delete(&member_key(group, addr))?;
    s.delete(&key(MEMBER_BY_ADDR, &[&lp(addr), &group.to_be_bytes()]))?;
    Ok(())
}

/// Members of a group, ordered by address.
pub fn members_of(s: &dyn KvStore, group: GroupId) -> Result<Vec<Member>, GroupError> {
    s.scan_prefix(&key(MEMBER, &[&group.to_be_bytes()]))?
        .iter()
        .map(|(_, v)| decode(v))
        .collect()
}

pub fn group_ids_by_member(s: &dyn KvStore, addr: &Address) -> Result<Vec<GroupId>, GroupError> {
    s.scan_prefix(&key(MEMBER_BY_ADDR, &[&lp(addr)]))?
        .iter()
        .map(|(k, _)| u64_suffix(k).map(GroupId))
        .collect()
}

/// Every stored member with its group id, in table order.
pub fn all_members(s: &dyn KvStore) -> Result<Vec<(GroupId, Member)>, GroupError> {
    s.scan_prefix(&[MEMBER])?
        .iter()
        .map(|(k, v)| -> Result<(GroupId, Member), GroupError> {
            let mut raw = [0u8; 8];
            let id_bytes = k
                .get(1..9)
                .ok_or_else(|| GroupError::Codec("member key too short".into()))?;
            raw.copy_from_slice(id_bytes);
            Ok((GroupId::from_be_bytes(raw), decode(v)?))
        })
        .collect()
}

pub fn member_index_exists(
    s: &dyn KvStore,
    addr: &Address,
    group: GroupId,
) -> Result<bool, GroupError> {
    Ok(s.contains(&key(MEMBER_BY_ADDR, &[&lp(addr), &group.to_be_bytes()]))?)
}

pub fn group_admin_index_exists(s: &dyn KvStore, info: &GroupInfo) -> Result<bool, GroupError> {
    Ok(s.contains(&key(GROUP_BY_ADMIN, &[&lp(&info.admin), &info.id.to_be_bytes()]))?)
}

// ── Group policies ──────────────────────────────────────────────────────

fn policy_key(addr: &Address) -> Vec<u8> {
    key(POLICY, &[&lp(addr)])
}

pub fn get_policy(s: &dyn KvStore, addr: &Address) -> Result<Option<GroupPolicyInfo>, GroupError> {
    s.get(&policy_key(addr))?.map(|raw| decode(&raw)).transpose()
}

pub fn load_policy(s: &dyn KvStore, addr: &Address) -> Result<GroupPolicyInfo, GroupError> {
    get_policy(s, addr)?.ok_or_else(|| GroupError::PolicyNotFound(addr.clone()))
}

pub fn save_policy(s: &mut dyn KvStore, info: &GroupPolicyInfo) -> Result<(), GroupError> {
    if let Some(prev) = get_policy(s, &info.address)? {
        if prev.admin != info.admin {
            s.delete(&key(POLICY_BY_ADMIN, &[&lp(&prev.admin), &lp(&info.address)]))?;
        }
    }
    s.put(&policy_key(&info.address), &encode(info)?)?;
    s.put(
        &key(POLICY_BY_GROUP, &[&info.group_id.to_be_bytes(), &lp(&info.address)]),
        info.address.as_bytes(),
    )?;
    s.put(
        &key(POLICY_BY_ADMIN, &[&lp(&info.admin), &lp(&info.address)]),
        info.address.as_bytes(),
    )?;
    Ok(())
}

fn policies_at(s: &dyn KvStore, prefix: &[u8]) -> Result<Vec<GroupPolicyInfo>, GroupError> {
    s.scan_prefix(prefix)?
        .iter()
        .map(|(_, v)| load_policy(s, &address_value(v)?))
        .collect()
}

pub fn policies_by_group(s: &dyn KvStore, group: GroupId) -> Result<Vec<GroupPolicyInfo>, GroupError> {
    policies_at(s, &key(POLICY_BY_GROUP, &[&group.to_be_bytes()]))
}

pub fn policies_by_admin(s: &dyn KvStore, admin: &Address) -> Result<Vec<GroupPolicyInfo>, GroupError> {
    policies_at(s, &key(POLICY_BY_ADMIN, &[&lp(admin)]))
}

pub fn all_policies(s: &dyn KvStore) -> Result<Vec<GroupPolicyInfo>, GroupError> {
    s.scan_prefix(&[POLICY])?
        .iter()
        .map(|(_, v)| decode(v))
        .collect()
}

// ── Proposals ───────────────────────────────────────────────────────────

fn proposal_key(id: ProposalId) -> Vec<u8> {
    key(PROPOSAL, &[&id.to_be_bytes()])
}

fn vp_end_key(end: Timestamp, id: ProposalId) -> Vec<u8> {
    key(PROPOSAL_BY_VP_END, &[&end.to_be_bytes(), &id.to_be_bytes()])
}

/// Same layout as the voting period index, but holds SUBMITTED proposals only.
fn pending_key(end: Timestamp, id: ProposalId) -> Vec<u8> {
    key(PENDING_BY_VP_END, &[&end.to_be_bytes(), &id.to_be_bytes()])
}

pub fn get_proposal(s: &dyn KvStore, id: ProposalId) -> Result<Option<Proposal>, GroupError> {
    s.get(&proposal_key(id))?.map(|raw| decode(&raw)).transpose()
}

pub fn load_proposal(s: &dyn KvStore, id: ProposalId) -> Result<Proposal, GroupError> {
    get_proposal(s, id)?.ok_or(GroupError::ProposalNotFound(id))
}

/// Insert or update. The policy address and voting period end of a proposal
/// never change, so its index keys are stable across updates. The pending
/// entry is dropped as soon as the proposal leaves SUBMITTED.
pub fn save_proposal(s: &mut dyn KvStore, p: &Proposal) -> Result<(), GroupError> {
    s.put(&proposal_key(p.id), &encode(p)?)?;
    s.put(
        &key(PROPOSAL_BY_POLICY, &[&lp(&p.group_policy_address), &p.id.to_be_bytes()]),
        &[],
    )?;
    s.put(&vp_end_key(p.voting_period_end, p.id), &[])?;
    if p.status == ProposalStatus::Submitted {
        s.put(&pending_key(p.voting_period_end, p.id), &[])?;
    } else {
        s.delete(&pending_key(p.voting_period_end, p.id))?;
    }
    Ok(())
}

pub fn delete_proposal(s: &mut dyn KvStore, p: &Proposal) -> Result<(), GroupError> {
    s.delete(&proposal_key(p.id))?;
    s.delete(&key(PROPOSAL_BY_POLICY, &[&lp(&p.group_policy_address), &p.id.to_be_bytes()]))?;
    s.delete(&vp_end_key(p.voting_period_end, p.id))?;
    s.delete(&pending_key(p.voting_period_end, p.id))?;
    Ok(())
}

pub fn proposals_by_policy(s: &dyn KvStore, policy: &Address) -> Result<Vec<Proposal>, GroupError> {
    s.scan_prefix(&key(PROPOSAL_BY_POLICY, &[&lp(policy)]))?
        .iter()
        .map(|(k, _)| load_proposal(s, ProposalId(u64_suffix(k)?)))
        .collect()
}

/// Ids of proposals whose voting period ends at or before `until`, ordered
/// by end time and then by id.
pub fn proposal_ids_by_vp_end(
    s: &dyn KvStore,
    until: Timestamp,
) -> Result<Vec<ProposalId>, GroupError> {
    ids_until(s, PROPOSAL_BY_VP_END, until)
}

/// Like [`proposal_ids_by_vp_end`], restricted to SUBMITTED proposals.
pub fn pending_ids_by_vp_end(
    s: &dyn KvStore,
    until: Timestamp,
) -> Result<Vec<ProposalId>, GroupError> {
    ids_until(s, PENDING_BY_VP_END, until)
}

pub fn pending_index_exists(s: &dyn KvStore, p: &Proposal) -> Result<bool, GroupError> {
    Ok(s.contains(&pending_key(p.voting_period_end, p.id))?)
}

fn ids_until(s: &dyn KvStore, prefix: u8, until: Timestamp) -> Result<Vec<ProposalId>, GroupError> {
    let mut ids = Vec::new();
    for (k, _) in s.scan_prefix(&[prefix])? {
        let ts = k
            .get(1..9)
            .ok_or_else(|| GroupError::Codec("voting period index key too short".into()))?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(ts);
        if u64::from_be_bytes(raw) > until.as_secs() {
            break;
        }
        ids.push(ProposalId(u64_suffix(&k)?));
    }
    Ok(ids)
}

pub fn all_proposals(s: &dyn KvStore) -> Result<Vec<Proposal>, GroupError> {
    s.scan_prefix(&[PROPOSAL])?
        .iter()
        .map(|(_, v)| decode(v))
        .collect()
}

// ── Votes ───────────────────────────────────────────────────────────────

fn vote_key(proposal: ProposalId, voter: &Address) -> Vec<u8> {
    key(VOTE, &[&proposal.to_be_bytes(), &lp(voter)])
}

fn vote_by_voter_key(voter: &Address, proposal: ProposalId) -> Vec<u8> {
    key(VOTE_BY_VOTER, &[&lp(voter), &proposal.to_be_bytes()])
}

pub fn get_vote(
    s: &dyn KvStore,
    proposal: ProposalId,
    voter: &Address,
) -> Result<Option<Vote>, GroupError> {
    s.get(&vote_key(proposal, voter))?.map(|raw| decode(&raw)).transpose()
}

pub fn save_vote(s: &mut dyn KvStore, vote: &Vote) -> Result<(), GroupError> {
    s.put(&vote_key(vote.proposal_id, &vote.voter), &encode(vote)?)?;
    s.put(&vote_by_voter_key(&vote.voter, vote.proposal_id), &[])?;
    Ok(())
}

/// Votes on a proposal, ordered by voter address.
pub fn votes_by_proposal(s: &dyn KvStore, proposal: ProposalId) -> Result<Vec<Vote>, GroupError> {
    s.scan_prefix(&key(VOTE, &[&proposal.to_be_bytes()]))?
        .iter()
        .map(|(_, v)| decode(v))
        .collect()
}

pub fn votes_by_voter(s: &dyn KvStore, voter: &Address) -> Result<Vec<Vote>, GroupError> {
    let mut votes = Vec::new();
    for (k, _) in s.scan_prefix(&key(VOTE_BY_VOTER, &[&lp(voter)]))? {
        let proposal = ProposalId(u64_suffix(&k)?);
        let vote = get_vote(s, proposal, voter)?.ok_or_else(|| GroupError::VoteNotFound {
            proposal,
            voter: voter.clone(),
        })?;
        votes.push(vote);
    }
    Ok(votes)
}

/// Remove every vote cast on `proposal`, with their voter index entries.
pub fn delete_votes(s: &mut dyn KvStore, proposal: ProposalId) -> Result<usize, GroupError> {
    let votes = votes_by_proposal(s, proposal)?;
    for vote in &votes {
        s.delete(&vote_key(proposal, &vote.voter))?;
        s.delete(&vote_by_voter_key(&vote.voter, proposal))?;
    }
    Ok(votes.len())
}

pub fn all_votes(s: &dyn KvStore) -> Result<Vec<Vote>, GroupError> {
    s.scan_prefix(&[VOTE])?
        .iter()
        .map(|(_, v)| decode(v))
        .collect()
}

pub fn vote_index_exists(
    s: &dyn KvStore,
    voter: &Address,
    proposal: ProposalId,
) -> Result<bool, GroupError> {
    Ok(s.contains(&vote_by_voter_key(voter, proposal))?)
}

// ── Index audits ────────────────────────────────────────────────────────

/// A decoded secondary index entry, for the invariant checker to resolve
/// against primary rows.
#[derive(Debug)]
pub(crate) enum IndexEntry {
    GroupByAdmin(Address, GroupId),
    MemberByAddr(Address, GroupId),
    PolicyByGroup(GroupId, Address),
    PolicyByAdmin(Address, Address),
    ProposalByPolicy(Address, ProposalId),
    ProposalByVpEnd(Timestamp, ProposalId),
    PendingByVpEnd(Timestamp, ProposalId),
    VoteByVoter(Address, ProposalId),
}

fn lp_address_at(k: &[u8], at: usize) -> Result<Address, GroupError> {
    let len = *k
        .get(at)
        .ok_or_else(|| GroupError::Codec("index key truncated".into()))? as usize;
    let raw = k
        .get(at + 1..at + 1 + len)
        .ok_or_else(|| GroupError::Codec("index key truncated".into()))?;
    address_value(raw)
}

pub(crate) fn index_entries(s: &dyn KvStore) -> Result<Vec<IndexEntry>, GroupError> {
    let mut out = Vec::new();
    for (k, _) in s.scan_prefix(&[GROUP_BY_ADMIN])? {
        let admin = lp_address_at(&k, 1)?;
        out.push(IndexEntry::GroupByAdmin(admin, GroupId(u64_suffix(&k)?)));
    }
    for (k, _) in s.scan_prefix(&[MEMBER_BY_ADDR])? {
        let addr = lp_address_at(&k, 1)?;
        out.push(IndexEntry::MemberByAddr(addr, GroupId(u64_suffix(&k)?)));
    }
    for (k, v) in s.scan_prefix(&[POLICY_BY_GROUP])? {
        let group = k
            .get(1..9)
            .ok_or_else(|| GroupError::Codec("index key truncated".into()))?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(group);
        out.push(IndexEntry::PolicyByGroup(GroupId::from_be_bytes(raw), address_value(&v)?));
    }
    for (k, v) in s.scan_prefix(&[POLICY_BY_ADMIN])? {
        let admin = lp_address_at(&k, 1)?;
        out.push(IndexEntry::PolicyByAdmin(admin, address_value(&v)?));
    }
    for (k, _) in s.scan_prefix(&[PROPOSAL_BY_POLICY])? {
        let policy = lp_address_at(&k, 1)?;
        out.push(IndexEntry::ProposalByPolicy(policy, ProposalId(u64_suffix(&k)?)));
    }
    let vp_end_tables: [(u8, fn(Timestamp, ProposalId) -> IndexEntry); 2] = [
        (PROPOSAL_BY_VP_END, IndexEntry::ProposalByVpEnd),
        (PENDING_BY_VP_END, IndexEntry::PendingByVpEnd),
    ];
    for (prefix, entry) in vp_end_tables {
        for (k, _) in s.scan_prefix(&[prefix])? {
            let ts = k
                .get(1..9)
                .ok_or_else(|| GroupError::Codec("index key truncated".into()))?;
            let mut raw = [0u8; 8];
            raw.copy_from_slice(ts);
            out.push(entry(
                Timestamp::new(u64::from_be_bytes(raw)),
                ProposalId(u64_suffix(&k)?),
            ));
        }
    }
    for (k, _) in s.scan_prefix(&[VOTE_BY_VOTER])? {
        let voter = lp_address_at(&k, 1)?;
        out.push(IndexEntry::VoteByVoter(voter, ProposalId(u64_suffix(&k)?)));
    }
    Ok(out)
}
