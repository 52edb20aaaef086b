//! Integration tests driving the group keeper end to end:
//! groups → policies → proposals → votes → tally → execution → pruning.
//!
//! Every test runs against an in-memory `NullStore`, a `NullClock` and the
//! `NullBank` transfer handler, so execution effects are observable as
//! balances in the same store the keeper writes to.

use cohort_group::{
    Action, DecisionPolicy, ErrorKind, Exec, ExecutorResult, GenesisState, GroupConfig,
    GroupError, GroupEvent, GroupKeeper, MemberRequest, MsgCreateGroup, MsgCreateGroupPolicy,
    MsgCreateGroupWithPolicy, MsgExec, MsgLeaveGroup, MsgSubmitProposal, MsgUpdateGroupAdmin,
    MsgUpdateGroupMembers, MsgUpdateGroupMetadata, MsgUpdateGroupPolicyAdmin,
    MsgUpdateGroupPolicyDecisionPolicy, MsgUpdateGroupPolicyMetadata, MsgVote,
    MsgWithdrawProposal, ProposalStatus, Router, VoteOption,
};
use cohort_group::state;
use cohort_nullables::{test_address, NullBank, NullClock, NullStore};
use cohort_types::{Address, Dec, GroupId, ProposalId};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const ADMIN: u8 = 100;
const STRANGER: u8 = 200;

fn keeper_with(config: GroupConfig) -> GroupKeeper<NullStore> {
    cohort_utils::init_test_logging();
    let mut router = Router::new();
    router.register(NullBank).unwrap();
    GroupKeeper::new(NullStore::new(), router, config)
}

fn keeper() -> GroupKeeper<NullStore> {
    keeper_with(GroupConfig::default())
}

fn addr(seed: u8) -> Address {
    test_address(seed)
}

fn dec(raw: &str) -> Dec {
    Dec::parse(raw).unwrap()
}

/// Group with members 1 (weight 1) and 2 (weight 2), admin `ADMIN`.
fn create_group_12(k: &mut GroupKeeper<NullStore>, clock: &NullClock) -> GroupId {
    k.create_group(
        MsgCreateGroup {
            admin: addr(ADMIN),
            members: vec![
                MemberRequest::new(addr(1), "1"),
                MemberRequest::new(addr(2), "2"),
            ],
            metadata: "founders".into(),
        },
        clock.now(),
    )
    .unwrap()
}

fn create_policy(
    k: &mut GroupKeeper<NullStore>,
    clock: &NullClock,
    group_id: GroupId,
    policy: DecisionPolicy,
) -> Address {
    k.create_group_policy(
        MsgCreateGroupPolicy {
            admin: addr(ADMIN),
            group_id,
            metadata: String::new(),
            decision_policy: policy,
        },
        clock.now(),
    )
    .unwrap()
}

/// Group {1:1, 2:2} plus a Threshold("2") policy with the given windows.
fn setup(
    voting_period: u64,
    min_exec: u64,
) -> (GroupKeeper<NullStore>, NullClock, GroupId, Address) {
    let mut k = keeper();
    let clock = NullClock::default();
    let group_id = create_group_12(&mut k, &clock);
    let policy = create_policy(
        &mut k,
        &clock,
        group_id,
        DecisionPolicy::threshold("2", voting_period, min_exec).unwrap(),
    );
    k.take_events();
    (k, clock, group_id, policy)
}

fn submit(
    k: &mut GroupKeeper<NullStore>,
    clock: &NullClock,
    policy: &Address,
    proposer: u8,
    actions: Vec<Action>,
) -> Result<ProposalId, GroupError> {
    k.submit_proposal(
        MsgSubmitProposal {
            group_policy_address: policy.clone(),
            proposers: vec![addr(proposer)],
            metadata: String::new(),
            actions,
            exec: Exec::Unspecified,
        },
        clock.now(),
    )
}

fn vote(
    k: &mut GroupKeeper<NullStore>,
    clock: &NullClock,
    id: ProposalId,
    voter: u8,
    option: VoteOption,
) -> Result<(), GroupError> {
    k.vote(
        MsgVote {
            proposal_id: id,
            voter: addr(voter),
            option,
            metadata: String::new(),
            exec: Exec::Unspecified,
        },
        clock.now(),
    )
}

fn exec(
    k: &mut GroupKeeper<NullStore>,
    clock: &NullClock,
    id: ProposalId,
) -> Result<ExecutorResult, GroupError> {
    k.exec(
        MsgExec {
            proposal_id: id,
            executor: addr(STRANGER),
        },
        clock.now(),
    )
}

fn long_metadata(len: usize) -> String {
    "x".repeat(len)
}

// ---------------------------------------------------------------------------
// 1. Groups and membership
// ---------------------------------------------------------------------------

#[test]
fn create_group_records_members_and_total_weight() {
    let mut k = keeper();
    let clock = NullClock::default();
    let id = create_group_12(&mut k, &clock);

    assert_eq!(id, GroupId(1));
    let info = k.group_info(id).unwrap();
    assert_eq!(info.admin, addr(ADMIN));
    assert_eq!(info.version, 1);
    assert_eq!(info.total_weight, dec("3"));
    assert_eq!(info.created_at, clock.now());

    let members = k.group_members(id).unwrap();
    assert_eq!(members.len(), 2);
    assert!(members.iter().all(|m| m.group_id == id));
    assert_eq!(k.take_events(), vec![GroupEvent::CreateGroup { group_id: id }]);
    k.check_invariants().unwrap();
}

#[test]
fn create_group_accepts_fractional_weights() {
    let mut k = keeper();
    let clock = NullClock::default();
    let id = k
        .create_group(
            MsgCreateGroup {
                admin: addr(ADMIN),
                members: vec![
                    MemberRequest::new(addr(1), "0.5"),
                    MemberRequest::new(addr(2), "1.25"),
                ],
                metadata: String::new(),
            },
            clock.now(),
        )
        .unwrap();
    assert_eq!(k.group_info(id).unwrap().total_weight, dec("1.75"));
}

#[test]
fn create_group_rejects_bad_weights_and_duplicates() {
    let mut k = keeper();
    let clock = NullClock::default();
    for weight in ["0", "-1", "abc", "1e3"] {
        let err = k
            .create_group(
                MsgCreateGroup {
                    admin: addr(ADMIN),
                    members: vec![MemberRequest::new(addr(1), weight)],
                    metadata: String::new(),
                },
                clock.now(),
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument, "weight {weight}");
    }

    let err = k
        .create_group(
            MsgCreateGroup {
                admin: addr(ADMIN),
                members: vec![
                    MemberRequest::new(addr(1), "1"),
                    MemberRequest::new(addr(1), "2"),
                ],
                metadata: String::new(),
            },
            clock.now(),
        )
        .unwrap_err();
    assert!(err.to_string().contains("duplicate member"));
    assert!(k.groups_by_admin(&addr(ADMIN)).unwrap().is_empty());
}

#[test]
fn create_group_rejects_oversized_metadata() {
    let mut k = keeper();
    let clock = NullClock::default();
    let err = k
        .create_group(
            MsgCreateGroup {
                admin: addr(ADMIN),
                members: vec![MemberRequest::new(addr(1), "1")],
                metadata: long_metadata(256),
            },
            clock.now(),
        )
        .unwrap_err();
    assert!(err.to_string().contains("limit exceeded"));
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    // Exactly at the limit is fine.
    k.create_group(
        MsgCreateGroup {
            admin: addr(ADMIN),
            members: vec![MemberRequest::new(addr(1), "1").with_metadata(long_metadata(255))],
            metadata: long_metadata(255),
        },
        clock.now(),
    )
    .unwrap();
}

#[test]
fn update_group_members_adds_reweights_and_removes() {
    let mut k = keeper();
    let clock = NullClock::default();
    let id = create_group_12(&mut k, &clock);
    let original_added_at = clock.now();
    clock.advance(10);

    let version = k
        .update_group_members(
            MsgUpdateGroupMembers {
                admin: addr(ADMIN),
                group_id: id,
                member_updates: vec![
                    MemberRequest::new(addr(1), "0"),
                    MemberRequest::new(addr(2), "5"),
                    MemberRequest::new(addr(3), "0.5"),
                ],
            },
            clock.now(),
        )
        .unwrap();
    assert_eq!(version, 2);

    let info = k.group_info(id).unwrap();
    assert_eq!(info.total_weight, dec("5.5"));
    let members = k.group_members(id).unwrap();
    let addresses: Vec<&Address> = members.iter().map(|m| &m.member.address).collect();
    assert!(!addresses.contains(&&addr(1)));
    let two = members.iter().find(|m| m.member.address == addr(2)).unwrap();
    assert_eq!(two.member.weight, dec("5"));
    assert_eq!(two.member.added_at, original_added_at);
    let three = members.iter().find(|m| m.member.address == addr(3)).unwrap();
    assert_eq!(three.member.added_at, clock.now());

    assert!(k.groups_by_member(&addr(1)).unwrap().is_empty());
    assert_eq!(k.groups_by_member(&addr(3)).unwrap()[0].id, id);
    k.check_invariants().unwrap();
}

#[test]
fn update_group_members_rejects_removing_unknown_member_atomically() {
    let mut k = keeper();
    let clock = NullClock::default();
    let id = create_group_12(&mut k, &clock);
    k.take_events();
    let before = k.store().snapshot();

    let err = k
        .update_group_members(
            MsgUpdateGroupMembers {
                admin: addr(ADMIN),
                group_id: id,
                member_updates: vec![
                    MemberRequest::new(addr(2), "7"),
                    MemberRequest::new(addr(9), "0"),
                ],
            },
            clock.now(),
        )
        .unwrap_err();
    assert!(err.to_string().contains("not part of group"));
    // The reweight of member 2 that preceded the failure is discarded too.
    assert_eq!(k.store().snapshot(), before);
    assert!(k.take_events().is_empty());
}

#[test]
fn group_admin_checks() {
    let mut k = keeper();
    let clock = NullClock::default();
    let id = create_group_12(&mut k, &clock);

    let err = k
        .update_group_metadata(MsgUpdateGroupMetadata {
            admin: addr(STRANGER),
            group_id: id,
            metadata: "hijack".into(),
        })
        .unwrap_err();
    assert!(err.to_string().contains("not group admin"));
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    let err = k
        .update_group_metadata(MsgUpdateGroupMetadata {
            admin: addr(ADMIN),
            group_id: GroupId(42),
            metadata: String::new(),
        })
        .unwrap_err();
    assert!(err.to_string().contains("not found"));
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let version = k
        .update_group_admin(MsgUpdateGroupAdmin {
            admin: addr(ADMIN),
            group_id: id,
            new_admin: addr(50),
        })
        .unwrap();
    assert_eq!(version, 2);
    assert!(k.groups_by_admin(&addr(ADMIN)).unwrap().is_empty());
    assert_eq!(k.groups_by_admin(&addr(50)).unwrap()[0].id, id);

    // The old admin has lost control.
    let err = k
        .update_group_metadata(MsgUpdateGroupMetadata {
            admin: addr(ADMIN),
            group_id: id,
            metadata: String::new(),
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    let version = k
        .update_group_metadata(MsgUpdateGroupMetadata {
            admin: addr(50),
            group_id: id,
            metadata: "renamed".into(),
        })
        .unwrap();
    assert_eq!(version, 3);
    assert_eq!(k.group_info(id).unwrap().metadata, "renamed");
    k.check_invariants().unwrap();
}

#[test]
fn update_group_admin_to_same_admin_is_invalid() {
    let mut k = keeper();
    let clock = NullClock::default();
    let id = create_group_12(&mut k, &clock);
    let err = k
        .update_group_admin(MsgUpdateGroupAdmin {
            admin: addr(ADMIN),
            group_id: id,
            new_admin: addr(ADMIN),
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn leave_group_decrements_weight() {
    let mut k = keeper();
    let clock = NullClock::default();
    let id = create_group_12(&mut k, &clock);
    k.take_events();

    k.leave_group(MsgLeaveGroup {
        address: addr(2),
        group_id: id,
    })
    .unwrap();
    let info = k.group_info(id).unwrap();
    assert_eq!(info.total_weight, dec("1"));
    assert_eq!(info.version, 2);
    assert_eq!(k.group_members(id).unwrap().len(), 1);
    assert!(k.take_events().contains(&GroupEvent::LeaveGroup {
        group_id: id,
        address: addr(2),
    }));

    let err = k
        .leave_group(MsgLeaveGroup {
            address: addr(2),
            group_id: id,
        })
        .unwrap_err();
    assert!(err.to_string().contains("not part of group"));
    k.check_invariants().unwrap();
}

// ---------------------------------------------------------------------------
// 2. Group policies
// ---------------------------------------------------------------------------

#[test]
fn create_group_policy_derives_fresh_addresses() {
    let mut k = keeper();
    let clock = NullClock::default();
    let id = create_group_12(&mut k, &clock);

    let p1 = create_policy(&mut k, &clock, id, DecisionPolicy::threshold("1", 60, 0).unwrap());
    let p2 = create_policy(&mut k, &clock, id, DecisionPolicy::percentage("0.5", 60, 0).unwrap());
    assert_ne!(p1, p2);
    assert!(cohort_types::validate_address(p1.as_str()));

    let info = k.group_policy_info(&p1).unwrap();
    assert_eq!(info.group_id, id);
    assert_eq!(info.admin, addr(ADMIN));
    assert_eq!(info.version, 1);
    assert_eq!(k.group_policies_by_group(id).unwrap().len(), 2);
    assert_eq!(k.group_policies_by_admin(&addr(ADMIN)).unwrap().len(), 2);
    k.check_invariants().unwrap();
}

#[test]
fn create_group_policy_requires_group_admin() {
    let mut k = keeper();
    let clock = NullClock::default();
    let id = create_group_12(&mut k, &clock);
    let err = k
        .create_group_policy(
            MsgCreateGroupPolicy {
                admin: addr(1),
                group_id: id,
                metadata: String::new(),
                decision_policy: DecisionPolicy::threshold("1", 60, 0).unwrap(),
            },
            clock.now(),
        )
        .unwrap_err();
    assert!(err.to_string().contains("not group admin"));
    assert!(k.group_policies_by_group(id).unwrap().is_empty());
}

#[test]
fn invalid_decision_policies_are_rejected() {
    let err = DecisionPolicy::percentage("1.5", 60, 0).unwrap_err();
    assert!(err.to_string().contains("percentage must be > 0 and <= 1"));
    let err = DecisionPolicy::percentage("0", 60, 0).unwrap_err();
    assert!(err.to_string().contains("percentage must be > 0 and <= 1"));
    let err = DecisionPolicy::threshold("0", 60, 0).unwrap_err();
    assert!(err.to_string().contains("expected a positive decimal"));
    let err = DecisionPolicy::threshold("1", 0, 0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn threshold_above_total_weight_is_accepted() {
    let mut k = keeper();
    let clock = NullClock::default();
    let id = create_group_12(&mut k, &clock);
    create_policy(&mut k, &clock, id, DecisionPolicy::threshold("1000", 60, 0).unwrap());
}

#[test]
fn min_execution_period_beyond_expiry_is_rejected() {
    let mut k = keeper();
    let clock = NullClock::default();
    let id = create_group_12(&mut k, &clock);
    let max = k.config().max_execution_period_secs;
    let err = k
        .create_group_policy(
            MsgCreateGroupPolicy {
                admin: addr(ADMIN),
                group_id: id,
                metadata: String::new(),
                decision_policy: DecisionPolicy::threshold("1", 60, 60 + max + 1).unwrap(),
            },
            clock.now(),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn update_group_policy_fields() {
    let (mut k, _clock, _group, policy) = setup(60, 0);

    let err = k
        .update_group_policy_metadata(MsgUpdateGroupPolicyMetadata {
            admin: addr(STRANGER),
            group_policy_address: policy.clone(),
            metadata: String::new(),
        })
        .unwrap_err();
    assert!(err.to_string().contains("not group policy admin"));

    let v = k
        .update_group_policy_metadata(MsgUpdateGroupPolicyMetadata {
            admin: addr(ADMIN),
            group_policy_address: policy.clone(),
            metadata: "treasury".into(),
        })
        .unwrap();
    assert_eq!(v, 2);

    let v = k
        .update_group_policy_decision_policy(MsgUpdateGroupPolicyDecisionPolicy {
            admin: addr(ADMIN),
            group_policy_address: policy.clone(),
            decision_policy: DecisionPolicy::percentage("0.5", 120, 0).unwrap(),
        })
        .unwrap();
    assert_eq!(v, 3);

    let v = k
        .update_group_policy_admin(MsgUpdateGroupPolicyAdmin {
            admin: addr(ADMIN),
            group_policy_address: policy.clone(),
            new_admin: addr(60),
        })
        .unwrap();
    assert_eq!(v, 4);

    let info = k.group_policy_info(&policy).unwrap();
    assert_eq!(info.metadata, "treasury");
    assert_eq!(info.admin, addr(60));
    assert_eq!(info.decision_policy.voting_period(), 120);
    assert!(k.group_policies_by_admin(&addr(ADMIN)).unwrap().is_empty());
    assert_eq!(k.group_policies_by_admin(&addr(60)).unwrap().len(), 1);
    assert_eq!(k.take_events().len(), 3);
    k.check_invariants().unwrap();
}

#[test]
fn unknown_policy_is_not_found() {
    let mut k = keeper();
    let err = k
        .update_group_policy_metadata(MsgUpdateGroupPolicyMetadata {
            admin: addr(ADMIN),
            group_policy_address: addr(77),
            metadata: String::new(),
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn create_group_with_policy_as_admin() {
    let mut k = keeper();
    let clock = NullClock::default();
    let (group_id, policy) = k
        .create_group_with_policy(
            MsgCreateGroupWithPolicy {
                admin: addr(ADMIN),
                members: vec![
                    MemberRequest::new(addr(1), "1"),
                    MemberRequest::new(addr(2), "2"),
                ],
                group_metadata: "dao".into(),
                group_policy_metadata: "dao policy".into(),
                group_policy_as_admin: true,
                decision_policy: DecisionPolicy::threshold("2", 60, 0).unwrap(),
            },
            clock.now(),
        )
        .unwrap();

    let group = k.group_info(group_id).unwrap();
    let info = k.group_policy_info(&policy).unwrap();
    assert_eq!(group.admin, policy);
    assert_eq!(info.admin, policy);
    assert_eq!(group.version, 1);
    assert_eq!(info.version, 1);
    assert!(k.groups_by_admin(&addr(ADMIN)).unwrap().is_empty());
    assert_eq!(k.groups_by_admin(&policy).unwrap().len(), 1);
    k.check_invariants().unwrap();
}

#[test]
fn create_group_with_policy_rolls_back_group_on_policy_error() {
    let mut k = keeper();
    let clock = NullClock::default();
    let max = k.config().max_execution_period_secs;
    // Passes stateless checks; fails only once the group already exists.
    let err = k
        .create_group_with_policy(
            MsgCreateGroupWithPolicy {
                admin: addr(ADMIN),
                members: vec![MemberRequest::new(addr(1), "1")],
                group_metadata: String::new(),
                group_policy_metadata: String::new(),
                group_policy_as_admin: false,
                decision_policy: DecisionPolicy::threshold("1", 60, 60 + max + 1).unwrap(),
            },
            clock.now(),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(k.store().is_empty());
    assert!(k.take_events().is_empty());
}

// ---------------------------------------------------------------------------
// 3. Proposals and votes
// ---------------------------------------------------------------------------

#[test]
fn scenario_a_decisive_vote_accepts_before_period_end() {
    let (mut k, clock, _group, policy) = setup(1, 0);
    let id = submit(&mut k, &clock, &policy, 1, vec![]).unwrap();

    vote(&mut k, &clock, id, 2, VoteOption::Yes).unwrap();
    let p = k.proposal(id).unwrap();
    assert_eq!(p.status, ProposalStatus::Accepted);
    assert_eq!(p.final_tally_result.yes_count, dec("2"));
    assert_eq!(p.executor_result, ExecutorResult::NotRun);
    assert!(clock.now() < p.voting_period_end);
}

#[test]
fn scenario_b_sweep_rejects_undecided_proposal() {
    let (mut k, clock, _group, policy) = setup(1, 0);
    let id = submit(&mut k, &clock, &policy, 1, vec![]).unwrap();

    vote(&mut k, &clock, id, 1, VoteOption::Yes).unwrap();
    assert_eq!(k.proposal(id).unwrap().status, ProposalStatus::Submitted);
    assert_eq!(k.tally_result(id).unwrap().yes_count, dec("1"));

    // Not due yet.
    assert!(k.sweep(clock.now()).unwrap().is_empty());

    clock.advance(1);
    assert_eq!(k.sweep(clock.now()).unwrap(), vec![id]);
    let p = k.proposal(id).unwrap();
    assert_eq!(p.status, ProposalStatus::Rejected);
    assert_eq!(p.final_tally_result.yes_count, dec("1"));
}

#[test]
fn sweep_is_idempotent_and_never_deletes() {
    let (mut k, clock, _group, policy) = setup(10, 0);
    let undecided = submit(&mut k, &clock, &policy, 1, vec![]).unwrap();
    let accepted = submit(&mut k, &clock, &policy, 2, vec![]).unwrap();
    vote(&mut k, &clock, accepted, 2, VoteOption::Yes).unwrap();

    clock.advance(10);
    assert_eq!(k.sweep(clock.now()).unwrap(), vec![undecided]);
    let snapshot = k.store().snapshot();
    k.take_events();

    clock.advance(100);
    assert!(k.sweep(clock.now()).unwrap().is_empty());
    assert_eq!(k.store().snapshot(), snapshot);
    assert!(k.take_events().is_empty());
    assert_eq!(k.proposal(accepted).unwrap().status, ProposalStatus::Accepted);
    assert_eq!(k.proposal(undecided).unwrap().status, ProposalStatus::Rejected);
}

#[test]
fn sweep_only_visits_submitted_proposals() {
    let (mut k, clock, _group, policy) = setup(10, 0);
    let rejected = submit(&mut k, &clock, &policy, 1, vec![]).unwrap();
    vote(&mut k, &clock, rejected, 2, VoteOption::No).unwrap();
    let withdrawn = submit(&mut k, &clock, &policy, 1, vec![]).unwrap();
    k.withdraw_proposal(MsgWithdrawProposal {
        proposal_id: withdrawn,
        address: addr(1),
    })
    .unwrap();
    let open = submit(&mut k, &clock, &policy, 1, vec![]).unwrap();

    clock.advance(10);
    let due = clock.now();
    assert_eq!(state::pending_ids_by_vp_end(k.store(), due).unwrap(), vec![open]);
    // The query index still lists every stored proposal.
    assert_eq!(
        state::proposal_ids_by_vp_end(k.store(), due).unwrap(),
        vec![rejected, withdrawn, open]
    );

    assert_eq!(k.sweep(due).unwrap(), vec![open]);
    assert!(state::pending_ids_by_vp_end(k.store(), due).unwrap().is_empty());
    assert_eq!(k.proposals_by_voting_period_end(due).unwrap().len(), 3);
    k.check_invariants().unwrap();
}

#[test]
fn sweep_finalizes_proposal_without_votes() {
    let (mut k, clock, _group, policy) = setup(5, 0);
    let id = submit(&mut k, &clock, &policy, 1, vec![]).unwrap();
    clock.advance(5);
    k.sweep(clock.now()).unwrap();
    let p = k.proposal(id).unwrap();
    assert_eq!(p.status, ProposalStatus::Rejected);
    assert_eq!(p.final_tally_result.yes_count, Dec::ZERO);
}

#[test]
fn submit_requires_member_proposers() {
    let (mut k, clock, _group, policy) = setup(60, 0);
    // The group admin is not a member.
    let err = submit(&mut k, &clock, &policy, ADMIN, vec![]).unwrap_err();
    assert!(err.to_string().contains("not part of group"));
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    let err = k
        .submit_proposal(
            MsgSubmitProposal {
                group_policy_address: policy.clone(),
                proposers: vec![],
                metadata: String::new(),
                actions: vec![],
                exec: Exec::Unspecified,
            },
            clock.now(),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let err = k
        .submit_proposal(
            MsgSubmitProposal {
                group_policy_address: policy.clone(),
                proposers: vec![addr(1), addr(1)],
                metadata: String::new(),
                actions: vec![],
                exec: Exec::Unspecified,
            },
            clock.now(),
        )
        .unwrap_err();
    assert!(err.to_string().contains("duplicate proposer"));
    assert!(k.proposals_by_group_policy(&policy).unwrap().is_empty());
}

#[test]
fn submit_checks_action_signers_and_routes() {
    let (mut k, clock, _group, policy) = setup(60, 0);

    let foreign = NullBank::send_action(&addr(1), &addr(2), 1).unwrap();
    let err = submit(&mut k, &clock, &policy, 1, vec![foreign]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(err.to_string().contains("must be authorized by the group policy account"));

    let unknown = Action::new("/nope.Do", vec![]);
    let err = submit(&mut k, &clock, &policy, 1, vec![unknown]).unwrap_err();
    assert!(matches!(err, GroupError::UnknownAction(ref url) if url == "/nope.Do"));

    let own = NullBank::send_action(&policy, &addr(3), 1).unwrap();
    let id = submit(&mut k, &clock, &policy, 1, vec![own.clone()]).unwrap();
    let p = k.proposal(id).unwrap();
    assert_eq!(p.actions, vec![own]);
    assert_eq!(p.group_version, 1);
    assert_eq!(p.group_policy_version, 1);
    assert_eq!(p.voting_period_end.as_secs(), clock.now().as_secs() + 60);
}

#[test]
fn submit_rejects_oversized_metadata() {
    let (mut k, clock, _group, policy) = setup(60, 0);
    let err = k
        .submit_proposal(
            MsgSubmitProposal {
                group_policy_address: policy,
                proposers: vec![addr(1)],
                metadata: long_metadata(256),
                actions: vec![],
                exec: Exec::Unspecified,
            },
            clock.now(),
        )
        .unwrap_err();
    assert!(err.to_string().contains("limit exceeded"));
}

#[test]
fn vote_rejections_leave_votes_unchanged() {
    let (mut k, clock, _group, policy) = setup(60, 0);
    let id = submit(&mut k, &clock, &policy, 1, vec![]).unwrap();

    let err = vote(&mut k, &clock, id, STRANGER, VoteOption::Yes).unwrap_err();
    assert!(err.to_string().contains("not part of group"));
    assert!(k.votes_by_proposal(id).unwrap().is_empty());

    let err = vote(&mut k, &clock, id, 1, VoteOption::Unspecified).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    vote(&mut k, &clock, id, 1, VoteOption::No).unwrap();
    let err = vote(&mut k, &clock, id, 1, VoteOption::Yes).unwrap_err();
    assert!(matches!(err, GroupError::AlreadyVoted(_)));
    let original = k.vote_by_proposal_voter(id, &addr(1)).unwrap();
    assert_eq!(original.option, VoteOption::No);
    assert_eq!(k.votes_by_proposal(id).unwrap().len(), 1);

    let err = vote(&mut k, &clock, ProposalId(99), 1, VoteOption::Yes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn vote_after_period_end_fails() {
    let (mut k, clock, _group, policy) = setup(60, 0);
    let id = submit(&mut k, &clock, &policy, 1, vec![]).unwrap();
    clock.advance(60);
    let err = vote(&mut k, &clock, id, 2, VoteOption::Yes).unwrap_err();
    assert!(matches!(err, GroupError::VotingPeriodEnded(_)));
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

#[test]
fn vote_on_closed_proposal_fails() {
    let (mut k, clock, _group, policy) = setup(60, 0);
    let id = submit(&mut k, &clock, &policy, 1, vec![]).unwrap();
    vote(&mut k, &clock, id, 2, VoteOption::Yes).unwrap();
    let err = vote(&mut k, &clock, id, 1, VoteOption::No).unwrap_err();
    assert!(matches!(err, GroupError::ProposalClosed { .. }));
}

#[test]
fn no_votes_can_reject_early() {
    let (mut k, clock, _group, policy) = setup(60, 0);
    let id = submit(&mut k, &clock, &policy, 1, vec![]).unwrap();
    // Weight 2 voting NO leaves only weight 1 uncast: YES can no longer reach 2.
    vote(&mut k, &clock, id, 2, VoteOption::No).unwrap();
    let p = k.proposal(id).unwrap();
    assert_eq!(p.status, ProposalStatus::Rejected);
    assert_eq!(p.final_tally_result.no_count, dec("2"));
}

#[test]
fn percentage_policy_uses_current_total_weight() {
    let mut k = keeper();
    let clock = NullClock::default();
    let group = create_group_12(&mut k, &clock);
    let policy = create_policy(
        &mut k,
        &clock,
        group,
        DecisionPolicy::percentage("0.5", 60, 0).unwrap(),
    );
    let id = submit(&mut k, &clock, &policy, 1, vec![]).unwrap();
    // 1 of 3 is below half.
    vote(&mut k, &clock, id, 1, VoteOption::Yes).unwrap();
    assert_eq!(k.proposal(id).unwrap().status, ProposalStatus::Submitted);

    // Member 2 leaves: now 1 of 1.
    k.leave_group(MsgLeaveGroup {
        address: addr(2),
        group_id: group,
    })
    .unwrap();
    clock.advance(60);
    k.sweep(clock.now()).unwrap();
    assert_eq!(k.proposal(id).unwrap().status, ProposalStatus::Accepted);
}

#[test]
fn tally_excludes_members_who_left() {
    let mut k = keeper();
    let clock = NullClock::default();
    let group = k
        .create_group(
            MsgCreateGroup {
                admin: addr(ADMIN),
                members: vec![
                    MemberRequest::new(addr(1), "1"),
                    MemberRequest::new(addr(2), "2"),
                    MemberRequest::new(addr(3), "1"),
                ],
                metadata: String::new(),
            },
            clock.now(),
        )
        .unwrap();
    let policy = create_policy(&mut k, &clock, group, DecisionPolicy::threshold("3", 60, 0).unwrap());
    let id = submit(&mut k, &clock, &policy, 1, vec![]).unwrap();

    vote(&mut k, &clock, id, 2, VoteOption::Yes).unwrap();
    assert_eq!(k.tally_result(id).unwrap().yes_count, dec("2"));

    k.leave_group(MsgLeaveGroup {
        address: addr(2),
        group_id: group,
    })
    .unwrap();
    assert_eq!(k.tally_result(id).unwrap().yes_count, Dec::ZERO);
    // The vote row itself survives.
    assert!(k.vote_by_proposal_voter(id, &addr(2)).is_ok());

    // Remaining weight 2 can never reach 3.
    vote(&mut k, &clock, id, 1, VoteOption::Yes).unwrap();
    let p = k.proposal(id).unwrap();
    assert_eq!(p.status, ProposalStatus::Rejected);
    assert_eq!(p.final_tally_result.yes_count, dec("1"));
    k.check_invariants().unwrap();
}

#[test]
fn tally_is_repeatable() {
    let (mut k, clock, _group, policy) = setup(60, 0);
    let id = submit(&mut k, &clock, &policy, 1, vec![]).unwrap();
    vote(&mut k, &clock, id, 1, VoteOption::Abstain).unwrap();
    let first = k.tally_result(id).unwrap();
    let second = k.tally_result(id).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.abstain_count, dec("1"));
}

// ---------------------------------------------------------------------------
// 4. Withdrawal
// ---------------------------------------------------------------------------

#[test]
fn scenario_d_withdraw_twice_names_status() {
    let (mut k, clock, _group, policy) = setup(60, 0);
    let id = submit(&mut k, &clock, &policy, 1, vec![]).unwrap();

    k.withdraw_proposal(MsgWithdrawProposal {
        proposal_id: id,
        address: addr(1),
    })
    .unwrap();
    assert_eq!(k.proposal(id).unwrap().status, ProposalStatus::Withdrawn);
    let before = k.store().snapshot();

    let err = k
        .withdraw_proposal(MsgWithdrawProposal {
            proposal_id: id,
            address: addr(1),
        })
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "cannot withdraw a proposal with the status of WITHDRAWN"
    );
    assert_eq!(err.kind(), ErrorKind::InvalidState);
    assert_eq!(k.store().snapshot(), before);

    let err = k.tally_result(id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

#[test]
fn withdraw_authorization() {
    let (mut k, clock, _group, policy) = setup(60, 0);
    let a = submit(&mut k, &clock, &policy, 1, vec![]).unwrap();
    let b = submit(&mut k, &clock, &policy, 1, vec![]).unwrap();
    let c = submit(&mut k, &clock, &policy, 1, vec![]).unwrap();

    // Member 2 is neither proposer nor admin.
    let err = k
        .withdraw_proposal(MsgWithdrawProposal {
            proposal_id: a,
            address: addr(2),
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    k.withdraw_proposal(MsgWithdrawProposal {
        proposal_id: a,
        address: addr(ADMIN),
    })
    .unwrap();
    k.withdraw_proposal(MsgWithdrawProposal {
        proposal_id: b,
        address: policy.clone(),
    })
    .unwrap();
    assert_eq!(k.proposal(c).unwrap().status, ProposalStatus::Submitted);
}

#[test]
fn withdraw_accepted_proposal_fails() {
    let (mut k, clock, _group, policy) = setup(60, 0);
    let id = submit(&mut k, &clock, &policy, 1, vec![]).unwrap();
    vote(&mut k, &clock, id, 2, VoteOption::Yes).unwrap();
    let err = k
        .withdraw_proposal(MsgWithdrawProposal {
            proposal_id: id,
            address: addr(1),
        })
        .unwrap_err();
    assert!(err.to_string().contains("status of ACCEPTED"));
}

// ---------------------------------------------------------------------------
// 5. Execution
// ---------------------------------------------------------------------------

#[test]
fn scenario_c_failed_action_rolls_back_all_effects() {
    let (mut k, clock, _group, policy) = setup(60, 0);
    NullBank::fund(k.store_mut(), &policy, 15).unwrap();

    let actions = vec![
        NullBank::send_action(&policy, &addr(3), 10).unwrap(),
        NullBank::send_action(&policy, &addr(3), 10).unwrap(),
    ];
    let id = submit(&mut k, &clock, &policy, 1, actions).unwrap();
    vote(&mut k, &clock, id, 2, VoteOption::Yes).unwrap();
    k.take_events();

    assert_eq!(exec(&mut k, &clock, id).unwrap(), ExecutorResult::Failure);
    assert_eq!(NullBank::balance(k.store(), &policy).unwrap(), 15);
    assert_eq!(NullBank::balance(k.store(), &addr(3)).unwrap(), 0);

    let p = k.proposal(id).unwrap();
    assert_eq!(p.status, ProposalStatus::Accepted);
    assert_eq!(p.executor_result, ExecutorResult::Failure);
    assert_eq!(k.votes_by_proposal(id).unwrap().len(), 1);

    let events = k.take_events();
    assert!(matches!(
        events.as_slice(),
        [GroupEvent::Exec { result: ExecutorResult::Failure, logs: Some(log), .. }]
            if log.contains("insufficient funds")
    ));

    // Fund the shortfall and retry.
    NullBank::fund(k.store_mut(), &policy, 5).unwrap();
    assert_eq!(exec(&mut k, &clock, id).unwrap(), ExecutorResult::Success);
    assert_eq!(NullBank::balance(k.store(), &policy).unwrap(), 0);
    assert_eq!(NullBank::balance(k.store(), &addr(3)).unwrap(), 20);
    k.check_invariants().unwrap();
}

#[test]
fn scenario_e_successful_exec_prunes_proposal_and_votes() {
    let (mut k, clock, _group, policy) = setup(60, 0);
    NullBank::fund(k.store_mut(), &policy, 100).unwrap();
    let id = submit(
        &mut k,
        &clock,
        &policy,
        1,
        vec![NullBank::send_action(&policy, &addr(3), 40).unwrap()],
    )
    .unwrap();
    vote(&mut k, &clock, id, 1, VoteOption::Yes).unwrap();
    vote(&mut k, &clock, id, 2, VoteOption::Yes).unwrap();

    assert_eq!(exec(&mut k, &clock, id).unwrap(), ExecutorResult::Success);
    assert_eq!(NullBank::balance(k.store(), &addr(3)).unwrap(), 40);

    let err = k.proposal(id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(k.votes_by_proposal(id).unwrap().is_empty());
    assert!(k.votes_by_voter(&addr(1)).unwrap().is_empty());
    assert!(k.proposals_by_group_policy(&policy).unwrap().is_empty());
    assert!(k.proposals_by_voting_period_end(clock.now().checked_add_secs(1000).unwrap())
        .unwrap()
        .is_empty());

    let err = exec(&mut k, &clock, id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    k.check_invariants().unwrap();
}

#[test]
fn exec_on_undecided_proposal_is_not_run() {
    let (mut k, clock, _group, policy) = setup(60, 0);
    let id = submit(&mut k, &clock, &policy, 1, vec![]).unwrap();
    vote(&mut k, &clock, id, 1, VoteOption::Yes).unwrap();

    assert_eq!(exec(&mut k, &clock, id).unwrap(), ExecutorResult::NotRun);
    assert_eq!(k.proposal(id).unwrap().status, ProposalStatus::Submitted);

    // After the period the same call finalizes and persists REJECTED.
    clock.advance(60);
    assert_eq!(exec(&mut k, &clock, id).unwrap(), ExecutorResult::NotRun);
    assert_eq!(k.proposal(id).unwrap().status, ProposalStatus::Rejected);

    // Repeating it gives the same answer.
    assert_eq!(exec(&mut k, &clock, id).unwrap(), ExecutorResult::NotRun);
    assert_eq!(k.proposal(id).unwrap().status, ProposalStatus::Rejected);
}

#[test]
fn exec_on_rejected_proposal_is_not_run_and_not_pruned() {
    let (mut k, clock, _group, policy) = setup(60, 0);
    NullBank::fund(k.store_mut(), &policy, 5).unwrap();
    let id = submit(
        &mut k,
        &clock,
        &policy,
        2,
        vec![NullBank::send_action(&policy, &addr(3), 5).unwrap()],
    )
    .unwrap();
    vote(&mut k, &clock, id, 2, VoteOption::No).unwrap();
    assert_eq!(k.proposal(id).unwrap().status, ProposalStatus::Rejected);
    k.take_events();
    let before = k.store().snapshot();

    assert_eq!(exec(&mut k, &clock, id).unwrap(), ExecutorResult::NotRun);

    let p = k.proposal(id).unwrap();
    assert_eq!(p.status, ProposalStatus::Rejected);
    assert_eq!(p.executor_result, ExecutorResult::NotRun);
    assert_eq!(k.votes_by_proposal(id).unwrap().len(), 1);
    assert_eq!(NullBank::balance(k.store(), &addr(3)).unwrap(), 0);
    assert_eq!(k.store().snapshot(), before);
    assert!(k.take_events().is_empty());
}

#[test]
fn exec_on_withdrawn_proposal_fails() {
    let (mut k, clock, _group, policy) = setup(60, 0);
    let id = submit(&mut k, &clock, &policy, 1, vec![]).unwrap();
    k.withdraw_proposal(MsgWithdrawProposal {
        proposal_id: id,
        address: addr(1),
    })
    .unwrap();
    let err = exec(&mut k, &clock, id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

#[test]
fn exec_respects_min_execution_period() {
    let (mut k, clock, _group, policy) = setup(100, 50);
    NullBank::fund(k.store_mut(), &policy, 1).unwrap();
    let id = submit(
        &mut k,
        &clock,
        &policy,
        1,
        vec![NullBank::send_action(&policy, &addr(3), 1).unwrap()],
    )
    .unwrap();

    // Vote with try-exec: accepted, but too early to run.
    k.vote(
        MsgVote {
            proposal_id: id,
            voter: addr(2),
            option: VoteOption::Yes,
            metadata: String::new(),
            exec: Exec::Try,
        },
        clock.now(),
    )
    .unwrap();
    let p = k.proposal(id).unwrap();
    assert_eq!(p.status, ProposalStatus::Accepted);
    assert_eq!(p.executor_result, ExecutorResult::NotRun);

    let err = exec(&mut k, &clock, id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
    assert!(err.to_string().contains("must wait"));

    clock.advance(50);
    assert_eq!(exec(&mut k, &clock, id).unwrap(), ExecutorResult::Success);
    assert_eq!(NullBank::balance(k.store(), &addr(3)).unwrap(), 1);
}

#[test]
fn exec_after_expiry_fails() {
    let (mut k, clock, _group, policy) = setup(60, 0);
    let id = submit(&mut k, &clock, &policy, 1, vec![]).unwrap();
    vote(&mut k, &clock, id, 2, VoteOption::Yes).unwrap();

    let max = k.config().max_execution_period_secs;
    clock.advance(60 + max + 1);
    let err = exec(&mut k, &clock, id).unwrap_err();
    assert!(err.to_string().contains("expired"));
    assert_eq!(k.proposal(id).unwrap().executor_result, ExecutorResult::NotRun);
}

#[test]
fn submit_with_try_exec_runs_immediately() {
    let (mut k, clock, _group, policy) = setup(60, 0);
    NullBank::fund(k.store_mut(), &policy, 7).unwrap();

    let id = k
        .submit_proposal(
            MsgSubmitProposal {
                group_policy_address: policy.clone(),
                proposers: vec![addr(2)],
                metadata: "pay".into(),
                actions: vec![NullBank::send_action(&policy, &addr(9), 7).unwrap()],
                exec: Exec::Try,
            },
            clock.now(),
        )
        .unwrap();

    assert_eq!(NullBank::balance(k.store(), &addr(9)).unwrap(), 7);
    assert_eq!(k.proposal(id).unwrap_err().kind(), ErrorKind::NotFound);

    let events = k.take_events();
    assert_eq!(events.first(), Some(&GroupEvent::SubmitProposal { proposal_id: id }));
    assert!(events.contains(&GroupEvent::Vote { proposal_id: id }));
    assert!(events.iter().any(|e| matches!(
        e,
        GroupEvent::ProposalFinalized { status: ProposalStatus::Accepted, .. }
    )));
    assert_eq!(
        events.last(),
        Some(&GroupEvent::Exec {
            proposal_id: id,
            result: ExecutorResult::Success,
            logs: None,
        })
    );
}

#[test]
fn submit_with_try_exec_keeps_undecided_proposal() {
    let (mut k, clock, _group, policy) = setup(60, 0);
    let id = k
        .submit_proposal(
            MsgSubmitProposal {
                group_policy_address: policy,
                proposers: vec![addr(1)],
                metadata: String::new(),
                actions: vec![],
                exec: Exec::Try,
            },
            clock.now(),
        )
        .unwrap();
    let p = k.proposal(id).unwrap();
    assert_eq!(p.status, ProposalStatus::Submitted);
    assert_eq!(k.votes_by_proposal(id).unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// 6. Queries
// ---------------------------------------------------------------------------

#[test]
fn proposals_by_voting_period_end_are_time_ordered() {
    let mut k = keeper();
    let clock = NullClock::default();
    let group = create_group_12(&mut k, &clock);
    let slow = create_policy(&mut k, &clock, group, DecisionPolicy::threshold("2", 300, 0).unwrap());
    let fast = create_policy(&mut k, &clock, group, DecisionPolicy::threshold("2", 100, 0).unwrap());

    let late = submit(&mut k, &clock, &slow, 1, vec![]).unwrap();
    let early = submit(&mut k, &clock, &fast, 1, vec![]).unwrap();

    let until = clock.now().checked_add_secs(300).unwrap();
    let ids: Vec<ProposalId> = k
        .proposals_by_voting_period_end(until)
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(ids, vec![early, late]);

    let until = clock.now().checked_add_secs(100).unwrap();
    assert_eq!(k.proposals_by_voting_period_end(until).unwrap().len(), 1);
    assert_eq!(k.proposals_by_group_policy(&slow).unwrap()[0].id, late);
}

#[test]
fn votes_by_voter_span_proposals() {
    let (mut k, clock, _group, policy) = setup(60, 0);
    let a = submit(&mut k, &clock, &policy, 1, vec![]).unwrap();
    let b = submit(&mut k, &clock, &policy, 1, vec![]).unwrap();
    vote(&mut k, &clock, a, 1, VoteOption::Yes).unwrap();
    vote(&mut k, &clock, b, 1, VoteOption::No).unwrap();

    let votes = k.votes_by_voter(&addr(1)).unwrap();
    assert_eq!(votes.len(), 2);
    assert_eq!(votes[0].proposal_id, a);
    assert_eq!(votes[1].option, VoteOption::No);

    let err = k.vote_by_proposal_voter(a, &addr(2)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn group_members_of_unknown_group_is_not_found() {
    let k = keeper();
    assert_eq!(k.group_members(GroupId(5)).unwrap_err().kind(), ErrorKind::NotFound);
}

// ---------------------------------------------------------------------------
// 7. Atomicity, events, config
// ---------------------------------------------------------------------------

#[test]
fn rejected_commit_leaves_no_state_and_no_events() {
    let mut k = keeper();
    let clock = NullClock::default();
    k.store_mut().set_reject_writes(true);

    let err = k
        .create_group(
            MsgCreateGroup {
                admin: addr(ADMIN),
                members: vec![MemberRequest::new(addr(1), "1")],
                metadata: String::new(),
            },
            clock.now(),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
    assert!(k.take_events().is_empty());

    k.store_mut().set_reject_writes(false);
    assert!(k.store().is_empty());
    // The sequence was not consumed.
    assert_eq!(create_group_12(&mut k, &clock), GroupId(1));
}

#[test]
fn failed_operations_emit_nothing() {
    let (mut k, clock, _group, policy) = setup(60, 0);
    let id = submit(&mut k, &clock, &policy, 1, vec![]).unwrap();
    k.take_events();
    let _ = vote(&mut k, &clock, id, STRANGER, VoteOption::Yes);
    let _ = submit(&mut k, &clock, &policy, STRANGER, vec![]);
    assert!(k.take_events().is_empty());
}

#[test]
fn config_limits_metadata() {
    let config = GroupConfig::from_toml_str("max_metadata_len = 4").unwrap();
    assert_eq!(config.max_execution_period_secs, GroupConfig::default().max_execution_period_secs);
    let mut k = keeper_with(config);
    let clock = NullClock::default();
    let err = k
        .create_group(
            MsgCreateGroup {
                admin: addr(ADMIN),
                members: vec![MemberRequest::new(addr(1), "1")],
                metadata: "12345".into(),
            },
            clock.now(),
        )
        .unwrap_err();
    assert!(err.to_string().contains("limit exceeded"));
}

// ---------------------------------------------------------------------------
// 8. Genesis and invariants
// ---------------------------------------------------------------------------

fn populated() -> (GroupKeeper<NullStore>, NullClock) {
    let (mut k, clock, group, policy) = setup(60, 0);
    let a = submit(&mut k, &clock, &policy, 1, vec![]).unwrap();
    vote(&mut k, &clock, a, 1, VoteOption::Yes).unwrap();
    let b = submit(&mut k, &clock, &policy, 2, vec![]).unwrap();
    vote(&mut k, &clock, b, 2, VoteOption::Yes).unwrap();
    k.update_group_members(
        MsgUpdateGroupMembers {
            admin: addr(ADMIN),
            group_id: group,
            member_updates: vec![MemberRequest::new(addr(4), "3")],
        },
        clock.now(),
    )
    .unwrap();
    (k, clock)
}

#[test]
fn genesis_roundtrip_through_json() {
    let (k, clock) = populated();
    let exported = k.export_genesis().unwrap();
    assert_eq!(exported.group_seq, 1);
    assert_eq!(exported.group_policy_seq, 1);
    assert_eq!(exported.proposal_seq, 2);
    assert_eq!(exported.group_members.len(), 3);
    assert_eq!(exported.votes.len(), 2);

    let json = exported.to_json().unwrap();
    let parsed = GenesisState::from_json(&json).unwrap();
    assert_eq!(parsed, exported);

    let mut restored = keeper();
    restored.init_genesis(parsed).unwrap();
    assert_eq!(restored.export_genesis().unwrap(), exported);
    assert_eq!(restored.store().snapshot(), k.store().snapshot());
    restored.check_invariants().unwrap();

    // Sequences continue where the export left off.
    assert_eq!(create_group_12(&mut restored, &clock), GroupId(2));
}

#[test]
fn init_genesis_requires_empty_store() {
    let (k, _clock) = populated();
    let exported = k.export_genesis().unwrap();
    let (mut other, _clock) = populated();
    let err = other.init_genesis(exported).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

#[test]
fn init_genesis_rejects_broken_total_weight() {
    let (k, _clock) = populated();
    let mut state = k.export_genesis().unwrap();
    state.groups[0].total_weight = dec("999");

    let mut restored = keeper();
    let err = restored.init_genesis(state).unwrap_err();
    assert!(matches!(err, GroupError::Invariant(_)));
    assert!(restored.store().is_empty());
}

#[test]
fn init_genesis_rejects_stale_sequence() {
    let (k, _clock) = populated();
    let mut state = k.export_genesis().unwrap();
    state.proposal_seq = 1;

    let mut restored = keeper();
    let err = restored.init_genesis(state).unwrap_err();
    assert!(matches!(err, GroupError::Invariant(_)));
    assert!(restored.store().is_empty());
}

#[test]
fn init_genesis_rejects_orphan_vote() {
    let (k, _clock) = populated();
    let mut state = k.export_genesis().unwrap();
    state.proposals.clear();
    state.proposal_seq = 2;

    let mut restored = keeper();
    assert!(restored.init_genesis(state).is_err());
    assert!(restored.store().is_empty());
}

#[test]
fn policy_creation_skips_taken_accounts_after_genesis() {
    let (mut k, clock, group_id, first) = setup(60, 0);
    let second = create_policy(
        &mut k,
        &clock,
        group_id,
        DecisionPolicy::threshold("1", 60, 0).unwrap(),
    );
    let mut state = k.export_genesis().unwrap();
    state.group_policies.retain(|p| p.address == second);
    state.group_policy_seq = 1;

    let mut restored = keeper();
    restored.init_genesis(state).unwrap();

    // Sequence 2 derives the account that already exists, so it is skipped.
    let third = create_policy(
        &mut restored,
        &clock,
        group_id,
        DecisionPolicy::threshold("1", 60, 0).unwrap(),
    );
    assert_eq!(third, Address::derive(b"group_policy", &3u64.to_be_bytes()));
    assert_ne!(third, first);
    assert_ne!(third, second);

    let fourth = create_policy(
        &mut restored,
        &clock,
        group_id,
        DecisionPolicy::threshold("1", 60, 0).unwrap(),
    );
    assert_eq!(fourth, Address::derive(b"group_policy", &4u64.to_be_bytes()));
    assert_eq!(restored.export_genesis().unwrap().group_policy_seq, 4);
    assert_eq!(restored.group_policies_by_group(group_id).unwrap().len(), 3);
    restored.check_invariants().unwrap();
}

#[test]
fn empty_genesis_is_valid() {
    let mut k = keeper();
    k.init_genesis(GenesisState::default()).unwrap();
    assert_eq!(k.export_genesis().unwrap(), GenesisState::default());
}
