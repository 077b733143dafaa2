//! Version chain integrity across lifecycle operations

use keyward::{
    ChangeType, Effect, FieldChangeType, HistoryOrder, InMemoryPolicyStore, InMemoryVersionStore,
    Policy, PolicyError, PolicyLifecycle, PolicyStore, RbacDirectory, Role, VersionMetadata,
    VersionStore,
};
use proptest::prelude::*;
use std::sync::Arc;

fn lifecycle() -> PolicyLifecycle {
    PolicyLifecycle::new(
        Arc::new(InMemoryPolicyStore::new()),
        Arc::new(InMemoryVersionStore::new()),
    )
}

#[test]
fn create_update_restore_produces_version_three() {
    let lc = lifecycle();
    let v1 = lc
        .create(
            Policy::new("deny-prod", "Deny prod", Effect::Deny).with_priority(100),
            "alice",
        )
        .unwrap();
    assert_eq!(v1.version, 1);

    let mut tightened = v1.clone();
    tightened.priority = 300;
    let v2 = lc.update(tightened, "tighten rule", "alice").unwrap();
    assert_eq!(v2.version, 2);

    let live = lc
        .restore("deny-prod", 1, "rollback", "alice", VersionMetadata::default())
        .unwrap();
    assert_eq!(live.version, 3);
    assert_eq!(live.priority, 100);

    // Content of version 3 equals version 1, modulo the version counter
    let versions = lc.versions();
    let first = versions.version("deny-prod", 1).unwrap();
    let third = versions.version("deny-prod", 3).unwrap();
    let mut third_content = third.content.clone();
    third_content.version = first.content.version;
    assert_eq!(third_content, first.content);

    // And the restored-from record is untouched
    assert_eq!(first.change_type, ChangeType::Created);
    assert_eq!(first.change_summary, "Policy created");
}

#[test]
fn compare_surfaces_modified_fields() {
    let lc = lifecycle();
    let v1 = lc
        .create(
            Policy::new("deny-prod", "Deny prod", Effect::Deny).with_priority(100),
            "alice",
        )
        .unwrap();

    let mut tightened = v1;
    tightened.priority = 300;
    lc.update(tightened, "tighten rule", "alice").unwrap();

    let diff = lc.versions().compare("deny-prod", 1, 2).unwrap();
    assert_eq!(diff.from_version, 1);
    assert_eq!(diff.to_version, 2);
    let priority_change = diff
        .changes
        .iter()
        .find(|c| c.field == "priority")
        .expect("priority change present");
    assert_eq!(priority_change.change_type, FieldChangeType::Modified);
    assert!(!diff.summary.is_empty());
}

#[test]
fn compare_rejects_out_of_range_versions() {
    let lc = lifecycle();
    lc.create(Policy::new("p1", "Policy", Effect::Allow), "alice")
        .unwrap();

    assert!(matches!(
        lc.versions().compare("p1", 1, 9).unwrap_err(),
        PolicyError::VersionOutOfRange { .. }
    ));
}

#[test]
fn system_role_deletion_always_rejected() {
    let dir = RbacDirectory::new(
        vec![Role::system("role-org-admin", "org-admin")],
        Vec::new(),
    );
    dir.create_role(Role::new("role-ml-engineer", "ml-engineer"))
        .unwrap();

    assert!(matches!(
        dir.delete_role("role-org-admin").unwrap_err(),
        PolicyError::SystemRoleImmutable(_)
    ));
    assert!(dir.delete_role("role-ml-engineer").is_ok());
    assert!(matches!(
        dir.delete_role("role-ml-engineer").unwrap_err(),
        PolicyError::RoleNotFound(_)
    ));
}

#[test]
fn concurrent_appends_stay_gap_free() {
    let store = Arc::new(InMemoryVersionStore::new());
    let policy_ids = ["p-alpha", "p-beta", "p-gamma"];

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for _ in 0..50 {
                    let id = policy_ids[rand::random::<usize>() % policy_ids.len()];
                    store
                        .create_version(
                            id,
                            Policy::new(id, "concurrent", Effect::Allow),
                            "concurrent append",
                            ChangeType::Updated,
                            "stress",
                            VersionMetadata::default(),
                        )
                        .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let mut total = 0;
    for id in policy_ids {
        let history = store.history(id, HistoryOrder::OldestFirst);
        let numbers: Vec<u32> = history.iter().map(|v| v.version).collect();
        let expected: Vec<u32> = (1..=history.len() as u32).collect();
        assert_eq!(numbers, expected, "chain for {id} has gaps or duplicates");
        total += history.len();
    }
    assert_eq!(total, 8 * 50);
}

/// A random walk of lifecycle operations never breaks chain monotonicity.
#[derive(Debug, Clone)]
enum Op {
    Update(i64),
    Delete,
    Recreate,
    Restore(u32),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0i64..1000).prop_map(Op::Update),
        Just(Op::Delete),
        Just(Op::Recreate),
        (1u32..20).prop_map(Op::Restore),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn lifecycle_sequences_keep_versions_gap_free(ops in prop::collection::vec(op_strategy(), 1..25)) {
        let lc = lifecycle();
        lc.create(Policy::new("p1", "Policy", Effect::Allow), "prop").unwrap();

        for op in ops {
            let live = lc.policies().get("p1").unwrap();
            match op {
                Op::Update(priority) => {
                    if let Some(mut policy) = live {
                        policy.priority = priority;
                        lc.update(policy, "prop update", "prop").unwrap();
                    }
                }
                Op::Delete => {
                    if live.is_some() {
                        lc.delete("p1", "prop").unwrap();
                    }
                }
                Op::Recreate => {
                    if live.is_none() {
                        lc.create(Policy::new("p1", "Policy", Effect::Allow), "prop").unwrap();
                    }
                }
                Op::Restore(version) => {
                    if live.is_some() {
                        // Out-of-range restores must fail without recording
                        let before = lc.versions().history("p1", HistoryOrder::OldestFirst).len();
                        let result = lc.restore("p1", version, "prop", "prop", VersionMetadata::default());
                        let after = lc.versions().history("p1", HistoryOrder::OldestFirst).len();
                        match result {
                            Ok(_) => prop_assert_eq!(after, before + 1),
                            Err(_) => prop_assert_eq!(after, before),
                        }
                    }
                }
            }
        }

        let history = lc.versions().history("p1", HistoryOrder::OldestFirst);
        let numbers: Vec<u32> = history.iter().map(|v| v.version).collect();
        let expected: Vec<u32> = (1..=history.len() as u32).collect();
        prop_assert_eq!(numbers, expected);

        // Live policy, when present, agrees with the newest record
        if let Some(live) = lc.policies().get("p1").unwrap() {
            prop_assert_eq!(live.version, history.last().unwrap().version);
        }
    }
}
