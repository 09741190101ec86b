//! Property-based tests for cluster membership and broadcast
//!
//! Validates exclusive membership, immediate deletion of empty
//! clusters, and broadcast fan-out that never includes the origin.

use proptest::prelude::*;
use pulse_core::{
    BroadcastKey, ClusterId, ClusterManager, TerminalHandle, TerminalId, TerminalInput,
};
use uuid::Uuid;

#[derive(Default)]
struct RecordingInput {
    fed: Vec<(TerminalId, Vec<u8>)>,
    pasted: Vec<(TerminalId, bool)>,
}

impl TerminalInput for RecordingInput {
    fn feed_child(&mut self, terminal: TerminalId, bytes: &[u8]) {
        self.fed.push((terminal, bytes.to_vec()));
    }

    fn feed_display(&mut self, _terminal: TerminalId, _bytes: &[u8]) {}

    fn paste(&mut self, terminal: TerminalId, clipboard: bool) {
        self.pasted.push((terminal, clipboard));
    }
}

fn handles(n: usize) -> Vec<TerminalHandle> {
    (0..n)
        .map(|_| TerminalHandle::new(Uuid::new_v4(), None))
        .collect()
}

/// Verifies that every handle's cluster field agrees with exactly one
/// cluster's member set, and no cluster is empty.
fn assert_consistent(manager: &ClusterManager, handles: &[TerminalHandle]) -> Result<(), TestCaseError> {
    for handle in handles {
        match handle.cluster {
            None => {
                for cluster in manager.clusters() {
                    prop_assert!(
                        !cluster.contains(handle.id),
                        "handle without cluster is still a member"
                    );
                }
            }
            Some(id) => {
                let cluster = manager.cluster(id);
                prop_assert!(cluster.is_some_and(|c| c.contains(handle.id)));
                for other in manager.clusters().filter(|c| c.id != id) {
                    prop_assert!(!other.contains(handle.id), "member of two clusters");
                }
            }
        }
    }
    for cluster in manager.clusters() {
        prop_assert!(cluster.member_count() > 0, "empty cluster survived");
    }
    Ok(())
}

// ============================================================================
// Strategies for generating test data
// ============================================================================

#[derive(Debug, Clone)]
enum Op {
    Join { handle: usize, cluster: usize },
    Leave { handle: usize },
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        2 => (any::<usize>(), any::<usize>()).prop_map(|(handle, cluster)| Op::Join { handle, cluster }),
        1 => any::<usize>().prop_map(|handle| Op::Leave { handle }),
    ]
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Membership stays exclusive and bidirectionally consistent under
    /// arbitrary join/leave sequences, and empty clusters never linger.
    #[test]
    fn membership_stays_consistent(
        ops in prop::collection::vec(arb_op(), 1..60),
        terminal_count in 1usize..8,
        cluster_count in 1usize..4,
    ) {
        let mut manager = ClusterManager::new();
        let mut members = handles(terminal_count);
        let cluster_ids: Vec<ClusterId> = (0..cluster_count).map(|_| ClusterId::new()).collect();

        for op in ops {
            match op {
                Op::Join { handle, cluster } => {
                    let cluster = cluster_ids[cluster % cluster_ids.len()];
                    let handle = &mut members[handle % terminal_count];
                    manager.join(handle, cluster, "group");
                }
                Op::Leave { handle } => {
                    manager.leave(&mut members[handle % terminal_count]);
                }
            }
            assert_consistent(&manager, &members)?;
        }
    }

    /// Broadcast reaches every member except the origin, in membership
    /// order; the origin is never in the delivery set.
    #[test]
    fn broadcast_excludes_origin(
        member_count in 1usize..8,
        origin_index in 0usize..8,
        byte in any::<u8>(),
    ) {
        let mut manager = ClusterManager::new();
        let mut members = handles(member_count);
        let cluster = ClusterId::new();
        for handle in &mut members {
            manager.join(handle, cluster, "ops");
        }

        let origin = &members[origin_index % member_count];
        let mut input = RecordingInput::default();
        let delivered = manager.broadcast_bytes(origin, &[byte], &mut input);

        prop_assert_eq!(delivered, member_count - 1);
        prop_assert!(input.fed.iter().all(|(id, _)| *id != origin.id));

        let expected: Vec<TerminalId> = members
            .iter()
            .filter(|h| h.id != origin.id)
            .map(|h| h.id)
            .collect();
        let got: Vec<TerminalId> = input.fed.iter().map(|(id, _)| *id).collect();
        prop_assert_eq!(got, expected);
    }

    /// Pastes repeat on all-but-origin with the same clipboard flag.
    #[test]
    fn paste_excludes_origin(member_count in 2usize..6, clipboard in any::<bool>()) {
        let mut manager = ClusterManager::new();
        let mut members = handles(member_count);
        let cluster = ClusterId::new();
        for handle in &mut members {
            manager.join(handle, cluster, "ops");
        }

        let mut input = RecordingInput::default();
        let delivered = manager.broadcast_paste(&members[0], clipboard, &mut input);

        prop_assert_eq!(delivered, member_count - 1);
        prop_assert!(input.pasted.iter().all(|(id, flag)| *id != members[0].id && *flag == clipboard));
    }

    /// Every encodable key broadcasts its exact byte sequence.
    #[test]
    fn keystroke_bytes_match_encoding(ch in proptest::char::range('a', 'z')) {
        let mut manager = ClusterManager::new();
        let mut members = handles(2);
        let cluster = ClusterId::new();
        for handle in &mut members {
            manager.join(handle, cluster, "ops");
        }

        let key = BroadcastKey::Char(ch);
        let mut input = RecordingInput::default();
        manager.broadcast_keystroke(&members[0], &key, &mut input);

        prop_assert_eq!(input.fed.len(), 1);
        prop_assert_eq!(input.fed[0].1.clone(), key.encode().unwrap());
    }
}

// ============================================================================
// Scenario: cluster "ops" with members {A, B, C}
// ============================================================================

#[test]
fn scenario_ops_cluster_dissolves() {
    let mut manager = ClusterManager::new();
    let mut a = TerminalHandle::new(Uuid::new_v4(), None);
    let mut b = TerminalHandle::new(Uuid::new_v4(), None);
    let mut c = TerminalHandle::new(Uuid::new_v4(), None);
    let ops = ClusterId::new();

    manager.join(&mut a, ops, "ops");
    manager.join(&mut b, ops, "ops");
    manager.join(&mut c, ops, "ops");
    assert_eq!(manager.cluster(ops).unwrap().members(), &[a.id, b.id, c.id]);

    manager.leave(&mut b);
    assert_eq!(manager.cluster(ops).unwrap().members(), &[a.id, c.id]);

    manager.leave(&mut a);
    manager.leave(&mut c);
    assert!(manager.cluster(ops).is_none());
    assert!(manager.cluster_named("ops").is_none());
}

#[test]
fn single_member_cluster_broadcasts_to_nobody() {
    let mut manager = ClusterManager::new();
    let mut solo = TerminalHandle::new(Uuid::new_v4(), None);
    manager.join(&mut solo, ClusterId::new(), "solo");

    let mut input = RecordingInput::default();
    assert_eq!(
        manager.broadcast_keystroke(&solo, &BroadcastKey::Enter, &mut input),
        0
    );
    assert!(input.fed.is_empty());
}
