//! Property-based tests for the layout tree and engine
//!
//! Validates that the split tree stays well-formed under arbitrary
//! operation sequences: every split keeps two distinct children, every
//! tab root resolves, and no terminal is ever owned by two leaves.

use proptest::prelude::*;
use pulse_core::{
    CloseOutcome, LayoutEngine, LayoutError, LayoutNode, Orientation, SplitContent, SplitMode,
    TerminalId,
};

// ============================================================================
// Strategies for generating test data
// ============================================================================

/// One structural operation, with indices resolved against the live
/// terminal list at application time.
#[derive(Debug, Clone)]
enum Op {
    Split {
        target: usize,
        horizontal: bool,
        whole_tab: bool,
    },
    Close {
        target: usize,
    },
    Unsplit {
        target: usize,
    },
    Replace {
        target: usize,
    },
    Detach {
        target: usize,
    },
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (any::<usize>(), any::<bool>(), any::<bool>()).prop_map(|(target, horizontal, whole_tab)| {
            Op::Split { target, horizontal, whole_tab }
        }),
        2 => any::<usize>().prop_map(|target| Op::Close { target }),
        1 => any::<usize>().prop_map(|target| Op::Unsplit { target }),
        1 => any::<usize>().prop_map(|target| Op::Replace { target }),
        1 => any::<usize>().prop_map(|target| Op::Detach { target }),
    ]
}

fn apply(engine: &mut LayoutEngine, op: &Op) -> Result<(), TestCaseError> {
    let terminals = engine.all_terminals();
    if terminals.is_empty() {
        engine
            .open_tab(engine.primary_workspace(), TerminalId::new())
            .unwrap();
        return Ok(());
    }

    match op {
        Op::Split {
            target,
            horizontal,
            whole_tab,
        } => {
            let terminal = terminals[target % terminals.len()];
            let tab = engine.tab_of_terminal(terminal).unwrap();
            let orientation = if *horizontal {
                Orientation::Horizontal
            } else {
                Orientation::Vertical
            };
            let mode = if *whole_tab {
                SplitMode::WholeTab
            } else {
                SplitMode::SinglePane
            };
            engine
                .split(
                    tab,
                    Some(terminal),
                    orientation,
                    SplitContent::Terminal(TerminalId::new()),
                    mode,
                )
                .unwrap();
        }
        Op::Close { target } => {
            let terminal = terminals[target % terminals.len()];
            engine.close_terminal(terminal).unwrap();
        }
        Op::Unsplit { target } => {
            let terminal = terminals[target % terminals.len()];
            match engine.unsplit(terminal) {
                Ok(_) | Err(LayoutError::NotSplit(_)) => {}
                Err(err) => return Err(TestCaseError::fail(format!("unsplit failed: {err}"))),
            }
        }
        Op::Replace { target } => {
            let terminal = terminals[target % terminals.len()];
            engine.replace_terminal(terminal, TerminalId::new()).unwrap();
        }
        Op::Detach { target } => {
            let terminal = terminals[target % terminals.len()];
            let tab = engine.tab_of_terminal(terminal).unwrap();
            engine.move_tab(tab, None).unwrap();
        }
    }
    Ok(())
}

// ============================================================================
// Property: tree well-formedness under arbitrary operation sequences
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// After any sequence of split/close/unsplit/replace/detach
    /// operations, every invariant check passes and terminal ownership
    /// stays unique.
    #[test]
    fn tree_stays_well_formed(ops in prop::collection::vec(arb_op(), 1..40)) {
        let mut engine = LayoutEngine::new();
        engine
            .open_tab(engine.primary_workspace(), TerminalId::new())
            .unwrap();

        for op in &ops {
            apply(&mut engine, op)?;
            prop_assert!(engine.check_invariants().is_ok());

            let mut seen = engine.all_terminals();
            let total = seen.len();
            seen.sort_unstable_by_key(|t| t.0);
            seen.dedup();
            prop_assert_eq!(seen.len(), total, "terminal owned by two leaves");
        }
    }

    /// Split immediately followed by unsplit restores the original tab
    /// to a single leaf and leaves the other terminal alone in a new
    /// tab.
    #[test]
    fn split_then_unsplit_round_trips(horizontal in any::<bool>()) {
        let mut engine = LayoutEngine::new();
        let a = TerminalId::new();
        let b = TerminalId::new();
        let tab = engine.open_tab(engine.primary_workspace(), a).unwrap();
        let orientation = if horizontal {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        };

        engine
            .split(
                tab,
                Some(a),
                orientation,
                SplitContent::Terminal(b),
                SplitMode::SinglePane,
            )
            .unwrap();
        let new_tab = engine.unsplit(a).unwrap();

        prop_assert_eq!(engine.tab_count(), 2);
        prop_assert_eq!(engine.terminals_in_tab(tab).unwrap(), vec![a]);
        prop_assert_eq!(engine.terminals_in_tab(new_tab).unwrap(), vec![b]);

        let arena = engine.tab(tab).unwrap().arena();
        let root_is_leaf = matches!(arena.get(arena.root()), Some(LayoutNode::Leaf { .. }));
        prop_assert!(root_is_leaf, "root should be a single leaf again");
    }

    /// Growing a tab by n splits yields exactly n + 1 terminals and a
    /// tree of 2n + 1 nodes.
    #[test]
    fn split_count_matches_node_count(n in 1usize..12) {
        let mut engine = LayoutEngine::new();
        let first = TerminalId::new();
        let tab = engine.open_tab(engine.primary_workspace(), first).unwrap();

        for _ in 0..n {
            engine
                .split(
                    tab,
                    None,
                    Orientation::Horizontal,
                    SplitContent::Terminal(TerminalId::new()),
                    SplitMode::WholeTab,
                )
                .unwrap();
        }

        let arena = engine.tab(tab).unwrap().arena();
        prop_assert_eq!(arena.terminal_count(), n + 1);
        prop_assert_eq!(arena.node_count(), 2 * n + 1);
    }
}

// ============================================================================
// Scenario: Leaf(A) -> Split(A, B) -> close A -> close B
// ============================================================================

#[test]
fn scenario_split_close_close() {
    let mut engine = LayoutEngine::new();
    let a = TerminalId::new();
    let b = TerminalId::new();
    let tab = engine.open_tab(engine.primary_workspace(), a).unwrap();

    engine
        .split(
            tab,
            Some(a),
            Orientation::Horizontal,
            SplitContent::Terminal(b),
            SplitMode::SinglePane,
        )
        .unwrap();
    let arena = engine.tab(tab).unwrap().arena();
    assert!(matches!(
        arena.get(arena.root()),
        Some(LayoutNode::Split { .. })
    ));
    assert_eq!(engine.terminals_in_tab(tab).unwrap(), vec![a, b]);

    assert_eq!(
        engine.close_terminal(a).unwrap(),
        CloseOutcome::SiblingPromoted
    );
    assert_eq!(engine.terminals_in_tab(tab).unwrap(), vec![b]);
    assert!(engine.tab(tab).is_some());

    assert!(matches!(
        engine.close_terminal(b).unwrap(),
        CloseOutcome::TabClosed { .. }
    ));
    assert!(engine.tab(tab).is_none());
}
