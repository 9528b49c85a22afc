//! Label planning and the fall-through rule.
//!
//! Block layout is fixed by the external scheduler; this module only decides, given that fixed order, which
//! blocks need a symbolic label emitted before them and which outgoing
//! control edges can be elided as a fall-through.

use crate::common::fx_hash::FxHashSet;
use crate::ir::graph::BlockId;
use crate::ir::{Graph, Schedule};

/// The fallthrough rule for one control edge `block -> target`: true iff
/// `target` is `block`'s schedule-successor and the edge isn't a
/// `SwitchJmp` case.
pub fn is_fallthrough_edge(layout_successor: Option<BlockId>, target: BlockId, is_switch_case: bool) -> bool {
    !is_switch_case && layout_successor == Some(target)
}

/// A block needs a label iff it is the routine's entry block, the target
/// of some non-fall-through control edge, or an exception handler target
///. `switch_sources` names blocks whose outgoing edges are
/// all `SwitchJmp` cases (never fall-throughs, regardless of layout
/// adjacency); `exception_targets` names blocks reachable only via an
/// exception edge.
pub fn label_required_blocks(
    graph: &Graph,
    schedule: &impl Schedule,
    switch_sources: &FxHashSet<BlockId>,
    exception_targets: &FxHashSet<BlockId>,
) -> FxHashSet<BlockId> {
    let order = schedule.block_order();
    let mut required: FxHashSet<BlockId> = FxHashSet::default();

    if let Some(&entry) = order.first() {
        required.insert(entry);
    }

    for (i, &block) in order.iter().enumerate() {
        let layout_successor = order.get(i + 1).copied();
        let is_switch = switch_sources.contains(&block);
        for &succ in &graph.block(block).succs {
            if !is_fallthrough_edge(layout_successor, succ, is_switch) {
                required.insert(succ);
            }
        }
    }

    required.extend(exception_targets.iter().copied());
    required
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switch_case_is_never_a_fallthrough_even_onto_the_layout_successor() {
        let b = BlockId(1);
        assert!(is_fallthrough_edge(Some(b), b, false));
        assert!(!is_fallthrough_edge(Some(b), b, true));
    }

    #[test]
    fn non_adjacent_target_is_not_a_fallthrough() {
        assert!(!is_fallthrough_edge(Some(BlockId(2)), BlockId(3), false));
    }

    struct LinearSchedule {
        order: Vec<BlockId>,
    }
    impl Schedule for LinearSchedule {
        fn block_order(&self) -> Vec<BlockId> {
            self.order.clone()
        }
        fn schedule_of(&self, _block: BlockId) -> &[crate::ir::NodeId] {
            &[]
        }
    }

    /// For a scheduled order `[B0, Btrue, Bfalse]`, only the entry and the
    /// jump target genuinely need labels; the fall-through block does not.
    #[test]
    fn jcc_fallthrough_layout_needs_no_label_on_fallthrough_block() {
        let mut g = Graph::new();
        let b0 = g.add_block();
        let btrue = g.add_block();
        let bfalse = g.add_block();
        g.connect(b0, btrue);
        g.connect(b0, bfalse);

        let schedule = LinearSchedule { order: vec![b0, btrue, bfalse] };
        let required = label_required_blocks(&g, &schedule, &FxHashSet::default(), &FxHashSet::default());

        assert!(required.contains(&b0), "entry always gets a label");
        assert!(required.contains(&bfalse), "jcc's non-fallthrough target needs a label");
        assert!(!required.contains(&btrue), "btrue is the fallthrough and needs none");
    }
}
