//! The pressure pass: a backward scan per block that
//! builds the border list and, optionally, interference edges.

use crate::common::fx_hash::FxHashSet;
use crate::ir::{Graph, LinkTable, Liveness, NodeId, RegClassKind, RegisterClass, Schedule};
use super::border::BorderList;
use super::interference::InterferenceGraph;

/// Scans one block backward, producing its border list. If `ifg` is
/// `Some`, interference edges between a local def and every value live at
/// that point are recorded too.
pub fn scan_block(
    graph: &Graph,
    block: crate::ir::graph::BlockId,
    class: RegClassKind,
    regs: &impl RegisterClass,
    liveness: &impl Liveness,
    schedule: &impl Schedule,
    link: &mut LinkTable,
    mut ifg: Option<&mut InterferenceGraph>,
) -> BorderList {
    let mut list = BorderList::new();
    let mut live: FxHashSet<NodeId> = FxHashSet::default();
    let mut step: u32 = 0;
    let mut pressure: u32 = 0;

    // Final uses of all values live-out of the block.
    for &v in liveness.live_end(block) {
        if regs.has_class(v, class) {
            live.insert(v);
            pressure += 1;
            list.push_use(v, step, pressure, false, link);
        }
    }
    step += 1;

    let scheduled: Vec<NodeId> = schedule.schedule_of(block).to_vec();
    for &n in scheduled.iter().rev() {
        let node = graph.node(n);
        let is_phi = node.is_phi();

        if regs.has_class(n, class) {
            live.remove(&n);
            list.push_def(n, step, pressure, true, link);
            pressure -= 1;

            if let Some(g) = ifg.as_deref_mut() {
                for &other in &live {
                    g.add_edge(n, other);
                }
            }
        }

        // Phi nodes' inputs are not treated as uses in the defining block
        //: a Phi's operands are live-out of the
        // predecessor block, not live-in to the block containing the Phi.
        if !is_phi {
            for &op in &node.inputs {
                if regs.has_class(op, class) && !live.contains(&op) {
                    pressure += 1;
                    list.push_use(op, step, pressure, true, link);
                    live.insert(op);
                }
            }
        }

        step += 1;
    }

    // Defs for all values live-in, at the final step.
    for &v in liveness.live_in(block) {
        if regs.has_class(v, class) {
            list.push_def(v, step, 0, false, link);
        }
    }

    list
}
