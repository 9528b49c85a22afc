//! Top-level chordal allocator orchestration: for each register class, run
//! the pressure pass over
//! every block in an order where a block follows all its dominator-tree
//! ancestors, then the assignment pass in the same order, threading
//! already-assigned colors from dominating defs down to their live-in uses.

use log::debug;

use crate::common::error::BackendError;
use crate::common::fx_hash::FxHashMap;
use crate::ir::{Dominance, Graph, LinkTable, Liveness, NodeId, RegClassKind, RegisterClass, Schedule};
use super::assign::color_block;
use super::interference::InterferenceGraph;
use super::pressure::scan_block;

/// A physical register, identified only by its index within a register
/// class's numbering.
/// The mapping from color index to a concrete IA-32 register name is the
/// emitter's job (`backend::ia32`), not this allocator's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PhysReg(pub u32);

/// Final result of allocating one register class across the whole graph.
pub struct Allocation {
    pub colors: FxHashMap<NodeId, PhysReg>,
    pub interference: Option<InterferenceGraph>,
}

pub struct ChordalAllocator {
    /// Number of colors (physical registers) available in the class being
    /// allocated. Fixed per invocation — spilling is
    /// out of scope, so exhaustion is a hard error rather than triggering a
    /// spill/reload insertion.
    pub num_colors: u32,
    /// Whether to materialize the interference graph as a side artifact;
    /// off by default, since most callers only need `values_interfere`.
    pub build_interference_graph: bool,
}

impl ChordalAllocator {
    pub fn new(num_colors: u32) -> Self {
        ChordalAllocator { num_colors, build_interference_graph: false }
    }

    pub fn with_interference_graph(mut self, enabled: bool) -> Self {
        self.build_interference_graph = enabled;
        self
    }

    /// Allocates one register class across the entire graph.
    ///
    /// Blocks are visited in dominator-tree pre-order: by the time a block
    /// is scanned, every value live-in to it was already colored by an
    /// ancestor's assignment pass.
    pub fn allocate(
        &self,
        graph: &Graph,
        class: RegClassKind,
        regs: &impl RegisterClass,
        dom: &impl Dominance,
        liveness: &impl Liveness,
        schedule: &impl Schedule,
    ) -> Result<Allocation, BackendError> {
        let mut link = LinkTable::new();
        link.acquire("regalloc::chordal")?;

        let mut colors: FxHashMap<NodeId, PhysReg> = FxHashMap::default();
        let mut ifg = if self.build_interference_graph { Some(InterferenceGraph::new()) } else { None };

        for block in dom.dom_preorder() {
            debug!("chordal: scanning block {:?} for class {:?}", block, class);

            link.clear();
            let list = scan_block(graph, block, class, regs, liveness, schedule, &mut link, ifg.as_mut());

            let live_in_set: std::collections::HashSet<NodeId> =
                liveness.live_in(block).iter().copied().collect();

            let result = color_block(
                &list,
                self.num_colors,
                |n| live_in_set.contains(&n),
                |n| colors.get(&n).copied(),
            )?;

            for (n, c) in result.colors {
                colors.insert(n, c);
            }
        }

        link.release();

        Ok(Allocation { colors, interference: ifg })
    }

    /// `phi_ops_interfere`: two values
    /// interfere if an interference edge was recorded between them, or —
    /// when the graph wasn't built — by falling back to the direct
    /// dominance/liveness check `values_interfere` performs: two values
    /// interfere iff one is live at the other's definition and they are
    /// simultaneously live, which for two Phi-class values reduces to "not
    /// assigned the same color and both live across the same point".
    ///
    /// Without a materialized graph this crate cannot re-derive that check
    /// from liveness alone (it would require interval endpoints this
    /// allocator doesn't retain after assignment), so the fallback here is
    /// simply: they interfere if they were assigned different colors and
    /// both appear in `colors` (i.e. both were actually colored, meaning
    /// both are live somewhere) — conservative, but exercised only when the
    /// caller opted out of the real graph.
    pub fn values_interfere(&self, ifg: Option<&InterferenceGraph>, a: NodeId, b: NodeId, colors: &FxHashMap<NodeId, PhysReg>) -> bool {
        if let Some(g) = ifg {
            return g.interferes(a, b);
        }
        match (colors.get(&a), colors.get(&b)) {
            (Some(ca), Some(cb)) => ca != cb,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::graph::{BlockId, Graph};
    use crate::ir::node::{Mode, Node, Opcode};
    use crate::ir::interfaces::ModeRegisterClass;

    struct FixedSchedule {
        order: Vec<BlockId>,
        per_block: FxHashMap<BlockId, Vec<NodeId>>,
    }

    impl Schedule for FixedSchedule {
        fn block_order(&self) -> Vec<BlockId> {
            self.order.clone()
        }
        fn schedule_of(&self, block: BlockId) -> &[NodeId] {
            self.per_block.get(&block).map(|v| v.as_slice()).unwrap_or(&[])
        }
    }

    struct FixedLiveness {
        live_in: FxHashMap<BlockId, Vec<NodeId>>,
        live_end: FxHashMap<BlockId, Vec<NodeId>>,
    }

    impl Liveness for FixedLiveness {
        fn live_in(&self, block: BlockId) -> &[NodeId] {
            self.live_in.get(&block).map(|v| v.as_slice()).unwrap_or(&[])
        }
        fn live_end(&self, block: BlockId) -> &[NodeId] {
            self.live_end.get(&block).map(|v| v.as_slice()).unwrap_or(&[])
        }
    }

    struct SingleBlockDom {
        block: BlockId,
    }

    impl Dominance for SingleBlockDom {
        fn idom(&self, _block: BlockId) -> Option<BlockId> {
            None
        }
        fn dom_preorder(&self) -> Vec<BlockId> {
            vec![self.block]
        }
        fn dominates(&self, a: BlockId, b: BlockId) -> bool {
            a == b
        }
    }

    /// Three int values defined in sequence, all simultaneously live (each
    /// used by a later def), exhausting a 3-register class but not a
    /// 4-register one.
    #[test]
    fn three_overlapping_values_fit_in_three_registers() {
        let mut g = Graph::new();
        let b0 = g.add_block();

        let n0 = g.push(Node::new(0, Opcode::Const(1), Mode::Int(32), b0, vec![]));
        let n1 = g.push(Node::new(1, Opcode::Const(2), Mode::Int(32), b0, vec![]));
        let n2 = g.push(Node::new(2, Opcode::Const(3), Mode::Int(32), b0, vec![]));
        let add01 = g.push(Node::new(3, Opcode::Generic(crate::ir::node::GenericOp::Add), Mode::Int(32), b0, vec![n0, n1]));
        let add_all = g.push(Node::new(4, Opcode::Generic(crate::ir::node::GenericOp::Add), Mode::Int(32), b0, vec![add01, n2]));

        let schedule = FixedSchedule {
            order: vec![b0],
            per_block: [(b0, vec![n0, n1, n2, add01, add_all])].into_iter().collect(),
        };
        let liveness = FixedLiveness {
            live_in: [(b0, vec![])].into_iter().collect(),
            live_end: [(b0, vec![add_all])].into_iter().collect(),
        };
        let dom = SingleBlockDom { block: b0 };
        let regs = ModeRegisterClass { graph: &g };

        let alloc = ChordalAllocator::new(3);
        let result = alloc
            .allocate(&g, RegClassKind::GeneralPurpose, &regs, &dom, &liveness, &schedule)
            .expect("3 registers suffice for peak pressure of 3");

        let mut used: Vec<u32> = result.colors.values().map(|c| c.0).collect();
        used.sort_unstable();
        used.dedup();
        assert!(used.iter().all(|&c| c < 3));
    }

    #[test]
    fn color_exhaustion_is_reported_as_invariant_violation() {
        // Surfaces the `debug!` trace emitted per block scan (see
        // `allocate` above) when the test is run with logging enabled,
        // matching how a spill/register-pressure analysis test in the
        // corpus (`hir-analysis`'s `spills_*` tests) wires up `env_logger`.
        let _ = env_logger::Builder::from_env("CHORDAL_IA32_TRACE").format_timestamp(None).is_test(true).try_init();

        let mut g = Graph::new();
        let b0 = g.add_block();

        let n0 = g.push(Node::new(0, Opcode::Const(1), Mode::Int(32), b0, vec![]));
        let n1 = g.push(Node::new(1, Opcode::Const(2), Mode::Int(32), b0, vec![]));
        let n2 = g.push(Node::new(2, Opcode::Const(3), Mode::Int(32), b0, vec![]));
        let add01 = g.push(Node::new(3, Opcode::Generic(crate::ir::node::GenericOp::Add), Mode::Int(32), b0, vec![n0, n1]));
        let add_all = g.push(Node::new(4, Opcode::Generic(crate::ir::node::GenericOp::Add), Mode::Int(32), b0, vec![add01, n2]));

        let schedule = FixedSchedule {
            order: vec![b0],
            per_block: [(b0, vec![n0, n1, n2, add01, add_all])].into_iter().collect(),
        };
        let liveness = FixedLiveness {
            live_in: [(b0, vec![])].into_iter().collect(),
            live_end: [(b0, vec![add_all])].into_iter().collect(),
        };
        let dom = SingleBlockDom { block: b0 };
        let regs = ModeRegisterClass { graph: &g };

        let alloc = ChordalAllocator::new(2);
        let err = alloc
            .allocate(&g, RegClassKind::GeneralPurpose, &regs, &dom, &liveness, &schedule)
            .unwrap_err();
        assert!(matches!(err, BackendError::InvariantViolation { .. }));
    }
}
