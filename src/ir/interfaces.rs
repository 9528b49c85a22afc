//! Traits through which the out-of-scope collaborators
//! are consumed: dominance, liveness, schedule, and register-class
//! membership. This crate never computes any of these itself; callers
//! supply an implementation (typically backed by whatever dominance/
//! liveness/scheduling infrastructure their own IR construction already
//! maintains) and pass it into `regalloc`/`gvnpre`/`backend` entry points.

use super::graph::BlockId;
use super::node::{Mode, NodeId, RegClassKind};

/// `dominance(graph)`: immediate-dominator and dominator-tree walk.
pub trait Dominance {
    fn idom(&self, block: BlockId) -> Option<BlockId>;

    /// Dominator-tree pre-order over all blocks, root(s) first. Both the
    /// chordal allocator's pressure/assignment passes and GVN-PRE's
    /// insertion fixpoint require this exact order.
    fn dom_preorder(&self) -> Vec<BlockId>;

    fn dominates(&self, a: BlockId, b: BlockId) -> bool;
}

/// `liveness(block)`: sets live-in, live-end.
pub trait Liveness {
    fn live_in(&self, block: BlockId) -> &[NodeId];
    /// Values live at the end of `block`.
    fn live_end(&self, block: BlockId) -> &[NodeId];
}

/// `schedule_of(block)`: ordered sequence of nodes. The
/// ordering is whatever the external scheduler committed to; every pass in
/// this crate treats it as fixed and walks it forward or backward without
/// re-deriving it.
pub trait Schedule {
    fn block_order(&self) -> Vec<BlockId>;
    fn schedule_of(&self, block: BlockId) -> &[NodeId];

    /// The block immediately following `block` in final layout order, if
    /// any. Used by the emitter's fallthrough rule.
    fn layout_successor(&self, block: BlockId) -> Option<BlockId> {
        let order = self.block_order();
        let pos = order.iter().position(|&b| b == block)?;
        order.get(pos + 1).copied()
    }
}

/// `register_class(node)` / `has_class(node, class)`.
/// Implemented directly on `Mode` for this crate's own node set, but kept
/// as a trait so an embedding compiler with a richer constraint system
/// (tied operands, multiple register classes per opcode) can override it.
pub trait RegisterClass {
    fn register_class(&self, node: NodeId) -> Option<RegClassKind>;

    fn has_class(&self, node: NodeId, class: RegClassKind) -> bool {
        self.register_class(node) == Some(class)
    }
}

/// Default `RegisterClass` impl driven purely by a node's `Mode`, suitable
/// whenever the embedding compiler hasn't layered additional constraints
/// (e.g. ABI-mandated registers) on top.
pub struct ModeRegisterClass<'a> {
    pub graph: &'a super::graph::Graph,
}

impl<'a> RegisterClass for ModeRegisterClass<'a> {
    fn register_class(&self, node: NodeId) -> Option<RegClassKind> {
        mode_of(self.graph, node).register_class()
    }
}

fn mode_of(graph: &super::graph::Graph, node: NodeId) -> Mode {
    graph.node(node).mode
}
