//! Value numbering: a two-level table that "identifies"
//! structurally-equivalent expressions with a shared value number, and lets
//! a node "remember" its own value number for later identify calls.
//!
//! Phi nodes and
//! memory-writing operations (`Store`, `Call`) are never identified with
//! anything but themselves, each getting a fresh value number: a Phi's
//! value depends on which predecessor it was reached from, and a store's
//! or call's value (the memory token it produces) depends on the exact
//! memory state threaded through it, neither of which structural operand
//! equality captures. Loads are the one memory op allowed to be identified
//! structurally — two loads of the same address from the same memory state
//! are the same value.

use crate::common::fx_hash::FxHashMap;
use crate::ir::{Graph, Mode, Node, NodeId, Opcode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueNumber(pub u32);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Identity {
    opcode: Opcode,
    mode: Mode,
    operand_vns: Vec<ValueNumber>,
    attrs: Vec<(&'static str, crate::ir::node::Attr)>,
}

fn never_identified(node: &Node) -> bool {
    matches!(node.opcode, Opcode::Phi | Opcode::Block | Opcode::Start | Opcode::End)
        || matches!(node.opcode, Opcode::Generic(crate::ir::GenericOp::Store) | Opcode::Generic(crate::ir::GenericOp::Call))
        || matches!(node.opcode, Opcode::Ia32(crate::ir::Ia32Op::Store) | Opcode::Ia32(crate::ir::Ia32Op::BeReturn))
}

use crate::ir::node::attr_keys;

const TRACKED_ATTRS: &[&str] =
    &[attr_keys::MNEMONIC, attr_keys::CMP_KIND, attr_keys::ENTITY, attr_keys::OFFSET, attr_keys::SCALE, attr_keys::COPY_SIZE];

pub fn attr_snapshot(node: &Node) -> Vec<(&'static str, crate::ir::node::Attr)> {
    TRACKED_ATTRS.iter().filter_map(|&k| node.attr(k).map(|a| (k, a.clone()))).collect()
}

/// The value table. One instance is shared across the whole anticipation
/// and insertion fixpoint: value numbers must stay stable
/// across iterations, or antic sets computed in different rounds wouldn't
/// be comparable.
#[derive(Debug, Default)]
pub struct ValueTable {
    next: u32,
    by_identity: FxHashMap<Identity, ValueNumber>,
    node_vn: FxHashMap<NodeId, ValueNumber>,
}

impl ValueTable {
    pub fn new() -> Self {
        ValueTable::default()
    }

    fn fresh(&mut self) -> ValueNumber {
        let vn = ValueNumber(self.next);
        self.next += 1;
        vn
    }

    /// Value number already remembered for `node`, if any.
    pub fn lookup(&self, node: NodeId) -> Option<ValueNumber> {
        self.node_vn.get(&node).copied()
    }

    /// `remember`: records that `node` has value number `vn`, without
    /// attempting to identify it with anything structurally equal. Used
    /// when a node's identity is already known not to unify with any other
    /// (Phi, Store, Call) and also to re-register a node after
    /// phi-translation constructs a structural twin of an existing value.
    pub fn remember(&mut self, node: NodeId, vn: ValueNumber) {
        self.node_vn.insert(node, vn);
    }

    /// `identify_or_remember`: looks up a value number structurally
    /// equivalent to `node` (same opcode, mode, tracked attrs, and operand
    /// value numbers — each operand's own value number must already be
    /// known, since this walks the graph bottom-up); if none exists,
    /// mints a fresh one and records the new identity. Nodes that are never
    /// identified (Phi/Block/Start/End/Store/Call/Return) always get a
    /// fresh, un-shared value number.
    pub fn identify_or_remember(&mut self, graph: &Graph, node: NodeId) -> ValueNumber {
        if let Some(vn) = self.node_vn.get(&node) {
            return *vn;
        }

        let n = graph.node(node);
        if never_identified(n) {
            let vn = self.fresh();
            self.node_vn.insert(node, vn);
            return vn;
        }

        let operand_vns: Vec<ValueNumber> = n
            .inputs
            .iter()
            .map(|&op| self.node_vn.get(&op).copied().unwrap_or_else(|| ValueNumber(u32::MAX)))
            .collect();
        let identity = Identity { opcode: n.opcode, mode: n.mode, operand_vns, attrs: attr_snapshot(n) };

        if let Some(&vn) = self.by_identity.get(&identity) {
            self.node_vn.insert(node, vn);
            return vn;
        }

        let vn = self.fresh();
        self.by_identity.insert(identity, vn);
        self.node_vn.insert(node, vn);
        vn
    }

    /// `identify`: looks up whether an expression structurally equal to a
    /// hypothetical node (opcode/mode/attrs plus already-known operand value
    /// numbers) has been seen before, without registering anything. Used by
    /// phi-translation to check whether a translated expression already has
    /// a value before deciding whether a new node needs to be inserted.
    pub fn identify_expression(&self, opcode: Opcode, mode: Mode, attrs: Vec<(&'static str, crate::ir::node::Attr)>, operand_vns: Vec<ValueNumber>) -> Option<ValueNumber> {
        let identity = Identity { opcode, mode, operand_vns, attrs };
        self.by_identity.get(&identity).copied()
    }
}
