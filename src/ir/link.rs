//! The scratch "link" slot: transient scratch space a pass reserves on a
//! node, uses, and releases before it's done, rather than a field carried
//! directly on every node under a by-convention reservation protocol.
//! Represented here as an explicit, pass-scoped side table keyed by node
//! index instead, so
//! the reservation is enforced by the type system (you need a `LinkTable`
//! value in hand to read or write it) rather than by convention, and
//! nested reservation — forbidden — becomes a runtime-checked
//! error instead of silent corruption.

use super::node::NodeId;
use crate::common::error::BackendError;
use crate::common::fx_hash::FxHashMap;

/// A single pass's reservation of the link slot. Borrowed from the owning
/// `Graph`'s lifetime conceptually, but since passes mutate it freely without
/// touching the rest of the graph, it is its own side table rather than a
/// field threaded through `Node`.
#[derive(Debug, Default)]
pub struct LinkTable {
    slots: FxHashMap<NodeId, NodeId>,
    reserved: bool,
}

impl LinkTable {
    pub fn new() -> Self {
        LinkTable::default()
    }

    /// Acquires the link slot for a pass. Nested reservation is forbidden
    ///; calling this while already reserved is an invariant
    /// violation rather than something callers are expected to recover from.
    pub fn acquire(&mut self, pass: &'static str) -> Result<(), BackendError> {
        if self.reserved {
            return Err(BackendError::invariant(pass, "link slot already reserved by another pass"));
        }
        self.reserved = true;
        Ok(())
    }

    pub fn release(&mut self) {
        self.reserved = false;
        self.slots.clear();
    }

    /// Clears all slots without releasing the reservation. Border pairing
    /// only ever spans a single block's scan, so callers that reuse one
    /// `LinkTable` across several blocks (the chordal allocator's per-class
    /// pass over every block) must call this between blocks — otherwise a
    /// value used in one block and defined in a later one could pair with a
    /// stale slot left over from the first.
    pub fn clear(&mut self) {
        debug_assert!(self.reserved, "link slot cleared without reservation");
        self.slots.clear();
    }

    pub fn set(&mut self, node: NodeId, value: NodeId) {
        debug_assert!(self.reserved, "link slot written without reservation");
        self.slots.insert(node, value);
    }

    pub fn get(&self, node: NodeId) -> Option<NodeId> {
        self.slots.get(&node).copied()
    }

    pub fn clear_node(&mut self, node: NodeId) {
        self.slots.remove(&node);
    }
}
