//! Value sets: an insertion-ordered map from value
//! number to one representative node carrying that value. Every per-block
//! set GVN-PRE maintains (`exp_gen`, `avail_out`, `antic_in`, `new_set`) is
//! one of these; membership is a hash set but iteration order
//! (preserved insertion order) matters for deterministic output.

use crate::common::fx_hash::FxHashMap;
use crate::ir::NodeId;
use super::valuenum::ValueNumber;

#[derive(Debug, Clone, Default)]
pub struct ValueSet {
    order: Vec<ValueNumber>,
    reps: FxHashMap<ValueNumber, NodeId>,
}

impl ValueSet {
    pub fn new() -> Self {
        ValueSet::default()
    }

    pub fn contains(&self, vn: ValueNumber) -> bool {
        self.reps.contains_key(&vn)
    }

    pub fn representative(&self, vn: ValueNumber) -> Option<NodeId> {
        self.reps.get(&vn).copied()
    }

    /// Inserts `node` as the representative of `vn` if `vn` isn't already
    /// present; a pre-existing representative is left untouched (the first
    /// node to reach a value in insertion order wins, matching
    /// `value_map_set_add` / `new_set_add` only inserting on absence).
    pub fn insert(&mut self, vn: ValueNumber, node: NodeId) {
        if self.reps.insert(vn, node).is_none() {
            self.order.push(vn);
        }
    }

    /// Inserts `node` as the representative of `vn`, overwriting any
    /// existing representative. Used when a dominating block's leader must
    /// take priority over one already recorded locally.
    pub fn replace(&mut self, vn: ValueNumber, node: NodeId) {
        if self.reps.insert(vn, node).is_none() {
            self.order.push(vn);
        }
    }

    pub fn remove(&mut self, vn: ValueNumber) {
        if self.reps.remove(&vn).is_some() {
            self.order.retain(|&v| v != vn);
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ValueNumber, NodeId)> + '_ {
        self.order.iter().map(move |&vn| (vn, self.reps[&vn]))
    }

    pub fn value_numbers(&self) -> impl Iterator<Item = ValueNumber> + '_ {
        self.order.iter().copied()
    }

    /// Intersection of value numbers present in both sets, each paired with
    /// `self`'s representative — used by `antic_in` computation when
    /// merging `antic_out` across multiple successors.
    pub fn intersect_by_value(&self, other: &ValueSet) -> ValueSet {
        let mut result = ValueSet::new();
        for (vn, node) in self.iter() {
            if other.contains(vn) {
                result.insert(vn, node);
            }
        }
        result
    }

    /// Union, preferring `self`'s representative on overlap (used to build
    /// `avail_out = avail_in ∪ exp_gen`).
    pub fn union_preferring_self(&self, other: &ValueSet) -> ValueSet {
        let mut result = self.clone();
        for (vn, node) in other.iter() {
            result.insert(vn, node);
        }
        result
    }

    pub fn equals_by_value_numbers(&self, other: &ValueSet) -> bool {
        if self.order.len() != other.order.len() {
            return false;
        }
        self.reps.keys().all(|vn| other.reps.contains_key(vn))
    }
}
