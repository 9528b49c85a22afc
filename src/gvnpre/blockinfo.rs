//! Per-block state for the anticipation and insertion fixpoints.

use crate::common::fx_hash::FxHashSet;
use crate::ir::graph::BlockId;
use super::valuenum::ValueNumber;
use super::valueset::ValueSet;

#[derive(Debug, Default)]
pub struct BlockInfo {
    /// Value-numbered expressions generated locally in this block (each
    /// movable, non-constant node's own value).
    pub exp_gen: ValueSet,
    /// `avail_in ∪ exp_gen`: values available by the end of this block.
    pub avail_out: ValueSet,
    /// Values anticipated at block entry, recomputed each fixpoint round
    /// until it stabilizes.
    pub antic_in: ValueSet,
    /// Values already processed by the insertion fixpoint for this block:
    /// once a value number is in here, re-encountering it in a later
    /// insertion iteration is a no-op, which is what lets the fixpoint
    /// terminate instead of re-inserting the same compensation code every
    /// round.
    antic_done: FxHashSet<ValueNumber>,
    /// Values newly inserted into this block by the insertion fixpoint,
    /// merged into `avail_out` on the next round.
    pub new_set: ValueSet,
}

impl BlockInfo {
    pub fn antic_done_contains(&self, vn: ValueNumber) -> bool {
        self.antic_done.contains(&vn)
    }

    pub fn mark_antic_done(&mut self, vn: ValueNumber) {
        self.antic_done.insert(vn);
    }
}

#[derive(Debug, Default)]
pub struct BlockInfoTable {
    by_block: crate::common::fx_hash::FxHashMap<BlockId, BlockInfo>,
}

impl BlockInfoTable {
    pub fn new() -> Self {
        BlockInfoTable::default()
    }

    pub fn get(&self, block: BlockId) -> Option<&BlockInfo> {
        self.by_block.get(&block)
    }

    pub fn get_mut(&mut self, block: BlockId) -> &mut BlockInfo {
        self.by_block.entry(block).or_insert_with(BlockInfo::default)
    }

    pub fn ensure(&mut self, block: BlockId) {
        self.by_block.entry(block).or_insert_with(BlockInfo::default);
    }
}
