//! Border records.
//!
//! One border is created per use and one per definition encountered during
//! the backward pressure scan of a block; they are linked into a per-block
//! list in scan order. A use's `other_end` points at its paired def within
//! the same block. The pairing is threaded through the
//! node's scratch `link` field (set when the use border is created, read
//! back when the matching def is encountered) via
//! an explicit `LinkTable` reservation.

use crate::ir::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderKind {
    Def,
    Use,
}

/// One interval endpoint. `step` is the position in the block's backward
/// scan (0 at the live-out end, increasing towards the block's start);
/// `other_end` is this border's index in the same block's border list
/// (Vec-based here rather than an intrusive linked list, since the whole
/// list is built once per block and then only ever walked front-to-back or
/// back-to-front).
#[derive(Debug, Clone, Copy)]
pub struct Border {
    pub node: NodeId,
    pub step: u32,
    pub kind: BorderKind,
    /// False for the synthetic uses/defs added at a block's live-out/live-in
    /// edges that don't correspond to a real instruction operand.
    pub is_real: bool,
    pub pressure: u32,
    pub other_end: Option<usize>,
}

impl Border {
    pub fn is_def(&self) -> bool {
        self.kind == BorderKind::Def
    }

    pub fn is_use(&self) -> bool {
        self.kind == BorderKind::Use
    }
}

/// The border list for one block, built by `pressure::scan_block` and
/// consumed by `assign::color_block`. Invariant: for every
/// node of the current register class live within the block, exactly one
/// def border and one use border exist, with the use preceding the def in
/// list order (since the list is built scanning backward but appended in
/// scan order, "use precedes def in list order" means the use was pushed
/// first).
#[derive(Debug, Default)]
pub struct BorderList {
    pub borders: Vec<Border>,
}

impl BorderList {
    pub fn new() -> Self {
        BorderList { borders: Vec::new() }
    }

    /// Appends a use border and reserves its paired def's slot via `link`,
    /// mirroring `border_add`'s "you always have to create the use before
    /// the def" contract.
    pub fn push_use(&mut self, node: NodeId, step: u32, pressure: u32, is_real: bool, link: &mut crate::ir::LinkTable) -> usize {
        let idx = self.borders.len();
        self.borders.push(Border { node, step, kind: BorderKind::Use, is_real, pressure, other_end: None });
        link.set(node, idx as NodeId);
        idx
    }

    /// Appends a def border, pairing it with the use previously recorded in
    /// `link` for this node (if any — live-through values created directly
    /// as a `Def` with no prior `Use`, e.g. live-in defs, have none).
    pub fn push_def(&mut self, node: NodeId, step: u32, pressure: u32, is_real: bool, link: &crate::ir::LinkTable) -> usize {
        let idx = self.borders.len();
        let use_idx = link.get(node).map(|v| v as usize);
        self.borders.push(Border { node, step, kind: BorderKind::Def, is_real, pressure, other_end: use_idx });
        if let Some(u) = use_idx {
            self.borders[u].other_end = Some(idx);
        }
        idx
    }
}
