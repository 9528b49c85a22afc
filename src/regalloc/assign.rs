//! The assignment pass: colors the border list computed by
//! `pressure::scan_block` using the reverse-list perfect elimination order.

use crate::common::error::BackendError;
use crate::common::fx_hash::{FxHashMap, FxHashSet};
use crate::ir::NodeId;
use super::border::BorderList;
use super::chordal::PhysReg;

/// Colors produced for one block. A value live-in to the block is not
/// reassigned here — its color was already fixed at its dominating
/// definition and is only looked up, not recorded, by `color_block`.
pub struct ColorAssignment {
    pub colors: FxHashMap<NodeId, PhysReg>,
}

/// Colors one block's border list, given the already-assigned colors of its
/// live-in values (looked up from the colors assigned to their dominating
/// definitions). Returns the newly assigned local colors; live-in colors are
/// not repeated in the result (the caller already knows them).
///
/// Walks the border list in
/// reverse (pressure pass appended in scan order, i.e. backward-program
/// order; reversing it yields forward-program order, a perfect elimination
/// order of the chordal interference graph), mark live-in colors used,
/// assign the smallest clear color at each local def, clear on each use
/// whose paired def is local.
pub fn color_block(
    list: &BorderList,
    colors_n: u32,
    live_in_of: impl Fn(NodeId) -> bool,
    color_of: impl Fn(NodeId) -> Option<PhysReg>,
) -> Result<ColorAssignment, BackendError> {
    let mut in_use: FxHashSet<u32> = FxHashSet::default();
    let mut live: FxHashSet<NodeId> = FxHashSet::default();
    let mut assigned: FxHashMap<NodeId, PhysReg> = FxHashMap::default();

    // Live-in values already carry colors from their dominating definition;
    // mark those colors used and the value live, without reassigning.
    for b in &list.borders {
        if live_in_of(b.node) && !live.contains(&b.node) {
            let reg = color_of(b.node).ok_or_else(|| {
                BackendError::invariant("regalloc::assign", format!("live-in value {} has no assigned register", b.node))
            })?;
            in_use.insert(reg.0);
            live.insert(b.node);
        }
    }

    for b in list.borders.iter().rev() {
        if b.is_def() && !live_in_of(b.node) {
            if live.contains(&b.node) {
                return Err(BackendError::invariant("regalloc::assign", format!("value {} defined twice in block", b.node)));
            }
            let col = (0..colors_n).find(|c| !in_use.contains(c)).ok_or_else(|| {
                BackendError::invariant(
                    "regalloc::assign",
                    format!("color exhaustion at def of {} (pressure exceeds {} registers; spill should have run first)", b.node, colors_n),
                )
            })?;
            in_use.insert(col);
            live.insert(b.node);
            assigned.insert(b.node, PhysReg(col));
        } else if b.is_use() {
            let reg = assigned.get(&b.node).copied().or_else(|| color_of(b.node)).ok_or_else(|| {
                BackendError::invariant("regalloc::assign", format!("use of {} has no assigned register", b.node))
            })?;
            if !live.contains(&b.node) {
                return Err(BackendError::invariant("regalloc::assign", format!("use of {} encountered while not live", b.node)));
            }
            in_use.remove(&reg.0);
            live.remove(&b.node);
        }
    }

    Ok(ColorAssignment { colors: assigned })
}
