//! Phi-translation.
//!
//! An expression anticipated at the *start* of a block that has a Phi
//! operand reaching back into one specific predecessor must be restated, on
//! that predecessor's edge, in terms of the value the Phi would select
//! coming from that predecessor — otherwise the meet across predecessors
//! would compare apples (the merged Phi value) to oranges (one
//! predecessor's own operand). Translation walks the expression bottom-up,
//! substituting every Phi node local to `to_block` with its operand on the
//! `from_block` edge, and otherwise copying the node's shape unchanged.

use crate::common::error::BackendError;
use crate::common::fx_hash::FxHashMap;
use crate::ir::graph::BlockId;
use crate::ir::node::Attr;
use crate::ir::{Graph, Mode, Node, NodeId, Opcode};
use super::valuenum::{ValueNumber, ValueTable};

/// The result of translating one node along a predecessor edge: either it
/// collapses back onto an existing node unchanged (no Phi in its
/// transitive operands), or it names a new expression shape that would need
/// to be inserted as a node of its own if this translated value turns out
/// to be partially redundant.
#[derive(Debug, Clone)]
pub enum Translated {
    /// Translation left the node unchanged; reuse `original` directly.
    Unchanged(NodeId),
    /// Translation substituted at least one Phi operand; this describes the
    /// node that would need constructing in `from_block` to represent the
    /// translated expression.
    New { opcode: Opcode, mode: Mode, attrs: Vec<(&'static str, Attr)>, operands: Vec<Translated> },
}

impl Translated {
    /// Value number of the translated expression, consulting `value_table`
    /// for already-known operand values; returns `None` only if some
    /// translated operand is itself new and not yet identified (i.e. this
    /// whole expression would need inserting before it has a value).
    pub fn value_number(&self, value_table: &ValueTable) -> Option<ValueNumber> {
        match self {
            Translated::Unchanged(n) => value_table.lookup(*n),
            Translated::New { opcode, mode, attrs, operands } => {
                let operand_vns: Vec<ValueNumber> = operands.iter().map(|o| o.value_number(value_table)).collect::<Option<_>>()?;
                value_table.identify_expression(*opcode, *mode, attrs.clone(), operand_vns)
            }
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Translated::New { .. })
    }
}

/// Translates `node` (which must live in `to_block`, or be a value already
/// available before it that doesn't depend on `to_block`'s Phis) along the
/// control edge from `from_block` into `to_block`.
///
/// `memo` caches translations within one call so a diamond-shaped
/// subexpression (two operands sharing a common ancestor) isn't retranslated
/// twice.
///
/// Fails with `BackendError::Consistency` if `from_block` turns out not to
/// be a predecessor of `to_block` while translating a Phi that lives there.
/// A well-formed CFG guarantees every Phi operand has a matching
/// predecessor, so this can only happen if the caller's `Dominance`/block
/// graph is stale.
pub fn phi_translate(graph: &Graph, node: NodeId, from_block: BlockId, to_block: BlockId) -> Result<Translated, BackendError> {
    let mut memo = FxHashMap::default();
    translate_rec(graph, node, from_block, to_block, &mut memo)
}

fn pred_index(graph: &Graph, to_block: BlockId, from_block: BlockId) -> Option<usize> {
    graph.block(to_block).preds.iter().position(|&p| p == from_block)
}

fn translate_rec(
    graph: &Graph,
    node_id: NodeId,
    from_block: BlockId,
    to_block: BlockId,
    memo: &mut FxHashMap<NodeId, Translated>,
) -> Result<Translated, BackendError> {
    if let Some(t) = memo.get(&node_id) {
        return Ok(t.clone());
    }

    let node = graph.node(node_id);

    if node.is_phi() && node.block == to_block {
        let idx = pred_index(graph, to_block, from_block).ok_or_else(|| {
            BackendError::Consistency(format!(
                "phi_translate: block {from_block:?} is not a predecessor of {to_block:?}, but node {node_id:?} is a Phi living there"
            ))
        })?;
        let operand = node.inputs[idx];
        let translated = Translated::Unchanged(operand);
        memo.insert(node_id, translated.clone());
        return Ok(translated);
    }

    // Values defined outside `to_block` (in a dominating block) are the
    // same on every edge into it; only expressions local to `to_block`
    // itself can transitively depend on one of its Phis.
    if node.block != to_block {
        let translated = Translated::Unchanged(node_id);
        memo.insert(node_id, translated.clone());
        return Ok(translated);
    }

    let translated_operands: Vec<Translated> =
        node.inputs.iter().map(|&op| translate_rec(graph, op, from_block, to_block, memo)).collect::<Result<_, _>>()?;

    let any_new = translated_operands.iter().any(Translated::is_new);
    let operand_identities_changed = node
        .inputs
        .iter()
        .zip(translated_operands.iter())
        .any(|(&orig, t)| !matches!(t, Translated::Unchanged(n) if *n == orig));

    let result = if !any_new && !operand_identities_changed {
        Translated::Unchanged(node_id)
    } else {
        Translated::New {
            opcode: node.opcode,
            mode: node.mode,
            attrs: super::valuenum::attr_snapshot(node),
            operands: translated_operands,
        }
    };

    memo.insert(node_id, result.clone());
    Ok(result)
}
