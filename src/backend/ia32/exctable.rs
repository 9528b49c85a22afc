//! Exception-label table construction: a sorted `.long` pair
//! table emitted at the end of routine emission.

use crate::ir::graph::BlockId;
use crate::ir::NodeId;

/// One exception-table row: the instruction that may trap, tagged with its
/// label id, and the handler block reached on a trap.
#[derive(Debug, Clone, Copy)]
pub struct ExcEntry {
    pub label_id: u32,
    pub instr: NodeId,
    pub handler: BlockId,
}

/// Collects and sorts a routine's exception entries by ascending label id.
/// Ids are assigned in emission order, so sorting by id restores the order
/// instructions actually occur in the final layout, since
/// `Ia32EmitterState::next_exc_label` hands them out sequentially as each
/// node is emitted.
#[derive(Debug, Default)]
pub struct ExcTable {
    entries: Vec<ExcEntry>,
}

impl ExcTable {
    pub fn new() -> Self {
        ExcTable::default()
    }

    pub fn push(&mut self, entry: ExcEntry) {
        self.entries.push(entry);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by label id, ready for emission.
    pub fn sorted(&self) -> Vec<ExcEntry> {
        let mut sorted = self.entries.clone();
        sorted.sort_by_key(|e| e.label_id);
        sorted
    }

    /// Renders the table as GNU-as `.long` pairs: one symbolic exception
    /// label followed by the handler block's label, per entry.
    pub fn render_text(&self, label_text: impl Fn(u32) -> String, block_label: impl Fn(BlockId) -> String) -> String {
        let mut out = String::new();
        for entry in self.sorted() {
            out.push_str(&format!("\t.long {}\n", label_text(entry.label_id)));
            out.push_str(&format!("\t.long {}\n", block_label(entry.handler)));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_are_emitted_in_ascending_label_order_regardless_of_insertion_order() {
        let mut table = ExcTable::new();
        table.push(ExcEntry { label_id: 2, instr: 7, handler: BlockId(1) });
        table.push(ExcEntry { label_id: 0, instr: 3, handler: BlockId(2) });
        table.push(ExcEntry { label_id: 1, instr: 5, handler: BlockId(3) });

        let ids: Vec<u32> = table.sorted().iter().map(|e| e.label_id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }
}
