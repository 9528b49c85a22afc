//! `SwitchJmp` indirect-jump and jump-table emission: an indirect jump
//! through a 4-byte-entry table, followed by the table itself.

use super::addressing::AddressingMode;
use super::operand::Instr;
use super::regs::GpReg;
use crate::ir::graph::BlockId;

/// One case of a switch, mapping a dense table slot to its target block.
/// Multiple slots may share a target (a `default` arm typically spans
/// several slots).
#[derive(Debug, Clone, Copy)]
pub struct SwitchCase {
    pub slot: u32,
    pub target: BlockId,
}

/// Textual `jmp *table(,%reg,4)` indirect jump through a 4-byte-entry
/// table indexed by `index`, followed by a jump table with one entry per
/// case plus a default, labeled once per distinct target.
pub fn switch_jump_instr(table_label: &str, index: GpReg) -> Instr {
    let am = AddressingMode {
        entity: Some(table_label.to_string()),
        index: Some((index, super::addressing::Scale::Four)),
        ..AddressingMode::default()
    };
    Instr::new("jmp", vec![super::operand::AsmOperand::Label(format!("*{}", am.format_text()))])
}

/// Binary-mode indirect jump encoding: `0xFF /4` (group 5, jump r/m32)
/// with a SIB-addressed, no-base operand `disp32(,reg,4)`. The three named bytes are `0xFF` (opcode), `0x24` (ModR/M:
/// mod00, reg=4 for the `/4` extension, rm=100 meaning "SIB follows"), and
/// `0x85` (SIB: scale=4, index=`eax`, base=101 meaning "no base"); a
/// different index register changes only the SIB byte's index field.
pub fn switch_jump_encode(table_disp: i32, index: GpReg) -> Vec<u8> {
    let am = AddressingMode { disp: table_disp, index: Some((index, super::addressing::Scale::Four)), ..AddressingMode::default() };
    let mut bytes = vec![0xFF];
    bytes.extend(am.encode(4));
    bytes
}

/// The opcode/ModR/M/SIB prefix of `switch_jump_encode`, without the
/// trailing 4-byte displacement. Those three bytes never depend on the
/// displacement value itself (a no-base, scale-4-indexed operand always
/// takes `mod00`/disp32), so a caller that doesn't yet know the jump
/// table's final address — true of this emitter, which emits the table
/// label as a symbolic `.long` relocation rather than a resolved address —
/// can still emit the real prefix bytes up front.
pub fn switch_jump_binary_prefix(index: GpReg) -> [u8; 3] {
    let bytes = switch_jump_encode(0, index);
    [bytes[0], bytes[1], bytes[2]]
}

/// One distinct-target label per table slot, in ascending slot order.
pub fn render_table(cases: &[SwitchCase], block_label: impl Fn(BlockId) -> String) -> String {
    let mut sorted = cases.to_vec();
    sorted.sort_by_key(|c| c.slot);
    let mut out = String::new();
    for case in sorted {
        out.push_str(&format!("\t.long {}\n", block_label(case.target)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Binary mode emits a 0xFF 0x24 0x85 prefix, displacement, and SIB
    /// for an `%eax`-indexed table.
    #[test]
    fn binary_switch_jump_has_group5_opcode_and_sib_prefix() {
        let bytes = switch_jump_encode(0x1000, GpReg::Eax);
        assert_eq!(&bytes[0..3], &[0xFF, 0x24, 0x85]);
        assert_eq!(bytes.len(), 7, "opcode + modrm + sib + disp32");
    }

    #[test]
    fn binary_prefix_matches_the_first_three_bytes_of_the_full_encoding() {
        let full = switch_jump_encode(0x2000, GpReg::Ecx);
        let prefix = switch_jump_binary_prefix(GpReg::Ecx);
        assert_eq!(&full[0..3], &prefix);
    }

    #[test]
    fn three_distinct_targets_with_a_default_produce_four_ordered_entries() {
        let cases = vec![
            SwitchCase { slot: 0, target: BlockId(1) },
            SwitchCase { slot: 2, target: BlockId(2) },
            SwitchCase { slot: 1, target: BlockId(3) },
            SwitchCase { slot: 3, target: BlockId(1) },
        ];
        let text = render_table(&cases, |b| format!("B{}", b.0));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("B1"));
        assert!(lines[1].contains("B3"));
        assert!(lines[2].contains("B2"));
        assert!(lines[3].contains("B1"));
    }
}
