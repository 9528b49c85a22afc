//! Generic machine-code encoder over the structured `Instr`/`AsmOperand`
//! model, used by `gen_binary_routine`.
//!
//! Every `push` site in `mod.rs` already builds a fully structured `Instr`
//! for the textual emitter; rather than duplicate the per-opcode dispatch
//! a second time for binary mode, this module works directly off that same
//! value. An instruction this table doesn't recognize falls back to a
//! `#`-commented textual line for an opcode without a byte encoder: the
//! emitter still produces something for every node, but only the forms
//! named here are a claim of byte-accurate native encoding.

use super::condcode::CondCode;
use super::operand::{AsmOperand, Instr};
use super::opforms::{binop_encode_imm_reg, binop_encode_reg_reg, BINOP_FAMILIES};
use super::regs::GpReg;

/// What `encode_instr` produced for one `Instr`.
pub enum BinaryForm {
    /// A complete, self-contained byte sequence.
    Bytes(Vec<u8>),
    /// A fixed opcode prefix followed by a displacement that can't be
    /// resolved until the whole routine (and its jump/call targets) is
    /// laid out. Rendered as a symbolic `.long target - . - 4` expression,
    /// the same convention used for PC-relative jump
    /// targets rather than a literal 4-byte value this pass doesn't have.
    Reloc32 { opcode: Vec<u8>, expr: String },
}

fn modrm11(reg_field: GpReg, rm_field: GpReg) -> u8 {
    0xC0 | (reg_field.encoding() << 3) | rm_field.encoding()
}

fn modrm_ext(ext: u8, rm_field: GpReg) -> u8 {
    0xC0 | (ext << 3) | rm_field.encoding()
}

fn imul_imm_bytes(dst: GpReg, src: GpReg, imm: i32) -> Vec<u8> {
    let modrm = modrm11(dst, src);
    if (-128..=127).contains(&imm) {
        vec![0x6B, modrm, imm as i8 as u8]
    } else {
        let mut bytes = vec![0x69, modrm];
        bytes.extend_from_slice(&imm.to_le_bytes());
        bytes
    }
}

/// Encodes the instruction shapes this backend actually produces: the
/// eight arithmetic/logic families in both reg/reg and reg/imm form
///, `neg`/`not`/`inc`/`dec`, the register-shuffle
/// `mov`/`xchg` prefaces used by `Minus64Bit`/`be_Copy`/`be_Perm`, `imul`
/// in all three forms, `cmovcc`/`setcc`,
/// direct `jmp`/`jcc`/`call` as a fixed opcode plus a symbolic rel32,
/// `ret`, `pop`, the `CopyB` string-move mnemonics, and
/// the XMM `be_Perm` swap. Indirect `jmp *...` (the
/// `SwitchJmp` case) is handled by the caller directly through
/// `jumptable::switch_jump_binary_prefix`, since its addressing mode
/// carries state (the jump-table label) this generic, mnemonic-driven
/// encoder never sees. x87 stack opcodes and the FP `setcc` parity-combine
/// step (`orb`/`andb` on a high/low register pair, whose 8-bit encoding
/// needs a register-half distinction this crate's `GpReg` doesn't carry)
/// return `None`.
pub fn encode_instr(instr: &Instr) -> Option<BinaryForm> {
    let mnemonic = instr.mnemonic.as_str();
    let ops = instr.operands.as_slice();

    if let Some(family) = mnemonic.strip_suffix('l').and_then(|base| BINOP_FAMILIES.iter().find(|f| f.mnemonic == base)) {
        return match ops {
            [AsmOperand::Reg(src, _), AsmOperand::Reg(dst, _)] => Some(BinaryForm::Bytes(binop_encode_reg_reg(family, *src, *dst))),
            [AsmOperand::Imm(imm), AsmOperand::Reg(dst, _)] => Some(BinaryForm::Bytes(binop_encode_imm_reg(family, *dst, *imm as i32))),
            _ => None,
        };
    }

    match mnemonic {
        "negl" | "notl" => {
            let ext = if mnemonic == "negl" { 3 } else { 2 };
            match ops {
                [AsmOperand::Reg(r, _)] => Some(BinaryForm::Bytes(vec![0xF7, modrm_ext(ext, *r)])),
                _ => None,
            }
        }
        "incl" | "decl" => {
            let ext = if mnemonic == "incl" { 0 } else { 1 };
            match ops {
                [AsmOperand::Reg(r, _)] => Some(BinaryForm::Bytes(vec![0xFF, modrm_ext(ext, *r)])),
                _ => None,
            }
        }
        "movl" => match ops {
            [AsmOperand::Reg(src, _), AsmOperand::Reg(dst, _)] => Some(BinaryForm::Bytes(vec![0x89, modrm11(*src, *dst)])),
            _ => None,
        },
        "xchgl" => match ops {
            [AsmOperand::Reg(a, _), AsmOperand::Reg(b, _)] => Some(BinaryForm::Bytes(vec![0x87, modrm11(*a, *b)])),
            _ => None,
        },
        "imull" => match ops {
            [AsmOperand::Imm(imm), AsmOperand::Reg(src, _), AsmOperand::Reg(dst, _)] => {
                Some(BinaryForm::Bytes(imul_imm_bytes(*dst, *src, *imm as i32)))
            }
            [AsmOperand::Imm(imm), AsmOperand::Reg(dst, _)] => Some(BinaryForm::Bytes(imul_imm_bytes(*dst, *dst, *imm as i32))),
            [AsmOperand::Reg(src, _), AsmOperand::Reg(dst, _)] => Some(BinaryForm::Bytes(vec![0x0F, 0xAF, modrm11(*dst, *src)])),
            _ => None,
        },
        _ if mnemonic.starts_with("cmov") => {
            let cc = CondCode::from_suffix(&mnemonic[4..])?;
            match ops {
                [AsmOperand::Reg(src, _), AsmOperand::Reg(dst, _)] => Some(BinaryForm::Bytes(vec![0x0F, 0x40 | cc.code(), modrm11(*dst, *src)])),
                _ => None,
            }
        }
        _ if mnemonic.starts_with("set") => {
            let cc = CondCode::from_suffix(&mnemonic[3..])?;
            match ops {
                [AsmOperand::Reg(dst, _)] => Some(BinaryForm::Bytes(vec![0x0F, 0x90 | cc.code(), modrm_ext(0, *dst)])),
                _ => None,
            }
        }
        "jmp" => match ops {
            [AsmOperand::Label(l)] if !l.starts_with('*') => {
                Some(BinaryForm::Reloc32 { opcode: vec![0xE9], expr: format!("{l} - . - 4") })
            }
            _ => None,
        },
        _ if mnemonic.starts_with('j') => {
            let cc = CondCode::from_suffix(&mnemonic[1..])?;
            match ops {
                [AsmOperand::Label(l)] if !l.starts_with('*') => {
                    Some(BinaryForm::Reloc32 { opcode: vec![0x0F, 0x80 | cc.code()], expr: format!("{l} - . - 4") })
                }
                _ => None,
            }
        }
        "call" => match ops {
            [AsmOperand::Label(l)] => Some(BinaryForm::Reloc32 { opcode: vec![0xE8], expr: format!("{l} - . - 4") }),
            _ => None,
        },
        "popl" => match ops {
            [AsmOperand::Reg(r, _)] => Some(BinaryForm::Bytes(vec![0x58 | r.encoding()])),
            _ => None,
        },
        "ret" => Some(BinaryForm::Bytes(vec![0xC3])),
        "rep movsd" => Some(BinaryForm::Bytes(vec![0xF3, 0xA5])),
        "movsb" => Some(BinaryForm::Bytes(vec![0xA4])),
        "movsw" => Some(BinaryForm::Bytes(vec![0x66, 0xA5])),
        "xorpd" => match ops {
            [AsmOperand::Xmm(src), AsmOperand::Xmm(dst)] => Some(BinaryForm::Bytes(vec![0x66, 0x0F, 0x57, 0xC0 | (dst.encoding() << 3) | src.encoding()])),
            _ => None,
        },
        _ => None,
    }
}

/// Renders one `BinaryForm` as a `.byte`/`.long` directive line, with the
/// original mnemonic kept as a trailing comment for readability.
pub fn render_binary_line(form: &BinaryForm, original: &Instr) -> String {
    let hex = |bytes: &[u8]| bytes.iter().map(|b| format!("0x{b:02x}")).collect::<Vec<_>>().join(", ");
    match form {
        BinaryForm::Bytes(bytes) => format!("\t.byte {}\t# {}", hex(bytes), original.mnemonic),
        BinaryForm::Reloc32 { opcode, expr } => format!("\t.byte {}\n\t.long {expr}\t# {}", hex(opcode), original.mnemonic),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::operand::Width;
    use super::super::opforms::lookup_binop_family;

    #[test]
    fn binop_reg_reg_matches_the_textual_family() {
        let sub = lookup_binop_family("sub").unwrap();
        let instr = Instr::new("subl", vec![AsmOperand::Reg(GpReg::Ecx, Width::Long), AsmOperand::Reg(GpReg::Eax, Width::Long)]);
        let form = encode_instr(&instr).expect("sub reg,reg is encodable");
        match form {
            BinaryForm::Bytes(bytes) => assert_eq!(bytes, binop_encode_reg_reg(sub, GpReg::Ecx, GpReg::Eax)),
            _ => panic!("expected a complete byte sequence"),
        }
    }

    #[test]
    fn neg_uses_f7_slash_3() {
        let instr = Instr::new("negl", vec![AsmOperand::Reg(GpReg::Eax, Width::Long)]);
        match encode_instr(&instr).unwrap() {
            BinaryForm::Bytes(bytes) => assert_eq!(bytes, vec![0xF7, 0xD8]),
            _ => panic!(),
        }
    }

    #[test]
    fn conditional_jump_to_a_direct_label_is_a_fixed_opcode_plus_relocation() {
        let instr = Instr::new("jge", vec![AsmOperand::Label(".LBB2".into())]);
        match encode_instr(&instr).unwrap() {
            BinaryForm::Reloc32 { opcode, expr } => {
                assert_eq!(opcode, vec![0x0F, 0x80 | CondCode::GreaterEq.code()]);
                assert_eq!(expr, ".LBB2 - . - 4");
            }
            _ => panic!("expected a relocation form"),
        }
    }

    #[test]
    fn indirect_switch_jump_is_not_handled_generically() {
        let instr = Instr::new("jmp", vec![AsmOperand::Label("*tbl(,%eax,4)".into())]);
        assert!(encode_instr(&instr).is_none(), "caller must special-case indirect jumps through jumptable::switch_jump_binary_prefix");
    }

    #[test]
    fn ret_is_a_single_byte() {
        let form = encode_instr(&Instr::nullary("ret")).unwrap();
        match form {
            BinaryForm::Bytes(bytes) => assert_eq!(bytes, vec![0xC3]),
            _ => panic!(),
        }
    }

    #[test]
    fn unknown_mnemonic_falls_back_to_none() {
        let instr = Instr::new("fadd", vec![AsmOperand::X87(super::super::regs::X87Slot(1))]);
        assert!(encode_instr(&instr).is_none());
    }
}
