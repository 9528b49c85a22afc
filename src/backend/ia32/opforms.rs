//! Per-opcode-family instruction selection: `Minus64Bit`'s eight
//! register-aliasing subcases, the `be_Perm` register-shuffle swap,
//! `CopyB`/`CopyB_i`'s unrolled string-move prolog, and the x87
//! stack-relative binop forward/reverse encoding. The binop-family
//! dispatcher is one data table plus one generic function in place of a
//! family of near-identical per-mnemonic encoders.

use super::addressing::AddressingMode;
use super::condcode::CondCode;
use super::operand::{AsmOperand, Instr, Width};
use super::regs::{GpReg, X87Slot, XmmReg};
use crate::common::error::BackendError;

/// One entry of the binop-family table: `(opcode-in-reg, opcode-eax-imm,
/// opcode-reg-imm, modr/m-extension)` collapsed to the one piece of data
/// that doesn't follow from the family's position in the classic x86 opcode
/// layout (`add/or/adc/sbb/and/sub/xor/cmp`, base opcodes `0x00`, `0x08`,
/// ..., step `0x08`) plus the mnemonic used in textual mode.
#[derive(Debug, Clone, Copy)]
pub struct BinopFamily {
    pub mnemonic: &'static str,
    pub modrm_ext: u8,
}

/// Indexed exactly as the real ISA lays out the eight arithmetic/logic
/// families: family `i`'s register-form opcode is `0x00 + 8*i`, matching
/// `modrm_ext`.
pub const BINOP_FAMILIES: [BinopFamily; 8] = [
    BinopFamily { mnemonic: "add", modrm_ext: 0 },
    BinopFamily { mnemonic: "or", modrm_ext: 1 },
    BinopFamily { mnemonic: "adc", modrm_ext: 2 },
    BinopFamily { mnemonic: "sbb", modrm_ext: 3 },
    BinopFamily { mnemonic: "and", modrm_ext: 4 },
    BinopFamily { mnemonic: "sub", modrm_ext: 5 },
    BinopFamily { mnemonic: "xor", modrm_ext: 6 },
    BinopFamily { mnemonic: "cmp", modrm_ext: 7 },
];

pub fn lookup_binop_family(mnemonic: &str) -> Result<&'static BinopFamily, BackendError> {
    BINOP_FAMILIES
        .iter()
        .find(|f| f.mnemonic == mnemonic)
        .ok_or_else(|| BackendError::UnsupportedConstruct(format!("no binop family for mnemonic '{mnemonic}'")))
}

/// Textual two-operand binop: `addl %esrc, %edst` (AT&T `src, dst` order,
/// dst implicitly read-modify-written). Single dispatcher over the family
/// table.
pub fn binop_reg_reg(family: &BinopFamily, width: Width, src: GpReg, dst: GpReg) -> Instr {
    Instr::new(format!("{}{}", family.mnemonic, width.suffix()), vec![AsmOperand::Reg(src, width), AsmOperand::Reg(dst, width)])
}

pub fn binop_reg_mem(family: &BinopFamily, width: Width, src: GpReg, dst: AddressingMode) -> Instr {
    Instr::new(format!("{}{}", family.mnemonic, width.suffix()), vec![AsmOperand::Reg(src, width), AsmOperand::Mem(dst)])
}

pub fn binop_imm_reg(family: &BinopFamily, width: Width, imm: i64, dst: GpReg) -> Instr {
    Instr::new(format!("{}{}", family.mnemonic, width.suffix()), vec![AsmOperand::Imm(imm), AsmOperand::Reg(dst, width)])
}

/// Binary-mode reg/reg encoding for a binop family: opcode `base+1 /r` with
/// `reg` = src, `rm` = dst (mod11), matching `dst op= src`. The family's
/// position in the classic opcode layout is exactly its `modrm_ext` (family
/// `i`'s register-form opcode is `0x00 + 8*i`, per `BINOP_FAMILIES`'s own
/// doc comment), so no table lookup is needed to recover it.
pub fn binop_encode_reg_reg(family: &BinopFamily, src: GpReg, dst: GpReg) -> Vec<u8> {
    let opcode = family.modrm_ext * 8 + 0x01;
    vec![opcode, 0xC0 | (src.encoding() << 3) | dst.encoding()]
}

/// Binary-mode reg/imm32 encoding: `0x81 /ext id`.
/// Immediates that fit an 8-bit signed form use the shorter `0x83 /ext ib`
/// encoding instead.
pub fn binop_encode_imm_reg(family: &BinopFamily, dst: GpReg, imm: i32) -> Vec<u8> {
    let modrm = 0xC0 | (family.modrm_ext << 3) | dst.encoding();
    if (-128..=127).contains(&imm) {
        vec![0x83, modrm, imm as i8 as u8]
    } else {
        let mut bytes = vec![0x81, modrm];
        bytes.extend_from_slice(&imm.to_le_bytes());
        bytes
    }
}

/// `IMul` instruction selection: the three-operand
/// immediate form (`imull $imm, %esrc, %edst`) is used whenever an
/// immediate operand is present and `dst != src` (the only IA-32 form that
/// can name a source distinct from the destination); otherwise the
/// two-operand form is used (`imull $imm, %edst` when `dst == src`, or
/// `imull %esrc, %edst` for the register/register form `0F AF /r`).
pub fn imul(dst: GpReg, src: GpReg, imm: Option<i64>) -> Instr {
    match imm {
        Some(imm) if dst != src => {
            Instr::new("imull", vec![AsmOperand::Imm(imm), AsmOperand::Reg(src, Width::Long), AsmOperand::Reg(dst, Width::Long)])
        }
        Some(imm) => Instr::new("imull", vec![AsmOperand::Imm(imm), AsmOperand::Reg(dst, Width::Long)]),
        None => Instr::new("imull", vec![AsmOperand::Reg(src, Width::Long), AsmOperand::Reg(dst, Width::Long)]),
    }
}

/// `CMovcc` instruction selection: `cmovCC src, dst`
/// computes `dst = cond ? src : dst`, so `dst` must already hold the
/// "false" value and `src` the "true" one. When the allocator placed the
/// "true" value in `dst` itself, swap the roles and invert the condition
/// instead (`cmov !CC false_input, dst` gives the same result without
/// requiring a fourth register).
pub fn cmovcc(cond: CondCode, dst: GpReg, true_input: GpReg, false_input: GpReg) -> Instr {
    let (cond, src) = if dst == true_input { (cond.invert(), false_input) } else { (cond, true_input) };
    Instr::new(format!("cmov{}", cond.suffix()), vec![AsmOperand::Reg(src, Width::Long), AsmOperand::Reg(dst, Width::Long)])
}

/// `Minus64Bit`: negate a 64-bit value held in two 32-bit registers.
/// `in_lo`/`in_hi` and `out_lo`/`out_hi` may alias in any of
/// eight ways; each is resolved to a short register-shuffle preface (`mov`
/// or `xchg`, never both) followed by one of two three-instruction negate
/// sequences:
/// - `normal_neg` (`out_lo == in_lo` and, after any preface, `out_hi` holds
///   `in_hi`): `neg out_hi; neg out_lo; sbb $0, out_hi`.
/// - `zero_neg` (the destination pair doesn't already hold `in_hi`):
///   `xor out_hi, out_hi; neg out_lo; sbb in_hi, out_hi`.
pub fn minus64bit(in_lo: GpReg, in_hi: GpReg, out_lo: GpReg, out_hi: GpReg) -> Vec<Instr> {
    let mut instrs = Vec::new();
    let normal_neg = |instrs: &mut Vec<Instr>| {
        instrs.push(Instr::new("negl", vec![AsmOperand::Reg(out_hi, Width::Long)]));
        instrs.push(Instr::new("negl", vec![AsmOperand::Reg(out_lo, Width::Long)]));
        instrs.push(Instr::new("sbbl", vec![AsmOperand::Imm(0), AsmOperand::Reg(out_hi, Width::Long)]));
    };
    let zero_neg = |instrs: &mut Vec<Instr>, hi_source: GpReg| {
        instrs.push(Instr::new("xorl", vec![AsmOperand::Reg(out_hi, Width::Long), AsmOperand::Reg(out_hi, Width::Long)]));
        instrs.push(Instr::new("negl", vec![AsmOperand::Reg(out_lo, Width::Long)]));
        instrs.push(Instr::new("sbbl", vec![AsmOperand::Reg(hi_source, Width::Long), AsmOperand::Reg(out_hi, Width::Long)]));
    };

    if out_lo == in_lo {
        if out_hi != in_hi {
            // a -> a, b -> d
            zero_neg(&mut instrs, in_hi);
        } else {
            // a -> a, b -> b
            normal_neg(&mut instrs);
        }
    } else if out_lo == in_hi {
        if out_hi == in_lo {
            // a -> b, b -> a
            instrs.push(Instr::new("xchgl", vec![AsmOperand::Reg(in_lo, Width::Long), AsmOperand::Reg(in_hi, Width::Long)]));
            normal_neg(&mut instrs);
        } else {
            // a -> b, b -> d
            instrs.push(Instr::new("movl", vec![AsmOperand::Reg(in_hi, Width::Long), AsmOperand::Reg(out_hi, Width::Long)]));
            instrs.push(Instr::new("movl", vec![AsmOperand::Reg(in_lo, Width::Long), AsmOperand::Reg(out_lo, Width::Long)]));
            normal_neg(&mut instrs);
        }
    } else if out_hi == in_lo {
        // a -> c, b -> a
        instrs.push(Instr::new("movl", vec![AsmOperand::Reg(in_lo, Width::Long), AsmOperand::Reg(out_lo, Width::Long)]));
        zero_neg(&mut instrs, in_hi);
    } else if out_hi == in_hi {
        // a -> c, b -> b
        instrs.push(Instr::new("movl", vec![AsmOperand::Reg(in_lo, Width::Long), AsmOperand::Reg(out_lo, Width::Long)]));
        normal_neg(&mut instrs);
    } else {
        // a -> c, b -> d
        instrs.push(Instr::new("movl", vec![AsmOperand::Reg(in_lo, Width::Long), AsmOperand::Reg(out_lo, Width::Long)]));
        zero_neg(&mut instrs, in_hi);
    }
    instrs
}

/// `CopyB`: `rep movsd`-based memcpy for a size unknown until runtime
/// (`%ecx` holds the dword count), prefaced with a `movsb`/`movsw` to bring
/// a constant residue down to a multiple of 4.
pub fn copyb(residue: u32) -> Vec<Instr> {
    let mut instrs = copyb_prolog(residue);
    instrs.push(Instr::nullary("rep movsd"));
    instrs
}

/// `CopyB_i`: fully unrolled memcpy of a compile-time-constant `size`
/// bytes — one `movsd` per whole dword plus the same residue prolog as
/// `CopyB`.
pub fn copyb_i(size: u32) -> Vec<Instr> {
    let mut instrs = copyb_prolog(size);
    for _ in 0..(size >> 2) {
        instrs.push(Instr::nullary("movsd"));
    }
    instrs
}

fn copyb_prolog(size: u32) -> Vec<Instr> {
    let mut instrs = Vec::new();
    if size & 1 != 0 {
        instrs.push(Instr::nullary("movsb"));
    }
    if size & 2 != 0 {
        instrs.push(Instr::nullary("movsw"));
    }
    instrs
}

/// `be_Perm`: exchange the contents of two same-class registers in place
///. General
/// purpose uses a single `xchg`; XMM has no exchange instruction, so three
/// `xorpd`s perform an XOR-swap; x87 values are always addressed by stack
/// position (handled by the caller with no instructions at all), so only
/// the two register classes that need real code get a helper here.
pub fn be_perm_gp(a: GpReg, b: GpReg) -> Instr {
    Instr::new("xchgl", vec![AsmOperand::Reg(b, Width::Long), AsmOperand::Reg(a, Width::Long)])
}

pub fn be_perm_xmm(a: XmmReg, b: XmmReg) -> Vec<Instr> {
    vec![
        Instr::new("xorpd", vec![AsmOperand::Xmm(b), AsmOperand::Xmm(a)]),
        Instr::new("xorpd", vec![AsmOperand::Xmm(a), AsmOperand::Xmm(b)]),
        Instr::new("xorpd", vec![AsmOperand::Xmm(b), AsmOperand::Xmm(a)]),
    ]
}

/// x87 stack binop: `fadd`/`fsub`/`fmul`/`fdiv`. One input
/// must be `st(0)`; `reverse` flips which mnemonic variant runs for
/// non-commutative ops (sub/div) so the instruction reads correctly
/// regardless of which operand sits at the stack top, expressed here as a
/// pair of mnemonics chosen by the caller rather than opcode bits since
/// this emitter's x87 path is textual-only.
pub fn x87_binop(mnemonic_fwd: &str, mnemonic_rev: &str, st0_is_first_operand: bool, other: X87Slot, out: X87Slot, pop: bool) -> Instr {
    let mnemonic = if st0_is_first_operand { mnemonic_fwd } else { mnemonic_rev };
    let mnemonic = if pop { format!("{mnemonic}p") } else { mnemonic.to_string() };
    let _ = out;
    Instr::new(mnemonic, vec![AsmOperand::X87(other)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn imul_uses_three_address_form_only_when_dst_differs_from_src() {
        let i = imul(GpReg::Eax, GpReg::Ecx, Some(4));
        assert_eq!(i.operands.len(), 3);
        let i = imul(GpReg::Eax, GpReg::Eax, Some(4));
        assert_eq!(i.operands.len(), 2);
        let i = imul(GpReg::Eax, GpReg::Ecx, None);
        assert_eq!(i.operands.len(), 2);
    }

    #[test]
    fn cmovcc_swaps_and_inverts_when_dst_equals_true_input() {
        let i = cmovcc(CondCode::Less, GpReg::Eax, GpReg::Eax, GpReg::Ecx);
        assert_eq!(i.mnemonic, "cmovge", "inverted condition when dst held the true value");
    }

    #[test]
    fn cmovcc_keeps_condition_when_dst_is_the_false_input() {
        let i = cmovcc(CondCode::Less, GpReg::Eax, GpReg::Ecx, GpReg::Eax);
        assert_eq!(i.mnemonic, "cmovl");
    }

    /// Every combination of aliasing between the input pair and a disjoint
    /// output pair must produce a non-empty, well-formed instruction
    /// sequence.
    #[test]
    fn minus64bit_handles_all_eight_aliasing_cases() {
        use GpReg::*;
        let cases = [
            (Eax, Edx, Eax, Edx), // a->a, b->b (identity, normal_neg)
            (Eax, Edx, Eax, Ecx), // a->a, b->d (zero_neg)
            (Eax, Edx, Edx, Eax), // a->b, b->a (xchg + normal_neg)
            (Eax, Edx, Edx, Ecx), // a->b, b->d (mov, mov, normal_neg)
            (Eax, Edx, Ecx, Eax), // a->c, b->a (mov, zero_neg)
            (Eax, Edx, Ecx, Edx), // a->c, b->b (mov, normal_neg)
            (Eax, Edx, Ecx, Ebx), // a->c, b->d (mov, zero_neg)
            (Eax, Ecx, Ebx, Edx), // fully disjoint pair (mov, zero_neg)
        ];
        for (in_lo, in_hi, out_lo, out_hi) in cases {
            let seq = minus64bit(in_lo, in_hi, out_lo, out_hi);
            assert!(!seq.is_empty());
            assert!(seq.iter().any(|i| i.mnemonic.starts_with("neg")), "every case negates the low word");
        }
    }

    #[test]
    fn copyb_i_unrolls_four_byte_chunks_and_handles_residue() {
        let instrs = copyb_i(11);
        assert_eq!(instrs[0].mnemonic, "movsb");
        assert_eq!(instrs[1].mnemonic, "movsw");
        assert_eq!(instrs.iter().filter(|i| i.mnemonic == "movsd").count(), 2);
    }

    #[test]
    fn binop_encode_reg_reg_matches_classic_opcode_layout() {
        let sub = lookup_binop_family("sub").unwrap();
        let bytes = binop_encode_reg_reg(sub, GpReg::Ecx, GpReg::Eax);
        assert_eq!(bytes[0], 0x28 + 0x01, "sub is family index 5, base opcode 0x28");
    }
}
