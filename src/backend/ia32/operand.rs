//! Structured operand list and a small rendering interpreter in place of a
//! variadic format-string mechanism: every operand placeholder
//! (register, addressing mode, immediate, label, plus the high/low and
//! register-width modifiers) becomes a variant or field here instead of a
//! character parsed out of a string at emission time.

use super::addressing::AddressingMode;
use super::regs::{GpReg, X87Slot, XmmReg};

/// Operand width in bytes, driving the AT&T mnemonic size suffix
/// (`b`/`w`/`l` for integers) and which `GpReg::name_*` variant
/// gets used for a register operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    Byte,
    Word,
    Long,
}

impl Width {
    pub fn suffix(self) -> &'static str {
        match self {
            Width::Byte => "b",
            Width::Word => "w",
            Width::Long => "l",
        }
    }

    pub fn bytes(self) -> u8 {
        match self {
            Width::Byte => 1,
            Width::Word => 2,
            Width::Long => 4,
        }
    }
}

/// One operand in AT&T order. `Reg`/`RegHigh` select which 8-bit half a
/// general-purpose register's byte form names, `Reg16` the 16-bit name (modifier `^`).
#[derive(Debug, Clone)]
pub enum AsmOperand {
    Reg(GpReg, Width),
    RegHigh(GpReg),
    Xmm(XmmReg),
    X87(X87Slot),
    Imm(i64),
    Mem(AddressingMode),
    /// A bare symbolic label, used for jump/call targets and the operand
    /// of `lea`-style entity references.
    Label(String),
}

impl AsmOperand {
    pub fn format_text(&self) -> String {
        match self {
            AsmOperand::Reg(r, Width::Long) => format!("%{}", r.name32()),
            AsmOperand::Reg(r, Width::Word) => format!("%{}", r.name16()),
            AsmOperand::Reg(r, Width::Byte) => match r.name8_low() {
                Some(n) => format!("%{n}"),
                None => format!("%{}", r.name32()),
            },
            AsmOperand::RegHigh(r) => match r.name8_high() {
                Some(n) => format!("%{n}"),
                None => format!("%{}", r.name32()),
            },
            AsmOperand::Xmm(r) => format!("%{}", r.name()),
            AsmOperand::X87(s) => format!("%{}", s.name()),
            AsmOperand::Imm(v) => format!("${v}"),
            AsmOperand::Mem(am) => am.format_text(),
            AsmOperand::Label(l) => l.clone(),
        }
    }
}

/// One abstract instruction: a mnemonic plus its operands in AT&T
/// `src, dst` order.
#[derive(Debug, Clone)]
pub struct Instr {
    pub mnemonic: String,
    pub operands: Vec<AsmOperand>,
}

impl Instr {
    pub fn new(mnemonic: impl Into<String>, operands: Vec<AsmOperand>) -> Self {
        Instr { mnemonic: mnemonic.into(), operands }
    }

    pub fn nullary(mnemonic: impl Into<String>) -> Self {
        Instr { mnemonic: mnemonic.into(), operands: Vec::new() }
    }

    /// Renders one instruction as a tab-prefixed, comma-separated GNU-as
    /// line.
    pub fn render_text(&self) -> String {
        if self.operands.is_empty() {
            format!("\t{}", self.mnemonic)
        } else {
            let ops: Vec<String> = self.operands.iter().map(AsmOperand::format_text).collect();
            format!("\t{} {}", self.mnemonic, ops.join(", "))
        }
    }
}
