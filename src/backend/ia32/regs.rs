//! IA-32 register files: general purpose, XMM, and the x87 stack.
//!
//! Covers the 8 general-purpose registers IA-32 actually has (no REX
//! prefixes, no r8-r15), plus the XMM and x87 classes `ir::RegClassKind`
//! distinguishes.

/// A general-purpose register, encoded 0-7 exactly as ModR/M and SIB expect
///. Unlike x86-64, IA-32 has no extended registers, so
/// encoding never needs a REX-equivalent prefix bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum GpReg {
    Eax = 0,
    Ecx = 1,
    Edx = 2,
    Ebx = 3,
    Esp = 4,
    Ebp = 5,
    Esi = 6,
    Edi = 7,
}

impl GpReg {
    pub const ALL: [GpReg; 8] = [GpReg::Eax, GpReg::Ecx, GpReg::Edx, GpReg::Ebx, GpReg::Esp, GpReg::Ebp, GpReg::Esi, GpReg::Edi];

    pub fn from_encoding(n: u8) -> GpReg {
        Self::ALL[(n & 0x7) as usize]
    }

    /// ModR/M and SIB field encoding: this is exactly
    /// `self as u8`, but named so call sites read as encoding, not casting.
    pub fn encoding(self) -> u8 {
        self as u8
    }

    /// Whether this register's encoding (`0x04`) forces a SIB byte when
    /// used as a base register: base register encoding 0x04 (the stack
    /// pointer) always forces a SIB byte.
    pub fn is_sib_required_base(self) -> bool {
        self.encoding() == 0x04
    }

    /// Whether this register's encoding (`0x05`) needs the no-displacement
    /// special case.
    pub fn is_disp_required_base(self) -> bool {
        self.encoding() == 0x05
    }

    pub fn name32(self) -> &'static str {
        match self {
            GpReg::Eax => "eax",
            GpReg::Ecx => "ecx",
            GpReg::Edx => "edx",
            GpReg::Ebx => "ebx",
            GpReg::Esp => "esp",
            GpReg::Ebp => "ebp",
            GpReg::Esi => "esi",
            GpReg::Edi => "edi",
        }
    }

    pub fn name16(self) -> &'static str {
        match self {
            GpReg::Eax => "ax",
            GpReg::Ecx => "cx",
            GpReg::Edx => "dx",
            GpReg::Ebx => "bx",
            GpReg::Esp => "sp",
            GpReg::Ebp => "bp",
            GpReg::Esi => "si",
            GpReg::Edi => "di",
        }
    }

    /// Low 8-bit sub-register name (`%al`, `%cl`, ...), or `None` for the
    /// four registers that predate a REX-equivalent byte encoding on IA-32
    /// (`esp`/`ebp`/`esi`/`edi` have no classic low-byte form).
    pub fn name8_low(self) -> Option<&'static str> {
        match self {
            GpReg::Eax => Some("al"),
            GpReg::Ecx => Some("cl"),
            GpReg::Edx => Some("dl"),
            GpReg::Ebx => Some("bl"),
            _ => None,
        }
    }

    /// High 8-bit sub-register name (`%ah`, `%ch`, ...), available for the
    /// same four registers as `name8_low`.
    pub fn name8_high(self) -> Option<&'static str> {
        match self {
            GpReg::Eax => Some("ah"),
            GpReg::Ecx => Some("ch"),
            GpReg::Edx => Some("dh"),
            GpReg::Ebx => Some("bh"),
            _ => None,
        }
    }

    /// Register name at a given operand width in bytes (1/2/4), used by the
    /// `%R`-with-width-modifier format placeholder.
    pub fn name_sized(self, width: u8) -> Option<&'static str> {
        match width {
            4 => Some(self.name32()),
            2 => Some(self.name16()),
            1 => self.name8_low(),
            _ => None,
        }
    }
}

/// An XMM register (the SSE scalar float class, `Mode::register_class`
/// for `Float(w) if w <= 64`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum XmmReg {
    Xmm0 = 0,
    Xmm1 = 1,
    Xmm2 = 2,
    Xmm3 = 3,
    Xmm4 = 4,
    Xmm5 = 5,
    Xmm6 = 6,
    Xmm7 = 7,
}

impl XmmReg {
    pub fn from_encoding(n: u8) -> XmmReg {
        const ALL: [XmmReg; 8] = [XmmReg::Xmm0, XmmReg::Xmm1, XmmReg::Xmm2, XmmReg::Xmm3, XmmReg::Xmm4, XmmReg::Xmm5, XmmReg::Xmm6, XmmReg::Xmm7];
        ALL[(n & 0x7) as usize]
    }

    pub fn encoding(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> String {
        format!("xmm{}", self as u8)
    }
}

/// A virtual x87 stack slot index, `0..=7` matching `st(0)`..`st(7)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct X87Slot(pub u8);

impl X87Slot {
    /// Textual form, e.g. `st(2)`; `st(0)` is also spelled bare `st` in
    /// some mnemonic forms but this emitter always uses the parenthesized
    /// form for clarity.
    pub fn name(self) -> String {
        format!("st({})", self.0)
    }
}
