//! Addressing-mode formatting and ModR/M/SIB encoding.
//!
//! An IA-32 memory operand is `segment:disp(base, index, scale)`. This
//! module extracts the pieces the emitter actually has in hand — an
//! optional entity (symbolic displacement), an integer displacement, an
//! optional base and scaled index register — and produces either the
//! textual AT&T form or the byte-minimal ModR/M (+ optional SIB, + optional
//! 0/1/4-byte displacement) encoding.

use crate::common::error::BackendError;

use super::regs::GpReg;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    One = 1,
    Two = 2,
    Four = 4,
    Eight = 8,
}

impl Scale {
    pub fn from_u8(n: u8) -> Result<Scale, BackendError> {
        match n {
            1 => Ok(Scale::One),
            2 => Ok(Scale::Two),
            4 => Ok(Scale::Four),
            8 => Ok(Scale::Eight),
            other => Err(BackendError::FormatOverflow(format!("invalid addressing-mode scale {other}"))),
        }
    }

    /// The SIB byte's 2-bit scale field: `scale == 1 << bits`.
    fn sib_bits(self) -> u8 {
        match self {
            Scale::One => 0,
            Scale::Two => 1,
            Scale::Four => 2,
            Scale::Eight => 3,
        }
    }
}

/// One IA-32 memory operand, fully resolved (no unresolved symbolic
/// displacement appears in binary mode without a relocation, but this
/// emitter treats `entity` as opaque text carried alongside any integer
/// displacement rather than attempting relocation bookkeeping itself — that
/// is the external linker's job).
#[derive(Debug, Clone, Default)]
pub struct AddressingMode {
    pub segment: Option<&'static str>,
    pub entity: Option<String>,
    pub disp: i32,
    pub base: Option<GpReg>,
    pub index: Option<(GpReg, Scale)>,
}

impl AddressingMode {
    pub fn absolute(disp: i32) -> Self {
        AddressingMode { disp, ..Default::default() }
    }

    pub fn based(base: GpReg, disp: i32) -> Self {
        AddressingMode { base: Some(base), disp, ..Default::default() }
    }

    pub fn indexed(base: Option<GpReg>, index: GpReg, scale: Scale, disp: i32) -> Self {
        AddressingMode { base, index: Some((index, scale)), disp, ..Default::default() }
    }

    /// AT&T textual form: `segment:entity+disp(base,index,scale)`, omitting
    /// any piece that isn't present. `movl $4, foo+8(%eax,%ecx,4)`-shaped.
    pub fn format_text(&self) -> String {
        let mut s = String::new();
        if let Some(seg) = self.segment {
            s.push_str(seg);
            s.push(':');
        }
        if let Some(entity) = &self.entity {
            s.push_str(entity);
            if self.disp != 0 {
                s.push_str(&format!("+{}", self.disp));
            }
        } else if self.disp != 0 || (self.base.is_none() && self.index.is_none()) {
            s.push_str(&self.disp.to_string());
        }
        if self.base.is_some() || self.index.is_some() {
            s.push('(');
            if let Some(base) = self.base {
                s.push('%');
                s.push_str(base.name32());
            }
            if let Some((index, scale)) = self.index {
                s.push_str(",%");
                s.push_str(index.name32());
                s.push_str(&format!(",{}", scale as u8));
            }
            s.push(')');
        }
        s
    }

    /// The byte-minimal ModR/M (+ optional SIB, + optional displacement)
    /// encoding for this addressing mode used as the r/m operand, given the
    /// register-field bits contributed by the other operand (an opcode
    /// extension for unary forms, or a register encoding for the `reg`
    /// field of a binary form). Picks the smallest valid encoding for every
    /// base/index/displacement combination.
    pub fn encode(&self, reg_field: u8) -> Vec<u8> {
        let reg_bits = (reg_field & 0x7) << 3;
        let mut bytes = Vec::with_capacity(6);

        match (self.base, self.index) {
            (None, None) => {
                // "No displacement, no base -> 32-bit displacement with
                // base-encoding 0x05" (mod=00, rm=101 means disp32/no-base
                // in the ModR/M grammar).
                bytes.push(0b00_000_101 | reg_bits);
                bytes.extend_from_slice(&self.disp.to_le_bytes());
            }
            (Some(base), None) if !base.is_sib_required_base() => {
                self.encode_base_only(base, reg_bits, &mut bytes);
            }
            (base, index) => {
                // Either an index is present, or the base is `esp`
                // (encoding 0x04), which always forces a SIB byte
                //.
                let (mode_bits, disp_bytes) = self.disp_mode(base);
                bytes.push(mode_bits | 0b100 | reg_bits);

                let (index_enc, scale_bits) = match index {
                    Some((idx, scale)) => (idx.encoding(), scale.sib_bits()),
                    None => (0b100, 0), // 100 in the SIB index field means "no index"
                };
                let base_enc = base.map(|b| b.encoding()).unwrap_or(0b101);
                bytes.push((scale_bits << 6) | (index_enc << 3) | base_enc);

                if base.is_none() {
                    bytes.extend_from_slice(&self.disp.to_le_bytes());
                } else {
                    bytes.extend_from_slice(&disp_bytes);
                }
            }
        }

        bytes
    }

    fn encode_base_only(&self, base: GpReg, reg_bits: u8, bytes: &mut Vec<u8>) {
        let (mode_bits, disp_bytes) = self.disp_mode(Some(base));
        bytes.push(mode_bits | reg_bits | base.encoding());
        bytes.extend_from_slice(&disp_bytes);
    }

    /// Returns the ModR/M `mod` field bits and the displacement bytes to
    /// follow, given whether a base is present (no base always means a
    /// 32-bit displacement in this emitter's calling conventions, handled
    /// by the caller directly).
    ///
    /// "Base 0x05 (ebp) with no displacement forces an 8-bit zero
    /// displacement" applies here unconditionally, whether the base is
    /// reached through the base-only ModR/M form or through SIB: mod=00
    /// with rm/SIB-base=101 always means "no base, disp32 follows" in the
    /// IA-32 grammar, so `ebp` (which also encodes to 101) needs an
    /// explicit (zero) disp8 to be distinguished from that case.
    fn disp_mode(&self, base: Option<GpReg>) -> (u8, Vec<u8>) {
        if base.is_none() {
            return (0b00_000_000, self.disp.to_le_bytes().to_vec());
        }
        let base = base.unwrap();
        if base.is_disp_required_base() && self.disp == 0 {
            return (0b01_000_000, vec![0]);
        }
        if self.disp == 0 {
            (0b00_000_000, Vec::new())
        } else if (-128..=127).contains(&self.disp) {
            // "Displacement in [-128, 127] with a base -> 8-bit displacement."
            (0b01_000_000, vec![self.disp as i8 as u8])
        } else {
            (0b10_000_000, self.disp.to_le_bytes().to_vec())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_base_uses_32_bit_displacement_with_rm_101() {
        let am = AddressingMode::absolute(0x1000);
        let bytes = am.encode(0);
        assert_eq!(bytes[0] & 0b11_000_111, 0b00_000_101);
        assert_eq!(bytes.len(), 5);
    }

    #[test]
    fn small_displacement_with_base_uses_8_bit_form() {
        let am = AddressingMode::based(GpReg::Eax, 12);
        let bytes = am.encode(0);
        assert_eq!(bytes.len(), 2, "mod01 + disp8, no SIB needed for eax base");
        assert_eq!(bytes[0] >> 6, 0b01);
    }

    #[test]
    fn large_displacement_with_base_uses_32_bit_form() {
        let am = AddressingMode::based(GpReg::Eax, 0x10000);
        let bytes = am.encode(0);
        assert_eq!(bytes[0] >> 6, 0b10);
        assert_eq!(bytes.len(), 6);
    }

    #[test]
    fn esp_base_forces_sib_byte() {
        let am = AddressingMode::based(GpReg::Esp, 4);
        let bytes = am.encode(0);
        assert_eq!(bytes[0] & 0b111, 0b100, "rm field must be 100 to signal SIB follows");
        assert_eq!(bytes.len(), 3, "modrm + sib + disp8");
    }

    #[test]
    fn ebp_base_with_zero_disp_forces_explicit_zero_displacement() {
        let am = AddressingMode::based(GpReg::Ebp, 0);
        let bytes = am.encode(0);
        assert_eq!(bytes[0] >> 6, 0b01, "ebp/no-disp must use mod01, not mod00 (which means disp32/no-base)");
        assert_eq!(bytes[1], 0);
    }

    #[test]
    fn ebp_base_with_index_and_zero_disp_forces_explicit_zero_displacement() {
        // base=ebp (encoding 0x05) forces SIB once an index is present; the
        // "ebp with no displacement" special case must still apply inside
        // the SIB form, or mod=00/SIB-base=101 would be misread as "no base,
        // disp32 follows" instead of "ebp, no displacement".
        let am = AddressingMode::indexed(Some(GpReg::Ebp), GpReg::Ecx, Scale::Four, 0);
        let bytes = am.encode(0);
        assert_eq!(bytes.len(), 3, "modrm + sib + disp8");
        assert_eq!(bytes[0] >> 6, 0b01, "must use mod01, not mod00 (no-base/disp32)");
        let sib = bytes[1];
        assert_eq!(sib & 0x7, GpReg::Ebp.encoding(), "sib base field names ebp, not \"no base\"");
        assert_eq!(bytes[2], 0, "explicit zero displacement byte");
    }

    #[test]
    fn indexed_addressing_emits_sib_with_scale() {
        let am = AddressingMode::indexed(Some(GpReg::Eax), GpReg::Ecx, Scale::Four, 0);
        let bytes = am.encode(0);
        assert_eq!(bytes.len(), 2);
        let sib = bytes[1];
        assert_eq!(sib >> 6, 0b10, "scale=4 -> sib bits 10");
        assert_eq!((sib >> 3) & 0x7, GpReg::Ecx.encoding());
        assert_eq!(sib & 0x7, GpReg::Eax.encoding());
    }
}
