//! Condition-code selection.
//!
//! Maps the architecture-independent `CmpKind` to an IA-32
//! condition code, handles the "parity-cases" unordered-float guard (an
//! `ucomisd`/`ucomiss` feeding an equality-ish compare needs a `jp`/`jnp`
//! guard before the primary test, since the parity flag alone signals
//! "unordered"), and inversion for the Jcc-fallthrough optimization
//! and for `ins_permuted` memory-folded operands.

use crate::ir::node::CmpKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CondCode {
    Overflow,
    NotOverflow,
    Below,
    AboveEq,
    Equal,
    NotEqual,
    BelowEq,
    Above,
    Sign,
    NotSign,
    Parity,
    NotParity,
    Less,
    GreaterEq,
    LessEq,
    Greater,
}

impl CondCode {
    /// The two-letter suffix used for both `jcc` and `setcc` mnemonics.
    pub fn suffix(self) -> &'static str {
        match self {
            CondCode::Overflow => "o",
            CondCode::NotOverflow => "no",
            CondCode::Below => "b",
            CondCode::AboveEq => "ae",
            CondCode::Equal => "e",
            CondCode::NotEqual => "ne",
            CondCode::BelowEq => "be",
            CondCode::Above => "a",
            CondCode::Sign => "s",
            CondCode::NotSign => "ns",
            CondCode::Parity => "p",
            CondCode::NotParity => "np",
            CondCode::Less => "l",
            CondCode::GreaterEq => "ge",
            CondCode::LessEq => "le",
            CondCode::Greater => "g",
        }
    }

    /// Logical negation.
    pub fn invert(self) -> CondCode {
        match self {
            CondCode::Overflow => CondCode::NotOverflow,
            CondCode::NotOverflow => CondCode::Overflow,
            CondCode::Below => CondCode::AboveEq,
            CondCode::AboveEq => CondCode::Below,
            CondCode::Equal => CondCode::NotEqual,
            CondCode::NotEqual => CondCode::Equal,
            CondCode::BelowEq => CondCode::Above,
            CondCode::Above => CondCode::BelowEq,
            CondCode::Sign => CondCode::NotSign,
            CondCode::NotSign => CondCode::Sign,
            CondCode::Parity => CondCode::NotParity,
            CondCode::NotParity => CondCode::Parity,
            CondCode::Less => CondCode::GreaterEq,
            CondCode::GreaterEq => CondCode::Less,
            CondCode::LessEq => CondCode::Greater,
            CondCode::Greater => CondCode::LessEq,
        }
    }

    /// The 4-bit `tttn` condition field x86 actually encodes in `0F 8x`/
    /// `0F 9x`/`0F 4x` opcodes, in the same order `CondCode`'s variants are
    /// declared.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Inverse of `suffix`: recovers a `CondCode` from the two-letter (or
    /// one-letter) mnemonic suffix, used by `super::binenc` to decide the
    /// opcode for an already-rendered `jXX`/`setXX`/`cmovXX` instruction
    /// without re-threading the original `CmpKind` through.
    pub fn from_suffix(suffix: &str) -> Option<CondCode> {
        Some(match suffix {
            "o" => CondCode::Overflow,
            "no" => CondCode::NotOverflow,
            "b" => CondCode::Below,
            "ae" => CondCode::AboveEq,
            "e" => CondCode::Equal,
            "ne" => CondCode::NotEqual,
            "be" => CondCode::BelowEq,
            "a" => CondCode::Above,
            "s" => CondCode::Sign,
            "ns" => CondCode::NotSign,
            "p" => CondCode::Parity,
            "np" => CondCode::NotParity,
            "l" => CondCode::Less,
            "ge" => CondCode::GreaterEq,
            "le" => CondCode::LessEq,
            "g" => CondCode::Greater,
            _ => return None,
        })
    }

    pub fn for_signed(kind: CmpKind) -> CondCode {
        match kind {
            CmpKind::Eq => CondCode::Equal,
            CmpKind::Ne => CondCode::NotEqual,
            CmpKind::Lt => CondCode::Less,
            CmpKind::Le => CondCode::LessEq,
            CmpKind::Gt => CondCode::Greater,
            CmpKind::Ge => CondCode::GreaterEq,
            CmpKind::Below => CondCode::Below,
            CmpKind::BelowEq => CondCode::BelowEq,
            CmpKind::Above => CondCode::Above,
            CmpKind::AboveEq => CondCode::AboveEq,
        }
    }
}

/// How the `jp`/`jnp`/`setp`/`setnp` unordered guard relates to the primary
/// condition, for compares fed by `ucomiss`/`ucomisd`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParityGuard {
    /// No guard needed: this comparison's truth value doesn't change when
    /// the operands are unordered (e.g. `<` and `>=` already come out
    /// "false"/"true" correctly from the raw flags for NaN operands given
    /// how `ucomiss` sets them).
    None,
    /// Unordered must be treated as false: guard with `jp`/`setp` to the
    /// false outcome before testing the primary condition.
    TreatUnorderedAsFalse,
    /// Unordered must be treated as true: guard with `jp`/`setp` to the
    /// true outcome before testing the primary condition (`!=` is true for
    /// NaN operands).
    TreatUnorderedAsTrue,
}

/// A fully resolved floating-point condition: the primary code to test via
/// `ucomiss`/`ucomisd` flags, plus how (if at all) the parity flag must be
/// consulted first.
#[derive(Debug, Clone, Copy)]
pub struct FpCondCode {
    pub primary: CondCode,
    pub guard: ParityGuard,
}

/// Selects the unordered-aware condition code for a floating-point compare
///. `ucomiss`/`ucomisd` set ZF=PF=CF=1 on unordered, so every
/// primary code is chosen to read correctly off the raw flags and only
/// `==`/`!=` need an explicit parity guard (every ordered relational code
/// already evaluates to the IEEE-correct boolean for a NaN operand without
/// one, since unordered sets both CF and ZF which makes every "below"/
/// "above" flavoured test come out false on its own).
pub fn fp_cond_for(kind: CmpKind) -> FpCondCode {
    match kind {
        CmpKind::Eq => FpCondCode { primary: CondCode::Equal, guard: ParityGuard::TreatUnorderedAsFalse },
        CmpKind::Ne => FpCondCode { primary: CondCode::NotEqual, guard: ParityGuard::TreatUnorderedAsTrue },
        CmpKind::Lt | CmpKind::Below => FpCondCode { primary: CondCode::Below, guard: ParityGuard::None },
        CmpKind::Le | CmpKind::BelowEq => FpCondCode { primary: CondCode::BelowEq, guard: ParityGuard::None },
        CmpKind::Gt | CmpKind::Above => FpCondCode { primary: CondCode::Above, guard: ParityGuard::None },
        CmpKind::Ge | CmpKind::AboveEq => FpCondCode { primary: CondCode::AboveEq, guard: ParityGuard::None },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_guards_unordered_as_false() {
        let c = fp_cond_for(CmpKind::Eq);
        assert_eq!(c.primary, CondCode::Equal);
        assert_eq!(c.guard, ParityGuard::TreatUnorderedAsFalse);
    }

    #[test]
    fn inversion_is_involutive() {
        for cc in [CondCode::Equal, CondCode::Less, CondCode::Above, CondCode::Parity] {
            assert_eq!(cc.invert().invert(), cc);
        }
    }

    #[test]
    fn from_suffix_round_trips_through_suffix_for_every_code() {
        let all = [
            CondCode::Overflow,
            CondCode::NotOverflow,
            CondCode::Below,
            CondCode::AboveEq,
            CondCode::Equal,
            CondCode::NotEqual,
            CondCode::BelowEq,
            CondCode::Above,
            CondCode::Sign,
            CondCode::NotSign,
            CondCode::Parity,
            CondCode::NotParity,
            CondCode::Less,
            CondCode::GreaterEq,
            CondCode::LessEq,
            CondCode::Greater,
        ];
        for cc in all {
            assert_eq!(CondCode::from_suffix(cc.suffix()), Some(cc));
        }
    }

    #[test]
    fn code_matches_the_standard_tttn_nibble_order() {
        assert_eq!(CondCode::Equal.code(), 0x4);
        assert_eq!(CondCode::Less.code(), 0xC);
        assert_eq!(CondCode::Parity.code(), 0xA);
    }
}
