//! Fatal error type shared by all three components.
//!
//! Every error here is unrecoverable: the passes in this crate assume their
//! preconditions hold (consistent dominance, feasible register pressure,
//! legalized opcodes) and abort on violation rather than degrade gracefully.
//! There is no diagnostic engine here and no source spans: by the time a
//! graph reaches this crate
//! it has already passed frontend diagnostics, so a failure here is a
//! compiler bug, not a user-facing error.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    /// Border-list corruption, an unassigned live-in register, or color
    /// exhaustion at a definition that should have been spilled first.
    #[error("invariant violation in {pass}: {detail}")]
    InvariantViolation { pass: &'static str, detail: String },

    /// An opcode with no registered emitter, or a mode with an unsupported size.
    #[error("unsupported construct: {0}")]
    UnsupportedConstruct(String),

    /// A condition code or immediate that cannot be encoded in the target format.
    #[error("format overflow: {0}")]
    FormatOverflow(String),

    /// Dominance or liveness information was not up to date at pass entry.
    #[error("stale analysis: {0}")]
    Consistency(String),
}

impl BackendError {
    pub fn invariant(pass: &'static str, detail: impl Into<String>) -> Self {
        BackendError::InvariantViolation { pass, detail: detail.into() }
    }
}

pub type Result<T> = std::result::Result<T, BackendError>;
