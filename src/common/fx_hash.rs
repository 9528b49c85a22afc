//! Fast, non-cryptographic hashing for the compiler-internal maps/sets used
//! throughout this crate (value tables, border lookups, interference sets).
//!
//! Re-exports `rustc-hash` directly under the
//! names call sites already expect, rather than hand-rolling a stand-in.

pub use rustc_hash::{FxHashMap, FxHashSet};
