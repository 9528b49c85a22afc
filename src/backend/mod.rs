//! Code generation back ends. This crate targets exactly one architecture.

pub mod ia32;
