//! Chordal-graph register allocator.
//!
//! Colors nodes of one register class at a time by exploiting the fact that
//! the interference graph of an SSA program is chordal: a backward scan of
//! each block produces a perfect elimination order (the border list), and
//! greedy coloring by that order is guaranteed to hit the chromatic number.

pub mod border;
pub mod pressure;
pub mod assign;
pub mod interference;
pub mod chordal;

pub use border::{Border, BorderKind};
pub use chordal::{ChordalAllocator, PhysReg};
pub use interference::InterferenceGraph;
