//! Chordal register allocation, GVN-PRE, and IA-32 code generation for a
//! machine-independent SSA IR. Instruction selection,
//! scheduling, spilling, and dominance/liveness computation are external
//! collaborators, consumed only through the traits in `ir::interfaces`.

pub mod backend;
pub mod common;
pub mod gvnpre;
pub mod ir;
pub mod regalloc;
