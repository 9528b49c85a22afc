//! The minimal SSA graph representation every component in this crate
//! operates on: nodes, modes, blocks, and the scratch "link" side table.
//!
//! Construction of this graph (parsing, instruction selection, scheduling)
//! is an external collaborator, so this module only
//! defines the shape of the graph and the traits through which the
//! out-of-scope analyses (dominance, liveness, schedule) are consumed.

pub mod node;
pub mod graph;
pub mod interfaces;
pub mod link;

pub use node::{Attr, CmpKind, GenericOp, Ia32Op, Mode, Node, NodeId, Opcode, RegClassKind};
pub use graph::{Block, BlockId, Graph};
pub use interfaces::{Dominance, Liveness, RegisterClass, Schedule};
pub use link::LinkTable;
