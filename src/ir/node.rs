//! Node, mode, and opcode definitions.

use std::collections::BTreeMap;

/// Stable integer index of a node. Indices are assigned once and never
/// reused within a graph; this is what border records, value numbers, and
/// interference edges key off.
pub type NodeId = u32;

/// A first-class type tag carried by every node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// A `width`-bit integer (8/16/32/64).
    Int(u8),
    /// A reference/pointer-width value.
    Ref,
    /// A `width`-bit IEEE float (32/64/80 for x87 long double).
    Float(u8),
    /// The memory token `M`: every node that reads or writes memory
    /// threads one of these through, establishing an ordering edge.
    Memory,
    /// The control token `X`.
    Control,
    /// A tuple `T`; consumers pick one component via a `Proj`.
    Tuple,
}

impl Mode {
    /// Register class this mode belongs to, or `None` for modes that are
    /// never assigned a physical register (`Memory`, `Control`, `Tuple`).
    pub fn register_class(self) -> Option<RegClassKind> {
        match self {
            Mode::Int(_) | Mode::Ref => Some(RegClassKind::GeneralPurpose),
            Mode::Float(w) if w <= 64 => Some(RegClassKind::Xmm),
            Mode::Float(_) => Some(RegClassKind::X87),
            Mode::Memory | Mode::Control | Mode::Tuple => None,
        }
    }
}

/// Which physical register class a mode maps to. Kept separate from
/// `backend::ia32`'s concrete register enums so `ir` has no dependency on
/// the emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegClassKind {
    GeneralPurpose,
    Xmm,
    X87,
}

/// Comparison kind carried by a generic `Cmp` node. The IA-32 emitter maps
/// these (plus an `unordered`/`ins_permuted` flag recorded on the node) to
/// concrete condition codes in `backend::ia32::condcode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmpKind {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// Unsigned below/above, distinct from signed Lt/Gt for integer compares.
    Below,
    BelowEq,
    Above,
    AboveEq,
}

/// Generic, architecture-independent opcodes. This is the node set GVN-PRE
/// (Component B) operates on, before instruction selection lowers it to the
/// IA-32 node set that the allocator and emitter (Components A and C)
/// consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenericOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    Not,
    Neg,
    Conv,
    Cmp(CmpKind),
    Load,
    Store,
    Call,
}

/// IA-32 machine opcodes, as they appear after instruction selection.
/// Only the opcodes needing dedicated emission rules are
/// enumerated explicitly; everything else lowers through the generic binop
/// table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ia32Op {
    /// A table-driven binop: add/sub/and/or/xor/cmp/test/adc/sbb share one
    /// dispatcher, distinguished by `Attr::Mnemonic`.
    Binop,
    /// A table-driven unop: neg/not/inc/dec.
    Unop,
    IMul,
    Jmp,
    Jcc,
    SwitchJmp,
    Setcc,
    CMovcc,
    Minus64Bit,
    CopyB,
    CopyBi,
    Load,
    Store,
    /// x87 stack operation (fadd/fsub/fmul/fdiv and pop variants).
    X87Binop,
    BeCopy,
    BePerm,
    BeIncSp,
    BeReturn,
    GetEIP,
}

/// A node's opcode. `Phi`, `Block`, and `Proj` are structural and handled
/// specially by every pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Generic(GenericOp),
    Ia32(Ia32Op),
    Phi,
    Block,
    /// Selects component `index` out of a tuple-producing predecessor.
    Proj(u32),
    Const(i64),
    Start,
    End,
}

/// Opcode-specific attributes. Kept as a small open enum rather than a
/// generic property bag: every attribute here is read by name in at least
/// one component, so a `BTreeMap<String, Attr>` would just push the
/// stringly-typed lookup one level down without buying flexibility.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Attr {
    Mnemonic(&'static str),
    /// Entity (symbolic displacement) name for an addressing mode.
    Entity(String),
    /// Integer displacement for an addressing mode.
    Offset(i32),
    /// Scale factor for an addressing mode's index register, one of 1/2/4/8.
    Scale(u8),
    CmpKind(CmpKind),
    /// Set when operand order was swapped during memory-operand folding;
    /// the condition code must be inverted to compensate.
    InsPermuted(bool),
    /// Constant byte count for `CopyB`/`CopyBi`.
    CopySize(u32),
    /// Whether this node carries an exception label.
    HasExcLabel(bool),
    /// Stack pointer delta for `IncSP`.
    SpDelta(i32),
    /// The sibling half of a register pair produced by one logical
    /// operation.
    PairedNode(NodeId),
}

/// Canonical attribute-map keys, shared by every module that reads or
/// writes node attributes, so `"mnemonic"` typo'd differently in two places
/// doesn't silently split one attribute into two.
pub mod attr_keys {
    pub const MNEMONIC: &str = "mnemonic";
    pub const ENTITY: &str = "entity";
    pub const OFFSET: &str = "offset";
    pub const SCALE: &str = "scale";
    pub const CMP_KIND: &str = "cmp_kind";
    pub const INS_PERMUTED: &str = "ins_permuted";
    pub const COPY_SIZE: &str = "copy_size";
    pub const HAS_EXC_LABEL: &str = "has_exc_label";
    pub const SP_DELTA: &str = "sp_delta";
    pub const PAIRED_NODE: &str = "paired_node";
}

/// A node in the IR graph.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub opcode: Opcode,
    pub mode: Mode,
    pub inputs: Vec<NodeId>,
    pub block: BlockRef,
    attrs: BTreeMap<&'static str, Attr>,
}

/// Blocks are themselves nodes, but most passes only need the
/// index to look up schedule/dominance/liveness info, so non-`Block` nodes
/// store a lightweight reference rather than the block's own `NodeId`
/// wrapped in ambiguity with value `NodeId`s.
pub type BlockRef = super::graph::BlockId;

impl Node {
    pub fn new(id: NodeId, opcode: Opcode, mode: Mode, block: BlockRef, inputs: Vec<NodeId>) -> Self {
        Node { id, opcode, mode, inputs, block, attrs: BTreeMap::new() }
    }

    pub fn with_attr(mut self, key: &'static str, attr: Attr) -> Self {
        self.attrs.insert(key, attr);
        self
    }

    pub fn attr(&self, key: &str) -> Option<&Attr> {
        self.attrs.get(key)
    }

    pub fn set_attr(&mut self, key: &'static str, attr: Attr) {
        self.attrs.insert(key, attr);
    }

    /// Copies another node's attribute bag onto this one, used when
    /// GVN-PRE's phi-translation
    /// constructs a structurally-identical node with substituted operands.
    pub fn copy_attrs_from(&mut self, src: &Node) {
        self.attrs = src.attrs.clone();
    }

    pub fn is_phi(&self) -> bool {
        matches!(self.opcode, Opcode::Phi)
    }

    pub fn is_block(&self) -> bool {
        matches!(self.opcode, Opcode::Block)
    }

    /// A node "produces memory" if it reads or writes through mode `M`,
    /// i.e. has a memory-moded input or output. Loads/stores/calls all
    /// qualify; this is the check used to treat memops as
    /// always distinct in value numbering.
    pub fn is_memop(&self) -> bool {
        matches!(
            self.opcode,
            Opcode::Generic(GenericOp::Load)
                | Opcode::Generic(GenericOp::Store)
                | Opcode::Generic(GenericOp::Call)
                | Opcode::Ia32(Ia32Op::Load)
                | Opcode::Ia32(Ia32Op::Store)
        )
    }

    pub fn is_load(&self) -> bool {
        matches!(self.opcode, Opcode::Generic(GenericOp::Load) | Opcode::Ia32(Ia32Op::Load))
    }

    pub fn is_divmod(&self) -> bool {
        matches!(self.opcode, Opcode::Generic(GenericOp::Div) | Opcode::Generic(GenericOp::Mod))
    }

    /// Constants and Phis are never "movable" candidates for `exp_gen`.
    pub fn is_movable_expression(&self) -> bool {
        !matches!(self.opcode, Opcode::Const(_) | Opcode::Phi | Opcode::Block | Opcode::Start | Opcode::End)
    }
}
