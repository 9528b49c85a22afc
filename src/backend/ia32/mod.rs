//! IA-32 emitter: lowers a scheduled,
//! register-assigned graph of IA-32 nodes to GNU-assembler text or, in
//! binary mode, to a stream of `.byte`/`.word`/`.long` directives holding
//! the same bytes a real assembler would produce.
//!
//! One function at a time: a per-block walk dispatching each node through
//! a table of per-opcode emitters.

pub mod addressing;
pub mod binenc;
pub mod condcode;
pub mod exctable;
pub mod jumptable;
pub mod labelplan;
pub mod opforms;
pub mod operand;
pub mod regs;
pub mod state;

use log::{debug, trace};

use crate::common::error::BackendError;
use crate::common::fx_hash::FxHashSet;
use crate::ir::graph::BlockId;
use crate::ir::node::{attr_keys, Attr, CmpKind, Ia32Op, Opcode, RegClassKind};
use crate::ir::{Graph, NodeId, Schedule};

use condcode::{fp_cond_for, CondCode, ParityGuard};
use exctable::{ExcEntry, ExcTable};
use jumptable::{switch_jump_instr, SwitchCase};
use operand::{AsmOperand, Instr, Width};
use regs::{GpReg, X87Slot, XmmReg};
use state::{DwarfSink, FrameBase, Ia32EmitterState};

/// Maps a node carrying a register-class-bearing mode to the concrete
/// physical register the allocator assigned it. The
/// allocator only ever produces an abstract `PhysReg` color index per
/// class; this trait is the seam a caller crosses to resolve those colors
/// into names this module's operand types understand.
pub trait RegisterMap {
    fn gp(&self, node: NodeId) -> Result<GpReg, BackendError>;
    fn xmm(&self, node: NodeId) -> Result<XmmReg, BackendError>;
    fn x87(&self, node: NodeId) -> Result<X87Slot, BackendError>;
}

fn mnemonic_attr(node: &crate::ir::Node) -> Result<&'static str, BackendError> {
    match node.attr(attr_keys::MNEMONIC) {
        Some(Attr::Mnemonic(m)) => Ok(*m),
        _ => Err(BackendError::invariant("ia32_emit", "node missing required mnemonic attribute")),
    }
}

fn cmp_kind_attr(node: &crate::ir::Node) -> Result<CmpKind, BackendError> {
    match node.attr(attr_keys::CMP_KIND) {
        Some(Attr::CmpKind(k)) => Ok(*k),
        _ => Err(BackendError::invariant("ia32_emit", "compare node missing cmp_kind attribute")),
    }
}

fn ins_permuted(node: &crate::ir::Node) -> bool {
    matches!(node.attr(attr_keys::INS_PERMUTED), Some(Attr::InsPermuted(true)))
}

fn copy_size(node: &crate::ir::Node) -> Result<u32, BackendError> {
    match node.attr(attr_keys::COPY_SIZE) {
        Some(Attr::CopySize(n)) => Ok(*n),
        _ => Err(BackendError::invariant("ia32_emit", "CopyB node missing copy_size attribute")),
    }
}

fn has_exc_label(node: &crate::ir::Node) -> bool {
    matches!(node.attr(attr_keys::HAS_EXC_LABEL), Some(Attr::HasExcLabel(true)))
}

fn sp_delta(node: &crate::ir::Node) -> i32 {
    match node.attr(attr_keys::SP_DELTA) {
        Some(Attr::SpDelta(d)) => *d,
        _ => 0,
    }
}

/// Resolves the condition code a `Jcc`/`Setcc`/`CMovcc` node tests, folding
/// in `ins_permuted` inversion and, for a floating-point
/// source, the unordered-aware code plus its parity guard.
fn resolve_condition(node: &crate::ir::Node, is_float: bool) -> Result<(CondCode, ParityGuard), BackendError> {
    let kind = cmp_kind_attr(node)?;
    let (mut cc, guard) = if is_float {
        let fp = fp_cond_for(kind);
        (fp.primary, fp.guard)
    } else {
        (CondCode::for_signed(kind), ParityGuard::None)
    };
    if ins_permuted(node) {
        cc = cc.invert();
    }
    Ok((cc, guard))
}

/// One function/routine's emission run: per-routine mutable state threaded
/// through every node, plus the exception and
/// jump-table entries accumulated along the way and rendered after the
/// body.
pub struct RoutineEmitter<'g, 'r, 'd> {
    graph: &'g Graph,
    regs: &'r dyn RegisterMap,
    state: Ia32EmitterState<'d>,
    exc_table: ExcTable,
    jump_tables: Vec<(String, Vec<SwitchCase>)>,
    text: String,
    /// When set, `push` renders each `Instr` through `binenc::encode_instr`
    /// instead of AT&T text. An instruction
    /// `binenc` doesn't recognize still gets a line (a `#`-commented
    /// textual fallback), so every node produces *something* in either
    /// mode; only `binary = true` claims byte-accurate encoding for the
    /// lines `binenc` actually matched.
    binary: bool,
}

impl<'g, 'r, 'd> RoutineEmitter<'g, 'r, 'd> {
    pub fn new(graph: &'g Graph, regs: &'r dyn RegisterMap, frame_base: FrameBase, frame_type_size: i32, dwarf: &'d mut dyn DwarfSink) -> Self {
        Self::with_mode(graph, regs, frame_base, frame_type_size, dwarf, false)
    }

    fn with_mode(graph: &'g Graph, regs: &'r dyn RegisterMap, frame_base: FrameBase, frame_type_size: i32, dwarf: &'d mut dyn DwarfSink, binary: bool) -> Self {
        RoutineEmitter {
            graph,
            regs,
            state: Ia32EmitterState::new(frame_base, frame_type_size, dwarf),
            exc_table: ExcTable::new(),
            jump_tables: Vec::new(),
            text: String::new(),
            binary,
        }
    }

    fn block_label(&self, block: BlockId) -> String {
        match &self.graph.block(block).label {
            Some(label) => label.clone(),
            None => format!(".LBB{}", block.0),
        }
    }

    fn push(&mut self, instr: Instr) {
        if self.binary {
            match binenc::encode_instr(&instr) {
                Some(form) => {
                    self.text.push_str(&binenc::render_binary_line(&form, &instr));
                    self.text.push('\n');
                }
                None => {
                    self.text.push_str("\t# ");
                    self.text.push_str(instr.render_text().trim_start());
                    self.text.push('\n');
                }
            }
            return;
        }
        self.text.push_str(&instr.render_text());
        self.text.push('\n');
    }

    fn push_line(&mut self, line: impl AsRef<str>) {
        self.text.push_str(line.as_ref());
        self.text.push('\n');
    }

    /// Identifies every block whose schedule ends in a `SwitchJmp`: per the
    /// fall-through rule, none of its
    /// outgoing edges is ever a fall-through, even onto the layout-adjacent
    /// block.
    fn switch_source_blocks(&self, schedule: &impl Schedule) -> FxHashSet<BlockId> {
        let mut sources = FxHashSet::default();
        for block in schedule.block_order() {
            if schedule.schedule_of(block).iter().any(|&n| matches!(self.graph.node(n).opcode, Opcode::Ia32(Ia32Op::SwitchJmp))) {
                sources.insert(block);
            }
        }
        sources
    }

    /// Emits the whole routine: labels, per-node instructions in schedule
    /// order, then the accumulated jump tables and the sorted exception
    /// table.
    pub fn emit_routine(mut self, schedule: &impl Schedule, exception_targets: &FxHashSet<BlockId>) -> Result<String, BackendError> {
        let order = schedule.block_order();
        let switch_sources = self.switch_source_blocks(schedule);
        let required_labels = labelplan::label_required_blocks(self.graph, schedule, &switch_sources, exception_targets);

        for (i, &block) in order.iter().enumerate() {
            if required_labels.contains(&block) {
                self.push_line(format!("{}:", self.block_label(block)));
            }
            let layout_successor = order.get(i + 1).copied();
            let is_switch = switch_sources.contains(&block);
            for &node_id in schedule.schedule_of(block) {
                self.emit_node(node_id, layout_successor, is_switch)?;
            }
        }

        for (label, cases) in std::mem::take(&mut self.jump_tables) {
            self.push_line(format!("{label}:"));
            let rendered = jumptable::render_table(&cases, |b| self.block_label(b));
            self.text.push_str(&rendered);
        }

        if !self.exc_table.is_empty() {
            let rendered = self.exc_table.render_text(|id| format!(".Lexc{id}"), |b| self.block_label(b));
            self.text.push_str(&rendered);
        }

        Ok(self.text)
    }

    fn emit_node(&mut self, node_id: NodeId, layout_successor: Option<BlockId>, is_switch_source: bool) -> Result<(), BackendError> {
        let node = self.graph.node(node_id).clone();
        if has_exc_label(&node) {
            let label_id = self.state.next_exc_label();
            self.exc_table.push(ExcEntry { label_id, instr: node_id, handler: node.block });
            trace!("node {node_id} carries exception label {label_id}");
        }

        match node.opcode {
            Opcode::Ia32(Ia32Op::Binop) => self.emit_binop(&node)?,
            Opcode::Ia32(Ia32Op::Unop) => self.emit_unop(&node)?,
            Opcode::Ia32(Ia32Op::IMul) => self.emit_imul(&node)?,
            Opcode::Ia32(Ia32Op::Jmp) => self.emit_jmp(&node, layout_successor, is_switch_source)?,
            Opcode::Ia32(Ia32Op::Jcc) => self.emit_jcc(&node, layout_successor, is_switch_source)?,
            Opcode::Ia32(Ia32Op::SwitchJmp) => self.emit_switch_jmp(&node)?,
            Opcode::Ia32(Ia32Op::Setcc) => self.emit_setcc(&node)?,
            Opcode::Ia32(Ia32Op::CMovcc) => self.emit_cmovcc(&node)?,
            Opcode::Ia32(Ia32Op::Minus64Bit) => self.emit_minus64bit(&node)?,
            Opcode::Ia32(Ia32Op::CopyB) => {
                let size = copy_size(&node)?;
                for instr in opforms::copyb(size) {
                    self.push(instr);
                }
            }
            Opcode::Ia32(Ia32Op::CopyBi) => {
                let size = copy_size(&node)?;
                for instr in opforms::copyb_i(size) {
                    self.push(instr);
                }
            }
            Opcode::Ia32(Ia32Op::BePerm) => self.emit_be_perm(&node)?,
            Opcode::Ia32(Ia32Op::BeCopy) => self.emit_be_copy(&node)?,
            Opcode::Ia32(Ia32Op::BeIncSp) => self.emit_be_incsp(&node)?,
            Opcode::Ia32(Ia32Op::BeReturn) => self.push(Instr::nullary("ret")),
            Opcode::Ia32(Ia32Op::GetEIP) => self.emit_get_eip(&node)?,
            Opcode::Ia32(Ia32Op::X87Binop) => self.emit_x87_binop(&node)?,
            Opcode::Ia32(Ia32Op::Load) | Opcode::Ia32(Ia32Op::Store) => {
                // Typed load/store lowering (addressing-mode construction
                // plus a `mov` family mnemonic) is the instruction
                // selector's job upstream of this emitter; by the time a
                // node reaches here it already carries a `Binop`-shaped
                // `mov` via `Attr::Mnemonic`, handled above.
                return Err(BackendError::UnsupportedConstruct("bare Ia32 Load/Store reached the emitter unlowered".into()));
            }
            Opcode::Phi | Opcode::Block | Opcode::Proj(_) | Opcode::Start | Opcode::End | Opcode::Const(_) | Opcode::Generic(_) => {
                // Structural or not-yet-lowered nodes never reach the
                // per-opcode dispatcher.
            }
        }
        Ok(())
    }

    fn emit_binop(&mut self, node: &crate::ir::Node) -> Result<(), BackendError> {
        let family = opforms::lookup_binop_family(mnemonic_attr(node)?)?;
        let dst = self.regs.gp(node.id)?;
        let src = self.regs.gp(node.inputs[1])?;
        self.push(opforms::binop_reg_reg(family, Width::Long, src, dst));
        Ok(())
    }

    fn emit_unop(&mut self, node: &crate::ir::Node) -> Result<(), BackendError> {
        let mnemonic = mnemonic_attr(node)?;
        let dst = self.regs.gp(node.id)?;
        self.push(Instr::new(format!("{mnemonic}l"), vec![AsmOperand::Reg(dst, Width::Long)]));
        Ok(())
    }

    fn emit_imul(&mut self, node: &crate::ir::Node) -> Result<(), BackendError> {
        let dst = self.regs.gp(node.id)?;
        let src = self.regs.gp(node.inputs[0])?;
        let imm = match node.attr(attr_keys::OFFSET) {
            Some(Attr::Offset(v)) => Some(*v as i64),
            _ => None,
        };
        self.push(opforms::imul(dst, src, imm));
        Ok(())
    }

    /// `Jmp`: a direct jump elided entirely when its
    /// target is the schedule-successor.
    fn emit_jmp(&mut self, node: &crate::ir::Node, layout_successor: Option<BlockId>, is_switch_source: bool) -> Result<(), BackendError> {
        let target = *self.graph.block(node.block).succs.first().ok_or_else(|| BackendError::invariant("ia32_emit", "Jmp block has no successor"))?;
        if labelplan::is_fallthrough_edge(layout_successor, target, is_switch_source) {
            return Ok(());
        }
        self.push(Instr::new("jmp", vec![AsmOperand::Label(self.block_label(target))]));
        Ok(())
    }

    /// `Jcc`:
    /// when the "true" successor is the fall-through, the branch is negated
    /// so only one jump (to the "false" target) is ever emitted; an
    /// unordered-float guard, if any, is emitted before the primary branch,
    /// routed straight to the false target unless that target is itself a
    /// fall-through (in which case a local skip label is needed instead).
    fn emit_jcc(&mut self, node: &crate::ir::Node, layout_successor: Option<BlockId>, is_switch_source: bool) -> Result<(), BackendError> {
        let succs = &self.graph.block(node.block).succs;
        if succs.len() != 2 {
            return Err(BackendError::invariant("ia32_emit", "Jcc block must have exactly two successors"));
        }
        let (mut true_target, mut false_target) = (succs[0], succs[1]);
        let is_float = matches!(node.mode, crate::ir::Mode::Float(_));
        let (mut cc, guard) = resolve_condition(node, is_float)?;

        if labelplan::is_fallthrough_edge(layout_successor, true_target, is_switch_source) {
            std::mem::swap(&mut true_target, &mut false_target);
            cc = cc.invert();
        }

        let false_is_fallthrough = labelplan::is_fallthrough_edge(layout_successor, false_target, is_switch_source);

        match guard {
            ParityGuard::TreatUnorderedAsTrue => {
                self.push(Instr::new("jp", vec![AsmOperand::Label(self.block_label(true_target))]));
            }
            ParityGuard::TreatUnorderedAsFalse => {
                if false_is_fallthrough {
                    let skip = self.state.fresh_local_label("parity");
                    self.push(Instr::new("jp", vec![AsmOperand::Label(skip.clone())]));
                    self.push(Instr::new(format!("j{}", cc.suffix()), vec![AsmOperand::Label(self.block_label(true_target))]));
                    self.push_line(format!("{skip}:"));
                    return Ok(());
                } else {
                    self.push(Instr::new("jp", vec![AsmOperand::Label(self.block_label(false_target))]));
                }
            }
            ParityGuard::None => {}
        }

        self.push(Instr::new(format!("j{}", cc.suffix()), vec![AsmOperand::Label(self.block_label(true_target))]));

        if !false_is_fallthrough {
            self.push(Instr::new("jmp", vec![AsmOperand::Label(self.block_label(false_target))]));
        }
        Ok(())
    }

    fn emit_setcc(&mut self, node: &crate::ir::Node) -> Result<(), BackendError> {
        let is_float = matches!(node.mode, crate::ir::Mode::Float(_));
        let (cc, guard) = resolve_condition(node, is_float)?;
        let dst = self.regs.gp(node.id)?;
        match guard {
            ParityGuard::None => {
                self.push(Instr::new(format!("set{}", cc.suffix()), vec![AsmOperand::Reg(dst, Width::Byte)]));
            }
            ParityGuard::TreatUnorderedAsTrue | ParityGuard::TreatUnorderedAsFalse => {
                let combine = if guard == ParityGuard::TreatUnorderedAsTrue { "or" } else { "and" };
                let parity_set = if guard == ParityGuard::TreatUnorderedAsTrue { "setp" } else { "setnp" };
                self.push(Instr::new(format!("set{}", cc.suffix()), vec![AsmOperand::Reg(dst, Width::Byte)]));
                self.push(Instr::new(parity_set, vec![AsmOperand::RegHigh(dst)]));
                self.push(Instr::new(format!("{combine}b"), vec![AsmOperand::RegHigh(dst), AsmOperand::Reg(dst, Width::Byte)]));
            }
        }
        Ok(())
    }

    fn emit_cmovcc(&mut self, node: &crate::ir::Node) -> Result<(), BackendError> {
        let (cc, guard) = resolve_condition(node, false)?;
        if guard != ParityGuard::None {
            return Err(BackendError::UnsupportedConstruct("CMovcc with a floating-point parity guard is not supported".into()));
        }
        let dst = self.regs.gp(node.id)?;
        let true_input = self.regs.gp(node.inputs[0])?;
        let false_input = self.regs.gp(node.inputs[1])?;
        self.push(opforms::cmovcc(cc, dst, true_input, false_input));
        Ok(())
    }

    /// `node` stands for the low output word; its high word's node id is
    /// carried in `Attr::PairedNode` since one `NodeId` names only one
    /// physical register.
    fn emit_minus64bit(&mut self, node: &crate::ir::Node) -> Result<(), BackendError> {
        let out_hi_id = match node.attr(attr_keys::PAIRED_NODE) {
            Some(Attr::PairedNode(id)) => *id,
            _ => return Err(BackendError::invariant("ia32_emit", "Minus64Bit missing paired high-word node")),
        };
        let in_lo = self.regs.gp(node.inputs[0])?;
        let in_hi = self.regs.gp(node.inputs[1])?;
        let out_lo = self.regs.gp(node.id)?;
        let out_hi = self.regs.gp(out_hi_id)?;
        for instr in opforms::minus64bit(in_lo, in_hi, out_lo, out_hi) {
            self.push(instr);
        }
        Ok(())
    }

    fn emit_be_perm(&mut self, node: &crate::ir::Node) -> Result<(), BackendError> {
        let class = node.mode.register_class().ok_or_else(|| BackendError::invariant("ia32_emit", "be_Perm node has no register class"))?;
        let a = node.id;
        let b = node.inputs[0];
        match class {
            RegClassKind::GeneralPurpose => self.push(opforms::be_perm_gp(self.regs.gp(a)?, self.regs.gp(b)?)),
            RegClassKind::Xmm => {
                for instr in opforms::be_perm_xmm(self.regs.xmm(a)?, self.regs.xmm(b)?) {
                    self.push(instr);
                }
            }
            RegClassKind::X87 => {}
        }
        Ok(())
    }

    fn emit_be_copy(&mut self, node: &crate::ir::Node) -> Result<(), BackendError> {
        let class = node.mode.register_class().ok_or_else(|| BackendError::invariant("ia32_emit", "be_Copy node has no register class"))?;
        if class != RegClassKind::GeneralPurpose {
            return Ok(()); // xmm/x87 copies between identical slots are nops at this abstraction level
        }
        let dst = self.regs.gp(node.id)?;
        let src = self.regs.gp(node.inputs[0])?;
        if dst != src {
            self.push(Instr::new("movl", vec![AsmOperand::Reg(src, Width::Long), AsmOperand::Reg(dst, Width::Long)]));
        }
        Ok(())
    }

    fn emit_be_incsp(&mut self, node: &crate::ir::Node) -> Result<(), BackendError> {
        let delta = sp_delta(node);
        let dst = self.regs.gp(node.id)?;
        if delta == 0 {
            return Ok(());
        }
        if delta > 0 {
            self.push(Instr::new("subl", vec![AsmOperand::Imm(delta as i64), AsmOperand::Reg(dst, Width::Long)]));
        } else {
            self.push(Instr::new("addl", vec![AsmOperand::Imm(-delta as i64), AsmOperand::Reg(dst, Width::Long)]));
        }
        self.state.apply_sp_delta(delta);
        Ok(())
    }

    fn emit_get_eip(&mut self, node: &crate::ir::Node) -> Result<(), BackendError> {
        let label = self.state.pic_base_label.clone().unwrap_or_else(|| "PIC_BASE".to_string());
        self.push(Instr::new("call", vec![AsmOperand::Label(label.clone())]));
        self.push_line(format!("{label}:"));
        let dst = self.regs.gp(node.id)?;
        self.push(Instr::new("popl", vec![AsmOperand::Reg(dst, Width::Long)]));
        Ok(())
    }

    fn emit_x87_binop(&mut self, node: &crate::ir::Node) -> Result<(), BackendError> {
        let mnemonic = mnemonic_attr(node)?;
        let (fwd, rev) = match mnemonic {
            "fadd" => ("fadd", "fadd"),
            "fmul" => ("fmul", "fmul"),
            "fsub" => ("fsub", "fsubr"),
            "fdiv" => ("fdiv", "fdivr"),
            other => return Err(BackendError::UnsupportedConstruct(format!("unknown x87 binop mnemonic '{other}'"))),
        };
        let out = self.regs.x87(node.id)?;
        let other = self.regs.x87(node.inputs[1])?;
        let st0_is_first = self.regs.x87(node.inputs[0])? == X87Slot(0);
        let pop = ins_permuted(node); // reused slot: "pop" variant selection, not a real permutation here
        self.push(opforms::x87_binop(fwd, rev, st0_is_first, other, out, pop));
        Ok(())
    }

    /// `SwitchJmp`: an indirect jump
    /// through a 4-byte-entry table. In binary mode this bypasses
    /// `binenc::encode_instr` entirely, since the instruction's addressing
    /// mode references a jump-table label `binenc`'s mnemonic-driven
    /// matching never sees; the fixed opcode/ModR/M/SIB prefix is
    /// byte-accurate, with the table's address itself
    /// left as a symbolic `.long` relocation like every other jump target
    /// in this emitter.
    fn emit_switch_jmp(&mut self, node: &crate::ir::Node) -> Result<(), BackendError> {
        let table_label = self.state.fresh_local_label("jumptable");
        let index = self.regs.gp(node.inputs[0])?;
        if self.binary {
            let prefix = jumptable::switch_jump_binary_prefix(index);
            self.push_line(format!(
                "\t.byte {}\n\t.long {table_label}\t# jmp *{table_label}(,%{},4)",
                prefix.iter().map(|b| format!("0x{b:02x}")).collect::<Vec<_>>().join(", "),
                index.name32()
            ));
        } else {
            self.push(switch_jump_instr(&table_label, index));
        }

        let cases: Vec<SwitchCase> =
            self.graph.block(node.block).succs.iter().enumerate().map(|(slot, &target)| SwitchCase { slot: slot as u32, target }).collect();
        self.jump_tables.push((table_label, cases));
        Ok(())
    }
}

/// Emits one routine as GNU-assembler text.
pub fn gen_routine(
    graph: &Graph,
    schedule: &impl Schedule,
    regs: &dyn RegisterMap,
    frame_base: FrameBase,
    frame_type_size: i32,
    dwarf: &mut dyn DwarfSink,
    exception_targets: &FxHashSet<BlockId>,
) -> Result<String, BackendError> {
    debug!("emitting routine: {} nodes, {} scheduled blocks", graph.len(), schedule.block_order().len());
    RoutineEmitter::new(graph, regs, frame_base, frame_type_size, dwarf).emit_routine(schedule, exception_targets)
}

/// Emits one routine as `.byte`/`.long` directives standing in for raw
/// machine bytes. Every instruction `binenc`
/// recognizes gets its real byte-minimal encoding; `SwitchJmp` is handled
/// directly for the same reason. PC-relative
/// targets whose final displacement depends on routine layout (direct
/// jumps, calls, and the switch table's own address) are emitted as a
/// fixed opcode prefix plus a symbolic `.long target - . - 4` expression,
/// mirroring the textual convention for the same case.
/// Anything left over (x87 stack opcodes, the FP `setcc` parity-combine
/// step) falls back to a `#`-commented textual line, which is sound as an
/// intermediate representation but not a claim of byte-accurate native encoding for those few
/// forms.
pub fn gen_binary_routine(
    graph: &Graph,
    schedule: &impl Schedule,
    regs: &dyn RegisterMap,
    frame_base: FrameBase,
    frame_type_size: i32,
    dwarf: &mut dyn DwarfSink,
    exception_targets: &FxHashSet<BlockId>,
) -> Result<String, BackendError> {
    debug!("emitting binary routine: {} nodes, {} scheduled blocks", graph.len(), schedule.block_order().len());
    RoutineEmitter::with_mode(graph, regs, frame_base, frame_type_size, dwarf, true).emit_routine(schedule, exception_targets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::fx_hash::FxHashMap;
    use crate::ir::node::{Mode, Node};
    use state::NullDwarfSink;

    struct MapAll(GpReg);
    impl RegisterMap for MapAll {
        fn gp(&self, _node: NodeId) -> Result<GpReg, BackendError> {
            Ok(self.0)
        }
        fn xmm(&self, _node: NodeId) -> Result<XmmReg, BackendError> {
            Ok(XmmReg::Xmm0)
        }
        fn x87(&self, _node: NodeId) -> Result<X87Slot, BackendError> {
            Ok(X87Slot(0))
        }
    }

    struct ByNodeMap(FxHashMap<NodeId, GpReg>);
    impl RegisterMap for ByNodeMap {
        fn gp(&self, node: NodeId) -> Result<GpReg, BackendError> {
            self.0.get(&node).copied().ok_or_else(|| BackendError::invariant("test", "missing mapping"))
        }
        fn xmm(&self, _node: NodeId) -> Result<XmmReg, BackendError> {
            Ok(XmmReg::Xmm0)
        }
        fn x87(&self, _node: NodeId) -> Result<X87Slot, BackendError> {
            Ok(X87Slot(0))
        }
    }

    struct LinearSchedule {
        order: Vec<BlockId>,
        per_block: FxHashMap<BlockId, Vec<NodeId>>,
    }
    impl Schedule for LinearSchedule {
        fn block_order(&self) -> Vec<BlockId> {
            self.order.clone()
        }
        fn schedule_of(&self, block: BlockId) -> &[NodeId] {
            self.per_block.get(&block).map(|v| v.as_slice()).unwrap_or(&[])
        }
    }

    /// `Jcc` with condition `<` scheduled as
    /// `[B0, Btrue, Bfalse]` must negate to `jge` and fall through to
    /// `Btrue` with no explicit jump, emitting only `Bfalse`'s label.
    #[test]
    fn jcc_fallthrough_scenario_emits_negated_branch_with_no_extra_jump() {
        let mut g = Graph::new();
        let b0 = g.add_block();
        let btrue = g.add_block();
        let bfalse = g.add_block();
        g.connect(b0, btrue);
        g.connect(b0, bfalse);

        let jcc = Node::new(0, Opcode::Ia32(Ia32Op::Jcc), Mode::Int(32), b0, vec![])
            .with_attr(attr_keys::CMP_KIND, Attr::CmpKind(CmpKind::Lt));
        g.push(jcc);

        let schedule = LinearSchedule { order: vec![b0, btrue, bfalse], per_block: FxHashMap::from_iter([(b0, vec![0])]) };

        let mut dwarf = NullDwarfSink;
        let regs = MapAll(GpReg::Eax);
        let text = gen_routine(&g, &schedule, &regs, FrameBase::FramePointer, 0, &mut dwarf, &FxHashSet::default()).unwrap();

        assert!(text.contains("jge"), "condition must be negated since true-side falls through:\n{text}");
        assert!(!text.contains("\tjmp"), "false side is the layout successor, needs no jump:\n{text}");
    }

    /// `ucomisd` feeding `Jcc ==` must guard with
    /// `jp` to the false target before the primary `je`.
    #[test]
    fn fp_equality_jcc_emits_parity_guard_before_primary_branch() {
        let mut g = Graph::new();
        let b0 = g.add_block();
        let btrue = g.add_block();
        let bfalse = g.add_block();
        g.connect(b0, btrue);
        g.connect(b0, bfalse);

        let jcc = Node::new(0, Opcode::Ia32(Ia32Op::Jcc), Mode::Float(64), b0, vec![])
            .with_attr(attr_keys::CMP_KIND, Attr::CmpKind(CmpKind::Eq));
        g.push(jcc);

        // order forces neither successor to be a fallthrough of b0, isolating the guard logic
        let schedule = LinearSchedule { order: vec![b0, btrue, bfalse], per_block: FxHashMap::from_iter([(b0, vec![0])]) };
        let mut dwarf = NullDwarfSink;
        let regs = MapAll(GpReg::Eax);
        let text = gen_routine(&g, &schedule, &regs, FrameBase::FramePointer, 0, &mut dwarf, &FxHashSet::default()).unwrap();

        let jp_pos = text.find("jp").expect("parity guard present");
        let je_pos = text.find("je").expect("primary branch present");
        assert!(jp_pos < je_pos, "parity guard must precede the primary branch:\n{text}");
    }

    #[test]
    fn switch_jmp_emits_indirect_jump_and_one_table_entry_per_case() {
        let mut g = Graph::new();
        let b0 = g.add_block();
        let case0 = g.add_block();
        let case1 = g.add_block();
        let default = g.add_block();
        g.connect(b0, case0);
        g.connect(b0, case1);
        g.connect(b0, default);

        let idx = Node::new(0, Opcode::Const(0), Mode::Int(32), b0, vec![]);
        g.push(idx);
        let switch = Node::new(1, Opcode::Ia32(Ia32Op::SwitchJmp), Mode::Control, b0, vec![0]);
        g.push(switch);

        let schedule = LinearSchedule { order: vec![b0, case0, case1, default], per_block: FxHashMap::from_iter([(b0, vec![0, 1])]) };
        let mut dwarf = NullDwarfSink;
        let regs = MapAll(GpReg::Eax);
        let text = gen_routine(&g, &schedule, &regs, FrameBase::FramePointer, 0, &mut dwarf, &FxHashSet::default()).unwrap();

        assert!(text.contains("jmp *"), "indirect jump through the table:\n{text}");
        assert_eq!(text.matches(".long").count(), 3, "one table entry per successor:\n{text}");
    }

    #[test]
    fn binop_dispatches_through_the_family_table() {
        let mut g = Graph::new();
        let b0 = g.add_block();
        let lhs = Node::new(0, Opcode::Const(1), Mode::Int(32), b0, vec![]);
        g.push(lhs);
        let rhs = Node::new(1, Opcode::Const(2), Mode::Int(32), b0, vec![]);
        g.push(rhs);
        let add = Node::new(2, Opcode::Ia32(Ia32Op::Binop), Mode::Int(32), b0, vec![0, 1])
            .with_attr(attr_keys::MNEMONIC, Attr::Mnemonic("add"));
        g.push(add);

        let schedule = LinearSchedule { order: vec![b0], per_block: FxHashMap::from_iter([(b0, vec![2])]) };
        let mut dwarf = NullDwarfSink;
        let regs = ByNodeMap(FxHashMap::from_iter([(0, GpReg::Eax), (1, GpReg::Ecx), (2, GpReg::Eax)]));
        let text = gen_routine(&g, &schedule, &regs, FrameBase::FramePointer, 0, &mut dwarf, &FxHashSet::default()).unwrap();

        assert!(text.contains("addl"));
    }

    /// Binary mode's binop reg/reg form must be the real opcode byte and
    /// ModR/M, not a commented-out textual line.
    #[test]
    fn binary_routine_encodes_binop_reg_reg_as_real_bytes() {
        let mut g = Graph::new();
        let b0 = g.add_block();
        let lhs = Node::new(0, Opcode::Const(1), Mode::Int(32), b0, vec![]);
        g.push(lhs);
        let rhs = Node::new(1, Opcode::Const(2), Mode::Int(32), b0, vec![]);
        g.push(rhs);
        let add = Node::new(2, Opcode::Ia32(Ia32Op::Binop), Mode::Int(32), b0, vec![0, 1])
            .with_attr(attr_keys::MNEMONIC, Attr::Mnemonic("add"));
        g.push(add);

        let schedule = LinearSchedule { order: vec![b0], per_block: FxHashMap::from_iter([(b0, vec![2])]) };
        let mut dwarf = NullDwarfSink;
        let regs = ByNodeMap(FxHashMap::from_iter([(0, GpReg::Eax), (1, GpReg::Ecx), (2, GpReg::Eax)]));
        let text = gen_binary_routine(&g, &schedule, &regs, FrameBase::FramePointer, 0, &mut dwarf, &FxHashSet::default()).unwrap();

        assert!(text.contains(".byte 0x01, 0xc8"), "add eax,ecx: opcode 0x01, modrm 0xC8:\n{text}");
    }

    /// `Jcc`'s fallthrough-negation optimization must carry into binary
    /// mode too: the opcode byte reflects the negated condition, and the
    /// displacement is left as a symbolic relocation.
    #[test]
    fn binary_routine_emits_jcc_as_opcode_plus_relocation() {
        let mut g = Graph::new();
        let b0 = g.add_block();
        let btrue = g.add_block();
        let bfalse = g.add_block();
        g.connect(b0, btrue);
        g.connect(b0, bfalse);

        let jcc = Node::new(0, Opcode::Ia32(Ia32Op::Jcc), Mode::Int(32), b0, vec![])
            .with_attr(attr_keys::CMP_KIND, Attr::CmpKind(CmpKind::Lt));
        g.push(jcc);

        let schedule = LinearSchedule { order: vec![b0, btrue, bfalse], per_block: FxHashMap::from_iter([(b0, vec![0])]) };
        let mut dwarf = NullDwarfSink;
        let regs = MapAll(GpReg::Eax);
        let text = gen_binary_routine(&g, &schedule, &regs, FrameBase::FramePointer, 0, &mut dwarf, &FxHashSet::default()).unwrap();

        assert!(text.contains(".byte 0x0f, 0x8d"), "jge is tttn 0xD, opcode 0F 8D:\n{text}");
        assert!(text.contains(".long"), "displacement left as a symbolic relocation:\n{text}");
    }

    /// `SwitchJmp` in binary mode must carry the real `0xFF 0x24 0x85`
    /// indirect-jump prefix, not a comment.
    #[test]
    fn binary_routine_emits_switch_jmp_group5_prefix() {
        let mut g = Graph::new();
        let b0 = g.add_block();
        let case0 = g.add_block();
        let default = g.add_block();
        g.connect(b0, case0);
        g.connect(b0, default);

        let idx = Node::new(0, Opcode::Const(0), Mode::Int(32), b0, vec![]);
        g.push(idx);
        let switch = Node::new(1, Opcode::Ia32(Ia32Op::SwitchJmp), Mode::Control, b0, vec![0]);
        g.push(switch);

        let schedule = LinearSchedule { order: vec![b0, case0, default], per_block: FxHashMap::from_iter([(b0, vec![0, 1])]) };
        let mut dwarf = NullDwarfSink;
        let regs = MapAll(GpReg::Eax);
        let text = gen_binary_routine(&g, &schedule, &regs, FrameBase::FramePointer, 0, &mut dwarf, &FxHashSet::default()).unwrap();

        assert!(text.contains(".byte 0xff, 0x24, 0x85"), "group-5 indirect-jump prefix:\n{text}");
    }
}
