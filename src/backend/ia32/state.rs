//! Per-routine emitter state.
//!
//! `pic_base_label`,
//! `exc_label_id`, `sp_relative`, `frame_type_size`, and `callframe_offset`
//! are fields of one value threaded
//! explicitly by `&mut` into every emit function, rather than process-global
//! statics — a single routine's
//! compilation owns one `Ia32EmitterState` and discards it at the end.

/// Stack-pointer-relative vs. frame-pointer-relative addressing mode for
/// local variables, fixed for the whole routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameBase {
    FramePointer,
    StackPointer,
}

/// Receives the call-frame offset after every instruction that changes the
/// stack pointer. A full DWARF call-frame-info
/// state machine is out of scope; this
/// crate only reports the running offset to whatever sink the embedder
/// wires up.
pub trait DwarfSink {
    fn report_sp_offset(&mut self, offset: i32);
}

/// A sink that drops every report; the default when no DWARF consumer is
/// configured.
#[derive(Debug, Default)]
pub struct NullDwarfSink;

impl DwarfSink for NullDwarfSink {
    fn report_sp_offset(&mut self, _offset: i32) {}
}

/// Per-routine emitter state, threaded by `&mut` through every emit call
/// instead of kept as module statics.
pub struct Ia32EmitterState<'d> {
    /// PIC base-register label, used by `GetEIP`-style position-independent
    /// addressing; `None` when the routine isn't compiled PIC.
    pub pic_base_label: Option<String>,
    /// Next id to assign to an exception-label-carrying instruction.
    pub exc_label_id: u32,
    /// Whether locals are addressed relative to `%esp` rather than `%ebp`
    /// (no frame pointer reserved for this routine).
    pub frame_base: FrameBase,
    /// Total size of the current routine's stack frame, used to translate
    /// a local's slot offset into a concrete displacement.
    pub frame_type_size: i32,
    /// Running stack-pointer displacement from the frame's base, updated
    /// by every `IncSP` emission and reported to `dwarf`.
    pub callframe_offset: i32,
    pub dwarf: &'d mut dyn DwarfSink,
    /// Monotonically increasing counter for this routine's local labels
    /// (e.g. the skip-label a `Jcc` with an unordered-FP guard needs).
    local_label_counter: u32,
}

impl<'d> Ia32EmitterState<'d> {
    pub fn new(frame_base: FrameBase, frame_type_size: i32, dwarf: &'d mut dyn DwarfSink) -> Self {
        Ia32EmitterState {
            pic_base_label: None,
            exc_label_id: 0,
            frame_base,
            frame_type_size,
            callframe_offset: 0,
            dwarf,
            local_label_counter: 0,
        }
    }

    pub fn fresh_local_label(&mut self, hint: &str) -> String {
        let id = self.local_label_counter;
        self.local_label_counter += 1;
        format!(".L{hint}{id}")
    }

    pub fn next_exc_label(&mut self) -> u32 {
        let id = self.exc_label_id;
        self.exc_label_id += 1;
        id
    }

    /// Records a stack-pointer delta and reports the new running offset to
    /// the DWARF sink: stack-pointer changes (`IncSP`) update a call-frame
    /// offset, and the new offset is reported to an external DWARF state
    /// machine after each instruction.
    pub fn apply_sp_delta(&mut self, delta: i32) {
        self.callframe_offset += delta;
        self.dwarf.report_sp_offset(self.callframe_offset);
    }
}
