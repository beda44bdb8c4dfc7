//! Bytecode stream, interpreter context, and the two dispatch engines
//! (SPEC_FULL.md §3, §4.A).
//!
//! Grounded on `fuel-vm/src/interpreter/executors/main.rs` (`run_program`'s
//! central `loop { execute()?; match state { ... } }`, the direct model for
//! stepped mode) and `executors/instruction.rs` (the per-record dispatch
//! shape, `#[tracing::instrument]`/`tracing::trace!` usage). Chained mode is
//! expressed as a self-recursive tail call rather than per-opfunc jump
//! chaining, per the design note recorded in DESIGN.md: this crate is
//! `#![deny(unsafe_code)]`, so "the stream is the program counter" is
//! realized as a `Vec<Record>` of safe `fn` pointers rather than raw memory.

use crate::compile_option::{CompileOption, DispatchMode};
use crate::error::{ExecResult, Trap, TrapReason};
use crate::frame::{Frame, RingPositions, Word};
use crate::host::{BoxedHostBridge, HostBridge, UnboundHostBridge};
use crate::memory::MemoryInstance;
use crate::ring::RingFile;
use alloc::boxed::Box;
use alloc::vec::Vec;

/// Immediates embedded in a record, stored raw (native representation, no
/// endianness transform) as required by SPEC_FULL.md §3 invariant 4. Four
/// slots is enough for every fused family in §4.C; unused slots are simply
/// ignored by opfuncs that need fewer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Immediates(pub [i64; 4]);

impl Immediates {
    /// Builds an immediate set from up to four `i64`-sized raw values.
    pub const fn new(values: [i64; 4]) -> Self {
        Self(values)
    }

    /// Reads slot `n` as `i32` (truncating).
    pub fn i32(&self, n: usize) -> i32 {
        self.0[n] as i32
    }

    /// Reads slot `n` as `i64`.
    pub fn i64(&self, n: usize) -> i64 {
        self.0[n]
    }

    /// Reads slot `n` as `u32` address/index.
    pub fn u32(&self, n: usize) -> u32 {
        self.0[n] as u32
    }

    /// Reads slot `n` as `f32`, via its bit pattern.
    pub fn f32(&self, n: usize) -> f32 {
        f32::from_bits(self.0[n] as u32)
    }

    /// Reads slot `n` as `f64`, via its bit pattern.
    pub fn f64(&self, n: usize) -> f64 {
        f64::from_bits(self.0[n] as u64)
    }
}

/// What an opfunc does once it has finished its fused work: continue
/// dispatch, or stop (the terminating opfunc sets [`Context::halt`] before
/// returning this).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Dispatch the next record.
    Continue,
    /// Execution has stopped; see [`Context::halt`] for why.
    Halted,
}

/// The shape every fused opfunc implements. Chained and stepped mode share
/// this exact signature — the dispatcher, not the opfunc, decides whether
/// the "next" transition is a tail call or a loop iteration.
pub type OpFn = fn(&mut Context) -> ExecResult<Control>;

/// One bytecode stream record: an opfunc pointer plus its immediates.
#[derive(Debug, Clone, Copy)]
pub struct Record {
    /// The (possibly fused) operation to run.
    pub op: OpFn,
    /// Raw immediates, interpreted positionally by `op`.
    pub imm: Immediates,
}

/// A translated function body, ready for dispatch.
#[derive(Debug, Clone, Default)]
pub struct Stream {
    records: Vec<Record>,
}

impl Stream {
    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the stream has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Reads the record at `ip`. Out-of-range `ip` is an internal
    /// invariant violation: the dispatcher should never be asked to read
    /// past a `Control::Halted` terminator record.
    pub fn record(&self, ip: usize) -> Record {
        match self.records.get(ip) {
            Some(record) => *record,
            None => crate::error::internal_invariant_violation("ip past end of stream"),
        }
    }
}

/// Incrementally builds a [`Stream`] in translation order. A SUPPLEMENTED
/// feature: the distilled spec assumes a stream exists without specifying
/// how one is constructed safely.
#[derive(Debug, Default)]
pub struct StreamBuilder {
    records: Vec<Record>,
}

impl StreamBuilder {
    /// Starts an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one record and returns its index (useful for patching branch
    /// targets once the destination record is known).
    pub fn push(&mut self, op: OpFn, imm: Immediates) -> usize {
        self.records.push(Record { op, imm });
        self.records.len() - 1
    }

    /// Current length, i.e. the index the next `push` will receive.
    pub fn next_index(&self) -> usize {
        self.records.len()
    }

    /// Finishes the stream.
    pub fn build(self) -> Stream {
        Stream {
            records: self.records,
        }
    }
}

/// Why execution stopped.
#[derive(Debug, Clone)]
pub enum HaltReason {
    /// Normal return, carrying the function's result if it has one.
    Return(Option<Word>),
    /// A fatal trap.
    Trap(Trap),
}

/// The fixed interpreter-state parameter pack threaded through every
/// opfunc (SPEC_FULL.md §3's "Interpreter state" table), plus the
/// SUPPLEMENTED frame stack and memory instances needed to actually run a
/// function end to end.
#[derive(educe::Debug)]
#[educe(Debug)]
pub struct Context {
    stream: Stream,
    option: CompileOption,
    /// Read cursor into `stream`.
    pub ip: usize,
    /// Operand-stack-top byte cursor into `arena`.
    pub sp: usize,
    /// The operand stack's byte arena; entries not resident in a ring live
    /// here (§3 invariant 2).
    pub arena: Vec<u8>,
    /// i32 ring cache.
    pub i32_ring: RingFile<i32>,
    /// i64 ring cache.
    pub i64_ring: RingFile<i64>,
    /// f32 ring cache.
    pub f32_ring: RingFile<f32>,
    /// f64 ring cache.
    pub f64_ring: RingFile<f64>,
    /// v128 ring cache.
    pub v128_ring: RingFile<u128>,
    /// `curr_T` shared by i32/i64 (merge rule, §4.B).
    pub int_pos: usize,
    /// `curr_T` shared by f32/f64/v128 (merge rule, §4.B).
    pub fp_pos: usize,
    /// Call stack.
    pub frames: Vec<Frame>,
    /// Linear memories owned by this activation's module instance.
    pub memories: Vec<MemoryInstance>,
    /// Module globals, addressed by index (family 6: global update in
    /// place).
    pub globals: Vec<Word>,
    /// Set by the terminating opfunc before it returns [`Control::Halted`].
    pub halt: Option<HaltReason>,
    /// The host-call bridge (§6). Defaults to [`UnboundHostBridge`], which
    /// traps on any call, until an embedder attaches a real one via
    /// [`Context::set_host`].
    #[educe(Debug(ignore))]
    host: BoxedHostBridge,
}

impl Context {
    /// Builds a context ready to execute `stream` from its first record.
    pub fn new(stream: Stream, option: CompileOption, memories: Vec<MemoryInstance>, globals: Vec<Word>) -> Self {
        Self {
            stream,
            option,
            ip: 0,
            sp: 0,
            arena: Vec::new(),
            i32_ring: RingFile::default(),
            i64_ring: RingFile::default(),
            f32_ring: RingFile::default(),
            f64_ring: RingFile::default(),
            v128_ring: RingFile::default(),
            int_pos: option.i32_range().begin(),
            fp_pos: option.f32_range().begin(),
            frames: Vec::new(),
            memories,
            globals,
            halt: None,
            host: Box::new(UnboundHostBridge),
        }
    }

    /// Attaches a host-call bridge, replacing the default
    /// [`UnboundHostBridge`]. An embedder calls this once, before running
    /// any stream whose call fusions (§4.C.11) actually invoke a callee.
    pub fn set_host(&mut self, host: BoxedHostBridge) {
        self.host = host;
    }

    /// Invokes the attached host bridge (§6). Used by the call fusions in
    /// [`crate::opfuncs::call`] rather than reaching into `self.host`
    /// directly, so the bridge stays a private implementation detail of
    /// `Context`.
    pub fn call_host(&mut self, module_id: usize, function_index: usize, scratch: &mut [u8]) -> ExecResult<()> {
        self.host.call(module_id, function_index, scratch)
    }

    /// The compile-time configuration this context was built for.
    pub fn option(&self) -> CompileOption {
        self.option
    }

    /// Reads the record at the current `ip` without advancing.
    pub fn current_record(&self) -> Record {
        self.stream.record(self.ip)
    }

    /// The current activation's frame, or an internal invariant violation
    /// if there is none (the outermost call always pushes one).
    pub fn frame(&self) -> &Frame {
        self.frames
            .last()
            .unwrap_or_else(|| crate::error::internal_invariant_violation("no active frame"))
    }

    /// Mutable counterpart of [`Context::frame`].
    pub fn frame_mut(&mut self) -> &mut Frame {
        self.frames
            .last_mut()
            .unwrap_or_else(|| crate::error::internal_invariant_violation("no active frame"))
    }

    /// Default memory (index 0), the only one most fused memory families
    /// address directly.
    pub fn memory(&self) -> &MemoryInstance {
        &self.memories[0]
    }

    /// Mutable default memory.
    pub fn memory_mut(&mut self) -> &mut MemoryInstance {
        &mut self.memories[0]
    }

    /// Captures the ring positions for a call's saved-state snapshot.
    pub fn ring_positions(&self) -> RingPositions {
        RingPositions {
            int_pos: self.int_pos,
            fp_pos: self.fp_pos,
        }
    }

    /// Restores ring positions after a call returns.
    pub fn restore_ring_positions(&mut self, positions: RingPositions) {
        self.int_pos = positions.int_pos;
        self.fp_pos = positions.fp_pos;
    }

    /// Rolls `ip` back to `record_start` and records a trap. Called by the
    /// dispatcher, not by opfuncs directly, so that every trap path goes
    /// through one place (§7's "capture before advancing" contract).
    fn trap_at(&mut self, record_start: usize, trap: Trap) -> Control {
        self.ip = record_start;
        self.halt = Some(HaltReason::Trap(trap));
        Control::Halted
    }
}

/// Runs `ctx` to completion using the dispatch mode baked into its
/// [`CompileOption`], returning once [`Context::halt`] is set.
///
/// This is the single public entry point a translator-facing caller needs;
/// it hides the chained/stepped split so callers do not need to know which
/// mode a given `CompileOption` selected.
#[tracing::instrument(name = "run", skip(ctx))]
pub fn run(ctx: &mut Context) -> &HaltReason {
    match ctx.option().mode() {
        DispatchMode::Chained => dispatch_chained(ctx),
        DispatchMode::Stepped => dispatch_stepped(ctx),
    }
    ctx.halt
        .as_ref()
        .unwrap_or_else(|| crate::error::internal_invariant_violation("dispatch returned without halting"))
}

/// Stepped mode: a central loop that calls each opfunc by reference and
/// inspects its [`Control`] result. This is the mode guaranteed to work
/// regardless of what the backend does with tail calls (§9).
fn dispatch_stepped(ctx: &mut Context) {
    loop {
        let record_start = ctx.ip;
        let record = ctx.current_record();
        tracing::trace!(ip = record_start, "dispatch step");
        match (record.op)(ctx) {
            Ok(Control::Continue) => continue,
            Ok(Control::Halted) => return,
            Err(trap) => {
                ctx.trap_at(record_start, trap);
                return;
            }
        }
    }
}

/// Chained mode: the dispatcher tail-calls itself after every record,
/// relying on (without requiring) sibling-call elimination to keep stack
/// depth bounded. Opfuncs themselves are unaware of which mode is active.
/// Deliberately not `#[tracing::instrument]`: the span guard's `Drop` would
/// sit after the recursive call, moving it out of tail position.
fn dispatch_chained(ctx: &mut Context) {
    let record_start = ctx.ip;
    let record = ctx.current_record();
    tracing::trace!(ip = record_start, "dispatch step");
    match (record.op)(ctx) {
        Ok(Control::Continue) => dispatch_chained(ctx),
        Ok(Control::Halted) => (),
        Err(trap) => {
            ctx.trap_at(record_start, trap);
        }
    }
}

/// Convenience used by opfuncs that do not produce a trap themselves but
/// need to signal the selector picked an invalid specialization.
pub fn invalid_specialization() -> ! {
    crate::error::internal_invariant_violation("selector chose an out-of-range specialization")
}

pub(crate) fn trap(reason: TrapReason) -> Trap {
    Trap::from(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile_option::{CompileOption, DispatchMode, RingRange};

    fn halt_op(ctx: &mut Context) -> ExecResult<Control> {
        ctx.ip += 1;
        ctx.halt = Some(HaltReason::Return(None));
        Ok(Control::Halted)
    }

    fn noop(ctx: &mut Context) -> ExecResult<Control> {
        ctx.ip += 1;
        Ok(Control::Continue)
    }

    fn build_two_step_stream() -> Stream {
        let mut builder = StreamBuilder::new();
        builder.push(noop, Immediates::default());
        builder.push(halt_op, Immediates::default());
        builder.build()
    }

    #[test]
    fn stepped_dispatch_runs_to_halt() {
        let option = CompileOption::try_new(
            DispatchMode::Stepped,
            RingRange::DISABLED,
            RingRange::DISABLED,
            RingRange::DISABLED,
            RingRange::DISABLED,
            RingRange::DISABLED,
        )
        .unwrap();
        let mut ctx = Context::new(build_two_step_stream(), option, alloc::vec![MemoryInstance::new(0, 0)], Vec::new());
        let reason = run(&mut ctx);
        assert!(matches!(reason, HaltReason::Return(None)));
        assert_eq!(ctx.ip, 2);
    }

    #[test]
    fn chained_dispatch_runs_to_halt() {
        let option = CompileOption::try_new(
            DispatchMode::Chained,
            RingRange::new(0, 2).unwrap(),
            RingRange::new(0, 2).unwrap(),
            RingRange::DISABLED,
            RingRange::DISABLED,
            RingRange::DISABLED,
        )
        .unwrap();
        let mut ctx = Context::new(build_two_step_stream(), option, alloc::vec![MemoryInstance::new(0, 0)], Vec::new());
        let reason = run(&mut ctx);
        assert!(matches!(reason, HaltReason::Return(None)));
    }

    #[test]
    fn trap_rolls_back_ip_to_record_start() {
        fn trapping_op(_ctx: &mut Context) -> ExecResult<Control> {
            // deliberately do not advance ip before trapping
            Err(crate::error::TrapReason::Unreachable.into())
        }
        let mut builder = StreamBuilder::new();
        builder.push(trapping_op, Immediates::default());
        let option = CompileOption::try_new(
            DispatchMode::Stepped,
            RingRange::DISABLED,
            RingRange::DISABLED,
            RingRange::DISABLED,
            RingRange::DISABLED,
            RingRange::DISABLED,
        )
        .unwrap();
        let mut ctx = Context::new(builder.build(), option, alloc::vec![MemoryInstance::new(0, 0)], Vec::new());
        let reason = run(&mut ctx);
        assert!(matches!(reason, HaltReason::Trap(_)));
        assert_eq!(ctx.ip, 0);
    }
}
