//! End-to-end scenarios driving the public [`wasm_fused_core`] API the way
//! a translator embedding this core would: build a [`Stream`], attach a
//! [`Context`], run it to a halt, and inspect the result through the
//! crate's public surface only (no `pub(crate)` internals).
//!
//! Grounded on the teacher's top-level `tests/` layout (`tests/memory.rs`,
//! `tests/interpreter/executors.rs`): full-stack tests that exercise the
//! public surface rather than a single opfunc in isolation, kept separate
//! from the per-family unit tests under `src/opfuncs/*.rs`.

use wasm_fused_core::compile_option::{CompileOption, DispatchMode, RingRange};
use wasm_fused_core::error::ExecResult;
use wasm_fused_core::frame::{Frame, RingPositions, Word};
use wasm_fused_core::memory::{self, BoundsCheckStrategy, MemoryInstance, NarrowWidth};
use wasm_fused_core::opfuncs::{bitpack, branch, call, memop};
use wasm_fused_core::selector;
use wasm_fused_core::opfuncs::arith_imm;
use wasm_fused_core::stream::{Context, Control, HaltReason, Immediates, Stream, StreamBuilder};

fn halt(ctx: &mut Context) -> ExecResult<Control> {
    ctx.halt = Some(HaltReason::Return(None));
    Ok(Control::Halted)
}

fn trap_unreachable(_ctx: &mut Context) -> ExecResult<Control> {
    Err(wasm_fused_core::error::TrapReason::Unreachable.into())
}

/// Pushes a value onto the byte-arena operand stack directly, the way
/// [`wasm_fused_core::opfuncs::push_i32`] does internally when the i32
/// ring is disabled — reproduced here since that helper is a private
/// implementation detail, not part of the public surface an embedder uses.
fn arena_push_i32(ctx: &mut Context, value: i32) {
    let bytes = value.to_le_bytes();
    let end = ctx.sp + bytes.len();
    if ctx.arena.len() < end {
        ctx.arena.resize(end, 0);
    }
    ctx.arena[ctx.sp..end].copy_from_slice(&bytes);
    ctx.sp = end;
}

fn arena_pop_i32(ctx: &mut Context) -> i32 {
    let start = ctx.sp - 4;
    let bytes: [u8; 4] = ctx.arena[start..ctx.sp].try_into().unwrap();
    ctx.sp = start;
    i32::from_le_bytes(bytes)
}

/// Writes a value into the enabled i32 ring at `curr_T` and advances the
/// position in the push direction, reproducing the ring half of
/// `push_i32` for tests that need the fast path exercised specifically
/// (e.g. the call_stacktop scenario, which only applies when the ring is
/// actually enabled).
fn ring_push_i32(ctx: &mut Context, option: CompileOption, value: i32) {
    let range = option.i32_range();
    *ctx.i32_ring.get_mut(ctx.int_pos) = value;
    ctx.int_pos = range.ring_prev(ctx.int_pos);
}

fn ring_pop_i32(ctx: &mut Context, option: CompileOption) -> i32 {
    let range = option.i32_range();
    ctx.int_pos = range.ring_next(ctx.int_pos);
    *ctx.i32_ring.get(ctx.int_pos)
}

fn disabled_option(mode: DispatchMode) -> CompileOption {
    CompileOption::try_new(
        mode,
        RingRange::DISABLED,
        RingRange::DISABLED,
        RingRange::DISABLED,
        RingRange::DISABLED,
        RingRange::DISABLED,
    )
    .unwrap()
}

fn context_with(stream: Stream, option: CompileOption, locals: Vec<Word>, memories: Vec<MemoryInstance>) -> Context {
    let mut ctx = Context::new(stream, option, memories, Vec::new());
    ctx.frames.push(Frame::new(locals, 0, 0, RingPositions::default()));
    ctx
}

/// Scenario 1: fused add-imm. `l0 = 7`, stream is
/// `[i32_add_imm_localget(l0, 5)] [halt]`. Expected: the ring slot holding
/// the logical top-of-stack is `12`.
#[test]
fn scenario_1_fused_add_imm() {
    let option = CompileOption::try_new(
        DispatchMode::Chained,
        RingRange::new(0, 4).unwrap(),
        RingRange::new(0, 4).unwrap(),
        RingRange::DISABLED,
        RingRange::DISABLED,
        RingRange::DISABLED,
    )
    .unwrap();
    let mut builder = StreamBuilder::new();
    let table = arith_imm::add_imm_local_i32_table();
    let op = selector::pick(&table, 0);
    builder.push(op, Immediates::new([0, 5, 0, 0]));
    builder.push(halt, Immediates::default());
    let mut ctx = context_with(builder.build(), option, vec![Word::I32(7)], vec![MemoryInstance::new(0, 0)]);
    ctx.int_pos = 0;
    let reason = wasm_fused_core::stream::run(&mut ctx);
    assert!(matches!(reason, HaltReason::Return(None)));
    assert_eq!(*ctx.i32_ring.get(0), 12);
}

/// Scenario 2: branch on local eqz. `l0 = 0`, stream is
/// `[br_if_local_eqz(l0, target=2)] [trap_unreachable] [halt]`. Expected:
/// halt is reached without ever running the trapping record.
#[test]
fn scenario_2_branch_on_local_eqz_skips_trap() {
    let option = disabled_option(DispatchMode::Stepped);
    let mut builder = StreamBuilder::new();
    builder.push(branch::br_if_local_eqz, Immediates::new([0, 2, 0, 0]));
    builder.push(trap_unreachable, Immediates::default());
    builder.push(halt, Immediates::default());
    let mut ctx = context_with(builder.build(), option, vec![Word::I32(0)], vec![MemoryInstance::new(0, 0)]);
    let reason = wasm_fused_core::stream::run(&mut ctx);
    assert!(matches!(reason, HaltReason::Return(None)));
}

/// The same stream with a nonzero local must fall through into the trap,
/// proving the branch is actually conditional rather than always-taken.
#[test]
fn scenario_2_counterpart_nonzero_local_falls_into_trap() {
    let option = disabled_option(DispatchMode::Stepped);
    let mut builder = StreamBuilder::new();
    builder.push(branch::br_if_local_eqz, Immediates::new([0, 2, 0, 0]));
    builder.push(trap_unreachable, Immediates::default());
    builder.push(halt, Immediates::default());
    let mut ctx = context_with(builder.build(), option, vec![Word::I32(9)], vec![MemoryInstance::new(0, 0)]);
    let reason = wasm_fused_core::stream::run(&mut ctx);
    assert!(matches!(reason, HaltReason::Trap(_)));
}

struct SubtractingHost;

impl wasm_fused_core::host::HostBridge for SubtractingHost {
    fn call(&mut self, _module_id: usize, _function_index: usize, scratch: &mut [u8]) -> ExecResult<()> {
        let a = i32::from_le_bytes(scratch[0..4].try_into().unwrap());
        let b = i32::from_le_bytes(scratch[4..8].try_into().unwrap());
        scratch[0..4].copy_from_slice(&(a - b).to_le_bytes());
        Ok(())
    }
}

/// Scenario 3: call fast path. Callee is `(a: i32, b: i32) -> a - b`. Ring
/// holds `[30, 4]` before the call with `curr_i32` at the slot holding
/// `4`. Stream is `[call_stacktop_i32(N=2, fn=callee)] [halt]`. Expected
/// after the call: exactly one i32 logically on the stack, value `26`.
#[test]
fn scenario_3_call_fast_path() {
    let option = CompileOption::try_new(
        DispatchMode::Chained,
        RingRange::new(0, 4).unwrap(),
        RingRange::new(0, 4).unwrap(),
        RingRange::DISABLED,
        RingRange::DISABLED,
        RingRange::DISABLED,
    )
    .unwrap();
    let mut builder = StreamBuilder::new();
    builder.push(call::call_stacktop_i32, Immediates::new([0, 0, 2, 0]));
    builder.push(halt, Immediates::default());
    let mut ctx = context_with(builder.build(), option, vec![], vec![MemoryInstance::new(0, 0)]);
    ctx.set_host(Box::new(SubtractingHost));
    ring_push_i32(&mut ctx, option, 30);
    ring_push_i32(&mut ctx, option, 4);
    let reason = wasm_fused_core::stream::run(&mut ctx);
    assert!(matches!(reason, HaltReason::Return(None)));
    assert_eq!(ring_pop_i32(&mut ctx, option), 26);
}

/// Scenario 4: memory load + tee. Memory bytes at offset 100 are the
/// little-endian encoding of `0x1234_5678`. `l0 = 100`, `l1 = 0`. Stream is
/// `[i32_load_localget_tee_local(addr=l0, off=0, dst=l1)] [halt]`.
/// Expected: `l1 == 0x1234_5678` and the same value is the logical top.
#[test]
fn scenario_4_memory_load_and_tee() {
    let option = disabled_option(DispatchMode::Stepped);
    let mut mem = MemoryInstance::new(0, 128);
    memory::store_i32(&mut mem, 100, 0, 0x1234_5678, NarrowWidth::Word, BoundsCheckStrategy::Generic).unwrap();
    let mut builder = StreamBuilder::new();
    // load_tee_local_i32 pops the address off the stack; push l0 first.
    builder.push(memop::load_tee_local_i32, Immediates::new([0, 2, 0, 1]));
    builder.push(halt, Immediates::default());
    let mut ctx = context_with(builder.build(), option, vec![Word::I32(100), Word::I32(0)], vec![mem]);
    arena_push_i32(&mut ctx, 100);
    let reason = wasm_fused_core::stream::run(&mut ctx);
    assert!(matches!(reason, HaltReason::Return(None)));
    assert_eq!(ctx.frame().local(1).as_i32(), 0x1234_5678);
    assert_eq!(arena_pop_i32(&mut ctx), 0x1234_5678);
}

/// Scenario 5: bounds trap. Memory length is 64. The store's effective
/// offset is `60 + 8 = 68 > 64`, so it must trap with the declared payload,
/// leave `ip` at the start of the trapping record, and write nothing.
#[test]
fn scenario_5_bounds_trap_reports_payload_and_writes_nothing() {
    let option = disabled_option(DispatchMode::Stepped);
    let mem = MemoryInstance::new(0, 64);
    let mut builder = StreamBuilder::new();
    builder.push(memop::store_local_value_i32, Immediates::new([1, 8, 2, 0]));
    builder.push(halt, Immediates::default());
    let trapping_record_index = 0;
    let mut ctx = context_with(builder.build(), option, vec![Word::I32(60), Word::I32(42)], vec![mem]);
    arena_push_i32(&mut ctx, 60); // address, matching local[0]
    let reason = wasm_fused_core::stream::run(&mut ctx);
    match reason {
        HaltReason::Trap(wasm_fused_core::error::Trap::Memory(payload)) => {
            assert_eq!(payload.memory_index, 0);
            assert_eq!(payload.declared_offset, 8);
            assert_eq!(payload.effective_offset, 68);
            assert_eq!(payload.memory_length, 64);
            assert_eq!(payload.access_width, 4);
        }
        other => panic!("expected a memory trap, got {other:?}"),
    }
    assert_eq!(ctx.ip, trapping_record_index);
    assert_eq!(ctx.memory().len(), 64);
}

/// Scenario 6: bit-pack. Ring holds two i32 `lo = 0x00AB`, `hi = 0x00CD`.
/// Stream is `[i32_shl_or_stacktop(shift=8)] [halt]`. Expected: a single
/// i32 equal to `lo | (hi << 8)` = `0xCDAB`.
#[test]
fn scenario_6_bitpack() {
    let option = disabled_option(DispatchMode::Stepped);
    let mut builder = StreamBuilder::new();
    builder.push(bitpack::shl_or_stacktop_i32, Immediates::new([8, 0, 0, 0]));
    builder.push(halt, Immediates::default());
    let mut ctx = context_with(builder.build(), option, vec![], vec![MemoryInstance::new(0, 0)]);
    arena_push_i32(&mut ctx, 0x00AB);
    arena_push_i32(&mut ctx, 0x00CD);
    let reason = wasm_fused_core::stream::run(&mut ctx);
    assert!(matches!(reason, HaltReason::Return(None)));
    assert_eq!(arena_pop_i32(&mut ctx), 0xCDAB);
}

/// R1: a push-then-pop round trip returns the ring to its original
/// `curr_T`, the arena cursor to its original `sp`, and yields back the
/// pushed value — checked identically in chained (ring-backed) and
/// stepped (arena-backed) mode.
#[test]
fn push_pop_round_trip_holds_in_both_dispatch_modes() {
    let chained = CompileOption::try_new(
        DispatchMode::Chained,
        RingRange::new(0, 4).unwrap(),
        RingRange::new(0, 4).unwrap(),
        RingRange::DISABLED,
        RingRange::DISABLED,
        RingRange::DISABLED,
    )
    .unwrap();
    let mut ctx = Context::new(Stream::default(), chained, vec![MemoryInstance::new(0, 0)], Vec::new());
    ctx.frames.push(Frame::new(vec![], 0, 0, RingPositions::default()));
    let starting_pos = ctx.int_pos;
    ring_push_i32(&mut ctx, chained, 99);
    assert_eq!(ring_pop_i32(&mut ctx, chained), 99);
    assert_eq!(ctx.int_pos, starting_pos);

    let stepped = disabled_option(DispatchMode::Stepped);
    let mut ctx = Context::new(Stream::default(), stepped, vec![MemoryInstance::new(0, 0)], Vec::new());
    ctx.frames.push(Frame::new(vec![], 0, 0, RingPositions::default()));
    let starting_sp = ctx.sp;
    arena_push_i32(&mut ctx, 99);
    assert_eq!(arena_pop_i32(&mut ctx), 99);
    assert_eq!(ctx.sp, starting_sp);
}
