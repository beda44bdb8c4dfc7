//! Dispatch-mode throughput benchmark, grounded on the teacher's
//! `meq_performance.rs` shape: a benchmark matrix of stream lengths, one
//! `bench_function` per point, looped `execute`/`run` inside `b.iter`.

use criterion::{criterion_group, criterion_main, Criterion};
use wasm_fused_core::compile_option::{CompileOption, DispatchMode, RingRange};
use wasm_fused_core::frame::{Frame, RingPositions};
use wasm_fused_core::memory::MemoryInstance;
use wasm_fused_core::opfuncs::stacktop_imm;
use wasm_fused_core::stream::{self, Context, HaltReason, Immediates, StreamBuilder};

fn halt(ctx: &mut Context) -> wasm_fused_core::error::ExecResult<stream::Control> {
    ctx.halt = Some(HaltReason::Return(None));
    Ok(stream::Control::Halted)
}

fn build_stream(length: usize) -> stream::Stream {
    let mut builder = StreamBuilder::new();
    for _ in 0..length {
        builder.push(stacktop_imm::add_imm_stacktop_i32, Immediates::new([1, 0, 0, 0]));
    }
    builder.push(halt, Immediates::default());
    builder.build()
}

fn run_once(length: usize, mode: DispatchMode) {
    let option = if mode == DispatchMode::Chained {
        CompileOption::try_new(
            mode,
            RingRange::new(0, 4).unwrap(),
            RingRange::DISABLED,
            RingRange::DISABLED,
            RingRange::DISABLED,
            RingRange::DISABLED,
        )
        .unwrap()
    } else {
        CompileOption::try_new(
            mode,
            RingRange::DISABLED,
            RingRange::DISABLED,
            RingRange::DISABLED,
            RingRange::DISABLED,
            RingRange::DISABLED,
        )
        .unwrap()
    };
    let stream = build_stream(length);
    let mut ctx = Context::new(stream, option, vec![MemoryInstance::new(0, 0)], Vec::new());
    ctx.frames.push(Frame::new(vec![], 0, 0, RingPositions::default()));
    stream::run(&mut ctx);
}

fn dispatch_throughput(c: &mut Criterion) {
    let benchmark_matrix = [1, 10, 100, 1_000, 10_000, 100_000];

    for size in benchmark_matrix.iter() {
        c.bench_function(&format!("dispatch_chained_{size}"), |b| {
            b.iter(|| run_once(*size, DispatchMode::Chained));
        });
        c.bench_function(&format!("dispatch_stepped_{size}"), |b| {
            b.iter(|| run_once(*size, DispatchMode::Stepped));
        });
    }
}

criterion_group!(benches, dispatch_throughput);
criterion_main!(benches);
