//! Engine throughput benchmarks across overtone counts and block sizes.

use armonico_synth::{Note, SynthParams, SynthesisEngine};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

const RATE: f32 = 48_000.0;

fn engine_with_overtones(overtones: u32) -> SynthesisEngine {
    let mut engine = SynthesisEngine::new(RATE);
    let mut p = SynthParams::default();
    p.overtones = overtones;
    engine.set_params(p);
    engine.set_note(Note::Midi(69));
    engine
}

fn bench_overtone_counts(c: &mut Criterion) {
    let mut group = c.benchmark_group("overtones");
    const FRAMES: usize = 1024;
    group.throughput(Throughput::Elements(FRAMES as u64));
    for overtones in [1u32, 10, 50, 200, 600] {
        let mut engine = engine_with_overtones(overtones);
        let mut out = vec![0.0f32; 2 * FRAMES];
        group.bench_with_input(
            BenchmarkId::from_parameter(overtones),
            &overtones,
            |b, _| {
                b.iter(|| {
                    engine.process(black_box(&mut out));
                });
            },
        );
    }
    group.finish();
}

fn bench_block_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("block_size");
    for block in [64usize, 256, 1024] {
        let mut engine = engine_with_overtones(50);
        engine.set_block_size(block);
        let mut out = vec![0.0f32; 2 * 1024];
        group.throughput(Throughput::Elements(1024));
        group.bench_with_input(BenchmarkId::from_parameter(block), &block, |b, _| {
            b.iter(|| {
                engine.process(black_box(&mut out));
            });
        });
    }
    group.finish();
}

fn bench_ring_modulation(c: &mut Criterion) {
    let mut group = c.benchmark_group("ringmod");
    const FRAMES: usize = 1024;
    group.throughput(Throughput::Elements(FRAMES as u64));
    for depth in [0.0f32, 0.25] {
        let mut engine = engine_with_overtones(50);
        let mut p = engine.params().clone();
        p.ringmod_depth = depth;
        p.stereo_width = 0.25;
        engine.set_params(p);
        let mut out = vec![0.0f32; 2 * FRAMES];
        let label = if depth > 0.0 { "engaged" } else { "bypassed" };
        group.bench_with_input(BenchmarkId::from_parameter(label), &depth, |b, _| {
            b.iter(|| {
                engine.process(black_box(&mut out));
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_overtone_counts,
    bench_block_sizes,
    bench_ring_modulation
);
criterion_main!(benches);
