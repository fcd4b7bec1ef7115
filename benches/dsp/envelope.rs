//! Benchmarks for audio-clock gain automation.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use virtuoso_synth::dsp::GainEnvelope;

use crate::BLOCK_SIZES;

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");

    // Note timeline at 48 kHz: 20 ms attack, decay ending at 500 ms
    let mut env = GainEnvelope::new();
    env.set_value_at(0.0, 0);
    env.linear_ramp_to(0.6, 960);
    env.exponential_ramp_to(0.42, 24_000);

    let mut released = env.clone();
    released.cancel_and_hold(4_800);
    released.exponential_ramp_to(0.001, 14_400);

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Attack phase (linear ramp)
        group.bench_with_input(BenchmarkId::new("attack", size), &size, |b, _| {
            b.iter(|| {
                env.render(black_box(&mut buffer), black_box(0));
            })
        });

        // Decay phase (exponential ramp)
        group.bench_with_input(BenchmarkId::new("decay", size), &size, |b, _| {
            b.iter(|| {
                env.render(black_box(&mut buffer), black_box(4_800));
            })
        });

        // Sustain floor (past the last event)
        group.bench_with_input(BenchmarkId::new("sustain", size), &size, |b, _| {
            b.iter(|| {
                env.render(black_box(&mut buffer), black_box(48_000));
            })
        });

        // Release from a held value
        group.bench_with_input(BenchmarkId::new("release", size), &size, |b, _| {
            b.iter(|| {
                released.render(black_box(&mut buffer), black_box(6_000));
            })
        });
    }

    group.finish();
}
