//! Benchmarks for the low-pass shaping filter.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use virtuoso_synth::dsp::{LowpassFilter, RenderCtx};
use virtuoso_synth::instrument::InstrumentKind;

use crate::BLOCK_SIZES;

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");
    let ctx = RenderCtx::new(48_000.0, 440.0, 0);

    for &size in BLOCK_SIZES {
        // Generate a test signal (sawtooth-like ramp)
        let input: Vec<f32> = (0..size)
            .map(|i| (i as f32 / size as f32) * 2.0 - 1.0)
            .collect();

        // Soft instruments: 1500 Hz, Q ~0.707
        let timbre = InstrumentKind::Triangle.timbre();
        let mut filter = LowpassFilter::new(timbre.cutoff_hz, timbre.resonance);
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("soft", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                filter.render(black_box(&mut buffer), black_box(&ctx));
            })
        });

        // Bright instruments: 3000 Hz, Q 2
        let timbre = InstrumentKind::Sawtooth.timbre();
        let mut filter = LowpassFilter::new(timbre.cutoff_hz, timbre.resonance);
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("bright", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                filter.render(black_box(&mut buffer), black_box(&ctx));
            })
        });
    }

    group.finish();
}
