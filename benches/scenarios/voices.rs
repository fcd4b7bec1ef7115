//! Benchmarks for the complete renderer.
//!
//! Voices are started through the engine and rendered through an offline
//! output, so each iteration pays for message draining, mixing, soft clipping
//! and the cleanup scan exactly like the device callback does.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use virtuoso_synth::{
    catalog,
    chord::ChordProfile,
    config::Settings,
    instrument::InstrumentKind,
    io::OfflineDriver,
    keyboard::Keyboard,
    synth::VoiceEngine,
};

use crate::BLOCK_SIZES;

fn offline_engine() -> (VoiceEngine, OfflineDriver) {
    let mut engine = VoiceEngine::new(Settings::default());
    let driver = engine
        .init_offline()
        .expect("offline output always starts");
    (engine, driver)
}

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // === SINGLE NOTE ===
        // Baseline: one held triangle voice past its decay
        let (mut engine, driver) = offline_engine();
        engine.play_tone(261.63, "C4_0", InstrumentKind::Triangle);
        driver.advance_ms(600.0);
        group.bench_with_input(BenchmarkId::new("single", size), &size, |b, _| {
            b.iter(|| driver.render(black_box(&mut buffer)))
        });

        // === MAJOR CHORD ===
        let (mut engine, driver) = offline_engine();
        let mut keyboard = Keyboard::new(InstrumentKind::Sawtooth, ChordProfile::Major);
        if let Some(c4) = catalog::find_by_name("C4") {
            keyboard.start_note(c4, &mut engine);
        }
        group.bench_with_input(BenchmarkId::new("major_chord", size), &size, |b, _| {
            b.iter(|| driver.render(black_box(&mut buffer)))
        });

        // === FULL KEYBOARD ===
        // Every key held with a major chord: 51 voices
        let (mut engine, driver) = offline_engine();
        let mut keyboard = Keyboard::new(InstrumentKind::Square, ChordProfile::Major);
        for note in catalog::keys() {
            keyboard.start_note(note, &mut engine);
        }
        group.bench_with_input(BenchmarkId::new("full_keyboard", size), &size, |b, _| {
            b.iter(|| driver.render(black_box(&mut buffer)))
        });

        // === RETRIGGER ===
        // Stop + start on the same id every block, tails piling up until cleanup
        let (mut engine, driver) = offline_engine();
        group.bench_with_input(BenchmarkId::new("retrigger", size), &size, |b, _| {
            b.iter(|| {
                engine.play_tone(440.0, "A4_0", InstrumentKind::Sine);
                driver.render(black_box(&mut buffer));
                engine.poll_cleanup();
            })
        });
    }

    group.finish();
}
