use std::f32::consts::TAU;

use super::RenderCtx;

/*
Audio Oscillator
================

A phase accumulator running from 0.0 to 1.0 once per cycle. Each sample:

    phase += frequency / sample_rate      (wrapped back into [0, 1))

The waveform is a function of the phase.

Sine: single frequency, no harmonics. Smooth and hollow.

Triangle: odd harmonics falling off as 1/n². Soft, close to a sine.

Square: odd harmonics falling off as 1/n. Hollow, "8-bit".

Sawtooth: every harmonic, falling off as 1/n. Bright and buzzy.


Aliasing and PolyBLEP
---------------------

Square and sawtooth jump instantly, and an instant jump contains harmonics
far above Nyquist. Those fold back into the audible band as inharmonic
noise. PolyBLEP subtracts a small polynomial correction around each jump,
spread over one sample either side:

    t < dt        (just after the jump):  2t/dt - (t/dt)² - 1
    t > 1 - dt    (just before the jump): (t'/dt)² + 2t'/dt + 1,  t' = t - 1

where dt = frequency / sample_rate. Everywhere else the correction is zero,
so the cost is a couple of comparisons per sample.

Triangle's corners are continuous, so its aliasing is already low enough.
*/

/// Oscillator waveform shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Triangle,
    Square,
    Sawtooth,
}

pub struct Oscillator {
    waveform: Waveform,
    phase: f32,
}

impl Oscillator {
    pub fn new(waveform: Waveform) -> Self {
        Self {
            waveform,
            phase: 0.0,
        }
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    /// Switch waveform and restart the cycle.
    pub fn reset(&mut self, waveform: Waveform) {
        self.waveform = waveform;
        self.phase = 0.0;
    }

    /// Produce one sample and advance the phase.
    #[inline]
    pub fn next_sample(&mut self, dt: f32) -> f32 {
        let t = self.phase;
        let sample = match self.waveform {
            Waveform::Sine => (TAU * t).sin(),
            Waveform::Triangle => {
                if t < 0.25 {
                    4.0 * t
                } else if t < 0.75 {
                    2.0 - 4.0 * t
                } else {
                    4.0 * t - 4.0
                }
            }
            Waveform::Square => {
                let naive = if t < 0.5 { 1.0 } else { -1.0 };
                naive + poly_blep(t, dt) - poly_blep((t + 0.5).fract(), dt)
            }
            Waveform::Sawtooth => 2.0 * t - 1.0 - poly_blep(t, dt),
        };

        self.phase += dt;
        if self.phase >= 1.0 {
            self.phase -= self.phase.floor();
        }
        sample
    }

    /// Overwrite `out` with the waveform at `ctx.frequency`.
    pub fn render(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        let dt = (ctx.frequency / ctx.sample_rate).clamp(0.0, 0.5);
        for sample in out.iter_mut() {
            *sample = self.next_sample(dt);
        }
    }
}

#[inline]
fn poly_blep(t: f32, dt: f32) -> f32 {
    if dt <= 0.0 {
        0.0
    } else if t < dt {
        let x = t / dt;
        x + x - x * x - 1.0
    } else if t > 1.0 - dt {
        let x = (t - 1.0) / dt;
        x * x + x + x + 1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 48_000.0;

    fn render(waveform: Waveform, frequency: f32, len: usize) -> Vec<f32> {
        let mut osc = Oscillator::new(waveform);
        let mut buffer = vec![0.0f32; len];
        osc.render(&mut buffer, &RenderCtx::new(SAMPLE_RATE, frequency, 0));
        buffer
    }

    #[test]
    fn valid_sine() {
        let buffer = render(Waveform::Sine, 440.0, 128);

        // sample n should be sin(2pi f n / sr)
        let sample_index = 12;
        let expected = (TAU * 440.0 * sample_index as f32 / SAMPLE_RATE).sin();
        let actual = buffer[sample_index];
        assert!(
            (actual - expected).abs() < 1e-4,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn triangle_peaks_at_quarter_cycle() {
        // 480 Hz at 48 kHz = 100 samples per cycle
        let buffer = render(Waveform::Triangle, 480.0, 100);
        assert!((buffer[25] - 1.0).abs() < 1e-3);
        assert!((buffer[75] + 1.0).abs() < 1e-3);
        assert!(buffer[0].abs() < 1e-6);
    }

    #[test]
    fn waveforms_stay_bounded() {
        for waveform in [
            Waveform::Sine,
            Waveform::Triangle,
            Waveform::Square,
            Waveform::Sawtooth,
        ] {
            let buffer = render(waveform, 659.25, 4096);
            let peak = buffer.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
            assert!(peak <= 1.05, "{waveform:?} peak {peak}");
            assert!(peak > 0.9, "{waveform:?} peak {peak}");
        }
    }

    #[test]
    fn waveforms_have_no_dc_offset() {
        for waveform in [Waveform::Triangle, Waveform::Square, Waveform::Sawtooth] {
            // 480 Hz: exactly 40 whole cycles in 4000 samples
            let buffer = render(waveform, 480.0, 4000);
            let mean = buffer.iter().sum::<f32>() / buffer.len() as f32;
            assert!(mean.abs() < 0.02, "{waveform:?} mean {mean}");
        }
    }

    #[test]
    fn reset_restarts_cycle() {
        let mut osc = Oscillator::new(Waveform::Sine);
        let mut buffer = vec![0.0f32; 37];
        osc.render(&mut buffer, &RenderCtx::new(SAMPLE_RATE, 440.0, 0));
        osc.reset(Waveform::Square);
        assert_eq!(osc.waveform(), Waveform::Square);
        let dt = 440.0 / SAMPLE_RATE;
        // first sample sits on the BLEP-smoothed edge, the second is the plateau
        assert!(osc.next_sample(dt).abs() < 1e-6);
        assert!(osc.next_sample(dt) > 0.9);
    }
}
