//! Low-level DSP primitives used by the voices.
//!
//! These components are allocation-free once constructed and realtime-safe,
//! so they can live directly inside the audio-thread voice structs. They stay
//! focused on the signal math; timing and lifecycle live in [`crate::synth`].

/// Gain automation scheduled against the audio clock.
pub mod envelope;
/// Topology-preserving low-pass filter.
pub mod filter;
/// Audio-band oscillator waveforms.
pub mod oscillator;

pub use envelope::GainEnvelope;
pub use filter::LowpassFilter;
pub use oscillator::{Oscillator, Waveform};

/// Context passed to DSP blocks during rendering
///
/// - sample_rate: Audio sample rate (e.g., 48000.0)
/// - frequency: Pitch to render (Hz)
/// - frame: Audio-clock frame of the first sample in the block
#[derive(Debug, Clone, Copy)]
pub struct RenderCtx {
    pub sample_rate: f32,
    pub frequency: f32,
    pub frame: u64,
}

impl RenderCtx {
    pub fn new(sample_rate: f32, frequency: f32, frame: u64) -> Self {
        Self {
            sample_rate,
            frequency,
            frame,
        }
    }
}
