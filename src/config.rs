//! Engine and front-end settings.
//!
//! Every field has a default, so an empty TOML document (or no file at all)
//! yields the stock instrument. Instrument and chord ids go through their
//! fallback parsers: an unknown id is a default, never a load error.
//!
//! ```toml
//! instrument = "sawtooth"
//! chord = "minor"
//!
//! [envelope]
//! release_ms = 350.0
//!
//! [melody]
//! gap_ms = 80
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::{chord::ChordProfile, instrument::InstrumentKind, Error, Result};

/// Lowest sample rate any output is run at.
pub const MIN_SAMPLE_RATE: f32 = 8_000.0;

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub instrument: InstrumentKind,
    pub chord: ChordProfile,
    pub envelope: EnvelopeShape,
    pub melody: MelodySettings,
    pub output: OutputSettings,
}

impl Settings {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let settings: Self = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the renderer can't run with.
    pub fn validate(&self) -> Result<()> {
        let rate = self.output.offline_sample_rate;
        if !(rate.is_finite() && rate >= MIN_SAMPLE_RATE) {
            return Err(Error::InvalidSetting {
                field: "output.offline_sample_rate",
                reason: format!("{rate} Hz is below the {MIN_SAMPLE_RATE} Hz floor"),
            });
        }
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

/// Timeline of every voice, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct EnvelopeShape {
    /// Linear rise from silence to peak
    pub attack_ms: f32,
    /// End of the exponential decay, measured from note start
    pub decay_ms: f32,
    /// Level the decay settles at, relative to peak
    pub sustain_ratio: f32,
    /// Exponential release toward `release_floor`
    pub release_ms: f32,
    pub release_floor: f32,
    /// Oscillator halts this long after the release window
    pub halt_ms: f32,
    /// Resources are freed this long after the halt
    pub cleanup_ms: f32,
}

impl Default for EnvelopeShape {
    fn default() -> Self {
        Self {
            attack_ms: 20.0,
            decay_ms: 500.0,
            sustain_ratio: 0.7,
            release_ms: 200.0,
            release_floor: 0.001,
            halt_ms: 10.0,
            cleanup_ms: 40.0,
        }
    }
}

impl EnvelopeShape {
    pub fn attack_frames(&self, sample_rate: f32) -> u64 {
        ms_to_frames(self.attack_ms, sample_rate).max(1)
    }

    pub fn decay_frames(&self, sample_rate: f32) -> u64 {
        ms_to_frames(self.decay_ms, sample_rate).max(self.attack_frames(sample_rate) + 1)
    }

    pub fn release_frames(&self, sample_rate: f32) -> u64 {
        ms_to_frames(self.release_ms, sample_rate).max(1)
    }

    /// Release start to oscillator halt.
    pub fn halt_frames(&self, sample_rate: f32) -> u64 {
        self.release_frames(sample_rate) + ms_to_frames(self.halt_ms, sample_rate)
    }

    /// Release start to resource cleanup.
    pub fn cleanup_frames(&self, sample_rate: f32) -> u64 {
        self.halt_frames(sample_rate) + ms_to_frames(self.cleanup_ms, sample_rate)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct MelodySettings {
    /// Silence between consecutive melody notes
    pub gap_ms: u64,
    /// Used when a melody note carries no duration
    pub default_note_ms: u32,
}

impl Default for MelodySettings {
    fn default() -> Self {
        Self {
            gap_ms: 50,
            default_note_ms: 500,
        }
    }
}

impl MelodySettings {
    pub fn gap(&self) -> Duration {
        Duration::from_millis(self.gap_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Capacity of the control -> audio command ring
    pub command_capacity: usize,
    /// Preallocated voice pool
    pub max_voices: usize,
    /// Sample rate used by headless (offline) output
    pub offline_sample_rate: f32,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            command_capacity: 1024,
            max_voices: 64,
            offline_sample_rate: 48_000.0,
        }
    }
}

#[inline]
pub fn ms_to_frames(ms: f32, sample_rate: f32) -> u64 {
    (ms.max(0.0) * sample_rate / 1000.0).round() as u64
}
