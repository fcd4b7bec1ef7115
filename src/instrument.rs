//! Selectable timbres.
//!
//! Each instrument is a waveform plus the shaping stage that follows it:
//! a low-pass filter and a peak gain. Harmonically rich waveforms (square,
//! sawtooth) get a brighter, resonant filter and a lower peak so that all
//! four instruments sound roughly equally loud.

use serde::Deserialize;

use crate::dsp::oscillator::Waveform;

/// Timbre choice for a voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(from = "String")]
pub enum InstrumentKind {
    #[default]
    Triangle,
    Sine,
    Square,
    Sawtooth,
}

/// Filter and level settings derived from an [`InstrumentKind`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timbre {
    pub waveform: Waveform,
    /// Low-pass cutoff in Hz
    pub cutoff_hz: f32,
    /// SVF resonance (0.0 = no peak; Q = 1 / (2 - 2r))
    pub resonance: f32,
    /// Envelope peak level
    pub peak_gain: f32,
}

// Q ≈ 0.707 (Butterworth) for the soft timbres, Q = 2 for the bright ones.
const SOFT_RESONANCE: f32 = 0.293;
const BRIGHT_RESONANCE: f32 = 0.75;

impl InstrumentKind {
    pub const ALL: [InstrumentKind; 4] = [
        InstrumentKind::Triangle,
        InstrumentKind::Sine,
        InstrumentKind::Square,
        InstrumentKind::Sawtooth,
    ];

    /// Resolve a settings id. Unknown ids fall back to [`InstrumentKind::Triangle`].
    pub fn from_id(id: &str) -> Self {
        match id.trim().to_ascii_lowercase().as_str() {
            "sine" => InstrumentKind::Sine,
            "square" => InstrumentKind::Square,
            "sawtooth" | "saw" => InstrumentKind::Sawtooth,
            _ => InstrumentKind::Triangle,
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            InstrumentKind::Triangle => "triangle",
            InstrumentKind::Sine => "sine",
            InstrumentKind::Square => "square",
            InstrumentKind::Sawtooth => "sawtooth",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            InstrumentKind::Triangle => "Soft Piano",
            InstrumentKind::Sine => "Pure Sub",
            InstrumentKind::Square => "Retro Game",
            InstrumentKind::Sawtooth => "Super Saw",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            InstrumentKind::Triangle => "Classic triangle wave",
            InstrumentKind::Sine => "Pure sine wave",
            InstrumentKind::Square => "8-bit square wave",
            InstrumentKind::Sawtooth => "Aggressive sawtooth wave",
        }
    }

    pub fn waveform(self) -> Waveform {
        match self {
            InstrumentKind::Triangle => Waveform::Triangle,
            InstrumentKind::Sine => Waveform::Sine,
            InstrumentKind::Square => Waveform::Square,
            InstrumentKind::Sawtooth => Waveform::Sawtooth,
        }
    }

    /// Square and sawtooth carry strong upper harmonics.
    pub fn is_harmonically_rich(self) -> bool {
        matches!(self, InstrumentKind::Square | InstrumentKind::Sawtooth)
    }

    pub fn timbre(self) -> Timbre {
        if self.is_harmonically_rich() {
            Timbre {
                waveform: self.waveform(),
                cutoff_hz: 3000.0,
                resonance: BRIGHT_RESONANCE,
                peak_gain: 0.3,
            }
        } else {
            Timbre {
                waveform: self.waveform(),
                cutoff_hz: 1500.0,
                resonance: SOFT_RESONANCE,
                peak_gain: 0.6,
            }
        }
    }
}

impl From<String> for InstrumentKind {
    fn from(id: String) -> Self {
        InstrumentKind::from_id(&id)
    }
}
