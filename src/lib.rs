//! Polyphonic keyboard synthesizer engine.
//!
//! Physical key events resolve through the [`catalog`], expand into chord
//! voices via [`chord`], and sound through the [`synth::engine::VoiceEngine`],
//! whose envelopes are scheduled against the audio clock rather than the
//! caller's timers. [`player`] streams externally supplied melodies through
//! the same path.

pub mod catalog;
pub mod chord;
pub mod config;
pub mod dsp;
pub mod error;
pub mod instrument;
pub mod io;
pub mod keyboard;
pub mod melody;
pub mod player;
pub mod synth; // Voice management and polyphony

pub use error::{Error, Result};

pub const MAX_BLOCK_SIZE: usize = 2048;
