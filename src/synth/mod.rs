// Purpose: voice lifecycle, polyphony, control -> audio messaging
// The engine lives on the control thread; PolySynth renders on the audio thread.

pub mod engine;
pub mod message;
pub mod poly;
pub mod voice;

pub use engine::{ToneSink, VoiceEngine};
pub use message::{SynthMessage, VoiceKey};
pub use poly::PolySynth;
