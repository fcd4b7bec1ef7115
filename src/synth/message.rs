use crate::instrument::InstrumentKind;

/// Identity of one voice instance on the audio side. Never reused, so a
/// retriggered id always maps to a fresh key.
pub type VoiceKey = u64;

/// Control -> audio thread command. `at` is an audio-clock frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SynthMessage {
    Start {
        key: VoiceKey,
        frequency: f32,
        instrument: InstrumentKind,
        at: u64,
    },
    Release {
        key: VoiceKey,
        at: u64,
    },
}
