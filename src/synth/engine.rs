//! Control-thread voice engine.
//!
//! Owns the registry of sounding voices keyed by caller-chosen ids and turns
//! `play_tone` / `stop_tone` into timestamped commands for the audio thread.
//! Nothing here waits on audio: a stop removes the id at once while the tail
//! fades out on the renderer, and the freed report arrives later through
//! [`VoiceEngine::poll_cleanup`].

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use rtrb::{Consumer, Producer, RingBuffer};

use crate::{
    config::Settings,
    instrument::InstrumentKind,
    io::{clock::AudioClock, output::AudioOutput, CpalOutput, OfflineDriver, OfflineOutput},
    synth::{
        message::{SynthMessage, VoiceKey},
        poly::PolySynth,
    },
    Result,
};

/// Anything that can start and stop tones by voice id.
///
/// Input glue and melody playback only see this trait, so they can drive a
/// [`VoiceEngine`] or a test double.
pub trait ToneSink {
    fn play_tone(&mut self, frequency: f32, id: &str, instrument: InstrumentKind);
    fn stop_tone(&mut self, id: &str);
}

/// Registry entry for one sounding voice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveVoice {
    pub key: VoiceKey,
    pub frequency: f32,
    pub instrument: InstrumentKind,
    /// Audio-clock frame the voice started at
    pub started_at: u64,
}

struct Backend {
    tx: Producer<SynthMessage>,
    freed_rx: Consumer<VoiceKey>,
    clock: AudioClock,
    output: Box<dyn AudioOutput>,
}

pub struct VoiceEngine {
    settings: Settings,
    backend: Option<Backend>,
    voices: HashMap<String, ActiveVoice>,
    releasing: HashSet<VoiceKey>,
    /// Releases that didn't fit in the command ring; retried on every poll.
    pending_releases: Vec<VoiceKey>,
    next_key: VoiceKey,
}

impl VoiceEngine {
    /// Uninitialized engine. Every tone call is a no-op until [`init`](Self::init).
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            backend: None,
            voices: HashMap::new(),
            releasing: HashSet::new(),
            pending_releases: Vec::new(),
            next_key: 1,
        }
    }

    /// Acquire an audio backend. Replaces (and disposes) any previous one.
    pub fn init(&mut self, mut output: Box<dyn AudioOutput>) -> Result<()> {
        self.dispose();

        let sample_rate = output.sample_rate();
        let capacity = self.settings.output.command_capacity.max(1);
        let max_voices = self.settings.output.max_voices.max(1);

        let (tx, rx) = RingBuffer::new(capacity);
        // Room for every voice plus every in-flight release
        let (freed_tx, freed_rx) = RingBuffer::new(max_voices + capacity);
        let clock = AudioClock::new(sample_rate);

        let synth = PolySynth::new(max_voices, rx, freed_tx, clock.clone(), self.settings.envelope);
        output.start(synth)?;

        tracing::info!(sample_rate, max_voices, "voice engine initialized");
        self.backend = Some(Backend {
            tx,
            freed_rx,
            clock,
            output,
        });
        Ok(())
    }

    /// Open the default output device. On failure the engine stays silent
    /// and `false` is returned.
    pub fn init_default(&mut self) -> bool {
        let result = CpalOutput::open_default().and_then(|output| self.init(Box::new(output)));
        match result {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(%err, "audio backend unavailable, running silent");
                false
            }
        }
    }

    /// Headless backend at the configured offline sample rate. Audio only
    /// advances when the returned driver renders.
    pub fn init_offline(&mut self) -> Result<OfflineDriver> {
        let output = OfflineOutput::new(self.settings.output.offline_sample_rate);
        let driver = output.driver();
        self.init(Box::new(output))?;
        Ok(driver)
    }

    /// Release every voice, then hard-stop the backend.
    pub fn dispose(&mut self) {
        let voices = self.voices.len();
        self.stop_all();
        if let Some(mut backend) = self.backend.take() {
            backend.output.stop();
            tracing::info!(voices, "voice engine disposed");
        }
        self.voices.clear();
        self.releasing.clear();
        self.pending_releases.clear();
    }

    pub fn is_initialized(&self) -> bool {
        self.backend.is_some()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Start a tone under `id`, superseding whatever is already registered
    /// there. Non-positive frequencies and a missing backend are ignored.
    pub fn play_tone(&mut self, frequency: f32, id: &str, instrument: InstrumentKind) {
        if !(frequency.is_finite() && frequency > 0.0) {
            tracing::warn!(frequency, id, "ignoring tone with invalid frequency");
            return;
        }
        if self.backend.is_none() {
            tracing::debug!(id, "no audio backend, play_tone ignored");
            return;
        }

        self.poll_cleanup();
        if self.voices.contains_key(id) {
            self.stop_tone(id);
        }

        let key = self.next_key;
        self.next_key += 1;

        let Some(backend) = self.backend.as_mut() else {
            return;
        };
        let at = backend.clock.now_frames();
        let msg = SynthMessage::Start {
            key,
            frequency,
            instrument,
            at,
        };

        if backend.tx.push(msg).is_err() {
            tracing::warn!(id, "command queue full, tone dropped");
            return;
        }

        tracing::debug!(id, key, frequency, instrument = instrument.id(), at, "voice started");
        self.voices.insert(
            id.to_owned(),
            ActiveVoice {
                key,
                frequency,
                instrument,
                started_at: at,
            },
        );
    }

    /// Release the voice under `id`. The id is free again immediately; the
    /// sound fades out and is cleaned up on the audio clock. Unknown ids are
    /// a no-op.
    pub fn stop_tone(&mut self, id: &str) {
        let Some(voice) = self.voices.remove(id) else {
            return;
        };
        self.release(voice.key);
        tracing::debug!(id, key = voice.key, "voice released");
        self.poll_cleanup();
    }

    /// Release every registered voice. Each id is free at once, like
    /// [`stop_tone`](Self::stop_tone).
    pub fn stop_all(&mut self) {
        let keys: Vec<VoiceKey> = self.voices.drain().map(|(_, voice)| voice.key).collect();
        if !keys.is_empty() {
            tracing::debug!(voices = keys.len(), "releasing all voices");
        }
        for key in keys {
            self.release(key);
        }
    }

    /// Drain deferred cleanup reports from the audio thread and retry any
    /// queued releases. Returns the number of voices freed since the last poll.
    pub fn poll_cleanup(&mut self) -> usize {
        let Some(backend) = self.backend.as_mut() else {
            return 0;
        };

        let mut freed = 0;
        while let Ok(key) = backend.freed_rx.pop() {
            freed += 1;
            // A freed voice needs no release, queued or not
            self.pending_releases.retain(|&pending| pending != key);
            if self.releasing.remove(&key) {
                continue;
            }
            // Stolen by the renderer while still held
            self.voices.retain(|id, voice| {
                let stolen = voice.key == key;
                if stolen {
                    tracing::debug!(id = id.as_str(), key, "voice stolen");
                }
                !stolen
            });
        }

        if !self.pending_releases.is_empty() {
            let at = backend.clock.now_frames();
            let mut retry = std::mem::take(&mut self.pending_releases);
            retry.retain(|&key| backend.tx.push(SynthMessage::Release { key, at }).is_err());
            self.pending_releases = retry;
        }
        freed
    }

    fn release(&mut self, key: VoiceKey) {
        let Some(backend) = self.backend.as_mut() else {
            return;
        };
        let at = backend.clock.now_frames();
        self.releasing.insert(key);
        if backend.tx.push(SynthMessage::Release { key, at }).is_err() {
            tracing::warn!(key, "command queue full, release deferred");
            self.pending_releases.push(key);
        }
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.voices.contains_key(id)
    }

    pub fn voice(&self, id: &str) -> Option<&ActiveVoice> {
        self.voices.get(id)
    }

    /// Registered (not yet stopped) voices.
    pub fn active_count(&self) -> usize {
        self.voices.len()
    }

    /// Voices stopped but not yet freed by the renderer.
    pub fn releasing_count(&self) -> usize {
        self.releasing.len()
    }

    /// Current audio-clock time, zero without a backend.
    pub fn now(&self) -> Duration {
        self.backend
            .as_ref()
            .map_or(Duration::ZERO, |backend| backend.clock.now())
    }
}

impl ToneSink for VoiceEngine {
    fn play_tone(&mut self, frequency: f32, id: &str, instrument: InstrumentKind) {
        VoiceEngine::play_tone(self, frequency, id, instrument);
    }

    fn stop_tone(&mut self, id: &str) {
        VoiceEngine::stop_tone(self, id);
    }
}

impl Drop for VoiceEngine {
    fn drop(&mut self) {
        self.dispose();
    }
}
