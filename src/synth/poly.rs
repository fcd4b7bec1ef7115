use rtrb::{Consumer, Producer};

use crate::{
    config::EnvelopeShape,
    dsp::RenderCtx,
    io::clock::AudioClock,
    synth::{
        message::{SynthMessage, VoiceKey},
        voice::{Voice, VoiceStage},
    },
    MAX_BLOCK_SIZE,
};

/// Audio-thread half of the engine.
///
/// Owns a preallocated voice pool and drains control messages at the top of
/// every block. Voices whose cleanup point has passed are returned to the
/// pool and their keys reported back on `freed_tx`.
pub struct PolySynth {
    voices: Vec<Voice>,
    rx: Consumer<SynthMessage>,
    freed_tx: Producer<VoiceKey>,
    clock: AudioClock,
    shape: EnvelopeShape,
    temp_buffer: Vec<f32>,
    /// Stolen keys the freed ring had no room for
    unreported: Vec<VoiceKey>,
    frame_counter: u64,
}

impl PolySynth {
    pub fn new(
        max_voices: usize,
        rx: Consumer<SynthMessage>,
        freed_tx: Producer<VoiceKey>,
        clock: AudioClock,
        shape: EnvelopeShape,
    ) -> Self {
        let max_voices = max_voices.max(1);
        let voices = (0..max_voices).map(|_| Voice::new()).collect();
        let frame_counter = clock.now_frames();

        Self {
            voices,
            rx,
            freed_tx,
            clock,
            shape,
            temp_buffer: vec![0.0; MAX_BLOCK_SIZE],
            unreported: Vec::with_capacity(max_voices),
            frame_counter,
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.clock.sample_rate()
    }

    /// Render one block of at most `MAX_BLOCK_SIZE` mono frames.
    pub fn render_block(&mut self, out: &mut [f32]) {
        debug_assert!(out.len() <= MAX_BLOCK_SIZE);
        let sample_rate = self.clock.sample_rate();

        // Process control messages
        while let Ok(msg) = self.rx.pop() {
            match msg {
                SynthMessage::Start {
                    key,
                    frequency,
                    instrument,
                    at,
                } => {
                    let at = at.max(self.frame_counter);
                    let shape = self.shape;
                    let idx = self.allocate_voice();
                    let voice = &mut self.voices[idx];
                    if !voice.is_free() {
                        let stolen = voice.key();
                        voice.free();
                        if self.freed_tx.push(stolen).is_err() {
                            debug_assert!(self.unreported.len() < self.unreported.capacity());
                            if self.unreported.len() < self.unreported.capacity() {
                                self.unreported.push(stolen);
                            }
                        }
                    }
                    voice.start(key, frequency, instrument, at, &shape, sample_rate);
                }
                SynthMessage::Release { key, at } => {
                    let at = at.max(self.frame_counter);
                    let shape = self.shape;
                    if let Some(voice) = self.find_voice(key) {
                        voice.release(at, &shape, sample_rate);
                    }
                }
            }
        }

        // Mix voices
        out.fill(0.0);
        let ctx = RenderCtx::new(sample_rate, 0.0, self.frame_counter);
        for voice in &mut self.voices {
            if voice.is_free() {
                continue;
            }
            let temp = &mut self.temp_buffer[..out.len()];
            temp.fill(0.0);
            voice.render(temp, &ctx);

            for (o, v) in out.iter_mut().zip(temp.iter()) {
                *o += v;
            }
        }
        for sample in out.iter_mut() {
            *sample = soft_clip(*sample);
        }

        self.frame_counter += out.len() as u64;

        // Steals that couldn't be reported when they happened
        if !self.unreported.is_empty() {
            let freed_tx = &mut self.freed_tx;
            self.unreported.retain(|&key| freed_tx.push(key).is_err());
        }

        // Deferred cleanup. A key that can't be reported stays allocated and
        // is retried next block.
        for voice in &mut self.voices {
            if voice.cleanup_due(self.frame_counter) && self.freed_tx.push(voice.key()).is_ok() {
                voice.free();
            }
        }

        self.clock.advance(out.len() as u64);
    }

    /// Render an arbitrarily long buffer in `MAX_BLOCK_SIZE` chunks.
    pub fn render(&mut self, out: &mut [f32]) {
        for chunk in out.chunks_mut(MAX_BLOCK_SIZE) {
            self.render_block(chunk);
        }
    }

    pub fn active_voices(&self) -> usize {
        self.voices.iter().filter(|v| !v.is_free()).count()
    }

    pub fn stage_of(&self, key: VoiceKey) -> Option<VoiceStage> {
        self.voices
            .iter()
            .find(|v| !v.is_free() && v.key() == key)
            .map(|v| v.stage_at(self.frame_counter))
    }

    fn allocate_voice(&self) -> usize {
        // First pass: free voice
        if let Some(idx) = self.voices.iter().position(|v| v.is_free()) {
            return idx;
        }

        // Second pass: steal oldest releasing voice
        let releasing = self
            .voices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_releasing())
            .min_by_key(|(_, v)| v.age())
            .map(|(idx, _)| idx);

        // Last resort: oldest voice overall
        releasing.unwrap_or_else(|| {
            self.voices
                .iter()
                .enumerate()
                .min_by_key(|(_, v)| v.age())
                .map(|(idx, _)| idx)
                .unwrap_or(0)
        })
    }

    fn find_voice(&mut self, key: VoiceKey) -> Option<&mut Voice> {
        self.voices
            .iter_mut()
            .find(|v| !v.is_free() && v.key() == key)
    }
}

#[inline]
fn soft_clip(x: f32) -> f32 {
    x.tanh()
}
