use crate::{
    config::EnvelopeShape,
    dsp::{GainEnvelope, LowpassFilter, Oscillator, RenderCtx, Waveform},
    instrument::InstrumentKind,
    synth::message::VoiceKey,
};

/// Lifecycle of one voice: `Attacking -> Decaying -> Releasing -> Halted -> Free`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceStage {
    Free,      // Available for allocation
    Attacking, // Linear rise to peak
    Decaying,  // Exponential settle toward the sustain floor
    Releasing, // Fading out after a stop
    Halted,    // Oscillator stopped, waiting for cleanup
}

/// A single audio-thread voice: oscillator -> low-pass -> gain.
pub struct Voice {
    key: VoiceKey,
    frequency: f32,
    free: bool,

    oscillator: Oscillator,
    filter: LowpassFilter,
    gain: GainEnvelope,

    started_at: u64,
    attack_end: u64,
    released_at: Option<u64>,
    halt_at: Option<u64>,
    cleanup_at: Option<u64>,
}

impl Voice {
    pub fn new() -> Self {
        Self {
            key: 0,
            frequency: 0.0,
            free: true,
            oscillator: Oscillator::new(Waveform::Triangle),
            filter: LowpassFilter::new(20_000.0, 0.0),
            gain: GainEnvelope::new(),
            started_at: 0,
            attack_end: 0,
            released_at: None,
            halt_at: None,
            cleanup_at: None,
        }
    }

    /// Begin a fresh voice instance at frame `at`. Any previous state is
    /// discarded; nothing carries over from an earlier instance.
    pub fn start(
        &mut self,
        key: VoiceKey,
        frequency: f32,
        instrument: InstrumentKind,
        at: u64,
        shape: &EnvelopeShape,
        sample_rate: f32,
    ) {
        let timbre = instrument.timbre();

        self.key = key;
        self.frequency = frequency;
        self.free = false;

        self.oscillator.reset(timbre.waveform);
        self.filter.reset(timbre.cutoff_hz, timbre.resonance);

        self.started_at = at;
        self.attack_end = at + shape.attack_frames(sample_rate);
        self.released_at = None;
        self.halt_at = None;
        self.cleanup_at = None;

        let peak = timbre.peak_gain;
        self.gain.reset(0.0);
        self.gain.set_value_at(0.0, at);
        self.gain.linear_ramp_to(peak, self.attack_end);
        self.gain
            .exponential_ramp_to(peak * shape.sustain_ratio, at + shape.decay_frames(sample_rate));
    }

    /// Redirect the gain into the release ramp from whatever level it has at
    /// `at`. Ignored once the voice is already releasing.
    pub fn release(&mut self, at: u64, shape: &EnvelopeShape, sample_rate: f32) {
        if self.free || self.released_at.is_some() {
            return;
        }
        let at = at.max(self.started_at);

        self.gain.cancel_and_hold(at);
        self.gain
            .exponential_ramp_to(shape.release_floor, at + shape.release_frames(sample_rate));

        self.released_at = Some(at);
        self.halt_at = Some(at + shape.halt_frames(sample_rate));
        self.cleanup_at = Some(at + shape.cleanup_frames(sample_rate));
    }

    /// Render this voice into `out`, which must arrive zeroed. Frames before
    /// the start or after the halt stay silent.
    pub fn render(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        if self.free {
            return;
        }

        let len = out.len() as u64;
        let block_start = ctx.frame;
        let from = self.started_at.saturating_sub(block_start).min(len) as usize;
        let to = match self.halt_at {
            Some(halt) => halt.saturating_sub(block_start).min(len) as usize,
            None => len as usize,
        };
        if from >= to {
            return;
        }

        let voice_ctx = RenderCtx {
            frequency: self.frequency,
            frame: block_start + from as u64,
            ..*ctx
        };
        let active = &mut out[from..to];
        self.oscillator.render(active, &voice_ctx);
        self.filter.render(active, &voice_ctx);
        self.gain.apply(active, voice_ctx.frame);
    }

    pub fn stage_at(&self, frame: u64) -> VoiceStage {
        if self.free {
            return VoiceStage::Free;
        }
        if self.halt_at.is_some_and(|halt| frame >= halt) {
            return VoiceStage::Halted;
        }
        if self.released_at.is_some() {
            VoiceStage::Releasing
        } else if frame < self.attack_end {
            VoiceStage::Attacking
        } else {
            VoiceStage::Decaying
        }
    }

    /// True once the deferred cleanup point has passed by `frame`.
    pub fn cleanup_due(&self, frame: u64) -> bool {
        !self.free && self.cleanup_at.is_some_and(|at| frame >= at)
    }

    pub fn free(&mut self) {
        self.free = true;
        self.released_at = None;
        self.halt_at = None;
        self.cleanup_at = None;
        self.gain.reset(0.0);
    }

    pub fn is_free(&self) -> bool {
        self.free
    }

    pub fn is_releasing(&self) -> bool {
        !self.free && self.released_at.is_some()
    }

    pub fn key(&self) -> VoiceKey {
        self.key
    }

    /// Frame the voice started at (used as its age when stealing).
    pub fn age(&self) -> u64 {
        self.started_at
    }

    pub fn gain_at(&self, frame: u64) -> f32 {
        if self.free {
            0.0
        } else {
            self.gain.value_at(frame)
        }
    }
}

impl Default for Voice {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 48_000.0;

    fn started(instrument: InstrumentKind) -> Voice {
        let mut voice = Voice::new();
        voice.start(
            7,
            261.63,
            instrument,
            0,
            &EnvelopeShape::default(),
            SAMPLE_RATE,
        );
        voice
    }

    fn peak(voice: &mut Voice, frame: u64, len: usize) -> f32 {
        let mut buffer = vec![0.0f32; len];
        voice.render(&mut buffer, &RenderCtx::new(SAMPLE_RATE, 0.0, frame));
        buffer.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()))
    }

    #[test]
    fn stages_follow_timeline() {
        let shape = EnvelopeShape::default();
        let mut voice = started(InstrumentKind::Triangle);

        assert_eq!(voice.stage_at(0), VoiceStage::Attacking);
        assert_eq!(voice.stage_at(959), VoiceStage::Attacking);
        assert_eq!(voice.stage_at(960), VoiceStage::Decaying);
        assert_eq!(voice.stage_at(1_000_000), VoiceStage::Decaying);

        voice.release(4_800, &shape, SAMPLE_RATE);
        assert_eq!(voice.stage_at(4_800), VoiceStage::Releasing);
        assert_eq!(voice.stage_at(4_800 + 10_080), VoiceStage::Halted);
        assert!(!voice.cleanup_due(4_800 + 11_999));
        assert!(voice.cleanup_due(4_800 + 12_000));

        voice.free();
        assert_eq!(voice.stage_at(0), VoiceStage::Free);
    }

    #[test]
    fn peak_level_depends_on_instrument() {
        let soft = started(InstrumentKind::Sine);
        let bright = started(InstrumentKind::Square);
        assert!((soft.gain_at(960) - 0.6).abs() < 1e-6);
        assert!((bright.gain_at(960) - 0.3).abs() < 1e-6);
    }

    #[test]
    fn second_release_is_ignored() {
        let shape = EnvelopeShape::default();
        let mut voice = started(InstrumentKind::Triangle);

        voice.release(2_000, &shape, SAMPLE_RATE);
        voice.release(3_000, &shape, SAMPLE_RATE);
        assert!(voice.cleanup_due(2_000 + 12_000));
    }

    #[test]
    fn renders_sound_then_silence_after_halt() {
        let shape = EnvelopeShape::default();
        let mut voice = started(InstrumentKind::Triangle);

        assert!(peak(&mut voice, 0, 2_048) > 0.05);

        voice.release(2_048, &shape, SAMPLE_RATE);
        assert!(peak(&mut voice, 2_048, 512) > 0.05, "tail still audible");

        let halt = 2_048 + shape.halt_frames(SAMPLE_RATE);
        assert_eq!(peak(&mut voice, halt, 512), 0.0);
    }

    #[test]
    fn free_voice_is_silent() {
        let mut voice = Voice::new();
        assert!(voice.is_free());
        assert_eq!(peak(&mut voice, 0, 256), 0.0);
    }
}
