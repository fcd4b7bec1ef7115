//! Audio output backends.
//!
//! [`CpalOutput`] drives a [`PolySynth`] from the default device callback.
//! [`OfflineOutput`] keeps the synth in memory and renders only when its
//! [`OfflineDriver`] is pulled, so tests and benches control the audio clock
//! frame by frame.

use std::sync::{Arc, Mutex, MutexGuard};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::{
    config::{ms_to_frames, MIN_SAMPLE_RATE},
    synth::PolySynth,
    Error, Result, MAX_BLOCK_SIZE,
};

/// Somewhere a [`PolySynth`] can be rendered to.
pub trait AudioOutput {
    /// Rate the synth must be built for. Known before `start`.
    fn sample_rate(&self) -> f32;

    /// Hand the synth over and begin pulling audio.
    fn start(&mut self, synth: PolySynth) -> Result<()>;

    /// Stop pulling audio and drop the synth.
    fn stop(&mut self);
}

/// Default system output device.
pub struct CpalOutput {
    device: cpal::Device,
    config: cpal::SupportedStreamConfig,
    stream: Option<cpal::Stream>,
}

impl CpalOutput {
    pub fn open_default() -> Result<Self> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(Error::NoOutputDevice)?;
        let config = device.default_output_config()?;

        tracing::info!(
            sample_rate = config.sample_rate().0,
            channels = config.channels(),
            "opened default output device"
        );

        Ok(Self {
            device,
            config,
            stream: None,
        })
    }

    pub fn channels(&self) -> usize {
        self.config.channels() as usize
    }
}

impl AudioOutput for CpalOutput {
    fn sample_rate(&self) -> f32 {
        self.config.sample_rate().0 as f32
    }

    fn start(&mut self, mut synth: PolySynth) -> Result<()> {
        let channels = self.channels().max(1);
        let mut render_buf = vec![0.0f32; MAX_BLOCK_SIZE];

        let stream = self.device.build_output_stream(
            &self.config.clone().into(),
            move |data: &mut [f32], _| {
                let total_frames = data.len() / channels;
                let mut frames_written = 0;

                while frames_written < total_frames {
                    let frames_to_render = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                    let block = &mut render_buf[..frames_to_render];
                    synth.render_block(block);

                    // Copy to output (mono to all channels)
                    let out_off = frames_written * channels;
                    for (i, &s) in block.iter().enumerate() {
                        let frame = out_off + i * channels;
                        data[frame..frame + channels].fill(s);
                    }

                    frames_written += frames_to_render;
                }
            },
            |err| tracing::error!(%err, "audio stream error"),
            None,
        )?;

        stream.play()?;
        self.stream = Some(stream);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(err) = stream.pause() {
                tracing::debug!(%err, "failed to pause output stream");
            }
        }
    }
}

/// In-memory output. Nothing renders until the driver asks for frames.
pub struct OfflineOutput {
    sample_rate: f32,
    synth: Arc<Mutex<Option<PolySynth>>>,
}

impl OfflineOutput {
    /// Rates below [`MIN_SAMPLE_RATE`] (or not finite) are raised to it.
    pub fn new(sample_rate: f32) -> Self {
        let sample_rate = if sample_rate.is_finite() {
            sample_rate.max(MIN_SAMPLE_RATE)
        } else {
            MIN_SAMPLE_RATE
        };
        Self {
            sample_rate,
            synth: Arc::new(Mutex::new(None)),
        }
    }

    /// Handle that renders the synth once the output has been started.
    pub fn driver(&self) -> OfflineDriver {
        OfflineDriver {
            sample_rate: self.sample_rate,
            synth: Arc::clone(&self.synth),
        }
    }
}

impl AudioOutput for OfflineOutput {
    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn start(&mut self, synth: PolySynth) -> Result<()> {
        *lock(&self.synth) = Some(synth);
        Ok(())
    }

    fn stop(&mut self) {
        lock(&self.synth).take();
    }
}

#[derive(Clone)]
pub struct OfflineDriver {
    sample_rate: f32,
    synth: Arc<Mutex<Option<PolySynth>>>,
}

impl OfflineDriver {
    /// Fill `out` with mono audio. Leaves silence (and the clock untouched)
    /// when the output is stopped.
    pub fn render(&self, out: &mut [f32]) {
        match lock(&self.synth).as_mut() {
            Some(synth) => synth.render(out),
            None => out.fill(0.0),
        }
    }

    /// Render `ms` of audio and return its peak level.
    pub fn advance_ms(&self, ms: f32) -> f32 {
        let mut buffer = vec![0.0f32; ms_to_frames(ms, self.sample_rate) as usize];
        self.render(&mut buffer);
        buffer.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()))
    }

    pub fn is_running(&self) -> bool {
        lock(&self.synth).is_some()
    }

    pub fn active_voices(&self) -> usize {
        lock(&self.synth).as_ref().map_or(0, PolySynth::active_voices)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
