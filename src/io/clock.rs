//! The audio clock.
//!
//! Counts frames handed to the output device. Only the renderer advances it;
//! the control side reads it to timestamp commands, so every ramp and stop is
//! placed on the same timeline the samples are produced on.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AudioClock {
    frames: Arc<AtomicU64>,
    sample_rate: f32,
}

impl AudioClock {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            frames: Arc::new(AtomicU64::new(0)),
            sample_rate,
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Frames rendered so far.
    #[inline]
    pub fn now_frames(&self) -> u64 {
        self.frames.load(Ordering::Acquire)
    }

    /// Audio time since the output started.
    pub fn now(&self) -> Duration {
        let secs = self.now_frames() as f64 / self.sample_rate as f64;
        if secs.is_finite() {
            Duration::from_secs_f64(secs)
        } else {
            Duration::ZERO
        }
    }

    #[inline]
    pub(crate) fn advance(&self, frames: u64) {
        self.frames.fetch_add(frames, Ordering::Release);
    }
}
