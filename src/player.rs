//! Sequential melody playback.
//!
//! [`MelodyPlayer::play`] walks a melody one note at a time, root slot only,
//! suspending on a cancellable delay between steps. Cancellation is checked
//! before every note, and the note sounding at that moment is stopped by a
//! guard so nothing keeps sustaining after the task ends, even when the task
//! itself is dropped.

use std::cell::{Cell, RefCell};
use std::time::Duration;

use tokio::sync::watch;

use crate::{
    catalog,
    chord::voice_id,
    config::MelodySettings,
    instrument::InstrumentKind,
    melody::Melody,
    synth::ToneSink,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Finished,
    Cancelled,
}

/// Host side of a cancellation pair.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Re-arm for the next playback.
    pub fn reset(&self) {
        self.tx.send_replace(false);
    }

    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }
}

/// Playback side of a cancellation pair.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancelled. Never resolves if the handle is gone.
    pub async fn cancelled(&mut self) {
        let closed = self.rx.wait_for(|cancelled| *cancelled).await.is_err();
        if closed {
            std::future::pending::<()>().await;
        }
    }
}

pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}

/// Sleep for `duration` unless cancelled first. True when the full time elapsed.
async fn pause(duration: Duration, cancel: &mut CancelToken) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(duration) => true,
        _ = cancel.cancelled() => false,
    }
}

pub struct MelodyPlayer {
    gap: Duration,
    default_note_ms: u32,
    ai_note: Cell<Option<&'static str>>,
    playing: Cell<bool>,
}

impl MelodyPlayer {
    pub fn new(settings: &MelodySettings) -> Self {
        Self {
            gap: settings.gap(),
            default_note_ms: settings.default_note_ms,
            ai_note: Cell::new(None),
            playing: Cell::new(false),
        }
    }

    /// Note currently sounded by playback, for key lighting.
    pub fn ai_note(&self) -> Option<&'static str> {
        self.ai_note.get()
    }

    pub fn is_playing(&self) -> bool {
        self.playing.get()
    }

    /// Play `melody` through `sink`, ignoring any chord profile. Returns
    /// once, after the last note's trailing gap or at cancellation.
    pub async fn play<S: ToneSink>(
        &self,
        melody: &Melody,
        instrument: InstrumentKind,
        sink: &RefCell<S>,
        cancel: &mut CancelToken,
    ) -> PlaybackOutcome {
        let _playing = PlayingFlag::set(&self.playing);
        tracing::info!(title = melody.title.as_str(), notes = melody.notes.len(), "melody started");

        for step in &melody.notes {
            if cancel.is_cancelled() {
                return self.cancelled(melody);
            }

            let Some(note) = catalog::find_by_name(&step.note) else {
                tracing::warn!(note = step.note.as_str(), "skipping unknown melody note");
                continue;
            };
            let duration = Duration::from_millis(step.duration_ms(self.default_note_ms));

            let sounding = SoundingNote::start(sink, note, instrument, &self.ai_note);
            let held = pause(duration, cancel).await;
            drop(sounding);

            if !held || !pause(self.gap, cancel).await {
                return self.cancelled(melody);
            }
        }

        tracing::info!(title = melody.title.as_str(), "melody finished");
        PlaybackOutcome::Finished
    }

    fn cancelled(&self, melody: &Melody) -> PlaybackOutcome {
        tracing::info!(title = melody.title.as_str(), "melody cancelled");
        PlaybackOutcome::Cancelled
    }
}

impl Default for MelodyPlayer {
    fn default() -> Self {
        Self::new(&MelodySettings::default())
    }
}

/// Root voice of the current melody step. Stops it on drop.
struct SoundingNote<'a, S: ToneSink> {
    sink: &'a RefCell<S>,
    id: String,
    ai_note: &'a Cell<Option<&'static str>>,
}

impl<'a, S: ToneSink> SoundingNote<'a, S> {
    fn start(
        sink: &'a RefCell<S>,
        note: &'static catalog::NoteDefinition,
        instrument: InstrumentKind,
        ai_note: &'a Cell<Option<&'static str>>,
    ) -> Self {
        let id = voice_id(note.name, 0);
        ai_note.set(Some(note.name));
        sink.borrow_mut().play_tone(note.frequency, &id, instrument);
        Self { sink, id, ai_note }
    }
}

impl<S: ToneSink> Drop for SoundingNote<'_, S> {
    fn drop(&mut self) {
        self.ai_note.set(None);
        match self.sink.try_borrow_mut() {
            Ok(mut sink) => sink.stop_tone(&self.id),
            Err(_) => tracing::warn!(id = self.id.as_str(), "sink busy, melody note not stopped"),
        }
    }
}

struct PlayingFlag<'a>(&'a Cell<bool>);

impl<'a> PlayingFlag<'a> {
    fn set(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for PlayingFlag<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}
