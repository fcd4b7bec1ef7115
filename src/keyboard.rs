//! Key events -> chord voices.
//!
//! Resolves physical key events through the catalog, expands them with the
//! selected chord profile and drives a [`ToneSink`]. Also tracks which notes
//! are held so a rendering layer can light them.

use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use crate::{
    catalog::{self, NoteDefinition},
    chord::{self, ChordProfile},
    instrument::InstrumentKind,
    synth::ToneSink,
};

/// A key-down or key-up event from the input source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyInput<'a> {
    /// Layout-independent physical key code, e.g. "KeyQ"
    pub code: Option<&'a str>,
    /// Character the key produced
    pub ch: Option<char>,
    /// Auto-repeat from a held key
    pub repeat: bool,
}

impl<'a> KeyInput<'a> {
    pub fn code(code: &'a str) -> Self {
        Self {
            code: Some(code),
            ..Self::default()
        }
    }

    pub fn char(ch: char) -> Self {
        Self {
            ch: Some(ch),
            ..Self::default()
        }
    }

    pub fn repeated(self) -> Self {
        Self {
            repeat: true,
            ..self
        }
    }

    /// Physical code first, produced character as fallback.
    pub fn resolve(&self) -> Option<&'static NoteDefinition> {
        self.code
            .and_then(catalog::find_by_input_code)
            .or_else(|| self.ch.and_then(catalog::find_by_input_char))
    }
}

/// Longest gap between auto-repeated presses, initial delay included.
pub const AUTO_REPEAT_WINDOW: Duration = Duration::from_millis(700);

/// Separates auto-repeat from fresh presses for input sources that report
/// neither releases nor repeats. A press of a note within `window` of its
/// previous press counts as a repeat, and every repeat extends the window.
#[derive(Debug, Clone)]
pub struct PressRepeatGuard {
    window: Duration,
    last_press: HashMap<&'static str, Instant>,
}

impl PressRepeatGuard {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_press: HashMap::new(),
        }
    }

    /// Record a press of `note` at `now`; true when it is auto-repeat.
    pub fn is_repeat(&mut self, note: &'static str, now: Instant) -> bool {
        self.last_press
            .insert(note, now)
            .is_some_and(|last| now.saturating_duration_since(last) < self.window)
    }
}

impl Default for PressRepeatGuard {
    fn default() -> Self {
        Self::new(AUTO_REPEAT_WINDOW)
    }
}

/// Lit state of one key for the rendering layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyLight {
    /// Held through keyboard or pointer
    pub active: bool,
    /// Currently sounded by melody playback
    pub ai_playing: bool,
}

#[derive(Debug, Default)]
pub struct Keyboard {
    instrument: InstrumentKind,
    chord: ChordProfile,
    /// Held notes and the voice ids each one started
    held: BTreeMap<&'static str, Vec<String>>,
}

impl Keyboard {
    pub fn new(instrument: InstrumentKind, chord: ChordProfile) -> Self {
        Self {
            instrument,
            chord,
            held: BTreeMap::new(),
        }
    }

    pub fn instrument(&self) -> InstrumentKind {
        self.instrument
    }

    pub fn set_instrument(&mut self, instrument: InstrumentKind) {
        self.instrument = instrument;
    }

    pub fn chord(&self) -> ChordProfile {
        self.chord
    }

    pub fn set_chord(&mut self, chord: ChordProfile) {
        self.chord = chord;
    }

    /// Returns the note that started, if any. Repeats, unmapped keys and
    /// notes already held produce nothing.
    pub fn key_down<S: ToneSink + ?Sized>(
        &mut self,
        input: KeyInput<'_>,
        sink: &mut S,
    ) -> Option<&'static NoteDefinition> {
        if input.repeat {
            return None;
        }
        let note = input.resolve()?;
        self.start_note(note, sink).then_some(note)
    }

    pub fn key_up<S: ToneSink + ?Sized>(
        &mut self,
        input: KeyInput<'_>,
        sink: &mut S,
    ) -> Option<&'static NoteDefinition> {
        let note = input.resolve()?;
        self.stop_note(note, sink).then_some(note)
    }

    /// Start every chord slot of `note`. Pointer input enters here directly.
    pub fn start_note<S: ToneSink + ?Sized>(&mut self, note: &'static NoteDefinition, sink: &mut S) -> bool {
        if self.held.contains_key(note.name) {
            return false;
        }

        let voices = chord::expand(note, self.chord);
        for voice in &voices {
            sink.play_tone(voice.frequency, &voice.id, self.instrument);
        }
        tracing::debug!(note = note.name, chord = self.chord.id(), voices = voices.len(), "note on");

        self.held
            .insert(note.name, voices.into_iter().map(|voice| voice.id).collect());
        true
    }

    /// Stop every slot `note` started, whatever the chord profile is now.
    pub fn stop_note<S: ToneSink + ?Sized>(&mut self, note: &NoteDefinition, sink: &mut S) -> bool {
        let Some(ids) = self.held.remove(note.name) else {
            return false;
        };
        for id in &ids {
            sink.stop_tone(id);
        }
        tracing::debug!(note = note.name, "note off");
        true
    }

    /// Release everything held, e.g. when input focus is lost.
    pub fn release_all<S: ToneSink + ?Sized>(&mut self, sink: &mut S) {
        for (_, ids) in std::mem::take(&mut self.held) {
            for id in &ids {
                sink.stop_tone(id);
            }
        }
    }

    pub fn is_held(&self, name: &str) -> bool {
        self.held.contains_key(name)
    }

    pub fn light(&self, name: &str, ai_note: Option<&str>) -> KeyLight {
        KeyLight {
            active: self.is_held(name),
            ai_playing: ai_note == Some(name),
        }
    }

    /// Lights for the whole catalog, in pitch order.
    pub fn lights<'a>(
        &'a self,
        ai_note: Option<&'a str>,
    ) -> impl Iterator<Item = (&'static NoteDefinition, KeyLight)> + 'a {
        catalog::keys()
            .iter()
            .map(move |note| (note, self.light(note.name, ai_note)))
    }
}
