//! Externally supplied melodies.
//!
//! A melody is plain JSON:
//!
//! ```json
//! { "title": "Morning", "description": "bright",
//!   "notes": [ { "note": "C4", "duration": 300 }, { "note": "E4" } ] }
//! ```
//!
//! Generation is someone else's job. [`MelodySource`] is the seam; any
//! failure on that side turns into "no melody" rather than an error.

use std::fmt::Display;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::{catalog, Result};

/// Note count a generator is asked for.
pub const MELODY_NOTE_COUNT: RangeInclusive<usize> = 8..=12;

/// MIDI range a generator is asked to stay in (C4..E5).
pub const MELODY_RANGE: RangeInclusive<u8> = 60..=76;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MelodyNote {
    /// Catalog note name, e.g. "D#4"
    pub note: String,
    /// Milliseconds. Missing, zero or negative means the default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

impl MelodyNote {
    pub fn new(note: impl Into<String>, duration: Option<f64>) -> Self {
        Self {
            note: note.into(),
            duration,
        }
    }

    pub fn duration_ms(&self, default_ms: u32) -> u64 {
        match self.duration {
            Some(ms) if ms.is_finite() && ms > 0.0 => ms.round() as u64,
            _ => u64::from(default_ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Melody {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub notes: Vec<MelodyNote>,
}

impl Melody {
    /// True when the melody matches what generators are asked for: a note
    /// count in [`MELODY_NOTE_COUNT`], every note known and inside
    /// [`MELODY_RANGE`].
    pub fn within_range(&self) -> bool {
        MELODY_NOTE_COUNT.contains(&self.notes.len())
            && self.notes.iter().all(|n| {
                catalog::find_by_name(&n.note).is_some_and(|def| MELODY_RANGE.contains(&def.midi_note))
            })
    }

    /// Notes with no catalog entry. Playback skips these.
    pub fn unknown_notes(&self) -> impl Iterator<Item = &str> {
        self.notes
            .iter()
            .map(|n| n.note.as_str())
            .filter(|name| catalog::find_by_name(name).is_none())
    }
}

pub fn parse_melody(text: &str) -> Result<Melody> {
    Ok(serde_json::from_str(text)?)
}

/// Request text for a generator given a mood descriptor.
pub fn melody_prompt(mood: &str) -> String {
    format!(
        "Generate a simple, short piano melody (sequence of notes) that feels \"{mood}\". \
         Limit to {}-{} notes. Use standard note names like \"C4\", \"D#4\", etc. \
         that are within the range C4 to E5. Reply with JSON: \
         {{\"title\": string, \"description\": string, \
         \"notes\": [{{\"note\": string, \"duration\": milliseconds}}]}}.",
        MELODY_NOTE_COUNT.start(),
        MELODY_NOTE_COUNT.end(),
    )
}

/// Produces melodies for a mood. `None` means nothing to play.
pub trait MelodySource {
    fn generate(&self, mood: &str) -> Option<Melody>;
}

/// Source backed by any text-producing fetch (remote service, file, fixture).
pub struct JsonMelodySource<F> {
    fetch: F,
}

impl<F, E> JsonMelodySource<F>
where
    F: Fn(&str) -> std::result::Result<String, E>,
    E: Display,
{
    /// `fetch` receives the prompt and returns the raw JSON reply.
    pub fn new(fetch: F) -> Self {
        Self { fetch }
    }
}

impl<F, E> MelodySource for JsonMelodySource<F>
where
    F: Fn(&str) -> std::result::Result<String, E>,
    E: Display,
{
    fn generate(&self, mood: &str) -> Option<Melody> {
        let text = match (self.fetch)(&melody_prompt(mood)) {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                tracing::warn!(mood, "melody source returned nothing");
                return None;
            }
            Err(err) => {
                tracing::warn!(mood, %err, "melody source failed");
                return None;
            }
        };

        match parse_melody(&text) {
            Ok(melody) => Some(melody),
            Err(err) => {
                tracing::warn!(mood, %err, "melody source returned malformed melody");
                None
            }
        }
    }
}
