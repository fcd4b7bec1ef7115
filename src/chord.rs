//! Chord profiles and harmonic expansion.
//!
//! A chord profile is a set of semitone offsets from a root. Expanding a note
//! yields one voice per offset; the offset's position (its slot) is baked into
//! the voice id, so every harmonic of a held key can be released on its own.

use serde::Deserialize;

use crate::catalog::NoteDefinition;

/*
Intervals
=========

    f = f0 × 2^(n / 12)

  offset  interval          ratio
  ------  ----------------  ------
     0    unison (root)     1.0
     3    minor third       1.1892
     4    major third       1.2599
     6    diminished fifth  1.4142
     7    perfect fifth     1.4983

Offsets are applied in declared order; slot 0 is always the root.
*/

/// Named harmonization applied to every played key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(from = "String")]
pub enum ChordProfile {
    /// Root only, no harmonization (id `none`)
    #[default]
    Single,
    Major,
    Minor,
    Power,
    Diminished,
}

impl ChordProfile {
    pub const ALL: [ChordProfile; 5] = [
        ChordProfile::Single,
        ChordProfile::Major,
        ChordProfile::Minor,
        ChordProfile::Power,
        ChordProfile::Diminished,
    ];

    /// Resolve a settings id. Unknown ids fall back to [`ChordProfile::Single`].
    pub fn from_id(id: &str) -> Self {
        match id.trim().to_ascii_lowercase().as_str() {
            "major" => ChordProfile::Major,
            "minor" => ChordProfile::Minor,
            "power" => ChordProfile::Power,
            "diminished" => ChordProfile::Diminished,
            _ => ChordProfile::Single,
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            ChordProfile::Single => "none",
            ChordProfile::Major => "major",
            ChordProfile::Minor => "minor",
            ChordProfile::Power => "power",
            ChordProfile::Diminished => "diminished",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ChordProfile::Single => "Single Note",
            ChordProfile::Major => "Major Chord",
            ChordProfile::Minor => "Minor Chord",
            ChordProfile::Power => "Power Chord",
            ChordProfile::Diminished => "Diminished",
        }
    }

    /// Semitone offsets relative to the root, root first.
    pub fn offsets(self) -> &'static [i32] {
        match self {
            ChordProfile::Single => &[0],
            ChordProfile::Major => &[0, 4, 7],
            ChordProfile::Minor => &[0, 3, 7],
            ChordProfile::Power => &[0, 7],
            ChordProfile::Diminished => &[0, 3, 6],
        }
    }

    /// Number of simultaneous voices this profile produces.
    pub fn voice_count(self) -> usize {
        self.offsets().len()
    }
}

impl From<String> for ChordProfile {
    fn from(id: String) -> Self {
        ChordProfile::from_id(&id)
    }
}

/// Offsets for a raw profile id, `[0]` when the id is unrecognized.
pub fn offsets_for(id: &str) -> &'static [i32] {
    ChordProfile::from_id(id).offsets()
}

/// Frequency ratio of an interval in semitones.
#[inline]
pub fn interval_ratio(semitones: i32) -> f32 {
    2.0_f32.powf(semitones as f32 / 12.0)
}

/// One frequency per offset, in declared order. An offset of zero yields
/// `root` exactly.
pub fn chord_frequencies(root: f32, offsets: &[i32]) -> impl Iterator<Item = f32> + '_ {
    offsets.iter().map(move |&offset| {
        if offset == 0 {
            root
        } else {
            root * interval_ratio(offset)
        }
    })
}

/// Voice id for one harmonic slot of a note: `<name>_<slot>`.
pub fn voice_id(note_name: &str, slot: usize) -> String {
    format!("{note_name}_{slot}")
}

/// One harmonic of an expanded chord.
#[derive(Debug, Clone, PartialEq)]
pub struct ChordVoice {
    pub slot: usize,
    pub id: String,
    pub frequency: f32,
}

/// Expand a catalog note into its chord voices under `profile`.
pub fn expand(note: &NoteDefinition, profile: ChordProfile) -> Vec<ChordVoice> {
    chord_frequencies(note.frequency, profile.offsets())
        .enumerate()
        .map(|(slot, frequency)| ChordVoice {
            slot,
            id: voice_id(note.name, slot),
            frequency,
        })
        .collect()
}
