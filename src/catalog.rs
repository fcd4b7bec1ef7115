/*
Note Catalog
============

The catalog is the fixed keyboard: seventeen equal-tempered notes from C4 to
E5, each bound to one physical key. It is built at compile time and never
changes.

Input Mapping
-------------

Keys are laid out for an AZERTY keyboard. The home row carries the naturals,
the row above carries the accidentals, so the physical shape mirrors a piano:

    Z   E       T   Y   U       O   P          (accidentals)
  Q   S   D   F   G   H   J   K   L   M        (naturals)
  C4  D4  E4  F4  G4  A4  B4  C5  D5  E5

Two identifiers exist per key:

  input code   Layout-independent physical position ("KeyQ"). Tried first,
               so the keyboard shape survives a QWERTY remap.
  input char   The character the key produces ('Q'). Fallback when the host
               cannot report physical positions. Compared case-insensitively.

Frequencies
-----------

Values are the usual two-decimal equal-temperament table, i.e. within a
hundredth of a hertz of

    f = 440 × 2^((n - 69) / 12)      n = MIDI note number

C4 is MIDI 60, A4 (440 Hz) is MIDI 69.
*/

/// Visual/input-routing category of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCategory {
    /// White key (C, D, E, F, G, A, B)
    Natural,
    /// Black key (sharps)
    Accidental,
}

/// One immutable entry of the note catalog.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteDefinition {
    /// Canonical note name, e.g. "C4", "C#4"
    pub name: &'static str,
    /// Equal-tempered frequency in Hz
    pub frequency: f32,
    /// MIDI note number (C4 = 60)
    pub midi_note: u8,
    pub category: KeyCategory,
    /// Character printed on the physical key
    pub input_char: char,
    /// Layout-independent physical key code
    pub input_code: &'static str,
}

const fn key(
    name: &'static str,
    frequency: f32,
    midi_note: u8,
    category: KeyCategory,
    input_char: char,
    input_code: &'static str,
) -> NoteDefinition {
    NoteDefinition {
        name,
        frequency,
        midi_note,
        category,
        input_char,
        input_code,
    }
}

use KeyCategory::{Accidental, Natural};

/// The catalog, ordered by ascending pitch.
pub static PIANO_KEYS: [NoteDefinition; 17] = [
    key("C4", 261.63, 60, Natural, 'Q', "KeyQ"),
    key("C#4", 277.18, 61, Accidental, 'Z', "KeyZ"),
    key("D4", 293.66, 62, Natural, 'S', "KeyS"),
    key("D#4", 311.13, 63, Accidental, 'E', "KeyE"),
    key("E4", 329.63, 64, Natural, 'D', "KeyD"),
    key("F4", 349.23, 65, Natural, 'F', "KeyF"),
    key("F#4", 369.99, 66, Accidental, 'T', "KeyT"),
    key("G4", 392.00, 67, Natural, 'G', "KeyG"),
    key("G#4", 415.30, 68, Accidental, 'Y', "KeyY"),
    key("A4", 440.00, 69, Natural, 'H', "KeyH"),
    key("A#4", 466.16, 70, Accidental, 'U', "KeyU"),
    key("B4", 493.88, 71, Natural, 'J', "KeyJ"),
    key("C5", 523.25, 72, Natural, 'K', "KeyK"),
    key("C#5", 554.37, 73, Accidental, 'O', "KeyO"),
    key("D5", 587.33, 74, Natural, 'L', "KeyL"),
    key("D#5", 622.25, 75, Accidental, 'P', "KeyP"),
    key("E5", 659.25, 76, Natural, 'M', "KeyM"),
];

/// All catalog entries in ascending pitch order.
pub fn keys() -> &'static [NoteDefinition] {
    &PIANO_KEYS
}

/// Exact match on the physical key code.
pub fn find_by_input_code(code: &str) -> Option<&'static NoteDefinition> {
    PIANO_KEYS.iter().find(|k| k.input_code == code)
}

/// Case-insensitive match on the produced character.
pub fn find_by_input_char(ch: char) -> Option<&'static NoteDefinition> {
    PIANO_KEYS
        .iter()
        .find(|k| k.input_char.to_lowercase().eq(ch.to_lowercase()))
}

/// Exact match on the note name (used by melody playback).
pub fn find_by_name(name: &str) -> Option<&'static NoteDefinition> {
    PIANO_KEYS.iter().find(|k| k.name == name)
}

/// Convert MIDI note number to frequency in Hz.
/// A4 = 440 Hz = MIDI note 69
#[inline]
pub fn midi_note_to_freq(note: u8) -> f32 {
    440.0 * 2.0_f32.powf((note as f32 - 69.0) / 12.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn frequencies_match_equal_temperament() {
        for k in keys() {
            let expected = midi_note_to_freq(k.midi_note);
            assert!(
                (k.frequency - expected).abs() < 0.01,
                "{}: expected {expected}, got {}",
                k.name,
                k.frequency
            );
        }
    }

    #[test]
    fn ordered_by_ascending_pitch() {
        for pair in keys().windows(2) {
            assert!(pair[0].frequency < pair[1].frequency);
            assert_eq!(pair[1].midi_note, pair[0].midi_note + 1);
        }
    }

    #[test]
    fn identifiers_are_unique() {
        let names: HashSet<_> = keys().iter().map(|k| k.name).collect();
        let codes: HashSet<_> = keys().iter().map(|k| k.input_code).collect();
        let chars: HashSet<_> = keys().iter().map(|k| k.input_char).collect();
        assert_eq!(names.len(), keys().len());
        assert_eq!(codes.len(), keys().len());
        assert_eq!(chars.len(), keys().len());
    }

    #[test]
    fn accidentals_are_sharps() {
        for k in keys() {
            assert_eq!(k.category == Accidental, k.name.contains('#'), "{}", k.name);
        }
    }

    #[test]
    fn lookup_by_code() {
        assert_eq!(find_by_input_code("KeyQ").map(|k| k.name), Some("C4"));
        assert_eq!(find_by_input_code("KeyM").map(|k| k.name), Some("E5"));
        assert!(find_by_input_code("KeyA").is_none());
        assert!(find_by_input_code("keyq").is_none());
    }

    #[test]
    fn lookup_by_char_ignores_case() {
        assert_eq!(find_by_input_char('q').map(|k| k.name), Some("C4"));
        assert_eq!(find_by_input_char('Q').map(|k| k.name), Some("C4"));
        assert_eq!(find_by_input_char('z').map(|k| k.name), Some("C#4"));
        assert!(find_by_input_char('a').is_none());
        assert!(find_by_input_char('1').is_none());
    }

    #[test]
    fn lookup_by_name() {
        let a4 = find_by_name("A4").expect("A4 in catalog");
        assert_eq!(a4.frequency, 440.0);
        assert_eq!(a4.midi_note, 69);
        assert!(find_by_name("F5").is_none());
        assert!(find_by_name("c4").is_none());
    }
}
