#![allow(non_upper_case_globals)]
/*
On-screen Keyboard Notes
========================

The on-screen keyboard spans one octave, C4 (MIDI 60, middle C) to B4
(MIDI 71). Incoming MIDI may use the full 0-127 range; only the keyboard
and the bars view are limited to this octave.

The MIDI formula: note_number = 12 * (octave + 1) + semitone
Where semitone: C=0, C#=1, D=2, D#=3, E=4, F=5, F#=6, G=7, G#=8, A=9, A#=10, B=11

  ┌──┬─┬─┬─┬──┬──┬─┬─┬─┬─┬─┬──┐
  │  │C│ │D│  │  │F│ │G│ │A│  │
  │  │#│ │#│  │  │#│ │#│ │#│  │
  │  └┬┘ └┬┘  │  └┬┘ └┬┘ └┬┘  │
  │ C │ D │ E │ F │ G │ A │ B │
  └───┴───┴───┴───┴───┴───┴───┘
*/

use std::ops::RangeInclusive;

pub const C4: u8 = 60;
pub const Cs4: u8 = 61;
pub const D4: u8 = 62;
pub const Ds4: u8 = 63;
pub const E4: u8 = 64;
pub const F4: u8 = 65;
pub const Fs4: u8 = 66;
pub const G4: u8 = 67;
pub const Gs4: u8 = 68;
pub const A4: u8 = 69; // A440 tuning reference
pub const As4: u8 = 70;
pub const B4: u8 = 71;

/// Pitches covered by the on-screen keyboard and the bars view.
pub const KEYBOARD_RANGE: RangeInclusive<u8> = C4..=B4;

pub const WHITE_KEYS: [u8; 7] = [C4, D4, E4, F4, G4, A4, B4];

/// Black keys with their position measured in white-key widths from the
/// left edge of the keyboard.
pub const BLACK_KEYS: [(u8, f32); 5] = [
    (Cs4, 1.0),
    (Ds4, 2.0),
    (Fs4, 4.0),
    (Gs4, 5.0),
    (As4, 6.0),
];

pub fn is_black_key(pitch: u8) -> bool {
    matches!(pitch % 12, 1 | 3 | 6 | 8 | 10)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyboard_covers_one_chromatic_octave() {
        assert_eq!(KEYBOARD_RANGE.count(), 12);
        assert_eq!(WHITE_KEYS.len() + BLACK_KEYS.len(), 12);
    }

    #[test]
    fn black_keys_are_sharps() {
        for (pitch, _) in BLACK_KEYS {
            assert!(is_black_key(pitch));
        }
        for pitch in WHITE_KEYS {
            assert!(!is_black_key(pitch));
        }
    }
}
