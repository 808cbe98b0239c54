use midly::live::LiveEvent;
use midly::num::{u4, u7};
use midly::MidiMessage;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Release velocity sent with every outgoing Note Off.
pub const NOTE_OFF_VELOCITY: u8 = 64;

pub fn midi_note_to_freq(note: u8) -> f32 {
    440.0 * 2.0_f32.powf((note as f32 - 69.0) / 12.0)
}

/// Standard 12-tone name with octave `pitch / 12 - 1` (60 = "C4").
pub fn note_name(pitch: u8) -> String {
    let octave = (pitch / 12) as i32 - 1;
    format!("{}{}", NOTE_NAMES[(pitch % 12) as usize], octave)
}

/// Pitch class name without the octave ("C#").
pub fn pitch_class_name(pitch: u8) -> &'static str {
    NOTE_NAMES[(pitch % 12) as usize]
}

/// Encode a Note On. `None` if the pitch or velocity is not a 7-bit value.
pub fn note_on_message(channel: u8, pitch: u8, velocity: u8) -> Option<Vec<u8>> {
    let message = MidiMessage::NoteOn {
        key: u7::try_from(pitch)?,
        vel: u7::try_from(velocity)?,
    };
    encode(channel, message)
}

/// Encode a Note Off with the standard release velocity.
pub fn note_off_message(channel: u8, pitch: u8) -> Option<Vec<u8>> {
    let message = MidiMessage::NoteOff {
        key: u7::try_from(pitch)?,
        vel: u7::new(NOTE_OFF_VELOCITY),
    };
    encode(channel, message)
}

// Channels past 15 clamp to the last one
fn encode(channel: u8, message: MidiMessage) -> Option<Vec<u8>> {
    let event = LiveEvent::Midi {
        channel: u4::try_from(channel.min(15))?,
        message,
    };
    let mut bytes = Vec::with_capacity(3);
    event.write_std(&mut bytes).ok()?;
    Some(bytes)
}
