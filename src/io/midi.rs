//! Channel-voice note decoding.
//!
//! A raw buffer holds one or more concatenated MIDI messages. Only Note On
//! (`0x9n`) and Note Off (`0x8n`) produce events; every other message is
//! skipped. Framing is left to `midly`'s live stream parser, which keeps
//! running status and lets realtime bytes sit anywhere, even between the
//! data bytes of a note.

use midly::live::LiveEvent;
use midly::stream::MidiStream;
use midly::MidiMessage;

/// A decoded note message. Pitch and velocity are always in `0..=127`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteEvent {
    NoteOn { pitch: u8, velocity: u8 },
    NoteOff { pitch: u8 },
}

impl NoteEvent {
    pub fn pitch(&self) -> u8 {
        match *self {
            NoteEvent::NoteOn { pitch, .. } | NoteEvent::NoteOff { pitch } => pitch,
        }
    }

    /// Map a parsed live event onto a note event. A Note On with velocity 0
    /// is a Note Off.
    pub fn from_live(event: &LiveEvent<'_>) -> Option<Self> {
        let LiveEvent::Midi { message, .. } = event else {
            return None;
        };
        match *message {
            MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => Some(NoteEvent::NoteOn {
                pitch: key.as_int(),
                velocity: vel.as_int(),
            }),
            MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                Some(NoteEvent::NoteOff { pitch: key.as_int() })
            }
            _ => None,
        }
    }
}

/// Lazy iterator over the note events in one buffer, in buffer order.
///
/// Bytes are fed to the stream parser one at a time, so nothing past the
/// returned event is parsed yet. A message still incomplete at the end of
/// the buffer is dropped with the decoder; nothing survives between buffers.
pub struct PacketDecoder<'a> {
    bytes: std::slice::Iter<'a, u8>,
    stream: MidiStream,
}

impl<'a> PacketDecoder<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes: bytes.iter(),
            stream: MidiStream::new(),
        }
    }
}

impl Iterator for PacketDecoder<'_> {
    type Item = NoteEvent;

    fn next(&mut self) -> Option<NoteEvent> {
        for &byte in self.bytes.by_ref() {
            // One byte completes at most one channel message
            let mut note = None;
            self.stream.feed(&[byte], |event| {
                if let Some(event) = NoteEvent::from_live(&event) {
                    note = Some(event);
                }
            });
            if note.is_some() {
                return note;
            }
        }

        None
    }
}

/// Decode every note event in `bytes`.
pub fn decode(bytes: &[u8]) -> PacketDecoder<'_> {
    PacketDecoder::new(bytes)
}
