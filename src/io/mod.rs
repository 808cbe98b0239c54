// Purpose - external interfaces, format conversions

pub mod converter;
pub mod midi;
pub mod port;

pub use midi::{decode, NoteEvent, PacketDecoder};
pub use port::{note_channel, MidiPort, NoteReceiver, NoteSink};
