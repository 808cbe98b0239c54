// Purpose: Voice management and polyphony for the audible echo
// This layer sits above graph nodes and manages multiple voices

pub mod message;
pub mod poly;
pub mod voice;

pub use message::SynthMessage;
pub use poly::PolySynth;
