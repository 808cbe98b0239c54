pub mod audio; // Audible echo of note events
pub mod config;
pub mod dsp;
pub mod error;
pub mod graph; // Composable audio graph nodes
pub mod io; // MIDI decoding and virtual endpoints
pub mod sequencing; // Demo playback and keyboard layout
pub mod session;
pub mod synth; // Voice management and polyphony
pub mod visual; // Note lifecycle and styling

pub use error::{Error, Result};

pub const MAX_BLOCK_SIZE: usize = 2048;
pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;
