/// Commands from the presentation thread to the audio callback.
///
/// Mirrors `Instrument` one to one; the callback drains these before every
/// block it renders.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SynthMessage {
    Play { pitch: u8, velocity: u8 },
    Stop { pitch: u8 },
    /// Release every voice
    Silence,
}
