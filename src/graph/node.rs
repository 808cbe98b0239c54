use crate::io::converter::midi_note_to_freq;

/// Render parameters for one sounding note, fixed when the voice starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderCtx {
    pub sample_rate: f32,
    /// Pitch in Hz
    pub frequency: f32,
    /// Velocity mapped linearly onto 0.0..=1.0
    pub gain: f32,
}

impl RenderCtx {
    pub fn for_pitch(sample_rate: f32, pitch: u8, velocity: u8) -> Self {
        Self {
            sample_rate,
            frequency: midi_note_to_freq(pitch),
            gain: velocity.min(127) as f32 / 127.0,
        }
    }

    /// Full-gain context at an arbitrary frequency.
    pub fn at_freq(sample_rate: f32, frequency: f32) -> Self {
        Self {
            sample_rate,
            frequency,
            gain: 1.0,
        }
    }
}

/// A patch a voice can play: triggered, released, rendered a block at a
/// time until its tail has died away.
pub trait GraphNode: Send {
    fn trigger(&mut self, ctx: &RenderCtx);

    fn release(&mut self, ctx: &RenderCtx);

    /// Overwrite `out` with the next block.
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx);

    /// False once released and fully silent; the voice slot can be reused.
    fn is_sounding(&self) -> bool;
}
