use crate::graph::node::{GraphNode, RenderCtx};

/// One polyphony slot.
///
/// A voice is free, held (key down) or ringing out after its release. The
/// render context is captured at `start` and reused for every block.
pub struct Voice<P: GraphNode> {
    patch: P,
    sample_rate: f32,
    /// Pitch assigned to the slot, None while free
    pitch: Option<u8>,
    held: bool,
    ctx: RenderCtx,
    /// Synth clock when the slot was last started; lower is older
    started_at: u64,
}

impl<P: GraphNode> Voice<P> {
    pub fn new(patch: P, sample_rate: f32) -> Self {
        Self {
            patch,
            sample_rate,
            pitch: None,
            held: false,
            ctx: RenderCtx::at_freq(sample_rate, 0.0),
            started_at: 0,
        }
    }

    pub fn start(&mut self, pitch: u8, velocity: u8, clock: u64) {
        self.ctx = RenderCtx::for_pitch(self.sample_rate, pitch, velocity);
        self.pitch = Some(pitch);
        self.held = true;
        self.started_at = clock;
        self.patch.trigger(&self.ctx);
    }

    /// Let go of the key. The slot stays busy until the tail is silent.
    pub fn release(&mut self) {
        if self.held {
            self.held = false;
            self.patch.release(&self.ctx);
        }
    }

    /// Add this voice's next block into `mix`, using `scratch` for the
    /// patch output. Does nothing for a free slot.
    pub fn render_into(&mut self, mix: &mut [f32], scratch: &mut [f32]) {
        if self.pitch.is_none() {
            return;
        }

        self.patch.render_block(scratch, &self.ctx);
        for (m, s) in mix.iter_mut().zip(scratch.iter()) {
            *m += s;
        }

        if !self.held && !self.patch.is_sounding() {
            self.pitch = None;
        }
    }

    pub fn pitch(&self) -> Option<u8> {
        self.pitch
    }

    pub fn is_free(&self) -> bool {
        self.pitch.is_none()
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    pub fn is_releasing(&self) -> bool {
        self.pitch.is_some() && !self.held
    }

    pub fn started_at(&self) -> u64 {
        self.started_at
    }
}
