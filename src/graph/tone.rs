use crate::dsp::{Envelope, OscillatorBlock};
use crate::graph::node::{GraphNode, RenderCtx};
use crate::MAX_BLOCK_SIZE;

/// The echo patch: sine body plus a little triangle, shaped by an ADSR and
/// scaled by velocity.
pub struct ToneNode {
    body: OscillatorBlock,
    edge: OscillatorBlock,
    env: Envelope,
    /// Triangle share of the mix
    brightness: f32,
    scratch: Vec<f32>,
}

impl ToneNode {
    pub fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            body: OscillatorBlock::sine(),
            edge: OscillatorBlock::triangle(),
            env: Envelope::adsr(attack, decay, sustain, release),
            brightness: 0.2,
            scratch: vec![0.0; MAX_BLOCK_SIZE],
        }
    }

    /// Soft piano-ish default: 5ms attack, 200ms decay, 50% sustain, 400ms release
    pub fn keys() -> Self {
        Self::new(0.005, 0.2, 0.5, 0.4)
    }
}

impl GraphNode for ToneNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        let len = out.len().min(self.scratch.len());
        let (out, edge) = (&mut out[..len], &mut self.scratch[..len]);

        self.body.render(out, ctx);
        self.edge.render(edge, ctx);

        let gain = ctx.gain;
        for (sample, &e) in out.iter_mut().zip(edge.iter()) {
            let mixed = *sample * (1.0 - self.brightness) + e * self.brightness;
            *sample = mixed * self.env.next_sample() * gain;
        }
    }

    fn trigger(&mut self, ctx: &RenderCtx) {
        self.body.reset();
        self.edge.reset();
        self.env.note_on(ctx);
    }

    fn release(&mut self, _ctx: &RenderCtx) {
        self.env.note_off();
    }

    fn is_sounding(&self) -> bool {
        self.env.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_until_triggered() {
        let ctx = RenderCtx::for_pitch(48_000.0, 60, 100);
        let mut tone = ToneNode::keys();
        let mut buffer = vec![1.0f32; 256];
        tone.render_block(&mut buffer, &ctx);
        assert!(buffer.iter().all(|s| *s == 0.0));
        assert!(!tone.is_sounding());
    }

    #[test]
    fn louder_with_velocity() {
        let peak = |velocity: u8| {
            let ctx = RenderCtx::for_pitch(48_000.0, 69, velocity);
            let mut tone = ToneNode::keys();
            tone.trigger(&ctx);
            let mut buffer = vec![0.0f32; 1024];
            tone.render_block(&mut buffer, &ctx);
            buffer.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
        };
        assert!(peak(127) > peak(40));
        assert!(peak(127) <= 1.0);
    }
}
