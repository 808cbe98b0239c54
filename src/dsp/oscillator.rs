#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use std::f32::consts::TAU;

use crate::graph::node::RenderCtx;

/*
Phase-accumulator Oscillator
============================

  phase      position within one cycle, 0.0..1.0
  increment  frequency / sample_rate, added every sample

    phase ──┐  ┌──┐  ┌──┐  ┌
            └──┘  └──┘  └──┘   wraps at 1.0

The waveform is a pure function of phase, so changing pitch between blocks
never causes a discontinuity.

Sine is the default echo tone. Triangle adds weak odd harmonics for a
slightly brighter, organ-like colour.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OscillatorWaveform {
    Sine,
    Triangle,
}

pub struct OscillatorBlock {
    waveform: OscillatorWaveform,
    phase: f32,
}

impl OscillatorBlock {
    pub fn new(waveform: OscillatorWaveform) -> Self {
        Self { waveform, phase: 0.0 }
    }

    pub fn sine() -> Self {
        Self::new(OscillatorWaveform::Sine)
    }

    pub fn triangle() -> Self {
        Self::new(OscillatorWaveform::Triangle)
    }

    /// Restart the cycle (used on note-on so every attack starts at zero).
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    #[inline]
    fn value(&self) -> f32 {
        match self.waveform {
            OscillatorWaveform::Sine => (TAU * self.phase).sin(),
            OscillatorWaveform::Triangle => 1.0 - 4.0 * (self.phase - 0.5).abs(),
        }
    }

    /// Fill `destination` with the waveform at `ctx.frequency`.
    pub fn render(&mut self, destination: &mut [f32], ctx: &RenderCtx) {
        let increment = ctx.frequency / ctx.sample_rate;
        for sample in destination.iter_mut() {
            *sample = self.value();
            self.phase += increment;
            if self.phase >= 1.0 {
                self.phase -= self.phase.floor();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sine_matches_reference() {
        let sample_rate = 48_000.0;
        let ctx = RenderCtx::for_pitch(sample_rate, 69, 100);
        let mut osc = OscillatorBlock::sine();

        let mut buffer = vec![0.0f32; 128];
        osc.render(&mut buffer, &ctx);

        let n = 12;
        let expected = (TAU * ctx.frequency * n as f32 / sample_rate).sin();
        assert!((buffer[n] - expected).abs() < 1e-4);
    }

    #[test]
    fn triangle_stays_in_range() {
        let ctx = RenderCtx::at_freq(1_000.0, 110.0);
        let mut osc = OscillatorBlock::triangle();
        let mut buffer = vec![0.0f32; 256];
        osc.render(&mut buffer, &ctx);

        assert!(buffer.iter().all(|s| (-1.0..=1.0).contains(s)));
        assert_eq!(buffer[0], -1.0);
    }
}
