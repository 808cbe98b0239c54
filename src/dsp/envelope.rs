use crate::{graph::node::RenderCtx, MIN_TIME};

/*
Linear ADSR as a chain of ramps
===============================

Every moving stage is a straight ramp from the current level to a target
over a whole number of samples:

  stage     target    length
  Attack    1.0       attack  * sample_rate
  Decay     sustain   decay   * sample_rate
  Release   0.0       release * sample_rate   (from wherever note_off hit)

The last sample of a ramp is pinned to the target, so release always ends
on exactly 0.0 and the voice can be reclaimed. Sustain holds; Idle is 0.0.
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeState {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

pub struct Envelope {
    attack: f32,
    decay: f32,
    sustain: f32,
    release: f32,

    sample_rate: f32,
    stage: EnvelopeState,
    level: f32,
    /// Per-sample increment of the current ramp
    step: f32,
    target: f32,
    /// Samples left in the current ramp
    remaining: u32,
}

impl Envelope {
    /// Times in seconds, sustain as a level in 0.0..=1.0.
    pub fn adsr(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack: attack.max(MIN_TIME),
            decay: decay.max(MIN_TIME),
            sustain: sustain.clamp(0.0, 1.0),
            release: release.max(MIN_TIME),
            sample_rate: 48_000.0,
            stage: EnvelopeState::Idle,
            level: 0.0,
            step: 0.0,
            target: 0.0,
            remaining: 0,
        }
    }

    fn ramp(&mut self, stage: EnvelopeState, target: f32, seconds: f32) {
        let samples = (seconds * self.sample_rate).round().max(1.0) as u32;
        self.stage = stage;
        self.target = target;
        self.remaining = samples;
        self.step = (target - self.level) / samples as f32;
    }

    /// Restart from silence.
    pub fn note_on(&mut self, ctx: &RenderCtx) {
        self.sample_rate = ctx.sample_rate;
        self.level = 0.0;
        self.ramp(EnvelopeState::Attack, 1.0, self.attack);
    }

    /// Ramp down from the current level. Ignored while idle.
    pub fn note_off(&mut self) {
        if self.stage != EnvelopeState::Idle {
            self.ramp(EnvelopeState::Release, 0.0, self.release);
        }
    }

    pub fn next_sample(&mut self) -> f32 {
        if self.remaining == 0 {
            return self.level;
        }

        self.remaining -= 1;
        self.level += self.step;
        if self.remaining == 0 {
            self.level = self.target;
            match self.stage {
                EnvelopeState::Attack => self.ramp(EnvelopeState::Decay, self.sustain, self.decay),
                EnvelopeState::Decay => self.stage = EnvelopeState::Sustain,
                EnvelopeState::Release => self.stage = EnvelopeState::Idle,
                EnvelopeState::Idle | EnvelopeState::Sustain => {}
            }
        }
        self.level
    }

    pub fn is_active(&self) -> bool {
        self.stage != EnvelopeState::Idle
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn state(&self) -> EnvelopeState {
        self.stage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 1_000.0;

    fn triggered(attack: f32, decay: f32, sustain: f32, release: f32) -> Envelope {
        let mut env = Envelope::adsr(attack, decay, sustain, release);
        env.note_on(&RenderCtx::at_freq(SAMPLE_RATE, 440.0));
        env
    }

    fn run(env: &mut Envelope, samples: usize) {
        for _ in 0..samples {
            env.next_sample();
        }
    }

    #[test]
    fn attack_then_sustain() {
        let mut env = triggered(0.01, 0.05, 0.6, 0.2);

        run(&mut env, 10);
        assert_eq!(env.level(), 1.0);
        assert_eq!(env.state(), EnvelopeState::Decay);

        run(&mut env, 50);
        assert_eq!(env.state(), EnvelopeState::Sustain);
        assert_eq!(env.level(), 0.6);

        run(&mut env, 100);
        assert_eq!(env.level(), 0.6);
    }

    #[test]
    fn release_lands_on_zero() {
        let mut env = triggered(0.01, 0.05, 0.5, 0.03);
        run(&mut env, 20);

        env.note_off();
        run(&mut env, 29);
        assert!(env.level() > 0.0);
        assert!(env.is_active());

        run(&mut env, 1);
        assert_eq!(env.level(), 0.0);
        assert!(!env.is_active());
    }

    #[test]
    fn note_off_while_idle_stays_idle() {
        let mut env = Envelope::adsr(0.01, 0.05, 0.5, 0.03);
        env.note_off();
        assert_eq!(env.state(), EnvelopeState::Idle);
        assert_eq!(env.next_sample(), 0.0);
    }
}
