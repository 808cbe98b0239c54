//! Demo sequencer - scripted note playback for demonstration
//!
//! The sequencer never sleeps. The presentation loop polls it with the
//! current time and it returns whatever note actions have come due; the
//! caller sends them through the same outbound path as the on-screen keys.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::sequencing::notes::{C4, E4, G4};

/// One scripted note: sounded for `duration`, then released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoStep {
    pub pitch: u8,
    pub duration: Duration,
}

const fn step(pitch: u8, millis: u64) -> DemoStep {
    DemoStep {
        pitch,
        duration: Duration::from_millis(millis),
    }
}

/// C major arpeggio: C-E-G-E-C.
pub const DEMO_MELODY: [DemoStep; 5] = [
    step(C4, 500),
    step(E4, 500),
    step(G4, 500),
    step(E4, 500),
    step(C4, 1000),
];

pub const DEMO_VELOCITY: u8 = 80;

/// Silence between one note's release and the next note.
pub const NOTE_GAP: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoAction {
    NoteOn { pitch: u8, velocity: u8 },
    NoteOff { pitch: u8 },
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    /// Step `step_index` is sounding until `until`
    Holding { pitch: u8, until: Instant },
    /// Waiting to start step `step_index` at `until`
    Gap { until: Instant },
}

pub struct DemoSequencer {
    steps: Vec<DemoStep>,
    /// Index of the current (or next) step
    step_index: usize,
    /// None while stopped
    phase: Option<Phase>,
}

impl DemoSequencer {
    pub fn new() -> Self {
        Self::with_steps(DEMO_MELODY.to_vec())
    }

    pub fn with_steps(steps: Vec<DemoStep>) -> Self {
        Self {
            steps,
            step_index: 0,
            phase: None,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.phase.is_some()
    }

    /// Start from the first step. A demo already running is replaced: its
    /// sounding note is released first so per-pitch state stays paired.
    pub fn start(&mut self, now: Instant) -> Vec<DemoAction> {
        let mut actions = self.stop();
        info!(steps = self.steps.len(), "demo started");
        self.step_index = 0;
        self.phase = Some(Phase::Gap { until: now });
        actions.extend(self.poll(now));
        actions
    }

    /// Stop playback, releasing the note that is sounding, if any.
    pub fn stop(&mut self) -> Vec<DemoAction> {
        match self.phase.take() {
            Some(Phase::Holding { pitch, .. }) => {
                debug!(pitch, "demo interrupted");
                vec![DemoAction::NoteOff { pitch }]
            }
            _ => Vec::new(),
        }
    }

    /// Advance to `now`, returning the actions that came due in order.
    ///
    /// Deadlines chain from the scheduled times, not from `now`, so a late
    /// poll catches up without stretching the rhythm.
    pub fn poll(&mut self, now: Instant) -> Vec<DemoAction> {
        let mut actions = Vec::new();

        loop {
            match self.phase {
                Some(Phase::Gap { until }) if until <= now => {
                    let Some(step) = self.steps.get(self.step_index).copied() else {
                        self.phase = None;
                        info!("demo finished");
                        break;
                    };
                    actions.push(DemoAction::NoteOn {
                        pitch: step.pitch,
                        velocity: DEMO_VELOCITY,
                    });
                    self.phase = Some(Phase::Holding {
                        pitch: step.pitch,
                        until: until + step.duration,
                    });
                }
                Some(Phase::Holding { pitch, until }) if until <= now => {
                    actions.push(DemoAction::NoteOff { pitch });
                    self.step_index += 1;
                    self.phase = Some(Phase::Gap {
                        until: until + NOTE_GAP,
                    });
                }
                _ => break,
            }
        }

        actions
    }

    /// When the next action is due, if playing.
    pub fn next_deadline(&self) -> Option<Instant> {
        match self.phase {
            Some(Phase::Holding { until, .. }) | Some(Phase::Gap { until }) => Some(until),
            None => None,
        }
    }
}

impl Default for DemoSequencer {
    fn default() -> Self {
        Self::new()
    }
}
