use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use crate::config::{MAX_ANIMATION_SPEED, MIN_ANIMATION_SPEED};
use crate::io::midi::NoteEvent;
use crate::visual::note::{ActiveNote, Fade, NoteSnapshot, NoteState};
use crate::visual::style::ColorScheme;

/*
Note Lifecycle
==============

Each pitch runs its own small state machine. The dispatcher owns every
ActiveNote and every pending fade timer and is only ever touched from the
presentation thread, so no locking is involved.

    ┌──────┐  NoteOn   ┌──────────┐  NoteOff   ┌───────────┐
    │ Idle │ ────────→ │ Sounding │ ─────────→ │ FadingOut │
    └──────┘           └──────────┘            └───────────┘
       ↑  ↺ NoteOff       ↺ NoteOn (restyle)     │   │  ↺ NoteOff
       │                       ↑    NoteOn       │   │
       │                       └─────────────────┘   │
       │               timer fires (token matches)   │
       └─────────────────────────────────────────────┘

Timers
------

A fade timer is a (token, deadline) pair stored against the pitch. Firing is
a message delivered back to the dispatcher: `fire_timer(pitch, token)`. It
only removes the note if the token is still the one on record.

Retrigger during a fade removes the timer entry and replaces the note in the
same call, so by the time any later message is processed the old token is
gone. A stale firing finds no match and does nothing.

Fade duration is BASE_FADE / animation_speed, read at NoteOff time. Notes
already fading keep the duration they started with.
*/

/// Fade length at animation speed 1.0.
pub const BASE_FADE: Duration = Duration::from_secs(2);

/// Identity of one scheduled fade timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FadeToken(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FadeTimer {
    pub token: FadeToken,
    pub deadline: Instant,
}

pub struct NoteDispatcher {
    notes: BTreeMap<u8, ActiveNote>,
    timers: HashMap<u8, FadeTimer>,
    next_token: u64,
    color_scheme: ColorScheme,
    animation_speed: f32,
}

impl NoteDispatcher {
    pub fn new() -> Self {
        Self {
            notes: BTreeMap::new(),
            timers: HashMap::new(),
            next_token: 0,
            color_scheme: ColorScheme::default(),
            animation_speed: 1.0,
        }
    }

    pub fn with_style(color_scheme: ColorScheme, animation_speed: f32) -> Self {
        let mut dispatcher = Self::new();
        dispatcher.set_color_scheme(color_scheme);
        dispatcher.set_animation_speed(animation_speed);
        dispatcher
    }

    /// Applies to notes created from now on.
    pub fn set_color_scheme(&mut self, scheme: ColorScheme) {
        self.color_scheme = scheme;
    }

    pub fn color_scheme(&self) -> ColorScheme {
        self.color_scheme
    }

    /// Applies to the next NoteOff; fades in progress keep their length.
    /// NaN is ignored and the current speed kept.
    pub fn set_animation_speed(&mut self, speed: f32) {
        if speed.is_nan() {
            warn!("ignoring NaN animation speed");
            return;
        }
        self.animation_speed = speed.clamp(MIN_ANIMATION_SPEED, MAX_ANIMATION_SPEED);
    }

    pub fn animation_speed(&self) -> f32 {
        self.animation_speed
    }

    /// Fade length a NoteOff would use right now.
    pub fn fade_duration(&self) -> Duration {
        BASE_FADE.div_f32(self.animation_speed)
    }

    pub fn apply(&mut self, event: NoteEvent, now: Instant) {
        match event {
            NoteEvent::NoteOn { pitch, velocity } => self.note_on(pitch, velocity, now),
            NoteEvent::NoteOff { pitch } => self.note_off(pitch, now),
        }
    }

    /// Idle/Sounding/FadingOut -> Sounding.
    pub fn note_on(&mut self, pitch: u8, velocity: u8, now: Instant) {
        // Cancel and replace together: no stale timer may outlive this call.
        if let Some(timer) = self.timers.remove(&pitch) {
            trace!(pitch, token = timer.token.0, "fade cancelled by retrigger");
        }
        let note = ActiveNote::new(pitch, velocity, self.color_scheme, now);
        debug!(pitch, velocity, radius = note.radius, "note on");
        self.notes.insert(pitch, note);
    }

    /// Sounding -> FadingOut. No-op in Idle and FadingOut.
    pub fn note_off(&mut self, pitch: u8, now: Instant) {
        let duration = self.fade_duration();
        let Some(note) = self.notes.get_mut(&pitch) else {
            trace!(pitch, "note off without active note");
            return;
        };
        if note.is_fading() {
            return;
        }

        note.fade = Some(Fade {
            started_at: now,
            duration,
        });

        let token = FadeToken(self.next_token);
        self.next_token = self.next_token.wrapping_add(1);
        self.timers.insert(
            pitch,
            FadeTimer {
                token,
                deadline: now + duration,
            },
        );
        debug!(pitch, fade_ms = duration.as_millis() as u64, "note off");
    }

    /// FadingOut -> Idle, if `token` is still the pending timer for `pitch`.
    ///
    /// Returns true if the note was removed.
    pub fn fire_timer(&mut self, pitch: u8, token: FadeToken) -> bool {
        match self.timers.get(&pitch) {
            Some(timer) if timer.token == token => {
                self.timers.remove(&pitch);
                self.notes.remove(&pitch);
                trace!(pitch, "fade finished");
                true
            }
            _ => false,
        }
    }

    /// Fire every timer whose deadline is at or before `now`, earliest
    /// first. Returns the pitches that were removed.
    pub fn fire_due(&mut self, now: Instant) -> Vec<u8> {
        let mut due: Vec<(Instant, u8, FadeToken)> = self
            .timers
            .iter()
            .filter(|(_, timer)| timer.deadline <= now)
            .map(|(&pitch, timer)| (timer.deadline, pitch, timer.token))
            .collect();
        due.sort_unstable_by_key(|&(deadline, pitch, _)| (deadline, pitch));

        due.into_iter()
            .filter(|&(_, pitch, token)| self.fire_timer(pitch, token))
            .map(|(_, pitch, _)| pitch)
            .collect()
    }

    /// Earliest pending deadline, for sizing the presentation loop's wait.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.values().map(|timer| timer.deadline).min()
    }

    pub fn state(&self, pitch: u8) -> NoteState {
        match self.notes.get(&pitch) {
            None => NoteState::Idle,
            Some(note) if note.is_fading() => NoteState::FadingOut,
            Some(_) => NoteState::Sounding,
        }
    }

    pub fn get(&self, pitch: u8) -> Option<&ActiveNote> {
        self.notes.get(&pitch)
    }

    pub fn pending_timer(&self, pitch: u8) -> Option<FadeTimer> {
        self.timers.get(&pitch).copied()
    }

    pub fn timer_count(&self) -> usize {
        self.timers.len()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Snapshot of every active note, ordered by pitch.
    pub fn snapshot(&self, now: Instant) -> Vec<NoteSnapshot> {
        self.notes.values().map(|note| note.snapshot(now)).collect()
    }

    /// Cancel all timers, then drop all notes.
    pub fn teardown(&mut self) {
        let cancelled = self.timers.len();
        self.timers.clear();
        let released = self.notes.len();
        self.notes.clear();
        if cancelled > 0 || released > 0 {
            debug!(cancelled, released, "dispatcher torn down");
        }
    }
}

impl Default for NoteDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
