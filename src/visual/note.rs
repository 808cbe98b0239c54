use std::time::{Duration, Instant};

use crate::visual::style::{velocity_to_radius, ColorScheme, Rgb};

/// Per-pitch lifecycle stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteState {
    Idle,      // No active note, no timer
    Sounding,  // Active note at full opacity
    FadingOut, // Released, fade timer pending
}

/// Fade-out in progress: opacity falls linearly from 1 to 0 over `duration`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fade {
    pub started_at: Instant,
    pub duration: Duration,
}

impl Fade {
    pub fn opacity_at(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 0.0;
        }
        let elapsed = now.saturating_duration_since(self.started_at);
        let progress = elapsed.as_secs_f32() / self.duration.as_secs_f32();
        (1.0 - progress).clamp(0.0, 1.0)
    }
}

/// A note currently shown on screen. At most one per pitch.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveNote {
    pub pitch: u8,
    pub velocity: u8,
    pub radius: f32,
    pub color: Rgb,
    pub created_at: Instant,
    pub fade: Option<Fade>,
}

impl ActiveNote {
    pub fn new(pitch: u8, velocity: u8, scheme: ColorScheme, now: Instant) -> Self {
        Self {
            pitch,
            velocity,
            radius: velocity_to_radius(velocity),
            color: scheme.color(pitch, velocity),
            created_at: now,
            fade: None,
        }
    }

    pub fn opacity_at(&self, now: Instant) -> f32 {
        self.fade.map_or(1.0, |fade| fade.opacity_at(now))
    }

    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    pub fn snapshot(&self, now: Instant) -> NoteSnapshot {
        NoteSnapshot {
            pitch: self.pitch,
            velocity: self.velocity,
            radius: self.radius,
            color: self.color,
            opacity: self.opacity_at(now),
            fade_duration: self.fade.map(|fade| fade.duration),
            created_at: self.created_at,
        }
    }
}

/// Read-only copy handed to the presentation layer each redraw.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteSnapshot {
    pub pitch: u8,
    pub velocity: u8,
    pub radius: f32,
    pub color: Rgb,
    /// 1.0 while sounding, falling towards 0.0 while fading
    pub opacity: f32,
    /// Set once the note has been released
    pub fade_duration: Option<Duration>,
    pub created_at: Instant,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fade_is_linear_and_clamped() {
        let t0 = Instant::now();
        let fade = Fade {
            started_at: t0,
            duration: Duration::from_secs(2),
        };
        assert_eq!(fade.opacity_at(t0), 1.0);
        assert!((fade.opacity_at(t0 + Duration::from_secs(1)) - 0.5).abs() < 1e-6);
        assert_eq!(fade.opacity_at(t0 + Duration::from_secs(3)), 0.0);
    }

    #[test]
    fn sounding_note_is_opaque() {
        let t0 = Instant::now();
        let note = ActiveNote::new(60, 127, ColorScheme::Fire, t0);
        assert_eq!(note.radius, 50.0);
        assert_eq!(note.opacity_at(t0 + Duration::from_secs(10)), 1.0);
        assert_eq!(note.snapshot(t0).fade_duration, None);
    }
}
