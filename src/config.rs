//! User-facing settings: the knobs the presentation layer exposes.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::visual::style::{ColorScheme, VisualizationStyle};

pub const MIN_ANIMATION_SPEED: f32 = 0.5;
pub const MAX_ANIMATION_SPEED: f32 = 2.0;
/// Increment used by the speed up/down controls.
pub const ANIMATION_SPEED_STEP: f32 = 0.1;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub style: VisualizationStyle,
    pub color_scheme: ColorScheme,
    /// Global fade-speed multiplier, kept within 0.5..=2.0
    pub animation_speed: f32,
    pub show_grid: bool,
    pub sound_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            style: VisualizationStyle::Circles,
            color_scheme: ColorScheme::Rainbow,
            animation_speed: 1.0,
            show_grid: true,
            sound_enabled: true,
        }
    }
}

impl Settings {
    pub fn set_animation_speed(&mut self, speed: f32) {
        let speed = if speed.is_finite() { speed } else { 1.0 };
        self.animation_speed = speed.clamp(MIN_ANIMATION_SPEED, MAX_ANIMATION_SPEED);
    }

    /// Nudge speed by `steps` increments, snapping to one decimal.
    pub fn step_animation_speed(&mut self, steps: i32) {
        let target = self.animation_speed + steps as f32 * ANIMATION_SPEED_STEP;
        self.set_animation_speed((target * 10.0).round() / 10.0);
    }

    /// Clamp anything a hand-edited file may have put out of range.
    pub fn sanitized(mut self) -> Self {
        self.set_animation_speed(self.animation_speed);
        self
    }
}

#[cfg(feature = "serde")]
mod persist {
    use std::fs;
    use std::path::{Path, PathBuf};

    use directories::ProjectDirs;
    use tracing::{debug, info};

    use super::Settings;
    use crate::error::Result;

    impl Settings {
        /// Per-user settings file, if the platform has a config directory.
        pub fn default_path() -> Option<PathBuf> {
            ProjectDirs::from("org", "midi-visualizer", "midiviz")
                .map(|dirs| dirs.config_dir().join("settings.json"))
        }

        /// Read settings from `path`. A missing file yields the defaults.
        pub fn load_from(path: &Path) -> Result<Self> {
            match fs::read_to_string(path) {
                Ok(data) => {
                    let settings: Settings = serde_json::from_str(&data)?;
                    debug!(path = %path.display(), "settings loaded");
                    Ok(settings.sanitized())
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Settings::default()),
                Err(e) => Err(e.into()),
            }
        }

        pub fn save_to(&self, path: &Path) -> Result<()> {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let json = serde_json::to_string_pretty(self)?;
            fs::write(path, json)?;
            info!(path = %path.display(), "settings saved");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_is_clamped_to_slider_range() {
        let mut s = Settings::default();
        s.set_animation_speed(5.0);
        assert_eq!(s.animation_speed, 2.0);
        s.set_animation_speed(0.1);
        assert_eq!(s.animation_speed, 0.5);
        s.set_animation_speed(f32::NAN);
        assert_eq!(s.animation_speed, 1.0);
    }

    #[test]
    fn speed_steps_snap_to_tenths() {
        let mut s = Settings::default();
        for _ in 0..3 {
            s.step_animation_speed(1);
        }
        assert_eq!(s.animation_speed, 1.3);
        s.step_animation_speed(-20);
        assert_eq!(s.animation_speed, 0.5);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn settings_survive_a_save_and_load() {
        let dir = std::env::temp_dir().join(format!("midiviz-settings-{}", std::process::id()));
        let path = dir.join("settings.json");

        let mut s = Settings {
            style: VisualizationStyle::Bars,
            color_scheme: ColorScheme::Ocean,
            ..Settings::default()
        };
        s.set_animation_speed(1.5);
        s.sound_enabled = false;
        s.save_to(&path).unwrap();

        assert_eq!(Settings::load_from(&path).unwrap(), s);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[cfg(feature = "serde")]
    #[test]
    fn missing_or_partial_file_falls_back_to_defaults() {
        let missing = std::env::temp_dir().join("midiviz-does-not-exist/settings.json");
        assert_eq!(Settings::load_from(&missing).unwrap(), Settings::default());

        let partial: Settings = serde_json::from_str(r#"{ "show_grid": false, "animation_speed": 9.0 }"#)
            .unwrap();
        let partial = partial.sanitized();
        assert!(!partial.show_grid);
        assert_eq!(partial.animation_speed, 2.0);
        assert_eq!(partial.style, VisualizationStyle::Circles);
    }
}
