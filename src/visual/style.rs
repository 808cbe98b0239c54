#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
Note Styling
============

Every active note carries two derived attributes, both pure functions of the
incoming pitch and velocity:

  radius   linear map of velocity 0..=127 onto MIN_RADIUS..=MAX_RADIUS

             radius = 10 + 40 * (velocity / 127)

  color    picked by the current color scheme

             Rainbow  hue from the pitch class (pitch mod 12), so every C
                      shares a color regardless of octave
             Fire     red-dominant, green channel rises with velocity
             Ocean    blue-green, green and blue rise with velocity

Nothing here depends on time. Opacity belongs to the note lifecycle.
*/

pub const MIN_RADIUS: f32 = 10.0;
pub const MAX_RADIUS: f32 = 50.0;

/// Map velocity onto the radius range. Monotonic; 0 -> 10, 127 -> 50.
pub fn velocity_to_radius(velocity: u8) -> f32 {
    let normalized = velocity.min(127) as f32 / 127.0;
    MIN_RADIUS + (MAX_RADIUS - MIN_RADIUS) * normalized
}

/// Linear RGB color with channels in 0.0..=1.0.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Hue, saturation and value all in 0.0..=1.0.
    pub fn from_hsv(hue: f32, saturation: f32, value: f32) -> Self {
        let h = hue.rem_euclid(1.0) * 6.0;
        let sector = h.floor() as u32;
        let f = h - h.floor();
        let p = value * (1.0 - saturation);
        let q = value * (1.0 - saturation * f);
        let t = value * (1.0 - saturation * (1.0 - f));

        match sector {
            0 => Self::new(value, t, p),
            1 => Self::new(q, value, p),
            2 => Self::new(p, value, t),
            3 => Self::new(p, q, value),
            4 => Self::new(t, p, value),
            _ => Self::new(value, p, q),
        }
    }

    /// Scale towards black. Terminals have no alpha, so opacity is drawn as
    /// brightness.
    pub fn dimmed(self, opacity: f32) -> Self {
        let k = opacity.clamp(0.0, 1.0);
        Self::new(self.r * k, self.g * k, self.b * k)
    }

    pub fn to_rgb8(self) -> (u8, u8, u8) {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        (q(self.r), q(self.g), q(self.b))
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorScheme {
    #[default]
    Rainbow,
    Fire,
    Ocean,
}

impl ColorScheme {
    pub const ALL: [ColorScheme; 3] = [ColorScheme::Rainbow, ColorScheme::Fire, ColorScheme::Ocean];

    pub fn color(self, pitch: u8, velocity: u8) -> Rgb {
        let intensity = velocity.min(127) as f32 / 127.0;
        match self {
            ColorScheme::Rainbow => {
                let hue = (pitch % 12) as f32 / 12.0;
                Rgb::from_hsv(hue, 0.8, 0.9)
            }
            ColorScheme::Fire => Rgb::new(1.0, 0.3 + 0.4 * intensity, 0.1),
            ColorScheme::Ocean => Rgb::new(0.1, 0.5 + 0.3 * intensity, 0.7 + 0.3 * intensity),
        }
    }

    pub fn next(self) -> Self {
        match self {
            ColorScheme::Rainbow => ColorScheme::Fire,
            ColorScheme::Fire => ColorScheme::Ocean,
            ColorScheme::Ocean => ColorScheme::Rainbow,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ColorScheme::Rainbow => "Rainbow",
            ColorScheme::Fire => "Fire",
            ColorScheme::Ocean => "Ocean",
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisualizationStyle {
    #[default]
    Circles,
    Bars,
}

impl VisualizationStyle {
    pub fn next(self) -> Self {
        match self {
            VisualizationStyle::Circles => VisualizationStyle::Bars,
            VisualizationStyle::Bars => VisualizationStyle::Circles,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            VisualizationStyle::Circles => "Circles",
            VisualizationStyle::Bars => "Bars",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radius_is_bounded_and_strictly_increasing() {
        assert_eq!(velocity_to_radius(0), 10.0);
        assert_eq!(velocity_to_radius(127), 50.0);
        for v in 0..127u8 {
            assert!(velocity_to_radius(v) < velocity_to_radius(v + 1));
        }
    }

    #[test]
    fn rainbow_depends_only_on_pitch_class() {
        let scheme = ColorScheme::Rainbow;
        assert_eq!(scheme.color(60, 10), scheme.color(72, 127));
        assert_ne!(scheme.color(60, 100), scheme.color(61, 100));
    }

    #[test]
    fn rainbow_c_is_red() {
        let c = ColorScheme::Rainbow.color(60, 100);
        assert!((c.r - 0.9).abs() < 1e-6);
        assert!(c.r > c.g && c.r > c.b);
    }

    #[test]
    fn fire_and_ocean_follow_velocity() {
        let soft = ColorScheme::Fire.color(60, 0);
        let hard = ColorScheme::Fire.color(60, 127);
        assert_eq!(soft, Rgb::new(1.0, 0.3, 0.1));
        assert!((hard.g - 0.7).abs() < 1e-6);

        let deep = ColorScheme::Ocean.color(60, 127);
        assert!((deep.b - 1.0).abs() < 1e-6);
        assert!((deep.g - 0.8).abs() < 1e-6);
    }

    #[test]
    fn schemes_cycle() {
        let mut scheme = ColorScheme::Rainbow;
        for _ in 0..3 {
            scheme = scheme.next();
        }
        assert_eq!(scheme, ColorScheme::Rainbow);
        assert_eq!(VisualizationStyle::Circles.next().next(), VisualizationStyle::Circles);
    }

    #[test]
    fn dimming_scales_channels() {
        let c = Rgb::new(1.0, 0.5, 0.0).dimmed(0.5);
        assert_eq!(c.to_rgb8(), (128, 64, 0));
    }
}
