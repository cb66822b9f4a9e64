//! Transformation mode and the creativity dial.

use std::fmt;
use std::str::FromStr;

/// What the model must preserve from the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Keep the subject's identity, change action or expression.
    #[default]
    Character,
    /// Keep the art style, paint an entirely new scene.
    Style,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Character => "character",
            Mode::Style => "style",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Mode::Character => "new actions or expressions, same subject",
            Mode::Style => "entirely new scene, same art style",
        }
    }

    /// Creativity only affects character mode.
    pub fn uses_creativity(self) -> bool {
        matches!(self, Mode::Character)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "character" | "char" | "c" => Ok(Mode::Character),
            "style" | "s" => Ok(Mode::Style),
            other => Err(format!(
                "unknown mode '{other}' (expected 'character' or 'style')"
            )),
        }
    }
}

/// How far the model may stray from the source subject, in `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Creativity(f32);

impl Creativity {
    pub const MIN: f32 = 0.0;
    pub const MAX: f32 = 1.0;

    pub fn new(value: f32) -> Result<Self, String> {
        if value.is_nan() || !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(format!("creativity must be between 0 and 1, got {value}"));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// Whole percentage, as shown to the user and sent to the model.
    pub fn percent(self) -> u8 {
        (self.0 * 100.0).round() as u8
    }

    /// Rigid / Balanced / Wild, matching the slider labels.
    pub fn label(self) -> &'static str {
        match self.percent() {
            0..=33 => "rigid",
            34..=66 => "balanced",
            _ => "wild",
        }
    }
}

impl Default for Creativity {
    fn default() -> Self {
        Self(0.5)
    }
}

impl fmt::Display for Creativity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percent())
    }
}

/// Accepts `0.7`, `70%`.
impl FromStr for Creativity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let value = match s.strip_suffix('%') {
            Some(pct) => pct
                .trim()
                .parse::<f32>()
                .map(|p| p / 100.0)
                .map_err(|_| format!("invalid creativity '{s}'"))?,
            None => s
                .parse::<f32>()
                .map_err(|_| format!("invalid creativity '{s}'"))?,
        };
        Self::new(value)
    }
}
