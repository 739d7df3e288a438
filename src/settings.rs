//! Game settings and difficulty presets
//!
//! Loaded from JSON on native hosts; every field falls back to its default.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Difficulty preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(try_from = "String")]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" | "norm" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Multiplier on the spawn interval (larger = calmer)
    pub fn spawn_interval_factor(&self) -> f64 {
        match self {
            Difficulty::Easy => 1.3,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 0.75,
        }
    }

    /// Multiplier on enemy approach speed
    pub fn speed_factor(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.8,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 1.25,
        }
    }
}

impl TryFrom<String> for Difficulty {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("unknown difficulty `{value}`"))
    }
}

/// Errors from loading or validating settings
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsError {
    Io { path: String, message: String },
    Parse { message: String },
    Invalid { field: &'static str, reason: String },
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, message } => write!(f, "failed to read settings {path}: {message}"),
            Self::Parse { message } => write!(f, "malformed settings: {message}"),
            Self::Invalid { field, reason } => write!(f, "invalid setting `{field}`: {reason}"),
        }
    }
}

impl std::error::Error for SettingsError {}

/// Runtime settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Difficulty preset
    pub difficulty: Difficulty,

    // === Canvas ===
    pub canvas_width: f32,
    pub canvas_height: f32,
    /// Cull distance past the canvas edge
    pub offscreen_margin: f32,

    // === Timing ===
    /// Target frames per second for the driver
    pub target_fps: f64,
    /// Non-paused survival time needed to win (ms)
    pub win_time_ms: f64,

    // === Rules ===
    /// Shield penalty for a keystroke that matches nothing
    pub wrong_input_penalty: f32,
    /// Wave to begin on
    pub start_wave: u32,

    /// RNG seed for the run
    pub seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Normal,

            canvas_width: CANVAS_WIDTH,
            canvas_height: CANVAS_HEIGHT,
            offscreen_margin: OFFSCREEN_MARGIN,

            target_fps: TARGET_FPS,
            win_time_ms: WIN_TIME_MS,

            wrong_input_penalty: WRONG_INPUT_PENALTY,
            start_wave: 1,

            seed: 0x5EED,
        }
    }
}

impl Settings {
    /// Create settings from a difficulty preset
    pub fn from_difficulty(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            ..Self::default()
        }
    }

    /// Parse settings from JSON and validate them
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json).map_err(|e| SettingsError::Parse {
            message: e.to_string(),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| SettingsError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(self.canvas_width > 0.0 && self.canvas_height > 0.0) {
            return Err(SettingsError::Invalid {
                field: "canvas",
                reason: format!("{}x{} is not a drawable size", self.canvas_width, self.canvas_height),
            });
        }
        if !(self.offscreen_margin >= MIN_OFFSCREEN_MARGIN) {
            return Err(SettingsError::Invalid {
                field: "offscreen_margin",
                reason: format!(
                    "{} would cull enemies as they spawn (minimum {})",
                    self.offscreen_margin, MIN_OFFSCREEN_MARGIN
                ),
            });
        }
        if self.start_wave > MAX_START_WAVE {
            return Err(SettingsError::Invalid {
                field: "start_wave",
                reason: format!("must be at most {MAX_START_WAVE}"),
            });
        }
        if !(self.target_fps > 0.0) {
            return Err(SettingsError::Invalid {
                field: "target_fps",
                reason: "must be positive".to_string(),
            });
        }
        if !(self.win_time_ms > 0.0) {
            return Err(SettingsError::Invalid {
                field: "win_time_ms",
                reason: "must be positive".to_string(),
            });
        }
        if self.wrong_input_penalty < 0.0 {
            return Err(SettingsError::Invalid {
                field: "wrong_input_penalty",
                reason: "cannot be negative".to_string(),
            });
        }
        Ok(())
    }

    /// Minimum time between accepted frames (ms)
    pub fn frame_interval_ms(&self) -> f64 {
        1000.0 / self.target_fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_parse() {
        assert_eq!(Difficulty::parse("HARD"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::parse("norm"), Some(Difficulty::Normal));
        assert_eq!(Difficulty::parse("nightmare"), None);
        assert_eq!(Difficulty::Easy.as_str(), "Easy");
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = Settings::from_json(r#"{ "difficulty": "Hard", "seed": 7 }"#).unwrap();
        assert_eq!(settings.difficulty, Difficulty::Hard);
        assert_eq!(settings.seed, 7);
        assert_eq!(settings.canvas_width, CANVAS_WIDTH);
        assert_eq!(settings.win_time_ms, WIN_TIME_MS);

        let settings = Settings::from_json(r#"{ "difficulty": "easy" }"#).unwrap();
        assert_eq!(settings.difficulty, Difficulty::Easy);
        assert!(Settings::from_json(r#"{ "difficulty": "brutal" }"#).is_err());
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let err = Settings::from_json(r#"{ "target_fps": 0.0 }"#).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { field: "target_fps", .. }));

        let err = Settings::from_json(r#"{ "offscreen_margin": 0.0 }"#).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { field: "offscreen_margin", .. }));

        let err = Settings::from_json(r#"{ "start_wave": 4294967295 }"#).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { field: "start_wave", .. }));

        let err = Settings::from_json("{ not json").unwrap_err();
        assert!(matches!(err, SettingsError::Parse { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = Settings::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, SettingsError::Io { .. }));
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
