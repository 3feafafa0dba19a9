//! Game tuning and input preferences
//!
//! Loaded from an optional JSON file; every field falls back to its default.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where the gravity vector comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum InputMode {
    /// Gravity points from the player toward the last pointer position
    Pointer,
    /// Gravity follows the device accelerometer
    #[default]
    Tilt,
}

impl InputMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputMode::Pointer => "Pointer",
            InputMode::Tilt => "Tilt",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pointer" | "touch" | "mouse" => Some(InputMode::Pointer),
            "tilt" | "accelerometer" => Some(InputMode::Tilt),
            _ => None,
        }
    }
}

/// Failure reading a settings file
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("could not read settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid settings JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Game settings/tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Gravity source
    pub input_mode: InputMode,
    /// Seed for teleport destination selection
    pub seed: u64,

    // === Timing (seconds) ===
    /// Length of each vortex death phase (approach, shrink)
    pub vortex_step_duration: f32,
    /// Length of each teleport phase (approach, shrink, travel, grow)
    pub teleport_step_duration: f32,
    /// How long a used teleport stays inactive
    pub teleport_cooldown: f32,
    /// Vortex/teleport rotation speed (radians per second)
    pub spin_speed: f32,

    // === Input ===
    /// Pointer offset is divided by this to get gravity
    pub pointer_gravity_divisor: f32,
    /// Accelerometer reading is multiplied by this to get gravity
    pub tilt_gravity_scale: f32,

    // === Scoring ===
    pub star_points: i64,
    pub vortex_penalty: i64,
    pub finish_points: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            input_mode: InputMode::Tilt,
            seed: 0x7117_3a2e,

            vortex_step_duration: 0.25,
            teleport_step_duration: 0.25,
            teleport_cooldown: 5.0,
            spin_speed: std::f32::consts::PI,

            pointer_gravity_divisor: 100.0,
            tilt_gravity_scale: 50.0,

            star_points: 1,
            vortex_penalty: 1,
            finish_points: 10,
        }
    }
}

impl Settings {
    /// Default settings with a specific input mode
    pub fn with_input_mode(mode: InputMode) -> Self {
        Self {
            input_mode: mode,
            ..Self::default()
        }
    }

    /// Parse settings from JSON (missing fields keep their defaults)
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read settings from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load settings from an optional file, falling back to defaults
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            log::info!("Using default settings");
            return Self::default();
        };

        match Self::from_file(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(err) => {
                log::warn!("{} ({}), using defaults", err, path.display());
                Self::default()
            }
        }
    }
}
