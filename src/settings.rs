//! Game settings
//!
//! Tuning for the engine and the motion client, persisted as JSON.

use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
pub use crate::sim::ParsePolicy;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("could not access settings file: {0}")]
    Io(#[from] io::Error),
    #[error("settings file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid setting: {0}")]
    Invalid(&'static str),
}

/// Motion client tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// Delay between move commands
    pub frame_ms: u64,
    /// Gyro degrees/s per pixel of travel
    pub gyro_scale: f32,
    /// Starting character column
    pub start_x: i32,
    /// Score needed per difficulty step
    pub points_per_level: u32,
    /// Difficulty ceiling
    pub max_difficulty: u32,
    /// RNG seed for spawn decisions; `None` seeds from the clock
    pub seed: Option<u64>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            frame_ms: 50,
            gyro_scale: 5.0,
            start_x: 100,
            points_per_level: 400,
            max_difficulty: 10,
            seed: None,
        }
    }
}

impl ClientSettings {
    pub fn frame(&self) -> Duration {
        Duration::from_millis(self.frame_ms)
    }
}

/// Engine and client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Engine ===
    /// Tick period in milliseconds
    pub tick_interval_ms: u64,
    /// Meteor width/height and hit-box size
    pub spawn_size: i32,
    /// Falling rate before the first difficulty update
    pub falling_rate: i32,
    /// Handling of non-numeric request fields
    pub parse_policy: ParsePolicy,

    // === Client ===
    pub client: ClientSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            spawn_size: DEFAULT_SPAWN_SIZE,
            falling_rate: DEFAULT_FALLING_RATE,
            parse_policy: ParsePolicy::Strict,
            client: ClientSettings::default(),
        }
    }
}

impl Settings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Reject values the engine can't run with
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.tick_interval_ms == 0 {
            return Err(SettingsError::Invalid("tick_interval_ms must be positive"));
        }
        if self.spawn_size <= 0 || self.spawn_size > FIELD_WIDTH {
            return Err(SettingsError::Invalid("spawn_size must be within the field width"));
        }
        if self.client.gyro_scale <= 0.0 {
            return Err(SettingsError::Invalid("client.gyro_scale must be positive"));
        }
        if self.client.max_difficulty == 0 || self.client.points_per_level == 0 {
            return Err(SettingsError::Invalid("client difficulty settings must be positive"));
        }
        Ok(())
    }

    /// Load and validate settings from a JSON file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&json)?;
        settings.validate()?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load settings, falling back to defaults when the file is missing or bad
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(settings) => settings,
            Err(SettingsError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("No settings at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                log::warn!("Ignoring settings at {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::info!("Settings saved");
        Ok(())
    }
}
