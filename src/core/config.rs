//! Loop and window configuration
//!
//! Settings are plain serde structs with per-field defaults, saved and
//! loaded in RON (Rusty Object Notation) or JSON.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Timing tunables of the frame scheduler
///
/// Fixed at construction; the scheduler never mutates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopConfig {
    /// Simulation updates per second
    #[serde(default = "default_target_fps")]
    pub target_fps: u32,
    /// Largest lag, in seconds, that is still caught up step by step
    #[serde(default = "default_max_time_drift")]
    pub max_time_drift: f64,
    /// Consecutive update steps allowed without a render
    #[serde(default = "default_max_skipped_frames")]
    pub max_skipped_frames: u32,
}

fn default_target_fps() -> u32 {
    60
}

fn default_max_time_drift() -> f64 {
    5.0
}

fn default_max_skipped_frames() -> u32 {
    5
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_fps: default_target_fps(),
            max_time_drift: default_max_time_drift(),
            max_skipped_frames: default_max_skipped_frames(),
        }
    }
}

impl LoopConfig {
    /// Set target updates per second
    pub fn with_target_fps(mut self, fps: u32) -> Self {
        self.target_fps = fps;
        self
    }

    /// Set the drift bound in seconds
    pub fn with_max_time_drift(mut self, seconds: f64) -> Self {
        self.max_time_drift = seconds;
        self
    }

    /// Set how many renders may be skipped in a row
    pub fn with_max_skipped_frames(mut self, frames: u32) -> Self {
        self.max_skipped_frames = frames;
        self
    }

    /// Fixed simulation step in seconds
    pub fn delta_seconds(&self) -> f64 {
        1.0 / f64::from(self.target_fps)
    }

    /// Check the tunables describe a runnable loop
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `target_fps` is zero or the drift
    /// bound is negative or not finite
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_fps == 0 {
            return Err(ConfigError::Invalid(
                "target_fps must be greater than zero".to_string(),
            ));
        }
        if !self.max_time_drift.is_finite() || self.max_time_drift < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "max_time_drift must be a finite, non-negative number of seconds (got {})",
                self.max_time_drift
            )));
        }
        Ok(())
    }
}

/// Window settings used by the windowed host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Window title
    #[serde(default = "default_title")]
    pub title: String,
    /// Initial logical width
    #[serde(default = "default_width")]
    pub width: u32,
    /// Initial logical height
    #[serde(default = "default_height")]
    pub height: u32,
}

fn default_title() -> String {
    String::from("Game")
}

fn default_width() -> u32 {
    800
}

fn default_height() -> u32 {
    600
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            width: default_width(),
            height: default_height(),
        }
    }
}

impl WindowConfig {
    /// Create a new config with a title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set window dimensions
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

/// Whole-application settings file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Window settings
    #[serde(default)]
    pub window: WindowConfig,
    /// Scheduler tunables
    #[serde(default)]
    pub timing: LoopConfig,
}

impl EngineConfig {
    /// Save the config to a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_ron(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let ron_string = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;
        fs::write(path, ron_string).map_err(|e| ConfigError::Io(e.to_string()))?;
        Ok(())
    }

    /// Load and validate a config from a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, does not parse, or
    /// holds invalid timing values
    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_ron_str(&content)
    }

    /// Parse and validate a config from RON text
    ///
    /// # Errors
    ///
    /// Returns an error if the text does not parse or holds invalid timing values
    pub fn from_ron_str(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig =
            ron::from_str(content).map_err(|e| ConfigError::Deserialize(e.to_string()))?;
        config.timing.validate()?;
        Ok(config)
    }

    /// Save the config to a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json_string = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;
        fs::write(path, json_string).map_err(|e| ConfigError::Io(e.to_string()))?;
        Ok(())
    }

    /// Load and validate a config from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, does not parse, or
    /// holds invalid timing values
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let config: EngineConfig = serde_json::from_str(&content)
            .map_err(|e| ConfigError::Deserialize(e.to_string()))?;
        config.timing.validate()?;
        Ok(config)
    }

    /// Load a config, picking the format from the file extension
    ///
    /// `.json` is read as JSON, anything else as RON.
    ///
    /// # Errors
    ///
    /// See [`EngineConfig::load_ron`] and [`EngineConfig::load_json`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::load_json(path),
            _ => Self::load_ron(path),
        }
    }
}

/// Errors that can occur while handling configuration
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// IO error
    Io(String),
    /// Serialization error
    Serialize(String),
    /// Deserialization error
    Deserialize(String),
    /// Values parsed but cannot drive a loop
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {e}"),
            Self::Serialize(e) => write!(f, "Serialization error: {e}"),
            Self::Deserialize(e) => write!(f, "Deserialization error: {e}"),
            Self::Invalid(e) => write!(f, "Invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}
