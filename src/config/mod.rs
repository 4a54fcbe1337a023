//! Configuration system
//!
//! Handles TOML config file parsing and CLI argument merging.

pub mod builder;
pub mod file;

pub use builder::ConfigBuilder;
pub use file::ConfigFile;

use crate::alerts::SubjectId;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,
    /// Monitored subjects and their meters
    pub subjects: Vec<SubjectConfig>,
}

impl Config {
    /// Check value ranges and subject uniqueness
    pub fn validate(&self) -> Result<(), ConfigError> {
        let g = &self.general;
        if g.interval_seconds == 0 {
            return Err(invalid("general.interval_seconds", "must be greater than 0"));
        }
        if g.window_hours == 0 {
            return Err(invalid("general.window_hours", "must be greater than 0"));
        }
        if g.history_window == 0 {
            return Err(invalid("general.history_window", "must be greater than 0"));
        }

        let mut seen = HashSet::new();
        for subject in &self.subjects {
            if !seen.insert(subject.id) {
                return Err(invalid(
                    "subjects.id",
                    &format!("subject {} is declared twice", subject.id),
                ));
            }
        }
        Ok(())
    }

    /// Subject by id
    pub fn subject(&self, id: SubjectId) -> Option<&SubjectConfig> {
        self.subjects.iter().find(|s| s.id == id)
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,
    /// Sweep interval in seconds
    pub interval_seconds: u64,
    /// Length of the evaluated consumption window in hours
    pub window_hours: u32,
    /// Alerts older than this are purged by the sweep
    pub retention_days: u32,
    /// Samples kept per subject for the moving average
    pub history_window: usize,
}

impl GeneralConfig {
    /// Sweep interval as a duration
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            interval_seconds: 3600,
            window_hours: 24,
            retention_days: 90,
            history_window: crate::repository::DEFAULT_HISTORY_WINDOW,
        }
    }
}

/// Monitored subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectConfig {
    /// Subject identifier
    pub id: SubjectId,
    /// Notification address
    #[serde(default)]
    pub email: Option<String>,
    /// Measurement points whose consumption is summed for this subject
    #[serde(default)]
    pub meters: Vec<String>,
}
