//! Command handlers
//!
//! Each command handler orchestrates the execution of a CLI command.

pub mod check;
pub mod rules;
pub mod sweep;

pub use check::run_check;
pub use rules::run_rules;
pub use sweep::run_sweep;

use crate::alerts::AlertConfig;
use crate::cli::Cli;
use crate::config::{Config, ConfigBuilder};
use crate::domain::Reading;
use crate::error::{ConfigError, Result};
use chrono::{DateTime, Utc};
use std::path::Path;

/// Merge configuration files with global CLI overrides
pub(crate) fn load_settings(cli: &Cli, builder: ConfigBuilder) -> Result<(Config, AlertConfig)> {
    let config = builder
        .with_file(cli.config.as_deref())?
        .with_verbose(cli.verbose.then_some(true))
        .with_window_hours(cli.window_hours)
        .build()?;

    let mut alerts = AlertConfig::load_or_default(cli.alerts.as_deref())?;
    if let Some(channel) = cli.channel {
        alerts.settings.channel = channel.as_str().to_string();
    }

    Ok((config, alerts))
}

/// Read a JSON array of readings
pub(crate) fn load_readings(path: &Path) -> Result<Vec<Reading>> {
    let content = std::fs::read_to_string(path)
        .map_err(|_| ConfigError::FileNotFound(path.display().to_string()))?;
    let readings: Vec<Reading> = serde_json::from_str(&content).map_err(ConfigError::from)?;
    log::info!("Loaded {} readings from {}", readings.len(), path.display());
    Ok(readings)
}

/// Timestamp of the newest reading
pub(crate) fn newest(readings: &[Reading]) -> Option<DateTime<Utc>> {
    readings.iter().map(|r| r.timestamp).max()
}
