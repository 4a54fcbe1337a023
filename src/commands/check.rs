//! Check command implementation
//!
//! Evaluates a single subject, either from a readings file or from a supplied value.

use crate::cli::args::CheckArgs;
use crate::cli::output::{print_output, CheckReport};
use crate::cli::Cli;
use crate::commands::{load_readings, load_settings, newest};
use crate::config::ConfigBuilder;
use crate::error::{Result, ValidationError};
use crate::repository::InMemoryReadings;
use crate::services::AlertService;
use chrono::Utc;
use std::sync::Arc;

/// Execute the check command
pub fn run_check(args: &CheckArgs, cli: &Cli) -> Result<()> {
    let (config, alerts) = load_settings(cli, ConfigBuilder::new())?;
    let readings = Arc::new(InMemoryReadings::with_history_window(
        config.general.history_window,
    ));
    let service = AlertService::new(&config, &alerts, readings.clone())?;

    let outcome = match (&args.readings, args.value) {
        (Some(path), _) => {
            let loaded = load_readings(path)?;
            let end = args.at.or_else(|| newest(&loaded)).unwrap_or_else(Utc::now);
            readings.record_all(loaded);
            service.check_at(args.subject, end)?
        }
        (None, Some(value)) => service.check_value(args.subject, value)?,
        (None, None) => {
            return Err(ValidationError::InvalidValue(
                "either --value or --readings is required".to_string(),
            )
            .into())
        }
    };

    print_output(&CheckReport::from(&outcome), cli.format)?;
    Ok(())
}
