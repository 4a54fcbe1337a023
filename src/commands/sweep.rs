//! Sweep command implementation
//!
//! Replays a readings file and evaluates every subject with active rules on an interval.

use crate::cli::args::SweepArgs;
use crate::cli::output::{print_output, SweepSummary};
use crate::cli::Cli;
use crate::commands::{load_readings, load_settings, newest};
use crate::config::ConfigBuilder;
use crate::error::Result;
use crate::repository::InMemoryReadings;
use crate::services::{AlertService, Monitor, MonitorConfig};
use std::sync::Arc;

/// Execute the sweep command
pub fn run_sweep(args: &SweepArgs, cli: &Cli) -> Result<()> {
    let builder = ConfigBuilder::new()
        .with_interval(args.interval)
        .with_retention_days(args.retention_days);
    let (config, alerts) = load_settings(cli, builder)?;

    let readings = Arc::new(InMemoryReadings::with_history_window(
        config.general.history_window,
    ));
    let loaded = load_readings(&args.readings)?;
    let anchor = args.at.or_else(|| newest(&loaded));
    readings.record_all(loaded);

    let service = Arc::new(AlertService::new(&config, &alerts, readings)?);
    let monitor = Monitor::new(
        MonitorConfig {
            single_use: args.single_use,
            anchor,
            ..MonitorConfig::from_config(&config)
        },
        service,
    );

    log::info!(
        "Sweeping every {}s{}",
        config.general.interval_seconds,
        if args.single_use { " (single use)" } else { "" }
    );

    let mut sweep = 0;
    let mut output_error = None;
    monitor.run(|report| {
        sweep += 1;
        let summary = SweepSummary {
            sweep,
            report: report.clone(),
        };
        match print_output(&summary, cli.format) {
            Ok(()) => true,
            Err(e) => {
                output_error = Some(e);
                false
            }
        }
    })?;

    match output_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}
