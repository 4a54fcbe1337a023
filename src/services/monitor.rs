//! Sweep monitor
//!
//! Periodically evaluates every subject with at least one active rule and purges alerts
//! past their retention.

use crate::config::Config;
use crate::error::AppError;
use crate::services::AlertService;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Configuration for the monitor
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Interval between sweeps
    pub interval: Duration,
    /// Whether to exit after one sweep
    pub single_use: bool,
    /// End of the first evaluated window instead of the current time; later sweeps
    /// advance it by `interval`
    pub anchor: Option<DateTime<Utc>>,
}

impl MonitorConfig {
    /// Monitor settings from the general configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            interval: config.general.interval(),
            ..Self::default()
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3600),
            single_use: false,
            anchor: None,
        }
    }
}

/// Outcome of one sweep
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Subjects evaluated
    pub checked: usize,
    /// Subjects for which at least one rule fired
    pub fired: usize,
    /// Alerts fired during the sweep
    pub alerts: usize,
    /// Subjects that could not be evaluated
    pub failed: usize,
    /// Alerts removed by the retention purge
    pub purged: usize,
}

/// Sweep monitor
pub struct Monitor {
    config: MonitorConfig,
    service: Arc<AlertService>,
    sweeps: AtomicU32,
}

impl Monitor {
    /// Create a new monitor with the given configuration
    pub fn new(config: MonitorConfig, service: Arc<AlertService>) -> Self {
        Self {
            config,
            service,
            sweeps: AtomicU32::new(0),
        }
    }

    /// End of the window evaluated by the next sweep
    fn next_window_end(&self) -> DateTime<Utc> {
        let sweep = self.sweeps.fetch_add(1, Ordering::Relaxed);
        let Some(anchor) = self.config.anchor else {
            return Utc::now();
        };

        TimeDelta::from_std(self.config.interval.saturating_mul(sweep))
            .ok()
            .and_then(|offset| anchor.checked_add_signed(offset))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Execute a single sweep
    ///
    /// A subject that fails to evaluate is logged and counted; the sweep continues.
    pub fn tick(&self) -> SweepReport {
        let end = self.next_window_end();
        let subjects = self.service.manager().rules().subjects_with_active_rules();
        log::debug!("Sweep at {} over {} subjects", end, subjects.len());

        let mut report = SweepReport::default();
        for subject_id in subjects {
            match self.service.check_at(subject_id, end) {
                Ok(outcome) => {
                    report.checked += 1;
                    if outcome.fired {
                        report.fired += 1;
                        report.alerts += outcome.alerts.len();
                    }
                }
                Err(e) => {
                    report.failed += 1;
                    log::warn!("Subject {} not evaluated: {}", subject_id, e);
                }
            }
        }

        report.purged = self.service.manager().purge_expired();
        log::info!(
            "Sweep done: {} checked, {} fired, {} alerts, {} failed, {} purged",
            report.checked,
            report.fired,
            report.alerts,
            report.failed,
            report.purged
        );
        report
    }

    /// Run the sweep loop
    ///
    /// `on_sweep` receives each report; returning `false` stops the loop.
    pub fn run<F>(&self, mut on_sweep: F) -> Result<(), AppError>
    where
        F: FnMut(&SweepReport) -> bool,
    {
        loop {
            let report = self.tick();
            if !on_sweep(&report) {
                log::info!("Sweep loop stopped by caller");
                break;
            }

            if self.config.single_use {
                log::info!("Single-use mode: exiting after one sweep");
                break;
            }

            std::thread::sleep(self.config.interval);
        }

        Ok(())
    }

    /// Get the monitor configuration
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }
}
