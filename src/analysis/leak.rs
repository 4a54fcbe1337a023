//! Leak detection strategy
//!
//! A leak shows up as a low but steady flow. The observed value is a 24h aggregate; the
//! derived hourly rate violates when it falls inside `[min_flow, 3 * min_flow]`.

use super::{AnalysisStrategy, Observation, LEAK_DETECTION};

/// Minimum steady flow (liters per hour) treated as a possible leak
pub const DEFAULT_LEAK_MIN_FLOW: f64 = 2.0;

/// Period assumed when the "Nh" parameter cannot be parsed
pub const DEFAULT_LEAK_PERIOD_HOURS: u32 = 24;

const AGGREGATE_HOURS: f64 = 24.0;

/// Fires on a steady low hourly flow
#[derive(Debug, Clone)]
pub struct LeakDetectionStrategy {
    min_flow: f64,
}

impl LeakDetectionStrategy {
    /// Create a strategy with a custom minimum flow
    pub fn new(min_flow: f64) -> Self {
        Self { min_flow }
    }

    /// Upper bound of the leak band
    pub fn max_flow(&self) -> f64 {
        self.min_flow * 3.0
    }

    /// Hours encoded in an "Nh" token, 24 if unparsable
    pub fn period_hours(parameter: &str) -> u32 {
        let digits = parameter.split('h').next().unwrap_or_default().trim();
        digits.parse().unwrap_or(DEFAULT_LEAK_PERIOD_HOURS)
    }

    fn hourly(observation: &Observation) -> f64 {
        observation.value / AGGREGATE_HOURS
    }
}

impl Default for LeakDetectionStrategy {
    fn default() -> Self {
        Self::new(DEFAULT_LEAK_MIN_FLOW)
    }
}

impl AnalysisStrategy for LeakDetectionStrategy {
    fn violates(&self, observation: &Observation, _parameter: &str) -> bool {
        let hourly = Self::hourly(observation);
        hourly >= self.min_flow && hourly <= self.max_flow()
    }

    fn explain(&self, observation: &Observation, parameter: &str) -> String {
        format!(
            "Possible leak detected: steady flow of {:.2}L/h for more than {} hours",
            Self::hourly(observation),
            Self::period_hours(parameter)
        )
    }

    fn name(&self) -> &str {
        LEAK_DETECTION
    }
}
