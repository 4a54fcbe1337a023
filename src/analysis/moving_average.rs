//! Moving-average deviation strategy
//!
//! Compares the current value against the subject's rolling average as kept by the
//! reading repository. A subject without history has an average of 0, so any positive
//! consumption violates unless `alert_without_history` is switched off.

use super::{leading_number, AnalysisStrategy, Observation, MOVING_AVERAGE};
use crate::repository::ReadingRepository;
use std::sync::Arc;

/// Deviation used when the rule parameter is not a number
pub const DEFAULT_DEVIATION_PERCENT: f64 = 50.0;

/// Fires when consumption exceeds the historical average by more than a percentage
pub struct MovingAverageStrategy {
    readings: Arc<dyn ReadingRepository>,
    fallback_percent: f64,
    alert_without_history: bool,
}

impl MovingAverageStrategy {
    /// Create a strategy reading history from `readings`
    pub fn new(readings: Arc<dyn ReadingRepository>) -> Self {
        Self {
            readings,
            fallback_percent: DEFAULT_DEVIATION_PERCENT,
            alert_without_history: true,
        }
    }

    /// Builder: deviation used for unparsable parameters
    pub fn with_fallback_percent(mut self, percent: f64) -> Self {
        self.fallback_percent = percent;
        self
    }

    /// Builder: whether a subject without history can violate
    pub fn with_alert_without_history(mut self, enabled: bool) -> Self {
        self.alert_without_history = enabled;
        self
    }

    fn percent(&self, parameter: &str) -> f64 {
        leading_number(parameter).unwrap_or(self.fallback_percent)
    }

    fn average(&self, observation: &Observation) -> Option<f64> {
        self.readings.rolling_average(observation.subject_id)
    }
}

impl AnalysisStrategy for MovingAverageStrategy {
    fn violates(&self, observation: &Observation, parameter: &str) -> bool {
        let average = match self.average(observation) {
            Some(avg) => avg,
            None if self.alert_without_history => {
                log::debug!(
                    "Subject {} has no consumption history, using average 0",
                    observation.subject_id
                );
                0.0
            }
            None => return false,
        };

        let ceiling = average * (1.0 + self.percent(parameter) / 100.0);
        observation.value > ceiling
    }

    fn explain(&self, observation: &Observation, parameter: &str) -> String {
        format!(
            "Current consumption of {:.2}L is more than {:.2}% above the historical average of {:.2}L",
            observation.value,
            self.percent(parameter),
            self.average(observation).unwrap_or(0.0)
        )
    }

    fn name(&self) -> &str {
        MOVING_AVERAGE
    }
}
