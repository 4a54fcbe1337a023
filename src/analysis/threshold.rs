//! Daily limit strategy

use super::{leading_number, AnalysisStrategy, Observation, DAILY_LIMIT};

/// Limit used when the rule parameter is not a number
pub const DEFAULT_DAILY_LIMIT: f64 = 70.0;

/// Fires when consumption exceeds a fixed number of liters
#[derive(Debug, Clone)]
pub struct DailyLimitStrategy {
    fallback_limit: f64,
}

impl DailyLimitStrategy {
    /// Create a strategy with a custom fallback limit
    pub fn new(fallback_limit: f64) -> Self {
        Self { fallback_limit }
    }

    fn limit(&self, parameter: &str) -> f64 {
        leading_number(parameter).unwrap_or(self.fallback_limit)
    }
}

impl Default for DailyLimitStrategy {
    fn default() -> Self {
        Self::new(DEFAULT_DAILY_LIMIT)
    }
}

impl AnalysisStrategy for DailyLimitStrategy {
    fn violates(&self, observation: &Observation, parameter: &str) -> bool {
        observation.value > self.limit(parameter)
    }

    fn explain(&self, observation: &Observation, parameter: &str) -> String {
        format!(
            "Daily consumption of {:.2}L exceeded the limit of {:.2}L",
            observation.value,
            self.limit(parameter)
        )
    }

    fn name(&self) -> &str {
        DAILY_LIMIT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violates_strictly_above_limit() {
        let strategy = DailyLimitStrategy::default();
        assert!(strategy.violates(&Observation::new(1, 70.01), "70"));
        assert!(!strategy.violates(&Observation::new(1, 70.0), "70"));
        assert!(!strategy.violates(&Observation::new(1, 50.0), "70"));
    }

    #[test]
    fn test_malformed_parameter_uses_fallback() {
        let strategy = DailyLimitStrategy::default();
        assert!(!strategy.violates(&Observation::new(1, 69.0), "seventy"));
        assert!(strategy.violates(&Observation::new(1, 71.0), "seventy"));
        assert!(strategy.violates(&Observation::new(1, 71.0), ""));
    }

    #[test]
    fn test_explain() {
        let strategy = DailyLimitStrategy::default();
        assert_eq!(
            strategy.explain(&Observation::new(1, 85.0), "70"),
            "Daily consumption of 85.00L exceeded the limit of 70.00L"
        );
    }
}
