//! Consumption analysis strategies
//!
//! Each strategy decides whether a consumption value violates a rule parameter.
//! Strategies are looked up by tag in a [`StrategyRegistry`].

pub mod leak;
pub mod moving_average;
pub mod threshold;

pub use leak::{LeakDetectionStrategy, DEFAULT_LEAK_MIN_FLOW};
pub use moving_average::{MovingAverageStrategy, DEFAULT_DEVIATION_PERCENT};
pub use threshold::{DailyLimitStrategy, DEFAULT_DAILY_LIMIT};

use crate::alerts::SubjectId;
use crate::repository::ReadingRepository;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Tag of the daily limit strategy
pub const DAILY_LIMIT: &str = "LIMITE_DIARIO";
/// Tag of the moving-average deviation strategy
pub const MOVING_AVERAGE: &str = "MEDIA_MOVEL";
/// Tag of the leak detection strategy
pub const LEAK_DETECTION: &str = "DETECCAO_VAZAMENTO";

/// Value under evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    /// Subject the value belongs to
    pub subject_id: SubjectId,
    /// Consumption in liters
    pub value: f64,
}

impl Observation {
    pub fn new(subject_id: SubjectId, value: f64) -> Self {
        Self { subject_id, value }
    }
}

/// Pluggable analysis algorithm
///
/// Implementations must not panic on malformed parameters; they fall back to a default.
pub trait AnalysisStrategy: Send + Sync {
    /// Whether the observation violates the rule parameter
    fn violates(&self, observation: &Observation, parameter: &str) -> bool;

    /// Human-readable explanation of the violation
    fn explain(&self, observation: &Observation, parameter: &str) -> String;

    /// Registry tag
    fn name(&self) -> &str;

    /// Numeric reference the severity is computed against
    fn severity_basis(&self, parameter: &str) -> f64 {
        leading_number(parameter).unwrap_or(0.0)
    }
}

/// Parse the leading numeric part of `raw`, ignoring leading whitespace
///
/// `"70"` -> 70, `"24h"` -> 24, `"1.5L"` -> 1.5, `"abc"` -> None.
pub fn leading_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim_start();
    let end = trimmed
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E')))
        .map_or(trimmed.len(), |(i, _)| i);
    let candidate = &trimmed[..end];

    (1..=candidate.len())
        .rev()
        .find_map(|len| candidate[..len].parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Strategies keyed by tag
#[derive(Default)]
pub struct StrategyRegistry {
    strategies: RwLock<HashMap<String, Arc<dyn AnalysisStrategy>>>,
}

impl StrategyRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the three built-in strategies with default settings
    pub fn with_defaults(readings: Arc<dyn ReadingRepository>) -> Self {
        let registry = Self::new();
        registry.register(DAILY_LIMIT, Arc::new(DailyLimitStrategy::default()));
        registry.register(MOVING_AVERAGE, Arc::new(MovingAverageStrategy::new(readings)));
        registry.register(LEAK_DETECTION, Arc::new(LeakDetectionStrategy::default()));
        registry
    }

    /// Register (or replace) the strategy for `tag`
    pub fn register(&self, tag: impl Into<String>, strategy: Arc<dyn AnalysisStrategy>) {
        let tag = tag.into();
        log::info!("Analysis strategy registered: {}", tag);
        let mut strategies = self.strategies.write().unwrap_or_else(|e| e.into_inner());
        strategies.insert(tag, strategy);
    }

    /// Strategy registered for `tag`
    pub fn resolve(&self, tag: &str) -> Option<Arc<dyn AnalysisStrategy>> {
        let strategies = self.strategies.read().unwrap_or_else(|e| e.into_inner());
        strategies.get(tag).cloned()
    }

    /// Whether a strategy is registered for `tag`
    pub fn contains(&self, tag: &str) -> bool {
        let strategies = self.strategies.read().unwrap_or_else(|e| e.into_inner());
        strategies.contains_key(tag)
    }

    /// Registered tags, sorted
    pub fn tags(&self) -> Vec<String> {
        let strategies = self.strategies.read().unwrap_or_else(|e| e.into_inner());
        let mut tags: Vec<String> = strategies.keys().cloned().collect();
        tags.sort();
        tags
    }

    /// Number of registered strategies
    pub fn len(&self) -> usize {
        self.strategies.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether no strategy is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
