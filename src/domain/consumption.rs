//! Consumption nodes
//!
//! A [`MeterConsumption`] reads one measurement point through a [`ReadingRepository`];
//! an [`AggregateConsumption`] sums any number of child nodes over the same window.

use crate::alerts::SubjectId;
use crate::error::ValidationError;
use crate::repository::ReadingRepository;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Anything that reports consumption over a time window
pub trait Consumption: Send + Sync {
    /// Consumption in liters over `[start, end]`
    fn value(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> f64;

    /// Stable identifier (meter id or subject id)
    fn identifier(&self) -> String;

    /// Human-readable description
    fn description(&self) -> String;
}

/// Closed time interval used for consumption queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Create a window, rejecting one that ends before it starts
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ValidationError> {
        if end < start {
            return Err(ValidationError::InvalidWindow(format!(
                "end {} is before start {}",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    /// Window covering the `hours` before `end`
    pub fn trailing_hours(hours: u32, end: DateTime<Utc>) -> Self {
        Self {
            start: end - Duration::hours(i64::from(hours)),
            end,
        }
    }

    /// Consumption of `node` over this window
    pub fn measure(&self, node: &dyn Consumption) -> f64 {
        node.value(self.start, self.end)
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} .. {}",
            self.start.format("%Y-%m-%d %H:%M"),
            self.end.format("%Y-%m-%d %H:%M")
        )
    }
}

/// Consumption of a single measurement point
pub struct MeterConsumption {
    measurement_point: String,
    repository: Arc<dyn ReadingRepository>,
}

impl MeterConsumption {
    /// Bind a measurement point to the repository it is read from
    pub fn new(measurement_point: impl Into<String>, repository: Arc<dyn ReadingRepository>) -> Self {
        Self {
            measurement_point: measurement_point.into(),
            repository,
        }
    }
}

impl Consumption for MeterConsumption {
    fn value(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
        match self.repository.sum_delta(&self.measurement_point, start, end) {
            Ok(Some(delta)) => {
                log::debug!("Meter {}: {:.2}L", self.measurement_point, delta);
                delta
            }
            Ok(None) => {
                log::debug!("Meter {}: no readings in window", self.measurement_point);
                0.0
            }
            Err(e) => {
                log::warn!(
                    "Meter {}: reading repository failed, counting 0L: {}",
                    self.measurement_point,
                    e
                );
                0.0
            }
        }
    }

    fn identifier(&self) -> String {
        self.measurement_point.clone()
    }

    fn description(&self) -> String {
        format!("Meter {}", self.measurement_point)
    }
}

/// Sum of several consumption nodes
pub struct AggregateConsumption {
    identifier: String,
    label: String,
    children: Vec<Arc<dyn Consumption>>,
}

impl AggregateConsumption {
    /// Create an empty aggregate
    pub fn new(identifier: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            label: label.into(),
            children: Vec::new(),
        }
    }

    /// Empty aggregate representing all meters of a subject
    pub fn for_subject(subject_id: SubjectId) -> Self {
        Self::new(subject_id.to_string(), format!("Subject #{}", subject_id))
    }

    /// Builder: add a child node
    pub fn with_child(mut self, child: Arc<dyn Consumption>) -> Self {
        self.add(child);
        self
    }

    /// Add a child node
    pub fn add(&mut self, child: Arc<dyn Consumption>) {
        log::debug!("{}: added {}", self.label, child.identifier());
        self.children.push(child);
    }

    /// Remove the first child with the given identifier
    pub fn remove(&mut self, identifier: &str) -> bool {
        match self.children.iter().position(|c| c.identifier() == identifier) {
            Some(pos) => {
                self.children.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Number of direct children
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Whether the aggregate has no children
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl Consumption for AggregateConsumption {
    fn value(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
        let total: f64 = self.children.iter().map(|c| c.value(start, end)).sum();
        log::debug!(
            "{}: {:.2}L across {} node(s)",
            self.label,
            total,
            self.children.len()
        );
        total
    }

    fn identifier(&self) -> String {
        self.identifier.clone()
    }

    fn description(&self) -> String {
        format!("{} ({} meters)", self.label, self.children.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Reading;
    use crate::mock::UnreachableReadings;
    use crate::repository::InMemoryReadings;

    fn at(hours: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap() + Duration::hours(hours)
    }

    fn store_with_deltas(deltas: &[(&str, u64)]) -> Arc<InMemoryReadings> {
        let store = Arc::new(InMemoryReadings::new());
        for (meter, delta) in deltas {
            store.record(Reading::new(*meter, 1000, at(1)));
            store.record(Reading::new(*meter, 1000 + delta, at(20)));
        }
        store
    }

    fn meter(id: &str, store: &Arc<InMemoryReadings>) -> Arc<dyn Consumption> {
        Arc::new(MeterConsumption::new(id, store.clone()))
    }

    #[test]
    fn test_meter_reads_delta() {
        let store = store_with_deltas(&[("SHA-1", 50)]);
        let node = MeterConsumption::new("SHA-1", store);
        assert_eq!(node.value(at(0), at(24)), 50.0);
        assert_eq!(node.identifier(), "SHA-1");
        assert_eq!(node.description(), "Meter SHA-1");
    }

    #[test]
    fn test_meter_without_data_is_zero() {
        let store = Arc::new(InMemoryReadings::new());
        let node = MeterConsumption::new("SHA-9", store);
        assert_eq!(node.value(at(0), at(24)), 0.0);
    }

    #[test]
    fn test_meter_unreachable_repository_is_zero() {
        let node = MeterConsumption::new("SHA-1", Arc::new(UnreachableReadings));
        assert_eq!(node.value(at(0), at(24)), 0.0);
    }

    #[test]
    fn test_aggregate_sums_three_meters() {
        let store = store_with_deltas(&[("A", 50), ("B", 30), ("C", 50)]);
        let total = AggregateConsumption::for_subject(100)
            .with_child(meter("A", &store))
            .with_child(meter("B", &store))
            .with_child(meter("C", &store));

        assert_eq!(total.value(at(0), at(24)), 130.0);
        assert_eq!(total.identifier(), "100");
        assert_eq!(total.description(), "Subject #100 (3 meters)");
    }

    #[test]
    fn test_empty_aggregate_is_zero() {
        let total = AggregateConsumption::for_subject(1);
        assert!(total.is_empty());
        assert_eq!(total.value(at(0), at(24)), 0.0);
    }

    #[test]
    fn test_aggregate_partition_invariance() {
        let store = store_with_deltas(&[("A", 12), ("B", 7), ("C", 31), ("D", 4)]);

        let flat = AggregateConsumption::new("flat", "flat")
            .with_child(meter("A", &store))
            .with_child(meter("B", &store))
            .with_child(meter("C", &store))
            .with_child(meter("D", &store));

        let left = AggregateConsumption::new("left", "left")
            .with_child(meter("D", &store))
            .with_child(meter("A", &store));
        let right = AggregateConsumption::new("right", "right")
            .with_child(meter("C", &store))
            .with_child(meter("B", &store));
        let nested = AggregateConsumption::new("nested", "nested")
            .with_child(Arc::new(left))
            .with_child(Arc::new(right));

        assert_eq!(flat.value(at(0), at(24)), nested.value(at(0), at(24)));
        assert_eq!(flat.value(at(0), at(24)), 54.0);
    }

    #[test]
    fn test_shared_child_in_two_aggregates() {
        let store = store_with_deltas(&[("A", 10), ("B", 5)]);
        let shared = meter("A", &store);

        let first = AggregateConsumption::new("1", "first").with_child(shared.clone());
        let second = AggregateConsumption::new("2", "second")
            .with_child(shared)
            .with_child(meter("B", &store));

        assert_eq!(first.value(at(0), at(24)), 10.0);
        assert_eq!(second.value(at(0), at(24)), 15.0);
    }

    #[test]
    fn test_remove_child() {
        let store = store_with_deltas(&[("A", 10), ("B", 5)]);
        let mut total = AggregateConsumption::for_subject(1)
            .with_child(meter("A", &store))
            .with_child(meter("B", &store));

        assert!(total.remove("A"));
        assert!(!total.remove("A"));
        assert_eq!(total.len(), 1);
        assert_eq!(total.value(at(0), at(24)), 5.0);
    }

    #[test]
    fn test_time_window_validation() {
        assert!(TimeWindow::new(at(2), at(1)).is_err());
        let window = TimeWindow::new(at(0), at(24)).unwrap();
        assert_eq!(window, TimeWindow::trailing_hours(24, at(24)));
    }
}
