//! In-memory collaborators
//!
//! Thread-safe reading and subject stores used by the CLI and by tests.

use super::{ReadingRepository, SubjectDirectory};
use crate::alerts::SubjectId;
use crate::domain::Reading;
use crate::error::RepositoryError;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;

/// Number of consumption samples kept per subject for the rolling average
pub const DEFAULT_HISTORY_WINDOW: usize = 30;

/// Reading store keyed by measurement point
#[derive(Debug)]
pub struct InMemoryReadings {
    readings: RwLock<HashMap<String, Vec<Reading>>>,
    history: RwLock<HashMap<SubjectId, VecDeque<f64>>>,
    history_window: usize,
}

impl InMemoryReadings {
    /// Create an empty store with the default history window
    pub fn new() -> Self {
        Self::with_history_window(DEFAULT_HISTORY_WINDOW)
    }

    /// Create an empty store keeping `window` samples per subject
    pub fn with_history_window(window: usize) -> Self {
        Self {
            readings: RwLock::new(HashMap::new()),
            history: RwLock::new(HashMap::new()),
            history_window: window.max(1),
        }
    }

    /// Store a reading
    pub fn record(&self, reading: Reading) {
        log::debug!(
            "Reading {}L stored for meter {}",
            reading.value,
            reading.measurement_point
        );
        let mut readings = self.readings.write().unwrap_or_else(|e| e.into_inner());
        readings
            .entry(reading.measurement_point.clone())
            .or_default()
            .push(reading);
    }

    /// Store several readings
    pub fn record_all(&self, readings: impl IntoIterator<Item = Reading>) {
        for reading in readings {
            self.record(reading);
        }
    }

    /// Readings of a measurement point inside `[start, end]`, oldest first
    pub fn readings(
        &self,
        measurement_point: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<Reading> {
        let readings = self.readings.read().unwrap_or_else(|e| e.into_inner());
        let mut found: Vec<Reading> = readings
            .get(measurement_point)
            .map(|all| {
                all.iter()
                    .filter(|r| r.timestamp >= start && r.timestamp <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        found.sort_by_key(|r| r.timestamp);
        found
    }

    /// Number of readings stored for a measurement point
    pub fn count(&self, measurement_point: &str) -> usize {
        let readings = self.readings.read().unwrap_or_else(|e| e.into_inner());
        readings.get(measurement_point).map_or(0, Vec::len)
    }

    /// Remove all readings of a measurement point, returning how many were dropped
    pub fn remove(&self, measurement_point: &str) -> usize {
        let mut readings = self.readings.write().unwrap_or_else(|e| e.into_inner());
        readings.remove(measurement_point).map_or(0, |r| r.len())
    }

    /// Recorded consumption samples of a subject, oldest first
    pub fn history(&self, subject_id: SubjectId) -> Vec<f64> {
        let history = self.history.read().unwrap_or_else(|e| e.into_inner());
        history
            .get(&subject_id)
            .map(|samples| samples.iter().copied().collect())
            .unwrap_or_default()
    }
}

impl Default for InMemoryReadings {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadingRepository for InMemoryReadings {
    fn sum_delta(
        &self,
        measurement_point: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Option<f64>, RepositoryError> {
        let readings = self.readings(measurement_point, start, end);

        let (first, last) = match (readings.first(), readings.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Ok(None),
        };

        // cumulative meter: consumption is last minus first, never negative
        let delta = last.value as f64 - first.value as f64;
        Ok(Some(delta.max(0.0)))
    }

    fn rolling_average(&self, subject_id: SubjectId) -> Option<f64> {
        let history = self.history.read().unwrap_or_else(|e| e.into_inner());
        let samples = history.get(&subject_id)?;
        if samples.is_empty() {
            return None;
        }
        Some(samples.iter().sum::<f64>() / samples.len() as f64)
    }

    fn record_consumption(&self, subject_id: SubjectId, value: f64) {
        let mut history = self.history.write().unwrap_or_else(|e| e.into_inner());
        let samples = history.entry(subject_id).or_default();
        samples.push_back(value);
        while samples.len() > self.history_window {
            samples.pop_front();
        }
    }
}

/// Subject record known to the directory
#[derive(Debug, Clone, Default)]
struct SubjectRecord {
    email: Option<String>,
}

/// Subject directory backed by a map
#[derive(Debug, Default)]
pub struct InMemorySubjects {
    subjects: RwLock<HashMap<SubjectId, SubjectRecord>>,
}

impl InMemorySubjects {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subject with an optional notification address
    pub fn register(&self, subject_id: SubjectId, email: Option<String>) {
        let mut subjects = self.subjects.write().unwrap_or_else(|e| e.into_inner());
        subjects.insert(subject_id, SubjectRecord { email });
    }

    /// Number of registered subjects
    pub fn len(&self) -> usize {
        self.subjects.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether no subject is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SubjectDirectory for InMemorySubjects {
    fn exists(&self, subject_id: SubjectId) -> bool {
        let subjects = self.subjects.read().unwrap_or_else(|e| e.into_inner());
        subjects.contains_key(&subject_id)
    }

    fn resolve_destination(&self, subject_id: SubjectId) -> Option<String> {
        let subjects = self.subjects.read().unwrap_or_else(|e| e.into_inner());
        subjects.get(&subject_id).and_then(|s| s.email.clone())
    }
}
