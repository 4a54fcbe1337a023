//! Collaborator interfaces
//!
//! The alert pipeline reads measurement data and subject details through these traits.
//! In-memory implementations live in [`memory`].

pub mod memory;

pub use memory::{InMemoryReadings, InMemorySubjects, DEFAULT_HISTORY_WINDOW};

use crate::alerts::SubjectId;
use crate::error::RepositoryError;
use chrono::{DateTime, Utc};

/// Source of measurement data
pub trait ReadingRepository: Send + Sync {
    /// Consumption of one measurement point over `[start, end]`
    ///
    /// `Ok(None)` means the point has no readings in the window.
    fn sum_delta(
        &self,
        measurement_point: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Option<f64>, RepositoryError>;

    /// Average of the subject's most recent consumption samples
    fn rolling_average(&self, subject_id: SubjectId) -> Option<f64>;

    /// Feed a consumption sample into the subject's rolling window
    fn record_consumption(&self, _subject_id: SubjectId, _value: f64) {}
}

/// Lookup of subjects owned by the account system
pub trait SubjectDirectory: Send + Sync {
    /// Whether the subject exists
    fn exists(&self, subject_id: SubjectId) -> bool;

    /// Notification address for the subject, if one is known
    fn resolve_destination(&self, subject_id: SubjectId) -> Option<String>;
}
