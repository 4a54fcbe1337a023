//! Mock implementations for testing
//!
//! Test doubles for the reading repository, notification sinks and channels.

use crate::alerts::{Alert, AlertId, NotificationChannel, Notifier, SubjectId};
use crate::error::{NotifyError, RepositoryError};
use crate::repository::ReadingRepository;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Repository whose backing store is unreachable
#[derive(Debug, Default)]
pub struct UnreachableReadings;

impl ReadingRepository for UnreachableReadings {
    fn sum_delta(
        &self,
        measurement_point: &str,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<Option<f64>, RepositoryError> {
        Err(RepositoryError::Unavailable(format!(
            "no route to store for {}",
            measurement_point
        )))
    }

    fn rolling_average(&self, _subject_id: SubjectId) -> Option<f64> {
        None
    }
}

/// Sink that stalls while delivering one particular alert
pub struct StallingNotifier {
    alert_id: AlertId,
    delay: Duration,
}

impl StallingNotifier {
    pub fn new(alert_id: AlertId, delay: Duration) -> Self {
        Self { alert_id, delay }
    }
}

impl Notifier for StallingNotifier {
    fn notify(&self, alert: &Alert) -> Result<(), NotifyError> {
        if alert.id == self.alert_id {
            thread::sleep(self.delay);
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "stalling"
    }
}

/// Sink that remembers every alert it receives
pub struct RecordingNotifier {
    name: String,
    received: Mutex<Vec<Alert>>,
    journal: Option<Arc<Mutex<Vec<String>>>>,
}

impl RecordingNotifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            received: Mutex::new(Vec::new()),
            journal: None,
        }
    }

    /// Also append the sink name to a journal shared between sinks
    pub fn with_journal(name: impl Into<String>, journal: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            journal: Some(journal),
            ..Self::new(name)
        }
    }

    pub fn received(&self) -> Vec<Alert> {
        self.received.lock().unwrap().clone()
    }

    pub fn received_ids(&self) -> Vec<AlertId> {
        self.received.lock().unwrap().iter().map(|a| a.id).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, alert: &Alert) -> Result<(), NotifyError> {
        self.received.lock().unwrap().push(alert.clone());
        if let Some(journal) = &self.journal {
            journal.lock().unwrap().push(self.name.clone());
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Sink that always fails
#[derive(Debug, Default)]
pub struct FailingNotifier;

impl Notifier for FailingNotifier {
    fn notify(&self, _alert: &Alert) -> Result<(), NotifyError> {
        Err(NotifyError::Sink {
            sink: "failing".to_string(),
            message: "simulated failure".to_string(),
        })
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Sink that panics on every alert
#[derive(Debug, Default)]
pub struct PanickingNotifier;

impl Notifier for PanickingNotifier {
    fn notify(&self, alert: &Alert) -> Result<(), NotifyError> {
        panic!("sink blew up on alert {}", alert.id);
    }

    fn name(&self) -> &str {
        "panicking"
    }
}

/// Configurable channel recording `(message, destination)` pairs
pub struct MockChannel {
    name: String,
    available: bool,
    succeed: bool,
    delay: Option<Duration>,
    sent: Mutex<Vec<(String, String)>>,
}

impl MockChannel {
    pub fn new() -> Self {
        Self::named("MOCK")
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            available: true,
            succeed: true,
            delay: None,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn failing(mut self) -> Self {
        self.succeed = false;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

impl NotificationChannel for MockChannel {
    fn send(&self, message: &str, destination: &str) -> bool {
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        self.sent
            .lock()
            .unwrap()
            .push((message.to_string(), destination.to_string()));
        self.succeed
    }

    fn channel_name(&self) -> &str {
        &self.name
    }

    fn is_available(&self) -> bool {
        self.available
    }
}
