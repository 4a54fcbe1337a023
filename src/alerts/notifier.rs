//! Alert notification fan-out
//!
//! [`NotificationManager`] delivers every fired alert to an ordered list of sinks. A sink
//! that fails or panics is logged and skipped; the remaining sinks still receive the alert.

use super::channels::{ConsoleChannel, NotificationChannel};
use super::types::{Alert, AlertSeverity, SubjectId};
use crate::error::NotifyError;
use crate::repository::SubjectDirectory;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::Duration;

/// Default number of alerts kept by the dashboard sink
pub const DEFAULT_DASHBOARD_CAPACITY: usize = 100;

/// Default bound on a single channel send
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Receiver of fired alerts
pub trait Notifier: Send + Sync {
    /// Handle a fired alert
    fn notify(&self, alert: &Alert) -> Result<(), NotifyError>;

    /// Sink name for identification
    fn name(&self) -> &str;
}

/// Bounded buffer of recent alerts for dashboard polling
pub struct DashboardNotifier {
    recent: RwLock<VecDeque<Alert>>,
    capacity: usize,
}

impl DashboardNotifier {
    /// Create a dashboard keeping at most `capacity` alerts
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            recent: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Recent alerts, oldest first
    pub fn recent(&self) -> Vec<Alert> {
        let recent = self.recent.read().unwrap_or_else(|e| e.into_inner());
        recent.iter().cloned().collect()
    }

    /// Most recent alert
    pub fn latest(&self) -> Option<Alert> {
        let recent = self.recent.read().unwrap_or_else(|e| e.into_inner());
        recent.back().cloned()
    }

    /// Number of buffered alerts
    pub fn len(&self) -> usize {
        self.recent.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of buffered alerts
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop all buffered alerts
    pub fn clear(&self) {
        self.recent
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

impl Default for DashboardNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_DASHBOARD_CAPACITY)
    }
}

impl Notifier for DashboardNotifier {
    fn notify(&self, alert: &Alert) -> Result<(), NotifyError> {
        let mut recent = self.recent.write().unwrap_or_else(|e| e.into_inner());
        recent.push_back(alert.clone());
        while recent.len() > self.capacity {
            recent.pop_front();
        }
        log::debug!("Dashboard received alert {}", alert.id);
        Ok(())
    }

    fn name(&self) -> &str {
        "dashboard"
    }
}

/// Structured log sink; severity selects the log level
#[derive(Debug, Default)]
pub struct LogNotifier;

impl LogNotifier {
    /// Log level for a severity
    pub fn level_for(severity: AlertSeverity) -> log::Level {
        match severity {
            AlertSeverity::Critical => log::Level::Error,
            AlertSeverity::High => log::Level::Warn,
            AlertSeverity::Medium | AlertSeverity::Low => log::Level::Info,
        }
    }

    fn format_alert(alert: &Alert) -> String {
        format!(
            "alert_id={} subject={} strategy={} severity={} value={:.2}L message=\"{}\"",
            alert.id, alert.subject_id, alert.strategy, alert.severity, alert.value, alert.message
        )
    }
}

impl Notifier for LogNotifier {
    fn notify(&self, alert: &Alert) -> Result<(), NotifyError> {
        log::log!(
            target: "hydrowatch::alerts",
            Self::level_for(alert.severity),
            "{}",
            Self::format_alert(alert)
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

/// Forwarding sink: formats the alert and sends it through a [`NotificationChannel`]
pub struct ChannelNotifier {
    channel: RwLock<Arc<dyn NotificationChannel>>,
    directory: Option<Arc<dyn SubjectDirectory>>,
    send_timeout: Duration,
}

impl ChannelNotifier {
    /// Create a forwarding sink over `channel`
    pub fn new(channel: Arc<dyn NotificationChannel>) -> Self {
        Self {
            channel: RwLock::new(channel),
            directory: None,
            send_timeout: DEFAULT_SEND_TIMEOUT,
        }
    }

    /// Builder: resolve destinations through a subject directory
    pub fn with_directory(mut self, directory: Arc<dyn SubjectDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Builder: bound on a single send
    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    /// Send bound in milliseconds, saturating at `u64::MAX`
    pub fn send_timeout_ms(&self) -> u64 {
        u64::try_from(self.send_timeout.as_millis()).unwrap_or(u64::MAX)
    }

    /// Swap the channel at runtime
    pub fn set_channel(&self, channel: Arc<dyn NotificationChannel>) {
        log::info!("Notification channel changed to {}", channel.channel_name());
        *self.channel.write().unwrap_or_else(|e| e.into_inner()) = channel;
    }

    /// Current channel
    pub fn channel(&self) -> Arc<dyn NotificationChannel> {
        Arc::clone(&self.channel.read().unwrap_or_else(|e| e.into_inner()))
    }

    /// Synthetic address used when the directory cannot resolve one
    pub fn fallback_destination(subject_id: SubjectId) -> String {
        format!("subject-{}@hydrowatch.local", subject_id)
    }

    /// Destination for a subject
    pub fn destination(&self, subject_id: SubjectId) -> String {
        self.directory
            .as_ref()
            .and_then(|d| d.resolve_destination(subject_id))
            .unwrap_or_else(|| Self::fallback_destination(subject_id))
    }

    /// Message text sent through the channel
    pub fn format_message(alert: &Alert) -> String {
        format!(
            "[{}] {} (Consumption: {:.2}L)",
            alert.severity, alert.message, alert.value
        )
    }

    /// Run the send on a helper thread so a stuck channel cannot hold the dispatch loop
    fn send_bounded(
        &self,
        channel: Arc<dyn NotificationChannel>,
        message: String,
        destination: String,
    ) -> Result<(), NotifyError> {
        let name = channel.channel_name().to_string();
        let (tx, rx) = mpsc::channel();
        let target = destination.clone();

        thread::Builder::new()
            .name(format!("notify-{}", name.to_lowercase()))
            .spawn(move || {
                let delivered = channel.send(&message, &target);
                // receiver may have timed out already
                let _ = tx.send(delivered);
            })?;

        match rx.recv_timeout(self.send_timeout) {
            Ok(true) => Ok(()),
            Ok(false) | Err(RecvTimeoutError::Disconnected) => Err(NotifyError::DeliveryFailed {
                channel: name,
                destination,
            }),
            Err(RecvTimeoutError::Timeout) => Err(NotifyError::Timeout {
                channel: name,
                timeout_ms: self.send_timeout_ms(),
            }),
        }
    }
}

impl Default for ChannelNotifier {
    fn default() -> Self {
        Self::new(Arc::new(ConsoleChannel::new()))
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, alert: &Alert) -> Result<(), NotifyError> {
        let channel = self.channel();

        if !channel.is_available() {
            log::warn!(
                "Channel {} unavailable, alert {} not forwarded",
                channel.channel_name(),
                alert.id
            );
            return Ok(());
        }

        let destination = self.destination(alert.subject_id);
        let message = Self::format_message(alert);
        let name = channel.channel_name().to_string();

        self.send_bounded(channel, message, destination)?;
        log::info!("Alert {} forwarded via {}", alert.id, name);
        Ok(())
    }

    fn name(&self) -> &str {
        "channel"
    }
}

/// Outcome of one dispatch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Sinks that handled the alert
    pub delivered: usize,
    /// Sinks that returned an error or panicked
    pub failed: usize,
}

/// Notification manager
///
/// Holds the ordered sink list and dispatches alerts to every sink.
pub struct NotificationManager {
    notifiers: RwLock<Vec<Arc<dyn Notifier>>>,
}

impl NotificationManager {
    /// Create a notification manager without sinks
    pub fn new() -> Self {
        Self {
            notifiers: RwLock::new(Vec::new()),
        }
    }

    /// Append a sink; delivery follows attachment order
    pub fn attach(&self, notifier: Arc<dyn Notifier>) {
        log::info!("Notifier attached: {}", notifier.name());
        self.notifiers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(notifier);
    }

    /// Remove a previously attached sink (by identity)
    pub fn detach(&self, notifier: &Arc<dyn Notifier>) -> bool {
        let mut notifiers = self.notifiers.write().unwrap_or_else(|e| e.into_inner());
        let before = notifiers.len();
        notifiers.retain(|n| !Arc::ptr_eq(n, notifier));
        let removed = notifiers.len() != before;
        if removed {
            log::info!("Notifier detached: {}", notifier.name());
        }
        removed
    }

    /// Send an alert to all sinks
    pub fn dispatch(&self, alert: &Alert) -> DispatchReport {
        let notifiers: Vec<Arc<dyn Notifier>> = self
            .notifiers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();

        log::debug!("Dispatching alert {} to {} notifiers", alert.id, notifiers.len());

        let mut report = DispatchReport::default();
        for notifier in &notifiers {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| notifier.notify(alert)));
            match outcome {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(e)) => {
                    report.failed += 1;
                    log::warn!("Failed to notify via {}: {}", notifier.name(), e);
                }
                Err(_) => {
                    report.failed += 1;
                    log::error!("Notifier {} panicked on alert {}", notifier.name(), alert.id);
                }
            }
        }
        report
    }

    /// Names of attached sinks in delivery order
    pub fn notifier_names(&self) -> Vec<String> {
        self.notifiers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|n| n.name().to_string())
            .collect()
    }

    /// Get number of attached sinks
    pub fn notifier_count(&self) -> usize {
        self.notifiers.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Default for NotificationManager {
    fn default() -> Self {
        Self::new()
    }
}
