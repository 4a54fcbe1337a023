//! Alert service
//!
//! Wires configuration into the rule store, strategy registry, alert engine and default
//! sinks, and evaluates subjects' consumption on demand.

use crate::alerts::{
    Alert, AlertConfig, AlertManager, AlertStatistics, ChannelNotifier, DashboardNotifier,
    LogNotifier, NotificationChannel, NotificationManager, RuleStore, SubjectId,
};
use crate::config::Config;
use crate::domain::{AggregateConsumption, Consumption, MeterConsumption, TimeWindow};
use crate::error::{AppError, Result};
use crate::repository::{InMemorySubjects, ReadingRepository};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Result of evaluating one subject
#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    pub subject_id: SubjectId,
    /// Window the value was measured over; absent for a directly supplied value
    pub window: Option<TimeWindow>,
    pub value: f64,
    pub fired: bool,
    /// Alerts fired by this evaluation
    pub alerts: Vec<Alert>,
}

/// Alert service for consumption monitoring
pub struct AlertService {
    manager: Arc<AlertManager>,
    readings: Arc<dyn ReadingRepository>,
    dashboard: Arc<DashboardNotifier>,
    forwarder: Arc<ChannelNotifier>,
    meters: BTreeMap<SubjectId, Vec<String>>,
    window_hours: u32,
}

impl AlertService {
    /// Build the pipeline from configuration
    ///
    /// Sinks are attached in the order dashboard, log, channel.
    pub fn new(
        config: &Config,
        alerts: &AlertConfig,
        readings: Arc<dyn ReadingRepository>,
    ) -> Result<Self> {
        let subjects = Arc::new(InMemorySubjects::new());
        let mut meters = BTreeMap::new();
        for subject in &config.subjects {
            subjects.register(subject.id, subject.email.clone());
            meters.insert(subject.id, subject.meters.clone());
        }

        let notifications = Arc::new(NotificationManager::new());
        let dashboard = Arc::new(DashboardNotifier::new(alerts.settings.dashboard_capacity));
        let forwarder = Arc::new(
            ChannelNotifier::new(alerts.build_channel()?)
                .with_directory(subjects.clone())
                .with_send_timeout(alerts.settings.send_timeout()),
        );
        notifications.attach(dashboard.clone());
        notifications.attach(Arc::new(LogNotifier));
        notifications.attach(forwarder.clone());

        let registry = Arc::new(alerts.build_registry(readings.clone()));
        let manager = AlertManager::new(Arc::new(RuleStore::new()), registry, notifications)
            .with_directory(subjects)
            .with_config(alerts.manager_config(config.general.retention_days));

        let created = alerts.apply_rules(&manager);
        log::info!(
            "Alert service ready: {} subjects, {} rules",
            meters.len(),
            created.len()
        );

        Ok(Self {
            manager: Arc::new(manager),
            readings,
            dashboard,
            forwarder,
            meters,
            window_hours: config.general.window_hours,
        })
    }

    /// Composite consumption node over all meters of a subject
    pub fn consumption_for(&self, subject_id: SubjectId) -> Result<AggregateConsumption> {
        let points = self
            .meters
            .get(&subject_id)
            .ok_or(AppError::SubjectNotFound(subject_id))?;

        let mut node = AggregateConsumption::for_subject(subject_id);
        for point in points {
            node.add(Arc::new(MeterConsumption::new(
                point.clone(),
                self.readings.clone(),
            )));
        }
        Ok(node)
    }

    /// Evaluate a subject over the configured window ending now
    pub fn check_now(&self, subject_id: SubjectId) -> Result<CheckOutcome> {
        self.check_at(subject_id, Utc::now())
    }

    /// Evaluate a subject over the configured window ending at `end`
    pub fn check_at(&self, subject_id: SubjectId, end: DateTime<Utc>) -> Result<CheckOutcome> {
        let node = self.consumption_for(subject_id)?;
        let window = TimeWindow::trailing_hours(self.window_hours, end);
        let value = window.measure(&node);
        log::debug!("{} over {}: {:.2}L", node.description(), window, value);

        let mut outcome = self.evaluate(subject_id, value);
        outcome.window = Some(window);
        Ok(outcome)
    }

    /// Evaluate an externally measured value for a known subject
    pub fn check_value(&self, subject_id: SubjectId, value: f64) -> Result<CheckOutcome> {
        if !self.meters.contains_key(&subject_id) {
            return Err(AppError::SubjectNotFound(subject_id));
        }
        Ok(self.evaluate(subject_id, value))
    }

    fn evaluate(&self, subject_id: SubjectId, value: f64) -> CheckOutcome {
        let alerts = self.manager.check_subject_alerts(subject_id, value);
        // history is fed after evaluation so a value is not compared against itself
        self.readings.record_consumption(subject_id, value);

        CheckOutcome {
            subject_id,
            window: None,
            value,
            fired: !alerts.is_empty(),
            alerts,
        }
    }

    /// Swap the forwarding channel
    pub fn set_channel(&self, channel: Arc<dyn NotificationChannel>) {
        self.forwarder.set_channel(channel);
    }

    /// Configured subjects, ascending
    pub fn subjects(&self) -> Vec<SubjectId> {
        self.meters.keys().copied().collect()
    }

    /// Alert engine
    pub fn manager(&self) -> &Arc<AlertManager> {
        &self.manager
    }

    /// Dashboard sink
    pub fn dashboard(&self) -> &Arc<DashboardNotifier> {
        &self.dashboard
    }

    /// Rule, alert, strategy and sink counters
    pub fn statistics(&self) -> AlertStatistics {
        self.manager.statistics()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::{AlertSeverity, RuleConfig};
    use crate::analysis::{DAILY_LIMIT, MOVING_AVERAGE};
    use crate::config::SubjectConfig;
    use crate::domain::Reading;
    use crate::mock::{MockChannel, StallingNotifier};
    use std::thread;
    use std::time::Duration;
    use crate::repository::InMemoryReadings;

    fn at(hours: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_700_000_000 + hours * 3600, 0).unwrap()
    }

    fn config() -> Config {
        let mut config = Config::default();
        config.subjects.push(SubjectConfig {
            id: 100,
            email: Some("ana@example.com".to_string()),
            meters: vec!["SHA-1".to_string(), "SHA-2".to_string()],
        });
        config.subjects.push(SubjectConfig {
            id: 200,
            email: None,
            meters: Vec::new(),
        });
        config
    }

    fn alert_config(rules: &[(SubjectId, &str, &str)]) -> AlertConfig {
        let mut alerts = AlertConfig::default();
        alerts.settings.channel = "log".to_string();
        alerts.rules = rules
            .iter()
            .map(|(subject, strategy, parameter)| RuleConfig {
                subject: *subject,
                strategy: strategy.to_string(),
                parameter: parameter.to_string(),
                enabled: true,
            })
            .collect();
        alerts
    }

    fn readings() -> Arc<InMemoryReadings> {
        let readings = Arc::new(InMemoryReadings::new());
        readings.record_all([
            Reading::new("SHA-1", 1_000, at(0)),
            Reading::new("SHA-1", 1_050, at(20)),
            Reading::new("SHA-2", 500, at(1)),
            Reading::new("SHA-2", 540, at(23)),
        ]);
        readings
    }

    #[test]
    fn test_service_creation() {
        let service =
            AlertService::new(&config(), &alert_config(&[(100, DAILY_LIMIT, "70")]), readings())
                .unwrap();

        assert_eq!(service.subjects(), vec![100, 200]);
        let stats = service.statistics();
        assert_eq!(stats.rules, 1);
        assert_eq!(stats.strategies, 3);
        assert_eq!(stats.notifiers, 3);
        assert_eq!(
            service.manager().notifications().notifier_names(),
            vec!["dashboard", "log", "channel"]
        );
    }

    #[test]
    fn test_rules_for_unknown_subjects_are_skipped() {
        let service = AlertService::new(
            &config(),
            &alert_config(&[(100, DAILY_LIMIT, "70"), (999, DAILY_LIMIT, "70")]),
            readings(),
        )
        .unwrap();
        assert_eq!(service.manager().rules().len(), 1);
    }

    #[test]
    fn test_consumption_sums_meters() {
        let service = AlertService::new(&config(), &alert_config(&[]), readings()).unwrap();
        let node = service.consumption_for(100).unwrap();
        assert_eq!(node.len(), 2);
        assert_eq!(node.value(at(0), at(24)), 90.0);

        let empty = service.consumption_for(200).unwrap();
        assert_eq!(empty.value(at(0), at(24)), 0.0);

        assert!(matches!(
            service.consumption_for(7),
            Err(AppError::SubjectNotFound(7))
        ));
    }

    #[test]
    fn test_check_at_fires_and_dispatches() {
        let service =
            AlertService::new(&config(), &alert_config(&[(100, DAILY_LIMIT, "70")]), readings())
                .unwrap();
        let channel = Arc::new(MockChannel::new());
        service.set_channel(channel.clone());

        let outcome = service.check_at(100, at(24)).unwrap();
        assert!(outcome.fired);
        assert_eq!(outcome.value, 90.0);
        assert_eq!(outcome.window.unwrap().start, at(0));
        assert_eq!(outcome.alerts.len(), 1);
        assert_eq!(outcome.alerts[0].severity, AlertSeverity::Medium);

        assert_eq!(service.dashboard().len(), 1);
        let sent = channel.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1, "ana@example.com");
    }

    #[test]
    fn test_check_feeds_history_after_evaluation() {
        let readings = readings();
        let service = AlertService::new(
            &config(),
            &alert_config(&[(100, MOVING_AVERAGE, "30")]),
            readings.clone(),
        )
        .unwrap();

        // first sample: no history, average 0
        assert!(service.check_value(100, 50.0).unwrap().fired);
        assert_eq!(readings.history(100), vec![50.0]);

        // average 50, +30% -> 65
        assert!(!service.check_value(100, 60.0).unwrap().fired);
        assert!(service.check_value(100, 80.0).unwrap().fired);
    }

    #[test]
    fn test_check_value_reports_only_new_alerts() {
        let service =
            AlertService::new(&config(), &alert_config(&[(100, DAILY_LIMIT, "70")]), readings())
                .unwrap();

        assert_eq!(service.check_value(100, 80.0).unwrap().alerts.len(), 1);
        let outcome = service.check_value(100, 150.0).unwrap();
        assert_eq!(outcome.alerts.len(), 1);
        assert_eq!(outcome.alerts[0].id, 2);
        assert!(outcome.window.is_none());

        assert!(!service.check_value(100, 10.0).unwrap().fired);
    }

    #[test]
    fn test_overlapping_checks_report_their_own_alerts() {
        let service =
            AlertService::new(&config(), &alert_config(&[(100, DAILY_LIMIT, "70")]), readings())
                .unwrap();
        service
            .manager()
            .notifications()
            .attach(Arc::new(StallingNotifier::new(1, Duration::from_millis(300))));

        thread::scope(|scope| {
            let slow = scope.spawn(|| service.check_value(100, 100.0).unwrap());

            // wait until the first alert is recorded and its dispatch is stalled
            while service.manager().alert(1).is_none() {
                thread::sleep(Duration::from_millis(5));
            }
            let fast = service.check_value(100, 200.0).unwrap();
            let slow = slow.join().unwrap();

            let ids = |o: &CheckOutcome| o.alerts.iter().map(|a| a.id).collect::<Vec<_>>();
            assert_eq!(ids(&slow), vec![1]);
            assert_eq!(slow.alerts[0].value, 100.0);
            assert_eq!(ids(&fast), vec![2]);
            assert_eq!(fast.alerts[0].value, 200.0);
        });
    }

    #[test]
    fn test_check_unknown_subject() {
        let service = AlertService::new(&config(), &alert_config(&[]), readings()).unwrap();
        assert!(matches!(
            service.check_value(5, 1.0),
            Err(AppError::SubjectNotFound(5))
        ));
        assert!(service.check_now(5).is_err());
    }

    #[test]
    fn test_invalid_channel_is_config_error() {
        let mut alerts = alert_config(&[]);
        alerts.settings.channel = "carrier-pigeon".to_string();
        assert!(matches!(
            AlertService::new(&config(), &alerts, readings()),
            Err(AppError::Config(_))
        ));
    }
}
