//! Alert manager implementation
//!
//! Evaluates a subject's rules against a consumption value, materializes alerts for
//! violations and hands each new alert to the notification fan-out.

use super::notifier::NotificationManager;
use super::rules::RuleStore;
use super::types::{Alert, AlertId, AlertSeverity, Rule, RuleId, SubjectId};
use crate::analysis::{AnalysisStrategy, Observation, StrategyRegistry};
use crate::error::{AppError, Result};
use crate::repository::SubjectDirectory;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// Alert manager configuration
#[derive(Debug, Clone)]
pub struct AlertManagerConfig {
    /// Whether alerting is enabled
    pub enabled: bool,
    /// Age in days after which alerts are purged by [`AlertManager::purge_expired`]
    pub retention_days: u32,
}

impl Default for AlertManagerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            retention_days: 90,
        }
    }
}

/// Snapshot of engine counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AlertStatistics {
    pub rules: usize,
    pub active_rules: usize,
    pub alerts: usize,
    pub active_alerts: usize,
    pub by_severity: BTreeMap<AlertSeverity, usize>,
    pub strategies: usize,
    pub notifiers: usize,
}

struct AlertHistory {
    alerts: Vec<Alert>,
    next_id: AlertId,
}

/// Alert manager
///
/// Owns the alert history; shares the rule store, strategy registry and fan-out with
/// the rest of the application.
pub struct AlertManager {
    rules: Arc<RuleStore>,
    registry: Arc<StrategyRegistry>,
    notifications: Arc<NotificationManager>,
    directory: Option<Arc<dyn SubjectDirectory>>,
    history: RwLock<AlertHistory>,
    config: AlertManagerConfig,
}

impl AlertManager {
    /// Create a new alert manager
    pub fn new(
        rules: Arc<RuleStore>,
        registry: Arc<StrategyRegistry>,
        notifications: Arc<NotificationManager>,
    ) -> Self {
        Self {
            rules,
            registry,
            notifications,
            directory: None,
            history: RwLock::new(AlertHistory {
                alerts: Vec::new(),
                next_id: 1,
            }),
            config: AlertManagerConfig::default(),
        }
    }

    /// Builder: validate subjects against a directory when configuring rules
    pub fn with_directory(mut self, directory: Arc<dyn SubjectDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Builder: engine configuration
    pub fn with_config(mut self, config: AlertManagerConfig) -> Self {
        self.config = config;
        self
    }

    /// Configure a new rule for a subject
    pub fn configure_rule(
        &self,
        subject_id: SubjectId,
        strategy: &str,
        parameter: &str,
    ) -> Result<RuleId> {
        if let Some(directory) = &self.directory {
            if !directory.exists(subject_id) {
                return Err(AppError::SubjectNotFound(subject_id));
            }
        }

        if !self.registry.contains(strategy.trim()) {
            log::warn!(
                "Rule for subject {} uses unregistered strategy '{}'; it is skipped until one is registered",
                subject_id,
                strategy.trim()
            );
        }

        Ok(self.rules.create(subject_id, strategy, parameter)?)
    }

    /// Deactivate a rule; false if the id is unknown
    pub fn deactivate_rule(&self, rule_id: RuleId) -> bool {
        self.rules.deactivate(rule_id)
    }

    /// Register (or replace) an analysis strategy
    pub fn register_strategy(&self, tag: impl Into<String>, strategy: Arc<dyn AnalysisStrategy>) {
        self.registry.register(tag, strategy);
    }

    /// Evaluate every active rule of a subject against `value`
    ///
    /// Each violated rule produces one alert, dispatched once. Returns whether any rule
    /// fired.
    pub fn check_subject(&self, subject_id: SubjectId, value: f64) -> bool {
        !self.check_subject_alerts(subject_id, value).is_empty()
    }

    /// Like [`check_subject`](Self::check_subject), returning the alerts this call fired
    ///
    /// Only alerts created by this evaluation are returned, even when other checks of the
    /// same subject run concurrently.
    pub fn check_subject_alerts(&self, subject_id: SubjectId, value: f64) -> Vec<Alert> {
        if !self.config.enabled {
            log::debug!("Alerting disabled, subject {} not evaluated", subject_id);
            return Vec::new();
        }

        let observation = Observation::new(subject_id, value);
        let mut fired = Vec::new();

        for rule in self.rules.by_subject(subject_id) {
            if !rule.active {
                continue;
            }

            let Some(strategy) = self.registry.resolve(&rule.strategy) else {
                log::warn!("No strategy registered for '{}', skipping {}", rule.strategy, rule);
                continue;
            };

            if !strategy.violates(&observation, &rule.parameter) {
                log::debug!("{} not violated by {:.2}L", rule, value);
                continue;
            }

            let severity =
                AlertSeverity::classify(value, strategy.severity_basis(&rule.parameter));
            let message = strategy.explain(&observation, &rule.parameter);
            let alert = self.record(&rule, value, message, severity);

            log::info!("Alert fired: {}", alert);
            self.notifications.dispatch(&alert);
            fired.push(alert);
        }

        fired
    }

    fn record(&self, rule: &Rule, value: f64, message: String, severity: AlertSeverity) -> Alert {
        let mut history = self.history.write().unwrap_or_else(|e| e.into_inner());
        let id = history.next_id;
        history.next_id += 1;

        let alert = Alert::new(id, rule, value, message, severity);
        history.alerts.push(alert.clone());
        alert
    }

    /// Resolve an active alert; false if unknown or not active
    pub fn resolve(&self, alert_id: AlertId) -> bool {
        let mut history = self.history.write().unwrap_or_else(|e| e.into_inner());
        let resolved = history
            .alerts
            .iter_mut()
            .find(|a| a.id == alert_id)
            .is_some_and(|a| a.resolve());

        if resolved {
            log::info!("Alert {} resolved", alert_id);
        }
        resolved
    }

    /// Remove alerts fired more than `days` days ago, whatever their status
    pub fn purge_older_than(&self, days: u32) -> usize {
        self.purge_older_than_at(days, Utc::now())
    }

    /// [`purge_older_than`](Self::purge_older_than) against an explicit clock
    pub fn purge_older_than_at(&self, days: u32, now: DateTime<Utc>) -> usize {
        let cutoff = now - Duration::days(i64::from(days));
        let mut history = self.history.write().unwrap_or_else(|e| e.into_inner());
        let before = history.alerts.len();
        history.alerts.retain(|a| a.fired_at >= cutoff);
        let removed = before - history.alerts.len();

        if removed > 0 {
            log::info!("Purged {} alerts older than {} days", removed, days);
        }
        removed
    }

    /// Purge using the configured retention
    pub fn purge_expired(&self) -> usize {
        self.purge_older_than(self.config.retention_days)
    }

    /// All alerts in firing order
    pub fn alerts(&self) -> Vec<Alert> {
        self.history
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .alerts
            .clone()
    }

    /// Alerts still active
    pub fn active_alerts(&self) -> Vec<Alert> {
        let history = self.history.read().unwrap_or_else(|e| e.into_inner());
        history.alerts.iter().filter(|a| a.is_active()).cloned().collect()
    }

    /// Alerts of one subject
    pub fn alerts_for_subject(&self, subject_id: SubjectId) -> Vec<Alert> {
        let history = self.history.read().unwrap_or_else(|e| e.into_inner());
        history.alerts
            .iter()
            .filter(|a| a.subject_id == subject_id)
            .cloned()
            .collect()
    }

    /// Alert by id
    pub fn alert(&self, alert_id: AlertId) -> Option<Alert> {
        let history = self.history.read().unwrap_or_else(|e| e.into_inner());
        history.alerts.iter().find(|a| a.id == alert_id).cloned()
    }

    /// Shared rule store
    pub fn rules(&self) -> &Arc<RuleStore> {
        &self.rules
    }

    /// Shared strategy registry
    pub fn registry(&self) -> &Arc<StrategyRegistry> {
        &self.registry
    }

    /// Shared notification fan-out
    pub fn notifications(&self) -> &Arc<NotificationManager> {
        &self.notifications
    }

    /// Get alert and rule counters
    pub fn statistics(&self) -> AlertStatistics {
        let history = self.history.read().unwrap_or_else(|e| e.into_inner());
        let mut by_severity = BTreeMap::new();
        for alert in history.alerts.iter().filter(|a| a.is_active()) {
            *by_severity.entry(alert.severity).or_insert(0) += 1;
        }

        AlertStatistics {
            rules: self.rules.len(),
            active_rules: self.rules.active_rules().len(),
            alerts: history.alerts.len(),
            active_alerts: history.alerts.iter().filter(|a| a.is_active()).count(),
            by_severity,
            strategies: self.registry.len(),
            notifiers: self.notifications.notifier_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::types::AlertStatus;
    use crate::analysis::{DAILY_LIMIT, LEAK_DETECTION, MOVING_AVERAGE};
    use crate::error::ValidationError;
    use crate::mock::{FailingNotifier, RecordingNotifier};
    use crate::repository::{InMemoryReadings, InMemorySubjects};

    struct Fixture {
        manager: AlertManager,
        recorder: Arc<RecordingNotifier>,
    }

    fn fixture() -> Fixture {
        let registry = Arc::new(StrategyRegistry::with_defaults(Arc::new(
            InMemoryReadings::new(),
        )));
        let notifications = Arc::new(NotificationManager::new());
        let recorder = Arc::new(RecordingNotifier::new("recorder"));
        notifications.attach(recorder.clone());

        let manager = AlertManager::new(Arc::new(RuleStore::new()), registry, notifications);
        Fixture { manager, recorder }
    }

    #[test]
    fn test_alert_manager_creation() {
        let f = fixture();
        assert!(f.manager.config.enabled);
        assert!(f.manager.rules().is_empty());
        assert!(f.manager.alerts().is_empty());
    }

    #[test]
    fn test_daily_limit_scenario() {
        let f = fixture();
        f.manager.configure_rule(100, DAILY_LIMIT, "70").unwrap();

        assert!(!f.manager.check_subject(100, 50.0));
        assert!(f.manager.alerts().is_empty());

        assert!(f.manager.check_subject(100, 85.0));
        assert!(f.manager.check_subject(100, 150.0));

        let alerts = f.manager.alerts();
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].severity, AlertSeverity::Medium);
        assert_eq!(alerts[1].severity, AlertSeverity::Critical);
        assert_eq!(alerts[0].status, AlertStatus::Active);
        assert_eq!((alerts[0].id, alerts[1].id), (1, 2));
        assert_eq!(f.recorder.received_ids(), vec![1, 2]);
    }

    #[test]
    fn test_threshold_fires_iff_above() {
        let f = fixture();
        f.manager.configure_rule(1, DAILY_LIMIT, "70").unwrap();
        assert!(!f.manager.check_subject(1, 70.0));
        assert!(f.manager.check_subject(1, 70.01));
    }

    #[test]
    fn test_severity_is_monotonic_in_value() {
        let f = fixture();
        f.manager.configure_rule(1, DAILY_LIMIT, "70").unwrap();
        for v in (71..400).step_by(7) {
            f.manager.check_subject(1, v as f64);
        }
        let severities: Vec<AlertSeverity> =
            f.manager.alerts().iter().map(|a| a.severity).collect();
        assert!(severities.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(severities.first(), Some(&AlertSeverity::Low));
        assert_eq!(severities.last(), Some(&AlertSeverity::Critical));
    }

    #[test]
    fn test_non_numeric_parameter_falls_back() {
        let f = fixture();
        f.manager.configure_rule(1, DAILY_LIMIT, "abc").unwrap();
        assert!(!f.manager.check_subject(1, 69.0));
        assert!(f.manager.check_subject(1, 71.0));
        // no numeric basis
        assert_eq!(f.manager.alerts()[0].severity, AlertSeverity::Medium);
    }

    #[test]
    fn test_deactivated_rule_never_fires() {
        let f = fixture();
        let id = f.manager.configure_rule(1, DAILY_LIMIT, "70").unwrap();
        assert!(f.manager.deactivate_rule(id));
        assert!(!f.manager.check_subject(1, 1000.0));
        assert!(f.recorder.received_ids().is_empty());
        assert!(!f.manager.deactivate_rule(42));
    }

    #[test]
    fn test_unknown_strategy_is_skipped() {
        let f = fixture();
        f.manager.configure_rule(1, "NOT_REGISTERED", "1").unwrap();
        f.manager.configure_rule(1, DAILY_LIMIT, "10").unwrap();

        assert!(f.manager.check_subject(1, 20.0));
        let alerts = f.manager.alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].strategy, DAILY_LIMIT);
    }

    #[test]
    fn test_multiple_rules_fire_independently() {
        let f = fixture();
        f.manager.configure_rule(1, DAILY_LIMIT, "70").unwrap();
        f.manager.configure_rule(1, LEAK_DETECTION, "24h").unwrap();
        f.manager.configure_rule(1, MOVING_AVERAGE, "30").unwrap();

        // 96L/day: 4 L/h leak band, above limit, no history
        assert!(f.manager.check_subject(1, 96.0));
        assert_eq!(f.manager.alerts().len(), 3);
        assert_eq!(f.recorder.received_ids(), vec![1, 2, 3]);
    }

    #[test]
    fn test_other_subjects_unaffected() {
        let f = fixture();
        f.manager.configure_rule(1, DAILY_LIMIT, "70").unwrap();
        assert!(!f.manager.check_subject(2, 500.0));
    }

    #[test]
    fn test_resolve() {
        let f = fixture();
        f.manager.configure_rule(1, DAILY_LIMIT, "70").unwrap();
        f.manager.check_subject(1, 100.0);

        assert!(f.manager.resolve(1));
        assert_eq!(f.manager.alert(1).unwrap().status, AlertStatus::Resolved);
        assert!(!f.manager.resolve(1));
        assert!(f.manager.active_alerts().is_empty());
    }

    #[test]
    fn test_resolve_unknown_changes_nothing() {
        let f = fixture();
        f.manager.configure_rule(1, DAILY_LIMIT, "70").unwrap();
        f.manager.check_subject(1, 100.0);
        let before = f.manager.alerts();

        assert!(!f.manager.resolve(999));
        assert_eq!(f.manager.alerts(), before);
    }

    #[test]
    fn test_purge_older_than() {
        let f = fixture();
        f.manager.configure_rule(1, DAILY_LIMIT, "70").unwrap();
        f.manager.check_subject(1, 100.0);
        f.manager.check_subject(1, 200.0);
        f.manager.resolve(1);

        assert_eq!(f.manager.purge_older_than(30), 0);
        let later = Utc::now() + Duration::days(31);
        assert_eq!(f.manager.purge_older_than_at(30, later), 2);
        assert!(f.manager.alerts().is_empty());
    }

    #[test]
    fn test_configure_rule_validation() {
        let f = fixture();
        let err = f.manager.configure_rule(1, " ", "70").unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation(ValidationError::EmptyStrategyTag)
        ));
    }

    #[test]
    fn test_configure_rule_checks_directory() {
        let subjects = Arc::new(InMemorySubjects::new());
        subjects.register(100, None);
        let f = fixture();
        let manager = f.manager.with_directory(subjects);

        assert!(manager.configure_rule(100, DAILY_LIMIT, "70").is_ok());
        assert!(matches!(
            manager.configure_rule(200, DAILY_LIMIT, "70"),
            Err(AppError::SubjectNotFound(200))
        ));
    }

    #[test]
    fn test_failing_sink_does_not_stop_engine() {
        let f = fixture();
        f.manager.notifications().attach(Arc::new(FailingNotifier));
        f.manager.configure_rule(1, DAILY_LIMIT, "70").unwrap();

        assert!(f.manager.check_subject(1, 100.0));
        assert!(f.manager.check_subject(1, 110.0));
        assert_eq!(f.recorder.received_ids(), vec![1, 2]);
    }

    #[test]
    fn test_disabled_manager() {
        let f = fixture();
        let manager = f.manager.with_config(AlertManagerConfig {
            enabled: false,
            ..Default::default()
        });
        manager.configure_rule(1, DAILY_LIMIT, "70").unwrap();
        assert!(!manager.check_subject(1, 1000.0));
    }

    #[test]
    fn test_statistics() {
        let f = fixture();
        f.manager.configure_rule(1, DAILY_LIMIT, "70").unwrap();
        let id = f.manager.configure_rule(2, DAILY_LIMIT, "70").unwrap();
        f.manager.deactivate_rule(id);
        f.manager.check_subject(1, 85.0);
        f.manager.check_subject(1, 150.0);
        f.manager.resolve(2);

        let stats = f.manager.statistics();
        assert_eq!(stats.rules, 2);
        assert_eq!(stats.active_rules, 1);
        assert_eq!(stats.alerts, 2);
        assert_eq!(stats.active_alerts, 1);
        assert_eq!(stats.by_severity.get(&AlertSeverity::Medium), Some(&1));
        assert_eq!(stats.by_severity.get(&AlertSeverity::Critical), None);
        assert_eq!(stats.strategies, 3);
        assert_eq!(stats.notifiers, 1);
    }

    #[test]
    fn test_check_subject_alerts_returns_fired_alerts() {
        let f = fixture();
        f.manager.configure_rule(1, DAILY_LIMIT, "70").unwrap();
        f.manager.configure_rule(1, LEAK_DETECTION, "24h").unwrap();

        assert!(f.manager.check_subject_alerts(1, 10.0).is_empty());
        let fired = f.manager.check_subject_alerts(1, 96.0);
        assert_eq!(fired.iter().map(|a| a.id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(fired, f.manager.alerts());
    }

    #[test]
    fn test_concurrent_checks_and_mutations() {
        const CHECKS: usize = 40;
        let f = fixture();
        for subject in 1..=4 {
            f.manager.configure_rule(subject, DAILY_LIMIT, "70").unwrap();
        }
        let doomed = f.manager.configure_rule(5, DAILY_LIMIT, "70").unwrap();
        let manager = &f.manager;

        let (fired, resolved) = std::thread::scope(|scope| {
            let checkers: Vec<_> = (1..=5)
                .map(|subject| {
                    scope.spawn(move || {
                        (0..CHECKS)
                            .flat_map(|i| manager.check_subject_alerts(subject, 100.0 + i as f64))
                            .map(|a| a.id)
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            let mutator = scope.spawn(move || {
                assert!(manager.deactivate_rule(doomed));
                let mut resolved = 0;
                for id in 1..=(5 * CHECKS as u64) {
                    if manager.resolve(id) {
                        resolved += 1;
                    }
                }
                resolved
            });

            let fired: Vec<AlertId> = checkers
                .into_iter()
                .flat_map(|h| h.join().unwrap())
                .collect();
            (fired, mutator.join().unwrap())
        });

        let total = fired.len();
        assert!(total >= 4 * CHECKS);

        let mut ids = fired;
        ids.sort_unstable();
        let expected: Vec<AlertId> = (1..=total as u64).collect();
        assert_eq!(ids, expected);

        let alerts = manager.alerts();
        assert_eq!(alerts.len(), total);
        let mut stored: Vec<AlertId> = alerts.iter().map(|a| a.id).collect();
        stored.sort_unstable();
        assert_eq!(stored, expected);

        let mut delivered = f.recorder.received_ids();
        delivered.sort_unstable();
        assert_eq!(delivered, expected);

        assert_eq!(manager.statistics().active_alerts, total - resolved);
        assert!(!manager.check_subject(5, 1000.0));
    }

    #[test]
    fn test_alerts_for_subject() {
        let f = fixture();
        f.manager.configure_rule(1, DAILY_LIMIT, "70").unwrap();
        f.manager.configure_rule(2, DAILY_LIMIT, "70").unwrap();
        f.manager.check_subject(1, 100.0);
        f.manager.check_subject(2, 100.0);
        f.manager.check_subject(2, 120.0);

        assert_eq!(f.manager.alerts_for_subject(1).len(), 1);
        assert_eq!(f.manager.alerts_for_subject(2).len(), 2);
    }
}
