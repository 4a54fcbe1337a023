//! Alert configuration
//!
//! Provides TOML-based configuration for alert rules, strategy tuning and the
//! notification channel.

use super::channels::{ConsoleChannel, EmailChannel, LogChannel, NotificationChannel, PopupChannel};
use super::manager::{AlertManager, AlertManagerConfig};
use super::notifier::{DEFAULT_DASHBOARD_CAPACITY, DEFAULT_SEND_TIMEOUT};
use super::types::{RuleId, SubjectId};
use crate::analysis::{
    DailyLimitStrategy, LeakDetectionStrategy, MovingAverageStrategy, StrategyRegistry,
    DAILY_LIMIT, DEFAULT_DAILY_LIMIT, DEFAULT_DEVIATION_PERCENT, DEFAULT_LEAK_MIN_FLOW,
    LEAK_DETECTION, MOVING_AVERAGE,
};
use crate::error::{ConfigError, Result};
use crate::repository::ReadingRepository;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Alert configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Global alert settings
    #[serde(default)]
    pub settings: AlertSettings,
    /// SMTP settings for the email channel
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<EmailSettings>,
    /// Rules created at startup
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

impl AlertConfig {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().display().to_string();
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|_| ConfigError::FileNotFound(path_str.clone()))?;

        Ok(toml::from_str(&contents).map_err(|e| ConfigError::ParseError(format!("{}", e)))?)
    }

    /// Load from `path`, or the default path, falling back to defaults if absent
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::default_path);
        if path.exists() {
            log::debug!("Loading alert config from {}", path.display());
            Self::load(&path)
        } else {
            log::debug!("No alert config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseError(format!("Failed to serialize: {}", e)))?;

        fs::write(path.as_ref(), contents)?;

        Ok(())
    }

    /// Get default configuration path
    pub fn default_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("hydrowatch").join("alerts.toml")
        } else {
            PathBuf::from("alerts.toml")
        }
    }

    /// Example configuration with one rule per built-in strategy
    pub fn default_rules() -> Self {
        Self {
            settings: AlertSettings::default(),
            email: None,
            rules: vec![
                RuleConfig {
                    subject: 1,
                    strategy: DAILY_LIMIT.to_string(),
                    parameter: "70".to_string(),
                    enabled: true,
                },
                RuleConfig {
                    subject: 1,
                    strategy: MOVING_AVERAGE.to_string(),
                    parameter: "30".to_string(),
                    enabled: true,
                },
                RuleConfig {
                    subject: 1,
                    strategy: LEAK_DETECTION.to_string(),
                    parameter: "24h".to_string(),
                    enabled: true,
                },
            ],
        }
    }

    /// Channel selected by `settings.channel`
    pub fn build_channel(&self) -> Result<Arc<dyn NotificationChannel>> {
        let channel: Arc<dyn NotificationChannel> = match self.settings.parse_channel()? {
            ChannelKind::Console => Arc::new(ConsoleChannel::new()),
            ChannelKind::Log => Arc::new(LogChannel),
            ChannelKind::Popup => Arc::new(PopupChannel),
            ChannelKind::Email => match &self.email {
                Some(email) => Arc::new(EmailChannel::new(
                    email.server.clone(),
                    email.port,
                    email.sender.clone(),
                )),
                None => {
                    log::warn!("Email channel selected without [email] settings");
                    Arc::new(EmailChannel::unconfigured())
                }
            },
        };
        Ok(channel)
    }

    /// Registry of the built-in strategies tuned by `[settings]`
    pub fn build_registry(&self, readings: Arc<dyn ReadingRepository>) -> StrategyRegistry {
        let s = &self.settings;
        let registry = StrategyRegistry::new();
        registry.register(
            DAILY_LIMIT,
            Arc::new(DailyLimitStrategy::new(s.daily_limit_fallback)),
        );
        registry.register(
            MOVING_AVERAGE,
            Arc::new(
                MovingAverageStrategy::new(readings)
                    .with_fallback_percent(s.deviation_fallback_percent)
                    .with_alert_without_history(s.alert_without_history),
            ),
        );
        registry.register(
            LEAK_DETECTION,
            Arc::new(LeakDetectionStrategy::new(s.leak_min_flow)),
        );
        registry
    }

    /// Engine configuration
    pub fn manager_config(&self, retention_days: u32) -> AlertManagerConfig {
        AlertManagerConfig {
            enabled: self.settings.enabled,
            retention_days,
        }
    }

    /// Create every enabled rule in `manager`
    ///
    /// A rule that cannot be created is logged and skipped.
    pub fn apply_rules(&self, manager: &AlertManager) -> Vec<RuleId> {
        self.rules
            .iter()
            .filter(|r| r.enabled)
            .filter_map(|r| {
                match manager.configure_rule(r.subject, &r.strategy, &r.parameter) {
                    Ok(id) => Some(id),
                    Err(e) => {
                        log::warn!(
                            "Skipping rule {}({}) for subject {}: {}",
                            r.strategy,
                            r.parameter,
                            r.subject,
                            e
                        );
                        None
                    }
                }
            })
            .collect()
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self::default_rules()
    }
}

/// Notification channel kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Console,
    Log,
    Email,
    Popup,
}

/// Global alert settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertSettings {
    /// Whether alerting is enabled globally
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Alerts kept by the dashboard sink
    #[serde(default = "default_dashboard_capacity")]
    pub dashboard_capacity: usize,
    /// Channel used by the forwarding sink (console, log, email, popup)
    #[serde(default = "default_channel")]
    pub channel: String,
    /// Upper bound on a single channel send
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,
    /// Daily limit used when a rule parameter is not numeric
    #[serde(default = "default_daily_limit")]
    pub daily_limit_fallback: f64,
    /// Deviation used when a moving-average parameter is not numeric
    #[serde(default = "default_deviation_percent")]
    pub deviation_fallback_percent: f64,
    /// Lower bound of the leak band in liters per hour
    #[serde(default = "default_leak_min_flow")]
    pub leak_min_flow: f64,
    /// Whether a subject without history can trigger a moving-average alert
    #[serde(default = "default_true")]
    pub alert_without_history: bool,
}

impl AlertSettings {
    /// Parse the configured channel name
    pub fn parse_channel(&self) -> Result<ChannelKind> {
        match self.channel.to_lowercase().as_str() {
            "console" => Ok(ChannelKind::Console),
            "log" => Ok(ChannelKind::Log),
            "email" => Ok(ChannelKind::Email),
            "popup" => Ok(ChannelKind::Popup),
            _ => Err(ConfigError::InvalidValue {
                key: "channel".to_string(),
                message: format!("Unknown notification channel: {}", self.channel),
            })?,
        }
    }

    /// Send timeout as a duration
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            dashboard_capacity: DEFAULT_DASHBOARD_CAPACITY,
            channel: default_channel(),
            send_timeout_ms: default_send_timeout_ms(),
            daily_limit_fallback: DEFAULT_DAILY_LIMIT,
            deviation_fallback_percent: DEFAULT_DEVIATION_PERCENT,
            leak_min_flow: DEFAULT_LEAK_MIN_FLOW,
            alert_without_history: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_dashboard_capacity() -> usize {
    DEFAULT_DASHBOARD_CAPACITY
}

fn default_channel() -> String {
    "console".to_string()
}

fn default_send_timeout_ms() -> u64 {
    u64::try_from(DEFAULT_SEND_TIMEOUT.as_millis()).unwrap_or(u64::MAX)
}

fn default_daily_limit() -> f64 {
    DEFAULT_DAILY_LIMIT
}

fn default_deviation_percent() -> f64 {
    DEFAULT_DEVIATION_PERCENT
}

fn default_leak_min_flow() -> f64 {
    DEFAULT_LEAK_MIN_FLOW
}

/// SMTP settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailSettings {
    pub server: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub sender: String,
}

fn default_smtp_port() -> u16 {
    587
}

/// Rule configuration (TOML-friendly format)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Subject the rule belongs to
    pub subject: SubjectId,
    /// Strategy tag
    pub strategy: String,
    /// Raw strategy parameter
    pub parameter: String,
    /// Whether the rule is created at startup
    #[serde(default = "default_true")]
    pub enabled: bool,
}
