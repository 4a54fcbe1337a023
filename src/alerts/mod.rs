//! Alert and notification system
//!
//! Rule storage, rule evaluation against consumption values, and fan-out of fired alerts
//! to dashboard, log and channel sinks.

mod channels;
mod config;
mod manager;
mod notifier;
mod rules;
mod types;

pub use channels::{ConsoleChannel, EmailChannel, LogChannel, NotificationChannel, PopupChannel};
pub use config::{AlertConfig, AlertSettings, ChannelKind, EmailSettings, RuleConfig};
pub use manager::{AlertManager, AlertManagerConfig, AlertStatistics};
pub use notifier::{
    ChannelNotifier, DashboardNotifier, DispatchReport, LogNotifier, NotificationManager,
    Notifier, DEFAULT_DASHBOARD_CAPACITY, DEFAULT_SEND_TIMEOUT,
};
pub use rules::RuleStore;
pub use types::{Alert, AlertId, AlertSeverity, AlertStatus, Rule, RuleId, SubjectId};
