//! Alert system domain types
//!
//! Defines the rule and alert records shared by the store, the engine and the sinks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of the user/account a rule is scoped to
pub type SubjectId = i64;

/// Rule identifier assigned by the rule store
pub type RuleId = u64;

/// Alert identifier assigned by the alert manager
pub type AlertId = u64;

/// Alert severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AlertSeverity {
    /// Slightly over the configured parameter
    #[serde(rename = "BAIXA")]
    Low,
    /// More than 20% over, or no usable parameter
    #[serde(rename = "MEDIA")]
    Medium,
    /// More than 50% over
    #[serde(rename = "ALTA")]
    High,
    /// More than double the parameter
    #[serde(rename = "CRITICA")]
    Critical,
}

impl AlertSeverity {
    /// Classify how far `value` exceeds the rule's numeric basis
    pub fn classify(value: f64, basis: f64) -> Self {
        if basis == 0.0 {
            return Self::Medium;
        }

        let excess_pct = (value - basis) / basis * 100.0;

        if excess_pct > 100.0 {
            Self::Critical
        } else if excess_pct > 50.0 {
            Self::High
        } else if excess_pct > 20.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "BAIXA"),
            Self::Medium => write!(f, "MEDIA"),
            Self::High => write!(f, "ALTA"),
            Self::Critical => write!(f, "CRITICA"),
        }
    }
}

/// Alert lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertStatus {
    /// Fired and not yet handled
    #[serde(rename = "ATIVO")]
    Active,
    /// Handled
    #[serde(rename = "RESOLVIDO")]
    Resolved,
    /// Dismissed by an operator; never set automatically
    #[serde(rename = "IGNORADO")]
    Ignored,
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "ATIVO"),
            Self::Resolved => write!(f, "RESOLVIDO"),
            Self::Ignored => write!(f, "IGNORADO"),
        }
    }
}

/// Rule configured for a subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Unique rule identifier
    pub id: RuleId,
    /// Subject the rule belongs to
    pub subject_id: SubjectId,
    /// Registry key of the analysis strategy
    pub strategy: String,
    /// Strategy-specific raw parameter ("70", "30", "24h")
    pub parameter: String,
    /// Whether the rule takes part in evaluation
    pub active: bool,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl Rule {
    /// Create a new active rule
    pub fn new(
        id: RuleId,
        subject_id: SubjectId,
        strategy: impl Into<String>,
        parameter: impl Into<String>,
    ) -> Self {
        Self {
            id,
            subject_id,
            strategy: strategy.into(),
            parameter: parameter.into(),
            active: true,
            created_at: Utc::now(),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rule #{} subject={} {}({}) {}",
            self.id,
            self.subject_id,
            self.strategy,
            self.parameter,
            if self.active { "active" } else { "inactive" }
        )
    }
}

/// Alert fired by a rule violation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Unique alert ID
    pub id: AlertId,
    /// Subject whose consumption violated the rule
    pub subject_id: SubjectId,
    /// Rule that fired
    pub rule_id: RuleId,
    /// Strategy tag of the rule
    pub strategy: String,
    /// Strategy-generated explanation
    pub message: String,
    /// Consumption value that was evaluated
    pub value: f64,
    /// Alert severity
    pub severity: AlertSeverity,
    /// Current status
    pub status: AlertStatus,
    /// Timestamp when the alert fired
    pub fired_at: DateTime<Utc>,
}

impl Alert {
    /// Create a new active alert for `rule`
    pub fn new(
        id: AlertId,
        rule: &Rule,
        value: f64,
        message: String,
        severity: AlertSeverity,
    ) -> Self {
        Self {
            id,
            subject_id: rule.subject_id,
            rule_id: rule.id,
            strategy: rule.strategy.clone(),
            message,
            value,
            severity,
            status: AlertStatus::Active,
            fired_at: Utc::now(),
        }
    }

    /// Mark alert as resolved; only an active alert can be resolved
    pub fn resolve(&mut self) -> bool {
        if self.status != AlertStatus::Active {
            return false;
        }
        self.status = AlertStatus::Resolved;
        true
    }

    /// Whether the alert is still active
    pub fn is_active(&self) -> bool {
        self.status == AlertStatus::Active
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "alert #{} subject={} [{}] {} ({:.2}L, {}, {})",
            self.id,
            self.subject_id,
            self.severity,
            self.message,
            self.value,
            self.strategy,
            self.status
        )
    }
}
