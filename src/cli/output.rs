//! Output formatting utilities
//!
//! Provides table and JSON output formatting for CLI commands.

use crate::alerts::{Alert, Rule};
use crate::cli::args::OutputFormat;
use crate::services::{CheckOutcome, SweepReport};
use serde::Serialize;
use std::io::{self, Write};

/// Format and print output based on the selected format
pub fn print_output<T: Serialize + TableDisplay>(data: &T, format: OutputFormat) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    match format {
        OutputFormat::Table => {
            writeln!(handle, "{}", data.to_table())?;
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string());
            writeln!(handle, "{}", json)?;
        }
        OutputFormat::Compact => {
            writeln!(handle, "{}", data.to_compact())?;
        }
    }

    Ok(())
}

/// Trait for types that can be displayed as a table
pub trait TableDisplay {
    /// Format as a table string
    fn to_table(&self) -> String;

    /// Format as a compact single line
    fn to_compact(&self) -> String {
        self.to_table().replace('\n', " | ")
    }
}

/// Alert entry for display
#[derive(Debug, Clone, Serialize)]
pub struct AlertEntry {
    pub id: u64,
    pub rule_id: u64,
    pub severity: String,
    pub strategy: String,
    pub value: f64,
    pub message: String,
    pub fired_at: String,
}

impl From<&Alert> for AlertEntry {
    fn from(alert: &Alert) -> Self {
        Self {
            id: alert.id,
            rule_id: alert.rule_id,
            severity: alert.severity.to_string(),
            strategy: alert.strategy.clone(),
            value: alert.value,
            message: alert.message.clone(),
            fired_at: alert.fired_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

impl TableDisplay for AlertEntry {
    fn to_table(&self) -> String {
        format!(
            "#{} [{}] {} (rule #{}, {})",
            self.id, self.severity, self.message, self.rule_id, self.strategy
        )
    }

    fn to_compact(&self) -> String {
        format!("{}:{}", self.id, self.severity)
    }
}

/// Result of a subject check for display
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub subject_id: i64,
    pub consumption: f64,
    pub window: Option<String>,
    pub fired: bool,
    pub alerts: Vec<AlertEntry>,
}

impl From<&CheckOutcome> for CheckReport {
    fn from(outcome: &CheckOutcome) -> Self {
        Self {
            subject_id: outcome.subject_id,
            consumption: outcome.value,
            window: outcome.window.map(|w| w.to_string()),
            fired: outcome.fired,
            alerts: outcome.alerts.iter().map(AlertEntry::from).collect(),
        }
    }
}

impl TableDisplay for CheckReport {
    fn to_table(&self) -> String {
        let mut output = format!("Subject {}\n", self.subject_id);
        output.push_str(&format!("  Consumption: {:.2}L\n", self.consumption));
        if let Some(window) = &self.window {
            output.push_str(&format!("  Window:      {}\n", window));
        }

        if self.alerts.is_empty() {
            output.push_str("  No rule violated\n");
        } else {
            output.push_str(&format!("  Alerts fired: {}\n", self.alerts.len()));
            for alert in &self.alerts {
                output.push_str(&format!("    {}\n", alert.to_table()));
            }
        }

        output
    }

    fn to_compact(&self) -> String {
        format!(
            "subject={} consumption={:.2} alerts={}",
            self.subject_id,
            self.consumption,
            self.alerts
                .iter()
                .map(|a| a.to_compact())
                .collect::<Vec<_>>()
                .join(",")
        )
    }
}

/// Rule entry for display
#[derive(Debug, Clone, Serialize)]
pub struct RuleEntry {
    pub id: u64,
    pub subject_id: i64,
    pub strategy: String,
    pub parameter: String,
    pub active: bool,
}

impl From<&Rule> for RuleEntry {
    fn from(rule: &Rule) -> Self {
        Self {
            id: rule.id,
            subject_id: rule.subject_id,
            strategy: rule.strategy.clone(),
            parameter: rule.parameter.clone(),
            active: rule.active,
        }
    }
}

/// Rule list for display
#[derive(Debug, Clone, Serialize)]
pub struct RuleList {
    pub rules: Vec<RuleEntry>,
    /// Registered strategy tags
    pub strategies: Vec<String>,
}

impl TableDisplay for RuleList {
    fn to_table(&self) -> String {
        let mut output = format!("Rules: {}\n", self.rules.len());
        output.push_str(&format!("Strategies: {}\n\n", self.strategies.join(", ")));

        for rule in &self.rules {
            let known = if self.strategies.contains(&rule.strategy) {
                ""
            } else {
                " (unregistered strategy)"
            };
            output.push_str(&format!(
                "  #{:<4} subject {:<8} {:<20} {:<8} {}{}\n",
                rule.id,
                rule.subject_id,
                rule.strategy,
                rule.parameter,
                if rule.active { "active" } else { "inactive" },
                known
            ));
        }

        output
    }

    fn to_compact(&self) -> String {
        self.rules
            .iter()
            .map(|r| format!("{}:{}:{}({})", r.id, r.subject_id, r.strategy, r.parameter))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Sweep summary for display
#[derive(Debug, Clone, Serialize)]
pub struct SweepSummary {
    pub sweep: u64,
    #[serde(flatten)]
    pub report: SweepReport,
}

impl TableDisplay for SweepSummary {
    fn to_table(&self) -> String {
        format!(
            "Sweep {}: {} subjects checked, {} with alerts ({} alerts), {} failed, {} purged",
            self.sweep,
            self.report.checked,
            self.report.fired,
            self.report.alerts,
            self.report.failed,
            self.report.purged
        )
    }

    fn to_compact(&self) -> String {
        format!(
            "sweep={} checked={} alerts={}",
            self.sweep, self.report.checked, self.report.alerts
        )
    }
}

/// Simple message output
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub message: String,
    pub success: bool,
}

impl TableDisplay for Message {
    fn to_table(&self) -> String {
        if self.success {
            format!("✓ {}", self.message)
        } else {
            format!("✗ {}", self.message)
        }
    }
}
