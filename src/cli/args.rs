//! CLI argument definitions using clap derive
//!
//! Defines all command-line arguments and subcommands.

use chrono::{DateTime, Utc};
use clap::{ArgGroup, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// Consumption alert evaluation tool
///
/// Evaluate metered consumption against per-subject rules and notify on violations.
#[derive(Parser, Debug)]
#[command(name = "hydrowatch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "HYDROWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Path to alert rules file
    #[arg(long, global = true, env = "HYDROWATCH_ALERTS")]
    pub alerts: Option<PathBuf>,

    /// Length of the evaluated consumption window in hours
    #[arg(long, global = true)]
    pub window_hours: Option<u32>,

    /// Notification channel override
    #[arg(long, global = true, value_enum)]
    pub channel: Option<ChannelArg>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate one subject now
    Check(CheckArgs),

    /// Periodically evaluate every subject with active rules
    Sweep(SweepArgs),

    /// List configured rules
    Rules(RulesArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Arguments for the check command
#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("source").required(true).args(["value", "readings"])))]
pub struct CheckArgs {
    /// Subject to evaluate
    #[arg(short, long)]
    pub subject: i64,

    /// Consumption value in liters, evaluated as is
    #[arg(long)]
    pub value: Option<f64>,

    /// JSON file with meter readings
    #[arg(long, value_name = "FILE")]
    pub readings: Option<PathBuf>,

    /// End of the evaluated window (RFC 3339); defaults to the newest reading
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,
}

/// Arguments for the sweep command
#[derive(Parser, Debug)]
pub struct SweepArgs {
    /// JSON file with meter readings
    #[arg(long, value_name = "FILE")]
    pub readings: PathBuf,

    /// Sweep interval in seconds
    #[arg(short, long)]
    pub interval: Option<u64>,

    /// Run once and exit (single-use mode)
    #[arg(long)]
    pub single_use: bool,

    /// Alerts older than this many days are purged
    #[arg(long)]
    pub retention_days: Option<u32>,

    /// End of the first evaluated window (RFC 3339); defaults to the newest reading.
    /// Each later sweep moves it forward by the interval
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,
}

/// Arguments for the rules command
#[derive(Parser, Debug)]
pub struct RulesArgs {
    /// Only show rules of this subject
    #[arg(short, long)]
    pub subject: Option<i64>,
}

/// Notification channel argument
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelArg {
    Console,
    Log,
    Email,
    Popup,
}

impl ChannelArg {
    /// Channel name as used in the alert configuration
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Console => "console",
            Self::Log => "log",
            Self::Email => "email",
            Self::Popup => "popup",
        }
    }
}

/// Output format
#[derive(ValueEnum, Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format for machine parsing
    Json,
    /// Compact single-line format
    Compact,
}

/// Generate shell completions and print to stdout
pub fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
}
