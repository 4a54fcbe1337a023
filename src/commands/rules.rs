//! Rules command implementation

use crate::cli::args::RulesArgs;
use crate::cli::output::{print_output, RuleEntry, RuleList};
use crate::cli::Cli;
use crate::commands::load_settings;
use crate::config::ConfigBuilder;
use crate::error::Result;
use crate::repository::InMemoryReadings;
use crate::services::AlertService;
use std::sync::Arc;

/// List the rules created from the alert configuration
pub fn run_rules(args: &RulesArgs, cli: &Cli) -> Result<()> {
    let (config, alerts) = load_settings(cli, ConfigBuilder::new())?;
    let service = AlertService::new(&config, &alerts, Arc::new(InMemoryReadings::new()))?;
    let manager = service.manager();

    let rules = match args.subject {
        Some(subject) => manager.rules().by_subject(subject),
        None => manager.rules().all(),
    };

    let list = RuleList {
        rules: rules.iter().map(RuleEntry::from).collect(),
        strategies: manager.registry().tags(),
    };
    print_output(&list, cli.format)?;
    Ok(())
}
