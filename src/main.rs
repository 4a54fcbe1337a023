//! hydrowatch - consumption alert tool
//!
//! A command-line tool that evaluates metered water consumption against per-subject
//! rules and notifies on violations.

use clap::Parser;
use hydrowatch::cli::args::{generate_completions, Cli, Commands};
use hydrowatch::commands::{run_check, run_rules, run_sweep};
use hydrowatch::error::{AppError, ConfigError};

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Set log level based on verbose flag
    if cli.verbose {
        log::set_max_level(log::LevelFilter::Debug);
    }

    // Run the appropriate command
    let result = run(&cli);

    if let Err(e) = result {
        log::error!("{}", e);
        print_error(&e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), AppError> {
    match &cli.command {
        Commands::Check(args) => run_check(args, cli),

        Commands::Sweep(args) => run_sweep(args, cli),

        Commands::Rules(args) => run_rules(args, cli),

        Commands::Completions { shell } => {
            generate_completions(*shell);
            Ok(())
        }
    }
}

fn print_error(err: &AppError) {
    eprintln!("Error: {}", err);

    // Print helpful hints for common errors
    match err {
        AppError::SubjectNotFound(_) => {
            eprintln!();
            eprintln!("Hint: Declare the subject and its meters under [[subjects]]");
            eprintln!("      in the configuration file (see --config).");
        }
        AppError::Config(ConfigError::FileNotFound(_)) => {
            eprintln!();
            eprintln!("Hint: Check the path passed with --config, --alerts or --readings.");
        }
        _ => {}
    }
}
