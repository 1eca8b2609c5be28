//! `suite` binary entry point.

use std::process::ExitCode;

use clap::Parser;

use suite_cli::cli::{Cli, Commands};
use suite_cli::commands;
use suite_cli::error::CliError;
use suite_cli::logging;
use suite_cli::output::OutputWriter;
use suite_core::config::{GeneralConfig, SuiteConfig};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let general = logging_config(&cli).await;
    if let Err(e) = logging::init_tracing(&general) {
        report_error(&e);
        return exit_code(&e);
    }

    tracing::debug!(config = %cli.config.display(), "suite starting");

    let writer = OutputWriter::new(cli.output);
    let result = match cli.command {
        Commands::Resolve(args) => commands::resolve::execute(args, &writer).await,
        Commands::Run(args) => commands::run::execute(args, &cli.config, &writer).await,
        Commands::Config(args) => commands::config::execute(args, &cli.config, &writer).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e);
            exit_code(&e)
        }
    }
}

/// Logging settings from the config file when it loads, defaults otherwise;
/// `--log-level` wins over both.
async fn logging_config(cli: &Cli) -> GeneralConfig {
    let mut general = match SuiteConfig::load(&cli.config).await {
        Ok(config) => config.general,
        Err(_) => {
            let mut config = SuiteConfig::default();
            config.apply_env_overrides();
            config.general
        }
    };
    if let Some(level) = &cli.log_level {
        general.log_level = level.clone();
    }
    general
}

fn report_error(e: &CliError) {
    use colored::Colorize;
    eprintln!("{} {}", "error:".red().bold(), e);
}

fn exit_code(e: &CliError) -> ExitCode {
    ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
}
