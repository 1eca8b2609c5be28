//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Suite -- run-once deployment coordinator for test suites.
///
/// Use `suite <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "suite", version, about, long_about = None)]
pub struct Cli {
    /// Path to the suite.toml configuration file.
    #[arg(short, long, default_value = "suite.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Elect the suite deployment marker class from a manifest.
    Resolve(ResolveArgs),

    /// Simulate a full suite run against an in-memory host.
    Run(RunArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- resolve ----

/// Elect the marker class among the manifest's test classes.
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Path to the suite manifest.
    #[arg(short, long, default_value = "suite-manifest.toml")]
    pub manifest: PathBuf,
}

// ---- run ----

/// Simulate registration, startup, per-class events and teardown.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the suite manifest.
    #[arg(short, long, default_value = "suite-manifest.toml")]
    pub manifest: PathBuf,

    /// Emit every gate decision and deploy/undeploy action (overrides `[diagnostics] debug`).
    #[arg(long)]
    pub debug: bool,
}

// ---- config ----

/// Manage suite configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, diagnostics).
        #[arg(long)]
        section: Option<String>,
    },
}
