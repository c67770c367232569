//! CLI argument parsing definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "load-generator", author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Drive load against the certificate API
    Run(RunArgs),

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        config_cmd: ConfigCommands,
    },
}

/// Flags overriding the loaded configuration for one run
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Base URL of the certificate API
    #[arg(long, value_name = "URL")]
    pub api_base: Option<String>,

    /// Base actions per second
    #[arg(long, value_name = "N")]
    pub rate: Option<u64>,

    /// Run duration in seconds
    #[arg(long, value_name = "SECONDS")]
    pub runtime: Option<u64>,

    /// Terms-of-service URL agreed to by new registrations
    #[arg(long, value_name = "URL")]
    pub terms_url: Option<String>,

    /// Parent domain for generated names
    #[arg(long, value_name = "DOMAIN")]
    pub domain_base: Option<String>,

    /// Upper bound on stored registrations (0 for unbounded)
    #[arg(long, value_name = "N")]
    pub max_registrations: Option<usize>,

    /// Registration snapshot to restore before the run
    #[arg(long, value_name = "PATH")]
    pub snapshot_in: Option<PathBuf>,

    /// Where to save the registration snapshot after the run
    #[arg(long, value_name = "PATH")]
    pub snapshot_out: Option<PathBuf>,

    /// Where to write the latency report
    #[arg(long, value_name = "PATH")]
    pub latency_report: Option<PathBuf>,

    /// Challenge server executable to start alongside the run
    #[arg(long, value_name = "PATH", conflicts_with = "no_challenge_server")]
    pub challenge_server: Option<PathBuf>,

    /// Do not start the challenge server even if configured
    #[arg(long)]
    pub no_challenge_server: bool,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        #[arg(long, value_name = "PATH")]
        config_file: PathBuf,
    },

    /// Generate a sample configuration file
    Generate {
        /// Output file path
        #[arg(long, value_name = "PATH")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },

    /// Show current configuration in use
    Show {
        /// Output format: yaml, json
        #[arg(long, value_name = "FORMAT", default_value = "yaml")]
        format: String,
    },
}
