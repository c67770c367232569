use anyhow::{Context, Result};
use clap::Parser;
use loadgen_config::{ConfigLoader, LoadGenConfig};
use loadgen_logging::{init_logging_from_config, LogLevel};
use loadgen_wfe::LoadState;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

mod cli;
use cli::{Cli, Commands, ConfigCommands, RunArgs};

/// Load configuration from file or use defaults
fn load_config(config_path: Option<&PathBuf>) -> Result<LoadGenConfig> {
    let loader = ConfigLoader::new();

    match config_path {
        Some(path) => {
            if path.exists() {
                loader
                    .from_file(path)
                    .context(format!("Failed to load configuration from {:?}", path))
            } else {
                warn!("Configuration file not found: {:?}. Using defaults.", path);
                loader
                    .from_env()
                    .context("Failed to load configuration from environment")
            }
        }
        None => loader
            .from_env()
            .context("Failed to load configuration from environment"),
    }
}

/// Fold command-line overrides into the loaded configuration
fn apply_run_args(config: &mut LoadGenConfig, args: &RunArgs) -> Result<()> {
    let target = &mut config.target;
    if let Some(api_base) = &args.api_base {
        target.api_base = api_base.clone();
    }
    if let Some(rate) = args.rate {
        target.rate = rate;
    }
    if let Some(runtime) = args.runtime {
        target.runtime = Duration::from_secs(runtime);
    }
    if let Some(terms_url) = &args.terms_url {
        target.terms_url = terms_url.clone();
    }
    if let Some(domain_base) = &args.domain_base {
        target.domain_base = domain_base.clone();
    }
    if let Some(max) = args.max_registrations {
        target.max_registrations = Some(max);
    }

    let persistence = &mut config.persistence;
    if args.snapshot_in.is_some() {
        persistence.snapshot_in = args.snapshot_in.clone();
    }
    if args.snapshot_out.is_some() {
        persistence.snapshot_out = args.snapshot_out.clone();
    }
    if args.latency_report.is_some() {
        persistence.latency_report = args.latency_report.clone();
    }

    if let Some(binary) = &args.challenge_server {
        config.challenge_server.enabled = true;
        config.challenge_server.binary = Some(binary.clone());
    }
    if args.no_challenge_server {
        config.challenge_server.enabled = false;
    }

    config
        .validate_all()
        .context("Invalid configuration after applying command-line overrides")
}

/// Restore, run, report and save
async fn run_command(mut config: LoadGenConfig, args: &RunArgs) -> Result<()> {
    apply_run_args(&mut config, args)?;

    let state = Arc::new(LoadState::new(&config).context("Failed to initialise load generator")?);

    if let Some(path) = &config.persistence.snapshot_in {
        let summary = state
            .load_snapshot(path)
            .await
            .context(format!("Failed to restore snapshot from {:?}", path))?;
        info!(
            "Restored {} registrations from {:?} ({} skipped)",
            summary.restored, path, summary.skipped
        );
    }

    let interrupt = Arc::clone(&state);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, draining in-flight calls");
            interrupt.stop();
        }
    });

    info!(
        "Starting load against {} at {}/s for {:?}",
        config.target.api_base, config.target.rate, config.target.runtime
    );
    let summary = state.run().await.context("Load generation run failed")?;
    info!(
        "Dispatched {} calls, {} completed, in {:?}",
        summary.dispatched, summary.completed, summary.elapsed
    );

    state
        .dump(config.persistence.latency_report.as_deref())
        .context("Failed to write latency report")?;

    if let Some(path) = &config.persistence.snapshot_out {
        state
            .save_snapshot(path)
            .await
            .context(format!("Failed to save snapshot to {:?}", path))?;
    }

    Ok(())
}

/// Validate a configuration file
fn handle_config_validate(config_file: &PathBuf) -> Result<()> {
    info!("Validating configuration file: {:?}", config_file);

    if !config_file.exists() {
        return Err(anyhow::anyhow!(
            "Configuration file not found: {:?}",
            config_file
        ));
    }

    match ConfigLoader::new().from_file(config_file) {
        Ok(_config) => {
            println!("Configuration file is valid");
            Ok(())
        }
        Err(e) => {
            error!("Configuration validation failed: {}", e);
            Err(e).context("Configuration validation failed")
        }
    }
}

/// Write a sample configuration file
fn handle_config_generate(output: &PathBuf, force: bool) -> Result<()> {
    if output.exists() && !force {
        return Err(anyhow::anyhow!(
            "Output file already exists: {:?}. Use --force to overwrite.",
            output
        ));
    }

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent).context("Failed to create output directory")?;
    }

    fs::write(output, LoadGenConfig::generate_sample())
        .context(format!("Failed to write configuration to {:?}", output))?;
    println!("Sample configuration written to {:?}", output);
    Ok(())
}

/// Print the configuration in use
fn handle_config_show(config: &LoadGenConfig, format: &str) -> Result<()> {
    let output = match format.to_lowercase().as_str() {
        "json" => serde_json::to_string_pretty(config).context("Failed to serialize config")?,
        "yaml" => serde_yaml::to_string(config).context("Failed to serialize config")?,
        other => return Err(anyhow::anyhow!("Unsupported format: {}", other)),
    };
    println!("{}", output);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first
    let mut config = load_config(cli.config.as_ref())?;
    if let Some(level) = &cli.log_level {
        config.logging.level = level
            .parse::<LogLevel>()
            .map_err(anyhow::Error::msg)
            .context("Invalid --log-level")?;
    }

    init_logging_from_config(&config.logging)?;
    debug!("Load generator starting");

    match &cli.command {
        Some(Commands::Run(args)) => run_command(config, args).await,
        Some(Commands::Config { config_cmd }) => match config_cmd {
            ConfigCommands::Validate { config_file } => handle_config_validate(config_file),
            ConfigCommands::Generate { output, force } => handle_config_generate(output, *force),
            ConfigCommands::Show { format } => handle_config_show(&config, format),
        },
        None => {
            // If no subcommand is provided, print help
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            cmd.print_help().context("Failed to print help")?;
            println!();
            Ok(())
        }
    }
}
