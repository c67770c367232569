use anyhow::Result;
use loadgen_config::domains::logging::{LogFormat, LoggingConfig};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

/// Build the env filter for a logging configuration
///
/// `RUST_LOG` takes precedence when set; otherwise the configured level and
/// extra directives apply.
pub fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let mut filter = EnvFilter::try_new(config.level.to_string())?;
    for directive in &config.directives {
        let directive = directive
            .parse::<Directive>()
            .map_err(|e| anyhow::anyhow!("Invalid log directive '{}': {}", directive, e))?;
        filter = filter.add_directive(directive);
    }

    Ok(filter)
}

/// Initialize logging from configuration
pub fn init_logging_from_config(config: &LoggingConfig) -> Result<()> {
    let env_filter = build_env_filter(config)?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_file(config.include_location)
        .with_line_number(config.include_location);

    // Use try_init to avoid panic if global subscriber already set
    let result = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Text => builder.try_init(),
    };

    if result.is_err() {
        tracing::debug!("Global tracing subscriber already initialized, skipping");
    }

    Ok(())
}
