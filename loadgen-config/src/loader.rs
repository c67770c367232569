//! Configuration loading and environment variable handling

use crate::domains::LoadGenConfig;
use crate::error::{ConfigError, ConfigResult};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with default prefix
    pub fn new() -> Self {
        Self {
            prefix: "LOADGEN".to_string(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load configuration from a YAML file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<LoadGenConfig> {
        let content = std::fs::read_to_string(path)?;
        let mut config: LoadGenConfig = serde_yaml::from_str(&content)?;

        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<LoadGenConfig> {
        let mut config = LoadGenConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(&self, config: &mut LoadGenConfig) -> ConfigResult<()> {
        self.apply_target_overrides(&mut config.target)?;
        self.apply_http_overrides(&mut config.http)?;
        self.apply_logging_overrides(&mut config.logging)?;
        self.apply_challenge_overrides(&mut config.challenge_server)?;
        self.apply_persistence_overrides(&mut config.persistence);
        Ok(())
    }

    /// Apply target config overrides
    fn apply_target_overrides(
        &self,
        config: &mut crate::domains::target::TargetConfig,
    ) -> ConfigResult<()> {
        if let Ok(api_base) = self.get_env_var("API_BASE") {
            config.api_base = api_base;
        }

        if let Ok(terms_url) = self.get_env_var("TERMS_URL") {
            config.terms_url = terms_url;
        }

        if let Ok(domain_base) = self.get_env_var("DOMAIN_BASE") {
            config.domain_base = domain_base;
        }

        if let Some(rate) = self.parse_env_var("RATE")? {
            config.rate = rate;
        }

        if let Some(seconds) = self.parse_env_var::<u64>("RUNTIME")? {
            config.runtime = std::time::Duration::from_secs(seconds);
        }

        if let Some(max_regs) = self.parse_env_var("MAX_REGISTRATIONS")? {
            config.max_registrations = Some(max_regs);
        }

        Ok(())
    }

    /// Apply HTTP config overrides
    fn apply_http_overrides(
        &self,
        config: &mut crate::domains::http::HttpConfig,
    ) -> ConfigResult<()> {
        if let Some(seconds) = self.parse_env_var::<u64>("HTTP_CONNECT_TIMEOUT")? {
            config.connect_timeout = std::time::Duration::from_secs(seconds);
        }

        if let Some(verify) = self.parse_env_var("HTTP_VERIFY_TLS")? {
            config.verify_tls = verify;
        }

        if let Ok(user_agent) = self.get_env_var("HTTP_USER_AGENT") {
            config.user_agent = user_agent;
        }

        Ok(())
    }

    /// Apply logging config overrides
    fn apply_logging_overrides(
        &self,
        config: &mut crate::domains::logging::LoggingConfig,
    ) -> ConfigResult<()> {
        if let Ok(log_level) = self.get_env_var("LOG_LEVEL") {
            config.level = crate::domains::logging::LogLevel::from_str(&log_level)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_LEVEL: {}", log_level)))?;
        }

        if let Ok(format) = self.get_env_var("LOG_FORMAT") {
            config.format = crate::domains::logging::LogFormat::from_str(&format)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_FORMAT: {}", format)))?;
        }

        Ok(())
    }

    /// Apply challenge server config overrides
    fn apply_challenge_overrides(
        &self,
        config: &mut crate::domains::challenge::ChallengeServerConfig,
    ) -> ConfigResult<()> {
        if let Some(enabled) = self.parse_env_var("CHALLENGE_SERVER_ENABLED")? {
            config.enabled = enabled;
        }

        if let Ok(binary) = self.get_env_var("CHALLENGE_SERVER_BINARY") {
            config.binary = Some(PathBuf::from(binary));
        }

        if let Ok(rpc_addr) = self.get_env_var("RPC_ADDR") {
            config.rpc_addr = rpc_addr;
        }

        if let Ok(http_one_addr) = self.get_env_var("HTTP_ONE_ADDR") {
            config.http_one_addr = http_one_addr;
        }

        Ok(())
    }

    /// Apply persistence config overrides
    fn apply_persistence_overrides(
        &self,
        config: &mut crate::domains::persistence::PersistenceConfig,
    ) {
        if let Ok(path) = self.get_env_var("SNAPSHOT_IN") {
            config.snapshot_in = Some(PathBuf::from(path));
        }

        if let Ok(path) = self.get_env_var("SNAPSHOT_OUT") {
            config.snapshot_out = Some(PathBuf::from(path));
        }

        if let Ok(path) = self.get_env_var("LATENCY_REPORT") {
            config.latency_report = Some(PathBuf::from(path));
        }
    }

    /// Parse an optional prefixed environment variable
    fn parse_env_var<T>(&self, name: &str) -> ConfigResult<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get_env_var(name) {
            Ok(value) => value
                .parse()
                .map(Some)
                .map_err(|e| ConfigError::EnvError(format!("Invalid {}: {}", name, e))),
            Err(_) => Ok(None),
        }
    }

    /// Get environment variable with prefix
    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
