//! Domain-specific configuration modules

pub mod challenge;
pub mod http;
pub mod logging;
pub mod persistence;
pub mod target;
pub mod utils;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Main load generator configuration combining all domains
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoadGenConfig {
    /// Target API and traffic shape
    #[serde(default)]
    pub target: target::TargetConfig,

    /// HTTP transport configuration
    #[serde(default)]
    pub http: http::HttpConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: logging::LoggingConfig,

    /// Companion challenge server process
    #[serde(default)]
    pub challenge_server: challenge::ChallengeServerConfig,

    /// Snapshot and report file locations
    #[serde(default)]
    pub persistence: persistence::PersistenceConfig,
}

impl LoadGenConfig {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.target.validate()?;
        self.http.validate()?;
        self.logging.validate()?;
        self.challenge_server.validate()?;
        self.persistence.validate()?;
        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let config = LoadGenConfig::default();
        serde_yaml::to_string(&config)
            .unwrap_or_else(|_| "# Failed to generate sample config".to_string())
    }
}
