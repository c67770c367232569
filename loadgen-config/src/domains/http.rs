//! HTTP transport configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// HTTP transport configuration
///
/// Calls carry no overall request timeout; only establishing the
/// connection is bounded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// TCP connect timeout
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_connect_timeout"
    )]
    pub connect_timeout: Duration,

    /// TLS handshake timeout, added to the connect budget
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_tls_handshake_timeout"
    )]
    pub tls_handshake_timeout: Duration,

    /// Whether to verify server certificates
    #[serde(default = "crate::domains::utils::default_false")]
    pub verify_tls: bool,

    /// Whether to reuse connections between calls
    #[serde(default = "crate::domains::utils::default_false")]
    pub keep_alive: bool,

    /// User agent string
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl HttpConfig {
    /// Total time allowed to establish a connection, TLS included
    pub fn connect_budget(&self) -> Duration {
        self.connect_timeout + self.tls_handshake_timeout
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout(),
            tls_handshake_timeout: default_tls_handshake_timeout(),
            verify_tls: false,
            keep_alive: false,
            user_agent: default_user_agent(),
        }
    }
}

impl Validatable for HttpConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(
            self.connect_timeout.as_millis() as u64,
            "connect_timeout",
            self.domain_name(),
        )?;
        validate_positive(
            self.tls_handshake_timeout.as_millis() as u64,
            "tls_handshake_timeout",
            self.domain_name(),
        )?;

        validate_required_string(&self.user_agent, "user_agent", self.domain_name())?;

        if self.verify_tls {
            tracing::debug!("TLS verification enabled for load generation traffic");
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "http"
    }
}

// Default value functions
fn default_connect_timeout() -> Duration {
    Duration::from_secs(3)
}

fn default_tls_handshake_timeout() -> Duration {
    Duration::from_secs(2)
}

fn default_user_agent() -> String {
    concat!("loadgen/", env!("CARGO_PKG_VERSION")).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_config_defaults() {
        let config = HttpConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(3));
        assert_eq!(config.tls_handshake_timeout, Duration::from_secs(2));
        assert_eq!(config.connect_budget(), Duration::from_secs(5));
        assert!(!config.verify_tls);
        assert!(!config.keep_alive);
    }

    #[test]
    fn test_http_config_validation() {
        let mut config = HttpConfig::default();
        assert!(config.validate().is_ok());

        config.connect_timeout = Duration::from_secs(0);
        assert!(config.validate().is_err());

        config = HttpConfig::default();
        config.user_agent = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sub_second_timeouts_are_accepted() {
        let mut config = HttpConfig::default();
        config.connect_timeout = Duration::from_millis(250);
        config.tls_handshake_timeout = Duration::from_millis(500);
        assert!(config.validate().is_ok());
        assert_eq!(config.connect_budget(), Duration::from_millis(750));
    }

    #[test]
    fn test_zero_tls_handshake_timeout_is_rejected() {
        let mut config = HttpConfig::default();
        config.tls_handshake_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }
}
