//! HTTP configuration

use loadgen_config::domains::http::HttpConfig as ConfigHttpConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Connect timeout, TLS handshake included
    pub connect_timeout: Duration,

    /// User agent string
    pub user_agent: String,

    /// Whether to verify server certificates
    pub verify_tls: bool,

    /// Whether idle connections are kept for reuse
    pub keep_alive: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        ConfigHttpConfig::default().into()
    }
}

impl From<ConfigHttpConfig> for HttpConfig {
    fn from(config: ConfigHttpConfig) -> Self {
        Self {
            connect_timeout: config.connect_budget(),
            user_agent: config.user_agent,
            verify_tls: config.verify_tls,
            keep_alive: config.keep_alive,
        }
    }
}
