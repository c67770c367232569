//! Companion challenge server configuration

use crate::error::ConfigResult;
use crate::validation::{validate_required_string, validate_socket_addr, Validatable};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Companion challenge-response process started alongside a run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChallengeServerConfig {
    /// Whether to launch the process at all
    #[serde(default = "crate::domains::utils::default_false")]
    pub enabled: bool,

    /// Executable to launch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binary: Option<PathBuf>,

    /// Arguments placed before the address flags
    #[serde(default)]
    pub args: Vec<String>,

    /// RPC address the challenge server listens on
    #[serde(default = "default_rpc_addr")]
    pub rpc_addr: String,

    /// Address for answering HTTP-01 challenges
    #[serde(default = "default_http_one_addr")]
    pub http_one_addr: String,

    /// How long to wait after SIGTERM before killing (milliseconds)
    #[serde(
        with = "crate::domains::utils::serde_duration_millis",
        default = "default_shutdown_grace"
    )]
    pub shutdown_grace: Duration,
}

impl ChallengeServerConfig {
    /// Full argument list passed to the process
    pub fn command_args(&self) -> Vec<String> {
        let mut args = self.args.clone();
        args.push(format!("--rpc-addr={}", self.rpc_addr));
        args.push(format!("--http-one-addr={}", self.http_one_addr));
        args
    }
}

impl Default for ChallengeServerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            binary: None,
            args: Vec::new(),
            rpc_addr: default_rpc_addr(),
            http_one_addr: default_http_one_addr(),
            shutdown_grace: default_shutdown_grace(),
        }
    }
}

impl Validatable for ChallengeServerConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_socket_addr(&self.rpc_addr, "rpc_addr", self.domain_name())?;
        validate_socket_addr(&self.http_one_addr, "http_one_addr", self.domain_name())?;

        if self.enabled {
            match &self.binary {
                Some(binary) => validate_required_string(
                    &binary.to_string_lossy(),
                    "binary",
                    self.domain_name(),
                )?,
                None => {
                    return Err(self.validation_error(
                        "binary is required when the challenge server is enabled",
                    ))
                }
            }
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "challenge_server"
    }
}

// Default value functions
fn default_rpc_addr() -> String {
    "localhost:6060".to_string()
}

fn default_http_one_addr() -> String {
    "localhost:5002".to_string()
}

fn default_shutdown_grace() -> Duration {
    Duration::from_millis(2000)
}
