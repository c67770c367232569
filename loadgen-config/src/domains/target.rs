//! Target API and traffic shape configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_required_string, validate_url, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Identity keys are Ed25519, which has a single key size.
pub const ED25519_KEY_BITS: u32 = 256;

/// Where traffic goes and how much of it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Base URL of the certificate API, without trailing slash
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Terms-of-service URL agreed to by new registrations
    #[serde(default = "default_terms_url")]
    pub terms_url: String,

    /// Parent domain for generated identifier names
    #[serde(default = "default_domain_base")]
    pub domain_base: String,

    /// Base actions per second
    #[serde(default = "default_rate")]
    pub rate: u64,

    /// How long the dispatch loop runs
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_runtime"
    )]
    pub runtime: Duration,

    /// Identity key size in bits.
    ///
    /// Identities are Ed25519 keys, so this is fixed at 256 and only
    /// checked for consistency with files written by other tools.
    #[serde(default = "default_key_size")]
    pub key_size: u32,

    /// Upper bound on simulated registrations; unbounded when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_registrations: Option<usize>,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            terms_url: default_terms_url(),
            domain_base: default_domain_base(),
            rate: default_rate(),
            runtime: default_runtime(),
            key_size: default_key_size(),
            max_registrations: None,
        }
    }
}

impl Validatable for TargetConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_url(&self.api_base, "api_base", self.domain_name())?;
        validate_url(&self.terms_url, "terms_url", self.domain_name())?;
        validate_required_string(&self.domain_base, "domain_base", self.domain_name())?;
        validate_positive(self.rate, "rate", self.domain_name())?;
        validate_positive(self.runtime.as_millis(), "runtime", self.domain_name())?;

        if self.api_base.ends_with('/') {
            return Err(self.validation_error("api_base must not end with '/'"));
        }

        if self.key_size != ED25519_KEY_BITS {
            return Err(self.validation_error(format!(
                "key_size must be {} (Ed25519), got {}",
                ED25519_KEY_BITS, self.key_size
            )));
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "target"
    }
}

// Default value functions
fn default_api_base() -> String {
    "http://localhost:4000".to_string()
}

fn default_terms_url() -> String {
    "http://127.0.0.1:4001/terms/v1".to_string()
}

fn default_domain_base() -> String {
    "com".to_string()
}

fn default_rate() -> u64 {
    1
}

fn default_runtime() -> Duration {
    Duration::from_secs(60)
}

fn default_key_size() -> u32 {
    ED25519_KEY_BITS
}
