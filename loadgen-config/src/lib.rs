//! Domain-driven configuration for the load generator
//!
//! Configuration is split by functional domain (target API, HTTP transport,
//! logging, challenge server, persistence), loaded from YAML with
//! environment variable overrides, and validated per domain.

pub mod error;
pub mod loader;
pub mod validation;

// Domain-specific configuration modules
pub mod domains;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

// Re-export domain configurations
pub use domains::{
    challenge::ChallengeServerConfig, http::HttpConfig, logging::LoggingConfig,
    persistence::PersistenceConfig, target::TargetConfig, LoadGenConfig,
};

// Re-export utilities
pub use domains::utils::{serde_duration, serde_duration_millis};
