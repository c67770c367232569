//! Structured logging initialisation
//!
//! Thin layer over `tracing-subscriber` that turns the logging domain of
//! the load generator configuration into a global subscriber.

pub mod init;

pub use init::{build_env_filter, init_logging_from_config};
pub use loadgen_config::domains::logging::{LogFormat, LogLevel, LoggingConfig};
