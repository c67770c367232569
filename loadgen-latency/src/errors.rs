//! Latency recording error types

use thiserror::Error;

/// Errors raised while summarizing or writing a latency report
#[derive(Debug, Error)]
pub enum LatencyError {
    #[error("Histogram error: {0}")]
    Histogram(String),

    #[error("Failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),
}
