//! Error types for the dispatch engine

use thiserror::Error;

/// Result alias for dispatch engine operations
pub type WfeResult<T> = Result<T, WfeError>;

/// Dispatch engine errors
#[derive(Error, Debug)]
pub enum WfeError {
    /// Network or TLS failure, never retried
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The nonce fetch answered without a Replay-Nonce header
    #[error("Nonce header not supplied by {endpoint}")]
    MissingNonce { endpoint: String },

    /// Any other expected response header was absent
    #[error("{header} header not supplied by {endpoint}")]
    MissingHeader {
        header: &'static str,
        endpoint: String,
    },

    /// The API answered with a status the action did not expect
    #[error("Unexpected status {status} from {endpoint}")]
    UnexpectedStatus { endpoint: String, status: u16 },

    /// Persisted key material could not be decoded
    #[error("Invalid key material: {0}")]
    Parse(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Registration store is full ({0} registrations)")]
    CapacityReached(usize),

    #[error("Rate must be greater than 0 calls per second")]
    InvalidRate,

    #[error("Invalid dispatcher state: {0}")]
    InvalidState(String),

    #[error("HTTP error: {0}")]
    Http(#[from] loadgen_http::HttpError),

    /// Companion process failure
    #[error("Process error: {0}")]
    Process(#[from] loadgen_resilience::ShutdownError),

    #[error("Latency report error: {0}")]
    Latency(#[from] loadgen_latency::LatencyError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WfeError {
    /// Whether the remote service broke the protocol rather than the network
    pub fn is_protocol(&self) -> bool {
        matches!(
            self,
            WfeError::MissingNonce { .. }
                | WfeError::MissingHeader { .. }
                | WfeError::UnexpectedStatus { .. }
        )
    }
}
