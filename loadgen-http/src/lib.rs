//! HTTP client functionality for the load generator
//!
//! Builds the shared `reqwest` client from the transport configuration and
//! provides the header helpers used when harvesting anti-replay nonces.

pub mod client;
pub mod config;
pub mod errors;
pub mod types;

// Re-export main types for convenience
pub use client::{build_client, header_value, location};
pub use config::HttpConfig;
pub use errors::HttpError;
pub use types::{HttpMethod, REPLAY_NONCE_HEADER};
