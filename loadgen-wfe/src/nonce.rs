//! Shared pool of anti-replay nonces
//!
//! Tokens are handed out oldest first and each one at most once. When the
//! pool is empty, or a caller asks for a fresh token, a `HEAD` request against
//! the API fetches one. Tokens are never validated locally; a stale one is
//! simply rejected by the server.

use crate::error::{WfeError, WfeResult};
use chrono::Utc;
use loadgen_http::{header_value, HttpMethod, REPLAY_NONCE_HEADER};
use loadgen_latency::{CallLatency, Outcome};
use parking_lot::RwLock;
use reqwest::Client;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

pub struct NoncePool {
    pool: RwLock<VecDeque<String>>,
    client: Client,
    api_base: String,
    latency: Arc<CallLatency>,
}

impl NoncePool {
    pub fn new(client: Client, api_base: impl Into<String>, latency: Arc<CallLatency>) -> Self {
        Self {
            pool: RwLock::new(VecDeque::new()),
            client,
            api_base: api_base.into(),
            latency,
        }
    }

    /// Take a token for a request to `endpoint`
    pub async fn acquire(&self, endpoint: &str, force_fresh: bool) -> WfeResult<String> {
        if !force_fresh {
            if let Some(nonce) = self.take_pooled() {
                return Ok(nonce);
            }
        }
        self.fetch(endpoint).await
    }

    /// Return a token harvested from a response
    pub fn release(&self, nonce: String) {
        self.pool.write().push_back(nonce);
    }

    pub fn len(&self) -> usize {
        self.pool.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.read().is_empty()
    }

    fn take_pooled(&self) -> Option<String> {
        if self.pool.read().is_empty() {
            return None;
        }
        // Another caller may drain the pool between the two locks; the
        // caller then falls back to a fetch.
        self.pool.write().pop_front()
    }

    async fn fetch(&self, endpoint: &str) -> WfeResult<String> {
        let url = format!("{}{}", self.api_base, endpoint);
        debug!("Fetching fresh nonce from {}", url);

        let sent = Utc::now();
        let response = self.client.head(&url).send().await;
        let finished = Utc::now();

        let result = match response {
            Ok(response) => header_value(response.headers(), REPLAY_NONCE_HEADER).ok_or_else(|| {
                WfeError::MissingNonce {
                    endpoint: endpoint.to_string(),
                }
            }),
            Err(e) => Err(WfeError::Transport(e)),
        };

        let outcome = if result.is_ok() {
            Outcome::Good
        } else {
            Outcome::Error
        };
        self.latency
            .add(&HttpMethod::Head.call_class(endpoint), sent, finished, outcome);

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_pool() -> NoncePool {
        // nothing listens here; only pooled tokens can be served
        NoncePool::new(
            Client::new(),
            "http://127.0.0.1:9",
            Arc::new(CallLatency::new("nonce test")),
        )
    }

    #[tokio::test]
    async fn test_pooled_tokens_are_fifo() {
        let pool = offline_pool();
        pool.release("first".to_string());
        pool.release("second".to_string());

        assert_eq!(pool.acquire("/acme/new-reg", false).await.unwrap(), "first");
        assert_eq!(pool.acquire("/acme/new-reg", false).await.unwrap(), "second");
        assert!(pool.is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_is_recorded() {
        let latency = Arc::new(CallLatency::new("nonce test"));
        let pool = NoncePool::new(Client::new(), "http://127.0.0.1:9", latency.clone());

        let result = pool.acquire("/acme/new-reg", false).await;
        assert!(matches!(result, Err(WfeError::Transport(_))));
        assert_eq!(latency.count("HEAD /acme/new-reg"), 1);
    }
}
