//! Signed request transport
//!
//! Every response that carries a `Replay-Nonce` feeds the nonce pool before
//! the response (or any later error reading it) reaches the caller.

use crate::error::WfeResult;
use crate::jws::JwsSigner;
use crate::nonce::NoncePool;
use loadgen_http::{header_value, REPLAY_NONCE_HEADER};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use serde::Serialize;
use std::sync::Arc;
use tracing::trace;

pub struct SigningTransport {
    client: Client,
    api_base: String,
    nonces: Arc<NoncePool>,
}

impl SigningTransport {
    pub fn new(client: Client, api_base: impl Into<String>, nonces: Arc<NoncePool>) -> Self {
        Self {
            client,
            api_base: api_base.into(),
            nonces,
        }
    }

    pub fn nonces(&self) -> &Arc<NoncePool> {
        &self.nonces
    }

    /// Absolute URL for an API path; absolute URLs pass through
    pub fn url(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            format!("{}{}", self.api_base, endpoint)
        }
    }

    pub async fn post(&self, endpoint: &str, body: Vec<u8>) -> WfeResult<Response> {
        let response = self
            .client
            .post(self.url(endpoint))
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        self.harvest(&response);
        Ok(response)
    }

    pub async fn get(&self, endpoint: &str) -> WfeResult<Response> {
        let response = self.client.get(self.url(endpoint)).send().await?;
        self.harvest(&response);
        Ok(response)
    }

    /// Serialized envelope of `payload` under a nonce acquired for `endpoint`
    pub async fn sign(
        &self,
        endpoint: &str,
        force_fresh: bool,
        payload: &[u8],
        signer: &JwsSigner,
    ) -> WfeResult<Vec<u8>> {
        let nonce = self.nonces.acquire(endpoint, force_fresh).await?;
        let envelope = signer.sign(payload, &nonce)?;
        Ok(serde_json::to_vec(&envelope)?)
    }

    /// Sign `payload` and post it, without retries
    pub async fn sign_and_send<T: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        payload: &T,
        force_fresh: bool,
        signer: &JwsSigner,
    ) -> WfeResult<Response> {
        let payload = serde_json::to_vec(payload)?;
        let body = self.sign(endpoint, force_fresh, &payload, signer).await?;
        self.post(endpoint, body).await
    }

    fn harvest(&self, response: &Response) {
        if let Some(nonce) = header_value(response.headers(), REPLAY_NONCE_HEADER) {
            trace!("Harvested nonce from {}", response.url());
            self.nonces.release(nonce);
        }
    }
}
