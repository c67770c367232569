//! Protocol actions executed by dispatched calls
//!
//! Failures stay inside the call: they are logged and tagged `error` in the
//! latency record, and never reach the dispatcher.

use crate::csr::build_csr;
use crate::error::{WfeError, WfeResult};
use crate::jws::JwsSigner;
use crate::registration::{Registration, RegistrationStore};
use crate::selector::ActionKind;
use crate::transport::SigningTransport;
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use loadgen_http::{location, HttpMethod};
use loadgen_latency::{CallLatency, Outcome};
use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::{Response, StatusCode};
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

pub const NEW_REG_PATH: &str = "/acme/new-reg";
pub const NEW_AUTHZ_PATH: &str = "/acme/new-authz";
pub const NEW_CERT_PATH: &str = "/acme/new-cert";
pub const REVOKE_CERT_PATH: &str = "/acme/revoke-cert";
/// Latency class used when fetching an issued certificate
pub const CERT_PATH: &str = "/acme/cert";

const NAME_LABEL_LEN: usize = 12;

/// Runs one action for one call
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    /// `registration` is the identity drawn for this call, if any existed
    async fn execute(&self, action: ActionKind, registration: Option<Arc<Registration>>);
}

/// Actions against an ACME-style issuance API
pub struct AcmeActions {
    transport: Arc<SigningTransport>,
    store: Arc<RegistrationStore>,
    latency: Arc<CallLatency>,
    certificate_key: JwsSigner,
    terms_url: String,
    domain_base: String,
}

impl AcmeActions {
    pub fn new(
        transport: Arc<SigningTransport>,
        store: Arc<RegistrationStore>,
        latency: Arc<CallLatency>,
        terms_url: impl Into<String>,
        domain_base: impl Into<String>,
    ) -> WfeResult<Self> {
        Ok(Self {
            transport,
            store,
            latency,
            certificate_key: JwsSigner::generate()?,
            terms_url: terms_url.into(),
            domain_base: domain_base.into(),
        })
    }

    /// Create a new identity and add it to the store
    pub async fn new_registration(&self) -> WfeResult<Arc<Registration>> {
        if let Some(capacity) = self.store.capacity().filter(|_| self.store.is_full()) {
            return Err(WfeError::CapacityReached(capacity));
        }

        let signer = JwsSigner::generate()?;
        let payload = json!({
            "resource": "new-reg",
            "agreement": self.terms_url,
        });
        // New identities always sign over a freshly fetched nonce
        self.signed_post(NEW_REG_PATH, true, &payload, &signer, StatusCode::CREATED)
            .await?;

        self.store.add(Registration::new(signer))
    }

    pub async fn new_authorization(&self, registration: &Registration) -> WfeResult<()> {
        let payload = json!({
            "resource": "new-authz",
            "identifier": {
                "type": "dns",
                "value": random_name(&self.domain_base),
            },
        });
        let response = self
            .signed_post(
                NEW_AUTHZ_PATH,
                false,
                &payload,
                registration.signer(),
                StatusCode::CREATED,
            )
            .await?;

        let authorization = created_resource(&response, NEW_AUTHZ_PATH)?;
        registration.add_authorization(authorization);
        Ok(())
    }

    pub async fn new_certificate(&self, registration: &Registration) -> WfeResult<()> {
        let names = vec![random_name(&self.domain_base)];
        let csr = build_csr(&self.certificate_key, &names);
        let payload = json!({
            "resource": "new-cert",
            "csr": URL_SAFE_NO_PAD.encode(csr),
        });
        let response = self
            .signed_post(
                NEW_CERT_PATH,
                false,
                &payload,
                registration.signer(),
                StatusCode::CREATED,
            )
            .await?;

        let certificate = created_resource(&response, NEW_CERT_PATH)?;
        registration.add_certificate(certificate);
        Ok(())
    }

    pub async fn revoke_certificate(&self, registration: &Registration) -> WfeResult<()> {
        let Some(certificate_url) = registration.random_certificate(&mut rand::thread_rng())
        else {
            return Ok(());
        };

        let der = self
            .timed(HttpMethod::Get.call_class(CERT_PATH), async {
                let response = self.transport.get(&certificate_url).await?;
                let response = expect_status(response, StatusCode::OK, CERT_PATH)?;
                Ok::<_, WfeError>(response.bytes().await?)
            })
            .await?;

        let payload = json!({
            "resource": "revoke-cert",
            "certificate": URL_SAFE_NO_PAD.encode(&der),
        });
        self.signed_post(
            REVOKE_CERT_PATH,
            false,
            &payload,
            registration.signer(),
            StatusCode::OK,
        )
        .await?;
        Ok(())
    }

    /// Sign and post `payload`, timing only the request itself
    ///
    /// With `force_fresh` the nonce comes from a HEAD request even when the
    /// pool has tokens.
    async fn signed_post(
        &self,
        endpoint: &str,
        force_fresh: bool,
        payload: &Value,
        signer: &JwsSigner,
        expected: StatusCode,
    ) -> WfeResult<Response> {
        let body = self
            .transport
            .sign(endpoint, force_fresh, &serde_json::to_vec(payload)?, signer)
            .await?;

        self.timed(HttpMethod::Post.call_class(endpoint), async {
            let response = self.transport.post(endpoint, body).await?;
            expect_status(response, expected, endpoint)
        })
        .await
    }

    async fn timed<T, F>(&self, class: String, call: F) -> WfeResult<T>
    where
        F: Future<Output = WfeResult<T>>,
    {
        let sent = Utc::now();
        let result = call.await;
        let finished = Utc::now();

        let outcome = if result.is_ok() {
            Outcome::Good
        } else {
            Outcome::Error
        };
        self.latency.add(&class, sent, finished, outcome);
        result
    }
}

#[async_trait]
impl ActionExecutor for AcmeActions {
    async fn execute(&self, action: ActionKind, registration: Option<Arc<Registration>>) {
        let result = match (action, registration.as_deref()) {
            (ActionKind::CreateIdentity, _) => self.new_registration().await.map(|_| ()),
            (ActionKind::CreateAuthorization, Some(reg)) => self.new_authorization(reg).await,
            (ActionKind::IssueCertificate, Some(reg)) => self.new_certificate(reg).await,
            (ActionKind::RevokeCertificate, Some(reg)) => self.revoke_certificate(reg).await,
            (action, None) => {
                warn!("Action {} dispatched without a registration", action);
                return;
            }
        };

        if let Err(e) = result {
            debug!("Action {} failed: {}", action, e);
        }
    }
}

fn expect_status(response: Response, expected: StatusCode, endpoint: &str) -> WfeResult<Response> {
    if response.status() == expected {
        Ok(response)
    } else {
        Err(WfeError::UnexpectedStatus {
            endpoint: endpoint.to_string(),
            status: response.status().as_u16(),
        })
    }
}

fn created_resource(response: &Response, endpoint: &str) -> WfeResult<String> {
    location(response.headers()).ok_or_else(|| WfeError::MissingHeader {
        header: "Location",
        endpoint: endpoint.to_string(),
    })
}

/// Random lowercase DNS name directly under `domain_base`
pub fn random_name(domain_base: &str) -> String {
    let label: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NAME_LABEL_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("{}.{}", label, domain_base)
}
