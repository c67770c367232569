//! Persisting registrations between runs
//!
//! Keys are stored as standard base64 of their PKCS#8 DER encoding. Entries
//! whose key material cannot be decoded are skipped on restore.

use crate::error::WfeResult;
use crate::jws::JwsSigner;
use crate::registration::{History, Registration, RegistrationStore};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRegistration {
    #[serde(default)]
    pub certs: Vec<String>,
    #[serde(default)]
    pub auths: Vec<String>,
    #[serde(rename = "rawKey")]
    pub raw_key: String,
}

impl RawRegistration {
    fn from_registration(registration: &Registration) -> WfeResult<Self> {
        let History { auths, certs } = registration.history();
        Ok(Self {
            certs,
            auths,
            raw_key: STANDARD.encode(registration.signer().to_pkcs8_der()?),
        })
    }

    fn into_registration(self) -> Result<Registration, String> {
        let der = STANDARD
            .decode(&self.raw_key)
            .map_err(|e| format!("rawKey is not base64: {}", e))?;
        let signer = JwsSigner::from_pkcs8_der(&der).map_err(|e| e.to_string())?;
        Ok(Registration::with_history(
            signer,
            History {
                auths: self.auths,
                certs: self.certs,
            },
        ))
    }
}

/// Serialized form of a registration store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    #[serde(default, alias = "Registrations")]
    pub registrations: Vec<RawRegistration>,
}

impl SnapshotRecord {
    pub fn to_json(&self) -> WfeResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_json(content: &[u8]) -> WfeResult<Self> {
        Ok(serde_json::from_slice(content)?)
    }
}

/// Outcome of restoring a snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreSummary {
    pub restored: usize,
    pub skipped: usize,
}

impl RegistrationStore {
    /// Capture every registration and its history
    pub fn snapshot(&self) -> WfeResult<SnapshotRecord> {
        let registrations = self
            .registrations()
            .iter()
            .map(|registration| RawRegistration::from_registration(registration))
            .collect::<WfeResult<Vec<_>>>()?;
        Ok(SnapshotRecord { registrations })
    }

    /// Append the usable entries of `record`
    pub fn restore(&self, record: SnapshotRecord) -> RestoreSummary {
        let total = record.registrations.len();
        let decoded: Vec<Registration> = record
            .registrations
            .into_iter()
            .enumerate()
            .filter_map(|(index, raw)| match raw.into_registration() {
                Ok(registration) => Some(registration),
                Err(e) => {
                    warn!("Skipping snapshot entry {}: {}", index, e);
                    None
                }
            })
            .collect();

        let decoded_count = decoded.len();
        let restored = self.extend(decoded);
        if restored < decoded_count {
            warn!(
                "Registration store full, dropped {} restored entries",
                decoded_count - restored
            );
        }

        let summary = RestoreSummary {
            restored,
            skipped: total - restored,
        };
        info!(
            "Restored {} registrations ({} skipped)",
            summary.restored, summary.skipped
        );
        summary
    }
}
