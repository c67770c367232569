//! JWS envelopes signed with Ed25519 identity keys
//!
//! Envelopes use the flattened JSON serialization. The protected header
//! carries the signer's public key as a JWK and the anti-replay nonce.

use crate::error::{WfeError, WfeResult};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ed25519_dalek::pkcs8::{DecodePrivateKey, EncodePrivateKey};
use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const JWS_ALGORITHM: &str = "EdDSA";

/// Public half of an identity key in JWK form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    pub kty: String,
    pub crv: String,
    pub x: String,
}

impl Jwk {
    fn from_verifying_key(key: &VerifyingKey) -> Self {
        Self {
            kty: "OKP".to_string(),
            crv: "Ed25519".to_string(),
            x: URL_SAFE_NO_PAD.encode(key.as_bytes()),
        }
    }
}

#[derive(Serialize)]
struct ProtectedHeader<'a> {
    alg: &'static str,
    jwk: &'a Value,
    nonce: &'a str,
}

/// Flattened JWS JSON serialization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwsEnvelope {
    pub protected: String,
    pub payload: String,
    pub signature: String,
}

impl JwsEnvelope {
    /// Decoded protected header
    pub fn header(&self) -> WfeResult<Value> {
        let bytes = URL_SAFE_NO_PAD
            .decode(&self.protected)
            .map_err(|e| WfeError::Parse(format!("protected header: {}", e)))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Decoded payload bytes
    pub fn payload_bytes(&self) -> WfeResult<Vec<u8>> {
        URL_SAFE_NO_PAD
            .decode(&self.payload)
            .map_err(|e| WfeError::Parse(format!("payload: {}", e)))
    }
}

/// Signs request payloads on behalf of one identity
pub struct JwsSigner {
    key: SigningKey,
    jwk: Value,
}

// Key material stays out of debug output
impl std::fmt::Debug for JwsSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwsSigner")
            .field("jwk", &self.jwk)
            .finish_non_exhaustive()
    }
}

impl JwsSigner {
    pub fn new(key: SigningKey) -> WfeResult<Self> {
        let jwk = serde_json::to_value(Jwk::from_verifying_key(&key.verifying_key()))
            .map_err(|e| WfeError::Signing(format!("cannot encode JWK: {}", e)))?;
        Ok(Self { key, jwk })
    }

    /// Fresh identity key from the OS random source
    pub fn generate() -> WfeResult<Self> {
        Self::new(SigningKey::generate(&mut OsRng))
    }

    /// Rebuild a signer from PKCS#8 DER, as stored in snapshots
    pub fn from_pkcs8_der(der: &[u8]) -> WfeResult<Self> {
        let key = SigningKey::from_pkcs8_der(der)
            .map_err(|e| WfeError::Parse(format!("PKCS#8 private key: {}", e)))?;
        Self::new(key)
    }

    pub fn to_pkcs8_der(&self) -> WfeResult<Vec<u8>> {
        let document = self
            .key
            .to_pkcs8_der()
            .map_err(|e| WfeError::Signing(format!("cannot encode private key: {}", e)))?;
        Ok(document.as_bytes().to_vec())
    }

    pub fn jwk(&self) -> &Value {
        &self.jwk
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.key.verifying_key()
    }

    /// Raw Ed25519 signature over arbitrary bytes
    pub fn sign_raw(&self, message: &[u8]) -> [u8; 64] {
        self.key.sign(message).to_bytes()
    }

    /// Wrap `payload` in an envelope bound to `nonce`
    pub fn sign(&self, payload: &[u8], nonce: &str) -> WfeResult<JwsEnvelope> {
        let header = ProtectedHeader {
            alg: JWS_ALGORITHM,
            jwk: &self.jwk,
            nonce,
        };
        let protected = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?);
        let payload = URL_SAFE_NO_PAD.encode(payload);

        let signing_input = format!("{}.{}", protected, payload);
        let signature = URL_SAFE_NO_PAD.encode(self.sign_raw(signing_input.as_bytes()));

        Ok(JwsEnvelope {
            protected,
            payload,
            signature,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signature, Verifier};

    #[test]
    fn test_envelope_header_and_signature() {
        let signer = JwsSigner::generate().unwrap();
        let envelope = signer.sign(br#"{"resource":"new-reg"}"#, "nonce-1").unwrap();

        let header = envelope.header().unwrap();
        assert_eq!(header["alg"], "EdDSA");
        assert_eq!(header["nonce"], "nonce-1");
        assert_eq!(header["jwk"]["kty"], "OKP");
        assert_eq!(header["jwk"]["crv"], "Ed25519");
        assert_eq!(envelope.payload_bytes().unwrap(), br#"{"resource":"new-reg"}"#);

        let signature_bytes: [u8; 64] = URL_SAFE_NO_PAD
            .decode(&envelope.signature)
            .unwrap()
            .try_into()
            .unwrap();
        let signing_input = format!("{}.{}", envelope.protected, envelope.payload);
        signer
            .verifying_key()
            .verify(signing_input.as_bytes(), &Signature::from_bytes(&signature_bytes))
            .unwrap();
    }

    #[test]
    fn test_pkcs8_round_trip_keeps_identity() {
        let signer = JwsSigner::generate().unwrap();
        let der = signer.to_pkcs8_der().unwrap();

        let restored = JwsSigner::from_pkcs8_der(&der).unwrap();
        assert_eq!(restored.jwk(), signer.jwk());
    }

    #[test]
    fn test_garbage_key_material_is_a_parse_error() {
        let result = JwsSigner::from_pkcs8_der(b"definitely not DER");
        assert!(matches!(result, Err(WfeError::Parse(_))));
    }

    #[test]
    fn test_debug_hides_key() {
        let signer = JwsSigner::generate().unwrap();
        let debug = format!("{:?}", signer);
        assert!(debug.contains("jwk"));
        assert!(!debug.contains("key:"));
    }
}
