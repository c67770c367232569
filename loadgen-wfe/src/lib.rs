//! Dispatch engine for certificate-issuance API load generation
//!
//! A [`Dispatcher`] launches one concurrent call per tick at a live-tunable
//! rate. Each call picks a simulated client identity from the
//! [`RegistrationStore`], chooses a protocol action with the
//! [`WeightedSelector`] and runs it through an [`ActionExecutor`]. Signed
//! requests draw anti-replay nonces from a shared [`NoncePool`] via the
//! [`SigningTransport`].

pub mod actions;
pub mod csr;
pub mod dispatcher;
pub mod error;
pub mod jws;
pub mod nonce;
pub mod registration;
pub mod selector;
pub mod snapshot;
pub mod state;
pub mod transport;

// Re-export main types
pub use actions::{AcmeActions, ActionExecutor};
pub use dispatcher::{DispatchPhase, Dispatcher, RateController, RunSummary};
pub use error::{WfeError, WfeResult};
pub use jws::{JwsEnvelope, JwsSigner};
pub use nonce::NoncePool;
pub use registration::{History, Registration, RegistrationStore};
pub use selector::{ActionKind, DispatchContext, WeightedSelector};
pub use snapshot::{RawRegistration, RestoreSummary, SnapshotRecord};
pub use state::LoadState;
pub use transport::SigningTransport;
