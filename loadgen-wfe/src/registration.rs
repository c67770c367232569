//! Simulated client identities and the shared store holding them

use crate::error::{WfeError, WfeResult};
use crate::jws::JwsSigner;
use parking_lot::RwLock;
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;

/// Resources a registration has created, in creation order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    pub auths: Vec<String>,
    pub certs: Vec<String>,
}

/// One simulated client identity
#[derive(Debug)]
pub struct Registration {
    signer: JwsSigner,
    history: RwLock<History>,
}

impl Registration {
    pub fn new(signer: JwsSigner) -> Self {
        Self::with_history(signer, History::default())
    }

    pub fn with_history(signer: JwsSigner, history: History) -> Self {
        Self {
            signer,
            history: RwLock::new(history),
        }
    }

    pub fn signer(&self) -> &JwsSigner {
        &self.signer
    }

    pub fn add_authorization(&self, id: String) {
        self.history.write().auths.push(id);
    }

    pub fn add_certificate(&self, id: String) {
        self.history.write().certs.push(id);
    }

    /// Copy of the current history
    pub fn history(&self) -> History {
        self.history.read().clone()
    }

    pub fn has_authorization(&self) -> bool {
        !self.history.read().auths.is_empty()
    }

    pub fn has_certificate(&self) -> bool {
        !self.history.read().certs.is_empty()
    }

    pub fn random_certificate<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<String> {
        self.history.read().certs.choose(rng).cloned()
    }
}

/// Append-only collection of registrations shared by all calls
#[derive(Debug, Default)]
pub struct RegistrationStore {
    registrations: RwLock<Vec<Arc<Registration>>>,
    capacity: Option<usize>,
}

impl RegistrationStore {
    /// Store bounded to `capacity` registrations; `None` or 0 is unbounded
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            registrations: RwLock::new(Vec::new()),
            capacity: capacity.filter(|c| *c > 0),
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn add(&self, registration: Registration) -> WfeResult<Arc<Registration>> {
        let mut registrations = self.registrations.write();
        if let Some(capacity) = self.capacity {
            if registrations.len() >= capacity {
                return Err(WfeError::CapacityReached(capacity));
            }
        }

        let registration = Arc::new(registration);
        registrations.push(Arc::clone(&registration));
        Ok(registration)
    }

    /// Append as many of `batch` as capacity allows, returning how many fit
    pub(crate) fn extend(&self, batch: Vec<Registration>) -> usize {
        let mut registrations = self.registrations.write();
        let room = self
            .capacity
            .map(|capacity| capacity.saturating_sub(registrations.len()))
            .unwrap_or(usize::MAX);

        let before = registrations.len();
        registrations.extend(batch.into_iter().take(room).map(Arc::new));
        registrations.len() - before
    }

    pub fn is_full(&self) -> bool {
        self.capacity
            .is_some_and(|capacity| self.registrations.read().len() >= capacity)
    }

    pub fn pick_random(&self) -> Option<Arc<Registration>> {
        self.pick_random_with(&mut rand::thread_rng())
    }

    /// Uniform pick using the supplied random source
    pub fn pick_random_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Arc<Registration>> {
        self.registrations.read().choose(rng).cloned()
    }

    pub fn len(&self) -> usize {
        self.registrations.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.read().is_empty()
    }

    /// Point-in-time copy of the registration list
    pub fn registrations(&self) -> Vec<Arc<Registration>> {
        self.registrations.read().clone()
    }
}
