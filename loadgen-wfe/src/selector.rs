//! Weighted choice of the next protocol action
//!
//! Eligible actions own contiguous sub-ranges of `[0, total)` sized by their
//! weights. A single uniform draw lands in exactly one of them.

use crate::registration::Registration;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Protocol actions a call can perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    CreateIdentity,
    CreateAuthorization,
    IssueCertificate,
    RevokeCertificate,
}

impl ActionKind {
    pub const ALL: [ActionKind; 4] = [
        ActionKind::CreateIdentity,
        ActionKind::CreateAuthorization,
        ActionKind::IssueCertificate,
        ActionKind::RevokeCertificate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::CreateIdentity => "create-identity",
            ActionKind::CreateAuthorization => "create-authorization",
            ActionKind::IssueCertificate => "issue-certificate",
            ActionKind::RevokeCertificate => "revoke-certificate",
        }
    }

    pub fn default_weight(&self) -> u32 {
        match self {
            ActionKind::CreateIdentity => 2,
            ActionKind::CreateAuthorization => 4,
            ActionKind::IssueCertificate => 4,
            ActionKind::RevokeCertificate => 3,
        }
    }

    /// Whether the action can run against `context`
    pub fn is_eligible(&self, context: &DispatchContext) -> bool {
        match self {
            ActionKind::CreateIdentity => true,
            ActionKind::CreateAuthorization => context.has_registration,
            ActionKind::IssueCertificate => context.has_authorization,
            ActionKind::RevokeCertificate => context.has_certificate,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the chosen registration (if any) makes possible
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchContext {
    pub has_registration: bool,
    pub has_authorization: bool,
    pub has_certificate: bool,
}

impl DispatchContext {
    pub fn for_registration(registration: Option<&Registration>) -> Self {
        match registration {
            Some(registration) => Self {
                has_registration: true,
                has_authorization: registration.has_authorization(),
                has_certificate: registration.has_certificate(),
            },
            None => Self::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WeightedSelector {
    weights: Vec<(ActionKind, u32)>,
}

impl Default for WeightedSelector {
    fn default() -> Self {
        Self::new(
            ActionKind::ALL
                .iter()
                .map(|action| (*action, action.default_weight())),
        )
    }
}

impl WeightedSelector {
    /// Selector over `weights`; zero-weight entries are dropped
    pub fn new(weights: impl IntoIterator<Item = (ActionKind, u32)>) -> Self {
        Self {
            weights: weights.into_iter().filter(|(_, w)| *w > 0).collect(),
        }
    }

    /// Sum of weights of the actions eligible under `context`
    pub fn total_weight(&self, context: &DispatchContext) -> u32 {
        self.eligible(context).map(|(_, w)| w).sum()
    }

    pub fn select<R: Rng + ?Sized>(
        &self,
        context: &DispatchContext,
        rng: &mut R,
    ) -> Option<ActionKind> {
        let total = self.total_weight(context);
        if total == 0 {
            return None;
        }
        self.owner_of(rng.gen_range(0..total), context)
    }

    /// Action whose sub-range contains `draw`
    pub fn owner_of(&self, draw: u32, context: &DispatchContext) -> Option<ActionKind> {
        let mut upper = 0u32;
        for (action, weight) in self.eligible(context) {
            upper += weight;
            if draw < upper {
                return Some(action);
            }
        }
        None
    }

    fn eligible<'a>(
        &'a self,
        context: &'a DispatchContext,
    ) -> impl Iterator<Item = (ActionKind, u32)> + 'a {
        self.weights
            .iter()
            .copied()
            .filter(move |(action, _)| action.is_eligible(context))
    }
}
