//! Signed-in identity tracking.

use std::sync::{PoisonError, RwLock};

use chlorofill_core::{BackendError, UserId};
use serde::{Deserialize, Serialize};

/// The signed-in user as reported by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub user_id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    /// Bearer token for backend requests made on the user's behalf.
    #[serde(default, skip_serializing)]
    pub access_token: Option<String>,
}

impl UserIdentity {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            email: None,
            access_token: None,
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }
}

#[derive(Debug, Default)]
pub struct AuthState {
    current: RwLock<Option<UserIdentity>>,
}

impl AuthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<UserIdentity> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|i| i.user_id)
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id().is_some()
    }

    /// The signed-in user, or `NotAuthenticated`.
    pub fn require_user(&self) -> Result<UserId, BackendError> {
        self.user_id().ok_or(BackendError::NotAuthenticated)
    }

    /// Record a new identity. Returns whether the signed-in user changed.
    pub fn set(&self, identity: Option<UserIdentity>) -> bool {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let changed = current.as_ref().map(|i| i.user_id) != identity.as_ref().map(|i| i.user_id);
        *current = identity;
        changed
    }
}
