//! Per-user session composed by the application root.

use std::sync::Arc;

use chlorofill_backend::{CreationsStore, FavoritesStore};
use chlorofill_core::{route_access, RouteAccess, Theme};

use crate::auth::{AuthState, UserIdentity};
use crate::creations::CreationsService;
use crate::favorites::{FavoritesReconciler, SyncOutcome};
use crate::local_store::LocalStore;
use crate::theme::ThemePreference;

pub struct Session {
    auth: Arc<AuthState>,
    favorites: FavoritesReconciler,
    theme: ThemePreference,
    creations: CreationsService,
}

impl Session {
    pub fn new(
        local: Arc<dyn LocalStore>,
        favorites_store: Arc<dyn FavoritesStore>,
        creations_store: Arc<dyn CreationsStore>,
        system_theme: Option<Theme>,
    ) -> Self {
        let auth = Arc::new(AuthState::new());
        Self {
            favorites: FavoritesReconciler::new(favorites_store, Arc::clone(&local)),
            theme: ThemePreference::load(local, system_theme),
            creations: CreationsService::new(creations_store, Arc::clone(&auth)),
            auth,
        }
    }

    pub fn auth(&self) -> &AuthState {
        &self.auth
    }

    pub fn favorites(&self) -> &FavoritesReconciler {
        &self.favorites
    }

    pub fn theme(&self) -> &ThemePreference {
        &self.theme
    }

    pub fn creations(&self) -> &CreationsService {
        &self.creations
    }

    /// Record the identity reported by the auth provider and sync favorites.
    ///
    /// Used both at start-up and on every auth state change.
    pub async fn identity_changed(&self, identity: Option<UserIdentity>) -> SyncOutcome {
        let user_id = identity.as_ref().map(|i| i.user_id);
        if self.auth.set(identity) {
            tracing::info!(signed_in = user_id.is_some(), "identity changed");
        }
        self.favorites.sync_identity(user_id).await
    }

    /// Whether `path` may be shown to the current identity.
    pub fn route_access(&self, path: &str) -> RouteAccess {
        route_access(path, self.auth.is_authenticated())
    }
}
