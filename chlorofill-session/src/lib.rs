//! Session state for ChloroFill.
//!
//! A [`Session`] is built once by the application root and passed around by
//! reference. It owns the signed-in identity, the favorites reconciler, the
//! theme preference and the user-creations service.

pub mod auth;
pub mod creations;
pub mod favorites;
pub mod local_store;
pub mod session;
pub mod theme;
pub mod toggle;

pub use auth::{AuthState, UserIdentity};
pub use creations::CreationsService;
pub use favorites::{
    FavoriteLists, FavoritesReconciler, PendingToggle, RemoteSync, SessionPhase, SyncOutcome,
    ToggleAction, ToggleOutcome,
};
pub use local_store::{FileLocalStore, LocalStore, MemoryLocalStore};
pub use session::Session;
pub use theme::{ThemePreference, THEME_STORAGE_KEY};
pub use toggle::{ToggleGuard, ToggleLock};
