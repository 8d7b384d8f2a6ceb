//! Favorites reconciliation across sign-in and sign-out.
//!
//! The reconciler keeps one ordered, duplicate-free id list per content
//! type. While nobody is signed in the lists live in local storage under
//! `favoriteMealIds` / `favoriteCocktailIds`. When a user signs in, whatever
//! is stored locally is merged into the remote `user_favorites` table once,
//! local storage is cleared, and the remote rows become authoritative.
//!
//! ```text
//! Uninitialized ──sync(None)──→ Anonymous ──sync(Some(u))──→ Syncing(u)
//!       │                           ↑                           │
//!       └──────sync(Some(u))────────┼───────────────────────────┤ merge + load
//!                                   │                           ↓
//!                                   └────────sync(None)──── Authenticated(u)
//! ```
//!
//! Toggles are two-phase: [`FavoritesReconciler::begin_toggle`] applies the
//! change to the in-memory list (and local storage, when anonymous) right
//! away, and [`PendingToggle::reconcile`] performs the remote write and
//! reports its result.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chlorofill_backend::FavoritesStore;
use chlorofill_core::{BackendError, ContentType, FavoriteRow, LocalStoreError, UserId};
use serde::Serialize;

use crate::local_store::LocalStore;
use crate::toggle::{ToggleGuard, ToggleLock};

// ============================================================================
// STATE
// ============================================================================

/// Where the favorites currently live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No identity seen yet; nothing has been read or written. Toggles made
    /// here are discarded when the first identity report loads the lists.
    Uninitialized,
    /// Lists are backed by local storage.
    Anonymous,
    /// Merge and initial load running for this user.
    Syncing(UserId),
    /// Lists are backed by the remote table. `loaded` is false when the
    /// initial load failed; the next sync for the same user retries it.
    Authenticated { user_id: UserId, loaded: bool },
}

impl SessionPhase {
    /// User whose remote rows receive writes, if any.
    pub fn remote_user(&self) -> Option<UserId> {
        match *self {
            SessionPhase::Syncing(user_id) | SessionPhase::Authenticated { user_id, .. } => {
                Some(user_id)
            }
            SessionPhase::Uninitialized | SessionPhase::Anonymous => None,
        }
    }

    fn persists_locally(&self) -> bool {
        matches!(self, SessionPhase::Anonymous)
    }
}

/// Both favorite lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FavoriteLists {
    pub meals: Vec<String>,
    pub cocktails: Vec<String>,
}

impl FavoriteLists {
    pub fn get(&self, content_type: ContentType) -> &[String] {
        match content_type {
            ContentType::Meal => &self.meals,
            ContentType::Cocktail => &self.cocktails,
        }
    }

    fn get_mut(&mut self, content_type: ContentType) -> &mut Vec<String> {
        match content_type {
            ContentType::Meal => &mut self.meals,
            ContentType::Cocktail => &mut self.cocktails,
        }
    }

    pub fn contains(&self, content_type: ContentType, id: &str) -> bool {
        self.get(content_type).iter().any(|x| x == id)
    }

    pub fn is_empty(&self) -> bool {
        self.meals.is_empty() && self.cocktails.is_empty()
    }

    fn from_rows(rows: Vec<FavoriteRow>) -> Self {
        let mut lists = Self::default();
        for row in rows {
            let list = lists.get_mut(row.item_type);
            if !list.contains(&row.item_id) {
                list.push(row.item_id);
            }
        }
        lists
    }
}

#[derive(Debug)]
struct State {
    phase: SessionPhase,
    lists: FavoriteLists,
}

// ============================================================================
// OUTCOMES
// ============================================================================

/// Result of [`FavoritesReconciler::sync_identity`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Lists were reloaded from local storage.
    Anonymous,
    /// Local favorites were merged (unless `merge_error` is set) and the
    /// remote rows loaded.
    Loaded {
        user_id: UserId,
        merged: usize,
        merge_error: Option<BackendError>,
    },
    /// This user is already loaded or being loaded by another caller.
    AlreadyLoaded(UserId),
    /// Remote rows could not be read. Lists are empty.
    LoadFailed {
        user_id: UserId,
        error: BackendError,
    },
    /// The identity changed while syncing; the results were discarded.
    Superseded(UserId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    Added,
    Removed,
}

/// What happened to the remote table after a local change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteSync {
    /// Nobody signed in; the change is local only.
    LocalOnly,
    Synced,
    /// The remote write failed. The local change is kept.
    Failed(BackendError),
}

impl RemoteSync {
    pub fn is_failed(&self) -> bool {
        matches!(self, RemoteSync::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub content_type: ContentType,
    pub item_id: String,
    pub action: ToggleAction,
    pub remote: RemoteSync,
}

impl ToggleOutcome {
    /// Whether the item is a favorite after the toggle.
    pub fn is_favorite(&self) -> bool {
        self.action == ToggleAction::Added
    }
}

// ============================================================================
// RECONCILER
// ============================================================================

pub struct FavoritesReconciler {
    store: Arc<dyn FavoritesStore>,
    local: Arc<dyn LocalStore>,
    state: Mutex<State>,
    toggles: ToggleLock,
}

impl FavoritesReconciler {
    pub fn new(store: Arc<dyn FavoritesStore>, local: Arc<dyn LocalStore>) -> Self {
        Self {
            store,
            local,
            state: Mutex::new(State {
                phase: SessionPhase::Uninitialized,
                lists: FavoriteLists::default(),
            }),
            toggles: ToggleLock::new(),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn phase(&self) -> SessionPhase {
        self.lock_state().phase
    }

    /// True once the remote rows for the signed-in user have been loaded.
    pub fn is_loaded(&self) -> bool {
        matches!(
            self.phase(),
            SessionPhase::Authenticated { loaded: true, .. }
        )
    }

    pub fn lists(&self) -> FavoriteLists {
        self.lock_state().lists.clone()
    }

    pub fn ids(&self, content_type: ContentType) -> Vec<String> {
        self.lock_state().lists.get(content_type).to_vec()
    }

    pub fn is_favorite(&self, content_type: ContentType, id: &str) -> bool {
        self.lock_state().lists.contains(content_type, id)
    }

    pub fn toggle_lock(&self) -> &ToggleLock {
        &self.toggles
    }

    // ------------------------------------------------------------------------
    // Identity transitions
    // ------------------------------------------------------------------------

    /// Bring the lists in line with the current identity.
    ///
    /// Safe to call from both the identity-change hook and start-up: a
    /// second call for a user that is already loaded, or being loaded, does
    /// nothing.
    pub async fn sync_identity(&self, user_id: Option<UserId>) -> SyncOutcome {
        match user_id {
            None => {
                self.enter_anonymous();
                SyncOutcome::Anonymous
            }
            Some(user_id) => self.enter_authenticated(user_id).await,
        }
    }

    fn enter_anonymous(&self) {
        let mut state = self.lock_state();
        state.phase = SessionPhase::Anonymous;
        state.lists = FavoriteLists::default();
        for content_type in ContentType::ALL {
            *state.lists.get_mut(content_type) = self.load_local_list(content_type);
        }
        tracing::debug!(
            meals = state.lists.meals.len(),
            cocktails = state.lists.cocktails.len(),
            "favorites loaded from local storage"
        );
    }

    async fn enter_authenticated(&self, user_id: UserId) -> SyncOutcome {
        {
            let mut state = self.lock_state();
            match state.phase {
                SessionPhase::Syncing(current)
                | SessionPhase::Authenticated {
                    user_id: current,
                    loaded: true,
                } if current == user_id => {
                    tracing::debug!(%user_id, "favorites already synced for user");
                    return SyncOutcome::AlreadyLoaded(user_id);
                }
                _ => {}
            }
            state.phase = SessionPhase::Syncing(user_id);
        }

        let (merged, merge_error) = self.merge_local_into_remote(user_id).await;
        let loaded = self.store.list_favorites(user_id).await;

        let mut state = self.lock_state();
        if state.phase != SessionPhase::Syncing(user_id) {
            tracing::debug!(%user_id, "identity changed during favorites sync, discarding");
            return SyncOutcome::Superseded(user_id);
        }
        match loaded {
            Ok(rows) => {
                state.lists = FavoriteLists::from_rows(rows);
                state.phase = SessionPhase::Authenticated {
                    user_id,
                    loaded: true,
                };
                tracing::info!(
                    %user_id,
                    merged,
                    meals = state.lists.meals.len(),
                    cocktails = state.lists.cocktails.len(),
                    "favorites loaded from backend"
                );
                SyncOutcome::Loaded {
                    user_id,
                    merged,
                    merge_error,
                }
            }
            Err(error) => {
                tracing::error!(%user_id, error = %error, "failed to load favorites");
                state.lists = FavoriteLists::default();
                state.phase = SessionPhase::Authenticated {
                    user_id,
                    loaded: false,
                };
                SyncOutcome::LoadFailed { user_id, error }
            }
        }
    }

    /// Upsert every locally stored favorite for `user_id`, then clear the
    /// local keys. On failure local storage is kept so a later sign-in
    /// retries; the upsert is idempotent per row.
    async fn merge_local_into_remote(&self, user_id: UserId) -> (usize, Option<BackendError>) {
        let mut rows = Vec::new();
        for content_type in ContentType::ALL {
            let ids = read_local_ids(self.local.as_ref(), content_type).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "unreadable local favorites treated as empty");
                Vec::new()
            });
            rows.extend(
                ids.into_iter()
                    .map(|id| FavoriteRow::new(user_id, id, content_type)),
            );
        }

        match self.store.upsert_favorites(&rows).await {
            Ok(()) => {
                for content_type in ContentType::ALL {
                    self.remove_local_key(content_type);
                }
                if !rows.is_empty() {
                    tracing::info!(%user_id, rows = rows.len(), "merged local favorites");
                }
                (rows.len(), None)
            }
            Err(error) => {
                tracing::error!(
                    %user_id,
                    rows = rows.len(),
                    error = %error,
                    "favorites merge failed, keeping local storage"
                );
                (0, Some(error))
            }
        }
    }

    // ------------------------------------------------------------------------
    // Toggles
    // ------------------------------------------------------------------------

    /// Apply a toggle locally.
    ///
    /// Returns `None` for an empty id, or when a toggle for the same item is
    /// still in flight. Otherwise the in-memory list has already changed and
    /// the returned [`PendingToggle`] holds the item's lock until it is
    /// reconciled or dropped.
    ///
    /// Before the first [`sync_identity`](Self::sync_identity) the change is
    /// in memory only and is replaced by whatever that sync loads.
    pub fn begin_toggle(&self, content_type: ContentType, item_id: &str) -> Option<PendingToggle<'_>> {
        if item_id.is_empty() {
            return None;
        }
        let Some(guard) = self.toggles.try_acquire(content_type, item_id) else {
            tracing::debug!(%content_type, item_id, "toggle already in flight, dropped");
            return None;
        };

        let mut state = self.lock_state();
        let list = state.lists.get_mut(content_type);
        let action = match list.iter().position(|id| id == item_id) {
            Some(index) => {
                list.remove(index);
                ToggleAction::Removed
            }
            None => {
                list.push(item_id.to_string());
                ToggleAction::Added
            }
        };
        self.persist_if_anonymous(&state, content_type);

        Some(PendingToggle {
            reconciler: self,
            content_type,
            item_id: item_id.to_string(),
            action,
            remote_user: state.phase.remote_user(),
            _guard: guard,
        })
    }

    /// Toggle membership and write the change through to the backend.
    pub async fn toggle_favorite(
        &self,
        content_type: ContentType,
        item_id: &str,
    ) -> Option<ToggleOutcome> {
        let pending = self.begin_toggle(content_type, item_id)?;
        Some(pending.reconcile().await)
    }

    /// Remove `item_id` without consulting the toggle lock or the list.
    ///
    /// When signed in, the remote delete is issued even if the id was not in
    /// the in-memory list.
    pub async fn remove_favorite(&self, content_type: ContentType, item_id: &str) -> RemoteSync {
        let remote_user = {
            let mut state = self.lock_state();
            state.lists.get_mut(content_type).retain(|id| id != item_id);
            self.persist_if_anonymous(&state, content_type);
            state.phase.remote_user()
        };

        match remote_user {
            None => RemoteSync::LocalOnly,
            Some(user_id) => {
                let result = self
                    .store
                    .delete_favorite(user_id, item_id, content_type)
                    .await;
                remote_result(result, content_type, item_id)
            }
        }
    }

    // ------------------------------------------------------------------------
    // Local storage
    // ------------------------------------------------------------------------

    /// Write `content_type`'s list to its local key, only while anonymous.
    fn persist_if_anonymous(&self, state: &State, content_type: ContentType) {
        if !state.phase.persists_locally() {
            return;
        }
        let key = content_type.local_storage_key();
        let written = serde_json::to_string(state.lists.get(content_type))
            .map_err(|e| LocalStoreError::Io {
                reason: e.to_string(),
            })
            .and_then(|json| self.local.set(key, &json));
        if let Err(e) = written {
            tracing::warn!(key, error = %e, "failed to persist favorites");
        }
    }

    /// Read one local list, deleting the key if its contents are corrupt.
    fn load_local_list(&self, content_type: ContentType) -> Vec<String> {
        match read_local_ids(self.local.as_ref(), content_type) {
            Ok(ids) => ids,
            Err(e @ LocalStoreError::StorageCorrupt { .. }) => {
                tracing::warn!(error = %e, "resetting corrupt local favorites");
                self.remove_local_key(content_type);
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(error = %e, "local favorites unavailable");
                Vec::new()
            }
        }
    }

    fn remove_local_key(&self, content_type: ContentType) {
        let key = content_type.local_storage_key();
        if let Err(e) = self.local.remove(key) {
            tracing::warn!(key, error = %e, "failed to remove local favorites");
        }
    }
}

/// Parse the JSON array stored under `content_type`'s key. A missing key is
/// an empty list; anything but an array of strings is `StorageCorrupt`.
fn read_local_ids(
    local: &dyn LocalStore,
    content_type: ContentType,
) -> Result<Vec<String>, LocalStoreError> {
    let key = content_type.local_storage_key();
    let Some(raw) = local.get(key)? else {
        return Ok(Vec::new());
    };
    let ids: Vec<String> =
        serde_json::from_str(&raw).map_err(|e| LocalStoreError::StorageCorrupt {
            key: key.to_string(),
            reason: e.to_string(),
        })?;

    let mut unique = Vec::with_capacity(ids.len());
    for id in ids {
        if !unique.contains(&id) {
            unique.push(id);
        }
    }
    Ok(unique)
}

fn remote_result(
    result: Result<(), BackendError>,
    content_type: ContentType,
    item_id: &str,
) -> RemoteSync {
    match result {
        Ok(()) => RemoteSync::Synced,
        Err(error) => {
            tracing::error!(%content_type, item_id, error = %error, "favorite write failed");
            RemoteSync::Failed(error)
        }
    }
}

// ============================================================================
// PENDING TOGGLE
// ============================================================================

/// A toggle applied locally whose remote write has not run yet.
#[must_use = "the remote write only happens in `reconcile`"]
pub struct PendingToggle<'a> {
    reconciler: &'a FavoritesReconciler,
    content_type: ContentType,
    item_id: String,
    action: ToggleAction,
    remote_user: Option<UserId>,
    _guard: ToggleGuard,
}

impl PendingToggle<'_> {
    pub fn action(&self) -> ToggleAction {
        self.action
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    /// Write the change to the backend and release the item's lock.
    pub async fn reconcile(self) -> ToggleOutcome {
        let remote = match self.remote_user {
            None => RemoteSync::LocalOnly,
            Some(user_id) => {
                let store = &self.reconciler.store;
                let result = match self.action {
                    ToggleAction::Added => {
                        let row = FavoriteRow::new(user_id, self.item_id.clone(), self.content_type);
                        store.upsert_favorites(std::slice::from_ref(&row)).await
                    }
                    ToggleAction::Removed => {
                        store
                            .delete_favorite(user_id, &self.item_id, self.content_type)
                            .await
                    }
                };
                remote_result(result, self.content_type, &self.item_id)
            }
        };

        ToggleOutcome {
            content_type: self.content_type,
            item_id: self.item_id,
            action: self.action,
            remote,
        }
    }
}
