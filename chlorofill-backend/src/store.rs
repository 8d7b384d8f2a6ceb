//! Async traits over the hosted backend tables.

use async_trait::async_trait;
use chlorofill_core::{
    BackendError, ContentType, CreationUpdate, FavoriteRow, NewCreation, UserCreation, UserId,
};
use uuid::Uuid;

pub const FAVORITES_TABLE: &str = "user_favorites";
pub const CREATIONS_TABLE: &str = "user_creations";

/// Maximum number of public creations a search returns.
pub const SEARCH_LIMIT: usize = 10;

/// The `user_favorites` table.
///
/// Rows are unique per `(user_id, item_id, item_type)`.
#[async_trait]
pub trait FavoritesStore: Send + Sync {
    /// Insert `rows`, treating an existing triple as success.
    ///
    /// An empty batch succeeds without contacting the backend.
    async fn upsert_favorites(&self, rows: &[FavoriteRow]) -> Result<(), BackendError>;

    /// Delete one row. Deleting an absent row succeeds.
    async fn delete_favorite(
        &self,
        user_id: UserId,
        item_id: &str,
        item_type: ContentType,
    ) -> Result<(), BackendError>;

    /// All rows owned by `user_id`.
    async fn list_favorites(&self, user_id: UserId) -> Result<Vec<FavoriteRow>, BackendError>;
}

/// The `user_creations` table.
#[async_trait]
pub trait CreationsStore: Send + Sync {
    /// Creations owned by `user_id`, newest first.
    async fn list_creations(&self, user_id: UserId) -> Result<Vec<UserCreation>, BackendError>;

    async fn insert_creation(
        &self,
        user_id: UserId,
        creation: &NewCreation,
    ) -> Result<UserCreation, BackendError>;

    /// Apply `update` to a creation owned by `user_id`.
    ///
    /// Fails with `NotFound` when no such creation belongs to the user.
    async fn update_creation(
        &self,
        user_id: UserId,
        id: Uuid,
        update: &CreationUpdate,
    ) -> Result<UserCreation, BackendError>;

    async fn delete_creation(&self, user_id: UserId, id: Uuid) -> Result<(), BackendError>;

    /// A public creation by id, regardless of owner.
    async fn get_public_creation(&self, id: Uuid) -> Result<Option<UserCreation>, BackendError>;

    /// Public creations whose title or description contains `query`, or
    /// whose tags include it. At most `limit` rows.
    async fn search_public_creations(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<UserCreation>, BackendError>;
}
