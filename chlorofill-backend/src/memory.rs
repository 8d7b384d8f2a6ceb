//! In-process backend for tests and offline runs.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chlorofill_core::{
    BackendError, ContentType, CreationUpdate, FavoriteRow, NewCreation, UserCreation, UserId,
};
use chrono::Utc;
use uuid::Uuid;

use crate::store::{CreationsStore, FavoritesStore, CREATIONS_TABLE, FAVORITES_TABLE};

/// Both backend tables held in memory.
///
/// Reads and writes can be made to fail on demand, and favorites writes are
/// counted, so callers can observe how often they reached the backend.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    favorites: RwLock<Vec<FavoriteRow>>,
    creations: RwLock<Vec<UserCreation>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    favorite_writes: AtomicUsize,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent read fail with `RemoteReadFailed`.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent write fail with `RemoteWriteFailed`.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of favorites upserts and deletes attempted so far.
    pub fn favorite_write_count(&self) -> usize {
        self.favorite_writes.load(Ordering::SeqCst)
    }

    /// Snapshot of the favorites table in insertion order.
    pub fn favorite_rows(&self) -> Vec<FavoriteRow> {
        self.favorites
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Put a row straight into the favorites table.
    pub fn seed_favorite(&self, row: FavoriteRow) {
        let mut rows = self.favorites.write().unwrap_or_else(PoisonError::into_inner);
        if !rows.contains(&row) {
            rows.push(row);
        }
    }

    /// Put a creation straight into the creations table.
    pub fn seed_creation(&self, creation: UserCreation) {
        self.creations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(creation);
    }

    pub fn creation_count(&self) -> usize {
        self.creations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn clear(&self) {
        self.favorites
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.creations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn check_read(&self, table: &str) -> Result<(), BackendError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(BackendError::RemoteReadFailed {
                table: table.to_string(),
                reason: "injected read failure".to_string(),
            });
        }
        Ok(())
    }

    fn check_write(&self, table: &str) -> Result<(), BackendError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BackendError::RemoteWriteFailed {
                table: table.to_string(),
                reason: "injected write failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl FavoritesStore for InMemoryBackend {
    async fn upsert_favorites(&self, rows: &[FavoriteRow]) -> Result<(), BackendError> {
        if rows.is_empty() {
            return Ok(());
        }
        self.favorite_writes.fetch_add(1, Ordering::SeqCst);
        self.check_write(FAVORITES_TABLE)?;

        let mut table = self.favorites.write().unwrap_or_else(PoisonError::into_inner);
        for row in rows {
            if !table.contains(row) {
                table.push(row.clone());
            }
        }
        Ok(())
    }

    async fn delete_favorite(
        &self,
        user_id: UserId,
        item_id: &str,
        item_type: ContentType,
    ) -> Result<(), BackendError> {
        self.favorite_writes.fetch_add(1, Ordering::SeqCst);
        self.check_write(FAVORITES_TABLE)?;

        self.favorites
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|r| !(r.user_id == user_id && r.item_id == item_id && r.item_type == item_type));
        Ok(())
    }

    async fn list_favorites(&self, user_id: UserId) -> Result<Vec<FavoriteRow>, BackendError> {
        self.check_read(FAVORITES_TABLE)?;
        let table = self.favorites.read().unwrap_or_else(PoisonError::into_inner);
        Ok(table.iter().filter(|r| r.user_id == user_id).cloned().collect())
    }
}

#[async_trait]
impl CreationsStore for InMemoryBackend {
    async fn list_creations(&self, user_id: UserId) -> Result<Vec<UserCreation>, BackendError> {
        self.check_read(CREATIONS_TABLE)?;
        let table = self.creations.read().unwrap_or_else(PoisonError::into_inner);
        let mut owned: Vec<UserCreation> =
            table.iter().filter(|c| c.user_id == user_id).cloned().collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn insert_creation(
        &self,
        user_id: UserId,
        creation: &NewCreation,
    ) -> Result<UserCreation, BackendError> {
        self.check_write(CREATIONS_TABLE)?;
        let row = UserCreation {
            id: Uuid::new_v4(),
            user_id,
            title: creation.title.clone(),
            description: creation.description.clone(),
            steps: creation.steps.clone(),
            ingredients: creation.ingredients.clone(),
            image_path: creation.image_path.clone(),
            creation_type: creation.creation_type,
            is_public: creation.is_public,
            is_approved: false,
            tags: creation.tags.clone(),
            created_at: Utc::now(),
            updated_at: None,
        };
        self.creations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(row.clone());
        Ok(row)
    }

    async fn update_creation(
        &self,
        user_id: UserId,
        id: Uuid,
        update: &CreationUpdate,
    ) -> Result<UserCreation, BackendError> {
        self.check_write(CREATIONS_TABLE)?;
        let mut table = self.creations.write().unwrap_or_else(PoisonError::into_inner);
        let creation = table
            .iter_mut()
            .find(|c| c.id == id && c.user_id == user_id)
            .ok_or_else(|| BackendError::NotFound {
                table: CREATIONS_TABLE.to_string(),
                id: id.to_string(),
            })?;
        update.apply_to(creation);
        Ok(creation.clone())
    }

    async fn delete_creation(&self, user_id: UserId, id: Uuid) -> Result<(), BackendError> {
        self.check_write(CREATIONS_TABLE)?;
        self.creations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|c| !(c.id == id && c.user_id == user_id));
        Ok(())
    }

    async fn get_public_creation(&self, id: Uuid) -> Result<Option<UserCreation>, BackendError> {
        self.check_read(CREATIONS_TABLE)?;
        let table = self.creations.read().unwrap_or_else(PoisonError::into_inner);
        Ok(table.iter().find(|c| c.id == id && c.is_public).cloned())
    }

    async fn search_public_creations(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<UserCreation>, BackendError> {
        self.check_read(CREATIONS_TABLE)?;
        let table = self.creations.read().unwrap_or_else(PoisonError::into_inner);
        Ok(table
            .iter()
            .filter(|c| c.is_public && c.matches_query(query))
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chlorofill_core::CreationType;
    use chrono::Duration;

    fn creation(user_id: UserId, title: &str, is_public: bool, age_minutes: i64) -> UserCreation {
        UserCreation {
            id: Uuid::new_v4(),
            user_id,
            title: title.to_string(),
            description: None,
            steps: vec![],
            ingredients: vec![],
            image_path: None,
            creation_type: CreationType::Recipe,
            is_public,
            is_approved: false,
            tags: vec!["vegan".to_string()],
            created_at: Utc::now() - Duration::minutes(age_minutes),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent_per_triple() {
        let backend = InMemoryBackend::new();
        let user = Uuid::new_v4();
        let rows = vec![
            FavoriteRow::new(user, "m1", ContentType::Meal),
            FavoriteRow::new(user, "m1", ContentType::Cocktail),
        ];

        backend.upsert_favorites(&rows).await.unwrap();
        backend.upsert_favorites(&rows).await.unwrap();

        assert_eq!(backend.favorite_rows(), rows);
        assert_eq!(backend.favorite_write_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_batch_is_not_a_write() {
        let backend = InMemoryBackend::new();
        backend.set_fail_writes(true);
        backend.upsert_favorites(&[]).await.unwrap();
        assert_eq!(backend.favorite_write_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_only_matches_full_triple() {
        let backend = InMemoryBackend::new();
        let user = Uuid::new_v4();
        backend.seed_favorite(FavoriteRow::new(user, "11007", ContentType::Cocktail));
        backend.seed_favorite(FavoriteRow::new(user, "11007", ContentType::Meal));

        backend
            .delete_favorite(user, "11007", ContentType::Cocktail)
            .await
            .unwrap();

        let left = backend.list_favorites(user).await.unwrap();
        assert_eq!(left, vec![FavoriteRow::new(user, "11007", ContentType::Meal)]);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let backend = InMemoryBackend::new();
        let user = Uuid::new_v4();
        backend.set_fail_writes(true);
        let err = backend
            .upsert_favorites(&[FavoriteRow::new(user, "1", ContentType::Meal)])
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::RemoteWriteFailed { .. }));
        assert!(backend.favorite_rows().is_empty());

        backend.set_fail_reads(true);
        assert!(backend.list_favorites(user).await.is_err());
    }

    #[tokio::test]
    async fn test_creations_listed_newest_first_per_owner() {
        let backend = InMemoryBackend::new();
        let user = Uuid::new_v4();
        backend.seed_creation(creation(user, "old", false, 30));
        backend.seed_creation(creation(user, "new", false, 1));
        backend.seed_creation(creation(Uuid::new_v4(), "other", true, 0));

        let titles: Vec<String> = backend
            .list_creations(user)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.title)
            .collect();
        assert_eq!(titles, vec!["new", "old"]);
    }

    #[tokio::test]
    async fn test_update_requires_owner() {
        let backend = InMemoryBackend::new();
        let owner = Uuid::new_v4();
        let row = creation(owner, "Dal", false, 0);
        let id = row.id;
        backend.seed_creation(row);

        let update = CreationUpdate {
            title: Some("Dal makhani".to_string()),
            ..Default::default()
        };
        let err = backend
            .update_creation(Uuid::new_v4(), id, &update)
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::NotFound { .. }));

        let updated = backend.update_creation(owner, id, &update).await.unwrap();
        assert_eq!(updated.title, "Dal makhani");
    }

    #[tokio::test]
    async fn test_public_reads_skip_private_rows() {
        let backend = InMemoryBackend::new();
        let user = Uuid::new_v4();
        let private = creation(user, "Secret vegan curry", false, 0);
        let private_id = private.id;
        backend.seed_creation(private);
        for i in 0..12 {
            backend.seed_creation(creation(user, &format!("Vegan bowl {}", i), true, i));
        }

        assert!(backend.get_public_creation(private_id).await.unwrap().is_none());
        let hits = backend.search_public_creations("vegan", 10).await.unwrap();
        assert_eq!(hits.len(), 10);
        assert!(hits.iter().all(|c| c.is_public));
    }
}
