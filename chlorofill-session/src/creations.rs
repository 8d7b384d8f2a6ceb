//! The signed-in user's own recipes and cocktails, plus public lookups.

use std::sync::{Arc, PoisonError, RwLock};

use chlorofill_backend::{CreationsStore, SEARCH_LIMIT};
use chlorofill_core::{
    BackendError, CreationUpdate, NewCreation, SearchHit, UserCreation,
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::AuthState;

/// Creations service with a cached copy of the user's own list.
///
/// Mutations require a signed-in user and fail with `NotAuthenticated`
/// otherwise. Public reads work for everyone.
pub struct CreationsService {
    store: Arc<dyn CreationsStore>,
    auth: Arc<AuthState>,
    own: RwLock<Vec<UserCreation>>,
}

impl CreationsService {
    pub fn new(store: Arc<dyn CreationsStore>, auth: Arc<AuthState>) -> Self {
        Self {
            store,
            auth,
            own: RwLock::new(Vec::new()),
        }
    }

    /// Last fetched list of the user's creations, newest first.
    pub fn own(&self) -> Vec<UserCreation> {
        self.own.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn replace_own(&self, creations: Vec<UserCreation>) {
        *self.own.write().unwrap_or_else(PoisonError::into_inner) = creations;
    }

    /// Fetch the user's creations. Signed out, the list is simply empty.
    ///
    /// A failed fetch empties the cached list and returns the error.
    pub async fn refresh_own(&self) -> Result<Vec<UserCreation>, BackendError> {
        let Some(user_id) = self.auth.user_id() else {
            self.replace_own(Vec::new());
            return Ok(Vec::new());
        };
        match self.store.list_creations(user_id).await {
            Ok(creations) => {
                self.replace_own(creations.clone());
                Ok(creations)
            }
            Err(e) => {
                tracing::error!(%user_id, error = %e, "failed to fetch creations");
                self.replace_own(Vec::new());
                Err(e)
            }
        }
    }

    pub async fn create(&self, creation: &NewCreation) -> Result<UserCreation, BackendError> {
        let user_id = self.auth.require_user()?;
        let row = self.store.insert_creation(user_id, creation).await?;
        self.own
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(0, row.clone());
        tracing::info!(%user_id, creation_id = %row.id, "creation saved");
        Ok(row)
    }

    /// Apply `update`, stamping `updated_at` with the current time.
    pub async fn update(
        &self,
        id: Uuid,
        mut update: CreationUpdate,
    ) -> Result<UserCreation, BackendError> {
        let user_id = self.auth.require_user()?;
        update.updated_at = Some(Utc::now());
        let row = self.store.update_creation(user_id, id, &update).await?;

        let mut own = self.own.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = own.iter_mut().find(|c| c.id == id) {
            *slot = row.clone();
        }
        Ok(row)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), BackendError> {
        let user_id = self.auth.require_user()?;
        self.store.delete_creation(user_id, id).await?;
        self.own
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|c| c.id != id);
        Ok(())
    }

    /// A public creation by id.
    pub async fn get_public(&self, id: Uuid) -> Result<Option<UserCreation>, BackendError> {
        self.store.get_public_creation(id).await
    }

    /// Search public creations. A blank query matches nothing.
    pub async fn search_public(&self, query: &str) -> Result<Vec<SearchHit>, BackendError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let creations = self
            .store
            .search_public_creations(query, SEARCH_LIMIT)
            .await
            .inspect_err(|e| tracing::error!(query, error = %e, "creation search failed"))?;
        Ok(creations.iter().map(SearchHit::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::UserIdentity;
    use chlorofill_backend::InMemoryBackend;
    use chlorofill_core::{ContentType, CreationType, ItemSource};
    use chlorofill_test_utils::fixtures::{new_recipe, public_creation};

    fn service() -> (CreationsService, Arc<InMemoryBackend>, Arc<AuthState>) {
        let backend = Arc::new(InMemoryBackend::new());
        let auth = Arc::new(AuthState::new());
        (CreationsService::new(backend.clone(), auth.clone()), backend, auth)
    }

    #[tokio::test]
    async fn test_mutations_require_sign_in() {
        let (service, backend, _) = service();

        assert_eq!(
            service.create(&new_recipe("Dal")).await.unwrap_err(),
            BackendError::NotAuthenticated
        );
        assert_eq!(
            service
                .update(Uuid::new_v4(), CreationUpdate::default())
                .await
                .unwrap_err(),
            BackendError::NotAuthenticated
        );
        assert_eq!(
            service.delete(Uuid::new_v4()).await.unwrap_err(),
            BackendError::NotAuthenticated
        );
        assert_eq!(backend.creation_count(), 0);
        assert!(service.refresh_own().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_update_delete_keep_own_list_current() {
        let (service, _, auth) = service();
        auth.set(Some(UserIdentity::new(Uuid::new_v4())));

        let first = service.create(&new_recipe("Dal")).await.unwrap();
        let second = service.create(&new_recipe("Chana")).await.unwrap();
        let titles: Vec<String> = service.own().into_iter().map(|c| c.title).collect();
        assert_eq!(titles, vec!["Chana", "Dal"]);

        let updated = service
            .update(
                first.id,
                CreationUpdate {
                    title: Some("Dal tadka".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.updated_at.is_some());
        assert_eq!(service.own()[1].title, "Dal tadka");

        service.delete(second.id).await.unwrap();
        assert_eq!(service.own().len(), 1);
        assert_eq!(service.refresh_own().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_search_normalizes_hits() {
        let (service, backend, _) = service();
        let owner = Uuid::new_v4();
        backend.seed_creation(public_creation(owner, "Masala chai", CreationType::Cocktail));
        backend.seed_creation(public_creation(owner, "Masala dosa", CreationType::Recipe));

        let hits = service.search_public("masala").await.unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|h| h.source == ItemSource::UserGenerated));
        assert_eq!(hits[0].content_type, ContentType::Cocktail);
        assert_eq!(hits[1].content_type, ContentType::Meal);

        assert!(service.search_public("   ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_refresh_clears_cached_list() {
        let (service, backend, auth) = service();
        auth.set(Some(UserIdentity::new(Uuid::new_v4())));
        service.create(&new_recipe("Dal")).await.unwrap();

        backend.set_fail_reads(true);
        assert!(service.refresh_own().await.is_err());
        assert!(service.own().is_empty());
    }
}
