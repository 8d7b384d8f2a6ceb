//! Root composition: one [`App`] per running client.

use std::sync::Arc;

use chlorofill_backend::{CreationsStore, FavoritesStore, InMemoryBackend, RestBackend};
use chlorofill_catalog::{
    CacheConfig, CatalogTransport, CocktailCatalog, Drink, HttpTransport, Meal, MealCatalog,
};
use chlorofill_core::{
    ChlorofillResult, ContentType, ItemRef, ItemSource, SearchHit, Theme, UserCreation,
};
use chlorofill_session::{FileLocalStore, LocalStore, MemoryLocalStore, Session, SyncOutcome, UserIdentity};

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};

/// A resolved item, from whichever source holds it.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemDetail {
    Meal(Meal),
    Drink(Drink),
    Creation(UserCreation),
}

/// Results of one query across every source.
///
/// A source that failed contributes no hits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnifiedSearch {
    pub meals: Vec<SearchHit>,
    pub cocktails: Vec<SearchHit>,
    pub creations: Vec<SearchHit>,
}

impl UnifiedSearch {
    pub fn is_empty(&self) -> bool {
        self.meals.is_empty() && self.cocktails.is_empty() && self.creations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.meals.len() + self.cocktails.len() + self.creations.len()
    }

    /// All hits, catalog meals first, then cocktails, then creations.
    pub fn into_hits(self) -> Vec<SearchHit> {
        let mut hits = self.meals;
        hits.extend(self.cocktails);
        hits.extend(self.creations);
        hits
    }
}

pub struct App<T: CatalogTransport = HttpTransport> {
    meals: MealCatalog<T>,
    cocktails: CocktailCatalog<T>,
    session: Session,
    rest: Option<Arc<RestBackend>>,
}

impl App<HttpTransport> {
    /// Build every component described by `config`.
    pub fn from_config(config: &AppConfig, system_theme: Option<Theme>) -> AppResult<Self> {
        let transport = Arc::new(
            HttpTransport::new(config.request_timeout())
                .map_err(|e| AppError::Domain(e.into()))?,
        );
        let cache = config.cache_config();
        let meals = MealCatalog::new(&config.meal_api_base_url, Arc::clone(&transport), cache.clone());
        let cocktails = CocktailCatalog::new(&config.cocktail_api_base_url, transport, cache);

        let local: Arc<dyn LocalStore> = match &config.local_storage_path {
            Some(path) => Arc::new(FileLocalStore::new(path)),
            None => Arc::new(MemoryLocalStore::new()),
        };

        let app = match &config.backend {
            Some(backend) => {
                let rest = Arc::new(
                    RestBackend::new(&backend.url, &backend.anon_key, config.request_timeout())
                        .map_err(|e| AppError::HttpClient(e.to_string()))?,
                );
                let session = Session::new(local, rest.clone(), rest.clone(), system_theme);
                let mut app = App::new(meals, cocktails, session);
                app.rest = Some(rest);
                app
            }
            None => {
                tracing::warn!("no backend configured; favorites and creations stay in memory");
                let memory = Arc::new(InMemoryBackend::new());
                App::new(meals, cocktails, Session::new(local, memory.clone(), memory, system_theme))
            }
        };

        tracing::info!(
            meal_api = %config.meal_api_base_url,
            cocktail_api = %config.cocktail_api_base_url,
            remote_backend = app.rest.is_some(),
            "application assembled"
        );
        Ok(app)
    }
}

impl<T: CatalogTransport> App<T> {
    pub fn new(meals: MealCatalog<T>, cocktails: CocktailCatalog<T>, session: Session) -> Self {
        Self {
            meals,
            cocktails,
            session,
            rest: None,
        }
    }

    /// Assemble from explicit stores, sharing one transport between catalogs.
    pub fn with_stores<S>(
        transport: Arc<T>,
        meal_base_url: &str,
        cocktail_base_url: &str,
        cache: CacheConfig,
        backend: Arc<S>,
        local: Arc<dyn LocalStore>,
        system_theme: Option<Theme>,
    ) -> Self
    where
        S: FavoritesStore + CreationsStore + 'static,
    {
        let meals = MealCatalog::new(meal_base_url, Arc::clone(&transport), cache.clone());
        let cocktails = CocktailCatalog::new(cocktail_base_url, transport, cache);
        let session = Session::new(local, backend.clone(), backend, system_theme);
        Self::new(meals, cocktails, session)
    }

    pub fn meals(&self) -> &MealCatalog<T> {
        &self.meals
    }

    pub fn cocktails(&self) -> &CocktailCatalog<T> {
        &self.cocktails
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Forward an auth state change: backend credentials first, then the
    /// session and its favorites.
    pub async fn identity_changed(&self, identity: Option<UserIdentity>) -> SyncOutcome {
        if let Some(rest) = &self.rest {
            rest.set_access_token(identity.as_ref().and_then(|i| i.access_token.clone()));
        }
        self.session.identity_changed(identity).await
    }

    /// Resolve an item from the source its reference names.
    ///
    /// A user-generated reference whose id is not a UUID resolves to nothing,
    /// as does a creation whose kind differs from the reference's.
    pub async fn lookup(&self, item: &ItemRef) -> ChlorofillResult<Option<ItemDetail>> {
        match item.source {
            ItemSource::Catalog => match item.content_type {
                ContentType::Meal => Ok(self.meals.meal_by_id(&item.id).await?.map(ItemDetail::Meal)),
                ContentType::Cocktail => Ok(self
                    .cocktails
                    .cocktail_by_id(&item.id)
                    .await?
                    .map(ItemDetail::Drink)),
            },
            ItemSource::UserGenerated => {
                let Some(id) = item.creation_id() else {
                    return Ok(None);
                };
                let creation = self.session.creations().get_public(id).await?;
                Ok(creation
                    .filter(|c| c.creation_type.content_type() == item.content_type)
                    .map(ItemDetail::Creation))
            }
        }
    }

    /// Resolve an untagged id, as found in a route or a stored favorite.
    pub async fn lookup_raw(
        &self,
        content_type: ContentType,
        raw_id: &str,
    ) -> ChlorofillResult<Option<ItemDetail>> {
        self.lookup(&ItemRef::classify(content_type, raw_id)).await
    }

    /// The current favorites of one type, tagged by source.
    pub fn favorite_refs(&self, content_type: ContentType) -> Vec<ItemRef> {
        self.session
            .favorites()
            .ids(content_type)
            .iter()
            .map(|id| ItemRef::classify(content_type, id))
            .collect()
    }

    /// Search both catalogs and public creations concurrently.
    pub async fn search_all(&self, query: &str) -> UnifiedSearch {
        let query = query.trim();
        if query.is_empty() {
            return UnifiedSearch::default();
        }

        let (meals, cocktails, creations) = tokio::join!(
            self.meals.search(query),
            self.cocktails.search(query),
            self.session.creations().search_public(query),
        );

        UnifiedSearch {
            meals: meals
                .map(|found| found.iter().map(Meal::search_hit).collect())
                .unwrap_or_else(|e| {
                    tracing::warn!(query, error = %e, "meal search failed");
                    Vec::new()
                }),
            cocktails: cocktails
                .map(|found| found.iter().map(Drink::search_hit).collect())
                .unwrap_or_else(|e| {
                    tracing::warn!(query, error = %e, "cocktail search failed");
                    Vec::new()
                }),
            // Already logged by the creations service.
            creations: creations.unwrap_or_default(),
        }
    }

    pub fn clear_catalog_caches(&self) {
        self.meals.clear_cache();
        self.cocktails.clear_cache();
    }
}
