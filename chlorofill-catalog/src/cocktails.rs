//! Cocktail catalog API.

use std::sync::Arc;

use chlorofill_core::CatalogError;

use crate::cache::{CacheConfig, CacheStats};
use crate::client::CachedFetchClient;
use crate::envelope::{first_of, list_field};
use crate::models::{AlcoholicFilter, Drink, DrinkCategory, GlassType};
use crate::transport::CatalogTransport;

pub const COCKTAIL_API_BASE_URL: &str = "https://www.thecocktaildb.com/api/json/v1/1";

const DRINKS: &str = "drinks";

/// Client for the cocktail catalog.
///
/// Every key is namespaced (`cocktail_…`, `alcoholic_filters`,
/// `glass_types`) so a shared table cannot collide with meal keys.
pub struct CocktailCatalog<T: CatalogTransport> {
    client: CachedFetchClient<T>,
    base_url: String,
}

impl<T: CatalogTransport> CocktailCatalog<T> {
    pub fn new(base_url: &str, transport: Arc<T>, config: CacheConfig) -> Self {
        Self {
            client: CachedFetchClient::new(transport, config),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn client(&self) -> &CachedFetchClient<T> {
        &self.client
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn cached_list<E>(&self, path: &str, key: &str) -> Result<Vec<E>, CatalogError>
    where
        E: serde::de::DeserializeOwned,
    {
        let url = self.url(path);
        let read = self.client.fetch_with_cache(&url, key).await?;
        list_field(read.value(), DRINKS, &url)
    }

    pub async fn categories(&self) -> Result<Vec<DrinkCategory>, CatalogError> {
        self.cached_list("list.php?c=list", "cocktail_categories").await
    }

    pub async fn cocktails_by_category(&self, category: &str) -> Result<Vec<Drink>, CatalogError> {
        self.cached_list(
            &format!("filter.php?c={}", urlencoding::encode(category)),
            &format!("cocktail_category_{}", category),
        )
        .await
    }

    pub async fn alcoholic_filters(&self) -> Result<Vec<AlcoholicFilter>, CatalogError> {
        self.cached_list("list.php?a=list", "alcoholic_filters").await
    }

    pub async fn cocktails_by_alcoholic_filter(
        &self,
        filter: &str,
    ) -> Result<Vec<Drink>, CatalogError> {
        self.cached_list(
            &format!("filter.php?a={}", urlencoding::encode(filter)),
            &format!("cocktail_alcoholic_{}", filter),
        )
        .await
    }

    pub async fn glass_types(&self) -> Result<Vec<GlassType>, CatalogError> {
        self.cached_list("list.php?g=list", "glass_types").await
    }

    pub async fn cocktails_by_glass_type(&self, glass: &str) -> Result<Vec<Drink>, CatalogError> {
        self.cached_list(
            &format!("filter.php?g={}", urlencoding::encode(glass)),
            &format!("cocktail_glass_{}", glass),
        )
        .await
    }

    pub async fn cocktails_by_first_letter(&self, letter: char) -> Result<Vec<Drink>, CatalogError> {
        let letter = letter.to_string();
        self.cached_list(
            &format!("search.php?f={}", urlencoding::encode(&letter)),
            &format!("cocktail_letter_{}", letter),
        )
        .await
    }

    /// Generic filter, e.g. `("i", "Gin")` for cocktails containing gin.
    pub async fn cocktails_by_filter(
        &self,
        filter_type: &str,
        filter_value: &str,
    ) -> Result<Vec<Drink>, CatalogError> {
        self.cached_list(
            &format!(
                "filter.php?{}={}",
                urlencoding::encode(filter_type),
                urlencoding::encode(filter_value)
            ),
            &format!("cocktail_filter_{}_{}", filter_type, filter_value),
        )
        .await
    }

    /// Full record for `id`, or `None` when the catalog has no such drink.
    pub async fn cocktail_by_id(&self, id: &str) -> Result<Option<Drink>, CatalogError> {
        let url = self.url(&format!("lookup.php?i={}", urlencoding::encode(id)));
        let read = self
            .client
            .fetch_with_cache(&url, &format!("cocktail_{}", id))
            .await?;
        first_of(read.value(), DRINKS, &url)
    }

    pub async fn search(&self, query: &str) -> Result<Vec<Drink>, CatalogError> {
        let url = self.url(&format!("search.php?s={}", urlencoding::encode(query)));
        let payload = self.client.fetch_uncached(&url).await?;
        list_field(&payload, DRINKS, &url)
    }

    pub async fn random(&self) -> Result<Option<Drink>, CatalogError> {
        let url = self.url("random.php");
        let payload = self.client.fetch_uncached(&url).await?;
        first_of(&payload, DRINKS, &url)
    }

    pub fn clear_cache(&self) {
        self.client.clear_cache();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.client.stats()
    }
}
