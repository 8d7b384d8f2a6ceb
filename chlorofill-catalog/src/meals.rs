//! Meal catalog API.

use std::sync::Arc;

use chlorofill_core::CatalogError;

use crate::cache::{CacheConfig, CacheStats};
use crate::client::CachedFetchClient;
use crate::envelope::{first_of, list_field};
use crate::models::{Area, Meal, MealCategory};
use crate::transport::CatalogTransport;

pub const MEAL_API_BASE_URL: &str = "https://www.themealdb.com/api/json/v1/1";

const MEALS: &str = "meals";
const CATEGORIES: &str = "categories";

/// Client for the meal catalog.
///
/// Cache keys: `categories`, `category_<c>`, `recipe_<id>`, `areas`,
/// `area_<a>`. Search and random are never cached.
pub struct MealCatalog<T: CatalogTransport> {
    client: CachedFetchClient<T>,
    base_url: String,
}

impl<T: CatalogTransport> MealCatalog<T> {
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

    pub async fn categories(&self) -> Result<Vec<MealCategory>, CatalogError> {
        let url = self.url("categories.php");
        let read = self.client.fetch_with_cache(&url, "categories").await?;
        list_field(read.value(), CATEGORIES, &url)
    }

    pub async fn meals_by_category(&self, category: &str) -> Result<Vec<Meal>, CatalogError> {
        let url = self.url(&format!("filter.php?c={}", urlencoding::encode(category)));
        let key = format!("category_{}", category);
        let read = self.client.fetch_with_cache(&url, &key).await?;
        list_field(read.value(), MEALS, &url)
    }

    /// Full record for `id`, or `None` when the catalog has no such meal.
    pub async fn meal_by_id(&self, id: &str) -> Result<Option<Meal>, CatalogError> {
        let url = self.url(&format!("lookup.php?i={}", urlencoding::encode(id)));
        let key = format!("recipe_{}", id);
        let read = self.client.fetch_with_cache(&url, &key).await?;
        first_of(read.value(), MEALS, &url)
    }

    pub async fn areas(&self) -> Result<Vec<Area>, CatalogError> {
        let url = self.url("list.php?a=list");
        let read = self.client.fetch_with_cache(&url, "areas").await?;
        list_field(read.value(), MEALS, &url)
    }

    pub async fn meals_by_area(&self, area: &str) -> Result<Vec<Meal>, CatalogError> {
        let url = self.url(&format!("filter.php?a={}", urlencoding::encode(area)));
        let key = format!("area_{}", area);
        let read = self.client.fetch_with_cache(&url, &key).await?;
        list_field(read.value(), MEALS, &url)
    }

    pub async fn search(&self, query: &str) -> Result<Vec<Meal>, CatalogError> {
        let url = self.url(&format!("search.php?s={}", urlencoding::encode(query)));
        let payload = self.client.fetch_uncached(&url).await?;
        list_field(&payload, MEALS, &url)
    }

    pub async fn random(&self) -> Result<Option<Meal>, CatalogError> {
        let url = self.url("random.php");
        let payload = self.client.fetch_uncached(&url).await?;
        first_of(&payload, MEALS, &url)
    }

    pub fn clear_cache(&self) {
        self.client.clear_cache();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.client.stats()
    }
}
