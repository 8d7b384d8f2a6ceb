//! ChloroFill Catalog - Cached Catalog Clients
//!
//! Read-only access to the public meal and cocktail catalogs. Every lookup,
//! list and filter goes through a response cache with a fixed time-to-live;
//! search and random picks always reach the network.

pub mod cache;
pub mod client;
pub mod cocktails;
pub mod envelope;
pub mod meals;
pub mod models;
pub mod transport;

pub use cache::{CacheConfig, CacheEntry, CacheRead, CacheStats, ResponseCache, DEFAULT_CACHE_TTL};
pub use client::CachedFetchClient;
pub use cocktails::{CocktailCatalog, COCKTAIL_API_BASE_URL};
pub use meals::{MealCatalog, MEAL_API_BASE_URL};
pub use models::{
    AlcoholicFilter, Area, CatalogIngredient, Drink, DrinkCategory, GlassType, Meal, MealCategory,
};
pub use transport::{CatalogTransport, HttpTransport};
