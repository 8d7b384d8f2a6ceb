//! ChloroFill Core - Shared Types
//!
//! Identifiers, entities and the error taxonomy used by every other crate.
//! This crate carries no I/O.

pub mod access;
pub mod entities;
pub mod error;
pub mod identity;
pub mod links;
pub mod theme;

pub use access::{route_access, RouteAccess, PROTECTED_PREFIXES};
pub use entities::{
    CreationType, CreationUpdate, FavoriteRow, Ingredient, NewCreation, SearchHit, UserCreation,
};
pub use error::{
    BackendError, CatalogError, ChlorofillError, ChlorofillResult, LocalStoreError,
};
pub use identity::{
    is_ugc_id, ContentType, ContentTypeParseError, ItemRef, ItemSource, Timestamp, UserId,
};
pub use links::{amazon_search_url, AMAZON_AFFILIATE_TAG};
pub use theme::Theme;
