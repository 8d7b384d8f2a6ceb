//! Hosted backend access for ChloroFill.
//!
//! Two tables live on the hosted backend: `user_favorites` and
//! `user_creations`. [`FavoritesStore`] and [`CreationsStore`] describe the
//! operations the session layer needs; [`RestBackend`] talks to the
//! backend's REST endpoint and [`InMemoryBackend`] keeps both tables in
//! process for tests and offline runs.

pub mod memory;
pub mod rest;
pub mod store;

pub use memory::InMemoryBackend;
pub use rest::RestBackend;
pub use store::{CreationsStore, FavoritesStore, CREATIONS_TABLE, FAVORITES_TABLE, SEARCH_LIMIT};
