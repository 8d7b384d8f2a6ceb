//! In-memory response cache with time-based expiry.
//!
//! Entries are keyed by caller-derived strings such as `category_Seafood`.
//! An entry is served while it is younger than the configured TTL; older
//! entries stay in the table until the same key is fetched again and
//! overwritten. Nothing is evicted otherwise, and [`ResponseCache::clear`]
//! drops everything at once.
//!
//! Reads return [`CacheRead<T>`], which records whether the value came from
//! the table or from the network and when it was fetched.

pub mod freshness;
pub mod table;

pub use freshness::CacheRead;
pub use table::{CacheConfig, CacheEntry, CacheStats, ResponseCache, DEFAULT_CACHE_TTL};
