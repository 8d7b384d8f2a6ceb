//! Error types for ChloroFill operations

use thiserror::Error;

/// Catalog read errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Request to {url} failed with status {status}")]
    RequestFailed { url: String, status: u16 },

    #[error("Malformed response from {url}: {reason}")]
    DecodeFailed { url: String, reason: String },

    #[error("Transport error for {url}: {reason}")]
    Transport { url: String, reason: String },
}

impl CatalogError {
    /// HTTP status for `RequestFailed`, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            CatalogError::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Device-local storage errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LocalStoreError {
    #[error("Stored value under {key} is corrupt: {reason}")]
    StorageCorrupt { key: String, reason: String },

    #[error("Local storage I/O failed: {reason}")]
    Io { reason: String },
}

/// Hosted backend errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Write to {table} rejected: {reason}")]
    RemoteWriteFailed { table: String, reason: String },

    #[error("Read from {table} failed: {reason}")]
    RemoteReadFailed { table: String, reason: String },

    #[error("No row in {table} with id {id}")]
    NotFound { table: String, id: String },
}

/// Master error type for all ChloroFill errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChlorofillError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Local storage error: {0}")]
    LocalStore(#[from] LocalStoreError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Result type alias for ChloroFill operations.
pub type ChlorofillResult<T> = Result<T, ChlorofillError>;

// =============================================================================
// TESTS
// =============================================================================
