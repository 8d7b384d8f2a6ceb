//! ChloroFill application root.
//!
//! [`App`] is the single composition point: it owns the catalog clients, the
//! backend handle and the [`Session`](chlorofill_session::Session), and is
//! passed by reference to whatever drives the UI.

pub mod app;
pub mod config;
pub mod error;
pub mod telemetry;

pub use app::{App, ItemDetail, UnifiedSearch};
pub use config::{AppConfig, BackendConfig, ConfigError, LoggingConfig};
pub use error::{AppError, AppResult};
pub use telemetry::init_tracing;
