//! Errors raised while assembling the application.

use chlorofill_core::ChlorofillError;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Telemetry init failed: {0}")]
    Telemetry(String),

    #[error("HTTP client setup failed: {0}")]
    HttpClient(String),

    #[error(transparent)]
    Domain(#[from] ChlorofillError),
}

pub type AppResult<T> = Result<T, AppError>;
