//! Talent Radar CLI error types.

use sqlx::migrate::MigrateError;
use talentradar_core::error::DomainError;
use thiserror::Error;

/// Startup and runtime errors for the CLI.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Applying the schema failed.
    #[error("migration error: {0}")]
    Migrate(#[from] MigrateError),

    /// A command or query was rejected or failed.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Writing the result failed.
    #[error("output error: {0}")]
    Output(#[from] serde_json::Error),
}
