use thiserror::Error;

use common::{AssetId, ConsumerId, Tenor};

/// Errors that can occur when interacting with the credit stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No credit limit row exists for this (consumer, tenor) pair.
    /// Onboarding creates one row per tenor; a missing row means the
    /// consumer was never onboarded for it.
    #[error("credit limit not found for consumer {consumer} at tenor {tenor}")]
    LimitNotFound { consumer: ConsumerId, tenor: Tenor },

    /// The asset does not exist in the catalog.
    #[error("asset not found: {0}")]
    AssetNotFound(AssetId),

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
