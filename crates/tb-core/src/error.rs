//! # AppError
//!
//! Centralized error handling for the ticket board.

use thiserror::Error;

/// The primary error type for all tb-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., seed dataset, ticket)
    #[error("{0} not found: {1}")]
    NotFound(String, String),

    /// Input that cannot be handled at all. Filter problems are not reported
    /// through this variant, they travel in the `errors` map instead.
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Infrastructure failure (e.g., DB unreachable, migration failed)
    #[error("internal service error: {0}")]
    Internal(String),

    /// Settings could not be loaded
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(format!("{err:#}"))
    }
}

/// A specialized Result type for ticket board logic.
pub type Result<T> = std::result::Result<T, AppError>;
