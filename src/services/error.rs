use crate::db::error::DbError;
use thiserror::Error;

/// ServiceError represents errors that can occur in the service layer of the application.
/// Wraps lower-level errors to provide a consistent error handling mechanism across the service layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("entity not found: {entity}")]
    NotFound { entity: &'static str },

    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    #[error(transparent)]
    Database(#[from] DbError),
}
