//! Error types for the permdir system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PermdirError {
    /// A filter, search or sort parameter the caller supplied is not
    /// acceptable. Rendered as a client error (HTTP 400) at the boundary.
    #[error("Invalid filter: {message}")]
    InvalidFilter { message: String },

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PermdirError {
    /// Whether the failure was caused by the caller's input rather than by
    /// the system itself.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PermdirError::InvalidFilter { .. }
                | PermdirError::NotFound { .. }
                | PermdirError::AlreadyExists { .. }
                | PermdirError::Validation { .. }
        )
    }
}

pub type PermdirResult<T> = Result<T, PermdirError>;
