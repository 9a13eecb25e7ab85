//! Query error types.

use permdir_core::entity::EntityKind;
use permdir_core::error::PermdirError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("unknown filter '{name}' for {entity}")]
    UnknownFilter { entity: EntityKind, name: String },

    #[error("lookup '{lookup}' is not allowed on {entity}.{field}")]
    UnsupportedLookup {
        entity: EntityKind,
        field: String,
        lookup: String,
    },

    #[error("invalid value {value:?} for '{field}': expected {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: &'static str,
    },

    #[error("cannot sort {entity} by '{field}'")]
    UnknownSortField { entity: EntityKind, field: String },

    #[error("malformed query parameter '{key}'")]
    MalformedKey { key: String },

    #[error("no registry entry for {0}")]
    UnregisteredEntity(EntityKind),

    #[error("invalid registry: {0}")]
    Registry(String),
}

impl QueryError {
    /// Client errors are rejected requests; the rest are faults in how the
    /// engine was set up.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            QueryError::UnregisteredEntity(_) | QueryError::Registry(_)
        )
    }
}

impl From<QueryError> for PermdirError {
    fn from(err: QueryError) -> Self {
        if err.is_client_error() {
            PermdirError::InvalidFilter {
                message: err.to_string(),
            }
        } else {
            PermdirError::Configuration(err.to_string())
        }
    }
}
