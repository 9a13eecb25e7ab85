//! Database-specific error types and conversions.

use permdir_core::error::PermdirError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Record already exists: {entity}")]
    Conflict { entity: String },

    #[error("Corrupt {entity} row: {message}")]
    Decode { entity: String, message: String },
}

impl DbError {
    pub(crate) fn decode(entity: &str, message: impl ToString) -> Self {
        DbError::Decode {
            entity: entity.into(),
            message: message.to_string(),
        }
    }

    /// Maps a failed statement, turning unique-index and duplicate-record
    /// violations into [`DbError::Conflict`].
    pub(crate) fn statement(entity: &str, err: surrealdb::Error) -> Self {
        if is_conflict(&err.to_string()) {
            DbError::Conflict {
                entity: entity.into(),
            }
        } else {
            DbError::Surreal(err)
        }
    }
}

/// Unique-index violations read "index `..` already contains ..";
/// duplicate record ids read "record `..` already exists".
fn is_conflict(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    (message.contains("index") && message.contains("already contains"))
        || (message.contains("record") && message.contains("already exists"))
}

impl From<DbError> for PermdirError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => PermdirError::NotFound { entity, id },
            DbError::Conflict { entity } => PermdirError::AlreadyExists { entity },
            other => PermdirError::Database(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflicts_surface_as_already_exists() {
        let err: PermdirError = DbError::Conflict {
            entity: "acl".into(),
        }
        .into();
        assert!(matches!(err, PermdirError::AlreadyExists { ref entity } if entity == "acl"));
    }

    #[test]
    fn conflict_messages_are_recognised() {
        assert!(is_conflict(
            "Database index `idx_user_username` already contains 'alice', \
             with record `user:0d1c`"
        ));
        assert!(is_conflict("Database record `role:admin` already exists"));
        assert!(!is_conflict("Found NONE for field `username`, but expected a string"));
        assert!(!is_conflict("The table 'acl' does not exist"));
    }

    #[test]
    fn decode_failures_are_database_errors() {
        let err: PermdirError = DbError::decode("scope", "invalid UUID").into();
        assert!(matches!(err, PermdirError::Database(ref m) if m.contains("scope")));
        assert!(!err.is_client_error());
    }
}
