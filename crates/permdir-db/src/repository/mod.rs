//! SurrealDB repository implementations.

mod acl;
mod role;
mod scope;
mod user;

pub use acl::SurrealAclRepository;
pub use role::SurrealRoleRepository;
pub use scope::SurrealScopeRepository;
pub use user::SurrealUserRepository;

use permdir_core::Multilingual;
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// Row struct for existence checks.
#[derive(Debug, SurrealValue)]
struct IdRow {
    #[allow(dead_code)]
    record_id: String,
}

fn parse_uuid(entity: &str, raw: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(raw)
        .map_err(|e| DbError::decode(entity, format!("invalid UUID {raw:?}: {e}")))
}

fn multilingual_to_json(value: &Multilingual) -> serde_json::Value {
    serde_json::Value::Object(
        value
            .iter()
            .map(|(locale, text)| {
                (locale.to_string(), serde_json::Value::String(text.into()))
            })
            .collect(),
    )
}

fn multilingual_from_json(entity: &str, value: serde_json::Value) -> Result<Multilingual, DbError> {
    serde_json::from_value(value).map_err(|e| DbError::decode(entity, e))
}
