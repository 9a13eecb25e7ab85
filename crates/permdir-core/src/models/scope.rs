//! Scope domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::multilingual::Multilingual;

/// Context (e.g. an organisational unit) in which a role grant applies.
/// Scopes form a tree through `parent_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Scope {
    pub id: Uuid,
    pub name: Multilingual,
    pub description: Option<Multilingual>,
    pub parent_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateScope {
    pub name: Multilingual,
    pub description: Option<Multilingual>,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateScope {
    pub name: Option<Multilingual>,
    pub description: Option<Option<Multilingual>>,
    pub parent_id: Option<Option<Uuid>>,
    pub is_active: Option<bool>,
}
