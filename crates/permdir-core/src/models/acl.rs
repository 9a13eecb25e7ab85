//! ACL domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Binding of one user to one role within one scope.
///
/// The triple `(user_id, scope_id, role_id)` is unique.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Acl {
    pub id: Uuid,
    pub user_id: Uuid,
    pub scope_id: Uuid,
    pub role_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateAcl {
    pub user_id: Uuid,
    pub scope_id: Uuid,
    pub role_id: String,
}
