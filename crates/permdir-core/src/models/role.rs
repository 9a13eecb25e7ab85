//! Role domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::multilingual::Multilingual;
use crate::error::{PermdirError, PermdirResult};

/// A named permission grouping, identified by its slug.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Role {
    pub slug: String,
    pub name: Multilingual,
    pub description: Option<Multilingual>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRole {
    pub slug: String,
    pub name: Multilingual,
    pub description: Option<Multilingual>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateRole {
    pub name: Option<Multilingual>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<Multilingual>>,
}

/// Slugs are 1..=255 ASCII letters, digits, hyphens or underscores.
pub fn validate_slug(slug: &str) -> PermdirResult<()> {
    let valid_chars = slug
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if slug.is_empty() || slug.len() > 255 || !valid_chars {
        return Err(PermdirError::Validation {
            message: format!("invalid slug: {slug:?}"),
        });
    }
    Ok(())
}
