//! SurrealDB implementation of [`RoleRepository`].
//!
//! Roles are keyed by slug, which doubles as the record id.

use chrono::{DateTime, Utc};
use permdir_core::error::PermdirResult;
use permdir_core::models::role::{CreateRole, Role, UpdateRole, validate_slug};
use permdir_core::repository::RoleRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use super::{IdRow, multilingual_from_json, multilingual_to_json};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct RoleRow {
    record_id: String,
    name: serde_json::Value,
    description: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
}

impl RoleRow {
    fn try_into_role(self) -> Result<Role, DbError> {
        Ok(Role {
            slug: self.record_id,
            name: multilingual_from_json("role", self.name)?,
            description: self
                .description
                .map(|d| multilingual_from_json("role", d))
                .transpose()?,
            created_at: self.created_at,
            modified_at: self.modified_at,
        })
    }
}

fn single(rows: Vec<RoleRow>, slug: &str) -> Result<Role, DbError> {
    rows.into_iter()
        .next()
        .ok_or_else(|| DbError::NotFound {
            entity: "role".into(),
            id: slug.into(),
        })?
        .try_into_role()
}

/// SurrealDB implementation of the Role repository.
#[derive(Clone)]
pub struct SurrealRoleRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealRoleRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> RoleRepository for SurrealRoleRepository<C> {
    async fn create(&self, input: CreateRole) -> PermdirResult<Role> {
        validate_slug(&input.slug)?;

        let result = self
            .db
            .query(
                "CREATE type::record('role', $slug) SET \
                 name = $name, description = $description; \
                 SELECT meta::id(id) AS record_id, * \
                 FROM type::record('role', $slug);",
            )
            .bind(("slug", input.slug.clone()))
            .bind(("name", multilingual_to_json(&input.name)))
            .bind((
                "description",
                input.description.as_ref().map(multilingual_to_json),
            ))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::statement("role", e))?;

        let rows: Vec<RoleRow> = result.take(1).map_err(DbError::from)?;
        Ok(single(rows, &input.slug)?)
    }

    async fn get_by_slug(&self, slug: &str) -> PermdirResult<Role> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM type::record('role', $slug)")
            .bind(("slug", slug.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        Ok(single(rows, slug)?)
    }

    async fn update(&self, slug: &str, input: UpdateRole) -> PermdirResult<Role> {
        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        sets.push("modified_at = time::now()");

        let query = format!(
            "UPDATE type::record('role', $slug) SET {}; \
             SELECT meta::id(id) AS record_id, * FROM type::record('role', $slug);",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("slug", slug.to_string()));
        if let Some(ref name) = input.name {
            builder = builder.bind(("name", multilingual_to_json(name)));
        }
        if let Some(ref description) = input.description {
            let description = description.as_ref().map(multilingual_to_json);
            builder = builder.bind(("description", description));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::statement("role", e))?;

        let rows: Vec<RoleRow> = result.take(1).map_err(DbError::from)?;
        Ok(single(rows, slug)?)
    }

    async fn delete(&self, slug: &str) -> PermdirResult<()> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id FROM type::record('role', $slug); \
                 DELETE acl WHERE role_id = $slug; \
                 DELETE type::record('role', $slug);",
            )
            .bind(("slug", slug.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::statement("role", e))?;

        let existing: Vec<IdRow> = result.take(0).map_err(DbError::from)?;
        if existing.is_empty() {
            return Err(DbError::NotFound {
                entity: "role".into(),
                id: slug.into(),
            }
            .into());
        }
        Ok(())
    }

    async fn list(&self) -> PermdirResult<Vec<Role>> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM role ORDER BY record_id ASC")
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        let roles = rows
            .into_iter()
            .map(RoleRow::try_into_role)
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(roles)
    }
}
