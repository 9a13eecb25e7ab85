//! SurrealDB implementation of [`AclRepository`].

use chrono::{DateTime, Utc};
use permdir_core::error::PermdirResult;
use permdir_core::models::acl::{Acl, CreateAcl};
use permdir_core::repository::AclRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{IdRow, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct AclRow {
    record_id: String,
    user_id: String,
    scope_id: String,
    role_id: String,
    created_at: DateTime<Utc>,
}

impl AclRow {
    fn try_into_acl(self) -> Result<Acl, DbError> {
        Ok(Acl {
            id: parse_uuid("acl", &self.record_id)?,
            user_id: parse_uuid("acl", &self.user_id)?,
            scope_id: parse_uuid("acl", &self.scope_id)?,
            role_id: self.role_id,
            created_at: self.created_at,
        })
    }
}

fn into_acls(rows: Vec<AclRow>) -> Result<Vec<Acl>, DbError> {
    rows.into_iter().map(AclRow::try_into_acl).collect()
}

/// SurrealDB implementation of the ACL repository.
#[derive(Clone)]
pub struct SurrealAclRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAclRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Fails with `NotFound` for the first referenced record that is missing.
    async fn ensure_references(&self, input: &CreateAcl) -> Result<(), DbError> {
        let user_id = input.user_id.to_string();
        let scope_id = input.scope_id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id FROM type::record('user', $user_id); \
                 SELECT meta::id(id) AS record_id FROM type::record('role', $role_id); \
                 SELECT meta::id(id) AS record_id FROM type::record('scope', $scope_id);",
            )
            .bind(("user_id", user_id.clone()))
            .bind(("role_id", input.role_id.clone()))
            .bind(("scope_id", scope_id.clone()))
            .await?;

        let lookups = [
            ("user", user_id),
            ("role", input.role_id.clone()),
            ("scope", scope_id),
        ];
        for (index, (entity, id)) in lookups.into_iter().enumerate() {
            let rows: Vec<IdRow> = result.take(index)?;
            if rows.is_empty() {
                return Err(DbError::NotFound {
                    entity: entity.into(),
                    id,
                });
            }
        }
        Ok(())
    }
}

impl<C: Connection> AclRepository for SurrealAclRepository<C> {
    async fn grant(&self, input: CreateAcl) -> PermdirResult<Acl> {
        self.ensure_references(&input).await?;
        let id = Uuid::new_v4();

        let result = self
            .db
            .query(
                "CREATE type::record('acl', $id) SET \
                 user_id = $user_id, scope_id = $scope_id, role_id = $role_id; \
                 SELECT meta::id(id) AS record_id, * \
                 FROM type::record('acl', $id);",
            )
            .bind(("id", id.to_string()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("scope_id", input.scope_id.to_string()))
            .bind(("role_id", input.role_id))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::statement("acl", e))?;

        let rows: Vec<AclRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "acl".into(),
            id: id.to_string(),
        })?;
        Ok(row.try_into_acl()?)
    }

    async fn revoke(&self, user_id: Uuid, role_id: &str, scope_id: Uuid) -> PermdirResult<()> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id FROM acl \
                 WHERE user_id = $user_id AND role_id = $role_id AND scope_id = $scope_id; \
                 DELETE acl \
                 WHERE user_id = $user_id AND role_id = $role_id AND scope_id = $scope_id;",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("role_id", role_id.to_string()))
            .bind(("scope_id", scope_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::statement("acl", e))?;

        let existing: Vec<IdRow> = result.take(0).map_err(DbError::from)?;
        if existing.is_empty() {
            return Err(DbError::NotFound {
                entity: "acl".into(),
                id: format!("{user_id}/{role_id}/{scope_id}"),
            }
            .into());
        }
        Ok(())
    }

    async fn list(&self) -> PermdirResult<Vec<Acl>> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM acl ORDER BY created_at ASC")
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AclRow> = result.take(0).map_err(DbError::from)?;
        Ok(into_acls(rows)?)
    }

    async fn list_for_user(&self, user_id: Uuid) -> PermdirResult<Vec<Acl>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM acl \
                 WHERE user_id = $user_id ORDER BY created_at ASC",
            )
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AclRow> = result.take(0).map_err(DbError::from)?;
        Ok(into_acls(rows)?)
    }
}
