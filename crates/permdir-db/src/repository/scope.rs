//! SurrealDB implementation of [`ScopeRepository`].
//!
//! Scopes form a tree through `parent_id`. Re-parenting refuses to create
//! a cycle; deleting a scope removes its whole subtree and the ACL entries
//! bound to it.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use permdir_core::error::{PermdirError, PermdirResult};
use permdir_core::models::scope::{CreateScope, Scope, UpdateScope};
use permdir_core::repository::ScopeRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{IdRow, multilingual_from_json, multilingual_to_json, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct ScopeRow {
    record_id: String,
    name: serde_json::Value,
    description: Option<serde_json::Value>,
    parent_id: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
}

impl ScopeRow {
    fn try_into_scope(self) -> Result<Scope, DbError> {
        Ok(Scope {
            id: parse_uuid("scope", &self.record_id)?,
            name: multilingual_from_json("scope", self.name)?,
            description: self
                .description
                .map(|d| multilingual_from_json("scope", d))
                .transpose()?,
            parent_id: self
                .parent_id
                .as_deref()
                .map(|p| parse_uuid("scope", p))
                .transpose()?,
            is_active: self.is_active,
            created_at: self.created_at,
            modified_at: self.modified_at,
        })
    }
}

/// Tree edge only, for subtree and cycle checks.
#[derive(Debug, SurrealValue)]
struct ParentRow {
    record_id: String,
    parent_id: Option<String>,
}

fn single(rows: Vec<ScopeRow>, id: Uuid) -> Result<Scope, DbError> {
    rows.into_iter()
        .next()
        .ok_or_else(|| DbError::NotFound {
            entity: "scope".into(),
            id: id.to_string(),
        })?
        .try_into_scope()
}

/// SurrealDB implementation of the Scope repository.
#[derive(Clone)]
pub struct SurrealScopeRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealScopeRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn ensure_exists(&self, id: Uuid) -> Result<(), DbError> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id FROM type::record('scope', $id)")
            .bind(("id", id.to_string()))
            .await?;
        let rows: Vec<IdRow> = result.take(0)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "scope".into(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// Child ids keyed by parent id, over the whole table.
    async fn children_index(&self) -> Result<HashMap<String, Vec<String>>, DbError> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, parent_id FROM scope")
            .await?;
        let rows: Vec<ParentRow> = result.take(0)?;

        let mut children: HashMap<String, Vec<String>> = HashMap::new();
        for row in rows {
            if let Some(parent) = row.parent_id {
                children.entry(parent).or_default().push(row.record_id);
            }
        }
        Ok(children)
    }

    /// `id` and every scope below it.
    async fn subtree(&self, id: Uuid) -> Result<BTreeSet<String>, DbError> {
        let children = self.children_index().await?;
        let root = id.to_string();
        let mut subtree = BTreeSet::from([root.clone()]);
        let mut frontier = vec![root];
        while let Some(parent) = frontier.pop() {
            for child in children.get(&parent).into_iter().flatten() {
                if subtree.insert(child.clone()) {
                    frontier.push(child.clone());
                }
            }
        }
        Ok(subtree)
    }
}

impl<C: Connection> ScopeRepository for SurrealScopeRepository<C> {
    async fn create(&self, input: CreateScope) -> PermdirResult<Scope> {
        if let Some(parent_id) = input.parent_id {
            self.ensure_exists(parent_id).await?;
        }
        let id = Uuid::new_v4();

        let result = self
            .db
            .query(
                "CREATE type::record('scope', $id) SET \
                 name = $name, description = $description, \
                 parent_id = $parent_id, is_active = true; \
                 SELECT meta::id(id) AS record_id, * \
                 FROM type::record('scope', $id);",
            )
            .bind(("id", id.to_string()))
            .bind(("name", multilingual_to_json(&input.name)))
            .bind((
                "description",
                input.description.as_ref().map(multilingual_to_json),
            ))
            .bind(("parent_id", input.parent_id.map(|p| p.to_string())))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::statement("scope", e))?;

        let rows: Vec<ScopeRow> = result.take(1).map_err(DbError::from)?;
        Ok(single(rows, id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> PermdirResult<Scope> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM type::record('scope', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ScopeRow> = result.take(0).map_err(DbError::from)?;
        Ok(single(rows, id)?)
    }

    async fn update(&self, id: Uuid, input: UpdateScope) -> PermdirResult<Scope> {
        if let Some(Some(parent_id)) = input.parent_id {
            self.ensure_exists(parent_id).await?;
            if self.subtree(id).await?.contains(&parent_id.to_string()) {
                return Err(PermdirError::Validation {
                    message: format!("scope {parent_id} is {id} or one of its descendants"),
                });
            }
        }

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        if input.parent_id.is_some() {
            sets.push("parent_id = $parent_id");
        }
        if input.is_active.is_some() {
            sets.push("is_active = $is_active");
        }
        sets.push("modified_at = time::now()");

        let query = format!(
            "UPDATE type::record('scope', $id) SET {}; \
             SELECT meta::id(id) AS record_id, * FROM type::record('scope', $id);",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id.to_string()));
        if let Some(ref name) = input.name {
            builder = builder.bind(("name", multilingual_to_json(name)));
        }
        if let Some(ref description) = input.description {
            let description = description.as_ref().map(multilingual_to_json);
            builder = builder.bind(("description", description));
        }
        if let Some(parent_id) = input.parent_id {
            builder = builder.bind(("parent_id", parent_id.map(|p| p.to_string())));
        }
        if let Some(is_active) = input.is_active {
            builder = builder.bind(("is_active", is_active));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::statement("scope", e))?;

        let rows: Vec<ScopeRow> = result.take(1).map_err(DbError::from)?;
        Ok(single(rows, id)?)
    }

    async fn delete(&self, id: Uuid) -> PermdirResult<()> {
        self.ensure_exists(id).await?;
        let doomed: Vec<String> = self.subtree(id).await?.into_iter().collect();

        self.db
            .query(
                "DELETE acl WHERE scope_id IN $ids; \
                 DELETE scope WHERE meta::id(id) IN $ids;",
            )
            .bind(("ids", doomed))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::statement("scope", e))?;

        Ok(())
    }

    async fn list(&self) -> PermdirResult<Vec<Scope>> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM scope ORDER BY created_at ASC")
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ScopeRow> = result.take(0).map_err(DbError::from)?;
        let scopes = rows
            .into_iter()
            .map(ScopeRow::try_into_scope)
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(scopes)
    }
}
