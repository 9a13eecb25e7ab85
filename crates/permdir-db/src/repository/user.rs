//! SurrealDB implementation of [`UserRepository`].

use chrono::{DateTime, Utc};
use permdir_core::DEFAULT_LOCALE;
use permdir_core::error::PermdirResult;
use permdir_core::models::user::{CreateUser, UpdateUser, User, validate_username};
use permdir_core::repository::UserRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{IdRow, parse_uuid};
use crate::error::DbError;

/// DB-side row struct; the record id is selected via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct UserRow {
    record_id: String,
    username: String,
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    language: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
}

impl UserRow {
    fn try_into_user(self) -> Result<User, DbError> {
        Ok(User {
            id: parse_uuid("user", &self.record_id)?,
            username: self.username,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            language: self.language,
            is_active: self.is_active,
            created_at: self.created_at,
            modified_at: self.modified_at,
        })
    }
}

fn single(rows: Vec<UserRow>, id: impl ToString) -> Result<User, DbError> {
    rows.into_iter()
        .next()
        .ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id.to_string(),
        })?
        .try_into_user()
}

/// SurrealDB implementation of the User repository.
#[derive(Clone)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn create(&self, input: CreateUser) -> PermdirResult<User> {
        validate_username(&input.username)?;
        let id_str = Uuid::new_v4().to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('user', $id) SET \
                 username = $username, email = $email, \
                 first_name = $first_name, last_name = $last_name, \
                 language = $language, is_active = true; \
                 SELECT meta::id(id) AS record_id, * \
                 FROM type::record('user', $id);",
            )
            .bind(("id", id_str.clone()))
            .bind(("username", input.username))
            .bind(("email", input.email))
            .bind(("first_name", input.first_name))
            .bind(("last_name", input.last_name))
            .bind((
                "language",
                input.language.unwrap_or_else(|| DEFAULT_LOCALE.to_string()),
            ))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::statement("user", e))?;

        let rows: Vec<UserRow> = result.take(1).map_err(DbError::from)?;
        Ok(single(rows, id_str)?)
    }

    async fn get_by_id(&self, id: Uuid) -> PermdirResult<User> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM type::record('user', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        Ok(single(rows, id)?)
    }

    async fn get_by_username(&self, username: &str) -> PermdirResult<User> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE username = $username",
            )
            .bind(("username", username.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        Ok(single(rows, format!("username={username}"))?)
    }

    async fn update(&self, id: Uuid, input: UpdateUser) -> PermdirResult<User> {
        if let Some(ref username) = input.username {
            validate_username(username)?;
        }

        let mut sets = Vec::new();
        if input.username.is_some() {
            sets.push("username = $username");
        }
        if input.email.is_some() {
            sets.push("email = $email");
        }
        if input.first_name.is_some() {
            sets.push("first_name = $first_name");
        }
        if input.last_name.is_some() {
            sets.push("last_name = $last_name");
        }
        if input.language.is_some() {
            sets.push("language = $language");
        }
        if input.is_active.is_some() {
            sets.push("is_active = $is_active");
        }
        sets.push("modified_at = time::now()");

        let query = format!(
            "UPDATE type::record('user', $id) SET {}; \
             SELECT meta::id(id) AS record_id, * FROM type::record('user', $id);",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id.to_string()));
        if let Some(username) = input.username {
            builder = builder.bind(("username", username));
        }
        if let Some(email) = input.email {
            builder = builder.bind(("email", email));
        }
        if let Some(first_name) = input.first_name {
            builder = builder.bind(("first_name", first_name));
        }
        if let Some(last_name) = input.last_name {
            builder = builder.bind(("last_name", last_name));
        }
        if let Some(language) = input.language {
            builder = builder.bind(("language", language));
        }
        if let Some(is_active) = input.is_active {
            builder = builder.bind(("is_active", is_active));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::statement("user", e))?;

        let rows: Vec<UserRow> = result.take(1).map_err(DbError::from)?;
        Ok(single(rows, id)?)
    }

    async fn delete(&self, id: Uuid) -> PermdirResult<()> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id FROM type::record('user', $id); \
                 DELETE acl WHERE user_id = $id; \
                 DELETE type::record('user', $id);",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::statement("user", e))?;

        let existing: Vec<IdRow> = result.take(0).map_err(DbError::from)?;
        if existing.is_empty() {
            return Err(DbError::NotFound {
                entity: "user".into(),
                id: id.to_string(),
            }
            .into());
        }
        Ok(())
    }

    async fn list(&self) -> PermdirResult<Vec<User>> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM user ORDER BY username ASC")
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let users = rows
            .into_iter()
            .map(UserRow::try_into_user)
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(users)
    }
}
