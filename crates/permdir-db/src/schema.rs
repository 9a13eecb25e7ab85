//! Schema definitions and migration runner for SurrealDB.
//!
//! All tables are SCHEMAFULL. UUIDs are stored as strings; roles use their
//! slug as record id. Multilingual values are stored as flexible objects
//! mapping language codes to text.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "directory_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Users
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD username ON TABLE user TYPE string \
    ASSERT string::len($value) > 0 AND string::len($value) <= 255;
DEFINE FIELD email ON TABLE user TYPE option<string>;
DEFINE FIELD first_name ON TABLE user TYPE option<string>;
DEFINE FIELD last_name ON TABLE user TYPE option<string>;
DEFINE FIELD language ON TABLE user TYPE string DEFAULT 'en';
DEFINE FIELD is_active ON TABLE user TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD modified_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_username ON TABLE user \
    COLUMNS username UNIQUE;

-- =======================================================================
-- Roles (record id is the slug)
-- =======================================================================
DEFINE TABLE role SCHEMAFULL;
DEFINE FIELD name ON TABLE role TYPE object FLEXIBLE;
DEFINE FIELD description ON TABLE role TYPE option<object> FLEXIBLE;
DEFINE FIELD created_at ON TABLE role TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD modified_at ON TABLE role TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Scopes (tree through parent_id)
-- =======================================================================
DEFINE TABLE scope SCHEMAFULL;
DEFINE FIELD name ON TABLE scope TYPE object FLEXIBLE;
DEFINE FIELD description ON TABLE scope TYPE option<object> FLEXIBLE;
DEFINE FIELD parent_id ON TABLE scope TYPE option<string>;
DEFINE FIELD is_active ON TABLE scope TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE scope TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD modified_at ON TABLE scope TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_scope_parent ON TABLE scope COLUMNS parent_id;

-- =======================================================================
-- ACL entries: user holds role within scope
-- =======================================================================
DEFINE TABLE acl SCHEMAFULL;
DEFINE FIELD user_id ON TABLE acl TYPE string;
DEFINE FIELD scope_id ON TABLE acl TYPE string;
DEFINE FIELD role_id ON TABLE acl TYPE string;
DEFINE FIELD created_at ON TABLE acl TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_acl_binding ON TABLE acl \
    COLUMNS user_id, scope_id, role_id UNIQUE;
DEFINE INDEX idx_acl_user ON TABLE acl COLUMNS user_id;
DEFINE INDEX idx_acl_role ON TABLE acl COLUMNS role_id;
DEFINE INDEX idx_acl_scope ON TABLE acl COLUMNS scope_id;
";

// -----------------------------------------------------------------------
// Migration runner
// -----------------------------------------------------------------------

/// Apply all pending migrations.
///
/// Creates a `_migration` tracking table on first run, then applies each
/// migration whose version exceeds the current maximum.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT version FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS.iter().filter(|m| m.version > current_version) {
        info!(
            version = migration.version,
            name = migration.name,
            "Applying migration"
        );
        db.query(migration.sql).await?.check().map_err(|e| {
            DbError::Migration(format!(
                "Migration v{} '{}' failed: {}",
                migration.version, migration.name, e,
            ))
        })?;

        db.query("CREATE _migration SET version = $version, name = $name")
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;
    }

    info!(version = latest_version(), "Schema up to date");
    Ok(())
}

/// Highest schema version this build knows about.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |m| m.version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "Migrations must be in ascending version order"
            );
        }
    }

    #[test]
    fn schema_defines_every_table() {
        for table in ["user", "role", "scope", "acl"] {
            assert!(
                SCHEMA_V1.contains(&format!("DEFINE TABLE {table} SCHEMAFULL")),
                "missing {table}"
            );
        }
    }
}
