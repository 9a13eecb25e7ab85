//! permdir persistence: SurrealDB connection management, schema
//! migrations, repository implementations for the `permdir-core` traits,
//! and loading a stored directory into memory.

mod connection;
mod error;
pub mod repository;
mod schema;
mod snapshot;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use schema::{latest_version, run_migrations};
pub use snapshot::load_directory;
