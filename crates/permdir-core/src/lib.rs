//! permdir core: domain models, the in-memory directory graph, locale
//! configuration, repository traits and the shared error type.

pub mod config;
pub mod directory;
pub mod entity;
pub mod error;
pub mod models;
pub mod repository;

pub use config::{DEFAULT_LOCALE, LocaleConfig};
pub use directory::Directory;
pub use entity::{AttrValue, EntityKey, EntityKind, EntityRef, Relation};
pub use error::{PermdirError, PermdirResult};
pub use models::multilingual::Multilingual;
