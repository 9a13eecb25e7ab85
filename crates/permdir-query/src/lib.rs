//! Filter, search and sort engine for the permdir directory.
//!
//! A request arrives as raw `filter[...]` / `sort` parameters for one entity
//! type. [`QueryEngine::compile`] checks every parameter against the static
//! [`REGISTRY`] and turns it into a [`Predicate`] plus an [`Ordering`];
//! running the compiled query against an [`EntityStore`] yields the
//! matching entities in a deterministic order.

pub mod engine;
pub mod error;
pub mod filter;
pub mod has_role;
pub mod locale;
pub mod params;
pub mod predicate;
pub mod registry;
pub mod search;
pub mod sort;
pub mod store;

pub use engine::{CompiledQuery, EngineOptions, QueryEngine};
pub use error::QueryError;
pub use has_role::RoleTraversal;
pub use locale::LocaleResolver;
pub use params::QueryParams;
pub use predicate::Predicate;
pub use registry::REGISTRY;
pub use sort::Ordering;
pub use store::EntityStore;
