//! Domain models for permdir.
//!
//! These are the core types shared across all crates.

pub mod acl;
pub mod multilingual;
pub mod role;
pub mod scope;
pub mod user;
