//! The storage collaborator the query engine reads from.

use permdir_core::Directory;
use permdir_core::entity::{EntityKind, EntityRef, Relation};

use crate::predicate::Predicate;

/// Read-only access to a directory graph.
///
/// Implementors expose entity scans and relation traversal. [`select`]
/// evaluates a predicate over a scan; stores that can push predicates down
/// to a native query language may override it, as long as the result is
/// the same set.
///
/// [`select`]: EntityStore::select
pub trait EntityStore {
    /// All entities of `kind`.
    fn scan(&self, kind: EntityKind) -> Vec<EntityRef<'_>>;

    /// Entities reached from `entity` over `relation`.
    fn related<'a>(&'a self, entity: EntityRef<'a>, relation: Relation) -> Vec<EntityRef<'a>>;

    /// Entities of `kind` matching `predicate`.
    fn select(&self, kind: EntityKind, predicate: &Predicate) -> Vec<EntityRef<'_>> {
        let candidates = self.scan(kind);
        if predicate.is_always() {
            return candidates;
        }
        candidates
            .into_iter()
            .filter(|entity| predicate.matches(*entity, self))
            .collect()
    }
}

impl EntityStore for Directory {
    fn scan(&self, kind: EntityKind) -> Vec<EntityRef<'_>> {
        self.entities(kind)
    }

    fn related<'a>(&'a self, entity: EntityRef<'a>, relation: Relation) -> Vec<EntityRef<'a>> {
        Directory::related(self, entity, relation)
    }
}
