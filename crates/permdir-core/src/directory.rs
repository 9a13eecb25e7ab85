//! In-memory directory graph.
//!
//! A [`Directory`] holds users, roles, scopes and the ACL entries binding
//! them, and enforces the graph invariants:
//!
//! - usernames are unique;
//! - every ACL references an existing user, role and scope, and the triple
//!   `(user, scope, role)` is unique;
//! - removing a user, role or scope removes the ACLs referencing it;
//! - removing a scope removes its descendant scopes.
//!
//! Queries run against a directory as a read-only snapshot.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::config::DEFAULT_LOCALE;
use crate::entity::{EntityKind, EntityRef, Relation};
use crate::error::{PermdirError, PermdirResult};
use crate::models::acl::{Acl, CreateAcl};
use crate::models::role::{CreateRole, Role, validate_slug};
use crate::models::scope::{CreateScope, Scope};
use crate::models::user::{CreateUser, User, validate_username};

#[derive(Debug, Clone, Default)]
pub struct Directory {
    users: BTreeMap<Uuid, User>,
    roles: BTreeMap<String, Role>,
    scopes: BTreeMap<Uuid, Scope>,
    acls: BTreeMap<Uuid, Acl>,
}

fn not_found(entity: &str, id: impl ToString) -> PermdirError {
    PermdirError::NotFound {
        entity: entity.into(),
        id: id.to_string(),
    }
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------
    // Users
    // -------------------------------------------------------------------

    pub fn create_user(&mut self, input: CreateUser) -> PermdirResult<&User> {
        let now = Utc::now();
        self.insert_user(User {
            id: Uuid::new_v4(),
            username: input.username,
            email: input.email,
            first_name: input.first_name,
            last_name: input.last_name,
            language: input.language.unwrap_or_else(|| DEFAULT_LOCALE.into()),
            is_active: true,
            created_at: now,
            modified_at: now,
        })
    }

    /// Inserts a fully built user, e.g. one loaded from storage.
    pub fn insert_user(&mut self, user: User) -> PermdirResult<&User> {
        validate_username(&user.username)?;
        if self.users.contains_key(&user.id)
            || self.users.values().any(|u| u.username == user.username)
        {
            return Err(PermdirError::AlreadyExists {
                entity: "user".into(),
            });
        }
        let id = user.id;
        Ok(self.users.entry(id).or_insert(user))
    }

    pub fn user(&self, id: Uuid) -> Option<&User> {
        self.users.get(&id)
    }

    pub fn user_by_username(&self, username: &str) -> Option<&User> {
        self.users.values().find(|u| u.username == username)
    }

    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    /// Removes a user together with its ACL entries.
    pub fn remove_user(&mut self, id: Uuid) -> PermdirResult<User> {
        let user = self
            .users
            .remove(&id)
            .ok_or_else(|| not_found("user", id))?;
        let removed = self.remove_acls_where(|acl| acl.user_id == id);
        debug!(user_id = %id, acls = removed, "Removed user");
        Ok(user)
    }

    // -------------------------------------------------------------------
    // Roles
    // -------------------------------------------------------------------

    pub fn create_role(&mut self, input: CreateRole) -> PermdirResult<&Role> {
        let now = Utc::now();
        self.insert_role(Role {
            slug: input.slug,
            name: input.name,
            description: input.description,
            created_at: now,
            modified_at: now,
        })
    }

    pub fn insert_role(&mut self, role: Role) -> PermdirResult<&Role> {
        validate_slug(&role.slug)?;
        if self.roles.contains_key(&role.slug) {
            return Err(PermdirError::AlreadyExists {
                entity: "role".into(),
            });
        }
        let slug = role.slug.clone();
        Ok(self.roles.entry(slug).or_insert(role))
    }

    pub fn role(&self, slug: &str) -> Option<&Role> {
        self.roles.get(slug)
    }

    pub fn roles(&self) -> impl Iterator<Item = &Role> {
        self.roles.values()
    }

    /// Removes a role together with the ACL entries granting it.
    pub fn remove_role(&mut self, slug: &str) -> PermdirResult<Role> {
        let role = self
            .roles
            .remove(slug)
            .ok_or_else(|| not_found("role", slug))?;
        let removed = self.remove_acls_where(|acl| acl.role_id == slug);
        debug!(role = slug, acls = removed, "Removed role");
        Ok(role)
    }

    // -------------------------------------------------------------------
    // Scopes
    // -------------------------------------------------------------------

    pub fn create_scope(&mut self, input: CreateScope) -> PermdirResult<&Scope> {
        let now = Utc::now();
        self.insert_scope(Scope {
            id: Uuid::new_v4(),
            name: input.name,
            description: input.description,
            parent_id: input.parent_id,
            is_active: true,
            created_at: now,
            modified_at: now,
        })
    }

    /// Inserts a scope. Its parent, if any, must already be present.
    pub fn insert_scope(&mut self, scope: Scope) -> PermdirResult<&Scope> {
        if self.scopes.contains_key(&scope.id) {
            return Err(PermdirError::AlreadyExists {
                entity: "scope".into(),
            });
        }
        if let Some(parent_id) = scope.parent_id
            && !self.scopes.contains_key(&parent_id)
        {
            return Err(not_found("scope", parent_id));
        }
        let id = scope.id;
        Ok(self.scopes.entry(id).or_insert(scope))
    }

    /// Inserts scopes in any order, placing parents before their children.
    ///
    /// Fails if a scope references a parent that is neither present nor
    /// part of the batch, which also covers parent cycles.
    pub fn insert_scopes(&mut self, scopes: impl IntoIterator<Item = Scope>) -> PermdirResult<()> {
        let mut pending: Vec<Scope> = scopes.into_iter().collect();
        while !pending.is_empty() {
            let (ready, waiting): (Vec<_>, Vec<_>) = pending.into_iter().partition(|s| {
                s.parent_id
                    .is_none_or(|parent| self.scopes.contains_key(&parent))
            });
            if ready.is_empty() {
                let orphan = waiting
                    .first()
                    .and_then(|s| s.parent_id)
                    .map(|p| p.to_string())
                    .unwrap_or_default();
                return Err(not_found("scope", orphan));
            }
            for scope in ready {
                self.insert_scope(scope)?;
            }
            pending = waiting;
        }
        Ok(())
    }

    pub fn scope(&self, id: Uuid) -> Option<&Scope> {
        self.scopes.get(&id)
    }

    pub fn scopes(&self) -> impl Iterator<Item = &Scope> {
        self.scopes.values()
    }

    pub fn children(&self, id: Uuid) -> impl Iterator<Item = &Scope> {
        self.scopes
            .values()
            .filter(move |s| s.parent_id == Some(id))
    }

    /// Name of the scope prefixed by the names of its ancestors, root first,
    /// joined by `sep`. Translations missing in `locale` render empty.
    pub fn scope_full_name(&self, id: Uuid, sep: &str, locale: &str) -> Option<String> {
        let mut names = Vec::new();
        let mut current = self.scopes.get(&id);
        while let Some(scope) = current {
            names.push(scope.name.get(locale).unwrap_or_default());
            current = scope.parent_id.and_then(|p| self.scopes.get(&p));
        }
        if names.is_empty() {
            return None;
        }
        names.reverse();
        Some(names.join(&format!(" {sep} ")))
    }

    /// Removes a scope, its descendants, and every ACL referencing them.
    pub fn remove_scope(&mut self, id: Uuid) -> PermdirResult<Scope> {
        if !self.scopes.contains_key(&id) {
            return Err(not_found("scope", id));
        }

        let mut doomed = BTreeSet::from([id]);
        let mut frontier = vec![id];
        while let Some(parent) = frontier.pop() {
            for child in self.children(parent) {
                if doomed.insert(child.id) {
                    frontier.push(child.id);
                }
            }
        }

        let removed = self.remove_acls_where(|acl| doomed.contains(&acl.scope_id));
        let mut root = None;
        for scope_id in &doomed {
            let scope = self.scopes.remove(scope_id);
            if *scope_id == id {
                root = scope;
            }
        }
        debug!(scope_id = %id, scopes = doomed.len(), acls = removed, "Removed scope");
        root.ok_or_else(|| not_found("scope", id))
    }

    // -------------------------------------------------------------------
    // ACLs
    // -------------------------------------------------------------------

    /// Grants `role` to `user` within `scope`.
    pub fn grant(&mut self, input: CreateAcl) -> PermdirResult<&Acl> {
        self.insert_acl(Acl {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            scope_id: input.scope_id,
            role_id: input.role_id,
            created_at: Utc::now(),
        })
    }

    pub fn insert_acl(&mut self, acl: Acl) -> PermdirResult<&Acl> {
        if !self.users.contains_key(&acl.user_id) {
            return Err(not_found("user", acl.user_id));
        }
        if !self.roles.contains_key(&acl.role_id) {
            return Err(not_found("role", &acl.role_id));
        }
        if !self.scopes.contains_key(&acl.scope_id) {
            return Err(not_found("scope", acl.scope_id));
        }
        let duplicate = self.acls.contains_key(&acl.id)
            || self.acls.values().any(|existing| {
                existing.user_id == acl.user_id
                    && existing.scope_id == acl.scope_id
                    && existing.role_id == acl.role_id
            });
        if duplicate {
            return Err(PermdirError::AlreadyExists {
                entity: "acl".into(),
            });
        }
        let id = acl.id;
        Ok(self.acls.entry(id).or_insert(acl))
    }

    /// Revokes the grant identified by the triple.
    pub fn revoke(&mut self, user_id: Uuid, role_id: &str, scope_id: Uuid) -> PermdirResult<Acl> {
        let id = self
            .acls
            .values()
            .find(|acl| {
                acl.user_id == user_id && acl.role_id == role_id && acl.scope_id == scope_id
            })
            .map(|acl| acl.id)
            .ok_or_else(|| not_found("acl", format!("{user_id}/{role_id}/{scope_id}")))?;
        self.remove_acl(id)
    }

    pub fn remove_acl(&mut self, id: Uuid) -> PermdirResult<Acl> {
        self.acls.remove(&id).ok_or_else(|| not_found("acl", id))
    }

    pub fn acl(&self, id: Uuid) -> Option<&Acl> {
        self.acls.get(&id)
    }

    pub fn acls(&self) -> impl Iterator<Item = &Acl> {
        self.acls.values()
    }

    pub fn acls_for_user(&self, user_id: Uuid) -> impl Iterator<Item = &Acl> {
        self.acls.values().filter(move |acl| acl.user_id == user_id)
    }

    fn remove_acls_where(&mut self, doomed: impl Fn(&Acl) -> bool) -> usize {
        let before = self.acls.len();
        self.acls.retain(|_, acl| !doomed(acl));
        before - self.acls.len()
    }

    // -------------------------------------------------------------------
    // Graph access
    // -------------------------------------------------------------------

    /// All entities of one kind, in primary-key order.
    pub fn entities(&self, kind: EntityKind) -> Vec<EntityRef<'_>> {
        match kind {
            EntityKind::User => self.users.values().map(EntityRef::User).collect(),
            EntityKind::Role => self.roles.values().map(EntityRef::Role).collect(),
            EntityKind::Scope => self.scopes.values().map(EntityRef::Scope).collect(),
            EntityKind::Acl => self.acls.values().map(EntityRef::Acl).collect(),
        }
    }

    /// Entities reached from `entity` over `relation`. Empty when the
    /// relation does not start at the entity's kind.
    pub fn related<'a>(&'a self, entity: EntityRef<'a>, relation: Relation) -> Vec<EntityRef<'a>> {
        match (entity, relation) {
            (EntityRef::User(user), Relation::UserAcls) => {
                self.acls_for_user(user.id).map(EntityRef::Acl).collect()
            }
            (EntityRef::Acl(acl), Relation::AclUser) => self
                .users
                .get(&acl.user_id)
                .map(EntityRef::User)
                .into_iter()
                .collect(),
            (EntityRef::Acl(acl), Relation::AclRole) => self
                .roles
                .get(&acl.role_id)
                .map(EntityRef::Role)
                .into_iter()
                .collect(),
            (EntityRef::Acl(acl), Relation::AclScope) => self
                .scopes
                .get(&acl.scope_id)
                .map(EntityRef::Scope)
                .into_iter()
                .collect(),
            _ => Vec::new(),
        }
    }
}
