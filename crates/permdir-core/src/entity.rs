//! Uniform, read-only view over the directory entities.
//!
//! The query layer never touches model structs directly. It reads named
//! attributes through [`EntityRef::attribute`] and follows [`Relation`]s,
//! which keeps the filter registry a plain table of attribute names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PermdirError;
use crate::models::acl::Acl;
use crate::models::multilingual::Multilingual;
use crate::models::role::Role;
use crate::models::scope::Scope;
use crate::models::user::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    User,
    Role,
    Scope,
    Acl,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::User,
        EntityKind::Role,
        EntityKind::Scope,
        EntityKind::Acl,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Role => "role",
            EntityKind::Scope => "scope",
            EntityKind::Acl => "acl",
        }
    }

    /// Attribute names readable through [`EntityRef::attribute`].
    pub fn attributes(&self) -> &'static [&'static str] {
        match self {
            EntityKind::User => &[
                "id",
                "username",
                "email",
                "first_name",
                "last_name",
                "language",
                "is_active",
            ],
            EntityKind::Role => &["slug", "name", "description"],
            EntityKind::Scope => &["id", "name", "description", "parent", "is_active"],
            EntityKind::Acl => &["id", "user", "role", "scope"],
        }
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes().contains(&name)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = PermdirError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| PermdirError::Validation {
                message: format!("unknown entity type: {s}"),
            })
    }
}

/// Primary key of an entity. Roles are keyed by slug, everything else by
/// UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityKey {
    Uuid(Uuid),
    Slug(String),
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKey::Uuid(id) => write!(f, "{id}"),
            EntityKey::Slug(slug) => f.write_str(slug),
        }
    }
}

/// Value of a named attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrValue<'a> {
    Text(&'a str),
    Uuid(Uuid),
    Bool(bool),
    Localized(&'a Multilingual),
    /// The attribute exists on the entity but holds no value.
    Missing,
}

impl<'a> AttrValue<'a> {
    fn from_opt_text(value: &'a Option<String>) -> Self {
        value.as_deref().map_or(AttrValue::Missing, AttrValue::Text)
    }

    fn from_opt_localized(value: &'a Option<Multilingual>) -> Self {
        value.as_ref().map_or(AttrValue::Missing, AttrValue::Localized)
    }
}

/// Edges of the directory graph that queries may traverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    /// User → the ACL entries it owns.
    UserAcls,
    AclUser,
    AclRole,
    AclScope,
}

impl Relation {
    pub fn source(&self) -> EntityKind {
        match self {
            Relation::UserAcls => EntityKind::User,
            Relation::AclUser | Relation::AclRole | Relation::AclScope => EntityKind::Acl,
        }
    }

    pub fn target(&self) -> EntityKind {
        match self {
            Relation::UserAcls => EntityKind::Acl,
            Relation::AclUser => EntityKind::User,
            Relation::AclRole => EntityKind::Role,
            Relation::AclScope => EntityKind::Scope,
        }
    }
}

/// Borrowed reference to any directory entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef<'a> {
    User(&'a User),
    Role(&'a Role),
    Scope(&'a Scope),
    Acl(&'a Acl),
}

impl<'a> EntityRef<'a> {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityRef::User(_) => EntityKind::User,
            EntityRef::Role(_) => EntityKind::Role,
            EntityRef::Scope(_) => EntityKind::Scope,
            EntityRef::Acl(_) => EntityKind::Acl,
        }
    }

    pub fn key(&self) -> EntityKey {
        match self {
            EntityRef::User(user) => EntityKey::Uuid(user.id),
            EntityRef::Role(role) => EntityKey::Slug(role.slug.clone()),
            EntityRef::Scope(scope) => EntityKey::Uuid(scope.id),
            EntityRef::Acl(acl) => EntityKey::Uuid(acl.id),
        }
    }

    /// Reads a named attribute. Unknown names read as `None`; relation
    /// attributes read as the referenced primary key.
    pub fn attribute(&self, name: &str) -> Option<AttrValue<'a>> {
        let value = match (*self, name) {
            (EntityRef::User(u), "id") => AttrValue::Uuid(u.id),
            (EntityRef::User(u), "username") => AttrValue::Text(&u.username),
            (EntityRef::User(u), "email") => AttrValue::from_opt_text(&u.email),
            (EntityRef::User(u), "first_name") => AttrValue::from_opt_text(&u.first_name),
            (EntityRef::User(u), "last_name") => AttrValue::from_opt_text(&u.last_name),
            (EntityRef::User(u), "language") => AttrValue::Text(&u.language),
            (EntityRef::User(u), "is_active") => AttrValue::Bool(u.is_active),

            (EntityRef::Role(r), "slug") => AttrValue::Text(&r.slug),
            (EntityRef::Role(r), "name") => AttrValue::Localized(&r.name),
            (EntityRef::Role(r), "description") => AttrValue::from_opt_localized(&r.description),

            (EntityRef::Scope(s), "id") => AttrValue::Uuid(s.id),
            (EntityRef::Scope(s), "name") => AttrValue::Localized(&s.name),
            (EntityRef::Scope(s), "description") => AttrValue::from_opt_localized(&s.description),
            (EntityRef::Scope(s), "parent") => {
                s.parent_id.map_or(AttrValue::Missing, AttrValue::Uuid)
            }
            (EntityRef::Scope(s), "is_active") => AttrValue::Bool(s.is_active),

            (EntityRef::Acl(a), "id") => AttrValue::Uuid(a.id),
            (EntityRef::Acl(a), "user") => AttrValue::Uuid(a.user_id),
            (EntityRef::Acl(a), "role") => AttrValue::Text(&a.role_id),
            (EntityRef::Acl(a), "scope") => AttrValue::Uuid(a.scope_id),

            _ => return None,
        };
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_str() {
        for kind in EntityKind::ALL {
            assert_eq!(kind.as_str().parse::<EntityKind>().unwrap(), kind);
        }
        assert!("users".parse::<EntityKind>().is_err());
    }

    #[test]
    fn relations_connect_matching_kinds() {
        assert_eq!(Relation::UserAcls.target(), Relation::AclRole.source());
        assert_eq!(Relation::AclRole.target(), EntityKind::Role);
        assert_eq!(Relation::AclScope.target(), EntityKind::Scope);
        assert_eq!(Relation::AclUser.source(), EntityKind::Acl);
    }

    #[test]
    fn uuid_keys_order_before_slugs() {
        let a = EntityKey::Uuid(Uuid::nil());
        let b = EntityKey::Slug("admin".into());
        assert!(a < b);
    }
}
