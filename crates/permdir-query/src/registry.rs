//! Field descriptor registry.
//!
//! The registry is a static table describing, per entity type, which
//! filter names a client may use, which lookups each accepts, how values
//! are typed, how the field collates when sorted, and which attributes
//! free-text search looks at. [`Registry::validate`] checks the table once
//! when a [`QueryEngine`](crate::engine::QueryEngine) is built.

use std::collections::HashSet;
use std::fmt;

use permdir_core::entity::{EntityKind, Relation};

use crate::error::QueryError;

/// Reserved filter name for free-text search.
pub const SEARCH_FILTER: &str = "search";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lookup {
    Exact,
    In,
    Contains,
    IContains,
}

impl Lookup {
    pub const ALL: [Lookup; 4] = [
        Lookup::Exact,
        Lookup::In,
        Lookup::Contains,
        Lookup::IContains,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Lookup::Exact => "exact",
            Lookup::In => "in",
            Lookup::Contains => "contains",
            Lookup::IContains => "icontains",
        }
    }

    pub fn from_suffix(suffix: &str) -> Option<Lookup> {
        Lookup::ALL.into_iter().find(|l| l.as_str() == suffix)
    }
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Text,
    Uuid,
    Bool,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Text => "text",
            ValueType::Uuid => "uuid",
            ValueType::Bool => "boolean",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Scalar(ValueType),
    /// Reference to another entity, compared by its primary key.
    Relation(EntityKind),
    /// Locale → text mapping; compared in the resolved locale only.
    Multilingual,
}

impl FieldKind {
    /// Type that filter values for this field are parsed into.
    pub fn value_type(&self) -> ValueType {
        match self {
            FieldKind::Scalar(value_type) => *value_type,
            FieldKind::Relation(EntityKind::Role) => ValueType::Text,
            FieldKind::Relation(_) => ValueType::Uuid,
            FieldKind::Multilingual => ValueType::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collation {
    /// Raw code-point order; `B` sorts before `a`.
    CaseSensitive,
    /// Lower-folded order; `Aaaa` and `aaaaa` interleave.
    CaseInsensitive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Canonical filter name.
    pub name: &'static str,
    /// Alternate spellings accepted for the same filter.
    pub aliases: &'static [&'static str],
    /// Entity attribute the filter reads, which may differ from `name`.
    pub attribute: &'static str,
    pub kind: FieldKind,
    pub lookups: &'static [Lookup],
    pub collation: Collation,
    pub sortable: bool,
}

impl FieldDescriptor {
    pub fn allows(&self, lookup: Lookup) -> bool {
        self.lookups.contains(&lookup)
    }

    fn answers_to(&self, name: &str) -> bool {
        self.name == name || self.aliases.contains(&name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeKind {
    /// Users holding a role in any scope.
    HasRole,
}

/// A named filter that expands to a traversal rather than comparing one
/// field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositeFilter {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub kind: CompositeKind,
}

impl CompositeFilter {
    fn answers_to(&self, name: &str) -> bool {
        self.name == name || self.aliases.contains(&name)
    }
}

/// An attribute searched by free text, optionally reached through
/// relations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchPath {
    pub via: &'static [Relation],
    pub attribute: &'static str,
}

impl SearchPath {
    const fn field(attribute: &'static str) -> Self {
        Self {
            via: &[],
            attribute,
        }
    }

    /// Kind of the entity owning the searched attribute.
    pub fn owner(&self, root: EntityKind) -> EntityKind {
        self.via.last().map_or(root, Relation::target)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityRegistry {
    pub kind: EntityKind,
    pub fields: &'static [FieldDescriptor],
    pub composites: &'static [CompositeFilter],
    pub search: &'static [SearchPath],
}

/// What a filter name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterTarget<'r> {
    Field(&'r FieldDescriptor),
    Composite(&'r CompositeFilter),
}

impl EntityRegistry {
    /// Resolves a filter name (canonical or alias). Spellings that are not
    /// declared do not resolve.
    pub fn filter(&self, name: &str) -> Option<FilterTarget<'_>> {
        if let Some(field) = self.fields.iter().find(|f| f.answers_to(name)) {
            return Some(FilterTarget::Field(field));
        }
        self.composites
            .iter()
            .find(|c| c.answers_to(name))
            .map(FilterTarget::Composite)
    }

    /// Resolves a field filter and checks that it accepts `lookup`.
    pub fn field_lookup(&self, name: &str, lookup: Lookup) -> Result<&FieldDescriptor, QueryError> {
        match self.filter(name) {
            Some(FilterTarget::Field(field)) if field.allows(lookup) => Ok(field),
            Some(FilterTarget::Field(field)) => Err(QueryError::UnsupportedLookup {
                entity: self.kind,
                field: field.name.into(),
                lookup: lookup.as_str().into(),
            }),
            Some(FilterTarget::Composite(composite)) => Err(QueryError::UnsupportedLookup {
                entity: self.kind,
                field: composite.name.into(),
                lookup: lookup.as_str().into(),
            }),
            None => Err(QueryError::UnknownFilter {
                entity: self.kind,
                name: name.into(),
            }),
        }
    }

    pub fn sort_field(&self, name: &str) -> Result<&FieldDescriptor, QueryError> {
        self.fields
            .iter()
            .find(|f| f.sortable && f.answers_to(name))
            .ok_or_else(|| QueryError::UnknownSortField {
                entity: self.kind,
                field: name.into(),
            })
    }

    fn validate(&self) -> Result<(), QueryError> {
        let kind = self.kind;
        let invalid = |message: String| QueryError::Registry(format!("{kind}: {message}"));

        let mut names = HashSet::new();
        let declared = self
            .fields
            .iter()
            .flat_map(|f| std::iter::once(f.name).chain(f.aliases.iter().copied()))
            .chain(
                self.composites
                    .iter()
                    .flat_map(|c| std::iter::once(c.name).chain(c.aliases.iter().copied())),
            );
        for name in declared {
            if name.is_empty() || name == SEARCH_FILTER || Lookup::from_suffix(name).is_some() {
                return Err(invalid(format!("reserved filter name '{name}'")));
            }
            if name.contains("__") {
                return Err(invalid(format!("filter name '{name}' contains '__'")));
            }
            if !names.insert(name) {
                return Err(invalid(format!("filter name '{name}' declared twice")));
            }
        }

        for field in self.fields {
            if !kind.has_attribute(field.attribute) {
                return Err(invalid(format!(
                    "field '{}' routes to unknown attribute '{}'",
                    field.name, field.attribute
                )));
            }
            if field.lookups.is_empty() {
                return Err(invalid(format!("field '{}' allows no lookups", field.name)));
            }
            let substring = field.allows(Lookup::Contains) || field.allows(Lookup::IContains);
            if substring && field.kind.value_type() != ValueType::Text {
                return Err(invalid(format!(
                    "field '{}' allows substring lookups on non-text values",
                    field.name
                )));
            }
            if field.allows(Lookup::In) && field.kind == FieldKind::Multilingual {
                return Err(invalid(format!(
                    "multilingual field '{}' cannot use 'in'",
                    field.name
                )));
            }
        }

        for composite in self.composites {
            if composite.kind == CompositeKind::HasRole && kind != EntityKind::User {
                return Err(invalid(format!(
                    "'{}' only applies to users",
                    composite.name
                )));
            }
        }

        for path in self.search {
            let mut current = kind;
            for relation in path.via {
                if relation.source() != current {
                    return Err(invalid(format!(
                        "search path to '{}' breaks at {relation:?}",
                        path.attribute
                    )));
                }
                current = relation.target();
            }
            if !current.has_attribute(path.attribute) {
                return Err(invalid(format!(
                    "search path ends at unknown attribute {current}.{}",
                    path.attribute
                )));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registry {
    pub entities: &'static [EntityRegistry],
}

impl Registry {
    pub fn entity(&self, kind: EntityKind) -> Result<&EntityRegistry, QueryError> {
        self.entities
            .iter()
            .find(|e| e.kind == kind)
            .ok_or(QueryError::UnregisteredEntity(kind))
    }

    pub fn validate(&self) -> Result<(), QueryError> {
        let mut seen = HashSet::new();
        for entity in self.entities {
            if !seen.insert(entity.kind) {
                return Err(QueryError::Registry(format!(
                    "{} registered twice",
                    entity.kind
                )));
            }
            entity.validate()?;
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------
// Built-in registry
// -----------------------------------------------------------------------

const EXACT_IN: &[Lookup] = &[Lookup::Exact, Lookup::In];
const TEXT_MATCH: &[Lookup] = &[Lookup::Exact, Lookup::Contains, Lookup::IContains];
const EXACT_CONTAINS: &[Lookup] = &[Lookup::Exact, Lookup::Contains];
const EXACT: &[Lookup] = &[Lookup::Exact];

const fn field(
    name: &'static str,
    kind: FieldKind,
    lookups: &'static [Lookup],
    collation: Collation,
    sortable: bool,
) -> FieldDescriptor {
    FieldDescriptor {
        name,
        aliases: &[],
        attribute: name,
        kind,
        lookups,
        collation,
        sortable,
    }
}

const fn aliased(descriptor: FieldDescriptor, aliases: &'static [&'static str]) -> FieldDescriptor {
    FieldDescriptor {
        aliases,
        ..descriptor
    }
}

const UUID: FieldKind = FieldKind::Scalar(ValueType::Uuid);
const TEXT: FieldKind = FieldKind::Scalar(ValueType::Text);
const BOOL: FieldKind = FieldKind::Scalar(ValueType::Bool);
use Collation::{CaseInsensitive, CaseSensitive};

static USER_FIELDS: &[FieldDescriptor] = &[
    field("id", UUID, EXACT_IN, CaseSensitive, true),
    field("username", TEXT, EXACT_IN, CaseSensitive, true),
    aliased(
        field("first_name", TEXT, TEXT_MATCH, CaseInsensitive, true),
        &["firstName"],
    ),
    aliased(
        field("last_name", TEXT, TEXT_MATCH, CaseInsensitive, true),
        &["lastName"],
    ),
    field("email", TEXT, EXACT_IN, CaseInsensitive, true),
    field("language", TEXT, EXACT_IN, CaseSensitive, false),
    aliased(
        field("is_active", BOOL, EXACT, CaseSensitive, false),
        &["isActive"],
    ),
];

static USER_COMPOSITES: &[CompositeFilter] = &[CompositeFilter {
    name: "has_role",
    aliases: &["hasRole"],
    kind: CompositeKind::HasRole,
}];

static USER_SEARCH: &[SearchPath] = &[
    SearchPath::field("username"),
    SearchPath::field("first_name"),
    SearchPath::field("last_name"),
    SearchPath::field("email"),
    SearchPath {
        via: &[Relation::UserAcls, Relation::AclRole],
        attribute: "name",
    },
    SearchPath {
        via: &[Relation::UserAcls, Relation::AclScope],
        attribute: "name",
    },
];

static ROLE_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor {
        name: "id",
        aliases: &["slug"],
        attribute: "slug",
        kind: TEXT,
        lookups: EXACT_IN,
        collation: CaseSensitive,
        sortable: true,
    },
    field(
        "name",
        FieldKind::Multilingual,
        EXACT_CONTAINS,
        CaseInsensitive,
        true,
    ),
];

static ROLE_SEARCH: &[SearchPath] = &[
    SearchPath::field("slug"),
    SearchPath::field("name"),
    SearchPath::field("description"),
];

static SCOPE_FIELDS: &[FieldDescriptor] = &[
    field("id", UUID, EXACT_IN, CaseSensitive, true),
    field(
        "name",
        FieldKind::Multilingual,
        EXACT_CONTAINS,
        CaseInsensitive,
        true,
    ),
    field(
        "parent",
        FieldKind::Relation(EntityKind::Scope),
        EXACT_IN,
        CaseSensitive,
        false,
    ),
    aliased(
        field("is_active", BOOL, EXACT, CaseSensitive, false),
        &["isActive"],
    ),
];

static SCOPE_SEARCH: &[SearchPath] = &[
    SearchPath::field("name"),
    SearchPath::field("description"),
];

static ACL_FIELDS: &[FieldDescriptor] = &[
    field("id", UUID, EXACT_IN, CaseSensitive, true),
    field(
        "user",
        FieldKind::Relation(EntityKind::User),
        EXACT_IN,
        CaseSensitive,
        false,
    ),
    field(
        "role",
        FieldKind::Relation(EntityKind::Role),
        EXACT_IN,
        CaseSensitive,
        false,
    ),
    field(
        "scope",
        FieldKind::Relation(EntityKind::Scope),
        EXACT_IN,
        CaseSensitive,
        false,
    ),
];

static ACL_SEARCH: &[SearchPath] = &[
    SearchPath {
        via: &[Relation::AclUser],
        attribute: "username",
    },
    SearchPath {
        via: &[Relation::AclRole],
        attribute: "name",
    },
    SearchPath {
        via: &[Relation::AclScope],
        attribute: "name",
    },
];

/// Registry of every filterable entity type.
pub static REGISTRY: Registry = Registry {
    entities: &[
        EntityRegistry {
            kind: EntityKind::User,
            fields: USER_FIELDS,
            composites: USER_COMPOSITES,
            search: USER_SEARCH,
        },
        EntityRegistry {
            kind: EntityKind::Role,
            fields: ROLE_FIELDS,
            composites: &[],
            search: ROLE_SEARCH,
        },
        EntityRegistry {
            kind: EntityKind::Scope,
            fields: SCOPE_FIELDS,
            composites: &[],
            search: SCOPE_SEARCH,
        },
        EntityRegistry {
            kind: EntityKind::Acl,
            fields: ACL_FIELDS,
            composites: &[],
            search: ACL_SEARCH,
        },
    ],
};
