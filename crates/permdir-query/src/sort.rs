//! Sorting with field-specific collation.
//!
//! Each sort key carries the collation its registry field declares:
//! case-insensitive fields compare lower-folded text, case-sensitive fields
//! compare raw text. Missing values sort last ascending and first
//! descending. Ties on every key fall back to the primary key, ascending,
//! so the order is fully determined by the data.

use std::cmp::Ordering as CmpOrdering;

use permdir_core::entity::{AttrValue, EntityKey, EntityRef};
use uuid::Uuid;

use crate::error::QueryError;
use crate::locale::LocaleResolver;
use crate::registry::{Collation, EntityRegistry};

/// Prefix requesting descending order.
pub const DESCENDING_MARKER: char = '-';

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub attribute: &'static str,
    pub direction: Direction,
    pub collation: Collation,
    /// Locale for multilingual attributes.
    pub locale: Option<String>,
}

/// Ordered list of sort keys. Empty means primary-key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ordering {
    keys: Vec<SortKey>,
}

impl Ordering {
    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    /// Parses a sort parameter such as `email` or `-username,first_name`.
    pub fn parse(
        entity: &EntityRegistry,
        raw: &str,
        locales: &LocaleResolver<'_>,
    ) -> Result<Self, QueryError> {
        let mut keys = Vec::new();
        for item in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (direction, name) = match item.strip_prefix(DESCENDING_MARKER) {
                Some(name) => (Direction::Descending, name),
                None => (Direction::Ascending, item),
            };
            let field = entity.sort_field(name)?;
            keys.push(SortKey {
                attribute: field.attribute,
                direction,
                collation: field.collation,
                locale: locales.resolve_field(entity.kind, field).map(str::to_string),
            });
        }
        Ok(Self { keys })
    }

    /// Sorts `entities` in place.
    pub fn apply(&self, entities: &mut Vec<EntityRef<'_>>) {
        let mut decorated: Vec<(Vec<SortValue>, EntityKey, EntityRef<'_>)> = entities
            .drain(..)
            .map(|entity| {
                let values = self
                    .keys
                    .iter()
                    .map(|key| SortValue::extract(entity, key))
                    .collect();
                (values, entity.key(), entity)
            })
            .collect();

        decorated.sort_by(|(a_values, a_key, _), (b_values, b_key, _)| {
            self.keys
                .iter()
                .zip(a_values.iter().zip(b_values))
                .map(|(key, (a, b))| {
                    let ord = a.cmp(b);
                    match key.direction {
                        Direction::Ascending => ord,
                        Direction::Descending => ord.reverse(),
                    }
                })
                .find(|ord| ord.is_ne())
                .unwrap_or(CmpOrdering::Equal)
                .then_with(|| a_key.cmp(b_key))
        });

        entities.extend(decorated.into_iter().map(|(_, _, entity)| entity));
    }
}

/// Sort key value for one entity, already collated. `Missing` is declared
/// last so it orders after every value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum SortValue {
    Bool(bool),
    Uuid(Uuid),
    Text(String),
    Missing,
}

impl SortValue {
    fn extract(entity: EntityRef<'_>, key: &SortKey) -> Self {
        let text = match entity.attribute(key.attribute) {
            Some(AttrValue::Text(text)) => text,
            Some(AttrValue::Localized(values)) => {
                match key.locale.as_deref().and_then(|l| values.get(l)) {
                    Some(text) => text,
                    None => return SortValue::Missing,
                }
            }
            Some(AttrValue::Uuid(id)) => return SortValue::Uuid(id),
            Some(AttrValue::Bool(flag)) => return SortValue::Bool(flag),
            Some(AttrValue::Missing) | None => return SortValue::Missing,
        };
        match key.collation {
            Collation::CaseSensitive => SortValue::Text(text.to_string()),
            Collation::CaseInsensitive => SortValue::Text(text.to_lowercase()),
        }
    }
}
