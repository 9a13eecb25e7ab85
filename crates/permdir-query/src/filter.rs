//! Declared-field filter predicates.

use permdir_core::entity::EntityKind;
use uuid::Uuid;

use crate::error::QueryError;
use crate::locale::LocaleResolver;
use crate::predicate::{Condition, Literal, Predicate};
use crate::registry::{FieldDescriptor, Lookup, ValueType};

/// Builds the predicate for `field__lookup=raw` on entities of `owner`.
///
/// An empty value leaves the result unconstrained. `in` takes a
/// comma-separated list. Values are parsed to the field's type before any
/// comparison, so a malformed identifier is rejected rather than silently
/// matching nothing.
pub fn build_filter_predicate(
    owner: EntityKind,
    field: &FieldDescriptor,
    lookup: Lookup,
    raw: &str,
    locales: &LocaleResolver<'_>,
) -> Result<Predicate, QueryError> {
    if !field.allows(lookup) {
        return Err(QueryError::UnsupportedLookup {
            entity: owner,
            field: field.name.into(),
            lookup: lookup.as_str().into(),
        });
    }

    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Predicate::Always);
    }

    let condition = match lookup {
        Lookup::Exact => Condition::Equals(parse_literal(field, raw)?),
        Lookup::In => {
            let values = raw
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(|item| parse_literal(field, item))
                .collect::<Result<Vec<_>, _>>()?;
            if values.is_empty() {
                return Ok(Predicate::Always);
            }
            Condition::In(values)
        }
        Lookup::Contains => Condition::Contains(raw.to_string()),
        Lookup::IContains => Condition::IContains(raw.to_lowercase()),
    };

    Ok(Predicate::Attribute {
        name: field.attribute,
        locale: locales.resolve_field(owner, field).map(str::to_string),
        condition,
    })
}

/// Parses one filter value according to the field's value type.
pub fn parse_literal(field: &FieldDescriptor, raw: &str) -> Result<Literal, QueryError> {
    let invalid = |expected: ValueType| QueryError::InvalidValue {
        field: field.name.into(),
        value: raw.into(),
        expected: expected.as_str(),
    };
    match field.kind.value_type() {
        ValueType::Text => Ok(Literal::Text(raw.to_string())),
        ValueType::Uuid => Uuid::parse_str(raw)
            .map(Literal::Uuid)
            .map_err(|_| invalid(ValueType::Uuid)),
        ValueType::Bool => match raw.to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(Literal::Bool(true)),
            "false" | "0" => Ok(Literal::Bool(false)),
            _ => Err(invalid(ValueType::Bool)),
        },
    }
}
