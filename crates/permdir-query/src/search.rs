//! Free-text search predicates.

use crate::locale::LocaleResolver;
use crate::predicate::{Condition, Predicate};
use crate::registry::EntityRegistry;

/// Builds the search predicate for `term` over the searchable paths of
/// `entity`.
///
/// An entity matches when any searchable attribute, on the entity itself or
/// on an entity reached through the path's relations, contains `term` as a
/// case-sensitive substring. Multilingual attributes are compared only in
/// the resolved locale. The term is trimmed; a missing or blank term
/// matches everything.
pub fn build_search_predicate(
    entity: &EntityRegistry,
    term: Option<&str>,
    locales: &LocaleResolver<'_>,
) -> Predicate {
    let Some(term) = term.map(str::trim).filter(|t| !t.is_empty()) else {
        return Predicate::Always;
    };

    let branches = entity
        .search
        .iter()
        .map(|path| {
            let locale = locales.resolve(entity.kind, path.owner(entity.kind));
            let leaf = Predicate::Attribute {
                name: path.attribute,
                locale: Some(locale.to_string()),
                condition: Condition::Contains(term.to_string()),
            };
            path.via
                .iter()
                .rev()
                .fold(leaf, |inner, relation| Predicate::exists(*relation, inner))
        })
        .collect();

    Predicate::Or(branches)
}

#[cfg(test)]
mod tests {
    use permdir_core::config::LocaleConfig;
    use permdir_core::entity::{EntityKind, Relation};

    use super::*;
    use crate::registry::REGISTRY;

    #[test]
    fn blank_term_is_noop() {
        let config = LocaleConfig::default();
        let locales = LocaleResolver::new(&config, None);
        let users = REGISTRY.entity(EntityKind::User).unwrap();
        for term in [None, Some("   ")] {
            let predicate = build_search_predicate(users, term, &locales);
            assert_eq!(predicate, Predicate::Always);
        }
    }

    #[test]
    fn term_is_trimmed() {
        let config = LocaleConfig::default();
        let locales = LocaleResolver::new(&config, None);
        let users = REGISTRY.entity(EntityKind::User).unwrap();

        let Predicate::Or(branches) = build_search_predicate(users, Some(" adm "), &locales) else {
            panic!("search should produce a disjunction");
        };
        assert!(branches.contains(&Predicate::Attribute {
            name: "username",
            locale: Some("en".into()),
            condition: Condition::Contains("adm".into()),
        }));
    }

    #[test]
    fn relation_paths_nest_outermost_first() {
        let config = LocaleConfig::default()
            .with_forced_locale(EntityKind::Role, "de");
        let locales = LocaleResolver::new(&config, Some("en"));
        let users = REGISTRY.entity(EntityKind::User).unwrap();

        let Predicate::Or(branches) = build_search_predicate(users, Some("adm"), &locales) else {
            panic!("search should produce a disjunction");
        };
        assert_eq!(branches.len(), users.search.len());
        assert!(branches.contains(&Predicate::exists(
            Relation::UserAcls,
            Predicate::exists(
                Relation::AclRole,
                Predicate::Attribute {
                    name: "name",
                    locale: Some("de".into()),
                    condition: Condition::Contains("adm".into()),
                },
            ),
        )));
        // Scope names are not forced, so the active locale applies.
        assert!(branches.contains(&Predicate::exists(
            Relation::UserAcls,
            Predicate::exists(
                Relation::AclScope,
                Predicate::Attribute {
                    name: "name",
                    locale: Some("en".into()),
                    condition: Condition::Contains("adm".into()),
                },
            ),
        )));
    }
}
