//! Predicates over the directory graph.
//!
//! A [`Predicate`] is built from validated request parameters and carries
//! everything needed to evaluate it, including the locale multilingual
//! comparisons use. Evaluating a predicate never fails: values of the wrong
//! type or translations missing in the resolved locale simply don't match.

use permdir_core::entity::{AttrValue, EntityRef, Relation};
use uuid::Uuid;

use crate::store::EntityStore;

/// A parsed filter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Text(String),
    Uuid(Uuid),
    Bool(bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Equals(Literal),
    In(Vec<Literal>),
    /// Case-sensitive substring.
    Contains(String),
    /// Case-insensitive substring. The needle is stored lower-folded.
    IContains(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Matches every entity.
    Always,
    And(Vec<Predicate>),
    /// Matches if any branch does; an empty `Or` matches nothing.
    Or(Vec<Predicate>),
    /// Compares one attribute of the entity. `locale` selects the
    /// translation when the attribute is multilingual.
    Attribute {
        name: &'static str,
        locale: Option<String>,
        condition: Condition,
    },
    /// Some entity reached over `relation` satisfies `predicate`.
    Exists {
        relation: Relation,
        predicate: Box<Predicate>,
    },
}

impl Predicate {
    /// Conjunction that drops `Always` terms and flattens nested `And`s.
    pub fn all(predicates: impl IntoIterator<Item = Predicate>) -> Predicate {
        let mut terms = Vec::new();
        for predicate in predicates {
            match predicate {
                Predicate::Always => {}
                Predicate::And(inner) => terms.extend(inner),
                other => terms.push(other),
            }
        }
        match terms.len() {
            0 => Predicate::Always,
            1 => terms.remove(0),
            _ => Predicate::And(terms),
        }
    }

    pub fn exists(relation: Relation, predicate: Predicate) -> Predicate {
        Predicate::Exists {
            relation,
            predicate: Box::new(predicate),
        }
    }

    pub fn is_always(&self) -> bool {
        matches!(self, Predicate::Always)
    }

    pub fn matches<'a, S>(&self, entity: EntityRef<'a>, store: &'a S) -> bool
    where
        S: EntityStore + ?Sized,
    {
        match self {
            Predicate::Always => true,
            Predicate::And(terms) => terms.iter().all(|t| t.matches(entity, store)),
            Predicate::Or(terms) => terms.iter().any(|t| t.matches(entity, store)),
            Predicate::Attribute {
                name,
                locale,
                condition,
            } => entity
                .attribute(name)
                .and_then(|value| Comparable::resolve(value, locale.as_deref()))
                .is_some_and(|value| condition.holds(&value)),
            Predicate::Exists {
                relation,
                predicate,
            } => store
                .related(entity, *relation)
                .into_iter()
                .any(|related| predicate.matches(related, store)),
        }
    }
}

/// An attribute value reduced to something a condition can test.
enum Comparable<'a> {
    Text(&'a str),
    Uuid(Uuid),
    Bool(bool),
}

impl<'a> Comparable<'a> {
    fn resolve(value: AttrValue<'a>, locale: Option<&str>) -> Option<Self> {
        match value {
            AttrValue::Text(text) => Some(Comparable::Text(text)),
            AttrValue::Uuid(id) => Some(Comparable::Uuid(id)),
            AttrValue::Bool(flag) => Some(Comparable::Bool(flag)),
            AttrValue::Localized(values) => {
                locale.and_then(|l| values.get(l)).map(Comparable::Text)
            }
            AttrValue::Missing => None,
        }
    }

    fn equals(&self, literal: &Literal) -> bool {
        match (self, literal) {
            (Comparable::Text(a), Literal::Text(b)) => *a == b,
            (Comparable::Uuid(a), Literal::Uuid(b)) => a == b,
            (Comparable::Bool(a), Literal::Bool(b)) => a == b,
            _ => false,
        }
    }
}

impl Condition {
    fn holds(&self, value: &Comparable<'_>) -> bool {
        match self {
            Condition::Equals(literal) => value.equals(literal),
            Condition::In(literals) => literals.iter().any(|l| value.equals(l)),
            Condition::Contains(needle) => match value {
                Comparable::Text(text) => text.contains(needle.as_str()),
                _ => false,
            },
            Condition::IContains(needle) => match value {
                Comparable::Text(text) => text.to_lowercase().contains(needle.as_str()),
                _ => false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use permdir_core::Directory;
    use permdir_core::models::acl::CreateAcl;
    use permdir_core::models::multilingual::Multilingual;
    use permdir_core::models::role::CreateRole;
    use permdir_core::models::scope::CreateScope;
    use permdir_core::models::user::CreateUser;

    use super::*;

    fn directory() -> Directory {
        let mut dir = Directory::new();
        let user = dir
            .create_user(CreateUser {
                username: "alice".into(),
                email: Some("Alice@Example.com".into()),
                ..Default::default()
            })
            .unwrap()
            .id;
        dir.create_role(CreateRole {
            slug: "admin".into(),
            name: Multilingual::new("en", "Administrator")
                .with("de", "Verwalter"),
            description: None,
        })
        .unwrap();
        let scope = dir
            .create_scope(CreateScope {
                name: Multilingual::new("en", "Headquarters"),
                description: None,
                parent_id: None,
            })
            .unwrap()
            .id;
        dir.grant(CreateAcl {
            user_id: user,
            scope_id: scope,
            role_id: "admin".into(),
        })
        .unwrap();
        dir
    }

    fn attr(name: &'static str, condition: Condition) -> Predicate {
        Predicate::Attribute {
            name,
            locale: None,
            condition,
        }
    }

    fn alice(dir: &Directory) -> EntityRef<'_> {
        EntityRef::User(dir.user_by_username("alice").unwrap())
    }

    #[test]
    fn all_simplifies() {
        assert_eq!(Predicate::all([]), Predicate::Always);
        assert_eq!(
            Predicate::all([Predicate::Always, Predicate::Always]),
            Predicate::Always
        );
        let single = attr("username", Condition::Contains("a".into()));
        assert_eq!(Predicate::all([Predicate::Always, single.clone()]), single);
    }

    #[test]
    fn empty_or_matches_nothing() {
        let dir = directory();
        assert!(!Predicate::Or(vec![]).matches(alice(&dir), &dir));
        assert!(Predicate::And(vec![]).matches(alice(&dir), &dir));
    }

    #[test]
    fn equality_is_case_sensitive_and_typed() {
        let dir = directory();
        let user = alice(&dir);
        let user_id = dir.user_by_username("alice").unwrap().id;
        let text = |value: &str| Condition::Equals(Literal::Text(value.into()));

        assert!(attr("username", text("alice")).matches(user, &dir));
        assert!(!attr("username", text("Alice")).matches(user, &dir));
        let by_id = Condition::Equals(Literal::Uuid(user_id));
        assert!(!attr("username", by_id.clone()).matches(user, &dir));
        assert!(attr("id", by_id).matches(user, &dir));
    }

    #[test]
    fn missing_values_never_match() {
        let dir = directory();
        let user = alice(&dir);
        let anything = Condition::Contains(String::new());
        assert!(!attr("first_name", anything.clone()).matches(user, &dir));
        assert!(!attr("no_such_attribute", anything).matches(user, &dir));
    }

    #[test]
    fn icontains_folds_case() {
        let dir = directory();
        let user = alice(&dir);
        let folded = attr("email", Condition::IContains("alice@example".into()));
        let exact = attr("email", Condition::Contains("alice@example".into()));
        assert!(folded.matches(user, &dir));
        assert!(!exact.matches(user, &dir));
    }

    #[test]
    fn multilingual_compares_only_the_given_locale() {
        let dir = directory();
        let role = EntityRef::Role(dir.role("admin").unwrap());
        let name_in = |locale: Option<&str>, needle: &str| Predicate::Attribute {
            name: "name",
            locale: locale.map(str::to_string),
            condition: Condition::Contains(needle.into()),
        };
        assert!(name_in(Some("de"), "Verwalter").matches(role, &dir));
        assert!(!name_in(Some("en"), "Verwalter").matches(role, &dir));
        assert!(!name_in(Some("fr"), "Admin").matches(role, &dir));
        assert!(!name_in(None, "Admin").matches(role, &dir));
    }

    #[test]
    fn exists_walks_relations() {
        let dir = directory();
        let user = alice(&dir);
        let via_role = Predicate::exists(
            Relation::UserAcls,
            Predicate::exists(
                Relation::AclRole,
                Predicate::Attribute {
                    name: "name",
                    locale: Some("en".into()),
                    condition: Condition::Contains("Admin".into()),
                },
            ),
        );
        assert!(via_role.matches(user, &dir));

        let wrong_scope = Predicate::exists(
            Relation::UserAcls,
            Predicate::exists(
                Relation::AclScope,
                Predicate::Attribute {
                    name: "name",
                    locale: Some("en".into()),
                    condition: Condition::Contains("Branch".into()),
                },
            ),
        );
        assert!(!wrong_scope.matches(user, &dir));
    }
}
