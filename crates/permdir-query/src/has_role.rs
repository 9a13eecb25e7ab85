//! The `has_role` composite filter.

use permdir_core::entity::Relation;
use serde::{Deserialize, Serialize};

use crate::predicate::{Condition, Literal, Predicate};

/// How a role filter relates users to roles.
///
/// Only direct ACL bindings are followed today. Role hierarchies would add a
/// variant here and expand the requested role before matching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum RoleTraversal {
    #[default]
    Direct,
}

/// Users holding the role `raw` (a role slug) through at least one ACL
/// entry, in any scope. A blank value leaves the result unconstrained.
pub fn build_has_role_predicate(raw: &str, traversal: RoleTraversal) -> Predicate {
    let role = raw.trim();
    if role.is_empty() {
        return Predicate::Always;
    }
    match traversal {
        RoleTraversal::Direct => Predicate::exists(
            Relation::UserAcls,
            Predicate::Attribute {
                name: "role",
                locale: None,
                condition: Condition::Equals(Literal::Text(role.to_string())),
            },
        ),
    }
}
