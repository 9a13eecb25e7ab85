//! Loading the stored directory into memory for querying.

use permdir_core::Directory;
use permdir_core::error::PermdirResult;
use permdir_core::repository::{AclRepository, RoleRepository, ScopeRepository, UserRepository};
use surrealdb::{Connection, Surreal};
use tracing::info;

use crate::repository::{
    SurrealAclRepository, SurrealRoleRepository, SurrealScopeRepository, SurrealUserRepository,
};

/// Reads every user, role, scope and ACL entry into a [`Directory`].
///
/// Rows that violate the directory invariants (an ACL pointing at a
/// missing record, a scope whose parent is gone) fail the load.
pub async fn load_directory<C: Connection>(db: &Surreal<C>) -> PermdirResult<Directory> {
    let users = SurrealUserRepository::new(db.clone()).list().await?;
    let roles = SurrealRoleRepository::new(db.clone()).list().await?;
    let scopes = SurrealScopeRepository::new(db.clone()).list().await?;
    let acls = SurrealAclRepository::new(db.clone()).list().await?;

    info!(
        users = users.len(),
        roles = roles.len(),
        scopes = scopes.len(),
        acls = acls.len(),
        "Loading directory snapshot"
    );

    let mut directory = Directory::new();
    for user in users {
        directory.insert_user(user)?;
    }
    for role in roles {
        directory.insert_role(role)?;
    }
    directory.insert_scopes(scopes)?;
    for acl in acls {
        directory.insert_acl(acl)?;
    }
    Ok(directory)
}
