//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Deletes cascade the way the
//! in-memory [`Directory`](crate::directory::Directory) does: removing a
//! user, role or scope removes the ACL entries that reference it.

use uuid::Uuid;

use crate::error::PermdirResult;
use crate::models::{
    acl::{Acl, CreateAcl},
    role::{CreateRole, Role, UpdateRole},
    scope::{CreateScope, Scope, UpdateScope},
    user::{CreateUser, UpdateUser, User},
};

pub trait UserRepository: Send + Sync {
    fn create(&self, input: CreateUser) -> impl Future<Output = PermdirResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = PermdirResult<User>> + Send;
    fn get_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = PermdirResult<User>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateUser,
    ) -> impl Future<Output = PermdirResult<User>> + Send;
    /// Hard delete; the user's ACL entries go with it.
    fn delete(&self, id: Uuid) -> impl Future<Output = PermdirResult<()>> + Send;
    fn list(&self) -> impl Future<Output = PermdirResult<Vec<User>>> + Send;
}

pub trait RoleRepository: Send + Sync {
    fn create(&self, input: CreateRole) -> impl Future<Output = PermdirResult<Role>> + Send;
    fn get_by_slug(&self, slug: &str) -> impl Future<Output = PermdirResult<Role>> + Send;
    fn update(
        &self,
        slug: &str,
        input: UpdateRole,
    ) -> impl Future<Output = PermdirResult<Role>> + Send;
    fn delete(&self, slug: &str) -> impl Future<Output = PermdirResult<()>> + Send;
    fn list(&self) -> impl Future<Output = PermdirResult<Vec<Role>>> + Send;
}

pub trait ScopeRepository: Send + Sync {
    fn create(&self, input: CreateScope) -> impl Future<Output = PermdirResult<Scope>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = PermdirResult<Scope>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateScope,
    ) -> impl Future<Output = PermdirResult<Scope>> + Send;
    /// Deletes the scope, its descendants and their ACL entries.
    fn delete(&self, id: Uuid) -> impl Future<Output = PermdirResult<()>> + Send;
    fn list(&self) -> impl Future<Output = PermdirResult<Vec<Scope>>> + Send;
}

pub trait AclRepository: Send + Sync {
    /// Grant a role to a user within a scope.
    fn grant(&self, input: CreateAcl) -> impl Future<Output = PermdirResult<Acl>> + Send;

    /// Remove the grant identified by the triple.
    fn revoke(
        &self,
        user_id: Uuid,
        role_id: &str,
        scope_id: Uuid,
    ) -> impl Future<Output = PermdirResult<()>> + Send;

    fn list(&self) -> impl Future<Output = PermdirResult<Vec<Acl>>> + Send;

    fn list_for_user(&self, user_id: Uuid)
    -> impl Future<Output = PermdirResult<Vec<Acl>>> + Send;
}
