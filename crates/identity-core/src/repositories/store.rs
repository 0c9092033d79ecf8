//! Store contracts (ports)
//!
//! Base and tenant-scoped stores implement the same traits, so callers hold
//! either one behind the same bound.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::{IdentityResult, RoleRecord, TenantOf, UserRecord};
use crate::error::StoreError;
use crate::query::Query;

#[async_trait]
pub trait UserStore: Send + Sync {
    type User: UserRecord;

    async fn create(&self, user: Self::User, cancel: &CancellationToken) -> Result<IdentityResult, StoreError>;

    async fn find_by_name(
        &self,
        normalized_user_name: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<Self::User>, StoreError>;

    async fn find_by_email(
        &self,
        normalized_email: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<Self::User>, StoreError>;

    fn dispose(&self);

    fn is_disposed(&self) -> bool;
}

#[async_trait]
pub trait RoleStore: Send + Sync {
    type Role: RoleRecord;

    async fn create(&self, role: Self::Role, cancel: &CancellationToken) -> Result<IdentityResult, StoreError>;

    async fn find_by_name(
        &self,
        normalized_name: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<Self::Role>, StoreError>;

    fn dispose(&self);

    fn is_disposed(&self) -> bool;
}

/// A user store that can run an arbitrary [`Query`] against its context.
#[async_trait]
pub trait QueryableUserStore: UserStore {
    async fn first_user(
        &self,
        query: &Query<TenantOf<Self::User>>,
        cancel: &CancellationToken,
    ) -> Result<Option<Self::User>, StoreError>;
}

/// A role store exposing the context operations its `create` is built from.
#[async_trait]
pub trait QueryableRoleStore: RoleStore {
    async fn first_role(
        &self,
        query: &Query<TenantOf<Self::Role>>,
        cancel: &CancellationToken,
    ) -> Result<Option<Self::Role>, StoreError>;

    /// Registers a role for insertion without committing.
    async fn add(&self, role: Self::Role, cancel: &CancellationToken) -> Result<(), StoreError>;

    async fn save_changes(&self, cancel: &CancellationToken) -> Result<usize, StoreError>;

    fn auto_save_changes(&self) -> bool;
}
