//! Persistence context trait (port)

use async_trait::async_trait;

use crate::domain::{RoleRecord, TenantOf, UserRecord};
use crate::error::PersistenceError;
use crate::query::Query;

/// The data-access layer the stores delegate all I/O to.
///
/// `add_*` only registers a record for insertion; nothing is durable until
/// `save_changes` commits the pending set.
#[async_trait]
pub trait IdentityContext: Send + Sync {
    type User: UserRecord;
    type Role: RoleRecord<Tenant = TenantOf<Self::User>>;

    async fn first_user(
        &self,
        query: &Query<TenantOf<Self::User>>,
    ) -> Result<Option<Self::User>, PersistenceError>;

    async fn first_role(
        &self,
        query: &Query<TenantOf<Self::User>>,
    ) -> Result<Option<Self::Role>, PersistenceError>;

    async fn add_user(&self, user: Self::User);

    async fn add_role(&self, role: Self::Role);

    /// Commits every pending record and returns how many were written.
    async fn save_changes(&self) -> Result<usize, PersistenceError>;

    async fn pending_changes(&self) -> usize;
}
