//! Base role store over a persistence context.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use identity_shared::utils::is_blank;

use crate::domain::{IdentityErrorDescriber, IdentityResult, RoleRecord, TenantOf};
use crate::error::{PersistenceError, StoreError};
use crate::query::Query;
use crate::repositories::{IdentityContext, QueryableRoleStore, RoleStore};

use super::lifecycle::Lifecycle;

/// Tenant-unaware role store.
pub struct EntityRoleStore<C: IdentityContext> {
    context: Arc<C>,
    describer: IdentityErrorDescriber,
    auto_save_changes: bool,
    lifecycle: Lifecycle,
}

impl<C: IdentityContext> EntityRoleStore<C> {
    pub fn new(context: Arc<C>) -> Self {
        Self::with_describer(context, IdentityErrorDescriber)
    }

    pub fn with_describer(context: Arc<C>, describer: IdentityErrorDescriber) -> Self {
        Self {
            context,
            describer,
            auto_save_changes: true,
            lifecycle: Lifecycle::new("EntityRoleStore"),
        }
    }

    pub fn with_auto_save_changes(mut self, auto_save_changes: bool) -> Self {
        self.auto_save_changes = auto_save_changes;
        self
    }

    pub fn context(&self) -> &Arc<C> {
        &self.context
    }
}

pub(crate) fn validate_role<R: RoleRecord>(role: &R) -> Result<(), StoreError> {
    if role.name().map_or(true, is_blank) {
        return Err(StoreError::InvalidArgument("role"));
    }
    Ok(())
}

#[async_trait]
impl<C: IdentityContext> RoleStore for EntityRoleStore<C> {
    type Role = C::Role;

    async fn create(&self, role: Self::Role, cancel: &CancellationToken) -> Result<IdentityResult, StoreError> {
        self.lifecycle.ensure_active(cancel)?;
        validate_role(&role)?;

        info!("Creating role {}", role.name().unwrap_or_default());
        self.add(role, cancel).await?;
        if !self.auto_save_changes {
            return Ok(IdentityResult::Success);
        }

        match self.save_changes(cancel).await {
            Ok(_) => Ok(IdentityResult::Success),
            Err(StoreError::Persistence(PersistenceError::Concurrency)) => {
                Ok(IdentityResult::failed([self.describer.concurrency_failure()]))
            }
            Err(e) => Err(e),
        }
    }

    async fn find_by_name(
        &self,
        normalized_name: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<Self::Role>, StoreError> {
        self.first_role(&Query::role_name(normalized_name), cancel).await
    }

    fn dispose(&self) {
        self.lifecycle.dispose();
    }

    fn is_disposed(&self) -> bool {
        self.lifecycle.is_disposed()
    }
}

#[async_trait]
impl<C: IdentityContext> QueryableRoleStore for EntityRoleStore<C> {
    async fn first_role(
        &self,
        query: &Query<TenantOf<Self::Role>>,
        cancel: &CancellationToken,
    ) -> Result<Option<Self::Role>, StoreError> {
        self.lifecycle.ensure_active(cancel)?;
        debug!(?query, "Querying roles");
        self.context.first_role(query).await.map_err(|e| {
            error!("Database error querying roles: {}", e);
            StoreError::from(e)
        })
    }

    async fn add(&self, role: Self::Role, cancel: &CancellationToken) -> Result<(), StoreError> {
        self.lifecycle.ensure_active(cancel)?;
        self.context.add_role(role).await;
        Ok(())
    }

    async fn save_changes(&self, cancel: &CancellationToken) -> Result<usize, StoreError> {
        self.lifecycle.ensure_active(cancel)?;
        self.context.save_changes().await.map_err(|e| {
            error!("Database error saving roles: {}", e);
            StoreError::from(e)
        })
    }

    fn auto_save_changes(&self) -> bool {
        self.auto_save_changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ApplicationRole;
    use crate::testing::MockContext;

    #[tokio::test]
    async fn test_create_and_find() {
        let mut ctx = MockContext::new();
        ctx.expect_add_role().times(1).return_const(());
        ctx.expect_save_changes().times(1).returning(|| Ok(1));
        ctx.expect_first_role()
            .withf(|q| q.tenant().is_none())
            .times(1)
            .returning(|_| Ok(Some(ApplicationRole::new("Admin"))));

        let store = EntityRoleStore::new(Arc::new(ctx));
        let cancel = CancellationToken::new();
        assert!(store.create(ApplicationRole::new("Admin"), &cancel).await.unwrap().succeeded());
        let found = store.find_by_name("ADMIN", &cancel).await.unwrap().unwrap();
        assert_eq!(found.name(), Some("Admin"));
    }

    #[tokio::test]
    async fn test_blank_role_rejected() {
        let store = EntityRoleStore::new(Arc::new(MockContext::new()));
        let err = store.create(ApplicationRole::new(""), &CancellationToken::new()).await.unwrap_err();
        assert_eq!(err, StoreError::InvalidArgument("role"));
    }

    #[tokio::test]
    async fn test_database_error_propagates() {
        let mut ctx = MockContext::new();
        ctx.expect_first_role()
            .returning(|_| Err(PersistenceError::Database("connection reset".into())));

        let store = EntityRoleStore::new(Arc::new(ctx));
        let err = store.find_by_name("ADMIN", &CancellationToken::new()).await.unwrap_err();
        assert_eq!(err, StoreError::Persistence(PersistenceError::Database("connection reset".into())));
    }
}
