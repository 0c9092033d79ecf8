//! Tenant-scoped role store.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::domain::{IdentityResult, RoleRecord, TenantOf, TenantScoped};
use crate::error::StoreError;
use crate::query::Query;
use crate::repositories::{QueryableRoleStore, RoleStore};
use crate::tenant::TenantIdProvider;

use super::entity_role_store::validate_role;
use super::lifecycle::Lifecycle;

/// Wraps a base role store and confines it to one tenant.
///
/// Every role created here is stamped with the captured tenant, and every
/// lookup adds a tenant predicate to the base one.
pub struct RoleStoreMultiTenant<S: RoleStore> {
    inner: S,
    tenant_key: TenantOf<S::Role>,
    lifecycle: Lifecycle,
}

impl<S: QueryableRoleStore> RoleStoreMultiTenant<S> {
    pub fn new(inner: S, provider: &TenantIdProvider<TenantOf<S::Role>>) -> Self {
        Self {
            inner,
            tenant_key: provider.tenant_id().clone(),
            lifecycle: Lifecycle::new("RoleStoreMultiTenant"),
        }
    }

    pub fn tenant_key(&self) -> &TenantOf<S::Role> {
        &self.tenant_key
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: QueryableRoleStore> RoleStore for RoleStoreMultiTenant<S> {
    type Role = S::Role;

    async fn create(&self, mut role: Self::Role, cancel: &CancellationToken) -> Result<IdentityResult, StoreError> {
        self.lifecycle.ensure_active(cancel)?;
        validate_role(&role)?;

        role.set_tenant_id(self.tenant_key.clone());
        info!(tenant = ?self.tenant_key, "Creating role {}", role.name().unwrap_or_default());
        self.inner.add(role, cancel).await?;
        if self.inner.auto_save_changes() {
            self.inner.save_changes(cancel).await?;
        }
        Ok(IdentityResult::Success)
    }

    async fn find_by_name(
        &self,
        normalized_name: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<Self::Role>, StoreError> {
        self.lifecycle.ensure_active(cancel)?;
        debug!(tenant = ?self.tenant_key, "Finding role {}", normalized_name);
        let query = Query::role_name(normalized_name).scoped_to(self.tenant_key.clone());
        self.inner.first_role(&query, cancel).await
    }

    fn dispose(&self) {
        self.lifecycle.dispose();
        self.inner.dispose();
    }

    fn is_disposed(&self) -> bool {
        self.lifecycle.is_disposed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::application::ApplicationRole;
    use crate::error::PersistenceError;
    use crate::stores::EntityRoleStore;
    use crate::testing::MockContext;

    fn scoped(ctx: MockContext, tenant: &str) -> RoleStoreMultiTenant<EntityRoleStore<MockContext>> {
        let provider = TenantIdProvider::new(tenant.to_string());
        RoleStoreMultiTenant::new(EntityRoleStore::new(Arc::new(ctx)), &provider)
    }

    #[tokio::test]
    async fn test_create_overwrites_caller_tenant() {
        let mut ctx = MockContext::new();
        ctx.expect_add_role()
            .withf(|r| r.tenant_id().map(String::as_str) == Some("T1"))
            .times(1)
            .return_const(());
        ctx.expect_save_changes().times(1).returning(|| Ok(1));

        let role = ApplicationRole::new("Admin").with_tenant("ignored".into());
        let result = scoped(ctx, "T1").create(role, &CancellationToken::new()).await.unwrap();
        assert_eq!(result, IdentityResult::Success);
    }

    #[tokio::test]
    async fn test_create_respects_auto_save_off() {
        let mut ctx = MockContext::new();
        ctx.expect_add_role().times(1).return_const(());
        ctx.expect_save_changes().never();

        let provider = TenantIdProvider::new("T1".to_string());
        let inner = EntityRoleStore::new(Arc::new(ctx)).with_auto_save_changes(false);
        let store = RoleStoreMultiTenant::new(inner, &provider);
        assert!(store.create(ApplicationRole::new("Admin"), &CancellationToken::new()).await.unwrap().succeeded());
    }

    #[tokio::test]
    async fn test_commit_errors_propagate_unchanged() {
        let mut ctx = MockContext::new();
        ctx.expect_add_role().return_const(());
        ctx.expect_save_changes().returning(|| Err(PersistenceError::Concurrency));

        let err = scoped(ctx, "T1")
            .create(ApplicationRole::new("Admin"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::Persistence(PersistenceError::Concurrency));
    }

    #[tokio::test]
    async fn test_find_conjoins_tenant_predicate() {
        let mut ctx = MockContext::new();
        ctx.expect_first_role()
            .withf(|q| {
                q.predicates()
                    == [
                        crate::query::Predicate::NormalizedRoleName("ADMIN".into()),
                        crate::query::Predicate::Tenant("T2".to_string()),
                    ]
            })
            .times(1)
            .returning(|_| Ok(None));

        let found = scoped(ctx, "T2").find_by_name("ADMIN", &CancellationToken::new()).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_null_role_equivalent_rejected() {
        let err = scoped(MockContext::new(), "T1")
            .create(ApplicationRole::new(" "), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::InvalidArgument("role"));
    }

    #[tokio::test]
    async fn test_cancelled_before_touching_context() {
        let mut ctx = MockContext::new();
        ctx.expect_add_role().never();
        ctx.expect_first_role().never();
        ctx.expect_save_changes().never();

        let store = scoped(ctx, "T1");
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert_eq!(store.create(ApplicationRole::new("Admin"), &cancel).await, Err(StoreError::Cancelled));
        assert_eq!(store.find_by_name("ADMIN", &cancel).await, Err(StoreError::Cancelled));
    }

    #[tokio::test]
    async fn test_disposed_regardless_of_input() {
        let store = scoped(MockContext::new(), "T1");
        store.dispose();
        assert!(store.is_disposed());
        assert!(store.inner().is_disposed());

        let cancel = CancellationToken::new();
        for role in [ApplicationRole::new("Admin"), ApplicationRole::new("")] {
            assert_eq!(
                store.create(role, &cancel).await,
                Err(StoreError::Disposed("RoleStoreMultiTenant"))
            );
        }
        assert_eq!(
            store.find_by_name("", &cancel).await,
            Err(StoreError::Disposed("RoleStoreMultiTenant"))
        );
    }
}
