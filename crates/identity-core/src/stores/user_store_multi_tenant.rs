//! Tenant-scoped user store.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::domain::{IdentityResult, TenantOf, TenantScoped};
use crate::error::StoreError;
use crate::query::Query;
use crate::repositories::{QueryableUserStore, UserStore};
use crate::tenant::TenantIdProvider;

use super::lifecycle::Lifecycle;

/// Wraps a base user store and confines it to one tenant.
///
/// `create` stamps the tenant and then hands the user to the inner store, so
/// the inner store's validation, commit and error behavior apply unchanged.
pub struct UserStoreMultiTenant<S: UserStore> {
    inner: S,
    tenant_key: TenantOf<S::User>,
    lifecycle: Lifecycle,
}

impl<S: QueryableUserStore> UserStoreMultiTenant<S> {
    pub fn new(inner: S, provider: &TenantIdProvider<TenantOf<S::User>>) -> Self {
        Self {
            inner,
            tenant_key: provider.tenant_id().clone(),
            lifecycle: Lifecycle::new("UserStoreMultiTenant"),
        }
    }

    pub fn tenant_key(&self) -> &TenantOf<S::User> {
        &self.tenant_key
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn first_in_tenant(
        &self,
        query: Query<TenantOf<S::User>>,
        cancel: &CancellationToken,
    ) -> Result<Option<S::User>, StoreError> {
        self.lifecycle.ensure_active(cancel)?;
        let query = query.scoped_to(self.tenant_key.clone());
        debug!(?query, "Finding user in tenant");
        self.inner.first_user(&query, cancel).await
    }
}

#[async_trait]
impl<S: QueryableUserStore> UserStore for UserStoreMultiTenant<S> {
    type User = S::User;

    async fn create(&self, mut user: Self::User, cancel: &CancellationToken) -> Result<IdentityResult, StoreError> {
        self.lifecycle.ensure_active(cancel)?;
        user.set_tenant_id(self.tenant_key.clone());
        self.inner.create(user, cancel).await
    }

    async fn find_by_name(
        &self,
        normalized_user_name: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<Self::User>, StoreError> {
        self.first_in_tenant(Query::user_name(normalized_user_name), cancel).await
    }

    async fn find_by_email(
        &self,
        normalized_email: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<Self::User>, StoreError> {
        self.first_in_tenant(Query::email(normalized_email), cancel).await
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

    use crate::application::ApplicationUser;
    use crate::domain::UserRecord;
    use crate::stores::EntityUserStore;
    use crate::testing::MockContext;

    fn scoped(ctx: MockContext, tenant: &str) -> UserStoreMultiTenant<EntityUserStore<MockContext>> {
        let provider = TenantIdProvider::new(tenant.to_string());
        UserStoreMultiTenant::new(EntityUserStore::new(Arc::new(ctx)), &provider)
    }

    #[tokio::test]
    async fn test_create_stamps_tenant_then_delegates() {
        let mut ctx = MockContext::new();
        ctx.expect_add_user()
            .withf(|u| u.tenant_id().map(String::as_str) == Some("T1") && u.user_name() == Some("alice"))
            .times(1)
            .return_const(());
        ctx.expect_save_changes().times(1).returning(|| Ok(1));

        let user = ApplicationUser::new("alice").with_email("a@x.com").with_tenant("T9".into());
        assert!(scoped(ctx, "T1").create(user, &CancellationToken::new()).await.unwrap().succeeded());
    }

    #[tokio::test]
    async fn test_create_inherits_inner_validation() {
        let err = scoped(MockContext::new(), "T1")
            .create(ApplicationUser::new(""), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::InvalidArgument("user"));
    }

    #[tokio::test]
    async fn test_lookups_are_scoped_and_read_only() {
        let mut ctx = MockContext::new();
        ctx.expect_first_user()
            .withf(|q| q.tenant().map(String::as_str) == Some("T1") && q.predicates().len() == 2)
            .times(2)
            .returning(|_| Ok(None));
        ctx.expect_add_user().never();
        ctx.expect_add_role().never();
        ctx.expect_save_changes().never();

        let store = scoped(ctx, "T1");
        let cancel = CancellationToken::new();
        assert_eq!(store.find_by_name("ALICE", &cancel).await, Ok(None));
        assert_eq!(store.find_by_email("A@X.COM", &cancel).await, Ok(None));
    }

    #[tokio::test]
    async fn test_cancelled_before_touching_context() {
        let mut ctx = MockContext::new();
        ctx.expect_first_user().never();
        ctx.expect_add_user().never();

        let store = scoped(ctx, "T1");
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert_eq!(store.create(ApplicationUser::new("alice"), &cancel).await, Err(StoreError::Cancelled));
        assert_eq!(store.find_by_name("ALICE", &cancel).await, Err(StoreError::Cancelled));
        assert_eq!(store.find_by_email("A@X.COM", &cancel).await, Err(StoreError::Cancelled));
    }

    #[tokio::test]
    async fn test_disposed_fails_every_call() {
        let store = scoped(MockContext::new(), "T1");
        store.dispose();
        assert!(store.inner().is_disposed());

        let cancel = CancellationToken::new();
        let disposed: Result<(), StoreError> = Err(StoreError::Disposed("UserStoreMultiTenant"));
        assert_eq!(store.create(ApplicationUser::new(""), &cancel).await.map(|_| ()), disposed.clone());
        assert_eq!(store.find_by_name("ALICE", &cancel).await.map(|_| ()), disposed.clone());
        assert_eq!(store.find_by_email("", &cancel).await.map(|_| ()), disposed);
    }
}
