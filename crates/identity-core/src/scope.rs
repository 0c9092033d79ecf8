//! Per-unit-of-work wiring of the tenant provider and both stores.

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::TenantOf;
use crate::error::ResolveError;
use crate::repositories::{IdentityContext, RoleStore, UserStore};
use crate::stores::{EntityRoleStore, EntityUserStore, RoleStoreMultiTenant, UserStoreMultiTenant};
use crate::tenant::{ScopeHints, TenantIdProvider, TenantResolver};

/// Everything one unit of work needs to read and write identities of its
/// tenant. Ending (or dropping) the scope disposes both stores.
pub struct IdentityScope<C: IdentityContext> {
    provider: TenantIdProvider<TenantOf<C::User>>,
    users: UserStoreMultiTenant<EntityUserStore<C>>,
    roles: RoleStoreMultiTenant<EntityRoleStore<C>>,
}

impl<C: IdentityContext> IdentityScope<C> {
    pub fn begin<R>(
        context: Arc<C>,
        resolver: &R,
        hints: &ScopeHints,
        auto_save_changes: bool,
    ) -> Result<Self, ResolveError>
    where
        R: TenantResolver<TenantOf<C::User>> + ?Sized,
    {
        let provider = TenantIdProvider::from_resolver(resolver, hints)?;
        Ok(Self::with_provider(context, provider, auto_save_changes))
    }

    pub fn with_provider(
        context: Arc<C>,
        provider: TenantIdProvider<TenantOf<C::User>>,
        auto_save_changes: bool,
    ) -> Self {
        let users = UserStoreMultiTenant::new(
            EntityUserStore::new(Arc::clone(&context)).with_auto_save_changes(auto_save_changes),
            &provider,
        );
        let roles = RoleStoreMultiTenant::new(
            EntityRoleStore::new(context).with_auto_save_changes(auto_save_changes),
            &provider,
        );
        info!(tenant = ?provider.tenant_id(), "Identity scope started");
        Self { provider, users, roles }
    }

    pub fn tenant_id(&self) -> &TenantOf<C::User> {
        self.provider.tenant_id()
    }

    pub fn provider(&self) -> &TenantIdProvider<TenantOf<C::User>> {
        &self.provider
    }

    pub fn users(&self) -> &UserStoreMultiTenant<EntityUserStore<C>> {
        &self.users
    }

    pub fn roles(&self) -> &RoleStoreMultiTenant<EntityRoleStore<C>> {
        &self.roles
    }

    pub fn is_ended(&self) -> bool {
        self.users.is_disposed() && self.roles.is_disposed()
    }

    pub fn end(&self) {
        if !self.is_ended() {
            debug!(tenant = ?self.provider.tenant_id(), "Identity scope ended");
        }
        self.users.dispose();
        self.roles.dispose();
    }
}

impl<C: IdentityContext> Drop for IdentityScope<C> {
    fn drop(&mut self) {
        self.end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_util::sync::CancellationToken;

    use crate::error::StoreError;
    use crate::tenant::{HeaderTenantResolver, StaticTenantResolver};
    use crate::testing::MockContext;

    #[test]
    fn test_begin_resolves_tenant() {
        let resolver = StaticTenantResolver::new("TenantId-2").unwrap();
        let scope = IdentityScope::begin(Arc::new(MockContext::new()), &resolver, &ScopeHints::default(), true)
            .unwrap();
        assert_eq!(scope.tenant_id(), "TenantId-2");
        assert_eq!(scope.users().tenant_key(), "TenantId-2");
        assert_eq!(scope.roles().tenant_key(), "TenantId-2");
    }

    #[test]
    fn test_begin_propagates_resolve_error() {
        let result = IdentityScope::begin(
            Arc::new(MockContext::new()),
            &HeaderTenantResolver,
            &ScopeHints::default(),
            true,
        );
        assert!(matches!(result, Err(ResolveError::MissingHint(_))));
    }

    #[tokio::test]
    async fn test_end_disposes_both_stores() {
        let provider = TenantIdProvider::new("T1".to_string());
        let scope = IdentityScope::with_provider(Arc::new(MockContext::new()), provider, true);
        scope.end();
        assert!(scope.is_ended());
        assert!(scope.users().inner().is_disposed());
        assert!(scope.roles().inner().is_disposed());

        let err = scope.roles().find_by_name("ADMIN", &CancellationToken::new()).await.unwrap_err();
        assert_eq!(err, StoreError::Disposed("RoleStoreMultiTenant"));
    }
}
