//! Tenant id provider

use crate::domain::TenantKey;
use crate::error::ResolveError;

use super::resolver::{ScopeHints, TenantResolver};

/// Holds the tenant of one unit of work.
///
/// The id is fixed at construction and only ever read afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantIdProvider<T> {
    tenant_id: T,
}

impl<T: TenantKey> TenantIdProvider<T> {
    pub fn new(tenant_id: T) -> Self {
        Self { tenant_id }
    }

    pub fn from_resolver<R>(resolver: &R, hints: &ScopeHints) -> Result<Self, ResolveError>
    where
        R: TenantResolver<T> + ?Sized,
    {
        resolver.resolve(hints).map(Self::new)
    }

    pub fn tenant_id(&self) -> &T {
        &self.tenant_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tenant::StaticTenantResolver;

    #[test]
    fn test_provider_exposes_tenant() {
        let provider = TenantIdProvider::new("TenantId-1".to_string());
        assert_eq!(provider.tenant_id(), "TenantId-1");
    }

    #[test]
    fn test_from_resolver() {
        let resolver = StaticTenantResolver::new("T1").unwrap();
        let provider = TenantIdProvider::from_resolver(&resolver, &ScopeHints::default()).unwrap();
        assert_eq!(provider.tenant_id(), "T1");
    }
}
