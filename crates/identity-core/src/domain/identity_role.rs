//! Role records

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use identity_shared::{new_id, new_stamp};

use super::normalizer::{LookupNormalizer, UpperInvariantLookupNormalizer};
use super::record::{RoleRecord, TenantKey, TenantScoped};

/// Base identity role, unaware of tenants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRole<K> {
    pub id: K,
    pub name: Option<String>,
    pub normalized_name: Option<String>,
    pub concurrency_stamp: Option<String>,
}

impl<K> IdentityRole<K> {
    pub fn with_id(id: K, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id,
            normalized_name: Some(UpperInvariantLookupNormalizer.normalize_name(&name)),
            name: Some(name),
            concurrency_stamp: Some(new_stamp()),
        }
    }
}

/// Identity role partitioned by tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiTenantRole<K, T> {
    #[serde(flatten)]
    pub identity: IdentityRole<K>,
    pub tenant_id: Option<T>,
}

impl<K, T> MultiTenantRole<K, T> {
    pub fn with_id(id: K, name: impl Into<String>) -> Self {
        Self {
            identity: IdentityRole::with_id(id, name),
            tenant_id: None,
        }
    }

    pub fn with_tenant(mut self, tenant_id: T) -> Self {
        self.tenant_id = Some(tenant_id);
        self
    }
}

impl<T> MultiTenantRole<Uuid, T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(new_id(), name)
    }
}

impl<K, T> TenantScoped for MultiTenantRole<K, T>
where
    T: TenantKey,
{
    type Tenant = T;

    fn tenant_id(&self) -> Option<&T> {
        self.tenant_id.as_ref()
    }

    fn set_tenant_id(&mut self, tenant_id: T) {
        self.tenant_id = Some(tenant_id);
    }
}

impl<K, T> RoleRecord for MultiTenantRole<K, T>
where
    K: Clone + std::fmt::Debug + Send + Sync + 'static,
    T: TenantKey,
{
    fn name(&self) -> Option<&str> {
        self.identity.name.as_deref()
    }

    fn normalized_name(&self) -> Option<&str> {
        self.identity.normalized_name.as_deref()
    }
}
