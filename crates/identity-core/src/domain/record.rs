//! Record traits shared by every identity entity the stores persist.

use std::fmt::Debug;

/// Opaque, equality-comparable tenant identifier.
pub trait TenantKey: Clone + Eq + Debug + Send + Sync + 'static {}

impl<T> TenantKey for T where T: Clone + Eq + Debug + Send + Sync + 'static {}

/// A record partitioned by tenant.
pub trait TenantScoped {
    type Tenant: TenantKey;

    fn tenant_id(&self) -> Option<&Self::Tenant>;

    fn set_tenant_id(&mut self, tenant_id: Self::Tenant);

    fn belongs_to(&self, tenant: &Self::Tenant) -> bool {
        self.tenant_id() == Some(tenant)
    }
}

pub trait UserRecord: TenantScoped + Clone + Debug + Send + Sync + 'static {
    fn user_name(&self) -> Option<&str>;
    fn normalized_user_name(&self) -> Option<&str>;
    fn email(&self) -> Option<&str>;
    fn normalized_email(&self) -> Option<&str>;
}

pub trait RoleRecord: TenantScoped + Clone + Debug + Send + Sync + 'static {
    fn name(&self) -> Option<&str>;
    fn normalized_name(&self) -> Option<&str>;
}

/// Tenant type carried by a record.
pub type TenantOf<R> = <R as TenantScoped>::Tenant;
