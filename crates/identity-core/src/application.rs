//! Application-level instantiations: `Uuid` keys and `String` tenant ids.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{MultiTenantRole, MultiTenantUser};
use crate::repositories::IdentityContext;
use crate::stores::{EntityRoleStore, EntityUserStore, RoleStoreMultiTenant, UserStoreMultiTenant};
use crate::tenant::TenantIdProvider;

pub type ApplicationUser = MultiTenantUser<Uuid, String>;
pub type ApplicationRole = MultiTenantRole<Uuid, String>;
pub type ApplicationTenantIdProvider = TenantIdProvider<String>;

pub type ApplicationUserStore<C> = UserStoreMultiTenant<EntityUserStore<C>>;
pub type ApplicationRoleStore<C> = RoleStoreMultiTenant<EntityRoleStore<C>>;

/// Any persistence context holding the application records.
pub trait ApplicationContext: IdentityContext<User = ApplicationUser, Role = ApplicationRole> {}

impl<C> ApplicationContext for C where C: IdentityContext<User = ApplicationUser, Role = ApplicationRole> {}

pub fn application_user_store<C: ApplicationContext>(
    context: Arc<C>,
    provider: &ApplicationTenantIdProvider,
) -> ApplicationUserStore<C> {
    UserStoreMultiTenant::new(EntityUserStore::new(context), provider)
}

pub fn application_role_store<C: ApplicationContext>(
    context: Arc<C>,
    provider: &ApplicationTenantIdProvider,
) -> ApplicationRoleStore<C> {
    RoleStoreMultiTenant::new(EntityRoleStore::new(context), provider)
}
