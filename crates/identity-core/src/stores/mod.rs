//! Store implementations

mod lifecycle;
pub mod entity_user_store;
pub mod entity_role_store;
pub mod user_store_multi_tenant;
pub mod role_store_multi_tenant;

pub use entity_user_store::EntityUserStore;
pub use entity_role_store::EntityRoleStore;
pub use user_store_multi_tenant::UserStoreMultiTenant;
pub use role_store_multi_tenant::RoleStoreMultiTenant;
