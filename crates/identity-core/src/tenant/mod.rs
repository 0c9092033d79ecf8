//! Tenant provider and resolution

pub mod provider;
pub mod resolver;

pub use provider::TenantIdProvider;
pub use resolver::{
    resolver_from_settings, HeaderTenantResolver, HostTenantResolver, ScopeHints, StaticTenantResolver,
    TenantResolver,
};
