//! Tenant resolution for a unit of work.

use std::collections::HashMap;

use tracing::debug;

use identity_shared::config::{TenancySettings, TenantResolution};
use identity_shared::utils::is_blank;

use crate::error::ResolveError;

/// What the host of a unit of work knows about it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeHints {
    pub host: Option<String>,
    pub tenant_header: Option<String>,
}

impl ScopeHints {
    pub fn for_host(host: impl Into<String>) -> Self {
        Self { host: Some(host.into()), ..Default::default() }
    }

    pub fn for_header(value: impl Into<String>) -> Self {
        Self { tenant_header: Some(value.into()), ..Default::default() }
    }
}

pub trait TenantResolver<T>: Send + Sync {
    fn resolve(&self, hints: &ScopeHints) -> Result<T, ResolveError>;
}

fn non_blank(value: &str) -> Result<String, ResolveError> {
    if is_blank(value) {
        Err(ResolveError::Blank)
    } else {
        Ok(value.trim().to_string())
    }
}

/// Always resolves to one tenant chosen at deployment time.
#[derive(Debug, Clone)]
pub struct StaticTenantResolver {
    tenant_id: String,
}

impl StaticTenantResolver {
    pub fn new(tenant_id: impl AsRef<str>) -> Result<Self, ResolveError> {
        Ok(Self { tenant_id: non_blank(tenant_id.as_ref())? })
    }
}

impl TenantResolver<String> for StaticTenantResolver {
    fn resolve(&self, _hints: &ScopeHints) -> Result<String, ResolveError> {
        Ok(self.tenant_id.clone())
    }
}

/// Drops a trailing `:port`. Bracketed IPv6 literals keep their brackets,
/// and a bare IPv6 address is returned unchanged.
fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        return host.find(']').map_or(host, |end| &host[..=end]);
    }
    match host.rsplit_once(':') {
        Some((name, port)) if !name.contains(':') && port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}

/// Maps the host name of a unit of work to a tenant.
#[derive(Debug, Clone)]
pub struct HostTenantResolver {
    hosts: HashMap<String, String>,
    fallback: Option<String>,
}

impl HostTenantResolver {
    pub fn new(hosts: HashMap<String, String>, fallback: Option<String>) -> Result<Self, ResolveError> {
        let hosts = hosts
            .into_iter()
            .map(|(host, tenant)| non_blank(&tenant).map(|tenant| (host.to_ascii_lowercase(), tenant)))
            .collect::<Result<HashMap<_, _>, ResolveError>>()?;
        let fallback = fallback.as_deref().map(non_blank).transpose()?;
        Ok(Self { hosts, fallback })
    }
}

impl TenantResolver<String> for HostTenantResolver {
    fn resolve(&self, hints: &ScopeHints) -> Result<String, ResolveError> {
        let Some(host) = hints.host.as_deref() else {
            return self.fallback.clone().ok_or(ResolveError::MissingHint("host"));
        };
        let host = strip_port(host).to_ascii_lowercase();
        match self.hosts.get(&host) {
            Some(tenant) => Ok(tenant.clone()),
            None => {
                debug!("No tenant mapped for host {}, using fallback", host);
                self.fallback.clone().ok_or(ResolveError::UnknownHost(host))
            }
        }
    }
}

/// Reads the tenant from a caller-supplied header value.
#[derive(Debug, Clone, Default)]
pub struct HeaderTenantResolver;

impl TenantResolver<String> for HeaderTenantResolver {
    fn resolve(&self, hints: &ScopeHints) -> Result<String, ResolveError> {
        let value = hints.tenant_header.as_deref().ok_or(ResolveError::MissingHint("tenant header"))?;
        non_blank(value)
    }
}

/// Builds the resolver selected by configuration.
pub fn resolver_from_settings(
    settings: &TenancySettings,
) -> Result<Box<dyn TenantResolver<String>>, ResolveError> {
    let resolver: Box<dyn TenantResolver<String>> = match settings.resolution {
        TenantResolution::Static => Box::new(StaticTenantResolver::new(&settings.tenant_id)?),
        TenantResolution::Host => Box::new(HostTenantResolver::new(
            settings.hosts.clone(),
            settings.fallback_tenant.clone(),
        )?),
        TenantResolution::Header => Box::new(HeaderTenantResolver),
    };
    Ok(resolver)
}
