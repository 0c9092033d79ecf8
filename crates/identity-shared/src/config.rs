//! Configuration management

use std::collections::HashMap;

use config::{Config, Environment, File};
use serde::Deserialize;
use tracing::warn;

use crate::constants::{DEFAULT_MAX_CONNECTIONS, DEFAULT_TENANT_ID};
use crate::error::AppError;
use crate::utils::is_blank;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub app: AppSettings,
    pub database: DatabaseSettings,
    pub tenancy: TenancySettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub env: String,
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

/// How the tenant of a unit of work is determined.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TenantResolution {
    /// One literal tenant id per deployed instance.
    #[default]
    Static,
    /// Tenant looked up from the host name of the unit of work.
    Host,
    /// Tenant taken from a caller-supplied header value.
    Header,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TenancySettings {
    #[serde(default)]
    pub resolution: TenantResolution,
    pub tenant_id: String,
    /// Host name to tenant id table, used by [`TenantResolution::Host`].
    #[serde(default)]
    pub hosts: HashMap<String, String>,
    #[serde(default)]
    pub fallback_tenant: Option<String>,
    #[serde(default = "default_auto_save")]
    pub auto_save_changes: bool,
    /// Role names created for the configured tenant at bootstrap.
    #[serde(default)]
    pub seed_roles: Vec<String>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoggingSettings {
    #[serde(default)]
    pub format: LogFormat,
    /// When set, logs are also written to a daily rolling file in this directory.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_auto_save() -> bool {
    true
}

impl AppConfig {
    pub fn load() -> Result<Self, AppError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let config = Config::builder()
            .set_default("app.env", "development")?
            .set_default("app.name", "identity-bootstrap")?
            .set_default("database.max_connections", DEFAULT_MAX_CONNECTIONS)?
            .set_default("tenancy.tenant_id", DEFAULT_TENANT_ID)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::default().separator("__").try_parsing(true))
            .build()?;
        let config: AppConfig = config.try_deserialize()?;
        config.tenancy.validate()?;
        Ok(config)
    }

    pub fn from_config(config: Config) -> Result<Self, AppError> {
        let config: AppConfig = config.try_deserialize().map_err(AppError::from)?;
        config.tenancy.validate()?;
        Ok(config)
    }
}

impl TenancySettings {
    /// Rejects settings that would hand a blank tenant id to a unit of work.
    pub fn validate(&self) -> Result<(), AppError> {
        self.rejection().map_or(Ok(()), |reason| {
            warn!(resolution = ?self.resolution, "Rejected tenancy settings: {}", reason);
            Err(AppError::TenancyConfig(reason))
        })
    }

    fn rejection(&self) -> Option<String> {
        if self.resolution == TenantResolution::Static && is_blank(&self.tenant_id) {
            return Some("tenant_id must not be blank".into());
        }
        if self.resolution == TenantResolution::Host && self.hosts.is_empty() && self.fallback_tenant.is_none() {
            return Some("host resolution needs at least one host or a fallback tenant".into());
        }
        if let Some((host, _)) = self.hosts.iter().find(|(_, tenant)| is_blank(tenant)) {
            return Some(format!("host {} maps to a blank tenant", host));
        }
        if self.fallback_tenant.as_deref().is_some_and(is_blank) {
            return Some("fallback_tenant must not be blank".into());
        }
        None
    }
}
