//! Application-wide constants

pub const DEFAULT_TENANT_ID: &str = "TenantId-1";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 3;
pub const LOG_FILE_PREFIX: &str = "identity.log";
