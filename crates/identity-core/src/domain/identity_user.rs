//! User records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use identity_shared::{new_id, new_stamp};

use super::normalizer::{LookupNormalizer, UpperInvariantLookupNormalizer};
use super::record::{TenantKey, TenantScoped, UserRecord};

/// Base identity user, unaware of tenants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityUser<K> {
    pub id: K,
    pub user_name: Option<String>,
    pub normalized_user_name: Option<String>,
    pub email: Option<String>,
    pub normalized_email: Option<String>,
    pub email_confirmed: bool,
    pub password_hash: Option<String>,
    pub security_stamp: Option<String>,
    pub concurrency_stamp: Option<String>,
    pub phone_number: Option<String>,
    pub phone_number_confirmed: bool,
    pub two_factor_enabled: bool,
    pub lockout_end: Option<DateTime<Utc>>,
    pub lockout_enabled: bool,
    pub access_failed_count: i32,
}

impl<K> IdentityUser<K> {
    pub fn with_id(id: K, user_name: impl Into<String>) -> Self {
        let user_name = user_name.into();
        Self {
            id,
            normalized_user_name: Some(UpperInvariantLookupNormalizer.normalize_name(&user_name)),
            user_name: Some(user_name),
            email: None,
            normalized_email: None,
            email_confirmed: false,
            password_hash: None,
            security_stamp: Some(new_stamp()),
            concurrency_stamp: Some(new_stamp()),
            phone_number: None,
            phone_number_confirmed: false,
            two_factor_enabled: false,
            lockout_end: None,
            lockout_enabled: true,
            access_failed_count: 0,
        }
    }

    /// Sets the email and its normalized lookup key.
    pub fn set_email(&mut self, email: impl Into<String>, normalizer: &dyn LookupNormalizer) {
        let email = email.into();
        self.normalized_email = Some(normalizer.normalize_email(&email));
        self.email = Some(email);
    }
}

/// Identity user partitioned by tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiTenantUser<K, T> {
    #[serde(flatten)]
    pub identity: IdentityUser<K>,
    pub tenant_id: Option<T>,
}

impl<K, T> MultiTenantUser<K, T> {
    pub fn with_id(id: K, user_name: impl Into<String>) -> Self {
        Self {
            identity: IdentityUser::with_id(id, user_name),
            tenant_id: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.identity.set_email(email, &UpperInvariantLookupNormalizer);
        self
    }

    /// Pre-assigns a tenant. Stores overwrite it with their own on create.
    pub fn with_tenant(mut self, tenant_id: T) -> Self {
        self.tenant_id = Some(tenant_id);
        self
    }
}

impl<T> MultiTenantUser<Uuid, T> {
    pub fn new(user_name: impl Into<String>) -> Self {
        Self::with_id(new_id(), user_name)
    }
}

impl<K, T> TenantScoped for MultiTenantUser<K, T>
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

impl<K, T> UserRecord for MultiTenantUser<K, T>
where
    K: Clone + std::fmt::Debug + Send + Sync + 'static,
    T: TenantKey,
{
    fn user_name(&self) -> Option<&str> {
        self.identity.user_name.as_deref()
    }

    fn normalized_user_name(&self) -> Option<&str> {
        self.identity.normalized_user_name.as_deref()
    }

    fn email(&self) -> Option<&str> {
        self.identity.email.as_deref()
    }

    fn normalized_email(&self) -> Option<&str> {
        self.identity.normalized_email.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type User = MultiTenantUser<Uuid, String>;

    #[test]
    fn test_new_user_normalizes_keys() {
        let user = User::new("alice").with_email("a@x.com");
        assert_eq!(user.normalized_user_name(), Some("ALICE"));
        assert_eq!(user.normalized_email(), Some("A@X.COM"));
        assert!(user.tenant_id().is_none());
    }

    #[test]
    fn test_tenant_scoping() {
        let mut user = User::new("carol").with_tenant("ignored".to_string());
        assert!(user.belongs_to(&"ignored".to_string()));
        user.set_tenant_id("T1".to_string());
        assert!(user.belongs_to(&"T1".to_string()));
        assert!(!user.belongs_to(&"T2".to_string()));
    }

    #[test]
    fn test_serde_flattens_identity() {
        let user = User::new("dave").with_tenant("T1".to_string());
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["user_name"], "dave");
        assert_eq!(json["tenant_id"], "T1");
    }
}
