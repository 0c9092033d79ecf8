//! Base user store over a persistence context.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use validator::ValidateEmail;

use identity_shared::utils::{is_blank, mask_email};

use crate::domain::{IdentityErrorDescriber, IdentityResult, TenantOf, UserRecord};
use crate::error::{PersistenceError, StoreError};
use crate::query::Query;
use crate::repositories::{IdentityContext, QueryableUserStore, UserStore};

use super::lifecycle::Lifecycle;

/// Tenant-unaware user store: lookups use the base predicate only.
pub struct EntityUserStore<C: IdentityContext> {
    context: Arc<C>,
    describer: IdentityErrorDescriber,
    auto_save_changes: bool,
    lifecycle: Lifecycle,
}

impl<C: IdentityContext> EntityUserStore<C> {
    pub fn new(context: Arc<C>) -> Self {
        Self::with_describer(context, IdentityErrorDescriber)
    }

    pub fn with_describer(context: Arc<C>, describer: IdentityErrorDescriber) -> Self {
        Self {
            context,
            describer,
            auto_save_changes: true,
            lifecycle: Lifecycle::new("EntityUserStore"),
        }
    }

    /// When disabled, `create` only registers the user; the caller commits.
    pub fn with_auto_save_changes(mut self, auto_save_changes: bool) -> Self {
        self.auto_save_changes = auto_save_changes;
        self
    }

    pub fn auto_save_changes(&self) -> bool {
        self.auto_save_changes
    }

    pub fn context(&self) -> &Arc<C> {
        &self.context
    }

    pub async fn save_changes(&self, cancel: &CancellationToken) -> Result<usize, StoreError> {
        self.lifecycle.ensure_active(cancel)?;
        self.context.save_changes().await.map_err(|e| {
            error!("Database error saving users: {}", e);
            StoreError::from(e)
        })
    }
}

fn validate_user<U: UserRecord>(user: &U) -> Result<(), StoreError> {
    if user.user_name().map_or(true, is_blank) {
        return Err(StoreError::InvalidArgument("user"));
    }
    if user.email().is_some_and(|email| !email.validate_email()) {
        return Err(StoreError::InvalidArgument("email"));
    }
    Ok(())
}

#[async_trait]
impl<C: IdentityContext> UserStore for EntityUserStore<C> {
    type User = C::User;

    async fn create(&self, user: Self::User, cancel: &CancellationToken) -> Result<IdentityResult, StoreError> {
        self.lifecycle.ensure_active(cancel)?;
        validate_user(&user)?;

        info!(
            "Creating user {} ({})",
            user.user_name().unwrap_or_default(),
            user.email().map(mask_email).unwrap_or_default()
        );
        self.context.add_user(user).await;
        if !self.auto_save_changes {
            return Ok(IdentityResult::Success);
        }

        match self.save_changes(cancel).await {
            Ok(_) => Ok(IdentityResult::Success),
            Err(StoreError::Persistence(PersistenceError::Concurrency)) => {
                Ok(IdentityResult::failed([self.describer.concurrency_failure()]))
            }
            Err(e) => Err(e),
        }
    }

    async fn find_by_name(
        &self,
        normalized_user_name: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<Self::User>, StoreError> {
        self.first_user(&Query::user_name(normalized_user_name), cancel).await
    }

    async fn find_by_email(
        &self,
        normalized_email: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<Self::User>, StoreError> {
        self.first_user(&Query::email(normalized_email), cancel).await
    }

    fn dispose(&self) {
        self.lifecycle.dispose();
    }

    fn is_disposed(&self) -> bool {
        self.lifecycle.is_disposed()
    }
}

#[async_trait]
impl<C: IdentityContext> QueryableUserStore for EntityUserStore<C> {
    async fn first_user(
        &self,
        query: &Query<TenantOf<Self::User>>,
        cancel: &CancellationToken,
    ) -> Result<Option<Self::User>, StoreError> {
        self.lifecycle.ensure_active(cancel)?;
        debug!(?query, "Querying users");
        self.context.first_user(query).await.map_err(|e| {
            error!("Database error querying users: {}", e);
            StoreError::from(e)
        })
    }
}
