//! In-memory identity context.
//!
//! Mirrors the PostgreSQL schema's rules: a record must carry a tenant, and
//! user names and role names are unique within a tenant. A failed commit
//! writes nothing and discards the pending set.

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use identity_core::domain::{RoleRecord, TenantOf, UserRecord};
use identity_core::error::PersistenceError;
use identity_core::query::Query;
use identity_core::repositories::IdentityContext;

use crate::database::schema::{ROLES_TENANT_NAME_UNIQUE, USERS_TENANT_USER_NAME_UNIQUE};

struct State<U, R> {
    users: Vec<U>,
    roles: Vec<R>,
    pending_users: Vec<U>,
    pending_roles: Vec<R>,
    commits: usize,
}

pub struct InMemoryIdentityContext<U, R> {
    state: Mutex<State<U, R>>,
}

impl<U, R> Default for InMemoryIdentityContext<U, R> {
    fn default() -> Self {
        Self {
            state: Mutex::new(State {
                users: Vec::new(),
                roles: Vec::new(),
                pending_users: Vec::new(),
                pending_roles: Vec::new(),
                commits: 0,
            }),
        }
    }
}

impl<U, R> InMemoryIdentityContext<U, R>
where
    U: UserRecord,
    R: RoleRecord<Tenant = TenantOf<U>>,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn users(&self) -> Vec<U> {
        self.state.lock().await.users.clone()
    }

    pub async fn roles(&self) -> Vec<R> {
        self.state.lock().await.roles.clone()
    }

    /// Number of successful commits so far.
    pub async fn commits(&self) -> usize {
        self.state.lock().await.commits
    }
}

fn same_key<T: PartialEq>(a: Option<T>, b: Option<T>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a == b)
}

fn check_users<U: UserRecord>(committed: &[U], pending: &[U]) -> Result<(), PersistenceError> {
    for (i, user) in pending.iter().enumerate() {
        if user.tenant_id().is_none() {
            return Err(PersistenceError::NotNullViolation { column: "tenant_id".into() });
        }
        let clash = committed.iter().chain(&pending[..i]).any(|other| {
            other.tenant_id() == user.tenant_id()
                && same_key(other.normalized_user_name(), user.normalized_user_name())
        });
        if clash {
            return Err(PersistenceError::UniqueViolation {
                constraint: USERS_TENANT_USER_NAME_UNIQUE.into(),
            });
        }
    }
    Ok(())
}

fn check_roles<R: RoleRecord>(committed: &[R], pending: &[R]) -> Result<(), PersistenceError> {
    for (i, role) in pending.iter().enumerate() {
        if role.tenant_id().is_none() {
            return Err(PersistenceError::NotNullViolation { column: "tenant_id".into() });
        }
        let clash = committed.iter().chain(&pending[..i]).any(|other| {
            other.tenant_id() == role.tenant_id() && same_key(other.normalized_name(), role.normalized_name())
        });
        if clash {
            return Err(PersistenceError::UniqueViolation {
                constraint: ROLES_TENANT_NAME_UNIQUE.into(),
            });
        }
    }
    Ok(())
}

#[async_trait]
impl<U, R> IdentityContext for InMemoryIdentityContext<U, R>
where
    U: UserRecord,
    R: RoleRecord<Tenant = TenantOf<U>>,
{
    type User = U;
    type Role = R;

    async fn first_user(&self, query: &Query<TenantOf<U>>) -> Result<Option<U>, PersistenceError> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|u| query.matches_user(*u)).cloned())
    }

    async fn first_role(&self, query: &Query<TenantOf<U>>) -> Result<Option<R>, PersistenceError> {
        let state = self.state.lock().await;
        Ok(state.roles.iter().find(|r| query.matches_role(*r)).cloned())
    }

    async fn add_user(&self, user: U) {
        self.state.lock().await.pending_users.push(user);
    }

    async fn add_role(&self, role: R) {
        self.state.lock().await.pending_roles.push(role);
    }

    async fn save_changes(&self) -> Result<usize, PersistenceError> {
        let mut state = self.state.lock().await;
        let pending_users = std::mem::take(&mut state.pending_users);
        let pending_roles = std::mem::take(&mut state.pending_roles);

        let checked = check_users(&state.users, &pending_users)
            .and_then(|_| check_roles(&state.roles, &pending_roles));
        if let Err(e) = checked {
            warn!("Commit rejected: {}", e);
            return Err(e);
        }

        let written = pending_users.len() + pending_roles.len();
        state.users.extend(pending_users);
        state.roles.extend(pending_roles);
        state.commits += 1;
        debug!(written, "Committed identity changes");
        Ok(written)
    }

    async fn pending_changes(&self) -> usize {
        let state = self.state.lock().await;
        state.pending_users.len() + state.pending_roles.len()
    }
}
