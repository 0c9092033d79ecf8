//! Context double for unit tests.

use async_trait::async_trait;
use mockall::mock;

use crate::application::{ApplicationRole, ApplicationUser};
use crate::error::PersistenceError;
use crate::query::Query;
use crate::repositories::IdentityContext;

mock! {
    pub Context {}

    #[async_trait]
    impl IdentityContext for Context {
        type User = ApplicationUser;
        type Role = ApplicationRole;

        async fn first_user(&self, query: &Query<String>) -> Result<Option<ApplicationUser>, PersistenceError>;
        async fn first_role(&self, query: &Query<String>) -> Result<Option<ApplicationRole>, PersistenceError>;
        async fn add_user(&self, user: ApplicationUser);
        async fn add_role(&self, role: ApplicationRole);
        async fn save_changes(&self) -> Result<usize, PersistenceError>;
        async fn pending_changes(&self) -> usize;
    }
}
