//! # Identity Core
//! 
//! Tenant-scoped identity stores: records, tenant provider, store contracts,
//! and the decorators that confine a base store to one tenant.

pub mod domain;
pub mod error;
pub mod query;
pub mod repositories;
pub mod stores;
pub mod tenant;
pub mod scope;
pub mod application;

#[cfg(test)]
pub(crate) mod testing;

// Re-export domain entities
pub use domain::*;
pub use error::{StoreError, PersistenceError, ResolveError};
pub use query::{Query, Predicate};
pub use scope::IdentityScope;
pub use tokio_util::sync::CancellationToken;
