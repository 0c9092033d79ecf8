//! Persistence and store traits (ports)

pub mod identity_context;
pub mod store;

pub use identity_context::IdentityContext;
pub use store::{UserStore, RoleStore, QueryableUserStore, QueryableRoleStore};
