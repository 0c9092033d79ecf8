//! # Identity Core - Domain Module
//! 
//! Identity records and the traits the stores rely on.

pub mod record;
pub mod normalizer;
pub mod identity_user;
pub mod identity_role;
pub mod identity_result;

pub use record::{TenantKey, TenantScoped, UserRecord, RoleRecord, TenantOf};
pub use normalizer::{LookupNormalizer, UpperInvariantLookupNormalizer};
pub use identity_user::{IdentityUser, MultiTenantUser};
pub use identity_role::{IdentityRole, MultiTenantRole};
pub use identity_result::{IdentityResult, IdentityError, IdentityErrorDescriber};
