//! PostgreSQL persistence context

pub mod identity_context_impl;

pub use identity_context_impl::PgIdentityContext;
