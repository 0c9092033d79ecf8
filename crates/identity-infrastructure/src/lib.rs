//! # Identity Infrastructure
//! 
//! Persistence-context adapters (in-memory and PostgreSQL).

pub mod database;
pub mod memory;

pub use database::{create_pool, ensure_schema, PgIdentityContext};
pub use memory::InMemoryIdentityContext;
