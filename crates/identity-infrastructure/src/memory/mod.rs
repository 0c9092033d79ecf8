//! In-process persistence context

pub mod in_memory_context;

pub use in_memory_context::InMemoryIdentityContext;
