//! Store errors

use thiserror::Error;

/// Failure reported by the persistence context.
///
/// The tenant layer never inspects or rewrites these; they reach the caller
/// exactly as the context produced them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    #[error("Null value in column {column} violates not-null constraint")]
    NotNullViolation { column: String },

    #[error("Optimistic concurrency failure")]
    Concurrency,

    #[error("Database error: {0}")]
    Database(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("Cannot access a disposed object: {0}")]
    Disposed(&'static str),

    #[error("Operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl StoreError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, StoreError::Cancelled)
    }

    pub fn is_disposed(&self) -> bool {
        matches!(self, StoreError::Disposed(_))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Tenant id must not be blank")]
    Blank,

    #[error("No tenant configured for host: {0}")]
    UnknownHost(String),

    #[error("Scope hint missing: {0}")]
    MissingHint(&'static str),
}
