//! Outcome of a store mutation

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityError {
    pub code: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentityResult {
    Success,
    Failed(Vec<IdentityError>),
}

impl IdentityResult {
    pub fn failed(errors: impl IntoIterator<Item = IdentityError>) -> Self {
        IdentityResult::Failed(errors.into_iter().collect())
    }

    pub fn succeeded(&self) -> bool {
        matches!(self, IdentityResult::Success)
    }

    pub fn errors(&self) -> &[IdentityError] {
        match self {
            IdentityResult::Success => &[],
            IdentityResult::Failed(errors) => errors,
        }
    }
}

/// Builds the [`IdentityError`] values stores report.
#[derive(Debug, Clone, Default)]
pub struct IdentityErrorDescriber;

impl IdentityErrorDescriber {
    pub fn concurrency_failure(&self) -> IdentityError {
        IdentityError {
            code: "ConcurrencyFailure".into(),
            description: "Optimistic concurrency failure, object has been modified.".into(),
        }
    }
}
