//! Active → Disposed lifecycle shared by every store.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::StoreError;

#[derive(Debug)]
pub(crate) struct Lifecycle {
    store: &'static str,
    disposed: AtomicBool,
}

impl Lifecycle {
    pub(crate) fn new(store: &'static str) -> Self {
        Self { store, disposed: AtomicBool::new(false) }
    }

    /// Precondition for every public operation: cancellation first, then disposal.
    pub(crate) fn ensure_active(&self, cancel: &CancellationToken) -> Result<(), StoreError> {
        if cancel.is_cancelled() {
            warn!(store = self.store, "Operation cancelled before execution");
            return Err(StoreError::Cancelled);
        }
        if self.is_disposed() {
            warn!(store = self.store, "Operation attempted on disposed store");
            return Err(StoreError::Disposed(self.store));
        }
        Ok(())
    }

    pub(crate) fn dispose(&self) {
        self.disposed.store(true, Ordering::Release);
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}
