//! Cooperative cancellation shared between a planner and its caller.

use crate::error::{CoreError, CoreResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable flag checked by long-running planners between iterations.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. All clones observe it.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Returns `Err(CoreError::Cancelled)` once cancellation was requested.
    pub fn check(&self) -> CoreResult<()> {
        if self.is_cancelled() {
            Err(CoreError::Cancelled)
        } else {
            Ok(())
        }
    }
}
