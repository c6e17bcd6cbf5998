//! Per-call planning state.

use crate::error::ToolpathResult;
use pocketkit_core::CancellationToken;

/// Explicit state threaded through every planner call.
///
/// Planners never keep state between calls, so one context (or clones of it)
/// can drive any number of concurrent planning jobs.
#[derive(Debug, Clone)]
pub struct PlanContext {
    /// Length units per millimetre; scales the fixed scan tolerances.
    pub units: f64,
    pub cancel: CancellationToken,
}

impl PlanContext {
    pub fn new(units: f64) -> Self {
        Self {
            units,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// `1 / units`, guarding against a zero or non-finite unit factor.
    pub fn one_over_units(&self) -> f64 {
        if self.units.is_finite() && self.units > 0.0 {
            1.0 / self.units
        } else {
            1.0
        }
    }

    pub fn check_cancelled(&self) -> ToolpathResult<()> {
        Ok(self.cancel.check()?)
    }
}

impl Default for PlanContext {
    fn default() -> Self {
        Self::new(1.0)
    }
}
