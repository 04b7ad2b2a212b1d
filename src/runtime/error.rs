//! Event loop error types.

use miette::Diagnostic;
use thiserror::Error;

use crate::future::FutureId;

/// Failure of the event loop itself (never of a future's computation)
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum RuntimeError {
    /// Nothing is left to run but the awaited future is still pending
    #[error("{future} can never settle: no tasks or timers remain")]
    #[diagnostic(
        code(E3001),
        help("a future stays pending unless something settles it; check that every initializer settles or schedules a timer")
    )]
    Stalled {
        /// The future that was being waited on
        future: FutureId,
    },

    /// More tasks ran than the configured budget allows
    #[error("task budget of {budget} exhausted with {queued} task(s) still queued")]
    #[diagnostic(
        code(E3002),
        help("raise `task_budget` under [runtime] if the work is legitimate")
    )]
    BudgetExhausted {
        /// Configured budget
        budget: usize,
        /// Microtasks left in the queue when the budget ran out
        queued: usize,
    },
}

impl RuntimeError {
    /// Stable diagnostic code for this error
    pub fn code(&self) -> &'static str {
        use crate::diagnostics::error_codes::runtime;
        match self {
            RuntimeError::Stalled { .. } => runtime::STALLED,
            RuntimeError::BudgetExhausted { .. } => runtime::BUDGET_EXHAUSTED,
        }
    }
}
