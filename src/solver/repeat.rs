use super::{RunStatus, SolveOptions, Solver, SolverRun, solve};
use crate::context::ExecutionContext;
use crate::{Error, Result};

/// Restarts an inner solver once per iteration and accumulates every
/// restart's evaluations.
///
/// Each restart is a full [`solve`] call with a fresh set; its results are
/// merged without de-duplication. An inner run that stops or fails ends
/// the outer run the same way, after its partial results are merged.
pub struct RepeatSolver {
    inner: Box<dyn Solver>,
    inner_iterations: Option<usize>,
}

impl RepeatSolver {
    /// `inner_iterations` is the budget of each restart; `None` uses the
    /// inner solver's default.
    #[must_use]
    pub fn new(inner: Box<dyn Solver>, inner_iterations: Option<usize>) -> Self {
        Self {
            inner,
            inner_iterations,
        }
    }
}

impl core::fmt::Debug for RepeatSolver {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RepeatSolver")
            .field("inner", &self.inner.name())
            .field("inner_iterations", &self.inner_iterations)
            .finish()
    }
}

impl Solver for RepeatSolver {
    fn name(&self) -> &'static str {
        "repeat"
    }

    fn iteration(
        &mut self,
        ctx: &mut ExecutionContext,
        run: &mut SolverRun<'_>,
        _iteration: usize,
    ) -> Result<bool> {
        let mut options = SolveOptions::new();
        if let Some(n) = self.inner_iterations {
            options = options.max_iterations(n);
        }
        if let Some(s) = run.initial_solution() {
            options = options.initial_solution(s.clone());
        }
        let outcome = solve(self.inner.as_mut(), ctx, run.problem(), options)?;
        run.merge(ctx, &outcome.solutions)?;
        match outcome.status {
            RunStatus::Completed => Ok(true),
            RunStatus::Stopped => Err(Error::Cancelled),
            RunStatus::Failed => Err(outcome
                .error
                .unwrap_or(Error::Internal("inner run failed without an error"))),
        }
    }
}
