use super::{Solver, SolverRun};
use crate::context::ExecutionContext;
use crate::fitness::Fitness;
use crate::mutation::LocalSearchMutation;
use crate::solution::Solution;
use crate::{Error, Result};

/// Hill climbing from one starting candidate.
///
/// `configure` evaluates the run's initial solution (or one proposed by
/// the problem); every iteration then runs the wrapped
/// [`LocalSearchMutation`] from the current candidate. The current
/// candidate only changes on strict dominance, so its fitness never gets
/// worse over the run.
#[derive(Debug)]
pub struct LocalSearchSolver {
    local_search: LocalSearchMutation,
    current: Option<(Solution, Fitness)>,
}

impl LocalSearchSolver {
    #[must_use]
    pub fn new(local_search: LocalSearchMutation) -> Self {
        Self {
            local_search,
            current: None,
        }
    }

    /// The candidate the search currently stands on.
    #[must_use]
    pub fn current(&self) -> Option<(&Solution, &Fitness)> {
        self.current.as_ref().map(|(s, f)| (s, f))
    }
}

impl Solver for LocalSearchSolver {
    fn name(&self) -> &'static str {
        "local search"
    }

    fn configure(&mut self, ctx: &mut ExecutionContext, run: &mut SolverRun<'_>) -> Result<()> {
        let start = run.starting_solution(ctx)?;
        let fitness = run.evaluate(ctx, &start)?;
        trace_debug!(fitness = %fitness, "local search start");
        self.current = Some((start, fitness));
        Ok(())
    }

    fn iteration(
        &mut self,
        ctx: &mut ExecutionContext,
        run: &mut SolverRun<'_>,
        _iteration: usize,
    ) -> Result<bool> {
        let start = self
            .current
            .clone()
            .ok_or(Error::Internal("local search iterated before configure"))?;
        let problem = run.problem();
        let next = self
            .local_search
            .execute(ctx, problem.domain(), start, |ctx, candidate| {
                if problem.should_stop() || ctx.is_cancelled() {
                    return Err(Error::Cancelled);
                }
                run.evaluate(ctx, candidate)
            })?;
        self.current = Some(next);
        Ok(true)
    }
}
