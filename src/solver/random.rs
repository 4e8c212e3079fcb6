use super::{Solver, SolverRun};
use crate::Result;
use crate::context::ExecutionContext;
use crate::sampler::Sampler;

/// Draws one candidate per iteration from a sampler and evaluates it.
#[derive(Clone)]
pub struct RandomSolver {
    sampler: Box<dyn Sampler>,
}

impl RandomSolver {
    #[must_use]
    pub fn new(sampler: Box<dyn Sampler>) -> Self {
        Self { sampler }
    }

    #[must_use]
    pub fn sampler(&self) -> &dyn Sampler {
        self.sampler.as_ref()
    }
}

impl core::fmt::Debug for RandomSolver {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RandomSolver")
            .field("sampler", &self.sampler.name())
            .finish()
    }
}

impl Solver for RandomSolver {
    fn name(&self) -> &'static str {
        "random"
    }

    fn configure(&mut self, _ctx: &mut ExecutionContext, run: &mut SolverRun<'_>) -> Result<()> {
        self.sampler.initialize(run.problem().domain())
    }

    fn iteration(
        &mut self,
        ctx: &mut ExecutionContext,
        run: &mut SolverRun<'_>,
        _iteration: usize,
    ) -> Result<bool> {
        let candidate = self.sampler.sample(ctx)?;
        run.evaluate(ctx, &candidate)?;
        Ok(true)
    }
}
