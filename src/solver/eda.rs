use std::sync::Arc;

use super::{Solver, SolverRun};
use crate::comparator::{ParetoRankAndCrowdingComparator, SolutionComparator};
use crate::context::ExecutionContext;
use crate::sampler::Sampler;
use crate::solution_set::SolutionSet;
use crate::{Error, Result};

/// Estimation-of-distribution search.
///
/// Each generation samples `population_size` candidates, evaluates them,
/// keeps the `n_best` according to the comparator and fits the sampler to
/// those. The sampler must support [`Sampler::learn`]; one that does not
/// fails the first generation.
pub struct EdaSolver {
    sampler: Box<dyn Sampler>,
    population_size: usize,
    n_best: usize,
    comparator: Box<dyn SolutionComparator>,
}

impl EdaSolver {
    /// Selects with [`ParetoRankAndCrowdingComparator`].
    #[must_use]
    pub fn new(sampler: Box<dyn Sampler>, population_size: usize, n_best: usize) -> Self {
        Self {
            sampler,
            population_size,
            n_best,
            comparator: Box::new(ParetoRankAndCrowdingComparator::new()),
        }
    }

    #[must_use]
    pub fn comparator(mut self, comparator: Box<dyn SolutionComparator>) -> Self {
        self.comparator = comparator;
        self
    }

    #[must_use]
    pub fn sampler(&self) -> &dyn Sampler {
        self.sampler.as_ref()
    }
}

impl core::fmt::Debug for EdaSolver {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EdaSolver")
            .field("sampler", &self.sampler.name())
            .field("population_size", &self.population_size)
            .field("n_best", &self.n_best)
            .field("comparator", &self.comparator.name())
            .finish()
    }
}

impl Solver for EdaSolver {
    fn name(&self) -> &'static str {
        "eda"
    }

    fn configure(&mut self, _ctx: &mut ExecutionContext, run: &mut SolverRun<'_>) -> Result<()> {
        if self.n_best == 0 || self.n_best > self.population_size {
            return Err(Error::InvalidConfig(format!(
                "EDA needs 1 <= n_best <= population_size, got n_best = {} and population_size = {}",
                self.n_best, self.population_size
            )));
        }
        self.sampler.initialize(run.problem().domain())
    }

    fn iteration(
        &mut self,
        ctx: &mut ExecutionContext,
        run: &mut SolverRun<'_>,
        _iteration: usize,
    ) -> Result<bool> {
        let mut population = SolutionSet::new(Arc::clone(run.problem().limits()));
        for _ in 0..self.population_size {
            if run.should_stop(ctx) {
                return Err(Error::Cancelled);
            }
            let candidate = self.sampler.sample(ctx)?;
            let fitness = run.evaluate(ctx, &candidate)?;
            population.insert_solution(candidate, fitness)?;
        }

        let elite = population.select_n_bests(self.comparator.as_mut(), self.n_best);
        trace_debug!(elite = elite.len(), "EDA selection");
        self.sampler.learn(ctx, elite.solutions())?;
        Ok(true)
    }
}
