use std::sync::Arc;

use super::{Solver, SolverRun};
use crate::comparator::{ParetoRankAndCrowdingComparator, SolutionComparator};
use crate::context::ExecutionContext;
use crate::domain::{ContinuousDomain, Domain};
use crate::mutation::{Mutation, PolynomialMutation, sbx_crossover};
use crate::sampler::sample_uniform;
use crate::solution::Solution;
use crate::solution_set::SolutionSet;
use crate::{Error, Result};

/// NSGA-II over a continuous box.
///
/// `configure` samples and evaluates a random population (seeded with the
/// run's initial solution, if any). Each iteration is one generation:
///
/// 1. parents are picked by binary tournament on Pareto rank, then crowding distance
/// 2. pairs are recombined by SBX with probability `crossover_probability`
/// 3. each child goes through polynomial mutation and is evaluated
/// 4. parents and children are merged and the best `population_size` survive
#[derive(Debug)]
pub struct Nsga2Solver {
    population_size: usize,
    crossover_probability: f64,
    crossover_eta: f64,
    mutation: PolynomialMutation,
    population: Option<SolutionSet>,
}

impl Nsga2Solver {
    /// Crossover probability 0.9, SBX index 20 and polynomial mutation
    /// with index 20 at rate `1/n`.
    #[must_use]
    pub fn new(population_size: usize) -> Self {
        Self {
            population_size,
            crossover_probability: 0.9,
            crossover_eta: 20.0,
            mutation: PolynomialMutation::default(),
            population: None,
        }
    }

    #[must_use]
    pub fn crossover_probability(mut self, p: f64) -> Self {
        self.crossover_probability = p.clamp(0.0, 1.0);
        self
    }

    #[must_use]
    pub fn crossover_eta(mut self, eta: f64) -> Self {
        self.crossover_eta = eta;
        self
    }

    #[must_use]
    pub fn mutation(mut self, mutation: PolynomialMutation) -> Self {
        self.mutation = mutation;
        self
    }

    /// The current parent population.
    #[must_use]
    pub fn population(&self) -> Option<&SolutionSet> {
        self.population.as_ref()
    }

    fn continuous(domain: &Domain) -> Result<&ContinuousDomain> {
        match domain {
            Domain::Continuous(d) => Ok(d),
            other => Err(Error::DomainMismatch {
                expected: "continuous",
                got: other.kind(),
            }),
        }
    }
}

/// Winner of a binary tournament between two random members.
fn tournament(
    ctx: &mut ExecutionContext,
    comparator: &ParetoRankAndCrowdingComparator,
    n: usize,
) -> Result<usize> {
    let a = ctx.sample_index(n)?;
    let b = ctx.sample_index(n)?;
    Ok(if comparator.compare(b, a).is_lt() { b } else { a })
}

impl Solver for Nsga2Solver {
    fn name(&self) -> &'static str {
        "nsga2"
    }

    fn configure(&mut self, ctx: &mut ExecutionContext, run: &mut SolverRun<'_>) -> Result<()> {
        if self.population_size < 2 {
            return Err(Error::InvalidConfig(format!(
                "NSGA-II needs a population of at least 2, got {}",
                self.population_size
            )));
        }
        let problem = run.problem();
        let domain = problem.domain();
        Self::continuous(domain)?;

        let mut population = SolutionSet::new(Arc::clone(problem.limits()));
        let seed = run.initial_solution().cloned();
        for i in 0..self.population_size {
            if run.should_stop(ctx) {
                break;
            }
            let candidate = match (&seed, i) {
                (Some(s), 0) => s.clone(),
                _ => sample_uniform(ctx, domain, 0.0)?,
            };
            let fitness = run.evaluate(ctx, &candidate)?;
            population.insert_solution(candidate, fitness)?;
        }
        trace_debug!(size = population.len(), "initial population evaluated");
        self.population = Some(population);
        Ok(())
    }

    fn iteration(
        &mut self,
        ctx: &mut ExecutionContext,
        run: &mut SolverRun<'_>,
        _iteration: usize,
    ) -> Result<bool> {
        let problem = run.problem();
        let domain = problem.domain();
        let bounds = Self::continuous(domain)?;
        let population = self
            .population
            .take()
            .ok_or(Error::Internal("nsga2 iterated before configure"))?;
        if population.len() < 2 {
            self.population = Some(population);
            return Err(Error::Cancelled);
        }

        let mut ranking = ParetoRankAndCrowdingComparator::new();
        ranking.initialize(&population);

        let mut offspring = SolutionSet::new(Arc::clone(problem.limits()));
        let mut interrupted = false;
        'generation: while offspring.len() < self.population_size {
            let a = population.solution(tournament(ctx, &ranking, population.len())?).continuous()?;
            let b = population.solution(tournament(ctx, &ranking, population.len())?).continuous()?;
            let (c1, c2) = if ctx.sample_bool(self.crossover_probability) {
                sbx_crossover(ctx, bounds, a, b, self.crossover_eta)?
            } else {
                (a.to_vec(), b.to_vec())
            };
            for child in [c1, c2] {
                if offspring.len() == self.population_size {
                    break;
                }
                if run.should_stop(ctx) {
                    interrupted = true;
                    break 'generation;
                }
                let child = self.mutation.mutate(ctx, domain, &Solution::Continuous(child))?;
                let fitness = run.evaluate(ctx, &child)?;
                offspring.insert_solution(child, fitness)?;
            }
        }

        let mut merged = population;
        merged.insert_solutions(&offspring)?;
        let survivors =
            merged.select_n_bests(&mut ParetoRankAndCrowdingComparator::new(), self.population_size);
        trace_debug!(
            offspring = offspring.len(),
            front = survivors.pareto_front().len(),
            "generation finished"
        );
        self.population = Some(survivors);
        if interrupted {
            return Err(Error::Cancelled);
        }
        Ok(true)
    }
}
