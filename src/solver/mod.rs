//! Iterative solvers and the driver that runs them.
//!
//! A [`Solver`] only describes one iteration; [`solve`] owns the control
//! loop: it configures the solver, then repeatedly checks the iteration
//! budget and the cooperative stop probes ([`Problem::should_stop`] and
//! the context's cancellation token) before calling
//! [`Solver::iteration`]. Every evaluation goes through
//! [`SolverRun::evaluate`], which records the result and notifies the
//! registered [`SolverCallback`]s.
//!
//! ```
//! use moosolver::benchmark;
//! use moosolver::context::ExecutionContext;
//! use moosolver::sampler::UniformSampler;
//! use moosolver::solver::{RandomSolver, RunStatus, SolveOptions, solve};
//!
//! let problem = benchmark::sphere(2, 5.0).unwrap();
//! let mut solver = RandomSolver::new(Box::new(UniformSampler::new()));
//! let mut ctx = ExecutionContext::with_seed(7);
//!
//! let outcome = solve(&mut solver, &mut ctx, &problem, SolveOptions::new().max_iterations(200)).unwrap();
//! assert_eq!(outcome.status, RunStatus::Completed);
//! assert_eq!(outcome.solutions.len(), 200);
//! ```
//!
//! A run that fails or is stopped still returns everything evaluated so
//! far; the set is then flagged with
//! [`SolutionSet::is_incomplete`](crate::solution_set::SolutionSet::is_incomplete).

mod callback;
mod eda;
mod local_search;
mod nsga2;
mod random;
mod repeat;
mod rollout;

pub use callback::{HyperVolumeTracker, SolverCallback};
pub use eda::EdaSolver;
pub use local_search::LocalSearchSolver;
pub use nsga2::Nsga2Solver;
pub use random::RandomSolver;
pub use repeat::RepeatSolver;
pub use rollout::{NestedRolloutSolver, RolloutSolver};

use std::sync::Arc;

use crate::context::ExecutionContext;
use crate::fitness::Fitness;
use crate::problem::Problem;
use crate::solution::Solution;
use crate::solution_set::{ParetoFront, SolutionSet};
use crate::types::Verbosity;
use crate::{Error, Result};

/// One iterative search strategy.
pub trait Solver: Send {
    fn name(&self) -> &'static str;

    /// Prepares the solver for a run: binds samplers, evaluates a starting
    /// population, and so on.
    ///
    /// # Errors
    ///
    /// Any error aborts the run before its first iteration.
    fn configure(&mut self, _ctx: &mut ExecutionContext, _run: &mut SolverRun<'_>) -> Result<()> {
        Ok(())
    }

    /// Performs iteration number `iteration` (from 0). Returns `false` to
    /// end the run.
    ///
    /// # Errors
    ///
    /// [`Error::Cancelled`] ends the run as stopped; any other error ends
    /// it as failed.
    fn iteration(
        &mut self,
        ctx: &mut ExecutionContext,
        run: &mut SolverRun<'_>,
        iteration: usize,
    ) -> Result<bool>;

    /// Iteration budget used when [`SolveOptions`] sets none.
    fn default_iterations(&self) -> Option<usize> {
        None
    }
}

/// How a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStatus {
    /// The budget was spent or the solver chose to end.
    Completed,
    /// A stop probe fired or the run was cancelled.
    Stopped,
    /// An iteration returned an error.
    Failed,
}

/// Result of [`solve`].
#[derive(Debug)]
pub struct SolverOutcome {
    /// Every evaluated candidate, including those of the initial set.
    pub solutions: SolutionSet,
    pub status: RunStatus,
    /// Number of completed iterations.
    pub iterations: usize,
    /// The error that ended a failed run.
    pub error: Option<Error>,
}

impl SolverOutcome {
    #[must_use]
    pub fn pareto_front(&self) -> ParetoFront {
        self.solutions.pareto_front()
    }
}

/// Options of one [`solve`] call.
///
/// # Defaults
///
/// - iteration budget: the solver's [`default_iterations`](Solver::default_iterations)
/// - an empty initial set
/// - [`Verbosity::Quiet`]
/// - no callbacks
#[derive(Default)]
pub struct SolveOptions {
    max_iterations: Option<usize>,
    initial_solutions: Option<SolutionSet>,
    initial_solution: Option<Solution>,
    verbosity: Verbosity,
    callbacks: Vec<Box<dyn SolverCallback>>,
}

impl SolveOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = Some(n);
        self
    }

    /// Starts from an existing set, which must use the problem's limits.
    #[must_use]
    pub fn initial_solutions(mut self, set: SolutionSet) -> Self {
        self.initial_solutions = Some(set);
        self
    }

    /// Starting point for solvers that refine one candidate. Overrides the
    /// problem's own initial solution.
    #[must_use]
    pub fn initial_solution(mut self, solution: Solution) -> Self {
        self.initial_solution = Some(solution);
        self
    }

    #[must_use]
    pub fn verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    #[must_use]
    pub fn callback(mut self, callback: impl SolverCallback + 'static) -> Self {
        self.callbacks.push(Box::new(callback));
        self
    }
}

/// State of one run, handed to [`Solver::configure`] and
/// [`Solver::iteration`].
pub struct SolverRun<'a> {
    problem: &'a Problem,
    solutions: SolutionSet,
    initial_solution: Option<Solution>,
    verbosity: Verbosity,
    callbacks: Vec<Box<dyn SolverCallback>>,
}

impl<'a> SolverRun<'a> {
    #[must_use]
    pub fn problem(&self) -> &'a Problem {
        self.problem
    }

    /// Everything evaluated so far in this run.
    #[must_use]
    pub fn solutions(&self) -> &SolutionSet {
        &self.solutions
    }

    #[must_use]
    pub fn initial_solution(&self) -> Option<&Solution> {
        self.initial_solution.as_ref()
    }

    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// Whether the problem or the context asks the run to stop.
    #[must_use]
    pub fn should_stop(&self, ctx: &ExecutionContext) -> bool {
        self.problem.should_stop() || ctx.is_cancelled()
    }

    /// The configured starting candidate, or one proposed by the problem.
    ///
    /// # Errors
    ///
    /// Fails when the domain cannot be sampled.
    pub fn starting_solution(&self, ctx: &mut ExecutionContext) -> Result<Solution> {
        match &self.initial_solution {
            Some(s) => Ok(s.clone()),
            None => self.problem.propose_starting_solution(ctx),
        }
    }

    /// Evaluates `solution`, records it and notifies the callbacks.
    ///
    /// # Errors
    ///
    /// Propagates configuration errors from [`Problem::evaluate`].
    pub fn evaluate(&mut self, ctx: &mut ExecutionContext, solution: &Solution) -> Result<Fitness> {
        let fitness = self.problem.evaluate(ctx, solution)?;
        self.record(ctx, solution.clone(), fitness.clone())?;
        Ok(fitness)
    }

    /// Records an already evaluated candidate and notifies the callbacks.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LimitsMismatch`] for a fitness of another problem.
    pub fn record(
        &mut self,
        ctx: &mut ExecutionContext,
        solution: Solution,
        fitness: Fitness,
    ) -> Result<()> {
        self.solutions.insert_solution(solution, fitness)?;
        let i = self.solutions.len() - 1;
        if self.verbosity >= Verbosity::All {
            for (k, v) in self.solutions.fitness(i).values().iter().enumerate() {
                ctx.report_result(&format!("objective_{k}"), *v);
            }
        }
        for callback in &mut self.callbacks {
            callback.on_evaluation(
                ctx,
                self.solutions.solution(i),
                self.solutions.fitness(i),
                &self.solutions,
            );
        }
        Ok(())
    }

    /// Records every element of `other`, in order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LimitsMismatch`] when `other` uses other limits.
    pub fn merge(&mut self, ctx: &mut ExecutionContext, other: &SolutionSet) -> Result<()> {
        for (solution, fitness) in other.iter() {
            self.record(ctx, solution.clone(), fitness.clone())?;
        }
        Ok(())
    }

    /// Best value of each objective over the recorded set.
    fn best_values(&self) -> Vec<f64> {
        let limits = self.problem.limits();
        (0..limits.n_objectives())
            .map(|k| {
                let sign = limits.sign(k);
                self.solutions
                    .fitnesses()
                    .iter()
                    .map(|f| f.value(k))
                    .filter(|v| !v.is_nan())
                    .max_by(|a, b| (sign * a).total_cmp(&(sign * b)))
                    .unwrap_or(f64::NAN)
            })
            .collect()
    }

    #[allow(clippy::cast_precision_loss)]
    fn end_iteration(&mut self, ctx: &mut ExecutionContext, iteration: usize) {
        if self.verbosity >= Verbosity::Progress || cfg!(feature = "tracing") {
            let best = self.best_values();
            trace_debug!(iteration, best = ?best, "iteration finished");
            if self.verbosity >= Verbosity::Progress {
                ctx.report_result("iteration", iteration as f64);
                for (k, v) in best.iter().enumerate() {
                    ctx.report_result(&format!("best_{k}"), *v);
                }
                ctx.report_result("evaluations", self.problem.num_evaluations() as f64);
            }
        }
        if self.verbosity >= Verbosity::Detailed {
            let front = self.solutions.pareto_front();
            trace_debug!(iteration, front = front.len(), "front after iteration");
            ctx.report_result("front_size", front.len() as f64);
            ctx.report_result("hypervolume", front.hypervolume(None));
        }
        for callback in &mut self.callbacks {
            callback.on_iteration_end(ctx, iteration, &self.solutions);
        }
    }
}

/// Runs `solver` on `problem` until its budget is spent, it returns
/// `false`, or a stop probe fires.
///
/// # Errors
///
/// Only setup problems are returned as `Err`: an initial set with other
/// limits ([`Error::LimitsMismatch`]), an initial solution outside the
/// domain, or a failing [`Solver::configure`]. Errors raised by iterations
/// end the run with [`RunStatus::Failed`] and are stored in the outcome.
pub fn solve<S: Solver + ?Sized>(
    solver: &mut S,
    ctx: &mut ExecutionContext,
    problem: &Problem,
    options: SolveOptions,
) -> Result<SolverOutcome> {
    #[cfg(feature = "tracing")]
    let _span = tracing::info_span!("solve", solver = solver.name()).entered();

    let max_iterations = options.max_iterations.or_else(|| solver.default_iterations());
    let solutions = match options.initial_solutions {
        Some(set) => {
            if **set.limits() != **problem.limits() {
                return Err(Error::LimitsMismatch);
            }
            set
        }
        None => SolutionSet::new(Arc::clone(problem.limits())),
    };
    if let Some(s) = &options.initial_solution {
        problem.domain().check(s)?;
    }

    let mut run = SolverRun {
        problem,
        solutions,
        initial_solution: options
            .initial_solution
            .or_else(|| problem.initial_solution().cloned()),
        verbosity: options.verbosity,
        callbacks: options.callbacks,
    };

    solver.configure(ctx, &mut run)?;
    trace_info!(solver = solver.name(), ?max_iterations, "solver started");

    let mut iterations = 0;
    let mut status = RunStatus::Completed;
    let mut error = None;
    loop {
        if max_iterations.is_some_and(|max| iterations >= max) {
            break;
        }
        if run.should_stop(ctx) {
            status = RunStatus::Stopped;
            break;
        }
        match solver.iteration(ctx, &mut run, iterations) {
            Ok(keep_going) => {
                run.end_iteration(ctx, iterations);
                iterations += 1;
                if !keep_going {
                    break;
                }
            }
            Err(Error::Cancelled) => {
                status = RunStatus::Stopped;
                break;
            }
            Err(e) => {
                ctx.error(solver.name(), e.to_string());
                status = RunStatus::Failed;
                error = Some(e);
                break;
            }
        }
    }

    if status != RunStatus::Completed {
        run.solutions.mark_incomplete();
    }
    trace_info!(
        solver = solver.name(),
        iterations,
        evaluated = run.solutions.len(),
        status = ?status,
        "solver finished"
    );
    Ok(SolverOutcome {
        solutions: run.solutions,
        status,
        iterations,
        error,
    })
}
