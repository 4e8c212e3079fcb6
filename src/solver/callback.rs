use std::sync::Arc;

use parking_lot::Mutex;

use crate::context::ExecutionContext;
use crate::fitness::Fitness;
use crate::solution::Solution;
use crate::solution_set::SolutionSet;

/// Observer of a running solver.
///
/// Both hooks default to doing nothing.
pub trait SolverCallback: Send {
    /// Called after each evaluation is recorded. `solutions` already
    /// contains the new pair.
    fn on_evaluation(
        &mut self,
        _ctx: &mut ExecutionContext,
        _solution: &Solution,
        _fitness: &Fitness,
        _solutions: &SolutionSet,
    ) {
    }

    /// Called after each completed iteration.
    fn on_iteration_end(
        &mut self,
        _ctx: &mut ExecutionContext,
        _iteration: usize,
        _solutions: &SolutionSet,
    ) {
    }
}

/// Records the hypervolume of the evaluated set every `period` evaluations.
///
/// The history is shared, so it stays readable after the tracker has been
/// handed to [`SolveOptions::callback`](super::SolveOptions::callback).
///
/// ```
/// use moosolver::benchmark;
/// use moosolver::context::ExecutionContext;
/// use moosolver::sampler::UniformSampler;
/// use moosolver::solver::{HyperVolumeTracker, RandomSolver, SolveOptions, solve};
///
/// let problem = benchmark::zdt1(5).unwrap();
/// let tracker = HyperVolumeTracker::new(10);
/// let history = tracker.history();
/// let mut solver = RandomSolver::new(Box::new(UniformSampler::new()));
/// let mut ctx = ExecutionContext::with_seed(1);
/// solve(&mut solver, &mut ctx, &problem, SolveOptions::new().max_iterations(50).callback(tracker)).unwrap();
///
/// let history = history.lock();
/// assert_eq!(history.len(), 5);
/// assert!(history.windows(2).all(|w| w[0] <= w[1]));
/// ```
#[derive(Debug)]
pub struct HyperVolumeTracker {
    period: usize,
    reference: Option<Fitness>,
    seen: usize,
    history: Arc<Mutex<Vec<f64>>>,
}

impl HyperVolumeTracker {
    /// A `period` of zero is treated as one.
    #[must_use]
    pub fn new(period: usize) -> Self {
        Self {
            period: period.max(1),
            reference: None,
            seen: 0,
            history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Reference point; the worst point of the limits when unset.
    #[must_use]
    pub fn reference(mut self, reference: Fitness) -> Self {
        self.reference = Some(reference);
        self
    }

    #[must_use]
    pub fn history(&self) -> Arc<Mutex<Vec<f64>>> {
        Arc::clone(&self.history)
    }
}

impl SolverCallback for HyperVolumeTracker {
    #[allow(clippy::cast_precision_loss)]
    fn on_evaluation(
        &mut self,
        ctx: &mut ExecutionContext,
        _solution: &Solution,
        _fitness: &Fitness,
        solutions: &SolutionSet,
    ) {
        self.seen += 1;
        if self.seen % self.period != 0 {
            return;
        }
        let hv = solutions.hypervolume(self.reference.as_ref());
        ctx.report_result("hypervolume", hv);
        self.history.lock().push(hv);
    }
}
