//! Optimization problems: a [`Domain`] plus one or more objectives.
//!
//! Objectives are registered through [`ProblemBuilder`] together with their
//! `(worst, best)` limits, which also fix each objective's direction:
//!
//! ```
//! use moosolver::context::ExecutionContext;
//! use moosolver::domain::Domain;
//! use moosolver::problem::Problem;
//! use moosolver::solution::Solution;
//!
//! let problem = Problem::builder(Domain::continuous(vec![(-10.0, 10.0)]).unwrap())
//!     // minimized: worst 100, best 0
//!     .objective(100.0, 0.0, |s: &Solution| s.as_continuous().map(|x| x[0] * x[0]))
//!     .build()
//!     .unwrap();
//!
//! let mut ctx = ExecutionContext::with_seed(0);
//! let fitness = problem.evaluate(&mut ctx, &Solution::Continuous(vec![3.0])).unwrap();
//! assert_eq!(fitness.values(), &[9.0]);
//! ```
//!
//! Evaluation never caches: evaluating the same candidate twice calls the
//! objectives twice. Callers that need at-most-once evaluation memoize on
//! their side.

use core::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::context::{CancellationToken, ExecutionContext};
use crate::domain::Domain;
use crate::fitness::{Fitness, FitnessLimits};
use crate::sampler::sample_uniform;
use crate::solution::Solution;
use crate::{Error, Result};

/// One objective function of a [`Problem`].
///
/// `Ok(None)` means the objective has no value for this candidate. Such a
/// candidate, like one whose objective returns NaN or an evaluation error
/// ([`Error::ObjectiveFailed`]), is scored with the objective's worst value
/// and the search goes on. Other errors abort the evaluation.
///
/// Closures `Fn(&Solution) -> Option<f64>` implement this trait directly.
pub trait Objective: Send + Sync {
    /// Scores `solution`.
    ///
    /// # Errors
    ///
    /// Implementations return [`Error::ObjectiveFailed`] for a failure
    /// specific to this candidate.
    fn evaluate(&self, ctx: &mut ExecutionContext, solution: &Solution) -> Result<Option<f64>>;
}

impl<F> Objective for F
where
    F: Fn(&Solution) -> Option<f64> + Send + Sync,
{
    fn evaluate(&self, _ctx: &mut ExecutionContext, solution: &Solution) -> Result<Option<f64>> {
        Ok(self(solution))
    }
}

/// A search space with objectives to optimize.
///
/// `Problem` is `Send + Sync` and [`evaluate`](Self::evaluate) may be
/// called concurrently for distinct candidates; the only shared state is
/// an atomic evaluation counter.
pub struct Problem {
    domain: Domain,
    limits: Arc<FitnessLimits>,
    objectives: Vec<Box<dyn Objective>>,
    initial_solution: Option<Solution>,
    max_evaluations: Option<usize>,
    stop: CancellationToken,
    evaluations: AtomicUsize,
}

impl Problem {
    /// Starts building a problem over `domain`.
    #[must_use]
    pub fn builder(domain: Domain) -> ProblemBuilder {
        ProblemBuilder::new(domain)
    }

    #[must_use]
    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// Limits shared by every fitness this problem produces.
    #[must_use]
    pub fn limits(&self) -> &Arc<FitnessLimits> {
        &self.limits
    }

    #[must_use]
    pub fn n_objectives(&self) -> usize {
        self.objectives.len()
    }

    /// Scores `solution` on every objective.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SolutionMismatch`] when the candidate does not have
    /// the domain's shape, and any configuration error raised by an
    /// objective. Evaluation errors are not returned: they are replaced by
    /// the objective's worst value and reported as a warning on `ctx`.
    pub fn evaluate(&self, ctx: &mut ExecutionContext, solution: &Solution) -> Result<Fitness> {
        self.domain.check(solution)?;
        self.evaluations.fetch_add(1, Ordering::Relaxed);

        let mut values = Vec::with_capacity(self.objectives.len());
        for (i, objective) in self.objectives.iter().enumerate() {
            let value = match objective.evaluate(ctx, solution) {
                Ok(Some(v)) if !v.is_nan() => v,
                Ok(Some(_)) => self.penalize(ctx, i, "objective returned NaN"),
                Ok(None) => self.penalize(ctx, i, &Error::MissingObjectiveValue(i).to_string()),
                Err(e) if e.is_evaluation_error() => self.penalize(ctx, i, &e.to_string()),
                Err(e) => return Err(e),
            };
            values.push(value);
        }
        Fitness::new(values, Arc::clone(&self.limits))
    }

    fn penalize(&self, ctx: &ExecutionContext, objective: usize, reason: &str) -> f64 {
        ctx.warning(
            "Problem::evaluate",
            format!("objective {objective}: {reason}; using its worst value"),
        );
        self.limits.worst(objective)
    }

    /// Cooperative stop probe: the evaluation budget is spent or the
    /// problem's stop token was cancelled.
    #[must_use]
    pub fn should_stop(&self) -> bool {
        self.stop.is_cancelled()
            || self
                .max_evaluations
                .is_some_and(|max| self.num_evaluations() >= max)
    }

    /// Number of `evaluate` calls so far.
    #[must_use]
    pub fn num_evaluations(&self) -> usize {
        self.evaluations.load(Ordering::Relaxed)
    }

    /// Handle that stops every solver working on this problem.
    #[must_use]
    pub fn stop_token(&self) -> CancellationToken {
        self.stop.clone()
    }

    #[must_use]
    pub fn initial_solution(&self) -> Option<&Solution> {
        self.initial_solution.as_ref()
    }

    /// The configured initial solution, or a uniform sample of the domain.
    ///
    /// # Errors
    ///
    /// Fails when the domain cannot be sampled (for example an empty
    /// discrete domain).
    pub fn propose_starting_solution(&self, ctx: &mut ExecutionContext) -> Result<Solution> {
        match &self.initial_solution {
            Some(s) => Ok(s.clone()),
            None => sample_uniform(ctx, &self.domain, 0.3),
        }
    }
}

impl core::fmt::Debug for Problem {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Problem")
            .field("domain", &self.domain)
            .field("limits", &self.limits)
            .field("max_evaluations", &self.max_evaluations)
            .field("evaluations", &self.num_evaluations())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Problem`].
///
/// # Defaults
///
/// - no evaluation budget
/// - exact fitness comparison (tolerance 0)
/// - no initial solution
pub struct ProblemBuilder {
    domain: Domain,
    limits: FitnessLimits,
    objectives: Vec<Box<dyn Objective>>,
    initial_solution: Option<Solution>,
    max_evaluations: Option<usize>,
    stop: Option<CancellationToken>,
}

impl ProblemBuilder {
    fn new(domain: Domain) -> Self {
        Self {
            domain,
            limits: FitnessLimits::new(Vec::new()),
            objectives: Vec::new(),
            initial_solution: None,
            max_evaluations: None,
            stop: None,
        }
    }

    /// Adds an objective. It is maximized when `best > worst`, minimized
    /// otherwise.
    #[must_use]
    pub fn objective(mut self, worst: f64, best: f64, objective: impl Objective + 'static) -> Self {
        self.limits.add_objective(worst, best);
        self.objectives.push(Box::new(objective));
        self
    }

    /// Tolerance under which two objective values compare equal.
    #[must_use]
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.limits = self.limits.with_tolerance(tolerance);
        self
    }

    /// After `n` evaluations [`Problem::should_stop`] turns true.
    #[must_use]
    pub fn max_evaluations(mut self, n: usize) -> Self {
        self.max_evaluations = Some(n);
        self
    }

    #[must_use]
    pub fn initial_solution(mut self, solution: Solution) -> Self {
        self.initial_solution = Some(solution);
        self
    }

    /// Uses an existing token instead of a fresh one.
    #[must_use]
    pub fn stop_token(mut self, token: CancellationToken) -> Self {
        self.stop = Some(token);
        self
    }

    /// # Errors
    ///
    /// Returns [`Error::NoObjectives`] without objectives and
    /// [`Error::SolutionMismatch`] when the initial solution does not fit
    /// the domain.
    pub fn build(self) -> Result<Problem> {
        if self.objectives.is_empty() {
            return Err(Error::NoObjectives);
        }
        if let Some(s) = &self.initial_solution {
            self.domain.check(s)?;
        }
        Ok(Problem {
            domain: self.domain,
            limits: Arc::new(self.limits),
            objectives: self.objectives,
            initial_solution: self.initial_solution,
            max_evaluations: self.max_evaluations,
            stop: self.stop.unwrap_or_default(),
            evaluations: AtomicUsize::new(0),
        })
    }
}
