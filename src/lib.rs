#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(unreachable_pub)]
#![deny(clippy::correctness)]
#![deny(clippy::suspicious)]
#![deny(clippy::style)]
#![deny(clippy::complexity)]
#![deny(clippy::perf)]
#![deny(clippy::pedantic)]
#![deny(clippy::std_instead_of_core)]

//! Multi-objective black-box optimization building blocks: search domains,
//! samplers, Pareto-ranked solution sets, iterative solvers with cooperative
//! cancellation, and the splitting criteria used to grow decision trees.
//!
//! # Getting Started
//!
//! Minimize a two-objective problem with NSGA-II and read back its front:
//!
//! ```
//! use moosolver::prelude::*;
//!
//! let problem = moosolver::benchmark::schaffer_n1()?;
//! let mut ctx = ExecutionContext::with_seed(7);
//! let mut solver = Nsga2Solver::new(20);
//!
//! let outcome = solve(
//!     &mut solver,
//!     &mut ctx,
//!     &problem,
//!     SolveOptions::default().max_iterations(10),
//! )?;
//! assert_eq!(outcome.status, RunStatus::Completed);
//! assert!(!outcome.pareto_front().is_empty());
//! # Ok::<(), moosolver::Error>(())
//! ```
//!
//! # Core Concepts
//!
//! | Type | Role |
//! |------|------|
//! | [`Domain`](domain::Domain) | The search space: continuous box, discrete set, vector, expression trees or action sequences. |
//! | [`Problem`](problem::Problem) | A domain plus objectives, each with `(worst, best)` limits fixing its direction. |
//! | [`Fitness`](fitness::Fitness) | One objective vector; compares by Pareto dominance under shared [`FitnessLimits`](fitness::FitnessLimits). |
//! | [`SolutionSet`](solution_set::SolutionSet) | Evaluated candidates, with non-dominated sorting, crowding and hypervolume. |
//! | [`SolutionComparator`](comparator::SolutionComparator) | Orders the members of a set: dominance, lexicographic, one objective, rank and crowding. |
//! | [`Sampler`](sampler::Sampler) | Draws candidates from a domain and optionally learns from elites. |
//! | [`Solver`](solver::Solver) | One iteration of a search algorithm, driven by [`solve`](solver::solve). |
//! | [`ExecutionContext`](context::ExecutionContext) | Random source, cancellation flag, telemetry sink and diagnostics. |
//!
//! # Solvers
//!
//! | Solver | Algorithm | Domains |
//! |--------|-----------|---------|
//! | [`RandomSolver`](solver::RandomSolver) | Independent samples | any the sampler supports |
//! | [`RepeatSolver`](solver::RepeatSolver) | Restarts of an inner solver | inner solver's |
//! | [`EdaSolver`](solver::EdaSolver) | Estimation of distribution | any adaptive sampler |
//! | [`LocalSearchSolver`](solver::LocalSearchSolver) | Hill climbing on strict dominance | any the mutation supports |
//! | [`Nsga2Solver`](solver::Nsga2Solver) | NSGA-II with SBX and polynomial mutation | continuous |
//! | [`RolloutSolver`](solver::RolloutSolver) | Sampled trajectories of a search state | sequences, expressions |
//! | [`NestedRolloutSolver`](solver::NestedRolloutSolver) | Nested rollout policy adaptation | sequences, expressions |
//!
//! # Decision Trees
//!
//! [`DecisionTree::grow`](splitting::DecisionTree::grow) applies a
//! [`WeakLearner`](splitting::WeakLearner) recursively over a
//! [`DataTable`](data::DataTable), scoring candidate splits with a
//! [`SplittingCriterion`](splitting::SplittingCriterion).
//!
//! # Feature Flags
//!
//! | Flag | What it enables | Default |
//! |------|----------------|---------|
//! | `async` | [`evaluate_parallel`](parallel::evaluate_parallel) on a tokio runtime | off |
//! | `serde` | `Serialize`/`Deserialize` on domains, solutions, fitness values, solution sets and data tables | off |
//! | `tracing` | Structured log events via [`tracing`](https://docs.rs/tracing) at solver and sampler milestones | off |

/// Emit a `tracing::info!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_info {
    ($($arg:tt)*) => { tracing::info!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_info {
    ($($arg:tt)*) => {};
}

/// Emit a `tracing::debug!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($($arg:tt)*) => { tracing::debug!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($($arg:tt)*) => {};
}

/// Emit a `tracing::warn!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_warn {
    ($($arg:tt)*) => { tracing::warn!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_warn {
    ($($arg:tt)*) => {};
}

pub mod benchmark;
pub mod comparator;
pub mod context;
pub mod data;
pub mod domain;
mod error;
pub mod expression;
pub mod fitness;
pub mod mutation;
#[cfg(feature = "async")]
pub mod parallel;
pub mod pareto;
pub mod problem;
mod rng_util;
pub mod sampler;
pub mod search;
pub mod solution;
pub mod solution_set;
pub mod solver;
pub mod splitting;
mod types;

pub use error::{Error, Result};
pub use types::{Direction, Verbosity};

/// Convenient wildcard import for the most common types.
///
/// ```
/// use moosolver::prelude::*;
/// ```
pub mod prelude {
    pub use crate::comparator::{
        DominanceComparator, LexicographicComparator, ObjectiveComparator,
        ParetoRankAndCrowdingComparator, SolutionComparator,
    };
    pub use crate::context::{CancellationToken, ExecutionContext, MemorySink, ResultSink};
    pub use crate::data::{ColumnData, DataTable, IndexSet};
    pub use crate::domain::{ContinuousDomain, DiscreteDomain, Domain};
    pub use crate::error::{Error, Result};
    pub use crate::fitness::{Fitness, FitnessLimits};
    #[cfg(feature = "async")]
    pub use crate::parallel::evaluate_parallel;
    pub use crate::problem::{Objective, Problem, ProblemBuilder};
    pub use crate::sampler::{
        BernoulliSampler, CategoricalSampler, CompositeSampler, GaussianSampler, MixtureSampler,
        RejectionSampler, Sampler, UniformSampler,
    };
    pub use crate::solution::Solution;
    pub use crate::solution_set::{ParetoFront, SharedSolutionSet, SolutionSet};
    pub use crate::solver::{
        EdaSolver, LocalSearchSolver, NestedRolloutSolver, Nsga2Solver, RandomSolver,
        RepeatSolver, RolloutSolver, RunStatus, SolveOptions, Solver, SolverOutcome, solve,
    };
    pub use crate::splitting::{DecisionTree, SplittingCriterion, Vote, WeakLearner};
    pub use crate::types::{Direction, Verbosity};
}
