//! Concurrent evaluation of a batch of candidates on a tokio runtime.
//!
//! ```
//! use std::sync::Arc;
//!
//! use moosolver::benchmark;
//! use moosolver::context::ExecutionContext;
//! use moosolver::parallel::evaluate_parallel;
//! use moosolver::solution::Solution;
//! use moosolver::solution_set::SharedSolutionSet;
//!
//! # #[tokio::main(flavor = "multi_thread", worker_threads = 2)]
//! # async fn main() -> moosolver::Result<()> {
//! let problem = Arc::new(benchmark::sphere(2, 5.0)?);
//! let set = SharedSolutionSet::new(Arc::clone(problem.limits()));
//! let candidates = (0..8)
//!     .map(|i| Solution::Continuous(vec![f64::from(i) / 2.0, 0.0]))
//!     .collect();
//!
//! let mut ctx = ExecutionContext::with_seed(1);
//! evaluate_parallel(problem, &mut ctx, candidates, set.clone(), 4).await?;
//! assert_eq!(set.len(), 8);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::context::ExecutionContext;
use crate::fitness::Fitness;
use crate::problem::Problem;
use crate::solution::Solution;
use crate::solution_set::SharedSolutionSet;
use crate::{Error, Result};

/// Evaluates `candidates` with at most `concurrency` objective calls in
/// flight and inserts each pair into `set` as soon as it is scored.
///
/// Every evaluation runs in [`spawn_blocking`](tokio::task::spawn_blocking)
/// on its own [`fork`](ExecutionContext::fork) of `ctx`, so insertion order
/// is arbitrary. Once the problem asks to stop or `ctx` is cancelled no new
/// evaluation starts; in-flight ones are still collected and `set` is
/// marked incomplete.
///
/// # Errors
///
/// Returns [`Error::InvalidConfig`] for a zero `concurrency`,
/// [`Error::TaskFailed`] when an evaluation task panics, and otherwise the
/// first evaluation error. In-flight tasks are drained before returning,
/// their results are kept, and `set` is marked incomplete.
pub async fn evaluate_parallel(
    problem: Arc<Problem>,
    ctx: &mut ExecutionContext,
    candidates: Vec<Solution>,
    set: SharedSolutionSet,
    concurrency: usize,
) -> Result<()> {
    if concurrency == 0 {
        return Err(Error::InvalidConfig(
            "concurrency must be at least 1".to_owned(),
        ));
    }

    #[cfg(feature = "tracing")]
    let _span =
        tracing::info_span!("evaluate_parallel", n = candidates.len(), concurrency).entered();

    let semaphore = Arc::new(Semaphore::new(concurrency));
    let mut join_set: JoinSet<(Solution, Result<Fitness>)> = JoinSet::new();
    let mut first_error: Option<Error> = None;
    let mut interrupted = false;

    'spawn: for candidate in candidates {
        if problem.should_stop() || ctx.is_cancelled() {
            interrupted = true;
            break;
        }
        // drain finished tasks while waiting for a free slot
        let permit = loop {
            if let Ok(permit) = Arc::clone(&semaphore).try_acquire_owned() {
                break permit;
            }
            match join_set.join_next().await {
                Some(joined) => collect(joined, &set, &mut first_error),
                None => match Arc::clone(&semaphore).acquire_owned().await {
                    Ok(permit) => break permit,
                    Err(e) => {
                        first_error.get_or_insert(Error::TaskFailed(e.to_string()));
                        break 'spawn;
                    }
                },
            }
        };
        if first_error.is_some() {
            break;
        }

        let problem = Arc::clone(&problem);
        let mut child = ctx.fork();
        join_set.spawn_blocking(move || {
            let _permit = permit;
            let fitness = problem.evaluate(&mut child, &candidate);
            (candidate, fitness)
        });
    }

    while let Some(joined) = join_set.join_next().await {
        collect(joined, &set, &mut first_error);
    }

    if interrupted || first_error.is_some() {
        set.mark_incomplete();
    }
    trace_info!(evaluated = set.len(), interrupted, "parallel evaluation finished");
    first_error.map_or(Ok(()), Err)
}

/// Inserts a finished evaluation, or keeps its error if it is the first.
fn collect(
    joined: core::result::Result<(Solution, Result<Fitness>), tokio::task::JoinError>,
    set: &SharedSolutionSet,
    first_error: &mut Option<Error>,
) {
    let outcome = joined
        .map_err(|e| Error::TaskFailed(e.to_string()))
        .and_then(|(solution, fitness)| set.insert(solution, fitness?));
    if let Err(e) = outcome {
        trace_debug!(error = %e, "parallel evaluation failed");
        first_error.get_or_insert(e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmark;

    fn grid(n: i32) -> Vec<Solution> {
        (0..n)
            .map(|i| Solution::Continuous(vec![f64::from(i) / 10.0, 0.0]))
            .collect()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn every_candidate_is_inserted_once() {
        let problem = Arc::new(benchmark::sphere(2, 5.0).unwrap());
        let set = SharedSolutionSet::new(Arc::clone(problem.limits()));
        let mut ctx = ExecutionContext::with_seed(3);
        evaluate_parallel(Arc::clone(&problem), &mut ctx, grid(30), set.clone(), 3)
            .await
            .unwrap();

        let set = set.into_inner();
        assert_eq!(set.len(), 30);
        assert!(!set.is_incomplete());
        assert_eq!(problem.num_evaluations(), 30);
        for (solution, fitness) in set.iter() {
            let x = solution.as_continuous().unwrap();
            assert!((fitness.value(0) - x[0] * x[0]).abs() < 1e-12);
        }
    }

    #[tokio::test]
    async fn zero_concurrency_is_rejected() {
        let problem = Arc::new(benchmark::sphere(2, 5.0).unwrap());
        let set = SharedSolutionSet::new(Arc::clone(problem.limits()));
        let mut ctx = ExecutionContext::with_seed(3);
        let result = evaluate_parallel(problem, &mut ctx, grid(2), set, 0).await;
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn cancelled_context_starts_nothing() {
        let problem = Arc::new(benchmark::sphere(2, 5.0).unwrap());
        let set = SharedSolutionSet::new(Arc::clone(problem.limits()));
        let mut ctx = ExecutionContext::with_seed(3);
        ctx.cancellation_token().cancel();
        evaluate_parallel(problem, &mut ctx, grid(5), set.clone(), 2)
            .await
            .unwrap();
        assert_eq!(set.len(), 0);
        assert!(set.snapshot().is_incomplete());
    }

    #[tokio::test]
    async fn mismatched_candidates_report_the_first_error() {
        let problem = Arc::new(benchmark::sphere(2, 5.0).unwrap());
        let set = SharedSolutionSet::new(Arc::clone(problem.limits()));
        let mut ctx = ExecutionContext::with_seed(3);
        let candidates = vec![
            Solution::Continuous(vec![0.5, 0.5]),
            Solution::Discrete(1),
        ];
        let result = evaluate_parallel(problem, &mut ctx, candidates, set.clone(), 1).await;
        assert!(result.is_err());
        assert_eq!(set.len(), 1);
    }
}
