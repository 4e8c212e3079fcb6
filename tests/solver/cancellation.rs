use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use moosolver::context::{CancellationToken, ExecutionContext};
use moosolver::domain::Domain;
use moosolver::problem::Problem;
use moosolver::sampler::UniformSampler;
use moosolver::solution::Solution;
use moosolver::solver::{Nsga2Solver, RandomSolver, RunStatus, SolveOptions, solve};

/// A problem whose stop token is cancelled by its own objective after
/// `after` calls, standing in for a driving thread.
fn self_stopping(after: usize) -> (Problem, Arc<AtomicUsize>) {
    let token = CancellationToken::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let objective_token = token.clone();
    let objective_calls = Arc::clone(&calls);
    let problem = Problem::builder(Domain::continuous(vec![(0.0, 1.0), (0.0, 1.0)]).unwrap())
        .objective(2.0, 0.0, move |s: &Solution| {
            if objective_calls.fetch_add(1, Ordering::SeqCst) + 1 >= after {
                objective_token.cancel();
            }
            s.as_continuous().map(|x| x[0] + x[1])
        })
        .stop_token(token)
        .build()
        .unwrap();
    (problem, calls)
}

#[test]
fn stop_token_ends_an_unbounded_run() {
    let (problem, calls) = self_stopping(50);
    let mut solver = RandomSolver::new(Box::new(UniformSampler::new()));
    let mut ctx = ExecutionContext::with_seed(1);

    let outcome = solve(&mut solver, &mut ctx, &problem, SolveOptions::new()).unwrap();

    assert_eq!(outcome.status, RunStatus::Stopped);
    assert!(outcome.error.is_none());
    assert_eq!(outcome.solutions.len(), 50);
    assert_eq!(calls.load(Ordering::SeqCst), 50);
    assert!(outcome.solutions.is_incomplete());
}

#[test]
fn stop_inside_a_generation_keeps_partial_offspring() {
    let (problem, _) = self_stopping(33);
    let mut solver = Nsga2Solver::new(10);
    let mut ctx = ExecutionContext::with_seed(4);

    let outcome = solve(&mut solver, &mut ctx, &problem, SolveOptions::new()).unwrap();

    assert_eq!(outcome.status, RunStatus::Stopped);
    assert_eq!(outcome.solutions.len(), 33);
    assert!(outcome.solutions.is_incomplete());
    assert!(!outcome.pareto_front().is_empty());
}

#[test]
fn cancelled_context_from_another_thread() {
    let problem = moosolver::benchmark::sphere(2, 1.0).unwrap();
    let token = CancellationToken::new();
    let mut ctx = ExecutionContext::with_seed(9).cancellation(token.clone());
    std::thread::spawn(move || token.cancel()).join().unwrap();

    let mut solver = RandomSolver::new(Box::new(UniformSampler::new()));
    let outcome = solve(&mut solver, &mut ctx, &problem, SolveOptions::new()).unwrap();

    assert_eq!(outcome.status, RunStatus::Stopped);
    assert_eq!(outcome.iterations, 0);
    assert!(outcome.solutions.is_empty());
}
