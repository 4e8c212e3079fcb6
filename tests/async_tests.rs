//! Async integration tests for parallel evaluation.
//!
//! These tests are only compiled when the `async` feature is enabled.

#![cfg(feature = "async")]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use moosolver::benchmark;
use moosolver::Error;
use moosolver::context::ExecutionContext;
use moosolver::domain::Domain;
use moosolver::parallel::evaluate_parallel;
use moosolver::problem::Problem;
use moosolver::sampler::{Sampler, UniformSampler};
use moosolver::solution::Solution;
use moosolver::solution_set::SharedSolutionSet;

fn line(n: u32) -> Vec<Solution> {
    (0..n)
        .map(|i| Solution::Continuous(vec![f64::from(i) - f64::from(n) / 2.0]))
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn never_runs_more_than_the_allowed_evaluations_at_once() {
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let (inside, highest) = (Arc::clone(&in_flight), Arc::clone(&peak));
    let problem = Problem::builder(Domain::continuous(vec![(-20.0, 20.0)]).unwrap())
        .objective(400.0, 0.0, move |s: &Solution| {
            let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
            highest.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(5));
            inside.fetch_sub(1, Ordering::SeqCst);
            s.as_continuous().map(|x| x[0] * x[0])
        })
        .build()
        .unwrap();

    let problem = Arc::new(problem);
    let set = SharedSolutionSet::new(Arc::clone(problem.limits()));
    let mut ctx = ExecutionContext::with_seed(11);
    evaluate_parallel(problem, &mut ctx, line(24), set.clone(), 3)
        .await
        .unwrap();

    assert_eq!(set.len(), 24);
    assert!(peak.load(Ordering::SeqCst) <= 3);
    assert_eq!(in_flight.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn penalties_from_workers_reach_the_caller() {
    let problem = Problem::builder(Domain::continuous(vec![(-20.0, 20.0)]).unwrap())
        .objective(400.0, 0.0, |s: &Solution| {
            s.as_continuous().filter(|x| x[0] >= 0.0).map(|x| x[0] * x[0])
        })
        .build()
        .unwrap();

    let problem = Arc::new(problem);
    let set = SharedSolutionSet::new(Arc::clone(problem.limits()));
    let mut ctx = ExecutionContext::with_seed(5);
    evaluate_parallel(problem, &mut ctx, line(10), set.clone(), 4)
        .await
        .unwrap();

    let set = set.into_inner();
    let penalized = set
        .iter()
        .filter(|(_, f)| (f.value(0) - 400.0).abs() < f64::EPSILON)
        .count();
    assert_eq!(penalized, 5);
    assert_eq!(ctx.warning_count(), 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn evaluation_budget_stops_new_work() {
    let problem = Problem::builder(Domain::continuous(vec![(-20.0, 20.0)]).unwrap())
        .objective(400.0, 0.0, |s: &Solution| s.as_continuous().map(|x| x[0].abs()))
        .max_evaluations(10)
        .build()
        .unwrap();

    let problem = Arc::new(problem);
    let set = SharedSolutionSet::new(Arc::clone(problem.limits()));
    let mut ctx = ExecutionContext::with_seed(9);
    evaluate_parallel(Arc::clone(&problem), &mut ctx, line(40), set.clone(), 2)
        .await
        .unwrap();

    // tasks spawned before the budget was seen may still finish
    assert!((10..=12).contains(&set.len()));
    assert_eq!(problem.num_evaluations(), set.len());
    assert!(set.snapshot().is_incomplete());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn a_sampled_batch_can_be_ranked_after_evaluation() {
    let problem = Arc::new(benchmark::zdt1(6).unwrap());
    let mut sampler = UniformSampler::new();
    sampler.initialize(problem.domain()).unwrap();

    let mut ctx = ExecutionContext::with_seed(21);
    let batch: Vec<Solution> = (0..50).map(|_| sampler.sample(&mut ctx).unwrap()).collect();
    let set = SharedSolutionSet::new(Arc::clone(problem.limits()));
    evaluate_parallel(Arc::clone(&problem), &mut ctx, batch, set.clone(), 8)
        .await
        .unwrap();

    let set = set.into_inner();
    assert_eq!(set.len(), 50);
    let covered: usize = set.non_dominated_sort().iter().map(|f| f.indices.len()).sum();
    assert_eq!(covered, 50);
    let front = set.pareto_front();
    assert!(!front.is_empty());
    assert!(front.hypervolume(None) > 0.0);
}

#[tokio::test]
async fn cancelling_from_another_task_interrupts_the_batch() {
    let problem = Problem::builder(Domain::continuous(vec![(-20.0, 20.0)]).unwrap())
        .objective(400.0, 0.0, |s: &Solution| {
            std::thread::sleep(Duration::from_millis(2));
            s.as_continuous().map(|x| x[0].abs())
        })
        .build()
        .unwrap();

    let problem = Arc::new(problem);
    let set = SharedSolutionSet::new(Arc::clone(problem.limits()));
    let mut ctx = ExecutionContext::with_seed(2);
    let token = ctx.cancellation_token();
    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();
    });

    let candidates = (0..10_000)
        .map(|i| Solution::Continuous(vec![f64::from(i % 40) - 20.0]))
        .collect();
    evaluate_parallel(problem, &mut ctx, candidates, set.clone(), 1)
        .await
        .unwrap();
    canceller.await.unwrap();

    assert!(set.len() < 10_000);
    assert!(set.snapshot().is_incomplete());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn a_panicking_objective_keeps_the_other_results() {
    let finished = Arc::new(AtomicUsize::new(0));
    let done = Arc::clone(&finished);
    let problem = Problem::builder(Domain::continuous(vec![(-20.0, 20.0)]).unwrap())
        .objective(400.0, 0.0, move |s: &Solution| {
            let x = s.as_continuous()?[0];
            assert!(x != 0.0, "objective blew up");
            std::thread::sleep(Duration::from_millis(100));
            done.fetch_add(1, Ordering::SeqCst);
            Some(x.abs())
        })
        .build()
        .unwrap();

    let problem = Arc::new(problem);
    let set = SharedSolutionSet::new(Arc::clone(problem.limits()));
    let mut ctx = ExecutionContext::with_seed(6);
    let candidates = (0..6).map(|i| Solution::Continuous(vec![f64::from(i)])).collect();
    let result = evaluate_parallel(problem, &mut ctx, candidates, set.clone(), 4).await;

    assert!(matches!(result, Err(Error::TaskFailed(_))));
    // the three siblings already running are drained and kept
    assert_eq!(finished.load(Ordering::SeqCst), 3);
    assert_eq!(set.len(), 3);
    assert!(set.snapshot().is_incomplete());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn an_evaluation_error_marks_the_batch_incomplete() {
    let problem = Arc::new(benchmark::sphere(1, 5.0).unwrap());
    let set = SharedSolutionSet::new(Arc::clone(problem.limits()));
    let mut ctx = ExecutionContext::with_seed(7);
    let mut candidates = vec![Solution::Discrete(0)];
    candidates.extend((0..20).map(|i| Solution::Continuous(vec![f64::from(i) / 10.0])));
    let result = evaluate_parallel(problem, &mut ctx, candidates, set.clone(), 1).await;

    assert!(matches!(result, Err(Error::SolutionMismatch { .. })));
    assert!(set.len() < 20);
    assert!(set.snapshot().is_incomplete());
}
