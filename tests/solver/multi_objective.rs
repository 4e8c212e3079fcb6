use moosolver::benchmark;
use moosolver::context::{ExecutionContext, MemorySink};
use moosolver::solver::{HyperVolumeTracker, Nsga2Solver, RunStatus, SolveOptions, solve};
use moosolver::Verbosity;
use std::sync::Arc;

#[test]
fn nsga2_hypervolume_grows_on_zdt1() {
    let problem = benchmark::zdt1(5).unwrap();
    let tracker = HyperVolumeTracker::new(20);
    let history = tracker.history();
    let mut solver = Nsga2Solver::new(20);
    let mut ctx = ExecutionContext::with_seed(12);

    let outcome = solve(
        &mut solver,
        &mut ctx,
        &problem,
        SolveOptions::new().max_iterations(30).callback(tracker),
    )
    .unwrap();

    assert_eq!(outcome.status, RunStatus::Completed);
    assert_eq!(outcome.solutions.len(), 20 + 30 * 20);
    let history = history.lock();
    assert_eq!(history.len(), 31);
    assert!(history.windows(2).all(|w| w[0] <= w[1]));
    assert!(history[30] > history[0]);
    assert_eq!(solver.population().map(|p| p.len()), Some(20));
}

#[test]
fn final_population_concentrates_on_the_schaffer_front() {
    let problem = benchmark::schaffer_n1().unwrap();
    let mut solver = Nsga2Solver::new(16);
    let mut ctx = ExecutionContext::with_seed(21);
    solve(&mut solver, &mut ctx, &problem, SolveOptions::new().max_iterations(40)).unwrap();

    let population = solver.population().unwrap();
    let fronts = population.non_dominated_sort();
    assert!(fronts[0].indices.len() >= 12, "{} of 16 non-dominated", fronts[0].indices.len());
    let covered: usize = fronts.iter().map(|f| f.indices.len()).sum();
    assert_eq!(covered, 16);
}

#[test]
fn progress_is_reported_per_iteration() {
    let problem = benchmark::schaffer_n1().unwrap();
    let sink = Arc::new(MemorySink::new());
    let mut ctx = ExecutionContext::with_seed(2).sink(sink.clone());
    let mut solver = Nsga2Solver::new(8);

    solve(
        &mut solver,
        &mut ctx,
        &problem,
        SolveOptions::new()
            .max_iterations(5)
            .verbosity(Verbosity::Progress),
    )
    .unwrap();

    assert_eq!(sink.series("iteration").len(), 5);
    let evaluations = sink.series("evaluations");
    assert_eq!(evaluations.last().copied(), Some(8.0 + 5.0 * 8.0));
    let best_0 = sink.series("best_0");
    assert!(best_0.windows(2).all(|w| w[1] <= w[0]));
}
