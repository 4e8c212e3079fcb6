use moosolver::benchmark;
use moosolver::context::ExecutionContext;
use moosolver::mutation::{GaussianMutation, LocalSearchMutation, PolynomialMutation};
use moosolver::solution::Solution;
use moosolver::solver::{LocalSearchSolver, RunStatus, SolveOptions, solve};

#[test]
fn local_search_never_regresses() {
    let problem = benchmark::zdt1(4).unwrap();
    let mut ctx = ExecutionContext::with_seed(17);
    let local = LocalSearchMutation::new(Box::new(PolynomialMutation::default()), 25);

    for _ in 0..10 {
        let start = problem.propose_starting_solution(&mut ctx).unwrap();
        let start_fitness = problem.evaluate(&mut ctx, &start).unwrap();
        let (_, end_fitness) = local
            .execute(
                &mut ctx,
                problem.domain(),
                (start, start_fitness.clone()),
                |ctx, s| problem.evaluate(ctx, s),
            )
            .unwrap();
        assert!(end_fitness.dominates(&start_fitness, false));
    }
}

#[test]
fn local_search_solver_walks_downhill_from_the_initial_solution() {
    let problem = benchmark::sphere(3, 5.0).unwrap();
    let start = Solution::Continuous(vec![4.0, -4.0, 4.0]);
    let mut solver =
        LocalSearchSolver::new(LocalSearchMutation::new(Box::new(GaussianMutation::new(0.5)), 20));
    let mut ctx = ExecutionContext::with_seed(3);

    let outcome = solve(
        &mut solver,
        &mut ctx,
        &problem,
        SolveOptions::new()
            .max_iterations(20)
            .initial_solution(start),
    )
    .unwrap();

    assert_eq!(outcome.status, RunStatus::Completed);
    assert_eq!(outcome.solutions.len(), 1 + 20 * 20);
    let (_, current) = solver.current().unwrap();
    assert!(current.value(0) < 48.0);
    let best = outcome
        .solutions
        .fitnesses()
        .iter()
        .map(|f| f.value(0))
        .fold(f64::INFINITY, f64::min);
    assert_eq!(current.value(0), best);
}
