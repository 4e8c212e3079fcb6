use moosolver::comparator::ObjectiveComparator;
use moosolver::context::ExecutionContext;
use moosolver::domain::Domain;
use moosolver::problem::Problem;
use moosolver::sampler::{GaussianSampler, UniformSampler};
use moosolver::solution::Solution;
use moosolver::solver::{EdaSolver, RandomSolver, RepeatSolver, RunStatus, SolveOptions, solve};

fn square() -> Problem {
    Problem::builder(Domain::continuous(vec![(-10.0, 10.0)]).unwrap())
        .objective(100.0, 0.0, |s: &Solution| s.as_continuous().map(|x| x[0] * x[0]))
        .build()
        .unwrap()
}

fn best_value(outcome: &moosolver::solver::SolverOutcome) -> f64 {
    outcome
        .solutions
        .fitnesses()
        .iter()
        .map(|f| f.value(0))
        .fold(f64::INFINITY, f64::min)
}

#[test]
fn random_search_finds_the_unit_interval() {
    let problem = square();
    let mut solver = RandomSolver::new(Box::new(UniformSampler::new()));
    let mut ctx = ExecutionContext::with_seed(2024);

    let outcome = solve(
        &mut solver,
        &mut ctx,
        &problem,
        SolveOptions::new().max_iterations(1000),
    )
    .unwrap();

    assert_eq!(outcome.status, RunStatus::Completed);
    assert_eq!(outcome.iterations, 1000);
    assert_eq!(outcome.solutions.len(), 1000);
    assert!(best_value(&outcome) <= 1.0);
    for solution in outcome.solutions.solutions() {
        let x = solution.as_continuous().unwrap()[0];
        assert!((-10.0..=10.0).contains(&x));
    }
}

#[test]
fn same_seed_same_run() {
    let problem = square();
    let run = |seed| {
        let mut solver = RandomSolver::new(Box::new(UniformSampler::new()));
        let mut ctx = ExecutionContext::with_seed(seed);
        solve(&mut solver, &mut ctx, &problem, SolveOptions::new().max_iterations(20))
            .unwrap()
            .solutions
            .solutions()
            .to_vec()
    };
    assert_eq!(run(5), run(5));
    assert_ne!(run(5), run(6));
}

#[test]
fn repeated_eda_keeps_every_restart() {
    let problem = square();
    let eda = EdaSolver::new(Box::new(GaussianSampler::new()), 20, 5)
        .comparator(Box::new(ObjectiveComparator::new(0)));
    let mut solver = RepeatSolver::new(Box::new(eda), Some(10));
    let mut ctx = ExecutionContext::with_seed(8);

    let outcome = solve(
        &mut solver,
        &mut ctx,
        &problem,
        SolveOptions::new().max_iterations(3),
    )
    .unwrap();

    assert_eq!(outcome.status, RunStatus::Completed);
    assert_eq!(outcome.solutions.len(), 3 * 10 * 20);
    assert!(best_value(&outcome) < 1.0);
}

#[test]
fn evaluation_failures_score_the_worst_value() {
    let problem = Problem::builder(Domain::continuous(vec![(-1.0, 1.0)]).unwrap())
        .objective(5.0, 0.0, |s: &Solution| {
            s.as_continuous().and_then(|x| (x[0] >= 0.0).then_some(x[0]))
        })
        .build()
        .unwrap();
    let mut solver = RandomSolver::new(Box::new(UniformSampler::new()));
    let mut ctx = ExecutionContext::with_seed(31);

    let outcome = solve(&mut solver, &mut ctx, &problem, SolveOptions::new().max_iterations(100))
        .unwrap();

    assert_eq!(outcome.status, RunStatus::Completed);
    let mut penalized = 0;
    for (solution, fitness) in outcome.solutions.iter() {
        let x = solution.as_continuous().unwrap()[0];
        if x < 0.0 {
            assert_eq!(fitness.value(0), 5.0);
            penalized += 1;
        } else {
            assert_eq!(fitness.value(0), x);
        }
    }
    assert!(penalized > 0);
    assert_eq!(ctx.warning_count(), penalized);
}
