use moosolver::context::ExecutionContext;
use moosolver::domain::{Domain, ExpressionDomain};
use moosolver::expression::Operator;
use moosolver::problem::Problem;
use moosolver::search::{PostfixExpressionState, SoftmaxSearchSampler, UniformSearchSampler};
use moosolver::solution::Solution;
use moosolver::solver::{NestedRolloutSolver, RolloutSolver, RunStatus, SolveOptions, solve};

const XS: [f64; 5] = [-1.0, -0.5, 0.0, 0.5, 1.0];

fn expressions() -> ExpressionDomain {
    ExpressionDomain::new(1, vec![Operator::Add, Operator::Mul], vec![1.0], 5)
}

/// Squared error against `x^2 + x`, capped at 1000.
fn regression() -> Problem {
    Problem::builder(Domain::Expression(expressions()))
        .objective(1000.0, 0.0, |s: &Solution| {
            s.as_tree().map(|e| {
                let error: f64 = XS
                    .iter()
                    .map(|&x| (e.evaluate(&[x]) - (x * x + x)).powi(2))
                    .sum();
                error.min(1000.0)
            })
        })
        .build()
        .unwrap()
}

#[test]
fn rollouts_build_trees_inside_the_domain() {
    let problem = regression();
    let mut solver = RolloutSolver::new(
        Box::new(UniformSearchSampler),
        Box::new(PostfixExpressionState::new(expressions(), 7)),
    );
    let mut ctx = ExecutionContext::with_seed(5);

    let outcome = solve(&mut solver, &mut ctx, &problem, SolveOptions::new().max_iterations(50))
        .unwrap();

    assert_eq!(outcome.status, RunStatus::Completed);
    assert_eq!(outcome.solutions.len(), 50);
    for solution in outcome.solutions.solutions() {
        assert!(problem.domain().contains(solution));
        assert!(solution.as_tree().unwrap().size() <= 7);
    }
}

#[test]
fn nested_rollouts_do_not_lose_their_best() {
    let problem = regression();
    let mut solver = NestedRolloutSolver::new(
        Box::new(PostfixExpressionState::new(expressions(), 7)),
        1,
        30,
    )
    .policy(Box::new(SoftmaxSearchSampler::new()));
    let mut ctx = ExecutionContext::with_seed(6);

    let outcome = solve(&mut solver, &mut ctx, &problem, SolveOptions::new().max_iterations(2))
        .unwrap();

    assert_eq!(outcome.status, RunStatus::Completed);
    assert_eq!(outcome.solutions.len(), 60);
    let errors: Vec<f64> = outcome.solutions.fitnesses().iter().map(|f| f.value(0)).collect();
    let best = errors.iter().copied().fold(f64::INFINITY, f64::min);
    let mean = errors.iter().sum::<f64>() / errors.len() as f64;
    assert!(best <= mean);
    assert!(best < 1000.0);
}
