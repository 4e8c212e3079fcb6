#![cfg(feature = "serde")]

use std::sync::Arc;

use moosolver::data::{ColumnData, ColumnSource, DataTable, IndexSet};
use moosolver::domain::{ContinuousDomain, DiscreteDomain, Domain, ExpressionDomain, VectorDomain};
use moosolver::expression::{Expression, Operator};
use moosolver::fitness::{Fitness, FitnessLimits};
use moosolver::solution::Solution;
use moosolver::solution_set::SolutionSet;
use moosolver::splitting::{DecisionTree, ExactWeakLearner, RegressionCriterion};

fn round_trip<T>(value: &T) -> T
where
    T: serde::Serialize + serde::de::DeserializeOwned,
{
    let json = serde_json::to_string(value).unwrap();
    serde_json::from_str(&json).unwrap()
}

#[test]
fn solutions_of_every_kind() {
    let solutions = vec![
        Solution::Continuous(vec![0.5, -1.25]),
        Solution::Discrete(3),
        Solution::Trajectory(vec![0, 2, 1]),
        Solution::Tree(Expression::apply(
            Operator::Add,
            vec![Expression::Input(0), Expression::Constant(2.0)],
        )),
        Solution::Composite(vec![Solution::Discrete(1), Solution::Continuous(vec![0.0])]),
    ];
    for s in &solutions {
        assert_eq!(&round_trip(s), s);
    }
}

#[test]
fn domains_keep_their_shape() {
    let domains = vec![
        Domain::continuous(vec![(-1.0, 1.0), (0.0, 5.0)]).unwrap(),
        Domain::Discrete(DiscreteDomain::new(vec!["red".into(), "blue".into()])),
        Domain::ScalarVector(vec![ContinuousDomain::uniform(2, 0.0, 1.0).unwrap()]),
        Domain::Vector(VectorDomain::new(Domain::Discrete(DiscreteDomain::with_size(4)), 3)),
        Domain::Expression(ExpressionDomain::new(2, vec![Operator::Mul, Operator::Neg], vec![1.0], 4)),
    ];
    for d in &domains {
        let back = round_trip(d);
        assert_eq!(&back, d);
        assert_eq!(back.n_fields(), d.n_fields());
    }
}

#[test]
fn fitness_keeps_values_and_limits() {
    let limits = Arc::new(FitnessLimits::new(vec![(10.0, 0.0), (0.0, 1.0)]).with_tolerance(1e-9));
    let f = Fitness::new(vec![2.5, 0.75], Arc::clone(&limits)).unwrap();
    let back = round_trip(&f);
    assert_eq!(back, f);
    assert!(back.limits().is_maximized(1));
    assert!((back.limits().tolerance() - 1e-9).abs() < f64::EPSILON);
}

#[test]
fn solution_set_still_sorts_after_a_round_trip() {
    let limits = Arc::new(FitnessLimits::new(vec![(10.0, 0.0), (10.0, 0.0)]));
    let mut set = SolutionSet::new(Arc::clone(&limits));
    for (i, p) in [[1.0, 5.0], [5.0, 1.0], [3.0, 3.0], [2.0, 2.0]].iter().enumerate() {
        set.insert_solution(
            Solution::Discrete(i),
            Fitness::new(p.to_vec(), Arc::clone(&limits)).unwrap(),
        )
        .unwrap();
    }
    set.mark_incomplete();

    let mut back: SolutionSet = round_trip(&set);
    assert_eq!(back.len(), 4);
    assert!(back.is_incomplete());
    assert_ne!(back.id(), set.id());
    assert_eq!(back.pareto_ranks(), set.pareto_ranks());

    // the deserialized limits are equal, so foreign fitness values still fit
    back.insert_solution(
        Solution::Discrete(9),
        Fitness::new(vec![0.0, 0.0], limits).unwrap(),
    )
    .unwrap();
    assert_eq!(back.pareto_front().len(), 1);
}

#[test]
fn index_set_and_table() {
    let indices = IndexSet::from_indices(vec![7, 1, 3]);
    assert_eq!(round_trip(&indices), indices);

    let mut table = DataTable::new(3);
    table.add_column("x", ColumnData::Numeric(vec![1.0, 2.0, 3.0])).unwrap();
    table
        .add_column("flag", ColumnData::Boolean(vec![Some(true), None, Some(false)]))
        .unwrap();
    table
        .add_column(
            "class",
            ColumnData::Label {
                n_labels: 3,
                values: vec![Some(2), Some(0), None],
            },
        )
        .unwrap();
    let square = Expression::apply(Operator::Mul, vec![Expression::Input(0), Expression::Input(0)]);
    table.add_expression_column("x2", square.clone(), &["x"]).unwrap();

    let back = round_trip(&table);
    assert_eq!(back, table);
    let derived = back.column_by_name("x2").unwrap();
    assert_eq!(derived.source, ColumnSource::Expression(square));
    assert_eq!(derived.data, ColumnData::Numeric(vec![1.0, 4.0, 9.0]));
}

#[test]
fn grown_tree_predicts_the_same_after_a_round_trip() {
    let n = 40;
    let x: Vec<f64> = (0..n).map(f64::from).collect();
    let y: Vec<f64> = x.iter().map(|&v| if v < 20.0 { -1.0 } else { 1.0 }).collect();
    let mut table = DataTable::new(x.len());
    table.add_column("x", ColumnData::Numeric(x)).unwrap();
    table.add_column("y", ColumnData::Numeric(y)).unwrap();

    let mut criterion = RegressionCriterion::new();
    let tree =
        DecisionTree::grow(&table, 1, &mut criterion, &ExactWeakLearner::new(1), 0, 2).unwrap();
    let back: DecisionTree = round_trip(&tree);
    assert_eq!(back, tree);
    for row in 0..table.n_samples() {
        assert_eq!(back.predict(&table, row), tree.predict(&table, row));
    }
}
