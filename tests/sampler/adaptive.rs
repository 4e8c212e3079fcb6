use moosolver::context::ExecutionContext;
use moosolver::domain::{ContinuousDomain, DiscreteDomain, Domain};
use moosolver::sampler::{
    BernoulliSampler, CategoricalSampler, CompositeSampler, GaussianSampler, MixtureSampler,
    Sampler, UniformSampler,
};
use moosolver::solution::Solution;
use moosolver::Error;

#[test]
fn gaussian_refit_concentrates_on_the_elite() {
    let domain = Domain::continuous(vec![(-10.0, 10.0), (-10.0, 10.0)]).unwrap();
    let mut sampler = GaussianSampler::new();
    sampler.initialize(&domain).unwrap();
    let mut ctx = ExecutionContext::with_seed(5);

    let elite: Vec<Solution> = (0..10)
        .map(|i| Solution::Continuous(vec![3.0 + 0.01 * f64::from(i), -2.0]))
        .collect();
    sampler.learn(&mut ctx, &elite).unwrap();

    assert!((sampler.means()[0] - 3.045).abs() < 1e-9);
    assert!((sampler.means()[1] + 2.0).abs() < 1e-9);
    for _ in 0..100 {
        let s = sampler.sample(&mut ctx).unwrap();
        let x = s.as_continuous().unwrap();
        assert!((x[0] - 3.045).abs() < 0.2);
        assert!((x[1] + 2.0).abs() < 1e-6);
    }
}

#[test]
fn bernoulli_frequency_matches_after_learning() {
    let domain = Domain::Discrete(DiscreteDomain::with_size(2));
    let mut sampler = BernoulliSampler::new(0.5).unwrap();
    sampler.initialize(&domain).unwrap();
    let mut ctx = ExecutionContext::with_seed(11);

    let batch: Vec<Solution> = (0..10).map(|i| Solution::Discrete(usize::from(i < 8))).collect();
    sampler.learn(&mut ctx, &batch).unwrap();
    assert!((sampler.probability() - 0.8).abs() < 1e-12);

    let ones = (0..5000)
        .filter(|_| sampler.sample(&mut ctx).unwrap() == Solution::Discrete(1))
        .count();
    assert!((ones as f64 / 5000.0 - 0.8).abs() < 0.03);
}

#[test]
fn categorical_learns_observed_frequencies() {
    let domain = Domain::Discrete(DiscreteDomain::with_size(3));
    let mut sampler = CategoricalSampler::new();
    sampler.initialize(&domain).unwrap();
    let mut ctx = ExecutionContext::with_seed(4);
    sampler
        .learn(
            &mut ctx,
            &[Solution::Discrete(2), Solution::Discrete(2), Solution::Discrete(0), Solution::Discrete(2)],
        )
        .unwrap();
    assert_eq!(sampler.probabilities(), &[0.25, 0.0, 0.75]);
    for _ in 0..200 {
        assert_ne!(sampler.sample(&mut ctx).unwrap(), Solution::Discrete(1));
    }
}

#[test]
fn mixture_only_draws_from_its_components() {
    let domain = Domain::Discrete(DiscreteDomain::with_size(4));
    let mut sampler = MixtureSampler::new(vec![
        (
            0.5,
            Box::new(CategoricalSampler::new().with_weights(vec![1.0, 0.0, 0.0, 0.0])) as Box<dyn Sampler>,
        ),
        (
            0.5,
            Box::new(CategoricalSampler::new().with_weights(vec![0.0, 0.0, 0.0, 1.0])),
        ),
    ])
    .unwrap();
    sampler.initialize(&domain).unwrap();
    let mut ctx = ExecutionContext::with_seed(8);

    let mut seen = [0usize; 4];
    for _ in 0..1000 {
        seen[sampler.sample(&mut ctx).unwrap().as_discrete().unwrap()] += 1;
    }
    assert_eq!(seen[1] + seen[2], 0);
    assert!(seen[0] > 400 && seen[3] > 400);
}

#[test]
fn composite_builds_one_field_per_sub_sampler() {
    let fields = vec![
        ContinuousDomain::new(vec![(0.0, 1.0)]).unwrap(),
        ContinuousDomain::new(vec![(5.0, 5.0), (-1.0, 1.0)]).unwrap(),
    ];
    let domain = Domain::ScalarVector(fields);
    let mut sampler = CompositeSampler::new(vec![
        Box::new(UniformSampler::new()),
        Box::new(GaussianSampler::new()),
    ]);
    sampler.initialize(&domain).unwrap();
    let mut ctx = ExecutionContext::with_seed(2);

    for _ in 0..100 {
        let s = sampler.sample(&mut ctx).unwrap();
        assert!(domain.contains(&s));
        let Solution::Composite(parts) = &s else {
            panic!("expected a composite candidate, got {s:?}");
        };
        assert_eq!(parts[1].as_continuous().unwrap()[0], 5.0);
    }
}

#[test]
fn non_adaptive_samplers_fail_fast() {
    let domain = Domain::continuous(vec![(0.0, 1.0)]).unwrap();
    let mut sampler = UniformSampler::new();
    sampler.initialize(&domain).unwrap();
    let mut ctx = ExecutionContext::with_seed(0);
    let x = Solution::Continuous(vec![0.5]);
    assert!(matches!(sampler.learn(&mut ctx, &[x.clone()]), Err(Error::Unsupported { .. })));
    assert!(matches!(sampler.reinforce(&mut ctx, &x), Err(Error::Unsupported { .. })));
}
