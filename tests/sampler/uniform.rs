use moosolver::context::ExecutionContext;
use moosolver::domain::{DiscreteDomain, Domain};
use moosolver::sampler::{Sampler, UniformSampler};

#[test]
fn unit_square_samples_stay_inside() {
    let domain = Domain::continuous(vec![(0.0, 1.0), (0.0, 1.0)]).unwrap();
    let mut sampler = UniformSampler::new();
    sampler.initialize(&domain).unwrap();
    let mut ctx = ExecutionContext::with_seed(42);

    let mut sum = [0.0; 2];
    for _ in 0..10_000 {
        let s = sampler.sample(&mut ctx).unwrap();
        let x = s.as_continuous().unwrap();
        for (axis, &v) in x.iter().enumerate() {
            assert!((0.0..=1.0).contains(&v), "sample {v} out of [0, 1]");
            sum[axis] += v;
        }
    }
    for total in sum {
        assert!((total / 10_000.0 - 0.5).abs() < 0.02);
    }
}

#[test]
fn discrete_choices_are_roughly_uniform() {
    let domain = Domain::Discrete(DiscreteDomain::with_size(5));
    let mut sampler = UniformSampler::new();
    sampler.initialize(&domain).unwrap();
    let mut ctx = ExecutionContext::with_seed(7);

    let mut counts = [0usize; 5];
    for _ in 0..5000 {
        counts[sampler.sample(&mut ctx).unwrap().as_discrete().unwrap()] += 1;
    }
    for c in counts {
        assert!((800..1200).contains(&c), "count {c} far from 1000");
    }
}

#[test]
fn sampling_another_domain_is_rejected() {
    let a = Domain::continuous(vec![(0.0, 1.0)]).unwrap();
    let b = Domain::continuous(vec![(0.0, 3.0)]).unwrap();
    let mut sampler = UniformSampler::new();
    let mut ctx = ExecutionContext::with_seed(1);
    assert!(sampler.sample_from(&mut ctx, &a).is_err());
    sampler.initialize(&a).unwrap();
    assert!(sampler.sample_from(&mut ctx, &a).is_ok());
    assert!(sampler.sample_from(&mut ctx, &b).is_err());
}
