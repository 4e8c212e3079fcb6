use moosolver::context::{CancellationToken, ExecutionContext};
use moosolver::domain::Domain;
use moosolver::sampler::{RejectionSampler, Sampler, UniformSampler};
use moosolver::solution::Solution;
use moosolver::Error;

#[test]
fn every_accepted_sample_satisfies_the_predicate() {
    let domain = Domain::continuous(vec![(0.0, 10.0)]).unwrap();
    let mut sampler = RejectionSampler::new(Box::new(UniformSampler::new()), |s: &Solution| {
        s.as_continuous().is_some_and(|x| x[0] > 5.0)
    });
    sampler.initialize(&domain).unwrap();
    let mut ctx = ExecutionContext::with_seed(99);

    for _ in 0..1000 {
        let x = sampler.sample(&mut ctx).unwrap().as_continuous().unwrap()[0];
        assert!(x > 5.0 && x <= 10.0);
    }
}

#[test]
fn impossible_predicate_returns_once_cancelled() {
    let domain = Domain::continuous(vec![(0.0, 1.0)]).unwrap();
    let mut sampler = RejectionSampler::new(Box::new(UniformSampler::new()), |_: &Solution| false);
    sampler.initialize(&domain).unwrap();

    let token = CancellationToken::new();
    let mut ctx = ExecutionContext::with_seed(3).cancellation(token.clone());
    let canceller = std::thread::spawn(move || {
        std::thread::sleep(std::time::Duration::from_millis(20));
        token.cancel();
    });

    assert!(matches!(sampler.sample(&mut ctx), Err(Error::Cancelled)));
    canceller.join().unwrap();
}

#[test]
fn learning_is_forwarded_to_the_inner_sampler() {
    let domain = Domain::continuous(vec![(0.0, 10.0)]).unwrap();
    let mut ctx = ExecutionContext::with_seed(0);

    let mut uniform = RejectionSampler::new(Box::new(UniformSampler::new()), |_: &Solution| true);
    uniform.initialize(&domain).unwrap();
    assert!(matches!(
        uniform.learn(&mut ctx, &[Solution::Continuous(vec![1.0])]),
        Err(Error::Unsupported { .. })
    ));
}
