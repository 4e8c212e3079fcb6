use std::sync::Arc;

use super::Sampler;
use crate::context::ExecutionContext;
use crate::domain::Domain;
use crate::solution::Solution;
use crate::{Error, Result};

type Predicate = Arc<dyn Fn(&Solution) -> bool + Send + Sync>;

const LOG_EVERY: u64 = 10_000;

/// Redraws from an inner sampler until a predicate accepts the candidate.
///
/// There is no attempt limit: if the predicate rejects (almost) everything
/// the inner sampler produces, [`sample`](Sampler::sample) does not return
/// until the context is cancelled, in which case it fails with
/// [`Error::Cancelled`]. `learn` and `reinforce` are forwarded to the inner
/// sampler.
#[derive(Clone)]
pub struct RejectionSampler {
    inner: Box<dyn Sampler>,
    predicate: Predicate,
}

impl RejectionSampler {
    pub fn new(
        inner: Box<dyn Sampler>,
        predicate: impl Fn(&Solution) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            inner,
            predicate: Arc::new(predicate),
        }
    }

    #[must_use]
    pub fn inner(&self) -> &dyn Sampler {
        self.inner.as_ref()
    }
}

impl core::fmt::Debug for RejectionSampler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RejectionSampler")
            .field("inner", &self.inner.name())
            .finish_non_exhaustive()
    }
}

impl Sampler for RejectionSampler {
    fn name(&self) -> &'static str {
        "rejection"
    }

    fn initialize(&mut self, domain: &Domain) -> Result<()> {
        self.inner.initialize(domain)
    }

    fn bound_domain(&self) -> Option<&Domain> {
        self.inner.bound_domain()
    }

    fn sample(&self, ctx: &mut ExecutionContext) -> Result<Solution> {
        let mut rejected: u64 = 0;
        loop {
            if ctx.is_cancelled() {
                return Err(Error::Cancelled);
            }
            let candidate = self.inner.sample(ctx)?;
            if (self.predicate)(&candidate) {
                return Ok(candidate);
            }
            rejected += 1;
            if rejected % LOG_EVERY == 0 {
                trace_debug!(rejected, "rejection sampler still searching");
            }
        }
    }

    fn learn(&mut self, ctx: &mut ExecutionContext, solutions: &[Solution]) -> Result<()> {
        self.inner.learn(ctx, solutions)
    }

    fn reinforce(&mut self, ctx: &mut ExecutionContext, solution: &Solution) -> Result<()> {
        self.inner.reinforce(ctx, solution)
    }

    fn clone_box(&self) -> Box<dyn Sampler> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CancellationToken;
    use crate::domain::DiscreteDomain;
    use crate::sampler::{GaussianSampler, UniformSampler};

    #[test]
    fn only_accepted_candidates_are_returned() {
        let mut s = RejectionSampler::new(Box::new(UniformSampler::new()), |x| {
            x.as_continuous().is_some_and(|v| v[0] + v[1] <= 1.0)
        });
        s.initialize(&Domain::continuous(vec![(0.0, 1.0), (0.0, 1.0)]).unwrap())
            .unwrap();
        let mut ctx = ExecutionContext::with_seed(20);
        for _ in 0..500 {
            let x = s.sample(&mut ctx).unwrap();
            let v = x.as_continuous().unwrap();
            assert!(v[0] + v[1] <= 1.0);
        }
    }

    #[test]
    fn impossible_predicate_stops_on_cancellation() {
        let mut s = RejectionSampler::new(Box::new(UniformSampler::new()), |_| false);
        s.initialize(&Domain::Discrete(DiscreteDomain::with_size(3)))
            .unwrap();
        let token = CancellationToken::new();
        token.cancel();
        let mut ctx = ExecutionContext::with_seed(21).cancellation(token);
        assert!(matches!(s.sample(&mut ctx), Err(Error::Cancelled)));
    }

    #[test]
    fn learning_is_forwarded() {
        let mut s = RejectionSampler::new(Box::new(GaussianSampler::new()), |_| true);
        s.initialize(&Domain::continuous(vec![(0.0, 1.0)]).unwrap())
            .unwrap();
        let mut ctx = ExecutionContext::with_seed(22);
        s.learn(&mut ctx, &[Solution::Continuous(vec![0.9])])
            .unwrap();
        for _ in 0..20 {
            let x = s.sample(&mut ctx).unwrap();
            assert!((x.as_continuous().unwrap()[0] - 0.9).abs() < 1e-6);
        }
        let mut plain = RejectionSampler::new(Box::new(UniformSampler::new()), |_| true);
        assert!(plain.learn(&mut ctx, &[]).is_err());
    }
}
