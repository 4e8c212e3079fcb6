use super::{Sampler, bound};
use crate::context::ExecutionContext;
use crate::domain::Domain;
use crate::solution::Solution;
use crate::{Result, expression};

/// Uniform draws over any domain.
///
/// Continuous axes are sampled in `[lower, upper]` (an axis with
/// `lower == upper` always yields that value), discrete domains by index,
/// sequences action by action up to their maximum length, and expression
/// trees with the "grow" method: below the depth limit each node becomes
/// a leaf with probability `leaf_probability`.
///
/// # Examples
///
/// ```
/// use moosolver::context::ExecutionContext;
/// use moosolver::domain::Domain;
/// use moosolver::sampler::{Sampler, UniformSampler};
///
/// let domain = Domain::continuous(vec![(0.0, 1.0), (0.0, 1.0)]).unwrap();
/// let mut sampler = UniformSampler::new();
/// sampler.initialize(&domain).unwrap();
///
/// let mut ctx = ExecutionContext::with_seed(42);
/// let x = sampler.sample(&mut ctx).unwrap();
/// assert!(domain.contains(&x));
/// ```
#[derive(Clone, Debug)]
pub struct UniformSampler {
    domain: Option<Domain>,
    leaf_probability: f64,
}

impl UniformSampler {
    #[must_use]
    pub fn new() -> Self {
        Self {
            domain: None,
            leaf_probability: 0.3,
        }
    }

    /// Probability that an expression node above the depth limit is a leaf.
    #[must_use]
    pub fn leaf_probability(mut self, p: f64) -> Self {
        self.leaf_probability = p.clamp(0.0, 1.0);
        self
    }
}

impl Default for UniformSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for UniformSampler {
    fn name(&self) -> &'static str {
        "uniform"
    }

    fn initialize(&mut self, domain: &Domain) -> Result<()> {
        self.domain = Some(domain.clone());
        Ok(())
    }

    fn bound_domain(&self) -> Option<&Domain> {
        self.domain.as_ref()
    }

    fn sample(&self, ctx: &mut ExecutionContext) -> Result<Solution> {
        let domain = bound(self.domain.as_ref(), self.name())?;
        sample_uniform(ctx, domain, self.leaf_probability)
    }

    fn clone_box(&self) -> Box<dyn Sampler> {
        Box::new(self.clone())
    }
}

/// Uniform candidate from `domain`.
pub(crate) fn sample_uniform(
    ctx: &mut ExecutionContext,
    domain: &Domain,
    leaf_probability: f64,
) -> Result<Solution> {
    Ok(match domain {
        Domain::Continuous(d) => Solution::Continuous(
            d.bounds()
                .iter()
                .map(|&(lo, hi)| ctx.sample_double(lo, hi))
                .collect(),
        ),
        Domain::Discrete(d) => Solution::Discrete(ctx.sample_index(d.len())?),
        Domain::ScalarVector(ds) => Solution::Composite(
            ds.iter()
                .map(|d| {
                    Solution::Continuous(
                        d.bounds()
                            .iter()
                            .map(|&(lo, hi)| ctx.sample_double(lo, hi))
                            .collect(),
                    )
                })
                .collect(),
        ),
        Domain::Vector(v) => Solution::Composite(
            (0..v.length())
                .map(|_| sample_uniform(ctx, v.element(), leaf_probability))
                .collect::<Result<_>>()?,
        ),
        Domain::Expression(e) => {
            Solution::Tree(expression::grow(ctx, e, e.max_depth(), leaf_probability)?)
        }
        Domain::Sequence(s) => Solution::Trajectory(
            (0..s.max_length)
                .map(|_| ctx.sample_index(s.n_actions))
                .collect::<Result<_>>()?,
        ),
    })
}
