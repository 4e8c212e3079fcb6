use super::{Sampler, bound};
use crate::context::ExecutionContext;
use crate::domain::Domain;
use crate::solution::Solution;
use crate::{Error, Result};

const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Picks one component sampler per draw, with fixed probabilities.
///
/// Weights must be non-negative and sum to one. Every component is
/// initialized with the mixture's domain. The mixture does not adapt:
/// `learn` and `reinforce` are unsupported.
///
/// # Examples
///
/// ```
/// use moosolver::context::ExecutionContext;
/// use moosolver::domain::Domain;
/// use moosolver::sampler::{GaussianSampler, MixtureSampler, Sampler, UniformSampler};
///
/// let mut mixture = MixtureSampler::new(vec![
///     (0.9, Box::new(GaussianSampler::new()) as Box<dyn Sampler>),
///     (0.1, Box::new(UniformSampler::new())),
/// ])
/// .unwrap();
/// let domain = Domain::continuous(vec![(0.0, 1.0)]).unwrap();
/// mixture.initialize(&domain).unwrap();
/// let x = mixture.sample(&mut ExecutionContext::with_seed(3)).unwrap();
/// assert!(domain.contains(&x));
/// ```
#[derive(Clone)]
pub struct MixtureSampler {
    domain: Option<Domain>,
    weights: Vec<f64>,
    components: Vec<Box<dyn Sampler>>,
}

impl MixtureSampler {
    /// # Errors
    ///
    /// Returns [`Error::InvalidMixtureWeights`] for an empty mixture, a
    /// negative or non-finite weight, or weights not summing to one.
    pub fn new(components: Vec<(f64, Box<dyn Sampler>)>) -> Result<Self> {
        if components.is_empty() {
            return Err(Error::InvalidMixtureWeights(
                "a mixture needs at least one component".to_owned(),
            ));
        }
        let (weights, components): (Vec<f64>, Vec<_>) = components.into_iter().unzip();
        if let Some(w) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(Error::InvalidMixtureWeights(format!(
                "weight {w} is not a probability"
            )));
        }
        let total: f64 = weights.iter().sum();
        if (total - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(Error::InvalidMixtureWeights(format!(
                "weights sum to {total}, expected 1"
            )));
        }
        Ok(Self {
            domain: None,
            weights,
            components,
        })
    }

    #[must_use]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl core::fmt::Debug for MixtureSampler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MixtureSampler")
            .field("weights", &self.weights)
            .field(
                "components",
                &self.components.iter().map(|c| c.name()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

impl Sampler for MixtureSampler {
    fn name(&self) -> &'static str {
        "mixture"
    }

    fn initialize(&mut self, domain: &Domain) -> Result<()> {
        for c in &mut self.components {
            c.initialize(domain)?;
        }
        self.domain = Some(domain.clone());
        Ok(())
    }

    fn bound_domain(&self) -> Option<&Domain> {
        self.domain.as_ref()
    }

    fn sample(&self, ctx: &mut ExecutionContext) -> Result<Solution> {
        bound(self.domain.as_ref(), self.name())?;
        let k = ctx.sample_with_probabilities(&self.weights)?;
        self.components[k].sample(ctx)
    }

    fn clone_box(&self) -> Box<dyn Sampler> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DiscreteDomain;
    use crate::sampler::CategoricalSampler;

    fn uniform() -> Box<dyn Sampler> {
        Box::new(crate::sampler::UniformSampler::new())
    }

    #[test]
    fn weight_validation() {
        assert!(MixtureSampler::new(Vec::new()).is_err());
        assert!(MixtureSampler::new(vec![(0.5, uniform()), (0.4, uniform())]).is_err());
        assert!(MixtureSampler::new(vec![(1.5, uniform()), (-0.5, uniform())]).is_err());
        assert!(MixtureSampler::new(vec![(0.5, uniform()), (0.5, uniform())]).is_ok());
    }

    #[test]
    fn component_frequencies_follow_weights() {
        let pick = |i: usize| -> Box<dyn Sampler> {
            let mut w = vec![0.0; 2];
            w[i] = 1.0;
            Box::new(CategoricalSampler::new().with_weights(w))
        };
        let mut m = MixtureSampler::new(vec![(0.25, pick(0)), (0.75, pick(1))]).unwrap();
        m.initialize(&Domain::Discrete(DiscreteDomain::with_size(2)))
            .unwrap();
        let mut ctx = ExecutionContext::with_seed(18);
        let ones = (0..8000)
            .filter(|_| m.sample(&mut ctx).unwrap() == Solution::Discrete(1))
            .count();
        assert!((5_600..6_400).contains(&ones), "got {ones}");
    }

    #[test]
    fn does_not_adapt() {
        let mut m = MixtureSampler::new(vec![(1.0, uniform())]).unwrap();
        m.initialize(&Domain::continuous(vec![(0.0, 1.0)]).unwrap())
            .unwrap();
        let mut ctx = ExecutionContext::with_seed(19);
        assert!(matches!(
            m.learn(&mut ctx, &[Solution::Continuous(vec![0.1])]),
            Err(Error::Unsupported { .. })
        ));
    }
}
