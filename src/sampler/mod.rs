//! Candidate generators.
//!
//! A [`Sampler`] is bound to one [`Domain`] by
//! [`initialize`](Sampler::initialize) and then draws candidates from it.
//! Adaptive samplers also implement [`learn`](Sampler::learn) (fit to a
//! batch of good candidates, as in estimation-of-distribution algorithms)
//! and/or [`reinforce`](Sampler::reinforce) (shift toward one example).
//! Non-adaptive samplers reject both with [`Error::Unsupported`] rather
//! than ignoring them.
//!
//! | Sampler | Domains | `learn` | `reinforce` |
//! |---|---|---|---|
//! | [`UniformSampler`] | all | no | no |
//! | [`GaussianSampler`] | continuous | mean / std-dev fit | mean shift |
//! | [`BernoulliSampler`] | two-element discrete | frequency | probability shift |
//! | [`CategoricalSampler`] | discrete | frequencies | probability shift |
//! | [`MixtureSampler`] | any its components accept | no | no |
//! | [`RejectionSampler`] | any its inner sampler accepts | delegated | delegated |
//! | [`CompositeSampler`] | scalar-vector / vector | per field | per field |

mod bernoulli;
mod categorical;
mod composite;
mod gaussian;
mod mixture;
mod rejection;
mod uniform;

pub use bernoulli::BernoulliSampler;
pub use categorical::CategoricalSampler;
pub use composite::CompositeSampler;
pub use gaussian::GaussianSampler;
pub use mixture::MixtureSampler;
pub use rejection::RejectionSampler;
pub(crate) use uniform::sample_uniform;
pub use uniform::UniformSampler;

use crate::context::ExecutionContext;
use crate::domain::Domain;
use crate::solution::Solution;
use crate::{Error, Result};

/// Draws candidates from a bound domain.
pub trait Sampler: Send + Sync {
    /// Short name used in errors and logs.
    fn name(&self) -> &'static str;

    /// Binds the sampler to `domain`, resetting any learned state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DomainMismatch`] when the sampler does not support
    /// this kind of domain.
    fn initialize(&mut self, domain: &Domain) -> Result<()>;

    /// The domain given to the last successful `initialize`.
    fn bound_domain(&self) -> Option<&Domain>;

    /// Draws one candidate from the bound domain.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SamplerNotInitialized`] before `initialize`, or a
    /// degenerate-domain error such as [`Error::EmptyDomain`].
    fn sample(&self, ctx: &mut ExecutionContext) -> Result<Solution>;

    /// [`sample`](Self::sample), after checking that `domain` is the bound one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DomainMismatch`] when the sampler was initialized
    /// with another domain.
    fn sample_from(&self, ctx: &mut ExecutionContext, domain: &Domain) -> Result<Solution> {
        match self.bound_domain() {
            None => Err(Error::SamplerNotInitialized(self.name())),
            Some(bound) if bound != domain => Err(Error::DomainMismatch {
                expected: "the domain the sampler was initialized with",
                got: domain.kind(),
            }),
            Some(_) => self.sample(ctx),
        }
    }

    /// Fits the sampler to a batch of candidates.
    ///
    /// # Errors
    ///
    /// The default implementation returns [`Error::Unsupported`].
    fn learn(&mut self, _ctx: &mut ExecutionContext, _solutions: &[Solution]) -> Result<()> {
        Err(Error::Unsupported {
            operation: "learn",
            component: self.name(),
        })
    }

    /// Moves the sampler toward one candidate.
    ///
    /// # Errors
    ///
    /// The default implementation returns [`Error::Unsupported`].
    fn reinforce(&mut self, _ctx: &mut ExecutionContext, _solution: &Solution) -> Result<()> {
        Err(Error::Unsupported {
            operation: "reinforce",
            component: self.name(),
        })
    }

    /// Boxed copy, including learned state.
    fn clone_box(&self) -> Box<dyn Sampler>;
}

impl Clone for Box<dyn Sampler> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// The bound domain, or [`Error::SamplerNotInitialized`].
pub(crate) fn bound<'a>(domain: Option<&'a Domain>, name: &'static str) -> Result<&'a Domain> {
    domain.ok_or(Error::SamplerNotInitialized(name))
}

/// Rejects an empty training batch.
pub(crate) fn non_empty(solutions: &[Solution], name: &'static str) -> Result<()> {
    if solutions.is_empty() {
        Err(Error::InvalidConfig(format!(
            "{name} cannot learn from an empty batch"
        )))
    } else {
        Ok(())
    }
}

pub(crate) fn check_learning_rate(rate: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(Error::InvalidConfig(format!(
            "learning rate {rate} must be in [0, 1]"
        )))
    }
}
