use super::{Sampler, bound, check_learning_rate, non_empty};
use crate::context::ExecutionContext;
use crate::domain::Domain;
use crate::solution::Solution;
use crate::{Error, Result};

/// Coin flip over a two-element discrete domain: yields `Discrete(1)` with
/// probability `p`, `Discrete(0)` otherwise.
#[derive(Clone, Debug)]
pub struct BernoulliSampler {
    domain: Option<Domain>,
    initial: f64,
    probability: f64,
    learning_rate: f64,
}

impl BernoulliSampler {
    /// # Errors
    ///
    /// Returns [`Error::InvalidProbability`] outside `[0, 1]`.
    pub fn new(probability: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(Error::InvalidProbability(probability));
        }
        Ok(Self {
            domain: None,
            initial: probability,
            probability,
            learning_rate: 0.1,
        })
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] outside `[0, 1]`.
    pub fn learning_rate(mut self, rate: f64) -> Result<Self> {
        self.learning_rate = check_learning_rate(rate)?;
        Ok(self)
    }

    #[must_use]
    pub fn probability(&self) -> f64 {
        self.probability
    }

    fn outcome(&self, solution: &Solution) -> Result<f64> {
        match solution {
            Solution::Discrete(0) => Ok(0.0),
            Solution::Discrete(1) => Ok(1.0),
            other => Err(Error::SolutionMismatch {
                expected: "discrete value 0 or 1".to_owned(),
                got: other.shape(),
            }),
        }
    }
}

impl Default for BernoulliSampler {
    fn default() -> Self {
        Self {
            domain: None,
            initial: 0.5,
            probability: 0.5,
            learning_rate: 0.1,
        }
    }
}

impl Sampler for BernoulliSampler {
    fn name(&self) -> &'static str {
        "bernoulli"
    }

    fn initialize(&mut self, domain: &Domain) -> Result<()> {
        match domain {
            Domain::Discrete(d) if d.len() == 2 => {
                self.domain = Some(domain.clone());
                self.probability = self.initial;
                Ok(())
            }
            _ => Err(Error::DomainMismatch {
                expected: "two-element discrete domain",
                got: domain.kind(),
            }),
        }
    }

    fn bound_domain(&self) -> Option<&Domain> {
        self.domain.as_ref()
    }

    fn sample(&self, ctx: &mut ExecutionContext) -> Result<Solution> {
        bound(self.domain.as_ref(), self.name())?;
        Ok(Solution::Discrete(usize::from(
            ctx.sample_bool(self.probability),
        )))
    }

    #[allow(clippy::cast_precision_loss)]
    fn learn(&mut self, _ctx: &mut ExecutionContext, solutions: &[Solution]) -> Result<()> {
        bound(self.domain.as_ref(), self.name())?;
        non_empty(solutions, self.name())?;
        let mut ones = 0.0;
        for s in solutions {
            ones += self.outcome(s)?;
        }
        self.probability = ones / solutions.len() as f64;
        Ok(())
    }

    fn reinforce(&mut self, _ctx: &mut ExecutionContext, solution: &Solution) -> Result<()> {
        bound(self.domain.as_ref(), self.name())?;
        let x = self.outcome(solution)?;
        self.probability += self.learning_rate * (x - self.probability);
        Ok(())
    }

    fn clone_box(&self) -> Box<dyn Sampler> {
        Box::new(self.clone())
    }
}
