use super::{Sampler, bound, check_learning_rate, non_empty};
use crate::context::ExecutionContext;
use crate::domain::Domain;
use crate::solution::Solution;
use crate::{Error, Result};

/// Categorical distribution over a discrete domain.
///
/// Starts uniform unless explicit weights are given. `learn` sets the
/// probabilities to the observed frequencies; `reinforce` blends them with
/// the indicator of one value.
#[derive(Clone, Debug)]
pub struct CategoricalSampler {
    domain: Option<Domain>,
    initial: Option<Vec<f64>>,
    probabilities: Vec<f64>,
    learning_rate: f64,
}

impl CategoricalSampler {
    #[must_use]
    pub fn new() -> Self {
        Self {
            domain: None,
            initial: None,
            probabilities: Vec::new(),
            learning_rate: 0.1,
        }
    }

    /// Initial weights, normalized at `initialize`. Their length must match
    /// the domain size.
    #[must_use]
    pub fn with_weights(mut self, weights: Vec<f64>) -> Self {
        self.initial = Some(weights);
        self
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] outside `[0, 1]`.
    pub fn learning_rate(mut self, rate: f64) -> Result<Self> {
        self.learning_rate = check_learning_rate(rate)?;
        Ok(self)
    }

    #[must_use]
    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    fn value(&self, solution: &Solution) -> Result<usize> {
        match solution {
            Solution::Discrete(i) if *i < self.probabilities.len() => Ok(*i),
            other => Err(Error::SolutionMismatch {
                expected: format!("discrete value below {}", self.probabilities.len()),
                got: other.shape(),
            }),
        }
    }
}

impl Default for CategoricalSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for CategoricalSampler {
    fn name(&self) -> &'static str {
        "categorical"
    }

    #[allow(clippy::cast_precision_loss)]
    fn initialize(&mut self, domain: &Domain) -> Result<()> {
        let Domain::Discrete(d) = domain else {
            return Err(Error::DomainMismatch {
                expected: "discrete domain",
                got: domain.kind(),
            });
        };
        if d.is_empty() {
            return Err(Error::EmptyDomain);
        }
        self.probabilities = match &self.initial {
            None => vec![1.0 / d.len() as f64; d.len()],
            Some(w) => {
                if w.len() != d.len() {
                    return Err(Error::InvalidConfig(format!(
                        "{} weights for a domain of {} values",
                        w.len(),
                        d.len()
                    )));
                }
                if w.iter().any(|&x| !x.is_finite() || x < 0.0) {
                    return Err(Error::InvalidConfig(
                        "categorical weights must be finite and non-negative".to_owned(),
                    ));
                }
                let total: f64 = w.iter().sum();
                if total <= 0.0 {
                    return Err(Error::ZeroWeights);
                }
                w.iter().map(|x| x / total).collect()
            }
        };
        self.domain = Some(domain.clone());
        Ok(())
    }

    fn bound_domain(&self) -> Option<&Domain> {
        self.domain.as_ref()
    }

    fn sample(&self, ctx: &mut ExecutionContext) -> Result<Solution> {
        bound(self.domain.as_ref(), self.name())?;
        ctx.sample_with_probabilities(&self.probabilities)
            .map(Solution::Discrete)
    }

    #[allow(clippy::cast_precision_loss)]
    fn learn(&mut self, _ctx: &mut ExecutionContext, solutions: &[Solution]) -> Result<()> {
        bound(self.domain.as_ref(), self.name())?;
        non_empty(solutions, self.name())?;
        let mut counts = vec![0usize; self.probabilities.len()];
        for s in solutions {
            counts[self.value(s)?] += 1;
        }
        let n = solutions.len() as f64;
        for (p, c) in self.probabilities.iter_mut().zip(counts) {
            *p = c as f64 / n;
        }
        Ok(())
    }

    fn reinforce(&mut self, _ctx: &mut ExecutionContext, solution: &Solution) -> Result<()> {
        bound(self.domain.as_ref(), self.name())?;
        let chosen = self.value(solution)?;
        let rate = self.learning_rate;
        for (i, p) in self.probabilities.iter_mut().enumerate() {
            let target = if i == chosen { 1.0 } else { 0.0 };
            *p = (1.0 - rate) * *p + rate * target;
        }
        Ok(())
    }

    fn clone_box(&self) -> Box<dyn Sampler> {
        Box::new(self.clone())
    }
}
