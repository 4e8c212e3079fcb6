use super::{Sampler, bound, check_learning_rate, non_empty};
use crate::context::ExecutionContext;
use crate::domain::{ContinuousDomain, Domain};
use crate::solution::Solution;
use crate::{Error, Result};

/// Smallest standard deviation kept after `learn`, as a fraction of the
/// axis width.
const MIN_STD_FRACTION: f64 = 1e-9;

/// Independent normal distribution per axis of a continuous box.
///
/// After `initialize` the means sit at the box centre and each standard
/// deviation is a quarter of the axis width. Draws are clamped into the box.
/// [`learn`](Sampler::learn) replaces means and deviations by the sample
/// statistics of the batch; [`reinforce`](Sampler::reinforce) moves the
/// means toward one candidate by the learning rate.
#[derive(Clone, Debug)]
pub struct GaussianSampler {
    domain: Option<Domain>,
    means: Vec<f64>,
    std_devs: Vec<f64>,
    learning_rate: f64,
}

impl GaussianSampler {
    #[must_use]
    pub fn new() -> Self {
        Self {
            domain: None,
            means: Vec::new(),
            std_devs: Vec::new(),
            learning_rate: 0.1,
        }
    }

    /// Step size of `reinforce`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] outside `[0, 1]`.
    pub fn learning_rate(mut self, rate: f64) -> Result<Self> {
        self.learning_rate = check_learning_rate(rate)?;
        Ok(self)
    }

    #[must_use]
    pub fn means(&self) -> &[f64] {
        &self.means
    }

    #[must_use]
    pub fn std_devs(&self) -> &[f64] {
        &self.std_devs
    }

    fn bounds(&self) -> Result<&ContinuousDomain> {
        match bound(self.domain.as_ref(), self.name())? {
            Domain::Continuous(d) => Ok(d),
            other => Err(Error::DomainMismatch {
                expected: "continuous domain",
                got: other.kind(),
            }),
        }
    }
}

impl Default for GaussianSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for GaussianSampler {
    fn name(&self) -> &'static str {
        "gaussian"
    }

    fn initialize(&mut self, domain: &Domain) -> Result<()> {
        let Domain::Continuous(d) = domain else {
            return Err(Error::DomainMismatch {
                expected: "continuous domain",
                got: domain.kind(),
            });
        };
        self.means = d.center();
        self.std_devs = d.bounds().iter().map(|(lo, hi)| (hi - lo) / 4.0).collect();
        self.domain = Some(domain.clone());
        Ok(())
    }

    fn bound_domain(&self) -> Option<&Domain> {
        self.domain.as_ref()
    }

    fn sample(&self, ctx: &mut ExecutionContext) -> Result<Solution> {
        let d = self.bounds()?;
        let x = self
            .means
            .iter()
            .zip(&self.std_devs)
            .zip(d.bounds())
            .map(|((&mean, &sd), &(lo, hi))| ctx.sample_gaussian(mean, sd).clamp(lo, hi))
            .collect();
        Ok(Solution::Continuous(x))
    }

    #[allow(clippy::cast_precision_loss)]
    fn learn(&mut self, _ctx: &mut ExecutionContext, solutions: &[Solution]) -> Result<()> {
        non_empty(solutions, self.name())?;
        let d = self.bounds()?.clone();
        let domain = Domain::Continuous(d.clone());
        let points = solutions
            .iter()
            .map(|s| {
                domain.check(s)?;
                s.continuous()
            })
            .collect::<Result<Vec<_>>>()?;

        let n = points.len() as f64;
        for (axis, &(lo, hi)) in d.bounds().iter().enumerate() {
            let mean = points.iter().map(|p| p[axis]).sum::<f64>() / n;
            let var = points.iter().map(|p| (p[axis] - mean).powi(2)).sum::<f64>() / n;
            self.means[axis] = mean;
            self.std_devs[axis] = var.sqrt().max(MIN_STD_FRACTION * (hi - lo));
        }
        trace_debug!(means = ?self.means, "gaussian sampler refit");
        Ok(())
    }

    fn reinforce(&mut self, _ctx: &mut ExecutionContext, solution: &Solution) -> Result<()> {
        let d = self.bounds()?.clone();
        Domain::Continuous(d).check(solution)?;
        let x = solution.continuous()?;
        for (mean, &xi) in self.means.iter_mut().zip(x) {
            *mean += self.learning_rate * (xi - *mean);
        }
        Ok(())
    }

    fn clone_box(&self) -> Box<dyn Sampler> {
        Box::new(self.clone())
    }
}
