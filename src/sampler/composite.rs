use super::{Sampler, bound, non_empty};
use crate::context::ExecutionContext;
use crate::domain::Domain;
use crate::solution::Solution;
use crate::{Error, Result};

/// One sub-sampler per field of a composite domain.
///
/// Accepts scalar-vector and vector domains whose field count equals the
/// number of sub-samplers. Each sub-sampler is bound to its field's domain,
/// and `learn` / `reinforce` are applied field by field.
#[derive(Clone)]
pub struct CompositeSampler {
    domain: Option<Domain>,
    fields: Vec<Box<dyn Sampler>>,
}

impl CompositeSampler {
    #[must_use]
    pub fn new(fields: Vec<Box<dyn Sampler>>) -> Self {
        Self {
            domain: None,
            fields,
        }
    }

    #[must_use]
    pub fn field(&self, i: usize) -> Option<&dyn Sampler> {
        self.fields.get(i).map(AsRef::as_ref)
    }

    fn field_values<'a>(&self, solution: &'a Solution) -> Result<&'a [Solution]> {
        match solution {
            Solution::Composite(values) if values.len() == self.fields.len() => Ok(values),
            other => Err(Error::SolutionMismatch {
                expected: format!("composite of {} fields", self.fields.len()),
                got: other.shape(),
            }),
        }
    }
}

impl core::fmt::Debug for CompositeSampler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CompositeSampler")
            .field(
                "fields",
                &self.fields.iter().map(|c| c.name()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

impl Sampler for CompositeSampler {
    fn name(&self) -> &'static str {
        "composite"
    }

    fn initialize(&mut self, domain: &Domain) -> Result<()> {
        if domain.n_fields() != Some(self.fields.len()) {
            return Err(Error::DomainMismatch {
                expected: "composite domain with one field per sub-sampler",
                got: domain.kind(),
            });
        }
        for (i, sampler) in self.fields.iter_mut().enumerate() {
            let field = domain
                .field_domain(i)
                .ok_or(Error::Internal("composite field without a domain"))?;
            sampler.initialize(&field)?;
        }
        self.domain = Some(domain.clone());
        Ok(())
    }

    fn bound_domain(&self) -> Option<&Domain> {
        self.domain.as_ref()
    }

    fn sample(&self, ctx: &mut ExecutionContext) -> Result<Solution> {
        bound(self.domain.as_ref(), self.name())?;
        self.fields
            .iter()
            .map(|s| s.sample(ctx))
            .collect::<Result<Vec<_>>>()
            .map(Solution::Composite)
    }

    fn learn(&mut self, ctx: &mut ExecutionContext, solutions: &[Solution]) -> Result<()> {
        bound(self.domain.as_ref(), self.name())?;
        non_empty(solutions, self.name())?;
        let rows = solutions
            .iter()
            .map(|s| self.field_values(s))
            .collect::<Result<Vec<_>>>()?;
        for (i, sampler) in self.fields.iter_mut().enumerate() {
            let column: Vec<Solution> = rows.iter().map(|r| r[i].clone()).collect();
            sampler.learn(ctx, &column)?;
        }
        Ok(())
    }

    fn reinforce(&mut self, ctx: &mut ExecutionContext, solution: &Solution) -> Result<()> {
        bound(self.domain.as_ref(), self.name())?;
        let values = self.field_values(solution)?;
        for (sampler, value) in self.fields.iter_mut().zip(values) {
            sampler.reinforce(ctx, value)?;
        }
        Ok(())
    }

    fn clone_box(&self) -> Box<dyn Sampler> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ContinuousDomain;
    use crate::sampler::{GaussianSampler, UniformSampler};

    fn two_boxes() -> Domain {
        Domain::ScalarVector(vec![
            ContinuousDomain::uniform(1, 0.0, 1.0).unwrap(),
            ContinuousDomain::uniform(2, -5.0, 5.0).unwrap(),
        ])
    }

    #[test]
    fn samples_each_field_from_its_domain() {
        let mut s = CompositeSampler::new(vec![
            Box::new(UniformSampler::new()),
            Box::new(GaussianSampler::new()),
        ]);
        s.initialize(&two_boxes()).unwrap();
        let mut ctx = ExecutionContext::with_seed(23);
        for _ in 0..200 {
            assert!(two_boxes().contains(&s.sample(&mut ctx).unwrap()));
        }
    }

    #[test]
    fn field_count_must_match() {
        let mut s = CompositeSampler::new(vec![Box::new(UniformSampler::new())]);
        assert!(matches!(
            s.initialize(&two_boxes()),
            Err(Error::DomainMismatch { .. })
        ));
    }

    #[test]
    fn learn_is_applied_per_field() {
        let mut s = CompositeSampler::new(vec![
            Box::new(GaussianSampler::new()),
            Box::new(GaussianSampler::new()),
        ]);
        s.initialize(&two_boxes()).unwrap();
        let mut ctx = ExecutionContext::with_seed(24);
        let example = Solution::Composite(vec![
            Solution::Continuous(vec![0.25]),
            Solution::Continuous(vec![1.0, -1.0]),
        ]);
        s.learn(&mut ctx, std::slice::from_ref(&example)).unwrap();
        let x = s.sample(&mut ctx).unwrap();
        let first = x.field(0).and_then(Solution::as_continuous).unwrap();
        assert!((first[0] - 0.25).abs() < 1e-6);

        // a uniform field cannot learn, so the whole call fails
        let mut mixed = CompositeSampler::new(vec![
            Box::new(GaussianSampler::new()),
            Box::new(UniformSampler::new()),
        ]);
        mixed.initialize(&two_boxes()).unwrap();
        assert!(mixed.learn(&mut ctx, &[example]).is_err());
    }
}
