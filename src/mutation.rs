//! Variation operators: mutations, SBX crossover and hill-climbing local
//! search.
//!
//! A [`Mutation`] never changes its input; it returns a new candidate of the
//! same shape.

use crate::context::ExecutionContext;
use crate::domain::{ContinuousDomain, Domain, ExpressionDomain};
use crate::expression::{self, Expression};
use crate::fitness::Fitness;
use crate::sampler::sample_uniform;
use crate::solution::Solution;
use crate::{Error, Result};

/// Produces a perturbed copy of a candidate.
pub trait Mutation: Send + Sync {
    fn name(&self) -> &'static str;

    /// Mutated copy of `solution`, which belongs to `domain`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DomainMismatch`] for a domain the operator does not
    /// handle and [`Error::SolutionMismatch`] for a badly shaped candidate.
    fn mutate(
        &self,
        ctx: &mut ExecutionContext,
        domain: &Domain,
        solution: &Solution,
    ) -> Result<Solution>;

    fn clone_box(&self) -> Box<dyn Mutation>;
}

impl Clone for Box<dyn Mutation> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Applies `f` to each axis of a continuous candidate, or of every
/// continuous field of a composite one.
fn map_continuous(
    ctx: &mut ExecutionContext,
    domain: &Domain,
    solution: &Solution,
    f: &mut dyn FnMut(&mut ExecutionContext, &ContinuousDomain, &[f64]) -> Vec<f64>,
) -> Result<Solution> {
    domain.check(solution)?;
    match (domain, solution) {
        (Domain::Continuous(d), Solution::Continuous(x)) => Ok(Solution::Continuous(f(ctx, d, x))),
        (Domain::ScalarVector(_) | Domain::Vector(_), Solution::Composite(fields)) => fields
            .iter()
            .enumerate()
            .map(|(i, field)| {
                let sub = domain
                    .field_domain(i)
                    .ok_or(Error::Internal("composite field without a domain"))?;
                map_continuous(ctx, &sub, field, &mut *f)
            })
            .collect::<Result<Vec<_>>>()
            .map(Solution::Composite),
        _ => Err(Error::DomainMismatch {
            expected: "continuous domain",
            got: domain.kind(),
        }),
    }
}

#[allow(clippy::cast_precision_loss)]
fn default_probability(probability: Option<f64>, n: usize) -> f64 {
    probability.unwrap_or(if n == 0 { 0.0 } else { 1.0 / n as f64 })
}

// ---------------------------------------------------------------------------
// Gaussian
// ---------------------------------------------------------------------------

/// Adds normal noise to each axis with probability `probability` (default
/// `1/n`), scaled by `scale` times the axis width, then clamps into the box.
#[derive(Clone, Debug)]
pub struct GaussianMutation {
    scale: f64,
    probability: Option<f64>,
}

impl GaussianMutation {
    #[must_use]
    pub fn new(scale: f64) -> Self {
        Self {
            scale: scale.abs(),
            probability: None,
        }
    }

    /// Per-axis mutation probability.
    #[must_use]
    pub fn probability(mut self, p: f64) -> Self {
        self.probability = Some(p.clamp(0.0, 1.0));
        self
    }
}

impl Default for GaussianMutation {
    fn default() -> Self {
        Self::new(0.1)
    }
}

impl Mutation for GaussianMutation {
    fn name(&self) -> &'static str {
        "gaussian mutation"
    }

    fn mutate(
        &self,
        ctx: &mut ExecutionContext,
        domain: &Domain,
        solution: &Solution,
    ) -> Result<Solution> {
        map_continuous(ctx, domain, solution, &mut |ctx, d, x| {
            let p = default_probability(self.probability, x.len());
            x.iter()
                .zip(d.bounds())
                .map(|(&xi, &(lo, hi))| {
                    if ctx.sample_bool(p) {
                        ctx.sample_gaussian(xi, self.scale * (hi - lo)).clamp(lo, hi)
                    } else {
                        xi
                    }
                })
                .collect()
        })
    }

    fn clone_box(&self) -> Box<dyn Mutation> {
        Box::new(self.clone())
    }
}

// ---------------------------------------------------------------------------
// Polynomial
// ---------------------------------------------------------------------------

/// Deb's polynomial mutation with distribution index `eta`; each axis
/// mutates with probability `probability` (default `1/n`).
#[derive(Clone, Debug)]
pub struct PolynomialMutation {
    eta: f64,
    probability: Option<f64>,
}

impl PolynomialMutation {
    #[must_use]
    pub fn new(eta: f64) -> Self {
        Self {
            eta,
            probability: None,
        }
    }

    #[must_use]
    pub fn probability(mut self, p: f64) -> Self {
        self.probability = Some(p.clamp(0.0, 1.0));
        self
    }
}

impl Default for PolynomialMutation {
    fn default() -> Self {
        Self::new(20.0)
    }
}

impl Mutation for PolynomialMutation {
    fn name(&self) -> &'static str {
        "polynomial mutation"
    }

    fn mutate(
        &self,
        ctx: &mut ExecutionContext,
        domain: &Domain,
        solution: &Solution,
    ) -> Result<Solution> {
        map_continuous(ctx, domain, solution, &mut |ctx, d, x| {
            let p = default_probability(self.probability, x.len());
            x.iter()
                .zip(d.bounds())
                .map(|(&xi, &(lo, hi))| {
                    if ctx.sample_bool(p) {
                        polynomial_step(ctx, xi, lo, hi, self.eta)
                    } else {
                        xi
                    }
                })
                .collect()
        })
    }

    fn clone_box(&self) -> Box<dyn Mutation> {
        Box::new(self.clone())
    }
}

/// One polynomial-mutation step of `x` inside `[low, high]`.
fn polynomial_step(
    ctx: &mut ExecutionContext,
    x: f64,
    low: f64,
    high: f64,
    eta: f64,
) -> f64 {
    let range = high - low;
    if range <= 0.0 {
        return x;
    }
    let u = ctx.sample_double(0.0, 1.0);
    let delta1 = (x - low) / range;
    let delta2 = (high - x) / range;

    let delta_q = if u < 0.5 {
        let xy = 1.0 - delta1;
        let val = 2.0 * u + (1.0 - 2.0 * u) * xy.powf(eta + 1.0);
        val.powf(1.0 / (eta + 1.0)) - 1.0
    } else {
        let xy = 1.0 - delta2;
        let val = 2.0 * (1.0 - u) + 2.0 * (u - 0.5) * xy.powf(eta + 1.0);
        1.0 - val.powf(1.0 / (eta + 1.0))
    };

    (x + delta_q * range).clamp(low, high)
}

// ---------------------------------------------------------------------------
// Resample
// ---------------------------------------------------------------------------

/// Redraws one randomly chosen component uniformly: an axis of a
/// continuous vector, the value of a discrete choice, one step of a
/// trajectory, one subtree of an expression, or (recursively) one field of
/// a composite.
#[derive(Clone, Debug, Default)]
pub struct ResampleMutation;

impl ResampleMutation {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Mutation for ResampleMutation {
    fn name(&self) -> &'static str {
        "resample mutation"
    }

    fn mutate(
        &self,
        ctx: &mut ExecutionContext,
        domain: &Domain,
        solution: &Solution,
    ) -> Result<Solution> {
        domain.check(solution)?;
        Ok(match (domain, solution) {
            (Domain::Continuous(d), Solution::Continuous(x)) => {
                let mut y = x.clone();
                if !y.is_empty() {
                    let axis = ctx.sample_index(y.len())?;
                    y[axis] = ctx.sample_double(d.lower(axis), d.upper(axis));
                }
                Solution::Continuous(y)
            }
            (Domain::Discrete(_), Solution::Discrete(_)) => sample_uniform(ctx, domain, 0.0)?,
            (Domain::Sequence(s), Solution::Trajectory(t)) => {
                let mut t = t.clone();
                if !t.is_empty() {
                    let step = ctx.sample_index(t.len())?;
                    t[step] = ctx.sample_index(s.n_actions)?;
                }
                Solution::Trajectory(t)
            }
            (Domain::Expression(e), Solution::Tree(tree)) => {
                let target = ctx.sample_index(tree.size())?;
                let mut counter = 0;
                Solution::Tree(replace_subtree(ctx, e, tree, target, 1, &mut counter)?)
            }
            (_, Solution::Composite(fields)) => {
                let i = ctx.sample_index(fields.len())?;
                let sub = domain
                    .field_domain(i)
                    .ok_or(Error::Internal("composite field without a domain"))?;
                let mutated = self.mutate(ctx, &sub, &fields[i])?;
                solution.with_field(i, mutated)?
            }
            _ => {
                return Err(Error::Internal("domain check accepted a foreign shape"));
            }
        })
    }

    fn clone_box(&self) -> Box<dyn Mutation> {
        Box::new(self.clone())
    }
}

/// Copy of `tree` where the `target`-th node in pre-order is replaced by a
/// freshly grown subtree that keeps the whole tree within the depth limit.
fn replace_subtree(
    ctx: &mut ExecutionContext,
    domain: &ExpressionDomain,
    tree: &Expression,
    target: usize,
    depth: usize,
    counter: &mut usize,
) -> Result<Expression> {
    let here = *counter;
    *counter += 1;
    if here == target {
        let budget = domain.max_depth().saturating_sub(depth) + 1;
        return expression::grow(ctx, domain, budget, 0.3);
    }
    match tree {
        Expression::Apply {
            operator,
            arguments,
        } => {
            let arguments = arguments
                .iter()
                .map(|a| replace_subtree(ctx, domain, a, target, depth + 1, counter))
                .collect::<Result<Vec<_>>>()?;
            Ok(Expression::apply(*operator, arguments))
        }
        leaf => Ok(leaf.clone()),
    }
}

// ---------------------------------------------------------------------------
// Crossover
// ---------------------------------------------------------------------------

/// Simulated binary crossover of two points of `domain`.
///
/// Each axis is recombined with probability 1/2 using distribution index
/// `eta`; the other axes are copied from the parents. Children are clamped
/// into the box.
///
/// # Errors
///
/// Returns [`Error::SolutionMismatch`] when a parent has the wrong length.
pub fn sbx_crossover(
    ctx: &mut ExecutionContext,
    domain: &ContinuousDomain,
    a: &[f64],
    b: &[f64],
    eta: f64,
) -> Result<(Vec<f64>, Vec<f64>)> {
    let n = domain.n_dimensions();
    if a.len() != n || b.len() != n {
        return Err(Error::SolutionMismatch {
            expected: format!("continuous[{n}]"),
            got: format!("continuous[{}] and continuous[{}]", a.len(), b.len()),
        });
    }
    let mut c1 = a.to_vec();
    let mut c2 = b.to_vec();
    for (axis, &(lo, hi)) in domain.bounds().iter().enumerate() {
        if !ctx.sample_bool(0.5) || (a[axis] - b[axis]).abs() < 1e-14 {
            continue;
        }
        let u = ctx.sample_double(0.0, 1.0);
        let beta = if u <= 0.5 {
            (2.0 * u).powf(1.0 / (eta + 1.0))
        } else {
            (1.0 / (2.0 * (1.0 - u))).powf(1.0 / (eta + 1.0))
        };
        c1[axis] = (0.5 * ((1.0 + beta) * a[axis] + (1.0 - beta) * b[axis])).clamp(lo, hi);
        c2[axis] = (0.5 * ((1.0 - beta) * a[axis] + (1.0 + beta) * b[axis])).clamp(lo, hi);
    }
    Ok((c1, c2))
}

// ---------------------------------------------------------------------------
// Local search
// ---------------------------------------------------------------------------

/// Hill climbing around one candidate.
///
/// Each round mutates the current candidate, evaluates the mutant and keeps
/// it only if its fitness strictly dominates the current one. The result
/// therefore never regresses: it either equals the start or strictly
/// dominates it.
#[derive(Clone)]
pub struct LocalSearchMutation {
    mutation: Box<dyn Mutation>,
    rounds: usize,
}

impl LocalSearchMutation {
    #[must_use]
    pub fn new(mutation: Box<dyn Mutation>, rounds: usize) -> Self {
        Self { mutation, rounds }
    }

    #[must_use]
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Runs the improvement rounds from `start`. Stops early, keeping the
    /// best so far, when `ctx` is cancelled.
    ///
    /// # Errors
    ///
    /// Propagates mutation and evaluation errors.
    pub fn execute<E>(
        &self,
        ctx: &mut ExecutionContext,
        domain: &Domain,
        start: (Solution, Fitness),
        mut evaluate: E,
    ) -> Result<(Solution, Fitness)>
    where
        E: FnMut(&mut ExecutionContext, &Solution) -> Result<Fitness>,
    {
        let (mut current, mut current_fitness) = start;
        for _ in 0..self.rounds {
            if ctx.is_cancelled() {
                break;
            }
            let candidate = self.mutation.mutate(ctx, domain, &current)?;
            let fitness = evaluate(ctx, &candidate)?;
            if fitness.strictly_dominates(&current_fitness) {
                trace_debug!(fitness = %fitness, "local search improvement");
                current = candidate;
                current_fitness = fitness;
            }
        }
        Ok((current, current_fitness))
    }
}

impl core::fmt::Debug for LocalSearchMutation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LocalSearchMutation")
            .field("mutation", &self.mutation.name())
            .field("rounds", &self.rounds)
            .finish()
    }
}
