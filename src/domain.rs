//! Search spaces.
//!
//! A [`Domain`] describes where candidates live. Samplers draw from it and
//! problems validate candidates against it.
//!
//! | Variant | Candidate shape |
//! |---|---|
//! | [`Domain::Continuous`] | `Solution::Continuous` inside a box |
//! | [`Domain::Discrete`] | `Solution::Discrete` index into an ordered label set |
//! | [`Domain::ScalarVector`] | `Solution::Composite` of continuous vectors |
//! | [`Domain::Vector`] | `Solution::Composite` repeating one element domain |
//! | [`Domain::Expression`] | `Solution::Tree` over typed inputs and operators |
//! | [`Domain::Sequence`] | `Solution::Trajectory` of action indices |

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::expression::{Expression, Operator};
use crate::solution::Solution;
use crate::{Error, Result};

/// Box-constrained continuous space.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ContinuousDomain {
    bounds: Vec<(f64, f64)>,
}

impl ContinuousDomain {
    /// Creates a box from `(lower, upper)` pairs.
    ///
    /// `lower == upper` is allowed and yields a degenerate axis.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBounds`] if a lower bound exceeds its upper
    /// bound or either is NaN.
    pub fn new(bounds: Vec<(f64, f64)>) -> Result<Self> {
        for (dimension, &(low, high)) in bounds.iter().enumerate() {
            if low.is_nan() || high.is_nan() || low > high {
                return Err(Error::InvalidBounds {
                    dimension,
                    low,
                    high,
                });
            }
        }
        Ok(Self { bounds })
    }

    /// Creates an `n`-dimensional box with the same bounds on every axis.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBounds`] if `low > high`.
    pub fn uniform(n: usize, low: f64, high: f64) -> Result<Self> {
        Self::new(vec![(low, high); n])
    }

    #[must_use]
    pub fn n_dimensions(&self) -> usize {
        self.bounds.len()
    }

    #[must_use]
    pub fn lower(&self, i: usize) -> f64 {
        self.bounds[i].0
    }

    #[must_use]
    pub fn upper(&self, i: usize) -> f64 {
        self.bounds[i].1
    }

    #[must_use]
    pub fn bounds(&self) -> &[(f64, f64)] {
        &self.bounds
    }

    /// Whether `x` has the right length and lies inside the box.
    #[must_use]
    pub fn contains(&self, x: &[f64]) -> bool {
        x.len() == self.bounds.len()
            && x
                .iter()
                .zip(&self.bounds)
                .all(|(&v, &(lo, hi))| v >= lo && v <= hi)
    }

    /// Clamps `x` into the box.
    #[must_use]
    pub fn project(&self, x: &[f64]) -> Vec<f64> {
        x.iter()
            .zip(&self.bounds)
            .map(|(&v, &(lo, hi))| v.clamp(lo, hi))
            .collect()
    }

    /// Centre of the box.
    #[must_use]
    pub fn center(&self) -> Vec<f64> {
        self.bounds.iter().map(|&(lo, hi)| 0.5 * (lo + hi)).collect()
    }
}

/// Finite ordered set of labelled choices.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DiscreteDomain {
    labels: Vec<String>,
}

impl DiscreteDomain {
    #[must_use]
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }

    /// Unnamed choices `"0"`, `"1"`, ... `"n-1"`.
    #[must_use]
    pub fn with_size(n: usize) -> Self {
        Self::new((0..n).map(|i| i.to_string()).collect())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    #[must_use]
    pub fn label(&self, i: usize) -> Option<&str> {
        self.labels.get(i).map(String::as_str)
    }
}

/// Repetition of one element domain a fixed number of times.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VectorDomain {
    element: Box<Domain>,
    length: usize,
}

impl VectorDomain {
    #[must_use]
    pub fn new(element: Domain, length: usize) -> Self {
        Self {
            element: Box::new(element),
            length,
        }
    }

    #[must_use]
    pub fn element(&self) -> &Domain {
        &self.element
    }

    #[must_use]
    pub fn length(&self) -> usize {
        self.length
    }
}

/// Expression trees over `n_inputs` numeric variables.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExpressionDomain {
    input_names: Vec<String>,
    operators: Vec<Operator>,
    constants: Vec<f64>,
    max_depth: usize,
}

impl ExpressionDomain {
    /// Inputs are named `x0 .. x{n-1}`.
    #[must_use]
    pub fn new(
        n_inputs: usize,
        operators: Vec<Operator>,
        constants: Vec<f64>,
        max_depth: usize,
    ) -> Self {
        Self {
            input_names: (0..n_inputs).map(|i| format!("x{i}")).collect(),
            operators,
            constants,
            max_depth,
        }
    }

    /// Replaces the generated input names.
    #[must_use]
    pub fn with_input_names(mut self, names: Vec<String>) -> Self {
        self.input_names = names;
        self
    }

    #[must_use]
    pub fn n_inputs(&self) -> usize {
        self.input_names.len()
    }

    #[must_use]
    pub fn input_names(&self) -> &[String] {
        &self.input_names
    }

    #[must_use]
    pub fn operators(&self) -> &[Operator] {
        &self.operators
    }

    #[must_use]
    pub fn constants(&self) -> &[f64] {
        &self.constants
    }

    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Whether `e` only uses known inputs and respects the depth limit.
    #[must_use]
    pub fn contains(&self, e: &Expression) -> bool {
        e.depth() <= self.max_depth && e.max_input().is_none_or(|i| i < self.n_inputs())
    }
}

/// Sequences of at most `max_length` actions drawn from `0..n_actions`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SequenceDomain {
    pub n_actions: usize,
    pub max_length: usize,
}

/// A search space.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Domain {
    Continuous(ContinuousDomain),
    Discrete(DiscreteDomain),
    ScalarVector(Vec<ContinuousDomain>),
    Vector(VectorDomain),
    Expression(ExpressionDomain),
    Sequence(SequenceDomain),
}

impl Domain {
    /// Shorthand for a continuous box.
    ///
    /// # Errors
    ///
    /// Same as [`ContinuousDomain::new`].
    pub fn continuous(bounds: Vec<(f64, f64)>) -> Result<Self> {
        ContinuousDomain::new(bounds).map(Self::Continuous)
    }

    /// Name of the variant, for error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Continuous(_) => "continuous domain",
            Self::Discrete(_) => "discrete domain",
            Self::ScalarVector(_) => "scalar vector domain",
            Self::Vector(_) => "vector domain",
            Self::Expression(_) => "expression domain",
            Self::Sequence(_) => "sequence domain",
        }
    }

    /// Number of fields a composite candidate of this domain has.
    #[must_use]
    pub fn n_fields(&self) -> Option<usize> {
        match self {
            Self::ScalarVector(d) => Some(d.len()),
            Self::Vector(v) => Some(v.length),
            _ => None,
        }
    }

    /// Domain of field `i` of a composite candidate.
    #[must_use]
    pub fn field_domain(&self, i: usize) -> Option<Domain> {
        match self {
            Self::ScalarVector(d) => d.get(i).cloned().map(Self::Continuous),
            Self::Vector(v) if i < v.length => Some((*v.element).clone()),
            _ => None,
        }
    }

    /// Verifies that `solution` has the shape this domain produces.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SolutionMismatch`] describing the first mismatch.
    pub fn check(&self, solution: &Solution) -> Result<()> {
        let mismatch = || Error::SolutionMismatch {
            expected: self.shape(),
            got: solution.shape(),
        };
        match (self, solution) {
            (Self::Continuous(d), Solution::Continuous(x)) if x.len() == d.n_dimensions() => Ok(()),
            (Self::Discrete(_), Solution::Discrete(_))
            | (Self::Expression(_), Solution::Tree(_))
            | (Self::Sequence(_), Solution::Trajectory(_)) => Ok(()),
            (Self::ScalarVector(ds), Solution::Composite(fields)) if fields.len() == ds.len() => {
                for (d, f) in ds.iter().zip(fields) {
                    match f {
                        Solution::Continuous(x) if x.len() == d.n_dimensions() => {}
                        _ => return Err(mismatch()),
                    }
                }
                Ok(())
            }
            (Self::Vector(v), Solution::Composite(fields)) if fields.len() == v.length => {
                fields.iter().try_for_each(|f| v.element.check(f))
            }
            _ => Err(mismatch()),
        }
    }

    /// Whether `solution` has the right shape and lies inside the domain.
    #[must_use]
    pub fn contains(&self, solution: &Solution) -> bool {
        if self.check(solution).is_err() {
            return false;
        }
        match (self, solution) {
            (Self::Continuous(d), Solution::Continuous(x)) => d.contains(x),
            (Self::Discrete(d), Solution::Discrete(i)) => *i < d.len(),
            (Self::Expression(d), Solution::Tree(e)) => d.contains(e),
            (Self::Sequence(d), Solution::Trajectory(t)) => {
                t.len() <= d.max_length && t.iter().all(|&a| a < d.n_actions)
            }
            (Self::ScalarVector(ds), Solution::Composite(fields)) => {
                ds.iter().zip(fields).all(|(d, f)| match f {
                    Solution::Continuous(x) => d.contains(x),
                    _ => false,
                })
            }
            (Self::Vector(v), Solution::Composite(fields)) => {
                fields.iter().all(|f| v.element.contains(f))
            }
            _ => false,
        }
    }

    fn shape(&self) -> String {
        match self {
            Self::Continuous(d) => format!("continuous vector of length {}", d.n_dimensions()),
            Self::Discrete(d) => format!("discrete choice among {}", d.len()),
            Self::ScalarVector(ds) => format!("composite of {} continuous vectors", ds.len()),
            Self::Vector(v) => format!("composite of {} elements", v.length),
            Self::Expression(_) => "expression tree".to_owned(),
            Self::Sequence(_) => "trajectory".to_owned(),
        }
    }
}

impl From<ContinuousDomain> for Domain {
    fn from(d: ContinuousDomain) -> Self {
        Self::Continuous(d)
    }
}

impl From<DiscreteDomain> for Domain {
    fn from(d: DiscreteDomain) -> Self {
        Self::Discrete(d)
    }
}

impl From<ExpressionDomain> for Domain {
    fn from(d: ExpressionDomain) -> Self {
        Self::Expression(d)
    }
}

impl From<SequenceDomain> for Domain {
    fn from(d: SequenceDomain) -> Self {
        Self::Sequence(d)
    }
}

impl From<VectorDomain> for Domain {
    fn from(d: VectorDomain) -> Self {
        Self::Vector(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn continuous_rejects_inverted_bounds() {
        let err = ContinuousDomain::new(vec![(0.0, 1.0), (2.0, 1.0)]).unwrap_err();
        assert!(matches!(err, Error::InvalidBounds { dimension: 1, .. }));
        assert!(ContinuousDomain::new(vec![(f64::NAN, 1.0)]).is_err());
        assert!(ContinuousDomain::new(vec![(3.0, 3.0)]).is_ok());
    }

    #[test]
    fn project_clamps() {
        let d = ContinuousDomain::uniform(2, -1.0, 1.0).unwrap();
        assert_eq!(d.project(&[-5.0, 0.5]), vec![-1.0, 0.5]);
        assert!(d.contains(&[1.0, -1.0]));
        assert!(!d.contains(&[1.0]));
    }

    #[test]
    fn check_reports_shape_mismatch() {
        let d = Domain::continuous(vec![(0.0, 1.0); 3]).unwrap();
        assert!(d.check(&Solution::Continuous(vec![0.0; 3])).is_ok());
        assert!(matches!(
            d.check(&Solution::Continuous(vec![0.0; 2])),
            Err(Error::SolutionMismatch { .. })
        ));
        assert!(d.check(&Solution::Discrete(0)).is_err());
    }

    #[test]
    fn vector_domain_checks_every_element() {
        let d = Domain::Vector(VectorDomain::new(
            Domain::Discrete(DiscreteDomain::with_size(3)),
            2,
        ));
        let ok = Solution::Composite(vec![Solution::Discrete(0), Solution::Discrete(2)]);
        let outside = Solution::Composite(vec![Solution::Discrete(0), Solution::Discrete(3)]);
        assert!(d.contains(&ok));
        assert!(d.check(&outside).is_ok());
        assert!(!d.contains(&outside));
        assert_eq!(d.n_fields(), Some(2));
        assert!(d.field_domain(2).is_none());
    }

    #[test]
    fn sequence_membership() {
        let d = Domain::Sequence(SequenceDomain {
            n_actions: 2,
            max_length: 3,
        });
        assert!(d.contains(&Solution::Trajectory(vec![0, 1, 1])));
        assert!(!d.contains(&Solution::Trajectory(vec![0, 1, 1, 0])));
        assert!(!d.contains(&Solution::Trajectory(vec![2])));
    }
}
