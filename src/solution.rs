//! Candidate solutions.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::expression::Expression;
use crate::{Error, Result};

/// A candidate produced by a sampler or a variation operator.
///
/// Candidates are values: once inserted into a
/// [`SolutionSet`](crate::solution_set::SolutionSet) they are never
/// mutated, and variation always produces a new candidate. `clone` is a
/// deep copy.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Solution {
    /// Point in a continuous box.
    Continuous(Vec<f64>),
    /// Index into a discrete domain.
    Discrete(usize),
    /// Sequence of actions taken by a search procedure.
    Trajectory(Vec<usize>),
    /// Expression tree.
    Tree(Expression),
    /// Object built field by field.
    Composite(Vec<Solution>),
}

impl Solution {
    /// Name of the variant.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Continuous(_) => "continuous",
            Self::Discrete(_) => "discrete",
            Self::Trajectory(_) => "trajectory",
            Self::Tree(_) => "tree",
            Self::Composite(_) => "composite",
        }
    }

    pub(crate) fn shape(&self) -> String {
        match self {
            Self::Continuous(x) => format!("continuous vector of length {}", x.len()),
            Self::Discrete(i) => format!("discrete choice {i}"),
            Self::Trajectory(t) => format!("trajectory of length {}", t.len()),
            Self::Tree(_) => "expression tree".to_owned(),
            Self::Composite(f) => format!("composite of {} fields", f.len()),
        }
    }

    #[must_use]
    pub fn as_continuous(&self) -> Option<&[f64]> {
        match self {
            Self::Continuous(x) => Some(x),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_discrete(&self) -> Option<usize> {
        match self {
            Self::Discrete(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_trajectory(&self) -> Option<&[usize]> {
        match self {
            Self::Trajectory(t) => Some(t),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_tree(&self) -> Option<&Expression> {
        match self {
            Self::Tree(e) => Some(e),
            _ => None,
        }
    }

    /// Continuous coordinates, or a [`Error::SolutionMismatch`].
    ///
    /// # Errors
    ///
    /// Returns an error when the candidate is not continuous.
    pub fn continuous(&self) -> Result<&[f64]> {
        self.as_continuous().ok_or_else(|| Error::SolutionMismatch {
            expected: "continuous vector".to_owned(),
            got: self.shape(),
        })
    }

    /// Number of fields of a composite candidate (0 otherwise).
    #[must_use]
    pub fn n_fields(&self) -> usize {
        match self {
            Self::Composite(f) => f.len(),
            _ => 0,
        }
    }

    /// Field `index` of a composite candidate.
    #[must_use]
    pub fn field(&self, index: usize) -> Option<&Solution> {
        match self {
            Self::Composite(f) => f.get(index),
            _ => None,
        }
    }

    /// Copy of this composite with field `index` replaced.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SolutionMismatch`] for a non-composite candidate and
    /// [`Error::IndexOutOfRange`] for a missing field.
    pub fn with_field(&self, index: usize, value: Solution) -> Result<Solution> {
        let Self::Composite(fields) = self else {
            return Err(Error::SolutionMismatch {
                expected: "composite".to_owned(),
                got: self.shape(),
            });
        };
        if index >= fields.len() {
            return Err(Error::IndexOutOfRange {
                index,
                len: fields.len(),
            });
        }
        let mut fields = fields.clone();
        fields[index] = value;
        Ok(Self::Composite(fields))
    }
}

impl From<Vec<f64>> for Solution {
    fn from(x: Vec<f64>) -> Self {
        Self::Continuous(x)
    }
}

impl From<Expression> for Solution {
    fn from(e: Expression) -> Self {
        Self::Tree(e)
    }
}
