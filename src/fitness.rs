//! Objective vectors and Pareto dominance.
//!
//! [`FitnessLimits`] declares, for every objective, its worst and best
//! achievable values. The direction is derived from them: an objective is
//! maximized iff `best > worst`. Every [`Fitness`] holds an `Arc` to the
//! limits it belongs to, and fitness values tied to different limits are
//! never compared.
//!
//! Comparisons use exact floating-point arithmetic by default. A tolerance
//! can be configured with [`FitnessLimits::with_tolerance`]; deltas whose
//! magnitude does not exceed it count as ties. A non-zero tolerance
//! makes dominance intransitive in corner cases.
//!
//! ```
//! use std::sync::Arc;
//! use moosolver::fitness::{Fitness, FitnessLimits};
//!
//! // Two objectives, both minimized, each ranging from 10 (worst) to 0 (best).
//! let limits = Arc::new(FitnessLimits::new(vec![(10.0, 0.0), (10.0, 0.0)]));
//! let a = Fitness::new(vec![2.0, 2.0], limits.clone()).unwrap();
//! let b = Fitness::new(vec![3.0, 3.0], limits.clone()).unwrap();
//! let c = Fitness::new(vec![1.0, 5.0], limits).unwrap();
//!
//! assert!(a.strictly_dominates(&b));
//! assert!(!a.strictly_dominates(&c) && !c.strictly_dominates(&a));
//! ```

use core::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::types::Direction;
use crate::{Error, Result};

/// Per-objective `(worst, best)` bounds.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FitnessLimits {
    limits: Vec<(f64, f64)>,
    #[cfg_attr(feature = "serde", serde(default))]
    tolerance: f64,
}

impl FitnessLimits {
    /// Creates limits from `(worst, best)` pairs.
    #[must_use]
    pub fn new(limits: Vec<(f64, f64)>) -> Self {
        Self {
            limits,
            tolerance: 0.0,
        }
    }

    /// Unbounded limits following the given directions.
    #[must_use]
    pub fn from_directions(directions: &[Direction]) -> Self {
        Self::new(
            directions
                .iter()
                .map(|d| match d {
                    Direction::Minimize => (f64::INFINITY, f64::NEG_INFINITY),
                    Direction::Maximize => (f64::NEG_INFINITY, f64::INFINITY),
                })
                .collect(),
        )
    }

    /// Treat sign-adjusted deltas of magnitude `<= tolerance` as ties.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance.max(0.0);
        self
    }

    /// Appends one objective.
    pub fn add_objective(&mut self, worst: f64, best: f64) {
        self.limits.push((worst, best));
    }

    #[must_use]
    pub fn n_objectives(&self) -> usize {
        self.limits.len()
    }

    #[must_use]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    #[must_use]
    pub fn worst(&self, i: usize) -> f64 {
        self.limits[i].0
    }

    #[must_use]
    pub fn best(&self, i: usize) -> f64 {
        self.limits[i].1
    }

    /// Smaller of the two bounds of objective `i`.
    #[must_use]
    pub fn lower(&self, i: usize) -> f64 {
        self.limits[i].0.min(self.limits[i].1)
    }

    /// Larger of the two bounds of objective `i`.
    #[must_use]
    pub fn upper(&self, i: usize) -> f64 {
        self.limits[i].0.max(self.limits[i].1)
    }

    #[must_use]
    pub fn is_maximized(&self, i: usize) -> bool {
        self.limits[i].1 > self.limits[i].0
    }

    /// `+1.0` if objective `i` is maximized, `-1.0` otherwise.
    #[must_use]
    pub fn sign(&self, i: usize) -> f64 {
        self.direction(i).sign()
    }

    #[must_use]
    pub fn direction(&self, i: usize) -> Direction {
        if self.is_maximized(i) {
            Direction::Maximize
        } else {
            Direction::Minimize
        }
    }

    #[must_use]
    pub fn directions(&self) -> Vec<Direction> {
        (0..self.n_objectives()).map(|i| self.direction(i)).collect()
    }

    /// The declared worst value of every objective, or an infinitely bad one
    /// when `infinite` is set.
    #[must_use]
    pub fn worst_values(&self, infinite: bool) -> Vec<f64> {
        (0..self.n_objectives())
            .map(|i| {
                if infinite {
                    -self.sign(i) * f64::INFINITY
                } else {
                    self.worst(i)
                }
            })
            .collect()
    }

    /// The declared best value of every objective.
    #[must_use]
    pub fn best_values(&self) -> Vec<f64> {
        (0..self.n_objectives()).map(|i| self.best(i)).collect()
    }

    /// Normalizes `value` of objective `i` to `[0, 1]` where `1` is best.
    /// Returns `value` unchanged when the limits are not finite or coincide.
    #[must_use]
    pub fn normalize(&self, i: usize, value: f64) -> f64 {
        let (worst, best) = self.limits[i];
        let range = best - worst;
        if range == 0.0 || !range.is_finite() {
            value
        } else {
            (value - worst) / range
        }
    }
}

/// One candidate's objective values.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Fitness {
    values: Vec<f64>,
    limits: Arc<FitnessLimits>,
}

impl Fitness {
    /// Creates a fitness vector tied to `limits`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FitnessDimensionMismatch`] if the number of values
    /// differs from the number of objectives.
    pub fn new(values: Vec<f64>, limits: Arc<FitnessLimits>) -> Result<Self> {
        if values.len() != limits.n_objectives() {
            return Err(Error::FitnessDimensionMismatch {
                expected: limits.n_objectives(),
                got: values.len(),
            });
        }
        Ok(Self { values, limits })
    }

    /// The worst fitness allowed by `limits` (or an infinitely bad one).
    #[must_use]
    pub fn worst_possible(limits: &Arc<FitnessLimits>, infinite: bool) -> Self {
        Self {
            values: limits.worst_values(infinite),
            limits: Arc::clone(limits),
        }
    }

    /// The best fitness allowed by `limits`.
    #[must_use]
    pub fn best_possible(limits: &Arc<FitnessLimits>) -> Self {
        Self {
            values: limits.best_values(),
            limits: Arc::clone(limits),
        }
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[must_use]
    pub fn value(&self, i: usize) -> f64 {
        self.values[i]
    }

    #[must_use]
    pub fn limits(&self) -> &Arc<FitnessLimits> {
        &self.limits
    }

    #[must_use]
    pub fn n_objectives(&self) -> usize {
        self.values.len()
    }

    /// Whether `self` and `other` can be compared.
    #[must_use]
    pub fn is_compatible(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.limits, &other.limits) || *self.limits == *other.limits
    }

    /// [`is_compatible`](Self::is_compatible) as a `Result`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LimitsMismatch`] for incompatible fitness values.
    pub fn check_compatible(&self, other: &Self) -> Result<()> {
        if self.is_compatible(other) {
            Ok(())
        } else {
            Err(Error::LimitsMismatch)
        }
    }

    /// Sign-adjusted difference on objective `i`: positive when `self` is
    /// better, negative when worse, zero on a tie.
    #[must_use]
    pub fn compare_objective(&self, other: &Self, i: usize) -> f64 {
        let delta = self.limits.sign(i) * (self.values[i] - other.values[i]);
        if delta.abs() <= self.limits.tolerance() || delta.is_nan() {
            0.0
        } else {
            delta
        }
    }

    /// `true` iff `self` is at least as good on every objective and, when
    /// `strictly` is set, better on at least one.
    #[must_use]
    pub fn dominates(&self, other: &Self, strictly: bool) -> bool {
        debug_assert!(self.is_compatible(other), "fitness limits differ");
        let mut better_once = false;
        for i in 0..self.values.len() {
            let delta = self.compare_objective(other, i);
            if delta < 0.0 {
                return false;
            }
            if delta > 0.0 {
                better_once = true;
            }
        }
        better_once || !strictly
    }

    /// Strict Pareto dominance.
    #[must_use]
    pub fn strictly_dominates(&self, other: &Self) -> bool {
        self.dominates(other, true)
    }

    /// `true` iff some objective of `self` beats `other` (or ties, when not `strictly`).
    #[must_use]
    pub fn is_better_for_at_least_one_objective_than(&self, other: &Self, strictly: bool) -> bool {
        (0..self.values.len()).any(|i| {
            let delta = self.compare_objective(other, i);
            if strictly { delta > 0.0 } else { delta >= 0.0 }
        })
    }

    /// Values oriented so that smaller is always better.
    #[must_use]
    pub fn values_to_be_minimized(&self) -> Vec<f64> {
        self.values
            .iter()
            .enumerate()
            .map(|(i, &v)| -self.limits.sign(i) * v)
            .collect()
    }

    #[must_use]
    pub fn euclidean_distance(&self, other: &Self) -> f64 {
        self.values
            .iter()
            .zip(&other.values)
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>()
            .sqrt()
    }

    /// Smallest `eps` such that `self` shifted by `eps` toward better
    /// weakly dominates `other`.
    #[must_use]
    pub fn additive_epsilon(&self, other: &Self) -> f64 {
        self.values_to_be_minimized()
            .iter()
            .zip(other.values_to_be_minimized())
            .map(|(a, b)| a - b)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Smallest factor `eps` such that `self` scaled by `eps` weakly
    /// dominates `other`. Meaningful for strictly positive values.
    #[must_use]
    pub fn multiplicative_epsilon(&self, other: &Self) -> f64 {
        (0..self.values.len())
            .map(|i| {
                let (a, b) = (self.values[i], other.values[i]);
                if self.limits.is_maximized(i) { b / a } else { a / b }
            })
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Objective-wise worst of `a` and `b`.
    #[must_use]
    pub fn worst_combination(a: &Self, b: &Self) -> Self {
        debug_assert!(a.is_compatible(b), "fitness limits differ");
        let values = (0..a.values.len())
            .map(|i| {
                if a.compare_objective(b, i) < 0.0 {
                    a.values[i]
                } else {
                    b.values[i]
                }
            })
            .collect();
        Self {
            values,
            limits: Arc::clone(&a.limits),
        }
    }
}

impl PartialEq for Fitness {
    /// Exact value equality; limits must be compatible.
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values && self.is_compatible(other)
    }
}

impl fmt::Display for Fitness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, v) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{v}")?;
        }
        write!(f, ")")
    }
}
