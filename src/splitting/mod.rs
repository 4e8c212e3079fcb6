//! Split scoring for decision-tree growing.
//!
//! A [`SplittingCriterion`] is bound to a target column and a subset of
//! rows by [`configure`](SplittingCriterion::configure), receives one
//! [`SplitPrediction`] per bound row, and scores how well that partition
//! separates the target. Its statistics are recomputed lazily: every
//! mutation marks the criterion stale and
//! [`ensure_is_up_to_date`](SplittingCriterion::ensure_is_up_to_date)
//! recomputes them only when needed, which keeps threshold scans (one
//! [`flip_prediction`](SplittingCriterion::flip_prediction) per step) cheap
//! to drive.
//!
//! | Criterion | Target column | Score | Range (worst, best) | Vote |
//! |-----------|---------------|-------|---------------------|------|
//! | [`RegressionCriterion`] | numeric | minus the weighted within-branch variance | `(-inf, 0)` | weighted mean |
//! | [`BinaryClassificationCriterion`] | boolean | `max(correct, error) / total` | `(0, 1)` | probability of `true` |
//! | [`InformationGainCriterion`] | label | `H(Y) - H(Y \| split)`, optionally normalized | `(0, ln k)` or `(0, 1)` | label distribution |
//!
//! [`ConstantWeakLearner`] and [`ExactWeakLearner`] turn a criterion into
//! the best single split, and [`DecisionTree::grow`] applies a weak learner
//! recursively.

mod binary;
mod information_gain;
mod regression;
mod tree;
mod weak_learner;

pub use binary::BinaryClassificationCriterion;
pub use information_gain::InformationGainCriterion;
pub use regression::RegressionCriterion;
pub use tree::{DecisionTree, TreeNode};
pub use weak_learner::{ConstantWeakLearner, ExactWeakLearner, Split, WeakLearner, WeakNode};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::data::{ColumnData, DataTable, IndexSet};
use crate::{Error, Result};

/// Branch a row is sent to by a split.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SplitPrediction {
    False,
    True,
    Missing,
}

impl SplitPrediction {
    fn branch(self) -> usize {
        match self {
            Self::False => 0,
            Self::True => 1,
            Self::Missing => 2,
        }
    }
}

/// Value predicted by a tree leaf.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Vote {
    /// Regression estimate.
    Value(f64),
    /// Probability of the positive class.
    Probability(f64),
    /// Probability of each label.
    Distribution(Vec<f64>),
    /// No supervised row to vote from.
    Missing,
}

/// Scores a partition of the bound rows with respect to a target column.
pub trait SplittingCriterion: Send + Sync {
    fn name(&self) -> &'static str;

    /// Binds the criterion to `target` of `table` over `indices`, with
    /// optional per-row `weights` (one per table row). Every bound row
    /// starts in the [`SplitPrediction::Missing`] branch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColumnTypeMismatch`] for a target of the wrong
    /// type, [`Error::IndexOutOfRange`] for an unknown column or row and
    /// [`Error::ColumnLengthMismatch`] for badly sized weights.
    fn configure(
        &mut self,
        table: &DataTable,
        target: usize,
        weights: Option<&[f64]>,
        indices: &IndexSet,
    ) -> Result<()>;

    /// Bound rows, in the order predictions refer to them.
    fn indices(&self) -> Option<&IndexSet>;

    /// Sets one prediction per bound row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CriterionNotConfigured`] or
    /// [`Error::PredictionLengthMismatch`].
    fn set_predictions(&mut self, predictions: &[SplitPrediction]) -> Result<()>;

    /// Toggles the prediction at `position` between `False` and `True`.
    /// A `Missing` prediction becomes `True`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CriterionNotConfigured`] or
    /// [`Error::IndexOutOfRange`].
    fn flip_prediction(&mut self, position: usize) -> Result<()>;

    fn is_up_to_date(&self) -> bool;

    /// Recomputes the statistics unconditionally.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CriterionNotConfigured`] before `configure`.
    fn update(&mut self) -> Result<()>;

    /// Recomputes the statistics if a mutation made them stale.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CriterionNotConfigured`] before `configure`.
    fn ensure_is_up_to_date(&mut self) -> Result<()> {
        if !self.is_up_to_date() {
            self.update()?;
        }
        Ok(())
    }

    /// Score of the current partition, in [`objective_range`](Self::objective_range).
    ///
    /// # Errors
    ///
    /// Returns [`Error::CriterionNotConfigured`] before `configure`.
    fn compute_criterion(&mut self) -> Result<f64>;

    /// `(worst, best)` scores.
    fn objective_range(&self) -> (f64, f64);

    /// Aggregates the target over `indices`, which need not be bound.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CriterionNotConfigured`] before `configure` and
    /// [`Error::IndexOutOfRange`] for a row past the end of the table.
    fn compute_vote(&self, indices: &IndexSet) -> Result<Vote>;

    fn clone_box(&self) -> Box<dyn SplittingCriterion>;
}

impl Clone for Box<dyn SplittingCriterion> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Target, weights, rows and predictions shared by every criterion.
#[derive(Clone, Debug)]
pub(crate) struct Binding {
    pub(crate) target: ColumnData,
    weights: Option<Vec<f64>>,
    pub(crate) indices: IndexSet,
    pub(crate) predictions: Vec<SplitPrediction>,
    pub(crate) dirty: bool,
}

impl Binding {
    /// `accepts` tells whether the target column has the expected type,
    /// named `expected` in errors.
    pub(crate) fn new(
        table: &DataTable,
        target: usize,
        weights: Option<&[f64]>,
        indices: &IndexSet,
        expected: &'static str,
        accepts: impl Fn(&ColumnData) -> bool,
    ) -> Result<Self> {
        let column = table.column(target)?;
        if !accepts(&column.data) {
            return Err(Error::ColumnTypeMismatch {
                column: column.name.clone(),
                expected,
            });
        }
        if let Some(w) = weights.filter(|w| w.len() != table.n_samples()) {
            return Err(Error::ColumnLengthMismatch {
                column: "weights".to_owned(),
                expected: table.n_samples(),
                got: w.len(),
            });
        }
        if let Some(&last) = indices.as_slice().last().filter(|&&l| l >= table.n_samples()) {
            return Err(Error::IndexOutOfRange {
                index: last,
                len: table.n_samples(),
            });
        }
        Ok(Self {
            target: column.data.clone(),
            weights: weights.map(<[f64]>::to_vec),
            indices: indices.clone(),
            predictions: vec![SplitPrediction::Missing; indices.len()],
            dirty: true,
        })
    }

    /// Fails unless every row of `indices` exists in the bound target.
    pub(crate) fn check_rows(&self, indices: &IndexSet) -> Result<()> {
        let len = self.target.len();
        match indices.as_slice().last() {
            Some(&last) if last >= len => Err(Error::IndexOutOfRange { index: last, len }),
            _ => Ok(()),
        }
    }

    pub(crate) fn weight(&self, row: usize) -> f64 {
        self.weights.as_ref().map_or(1.0, |w| w[row])
    }

    /// `(row, branch)` for every bound row.
    pub(crate) fn rows(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.indices
            .iter()
            .zip(&self.predictions)
            .map(|(row, p)| (row, p.branch()))
    }

    pub(crate) fn set_predictions(&mut self, predictions: &[SplitPrediction]) -> Result<()> {
        if predictions.len() != self.predictions.len() {
            return Err(Error::PredictionLengthMismatch {
                expected: self.predictions.len(),
                got: predictions.len(),
            });
        }
        self.predictions.copy_from_slice(predictions);
        self.dirty = true;
        Ok(())
    }

    pub(crate) fn flip(&mut self, position: usize) -> Result<()> {
        let len = self.predictions.len();
        let p = self
            .predictions
            .get_mut(position)
            .ok_or(Error::IndexOutOfRange {
                index: position,
                len,
            })?;
        *p = match p {
            SplitPrediction::True => SplitPrediction::False,
            SplitPrediction::False | SplitPrediction::Missing => SplitPrediction::True,
        };
        self.dirty = true;
        Ok(())
    }
}

/// Shannon entropy (natural log) of non-negative weights.
pub(crate) fn entropy(weights: &[f64]) -> f64 {
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    weights
        .iter()
        .filter(|&&w| w > 0.0)
        .map(|&w| {
            let p = w / total;
            -p * p.ln()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entropy_of_known_distributions() {
        assert!(entropy(&[]).abs() < 1e-12);
        assert!(entropy(&[3.0, 0.0]).abs() < 1e-12);
        assert!((entropy(&[1.0, 1.0]) - core::f64::consts::LN_2).abs() < 1e-12);
        assert!((entropy(&[2.0, 2.0, 2.0, 2.0]) - 4f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn binding_validates_its_inputs() {
        let mut t = DataTable::new(3);
        t.add_column("y", ColumnData::Numeric(vec![1.0, 2.0, 3.0])).unwrap();
        let numeric = |d: &ColumnData| matches!(d, ColumnData::Numeric(_));
        let all = IndexSet::range(0, 3);
        assert!(Binding::new(&t, 0, None, &all, "numeric", numeric).is_ok());
        assert!(matches!(
            Binding::new(&t, 0, Some(&[1.0]), &all, "numeric", numeric),
            Err(Error::ColumnLengthMismatch { .. })
        ));
        assert!(matches!(
            Binding::new(&t, 0, None, &IndexSet::range(0, 4), "numeric", numeric),
            Err(Error::IndexOutOfRange { index: 3, len: 3 })
        ));
        assert!(matches!(
            Binding::new(&t, 0, None, &all, "boolean", |d| matches!(d, ColumnData::Boolean(_))),
            Err(Error::ColumnTypeMismatch { .. })
        ));

        let mut b = Binding::new(&t, 0, None, &all, "numeric", numeric).unwrap();
        b.dirty = false;
        b.flip(1).unwrap();
        assert!(b.dirty);
        assert_eq!(b.predictions[1], SplitPrediction::True);
        b.flip(1).unwrap();
        assert_eq!(b.predictions[1], SplitPrediction::False);
        assert!(b.flip(3).is_err());
        assert!(matches!(
            b.set_predictions(&[SplitPrediction::True]),
            Err(Error::PredictionLengthMismatch { expected: 3, got: 1 })
        ));
    }
}
