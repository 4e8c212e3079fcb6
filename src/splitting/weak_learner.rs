#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{SplitPrediction, SplittingCriterion, Vote};
use crate::data::{ColumnData, DataTable, IndexSet};
use crate::Result;

/// A test on one row of a table.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Split {
    /// Sends every row to the `True` branch.
    Constant,
    /// `column > threshold` on a numeric column; `NaN` is missing.
    Threshold { column: usize, threshold: f64 },
    /// The value of a boolean column.
    Boolean { column: usize },
}

impl Split {
    /// Branch of `row`. Unknown columns and rows are missing.
    #[must_use]
    pub fn predict(&self, table: &DataTable, row: usize) -> SplitPrediction {
        let data = match self {
            Self::Constant => return SplitPrediction::True,
            Self::Threshold { column, .. } | Self::Boolean { column } => {
                match table.column(*column) {
                    Ok(c) => &c.data,
                    Err(_) => return SplitPrediction::Missing,
                }
            }
        };
        match (self, data) {
            (Self::Threshold { threshold, .. }, ColumnData::Numeric(v)) => {
                match v.get(row).copied() {
                    Some(x) if x.is_nan() => SplitPrediction::Missing,
                    Some(x) if x > *threshold => SplitPrediction::True,
                    Some(_) => SplitPrediction::False,
                    None => SplitPrediction::Missing,
                }
            }
            (Self::Boolean { .. }, ColumnData::Boolean(v)) => match v.get(row).copied().flatten() {
                Some(true) => SplitPrediction::True,
                Some(false) => SplitPrediction::False,
                None => SplitPrediction::Missing,
            },
            _ => SplitPrediction::Missing,
        }
    }

    /// Partitions `indices` into the `False`, `True` and `Missing` branches.
    #[must_use]
    pub fn dispatch(&self, table: &DataTable, indices: &IndexSet) -> [IndexSet; 3] {
        let mut branches = [IndexSet::new(), IndexSet::new(), IndexSet::new()];
        for row in indices {
            let branch = match self.predict(table, row) {
                SplitPrediction::False => 0,
                SplitPrediction::True => 1,
                SplitPrediction::Missing => 2,
            };
            // rows come in ascending order
            let _ = branches[branch].push(row);
        }
        branches
    }
}

/// Best split found by a weak learner, with the vote of each branch.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WeakNode {
    pub split: Split,
    pub score: f64,
    pub negative_vote: Vote,
    pub positive_vote: Vote,
    pub missing_vote: Vote,
}

/// Chooses one split for the rows a criterion is bound to.
pub trait WeakLearner: Send + Sync {
    fn name(&self) -> &'static str;

    /// Best split of `criterion`'s bound rows, or `None` when there is no
    /// candidate. `criterion` must already be configured on `table`; its
    /// predictions are overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CriterionNotConfigured`](crate::Error::CriterionNotConfigured)
    /// when it is not.
    fn learn(
        &self,
        table: &DataTable,
        criterion: &mut dyn SplittingCriterion,
    ) -> Result<Option<WeakNode>>;
}

fn bound_indices(criterion: &dyn SplittingCriterion) -> Result<IndexSet> {
    criterion
        .indices()
        .cloned()
        .ok_or(crate::Error::CriterionNotConfigured)
}

/// Scores `split` on the criterion's rows and builds its node.
fn evaluate_split(
    table: &DataTable,
    criterion: &mut dyn SplittingCriterion,
    indices: &IndexSet,
    split: Split,
) -> Result<WeakNode> {
    let predictions: Vec<SplitPrediction> =
        indices.iter().map(|row| split.predict(table, row)).collect();
    criterion.set_predictions(&predictions)?;
    let score = criterion.compute_criterion()?;
    node_for(table, criterion, indices, split, score)
}

fn node_for(
    table: &DataTable,
    criterion: &dyn SplittingCriterion,
    indices: &IndexSet,
    split: Split,
    score: f64,
) -> Result<WeakNode> {
    let [negative, positive, missing] = split.dispatch(table, indices);
    Ok(WeakNode {
        negative_vote: criterion.compute_vote(&negative)?,
        positive_vote: criterion.compute_vote(&positive)?,
        missing_vote: criterion.compute_vote(&missing)?,
        split,
        score,
    })
}

/// Always proposes [`Split::Constant`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ConstantWeakLearner;

impl WeakLearner for ConstantWeakLearner {
    fn name(&self) -> &'static str {
        "constant"
    }

    fn learn(
        &self,
        table: &DataTable,
        criterion: &mut dyn SplittingCriterion,
    ) -> Result<Option<WeakNode>> {
        let indices = bound_indices(criterion)?;
        evaluate_split(table, criterion, &indices, Split::Constant).map(Some)
    }
}

/// Exhaustive search over every numeric and boolean column except the
/// target.
///
/// Numeric thresholds are the midpoints between consecutive distinct
/// values, visited in ascending order by flipping one prediction at a time.
/// Columns are visited in table order and a candidate replaces the best one
/// only with a strictly higher score, so the first candidate seen wins a
/// tie.
#[derive(Clone, Debug)]
pub struct ExactWeakLearner {
    target: usize,
}

impl ExactWeakLearner {
    /// `target` is the column the criterion is bound to; it is never used
    /// as a feature.
    #[must_use]
    pub fn new(target: usize) -> Self {
        Self { target }
    }

    /// Best threshold of a numeric column as `(threshold, score)`.
    fn scan_numeric(
        criterion: &mut dyn SplittingCriterion,
        indices: &IndexSet,
        values: &[f64],
    ) -> Result<Option<(f64, f64)>> {
        // positions of the known values, ascending by value
        let mut order: Vec<usize> = (0..indices.len())
            .filter(|&p| !values[indices.as_slice()[p]].is_nan())
            .collect();
        order.sort_by(|&a, &b| {
            values[indices.as_slice()[a]].total_cmp(&values[indices.as_slice()[b]])
        });
        let value_at = |p: usize| values[indices.as_slice()[p]];

        // below the smallest value, every known row is above the threshold
        let predictions: Vec<SplitPrediction> = indices
            .iter()
            .map(|row| {
                if values[row].is_nan() {
                    SplitPrediction::Missing
                } else {
                    SplitPrediction::True
                }
            })
            .collect();
        criterion.set_predictions(&predictions)?;

        let mut best: Option<(f64, f64)> = None;
        for (k, &position) in order.iter().enumerate() {
            criterion.flip_prediction(position)?;
            let Some(&next) = order.get(k + 1) else {
                break;
            };
            let (current, upcoming) = (value_at(position), value_at(next));
            if upcoming > current {
                let score = criterion.compute_criterion()?;
                if best.is_none_or(|(_, s)| score > s) {
                    best = Some(((current + upcoming) / 2.0, score));
                }
            }
        }
        Ok(best)
    }
}

impl WeakLearner for ExactWeakLearner {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn learn(
        &self,
        table: &DataTable,
        criterion: &mut dyn SplittingCriterion,
    ) -> Result<Option<WeakNode>> {
        let indices = bound_indices(criterion)?;
        let mut best: Option<(Split, f64)> = None;
        for (column, c) in table.columns().iter().enumerate() {
            if column == self.target {
                continue;
            }
            let candidate = match &c.data {
                ColumnData::Numeric(values) => Self::scan_numeric(criterion, &indices, values)?
                    .map(|(threshold, score)| (Split::Threshold { column, threshold }, score)),
                ColumnData::Boolean(_) => {
                    let split = Split::Boolean { column };
                    let predictions: Vec<SplitPrediction> =
                        indices.iter().map(|row| split.predict(table, row)).collect();
                    criterion.set_predictions(&predictions)?;
                    Some((split, criterion.compute_criterion()?))
                }
                ColumnData::Label { .. } => None,
            };
            let improves = |&(_, score): &(Split, f64)| best.as_ref().is_none_or(|(_, s)| score > *s);
            if let Some(found) = candidate.filter(improves) {
                best = Some(found);
            }
        }
        let Some((split, score)) = best else {
            return Ok(None);
        };
        trace_debug!(split = ?split, score, "weak learner split");
        node_for(table, criterion, &indices, split, score).map(Some)
    }
}
