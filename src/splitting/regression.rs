use super::{Binding, SplitPrediction, SplittingCriterion, Vote};
use crate::data::{ColumnData, DataTable, IndexSet};
use crate::{Error, Result};

/// Weighted sums of one branch.
#[derive(Clone, Copy, Debug, Default)]
struct Moments {
    weight: f64,
    sum: f64,
    sum_squares: f64,
}

impl Moments {
    fn push(&mut self, w: f64, y: f64) {
        self.weight += w;
        self.sum += w * y;
        self.sum_squares += w * y * y;
    }

    /// `sum w (y - mean)^2`.
    fn weighted_variance(&self) -> f64 {
        if self.weight <= 0.0 {
            return 0.0;
        }
        (self.sum_squares - self.sum * self.sum / self.weight).max(0.0)
    }
}

/// Variance reduction for a numeric target.
///
/// Scores `-(sum over branches of weight * variance) / total weight`; rows
/// with a missing (`NaN`) target are ignored.
#[derive(Clone, Debug, Default)]
pub struct RegressionCriterion {
    binding: Option<Binding>,
    branches: [Moments; 3],
}

impl RegressionCriterion {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn target(binding: &Binding, row: usize) -> f64 {
        match &binding.target {
            ColumnData::Numeric(v) => v[row],
            _ => f64::NAN,
        }
    }
}

impl SplittingCriterion for RegressionCriterion {
    fn name(&self) -> &'static str {
        "regression"
    }

    fn configure(
        &mut self,
        table: &DataTable,
        target: usize,
        weights: Option<&[f64]>,
        indices: &IndexSet,
    ) -> Result<()> {
        self.binding = Some(Binding::new(table, target, weights, indices, "numeric", |d| {
            matches!(d, ColumnData::Numeric(_))
        })?);
        Ok(())
    }

    fn indices(&self) -> Option<&IndexSet> {
        self.binding.as_ref().map(|b| &b.indices)
    }

    fn set_predictions(&mut self, predictions: &[SplitPrediction]) -> Result<()> {
        self.binding
            .as_mut()
            .ok_or(Error::CriterionNotConfigured)?
            .set_predictions(predictions)
    }

    fn flip_prediction(&mut self, position: usize) -> Result<()> {
        self.binding
            .as_mut()
            .ok_or(Error::CriterionNotConfigured)?
            .flip(position)
    }

    fn is_up_to_date(&self) -> bool {
        self.binding.as_ref().is_some_and(|b| !b.dirty)
    }

    fn update(&mut self) -> Result<()> {
        let binding = self.binding.as_mut().ok_or(Error::CriterionNotConfigured)?;
        let mut branches = [Moments::default(); 3];
        for (row, branch) in binding.rows() {
            let y = Self::target(binding, row);
            if !y.is_nan() {
                branches[branch].push(binding.weight(row), y);
            }
        }
        self.branches = branches;
        binding.dirty = false;
        Ok(())
    }

    fn compute_criterion(&mut self) -> Result<f64> {
        self.ensure_is_up_to_date()?;
        let total: f64 = self.branches.iter().map(|m| m.weight).sum();
        if total <= 0.0 {
            return Ok(0.0);
        }
        let within: f64 = self.branches.iter().map(Moments::weighted_variance).sum();
        Ok(-within / total)
    }

    fn objective_range(&self) -> (f64, f64) {
        (f64::NEG_INFINITY, 0.0)
    }

    fn compute_vote(&self, indices: &IndexSet) -> Result<Vote> {
        let binding = self.binding.as_ref().ok_or(Error::CriterionNotConfigured)?;
        binding.check_rows(indices)?;
        let mut m = Moments::default();
        for row in indices {
            let y = Self::target(binding, row);
            if !y.is_nan() {
                m.push(binding.weight(row), y);
            }
        }
        Ok(if m.weight > 0.0 {
            Vote::Value(m.sum / m.weight)
        } else {
            Vote::Missing
        })
    }

    fn clone_box(&self) -> Box<dyn SplittingCriterion> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SplitPrediction::{False, Missing, True};

    fn table() -> DataTable {
        let mut t = DataTable::new(4);
        t.add_column("y", ColumnData::Numeric(vec![1.0, 1.0, 5.0, 5.0]))
            .unwrap();
        t
    }

    #[test]
    fn perfect_split_has_zero_variance() {
        let mut c = RegressionCriterion::new();
        c.configure(&table(), 0, None, &IndexSet::range(0, 4)).unwrap();
        c.set_predictions(&[False, False, True, True]).unwrap();
        assert!(c.compute_criterion().unwrap().abs() < 1e-12);

        c.set_predictions(&[False, True, False, True]).unwrap();
        assert!((c.compute_criterion().unwrap() + 4.0).abs() < 1e-12);
    }

    #[test]
    fn statistics_are_recomputed_lazily() {
        let mut c = RegressionCriterion::new();
        assert!(matches!(c.compute_criterion(), Err(Error::CriterionNotConfigured)));
        c.configure(&table(), 0, None, &IndexSet::range(0, 4)).unwrap();
        assert!(!c.is_up_to_date());
        c.ensure_is_up_to_date().unwrap();
        assert!(c.is_up_to_date());
        // every row starts in the missing branch
        assert!((c.compute_criterion().unwrap() + 4.0).abs() < 1e-12);

        c.set_predictions(&[True, True, Missing, Missing]).unwrap();
        assert!(!c.is_up_to_date());
        assert!(c.compute_criterion().unwrap().abs() < 1e-12);
        // a missing row joins the true branch
        c.flip_prediction(2).unwrap();
        assert!(!c.is_up_to_date());
        assert!(c.compute_criterion().unwrap() < 0.0);
    }

    #[test]
    fn weighted_mean_vote() {
        let mut c = RegressionCriterion::new();
        c.configure(&table(), 0, Some(&[3.0, 0.0, 1.0, 0.0]), &IndexSet::range(0, 4))
            .unwrap();
        assert_eq!(c.compute_vote(&IndexSet::range(0, 4)).unwrap(), Vote::Value(2.0));
        assert_eq!(c.compute_vote(&IndexSet::new()).unwrap(), Vote::Missing);
    }
}
