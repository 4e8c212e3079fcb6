use super::{Binding, SplitPrediction, SplittingCriterion, Vote};
use crate::data::{ColumnData, DataTable, IndexSet};
use crate::{Error, Result};

/// Accuracy of a split used as a classifier of a boolean target.
///
/// Rows predicted `True` are counted correct when the target is `true`
/// and rows predicted `False` when it is `false`. The score is
/// `max(correct, error) / total`: a split that is consistently wrong is as
/// informative as one that is consistently right. Rows with a missing
/// target or a missing prediction do not count.
#[derive(Clone, Debug, Default)]
pub struct BinaryClassificationCriterion {
    binding: Option<Binding>,
    correct: f64,
    error: f64,
}

impl BinaryClassificationCriterion {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn target(binding: &Binding, row: usize) -> Option<bool> {
        match &binding.target {
            ColumnData::Boolean(v) => v[row],
            _ => None,
        }
    }
}

impl SplittingCriterion for BinaryClassificationCriterion {
    fn name(&self) -> &'static str {
        "binary classification"
    }

    fn configure(
        &mut self,
        table: &DataTable,
        target: usize,
        weights: Option<&[f64]>,
        indices: &IndexSet,
    ) -> Result<()> {
        self.binding = Some(Binding::new(table, target, weights, indices, "boolean", |d| {
            matches!(d, ColumnData::Boolean(_))
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
        let (mut correct, mut error) = (0.0, 0.0);
        for (row, prediction) in binding.indices.iter().zip(&binding.predictions) {
            let predicted = match prediction {
                SplitPrediction::True => true,
                SplitPrediction::False => false,
                SplitPrediction::Missing => continue,
            };
            if let Some(actual) = Self::target(binding, row) {
                if actual == predicted {
                    correct += binding.weight(row);
                } else {
                    error += binding.weight(row);
                }
            }
        }
        self.correct = correct;
        self.error = error;
        binding.dirty = false;
        Ok(())
    }

    fn compute_criterion(&mut self) -> Result<f64> {
        self.ensure_is_up_to_date()?;
        let total = self.correct + self.error;
        Ok(if total > 0.0 {
            self.correct.max(self.error) / total
        } else {
            0.0
        })
    }

    fn objective_range(&self) -> (f64, f64) {
        (0.0, 1.0)
    }

    fn compute_vote(&self, indices: &IndexSet) -> Result<Vote> {
        let binding = self.binding.as_ref().ok_or(Error::CriterionNotConfigured)?;
        binding.check_rows(indices)?;
        let (mut positive, mut total) = (0.0, 0.0);
        for row in indices {
            if let Some(y) = Self::target(binding, row) {
                let w = binding.weight(row);
                total += w;
                if y {
                    positive += w;
                }
            }
        }
        Ok(if total > 0.0 {
            Vote::Probability(positive / total)
        } else {
            Vote::Missing
        })
    }

    fn clone_box(&self) -> Box<dyn SplittingCriterion> {
        Box::new(self.clone())
    }
}
