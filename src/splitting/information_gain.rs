use super::{Binding, SplitPrediction, SplittingCriterion, Vote, entropy};
use crate::data::{ColumnData, DataTable, IndexSet};
use crate::{Error, Result};

/// Information gain of a split for a label target (natural logarithm).
///
/// The missing branch is a branch of its own. The normalized form divides
/// twice the gain by `H(Y) + H(split)`, which bounds it by 1.
#[derive(Clone, Debug, Default)]
pub struct InformationGainCriterion {
    normalize: bool,
    binding: Option<Binding>,
    n_labels: usize,
    /// Label weights per branch.
    counts: [Vec<f64>; 3],
}

impl InformationGainCriterion {
    #[must_use]
    pub fn new(normalize: bool) -> Self {
        Self {
            normalize,
            ..Self::default()
        }
    }

    fn label(binding: &Binding, row: usize) -> Option<usize> {
        match &binding.target {
            ColumnData::Label { values, .. } => values[row],
            _ => None,
        }
    }
}

impl SplittingCriterion for InformationGainCriterion {
    fn name(&self) -> &'static str {
        "information gain"
    }

    fn configure(
        &mut self,
        table: &DataTable,
        target: usize,
        weights: Option<&[f64]>,
        indices: &IndexSet,
    ) -> Result<()> {
        let binding = Binding::new(table, target, weights, indices, "label", |d| {
            matches!(d, ColumnData::Label { .. })
        })?;
        self.n_labels = match &binding.target {
            ColumnData::Label { n_labels, .. } => *n_labels,
            _ => 0,
        };
        self.binding = Some(binding);
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
        let mut counts: [Vec<f64>; 3] = core::array::from_fn(|_| vec![0.0; self.n_labels]);
        for (row, branch) in binding.rows() {
            if let Some(label) = Self::label(binding, row).filter(|&l| l < self.n_labels) {
                counts[branch][label] += binding.weight(row);
            }
        }
        self.counts = counts;
        binding.dirty = false;
        Ok(())
    }

    fn compute_criterion(&mut self) -> Result<f64> {
        self.ensure_is_up_to_date()?;
        let branch_weights: Vec<f64> = self.counts.iter().map(|c| c.iter().sum()).collect();
        let total: f64 = branch_weights.iter().sum();
        if total <= 0.0 {
            return Ok(0.0);
        }
        let prior: Vec<f64> = (0..self.n_labels)
            .map(|l| self.counts.iter().map(|c| c[l]).sum())
            .collect();
        let h_y = entropy(&prior);
        let h_y_given_split: f64 = self
            .counts
            .iter()
            .zip(&branch_weights)
            .map(|(c, &w)| w / total * entropy(c))
            .sum();
        let gain = (h_y - h_y_given_split).max(0.0);
        if !self.normalize {
            return Ok(gain);
        }
        let denominator = h_y + entropy(&branch_weights);
        Ok(if denominator > 0.0 {
            2.0 * gain / denominator
        } else {
            0.0
        })
    }

    #[allow(clippy::cast_precision_loss)]
    fn objective_range(&self) -> (f64, f64) {
        if self.normalize {
            (0.0, 1.0)
        } else {
            (0.0, (self.n_labels.max(1) as f64).ln())
        }
    }

    fn compute_vote(&self, indices: &IndexSet) -> Result<Vote> {
        let binding = self.binding.as_ref().ok_or(Error::CriterionNotConfigured)?;
        binding.check_rows(indices)?;
        let mut distribution = vec![0.0; self.n_labels];
        for row in indices {
            if let Some(label) = Self::label(binding, row).filter(|&l| l < self.n_labels) {
                distribution[label] += binding.weight(row);
            }
        }
        let total: f64 = distribution.iter().sum();
        if total <= 0.0 {
            return Ok(Vote::Missing);
        }
        for p in &mut distribution {
            *p /= total;
        }
        Ok(Vote::Distribution(distribution))
    }

    fn clone_box(&self) -> Box<dyn SplittingCriterion> {
        Box::new(self.clone())
    }
}
