#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{Split, SplitPrediction, SplittingCriterion, Vote, WeakLearner};
use crate::Result;
use crate::data::{ColumnData, DataTable, IndexSet};

/// Node of a [`DecisionTree`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TreeNode {
    Leaf(Vote),
    Test {
        split: Split,
        negative: Box<TreeNode>,
        positive: Box<TreeNode>,
        missing: Box<TreeNode>,
    },
}

impl TreeNode {
    fn depth(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::Test {
                negative,
                positive,
                missing,
                ..
            } => 1 + negative.depth().max(positive.depth()).max(missing.depth()),
        }
    }

    fn n_tests(&self) -> usize {
        match self {
            Self::Leaf(_) => 0,
            Self::Test {
                negative,
                positive,
                missing,
                ..
            } => 1 + negative.n_tests() + positive.n_tests() + missing.n_tests(),
        }
    }
}

/// A tree grown by applying a weak learner recursively.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DecisionTree {
    root: TreeNode,
}

struct Grower<'a> {
    table: &'a DataTable,
    target: usize,
    criterion: &'a mut dyn SplittingCriterion,
    learner: &'a dyn WeakLearner,
    max_depth: usize,
    min_samples: usize,
}

impl Grower<'_> {
    fn is_constant(&self, indices: &IndexSet) -> bool {
        let Ok(column) = self.table.column(self.target) else {
            return true;
        };
        let mut rows = indices.iter();
        let Some(first) = rows.next() else {
            return true;
        };
        match &column.data {
            ColumnData::Numeric(v) => rows.all(|r| v[r].total_cmp(&v[first]).is_eq()),
            ColumnData::Boolean(v) => rows.all(|r| v[r] == v[first]),
            ColumnData::Label { values, .. } => rows.all(|r| values[r] == values[first]),
        }
    }

    fn leaf(&mut self, indices: &IndexSet) -> Result<TreeNode> {
        Ok(TreeNode::Leaf(self.criterion.compute_vote(indices)?))
    }

    fn make(&mut self, indices: &IndexSet, depth: usize, fallback: &Vote) -> Result<TreeNode> {
        if indices.is_empty() {
            return Ok(TreeNode::Leaf(fallback.clone()));
        }
        self.criterion.configure(self.table, self.target, None, indices)?;
        if indices.len() < self.min_samples
            || (self.max_depth > 0 && depth >= self.max_depth)
            || self.is_constant(indices)
        {
            return self.leaf(indices);
        }

        let node = self.learner.learn(self.table, &mut *self.criterion)?;
        let Some(node) = node.filter(|n| n.split != Split::Constant) else {
            return self.leaf(indices);
        };
        let [negative, positive, missing] = node.split.dispatch(self.table, indices);
        if [&negative, &positive, &missing].iter().any(|b| b.len() == indices.len()) {
            return self.leaf(indices);
        }
        trace_debug!(
            depth,
            rows = indices.len(),
            split = ?node.split,
            score = node.score,
            "tree split"
        );

        let own = self.criterion.compute_vote(indices)?;
        let negative = self.make(&negative, depth + 1, &own)?;
        let positive = self.make(&positive, depth + 1, &own)?;
        let missing = self.make(&missing, depth + 1, &own)?;
        Ok(TreeNode::Test {
            split: node.split,
            negative: Box::new(negative),
            positive: Box::new(positive),
            missing: Box::new(missing),
        })
    }
}

impl DecisionTree {
    /// Grows a tree predicting column `target` of `table` from every row.
    ///
    /// A node becomes a leaf when it has fewer than `min_samples` rows, is
    /// at depth `max_depth` (0 means unlimited), has a constant target, or
    /// when the learner finds no split that separates its rows. An empty
    /// branch is a leaf voting like its parent.
    ///
    /// # Errors
    ///
    /// Propagates configuration errors of the criterion, such as a target
    /// of the wrong type.
    pub fn grow(
        table: &DataTable,
        target: usize,
        criterion: &mut dyn SplittingCriterion,
        learner: &dyn WeakLearner,
        max_depth: usize,
        min_samples: usize,
    ) -> Result<Self> {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("grow_tree", rows = table.n_samples()).entered();

        let all = IndexSet::range(0, table.n_samples());
        let mut grower = Grower {
            table,
            target,
            criterion,
            learner,
            max_depth,
            min_samples,
        };
        let root = grower.make(&all, 1, &Vote::Missing)?;
        trace_debug!(depth = root.depth(), tests = root.n_tests(), "tree grown");
        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    /// Number of levels; a single leaf has depth 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.root.depth()
    }

    #[must_use]
    pub fn n_test_nodes(&self) -> usize {
        self.root.n_tests()
    }

    /// Vote of the leaf `row` of `table` falls into.
    #[must_use]
    pub fn predict(&self, table: &DataTable, row: usize) -> &Vote {
        let mut node = &self.root;
        loop {
            match node {
                TreeNode::Leaf(vote) => return vote,
                TreeNode::Test {
                    split,
                    negative,
                    positive,
                    missing,
                } => {
                    node = match split.predict(table, row) {
                        SplitPrediction::False => negative,
                        SplitPrediction::True => positive,
                        SplitPrediction::Missing => missing,
                    };
                }
            }
        }
    }
}
