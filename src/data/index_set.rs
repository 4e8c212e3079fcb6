#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::context::ExecutionContext;
use crate::{Error, Result};

/// Sorted set of row indices.
///
/// Members are kept strictly increasing by every operation, including the
/// random ones.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IndexSet {
    indices: Vec<usize>,
}

impl IndexSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every index in `begin..end`.
    #[must_use]
    pub fn range(begin: usize, end: usize) -> Self {
        Self {
            indices: (begin..end).collect(),
        }
    }

    /// Set holding `indices`, which may come in any order and repeat.
    #[must_use]
    pub fn from_indices(mut indices: Vec<usize>) -> Self {
        indices.sort_unstable();
        indices.dedup();
        Self { indices }
    }

    /// Appends `index`, which must be greater than every current member.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsortedIndex`] otherwise.
    pub fn push(&mut self, index: usize) -> Result<()> {
        if self.indices.last().is_some_and(|&last| index <= last) {
            return Err(Error::UnsortedIndex(index));
        }
        self.indices.push(index);
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.indices.binary_search(&index).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[usize] {
        &self.indices
    }

    /// `k` distinct members drawn without replacement.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SubsetTooLarge`] when `k > len()`.
    pub fn sample_subset(&self, ctx: &mut ExecutionContext, k: usize) -> Result<IndexSet> {
        if k > self.len() {
            return Err(Error::SubsetTooLarge {
                requested: k,
                available: self.len(),
            });
        }
        let mut picked: Vec<usize> = ctx
            .sample_order(self.len())
            .into_iter()
            .take(k)
            .map(|i| self.indices[i])
            .collect();
        picked.sort_unstable();
        Ok(Self { indices: picked })
    }

    /// `len()` members drawn with replacement, sorted. Repeats are kept, so
    /// the result is a plain vector rather than a set.
    pub fn sample_bootstrap(&self, ctx: &mut ExecutionContext) -> Vec<usize> {
        let n = self.len();
        let mut draws: Vec<usize> = (0..n)
            .map(|_| self.indices[ctx.rng().usize(..n)])
            .collect();
        draws.sort_unstable();
        draws
    }

    /// Members for which `predicate` holds, and the others.
    pub fn split_by(&self, mut predicate: impl FnMut(usize) -> bool) -> (IndexSet, IndexSet) {
        let (yes, no): (Vec<usize>, Vec<usize>) = self.iter().partition(|&i| predicate(i));
        (Self { indices: yes }, Self { indices: no })
    }

    #[must_use]
    pub fn intersection(&self, other: &IndexSet) -> IndexSet {
        let (mut a, mut b) = (self.indices.iter().peekable(), other.indices.iter().peekable());
        let mut indices = Vec::with_capacity(self.len().min(other.len()));
        while let (Some(&&x), Some(&&y)) = (a.peek(), b.peek()) {
            match x.cmp(&y) {
                core::cmp::Ordering::Less => {
                    a.next();
                }
                core::cmp::Ordering::Greater => {
                    b.next();
                }
                core::cmp::Ordering::Equal => {
                    indices.push(x);
                    a.next();
                    b.next();
                }
            }
        }
        Self { indices }
    }
}

impl FromIterator<usize> for IndexSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self::from_indices(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a IndexSet {
    type Item = usize;
    type IntoIter = core::iter::Copied<core::slice::Iter<'a, usize>>;

    fn into_iter(self) -> Self::IntoIter {
        self.indices.iter().copied()
    }
}
