use std::sync::Arc;

use parking_lot::Mutex;

use super::SolutionSet;
use crate::Result;
use crate::fitness::{Fitness, FitnessLimits};
use crate::solution::Solution;

/// A [`SolutionSet`] that several evaluation workers insert into.
///
/// This is a thin wrapper around `Arc<Mutex<SolutionSet>>`: clones share
/// the same set, and insertions are serialized one at a time. Results may
/// arrive in any order; nothing downstream depends on insertion order.
#[derive(Clone, Debug)]
pub struct SharedSolutionSet {
    inner: Arc<Mutex<SolutionSet>>,
}

impl SharedSolutionSet {
    /// Creates an empty shared set.
    #[must_use]
    pub fn new(limits: Arc<FitnessLimits>) -> Self {
        Self::from_set(SolutionSet::new(limits))
    }

    /// Wraps an existing set.
    #[must_use]
    pub fn from_set(set: SolutionSet) -> Self {
        Self {
            inner: Arc::new(Mutex::new(set)),
        }
    }

    /// Inserts one pair under the lock.
    ///
    /// # Errors
    ///
    /// Fails when the fitness does not belong to the set's limits.
    pub fn insert(&self, solution: Solution, fitness: Fitness) -> Result<()> {
        self.inner.lock().insert_solution(solution, fitness)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn mark_incomplete(&self) {
        self.inner.lock().mark_incomplete();
    }

    /// Runs `f` on the set while holding the lock.
    pub fn with_set<R>(&self, f: impl FnOnce(&SolutionSet) -> R) -> R {
        f(&self.inner.lock())
    }

    /// Copy of the current contents.
    #[must_use]
    pub fn snapshot(&self) -> SolutionSet {
        self.inner.lock().clone()
    }

    /// The set itself if this is the last handle, a copy otherwise.
    #[must_use]
    pub fn into_inner(self) -> SolutionSet {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => mutex.into_inner(),
            Err(shared) => shared.lock().clone(),
        }
    }
}
