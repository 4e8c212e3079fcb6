//! Collections of evaluated candidates.
//!
//! | Type | Holds |
//! |---|---|
//! | [`SolutionSet`] | Every `(solution, fitness)` pair, duplicates included |
//! | [`ParetoFront`] | Only mutually non-dominated pairs |
//! | [`CrowdingArchive`] | A Pareto front capped in size, evicting crowded members |
//! | [`SharedSolutionSet`] | A `SolutionSet` behind a mutex for concurrent inserters |
//!
//! A set grows monotonically while a solver runs. Ranking is computed on
//! demand: [`SolutionSet::non_dominated_sort`] partitions the set into
//! [`SubFront`]s carrying crowding distances, and comparator-driven
//! operations ([`SolutionSet::sorted_by`], [`SolutionSet::select_n_bests`])
//! initialize the comparator once and reuse it for every comparison.

mod pareto_front;
mod shared;

use core::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub use pareto_front::{CrowdingArchive, ParetoFront};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
pub use shared::SharedSolutionSet;

use crate::comparator::{SolutionComparator, sort_indices_by};
use crate::fitness::{Fitness, FitnessLimits};
use crate::pareto;
use crate::solution::Solution;
use crate::{Error, Result};

static NEXT_SET_ID: AtomicU64 = AtomicU64::new(1);

fn next_set_id() -> u64 {
    NEXT_SET_ID.fetch_add(1, Ordering::Relaxed)
}

/// One rank of a non-dominated sort.
#[derive(Clone, Debug, PartialEq)]
pub struct SubFront {
    /// 0 for the non-dominated set, `k` for the set left after removing ranks `< k`.
    pub rank: usize,
    /// Indices into the parent set, ascending.
    pub indices: Vec<usize>,
    /// Crowding distance of each member, aligned with `indices`.
    pub crowding_distances: Vec<f64>,
}

/// Multiset of evaluated candidates sharing one [`FitnessLimits`].
#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SolutionSet {
    #[cfg_attr(feature = "serde", serde(skip, default = "next_set_id"))]
    id: u64,
    limits: Arc<FitnessLimits>,
    solutions: Vec<Solution>,
    fitnesses: Vec<Fitness>,
    incomplete: bool,
}

impl Clone for SolutionSet {
    /// Copies the contents; the copy is a distinct set with its own id.
    fn clone(&self) -> Self {
        Self {
            id: next_set_id(),
            limits: Arc::clone(&self.limits),
            solutions: self.solutions.clone(),
            fitnesses: self.fitnesses.clone(),
            incomplete: self.incomplete,
        }
    }
}

impl SolutionSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new(limits: Arc<FitnessLimits>) -> Self {
        Self {
            id: next_set_id(),
            limits,
            solutions: Vec::new(),
            fitnesses: Vec::new(),
            incomplete: false,
        }
    }

    /// Process-unique identity of this set, used to detect comparators
    /// bound to another set.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn limits(&self) -> &Arc<FitnessLimits> {
        &self.limits
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }

    /// Verifies that `fitness` belongs to this set's limits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FitnessDimensionMismatch`] or [`Error::LimitsMismatch`].
    pub fn check_fitness(&self, fitness: &Fitness) -> Result<()> {
        if fitness.n_objectives() != self.limits.n_objectives() {
            return Err(Error::FitnessDimensionMismatch {
                expected: self.limits.n_objectives(),
                got: fitness.n_objectives(),
            });
        }
        if !Arc::ptr_eq(fitness.limits(), &self.limits) && **fitness.limits() != *self.limits {
            return Err(Error::LimitsMismatch);
        }
        Ok(())
    }

    /// Appends one pair.
    ///
    /// # Errors
    ///
    /// Fails when the fitness does not belong to this set's limits.
    pub fn insert_solution(&mut self, solution: Solution, fitness: Fitness) -> Result<()> {
        self.check_fitness(&fitness)?;
        self.solutions.push(solution);
        self.fitnesses.push(fitness);
        Ok(())
    }

    /// Appends every pair of `other`, keeping duplicates.
    ///
    /// # Errors
    ///
    /// Fails when `other` uses incompatible limits; nothing is inserted then.
    pub fn insert_solutions(&mut self, other: &SolutionSet) -> Result<()> {
        if let Some(f) = other.fitnesses.first() {
            self.check_fitness(f)?;
        }
        self.solutions.extend(other.solutions.iter().cloned());
        self.fitnesses.extend(other.fitnesses.iter().cloned());
        if other.incomplete {
            self.incomplete = true;
        }
        Ok(())
    }

    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[must_use]
    pub fn solution(&self, index: usize) -> &Solution {
        &self.solutions[index]
    }

    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[must_use]
    pub fn fitness(&self, index: usize) -> &Fitness {
        &self.fitnesses[index]
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<(&Solution, &Fitness)> {
        Some((self.solutions.get(index)?, self.fitnesses.get(index)?))
    }

    #[must_use]
    pub fn solutions(&self) -> &[Solution] {
        &self.solutions
    }

    #[must_use]
    pub fn fitnesses(&self) -> &[Fitness] {
        &self.fitnesses
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Solution, &Fitness)> {
        self.solutions.iter().zip(&self.fitnesses)
    }

    /// Marks the set as the partial result of an interrupted or failed run.
    pub fn mark_incomplete(&mut self) {
        self.incomplete = true;
    }

    #[must_use]
    pub fn is_incomplete(&self) -> bool {
        self.incomplete
    }

    pub(crate) fn retain(&mut self, mut keep: impl FnMut(&Solution, &Fitness) -> bool) {
        let mask: Vec<bool> = self.iter().map(|(s, f)| keep(s, f)).collect();
        let mut it = mask.iter();
        self.solutions.retain(|_| *it.next().unwrap_or(&true));
        let mut it = mask.iter();
        self.fitnesses.retain(|_| *it.next().unwrap_or(&true));
    }

    pub(crate) fn insert_at(&mut self, position: usize, solution: Solution, fitness: Fitness) {
        self.solutions.insert(position, solution);
        self.fitnesses.insert(position, fitness);
    }

    pub(crate) fn remove(&mut self, index: usize) -> (Solution, Fitness) {
        (self.solutions.remove(index), self.fitnesses.remove(index))
    }

    // -----------------------------------------------------------------------
    // Pareto ranking
    // -----------------------------------------------------------------------

    /// Partitions the set into ranked sub-fronts, best first.
    #[must_use]
    pub fn non_dominated_sort(&self) -> Vec<SubFront> {
        pareto::non_dominated_sort(&self.fitnesses)
            .into_iter()
            .enumerate()
            .map(|(rank, indices)| {
                let crowding_distances = pareto::crowding_distances(&indices, &self.fitnesses);
                SubFront {
                    rank,
                    indices,
                    crowding_distances,
                }
            })
            .collect()
    }

    /// Pareto rank of every element.
    #[must_use]
    pub fn pareto_ranks(&self) -> Vec<usize> {
        pareto::pareto_ranks(&self.fitnesses)
    }

    /// Crowding distance of every element, computed within its own sub-front.
    #[must_use]
    pub fn crowding_distances(&self) -> Vec<f64> {
        let mut distances = vec![0.0; self.len()];
        for front in self.non_dominated_sort() {
            for (&i, &d) in front.indices.iter().zip(&front.crowding_distances) {
                distances[i] = d;
            }
        }
        distances
    }

    /// Non-dominated subset as a [`ParetoFront`].
    #[must_use]
    pub fn pareto_front(&self) -> ParetoFront {
        let mut front = ParetoFront::new(Arc::clone(&self.limits));
        for (s, f) in self.iter() {
            // Fitness values come from this set, so limits always match.
            let _ = front.insert(s.clone(), f.clone());
        }
        front
    }

    /// Whether some member strictly dominates `fitness`.
    #[must_use]
    pub fn strictly_dominates(&self, fitness: &Fitness) -> bool {
        self.fitnesses.iter().any(|f| f.strictly_dominates(fitness))
    }

    /// Observed `(worst, best)` per objective, oriented like the set's limits.
    /// When a maximized objective takes a single value, `best` is the next
    /// float above it so the direction is kept. Returns `None` on an empty
    /// set.
    #[must_use]
    pub fn empirical_limits(&self) -> Option<FitnessLimits> {
        if self.is_empty() {
            return None;
        }
        let limits = (0..self.limits.n_objectives())
            .map(|j| {
                let (lo, hi) = self
                    .fitnesses
                    .iter()
                    .map(|f| f.value(j))
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                        (lo.min(v), hi.max(v))
                    });
                if self.limits.is_maximized(j) {
                    // equal bounds would read as minimized
                    (lo, if hi > lo { hi } else { lo.next_up() })
                } else {
                    (hi, lo)
                }
            })
            .collect();
        Some(FitnessLimits::new(limits).with_tolerance(self.limits.tolerance()))
    }

    /// Hypervolume of the set's Pareto front. See [`ParetoFront::hypervolume`].
    #[must_use]
    pub fn hypervolume(&self, reference: Option<&Fitness>) -> f64 {
        self.pareto_front().hypervolume(reference)
    }

    // -----------------------------------------------------------------------
    // Comparator-driven selection
    // -----------------------------------------------------------------------

    /// Indices ordered best first according to `comparator`. Ties keep
    /// their original order.
    ///
    /// The result is only a full ranking for total orders. With a partial
    /// order such as [`DominanceComparator`](crate::comparator::DominanceComparator)
    /// it depends on the input order, and a dominated element may come
    /// before the element dominating it.
    pub fn sorted_indices<C: SolutionComparator + ?Sized>(&self, comparator: &mut C) -> Vec<usize> {
        comparator.initialize(self);
        let mut order: Vec<usize> = (0..self.len()).collect();
        sort_indices_by(&mut order, |a, b| comparator.compare(a, b));
        order
    }

    /// Sorted copy of the set plus the mapping from new to old positions.
    pub fn sorted_by<C: SolutionComparator + ?Sized>(
        &self,
        comparator: &mut C,
    ) -> (SolutionSet, Vec<usize>) {
        let mapping = self.sorted_indices(comparator);
        (self.subset(&mapping), mapping)
    }

    /// Index of a best element, the first one on ties.
    pub fn find_best_index<C: SolutionComparator + ?Sized>(
        &self,
        comparator: &mut C,
    ) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        comparator.initialize(self);
        let mut best = 0;
        for i in 1..self.len() {
            if comparator.compare(i, best).is_lt() {
                best = i;
            }
        }
        Some(best)
    }

    /// Best element according to `comparator`.
    pub fn best<C: SolutionComparator + ?Sized>(
        &self,
        comparator: &mut C,
    ) -> Option<(&Solution, &Fitness)> {
        self.find_best_index(comparator).and_then(|i| self.get(i))
    }

    /// The `n` best elements, best first (all of them if `n >= len()`).
    /// Same ordering caveat as [`sorted_indices`](Self::sorted_indices) for
    /// comparators that are not total orders.
    pub fn select_n_bests<C: SolutionComparator + ?Sized>(
        &self,
        comparator: &mut C,
        n: usize,
    ) -> SolutionSet {
        let mut order = self.sorted_indices(comparator);
        order.truncate(n);
        self.subset(&order)
    }

    /// New set holding the elements at `indices`, in that order.
    ///
    /// # Panics
    ///
    /// Panics if an index is out of range.
    #[must_use]
    pub fn subset(&self, indices: &[usize]) -> SolutionSet {
        let mut res = SolutionSet::new(Arc::clone(&self.limits));
        res.solutions = indices.iter().map(|&i| self.solutions[i].clone()).collect();
        res.fitnesses = indices.iter().map(|&i| self.fitnesses[i].clone()).collect();
        res.incomplete = self.incomplete;
        res
    }

    /// Cycles through the elements until the result holds `size` of them.
    /// An empty set stays empty.
    #[must_use]
    pub fn duplicate_until_size(&self, size: usize) -> SolutionSet {
        if self.is_empty() {
            return self.clone();
        }
        let indices: Vec<usize> = (0..size).map(|i| i % self.len()).collect();
        self.subset(&indices)
    }
}
