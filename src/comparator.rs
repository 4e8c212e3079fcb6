//! Orderings over the elements of a [`SolutionSet`].
//!
//! A comparator is bound to one set by [`SolutionComparator::initialize`],
//! which performs all precomputation (ranks, crowding distances).
//! [`compare`](SolutionComparator::compare) then works on indices into
//! that set and never re-sorts. `Ordering::Less` means the first index is
//! better. `Ordering::Equal` means tie or incomparable; it is not an error.
//!
//! | Comparator | Order |
//! |---|---|
//! | [`DominanceComparator`] | strict Pareto dominance (partial) |
//! | [`LexicographicComparator`] | objectives in declared order |
//! | [`ObjectiveComparator`] | a single objective |
//! | [`ParetoRankAndCrowdingComparator`] | NSGA-II: rank, then larger crowding distance |

use core::cmp::Ordering;

use crate::fitness::Fitness;
use crate::solution_set::SolutionSet;
use crate::{Error, Result};

/// Ordering strategy over the indices of one solution set.
pub trait SolutionComparator: Send + Sync {
    /// Short name used in errors.
    fn name(&self) -> &'static str;

    /// Binds the comparator to `solutions` and precomputes what `compare` needs.
    fn initialize(&mut self, solutions: &SolutionSet);

    /// Compares elements `a` and `b` of the bound set; `Less` if `a` is better.
    ///
    /// # Panics
    ///
    /// Panics when called before [`initialize`](Self::initialize) or with
    /// an index outside the bound set.
    fn compare(&self, a: usize, b: usize) -> Ordering;

    /// Identity and length of the set this comparator is bound to.
    fn binding(&self) -> Option<Binding>;

    /// Whether the comparator is bound to `solutions` in its current state.
    fn is_bound_to(&self, solutions: &SolutionSet) -> bool {
        self.binding() == Some(Binding::of(solutions))
    }

    /// [`compare`](Self::compare) after checking the binding.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ComparatorNotInitialized`] if the comparator is not
    /// bound to `solutions`, or bound to an older state of it.
    fn compare_in(&self, solutions: &SolutionSet, a: usize, b: usize) -> Result<Ordering> {
        if !self.is_bound_to(solutions) {
            return Err(Error::ComparatorNotInitialized(self.name()));
        }
        let len = solutions.len();
        if a >= len || b >= len {
            return Err(Error::IndexOutOfRange {
                index: a.max(b),
                len,
            });
        }
        Ok(self.compare(a, b))
    }
}

/// Which set (and which length of it) a comparator was initialized on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Binding {
    set_id: u64,
    len: usize,
}

impl Binding {
    #[must_use]
    pub fn of(solutions: &SolutionSet) -> Self {
        Self {
            set_id: solutions.id(),
            len: solutions.len(),
        }
    }
}

/// Stable merge sort of `indices` under `cmp`.
///
/// Unlike `slice::sort_by`, this tolerates comparators that are not total
/// orders (such as dominance): it always terminates and never panics.
pub(crate) fn sort_indices_by(indices: &mut [usize], cmp: impl Fn(usize, usize) -> Ordering) {
    fn merge_sort(v: &[usize], cmp: &dyn Fn(usize, usize) -> Ordering) -> Vec<usize> {
        if v.len() <= 1 {
            return v.to_vec();
        }
        let mid = v.len() / 2;
        let left = merge_sort(&v[..mid], cmp);
        let right = merge_sort(&v[mid..], cmp);
        let mut out = Vec::with_capacity(v.len());
        let (mut i, mut j) = (0, 0);
        while i < left.len() && j < right.len() {
            if cmp(right[j], left[i]) == Ordering::Less {
                out.push(right[j]);
                j += 1;
            } else {
                out.push(left[i]);
                i += 1;
            }
        }
        out.extend_from_slice(&left[i..]);
        out.extend_from_slice(&right[j..]);
        out
    }
    let sorted = merge_sort(indices, &cmp);
    indices.copy_from_slice(&sorted);
}

fn bound<'a>(fitnesses: &'a [Fitness], name: &str, binding: Option<Binding>) -> &'a [Fitness] {
    assert!(binding.is_some(), "{name} used before initialize");
    fitnesses
}

// ---------------------------------------------------------------------------
// Dominance
// ---------------------------------------------------------------------------

/// `Less` if `a` strictly dominates `b`, `Greater` for the reverse, `Equal` otherwise.
///
/// Dominance is a partial order, so sorting with this comparator only
/// orders pairs that are compared directly: a dominated member can stay
/// ahead of its dominator when an incomparable member sits between them.
/// Use [`ParetoRankAndCrowdingComparator`] for a ranking that respects
/// dominance across the whole set.
#[derive(Clone, Debug, Default)]
pub struct DominanceComparator {
    fitnesses: Vec<Fitness>,
    binding: Option<Binding>,
}

impl DominanceComparator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SolutionComparator for DominanceComparator {
    fn name(&self) -> &'static str {
        "dominance"
    }

    fn initialize(&mut self, solutions: &SolutionSet) {
        self.fitnesses = solutions.fitnesses().to_vec();
        self.binding = Some(Binding::of(solutions));
    }

    fn compare(&self, a: usize, b: usize) -> Ordering {
        let f = bound(&self.fitnesses, self.name(), self.binding);
        if f[a].strictly_dominates(&f[b]) {
            Ordering::Less
        } else if f[b].strictly_dominates(&f[a]) {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }

    fn binding(&self) -> Option<Binding> {
        self.binding
    }
}

// ---------------------------------------------------------------------------
// Lexicographic
// ---------------------------------------------------------------------------

/// First objective (in declared order) with an unequal value decides.
#[derive(Clone, Debug, Default)]
pub struct LexicographicComparator {
    fitnesses: Vec<Fitness>,
    binding: Option<Binding>,
}

impl LexicographicComparator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SolutionComparator for LexicographicComparator {
    fn name(&self) -> &'static str {
        "lexicographic"
    }

    fn initialize(&mut self, solutions: &SolutionSet) {
        self.fitnesses = solutions.fitnesses().to_vec();
        self.binding = Some(Binding::of(solutions));
    }

    fn compare(&self, a: usize, b: usize) -> Ordering {
        let f = bound(&self.fitnesses, self.name(), self.binding);
        for i in 0..f[a].n_objectives() {
            let delta = f[a].compare_objective(&f[b], i);
            if delta > 0.0 {
                return Ordering::Less;
            }
            if delta < 0.0 {
                return Ordering::Greater;
            }
        }
        Ordering::Equal
    }

    fn binding(&self) -> Option<Binding> {
        self.binding
    }
}

// ---------------------------------------------------------------------------
// Single objective
// ---------------------------------------------------------------------------

/// Compares on one objective only.
#[derive(Clone, Debug)]
pub struct ObjectiveComparator {
    objective: usize,
    fitnesses: Vec<Fitness>,
    binding: Option<Binding>,
}

impl ObjectiveComparator {
    #[must_use]
    pub fn new(objective: usize) -> Self {
        Self {
            objective,
            fitnesses: Vec::new(),
            binding: None,
        }
    }

    #[must_use]
    pub fn objective(&self) -> usize {
        self.objective
    }
}

impl SolutionComparator for ObjectiveComparator {
    fn name(&self) -> &'static str {
        "objective"
    }

    fn initialize(&mut self, solutions: &SolutionSet) {
        self.fitnesses = solutions.fitnesses().to_vec();
        self.binding = Some(Binding::of(solutions));
    }

    fn compare(&self, a: usize, b: usize) -> Ordering {
        let f = bound(&self.fitnesses, self.name(), self.binding);
        let delta = f[a].compare_objective(&f[b], self.objective);
        0.0_f64.partial_cmp(&delta).unwrap_or(Ordering::Equal)
    }

    fn binding(&self) -> Option<Binding> {
        self.binding
    }
}

// ---------------------------------------------------------------------------
// NSGA-II rank and crowding
// ---------------------------------------------------------------------------

/// Lower Pareto rank wins; on equal rank the larger crowding distance wins.
///
/// Ranks and distances are computed once in `initialize`.
#[derive(Clone, Debug, Default)]
pub struct ParetoRankAndCrowdingComparator {
    ranks: Vec<usize>,
    crowding: Vec<f64>,
    binding: Option<Binding>,
}

impl ParetoRankAndCrowdingComparator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rank of element `i` of the bound set.
    #[must_use]
    pub fn rank(&self, i: usize) -> Option<usize> {
        self.ranks.get(i).copied()
    }

    /// Crowding distance of element `i` of the bound set.
    #[must_use]
    pub fn crowding_distance(&self, i: usize) -> Option<f64> {
        self.crowding.get(i).copied()
    }
}

impl SolutionComparator for ParetoRankAndCrowdingComparator {
    fn name(&self) -> &'static str {
        "pareto rank and crowding distance"
    }

    fn initialize(&mut self, solutions: &SolutionSet) {
        let n = solutions.len();
        self.ranks = vec![0; n];
        self.crowding = vec![0.0; n];
        for front in solutions.non_dominated_sort() {
            for (&i, &d) in front.indices.iter().zip(&front.crowding_distances) {
                self.ranks[i] = front.rank;
                self.crowding[i] = d;
            }
        }
        self.binding = Some(Binding::of(solutions));
    }

    fn compare(&self, a: usize, b: usize) -> Ordering {
        assert!(self.binding.is_some(), "{} used before initialize", self.name());
        self.ranks[a].cmp(&self.ranks[b]).then_with(|| {
            self.crowding[b]
                .partial_cmp(&self.crowding[a])
                .unwrap_or(Ordering::Equal)
        })
    }

    fn binding(&self) -> Option<Binding> {
        self.binding
    }
}
