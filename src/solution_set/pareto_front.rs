use std::sync::Arc;

use super::SolutionSet;
use crate::fitness::{Fitness, FitnessLimits};
use crate::solution::Solution;
use crate::{Result, pareto};

/// A set of mutually non-dominated candidates.
///
/// Members are kept in ascending lexicographic order of their raw
/// objective values, so iteration walks the front from one extreme to
/// the other.
#[derive(Clone, Debug)]
pub struct ParetoFront {
    set: SolutionSet,
}

impl ParetoFront {
    #[must_use]
    pub fn new(limits: Arc<FitnessLimits>) -> Self {
        Self {
            set: SolutionSet::new(limits),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.set.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    #[must_use]
    pub fn limits(&self) -> &Arc<FitnessLimits> {
        self.set.limits()
    }

    /// The members as a plain solution set.
    #[must_use]
    pub fn as_set(&self) -> &SolutionSet {
        &self.set
    }

    #[must_use]
    pub fn into_set(self) -> SolutionSet {
        self.set
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Solution, &Fitness)> {
        self.set.iter()
    }

    #[must_use]
    pub fn fitness(&self, index: usize) -> &Fitness {
        self.set.fitness(index)
    }

    /// Offers a candidate to the front.
    ///
    /// The candidate is discarded if a member strictly dominates it, or
    /// if a member has the same fitness or the same solution. Otherwise
    /// it is inserted and every member it strictly dominates is removed.
    /// Returns whether the candidate was inserted.
    ///
    /// # Errors
    ///
    /// Fails when the fitness does not belong to the front's limits.
    pub fn insert(&mut self, solution: Solution, fitness: Fitness) -> Result<bool> {
        self.set.check_fitness(&fitness)?;
        let rejected = self.set.iter().any(|(s, f)| {
            f.strictly_dominates(&fitness) || f.values() == fitness.values() || *s == solution
        });
        if rejected {
            return Ok(false);
        }
        self.set.retain(|_, f| !fitness.strictly_dominates(f));
        let position = self
            .set
            .fitnesses()
            .iter()
            .position(|f| fitness.values() <= f.values())
            .unwrap_or(self.set.len());
        self.set.insert_at(position, solution, fitness);
        Ok(true)
    }

    /// Offers every element of `solutions` in turn.
    ///
    /// # Errors
    ///
    /// Fails on the first fitness with foreign limits.
    pub fn insert_solutions(&mut self, solutions: &SolutionSet) -> Result<()> {
        for (s, f) in solutions.iter() {
            self.insert(s.clone(), f.clone())?;
        }
        Ok(())
    }

    pub(crate) fn remove(&mut self, index: usize) -> (Solution, Fitness) {
        self.set.remove(index)
    }

    // -----------------------------------------------------------------------
    // Quality indicators
    // -----------------------------------------------------------------------

    /// Volume of objective space dominated by the front and bounded by
    /// `reference`, which defaults to the worst possible fitness of the
    /// limits. Members that do not improve on the reference in every
    /// objective contribute nothing.
    ///
    /// With a single objective this is the distance from the best member
    /// to the reference. An infinite reference gives an infinite volume.
    #[must_use]
    pub fn hypervolume(&self, reference: Option<&Fitness>) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let reference = reference.map_or_else(
            || Fitness::worst_possible(self.limits(), false).values_to_be_minimized(),
            Fitness::values_to_be_minimized,
        );
        let points: Vec<Vec<f64>> = self
            .set
            .fitnesses()
            .iter()
            .map(Fitness::values_to_be_minimized)
            .collect();
        pareto::hypervolume(&points, &reference)
    }

    /// Deb's spread Δ over consecutive members, with the outer gaps
    /// standing in for the distances to the extremes. Uneven spacing gives
    /// a larger value. Fronts with fewer than three members give 0.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn spread_indicator(&self) -> f64 {
        let n = self.len();
        if n < 3 {
            return 0.0;
        }
        let f = self.set.fitnesses();
        let gaps: Vec<f64> = f.windows(2).map(|w| w[0].euclidean_distance(&w[1])).collect();
        let mean = gaps.iter().sum::<f64>() / gaps.len() as f64;
        let (first, last) = (gaps[0], gaps[gaps.len() - 1]);
        let interior: f64 = gaps[1..gaps.len() - 1]
            .iter()
            .map(|d| (d - mean).abs())
            .sum();
        let denominator = first + last + (n - 1) as f64 * mean;
        if denominator == 0.0 {
            0.0
        } else {
            (first + last + interior) / denominator
        }
    }

    /// Smallest additive shift `eps` such that every member of `reference`
    /// is weakly dominated by some member of `self` shifted by `eps`.
    ///
    /// `INFINITY` if `self` is empty, `NEG_INFINITY` if `reference` is.
    ///
    /// # Errors
    ///
    /// Fails when the two fronts use incompatible limits.
    pub fn additive_epsilon_indicator(&self, reference: &ParetoFront) -> Result<f64> {
        self.epsilon_indicator(reference, Fitness::additive_epsilon)
    }

    /// Multiplicative counterpart of
    /// [`additive_epsilon_indicator`](Self::additive_epsilon_indicator),
    /// meaningful for strictly positive objective values.
    ///
    /// # Errors
    ///
    /// Fails when the two fronts use incompatible limits.
    pub fn multiplicative_epsilon_indicator(&self, reference: &ParetoFront) -> Result<f64> {
        self.epsilon_indicator(reference, Fitness::multiplicative_epsilon)
    }

    fn epsilon_indicator(
        &self,
        reference: &ParetoFront,
        epsilon: impl Fn(&Fitness, &Fitness) -> f64,
    ) -> Result<f64> {
        if let Some(r) = reference.set.fitnesses().first() {
            self.set.check_fitness(r)?;
        }
        Ok(reference
            .set
            .fitnesses()
            .iter()
            .map(|r| {
                self.set
                    .fitnesses()
                    .iter()
                    .map(|a| epsilon(a, r))
                    .fold(f64::INFINITY, f64::min)
            })
            .fold(f64::NEG_INFINITY, f64::max))
    }
}

/// Pareto front holding at most `capacity` members.
///
/// When an insertion overflows the capacity, the member with the smallest
/// crowding distance (the first one on ties) is evicted. Boundary members
/// have infinite distance and are evicted last.
#[derive(Clone, Debug)]
pub struct CrowdingArchive {
    front: ParetoFront,
    capacity: usize,
}

impl CrowdingArchive {
    #[must_use]
    pub fn new(limits: Arc<FitnessLimits>, capacity: usize) -> Self {
        Self {
            front: ParetoFront::new(limits),
            capacity,
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.front.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.front.is_empty()
    }

    #[must_use]
    pub fn front(&self) -> &ParetoFront {
        &self.front
    }

    #[must_use]
    pub fn into_front(self) -> ParetoFront {
        self.front
    }

    /// Offers a candidate, then evicts the most crowded members while the
    /// archive is over capacity. Returns whether the candidate entered the
    /// front (it may be the one evicted).
    ///
    /// # Errors
    ///
    /// Fails when the fitness does not belong to the archive's limits.
    pub fn insert(&mut self, solution: Solution, fitness: Fitness) -> Result<bool> {
        let inserted = self.front.insert(solution, fitness)?;
        while self.front.len() > self.capacity {
            let members: Vec<usize> = (0..self.front.len()).collect();
            let distances = pareto::crowding_distances(&members, self.front.as_set().fitnesses());
            let mut most_crowded = 0;
            for (i, &d) in distances.iter().enumerate() {
                if d < distances[most_crowded] {
                    most_crowded = i;
                }
            }
            trace_debug!(index = most_crowded, "crowding archive eviction");
            self.front.remove(most_crowded);
        }
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solution_set::tests::{limits2, set_of};

    fn fit(v: [f64; 2]) -> Fitness {
        Fitness::new(v.to_vec(), limits2()).unwrap()
    }

    #[test]
    fn front_of_set() {
        let set = set_of(&[[1.0, 5.0], [5.0, 1.0], [3.0, 3.0], [2.0, 2.0]]);
        let front = set.pareto_front();
        let values: Vec<&[f64]> = front.iter().map(|(_, f)| f.values()).collect();
        assert_eq!(values, vec![&[1.0, 5.0][..], &[2.0, 2.0], &[5.0, 1.0]]);
    }

    #[test]
    fn insert_rules() {
        let mut front = ParetoFront::new(limits2());
        assert!(front.insert(Solution::Discrete(0), fit([3.0, 3.0])).unwrap());
        // dominated
        assert!(!front.insert(Solution::Discrete(1), fit([4.0, 4.0])).unwrap());
        // same fitness
        assert!(!front.insert(Solution::Discrete(2), fit([3.0, 3.0])).unwrap());
        // same solution
        assert!(!front.insert(Solution::Discrete(0), fit([9.0, 0.0])).unwrap());
        // incomparable
        assert!(front.insert(Solution::Discrete(3), fit([1.0, 6.0])).unwrap());
        // dominates both
        assert!(front.insert(Solution::Discrete(4), fit([0.5, 0.5])).unwrap());
        assert_eq!(front.len(), 1);
    }

    #[test]
    fn hypervolume_defaults_to_worst_fitness() {
        let set = set_of(&[[2.0, 8.0], [5.0, 5.0], [8.0, 2.0]]);
        let front = set.pareto_front();
        // reference (10, 10): 8*2 + 5*3 + 2*3 = 37
        assert!((front.hypervolume(None) - 37.0).abs() < 1e-9);
        let r = fit([6.0, 6.0]);
        assert!((front.hypervolume(Some(&r)) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn hypervolume_single_objective() {
        let limits = Arc::new(FitnessLimits::new(vec![(0.0, 10.0)]));
        let mut front = ParetoFront::new(limits.clone());
        front
            .insert(
                Solution::Discrete(0),
                Fitness::new(vec![7.0], limits.clone()).unwrap(),
            )
            .unwrap();
        assert!((front.hypervolume(None) - 7.0).abs() < 1e-12);
    }

    #[test]
    fn spread_of_even_front_is_small() {
        let even = set_of(&[[0.0, 4.0], [1.0, 3.0], [2.0, 2.0], [3.0, 1.0], [4.0, 0.0]]).pareto_front();
        let uneven =
            set_of(&[[0.0, 4.0], [0.1, 3.9], [0.2, 3.8], [3.0, 1.0], [4.0, 0.0]]).pareto_front();
        assert!(even.spread_indicator() < uneven.spread_indicator());
    }

    #[test]
    fn epsilon_indicators() {
        let a = set_of(&[[1.0, 3.0], [3.0, 1.0]]).pareto_front();
        let b = set_of(&[[2.0, 4.0], [4.0, 2.0]]).pareto_front();
        // a dominates b by a margin of 1 on each point
        assert!((a.additive_epsilon_indicator(&b).unwrap() + 1.0).abs() < 1e-12);
        assert!((b.additive_epsilon_indicator(&a).unwrap() - 1.0).abs() < 1e-12);
        assert!(a.multiplicative_epsilon_indicator(&b).unwrap() < 1.0);
    }

    #[test]
    fn archive_respects_capacity_and_keeps_extremes() {
        let mut archive = CrowdingArchive::new(limits2(), 3);
        for (i, v) in [[0.0, 4.0], [4.0, 0.0], [2.0, 2.0], [1.9, 2.1], [1.0, 3.0]]
            .iter()
            .enumerate()
        {
            archive.insert(Solution::Discrete(i), fit(*v)).unwrap();
        }
        assert_eq!(archive.len(), 3);
        let values: Vec<Vec<f64>> = archive
            .front()
            .iter()
            .map(|(_, f)| f.values().to_vec())
            .collect();
        assert!(values.contains(&vec![0.0, 4.0]));
        assert!(values.contains(&vec![4.0, 0.0]));
    }
}
