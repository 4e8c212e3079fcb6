//! Pareto ranking primitives.
//!
//! | Function | Purpose |
//! |---|---|
//! | [`non_dominated_sort`] | Partition fitness values into ranked fronts (0, 1, ...) |
//! | [`pareto_ranks`] | Rank of every element (0 = non-dominated) |
//! | [`crowding_distances`] | Diversity of each member of one front |
//! | [`hypervolume`] | Volume dominated by a point set in minimize-space |
//!
//! These free functions are what [`SolutionSet`](crate::solution_set::SolutionSet),
//! the comparators and the NSGA-II solver are built on.
//!
//! ```
//! use std::sync::Arc;
//! use moosolver::fitness::{Fitness, FitnessLimits};
//! use moosolver::pareto::{crowding_distances, non_dominated_sort};
//!
//! let limits = Arc::new(FitnessLimits::new(vec![(10.0, 0.0), (10.0, 0.0)]));
//! let points: Vec<Fitness> = [[1.0, 5.0], [5.0, 1.0], [3.0, 3.0], [2.0, 2.0]]
//!     .iter()
//!     .map(|v| Fitness::new(v.to_vec(), limits.clone()).unwrap())
//!     .collect();
//!
//! let fronts = non_dominated_sort(&points);
//! assert_eq!(fronts, vec![vec![0, 1, 3], vec![2]]);
//!
//! let cd = crowding_distances(&fronts[0], &points);
//! assert!(cd[0].is_infinite() && cd[1].is_infinite()); // boundary points
//! assert!((cd[2] - 2.0).abs() < 1e-12);
//! ```

use crate::fitness::Fitness;

/// Fast non-dominated sorting (Deb et al., 2002).
///
/// Returns fronts of indices into `fitnesses`, best first. Every index
/// appears in exactly one front, and indices within a front are ascending.
/// The result does not depend on where equal fitness values sit in the
/// input beyond their indices.
///
/// O(M·N²) dominance checks.
#[must_use]
pub fn non_dominated_sort(fitnesses: &[Fitness]) -> Vec<Vec<usize>> {
    let n = fitnesses.len();
    // dominated[p]: members p dominates; counts[p]: members dominating p
    let mut dominated: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut counts = vec![0_usize; n];

    for i in 0..n {
        for j in (i + 1)..n {
            if fitnesses[i].strictly_dominates(&fitnesses[j]) {
                dominated[i].push(j);
                counts[j] += 1;
            } else if fitnesses[j].strictly_dominates(&fitnesses[i]) {
                dominated[j].push(i);
                counts[i] += 1;
            }
        }
    }

    let mut fronts = Vec::new();
    let mut current: Vec<usize> = (0..n).filter(|&i| counts[i] == 0).collect();
    while !current.is_empty() {
        let mut next = Vec::new();
        for &p in &current {
            for &q in &dominated[p] {
                counts[q] -= 1;
                if counts[q] == 0 {
                    next.push(q);
                }
            }
        }
        next.sort_unstable();
        fronts.push(current);
        current = next;
    }
    fronts
}

/// Pareto rank of every element of `fitnesses`.
#[must_use]
pub fn pareto_ranks(fitnesses: &[Fitness]) -> Vec<usize> {
    let mut ranks = vec![0; fitnesses.len()];
    for (rank, front) in non_dominated_sort(fitnesses).iter().enumerate() {
        for &i in front {
            ranks[i] = rank;
        }
    }
    ranks
}

/// Crowding distance of each member of `front` (indices into `fitnesses`).
///
/// The members with the smallest and largest value on any objective get
/// `f64::INFINITY`; fronts of one or two members are all infinite. Interior
/// members accumulate the normalized gap between their neighbours on each
/// objective. Objectives with zero range add nothing, so every distance is
/// non-negative.
#[must_use]
pub fn crowding_distances(front: &[usize], fitnesses: &[Fitness]) -> Vec<f64> {
    let n = front.len();
    if n <= 2 {
        return vec![f64::INFINITY; n];
    }
    let n_objectives = fitnesses[front[0]].n_objectives();
    let value = |pos: usize, obj: usize| fitnesses[front[pos]].value(obj);
    let mut distances = vec![0.0_f64; n];

    for obj in 0..n_objectives {
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| value(a, obj).total_cmp(&value(b, obj)));

        distances[order[0]] = f64::INFINITY;
        distances[order[n - 1]] = f64::INFINITY;

        let range = value(order[n - 1], obj) - value(order[0], obj);
        if range > 0.0 && range.is_finite() {
            for k in 1..(n - 1) {
                distances[order[k]] += (value(order[k + 1], obj) - value(order[k - 1], obj)) / range;
            }
        }
    }
    distances
}

/// Hypervolume of `points` with respect to `reference`, both in
/// minimize-space (smaller is better on every axis).
///
/// Points that do not strictly improve on the reference in every
/// coordinate contribute nothing. Uses recursive slicing on the last axis.
#[must_use]
pub fn hypervolume(points: &[Vec<f64>], reference: &[f64]) -> f64 {
    let inside: Vec<Vec<f64>> = points
        .iter()
        .filter(|p| p.len() == reference.len() && p.iter().zip(reference).all(|(v, r)| v < r))
        .cloned()
        .collect();
    if inside.is_empty() || reference.is_empty() {
        return 0.0;
    }
    slice_volume(&inside, reference)
}

fn slice_volume(points: &[Vec<f64>], reference: &[f64]) -> f64 {
    let d = reference.len();
    if d == 1 {
        let best = points.iter().map(|p| p[0]).fold(f64::INFINITY, f64::min);
        return (reference[0] - best).max(0.0);
    }
    if let [single] = points {
        return single
            .iter()
            .zip(reference)
            .map(|(p, r)| (r - p).max(0.0))
            .product();
    }

    let last = d - 1;
    let mut sorted: Vec<&Vec<f64>> = points.iter().collect();
    sorted.sort_by(|a, b| a[last].total_cmp(&b[last]));

    let mut volume = 0.0;
    for i in 0..sorted.len() {
        let upper = sorted.get(i + 1).map_or(reference[last], |p| p[last]);
        let height = upper - sorted[i][last];
        if height <= 0.0 {
            continue;
        }
        let slab: Vec<Vec<f64>> = sorted[..=i].iter().map(|p| p[..last].to_vec()).collect();
        let slab = minimal_points(&slab);
        volume += height * slice_volume(&slab, &reference[..last]);
    }
    volume
}

/// Points of `points` not weakly-and-strictly beaten by another point.
fn minimal_points(points: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let beats = |q: &[f64], p: &[f64]| {
        q.iter().zip(p).all(|(a, b)| a <= b) && q.iter().zip(p).any(|(a, b)| a < b)
    };
    points
        .iter()
        .enumerate()
        .filter(|(i, p)| {
            !points
                .iter()
                .enumerate()
                .any(|(j, q)| j != *i && beats(q, p))
        })
        .map(|(_, p)| p.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::fitness::FitnessLimits;

    fn fits(values: &[[f64; 2]]) -> Vec<Fitness> {
        let limits = Arc::new(FitnessLimits::new(vec![(10.0, 0.0), (10.0, 0.0)]));
        values
            .iter()
            .map(|v| Fitness::new(v.to_vec(), limits.clone()).unwrap())
            .collect()
    }

    #[test]
    fn sort_known_fronts() {
        let f = fits(&[[1.0, 5.0], [5.0, 1.0], [3.0, 3.0], [4.0, 4.0], [6.0, 6.0]]);
        let fronts = non_dominated_sort(&f);
        assert_eq!(fronts, vec![vec![0, 1, 2], vec![3], vec![4]]);
        assert_eq!(pareto_ranks(&f), vec![0, 0, 0, 1, 2]);
    }

    #[test]
    fn duplicates_share_a_front() {
        let f = fits(&[[2.0, 2.0], [2.0, 2.0], [3.0, 3.0]]);
        assert_eq!(non_dominated_sort(&f), vec![vec![0, 1], vec![2]]);
    }

    #[test]
    fn empty_input() {
        assert!(non_dominated_sort(&[]).is_empty());
        assert!(crowding_distances(&[], &[]).is_empty());
    }

    #[test]
    fn crowding_boundaries_are_infinite() {
        let f = fits(&[[1.0, 5.0], [3.0, 3.0], [5.0, 1.0], [2.0, 4.0]]);
        let cd = crowding_distances(&[0, 1, 2, 3], &f);
        assert!(cd[0].is_infinite());
        assert!(cd[2].is_infinite());
        // (3,3): neighbours (2,4) and (5,1) -> 3/4 + 3/4
        assert!((cd[1] - 1.5).abs() < 1e-12);
        // (2,4): neighbours (1,5) and (3,3) -> 2/4 + 2/4
        assert!((cd[3] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn crowding_small_fronts() {
        let f = fits(&[[1.0, 5.0], [5.0, 1.0]]);
        assert_eq!(crowding_distances(&[0, 1], &f), vec![f64::INFINITY; 2]);
    }

    #[test]
    fn crowding_flat_objective_adds_nothing() {
        let f = fits(&[[1.0, 2.0], [2.0, 2.0], [3.0, 2.0]]);
        let cd = crowding_distances(&[0, 1, 2], &f);
        assert!(cd[0].is_infinite() && cd[2].is_infinite());
        assert!((cd[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn hypervolume_staircase() {
        let hv = hypervolume(
            &[vec![1.0, 3.0], vec![2.0, 2.0], vec![3.0, 1.0]],
            &[4.0, 4.0],
        );
        assert!((hv - 6.0).abs() < 1e-10);
    }

    #[test]
    fn hypervolume_ignores_points_outside_reference() {
        assert!(hypervolume(&[vec![5.0, 5.0]], &[5.0, 5.0]).abs() < f64::EPSILON);
        let hv = hypervolume(&[vec![1.0, 1.0], vec![6.0, 0.0]], &[3.0, 3.0]);
        assert!((hv - 4.0).abs() < 1e-10);
    }

    #[test]
    fn hypervolume_3d_dominated_point_is_free() {
        let hv = hypervolume(
            &[vec![1.0, 1.0, 1.0], vec![1.5, 1.5, 1.5]],
            &[2.0, 2.0, 2.0],
        );
        assert!((hv - 1.0).abs() < 1e-10);
    }

    #[test]
    fn hypervolume_one_dimension() {
        assert!((hypervolume(&[vec![1.0], vec![3.0]], &[4.0]) - 3.0).abs() < 1e-12);
    }
}
