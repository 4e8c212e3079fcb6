//! Standard test problems, used by the tests and benches.

use crate::Result;
use crate::domain::{ContinuousDomain, Domain};
use crate::problem::Problem;
use crate::solution::Solution;

/// Sphere function: unimodal, convex. Global minimum f(0,...,0) = 0.
#[must_use]
pub fn sphere_value(x: &[f64]) -> f64 {
    x.iter().map(|xi| xi * xi).sum()
}

/// ZDT1 objectives. The Pareto-optimal front is `f2 = 1 - sqrt(f1)`, reached
/// when every variable but the first is zero.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn zdt1_values(x: &[f64]) -> (f64, f64) {
    let f1 = x.first().copied().unwrap_or(0.0);
    let g = if x.len() > 1 {
        1.0 + 9.0 * x[1..].iter().sum::<f64>() / (x.len() - 1) as f64
    } else {
        1.0
    };
    (f1, g * (1.0 - (f1 / g).sqrt()))
}

/// Minimize `sum(x_i^2)` over `[-bound, bound]^dims`.
///
/// # Errors
///
/// Returns [`Error::InvalidBounds`](crate::Error::InvalidBounds) for a
/// negative or NaN `bound`.
#[allow(clippy::cast_precision_loss)]
pub fn sphere(dims: usize, bound: f64) -> Result<Problem> {
    let domain = ContinuousDomain::uniform(dims, -bound, bound)?;
    let worst = dims as f64 * bound * bound;
    Problem::builder(Domain::Continuous(domain))
        .objective(worst, 0.0, |s: &Solution| s.as_continuous().map(sphere_value))
        .build()
}

/// ZDT1 with `n` variables in `[0, 1]` (30 in the usual setting): two
/// minimized objectives with limits `(1, 0)` and `(10, 0)`.
///
/// # Errors
///
/// Returns [`Error::InvalidConfig`](crate::Error::InvalidConfig) when
/// `n == 0`.
pub fn zdt1(n: usize) -> Result<Problem> {
    if n == 0 {
        return Err(crate::Error::InvalidConfig(
            "ZDT1 needs at least one variable".to_owned(),
        ));
    }
    let domain = ContinuousDomain::uniform(n, 0.0, 1.0)?;
    Problem::builder(Domain::Continuous(domain))
        .objective(1.0, 0.0, |s: &Solution| {
            s.as_continuous().map(|x| zdt1_values(x).0)
        })
        .objective(10.0, 0.0, |s: &Solution| {
            s.as_continuous().map(|x| zdt1_values(x).1)
        })
        .build()
}

/// Schaffer's first problem: minimize `x^2` and `(x - 2)^2` for
/// `x` in `[-10, 10]`. The Pareto set is `[0, 2]`.
///
/// # Errors
///
/// Never fails in practice; the signature matches the other builders.
pub fn schaffer_n1() -> Result<Problem> {
    Problem::builder(Domain::continuous(vec![(-10.0, 10.0)])?)
        .objective(100.0, 0.0, |s: &Solution| {
            s.as_continuous().map(|x| x[0] * x[0])
        })
        .objective(144.0, 0.0, |s: &Solution| {
            s.as_continuous().map(|x| (x[0] - 2.0).powi(2))
        })
        .build()
}
