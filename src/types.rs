//! Small shared enums.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The direction of optimization for one objective.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Direction {
    /// Minimize the objective value.
    Minimize,
    /// Maximize the objective value.
    Maximize,
}

impl Direction {
    /// `+1.0` for maximization, `-1.0` for minimization.
    #[must_use]
    pub fn sign(self) -> f64 {
        match self {
            Self::Minimize => -1.0,
            Self::Maximize => 1.0,
        }
    }
}

/// How much a solver reports while running.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Verbosity {
    /// Report nothing.
    #[default]
    Quiet,
    /// Report the best fitness at the end of each iteration.
    Progress,
    /// Also report the size and hypervolume of the Pareto front after each
    /// iteration.
    Detailed,
    /// Report everything, including each evaluation.
    All,
}
