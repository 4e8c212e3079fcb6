use super::{Solver, SolverRun};
use crate::context::ExecutionContext;
use crate::fitness::Fitness;
use crate::search::{RolloutEnd, SearchSampler, SearchState, SoftmaxSearchSampler, rollout};
use crate::{Error, Result};

/// Evaluates one rollout from `root` per iteration.
///
/// The stop probe of the problem is polled before every transition, so a
/// long trajectory is abandoned promptly when the run is stopped. A rollout
/// that ends without a complete candidate is skipped with a warning.
///
/// With [`reinforce_best`](Self::reinforce_best), the sampler is
/// reinforced after every iteration with the best trajectory found so far
/// (replaced only on strict dominance).
pub struct RolloutSolver {
    sampler: Box<dyn SearchSampler>,
    root: Box<dyn SearchState>,
    reinforce_best: bool,
    best: Option<(Vec<usize>, Fitness)>,
}

impl RolloutSolver {
    #[must_use]
    pub fn new(sampler: Box<dyn SearchSampler>, root: Box<dyn SearchState>) -> Self {
        Self {
            sampler,
            root,
            reinforce_best: false,
            best: None,
        }
    }

    /// The sampler must then implement [`SearchSampler::reinforce`].
    #[must_use]
    pub fn reinforce_best(mut self, enabled: bool) -> Self {
        self.reinforce_best = enabled;
        self
    }

    /// Best trajectory kept for reinforcement, with its fitness.
    #[must_use]
    pub fn best(&self) -> Option<(&[usize], &Fitness)> {
        self.best.as_ref().map(|(t, f)| (t.as_slice(), f))
    }

    #[must_use]
    pub fn sampler(&self) -> &dyn SearchSampler {
        self.sampler.as_ref()
    }
}

impl core::fmt::Debug for RolloutSolver {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RolloutSolver")
            .field("sampler", &self.sampler.name())
            .field("reinforce_best", &self.reinforce_best)
            .finish_non_exhaustive()
    }
}

impl Solver for RolloutSolver {
    fn name(&self) -> &'static str {
        "rollout"
    }

    fn configure(&mut self, _ctx: &mut ExecutionContext, _run: &mut SolverRun<'_>) -> Result<()> {
        self.best = None;
        Ok(())
    }

    fn iteration(
        &mut self,
        ctx: &mut ExecutionContext,
        run: &mut SolverRun<'_>,
        _iteration: usize,
    ) -> Result<bool> {
        let problem = run.problem();
        let r = rollout(ctx, self.sampler.as_ref(), self.root.as_ref(), &|| {
            problem.should_stop()
        })?;
        if r.end == RolloutEnd::Stopped {
            return Err(Error::Cancelled);
        }
        let Some(solution) = r.solution else {
            ctx.warning(
                self.name(),
                format!("rollout of {} steps ended without a candidate", r.trajectory.len()),
            );
            return Ok(true);
        };
        let fitness = run.evaluate(ctx, &solution)?;

        if self.reinforce_best {
            if self
                .best
                .as_ref()
                .is_none_or(|(_, best)| fitness.strictly_dominates(best))
            {
                self.best = Some((r.trajectory, fitness));
            }
            if let Some((trajectory, _)) = &self.best {
                self.sampler.reinforce(self.root.as_ref(), trajectory)?;
            }
        }
        Ok(true)
    }
}

/// Nested rollout policy adaptation.
///
/// Level 0 is a single rollout with the current policy. Level `l` runs
/// `iterations` searches of level `l - 1`, each with its own copy of the
/// policy, keeps the best trajectory (replaced when the new one is at least
/// as good on every objective) and reinforces its copy with it after every
/// search. One solver iteration is one search at the top level, which costs
/// `iterations ^ level` rollouts.
pub struct NestedRolloutSolver {
    root: Box<dyn SearchState>,
    level: usize,
    iterations: usize,
    policy: Box<dyn SearchSampler>,
}

impl NestedRolloutSolver {
    /// Uses a fresh [`SoftmaxSearchSampler`] as the policy.
    #[must_use]
    pub fn new(root: Box<dyn SearchState>, level: usize, iterations: usize) -> Self {
        Self {
            root,
            level,
            iterations,
            policy: Box::new(SoftmaxSearchSampler::new()),
        }
    }

    /// Starting policy; it must implement [`SearchSampler::reinforce`] when
    /// `level > 0`.
    #[must_use]
    pub fn policy(mut self, policy: Box<dyn SearchSampler>) -> Self {
        self.policy = policy;
        self
    }

    fn search(
        &self,
        ctx: &mut ExecutionContext,
        run: &mut SolverRun<'_>,
        level: usize,
        policy: &dyn SearchSampler,
    ) -> Result<Option<(Vec<usize>, Fitness)>> {
        if level == 0 {
            let problem = run.problem();
            let r = rollout(ctx, policy, self.root.as_ref(), &|| problem.should_stop())?;
            if r.end == RolloutEnd::Stopped {
                return Err(Error::Cancelled);
            }
            let Some(solution) = r.solution else {
                ctx.warning(self.name(), "rollout ended without a candidate");
                return Ok(None);
            };
            let fitness = run.evaluate(ctx, &solution)?;
            return Ok(Some((r.trajectory, fitness)));
        }

        let mut policy = policy.clone_box();
        let mut best: Option<(Vec<usize>, Fitness)> = None;
        for _ in 0..self.iterations {
            let found = self.search(ctx, run, level - 1, policy.as_ref())?;
            if let Some(found) = found.filter(|(_, fitness)| {
                best.as_ref().is_none_or(|(_, b)| fitness.dominates(b, false))
            }) {
                best = Some(found);
            }
            if let Some((trajectory, _)) = &best {
                policy.reinforce(self.root.as_ref(), trajectory)?;
            }
        }
        trace_debug!(
            level,
            best = ?best.as_ref().map(|(_, f)| f.to_string()),
            "nested search finished"
        );
        Ok(best)
    }
}

impl core::fmt::Debug for NestedRolloutSolver {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NestedRolloutSolver")
            .field("level", &self.level)
            .field("iterations", &self.iterations)
            .field("policy", &self.policy.name())
            .finish_non_exhaustive()
    }
}

impl Solver for NestedRolloutSolver {
    fn name(&self) -> &'static str {
        "nested rollout"
    }

    fn configure(&mut self, _ctx: &mut ExecutionContext, _run: &mut SolverRun<'_>) -> Result<()> {
        if self.level > 0 && self.iterations == 0 {
            return Err(Error::InvalidConfig(
                "nested rollout needs at least one iteration per level".to_owned(),
            ));
        }
        Ok(())
    }

    fn iteration(
        &mut self,
        ctx: &mut ExecutionContext,
        run: &mut SolverRun<'_>,
        _iteration: usize,
    ) -> Result<bool> {
        self.search(ctx, run, self.level, self.policy.as_ref())?;
        Ok(true)
    }
}
