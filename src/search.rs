//! Sequential construction of candidates, for rollout-based solvers.
//!
//! A [`SearchState`] is a partially built candidate that advances one
//! action at a time until it is final. A [`SearchSampler`] picks the next
//! action. [`rollout`] ties the two together and polls a stop probe before
//! every transition.

use std::collections::HashMap;

use crate::context::ExecutionContext;
use crate::domain::{ExpressionDomain, SequenceDomain};
use crate::expression::{Expression, PostfixToken, push_postfix};
use crate::solution::Solution;
use crate::{Error, Result};

/// A partially built candidate.
pub trait SearchState: Send + Sync {
    /// Actions allowed from this state. Empty when nothing can follow.
    fn available_actions(&self) -> Vec<usize>;

    /// Applies `action`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`] for an action that is not
    /// available.
    fn perform_transition(&mut self, action: usize) -> Result<()>;

    fn is_final_state(&self) -> bool;

    /// Number of transitions performed since the initial state.
    fn depth(&self) -> usize;

    /// The candidate built so far, if the state describes a complete one.
    fn to_solution(&self) -> Option<Solution>;

    fn clone_box(&self) -> Box<dyn SearchState>;
}

impl Clone for Box<dyn SearchState> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

fn unavailable(action: usize, n: usize) -> Error {
    Error::IndexOutOfRange {
        index: action,
        len: n,
    }
}

// ---------------------------------------------------------------------------
// Sequences
// ---------------------------------------------------------------------------

/// Builds a [`Solution::Trajectory`] over a fixed alphabet; final once it
/// holds `max_length` actions.
#[derive(Clone, Debug)]
pub struct SequenceState {
    domain: SequenceDomain,
    actions: Vec<usize>,
}

impl SequenceState {
    #[must_use]
    pub fn new(domain: SequenceDomain) -> Self {
        Self {
            domain,
            actions: Vec::with_capacity(domain.max_length),
        }
    }

    #[must_use]
    pub fn actions(&self) -> &[usize] {
        &self.actions
    }
}

impl SearchState for SequenceState {
    fn available_actions(&self) -> Vec<usize> {
        if self.is_final_state() {
            Vec::new()
        } else {
            (0..self.domain.n_actions).collect()
        }
    }

    fn perform_transition(&mut self, action: usize) -> Result<()> {
        if self.is_final_state() || action >= self.domain.n_actions {
            return Err(unavailable(action, self.domain.n_actions));
        }
        self.actions.push(action);
        Ok(())
    }

    fn is_final_state(&self) -> bool {
        self.actions.len() >= self.domain.max_length
    }

    fn depth(&self) -> usize {
        self.actions.len()
    }

    fn to_solution(&self) -> Option<Solution> {
        Some(Solution::Trajectory(self.actions.clone()))
    }

    fn clone_box(&self) -> Box<dyn SearchState> {
        Box::new(self.clone())
    }
}

// ---------------------------------------------------------------------------
// Postfix expressions
// ---------------------------------------------------------------------------

/// Builds an expression tree in postfix order.
///
/// Actions are numbered as follows: first one per input variable, then one
/// per constant, then one per operator of the domain, and last a "yield"
/// action that ends the construction once the stack holds a single tree.
/// At most `max_tokens` tokens are pushed, and operators are only offered
/// when the resulting tree respects the domain's depth limit.
#[derive(Clone, Debug)]
pub struct PostfixExpressionState {
    domain: ExpressionDomain,
    max_tokens: usize,
    stack: Vec<Expression>,
    tokens: usize,
    transitions: usize,
    yielded: bool,
}

impl PostfixExpressionState {
    #[must_use]
    pub fn new(domain: ExpressionDomain, max_tokens: usize) -> Self {
        Self {
            domain,
            max_tokens,
            stack: Vec::new(),
            tokens: 0,
            transitions: 0,
            yielded: false,
        }
    }

    fn n_terminals(&self) -> usize {
        self.domain.n_inputs() + self.domain.constants().len()
    }

    /// Index of the yield action.
    #[must_use]
    pub fn yield_action(&self) -> usize {
        self.n_terminals() + self.domain.operators().len()
    }

    fn remaining(&self) -> usize {
        self.max_tokens.saturating_sub(self.tokens)
    }

    fn has_reducer(&self) -> bool {
        self.domain.operators().iter().any(|o| o.arity() >= 2)
    }

    /// Whether one more terminal still leaves room to reduce the stack to
    /// a single tree.
    fn can_push(&self) -> bool {
        let remaining = self.remaining();
        if remaining == 0 {
            return false;
        }
        if self.stack.is_empty() {
            return true;
        }
        // every extra tree needs one binary reduction
        self.has_reducer() && self.stack.len() < remaining
    }

    fn can_apply(&self, operator: crate::expression::Operator) -> bool {
        let arity = operator.arity();
        if self.remaining() == 0 || self.stack.len() < arity {
            return false;
        }
        let deepest = self.stack[self.stack.len() - arity..]
            .iter()
            .map(Expression::depth)
            .max()
            .unwrap_or(0);
        deepest < self.domain.max_depth()
    }

    fn token(&self, action: usize) -> Option<PostfixToken> {
        let n_inputs = self.domain.n_inputs();
        let n_terminals = self.n_terminals();
        if action < n_inputs {
            Some(PostfixToken::Input(action))
        } else if action < n_terminals {
            Some(PostfixToken::Constant(
                self.domain.constants()[action - n_inputs],
            ))
        } else {
            self.domain
                .operators()
                .get(action - n_terminals)
                .copied()
                .map(PostfixToken::Apply)
        }
    }
}

impl SearchState for PostfixExpressionState {
    fn available_actions(&self) -> Vec<usize> {
        if self.yielded {
            return Vec::new();
        }
        let mut actions = Vec::new();
        if self.can_push() {
            actions.extend(0..self.n_terminals());
        }
        let n_terminals = self.n_terminals();
        for (i, &operator) in self.domain.operators().iter().enumerate() {
            if self.can_apply(operator) {
                actions.push(n_terminals + i);
            }
        }
        if self.stack.len() == 1 {
            actions.push(self.yield_action());
        }
        actions
    }

    fn perform_transition(&mut self, action: usize) -> Result<()> {
        let n = self.yield_action() + 1;
        if !self.available_actions().contains(&action) {
            return Err(unavailable(action, n));
        }
        self.transitions += 1;
        if action == self.yield_action() {
            self.yielded = true;
            return Ok(());
        }
        let token = self.token(action).ok_or_else(|| unavailable(action, n))?;
        push_postfix(&mut self.stack, token)?;
        self.tokens += 1;
        Ok(())
    }

    fn is_final_state(&self) -> bool {
        self.yielded || (self.stack.len() == 1 && self.remaining() == 0)
    }

    fn depth(&self) -> usize {
        self.transitions
    }

    fn to_solution(&self) -> Option<Solution> {
        match self.stack.as_slice() {
            [tree] => Some(Solution::Tree(tree.clone())),
            _ => None,
        }
    }

    fn clone_box(&self) -> Box<dyn SearchState> {
        Box::new(self.clone())
    }
}

// ---------------------------------------------------------------------------
// Action samplers
// ---------------------------------------------------------------------------

/// Chooses the next action of a rollout.
pub trait SearchSampler: Send + Sync {
    fn name(&self) -> &'static str;

    /// Picks one of `actions`, which are the actions available in `state`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyDomain`] when `actions` is empty.
    fn sample_action(
        &self,
        ctx: &mut ExecutionContext,
        state: &dyn SearchState,
        actions: &[usize],
    ) -> Result<usize>;

    /// Shifts the policy toward `trajectory`, replayed from `root`.
    ///
    /// # Errors
    ///
    /// The default implementation returns [`Error::Unsupported`].
    fn reinforce(&mut self, _root: &dyn SearchState, _trajectory: &[usize]) -> Result<()> {
        Err(Error::Unsupported {
            operation: "reinforce",
            component: self.name(),
        })
    }

    fn clone_box(&self) -> Box<dyn SearchSampler>;
}

impl Clone for Box<dyn SearchSampler> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Uniform choice among the available actions.
#[derive(Clone, Copy, Debug, Default)]
pub struct UniformSearchSampler;

impl SearchSampler for UniformSearchSampler {
    fn name(&self) -> &'static str {
        "uniform search"
    }

    fn sample_action(
        &self,
        ctx: &mut ExecutionContext,
        _state: &dyn SearchState,
        actions: &[usize],
    ) -> Result<usize> {
        let i = ctx.sample_index(actions.len())?;
        Ok(actions[i])
    }

    fn clone_box(&self) -> Box<dyn SearchSampler> {
        Box::new(*self)
    }
}

/// Softmax policy over per-(depth, action) preferences, adapted the way
/// nested rollout policy adaptation does.
///
/// Unseen preferences are zero, so a fresh sampler is uniform.
#[derive(Clone, Debug)]
pub struct SoftmaxSearchSampler {
    preferences: HashMap<(usize, usize), f64>,
    temperature: f64,
    learning_rate: f64,
}

impl SoftmaxSearchSampler {
    #[must_use]
    pub fn new() -> Self {
        Self {
            preferences: HashMap::new(),
            temperature: 1.0,
            learning_rate: 1.0,
        }
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] unless `temperature > 0`.
    pub fn temperature(mut self, temperature: f64) -> Result<Self> {
        if temperature.is_nan() || temperature <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "softmax temperature must be positive, got {temperature}"
            )));
        }
        self.temperature = temperature;
        Ok(self)
    }

    #[must_use]
    pub fn learning_rate(mut self, rate: f64) -> Self {
        self.learning_rate = rate;
        self
    }

    #[must_use]
    pub fn preference(&self, depth: usize, action: usize) -> f64 {
        self.preferences.get(&(depth, action)).copied().unwrap_or(0.0)
    }

    /// Probability of each of `actions` at `depth`.
    #[must_use]
    pub fn probabilities(&self, depth: usize, actions: &[usize]) -> Vec<f64> {
        let logits: Vec<f64> = actions
            .iter()
            .map(|&a| self.preference(depth, a) / self.temperature)
            .collect();
        let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !max.is_finite() {
            return vec![0.0; actions.len()];
        }
        let log_sum = max + logits.iter().map(|l| (l - max).exp()).sum::<f64>().ln();
        logits.iter().map(|l| (l - log_sum).exp()).collect()
    }
}

impl Default for SoftmaxSearchSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchSampler for SoftmaxSearchSampler {
    fn name(&self) -> &'static str {
        "softmax search"
    }

    fn sample_action(
        &self,
        ctx: &mut ExecutionContext,
        state: &dyn SearchState,
        actions: &[usize],
    ) -> Result<usize> {
        if actions.is_empty() {
            return Err(Error::EmptyDomain);
        }
        let probabilities = self.probabilities(state.depth(), actions);
        let i = ctx.sample_with_probabilities(&probabilities)?;
        Ok(actions[i])
    }

    fn reinforce(&mut self, root: &dyn SearchState, trajectory: &[usize]) -> Result<()> {
        let mut state = root.clone_box();
        let mut updates = Vec::new();
        for &chosen in trajectory {
            let depth = state.depth();
            let actions = state.available_actions();
            let probabilities = self.probabilities(depth, &actions);
            updates.push(((depth, chosen), self.learning_rate));
            for (&a, p) in actions.iter().zip(probabilities) {
                updates.push(((depth, a), -self.learning_rate * p));
            }
            state.perform_transition(chosen)?;
        }
        for (key, delta) in updates {
            *self.preferences.entry(key).or_insert(0.0) += delta;
        }
        Ok(())
    }

    fn clone_box(&self) -> Box<dyn SearchSampler> {
        Box::new(self.clone())
    }
}

// ---------------------------------------------------------------------------
// Rollout
// ---------------------------------------------------------------------------

/// Why a rollout ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RolloutEnd {
    /// The state became final.
    Final,
    /// No action was available before reaching a final state.
    NoActions,
    /// The stop probe fired before a transition.
    Stopped,
}

/// The outcome of one [`rollout`].
#[derive(Clone, Debug)]
pub struct Rollout {
    pub trajectory: Vec<usize>,
    pub solution: Option<Solution>,
    pub end: RolloutEnd,
}

/// Drives a copy of `root` with `sampler` until it is final, no action is
/// available, or `should_stop` returns `true` (checked before every
/// transition).
///
/// # Errors
///
/// Propagates sampler and transition errors.
pub fn rollout(
    ctx: &mut ExecutionContext,
    sampler: &dyn SearchSampler,
    root: &dyn SearchState,
    should_stop: &dyn Fn() -> bool,
) -> Result<Rollout> {
    let mut state = root.clone_box();
    let mut trajectory = Vec::new();
    let end = loop {
        if state.is_final_state() {
            break RolloutEnd::Final;
        }
        if should_stop() || ctx.is_cancelled() {
            break RolloutEnd::Stopped;
        }
        let actions = state.available_actions();
        if actions.is_empty() {
            break RolloutEnd::NoActions;
        }
        let action = sampler.sample_action(ctx, state.as_ref(), &actions)?;
        state.perform_transition(action)?;
        trajectory.push(action);
    };
    let solution = match end {
        RolloutEnd::Stopped => None,
        RolloutEnd::Final | RolloutEnd::NoActions => state.to_solution(),
    };
    Ok(Rollout {
        trajectory,
        solution,
        end,
    })
}
