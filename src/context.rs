//! Explicit execution context handed to every sampling, evaluation and
//! solver operation.
//!
//! The context owns the random source, the cooperative cancellation flag,
//! an optional telemetry sink, and a log of warnings and errors raised
//! while running. Nothing in the crate reaches for a global generator or a
//! global error handler; everything goes through an `ExecutionContext`.
//!
//! # Example
//!
//! ```
//! use moosolver::context::ExecutionContext;
//!
//! let mut ctx = ExecutionContext::with_seed(42);
//! let x = ctx.sample_double(-1.0, 1.0);
//! assert!((-1.0..=1.0).contains(&x));
//!
//! let token = ctx.cancellation_token();
//! token.cancel();
//! assert!(ctx.is_cancelled());
//! ```

use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::{Error, Result, rng_util};

/// Shared cooperative cancellation flag.
///
/// Clones share the same flag, so a token can be handed to a driving
/// thread (or a timer) that cancels a running solver.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called on any clone.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Telemetry sink receiving named scalar results.
pub trait ResultSink: Send + Sync {
    /// Records one named value.
    fn report(&self, name: &str, value: f64);
}

/// A sink that keeps every reported value in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    values: Mutex<Vec<(String, f64)>>,
}

impl MemorySink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All reported values, in report order.
    #[must_use]
    pub fn values(&self) -> Vec<(String, f64)> {
        self.values.lock().clone()
    }

    /// Values reported under `name`, in report order.
    #[must_use]
    pub fn series(&self, name: &str) -> Vec<f64> {
        self.values
            .lock()
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, v)| *v)
            .collect()
    }
}

impl ResultSink for MemorySink {
    fn report(&self, name: &str, value: f64) {
        self.values.lock().push((name.to_owned(), value));
    }
}

/// Severity of a [`Diagnostic`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    /// Recoverable condition; the run continued.
    Warning,
    /// An operation failed.
    Error,
}

/// One warning or error raised through the context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// Warning or error.
    pub severity: Severity,
    /// Where it was raised, e.g. `"Problem::evaluate"`.
    pub location: String,
    /// What happened.
    pub message: String,
}

/// Random source, cancellation flag, telemetry sink and diagnostics log.
pub struct ExecutionContext {
    rng: fastrand::Rng,
    cancel: CancellationToken,
    sink: Option<Arc<dyn ResultSink>>,
    diagnostics: Arc<Mutex<Vec<Diagnostic>>>,
}

impl ExecutionContext {
    /// Creates a context with a randomly seeded generator.
    #[must_use]
    pub fn new() -> Self {
        Self::from_rng(fastrand::Rng::new())
    }

    /// Creates a context whose generator is seeded for reproducibility.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(fastrand::Rng::with_seed(seed))
    }

    fn from_rng(rng: fastrand::Rng) -> Self {
        Self {
            rng,
            cancel: CancellationToken::new(),
            sink: None,
            diagnostics: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Attaches a telemetry sink.
    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn ResultSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Uses an existing cancellation token instead of a fresh one.
    #[must_use]
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Child context for a concurrent worker.
    ///
    /// The child gets its own generator seeded from this one, and shares the
    /// cancellation flag, the sink and the diagnostics log.
    #[must_use]
    pub fn fork(&mut self) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(self.rng.u64(..)),
            cancel: self.cancel.clone(),
            sink: self.sink.clone(),
            diagnostics: Arc::clone(&self.diagnostics),
        }
    }

    /// Direct access to the generator.
    pub fn rng(&mut self) -> &mut fastrand::Rng {
        &mut self.rng
    }

    // -----------------------------------------------------------------------
    // Random source
    // -----------------------------------------------------------------------

    /// Uniform draw in `[low, high]`; returns `low` when `low == high`.
    pub fn sample_double(&mut self, low: f64, high: f64) -> f64 {
        if low >= high {
            return low;
        }
        rng_util::f64_range(&mut self.rng, low, high)
    }

    /// `true` with probability `p` (clamped into `[0, 1]`).
    pub fn sample_bool(&mut self, p: f64) -> bool {
        self.rng.f64() < p.clamp(0.0, 1.0)
    }

    /// Uniform index in `0..n`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyDomain`] when `n == 0`.
    pub fn sample_index(&mut self, n: usize) -> Result<usize> {
        if n == 0 {
            return Err(Error::EmptyDomain);
        }
        Ok(self.rng.usize(..n))
    }

    /// Normal draw with the given mean and standard deviation.
    pub fn sample_gaussian(&mut self, mean: f64, std_dev: f64) -> f64 {
        mean + std_dev * rng_util::standard_normal(&mut self.rng)
    }

    /// Index drawn proportionally to `weights`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyDomain`] for an empty slice and
    /// [`Error::ZeroWeights`] when no weight is positive.
    pub fn sample_with_probabilities(&mut self, weights: &[f64]) -> Result<usize> {
        rng_util::weighted_index(&mut self.rng, weights)
    }

    /// Uniformly random permutation of `0..n`.
    pub fn sample_order(&mut self, n: usize) -> Vec<usize> {
        rng_util::permutation(&mut self.rng, n)
    }

    // -----------------------------------------------------------------------
    // Cancellation
    // -----------------------------------------------------------------------

    /// A clone of this context's cancellation token.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    // -----------------------------------------------------------------------
    // Observability
    // -----------------------------------------------------------------------

    /// Sends a named value to the telemetry sink, if any.
    pub fn report_result(&self, name: &str, value: f64) {
        if let Some(sink) = &self.sink {
            sink.report(name, value);
        }
    }

    /// Records a recoverable problem.
    pub fn warning(&self, location: &str, message: impl Into<String>) {
        let message = message.into();
        trace_warn!(location, message = %message, "warning");
        self.diagnostics.lock().push(Diagnostic {
            severity: Severity::Warning,
            location: location.to_owned(),
            message,
        });
    }

    /// Records a failed operation.
    pub fn error(&self, location: &str, message: impl Into<String>) {
        let message = message.into();
        trace_warn!(location, message = %message, "error");
        self.diagnostics.lock().push(Diagnostic {
            severity: Severity::Error,
            location: location.to_owned(),
            message,
        });
    }

    /// Snapshot of every warning and error recorded so far, including those
    /// recorded by forked contexts.
    #[must_use]
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.lock().clone()
    }

    /// Number of warnings recorded so far.
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .lock()
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("cancelled", &self.is_cancelled())
            .field("has_sink", &self.sink.is_some())
            .field("diagnostics", &self.diagnostics.lock().len())
            .finish_non_exhaustive()
    }
}
