#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when a lower bound is greater than its upper bound, or a bound is NaN.
    #[error(
        "invalid bounds on dimension {dimension}: low ({low}) must be less than or equal to high ({high})"
    )]
    InvalidBounds {
        /// The offending dimension.
        dimension: usize,
        /// The lower bound value.
        low: f64,
        /// The upper bound value.
        high: f64,
    },

    /// Returned when sampling from a domain or action set with no elements.
    #[error("cannot sample from an empty domain")]
    EmptyDomain,

    /// Returned when a component bound to one domain is used with another,
    /// or when a component does not support the given kind of domain.
    #[error("domain mismatch: expected {expected}, got {got}")]
    DomainMismatch {
        /// What the component expected.
        expected: &'static str,
        /// What it was given.
        got: &'static str,
    },

    /// Returned when a solution does not have the shape its domain requires.
    #[error("solution mismatch: expected {expected}, got {got}")]
    SolutionMismatch {
        /// The expected solution shape.
        expected: String,
        /// The actual solution shape.
        got: String,
    },

    /// Returned when a fitness vector does not match its limits.
    #[error("fitness dimension mismatch: expected {expected} objectives, got {got}")]
    FitnessDimensionMismatch {
        /// Number of objectives declared by the limits.
        expected: usize,
        /// Number of values supplied.
        got: usize,
    },

    /// Returned when fitness values tied to different limits are mixed.
    #[error("fitness values belong to different fitness limits")]
    LimitsMismatch,

    /// Returned when a sampler is used before `initialize`.
    #[error("sampler '{0}' used before initialize")]
    SamplerNotInitialized(&'static str),

    /// Returned when a comparator is used before `initialize`, or against
    /// a solution set other than the one it was initialized with.
    #[error("comparator '{0}' is not initialized for this solution set")]
    ComparatorNotInitialized(&'static str),

    /// Returned when an optional capability (`learn`, `reinforce`) is
    /// invoked on a component that does not provide it.
    #[error("'{component}' does not support {operation}")]
    Unsupported {
        /// The operation that was requested.
        operation: &'static str,
        /// The component it was requested from.
        component: &'static str,
    },

    /// Returned when mixture weights are negative or do not sum to one.
    #[error("invalid mixture weights: {0}")]
    InvalidMixtureWeights(String),

    /// Returned when a probability is outside `[0, 1]`.
    #[error("invalid probability: {0} must be in [0, 1]")]
    InvalidProbability(f64),

    /// Returned when a weighted draw has no positive weight.
    #[error("cannot sample from weights that are all zero")]
    ZeroWeights,

    /// Returned when more elements are requested than are available.
    #[error("cannot sample {requested} elements out of {available}")]
    SubsetTooLarge {
        /// Requested subset size.
        requested: usize,
        /// Number of available elements.
        available: usize,
    },

    /// Returned when an index is outside its container.
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// The container length.
        len: usize,
    },

    /// Returned when indices handed to an index set are not strictly increasing.
    #[error("index {0} breaks the ascending order of the index set")]
    UnsortedIndex(usize),

    /// Returned when a table column does not have the table's row count.
    #[error("column '{column}' has {got} rows, expected {expected}")]
    ColumnLengthMismatch {
        /// Name of the column.
        column: String,
        /// Row count of the table.
        expected: usize,
        /// Row count of the column.
        got: usize,
    },

    /// Returned when a column name cannot be found.
    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    /// Returned when a column is not of the expected element type.
    #[error("column '{column}' is not {expected}")]
    ColumnTypeMismatch {
        /// Name of the column.
        column: String,
        /// The expected element type.
        expected: &'static str,
    },

    /// Returned when a splitting criterion is used before `configure`.
    #[error("splitting criterion used before configure")]
    CriterionNotConfigured,

    /// Returned when the number of predictions does not match the configured indices.
    #[error("expected {expected} predictions, got {got}")]
    PredictionLengthMismatch {
        /// Number of configured indices.
        expected: usize,
        /// Number of predictions supplied.
        got: usize,
    },

    /// Returned when a problem is built without objectives.
    #[error("a problem needs at least one objective")]
    NoObjectives,

    /// Returned when a component receives a parameter outside its valid range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Returned by an objective that has no value for a candidate.
    #[error("objective {0} returned no value")]
    MissingObjectiveValue(usize),

    /// Returned by an objective whose evaluation failed.
    #[error("objective evaluation failed: {0}")]
    ObjectiveFailed(String),

    /// Returned by multi-step operations that observed a cancellation request.
    #[error("operation cancelled")]
    Cancelled,

    /// Returned when an internal invariant is violated.
    #[error("internal error: {0}")]
    Internal(&'static str),

    /// Returned when a parallel evaluation task fails.
    #[cfg(feature = "async")]
    #[error("async task error: {0}")]
    TaskFailed(String),
}

impl Error {
    /// Whether this error comes from evaluating a single candidate.
    ///
    /// Evaluation errors penalize the candidate with the worst fitness and
    /// the search continues. Every other error is a configuration mistake
    /// and aborts the operation.
    #[must_use]
    pub fn is_evaluation_error(&self) -> bool {
        matches!(self, Self::MissingObjectiveValue(_) | Self::ObjectiveFailed(_))
    }
}

pub type Result<T> = core::result::Result<T, Error>;
