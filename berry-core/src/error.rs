//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug)]
pub enum BerryError {
    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),

    /// An optional operation that the implementor does not provide.
    #[error("{0} not implemented.")]
    NotImplemented(&'static str),

    /// Parameters that the agent does not know about.
    #[error("Unknown parameters sent to agent: {0:?}")]
    UnknownParameters(Vec<String>),

    /// Malformed parameters, e.g., a value of the wrong type.
    #[error("Invalid parameters sent to agent: {0}")]
    InvalidParameters(String),

    /// Inconsistent space definition.
    #[error("Invalid space: {0}")]
    InvalidSpace(String),

    /// Inconsistent environment definition.
    #[error("Invalid environment: {0}")]
    InvalidEnv(String),

    /// A hyperparameter range with `low > high` or a non-positive log range.
    #[error("Invalid range for parameter {name}: [{low}, {high}]")]
    InvalidRange {
        /// Parameter name.
        name: String,
        /// Lower bound.
        low: f64,
        /// Upper bound.
        high: f64,
    },

    /// The study finished without a usable trial.
    #[error("No trial was completed")]
    NoCompletedTrial,

    /// Operations on fitted agents called before [`AgentStats::fit`](crate::AgentStats::fit).
    #[error("Agents have not been fitted")]
    NotFitted,
}
