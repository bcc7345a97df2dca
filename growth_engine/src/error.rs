//! Unified error taxonomy for the engine.
//!
//! Every operation's failure maps to one of these categories so a caller can
//! decide whether to retry ([`EngineError::DependencyUnavailable`]), correct
//! its input ([`EngineError::Validation`]), or give up
//! ([`EngineError::NotFound`], [`EngineError::Conflict`]).

use thiserror::Error;

use crate::models::strategy::StrategyStatus;

/// Result type used throughout the engine for fallible operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// The unified error type for the `growth_engine` crate.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A referenced merchant or strategy does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind ("merchant", "strategy").
        entity: &'static str,
        /// The identifier that failed to resolve.
        id: String,
    },

    /// A required input field was missing or malformed. Detected before any
    /// write.
    #[error("invalid {field}: {reason}")]
    Validation {
        /// The offending field, named so the caller can fix it.
        field: &'static str,
        /// Why the field was rejected.
        reason: String,
    },

    /// A dependency (peer aggregates, campaign gateway) failed or timed out.
    /// The call is retryable; the engine never substitutes a default result.
    #[error("{dependency} unavailable: {reason}")]
    DependencyUnavailable {
        /// Which dependency failed.
        dependency: &'static str,
        /// The underlying failure, verbatim.
        reason: String,
    },

    /// An action was attempted against a strategy whose status forbids it.
    #[error("strategy is {status} and cannot be {action}")]
    Conflict {
        /// Current status of the strategy.
        status: StrategyStatus,
        /// The rejected action, past tense ("implemented", "deployed").
        action: &'static str,
    },

    /// An underlying database operation failed.
    #[error("database error: {0}")]
    Db(#[from] diesel::result::Error),

    /// A stored or computed payload could not be (de)serialized.
    #[error("payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EngineError {
    /// Whether retrying the same call later could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::DependencyUnavailable { .. })
    }

    /// Convenience constructor for a metric field that has never been synced.
    pub(crate) fn missing_metric(field: &'static str) -> Self {
        EngineError::Validation {
            field,
            reason: "metric has never been synced".to_string(),
        }
    }
}
