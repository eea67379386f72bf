use thiserror::Error;

use crate::EvaluationMode;

/// Error returned when evaluating an objective fails.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum EvaluationError {
    /// Objective was asked for a mode it does not support.
    #[error("objective does not support `{0}`")]
    Unsupported(EvaluationMode),
    /// Objective returned a vector of the wrong length.
    #[error("`{mode}` returned {found} elements, expected {expected}")]
    DimensionMismatch {
        /// Mode that returned the vector.
        mode: EvaluationMode,
        /// Length of the point.
        expected: usize,
        /// Length of the returned vector.
        found: usize,
    },
    /// Objective reported its own failure.
    #[error("objective failed: {0}")]
    Objective(String),
}

/// Error returned when a minimization is misconfigured.
///
/// Configuration errors are detected before the first iteration.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigError {
    /// Objective lacks a mode required by the configuration.
    #[error("objective does not support `{mode}`, implement `Objective::{mode}` or {suggestion}")]
    UnsupportedEvaluationMode {
        /// Missing mode.
        mode: EvaluationMode,
        /// How the configuration could avoid the missing mode.
        suggestion: &'static str,
    },
    /// Starting point has no elements.
    #[error("starting point is empty")]
    EmptyPoint,
    /// Vectors of a minimization disagree in length.
    #[error("expected {expected} elements, found {found}")]
    DimensionMismatch {
        /// Length of the starting point.
        expected: usize,
        /// Length of the offending vector.
        found: usize,
    },
}
