use descent_core::{ConfigError, EvaluationError};
use descent_linalg::VectorAlgebra;
use thiserror::Error;

/// Error returned when a minimization cannot run to completion.
///
/// Line-search failure is not an error,
/// see [`crate::ExitReason::LineSearchFailed`].
#[derive(Clone, Debug, Error)]
pub enum MinimizeError<B>
where
    B: VectorAlgebra,
{
    /// Minimization was misconfigured,
    /// detected before the first iteration.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Objective failed before any point was evaluated.
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    /// Objective failed while running.
    ///
    /// The last evaluated point is kept,
    /// so work done before the failure is not lost.
    #[error("{source}, after {iterations} iterations")]
    Interrupted {
        /// Failure of the objective.
        source: EvaluationError,
        /// Last point with a known value and gradient.
        point: B::Vector,
        /// Value of `point`.
        value: B::Scalar,
        /// Accepted steps before the failure.
        iterations: usize,
    },
}

impl<B> MinimizeError<B>
where
    B: VectorAlgebra,
{
    /// Return the last point reached
    /// and its value,
    /// if the objective failed mid-run.
    pub fn partial(&self) -> Option<(&B::Vector, B::Scalar)> {
        match self {
            Self::Interrupted { point, value, .. } => Some((point, *value)),
            _ => None,
        }
    }
}
