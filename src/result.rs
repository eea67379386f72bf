use derive_getters::{Dissolve, Getters};
use derive_more::Display;
use descent_linalg::VectorAlgebra;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Why a minimization stopped.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ExitReason {
    /// Stopping criterion was met.
    #[display(fmt = "converged")]
    Converged,
    /// Iteration or evaluation budget ran out.
    #[display(fmt = "maximum iterations reached")]
    MaxIterReached,
    /// Line-search found no acceptable step,
    /// even along steepest descent.
    #[display(fmt = "line-search failed")]
    LineSearchFailed,
}

/// Outcome of a finished minimization.
#[derive(Clone, Debug, Getters, Dissolve)]
#[dissolve(rename = "into_parts")]
pub struct OptimizationResult<B>
where
    B: VectorAlgebra,
{
    /// Value of the final point.
    value: B::Scalar,
    /// Final point.
    point: B::Vector,
    /// Accepted steps.
    iterations: usize,
    /// Objective values computed,
    /// packed calls included.
    value_evaluations: usize,
    /// Gradients computed,
    /// packed calls included.
    gradient_evaluations: usize,
    /// Hessian-vector products computed.
    hessian_vector_product_evaluations: usize,
    /// Why the minimization stopped.
    exit_reason: ExitReason,
}

impl<B> OptimizationResult<B>
where
    B: VectorAlgebra,
{
    pub(crate) fn new(
        value: B::Scalar,
        point: B::Vector,
        iterations: usize,
        counts: descent_core::EvaluationCounts,
        exit_reason: ExitReason,
    ) -> Self {
        Self {
            value,
            point,
            iterations,
            value_evaluations: counts.value,
            gradient_evaluations: counts.gradient,
            hessian_vector_product_evaluations: counts.hessian_vector_product,
            exit_reason,
        }
    }

    /// Return whether the stopping criterion was met.
    pub fn converged(&self) -> bool {
        self.exit_reason == ExitReason::Converged
    }
}
