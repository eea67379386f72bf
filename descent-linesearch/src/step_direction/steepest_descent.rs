//! Step-direction along the gradient of steepest descent.

use descent_core::{EvaluationError, FunctionEvaluator, OptimizationState};
use descent_linalg::VectorAlgebra;

use super::{ComputedDirection, StepDirection};

/// A component for step-direction
/// along the gradient of steepest descent,
/// `p = -g`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SteepestDescent;

impl<B> StepDirection<B> for SteepestDescent
where
    B: VectorAlgebra,
{
    fn compute_direction(
        &mut self,
        state: &OptimizationState<B>,
        _evaluator: &mut FunctionEvaluator<'_, B>,
    ) -> Result<ComputedDirection<B>, EvaluationError> {
        Ok(ComputedDirection::new(steepest_descent::<B>(state.g())))
    }

    fn reset(&mut self) {}
}

/// Return the direction of steepest descent.
pub fn steepest_descent<B>(derivatives: &B::Vector) -> B::Vector
where
    B: VectorAlgebra,
{
    B::negated(derivatives)
}

#[cfg(test)]
mod tests {
    use super::{super::testing::*, *};

    #[test]
    fn steepest_descent_should_be_negative_gradient() {
        let objective = skewed_sphere();
        let mut evaluator = evaluator(&objective);
        let mut state = state_at(&mut evaluator, vec![1.0, -2.0, 0.5]);
        step(&mut evaluator, &mut state, vec![-1.0, 2.0, -0.5], 0.1);

        let computed = SteepestDescent
            .compute_direction(&state, &mut evaluator)
            .unwrap();
        assert_eq!(
            computed.direction,
            state.g().iter().map(|x| -x).collect::<Vec<_>>()
        );
        assert_eq!(computed.event, None);
    }
}
