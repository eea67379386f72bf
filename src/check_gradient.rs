use descent_core::{EvaluationPolicy, FunctionEvaluator, Objective};
use descent_linalg::{Scalar, VectorAlgebra};
use num_traits::{Float, One, Zero};

use crate::MinimizeError;

/// Return the largest error
/// between the gradient of `objective` at `x`
/// and its central-difference estimate with step `step`.
///
/// Errors are relative
/// where either derivative exceeds one in magnitude,
/// and absolute otherwise.
/// A correct gradient typically returns less than `1e-6`
/// for a step near `1e-6`.
///
/// # Examples
///
/// ```
/// use descent::{check_gradient, prelude::*};
///
/// type B = Native<f64>;
///
/// let objective = FnObjective::<B>::new()
///     .with_value(|x| x.iter().map(|x| x.powi(3)).sum())
///     .with_gradient(|x| x.iter().map(|x| 3.0 * x.powi(2)).collect());
/// let error = check_gradient::<B>(&objective, &vec![1.0, -2.0, 0.5], 1e-6).unwrap();
/// assert!(error < 1e-6);
/// ```
pub fn check_gradient<B>(
    objective: &dyn Objective<B>,
    x: &B::Vector,
    step: B::Scalar,
) -> Result<B::Scalar, MinimizeError<B>>
where
    B: VectorAlgebra,
{
    let mut evaluator =
        FunctionEvaluator::new(objective, EvaluationPolicy::preferred_for(objective.capabilities()))?;
    let (_, gradient) = evaluator.compute_value_and_gradient(x)?;

    let two = B::Scalar::lit(2.0);
    let mut point = x.clone();
    let mut max_error = B::Scalar::zero();
    for i in 0..B::len(x) {
        let xi = B::get(x, i);
        B::set(&mut point, i, xi + step);
        let right = evaluator.compute_value(&point)?;
        B::set(&mut point, i, xi - step);
        let left = evaluator.compute_value(&point)?;
        B::set(&mut point, i, xi);

        let numerical = (right - left) / (two * step);
        let analytical = B::get(&gradient, i);
        let scale = numerical.abs().max(analytical.abs());
        let error = if scale > B::Scalar::one() {
            (numerical - analytical).abs() / scale
        } else {
            (numerical - analytical).abs()
        };
        max_error = max_error.max(error);
    }
    Ok(max_error)
}
