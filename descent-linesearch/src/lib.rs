#![warn(missing_debug_implementations)]
#![warn(missing_docs)]

//! Line-search components for descent optimizers.
//!
//! A line-search iteration has two parts:
//! a step-direction,
//! see [`step_direction`],
//! and a step-size along that direction,
//! see [`strong_wolfe`]
//! and [`initial_step_size`].
//!
//! # Examples
//!
//! ```
//! use descent_core::prelude::*;
//! use descent_linalg::{Native, VectorAlgebra};
//! use descent_linesearch::{
//!     step_direction::{DirectionConfig, StepDirection},
//!     strong_wolfe::StrongWolfe,
//!     StepSize,
//! };
//!
//! type B = Native<f64>;
//!
//! let objective = FnObjective::<B>::new()
//!     .with_value(|x| x.iter().map(|x| x.powi(2)).sum())
//!     .with_gradient(|x| x.iter().map(|x| 2.0 * x).collect());
//! let mut evaluator = FunctionEvaluator::<B>::new(&objective, EvaluationPolicy::Separate).unwrap();
//!
//! let x = vec![1.0, 2.0];
//! let (f, g) = evaluator.compute_value_and_gradient(&x).unwrap();
//! let mut state = OptimizationState::<B>::new(x, f, g);
//!
//! let mut direction = DirectionConfig::default().build::<B>(state.len());
//! let p = direction.compute_direction(&state, &mut evaluator).unwrap().direction;
//! state.set_direction(p);
//!
//! let result = StrongWolfe::default()
//!     .search(&mut evaluator, &state, StepSize::new(1.0).unwrap())
//!     .unwrap();
//! assert!(*result.accepted());
//! assert!(*result.value() < *state.f());
//! ```

pub mod initial_step_size;
pub mod step_direction;
pub mod strong_wolfe;

use descent_linalg::{Scalar, VectorAlgebra};
use num_traits::{Float, One};

pub use self::types::*;

/// Return whether a point is sufficiently close to a minima.
///
/// Also known as the derivative-norm stopping-criteria.
/// This is mathematically defined as,
/// `||\vec{dx}||_inf < 10^-5 (1 + |fx|)`,
/// where `fx` is the value of a point
/// and `\vec{dx}` is the derivative of the same point.
///
/// Returns true for empty derivatives.
pub fn is_near_minima<B>(value: B::Scalar, derivatives: &B::Vector) -> bool
where
    B: VectorAlgebra,
{
    const COEFF: f64 = 0.00001; // 10^-5
    B::norm_inf(derivatives) < B::Scalar::lit(COEFF) * (B::Scalar::one() + value.abs())
}

mod types {
    use std::ops::Mul;

    use derive_more::Display;
    use derive_num_bounded::{derive_into_inner, derive_new_from_lower_bounded};
    use descent_linalg::Scalar;
    use num_traits::bounds::LowerBounded;

    /// Multiplier for each component of a step-direction
    /// in derivative optimization.
    #[derive(Clone, Copy, Debug, Display, PartialEq, PartialOrd)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct StepSize<A>(pub(crate) A);

    derive_new_from_lower_bounded!(StepSize<A: Scalar>);
    derive_into_inner!(StepSize<A>);

    impl<A> Default for StepSize<A>
    where
        A: Scalar,
    {
        fn default() -> Self {
            Self(A::one())
        }
    }

    impl<A> LowerBounded for StepSize<A>
    where
        A: Scalar,
    {
        fn min_value() -> Self {
            Self(A::zero() + A::epsilon())
        }
    }

    impl<A> Mul<A> for StepSize<A>
    where
        A: Mul<Output = A>,
    {
        type Output = A;

        fn mul(self, rhs: A) -> Self::Output {
            self.0 * rhs
        }
    }
}

#[cfg(test)]
mod tests {
    use descent_linalg::Native;

    use super::*;

    #[test]
    fn is_near_minima_should_scale_with_value() {
        assert!(is_near_minima::<Native<f64>>(0.0, &vec![1e-6, -1e-6]));
        assert!(!is_near_minima::<Native<f64>>(0.0, &vec![1e-4]));
        assert!(is_near_minima::<Native<f64>>(100.0, &vec![1e-4]));
        assert!(is_near_minima::<Native<f64>>(1.0, &vec![]));
    }

    #[test]
    fn step_size_should_reject_non_positive_values() {
        assert!(StepSize::new(0.0).is_err());
        assert!(StepSize::new(-1.0).is_err());
        assert!(StepSize::new(f64::NAN).is_err());
        assert_eq!(StepSize::new(0.5).map(StepSize::into_inner), Ok(0.5));
    }
}
