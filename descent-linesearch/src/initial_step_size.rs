//! Methods to get initial step-size for line-search.

use descent_core::OptimizationState;
use descent_linalg::{Scalar, VectorAlgebra};
use num_traits::{Float, One};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::StepSize;

pub use self::types::IncrRate;

/// Rule for the first trial step-size of each line-search.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum InitialStepSize<A> {
    /// Always start from the same step-size.
    ///
    /// Appropriate for Newton-type directions,
    /// where a unit step is usually accepted.
    Fixed(StepSize<A>),
    /// Increment previous accepted step-size.
    IncrPrev(IncrRate<A>),
    /// Assume the first-order change in value
    /// will match the previous iteration,
    /// `min(1, 1.01 * 2 (f - f_prev) / (g^T p))`.
    Interpolated,
}

impl<A> InitialStepSize<A>
where
    A: Scalar,
{
    /// Return the first trial step-size
    /// for the iteration described by `state`.
    ///
    /// The first iteration
    /// of an incrementing or interpolating rule
    /// starts from `min(1, 1 / ||g||_inf)`.
    pub fn initial_step_size<B>(&self, state: &OptimizationState<B>) -> StepSize<A>
    where
        B: VectorAlgebra<Scalar = A>,
    {
        let candidate = match self {
            Self::Fixed(x) => return *x,
            Self::IncrPrev(incr_rate) => match state.fm1() {
                Some(_) => (*incr_rate * StepSize(*state.step_size())).into_inner(),
                None => first_step_size::<B>(state.g()),
            },
            Self::Interpolated => match state.fm1() {
                Some(fm1) => (A::lit(1.01) * A::lit(2.0) * (*state.f() - fm1)
                    / state.directional_derivative())
                .min(A::one()),
                None => first_step_size::<B>(state.g()),
            },
        };
        StepSize::new(candidate).unwrap_or_default()
    }
}

fn first_step_size<B>(g: &B::Vector) -> B::Scalar
where
    B: VectorAlgebra,
{
    B::norm_inf(g).recip().min(B::Scalar::one())
}

mod types {
    use std::ops::Mul;

    use derive_more::Display;
    use derive_num_bounded::{derive_into_inner, derive_new_from_lower_bounded};
    use descent_linalg::Scalar;
    use num_traits::bounds::LowerBounded;

    use crate::StepSize;

    /// Rate to increase step-size before starting each line-search.
    #[derive(Clone, Copy, Debug, Display, PartialEq, PartialOrd)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct IncrRate<A>(A);

    derive_new_from_lower_bounded!(IncrRate<A: Scalar>);
    derive_into_inner!(IncrRate<A>);

    impl<A> Default for IncrRate<A>
    where
        A: Scalar,
    {
        fn default() -> Self {
            Self(A::lit(2.0))
        }
    }

    impl<A> LowerBounded for IncrRate<A>
    where
        A: Scalar,
    {
        fn min_value() -> Self {
            Self(A::one() + A::epsilon())
        }
    }

    impl<A> Mul<StepSize<A>> for IncrRate<A>
    where
        A: Mul<Output = A>,
    {
        type Output = StepSize<A>;

        fn mul(self, rhs: StepSize<A>) -> Self::Output {
            StepSize(self.0 * rhs.into_inner())
        }
    }
}
