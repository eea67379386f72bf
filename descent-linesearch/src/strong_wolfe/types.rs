//! Types for strong Wolfe line-search.

use std::ops::Mul;

use derive_more::Display;
use derive_num_bounded::{derive_into_inner, derive_new_from_bounded, derive_new_from_lower_bounded};
use descent_linalg::Scalar;
use num_traits::bounds::{LowerBounded, UpperBounded};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::StepSize;

/// The sufficient decrease parameter,
/// `c_1`.
#[derive(Clone, Copy, Debug, Display, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct SufficientDecreaseParameter<A>(A);

derive_new_from_bounded!(SufficientDecreaseParameter<A: Scalar>);
derive_into_inner!(SufficientDecreaseParameter<A>);

impl<A> Default for SufficientDecreaseParameter<A>
where
    A: Scalar,
{
    fn default() -> Self {
        Self(A::lit(1e-4))
    }
}

impl<A> LowerBounded for SufficientDecreaseParameter<A>
where
    A: Scalar,
{
    fn min_value() -> Self {
        Self(A::epsilon())
    }
}

impl<A> UpperBounded for SufficientDecreaseParameter<A>
where
    A: Scalar,
{
    fn max_value() -> Self {
        Self(A::one() - A::epsilon())
    }
}

impl<A> Mul<A> for SufficientDecreaseParameter<A>
where
    A: Mul<Output = A>,
{
    type Output = A;

    fn mul(self, rhs: A) -> Self::Output {
        self.0 * rhs
    }
}

/// The curvature parameter,
/// `c_2`.
///
/// Must be greater than [`SufficientDecreaseParameter`].
/// Small values demand a more exact line-search.
#[derive(Clone, Copy, Debug, Display, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct CurvatureParameter<A>(A);

derive_new_from_bounded!(CurvatureParameter<A: Scalar>);
derive_into_inner!(CurvatureParameter<A>);

impl<A> Default for CurvatureParameter<A>
where
    A: Scalar,
{
    fn default() -> Self {
        Self(A::lit(0.9))
    }
}

impl<A> LowerBounded for CurvatureParameter<A>
where
    A: Scalar,
{
    fn min_value() -> Self {
        Self(A::epsilon())
    }
}

impl<A> UpperBounded for CurvatureParameter<A>
where
    A: Scalar,
{
    fn max_value() -> Self {
        Self(A::one() - A::epsilon())
    }
}

impl<A> Mul<A> for CurvatureParameter<A>
where
    A: Mul<Output = A>,
{
    type Output = A;

    fn mul(self, rhs: A) -> Self::Output {
        self.0 * rhs
    }
}

/// Rate to increase step-size
/// while bracketing an acceptable step.
#[derive(Clone, Copy, Debug, Display, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ExpansionRate<A>(A);

derive_new_from_lower_bounded!(ExpansionRate<A: Scalar>);
derive_into_inner!(ExpansionRate<A>);

impl<A> Default for ExpansionRate<A>
where
    A: Scalar,
{
    fn default() -> Self {
        Self(A::lit(2.0))
    }
}

impl<A> LowerBounded for ExpansionRate<A>
where
    A: Scalar,
{
    fn min_value() -> Self {
        Self(A::one() + A::epsilon())
    }
}

impl<A> Mul<StepSize<A>> for ExpansionRate<A>
where
    A: Mul<Output = A>,
{
    type Output = StepSize<A>;

    fn mul(self, rhs: StepSize<A>) -> Self::Output {
        StepSize(self.0 * rhs.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_should_be_valid() {
        assert_eq!(
            SufficientDecreaseParameter::new(SufficientDecreaseParameter::<f64>::default().into_inner()),
            Ok(SufficientDecreaseParameter::default())
        );
        assert_eq!(
            CurvatureParameter::new(CurvatureParameter::<f64>::default().into_inner()),
            Ok(CurvatureParameter::default())
        );
        assert_eq!(
            ExpansionRate::new(ExpansionRate::<f64>::default().into_inner()),
            Ok(ExpansionRate::default())
        );
    }

    #[test]
    fn parameters_should_reject_values_outside_unit_interval() {
        assert_eq!(
            SufficientDecreaseParameter::new(1.0),
            Err(InvalidSufficientDecreaseParameterError::TooHigh(1.0))
        );
        assert_eq!(
            CurvatureParameter::new(0.0),
            Err(InvalidCurvatureParameterError::TooLow(0.0))
        );
        assert_eq!(
            ExpansionRate::new(1.0),
            Err(InvalidExpansionRateError::TooLow(1.0))
        );
    }
}
