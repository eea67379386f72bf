//! Criteria for stopping a minimization early.
//!
//! Budgets on iterations and evaluations
//! are enforced by the minimizer,
//! not by criteria.

use std::fmt;

use descent_core::OptimizationState;
use descent_linalg::{Scalar, VectorAlgebra};
use descent_linesearch::is_near_minima;
use num_traits::Float;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use self::types::Tolerance;

/// A test of whether a minimization has converged.
///
/// Criteria are checked after every accepted step,
/// and once for the starting point.
/// Any `FnMut(&OptimizationState<B>) -> bool` is a criterion.
pub trait StoppingCriterion<B>
where
    B: VectorAlgebra,
{
    /// Return whether `state` is converged.
    fn is_done(&mut self, state: &OptimizationState<B>) -> bool;
}

impl<B, F> StoppingCriterion<B> for F
where
    B: VectorAlgebra,
    F: FnMut(&OptimizationState<B>) -> bool,
{
    fn is_done(&mut self, state: &OptimizationState<B>) -> bool {
        self(state)
    }
}

/// Converged when `||g|| <= tolerance`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GradientNorm<A> {
    /// Largest gradient norm considered converged.
    pub tolerance: Tolerance<A>,
}

impl<A> GradientNorm<A> {
    /// Return a new 'GradientNorm'.
    pub fn new(tolerance: Tolerance<A>) -> Self {
        Self { tolerance }
    }
}

impl<A> Default for GradientNorm<A>
where
    A: Scalar,
{
    fn default() -> Self {
        Self::new(Tolerance::default())
    }
}

impl<B> StoppingCriterion<B> for GradientNorm<B::Scalar>
where
    B: VectorAlgebra,
{
    fn is_done(&mut self, state: &OptimizationState<B>) -> bool {
        B::norm(state.g()) <= self.tolerance.into_inner()
    }
}

/// Converged when `||g||_inf < 10^-5 (1 + |f|)`,
/// see [`is_near_minima`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NearMinima;

impl<B> StoppingCriterion<B> for NearMinima
where
    B: VectorAlgebra,
{
    fn is_done(&mut self, state: &OptimizationState<B>) -> bool {
        is_near_minima::<B>(*state.f(), state.g())
    }
}

/// Converged when chosen coordinates of the point
/// are each within `tolerance` of a target.
///
/// Useful when only part of a solution matters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Coordinates<A> {
    /// Index of each watched coordinate
    /// and its target.
    pub targets: Vec<(usize, A)>,
    /// Largest distance to a target considered converged.
    pub tolerance: Tolerance<A>,
}

impl<A> Coordinates<A> {
    /// Return a new 'Coordinates'.
    pub fn new(targets: impl IntoIterator<Item = (usize, A)>, tolerance: Tolerance<A>) -> Self {
        Self {
            targets: targets.into_iter().collect(),
            tolerance,
        }
    }
}

impl<B> StoppingCriterion<B> for Coordinates<B::Scalar>
where
    B: VectorAlgebra,
{
    fn is_done(&mut self, state: &OptimizationState<B>) -> bool {
        let x = state.x();
        self.targets.iter().all(|(i, target)| {
            *i < B::len(x) && (B::get(x, *i) - *target).abs() < self.tolerance.into_inner()
        })
    }
}

/// Converged when any inner criterion is.
///
/// Every inner criterion is checked,
/// so stateful criteria see every iteration.
pub struct AnyOf<'c, B>(Vec<Box<dyn StoppingCriterion<B> + 'c>>);

impl<'c, B> AnyOf<'c, B>
where
    B: VectorAlgebra,
{
    /// Return a criterion with no inner criteria,
    /// never converged.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Add an inner criterion.
    pub fn or(mut self, criterion: impl StoppingCriterion<B> + 'c) -> Self {
        self.0.push(Box::new(criterion));
        self
    }
}

impl<B> Default for AnyOf<'_, B>
where
    B: VectorAlgebra,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<B> fmt::Debug for AnyOf<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AnyOf").field(&self.0.len()).finish()
    }
}

impl<B> StoppingCriterion<B> for AnyOf<'_, B>
where
    B: VectorAlgebra,
{
    fn is_done(&mut self, state: &OptimizationState<B>) -> bool {
        self.0
            .iter_mut()
            .fold(false, |done, criterion| criterion.is_done(state) || done)
    }
}

mod types {
    use derive_more::Display;
    use derive_num_bounded::{derive_into_inner, derive_new_from_lower_bounded};
    use descent_linalg::Scalar;
    use num_traits::bounds::LowerBounded;

    /// Non-negative distance considered converged.
    #[derive(Clone, Copy, Debug, Display, PartialEq, PartialOrd)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct Tolerance<A>(A);

    derive_new_from_lower_bounded!(Tolerance<A: Scalar>);
    derive_into_inner!(Tolerance<A>);

    impl<A> Default for Tolerance<A>
    where
        A: Scalar,
    {
        fn default() -> Self {
            Self(A::lit(1e-6))
        }
    }

    impl<A> LowerBounded for Tolerance<A>
    where
        A: Scalar,
    {
        fn min_value() -> Self {
            Self(A::zero())
        }
    }
}
