#![warn(missing_debug_implementations)]
#![warn(missing_docs)]

//! Unconstrained minimization of smooth functions
//! by line-search descent methods.
//!
//! Each iteration picks a step-direction,
//! steepest descent,
//! nonlinear conjugate gradient,
//! BFGS,
//! L-BFGS,
//! or truncated Newton,
//! then a step-size along it
//! satisfying the strong Wolfe conditions.
//!
//! Objectives declare which evaluations they support
//! through [`Capabilities`],
//! and vectors are handled through a [`VectorAlgebra`] backend,
//! [`Native`] or [`Ndarray`].
//!
//! # Examples
//!
//! Minimize the Rosenbrock function with L-BFGS:
//!
//! ```
//! use descent::prelude::*;
//!
//! type B = Native<f64>;
//!
//! let objective = FnObjective::<B>::new().with_value_and_gradient(|x| {
//!     let (a, b) = (x[0], x[1]);
//!     (
//!         (1.0 - a).powi(2) + 100.0 * (b - a.powi(2)).powi(2),
//!         vec![
//!             -2.0 * (1.0 - a) - 400.0 * a * (b - a.powi(2)),
//!             200.0 * (b - a.powi(2)),
//!         ],
//!     )
//! });
//!
//! let config = MinimizerConfigBuilder::default()
//!     .direction(DirectionConfig::Lbfgs {
//!         memory: Memory::new(8).unwrap(),
//!     })
//!     .build();
//! let result = Minimizer::<B>::new(config)
//!     .minimize(&objective, vec![-1.2, 1.0])
//!     .unwrap();
//! assert_eq!(*result.exit_reason(), ExitReason::Converged);
//! assert!((result.point()[0] - 1.0).abs() < 1e-4);
//! ```
//!
//! Step through a minimization:
//!
//! ```
//! use descent::prelude::*;
//!
//! type B = Native<f64>;
//!
//! let objective = FnObjective::<B>::new()
//!     .with_value(|x| x.iter().map(|x| x.powi(2)).sum())
//!     .with_gradient(|x| x.iter().map(|x| 2.0 * x).collect());
//!
//! let mut minimization = Minimizer::<B>::default()
//!     .start(&objective, vec![3.0, -4.0])
//!     .unwrap();
//! while let Some(m) = minimization.next() {
//!     println!("{:?} {}", m.status(), m.best_point_value());
//! }
//! assert!(minimization.into_result().unwrap().converged());
//! ```

mod check_gradient;
mod config;
mod error;
mod minimizer;
pub mod prelude;
mod result;
pub mod stopping;

use std::ops::RangeInclusive;

use rand::{
    distributions::uniform::{SampleUniform, Uniform},
    prelude::*,
};

pub use descent_core::{
    Capabilities, ConfigError, EvaluationCounts, EvaluationError, EvaluationMode,
    EvaluationPolicy, FnObjective, FunctionEvaluator, Objective, OptimizationState, Optimizer,
};
pub use descent_linalg::{DenseMatrix, Native, Ndarray, Scalar, VectorAlgebra};
pub use descent_linesearch::{
    initial_step_size::{IncrRate, InitialStepSize},
    is_near_minima,
    step_direction::{
        BetaRule, DirectionConfig, DirectionEvent, HessianVectorProductPolicy, Memory,
        RestartPeriod, RestartPolicy, TruncatedNewtonConfig, TruncatedNewtonConfigBuilder,
    },
    strong_wolfe::{
        CurvatureParameter, ExpansionRate, InvalidStrongWolfeError, StrongWolfe,
        StrongWolfeBuilder, SufficientDecreaseParameter,
    },
    StepSize,
};

pub use self::{
    check_gradient::check_gradient,
    config::{MinimizerConfig, MinimizerConfigBuilder, Verbosity},
    error::MinimizeError,
    minimizer::{Minimization, Minimizer, Status},
    result::{ExitReason, OptimizationResult},
    stopping::{AnyOf, Coordinates, GradientNorm, NearMinima, StoppingCriterion, Tolerance},
};

/// Minimize `objective` from `x0`
/// with default configuration.
pub fn minimize<B>(
    objective: &dyn Objective<B>,
    x0: B::Vector,
) -> Result<OptimizationResult<B>, MinimizeError<B>>
where
    B: VectorAlgebra,
{
    Minimizer::default().minimize(objective, x0)
}

/// Return a point sampled uniformly within `bounds`,
/// one range per element.
pub fn random_point<B>(bounds: impl IntoIterator<Item = RangeInclusive<B::Scalar>>) -> B::Vector
where
    B: VectorAlgebra,
    B::Scalar: SampleUniform,
{
    random_point_using::<B, _>(bounds, &mut SmallRng::from_entropy())
}

/// Return a point sampled uniformly within `bounds`,
/// one range per element,
/// using `rng`.
///
/// # Examples
///
/// ```
/// use descent::{random_point_using, Native};
/// use rand::prelude::*;
///
/// let x = random_point_using::<Native<f64>, _>(
///     std::iter::repeat(-10.0..=10.0).take(3),
///     &mut SmallRng::seed_from_u64(0),
/// );
/// assert_eq!(x.len(), 3);
/// assert!(x.iter().all(|x| (-10.0..=10.0).contains(x)));
/// ```
pub fn random_point_using<B, R>(
    bounds: impl IntoIterator<Item = RangeInclusive<B::Scalar>>,
    rng: &mut R,
) -> B::Vector
where
    B: VectorAlgebra,
    B::Scalar: SampleUniform,
    R: Rng,
{
    B::from_vec(
        bounds
            .into_iter()
            .map(|range| {
                let (start, end) = range.into_inner();
                Uniform::new_inclusive(start, end).sample(rng)
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use test_strategy::proptest;

    use super::*;

    #[proptest]
    fn random_point_using_should_respect_bounds(
        #[strategy(proptest::collection::vec((-100.0..100.0, 0.0..100.0), 1..10))] bounds: Vec<(
            f64,
            f64,
        )>,
        seed: u64,
    ) {
        let ranges = bounds
            .iter()
            .map(|(start, width)| *start..=start + width)
            .collect::<Vec<_>>();
        let x =
            random_point_using::<Native<f64>, _>(ranges.clone(), &mut SmallRng::seed_from_u64(seed));
        prop_assert_eq!(x.len(), ranges.len());
        for (x, range) in x.iter().zip(ranges) {
            prop_assert!(range.contains(x));
        }
    }

    #[test]
    fn random_point_using_should_be_reproducible() {
        let bounds = || std::iter::repeat(-5.0..=5.0).take(4);
        assert_eq!(
            random_point_using::<Native<f64>, _>(bounds(), &mut SmallRng::seed_from_u64(1)),
            random_point_using::<Native<f64>, _>(bounds(), &mut SmallRng::seed_from_u64(1))
        );
    }
}
