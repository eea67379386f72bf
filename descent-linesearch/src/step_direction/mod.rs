//! Methods to get direction for line-search.
//!
//! Every strategy returns a descent direction,
//! `g^T p < 0`,
//! unless it reports a [`DirectionEvent::NumericalDegeneracy`].
//! Strategy memory is owned by the strategy
//! and cleared by [`StepDirection::reset`].

pub mod bfgs;
pub mod conjugate_gradient;
pub mod lbfgs;
pub mod steepest_descent;
pub mod truncated_newton;

use derive_more::Display;
use descent_core::{EvaluationError, EvaluationMode, FunctionEvaluator, OptimizationState};
use descent_linalg::{Scalar, VectorAlgebra};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{initial_step_size::InitialStepSize, StepSize};

pub use self::{
    bfgs::Bfgs,
    conjugate_gradient::{BetaRule, ConjugateGradient, RestartPeriod, RestartPolicy},
    lbfgs::{Lbfgs, Memory},
    steepest_descent::SteepestDescent,
    truncated_newton::{
        HessianVectorProductPolicy, MaxInnerIterations, NegativeCurvatureThreshold,
        ResidualTolerance, TruncatedNewton, TruncatedNewtonConfig, TruncatedNewtonConfigBuilder,
    },
};

/// A strategy computing the step-direction of each iteration.
pub trait StepDirection<B>
where
    B: VectorAlgebra,
{
    /// Return a direction for the current iterate of `state`.
    ///
    /// Strategies with memory
    /// update it from the previous iterate of `state`,
    /// if any.
    fn compute_direction(
        &mut self,
        state: &OptimizationState<B>,
        evaluator: &mut FunctionEvaluator<'_, B>,
    ) -> Result<ComputedDirection<B>, EvaluationError>;

    /// Forget accumulated memory,
    /// so the next direction is computed
    /// as if from a first iteration.
    fn reset(&mut self);
}

/// A direction and what happened computing it.
#[derive(Clone, Debug)]
pub struct ComputedDirection<B>
where
    B: VectorAlgebra,
{
    /// Step-direction.
    pub direction: B::Vector,
    /// Local recovery made computing `direction`,
    /// if any.
    pub event: Option<DirectionEvent>,
}

impl<B> ComputedDirection<B>
where
    B: VectorAlgebra,
{
    /// Return a direction computed without incident.
    pub fn new(direction: B::Vector) -> Self {
        Self {
            direction,
            event: None,
        }
    }

    /// Return a direction computed after a local recovery.
    pub fn with_event(direction: B::Vector, event: DirectionEvent) -> Self {
        Self {
            direction,
            event: Some(event),
        }
    }
}

/// A local recovery made by a strategy.
///
/// Neither is fatal.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum DirectionEvent {
    /// A near-zero denominator in an update formula,
    /// the update was skipped.
    #[display(fmt = "numerical degeneracy")]
    NumericalDegeneracy,
    /// The inner solve met non-positive curvature
    /// and was truncated.
    #[display(fmt = "negative curvature after {inner_iterations} inner iterations")]
    NegativeCurvatureDetected {
        /// Inner iterations completed before truncation.
        inner_iterations: usize,
    },
    /// Memory was discarded
    /// and the direction restarted from steepest descent.
    #[display(fmt = "restarted")]
    Restarted,
}

/// Which step-direction strategy to use,
/// and its parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DirectionConfig<A> {
    /// See [`SteepestDescent`].
    SteepestDescent,
    /// See [`ConjugateGradient`].
    ConjugateGradient {
        /// Formula for the conjugacy coefficient.
        beta: BetaRule,
        /// When to discard the previous direction.
        restart: RestartPolicy,
    },
    /// See [`Bfgs`].
    Bfgs,
    /// See [`Lbfgs`].
    Lbfgs {
        /// Pairs of steps kept.
        memory: Memory,
    },
    /// See [`TruncatedNewton`].
    TruncatedNewton(TruncatedNewtonConfig<A>),
}

impl<A> Default for DirectionConfig<A> {
    fn default() -> Self {
        Self::Lbfgs {
            memory: Memory::default(),
        }
    }
}

impl<A> DirectionConfig<A>
where
    A: Scalar,
{
    /// Return a fresh strategy
    /// for points of length `len`.
    pub fn build<B>(&self, len: usize) -> DirectionStrategy<B>
    where
        B: VectorAlgebra<Scalar = A>,
    {
        match *self {
            Self::SteepestDescent => DirectionStrategy::SteepestDescent(SteepestDescent),
            Self::ConjugateGradient { beta, restart } => {
                DirectionStrategy::ConjugateGradient(ConjugateGradient::new(beta, restart))
            }
            Self::Bfgs => DirectionStrategy::Bfgs(Bfgs::new(len)),
            Self::Lbfgs { memory } => DirectionStrategy::Lbfgs(Lbfgs::new(memory)),
            Self::TruncatedNewton(config) => {
                DirectionStrategy::TruncatedNewton(TruncatedNewton::new(config))
            }
        }
    }

    /// Return the initial step-size rule
    /// suited to this strategy.
    ///
    /// Newton-type directions are scaled,
    /// so a unit step is tried first.
    /// Steepest descent and conjugate gradient directions are not,
    /// so the step is interpolated from the previous iteration.
    pub fn default_initial_step_size(&self) -> InitialStepSize<A> {
        match self {
            Self::SteepestDescent | Self::ConjugateGradient { .. } => InitialStepSize::Interpolated,
            Self::Bfgs | Self::Lbfgs { .. } | Self::TruncatedNewton(_) => {
                InitialStepSize::Fixed(StepSize::default())
            }
        }
    }

    /// Return an evaluation mode this strategy needs
    /// beyond values and gradients,
    /// if any.
    pub fn required_evaluation_mode(&self) -> Option<EvaluationMode> {
        match self {
            Self::TruncatedNewton(config)
                if *config.hessian_vector_product() == HessianVectorProductPolicy::Provided =>
            {
                Some(EvaluationMode::HessianVectorProduct)
            }
            _ => None,
        }
    }
}

/// A strategy built from a [`DirectionConfig`].
#[derive(Clone, Debug)]
pub enum DirectionStrategy<B>
where
    B: VectorAlgebra,
{
    /// See [`SteepestDescent`].
    SteepestDescent(SteepestDescent),
    /// See [`ConjugateGradient`].
    ConjugateGradient(ConjugateGradient<B>),
    /// See [`Bfgs`].
    Bfgs(Bfgs<B>),
    /// See [`Lbfgs`].
    Lbfgs(Lbfgs<B>),
    /// See [`TruncatedNewton`].
    TruncatedNewton(TruncatedNewton<B>),
}

impl<B> StepDirection<B> for DirectionStrategy<B>
where
    B: VectorAlgebra,
{
    fn compute_direction(
        &mut self,
        state: &OptimizationState<B>,
        evaluator: &mut FunctionEvaluator<'_, B>,
    ) -> Result<ComputedDirection<B>, EvaluationError> {
        match self {
            Self::SteepestDescent(x) => x.compute_direction(state, evaluator),
            Self::ConjugateGradient(x) => x.compute_direction(state, evaluator),
            Self::Bfgs(x) => x.compute_direction(state, evaluator),
            Self::Lbfgs(x) => x.compute_direction(state, evaluator),
            Self::TruncatedNewton(x) => x.compute_direction(state, evaluator),
        }
    }

    fn reset(&mut self) {
        match self {
            Self::SteepestDescent(x) => StepDirection::<B>::reset(x),
            Self::ConjugateGradient(x) => x.reset(),
            Self::Bfgs(x) => x.reset(),
            Self::Lbfgs(x) => x.reset(),
            Self::TruncatedNewton(x) => x.reset(),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use descent_core::{EvaluationPolicy, FnObjective};
    use descent_linalg::Native;

    use super::*;

    pub type B = Native<f64>;

    /// `f(x) = sum_i (i + 1) x_i^2`.
    pub fn skewed_sphere<'f>() -> FnObjective<'f, B> {
        FnObjective::<B>::new()
            .with_value(|x| {
                x.iter()
                    .enumerate()
                    .map(|(i, x)| (i + 1) as f64 * x.powi(2))
                    .sum()
            })
            .with_gradient(|x| {
                x.iter()
                    .enumerate()
                    .map(|(i, x)| 2.0 * (i + 1) as f64 * x)
                    .collect()
            })
            .with_hessian_vector_product(|_, v| {
                v.iter()
                    .enumerate()
                    .map(|(i, v)| 2.0 * (i + 1) as f64 * v)
                    .collect()
            })
    }

    pub fn evaluator<'o>(objective: &'o FnObjective<'_, B>) -> FunctionEvaluator<'o, B> {
        FunctionEvaluator::<B>::new(objective, EvaluationPolicy::Separate).unwrap()
    }

    pub fn state_at(
        evaluator: &mut FunctionEvaluator<'_, B>,
        x: Vec<f64>,
    ) -> OptimizationState<B> {
        let (f, g) = evaluator.compute_value_and_gradient(&x).unwrap();
        OptimizationState::new(x, f, g)
    }

    /// Move `state` by `step_size` along `direction`.
    pub fn step(
        evaluator: &mut FunctionEvaluator<'_, B>,
        state: &mut OptimizationState<B>,
        direction: Vec<f64>,
        step_size: f64,
    ) {
        let x = B::moved(state.x(), step_size, &direction);
        let (f, g) = evaluator.compute_value_and_gradient(&x).unwrap();
        state.set_direction(direction);
        state.set_step_size(step_size);
        state.advance(x, f, g);
    }
}

#[cfg(test)]
mod tests {
    use descent_linalg::Native;
    use static_assertions::assert_obj_safe;

    use super::{testing::*, *};

    assert_obj_safe!(StepDirection<Native<f64>>);

    #[test]
    fn default_should_be_lbfgs_with_memory_four() {
        assert_eq!(
            DirectionConfig::<f64>::default(),
            DirectionConfig::Lbfgs {
                memory: Memory::new(4).unwrap()
            }
        );
    }

    #[test]
    fn newton_type_strategies_should_start_from_unit_step() {
        assert_eq!(
            DirectionConfig::<f64>::Bfgs.default_initial_step_size(),
            InitialStepSize::Fixed(StepSize::default())
        );
        assert_eq!(
            DirectionConfig::<f64>::SteepestDescent.default_initial_step_size(),
            InitialStepSize::Interpolated
        );
    }

    #[test]
    fn only_provided_hessian_vector_products_should_be_required() {
        assert_eq!(DirectionConfig::<f64>::default().required_evaluation_mode(), None);
        assert_eq!(
            DirectionConfig::TruncatedNewton(TruncatedNewtonConfig::<f64>::default())
                .required_evaluation_mode(),
            Some(EvaluationMode::HessianVectorProduct)
        );
        assert_eq!(
            DirectionConfig::TruncatedNewton(
                TruncatedNewtonConfigBuilder::<f64>::default()
                    .hessian_vector_product(HessianVectorProductPolicy::CentralDifference)
                    .build()
            )
            .required_evaluation_mode(),
            None
        );
    }

    #[test]
    fn every_strategy_should_start_with_a_descent_direction() {
        let objective = skewed_sphere();
        let mut evaluator = evaluator(&objective);
        let state = state_at(&mut evaluator, vec![1.0, -2.0, 3.0]);
        for config in [
            DirectionConfig::SteepestDescent,
            DirectionConfig::ConjugateGradient {
                beta: BetaRule::default(),
                restart: RestartPolicy::default(),
            },
            DirectionConfig::Bfgs,
            DirectionConfig::default(),
            DirectionConfig::TruncatedNewton(TruncatedNewtonConfig::default()),
        ] {
            let mut strategy = config.build::<B>(state.len());
            let p = strategy
                .compute_direction(&state, &mut evaluator)
                .unwrap()
                .direction;
            assert!(B::dot(state.g(), &p) < 0.0, "{config:?}");
        }
    }
}
