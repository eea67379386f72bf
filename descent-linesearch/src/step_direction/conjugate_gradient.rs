//! Nonlinear conjugate gradient step-direction.
//!
//! Each direction is steepest descent
//! plus a multiple of the previous direction,
//! `p_k = -g_k + beta_k p_{k - 1}`.

use descent_core::{EvaluationError, FunctionEvaluator, OptimizationState};
use descent_linalg::{Scalar, VectorAlgebra};
use num_traits::{Float, Zero};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{ComputedDirection, DirectionEvent, StepDirection};

pub use self::types::*;

/// Formula for `beta`,
/// the conjugacy coefficient.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BetaRule {
    /// `beta = max(0, g_k^T (g_k - g_{k - 1}) / g_{k - 1}^T g_{k - 1})`.
    #[default]
    PolakRibierePlus,
    /// `beta = g_k^T g_k / g_{k - 1}^T g_{k - 1}`.
    FletcherReeves,
    /// `beta = g_k^T y / p_{k - 1}^T y`,
    /// where `y = g_k - g_{k - 1}`.
    HestenesStiefel,
}

impl BetaRule {
    /// Return `beta`,
    /// or `None` if its denominator is near zero.
    pub fn beta<B>(
        &self,
        derivatives: &B::Vector,
        prev_derivatives: &B::Vector,
        prev_direction: &B::Vector,
    ) -> Option<B::Scalar>
    where
        B: VectorAlgebra,
    {
        let (numerator, denominator) = match self {
            Self::PolakRibierePlus => (
                B::dot(derivatives, &B::difference(derivatives, prev_derivatives)),
                B::dot(prev_derivatives, prev_derivatives),
            ),
            Self::FletcherReeves => (
                B::dot(derivatives, derivatives),
                B::dot(prev_derivatives, prev_derivatives),
            ),
            Self::HestenesStiefel => {
                let y = B::difference(derivatives, prev_derivatives);
                (B::dot(derivatives, &y), B::dot(prev_direction, &y))
            }
        };
        if denominator.abs() <= B::Scalar::min_positive_value() {
            return None;
        }
        let beta = numerator / denominator;
        if !beta.is_finite() {
            None
        } else if *self == Self::PolakRibierePlus {
            Some(beta.max(B::Scalar::zero()))
        } else {
            Some(beta)
        }
    }
}

/// When to discard the previous direction
/// and restart from steepest descent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RestartPolicy {
    /// Never restart.
    NoRestart,
    /// Restart every `period` directions.
    Periodic {
        /// Directions between restarts.
        period: RestartPeriod,
    },
    /// Restart when a direction is not a descent direction.
    #[default]
    LossOfDescent,
    /// Restart when consecutive gradients are far from orthogonal,
    /// `|g_k^T g_{k - 1}| >= 0.2 g_k^T g_k`.
    Powell,
}

/// A component for nonlinear conjugate gradient step-direction.
#[derive(Clone, Debug)]
pub struct ConjugateGradient<B>
where
    B: VectorAlgebra,
{
    beta_rule: BetaRule,
    restart: RestartPolicy,
    prev_direction: Option<B::Vector>,
    since_restart: usize,
}

impl<B> ConjugateGradient<B>
where
    B: VectorAlgebra,
{
    /// Return a new 'ConjugateGradient'.
    pub fn new(beta_rule: BetaRule, restart: RestartPolicy) -> Self {
        Self {
            beta_rule,
            restart,
            prev_direction: None,
            since_restart: 0,
        }
    }

    fn restarts_before_beta(&self, derivatives: &B::Vector, prev_derivatives: &B::Vector) -> bool {
        match self.restart {
            RestartPolicy::Periodic { period } => self.since_restart >= period.into_inner(),
            RestartPolicy::Powell => {
                B::dot(derivatives, prev_derivatives).abs()
                    >= B::Scalar::lit(0.2) * B::dot(derivatives, derivatives)
            }
            RestartPolicy::NoRestart | RestartPolicy::LossOfDescent => false,
        }
    }

    fn accept(&mut self, computed: ComputedDirection<B>, restarted: bool) -> ComputedDirection<B> {
        self.since_restart = if restarted { 1 } else { self.since_restart + 1 };
        self.prev_direction = Some(computed.direction.clone());
        computed
    }
}

impl<B> StepDirection<B> for ConjugateGradient<B>
where
    B: VectorAlgebra,
{
    fn compute_direction(
        &mut self,
        state: &OptimizationState<B>,
        _evaluator: &mut FunctionEvaluator<'_, B>,
    ) -> Result<ComputedDirection<B>, EvaluationError> {
        let g = state.g();
        let steepest = B::negated(g);
        let (Some(prev_derivatives), Some(prev_direction)) = (state.gm1(), &self.prev_direction)
        else {
            return Ok(self.accept(ComputedDirection::new(steepest), true));
        };

        if self.restarts_before_beta(g, prev_derivatives) {
            return Ok(self.accept(
                ComputedDirection::with_event(steepest, DirectionEvent::Restarted),
                true,
            ));
        }

        let Some(beta) = self.beta_rule.beta::<B>(g, prev_derivatives, prev_direction) else {
            return Ok(self.accept(
                ComputedDirection::with_event(steepest, DirectionEvent::NumericalDegeneracy),
                true,
            ));
        };

        let direction = B::moved(&steepest, beta, prev_direction);
        if self.restart == RestartPolicy::LossOfDescent
            && B::dot(g, &direction) >= B::Scalar::zero()
        {
            Ok(self.accept(
                ComputedDirection::with_event(steepest, DirectionEvent::Restarted),
                true,
            ))
        } else {
            Ok(self.accept(ComputedDirection::new(direction), beta.is_zero()))
        }
    }

    fn reset(&mut self) {
        self.prev_direction = None;
        self.since_restart = 0;
    }
}

mod types {
    use derive_more::Display;
    use derive_num_bounded::{
        derive_into_inner, derive_new_from_lower_bounded, derive_try_from_inner,
    };
    use num_traits::bounds::LowerBounded;

    #[cfg(feature = "serde")]
    use serde::{Deserialize, Serialize};

    /// Number of directions between restarts,
    /// at least one.
    #[derive(Clone, Copy, Debug, Display, PartialEq, Eq, PartialOrd, Ord)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct RestartPeriod(usize);

    derive_new_from_lower_bounded!(RestartPeriod(usize));
    derive_try_from_inner!(RestartPeriod(usize));
    derive_into_inner!(RestartPeriod(usize));

    impl LowerBounded for RestartPeriod {
        fn min_value() -> Self {
            Self(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{super::testing::*, *};

    fn run(
        beta_rule: BetaRule,
        restart: RestartPolicy,
        iterations: usize,
    ) -> Vec<ComputedDirection<B>> {
        let objective = skewed_sphere();
        let mut evaluator = evaluator(&objective);
        let mut state = state_at(&mut evaluator, vec![1.0, 2.0, 3.0]);
        let mut cg = ConjugateGradient::<B>::new(beta_rule, restart);
        let mut directions = Vec::new();
        for _ in 0..iterations {
            let computed = cg.compute_direction(&state, &mut evaluator).unwrap();
            step(&mut evaluator, &mut state, computed.direction.clone(), 0.05);
            directions.push(computed);
        }
        directions
    }

    #[test]
    fn polak_ribiere_plus_should_clamp_negative_beta() {
        // g^T (g - gm1) = 1 * (1 - 3) < 0
        let g = vec![1.0, 0.0];
        let gm1 = vec![3.0, 0.0];
        let prev_direction = vec![-3.0, 0.0];
        assert_eq!(
            BetaRule::PolakRibierePlus.beta::<B>(&g, &gm1, &prev_direction),
            Some(0.0)
        );

        let objective = skewed_sphere();
        let mut evaluator = evaluator(&objective);
        let mut state = state_at(&mut evaluator, vec![1.5, 0.0, 0.0]);
        let mut cg = ConjugateGradient::<B>::new(BetaRule::PolakRibierePlus, RestartPolicy::NoRestart);
        let first = cg.compute_direction(&state, &mut evaluator).unwrap();
        // From 1.5 to 0.5, so the gradient shrinks from 3 to 1.
        step(&mut evaluator, &mut state, first.direction, 1.0 / 3.0);
        let computed = cg.compute_direction(&state, &mut evaluator).unwrap();
        assert_eq!(computed.direction, B::negated(state.g()));
        assert_eq!(computed.event, None);
    }

    #[test]
    fn first_direction_should_be_steepest_descent() {
        for beta_rule in [
            BetaRule::PolakRibierePlus,
            BetaRule::FletcherReeves,
            BetaRule::HestenesStiefel,
        ] {
            let directions = run(beta_rule, RestartPolicy::NoRestart, 1);
            assert_eq!(directions[0].direction, vec![-2.0, -8.0, -18.0]);
        }
    }

    #[test]
    fn conjugate_directions_should_differ_from_steepest_descent() {
        let objective = skewed_sphere();
        let mut evaluator = evaluator(&objective);
        let mut state = state_at(&mut evaluator, vec![1.0, 2.0, 3.0]);
        let mut cg =
            ConjugateGradient::<B>::new(BetaRule::FletcherReeves, RestartPolicy::NoRestart);
        let first = cg.compute_direction(&state, &mut evaluator).unwrap();
        step(&mut evaluator, &mut state, first.direction.clone(), 0.05);
        let second = cg.compute_direction(&state, &mut evaluator).unwrap();

        let beta = B::dot(state.g(), state.g()) / B::dot(state.gm1().unwrap(), state.gm1().unwrap());
        assert_eq!(
            second.direction,
            B::moved(&B::negated(state.g()), beta, &first.direction)
        );
    }

    #[test]
    fn periodic_restart_should_return_steepest_descent_every_period() {
        let directions = run(
            BetaRule::FletcherReeves,
            RestartPolicy::Periodic {
                period: RestartPeriod::new(2).unwrap(),
            },
            5,
        );
        let events = directions.iter().map(|x| x.event).collect::<Vec<_>>();
        assert_eq!(
            events,
            vec![
                None,
                None,
                Some(DirectionEvent::Restarted),
                None,
                Some(DirectionEvent::Restarted)
            ]
        );
    }

    #[test]
    fn powell_restart_should_trigger_on_non_orthogonal_gradients() {
        // Tiny steps keep consecutive gradients nearly parallel.
        let objective = skewed_sphere();
        let mut evaluator = evaluator(&objective);
        let mut state = state_at(&mut evaluator, vec![1.0, 2.0, 3.0]);
        let mut cg = ConjugateGradient::<B>::new(BetaRule::PolakRibierePlus, RestartPolicy::Powell);
        let first = cg.compute_direction(&state, &mut evaluator).unwrap();
        step(&mut evaluator, &mut state, first.direction, 1e-3);
        let computed = cg.compute_direction(&state, &mut evaluator).unwrap();
        assert_eq!(computed.event, Some(DirectionEvent::Restarted));
        assert_eq!(computed.direction, B::negated(state.g()));
    }

    #[test]
    fn loss_of_descent_should_restart() {
        let objective = skewed_sphere();
        let mut evaluator = evaluator(&objective);
        let mut state = state_at(&mut evaluator, vec![1.0, 0.0, 0.0]);
        let mut cg =
            ConjugateGradient::<B>::new(BetaRule::FletcherReeves, RestartPolicy::LossOfDescent);
        cg.compute_direction(&state, &mut evaluator).unwrap();
        // Overshoot from 1 to -2,
        // so `-g + beta p = 4 + 4 * -2` points uphill.
        step(&mut evaluator, &mut state, vec![-2.0, 0.0, 0.0], 1.5);
        let computed = cg.compute_direction(&state, &mut evaluator).unwrap();
        assert_eq!(computed.event, Some(DirectionEvent::Restarted));
        assert_eq!(computed.direction, B::negated(state.g()));
    }

    #[test]
    fn zero_denominator_should_be_degenerate() {
        assert_eq!(
            BetaRule::FletcherReeves.beta::<B>(&vec![1.0], &vec![0.0], &vec![0.0]),
            None
        );
        assert_eq!(
            BetaRule::HestenesStiefel.beta::<B>(&vec![1.0], &vec![1.0], &vec![-1.0]),
            None
        );
    }

    #[test]
    fn restart_period_should_be_positive() {
        assert!(RestartPeriod::new(0).is_err());
        assert_eq!(RestartPeriod::try_from(3).map(RestartPeriod::into_inner), Ok(3));
    }
}
