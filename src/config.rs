use derive_builder::Builder;
use derive_getters::Getters;
use descent_core::{Capabilities, EvaluationPolicy};
use descent_linalg::Scalar;
use descent_linesearch::{
    initial_step_size::InitialStepSize, step_direction::DirectionConfig, strong_wolfe::StrongWolfe,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Tolerance;

/// Minimization configuration,
/// independent of problem.
#[derive(Clone, Debug, PartialEq, Builder, Getters)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[builder(build_fn(skip))]
pub struct MinimizerConfig<A> {
    /// Accepted steps before stopping.
    #[builder(default = "1000")]
    max_iterations: usize,
    /// Objective values computed before stopping,
    /// unbounded if `None`.
    #[builder(default, setter(strip_option))]
    max_evaluations: Option<usize>,
    /// Step-direction strategy.
    #[builder(default)]
    direction: DirectionConfig<A>,
    /// Step-size search along each direction.
    #[builder(default)]
    line_search: StrongWolfe<A>,
    /// First step-size tried by each line-search,
    /// chosen from `direction` if `None`,
    /// see [`DirectionConfig::default_initial_step_size`].
    #[builder(default, setter(strip_option))]
    initial_step_size: Option<InitialStepSize<A>>,
    /// How values and gradients are requested,
    /// chosen from the objective if `None`,
    /// see [`EvaluationPolicy::preferred_for`].
    #[builder(default, setter(strip_option))]
    evaluation_policy: Option<EvaluationPolicy>,
    /// What to log.
    #[builder(default)]
    verbosity: Verbosity,
    /// Gradient norm considered converged
    /// when no custom stopping criterion is given.
    #[builder(default)]
    tolerance: Tolerance<A>,
}

/// How much a minimization logs,
/// through `tracing`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Verbosity {
    /// Only warnings.
    #[default]
    Silent,
    /// One line when finished.
    Summary,
    /// One line per iteration,
    /// and one when finished.
    Iterations,
}

impl<A> Default for MinimizerConfig<A>
where
    A: Scalar,
{
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            max_evaluations: None,
            direction: DirectionConfig::default(),
            line_search: StrongWolfe::default(),
            initial_step_size: None,
            evaluation_policy: None,
            verbosity: Verbosity::default(),
            tolerance: Tolerance::default(),
        }
    }
}

impl<A> MinimizerConfig<A>
where
    A: Scalar,
{
    /// Return the initial step-size rule in effect.
    pub fn effective_initial_step_size(&self) -> InitialStepSize<A> {
        self.initial_step_size
            .unwrap_or_else(|| self.direction.default_initial_step_size())
    }

    /// Return the evaluation policy in effect
    /// for an objective with `capabilities`.
    pub fn effective_evaluation_policy(&self, capabilities: Capabilities) -> EvaluationPolicy {
        self.evaluation_policy
            .unwrap_or_else(|| EvaluationPolicy::preferred_for(capabilities))
    }
}

impl<A> MinimizerConfigBuilder<A>
where
    A: Scalar,
{
    /// Builds a new [`MinimizerConfig`].
    pub fn build(&self) -> MinimizerConfig<A> {
        let defaults = MinimizerConfig::default();
        MinimizerConfig {
            max_iterations: self.max_iterations.unwrap_or(defaults.max_iterations),
            max_evaluations: self.max_evaluations.unwrap_or(defaults.max_evaluations),
            direction: self.direction.unwrap_or(defaults.direction),
            line_search: self
                .line_search
                .clone()
                .unwrap_or(defaults.line_search),
            initial_step_size: self.initial_step_size.unwrap_or(defaults.initial_step_size),
            evaluation_policy: self.evaluation_policy.unwrap_or(defaults.evaluation_policy),
            verbosity: self.verbosity.unwrap_or(defaults.verbosity),
            tolerance: self.tolerance.unwrap_or(defaults.tolerance),
        }
    }
}

#[cfg(test)]
mod tests {
    use descent_core::EvaluationMode;
    use descent_linesearch::{step_direction::Memory, StepSize};

    use super::*;

    #[test]
    fn builder_should_fill_unset_fields_with_defaults() {
        let config = MinimizerConfigBuilder::<f64>::default()
            .max_iterations(10)
            .build();
        assert_eq!(
            config,
            MinimizerConfig {
                max_iterations: 10,
                ..MinimizerConfig::default()
            }
        );
        assert_eq!(*config.max_evaluations(), None);
        assert_eq!(
            *config.direction(),
            DirectionConfig::Lbfgs {
                memory: Memory::default()
            }
        );
    }

    #[test]
    fn initial_step_size_should_follow_direction_unless_set() {
        let config = MinimizerConfigBuilder::<f64>::default()
            .direction(DirectionConfig::SteepestDescent)
            .build();
        assert_eq!(
            config.effective_initial_step_size(),
            InitialStepSize::Interpolated
        );

        let fixed = InitialStepSize::Fixed(StepSize::new(0.5).unwrap());
        let config = MinimizerConfigBuilder::<f64>::default()
            .direction(DirectionConfig::SteepestDescent)
            .initial_step_size(fixed)
            .build();
        assert_eq!(config.effective_initial_step_size(), fixed);
    }

    #[test]
    fn evaluation_policy_should_follow_objective_unless_set() {
        let packed = Capabilities::none()
            .with(EvaluationMode::Value)
            .with(EvaluationMode::Gradient)
            .with(EvaluationMode::ValueAndGradient);
        assert_eq!(
            MinimizerConfig::<f64>::default().effective_evaluation_policy(packed),
            EvaluationPolicy::Packed
        );
        assert_eq!(
            MinimizerConfigBuilder::<f64>::default()
                .evaluation_policy(EvaluationPolicy::Separate)
                .build()
                .effective_evaluation_policy(packed),
            EvaluationPolicy::Separate
        );
    }

    #[test]
    fn verbosity_should_order_by_output() {
        assert!(Verbosity::Silent < Verbosity::Summary);
        assert!(Verbosity::Summary < Verbosity::Iterations);
    }
}
