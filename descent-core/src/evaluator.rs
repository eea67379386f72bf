use std::fmt;

use descent_linalg::VectorAlgebra;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Capabilities, ConfigError, EvaluationError, EvaluationMode, Objective};

/// How values and gradients are requested from an objective.
///
/// A policy is fixed for the whole run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EvaluationPolicy {
    /// Call [`Objective::value`] and [`Objective::gradient`] independently.
    #[default]
    Separate,
    /// Call [`Objective::value_and_gradient`].
    Packed,
}

impl EvaluationPolicy {
    /// Return the policy best supported by `capabilities`,
    /// preferring [`EvaluationPolicy::Packed`].
    pub fn preferred_for(capabilities: Capabilities) -> Self {
        if capabilities.supports(EvaluationMode::ValueAndGradient) {
            Self::Packed
        } else {
            Self::Separate
        }
    }

    fn alternative(self) -> &'static str {
        match self {
            Self::Separate => "use `EvaluationPolicy::Packed`",
            Self::Packed => "use `EvaluationPolicy::Separate`",
        }
    }
}

/// Number of objective calls per mode.
///
/// A packed call counts as one value
/// and one gradient evaluation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EvaluationCounts {
    /// Objective values computed.
    pub value: usize,
    /// Gradients computed.
    pub gradient: usize,
    /// Hessian-vector products computed.
    pub hessian_vector_product: usize,
}

impl EvaluationCounts {
    /// Return value and gradient evaluations combined.
    pub fn function_evaluations(&self) -> usize {
        self.value + self.gradient
    }
}

/// An objective adapted to a fixed [`EvaluationPolicy`],
/// counting every call.
pub struct FunctionEvaluator<'o, B>
where
    B: VectorAlgebra,
{
    objective: &'o dyn Objective<B>,
    capabilities: Capabilities,
    policy: EvaluationPolicy,
    counts: EvaluationCounts,
}

impl<'o, B> FunctionEvaluator<'o, B>
where
    B: VectorAlgebra,
{
    /// Return an evaluator for `objective`
    /// if it supports the modes `policy` requires.
    pub fn new(objective: &'o dyn Objective<B>, policy: EvaluationPolicy) -> Result<Self, ConfigError> {
        let this = Self {
            capabilities: objective.capabilities(),
            objective,
            policy,
            counts: EvaluationCounts::default(),
        };
        match policy {
            EvaluationPolicy::Separate => {
                this.require_for_policy(EvaluationMode::Value)?;
                this.require_for_policy(EvaluationMode::Gradient)?;
            }
            EvaluationPolicy::Packed => {
                this.require_for_policy(EvaluationMode::ValueAndGradient)?;
            }
        }
        Ok(this)
    }

    fn require_for_policy(&self, mode: EvaluationMode) -> Result<(), ConfigError> {
        self.require(mode, self.policy.alternative())
    }

    /// Return an error naming `mode` and `suggestion`
    /// if the objective does not support `mode`.
    pub fn require(&self, mode: EvaluationMode, suggestion: &'static str) -> Result<(), ConfigError> {
        if self.capabilities.supports(mode) {
            Ok(())
        } else {
            Err(ConfigError::UnsupportedEvaluationMode { mode, suggestion })
        }
    }

    /// Return modes the objective supports.
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Return the policy used by `compute_*` methods.
    pub fn policy(&self) -> EvaluationPolicy {
        self.policy
    }

    /// Return calls made so far.
    pub fn counts(&self) -> EvaluationCounts {
        self.counts
    }

    /// Return `f(x)`.
    pub fn value(&mut self, x: &B::Vector) -> Result<B::Scalar, EvaluationError> {
        self.check(EvaluationMode::Value)?;
        self.counts.value += 1;
        self.objective.value(x)
    }

    /// Return `grad f(x)`.
    pub fn gradient(&mut self, x: &B::Vector) -> Result<B::Vector, EvaluationError> {
        self.check(EvaluationMode::Gradient)?;
        self.counts.gradient += 1;
        let g = self.objective.gradient(x)?;
        check_len::<B>(EvaluationMode::Gradient, x, &g)?;
        Ok(g)
    }

    /// Return `f(x)` and `grad f(x)` from one packed call.
    pub fn value_and_gradient(
        &mut self,
        x: &B::Vector,
    ) -> Result<(B::Scalar, B::Vector), EvaluationError> {
        self.check(EvaluationMode::ValueAndGradient)?;
        self.counts.value += 1;
        self.counts.gradient += 1;
        let (f, g) = self.objective.value_and_gradient(x)?;
        check_len::<B>(EvaluationMode::ValueAndGradient, x, &g)?;
        Ok((f, g))
    }

    /// Return `H(x) v`.
    pub fn hessian_vector_product(
        &mut self,
        x: &B::Vector,
        v: &B::Vector,
    ) -> Result<B::Vector, EvaluationError> {
        self.check(EvaluationMode::HessianVectorProduct)?;
        self.counts.hessian_vector_product += 1;
        let hv = self.objective.hessian_vector_product(x, v)?;
        check_len::<B>(EvaluationMode::HessianVectorProduct, x, &hv)?;
        Ok(hv)
    }

    /// Return `f(x)` and `grad f(x)`
    /// according to the evaluation policy.
    pub fn compute_value_and_gradient(
        &mut self,
        x: &B::Vector,
    ) -> Result<(B::Scalar, B::Vector), EvaluationError> {
        match self.policy {
            EvaluationPolicy::Separate => Ok((self.value(x)?, self.gradient(x)?)),
            EvaluationPolicy::Packed => self.value_and_gradient(x),
        }
    }

    /// Return `f(x)`
    /// according to the evaluation policy.
    ///
    /// A packed policy discards the gradient.
    pub fn compute_value(&mut self, x: &B::Vector) -> Result<B::Scalar, EvaluationError> {
        match self.policy {
            EvaluationPolicy::Separate => self.value(x),
            EvaluationPolicy::Packed => self.value_and_gradient(x).map(|(f, _)| f),
        }
    }

    /// Return `grad f(x)`
    /// according to the evaluation policy.
    ///
    /// A packed policy discards the value.
    pub fn compute_gradient(&mut self, x: &B::Vector) -> Result<B::Vector, EvaluationError> {
        match self.policy {
            EvaluationPolicy::Separate => self.gradient(x),
            EvaluationPolicy::Packed => self.value_and_gradient(x).map(|(_, g)| g),
        }
    }

    fn check(&self, mode: EvaluationMode) -> Result<(), EvaluationError> {
        if self.capabilities.supports(mode) {
            Ok(())
        } else {
            Err(EvaluationError::Unsupported(mode))
        }
    }
}

fn check_len<B>(mode: EvaluationMode, x: &B::Vector, y: &B::Vector) -> Result<(), EvaluationError>
where
    B: VectorAlgebra,
{
    let (expected, found) = (B::len(x), B::len(y));
    if expected == found {
        Ok(())
    } else {
        Err(EvaluationError::DimensionMismatch {
            mode,
            expected,
            found,
        })
    }
}

impl<B> fmt::Debug for FunctionEvaluator<'_, B>
where
    B: VectorAlgebra,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionEvaluator")
            .field("capabilities", &self.capabilities)
            .field("policy", &self.policy)
            .field("counts", &self.counts)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use descent_linalg::Native;

    use crate::FnObjective;

    use super::*;

    type B = Native<f64>;

    fn sphere(x: &Vec<f64>) -> f64 {
        x.iter().map(|x| x.powi(2)).sum()
    }

    fn sphere_d(x: &Vec<f64>) -> Vec<f64> {
        x.iter().map(|x| 2.0 * x).collect()
    }

    fn full_objective<'f>() -> FnObjective<'f, B> {
        FnObjective::new()
            .with_value(sphere)
            .with_gradient(sphere_d)
            .with_value_and_gradient(|x| (sphere(x), sphere_d(x)))
    }

    #[test]
    fn packed_call_should_count_one_value_and_one_gradient() {
        let objective = full_objective();
        let mut evaluator = FunctionEvaluator::<B>::new(&objective, EvaluationPolicy::Packed).unwrap();
        evaluator.value_and_gradient(&vec![1.0, 2.0]).unwrap();
        assert_eq!(
            evaluator.counts(),
            EvaluationCounts {
                value: 1,
                gradient: 1,
                hessian_vector_product: 0
            }
        );
    }

    #[test]
    fn gradient_call_should_leave_value_count_unchanged() {
        let objective = full_objective();
        let mut evaluator = FunctionEvaluator::<B>::new(&objective, EvaluationPolicy::Separate).unwrap();
        evaluator.gradient(&vec![1.0, 2.0]).unwrap();
        assert_eq!(evaluator.counts().value, 0);
        assert_eq!(evaluator.counts().gradient, 1);
    }

    #[test]
    fn compute_value_and_gradient_should_honor_policy() {
        let objective = full_objective();
        for policy in [EvaluationPolicy::Separate, EvaluationPolicy::Packed] {
            let mut evaluator = FunctionEvaluator::<B>::new(&objective, policy).unwrap();
            let (value, gradient) = evaluator
                .compute_value_and_gradient(&vec![1.0, -1.0])
                .unwrap();
            assert_eq!(value, 2.0);
            assert_eq!(gradient, vec![2.0, -2.0]);
            assert_eq!(evaluator.counts().function_evaluations(), 2);
        }
    }

    #[test]
    fn packed_compute_value_should_count_a_gradient() {
        let objective = full_objective();
        let mut evaluator = FunctionEvaluator::<B>::new(&objective, EvaluationPolicy::Packed).unwrap();
        assert_eq!(evaluator.compute_value(&vec![3.0]).unwrap(), 9.0);
        assert_eq!(evaluator.counts().gradient, 1);

        let mut evaluator = FunctionEvaluator::<B>::new(&objective, EvaluationPolicy::Separate).unwrap();
        assert_eq!(evaluator.compute_value(&vec![3.0]).unwrap(), 9.0);
        assert_eq!(evaluator.counts().gradient, 0);
    }

    #[test]
    fn separate_policy_should_require_value_and_gradient() {
        let objective = FnObjective::<B>::new().with_value_and_gradient(|x| (sphere(x), sphere_d(x)));
        let err = FunctionEvaluator::<B>::new(&objective, EvaluationPolicy::Separate).unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnsupportedEvaluationMode {
                mode: EvaluationMode::Value,
                suggestion: "use `EvaluationPolicy::Packed`"
            }
        );
        assert_eq!(
            err.to_string(),
            "objective does not support `value`, implement `Objective::value` or use `EvaluationPolicy::Packed`"
        );
    }

    #[test]
    fn packed_policy_should_require_value_and_gradient_together() {
        let objective = FnObjective::<B>::new().with_value(sphere).with_gradient(sphere_d);
        assert!(matches!(
            FunctionEvaluator::<B>::new(&objective, EvaluationPolicy::Packed),
            Err(ConfigError::UnsupportedEvaluationMode {
                mode: EvaluationMode::ValueAndGradient,
                ..
            })
        ));
    }

    #[test]
    fn unsupported_calls_should_fail_without_counting() {
        let objective = FnObjective::<B>::new().with_value(sphere).with_gradient(sphere_d);
        let mut evaluator = FunctionEvaluator::<B>::new(&objective, EvaluationPolicy::Separate).unwrap();
        assert_eq!(
            evaluator.hessian_vector_product(&vec![1.0], &vec![1.0]),
            Err(EvaluationError::Unsupported(
                EvaluationMode::HessianVectorProduct
            ))
        );
        assert_eq!(evaluator.counts(), EvaluationCounts::default());
    }

    #[test]
    fn gradients_of_wrong_length_should_be_rejected() {
        let objective = FnObjective::<B>::new()
            .with_value(sphere)
            .with_gradient(|_| vec![0.0]);
        let mut evaluator = FunctionEvaluator::<B>::new(&objective, EvaluationPolicy::Separate).unwrap();
        assert_eq!(
            evaluator.gradient(&vec![1.0, 2.0]),
            Err(EvaluationError::DimensionMismatch {
                mode: EvaluationMode::Gradient,
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn preferred_policy_should_be_packed_when_supported() {
        assert_eq!(
            EvaluationPolicy::preferred_for(full_objective().capabilities()),
            EvaluationPolicy::Packed
        );
        assert_eq!(
            EvaluationPolicy::preferred_for(
                Capabilities::none()
                    .with(EvaluationMode::Value)
                    .with(EvaluationMode::Gradient)
            ),
            EvaluationPolicy::Separate
        );
    }
}
