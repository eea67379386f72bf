//! Truncated Newton,
//! also known as Hessian-free Newton,
//! step-direction.
//!
//! The Newton system,
//! `H p = -g`,
//! is solved approximately
//! by an inner conjugate gradient loop
//! using only Hessian-vector products.
//! The inner loop stops once the residual is small relative to `||g||`,
//! after a budget of iterations,
//! or on meeting non-positive curvature.
//! See Nocedal & Wright,
//! *Numerical Optimization*,
//! algorithm 7.1.

use derive_builder::Builder;
use derive_getters::Getters;
use descent_core::{EvaluationError, FunctionEvaluator, OptimizationState};
use descent_linalg::{Scalar, VectorAlgebra};
use num_traits::{Float, One};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{ComputedDirection, DirectionEvent, StepDirection};

pub use self::types::*;

/// Source of Hessian-vector products.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum HessianVectorProductPolicy {
    /// Call the objective's own Hessian-vector product.
    #[default]
    Provided,
    /// `(grad_f(x + h v) - grad_f(x)) / h`,
    /// one gradient evaluation per product.
    ForwardDifference,
    /// `(grad_f(x + h v) - grad_f(x - h v)) / 2h`,
    /// two gradient evaluations per product.
    CentralDifference,
}

/// Truncated Newton configuration.
#[derive(Clone, Copy, Debug, PartialEq, Builder, Getters)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[builder(build_fn(skip))]
pub struct TruncatedNewtonConfig<A> {
    /// See [`MaxInnerIterations`].
    #[builder(default)]
    max_inner_iterations: MaxInnerIterations,
    /// See [`ResidualTolerance`].
    #[builder(default)]
    residual_tolerance: ResidualTolerance<A>,
    /// See [`NegativeCurvatureThreshold`].
    #[builder(default)]
    negative_curvature_threshold: NegativeCurvatureThreshold<A>,
    /// See [`HessianVectorProductPolicy`].
    #[builder(default)]
    hessian_vector_product: HessianVectorProductPolicy,
}

impl<A> Default for TruncatedNewtonConfig<A>
where
    A: Scalar,
{
    fn default() -> Self {
        Self {
            max_inner_iterations: MaxInnerIterations::default(),
            residual_tolerance: ResidualTolerance::default(),
            negative_curvature_threshold: NegativeCurvatureThreshold::default(),
            hessian_vector_product: HessianVectorProductPolicy::default(),
        }
    }
}

impl<A> TruncatedNewtonConfigBuilder<A>
where
    A: Scalar,
{
    /// Builds a new [`TruncatedNewtonConfig`].
    pub fn build(&self) -> TruncatedNewtonConfig<A> {
        let defaults = TruncatedNewtonConfig::default();
        TruncatedNewtonConfig {
            max_inner_iterations: self
                .max_inner_iterations
                .unwrap_or(defaults.max_inner_iterations),
            residual_tolerance: self
                .residual_tolerance
                .unwrap_or(defaults.residual_tolerance),
            negative_curvature_threshold: self
                .negative_curvature_threshold
                .unwrap_or(defaults.negative_curvature_threshold),
            hessian_vector_product: self
                .hessian_vector_product
                .unwrap_or(defaults.hessian_vector_product),
        }
    }
}

/// A component for truncated Newton step-direction.
#[derive(Clone, Debug)]
pub struct TruncatedNewton<B>
where
    B: VectorAlgebra,
{
    config: TruncatedNewtonConfig<B::Scalar>,
    inner_iterations: usize,
}

impl<B> TruncatedNewton<B>
where
    B: VectorAlgebra,
{
    /// Return a new 'TruncatedNewton'.
    pub fn new(config: TruncatedNewtonConfig<B::Scalar>) -> Self {
        Self {
            config,
            inner_iterations: 0,
        }
    }

    /// Return inner iterations used by the last direction.
    pub fn inner_iterations(&self) -> usize {
        self.inner_iterations
    }

    fn hessian_vector_product(
        &self,
        evaluator: &mut FunctionEvaluator<'_, B>,
        state: &OptimizationState<B>,
        v: &B::Vector,
    ) -> Result<B::Vector, EvaluationError> {
        let x = state.x();
        let policy = self.config.hessian_vector_product;
        if policy == HessianVectorProductPolicy::Provided {
            return evaluator.hessian_vector_product(x, v);
        }

        let h = B::Scalar::epsilon().sqrt() * (B::Scalar::one() + B::norm(x)) / B::norm(v);
        let forward = evaluator.compute_gradient(&B::moved(x, h, v))?;
        let (mut hv, divisor) = match policy {
            HessianVectorProductPolicy::CentralDifference => {
                let backward = evaluator.compute_gradient(&B::moved(x, -h, v))?;
                (B::difference(&forward, &backward), B::Scalar::lit(2.0) * h)
            }
            _ => (B::difference(&forward, state.g()), h),
        };
        B::scale(divisor.recip(), &mut hv);
        Ok(hv)
    }
}

impl<B> StepDirection<B> for TruncatedNewton<B>
where
    B: VectorAlgebra,
{
    fn compute_direction(
        &mut self,
        state: &OptimizationState<B>,
        evaluator: &mut FunctionEvaluator<'_, B>,
    ) -> Result<ComputedDirection<B>, EvaluationError> {
        let g = state.g();
        let g_norm = B::norm(g);
        let tolerance = self
            .config
            .residual_tolerance
            .into_inner()
            .min(g_norm.sqrt())
            * g_norm;
        let threshold = self.config.negative_curvature_threshold.into_inner();

        let mut z = B::create_vector(state.len());
        let mut r = g.clone();
        let mut d = B::negated(g);
        let mut rr = B::dot(&r, &r);

        self.inner_iterations = 0;
        while self.inner_iterations < self.config.max_inner_iterations.into_inner()
            && rr.sqrt() > tolerance
        {
            let hd = self.hessian_vector_product(evaluator, state, &d)?;
            let dhd = B::dot(&d, &hd);
            if !(dhd > threshold * B::dot(&d, &d)) {
                let event = DirectionEvent::NegativeCurvatureDetected {
                    inner_iterations: self.inner_iterations,
                };
                let direction = if self.inner_iterations == 0 {
                    B::negated(g)
                } else {
                    z
                };
                return Ok(ComputedDirection::with_event(direction, event));
            }

            let alpha = rr / dhd;
            B::axpy(alpha, &d, &mut z);
            B::axpy(alpha, &hd, &mut r);
            let rr_next = B::dot(&r, &r);
            let beta = rr_next / rr;
            B::scale(beta, &mut d);
            B::axpy(-B::Scalar::one(), &r, &mut d);
            rr = rr_next;
            self.inner_iterations += 1;
        }

        if self.inner_iterations == 0 {
            Ok(ComputedDirection::new(B::negated(g)))
        } else {
            Ok(ComputedDirection::new(z))
        }
    }

    fn reset(&mut self) {
        self.inner_iterations = 0;
    }
}

mod types {
    use derive_more::Display;
    use derive_num_bounded::{
        derive_into_inner, derive_new_from_bounded, derive_new_from_lower_bounded,
        derive_try_from_inner,
    };
    use descent_linalg::Scalar;
    use num_traits::bounds::{LowerBounded, UpperBounded};

    #[cfg(feature = "serde")]
    use serde::{Deserialize, Serialize};

    /// Inner conjugate gradient iterations per direction,
    /// at least one.
    #[derive(Clone, Copy, Debug, Display, PartialEq, Eq, PartialOrd, Ord)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct MaxInnerIterations(usize);

    derive_new_from_lower_bounded!(MaxInnerIterations(usize));
    derive_try_from_inner!(MaxInnerIterations(usize));
    derive_into_inner!(MaxInnerIterations(usize));

    impl Default for MaxInnerIterations {
        fn default() -> Self {
            Self(100)
        }
    }

    impl LowerBounded for MaxInnerIterations {
        fn min_value() -> Self {
            Self(1)
        }
    }

    /// Cap on the forcing term,
    /// the inner loop stops when
    /// `||r|| <= min(tolerance, sqrt(||g||)) ||g||`.
    #[derive(Clone, Copy, Debug, Display, PartialEq, PartialOrd)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct ResidualTolerance<A>(A);

    derive_new_from_bounded!(ResidualTolerance<A: Scalar>);
    derive_into_inner!(ResidualTolerance<A>);

    impl<A> Default for ResidualTolerance<A>
    where
        A: Scalar,
    {
        fn default() -> Self {
            Self(A::lit(0.5))
        }
    }

    impl<A> LowerBounded for ResidualTolerance<A>
    where
        A: Scalar,
    {
        fn min_value() -> Self {
            Self(A::epsilon())
        }
    }

    impl<A> UpperBounded for ResidualTolerance<A>
    where
        A: Scalar,
    {
        fn max_value() -> Self {
            Self(A::one())
        }
    }

    /// Curvature `d^T H d` at or below `threshold d^T d`
    /// is treated as negative,
    /// and truncates the inner loop.
    #[derive(Clone, Copy, Debug, Display, PartialEq, PartialOrd)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct NegativeCurvatureThreshold<A>(A);

    derive_new_from_lower_bounded!(NegativeCurvatureThreshold<A: Scalar>);
    derive_into_inner!(NegativeCurvatureThreshold<A>);

    impl<A> Default for NegativeCurvatureThreshold<A>
    where
        A: Scalar,
    {
        fn default() -> Self {
            Self(A::zero())
        }
    }

    impl<A> LowerBounded for NegativeCurvatureThreshold<A>
    where
        A: Scalar,
    {
        fn min_value() -> Self {
            Self(A::zero())
        }
    }
}
