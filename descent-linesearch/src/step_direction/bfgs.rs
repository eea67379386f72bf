//! The Broyden-Fletcher-Goldfarb-Shanno (BFGS) algorithm,
//! an algorithm to approximate a step-direction
//! using second-derivatives
//! without directly calculating second-derivatives.
//!
//! Note,
//! this requires `n^2` memory and time,
//! where `n` is the length of a point.
//! It is not suitable for problems with large points.
//! See [`Lbfgs`](super::Lbfgs) for a limited-memory alternative
//! more suitable for problems with large points.

use descent_core::{EvaluationError, FunctionEvaluator, OptimizationState};
use descent_linalg::{Scalar, VectorAlgebra};
use num_traits::{Float, One, Zero};

use super::{ComputedDirection, DirectionEvent, StepDirection};

/// A component for step-direction
/// from a dense approximate inverse-Hessian.
#[derive(Clone, Debug)]
pub struct Bfgs<B>
where
    B: VectorAlgebra,
{
    len: usize,
    approx_inv_snd_derivatives: Option<B::Matrix>,
}

impl<B> Bfgs<B>
where
    B: VectorAlgebra,
{
    /// Return a new 'Bfgs'
    /// for points of length `len`.
    pub fn new(len: usize) -> Self {
        Self {
            len,
            approx_inv_snd_derivatives: None,
        }
    }

    /// Return the approximate inverse-Hessian,
    /// `None` before the first update,
    /// when it is implicitly the identity.
    pub fn approx_inv_snd_derivatives(&self) -> Option<&B::Matrix> {
        self.approx_inv_snd_derivatives.as_ref()
    }

    fn direction(&self, derivatives: &B::Vector) -> B::Vector {
        match &self.approx_inv_snd_derivatives {
            Some(h) => {
                let mut p = B::create_vector(self.len);
                B::symv(-B::Scalar::one(), h, derivatives, B::Scalar::zero(), &mut p);
                p
            }
            None => B::negated(derivatives),
        }
    }
}

impl<B> StepDirection<B> for Bfgs<B>
where
    B: VectorAlgebra,
{
    fn compute_direction(
        &mut self,
        state: &OptimizationState<B>,
        _evaluator: &mut FunctionEvaluator<'_, B>,
    ) -> Result<ComputedDirection<B>, EvaluationError> {
        let (Some(prev_point), Some(prev_derivatives)) = (state.xm1(), state.gm1()) else {
            return Ok(ComputedDirection::new(self.direction(state.g())));
        };

        let s = B::difference(state.x(), prev_point);
        let y = B::difference(state.g(), prev_derivatives);
        let ys = B::dot(&y, &s);
        if ys <= B::Scalar::epsilon() * B::norm(&s) * B::norm(&y) {
            return Ok(ComputedDirection::with_event(
                self.direction(state.g()),
                DirectionEvent::NumericalDegeneracy,
            ));
        }

        let len = self.len;
        let h = self.approx_inv_snd_derivatives.get_or_insert_with(|| {
            let mut h = B::create_matrix(len, len);
            B::set_diagonal(&mut h, B::Scalar::one());
            h
        });
        update::<B>(h, &s, &y, ys, prev_derivatives);

        Ok(ComputedDirection::new(self.direction(state.g())))
    }

    fn reset(&mut self) {
        self.approx_inv_snd_derivatives = None;
    }
}

/// Apply the BFGS update-rule
/// to approximate inverse-second-derivatives `h`.
///
/// Mathematically,
/// the next approximate inverse-Hessian is
/// `H_{k+1} = H - (\vec{s} (H \vec{y})^T + (H \vec{y}) \vec{s}^T) / ys + (1 / ys + \vec{y}^T H \vec{y} / ys^2) \vec{s} \vec{s}^T`,
/// where
/// `H = gamma H_k`;
/// `\vec{s} = \vec{x}_k - \vec{x}_{k - 1}`;
/// `\vec{y} = \vec{dx}_k - \vec{dx}_{k - 1}`;
/// and `ys = \vec{y}^T \vec{s}`.
///
/// `gamma` rescales `H_k` before the update,
/// see [`scaling`].
fn update<B>(
    h: &mut B::Matrix,
    s: &B::Vector,
    y: &B::Vector,
    ys: B::Scalar,
    prev_derivatives: &B::Vector,
) where
    B: VectorAlgebra,
{
    let mut hy = B::create_vector(B::len(y));
    B::symv(B::Scalar::one(), h, y, B::Scalar::zero(), &mut hy);
    let yhy = B::dot(y, &hy);

    let gamma = scaling(
        ys,
        yhy,
        B::dot(s, prev_derivatives),
        B::dot(prev_derivatives, &hy),
    );
    B::scale_matrix(gamma, h);
    B::scale(gamma, &mut hy);
    let yhy = gamma * yhy;

    B::rank2_update(-ys.recip(), s, &hy, h);
    B::rank1_update(ys.recip() + yhy / ys.powi(2), s, h);
}

/// Return a factor to rescale the approximate inverse-Hessian
/// before an update.
///
/// `ys / yHy` is used if it would grow the approximation,
/// otherwise `sg / gHy`,
/// where `g` is the previous gradient,
/// if it would shrink the approximation,
/// otherwise no scaling.
/// Factors that are not finite and positive are ignored.
fn scaling<A>(ys: A, yhy: A, sg: A, ghy: A) -> A
where
    A: Scalar,
{
    let grow = ys / yhy;
    let shrink = sg / ghy;
    let gamma = if grow > A::one() {
        grow
    } else if shrink < A::one() {
        shrink
    } else {
        A::one()
    };
    if gamma.is_finite() && gamma > A::zero() {
        gamma
    } else {
        A::one()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::{super::testing::*, *};

    #[test]
    fn bfgs_should_start_with_steepest_descent() {
        let objective = skewed_sphere();
        let mut evaluator = evaluator(&objective);
        let state = state_at(&mut evaluator, vec![1.0, 2.0, 3.0]);
        let mut bfgs = Bfgs::<B>::new(3);
        let computed = bfgs.compute_direction(&state, &mut evaluator).unwrap();
        assert_eq!(computed.direction, vec![-2.0, -8.0, -18.0]);
        assert!(bfgs.approx_inv_snd_derivatives().is_none());
    }

    #[test]
    fn bfgs_update_should_satisfy_secant_equation() {
        let objective = skewed_sphere();
        let mut evaluator = evaluator(&objective);
        let mut state = state_at(&mut evaluator, vec![1.0, 2.0, 3.0]);
        step(&mut evaluator, &mut state, vec![-2.0, -8.0, -18.0], 0.1);

        let mut bfgs = Bfgs::<B>::new(3);
        let computed = bfgs.compute_direction(&state, &mut evaluator).unwrap();
        assert_eq!(computed.event, None);
        assert!(B::dot(state.g(), &computed.direction) < 0.0);

        let s = B::difference(state.x(), state.xm1().unwrap());
        let y = B::difference(state.g(), state.gm1().unwrap());
        let mut hy = vec![0.0; 3];
        B::symv(1.0, bfgs.approx_inv_snd_derivatives().unwrap(), &y, 0.0, &mut hy);
        for (hy, s) in hy.into_iter().zip(s) {
            assert_relative_eq!(hy, s, max_relative = 1e-9);
        }
    }

    #[test]
    fn bfgs_should_skip_degenerate_updates() {
        let objective = skewed_sphere();
        let mut evaluator = evaluator(&objective);
        let mut state = state_at(&mut evaluator, vec![1.0, 2.0, 3.0]);
        step(&mut evaluator, &mut state, vec![-2.0, -8.0, -18.0], 0.0);

        let mut bfgs = Bfgs::<B>::new(3);
        let computed = bfgs.compute_direction(&state, &mut evaluator).unwrap();
        assert_eq!(computed.event, Some(DirectionEvent::NumericalDegeneracy));
        assert_eq!(computed.direction, B::negated(state.g()));
        assert!(bfgs.approx_inv_snd_derivatives().is_none());
    }

    #[test]
    fn reset_should_forget_approximation() {
        let objective = skewed_sphere();
        let mut evaluator = evaluator(&objective);
        let mut state = state_at(&mut evaluator, vec![1.0, 2.0, 3.0]);
        step(&mut evaluator, &mut state, vec![-2.0, -8.0, -18.0], 0.1);

        let mut bfgs = Bfgs::<B>::new(3);
        bfgs.compute_direction(&state, &mut evaluator).unwrap();
        assert!(bfgs.approx_inv_snd_derivatives().is_some());
        bfgs.reset();
        assert!(bfgs.approx_inv_snd_derivatives().is_none());
    }

    #[test]
    fn scaling_should_prefer_growth_then_shrinkage() {
        assert_eq!(scaling(2.0, 1.0, 0.0, 1.0), 2.0);
        assert_eq!(scaling(0.5, 1.0, 0.25, 1.0), 0.25);
        assert_eq!(scaling(0.5, 1.0, 2.0, 1.0), 1.0);
        assert_eq!(scaling(0.5, 1.0, -1.0, 1.0), 1.0);
        assert_eq!(scaling(1.0, 0.0, 0.5, 0.0), 1.0);
    }
}
