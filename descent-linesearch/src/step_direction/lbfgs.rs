//! Limited-memory BFGS (L-BFGS) step-direction.
//!
//! Instead of a dense approximate inverse-Hessian,
//! the last `m` steps and changes in derivatives are kept,
//! and the approximate inverse-Hessian is applied implicitly
//! by the two-loop recursion.
//! This requires `m n` memory and time,
//! where `n` is the length of a point.

use std::collections::VecDeque;

use descent_core::{EvaluationError, FunctionEvaluator, OptimizationState};
use descent_linalg::VectorAlgebra;
use num_traits::{Float, One};

use super::{ComputedDirection, DirectionEvent, StepDirection};

pub use self::types::Memory;

/// A component for limited-memory quasi-Newton step-direction.
#[derive(Clone, Debug)]
pub struct Lbfgs<B>
where
    B: VectorAlgebra,
{
    memory: Memory,
    /// Most recent first.
    history: VecDeque<Correction<B>>,
}

/// One step and change in derivatives,
/// with `rho = 1 / (\vec{y}^T \vec{s})`.
#[derive(Clone, Debug)]
struct Correction<B>
where
    B: VectorAlgebra,
{
    s: B::Vector,
    y: B::Vector,
    rho: B::Scalar,
}

impl<B> Lbfgs<B>
where
    B: VectorAlgebra,
{
    /// Return a new 'Lbfgs'
    /// keeping at most `memory` corrections.
    pub fn new(memory: Memory) -> Self {
        Self {
            memory,
            history: VecDeque::with_capacity(memory.into_inner()),
        }
    }

    /// Return number of corrections kept.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// Return whether no corrections are kept.
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Store a correction,
    /// discarding the oldest beyond memory.
    ///
    /// Returns false,
    /// storing nothing,
    /// if curvature `\vec{y}^T \vec{s}` is not positive.
    fn push(&mut self, s: B::Vector, y: B::Vector) -> bool {
        let ys = B::dot(&y, &s);
        if ys <= B::Scalar::epsilon() * B::norm(&s) * B::norm(&y) {
            return false;
        }
        self.history.push_front(Correction {
            s,
            y,
            rho: ys.recip(),
        });
        self.history.truncate(self.memory.into_inner());
        true
    }

    /// Return `-H g`
    /// by the two-loop recursion.
    fn direction(&self, derivatives: &B::Vector) -> B::Vector {
        let Some(newest) = self.history.front() else {
            return B::negated(derivatives);
        };

        let mut q = derivatives.clone();
        let alphas = self
            .history
            .iter()
            .map(|c| {
                let alpha = c.rho * B::dot(&c.s, &q);
                B::axpy(-alpha, &c.y, &mut q);
                alpha
            })
            .collect::<Vec<_>>();

        let gamma = B::dot(&newest.s, &newest.y) / B::dot(&newest.y, &newest.y);
        let mut r = q;
        B::scale(gamma, &mut r);

        for (c, alpha) in self.history.iter().zip(alphas).rev() {
            let beta = c.rho * B::dot(&c.y, &r);
            B::axpy(alpha - beta, &c.s, &mut r);
        }

        B::scale(-B::Scalar::one(), &mut r);
        r
    }
}

impl<B> StepDirection<B> for Lbfgs<B>
where
    B: VectorAlgebra,
{
    fn compute_direction(
        &mut self,
        state: &OptimizationState<B>,
        _evaluator: &mut FunctionEvaluator<'_, B>,
    ) -> Result<ComputedDirection<B>, EvaluationError> {
        let event = match (state.xm1(), state.gm1()) {
            (Some(prev_point), Some(prev_derivatives)) => {
                let s = B::difference(state.x(), prev_point);
                let y = B::difference(state.g(), prev_derivatives);
                (!self.push(s, y)).then_some(DirectionEvent::NumericalDegeneracy)
            }
            _ => None,
        };
        Ok(ComputedDirection {
            direction: self.direction(state.g()),
            event,
        })
    }

    fn reset(&mut self) {
        self.history.clear();
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

    /// Number of corrections L-BFGS keeps,
    /// at least one.
    #[derive(Clone, Copy, Debug, Display, PartialEq, Eq, PartialOrd, Ord)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct Memory(usize);

    derive_new_from_lower_bounded!(Memory(usize));
    derive_try_from_inner!(Memory(usize));
    derive_into_inner!(Memory(usize));

    impl Default for Memory {
        fn default() -> Self {
            Self(4)
        }
    }

    impl LowerBounded for Memory {
        fn min_value() -> Self {
            Self(1)
        }
    }
}
