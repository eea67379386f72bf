//! Strong Wolfe line-search.
//!
//! A step-size `a` is accepted
//! when it satisfies the sufficient decrease condition,
//! `f(x + a p) <= f(x) + c_1 a p^T grad_f(x)`,
//! and the strong curvature condition,
//! `|p^T grad_f(x + a p)| <= c_2 |p^T grad_f(x)|`.
//!
//! The search first brackets an acceptable step
//! by growing the trial step-size,
//! then narrows the bracket
//! by safeguarded cubic interpolation.
//! See Nocedal & Wright,
//! *Numerical Optimization*,
//! algorithms 3.5 and 3.6.

mod types;

use derive_builder::Builder;
use derive_getters::{Dissolve, Getters};
use descent_core::{EvaluationError, FunctionEvaluator, OptimizationState};
use descent_linalg::{Scalar, VectorAlgebra};
use num_traits::{Float, One, Zero};
use thiserror::Error;
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::StepSize;

pub use self::types::*;

/// Strong Wolfe line-search configuration.
#[derive(Clone, Debug, PartialEq, Builder, Getters)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[builder(build_fn(skip))]
pub struct StrongWolfe<A> {
    /// See [`SufficientDecreaseParameter`].
    #[builder(default)]
    c_1: SufficientDecreaseParameter<A>,
    /// See [`CurvatureParameter`].
    #[builder(default)]
    c_2: CurvatureParameter<A>,
    /// See [`ExpansionRate`].
    #[builder(default)]
    expansion_rate: ExpansionRate<A>,
    /// Trial points evaluated before giving up.
    #[builder(default = "40")]
    max_evaluations: usize,
    /// Largest step-size tried,
    /// unbounded if `None`.
    #[builder(default, setter(strip_option))]
    max_step_size: Option<StepSize<A>>,
}

/// Error returned when `c_1` is not less than `c_2`.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
#[error("sufficient decrease parameter ({c_1}) must be less than curvature parameter ({c_2})")]
pub struct InvalidStrongWolfeError<A>
where
    A: Scalar,
{
    c_1: A,
    c_2: A,
}

impl<A> StrongWolfe<A>
where
    A: Scalar,
{
    /// Return a new 'StrongWolfe'
    /// if `c_1 < c_2`.
    pub fn new(
        c_1: SufficientDecreaseParameter<A>,
        c_2: CurvatureParameter<A>,
    ) -> Result<Self, InvalidStrongWolfeError<A>> {
        StrongWolfeBuilder::default().c_1(c_1).c_2(c_2).build()
    }
}

impl<A> Default for StrongWolfe<A>
where
    A: Scalar,
{
    fn default() -> Self {
        Self {
            c_1: SufficientDecreaseParameter::default(),
            c_2: CurvatureParameter::default(),
            expansion_rate: ExpansionRate::default(),
            max_evaluations: 40,
            max_step_size: None,
        }
    }
}

impl<A> StrongWolfeBuilder<A>
where
    A: Scalar,
{
    /// Builds a new [`StrongWolfe`].
    pub fn build(&self) -> Result<StrongWolfe<A>, InvalidStrongWolfeError<A>> {
        let defaults = StrongWolfe::default();
        let c_1 = self.c_1.unwrap_or(defaults.c_1);
        let c_2 = self.c_2.unwrap_or(defaults.c_2);
        if c_1.into_inner() < c_2.into_inner() {
            Ok(StrongWolfe {
                c_1,
                c_2,
                expansion_rate: self.expansion_rate.unwrap_or(defaults.expansion_rate),
                max_evaluations: self.max_evaluations.unwrap_or(defaults.max_evaluations),
                max_step_size: self.max_step_size.unwrap_or(defaults.max_step_size),
            })
        } else {
            Err(InvalidStrongWolfeError {
                c_1: c_1.into_inner(),
                c_2: c_2.into_inner(),
            })
        }
    }
}

/// Outcome of one line-search.
///
/// When not accepted,
/// the point is the best point found,
/// the lowest point satisfying sufficient decrease,
/// or the starting point with step-size zero.
#[derive(Clone, Debug, Getters, Dissolve)]
#[dissolve(rename = "into_parts")]
pub struct LineSearchResult<B>
where
    B: VectorAlgebra,
{
    /// Step-size along the direction.
    step_size: B::Scalar,
    /// New point.
    point: B::Vector,
    /// Value of the new point.
    value: B::Scalar,
    /// Gradient at the new point.
    gradient: B::Vector,
    /// Whether both Wolfe conditions hold.
    accepted: bool,
    /// Trial points evaluated.
    evaluations: usize,
}

impl<A> StrongWolfe<A>
where
    A: Scalar,
{
    /// Search along the direction of `state`,
    /// starting from `initial_step_size`.
    ///
    /// Fails without evaluating
    /// if the direction is not a descent direction.
    pub fn search<B>(
        &self,
        evaluator: &mut FunctionEvaluator<'_, B>,
        state: &OptimizationState<B>,
        initial_step_size: StepSize<A>,
    ) -> Result<LineSearchResult<B>, EvaluationError>
    where
        B: VectorAlgebra<Scalar = A>,
    {
        Search {
            config: self,
            evaluator,
            x: state.x(),
            g: state.g(),
            p: state.p(),
            value: *state.f(),
            dphi0: state.directional_derivative(),
            evaluations: 0,
            best: None,
        }
        .run(initial_step_size.into_inner())
    }
}

struct Search<'a, 'o, B>
where
    B: VectorAlgebra,
{
    config: &'a StrongWolfe<B::Scalar>,
    evaluator: &'a mut FunctionEvaluator<'o, B>,
    x: &'a B::Vector,
    g: &'a B::Vector,
    p: &'a B::Vector,
    value: B::Scalar,
    dphi0: B::Scalar,
    evaluations: usize,
    best: Option<Trial<B>>,
}

#[derive(Clone)]
struct Trial<B>
where
    B: VectorAlgebra,
{
    step: B::Scalar,
    x: B::Vector,
    f: B::Scalar,
    g: B::Vector,
    dphi: B::Scalar,
}

/// An end of a bracket.
#[derive(Clone, Copy, Debug)]
struct Bound<A> {
    step: A,
    f: A,
    dphi: A,
}

impl<B> Trial<B>
where
    B: VectorAlgebra,
{
    fn is_finite(&self) -> bool {
        self.f.is_finite() && self.dphi.is_finite()
    }

    fn bound(&self) -> Bound<B::Scalar> {
        Bound {
            step: self.step,
            f: self.f,
            dphi: self.dphi,
        }
    }
}

impl<B> Search<'_, '_, B>
where
    B: VectorAlgebra,
{
    fn run(mut self, initial_step_size: B::Scalar) -> Result<LineSearchResult<B>, EvaluationError> {
        let zero = B::Scalar::zero();
        if !(self.dphi0 < zero) {
            debug!(dphi0 = %self.dphi0, "line-search direction is not a descent direction");
            return Ok(self.failed());
        }

        let max_step = self
            .config
            .max_step_size
            .map_or(B::Scalar::infinity(), StepSize::into_inner);
        let mut prev = Bound {
            step: zero,
            f: self.value,
            dphi: self.dphi0,
        };
        let mut step = initial_step_size.min(max_step);
        loop {
            if self.evaluations >= self.config.max_evaluations {
                debug!(evaluations = self.evaluations, "line-search budget exhausted while bracketing");
                return Ok(self.failed());
            }
            let trial = self.evaluate(step)?;
            if !trial.is_finite()
                || !self.is_sufficient_decrease(&trial)
                || (self.evaluations > 1 && trial.f >= prev.f)
            {
                return self.zoom(prev, trial.bound());
            }
            if self.is_curvature(&trial) {
                return Ok(self.accepted(trial));
            }
            if trial.dphi >= zero {
                return self.zoom(trial.bound(), prev);
            }
            if step >= max_step {
                debug!(step = %step, "line-search reached maximum step-size");
                return Ok(self.failed());
            }
            prev = trial.bound();
            step = (self.config.expansion_rate.into_inner() * step).min(max_step);
        }
    }

    /// Narrow a bracket,
    /// where `lo` satisfies sufficient decrease
    /// and has the lowest value seen so far.
    fn zoom(
        mut self,
        mut lo: Bound<B::Scalar>,
        mut hi: Bound<B::Scalar>,
    ) -> Result<LineSearchResult<B>, EvaluationError> {
        loop {
            if self.evaluations >= self.config.max_evaluations {
                debug!(evaluations = self.evaluations, "line-search budget exhausted while zooming");
                return Ok(self.failed());
            }
            if (hi.step - lo.step).abs() <= B::Scalar::epsilon() * lo.step.max(hi.step) {
                debug!(lo = %lo.step, hi = %hi.step, "line-search bracket collapsed");
                return Ok(self.failed());
            }

            let trial = self.evaluate(interpolate(&lo, &hi))?;
            if !trial.is_finite() || !self.is_sufficient_decrease(&trial) || trial.f >= lo.f {
                hi = trial.bound();
            } else {
                if self.is_curvature(&trial) {
                    return Ok(self.accepted(trial));
                }
                if trial.dphi * (hi.step - lo.step) >= B::Scalar::zero() {
                    hi = lo;
                }
                lo = trial.bound();
            }
        }
    }

    fn evaluate(&mut self, step: B::Scalar) -> Result<Trial<B>, EvaluationError> {
        let x = B::moved(self.x, step, self.p);
        let (f, g) = self.evaluator.compute_value_and_gradient(&x)?;
        self.evaluations += 1;
        let trial = Trial {
            dphi: B::dot(&g, self.p),
            step,
            x,
            f,
            g,
        };
        if trial.is_finite()
            && self.is_sufficient_decrease(&trial)
            && self.best.as_ref().map_or(true, |best| trial.f < best.f)
        {
            self.best = Some(trial.clone());
        }
        Ok(trial)
    }

    fn is_sufficient_decrease(&self, trial: &Trial<B>) -> bool {
        trial.f <= self.value + self.config.c_1 * (trial.step * self.dphi0)
    }

    fn is_curvature(&self, trial: &Trial<B>) -> bool {
        trial.dphi.abs() <= self.config.c_2 * self.dphi0.abs()
    }

    fn accepted(self, trial: Trial<B>) -> LineSearchResult<B> {
        LineSearchResult {
            step_size: trial.step,
            point: trial.x,
            value: trial.f,
            gradient: trial.g,
            accepted: true,
            evaluations: self.evaluations,
        }
    }

    fn failed(self) -> LineSearchResult<B> {
        match self.best {
            Some(best) => LineSearchResult {
                step_size: best.step,
                point: best.x,
                value: best.f,
                gradient: best.g,
                accepted: false,
                evaluations: self.evaluations,
            },
            None => LineSearchResult {
                step_size: B::Scalar::zero(),
                point: self.x.clone(),
                value: self.value,
                gradient: self.g.clone(),
                accepted: false,
                evaluations: self.evaluations,
            },
        }
    }
}

/// Return the minimizer of the cubic interpolating both ends,
/// or bisection if that lies too close to either end.
fn interpolate<A>(lo: &Bound<A>, hi: &Bound<A>) -> A
where
    A: Scalar,
{
    let (left, right) = (lo.step.min(hi.step), lo.step.max(hi.step));
    let bisection = A::lit(0.5) * (lo.step + hi.step);
    if !(hi.f.is_finite() && hi.dphi.is_finite()) {
        return bisection;
    }

    let d_1 = lo.dphi + hi.dphi - A::lit(3.0) * (lo.f - hi.f) / (lo.step - hi.step);
    let radicand = d_1 * d_1 - lo.dphi * hi.dphi;
    if radicand < A::zero() {
        return bisection;
    }
    let d_2 = (hi.step - lo.step).signum() * radicand.sqrt();
    let step = hi.step
        - (hi.step - lo.step) * (hi.dphi + d_2 - d_1) / (hi.dphi - lo.dphi + A::lit(2.0) * d_2);

    let margin = A::lit(0.1) * (right - left);
    if step.is_finite() && step >= left + margin && step <= right - margin {
        step
    } else {
        bisection
    }
}
