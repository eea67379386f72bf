//! Driver running a line-search descent method to completion.

use std::fmt;

use descent_core::{
    ConfigError, EvaluationError, FunctionEvaluator, Objective, OptimizationState, Optimizer,
};
use descent_linalg::VectorAlgebra;
use descent_linesearch::{
    initial_step_size::InitialStepSize,
    step_direction::{DirectionStrategy, StepDirection},
    strong_wolfe::LineSearchResult,
};
use num_traits::Zero;
use streaming_iterator::StreamingIterator;
use tracing::{debug, info, warn};

use crate::{
    ExitReason, GradientNorm, MinimizeError, MinimizerConfig, OptimizationResult,
    StoppingCriterion, Verbosity,
};

/// A minimizer ready to run on any objective.
///
/// # Examples
///
/// ```
/// use descent::prelude::*;
///
/// type B = Native<f64>;
///
/// let objective = FnObjective::<B>::new()
///     .with_value(|x| x.iter().map(|x| (x - 1.0).powi(2)).sum())
///     .with_gradient(|x| x.iter().map(|x| 2.0 * (x - 1.0)).collect());
///
/// let result = Minimizer::<B>::default()
///     .minimize(&objective, vec![0.0, 0.0])
///     .unwrap();
/// assert_eq!(*result.exit_reason(), ExitReason::Converged);
/// assert!(result.point().iter().all(|x| (x - 1.0).abs() < 1e-6));
/// ```
pub struct Minimizer<'c, B>
where
    B: VectorAlgebra,
{
    config: MinimizerConfig<B::Scalar>,
    stopping_criterion: Option<Box<dyn StoppingCriterion<B> + 'c>>,
}

impl<'c, B> Minimizer<'c, B>
where
    B: VectorAlgebra,
{
    /// Return a minimizer using `config`.
    pub fn new(config: MinimizerConfig<B::Scalar>) -> Self {
        Self {
            config,
            stopping_criterion: None,
        }
    }

    /// Replace the default stopping criterion,
    /// gradient norm within the configured tolerance.
    pub fn with_stopping_criterion(mut self, criterion: impl StoppingCriterion<B> + 'c) -> Self {
        self.stopping_criterion = Some(Box::new(criterion));
        self
    }

    /// Return configuration.
    pub fn config(&self) -> &MinimizerConfig<B::Scalar> {
        &self.config
    }

    /// Prepare a minimization of `objective`
    /// starting from `x0`.
    ///
    /// Configuration is validated
    /// and `x0` is evaluated
    /// before returning.
    pub fn start<'o>(
        self,
        objective: &'o dyn Objective<B>,
        x0: B::Vector,
    ) -> Result<Minimization<'o, 'c, B>, MinimizeError<B>> {
        let len = B::len(&x0);
        if len == 0 {
            return Err(ConfigError::EmptyPoint.into());
        }

        let policy = self
            .config
            .effective_evaluation_policy(objective.capabilities());
        let mut evaluator = FunctionEvaluator::new(objective, policy)?;
        if let Some(mode) = self.config.direction().required_evaluation_mode() {
            evaluator.require(
                mode,
                "use `HessianVectorProductPolicy::ForwardDifference` or `HessianVectorProductPolicy::CentralDifference`",
            )?;
        }

        let (f, g) = evaluator
            .compute_value_and_gradient(&x0)
            .map_err(|e| match e {
                EvaluationError::DimensionMismatch {
                    expected, found, ..
                } => MinimizeError::<B>::Config(ConfigError::DimensionMismatch { expected, found }),
                e => MinimizeError::Evaluation(e),
            })?;

        let stopping_criterion: Box<dyn StoppingCriterion<B> + 'c> = match self.stopping_criterion {
            Some(criterion) => criterion,
            None => Box::new(GradientNorm::new(*self.config.tolerance())),
        };
        Ok(Minimization {
            engine: Engine {
                direction: self.config.direction().build(len),
                initial_step_size: self.config.effective_initial_step_size(),
                state: OptimizationState::new(x0, f, g),
                evaluator,
                stopping_criterion,
                config: self.config,
            },
            status: Status::Init,
            finished: false,
        })
    }

    /// Minimize `objective`
    /// starting from `x0`.
    pub fn minimize(
        self,
        objective: &dyn Objective<B>,
        x0: B::Vector,
    ) -> Result<OptimizationResult<B>, MinimizeError<B>> {
        let mut minimization = self.start(objective, x0)?;
        while !minimization.status().is_terminal() {
            minimization.advance();
        }
        minimization.into_result()
    }
}

impl<B> Default for Minimizer<'_, B>
where
    B: VectorAlgebra,
{
    fn default() -> Self {
        Self::new(MinimizerConfig::default())
    }
}

impl<B> fmt::Debug for Minimizer<'_, B>
where
    B: VectorAlgebra,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Minimizer")
            .field("config", &self.config)
            .field("custom_stopping_criterion", &self.stopping_criterion.is_some())
            .finish()
    }
}

/// Stage of a running minimization.
#[derive(Clone, Debug, PartialEq)]
pub enum Status {
    /// Starting point evaluated,
    /// stopping criterion not yet checked.
    Init,
    /// More iterations to run.
    Iterating,
    /// Stopping criterion was met.
    Converged,
    /// Iteration or evaluation budget ran out.
    MaxIterReached,
    /// Line-search found no acceptable step.
    LineSearchFailed,
    /// Objective failed.
    Errored(EvaluationError),
}

impl Status {
    /// Return whether no more iterations will run.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Init | Self::Iterating)
    }

    /// Return why the minimization stopped,
    /// if it stopped without error.
    pub fn exit_reason(&self) -> Option<ExitReason> {
        match self {
            Self::Converged => Some(ExitReason::Converged),
            Self::MaxIterReached => Some(ExitReason::MaxIterReached),
            Self::LineSearchFailed => Some(ExitReason::LineSearchFailed),
            Self::Init | Self::Iterating | Self::Errored(_) => None,
        }
    }
}

/// A running minimization.
///
/// Each `advance` runs one iteration.
/// The terminal stage is yielded once,
/// then the iterator ends.
pub struct Minimization<'o, 'c, B>
where
    B: VectorAlgebra,
{
    engine: Engine<'o, 'c, B>,
    status: Status,
    finished: bool,
}

struct Engine<'o, 'c, B>
where
    B: VectorAlgebra,
{
    config: MinimizerConfig<B::Scalar>,
    evaluator: FunctionEvaluator<'o, B>,
    direction: DirectionStrategy<B>,
    initial_step_size: InitialStepSize<B::Scalar>,
    stopping_criterion: Box<dyn StoppingCriterion<B> + 'c>,
    state: OptimizationState<B>,
}

impl<'o, 'c, B> Minimization<'o, 'c, B>
where
    B: VectorAlgebra,
{
    /// Return stage of this minimization.
    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Return current iterates.
    pub fn state(&self) -> &OptimizationState<B> {
        &self.engine.state
    }

    /// Return configuration.
    pub fn config(&self) -> &MinimizerConfig<B::Scalar> {
        &self.engine.config
    }

    /// Return objective calls made so far.
    pub fn counts(&self) -> descent_core::EvaluationCounts {
        self.engine.evaluator.counts()
    }

    /// Return the outcome of this minimization,
    /// running it to completion if necessary.
    pub fn into_result(mut self) -> Result<OptimizationResult<B>, MinimizeError<B>> {
        while !self.status.is_terminal() {
            self.step();
        }
        let engine = self.engine;
        let exit_reason = match self.status {
            Status::Errored(source) => {
                return Err(MinimizeError::Interrupted {
                    source,
                    value: *engine.state.f(),
                    iterations: *engine.state.iteration(),
                    point: engine.state.x().clone(),
                })
            }
            status => status.exit_reason().unwrap_or(ExitReason::MaxIterReached),
        };
        Ok(OptimizationResult::new(
            *engine.state.f(),
            engine.state.x().clone(),
            *engine.state.iteration(),
            engine.evaluator.counts(),
            exit_reason,
        ))
    }

    fn step(&mut self) {
        replace_with::replace_with_or_abort(&mut self.status, |status| match status {
            Status::Init => self.engine.init(),
            Status::Iterating => match self.engine.iterate() {
                Ok(status) => status,
                Err(e) => {
                    warn!(error = %e, "objective failed");
                    Status::Errored(e)
                }
            },
            terminal => terminal,
        });
        if self.status.is_terminal() {
            self.engine.summarize(&self.status);
        }
    }
}

impl<'o, 'c, B> Engine<'o, 'c, B>
where
    B: VectorAlgebra,
{
    fn init(&mut self) -> Status {
        if self.stopping_criterion.is_done(&self.state) {
            Status::Converged
        } else {
            Status::Iterating
        }
    }

    fn is_exhausted(&self) -> bool {
        *self.state.iteration() >= *self.config.max_iterations()
            || self
                .config
                .max_evaluations()
                .map_or(false, |max| self.evaluator.counts().value >= max)
    }

    fn iterate(&mut self) -> Result<Status, EvaluationError> {
        if self.is_exhausted() {
            return Ok(Status::MaxIterReached);
        }

        let computed = self
            .direction
            .compute_direction(&self.state, &mut self.evaluator)?;
        if let Some(event) = computed.event {
            debug!(iteration = *self.state.iteration(), %event, "direction recovered");
        }
        let mut is_steepest = matches!(self.direction, DirectionStrategy::SteepestDescent(_));
        let direction = if B::is_finite(&computed.direction)
            && B::dot(self.state.g(), &computed.direction) < B::Scalar::zero()
        {
            computed.direction
        } else {
            debug!(
                iteration = *self.state.iteration(),
                "not a descent direction, restarting from steepest descent"
            );
            self.direction.reset();
            is_steepest = true;
            B::negated(self.state.g())
        };
        self.state.set_direction(direction);

        let mut result = self.search()?;
        if !*result.accepted() && !is_steepest {
            debug!(
                iteration = *self.state.iteration(),
                "line-search failed, retrying along steepest descent"
            );
            let failed_direction = self.state.p().clone();
            self.direction.reset();
            self.state.set_direction(B::negated(self.state.g()));
            let retried = self.search()?;
            if *retried.accepted() || *retried.value() <= *result.value() {
                result = retried;
            } else {
                self.state.set_direction(failed_direction);
            }
        }

        let (step_size, point, value, gradient, accepted, evaluations) = result.into_parts();
        if accepted {
            self.state.set_step_size(step_size);
            self.state.advance(point, value, gradient);
            if self.config.verbosity() >= &Verbosity::Iterations {
                debug!(
                    iteration = *self.state.iteration(),
                    value = %self.state.f(),
                    gradient_norm = %B::norm(self.state.g()),
                    step_size = %step_size,
                    evaluations,
                    "iteration"
                );
            }
            Ok(if self.stopping_criterion.is_done(&self.state) {
                Status::Converged
            } else if self.is_exhausted() {
                Status::MaxIterReached
            } else {
                Status::Iterating
            })
        } else {
            if value < *self.state.f() {
                self.state.set_step_size(step_size);
                self.state.advance(point, value, gradient);
            }
            warn!(
                iteration = *self.state.iteration(),
                value = %self.state.f(),
                evaluations,
                "line-search found no acceptable step"
            );
            Ok(Status::LineSearchFailed)
        }
    }

    fn search(&mut self) -> Result<LineSearchResult<B>, EvaluationError> {
        let initial_step_size = self.initial_step_size.initial_step_size(&self.state);
        self.config
            .line_search()
            .search(&mut self.evaluator, &self.state, initial_step_size)
    }

    fn summarize(&self, status: &Status) {
        if self.config.verbosity() >= &Verbosity::Summary {
            let counts = self.evaluator.counts();
            info!(
                status = ?status,
                iterations = *self.state.iteration(),
                value = %self.state.f(),
                gradient_norm = %B::norm(self.state.g()),
                value_evaluations = counts.value,
                gradient_evaluations = counts.gradient,
                hessian_vector_product_evaluations = counts.hessian_vector_product,
                "minimization finished"
            );
        }
    }
}

impl<B> StreamingIterator for Minimization<'_, '_, B>
where
    B: VectorAlgebra,
{
    type Item = Self;

    fn advance(&mut self) {
        if self.status.is_terminal() {
            self.finished = true;
        } else {
            self.step();
        }
    }

    fn get(&self) -> Option<&Self::Item> {
        (!self.finished).then_some(self)
    }
}

impl<B> Optimizer for Minimization<'_, '_, B>
where
    B: VectorAlgebra,
{
    type Point = B::Vector;
    type Value = B::Scalar;

    fn best_point(&self) -> Self::Point {
        self.engine.state.x().clone()
    }

    fn best_point_value(&self) -> Self::Value {
        *self.engine.state.f()
    }
}

impl<B> fmt::Debug for Minimization<'_, '_, B>
where
    B: VectorAlgebra,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Minimization")
            .field("status", &self.status)
            .field("state", &self.engine.state)
            .field("direction", &self.engine.direction)
            .field("evaluator", &self.engine.evaluator)
            .field("config", &self.engine.config)
            .finish_non_exhaustive()
    }
}
