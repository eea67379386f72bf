//! Useful traits and types unlikely to conflict with existing definitions.

pub use streaming_iterator::StreamingIterator;

pub use crate::{
    check_gradient, minimize, BetaRule, Capabilities, DirectionConfig, EvaluationMode,
    EvaluationPolicy, ExitReason, FnObjective, GradientNorm, HessianVectorProductPolicy, Memory,
    MinimizeError, Minimizer, MinimizerConfig, MinimizerConfigBuilder, Native, Ndarray,
    Objective, OptimizationResult, OptimizationState, Optimizer, RestartPolicy,
    StoppingCriterion, TruncatedNewtonConfig, VectorAlgebra, Verbosity,
};
