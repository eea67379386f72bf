//! Useful traits and types unlikely to conflict with existing definitions.

pub use streaming_iterator::StreamingIterator;

pub use crate::{
    Capabilities, ConfigError, EvaluationError, EvaluationMode, EvaluationPolicy, FnObjective,
    FunctionEvaluator, Objective, OptimizationState, Optimizer,
};
