#![warn(missing_debug_implementations)]
#![warn(missing_docs)]

//! Core traits and types for descent optimizers.
//!
//! An objective is adapted by a [`FunctionEvaluator`],
//! which enforces the objective's declared [`Capabilities`]
//! and counts calls.
//! Iterates flow through an [`OptimizationState`],
//! the only place previous iterates are kept.
//!
//! # Examples
//!
//! ```
//! use descent_core::prelude::*;
//! use descent_linalg::{Native, VectorAlgebra};
//!
//! type B = Native<f64>;
//!
//! let objective = FnObjective::<B>::new()
//!     .with_value(|x| x.iter().map(|x| x.powi(2)).sum())
//!     .with_gradient(|x| x.iter().map(|x| 2.0 * x).collect());
//! let mut evaluator = FunctionEvaluator::<B>::new(&objective, EvaluationPolicy::Separate).unwrap();
//!
//! let (value, gradient) = evaluator
//!     .compute_value_and_gradient(&B::from_vec(vec![1.0, 2.0]))
//!     .unwrap();
//! assert_eq!(value, 5.0);
//! assert_eq!(gradient, vec![2.0, 4.0]);
//! assert_eq!(evaluator.counts().value, 1);
//! assert_eq!(evaluator.counts().gradient, 1);
//! ```

mod error;
mod evaluator;
mod objective;
mod optimizer;
pub mod prelude;
mod state;

pub use self::{
    error::{ConfigError, EvaluationError},
    evaluator::{EvaluationCounts, EvaluationPolicy, FunctionEvaluator},
    objective::{Capabilities, EvaluationMode, FnObjective, Objective},
    optimizer::Optimizer,
    state::OptimizationState,
};
