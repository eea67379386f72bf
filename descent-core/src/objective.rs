use std::fmt;

use derive_more::Display;
use descent_linalg::VectorAlgebra;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::EvaluationError;

/// A way of evaluating an objective.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EvaluationMode {
    /// `f(x)`.
    #[display(fmt = "value")]
    Value,
    /// `grad f(x)`.
    #[display(fmt = "gradient")]
    Gradient,
    /// `f(x)` and `grad f(x)` in one call.
    #[display(fmt = "value_and_gradient")]
    ValueAndGradient,
    /// `H(x) v`.
    #[display(fmt = "hessian_vector_product")]
    HessianVectorProduct,
}

/// Modes an objective supports.
///
/// Declared explicitly by each objective
/// and checked once,
/// when a [`crate::FunctionEvaluator`] is constructed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Capabilities {
    value: bool,
    gradient: bool,
    value_and_gradient: bool,
    hessian_vector_product: bool,
}

impl Capabilities {
    /// Return capabilities supporting no modes.
    pub const fn none() -> Self {
        Self {
            value: false,
            gradient: false,
            value_and_gradient: false,
            hessian_vector_product: false,
        }
    }

    /// Return these capabilities with `mode` supported.
    pub const fn with(mut self, mode: EvaluationMode) -> Self {
        match mode {
            EvaluationMode::Value => self.value = true,
            EvaluationMode::Gradient => self.gradient = true,
            EvaluationMode::ValueAndGradient => self.value_and_gradient = true,
            EvaluationMode::HessianVectorProduct => self.hessian_vector_product = true,
        }
        self
    }

    /// Return whether `mode` is supported.
    pub const fn supports(&self, mode: EvaluationMode) -> bool {
        match mode {
            EvaluationMode::Value => self.value,
            EvaluationMode::Gradient => self.gradient,
            EvaluationMode::ValueAndGradient => self.value_and_gradient,
            EvaluationMode::HessianVectorProduct => self.hessian_vector_product,
        }
    }
}

impl FromIterator<EvaluationMode> for Capabilities {
    fn from_iter<I: IntoIterator<Item = EvaluationMode>>(iter: I) -> Self {
        iter.into_iter().fold(Self::none(), Self::with)
    }
}

/// A smooth scalar objective to minimize.
///
/// Implementors override the methods for the modes they support
/// and declare the same modes in [`Objective::capabilities`].
/// Methods left at their default return [`EvaluationError::Unsupported`].
pub trait Objective<B>
where
    B: VectorAlgebra,
{
    /// Return modes this objective supports.
    fn capabilities(&self) -> Capabilities;

    /// Return `f(x)`.
    fn value(&self, _x: &B::Vector) -> Result<B::Scalar, EvaluationError> {
        Err(EvaluationError::Unsupported(EvaluationMode::Value))
    }

    /// Return `grad f(x)`.
    fn gradient(&self, _x: &B::Vector) -> Result<B::Vector, EvaluationError> {
        Err(EvaluationError::Unsupported(EvaluationMode::Gradient))
    }

    /// Return `f(x)` and `grad f(x)`.
    fn value_and_gradient(
        &self,
        _x: &B::Vector,
    ) -> Result<(B::Scalar, B::Vector), EvaluationError> {
        Err(EvaluationError::Unsupported(
            EvaluationMode::ValueAndGradient,
        ))
    }

    /// Return the Hessian of `f` at `x`
    /// multiplied by `v`.
    fn hessian_vector_product(
        &self,
        _x: &B::Vector,
        _v: &B::Vector,
    ) -> Result<B::Vector, EvaluationError> {
        Err(EvaluationError::Unsupported(
            EvaluationMode::HessianVectorProduct,
        ))
    }
}

type ValueFn<'f, B> =
    Box<dyn Fn(&<B as VectorAlgebra>::Vector) -> <B as VectorAlgebra>::Scalar + 'f>;
type GradientFn<'f, B> =
    Box<dyn Fn(&<B as VectorAlgebra>::Vector) -> <B as VectorAlgebra>::Vector + 'f>;
type ValueAndGradientFn<'f, B> = Box<
    dyn Fn(
            &<B as VectorAlgebra>::Vector,
        ) -> (<B as VectorAlgebra>::Scalar, <B as VectorAlgebra>::Vector)
        + 'f,
>;
type HessianVectorProductFn<'f, B> = Box<
    dyn Fn(&<B as VectorAlgebra>::Vector, &<B as VectorAlgebra>::Vector) -> <B as VectorAlgebra>::Vector
        + 'f,
>;

/// An objective built from closures.
///
/// Capabilities are exactly the closures given.
pub struct FnObjective<'f, B>
where
    B: VectorAlgebra,
{
    value: Option<ValueFn<'f, B>>,
    gradient: Option<GradientFn<'f, B>>,
    value_and_gradient: Option<ValueAndGradientFn<'f, B>>,
    hessian_vector_product: Option<HessianVectorProductFn<'f, B>>,
}

impl<'f, B> FnObjective<'f, B>
where
    B: VectorAlgebra,
{
    /// Return an objective supporting no modes.
    pub fn new() -> Self {
        Self {
            value: None,
            gradient: None,
            value_and_gradient: None,
            hessian_vector_product: None,
        }
    }

    /// Support [`EvaluationMode::Value`] using `f`.
    pub fn with_value(mut self, f: impl Fn(&B::Vector) -> B::Scalar + 'f) -> Self {
        self.value = Some(Box::new(f));
        self
    }

    /// Support [`EvaluationMode::Gradient`] using `f`.
    pub fn with_gradient(mut self, f: impl Fn(&B::Vector) -> B::Vector + 'f) -> Self {
        self.gradient = Some(Box::new(f));
        self
    }

    /// Support [`EvaluationMode::ValueAndGradient`] using `f`.
    pub fn with_value_and_gradient(
        mut self,
        f: impl Fn(&B::Vector) -> (B::Scalar, B::Vector) + 'f,
    ) -> Self {
        self.value_and_gradient = Some(Box::new(f));
        self
    }

    /// Support [`EvaluationMode::HessianVectorProduct`] using `f`.
    pub fn with_hessian_vector_product(
        mut self,
        f: impl Fn(&B::Vector, &B::Vector) -> B::Vector + 'f,
    ) -> Self {
        self.hessian_vector_product = Some(Box::new(f));
        self
    }
}

impl<B> Default for FnObjective<'_, B>
where
    B: VectorAlgebra,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<B> fmt::Debug for FnObjective<'_, B>
where
    B: VectorAlgebra,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnObjective")
            .field("capabilities", &self.capabilities())
            .finish()
    }
}

impl<B> Objective<B> for FnObjective<'_, B>
where
    B: VectorAlgebra,
{
    fn capabilities(&self) -> Capabilities {
        let mut capabilities = Capabilities::none();
        if self.value.is_some() {
            capabilities = capabilities.with(EvaluationMode::Value);
        }
        if self.gradient.is_some() {
            capabilities = capabilities.with(EvaluationMode::Gradient);
        }
        if self.value_and_gradient.is_some() {
            capabilities = capabilities.with(EvaluationMode::ValueAndGradient);
        }
        if self.hessian_vector_product.is_some() {
            capabilities = capabilities.with(EvaluationMode::HessianVectorProduct);
        }
        capabilities
    }

    fn value(&self, x: &B::Vector) -> Result<B::Scalar, EvaluationError> {
        self.value
            .as_ref()
            .map(|f| f(x))
            .ok_or(EvaluationError::Unsupported(EvaluationMode::Value))
    }

    fn gradient(&self, x: &B::Vector) -> Result<B::Vector, EvaluationError> {
        self.gradient
            .as_ref()
            .map(|f| f(x))
            .ok_or(EvaluationError::Unsupported(EvaluationMode::Gradient))
    }

    fn value_and_gradient(&self, x: &B::Vector) -> Result<(B::Scalar, B::Vector), EvaluationError> {
        self.value_and_gradient
            .as_ref()
            .map(|f| f(x))
            .ok_or(EvaluationError::Unsupported(
                EvaluationMode::ValueAndGradient,
            ))
    }

    fn hessian_vector_product(
        &self,
        x: &B::Vector,
        v: &B::Vector,
    ) -> Result<B::Vector, EvaluationError> {
        self.hessian_vector_product
            .as_ref()
            .map(|f| f(x, v))
            .ok_or(EvaluationError::Unsupported(
                EvaluationMode::HessianVectorProduct,
            ))
    }
}
