#![warn(missing_debug_implementations)]
#![warn(missing_docs)]

//! Vector-algebra interface for descent optimizers.
//!
//! Optimizers never touch a concrete vector type.
//! They are written against [`VectorAlgebra`],
//! a small set of BLAS-like primitives,
//! and each backend is an adapter implementing it.
//!
//! Two backends are provided:
//! [`Ndarray`],
//! backed by `ndarray`,
//! and [`Native`],
//! backed by `Vec` and a row-major [`DenseMatrix`].
//!
//! # Examples
//!
//! ```
//! use descent_linalg::{Ndarray, VectorAlgebra};
//!
//! type B = Ndarray<f64>;
//!
//! let x = B::from_vec(vec![1.0, 2.0]);
//! let mut y = B::from_vec(vec![3.0, 4.0]);
//! B::axpy(2.0, &x, &mut y);
//! assert_eq!(B::to_vec(&y), vec![5.0, 8.0]);
//! assert_eq!(B::dot(&x, &y), 21.0);
//! ```

mod native;
mod ndarray_backend;

use std::{
    fmt::{Debug, Display},
    iter::Sum,
};

use ndarray::{LinalgScalar, ScalarOperand};
use num_traits::{AsPrimitive, Float, One, Zero};

pub use self::{
    native::{DenseMatrix, Native},
    ndarray_backend::Ndarray,
};

/// A real number usable by optimizers.
pub trait Scalar:
    Float + LinalgScalar + ScalarOperand + Sum + Debug + Display + Send + Sync + 'static
{
    /// Return `x` as this type.
    ///
    /// Used for literal constants,
    /// like `0.5`.
    fn lit(x: f64) -> Self;
}

impl<A> Scalar for A
where
    A: Float + LinalgScalar + ScalarOperand + Sum + Debug + Display + Send + Sync + 'static,
    f64: AsPrimitive<A>,
{
    fn lit(x: f64) -> Self {
        x.as_()
    }
}

/// Primitive vector and matrix operations.
///
/// Matrices are square
/// and treated as symmetric
/// by [`VectorAlgebra::symv`]
/// and the rank updates.
/// All operations assume compatible dimensions;
/// callers are responsible for checking lengths.
///
/// Backends are marker types,
/// so optimizers generic over a backend
/// can derive `Clone` and `Debug`.
pub trait VectorAlgebra: Clone + Debug {
    /// Element of vectors and matrices.
    type Scalar: Scalar;

    /// A column-vector.
    type Vector: Clone + Debug;

    /// A dense square matrix.
    type Matrix: Clone + Debug;

    /// Return a vector of `n` zeros.
    fn create_vector(n: usize) -> Self::Vector;

    /// Return a `rows` by `cols` matrix of zeros.
    fn create_matrix(rows: usize, cols: usize) -> Self::Matrix;

    /// Return a vector from its elements.
    fn from_vec(xs: Vec<Self::Scalar>) -> Self::Vector;

    /// Return the elements of a vector.
    fn to_vec(x: &Self::Vector) -> Vec<Self::Scalar>;

    /// Return number of elements in `x`.
    fn len(x: &Self::Vector) -> usize;

    /// Return element `i` of `x`.
    fn get(x: &Self::Vector, i: usize) -> Self::Scalar;

    /// Set element `i` of `x` to `value`.
    fn set(x: &mut Self::Vector, i: usize, value: Self::Scalar);

    /// `y = x`.
    fn copy(x: &Self::Vector, y: &mut Self::Vector);

    /// `y = alpha * x + y`.
    fn axpy(alpha: Self::Scalar, x: &Self::Vector, y: &mut Self::Vector);

    /// `x = alpha * x`.
    fn scale(alpha: Self::Scalar, x: &mut Self::Vector);

    /// Return `x^T y`.
    fn dot(x: &Self::Vector, y: &Self::Vector) -> Self::Scalar;

    /// `y = alpha * A x + beta * y`,
    /// for symmetric `A`.
    fn symv(
        alpha: Self::Scalar,
        a: &Self::Matrix,
        x: &Self::Vector,
        beta: Self::Scalar,
        y: &mut Self::Vector,
    );

    /// `A = A + alpha * x x^T`.
    fn rank1_update(alpha: Self::Scalar, x: &Self::Vector, a: &mut Self::Matrix);

    /// `A = A + alpha * (x y^T + y x^T)`.
    fn rank2_update(alpha: Self::Scalar, x: &Self::Vector, y: &Self::Vector, a: &mut Self::Matrix);

    /// `A = value * I`.
    fn set_diagonal(a: &mut Self::Matrix, value: Self::Scalar);

    /// `A = alpha * A`.
    fn scale_matrix(alpha: Self::Scalar, a: &mut Self::Matrix);

    /// Return the Euclidean norm of `x`.
    fn norm(x: &Self::Vector) -> Self::Scalar {
        Self::dot(x, x).sqrt()
    }

    /// Return the largest absolute element of `x`,
    /// or zero for an empty vector.
    fn norm_inf(x: &Self::Vector) -> Self::Scalar {
        Self::to_vec(x)
            .into_iter()
            .map(Float::abs)
            .fold(Self::Scalar::zero(), Float::max)
    }

    /// Return whether every element of `x` is finite.
    fn is_finite(x: &Self::Vector) -> bool {
        Self::to_vec(x).into_iter().all(Float::is_finite)
    }

    /// Return `x - y`.
    fn difference(x: &Self::Vector, y: &Self::Vector) -> Self::Vector {
        let mut z = x.clone();
        Self::axpy(-Self::Scalar::one(), y, &mut z);
        z
    }

    /// Return `-x`.
    fn negated(x: &Self::Vector) -> Self::Vector {
        let mut z = x.clone();
        Self::scale(-Self::Scalar::one(), &mut z);
        z
    }

    /// Return `x + alpha * d`.
    fn moved(x: &Self::Vector, alpha: Self::Scalar, d: &Self::Vector) -> Self::Vector {
        let mut z = x.clone();
        Self::axpy(alpha, d, &mut z);
        z
    }
}
