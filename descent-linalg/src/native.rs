use std::marker::PhantomData;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Scalar, VectorAlgebra};

/// Backend using `Vec` for vectors
/// and [`DenseMatrix`] for matrices.
#[derive(Clone, Copy, Debug, Default)]
pub struct Native<A>(PhantomData<A>);

/// A dense row-major matrix.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DenseMatrix<A> {
    rows: usize,
    cols: usize,
    data: Vec<A>,
}

impl<A> DenseMatrix<A> {
    /// Return number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Return number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Return element at row `i` and column `j`.
    pub fn get(&self, i: usize, j: usize) -> A
    where
        A: Copy,
    {
        self.data[i * self.cols + j]
    }

    fn row(&self, i: usize) -> &[A] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }
}

impl<A> VectorAlgebra for Native<A>
where
    A: Scalar,
{
    type Scalar = A;
    type Vector = Vec<A>;
    type Matrix = DenseMatrix<A>;

    fn create_vector(n: usize) -> Self::Vector {
        vec![A::zero(); n]
    }

    fn create_matrix(rows: usize, cols: usize) -> Self::Matrix {
        DenseMatrix {
            rows,
            cols,
            data: vec![A::zero(); rows * cols],
        }
    }

    fn from_vec(xs: Vec<A>) -> Self::Vector {
        xs
    }

    fn to_vec(x: &Self::Vector) -> Vec<A> {
        x.clone()
    }

    fn len(x: &Self::Vector) -> usize {
        x.len()
    }

    fn get(x: &Self::Vector, i: usize) -> A {
        x[i]
    }

    fn set(x: &mut Self::Vector, i: usize, value: A) {
        x[i] = value;
    }

    fn copy(x: &Self::Vector, y: &mut Self::Vector) {
        y.clone_from(x);
    }

    fn axpy(alpha: A, x: &Self::Vector, y: &mut Self::Vector) {
        debug_assert_eq!(x.len(), y.len());
        y.iter_mut().zip(x).for_each(|(y, x)| *y = *y + alpha * *x);
    }

    fn scale(alpha: A, x: &mut Self::Vector) {
        x.iter_mut().for_each(|x| *x = alpha * *x);
    }

    fn dot(x: &Self::Vector, y: &Self::Vector) -> A {
        debug_assert_eq!(x.len(), y.len());
        x.iter().zip(y).map(|(x, y)| *x * *y).sum()
    }

    fn symv(alpha: A, a: &Self::Matrix, x: &Self::Vector, beta: A, y: &mut Self::Vector) {
        debug_assert_eq!(a.cols, x.len());
        debug_assert_eq!(a.rows, y.len());
        for (i, y) in y.iter_mut().enumerate() {
            let ax: A = a.row(i).iter().zip(x).map(|(a, x)| *a * *x).sum();
            // `beta * y` would propagate NaN from an uninitialized `y`.
            *y = if beta == A::zero() {
                alpha * ax
            } else {
                alpha * ax + beta * *y
            };
        }
    }

    fn rank1_update(alpha: A, x: &Self::Vector, a: &mut Self::Matrix) {
        let cols = a.cols;
        for (k, a) in a.data.iter_mut().enumerate() {
            let (i, j) = (k / cols, k % cols);
            *a = *a + alpha * x[i] * x[j];
        }
    }

    fn rank2_update(alpha: A, x: &Self::Vector, y: &Self::Vector, a: &mut Self::Matrix) {
        let cols = a.cols;
        for (k, a) in a.data.iter_mut().enumerate() {
            let (i, j) = (k / cols, k % cols);
            *a = *a + alpha * (x[i] * y[j] + y[i] * x[j]);
        }
    }

    fn set_diagonal(a: &mut Self::Matrix, value: A) {
        let cols = a.cols;
        for (k, a) in a.data.iter_mut().enumerate() {
            *a = if k / cols == k % cols {
                value
            } else {
                A::zero()
            };
        }
    }

    fn scale_matrix(alpha: A, a: &mut Self::Matrix) {
        a.data.iter_mut().for_each(|a| *a = alpha * *a);
    }
}
