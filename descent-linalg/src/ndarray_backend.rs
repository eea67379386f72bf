use std::marker::PhantomData;

use ndarray::{linalg::general_mat_vec_mul, Array1, Array2, Zip};

use crate::{Scalar, VectorAlgebra};

/// Backend using `ndarray`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ndarray<A>(PhantomData<A>);

impl<A> VectorAlgebra for Ndarray<A>
where
    A: Scalar,
{
    type Scalar = A;
    type Vector = Array1<A>;
    type Matrix = Array2<A>;

    fn create_vector(n: usize) -> Self::Vector {
        Array1::zeros(n)
    }

    fn create_matrix(rows: usize, cols: usize) -> Self::Matrix {
        Array2::zeros((rows, cols))
    }

    fn from_vec(xs: Vec<A>) -> Self::Vector {
        Array1::from(xs)
    }

    fn to_vec(x: &Self::Vector) -> Vec<A> {
        x.to_vec()
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
        y.assign(x);
    }

    fn axpy(alpha: A, x: &Self::Vector, y: &mut Self::Vector) {
        y.scaled_add(alpha, x);
    }

    fn scale(alpha: A, x: &mut Self::Vector) {
        x.mapv_inplace(|x| alpha * x);
    }

    fn dot(x: &Self::Vector, y: &Self::Vector) -> A {
        x.dot(y)
    }

    fn symv(alpha: A, a: &Self::Matrix, x: &Self::Vector, beta: A, y: &mut Self::Vector) {
        if beta == A::zero() {
            y.fill(A::zero());
        }
        general_mat_vec_mul(alpha, a, x, beta, y);
    }

    fn rank1_update(alpha: A, x: &Self::Vector, a: &mut Self::Matrix) {
        Zip::indexed(a).for_each(|(i, j), a| *a = *a + alpha * x[i] * x[j]);
    }

    fn rank2_update(alpha: A, x: &Self::Vector, y: &Self::Vector, a: &mut Self::Matrix) {
        Zip::indexed(a).for_each(|(i, j), a| *a = *a + alpha * (x[i] * y[j] + y[i] * x[j]));
    }

    fn set_diagonal(a: &mut Self::Matrix, value: A) {
        a.fill(A::zero());
        a.diag_mut().fill(value);
    }

    fn scale_matrix(alpha: A, a: &mut Self::Matrix) {
        a.mapv_inplace(|a| alpha * a);
    }
}
