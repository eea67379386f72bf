use derive_getters::Getters;
use descent_linalg::VectorAlgebra;
use num_traits::Zero;

/// Iterates of a running minimization.
///
/// Previous iterate fields are only written by [`OptimizationState::advance`].
#[derive(Clone, Debug, Getters)]
pub struct OptimizationState<B>
where
    B: VectorAlgebra,
{
    /// Current point.
    x: B::Vector,
    /// Gradient at the current point.
    g: B::Vector,
    /// Value of the current point.
    f: B::Scalar,
    /// Direction of the current iteration.
    p: B::Vector,
    /// Last accepted step size.
    step_size: B::Scalar,
    /// Accepted steps so far.
    iteration: usize,
    #[getter(skip)]
    previous: Option<Previous<B>>,
}

#[derive(Clone, Debug)]
struct Previous<B>
where
    B: VectorAlgebra,
{
    x: B::Vector,
    g: B::Vector,
    f: B::Scalar,
}

impl<B> OptimizationState<B>
where
    B: VectorAlgebra,
{
    /// Return a state at iteration zero.
    ///
    /// The direction starts as steepest descent.
    pub fn new(x: B::Vector, f: B::Scalar, g: B::Vector) -> Self {
        Self {
            p: B::negated(&g),
            step_size: B::Scalar::zero(),
            iteration: 0,
            previous: None,
            x,
            g,
            f,
        }
    }

    /// Return number of elements in each vector.
    pub fn len(&self) -> usize {
        B::len(&self.x)
    }

    /// Return whether vectors have no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the previous point,
    /// if at least one step was accepted.
    pub fn xm1(&self) -> Option<&B::Vector> {
        self.previous.as_ref().map(|p| &p.x)
    }

    /// Return the gradient at the previous point,
    /// if at least one step was accepted.
    pub fn gm1(&self) -> Option<&B::Vector> {
        self.previous.as_ref().map(|p| &p.g)
    }

    /// Return the value of the previous point,
    /// if at least one step was accepted.
    pub fn fm1(&self) -> Option<B::Scalar> {
        self.previous.as_ref().map(|p| p.f)
    }

    /// Move the current point to previous
    /// and accept a new point.
    pub fn advance(&mut self, x: B::Vector, f: B::Scalar, g: B::Vector) {
        debug_assert_eq!(B::len(&x), self.len());
        debug_assert_eq!(B::len(&g), self.len());
        let x = std::mem::replace(&mut self.x, x);
        let g = std::mem::replace(&mut self.g, g);
        let f = std::mem::replace(&mut self.f, f);
        self.previous = Some(Previous { x, g, f });
        self.iteration += 1;
    }

    /// Record the direction of the current iteration.
    pub fn set_direction(&mut self, p: B::Vector) {
        self.p = p;
    }

    /// Record the accepted step size of the current iteration.
    pub fn set_step_size(&mut self, step_size: B::Scalar) {
        self.step_size = step_size;
    }

    /// Return `g^T p`,
    /// negative for a descent direction.
    pub fn directional_derivative(&self) -> B::Scalar {
        B::dot(&self.g, &self.p)
    }
}

#[cfg(test)]
mod tests {
    use descent_linalg::Native;

    use super::*;

    type B = Native<f64>;

    #[test]
    fn new_state_should_have_no_previous_iterate() {
        let state = OptimizationState::<B>::new(vec![1.0, 2.0], 5.0, vec![2.0, 4.0]);
        assert_eq!(*state.iteration(), 0);
        assert_eq!(state.xm1(), None);
        assert_eq!(state.gm1(), None);
        assert_eq!(state.fm1(), None);
        assert_eq!(state.p(), &vec![-2.0, -4.0]);
    }

    #[test]
    fn advance_should_shift_current_into_previous() {
        let mut state = OptimizationState::<B>::new(vec![1.0, 2.0], 5.0, vec![2.0, 4.0]);
        state.advance(vec![0.5, 1.0], 1.25, vec![1.0, 2.0]);
        assert_eq!(*state.iteration(), 1);
        assert_eq!(state.x(), &vec![0.5, 1.0]);
        assert_eq!(*state.f(), 1.25);
        assert_eq!(state.g(), &vec![1.0, 2.0]);
        assert_eq!(state.xm1(), Some(&vec![1.0, 2.0]));
        assert_eq!(state.gm1(), Some(&vec![2.0, 4.0]));
        assert_eq!(state.fm1(), Some(5.0));

        state.advance(vec![0.0, 0.0], 0.0, vec![0.0, 0.0]);
        assert_eq!(*state.iteration(), 2);
        assert_eq!(state.xm1(), Some(&vec![0.5, 1.0]));
    }
}
