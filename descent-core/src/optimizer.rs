use blanket::blanket;

/// Running optimizer methods
/// independent of configuration
/// and state.
#[blanket(derive(Ref, Rc, Arc, Mut, Box))]
pub trait Optimizer {
    /// A point in the problem space being optimized.
    type Point;

    /// Value of a point.
    type Value;

    /// Return the best point discovered.
    fn best_point(&self) -> Self::Point;

    /// Return the value of the best point discovered.
    fn best_point_value(&self) -> Self::Value;
}

#[cfg(test)]
mod tests {
    use static_assertions::assert_obj_safe;

    use super::*;

    assert_obj_safe!(Optimizer<Point = (), Value = ()>);

    struct Fixed;

    impl Optimizer for Fixed {
        type Point = Vec<f64>;
        type Value = f64;

        fn best_point(&self) -> Self::Point {
            vec![1.0]
        }

        fn best_point_value(&self) -> Self::Value {
            0.0
        }
    }

    #[test]
    fn optimizers_should_be_usable_through_pointers() {
        fn value_of(o: impl Optimizer<Value = f64>) -> f64 {
            o.best_point_value()
        }

        assert_eq!(value_of(&Fixed), 0.0);
        assert_eq!(value_of(Box::new(Fixed)), 0.0);
        assert_eq!(value_of(std::sync::Arc::new(Fixed)), 0.0);
    }
}
