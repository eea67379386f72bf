#![allow(unused_macros)]
#![allow(unused_imports)]

//! Macros for implementing bounded number types.
//!
//! A bounded type is a newtype over a number
//! implementing `num_traits::bounds::LowerBounded`
//! and optionally `num_traits::bounds::UpperBounded`.
//! The macros here derive a checked constructor,
//! an error type for invalid values,
//! and conversions back into the inner value.
//!
//! Types may be generic over their inner value,
//! `Foo<A: Bound>`,
//! or concrete,
//! `Foo(f64)`.

pub use paste;
pub use thiserror;

/// Derive `new` for a type bounded from below and above.
///
/// Values outside `[min_value(), max_value()]`
/// and values that cannot be compared,
/// like NaN,
/// are rejected.
#[macro_export]
macro_rules! derive_new_from_bounded {
    ( $type:ident < $a:ident : $bound:ident > ) => {
        $crate::_derive_new!($type<$a: $bound>, $a, lower_upper);
    };
    ( $type:ident ( $inner:ty ) ) => {
        $crate::_derive_new!($type, $inner, lower_upper);
    };
}

/// Derive `new` for a type bounded from below.
///
/// Values below `min_value()`
/// and values that cannot be compared,
/// like NaN,
/// are rejected.
#[macro_export]
macro_rules! derive_new_from_lower_bounded {
    ( $type:ident < $a:ident : $bound:ident > ) => {
        $crate::_derive_new!($type<$a: $bound>, $a, lower);
    };
    ( $type:ident ( $inner:ty ) ) => {
        $crate::_derive_new!($type, $inner, lower);
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! _derive_new {
    ( $type:ident $( < $a:ident : $bound:ident > )?, $inner:ty, lower ) => {
        $crate::paste::paste! {
            #[doc = "Error returned when '" $type "' is given an invalid value."]
            #[derive(Clone, Copy, Debug, $crate::thiserror::Error, PartialEq)]
            pub enum [<Invalid $type Error>] $(< $a : $bound >)? {
                /// Value cannot be compared to its bounds.
                #[error("{0} is incomparable")]
                Incomparable($inner),
                /// Value is below lower bound.
                #[error("{0} is below lower bound ({})", < $type $(< $a >)? > ::min_value())]
                TooLow($inner),
            }

            impl $(< $a : $bound >)? $type $(< $a >)? {
                #[doc = "Return a new '" $type "' if given a valid value."]
                pub fn new(value: $inner) -> Result<Self, [<Invalid $type Error>] $(< $a >)?> {
                    match Self(value).partial_cmp(&Self::min_value()) {
                        None => Err([<Invalid $type Error>]::Incomparable(value)),
                        Some(std::cmp::Ordering::Less) => Err([<Invalid $type Error>]::TooLow(value)),
                        Some(_) => Ok(Self(value)),
                    }
                }
            }
        }
    };
    ( $type:ident $( < $a:ident : $bound:ident > )?, $inner:ty, lower_upper ) => {
        $crate::paste::paste! {
            #[doc = "Error returned when '" $type "' is given an invalid value."]
            #[derive(Clone, Copy, Debug, $crate::thiserror::Error, PartialEq)]
            pub enum [<Invalid $type Error>] $(< $a : $bound >)? {
                /// Value cannot be compared to its bounds.
                #[error("{0} is incomparable")]
                Incomparable($inner),
                /// Value is below lower bound.
                #[error("{0} is below lower bound ({})", < $type $(< $a >)? > ::min_value())]
                TooLow($inner),
                /// Value is above upper bound.
                #[error("{0} is above upper bound ({})", < $type $(< $a >)? > ::max_value())]
                TooHigh($inner),
            }

            impl $(< $a : $bound >)? $type $(< $a >)? {
                #[doc = "Return a new '" $type "' if given a valid value."]
                pub fn new(value: $inner) -> Result<Self, [<Invalid $type Error>] $(< $a >)?> {
                    match (
                        Self(value).partial_cmp(&Self::min_value()),
                        Self(value).partial_cmp(&Self::max_value()),
                    ) {
                        (None, _) | (_, None) => Err([<Invalid $type Error>]::Incomparable(value)),
                        (Some(std::cmp::Ordering::Less), _) => Err([<Invalid $type Error>]::TooLow(value)),
                        (_, Some(std::cmp::Ordering::Greater)) => Err([<Invalid $type Error>]::TooHigh(value)),
                        _ => Ok(Self(value)),
                    }
                }
            }
        }
    };
}

/// Derive `TryFrom<inner>` by way of `new`.
///
/// Only concrete types are supported,
/// `impl<A> TryFrom<A> for Foo<A>` overlaps the blanket `TryFrom` impl.
#[macro_export]
macro_rules! derive_try_from_inner {
    ( $type:ident ( $inner:ty ) ) => {
        $crate::paste::paste! {
            impl core::convert::TryFrom<$inner> for $type {
                type Error = [<Invalid $type Error>];

                fn try_from(value: $inner) -> Result<Self, Self::Error> {
                    $type::new(value)
                }
            }
        }
    };
}

/// Derive `into_inner`,
/// unwrapping a bounded type.
#[macro_export]
macro_rules! derive_into_inner {
    ( $type:ident ( $inner:ty ) ) => {
        $crate::paste::paste! {
            impl $type {
                #[doc = "Unwrap '" $type "' into inner value."]
                pub fn into_inner(self) -> $inner {
                    self.0
                }
            }
        }
    };
    ( $type:ident < $a:ident > ) => {
        $crate::paste::paste! {
            impl< $a > $type< $a > {
                #[doc = "Unwrap '" $type "' into inner value."]
                pub fn into_inner(self) -> $a {
                    self.0
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use num_traits::bounds::{LowerBounded, UpperBounded};

    #[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
    struct Unit(f64);

    impl std::fmt::Display for Unit {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            self.0.fmt(f)
        }
    }

    impl LowerBounded for Unit {
        fn min_value() -> Self {
            Self(0.0)
        }
    }

    impl UpperBounded for Unit {
        fn max_value() -> Self {
            Self(1.0)
        }
    }

    derive_new_from_bounded!(Unit(f64));
    derive_into_inner!(Unit(f64));
    derive_try_from_inner!(Unit(f64));

    #[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Eq, Ord)]
    struct AtLeastTwo(usize);

    impl std::fmt::Display for AtLeastTwo {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            self.0.fmt(f)
        }
    }

    impl LowerBounded for AtLeastTwo {
        fn min_value() -> Self {
            Self(2)
        }
    }

    derive_new_from_lower_bounded!(AtLeastTwo(usize));
    derive_into_inner!(AtLeastTwo(usize));

    #[test]
    fn bounded_new_should_accept_values_within_bounds() {
        assert_eq!(Unit::new(0.5).map(Unit::into_inner), Ok(0.5));
        assert_eq!(Unit::new(0.0).map(Unit::into_inner), Ok(0.0));
        assert_eq!(Unit::new(1.0).map(Unit::into_inner), Ok(1.0));
    }

    #[test]
    fn bounded_new_should_reject_values_outside_bounds() {
        assert_eq!(Unit::new(-0.1), Err(InvalidUnitError::TooLow(-0.1)));
        assert_eq!(Unit::new(1.1), Err(InvalidUnitError::TooHigh(1.1)));
        assert!(matches!(
            Unit::new(f64::NAN),
            Err(InvalidUnitError::Incomparable(_))
        ));
        assert!(Unit::try_from(2.0).is_err());
    }

    #[test]
    fn lower_bounded_new_should_reject_values_below_bound() {
        assert_eq!(AtLeastTwo::new(1), Err(InvalidAtLeastTwoError::TooLow(1)));
        assert_eq!(AtLeastTwo::new(2).map(AtLeastTwo::into_inner), Ok(2));
        assert_eq!(
            AtLeastTwo::new(1).unwrap_err().to_string(),
            "1 is below lower bound (2)"
        );
    }
}
