//! Set value types.
//!
//! A constraint requires its function's value to lie in a set. Scalar
//! sets have dimension 1 and ignore resizing; vector sets carry their
//! dimension and are resized when the paired function's output arity
//! shrinks (variable deletion).

use std::fmt;

/// Operations the registry needs from a set value.
pub trait Set: Clone + PartialEq + fmt::Debug {
    /// Stable name of this set kind, used in errors and kind listings.
    fn kind_name() -> &'static str;

    /// Output dimension the set constrains. Scalar sets return 1.
    fn dimension(&self) -> usize;

    /// Adjusts a vector set to a new output dimension.
    ///
    /// Scalar sets ignore the call.
    fn resize(&mut self, dimension: usize);
}

macro_rules! scalar_set {
    ($(#[$doc:meta])* $name:ident { $(#[$fdoc:meta])* $field:ident }) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default, PartialEq)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name {
            $(#[$fdoc])*
            pub $field: f64,
        }

        impl $name {
            /// Creates the set with the given bound.
            pub fn new($field: f64) -> Self {
                Self { $field }
            }
        }

        impl Set for $name {
            fn kind_name() -> &'static str {
                stringify!($name)
            }

            fn dimension(&self) -> usize {
                1
            }

            fn resize(&mut self, _dimension: usize) {}
        }
    };
}

scalar_set!(
    /// The half-line `(-inf, upper]`.
    LessThan {
        /// Inclusive upper bound.
        upper
    }
);

scalar_set!(
    /// The half-line `[lower, inf)`.
    GreaterThan {
        /// Inclusive lower bound.
        lower
    }
);

scalar_set!(
    /// The single point `{value}`.
    EqualTo {
        /// The fixed value.
        value
    }
);

/// The interval `[lower, upper]`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Interval {
    /// Inclusive lower bound.
    pub lower: f64,
    /// Inclusive upper bound.
    pub upper: f64,
}

impl Interval {
    /// Creates the interval `[lower, upper]`.
    pub fn new(lower: f64, upper: f64) -> Self {
        Interval { lower, upper }
    }
}

impl Set for Interval {
    fn kind_name() -> &'static str {
        "Interval"
    }

    fn dimension(&self) -> usize {
        1
    }

    fn resize(&mut self, _dimension: usize) {}
}

macro_rules! vector_set {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name {
            /// Output dimension the set constrains.
            pub dimension: usize,
        }

        impl $name {
            /// Creates the set with the given dimension.
            pub fn new(dimension: usize) -> Self {
                Self { dimension }
            }
        }

        impl Set for $name {
            fn kind_name() -> &'static str {
                stringify!($name)
            }

            fn dimension(&self) -> usize {
                self.dimension
            }

            fn resize(&mut self, dimension: usize) {
                self.dimension = dimension;
            }
        }
    };
}

vector_set!(
    /// The nonnegative orthant of the given dimension.
    Nonnegatives
);

vector_set!(
    /// The nonpositive orthant of the given dimension.
    Nonpositives
);

vector_set!(
    /// The origin of the given dimension.
    Zeros
);
