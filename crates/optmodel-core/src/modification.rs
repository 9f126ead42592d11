//! Incremental modification deltas.
//!
//! A delta declares its target statically: scalar functions accept
//! [`ScalarChange`], vector-valued affine functions accept
//! [`VectorChange`]. Replacing a whole function or set is not a delta;
//! the registry exposes `set_function`/`set_set` for that.

use crate::handle::VariableHandle;

/// Delta applied to a scalar-valued function.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScalarChange {
    /// Replace the constant term.
    Constant(f64),
    /// Replace the coefficient of one variable.
    ///
    /// A coefficient of `0.0` removes the variable's term.
    Coefficient(VariableHandle, f64),
}

/// Delta applied to a vector-valued affine function.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VectorChange {
    /// Replace the constant of each listed output row.
    Constants(Vec<(usize, f64)>),
    /// Replace the coefficient of a variable in each listed output row.
    ///
    /// A coefficient of `0.0` removes that row's term for the variable.
    Coefficients(Vec<(usize, VariableHandle, f64)>),
}
