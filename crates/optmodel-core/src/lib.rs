//! Optmodel Core - Handle, function and set types for the model registry
//!
//! This crate provides the value-level vocabulary the registry stores:
//! - Opaque variable and constraint handles
//! - Function types (single-variable, affine, quadratic, vector-valued)
//!   and the `Function` trait the registry drives them through
//! - Set types and the `Set` trait
//! - Incremental modification deltas
//! - The shared error type

pub mod error;
pub mod function;
pub mod handle;
pub mod modification;
pub mod set;

pub use error::{HandleKind, ModelError, Result};
pub use function::{
    AffineTerm, Function, QuadraticTerm, ScalarAffine, ScalarQuadratic, VariableRef, VectorAffine,
    VectorAffineTerm, VectorOfVariables,
};
pub use handle::{ConstraintHandle, VariableHandle};
pub use modification::{ScalarChange, VectorChange};
pub use set::{EqualTo, GreaterThan, Interval, LessThan, Nonnegatives, Nonpositives, Set, Zeros};
