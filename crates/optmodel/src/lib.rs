//! Optmodel - In-memory registry for optimization models
//!
//! This crate provides the builder-style registry that stores a model's
//! variables, typed constraints, and objective:
//! - Stable, globally unique handles that are never reused
//! - One dense ordered partition per supported function/set pair, with
//!   O(1) handle access through a location index
//! - Cascading deletion when a variable disappears
//! - Lazy, invalidation-aware name lookup
//! - An immediate add path and a two-phase allocate/load path for bulk
//!   copies, producing identical final state

mod alloc;
pub mod model;
mod names;
pub mod objective;
mod store;

#[cfg(test)]
mod tests;

pub use model::{ModelRegistry, ModelRegistryBuilder};
pub use objective::{ObjectiveSense, ScalarFunction};
pub use store::ConstraintKind;

pub use optmodel_core::{ConstraintHandle, HandleKind, ModelError, Result, VariableHandle};
