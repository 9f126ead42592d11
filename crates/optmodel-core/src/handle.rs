//! Opaque handles for variables and constraints.
//!
//! Handle values are assigned by the registry's allocator, start at 1,
//! strictly increase, and are never reused. Constraint handles of every
//! function/set pair draw from one shared counter, so equality only has
//! to compare the integer value regardless of the phantom kind.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Handle to a decision variable.
///
/// # Example
///
/// ```
/// use optmodel_core::VariableHandle;
///
/// let v = VariableHandle::from_raw(1);
/// assert_eq!(v.raw(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VariableHandle(u64);

impl VariableHandle {
    /// Reconstructs a handle from its raw value.
    ///
    /// Intended for the registry and bulk-copy collaborators; a value
    /// the registry never issued fails every validity check.
    pub fn from_raw(value: u64) -> Self {
        VariableHandle(value)
    }

    /// Returns the raw handle value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for VariableHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Handle to a constraint of function kind `F` in set kind `S`.
///
/// Carries the kind as phantom type information only; the value is drawn
/// from a single counter shared by all kinds, so two handles are equal
/// iff their values are equal, even across different `(F, S)` pairs.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(bound = ""))]
pub struct ConstraintHandle<F, S> {
    value: u64,
    _kind: PhantomData<fn() -> (F, S)>,
}

impl<F, S> ConstraintHandle<F, S> {
    /// Reconstructs a handle from its raw value.
    ///
    /// Intended for the registry and bulk-copy collaborators; a value
    /// the registry never issued fails every validity check.
    pub fn from_raw(value: u64) -> Self {
        ConstraintHandle {
            value,
            _kind: PhantomData,
        }
    }

    /// Returns the raw handle value.
    pub fn raw(&self) -> u64 {
        self.value
    }
}

// Manual impls: derives would bound F and S, but the handle is Copy,
// comparable and hashable no matter what the phantom parameters are.

impl<F, S> Clone for ConstraintHandle<F, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<F, S> Copy for ConstraintHandle<F, S> {}

impl<F, S, F2, S2> PartialEq<ConstraintHandle<F2, S2>> for ConstraintHandle<F, S> {
    fn eq(&self, other: &ConstraintHandle<F2, S2>) -> bool {
        self.value == other.value
    }
}

impl<F, S> Eq for ConstraintHandle<F, S> {}

impl<F, S> Hash for ConstraintHandle<F, S> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<F, S> PartialOrd for ConstraintHandle<F, S> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<F, S> Ord for ConstraintHandle<F, S> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

impl<F, S> fmt::Debug for ConstraintHandle<F, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConstraintHandle({})", self.value)
    }
}

impl<F, S> fmt::Display for ConstraintHandle<F, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::{ScalarAffine, VariableRef};
    use crate::set::{GreaterThan, LessThan};

    #[test]
    fn test_variable_handle_roundtrip() {
        let v = VariableHandle::from_raw(42);
        assert_eq!(v.raw(), 42);
        assert_eq!(v, VariableHandle::from_raw(42));
        assert!(v < VariableHandle::from_raw(43));
    }

    #[test]
    fn test_constraint_handle_equality_ignores_kind() {
        let a: ConstraintHandle<ScalarAffine, LessThan> = ConstraintHandle::from_raw(3);
        let b: ConstraintHandle<VariableRef, GreaterThan> = ConstraintHandle::from_raw(3);
        let c: ConstraintHandle<ScalarAffine, LessThan> = ConstraintHandle::from_raw(4);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_constraint_handle_is_copy_and_ordered() {
        let a: ConstraintHandle<ScalarAffine, LessThan> = ConstraintHandle::from_raw(1);
        let b = a;
        assert_eq!(a, b);
        assert!(a < ConstraintHandle::<ScalarAffine, LessThan>::from_raw(2));
    }
}
