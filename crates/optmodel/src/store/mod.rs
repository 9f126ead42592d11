//! Typed constraint storage.
//!
//! Each supported function/set pair gets one dense, ordered
//! [`Partition`]. Partitions are held behind the object-safe
//! [`ErasedPartition`] trait so registry-wide fan-outs (variable
//! deletion, kind listings) can walk them uniformly, and recovered by
//! `Any` downcast at typed call sites.

mod location;

pub(crate) use location::LocationIndex;

use std::any::{Any, TypeId};
use std::fmt;

use optmodel_core::error::{HandleKind, ModelError, Result};
use optmodel_core::{ConstraintHandle, Function, Set, VariableHandle};

/// Identifies one function/set pair supported by a registry.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConstraintKind {
    function: TypeId,
    set: TypeId,
    function_name: &'static str,
    set_name: &'static str,
}

impl ConstraintKind {
    /// The kind value for the pair `(F, S)`.
    pub fn of<F: Function + 'static, S: Set + 'static>() -> Self {
        ConstraintKind {
            function: TypeId::of::<F>(),
            set: TypeId::of::<S>(),
            function_name: F::kind_name(),
            set_name: S::kind_name(),
        }
    }

    /// Kind name of the function type.
    pub fn function_name(&self) -> &'static str {
        self.function_name
    }

    /// Kind name of the set type.
    pub fn set_name(&self) -> &'static str {
        self.set_name
    }
}

impl fmt::Debug for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-in-{}", self.function_name, self.set_name)
    }
}

/// One stored constraint: its handle plus the function and set values.
///
/// The handle is duplicated here rather than implied by position so a
/// shifted entry can be mapped back to the location-index slot that
/// needs fixing up.
#[derive(Debug, Clone)]
struct ConstraintEntry<F, S> {
    handle: ConstraintHandle<F, S>,
    function: F,
    set: S,
}

/// Dense, ordered sequence of all live constraints of one pair.
#[derive(Debug)]
pub(crate) struct Partition<F, S> {
    entries: Vec<ConstraintEntry<F, S>>,
}

impl<F: Function + 'static, S: Set + 'static> Partition<F, S> {
    pub(crate) fn new() -> Self {
        Partition {
            entries: Vec::new(),
        }
    }

    fn invalid(raw: u64) -> ModelError {
        ModelError::InvalidIndex {
            kind: HandleKind::Constraint,
            value: raw,
        }
    }

    /// Appends an entry and records its 1-based position.
    pub(crate) fn push(
        &mut self,
        handle: ConstraintHandle<F, S>,
        function: F,
        set: S,
        locations: &mut LocationIndex,
    ) {
        self.entries.push(ConstraintEntry {
            handle,
            function,
            set,
        });
        locations.record(handle.raw(), self.entries.len());
    }

    fn slot(
        &self,
        handle: ConstraintHandle<F, S>,
        locations: &LocationIndex,
    ) -> Result<&ConstraintEntry<F, S>> {
        let raw = handle.raw();
        let position = locations.position(raw);
        if position == 0 || position > self.entries.len() {
            return Err(Self::invalid(raw));
        }
        let entry = &self.entries[position - 1];
        if entry.handle.raw() != raw {
            return Err(ModelError::Internal(format!(
                "location index points constraint {raw} at a slot holding {}",
                entry.handle.raw()
            )));
        }
        Ok(entry)
    }

    fn slot_mut(
        &mut self,
        handle: ConstraintHandle<F, S>,
        locations: &LocationIndex,
    ) -> Result<&mut ConstraintEntry<F, S>> {
        let raw = handle.raw();
        let position = locations.position(raw);
        if position == 0 || position > self.entries.len() {
            return Err(Self::invalid(raw));
        }
        let stored = self.entries[position - 1].handle.raw();
        if stored != raw {
            return Err(ModelError::Internal(format!(
                "location index points constraint {raw} at a slot holding {stored}"
            )));
        }
        Ok(&mut self.entries[position - 1])
    }

    pub(crate) fn function(
        &self,
        handle: ConstraintHandle<F, S>,
        locations: &LocationIndex,
    ) -> Result<&F> {
        Ok(&self.slot(handle, locations)?.function)
    }

    pub(crate) fn set(
        &self,
        handle: ConstraintHandle<F, S>,
        locations: &LocationIndex,
    ) -> Result<&S> {
        Ok(&self.slot(handle, locations)?.set)
    }

    pub(crate) fn set_function(
        &mut self,
        handle: ConstraintHandle<F, S>,
        function: F,
        locations: &LocationIndex,
    ) -> Result<()> {
        self.slot_mut(handle, locations)?.function = function;
        Ok(())
    }

    pub(crate) fn set_set(
        &mut self,
        handle: ConstraintHandle<F, S>,
        set: S,
        locations: &LocationIndex,
    ) -> Result<()> {
        self.slot_mut(handle, locations)?.set = set;
        Ok(())
    }

    pub(crate) fn modify(
        &mut self,
        handle: ConstraintHandle<F, S>,
        change: &F::Change,
        locations: &LocationIndex,
    ) -> Result<()> {
        self.slot_mut(handle, locations)?.function.apply(change)
    }

    /// Replaces a reserved placeholder body during the load phase of
    /// the two-phase protocol.
    pub(crate) fn load(
        &mut self,
        handle: ConstraintHandle<F, S>,
        function: F,
        set: S,
        locations: &LocationIndex,
    ) -> Result<()> {
        let entry = self.slot_mut(handle, locations)?;
        entry.function = function;
        entry.set = set;
        Ok(())
    }

    /// Removes the entry, shifting survivors left and renumbering their
    /// location slots, then tombstones the handle. Relative order of
    /// survivors is preserved.
    pub(crate) fn delete(
        &mut self,
        handle: ConstraintHandle<F, S>,
        locations: &mut LocationIndex,
    ) -> Result<()> {
        let raw = handle.raw();
        // Validates position and stored-handle agreement up front.
        self.slot(handle, locations)?;
        let position = locations.position(raw);
        self.entries.remove(position - 1);
        for (i, entry) in self.entries.iter().enumerate().skip(position - 1) {
            locations.record(entry.handle.raw(), i + 1);
        }
        locations.clear(raw);
        Ok(())
    }

    pub(crate) fn handles(&self) -> Vec<ConstraintHandle<F, S>> {
        self.entries.iter().map(|e| e.handle).collect()
    }

    pub(crate) fn is_valid(
        &self,
        handle: ConstraintHandle<F, S>,
        locations: &LocationIndex,
        high_water: u64,
    ) -> bool {
        let raw = handle.raw();
        if raw == 0 || raw > high_water {
            return false;
        }
        let position = locations.position(raw);
        if position == 0 || position > self.entries.len() {
            return false;
        }
        self.entries[position - 1].handle.raw() == raw
    }
}

/// Object-safe view of a partition for registry-wide fan-outs.
pub(crate) trait ErasedPartition {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn len(&self) -> usize;
    fn kind(&self) -> ConstraintKind;
    /// Rewrites every entry without `variable` (resizing sets whose
    /// function lost output rows) and returns the raw values of
    /// single-variable projections on it: the cascade victims, to be
    /// deleted after the rewrite pass.
    fn remove_variable(&mut self, variable: VariableHandle) -> Vec<u64>;
    /// Deletes by raw value; used by the cascade's victim pass.
    fn delete_raw(&mut self, raw: u64, locations: &mut LocationIndex) -> Result<()>;
}

impl<F: Function + 'static, S: Set + 'static> ErasedPartition for Partition<F, S> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn kind(&self) -> ConstraintKind {
        ConstraintKind::of::<F, S>()
    }

    fn remove_variable(&mut self, variable: VariableHandle) -> Vec<u64> {
        let mut victims = Vec::new();
        for entry in &mut self.entries {
            if entry.function.single_variable() == Some(variable) {
                victims.push(entry.handle.raw());
                continue;
            }
            let before = entry.function.output_dimension();
            entry.function.remove_variable(variable);
            let after = entry.function.output_dimension();
            if after < before {
                entry.set.resize(after);
            }
        }
        victims
    }

    fn delete_raw(&mut self, raw: u64, locations: &mut LocationIndex) -> Result<()> {
        self.delete(ConstraintHandle::from_raw(raw), locations)
    }
}
