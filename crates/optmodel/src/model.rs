//! The model registry.

use std::collections::HashMap;
use std::fmt;

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, trace};

use optmodel_core::error::{HandleKind, ModelError, Result};
use optmodel_core::{
    ConstraintHandle, EqualTo, Function, GreaterThan, Interval, LessThan, Nonnegatives,
    Nonpositives, ScalarAffine, ScalarChange, ScalarQuadratic, Set, VariableHandle, VariableRef,
    VectorAffine, VectorOfVariables, Zeros,
};

use crate::alloc::HandleAllocator;
use crate::names::NameCache;
use crate::objective::{Objective, ObjectiveSense, ScalarFunction};
use crate::store::{ConstraintKind, ErasedPartition, LocationIndex, Partition};

/// Configures which function/set pairs a [`ModelRegistry`] stores.
///
/// The pair table is the registry's static configuration: it is fixed
/// when `build` is called and adding a constraint of an unregistered
/// pair fails with [`ModelError::UnsupportedConstraintKind`].
///
/// # Example
///
/// ```
/// use optmodel::ModelRegistry;
/// use optmodel_core::{ScalarAffine, LessThan};
///
/// let mut model = ModelRegistry::builder()
///     .with_constraint_kind::<ScalarAffine, LessThan>()
///     .build();
/// let v = model.add_variable();
/// let c = model
///     .add_constraint(ScalarAffine::from_terms(&[(v, 1.0)]), LessThan::new(4.0))
///     .unwrap();
/// assert!(model.is_valid_constraint(c));
/// ```
#[derive(Default)]
pub struct ModelRegistryBuilder {
    partitions: IndexMap<ConstraintKind, Box<dyn ErasedPartition>>,
}

impl ModelRegistryBuilder {
    /// Creates a builder with no supported pairs.
    pub fn new() -> Self {
        ModelRegistryBuilder::default()
    }

    /// Registers the pair `(F, S)`. Registering a pair twice is a
    /// no-op.
    pub fn with_constraint_kind<F: Function + 'static, S: Set + 'static>(mut self) -> Self {
        self.partitions
            .entry(ConstraintKind::of::<F, S>())
            .or_insert_with(|| Box::new(Partition::<F, S>::new()));
        self
    }

    /// Finalizes the pair table and builds an empty registry.
    pub fn build(self) -> ModelRegistry {
        ModelRegistry {
            allocator: HandleAllocator::new(),
            partitions: self.partitions,
            locations: LocationIndex::new(),
            variables: None,
            objective: Objective::new(),
            variable_names: HashMap::new(),
            variable_reverse: NameCache::new(),
            constraint_names: HashMap::new(),
            constraint_reverse: NameCache::new(),
        }
    }
}

impl fmt::Debug for ModelRegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRegistryBuilder")
            .field("kinds", &self.partitions.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// In-memory registry for an optimization model: variables, typed
/// constraints, and the objective, addressed through stable opaque
/// handles.
///
/// Handles are never reused; deleting an entry invalidates its handle
/// forever. Constraints live in one dense, ordered partition per
/// function/set pair, and a single location index keyed by raw handle
/// value gives O(1) access without a hash map on the hot path.
///
/// The registry is a single-owner builder object: every operation is a
/// bounded synchronous computation on `&self`/`&mut self`, and no
/// operation is retried internally. Variable deletion fans out across
/// every partition and is not atomic on failure; callers must treat a
/// failed deletion as fatal to the model instance.
pub struct ModelRegistry {
    allocator: HandleAllocator,
    partitions: IndexMap<ConstraintKind, Box<dyn ErasedPartition>>,
    locations: LocationIndex,
    /// `None` while no variable has ever been deleted: the live set is
    /// implicitly `1..=high_water`. The first deletion materializes the
    /// explicit set, used for the registry's remaining lifetime.
    variables: Option<IndexSet<VariableHandle>>,
    objective: Objective,
    variable_names: HashMap<VariableHandle, String>,
    variable_reverse: NameCache<VariableHandle>,
    constraint_names: HashMap<u64, String>,
    constraint_reverse: NameCache<u64>,
}

impl ModelRegistry {
    /// Starts configuring a registry.
    pub fn builder() -> ModelRegistryBuilder {
        ModelRegistryBuilder::new()
    }

    /// Builds a registry supporting every built-in function/set pair.
    pub fn with_default_kinds() -> Self {
        ModelRegistry::builder()
            .with_constraint_kind::<VariableRef, LessThan>()
            .with_constraint_kind::<VariableRef, GreaterThan>()
            .with_constraint_kind::<VariableRef, EqualTo>()
            .with_constraint_kind::<VariableRef, Interval>()
            .with_constraint_kind::<ScalarAffine, LessThan>()
            .with_constraint_kind::<ScalarAffine, GreaterThan>()
            .with_constraint_kind::<ScalarAffine, EqualTo>()
            .with_constraint_kind::<ScalarAffine, Interval>()
            .with_constraint_kind::<ScalarQuadratic, LessThan>()
            .with_constraint_kind::<ScalarQuadratic, GreaterThan>()
            .with_constraint_kind::<ScalarQuadratic, EqualTo>()
            .with_constraint_kind::<VectorOfVariables, Nonnegatives>()
            .with_constraint_kind::<VectorOfVariables, Nonpositives>()
            .with_constraint_kind::<VectorOfVariables, Zeros>()
            .with_constraint_kind::<VectorAffine, Nonnegatives>()
            .with_constraint_kind::<VectorAffine, Nonpositives>()
            .with_constraint_kind::<VectorAffine, Zeros>()
            .build()
    }

    fn invalid_variable(handle: VariableHandle) -> ModelError {
        ModelError::InvalidIndex {
            kind: HandleKind::Variable,
            value: handle.raw(),
        }
    }

    fn invalid_constraint(raw: u64) -> ModelError {
        ModelError::InvalidIndex {
            kind: HandleKind::Constraint,
            value: raw,
        }
    }

    fn typed_partition<F: Function + 'static, S: Set + 'static>(&self) -> Option<&Partition<F, S>> {
        self.partitions
            .get(&ConstraintKind::of::<F, S>())
            .and_then(|p| p.as_any().downcast_ref())
    }

    fn typed_partition_mut<F: Function + 'static, S: Set + 'static>(
        &mut self,
    ) -> Option<(&mut Partition<F, S>, &mut LocationIndex)> {
        let locations = &mut self.locations;
        let partition = self
            .partitions
            .get_mut(&ConstraintKind::of::<F, S>())?
            .as_any_mut()
            .downcast_mut()?;
        Some((partition, locations))
    }

    // ------------------------------------------------------------------
    // Variables
    // ------------------------------------------------------------------

    /// Adds a new variable and returns its handle.
    pub fn add_variable(&mut self) -> VariableHandle {
        let handle = self.allocator.new_variable_handle();
        if let Some(live) = &mut self.variables {
            live.insert(handle);
        }
        trace!(variable = handle.raw(), "added variable");
        handle
    }

    /// Adds `count` variables, returning their handles in allocation
    /// order.
    pub fn add_variables(&mut self, count: usize) -> Vec<VariableHandle> {
        (0..count).map(|_| self.add_variable()).collect()
    }

    /// Number of live variables.
    pub fn num_variables(&self) -> usize {
        match &self.variables {
            Some(live) => live.len(),
            None => self.allocator.variable_high_water() as usize,
        }
    }

    /// Live variable handles in creation order.
    pub fn variables(&self) -> Vec<VariableHandle> {
        match &self.variables {
            Some(live) => live.iter().copied().collect(),
            None => (1..=self.allocator.variable_high_water())
                .map(VariableHandle::from_raw)
                .collect(),
        }
    }

    /// True when `handle` was issued by this registry and not deleted.
    pub fn is_valid_variable(&self, handle: VariableHandle) -> bool {
        match &self.variables {
            Some(live) => live.contains(&handle),
            None => handle.raw() >= 1 && handle.raw() <= self.allocator.variable_high_water(),
        }
    }

    /// Deletes a variable: strips it from the objective and from every
    /// constraint function, resizes sets whose function lost output
    /// rows, deletes constraints that were direct single-variable
    /// projections of it, and forgets its name.
    ///
    /// The fan-out is not atomic: if it fails partway the registry is
    /// left partially updated and must be discarded.
    pub fn delete_variable(&mut self, handle: VariableHandle) -> Result<()> {
        if !self.is_valid_variable(handle) {
            return Err(Self::invalid_variable(handle));
        }
        debug!(variable = handle.raw(), "deleting variable");

        self.objective.remove_variable(handle);

        // Rewrite pass: collect victims, never deleting from a
        // sequence while iterating it.
        let mut victims: Vec<(usize, u64)> = Vec::new();
        for (index, partition) in self.partitions.values_mut().enumerate() {
            for raw in partition.remove_variable(handle) {
                victims.push((index, raw));
            }
        }

        // Victim pass.
        if !victims.is_empty() {
            trace!(
                variable = handle.raw(),
                count = victims.len(),
                "cascading constraint deletion"
            );
        }
        for (index, raw) in victims {
            let (_, partition) = self.partitions.get_index_mut(index).ok_or_else(|| {
                ModelError::Internal(format!("partition {index} vanished during cascade"))
            })?;
            partition.delete_raw(raw, &mut self.locations)?;
            self.constraint_names.remove(&raw);
            self.constraint_reverse.invalidate();
        }

        let high_water = self.allocator.variable_high_water();
        let live = self
            .variables
            .get_or_insert_with(|| (1..=high_water).map(VariableHandle::from_raw).collect());
        live.shift_remove(&handle);
        self.variable_names.remove(&handle);
        self.variable_reverse.invalidate();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Constraints
    // ------------------------------------------------------------------

    /// Adds a constraint requiring `function`'s value to lie in `set`,
    /// returning a handle unique across every function/set pair.
    pub fn add_constraint<F: Function + 'static, S: Set + 'static>(
        &mut self,
        function: F,
        set: S,
    ) -> Result<ConstraintHandle<F, S>> {
        if !self.partitions.contains_key(&ConstraintKind::of::<F, S>()) {
            return Err(ModelError::UnsupportedConstraintKind {
                function: F::kind_name(),
                set: S::kind_name(),
            });
        }
        let handle = ConstraintHandle::from_raw(self.allocator.new_constraint_value());
        let (partition, locations) = self.typed_partition_mut::<F, S>().ok_or_else(|| {
            ModelError::Internal("registered partition failed to downcast".to_string())
        })?;
        partition.push(handle, function, set, locations);
        trace!(constraint = handle.raw(), "added constraint");
        Ok(handle)
    }

    /// The constraint's function.
    pub fn constraint_function<F: Function + 'static, S: Set + 'static>(
        &self,
        handle: ConstraintHandle<F, S>,
    ) -> Result<&F> {
        self.typed_partition::<F, S>()
            .ok_or_else(|| Self::invalid_constraint(handle.raw()))?
            .function(handle, &self.locations)
    }

    /// The constraint's set.
    pub fn constraint_set<F: Function + 'static, S: Set + 'static>(
        &self,
        handle: ConstraintHandle<F, S>,
    ) -> Result<&S> {
        self.typed_partition::<F, S>()
            .ok_or_else(|| Self::invalid_constraint(handle.raw()))?
            .set(handle, &self.locations)
    }

    /// Replaces the constraint's function outright.
    pub fn set_constraint_function<F: Function + 'static, S: Set + 'static>(
        &mut self,
        handle: ConstraintHandle<F, S>,
        function: F,
    ) -> Result<()> {
        let (partition, locations) = self
            .typed_partition_mut::<F, S>()
            .ok_or_else(|| Self::invalid_constraint(handle.raw()))?;
        partition.set_function(handle, function, locations)
    }

    /// Replaces the constraint's set outright.
    pub fn set_constraint_set<F: Function + 'static, S: Set + 'static>(
        &mut self,
        handle: ConstraintHandle<F, S>,
        set: S,
    ) -> Result<()> {
        let (partition, locations) = self
            .typed_partition_mut::<F, S>()
            .ok_or_else(|| Self::invalid_constraint(handle.raw()))?;
        partition.set_set(handle, set, locations)
    }

    /// Applies an incremental modification delta to the constraint's
    /// function.
    pub fn modify_constraint<F: Function + 'static, S: Set + 'static>(
        &mut self,
        handle: ConstraintHandle<F, S>,
        change: &F::Change,
    ) -> Result<()> {
        let (partition, locations) = self
            .typed_partition_mut::<F, S>()
            .ok_or_else(|| Self::invalid_constraint(handle.raw()))?;
        partition.modify(handle, change, locations)
    }

    /// Deletes a constraint, preserving the relative order of the rest
    /// of its partition. The handle is invalid forever afterwards.
    pub fn delete_constraint<F: Function + 'static, S: Set + 'static>(
        &mut self,
        handle: ConstraintHandle<F, S>,
    ) -> Result<()> {
        let (partition, locations) = self
            .typed_partition_mut::<F, S>()
            .ok_or_else(|| Self::invalid_constraint(handle.raw()))?;
        partition.delete(handle, locations)?;
        self.constraint_names.remove(&handle.raw());
        self.constraint_reverse.invalidate();
        debug!(constraint = handle.raw(), "deleted constraint");
        Ok(())
    }

    /// Number of live constraints of the pair `(F, S)`; 0 for pairs
    /// with no entries, including unregistered pairs.
    pub fn num_constraints<F: Function + 'static, S: Set + 'static>(&self) -> usize {
        self.typed_partition::<F, S>().map_or(0, |p| p.len())
    }

    /// The pairs with at least one live constraint.
    pub fn constraint_kinds(&self) -> Vec<ConstraintKind> {
        self.partitions
            .values()
            .filter(|p| p.len() > 0)
            .map(|p| p.kind())
            .collect()
    }

    /// Live constraint handles of the pair `(F, S)`, in creation order
    /// among survivors.
    pub fn constraints<F: Function + 'static, S: Set + 'static>(
        &self,
    ) -> Vec<ConstraintHandle<F, S>> {
        self.typed_partition::<F, S>()
            .map_or_else(Vec::new, |p| p.handles())
    }

    /// True when `handle` was issued by this registry for the pair
    /// `(F, S)` and not deleted.
    pub fn is_valid_constraint<F: Function + 'static, S: Set + 'static>(
        &self,
        handle: ConstraintHandle<F, S>,
    ) -> bool {
        let high_water = self.allocator.constraint_high_water();
        self.typed_partition::<F, S>()
            .is_some_and(|p| p.is_valid(handle, &self.locations, high_water))
    }

    // ------------------------------------------------------------------
    // Two-phase allocate/load protocol
    // ------------------------------------------------------------------

    /// Phase one of the bulk-copy protocol: reserves `count` constraint
    /// handles of the pair `(F, S)` with placeholder bodies, in
    /// allocation order.
    ///
    /// Phase two fills each body via [`load_constraint`]. A model built
    /// through reserve-then-load is identical to one built through
    /// [`add_constraint`] with the same input.
    ///
    /// [`load_constraint`]: ModelRegistry::load_constraint
    /// [`add_constraint`]: ModelRegistry::add_constraint
    pub fn reserve_constraints<F, S>(&mut self, count: usize) -> Result<Vec<ConstraintHandle<F, S>>>
    where
        F: Function + Default + 'static,
        S: Set + Default + 'static,
    {
        if !self.partitions.contains_key(&ConstraintKind::of::<F, S>()) {
            return Err(ModelError::UnsupportedConstraintKind {
                function: F::kind_name(),
                set: S::kind_name(),
            });
        }
        let handles: Vec<ConstraintHandle<F, S>> = (0..count)
            .map(|_| ConstraintHandle::from_raw(self.allocator.new_constraint_value()))
            .collect();
        let (partition, locations) = self.typed_partition_mut::<F, S>().ok_or_else(|| {
            ModelError::Internal("registered partition failed to downcast".to_string())
        })?;
        for &handle in &handles {
            partition.push(handle, F::default(), S::default(), locations);
        }
        trace!(count, "reserved constraints");
        Ok(handles)
    }

    /// Phase two of the bulk-copy protocol: fills a reserved
    /// constraint's function and set.
    pub fn load_constraint<F: Function + 'static, S: Set + 'static>(
        &mut self,
        handle: ConstraintHandle<F, S>,
        function: F,
        set: S,
    ) -> Result<()> {
        let (partition, locations) = self
            .typed_partition_mut::<F, S>()
            .ok_or_else(|| Self::invalid_constraint(handle.raw()))?;
        partition.load(handle, function, set, locations)
    }

    // ------------------------------------------------------------------
    // Names
    // ------------------------------------------------------------------

    /// Names a variable. Duplicate names are permitted at assignment
    /// time; lookup reports the conflict.
    pub fn set_variable_name(
        &mut self,
        handle: VariableHandle,
        name: impl Into<String>,
    ) -> Result<()> {
        if !self.is_valid_variable(handle) {
            return Err(Self::invalid_variable(handle));
        }
        self.variable_names.insert(handle, name.into());
        self.variable_reverse.invalidate();
        Ok(())
    }

    /// The variable's name, if one was ever assigned.
    pub fn variable_name(&self, handle: VariableHandle) -> Option<&str> {
        self.variable_names.get(&handle).map(String::as_str)
    }

    /// Looks a variable up by name.
    ///
    /// Fails with [`ModelError::AmbiguousName`] when two or more live
    /// variables share the name.
    pub fn variable_by_name(&mut self, name: &str) -> Result<Option<VariableHandle>> {
        self.variable_reverse.lookup(&self.variable_names, name)
    }

    /// Names a constraint. Duplicate names are permitted at assignment
    /// time; lookup reports the conflict.
    pub fn set_constraint_name<F: Function + 'static, S: Set + 'static>(
        &mut self,
        handle: ConstraintHandle<F, S>,
        name: impl Into<String>,
    ) -> Result<()> {
        if !self.is_valid_constraint(handle) {
            return Err(Self::invalid_constraint(handle.raw()));
        }
        self.constraint_names.insert(handle.raw(), name.into());
        self.constraint_reverse.invalidate();
        Ok(())
    }

    /// The constraint's name, if one was ever assigned.
    pub fn constraint_name<F: Function + 'static, S: Set + 'static>(
        &self,
        handle: ConstraintHandle<F, S>,
    ) -> Option<&str> {
        self.constraint_names
            .get(&handle.raw())
            .map(String::as_str)
    }

    /// Looks a constraint of the pair `(F, S)` up by name.
    ///
    /// Names are shared across all pairs; a name bound to a constraint
    /// of a different pair resolves to `None` here. Fails with
    /// [`ModelError::AmbiguousName`] when two or more live constraints
    /// of any pair share the name.
    pub fn constraint_by_name<F: Function + 'static, S: Set + 'static>(
        &mut self,
        name: &str,
    ) -> Result<Option<ConstraintHandle<F, S>>> {
        let raw = self.constraint_reverse.lookup(&self.constraint_names, name)?;
        Ok(raw
            .map(ConstraintHandle::from_raw)
            .filter(|&handle| self.is_valid_constraint(handle)))
    }

    // ------------------------------------------------------------------
    // Objective
    // ------------------------------------------------------------------

    /// The optimization sense.
    pub fn objective_sense(&self) -> ObjectiveSense {
        self.objective.sense()
    }

    /// Sets the optimization sense.
    pub fn set_objective_sense(&mut self, sense: ObjectiveSense) {
        self.objective.set_sense(sense);
    }

    /// The objective function.
    pub fn objective_function(&self) -> &ScalarFunction {
        self.objective.function()
    }

    /// Replaces the objective function outright.
    pub fn set_objective_function(&mut self, function: impl Into<ScalarFunction>) {
        self.objective.set_function(function.into());
    }

    /// Applies an incremental modification delta to the objective
    /// function.
    pub fn modify_objective(&mut self, change: &ScalarChange) -> Result<()> {
        self.objective.modify(change)
    }

    // ------------------------------------------------------------------
    // Emptiness
    // ------------------------------------------------------------------

    /// True only for a registry nothing was ever added to.
    ///
    /// Handle values are never recycled, so a model that created and
    /// then deleted everything is not empty: the allocator high-water
    /// marks keep it permanently non-empty.
    pub fn is_empty(&self) -> bool {
        self.allocator.variable_high_water() == 0
            && self.allocator.constraint_high_water() == 0
            && self.variable_names.is_empty()
            && self.constraint_names.is_empty()
            && self.objective.is_pristine()
    }
}

impl fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("variables", &self.num_variables())
            .field(
                "constraints",
                &self.partitions.values().map(|p| p.len()).sum::<usize>(),
            )
            .field("kinds", &self.partitions.keys().collect::<Vec<_>>())
            .finish()
    }
}
