//! Handle allocation.

use optmodel_core::VariableHandle;

/// Issues monotonically increasing handle values.
///
/// Variables have their own counter. Constraints of every function/set
/// pair share one counter, which is what makes constraint-handle
/// equality independent of the pair: no two constraints of any kind,
/// live or deleted, ever share a value.
#[derive(Debug, Default)]
pub(crate) struct HandleAllocator {
    next_variable: u64,
    next_constraint: u64,
}

impl HandleAllocator {
    pub(crate) fn new() -> Self {
        HandleAllocator::default()
    }

    /// Returns the next variable handle. Values start at 1 and are
    /// never reused.
    pub(crate) fn new_variable_handle(&mut self) -> VariableHandle {
        self.next_variable += 1;
        VariableHandle::from_raw(self.next_variable)
    }

    /// Returns the next raw constraint value from the single shared
    /// counter. Values start at 1 and are never reused.
    pub(crate) fn new_constraint_value(&mut self) -> u64 {
        self.next_constraint += 1;
        self.next_constraint
    }

    /// Highest variable value ever issued; 0 when none.
    pub(crate) fn variable_high_water(&self) -> u64 {
        self.next_variable
    }

    /// Highest constraint value ever issued; 0 when none.
    pub(crate) fn constraint_high_water(&self) -> u64 {
        self.next_constraint
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_handles_start_at_one() {
        let mut alloc = HandleAllocator::new();
        assert_eq!(alloc.variable_high_water(), 0);
        assert_eq!(alloc.new_variable_handle().raw(), 1);
        assert_eq!(alloc.new_variable_handle().raw(), 2);
        assert_eq!(alloc.variable_high_water(), 2);
    }

    #[test]
    fn test_constraint_counter_is_independent_of_variables() {
        let mut alloc = HandleAllocator::new();
        alloc.new_variable_handle();
        assert_eq!(alloc.new_constraint_value(), 1);
        assert_eq!(alloc.new_constraint_value(), 2);
        assert_eq!(alloc.constraint_high_water(), 2);
    }
}
