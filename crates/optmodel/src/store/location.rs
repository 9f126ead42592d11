//! Constraint location index.

/// Sentinel position marking a deleted or never-issued value.
const TOMBSTONE: usize = 0;

/// Maps raw constraint values to 1-based positions inside their
/// partition's sequence.
///
/// A single array spans every partition: the shared allocation counter
/// guarantees a raw value identifies at most one constraint of any
/// kind. Position `0` is the tombstone.
///
/// Invariant: for every live handle,
/// `partition[index.position(raw) - 1].handle.raw() == raw`.
#[derive(Debug, Default)]
pub(crate) struct LocationIndex {
    slots: Vec<usize>,
}

impl LocationIndex {
    pub(crate) fn new() -> Self {
        LocationIndex::default()
    }

    /// Records `raw` as sitting at 1-based `position`, growing the
    /// array on demand.
    pub(crate) fn record(&mut self, raw: u64, position: usize) {
        let idx = raw as usize;
        if idx >= self.slots.len() {
            self.slots.resize(idx + 1, TOMBSTONE);
        }
        self.slots[idx] = position;
    }

    /// Returns the recorded 1-based position, or 0 for tombstoned and
    /// never-recorded values.
    pub(crate) fn position(&self, raw: u64) -> usize {
        self.slots.get(raw as usize).copied().unwrap_or(TOMBSTONE)
    }

    /// Tombstones `raw`.
    pub(crate) fn clear(&mut self, raw: u64) {
        let idx = raw as usize;
        if idx < self.slots.len() {
            self.slots[idx] = TOMBSTONE;
        }
    }
}
