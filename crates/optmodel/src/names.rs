//! Lazily rebuilt reverse-name caches.

use std::collections::HashMap;
use std::hash::Hash;

use optmodel_core::error::{ModelError, Result};

/// What a name resolves to inside a built cache.
#[derive(Debug, Clone, Copy, PartialEq)]
enum NameTarget<K> {
    Unique(K),
    /// Two or more live entries carried this name when the cache was
    /// built. Never reverts within one build, even if a duplicate is
    /// deleted afterwards.
    Ambiguous,
}

/// Reverse map from names to handles, rebuilt on demand.
///
/// Any mutation of the forward map (naming, renaming, deletion) resets
/// the cache to `NotBuilt`; the next lookup rebuilds it from the
/// forward map. Deletion never edits the built map in place, because an
/// edit cannot tell whether another handle still shares the freed name.
#[derive(Debug)]
pub(crate) enum NameCache<K> {
    NotBuilt,
    Built(HashMap<String, NameTarget<K>>),
}

impl<K> Default for NameCache<K> {
    fn default() -> Self {
        NameCache::NotBuilt
    }
}

impl<K: Copy + Eq + Hash> NameCache<K> {
    pub(crate) fn new() -> Self {
        NameCache::NotBuilt
    }

    /// Forces a rebuild on the next lookup.
    pub(crate) fn invalidate(&mut self) {
        *self = NameCache::NotBuilt;
    }

    /// Resolves `name` against `forward`, rebuilding the cache first if
    /// it was invalidated.
    ///
    /// Fails with [`ModelError::AmbiguousName`] when the name is shared;
    /// returns `Ok(None)` when it is absent.
    pub(crate) fn lookup(
        &mut self,
        forward: &HashMap<K, String>,
        name: &str,
    ) -> Result<Option<K>> {
        if let NameCache::NotBuilt = self {
            let mut map = HashMap::with_capacity(forward.len());
            for (&handle, entry_name) in forward {
                map.entry(entry_name.clone())
                    .and_modify(|target| *target = NameTarget::Ambiguous)
                    .or_insert(NameTarget::Unique(handle));
            }
            *self = NameCache::Built(map);
        }
        let NameCache::Built(map) = self else {
            return Err(ModelError::Internal(
                "name cache not built after rebuild".to_string(),
            ));
        };
        match map.get(name) {
            None => Ok(None),
            Some(NameTarget::Unique(handle)) => Ok(Some(*handle)),
            Some(NameTarget::Ambiguous) => Err(ModelError::AmbiguousName(name.to_string())),
        }
    }
}
