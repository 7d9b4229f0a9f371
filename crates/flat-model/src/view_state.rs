//! Per-identity view state that outlives the mirrored tree

use std::collections::{HashMap, HashSet};

use tree_source::StableKey;

/// View state captured for one identity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewState {
    /// Whether the entry was unfolded
    pub expanded: bool,
    /// Whether the entry was hidden by an ancestor
    pub hidden: bool,
}

/// Store of view state keyed by resolved identity
///
/// Entries survive full rebuilds of the mirrored tree, so an entry that
/// reappears under the same identity gets its previous expansion state
/// back. After a rebuild the store is pruned to the identities that are
/// still present, which keeps it from growing without bound.
#[derive(Debug, Default)]
pub struct ViewStateStore {
    entries: HashMap<StableKey, ViewState>,
}

impl ViewStateStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the state for an identity, defaulting to collapsed and
    /// visible
    pub fn recall(&self, key: &StableKey) -> ViewState {
        self.entries.get(key).copied().unwrap_or_default()
    }

    /// Record the expansion state for an identity
    pub fn remember_expanded(&mut self, key: StableKey, expanded: bool) {
        self.entries.entry(key).or_default().expanded = expanded;
    }

    /// Record the hidden state for an identity
    pub fn remember_hidden(&mut self, key: StableKey, hidden: bool) {
        self.entries.entry(key).or_default().hidden = hidden;
    }

    /// Drop state for identities no longer present
    pub fn prune(&mut self, live: &HashSet<StableKey>) {
        self.entries.retain(|key, _| live.contains(key));
    }

    /// Number of remembered identities
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is remembered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
