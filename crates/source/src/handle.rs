//! Identifiers for tree sources and their entries

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Unique identifier for a source instance
///
/// Every source allocates one at construction; two sources in the same
/// process never share an id, so a [`Handle`] always names exactly one
/// source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SourceId(u64);

impl SourceId {
    /// Allocate a fresh id from the process-wide counter
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        SourceId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "source#{}", self.0)
    }
}

/// Source-private identifier for one entry
///
/// Stable for the entry's lifetime; never reused while the entry exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EntryId(u64);

impl EntryId {
    /// Create an EntryId from a raw value
    pub const fn new(id: u64) -> Self {
        EntryId(id)
    }

    /// Get the raw value
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Opaque reference to one entry within a tree source
///
/// A handle is only meaningful to the source that issued it and may
/// dangle once the entry is removed. It compares by identity, so a
/// handle held across notifications still names the same entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Handle {
    source: SourceId,
    entry: EntryId,
}

impl Handle {
    /// Create a handle bound to a source instance
    pub const fn new(source: SourceId, entry: EntryId) -> Self {
        Self { source, entry }
    }

    /// The source this handle belongs to
    pub const fn source(self) -> SourceId {
        self.source
    }

    /// The source-private entry id
    pub const fn entry(self) -> EntryId {
        self.entry
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.source, self.entry.0)
    }
}

/// A handle resolved through every transformation layer down to a
/// terminal source
///
/// Usable as a persistence key: it stays valid even when an intermediate
/// layer is torn down and rebuilt, which invalidates that layer's raw
/// handles. Distinct from [`Handle`] so the two cannot be mixed up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StableKey {
    source: SourceId,
    entry: EntryId,
}

impl From<Handle> for StableKey {
    fn from(handle: Handle) -> Self {
        Self {
            source: handle.source,
            entry: handle.entry,
        }
    }
}
