//! Change notifications emitted by tree sources

use crate::handle::Handle;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A structural or data change reported by a source
///
/// Events are queued by the source as mutations happen and drained in
/// emission order by whoever mirrors the source (see
/// [`TreeSource::take_events`](crate::TreeSource::take_events)).
/// Indices refer to positions in the parent's child list; `parent: None`
/// means the root level.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SourceEvent {
    /// New children exist under `parent` at `[first, last]` (inclusive)
    RowsInserted {
        parent: Option<Handle>,
        first: usize,
        last: usize,
    },

    /// Children `[first, last]` of `parent` are gone; emitted after the
    /// removal, so handles into the removed subtrees already dangle
    RowsRemoved {
        parent: Option<Handle>,
        first: usize,
        last: usize,
    },

    /// Attributes changed for a contiguous run of siblings
    DataChanged { first: Handle, last: Handle },

    /// The source reordered itself wholesale; no granular diff available
    LayoutChanged,
}
