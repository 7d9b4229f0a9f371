//! Change notifications emitted toward the renderer

/// A change to the flat row sequence or its row data
///
/// Queued by the model as it reacts to source changes and user toggles;
/// the renderer drains the queue with
/// [`FlatTreeModel::take_events`](crate::FlatTreeModel::take_events)
/// and applies the changes in order. Row ranges are inclusive.
///
/// A `Reset` supersedes everything queued before it: a full rebuild
/// replaces the queue with a single `Reset` so no intermediate state of
/// the rebuild is ever observable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewEvent {
    /// Attributes changed for rows `[first, last]`; positions unchanged
    RowsChanged { first: usize, last: usize },

    /// Rows `[first, last]` are new; later rows shifted down
    RowsInserted { first: usize, last: usize },

    /// Rows `[first, last]` are gone; later rows shifted up
    RowsRemoved { first: usize, last: usize },

    /// The whole flat sequence was rebuilt; re-read everything
    Reset,
}
