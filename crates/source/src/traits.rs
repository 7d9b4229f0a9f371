//! The contract between a hierarchical source and its consumers

use crate::event::SourceEvent;
use crate::handle::Handle;
use crate::value::Value;

/// A tree-shaped data provider
///
/// Implementations expose an ordered hierarchy of entries addressed by
/// [`Handle`]s. Child order must be stable between change notifications.
/// Entries may be discovered lazily: [`has_children`](Self::has_children)
/// is allowed to over-approximate for entries whose children have not
/// been materialized yet, and [`fetch_more`](Self::fetch_more) performs
/// the materialization on demand.
///
/// Mutations queue [`SourceEvent`]s which the consumer drains with
/// [`take_events`](Self::take_events) on the same thread; there is no
/// cross-thread delivery.
///
/// The trait is object-safe so that layered sources can hand out
/// `&dyn TreeSource` references to the layer below them.
pub trait TreeSource {
    /// Number of children under `parent` (`None` = the root level)
    ///
    /// Counts only materialized children; deferred ones appear after
    /// [`fetch_more`](Self::fetch_more).
    fn child_count(&self, parent: Option<&Handle>) -> usize;

    /// Handle of the child at `index` under `parent`
    ///
    /// Returns `None` if the parent is unknown or the index is out of
    /// range.
    fn child_at(&self, parent: Option<&Handle>, index: usize) -> Option<Handle>;

    /// Whether the entry has (or may have) children
    ///
    /// May be a cheap over-approximation for lazily loaded entries.
    fn has_children(&self, handle: &Handle) -> bool;

    /// Whether the handle still names a live entry
    fn is_valid(&self, handle: &Handle) -> bool;

    /// Read an attribute of an entry
    fn attribute(&self, handle: &Handle, name: &str) -> Option<Value>;

    /// Write an attribute of an entry
    ///
    /// Returns true and queues a [`SourceEvent::DataChanged`] on
    /// success. Read-only sources keep the default.
    fn set_attribute(&mut self, handle: &Handle, name: &str, value: Value) -> bool {
        let _ = (handle, name, value);
        false
    }

    /// Number of columns the source carries; defaults to one
    fn column_count(&self) -> usize {
        1
    }

    /// Whether more children can be materialized for this entry
    fn can_fetch_more(&self, handle: &Handle) -> bool {
        let _ = handle;
        false
    }

    /// Materialize pending children for this entry
    ///
    /// Queues [`SourceEvent::RowsInserted`] for whatever gets created,
    /// possibly before this call returns to the caller.
    fn fetch_more(&mut self, handle: &Handle) {
        let _ = handle;
    }

    /// Drain queued change notifications in emission order
    fn take_events(&mut self) -> Vec<SourceEvent>;

    /// Whether this source is a transformation over another source
    ///
    /// Terminal sources keep the default.
    fn as_layer(&self) -> Option<&dyn SourceLayer> {
        None
    }
}

/// The boundary of a transformation layer (sorting, filtering, ...)
///
/// A layer owns its wrapped source and issues its own handles; this
/// trait is how a consumer translates those handles toward the terminal
/// source one step at a time.
pub trait SourceLayer {
    /// Translate one of this layer's handles into the wrapped source's
    /// handle, or `None` if it dangles
    fn map_to_inner(&self, handle: &Handle) -> Option<Handle>;

    /// The wrapped source
    fn inner(&self) -> &dyn TreeSource;
}
