//! The flattening engine and the row-oriented facade over it

use std::collections::HashSet;

use log::debug;
use smallvec::SmallVec;
use tree_source::{Handle, SourceEvent, StableKey, TreeSource, Value};

use crate::event::ViewEvent;
use crate::flat_index::FlatIndex;
use crate::identity::canonical_key;
use crate::node::{NodeArena, NodeId, ViewNode};
use crate::view_state::ViewStateStore;

/// Attribute names the model answers itself; everything else is passed
/// through to the source
pub mod attr {
    /// Indentation level of the row (integer)
    pub const INDENTATION: &str = "indentation";
    /// Whether the row's entry has (or may have) children
    pub const HAS_CHILDREN: &str = "hasChildren";
    /// Whether the row is unfolded; the only writable view attribute
    pub const IS_EXPANDED: &str = "isExpanded";
    /// Whether the row is hidden by a collapsed or hidden ancestor
    pub const HIDDEN: &str = "hidden";
}

/// Projects a tree source into a flat, ordered row sequence
///
/// The model mirrors the source as a node tree and maintains the flat
/// row order over it incrementally: source changes patch the mirror and
/// the row sequence in place instead of rebuilding them, except for
/// wholesale layout changes which trigger a full rebuild. Expansion
/// state is keyed on identity resolved through any transformation
/// layers, so it survives both rebuilds of the mirror and rebuilds of
/// intermediate layers.
///
/// Every row is present whether hidden or not; `hidden` is an attribute
/// for the renderer, not a filter, so structural changes never depend
/// on what is currently visible.
///
/// Everything is single-threaded and synchronous. The source's change
/// events are drained and applied whenever a mutation can have queued
/// some: after [`with_source`](Self::with_source), after an expansion
/// triggers lazy materialization, and on [`sync`](Self::sync). A
/// materialization request may queue insertions before it returns; the
/// mirror is always consistent by the time that can happen.
pub struct FlatTreeModel<S> {
    source: S,
    arena: NodeArena,
    flat: FlatIndex,
    roots: Vec<NodeId>,
    state: ViewStateStore,
    events: Vec<ViewEvent>,
    /// Guards against a layout change re-entering an active rebuild
    rebuilding: bool,
    rebuild_queued: bool,
}

impl<S: TreeSource> FlatTreeModel<S> {
    /// Take ownership of a source and build the initial row sequence
    ///
    /// Change events the source queued before this point are discarded;
    /// the full build supersedes them.
    pub fn new(mut source: S) -> Self {
        source.take_events();
        let mut model = Self {
            source,
            arena: NodeArena::new(),
            flat: FlatIndex::new(),
            roots: Vec::new(),
            state: ViewStateStore::new(),
            events: Vec::new(),
            rebuilding: false,
            rebuild_queued: false,
        };
        model.rebuild();
        model
    }

    /// Number of rows, hidden ones included
    pub fn row_count(&self) -> usize {
        self.flat.len()
    }

    /// Number of columns, straight from the source
    pub fn column_count(&self) -> usize {
        self.source.column_count()
    }

    /// Read-only access to the source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Mutate the source, then apply whatever change events the
    /// mutation queued
    pub fn with_source<R>(&mut self, f: impl FnOnce(&mut S) -> R) -> R {
        let out = f(&mut self.source);
        self.apply_source_events();
        out
    }

    /// Apply any change events the source has queued
    pub fn sync(&mut self) {
        self.apply_source_events();
    }

    /// Drain the queued view events in emission order
    pub fn take_events(&mut self) -> Vec<ViewEvent> {
        std::mem::take(&mut self.events)
    }

    /// Discard the mirror and rebuild it from the source
    pub fn reset(&mut self) {
        self.rebuild();
    }

    /// Source handle of the entry at `row`
    pub fn handle_at(&self, row: usize) -> Option<Handle> {
        let id = self.flat.node_at(row)?;
        self.arena.node(id).map(|node| node.handle)
    }

    /// Row of the entry a source handle names
    pub fn row_for_handle(&self, handle: &Handle) -> Option<usize> {
        self.flat.row_for_handle(handle)
    }

    /// Read a row attribute
    ///
    /// The view attributes in [`attr`] are answered from the mirror;
    /// any other name is passed through to the source entry.
    pub fn attribute(&self, row: usize, name: &str) -> Option<Value> {
        let id = self.flat.node_at(row)?;
        let node = self.arena.node(id)?;
        match name {
            attr::INDENTATION => Some(Value::Int(node.depth as i64)),
            attr::HAS_CHILDREN => Some(Value::Bool(self.source.has_children(&node.handle))),
            attr::IS_EXPANDED => Some(Value::Bool(node.expanded)),
            attr::HIDDEN => Some(Value::Bool(node.hidden)),
            _ => self.source.attribute(&node.handle, name),
        }
    }

    /// Write a row attribute
    ///
    /// [`attr::IS_EXPANDED`] toggles expansion; any other name is
    /// passed through to the source. Returns false when the row is
    /// invalid or the write was rejected.
    pub fn set_attribute(&mut self, row: usize, name: &str, value: Value) -> bool {
        match name {
            attr::IS_EXPANDED => match value.as_bool() {
                Some(expanded) => self.set_expanded(row, expanded),
                None => false,
            },
            _ => {
                let Some(handle) = self.handle_at(row) else {
                    return false;
                };
                let accepted = self.source.set_attribute(&handle, name, value);
                self.apply_source_events();
                accepted
            }
        }
    }

    /// Indentation level of the row
    pub fn indentation(&self, row: usize) -> Option<usize> {
        let id = self.flat.node_at(row)?;
        self.arena.node(id).map(|node| node.depth)
    }

    /// Whether the row's entry has (or may have) children
    pub fn has_children(&self, row: usize) -> Option<bool> {
        let handle = self.handle_at(row)?;
        Some(self.source.has_children(&handle))
    }

    /// Whether the row is unfolded
    pub fn is_expanded(&self, row: usize) -> Option<bool> {
        let id = self.flat.node_at(row)?;
        self.arena.node(id).map(|node| node.expanded)
    }

    /// Whether the row is hidden by a collapsed or hidden ancestor
    pub fn is_hidden(&self, row: usize) -> Option<bool> {
        let id = self.flat.node_at(row)?;
        self.arena.node(id).map(|node| node.hidden)
    }

    /// Unfold or fold the row
    ///
    /// Idempotent: repeating the same value re-runs the same steps and
    /// re-emits the same notification. Returns false for an invalid
    /// row.
    pub fn set_expanded(&mut self, row: usize, expanded: bool) -> bool {
        match self.flat.node_at(row) {
            Some(id) => {
                self.apply_expanded(id, expanded);
                true
            }
            None => false,
        }
    }

    /// Number of identities with remembered view state
    pub fn remembered_identities(&self) -> usize {
        self.state.len()
    }

    fn rebuild(&mut self) {
        if self.rebuilding {
            // A layout change arrived while the mirror was being built
            // (a layer resyncing in response to lazy materialization);
            // restart once the active pass unwinds.
            self.rebuild_queued = true;
            return;
        }
        debug!("rebuilding flat rows (had {})", self.flat.len());
        self.rebuilding = true;
        loop {
            self.arena.clear();
            self.flat.clear();
            self.roots.clear();
            self.populate_children(None, None);
            if !self.rebuild_queued {
                break;
            }
            self.rebuild_queued = false;
        }
        self.rebuilding = false;

        // Identities that vanished from the source give their state up.
        let live: HashSet<StableKey> = self
            .flat
            .iter()
            .filter_map(|id| self.arena.node(id))
            .filter_map(|node| canonical_key(&self.source, &node.handle))
            .collect();
        self.state.prune(&live);

        // A reset supersedes everything queued before it; nothing of
        // the rebuild itself is observable.
        self.events.clear();
        self.events.push(ViewEvent::Reset);
    }

    /// Mirror every child the source reports under `parent`, depth
    /// first, re-applying remembered expansion as each subtree
    /// completes
    fn populate_children(&mut self, parent_handle: Option<&Handle>, parent_id: Option<NodeId>) {
        let count = self.source.child_count(parent_handle);
        for index in 0..count {
            let Some(handle) = self.source.child_at(parent_handle, index) else {
                continue;
            };
            let id = self.insert_node(parent_id, index, handle);
            if self.source.has_children(&handle) {
                self.populate_children(Some(&handle), Some(id));
            }
            if self.arena.node(id).map(|node| node.expanded).unwrap_or(false) {
                // Remembered expansion goes through the regular toggle
                // so lazy loading and the hidden cascade behave exactly
                // as if the user had unfolded the row.
                self.apply_expanded(id, true);
            }
        }
    }

    /// Create a node under `parent_id` at child position `child_index`
    /// and splice it into the flat order
    ///
    /// The flat position is one past the last descendant of the
    /// preceding sibling, or one past the parent for a first child.
    /// Anything already in those rows shifts down.
    fn insert_node(&mut self, parent_id: Option<NodeId>, child_index: usize, handle: Handle) -> NodeId {
        let (depth, hidden) = match parent_id.and_then(|id| self.arena.node(id)) {
            Some(parent) => (parent.depth + 1, parent.hidden || !parent.expanded),
            None => (0, false),
        };
        let expanded = canonical_key(&self.source, &handle)
            .map(|key| self.state.recall(&key).expanded)
            .unwrap_or(false);

        let id = self.arena.insert(ViewNode {
            handle,
            parent: parent_id,
            children: SmallVec::new(),
            depth,
            expanded,
            hidden,
        });

        let previous_sibling = match parent_id {
            Some(parent) => match self.arena.node_mut(parent) {
                Some(parent_node) => {
                    let at = child_index.min(parent_node.children.len());
                    parent_node.children.insert(at, id);
                    at.checked_sub(1).map(|i| parent_node.children[i])
                }
                None => None,
            },
            None => {
                let at = child_index.min(self.roots.len());
                self.roots.insert(at, id);
                at.checked_sub(1).map(|i| self.roots[i])
            }
        };

        let row = match previous_sibling {
            Some(sibling) => self
                .last_descendant_row(sibling)
                .map(|row| row + 1)
                .unwrap_or_else(|| self.flat.len()),
            None => match parent_id.and_then(|id| self.flat.row_of(id)) {
                Some(parent_row) => parent_row + 1,
                None => 0,
            },
        };
        self.flat.insert_at(row, id, handle);
        id
    }

    /// Row of the deepest last descendant, following the last-child
    /// chain; the node's own row if it has no children
    fn last_descendant_row(&self, id: NodeId) -> Option<usize> {
        let mut current = id;
        while let Some(last) = self
            .arena
            .node(current)
            .and_then(|node| node.children.last().copied())
        {
            current = last;
        }
        self.flat.row_of(current)
    }

    fn apply_expanded(&mut self, id: NodeId, expanded: bool) {
        let Some(node) = self.arena.node_mut(id) else {
            return;
        };
        node.expanded = expanded;
        let handle = node.handle;

        if let Some(key) = canonical_key(&self.source, &handle) {
            self.state.remember_expanded(key, expanded);
        }
        if let Some(row) = self.flat.row_of(id) {
            self.events.push(ViewEvent::RowsChanged {
                first: row,
                last: row,
            });
        }

        // The node is consistent at this point; materialization may
        // re-enter through the insert handler before fetch_more
        // returns.
        if expanded && self.source.can_fetch_more(&handle) {
            self.source.fetch_more(&handle);
            self.apply_source_events();
        }

        let children: Vec<NodeId> = match self.arena.node(id) {
            Some(node) => node.children.to_vec(),
            None => return,
        };
        for child in children {
            self.apply_hidden(child, !expanded);
        }
    }

    fn apply_hidden(&mut self, id: NodeId, hidden: bool) {
        let Some(node) = self.arena.node_mut(id) else {
            return;
        };
        node.hidden = hidden;
        let handle = node.handle;
        let expanded = node.expanded;

        if let Some(key) = canonical_key(&self.source, &handle) {
            self.state.remember_hidden(key, hidden);
        }
        if let Some(row) = self.flat.row_of(id) {
            self.events.push(ViewEvent::RowsChanged {
                first: row,
                last: row,
            });
        }

        // A node is hidden iff some ancestor is collapsed or hidden;
        // one level at a time.
        let children: Vec<NodeId> = match self.arena.node(id) {
            Some(node) => node.children.to_vec(),
            None => return,
        };
        for child in children {
            self.apply_hidden(child, hidden || !expanded);
        }
    }

    fn apply_source_events(&mut self) {
        loop {
            let events = self.source.take_events();
            if events.is_empty() {
                break;
            }
            for event in events {
                match event {
                    SourceEvent::RowsInserted {
                        parent,
                        first,
                        last,
                    } => self.on_rows_inserted(parent, first, last),
                    SourceEvent::RowsRemoved {
                        parent,
                        first,
                        last,
                    } => self.on_rows_removed(parent, first, last),
                    SourceEvent::DataChanged { first, last } => self.on_data_changed(first, last),
                    SourceEvent::LayoutChanged => self.rebuild(),
                }
            }
        }
    }

    fn on_rows_inserted(&mut self, parent: Option<Handle>, first: usize, last: usize) {
        let parent_id = match parent {
            Some(handle) => match self.flat.node_for_handle(&handle) {
                Some(id) => Some(id),
                None => {
                    // The subtree will be built wholesale when its
                    // parent materializes.
                    debug!("dropping insert under unmirrored parent {}", handle);
                    return;
                }
            },
            None => None,
        };

        let mut first_row = None;
        let mut last_root = None;
        for index in first..=last {
            let Some(handle) = self.source.child_at(parent.as_ref(), index) else {
                continue;
            };
            if self.flat.node_for_handle(&handle).is_some() {
                // Already mirrored; a rebuild got there first.
                continue;
            }
            let id = self.insert_node(parent_id, index, handle);
            if self.source.has_children(&handle) {
                self.populate_children(Some(&handle), Some(id));
            }
            if self.arena.node(id).map(|node| node.expanded).unwrap_or(false) {
                self.apply_expanded(id, true);
            }
            if first_row.is_none() {
                first_row = self.flat.row_of(id);
            }
            last_root = Some(id);
        }

        if let (Some(first_row), Some(last_root)) = (first_row, last_root) {
            let last_row = self.last_descendant_row(last_root).unwrap_or(first_row);
            debug!(
                "inserted rows {}..={} under {:?}",
                first_row, last_row, parent
            );
            self.events.push(ViewEvent::RowsInserted {
                first: first_row,
                last: last_row,
            });
        }
    }

    fn on_rows_removed(&mut self, parent: Option<Handle>, first: usize, last: usize) {
        let parent_id = match parent {
            Some(handle) => match self.flat.node_for_handle(&handle) {
                Some(id) => Some(id),
                None => {
                    debug!("dropping removal under unmirrored parent {}", handle);
                    return;
                }
            },
            None => None,
        };

        let siblings: Vec<NodeId> = match parent_id {
            Some(id) => self
                .arena
                .node(id)
                .map(|node| node.children.to_vec())
                .unwrap_or_default(),
            None => self.roots.clone(),
        };
        if first >= siblings.len() || first > last {
            return;
        }
        let last = last.min(siblings.len() - 1);

        // The notification is positional and arrives after the source
        // mutated; if any targeted mirror node still resolves to a live
        // source entry the positions no longer line up (an earlier
        // rebuild got ahead of this event) and patching would remove
        // the wrong rows.
        let stale = siblings[first..=last].iter().any(|id| {
            self.arena
                .node(*id)
                .map(|node| self.source.is_valid(&node.handle))
                .unwrap_or(false)
        });
        if stale {
            debug!("removal notification does not match the mirror, rebuilding");
            self.rebuild();
            return;
        }

        let Some(first_row) = self.flat.row_of(siblings[first]) else {
            return;
        };
        let last_row = self.last_descendant_row(siblings[last]).unwrap_or(first_row);

        match parent_id {
            Some(id) => {
                if let Some(node) = self.arena.node_mut(id) {
                    node.children.drain(first..=last);
                }
            }
            None => {
                self.roots.drain(first..=last);
            }
        }

        // By the pre-order invariant the doomed subtrees are exactly
        // the contiguous rows between the first root's row and the last
        // root's last descendant.
        let arena = &self.arena;
        let removed = self
            .flat
            .remove_range(first_row, last_row, |id| {
                arena.node(id).map(|node| node.handle)
            });
        for id in removed {
            self.arena.remove(id);
        }

        debug!("removed rows {}..={} under {:?}", first_row, last_row, parent);
        self.events.push(ViewEvent::RowsRemoved {
            first: first_row,
            last: last_row,
        });
    }

    fn on_data_changed(&mut self, first: Handle, last: Handle) {
        // Staleness between the source mutating and us hearing about it
        // is expected; unknown handles just drop the notification.
        let (Some(a), Some(b)) = (
            self.flat.row_for_handle(&first),
            self.flat.row_for_handle(&last),
        ) else {
            debug!("dropping data change for unmirrored handles");
            return;
        };
        let (first, last) = if a <= b { (a, b) } else { (b, a) };
        self.events.push(ViewEvent::RowsChanged { first, last });
    }
}
