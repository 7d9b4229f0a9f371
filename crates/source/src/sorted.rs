//! A name-sorting transformation layer over another tree source

use std::collections::HashMap;

use crate::event::SourceEvent;
use crate::handle::{EntryId, Handle, SourceId};
use crate::traits::{SourceLayer, TreeSource};
use crate::value::Value;

#[derive(Debug, Clone)]
struct SortedEntry {
    /// The wrapped source's handle for this entry
    inner: Handle,
    children: Vec<EntryId>,
}

/// Presents a wrapped source with every sibling run re-sorted by the
/// `name` attribute
///
/// The layer issues its own handles; [`SourceLayer`] translates them
/// back to the wrapped source's handles, so state keyed on resolved
/// identity survives this layer being rebuilt. The sorted order is a
/// snapshot of the wrapped source's materialized entries: when the
/// wrapped source reports any change, the layer re-snapshots and
/// degrades the notification to [`SourceEvent::LayoutChanged`] rather
/// than re-mapping granular events.
#[derive(Debug)]
pub struct SortedSource<S> {
    id: SourceId,
    inner: S,
    entries: HashMap<EntryId, SortedEntry>,
    roots: Vec<EntryId>,
    next_entry: u64,
    events: Vec<SourceEvent>,
}

impl<S: TreeSource> SortedSource<S> {
    /// Wrap a source, snapshotting its current shape in sorted order
    pub fn new(inner: S) -> Self {
        let mut layer = Self {
            id: SourceId::next(),
            inner,
            entries: HashMap::new(),
            roots: Vec::new(),
            next_entry: 1,
            events: Vec::new(),
        };
        layer.snapshot();
        layer
    }

    /// Access the wrapped source
    ///
    /// Mutations made through this are picked up on the next
    /// [`take_events`](TreeSource::take_events) drain, which re-snapshots
    /// the layer and reports a layout change.
    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Discard and rebuild the sorted snapshot
    ///
    /// All previously issued handles of this layer dangle afterwards;
    /// only identities resolved through [`SourceLayer`] stay stable.
    pub fn resync(&mut self) {
        self.snapshot();
        self.events.push(SourceEvent::LayoutChanged);
    }

    fn snapshot(&mut self) {
        self.entries.clear();
        self.roots.clear();
        let roots = self.collect(None);
        self.roots = roots;
    }

    fn collect(&mut self, inner_parent: Option<Handle>) -> Vec<EntryId> {
        let count = self.inner.child_count(inner_parent.as_ref());
        let mut ids = Vec::with_capacity(count);
        for index in 0..count {
            let Some(inner_handle) = self.inner.child_at(inner_parent.as_ref(), index) else {
                continue;
            };
            let id = EntryId::new(self.next_entry);
            self.next_entry += 1;
            let children = self.collect(Some(inner_handle));
            self.entries.insert(
                id,
                SortedEntry {
                    inner: inner_handle,
                    children,
                },
            );
            ids.push(id);
        }
        ids.sort_by(|a, b| self.sort_name(*a).cmp(&self.sort_name(*b)));
        ids
    }

    fn sort_name(&self, id: EntryId) -> String {
        self.entries
            .get(&id)
            .and_then(|entry| self.inner.attribute(&entry.inner, "name"))
            .and_then(|value| value.as_text().map(str::to_string))
            .unwrap_or_default()
    }

    fn entry(&self, handle: &Handle) -> Option<&SortedEntry> {
        if handle.source() != self.id {
            return None;
        }
        self.entries.get(&handle.entry())
    }
}

impl<S: TreeSource> TreeSource for SortedSource<S> {
    fn child_count(&self, parent: Option<&Handle>) -> usize {
        match parent {
            Some(handle) => self
                .entry(handle)
                .map(|entry| entry.children.len())
                .unwrap_or(0),
            None => self.roots.len(),
        }
    }

    fn child_at(&self, parent: Option<&Handle>, index: usize) -> Option<Handle> {
        let list = match parent {
            Some(handle) => &self.entry(handle)?.children,
            None => &self.roots,
        };
        list.get(index).map(|id| Handle::new(self.id, *id))
    }

    fn has_children(&self, handle: &Handle) -> bool {
        match self.entry(handle) {
            Some(entry) => !entry.children.is_empty() || self.inner.has_children(&entry.inner),
            None => false,
        }
    }

    fn is_valid(&self, handle: &Handle) -> bool {
        self.entry(handle).is_some()
    }

    fn attribute(&self, handle: &Handle, name: &str) -> Option<Value> {
        let entry = self.entry(handle)?;
        self.inner.attribute(&entry.inner, name)
    }

    fn column_count(&self) -> usize {
        self.inner.column_count()
    }

    fn can_fetch_more(&self, handle: &Handle) -> bool {
        self.entry(handle)
            .map(|entry| self.inner.can_fetch_more(&entry.inner))
            .unwrap_or(false)
    }

    fn fetch_more(&mut self, handle: &Handle) {
        let Some(inner_handle) = self.entry(handle).map(|entry| entry.inner) else {
            return;
        };
        self.inner.fetch_more(&inner_handle);
        // The granular insert events cannot be re-mapped through the
        // sorted order; fold them into a re-snapshot.
        self.inner.take_events();
        self.resync();
    }

    fn take_events(&mut self) -> Vec<SourceEvent> {
        if !self.inner.take_events().is_empty() {
            self.resync();
        }
        std::mem::take(&mut self.events)
    }

    fn as_layer(&self) -> Option<&dyn SourceLayer> {
        Some(self)
    }
}

impl<S: TreeSource> SourceLayer for SortedSource<S> {
    fn map_to_inner(&self, handle: &Handle) -> Option<Handle> {
        self.entry(handle).map(|entry| entry.inner)
    }

    fn inner(&self) -> &dyn TreeSource {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemorySource;
    use pretty_assertions::assert_eq;

    fn names(source: &impl TreeSource, parent: Option<&Handle>) -> Vec<String> {
        (0..source.child_count(parent))
            .filter_map(|index| source.child_at(parent, index))
            .filter_map(|handle| source.attribute(&handle, "name"))
            .filter_map(|value| value.as_text().map(str::to_string))
            .collect()
    }

    fn fixture() -> MemorySource {
        let mut source = MemorySource::new();
        let zoo = source.add_root("zoo");
        source.add_root("apple");
        source.add_child(&zoo, "wolf").unwrap();
        source.add_child(&zoo, "ant").unwrap();
        source
    }

    #[test]
    fn siblings_come_out_sorted() {
        let sorted = SortedSource::new(fixture());
        assert_eq!(names(&sorted, None), vec!["apple", "zoo"]);
        let zoo = sorted.child_at(None, 1).unwrap();
        assert_eq!(names(&sorted, Some(&zoo)), vec!["ant", "wolf"]);
    }

    #[test]
    fn handles_translate_to_the_wrapped_source() {
        let sorted = SortedSource::new(fixture());
        let apple = sorted.child_at(None, 0).unwrap();
        let inner = sorted.map_to_inner(&apple).unwrap();
        assert_eq!(
            sorted.inner().attribute(&inner, "name"),
            Some(Value::from("apple"))
        );
    }

    #[test]
    fn resync_invalidates_raw_handles() {
        let mut sorted = SortedSource::new(fixture());
        let apple = sorted.child_at(None, 0).unwrap();
        sorted.resync();

        assert!(!sorted.is_valid(&apple));
        assert!(sorted.map_to_inner(&apple).is_none());
        // Same position, fresh handle, same underlying entry.
        let apple_again = sorted.child_at(None, 0).unwrap();
        assert_ne!(apple, apple_again);
        assert_eq!(
            sorted.attribute(&apple_again, "name"),
            Some(Value::from("apple"))
        );
    }

    #[test]
    fn inner_mutations_degrade_to_layout_change() {
        let mut sorted = SortedSource::new(fixture());
        sorted.inner_mut().add_root("middle");

        let events = sorted.take_events();
        assert_eq!(events, vec![SourceEvent::LayoutChanged]);
        assert_eq!(names(&sorted, None), vec!["apple", "middle", "zoo"]);
    }
}
