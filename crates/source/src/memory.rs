//! In-memory tree source for fixtures, tests, and small applications

use std::collections::HashMap;

use anyhow::{bail, Result};

use crate::event::SourceEvent;
use crate::handle::{EntryId, Handle, SourceId};
use crate::traits::TreeSource;
use crate::value::Value;

/// One entry in the in-memory tree
#[derive(Debug, Clone)]
struct Entry {
    attrs: HashMap<String, Value>,
    children: Vec<EntryId>,
    /// Child names parked for lazy materialization
    deferred: Vec<String>,
}

impl Entry {
    fn named(name: &str) -> Self {
        let mut attrs = HashMap::new();
        attrs.insert("name".to_string(), Value::from(name));
        Self {
            attrs,
            children: Vec::new(),
            deferred: Vec::new(),
        }
    }
}

/// A tree source backed by plain in-memory entries
///
/// Built up imperatively (`add_root`, `add_child`, ...); every mutation
/// queues the matching [`SourceEvent`]. Children can also be *deferred*:
/// parked as plain names that only turn into real entries when
/// [`fetch_more`](TreeSource::fetch_more) runs, which is how lazy
/// materialization is exercised without a filesystem.
#[derive(Debug)]
pub struct MemorySource {
    id: SourceId,
    entries: HashMap<EntryId, Entry>,
    roots: Vec<EntryId>,
    next_entry: u64,
    events: Vec<SourceEvent>,
}

impl MemorySource {
    /// Create an empty source
    pub fn new() -> Self {
        Self {
            id: SourceId::next(),
            entries: HashMap::new(),
            roots: Vec::new(),
            next_entry: 1,
            events: Vec::new(),
        }
    }

    /// Append a new root-level entry
    pub fn add_root(&mut self, name: &str) -> Handle {
        let entry = self.alloc(name);
        self.roots.push(entry);
        let index = self.roots.len() - 1;
        self.events.push(SourceEvent::RowsInserted {
            parent: None,
            first: index,
            last: index,
        });
        Handle::new(self.id, entry)
    }

    /// Append a new child under `parent`
    pub fn add_child(&mut self, parent: &Handle, name: &str) -> Result<Handle> {
        let index = self.child_list(Some(parent))?.len();
        self.insert_child(parent, index, name)
    }

    /// Insert a new child under `parent` at `index`
    pub fn insert_child(&mut self, parent: &Handle, index: usize, name: &str) -> Result<Handle> {
        if self.entry(parent).is_none() {
            bail!("unknown parent handle {}", parent);
        }
        if index > self.child_list(Some(parent))?.len() {
            bail!("child index {} out of range under {}", index, parent);
        }
        let entry = self.alloc(name);
        if let Some(parent_entry) = self.entries.get_mut(&parent.entry()) {
            parent_entry.children.insert(index, entry);
        }
        self.events.push(SourceEvent::RowsInserted {
            parent: Some(*parent),
            first: index,
            last: index,
        });
        Ok(Handle::new(self.id, entry))
    }

    /// Remove children `[first, last]` of `parent` along with their
    /// subtrees
    pub fn remove_children(
        &mut self,
        parent: Option<&Handle>,
        first: usize,
        last: usize,
    ) -> Result<()> {
        let list = self.child_list(parent)?;
        if first > last || last >= list.len() {
            bail!("child range {}..={} out of range", first, last);
        }
        let removed: Vec<EntryId> = list[first..=last].to_vec();
        match parent {
            Some(handle) => {
                if let Some(parent_entry) = self.entries.get_mut(&handle.entry()) {
                    parent_entry.children.drain(first..=last);
                }
            }
            None => {
                self.roots.drain(first..=last);
            }
        }
        for entry in removed {
            self.drop_subtree(entry);
        }
        self.events.push(SourceEvent::RowsRemoved {
            parent: parent.copied(),
            first,
            last,
        });
        Ok(())
    }

    /// Park child names on `parent` for lazy materialization
    ///
    /// The parent reports `has_children` and `can_fetch_more` until
    /// `fetch_more` turns the names into real entries.
    pub fn defer_children<I, S>(&mut self, parent: &Handle, names: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match self.entry_mut(parent) {
            Some(entry) => {
                entry.deferred.extend(names.into_iter().map(Into::into));
                Ok(())
            }
            None => bail!("unknown parent handle {}", parent),
        }
    }

    /// Reverse the child order under `parent` and report it as a
    /// wholesale layout change
    pub fn reverse_children(&mut self, parent: Option<&Handle>) -> Result<()> {
        match parent {
            Some(handle) => match self.entry_mut(handle) {
                Some(entry) => entry.children.reverse(),
                None => bail!("unknown parent handle {}", handle),
            },
            None => self.roots.reverse(),
        }
        self.events.push(SourceEvent::LayoutChanged);
        Ok(())
    }

    fn alloc(&mut self, name: &str) -> EntryId {
        let entry = EntryId::new(self.next_entry);
        self.next_entry += 1;
        self.entries.insert(entry, Entry::named(name));
        entry
    }

    fn drop_subtree(&mut self, entry: EntryId) {
        if let Some(removed) = self.entries.remove(&entry) {
            for child in removed.children {
                self.drop_subtree(child);
            }
        }
    }

    fn entry(&self, handle: &Handle) -> Option<&Entry> {
        if handle.source() != self.id {
            return None;
        }
        self.entries.get(&handle.entry())
    }

    fn entry_mut(&mut self, handle: &Handle) -> Option<&mut Entry> {
        if handle.source() != self.id {
            return None;
        }
        self.entries.get_mut(&handle.entry())
    }

    fn child_list(&self, parent: Option<&Handle>) -> Result<&Vec<EntryId>> {
        match parent {
            Some(handle) => match self.entry(handle) {
                Some(entry) => Ok(&entry.children),
                None => bail!("unknown parent handle {}", handle),
            },
            None => Ok(&self.roots),
        }
    }
}

impl Default for MemorySource {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeSource for MemorySource {
    fn child_count(&self, parent: Option<&Handle>) -> usize {
        self.child_list(parent).map(|list| list.len()).unwrap_or(0)
    }

    fn child_at(&self, parent: Option<&Handle>, index: usize) -> Option<Handle> {
        let list = self.child_list(parent).ok()?;
        list.get(index).map(|entry| Handle::new(self.id, *entry))
    }

    fn has_children(&self, handle: &Handle) -> bool {
        // Deferred names count: the entry will have children once they
        // are materialized, and reporting them up front is what lets a
        // view offer the expansion toggle that triggers the load.
        self.entry(handle)
            .map(|entry| !entry.children.is_empty() || !entry.deferred.is_empty())
            .unwrap_or(false)
    }

    fn is_valid(&self, handle: &Handle) -> bool {
        self.entry(handle).is_some()
    }

    fn attribute(&self, handle: &Handle, name: &str) -> Option<Value> {
        self.entry(handle)?.attrs.get(name).cloned()
    }

    fn set_attribute(&mut self, handle: &Handle, name: &str, value: Value) -> bool {
        match self.entry_mut(handle) {
            Some(entry) => {
                entry.attrs.insert(name.to_string(), value);
                self.events.push(SourceEvent::DataChanged {
                    first: *handle,
                    last: *handle,
                });
                true
            }
            None => false,
        }
    }

    fn can_fetch_more(&self, handle: &Handle) -> bool {
        self.entry(handle)
            .map(|entry| !entry.deferred.is_empty())
            .unwrap_or(false)
    }

    fn fetch_more(&mut self, handle: &Handle) {
        let Some(entry) = self.entry(handle) else {
            return;
        };
        if entry.deferred.is_empty() {
            return;
        }
        let first = entry.children.len();
        let names = match self.entry_mut(handle) {
            Some(entry) => entry.deferred.split_off(0),
            None => return,
        };
        let mut created = Vec::with_capacity(names.len());
        for name in &names {
            created.push(self.alloc(name));
        }
        let mut last = None;
        if let Some(entry) = self.entry_mut(handle) {
            entry.children.extend(created.iter().copied());
            last = Some(entry.children.len() - 1);
        }
        if let Some(last) = last {
            self.events.push(SourceEvent::RowsInserted {
                parent: Some(*handle),
                first,
                last,
            });
        }
    }

    fn take_events(&mut self) -> Vec<SourceEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn mutations_emit_events() {
        let mut source = MemorySource::new();
        let root = source.add_root("root");
        let child = source.add_child(&root, "child").unwrap();
        source.set_attribute(&child, "size", Value::Int(3));

        assert_eq!(
            source.take_events(),
            vec![
                SourceEvent::RowsInserted {
                    parent: None,
                    first: 0,
                    last: 0
                },
                SourceEvent::RowsInserted {
                    parent: Some(root),
                    first: 0,
                    last: 0
                },
                SourceEvent::DataChanged {
                    first: child,
                    last: child
                },
            ]
        );
        assert!(source.take_events().is_empty());
    }

    #[test]
    fn deferred_children_materialize_on_fetch() {
        let mut source = MemorySource::new();
        let root = source.add_root("root");
        source.defer_children(&root, ["a", "b"]).unwrap();
        source.take_events();

        assert!(source.has_children(&root));
        assert!(source.can_fetch_more(&root));
        assert_eq!(source.child_count(Some(&root)), 0);

        source.fetch_more(&root);

        assert!(!source.can_fetch_more(&root));
        assert_eq!(source.child_count(Some(&root)), 2);
        let a = source.child_at(Some(&root), 0).unwrap();
        assert_eq!(source.attribute(&a, "name"), Some(Value::from("a")));
        assert_eq!(
            source.take_events(),
            vec![SourceEvent::RowsInserted {
                parent: Some(root),
                first: 0,
                last: 1
            }]
        );
    }

    #[test]
    fn remove_drops_whole_subtree() {
        let mut source = MemorySource::new();
        let root = source.add_root("root");
        let child = source.add_child(&root, "child").unwrap();
        let grandchild = source.add_child(&child, "grandchild").unwrap();
        source.take_events();

        source.remove_children(Some(&root), 0, 0).unwrap();

        assert_eq!(source.child_count(Some(&root)), 0);
        assert!(!source.is_valid(&child));
        assert!(!source.is_valid(&grandchild));
        assert_eq!(
            source.take_events(),
            vec![SourceEvent::RowsRemoved {
                parent: Some(root),
                first: 0,
                last: 0
            }]
        );
    }

    #[test]
    fn invalid_targets_are_rejected() {
        let mut source = MemorySource::new();
        let root = source.add_root("root");

        let mut other = MemorySource::new();
        let foreign = other.add_root("foreign");

        assert!(source.add_child(&foreign, "x").is_err());
        assert!(source.insert_child(&root, 5, "x").is_err());
        assert!(!source.is_valid(&foreign));
        assert!(source.remove_children(Some(&root), 0, 0).is_err());
    }

    #[test]
    fn reverse_reports_layout_change() {
        let mut source = MemorySource::new();
        source.add_root("a");
        source.add_root("b");
        source.take_events();

        source.reverse_children(None).unwrap();

        let first = source.child_at(None, 0).unwrap();
        assert_eq!(source.attribute(&first, "name"), Some(Value::from("b")));
        assert_eq!(source.take_events(), vec![SourceEvent::LayoutChanged]);
    }
}
