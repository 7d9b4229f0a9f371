//! Filesystem tree source with lazy directory loading

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::warn;

use crate::event::SourceEvent;
use crate::handle::{EntryId, Handle, SourceId};
use crate::traits::TreeSource;
use crate::value::Value;

/// State of a directory's children
#[derive(Debug, Clone)]
enum ChildrenState {
    /// Not scanned yet
    NotLoaded,
    /// Scanned; may be empty
    Loaded(Vec<EntryId>),
}

#[derive(Debug, Clone)]
struct FsEntry {
    path: PathBuf,
    name: String,
    is_dir: bool,
    size: u64,
    children: ChildrenState,
}

/// A tree source over a directory hierarchy
///
/// Directories load their contents on demand: an unscanned directory
/// reports `has_children` optimistically and `can_fetch_more` until
/// [`fetch_more`](TreeSource::fetch_more) scans it. Children come out
/// directories-first, alphabetical within each group. Scan errors
/// degrade to an empty child list so a broken directory never takes the
/// whole view down.
#[derive(Debug)]
pub struct FsSource {
    id: SourceId,
    /// Arena of entries; an [`EntryId`] is an index into this vector.
    /// Entries are never removed, so indices stay stable.
    entries: Vec<FsEntry>,
    events: Vec<SourceEvent>,
}

impl FsSource {
    /// Create a source rooted at `path`, which must be a directory
    ///
    /// The root itself is the single root-level entry; its children load
    /// lazily.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = fs::metadata(path)
            .with_context(|| format!("reading metadata for {}", path.display()))?;
        if !metadata.is_dir() {
            bail!("{} is not a directory", path.display());
        }
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("root")
            .to_string();
        Ok(Self {
            id: SourceId::next(),
            entries: vec![FsEntry {
                path: path.to_path_buf(),
                name,
                is_dir: true,
                size: 0,
                children: ChildrenState::NotLoaded,
            }],
            events: Vec::new(),
        })
    }

    /// Full path of the entry behind a handle
    pub fn path_of(&self, handle: &Handle) -> Option<&Path> {
        self.entry(handle).map(|entry| entry.path.as_path())
    }

    fn entry(&self, handle: &Handle) -> Option<&FsEntry> {
        if handle.source() != self.id {
            return None;
        }
        self.entries.get(handle.entry().get() as usize)
    }

    fn handle_for(&self, index: usize) -> Handle {
        Handle::new(self.id, EntryId::new(index as u64))
    }

    /// Scan a directory into fresh entries, sorted directories-first
    fn scan(&mut self, dir: &Path) -> Vec<EntryId> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(error) => {
                warn!("failed to read {}: {}", dir.display(), error);
                return Vec::new();
            }
        };

        let mut created = Vec::new();
        for entry in entries.flatten() {
            let Ok(metadata) = entry.metadata() else {
                continue;
            };
            let name = entry.file_name().to_string_lossy().to_string();
            let index = self.entries.len();
            self.entries.push(FsEntry {
                path: entry.path(),
                name,
                is_dir: metadata.is_dir(),
                size: if metadata.is_dir() { 0 } else { metadata.len() },
                children: if metadata.is_dir() {
                    ChildrenState::NotLoaded
                } else {
                    ChildrenState::Loaded(Vec::new())
                },
            });
            created.push(EntryId::new(index as u64));
        }

        created.sort_by(|a, b| {
            let entry_a = &self.entries[a.get() as usize];
            let entry_b = &self.entries[b.get() as usize];
            match (entry_a.is_dir, entry_b.is_dir) {
                (true, false) => std::cmp::Ordering::Less,
                (false, true) => std::cmp::Ordering::Greater,
                _ => entry_a.name.cmp(&entry_b.name),
            }
        });
        created
    }
}

impl TreeSource for FsSource {
    fn child_count(&self, parent: Option<&Handle>) -> usize {
        match parent {
            Some(handle) => match self.entry(handle) {
                Some(FsEntry {
                    children: ChildrenState::Loaded(children),
                    ..
                }) => children.len(),
                _ => 0,
            },
            // The root directory is the only root-level entry.
            None => 1,
        }
    }

    fn child_at(&self, parent: Option<&Handle>, index: usize) -> Option<Handle> {
        match parent {
            Some(handle) => match &self.entry(handle)?.children {
                ChildrenState::Loaded(children) => children
                    .get(index)
                    .map(|entry| Handle::new(self.id, *entry)),
                ChildrenState::NotLoaded => None,
            },
            None => (index == 0).then(|| self.handle_for(0)),
        }
    }

    fn has_children(&self, handle: &Handle) -> bool {
        match self.entry(handle) {
            Some(entry) => match &entry.children {
                // Optimistic until scanned; the expansion toggle this
                // enables is what triggers the scan.
                ChildrenState::NotLoaded => entry.is_dir,
                ChildrenState::Loaded(children) => !children.is_empty(),
            },
            None => false,
        }
    }

    fn is_valid(&self, handle: &Handle) -> bool {
        self.entry(handle).is_some()
    }

    fn attribute(&self, handle: &Handle, name: &str) -> Option<Value> {
        let entry = self.entry(handle)?;
        match name {
            "name" => Some(Value::from(entry.name.as_str())),
            "size" => Some(Value::Int(entry.size as i64)),
            "is_dir" => Some(Value::Bool(entry.is_dir)),
            _ => None,
        }
    }

    fn can_fetch_more(&self, handle: &Handle) -> bool {
        self.entry(handle)
            .map(|entry| entry.is_dir && matches!(entry.children, ChildrenState::NotLoaded))
            .unwrap_or(false)
    }

    fn fetch_more(&mut self, handle: &Handle) {
        if !self.can_fetch_more(handle) {
            return;
        }
        let Some(dir) = self.entry(handle).map(|entry| entry.path.clone()) else {
            return;
        };
        let children = self.scan(&dir);
        let count = children.len();
        let slot = handle.entry().get() as usize;
        self.entries[slot].children = ChildrenState::Loaded(children);
        if count > 0 {
            self.events.push(SourceEvent::RowsInserted {
                parent: Some(*handle),
                first: 0,
                last: count - 1,
            });
        }
    }

    fn take_events(&mut self) -> Vec<SourceEvent> {
        std::mem::take(&mut self.events)
    }
}
