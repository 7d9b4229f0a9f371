//! Resolving handles through transformation layers to a stable identity

use tree_source::{Handle, StableKey, TreeSource};

/// Resolve a handle down to the terminal source's identity
///
/// Walks the chain of transformation layers, translating the handle one
/// layer at a time, until a source that is not a transformation is
/// reached. The returned key is bound to that terminal source, so it
/// stays valid when an intermediate layer is torn down and reissues its
/// handles.
///
/// Returns `None` when the handle dangles anywhere along the chain or
/// names no live entry at the bottom; callers must not persist state
/// for such a handle.
pub fn canonical_key(source: &dyn TreeSource, handle: &Handle) -> Option<StableKey> {
    let mut source = source;
    let mut handle = *handle;
    while let Some(layer) = source.as_layer() {
        handle = layer.map_to_inner(&handle)?;
        source = layer.inner();
    }
    source.is_valid(&handle).then(|| StableKey::from(handle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree_source::{MemorySource, SortedSource};

    #[test]
    fn terminal_handles_resolve_to_themselves() {
        let mut source = MemorySource::new();
        let root = source.add_root("root");
        assert_eq!(
            canonical_key(&source, &root),
            Some(StableKey::from(root))
        );
    }

    #[test]
    fn dangling_handles_resolve_to_none() {
        let mut source = MemorySource::new();
        let root = source.add_root("root");
        source.remove_children(None, 0, 0).unwrap();
        assert_eq!(canonical_key(&source, &root), None);
    }

    #[test]
    fn layered_handles_resolve_through_the_chain() {
        let mut inner = MemorySource::new();
        let root = inner.add_root("root");
        let sorted = SortedSource::new(inner);

        let layered = sorted.child_at(None, 0).unwrap();
        assert_ne!(layered, root);
        assert_eq!(
            canonical_key(&sorted, &layered),
            Some(StableKey::from(root))
        );
    }
}
