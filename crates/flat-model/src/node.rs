//! The mirrored tree: nodes and their arena storage

use std::fmt;

use smallvec::SmallVec;
use tree_source::Handle;

/// Identifier for a node in the mirrored tree
///
/// An index into the arena's slot vector. Slots are recycled when
/// subtrees are removed, so an id is only meaningful while its node is
/// alive; all ids circulating in the view model refer to live nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Create a NodeId from a slot index
    pub(crate) const fn new(index: usize) -> Self {
        NodeId(index)
    }

    /// Get the slot index
    pub(crate) const fn get(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// One mirrored entry of the source tree
///
/// Carries the per-node view state on top of the source handle. `depth`
/// is fixed at construction (root = 0, child = parent + 1); `hidden` is
/// a display attribute maintained by the cascade rules, not a filter.
#[derive(Debug, Clone)]
pub struct ViewNode {
    /// The source entry this node mirrors
    pub handle: Handle,
    /// Owning node, `None` for a root
    pub parent: Option<NodeId>,
    /// Children in source order
    pub children: SmallVec<[NodeId; 4]>,
    /// Indentation level
    pub depth: usize,
    /// Whether the node is unfolded
    pub expanded: bool,
    /// Whether some ancestor is collapsed or hidden
    pub hidden: bool,
}

/// Slot-vector storage for [`ViewNode`]s
///
/// Freed slots go on a free list and get recycled by later insertions,
/// so removing and re-growing subtrees does not grow the arena without
/// bound.
#[derive(Debug, Default)]
pub struct NodeArena {
    slots: Vec<Option<ViewNode>>,
    free: Vec<NodeId>,
}

impl NodeArena {
    /// Create an empty arena
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a node, returning its id
    pub fn insert(&mut self, node: ViewNode) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.slots[id.get()] = Some(node);
                id
            }
            None => {
                let id = NodeId::new(self.slots.len());
                self.slots.push(Some(node));
                id
            }
        }
    }

    /// Get a node by id
    pub fn node(&self, id: NodeId) -> Option<&ViewNode> {
        self.slots.get(id.get()).and_then(|slot| slot.as_ref())
    }

    /// Get a node mutably by id
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut ViewNode> {
        self.slots.get_mut(id.get()).and_then(|slot| slot.as_mut())
    }

    /// Free a node's slot, returning the node
    pub fn remove(&mut self, id: NodeId) -> Option<ViewNode> {
        let node = self.slots.get_mut(id.get()).and_then(|slot| slot.take());
        if node.is_some() {
            self.free.push(id);
        }
        node
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Whether the arena holds no live nodes
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop everything
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree_source::{EntryId, SourceId};

    fn node(depth: usize) -> ViewNode {
        ViewNode {
            handle: Handle::new(SourceId::next(), EntryId::new(0)),
            parent: None,
            children: SmallVec::new(),
            depth,
            expanded: false,
            hidden: false,
        }
    }

    #[test]
    fn insert_and_lookup() {
        let mut arena = NodeArena::new();
        let a = arena.insert(node(0));
        let b = arena.insert(node(1));

        assert_ne!(a, b);
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.node(a).unwrap().depth, 0);
        assert_eq!(arena.node(b).unwrap().depth, 1);
    }

    #[test]
    fn removed_slots_are_recycled() {
        let mut arena = NodeArena::new();
        let a = arena.insert(node(0));
        let _b = arena.insert(node(1));

        assert!(arena.remove(a).is_some());
        assert!(arena.node(a).is_none());
        assert_eq!(arena.len(), 1);

        let c = arena.insert(node(2));
        assert_eq!(c, a);
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn double_remove_is_harmless() {
        let mut arena = NodeArena::new();
        let a = arena.insert(node(0));
        assert!(arena.remove(a).is_some());
        assert!(arena.remove(a).is_none());
        assert_eq!(arena.len(), 0);
        assert!(arena.is_empty());
    }
}
