//! Flattens a hierarchical data source into a single ordered row
//! sequence for list-style renderers.
//!
//! A tree widget is just a list widget with indentation: this crate
//! does the projection. It mirrors a [`TreeSource`](tree_source::TreeSource)
//! as a node tree, keeps a flat pre-order row sequence over the mirror,
//! and patches both incrementally as the source changes. Per-row view
//! state (expanded, hidden) lives on the mirror and is persisted under
//! identities resolved through any transformation layers, so it
//! survives the mirror or an intermediate layer being rebuilt.
//!
//! # Example
//!
//! ```
//! use flat_model::{attr, FlatTreeModel};
//! use tree_source::MemorySource;
//!
//! let mut source = MemorySource::new();
//! let root = source.add_root("Root");
//! source.add_child(&root, "Child").unwrap();
//!
//! let mut model = FlatTreeModel::new(source);
//! assert_eq!(model.row_count(), 2);
//! assert_eq!(model.is_hidden(1), Some(true));
//!
//! model.set_expanded(0, true);
//! assert_eq!(model.is_hidden(1), Some(false));
//! ```

mod event;
mod flat_index;
mod identity;
mod model;
mod node;
mod view_state;

pub use event::ViewEvent;
pub use flat_index::FlatIndex;
pub use identity::canonical_key;
pub use model::{attr, FlatTreeModel};
pub use node::{NodeArena, NodeId, ViewNode};
pub use view_state::{ViewState, ViewStateStore};
