use flat_model::FlatTreeModel;
use proptest::prelude::*;
use tree_source::{Handle, MemorySource};

/// Shape of a generated tree; only the structure matters
#[derive(Debug, Clone)]
struct Shape {
    children: Vec<Shape>,
}

fn shapes() -> impl Strategy<Value = Vec<Shape>> {
    let leaf = Just(Shape {
        children: Vec::new(),
    });
    let node = leaf.prop_recursive(3, 24, 3, |inner| {
        prop::collection::vec(inner, 0..4).prop_map(|children| Shape { children })
    });
    prop::collection::vec(node, 1..4)
}

/// Build the shapes into a source, recording each entry's handle and
/// parent in depth-first pre-order
fn build(
    source: &mut MemorySource,
    parent: Option<Handle>,
    shapes: &[Shape],
    counter: &mut usize,
    preorder: &mut Vec<(Handle, Option<Handle>)>,
) {
    for shape in shapes {
        let name = format!("n{}", *counter);
        *counter += 1;
        let handle = match &parent {
            Some(parent) => source.add_child(parent, &name).unwrap(),
            None => source.add_root(&name),
        };
        preorder.push((handle, parent));
        build(source, Some(handle), &shape.children, counter, preorder);
    }
}

fn fixture(shapes: &[Shape]) -> (FlatTreeModel<MemorySource>, Vec<(Handle, Option<Handle>)>) {
    let mut source = MemorySource::new();
    let mut preorder = Vec::new();
    build(&mut source, None, shapes, &mut 0, &mut preorder);
    (FlatTreeModel::new(source), preorder)
}

/// Toggle expansion on visible rows only, the way a renderer would
fn apply_ops(
    model: &mut FlatTreeModel<MemorySource>,
    ops: &[(prop::sample::Index, bool)],
) {
    for (target, expanded) in ops {
        let row = target.index(model.row_count());
        if model.is_hidden(row) == Some(false) {
            model.set_expanded(row, *expanded);
        }
    }
}

fn hidden_vector(model: &FlatTreeModel<MemorySource>) -> Vec<bool> {
    (0..model.row_count())
        .map(|row| model.is_hidden(row).unwrap())
        .collect()
}

proptest! {
    /// Every explored entry gets exactly one row, in pre-order
    #[test]
    fn flat_order_is_the_preorder_of_the_source(shapes in shapes()) {
        let (model, preorder) = fixture(&shapes);

        prop_assert_eq!(model.row_count(), preorder.len());
        for (row, (handle, _)) in preorder.iter().enumerate() {
            prop_assert_eq!(model.handle_at(row), Some(*handle));
            prop_assert_eq!(model.row_for_handle(handle), Some(row));
        }
    }

    /// Roots sit at depth zero and every child one below its parent
    #[test]
    fn depth_is_parent_depth_plus_one(shapes in shapes()) {
        let (model, preorder) = fixture(&shapes);

        for (row, (_, parent)) in preorder.iter().enumerate() {
            let depth = model.indentation(row).unwrap();
            match parent {
                Some(parent) => {
                    let parent_row = model.row_for_handle(parent).unwrap();
                    prop_assert_eq!(depth, model.indentation(parent_row).unwrap() + 1);
                }
                None => prop_assert_eq!(depth, 0),
            }
        }
    }

    /// A row is hidden exactly when its parent is hidden or collapsed,
    /// no matter what sequence of toggles got us here
    #[test]
    fn hidden_follows_collapsed_and_hidden_ancestors(
        shapes in shapes(),
        ops in prop::collection::vec((any::<prop::sample::Index>(), any::<bool>()), 0..16),
    ) {
        let (mut model, preorder) = fixture(&shapes);
        apply_ops(&mut model, &ops);

        for (row, (_, parent)) in preorder.iter().enumerate() {
            let hidden = model.is_hidden(row).unwrap();
            match parent {
                Some(parent) => {
                    let parent_row = model.row_for_handle(parent).unwrap();
                    let expected = model.is_hidden(parent_row).unwrap()
                        || !model.is_expanded(parent_row).unwrap();
                    prop_assert_eq!(hidden, expected);
                }
                None => prop_assert!(!hidden),
            }
        }
    }

    /// Expanding and re-collapsing a row leaves the hidden states of
    /// the whole view exactly where they were
    #[test]
    fn expand_collapse_round_trips_the_hidden_vector(
        shapes in shapes(),
        ops in prop::collection::vec((any::<prop::sample::Index>(), any::<bool>()), 0..8),
        target in any::<prop::sample::Index>(),
    ) {
        let (mut model, _) = fixture(&shapes);
        apply_ops(&mut model, &ops);

        let row = target.index(model.row_count());
        // Start from a collapsed target; collapsing is idempotent.
        model.set_expanded(row, false);
        let before = hidden_vector(&model);

        model.set_expanded(row, true);
        model.set_expanded(row, false);

        prop_assert_eq!(hidden_vector(&model), before);
    }

    /// Toggling never moves, adds, or drops rows
    #[test]
    fn toggling_preserves_row_positions(
        shapes in shapes(),
        ops in prop::collection::vec((any::<prop::sample::Index>(), any::<bool>()), 0..16),
    ) {
        let (mut model, preorder) = fixture(&shapes);
        apply_ops(&mut model, &ops);

        prop_assert_eq!(model.row_count(), preorder.len());
        for (row, (handle, _)) in preorder.iter().enumerate() {
            prop_assert_eq!(model.handle_at(row), Some(*handle));
        }
    }
}
