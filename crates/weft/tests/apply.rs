//! Primitive operations through `Editor::apply`: tree mutation, dirty-path
//! bookkeeping, selection transforms, and inverses.

mod common;

use pretty_assertions::assert_eq;
use serde_json::json;

use common::{editor_with, marked, para, quote, text};
use weft::{Node, Operation, Path, Point, Props, Range};

#[test]
fn insert_text_splices_into_leaf() {
    let mut editor = editor_with(vec![para(vec![text("cat")])]);
    editor
        .apply(Operation::InsertText {
            path: Path::from(vec![0, 0]),
            offset: 2,
            text: "ra".into(),
        })
        .unwrap();
    assert_eq!(editor.children(), &[para(vec![text("carat")])]);
    // The batch flushed, so the operation log is drained.
    assert!(editor.operations.is_empty());
}

#[test]
fn remove_text_splices_out_of_leaf() {
    let mut editor = editor_with(vec![para(vec![text("carat")])]);
    editor
        .apply(Operation::RemoveText {
            path: Path::from(vec![0, 0]),
            offset: 2,
            text: "ra".into(),
        })
        .unwrap();
    assert_eq!(editor.children(), &[para(vec![text("cat")])]);
}

#[test]
fn insert_node_dirties_levels_and_inserted_subtree() {
    let mut editor = editor_with(vec![quote(vec![
        para(vec![text("a")]),
        para(vec![text("b")]),
    ])]);
    editor
        .without_normalizing(|e| {
            e.apply(Operation::InsertNode {
                path: Path::from(vec![0, 2]),
                node: para(vec![text("c"), marked("d", "run", json!(1))]),
            })?;
            let mut dirty = e.dirty_snapshot();
            dirty.sort_by(|a, b| a.as_slice().cmp(b.as_slice()));
            assert_eq!(
                dirty,
                vec![
                    Path::from(vec![]),
                    Path::from(vec![0]),
                    Path::from(vec![0, 2]),
                    Path::from(vec![0, 2, 0]),
                    Path::from(vec![0, 2, 1]),
                ],
            );
            Ok(())
        })
        .unwrap();
}

#[test]
fn selection_rides_along_with_text_edits() {
    let mut editor = editor_with(vec![para(vec![text("hello")])]);
    editor.select(Point::new(vec![0, 0], 3)).unwrap();
    editor
        .apply(Operation::InsertText { path: Path::from(vec![0, 0]), offset: 1, text: "xy".into() })
        .unwrap();
    let selection = editor.selection.clone().unwrap();
    assert_eq!(selection.anchor, Point::new(vec![0, 0], 5));
    assert!(selection.is_collapsed());
}

#[test]
fn selection_snaps_to_neighbor_when_its_leaf_is_removed() {
    let mut editor =
        editor_with(vec![para(vec![text("one")]), para(vec![text("two")])]);
    editor.select(Point::new(vec![1, 0], 2)).unwrap();
    let node = editor.children()[1].clone();
    editor.apply(Operation::RemoveNode { path: Path::from(vec![1]), node }).unwrap();
    let selection = editor.selection.clone().unwrap();
    assert_eq!(selection.anchor, Point::new(vec![0, 0], 3));
}

#[test]
fn set_selection_updates_only_given_fields() {
    let mut editor = editor_with(vec![para(vec![text("hello")])]);
    let range = Range::new(Point::new(vec![0, 0], 1), Point::new(vec![0, 0], 4));
    editor.select(range).unwrap();
    editor
        .apply(Operation::SetSelection {
            properties: None,
            new_properties: Some(weft::SelectionProps {
                focus: Some(Point::new(vec![0, 0], 2)),
                ..Default::default()
            }),
        })
        .unwrap();
    let selection = editor.selection.clone().unwrap();
    assert_eq!(selection.anchor, Point::new(vec![0, 0], 1));
    assert_eq!(selection.focus, Point::new(vec![0, 0], 2));
}

// ── Inverses ─────────────────────────────────────────────────────────────

/// Apply an operation and then its inverse inside one batch; the tree must
/// come back byte-identical.
fn assert_roundtrip(children: Vec<Node>, op: Operation) {
    let mut editor = editor_with(children.clone());
    editor
        .without_normalizing(|e| {
            e.apply(op.clone())?;
            e.apply(op.inverse()?)?;
            assert_eq!(e.children(), children.as_slice());
            Ok(())
        })
        .unwrap();
}

#[test]
fn insert_node_inverts() {
    assert_roundtrip(
        vec![para(vec![text("a")])],
        Operation::InsertNode { path: Path::from(vec![1]), node: para(vec![text("b")]) },
    );
}

#[test]
fn remove_node_inverts() {
    let children = vec![para(vec![text("a")]), para(vec![text("b")])];
    let node = children[0].clone();
    assert_roundtrip(children, Operation::RemoveNode { path: Path::from(vec![0]), node });
}

#[test]
fn text_operations_invert() {
    assert_roundtrip(
        vec![para(vec![text("hello")])],
        Operation::InsertText { path: Path::from(vec![0, 0]), offset: 5, text: " world".into() },
    );
    assert_roundtrip(
        vec![para(vec![text("hello")])],
        Operation::RemoveText { path: Path::from(vec![0, 0]), offset: 1, text: "ell".into() },
    );
}

#[test]
fn split_and_merge_invert() {
    assert_roundtrip(
        vec![para(vec![text("hello")])],
        Operation::SplitNode { path: Path::from(vec![0, 0]), position: 2, properties: Props::new() },
    );
    // Element-level split: the right half keeps the recorded properties.
    let mut props = Props::new();
    props.insert("kind".into(), json!("paragraph"));
    assert_roundtrip(
        vec![para(vec![marked("a", "run", json!(0)), marked("b", "run", json!(1))])],
        Operation::SplitNode { path: Path::from(vec![0]), position: 1, properties: props.clone() },
    );
    assert_roundtrip(
        vec![para(vec![text("ab")]), para(vec![text("cd")])],
        Operation::MergeNode { path: Path::from(vec![1]), position: 1, properties: props },
    );
}

#[test]
fn move_node_inverts() {
    assert_roundtrip(
        vec![para(vec![text("a")]), para(vec![text("b")]), para(vec![text("c")])],
        Operation::MoveNode { path: Path::from(vec![0]), new_path: Path::from(vec![2]) },
    );
    assert_roundtrip(
        vec![quote(vec![para(vec![text("a")])]), para(vec![text("b")])],
        Operation::MoveNode { path: Path::from(vec![1]), new_path: Path::from(vec![0, 1]) },
    );
}

#[test]
fn set_node_inverts() {
    let mut new_props = Props::new();
    new_props.insert("align".into(), json!("right"));
    assert_roundtrip(
        vec![para(vec![text("a")])],
        Operation::SetNode {
            path: Path::from(vec![0]),
            properties: Props::new(),
            new_properties: new_props,
        },
    );
}

#[test]
fn set_selection_inverts() {
    let mut editor = editor_with(vec![para(vec![text("hello")])]);
    editor.select(Point::new(vec![0, 0], 1)).unwrap();
    let before = editor.selection.clone();
    let op = Operation::SetSelection {
        properties: Some(weft::SelectionProps {
            anchor: Some(Point::new(vec![0, 0], 1)),
            focus: Some(Point::new(vec![0, 0], 1)),
            ..Default::default()
        }),
        new_properties: Some(weft::SelectionProps {
            anchor: Some(Point::new(vec![0, 0], 4)),
            focus: Some(Point::new(vec![0, 0], 4)),
            ..Default::default()
        }),
    };
    editor.apply(op.clone()).unwrap();
    assert_eq!(editor.selection.clone().unwrap().anchor, Point::new(vec![0, 0], 4));
    editor.apply(op.inverse().unwrap()).unwrap();
    assert_eq!(editor.selection, before);
}

#[test]
fn document_wire_form_is_the_children_array() {
    let editor = editor_with(vec![para(vec![marked("hi", "bold", json!(true))])]);
    let v = serde_json::to_value(editor.root()).unwrap();
    assert_eq!(
        v,
        json!([{
            "children": [{"text": "hi", "bold": true}],
            "kind": "paragraph",
        }]),
    );
}
