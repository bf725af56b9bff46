//! Live references and change batching.

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;

use common::{editor_with, para, text};
use weft::{Editor, EditorConfig, Operation, Path, Point, Range};

#[test]
fn path_ref_shifts_with_insertions() {
    let mut editor = editor_with(vec![para(vec![text("a")]), para(vec![text("b")])]);
    let tracked = editor.path_ref(Path::from(vec![1]));
    editor
        .apply(Operation::InsertNode { path: Path::from(vec![0]), node: para(vec![text("x")]) })
        .unwrap();
    assert_eq!(tracked.current(&editor), Some(&Path::from(vec![2])));
    assert_eq!(tracked.unref(&mut editor), Some(Path::from(vec![2])));
    // A consumed reference reads back nothing.
    assert_eq!(tracked.current(&editor), None);
}

#[test]
fn point_ref_dies_with_its_leaf() {
    let mut editor = editor_with(vec![para(vec![text("a")]), para(vec![text("b")])]);
    let tracked = editor.point_ref(Point::new(vec![0, 0], 1));
    let node = editor.children()[0].clone();
    editor.apply(Operation::RemoveNode { path: Path::from(vec![0]), node }).unwrap();
    assert_eq!(tracked.current(&editor), None);
}

#[test]
fn range_ref_spans_text_edits() {
    let mut editor = editor_with(vec![para(vec![text("abcd")])]);
    let tracked =
        editor.range_ref(Range::new(Point::new(vec![0, 0], 1), Point::new(vec![0, 0], 3)));
    editor
        .apply(Operation::InsertText { path: Path::from(vec![0, 0]), offset: 0, text: "xy".into() })
        .unwrap();
    let current = tracked.current(&editor).cloned().unwrap();
    assert_eq!(current.anchor, Point::new(vec![0, 0], 3));
    assert_eq!(current.focus, Point::new(vec![0, 0], 5));
}

#[test]
fn on_change_fires_once_per_batch() {
    let batches: Rc<RefCell<Vec<usize>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = batches.clone();
    let config = EditorConfig {
        on_change: Some(Box::new(move |_, ops| sink.borrow_mut().push(ops.len()))),
        ..Default::default()
    };
    let mut editor = Editor::with_children(config, vec![para(vec![text("ab")])]);

    editor
        .without_normalizing(|e| {
            e.apply(Operation::InsertText {
                path: Path::from(vec![0, 0]),
                offset: 2,
                text: "c".into(),
            })?;
            e.apply(Operation::InsertText {
                path: Path::from(vec![0, 0]),
                offset: 3,
                text: "d".into(),
            })?;
            Ok(())
        })
        .unwrap();
    assert_eq!(*batches.borrow(), vec![2]);

    editor
        .apply(Operation::InsertText { path: Path::from(vec![0, 0]), offset: 4, text: "e".into() })
        .unwrap();
    assert_eq!(*batches.borrow(), vec![2, 1]);
    assert_eq!(editor.children(), &[para(vec![text("abcde")])]);
}

#[test]
fn transform_verbs_coalesce_their_primitives() {
    let batches: Rc<RefCell<Vec<usize>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = batches.clone();
    let config = EditorConfig {
        on_change: Some(Box::new(move |_, ops| {
            sink.borrow_mut().push(ops.iter().filter(|op| op.is_node_operation()).count())
        })),
        ..Default::default()
    };
    let mut editor = Editor::with_children(config, vec![para(vec![text("hello")])]);
    editor.select(Point::new(vec![0, 0], 2)).unwrap();
    let calls_after_select = batches.borrow().len();
    editor.insert_break().unwrap();
    // One more notification, carrying the whole split.
    assert_eq!(batches.borrow().len(), calls_after_select + 1);
    assert!(*batches.borrow().last().unwrap() >= 2);
}
