//! The composite editing verbs: splitting, merging, wrapping, moving,
//! deleting, and mark handling over real documents.

mod common;

use pretty_assertions::assert_eq;
use serde_json::json;

use common::{editor_with, figure, marked, para, quote, text, void_editor};
use weft::{
    Element, LiftNodesOptions, MergeNodesOptions, MoveNodesOptions, Point, Props, Range,
    SplitNodesOptions, TextUnit, UnwrapNodesOptions, WrapNodesOptions,
};

#[test]
fn insert_text_at_cursor() {
    let mut editor = editor_with(vec![para(vec![text("cat")])]);
    editor.select(Point::new(vec![0, 0], 2)).unwrap();
    editor.insert_text("ra").unwrap();
    assert_eq!(editor.children(), &[para(vec![text("carat")])]);
    let selection = editor.selection.clone().unwrap();
    assert_eq!(selection.anchor, Point::new(vec![0, 0], 4));
}

#[test]
fn insert_break_splits_the_block() {
    let mut editor = editor_with(vec![para(vec![text("hello")])]);
    editor.select(Point::new(vec![0, 0], 2)).unwrap();
    editor.insert_break().unwrap();
    assert_eq!(editor.children(), &[para(vec![text("he")]), para(vec![text("llo")])]);
    let selection = editor.selection.clone().unwrap();
    assert!(selection.is_collapsed());
    assert_eq!(selection.anchor, Point::new(vec![1, 0], 0));
}

#[test]
fn split_nodes_between_distinct_leaves() {
    // The same divider, addressed from either side of the leaf boundary.
    for point in [Point::new(vec![0, 0], 2), Point::new(vec![0, 1], 0)] {
        let mut editor = editor_with(vec![para(vec![
            marked("ab", "run", json!(0)),
            marked("cd", "run", json!(1)),
        ])]);
        editor
            .split_nodes(SplitNodesOptions { at: Some(point.into()), ..Default::default() })
            .unwrap();
        assert_eq!(
            editor.children(),
            &[
                para(vec![marked("ab", "run", json!(0))]),
                para(vec![marked("cd", "run", json!(1))]),
            ],
        );
    }
}

#[test]
fn split_at_a_block_edge_without_always_is_a_no_op() {
    let mut editor = editor_with(vec![para(vec![text("ab")])]);
    for offset in [0, 2] {
        editor
            .split_nodes(SplitNodesOptions {
                at: Some(Point::new(vec![0, 0], offset).into()),
                ..Default::default()
            })
            .unwrap();
    }
    assert_eq!(editor.children(), &[para(vec![text("ab")])]);
}

#[test]
fn insert_break_at_block_edges_leaves_an_empty_block() {
    let mut editor = editor_with(vec![para(vec![text("ab")])]);
    editor.select(Point::new(vec![0, 0], 0)).unwrap();
    editor.insert_break().unwrap();
    assert_eq!(editor.children(), &[para(vec![text("")]), para(vec![text("ab")])]);
    assert_eq!(editor.selection.clone().unwrap().anchor, Point::new(vec![1, 0], 0));

    let mut editor = editor_with(vec![para(vec![text("ab")])]);
    editor.select(Point::new(vec![0, 0], 2)).unwrap();
    editor.insert_break().unwrap();
    assert_eq!(editor.children(), &[para(vec![text("ab")]), para(vec![text("")])]);
    assert_eq!(editor.selection.clone().unwrap().anchor, Point::new(vec![1, 0], 0));
}

#[test]
fn delete_across_blocks_merges_them() {
    let mut editor =
        editor_with(vec![para(vec![text("hello")]), para(vec![text("world")])]);
    editor
        .select(Range::new(Point::new(vec![0, 0], 3), Point::new(vec![1, 0], 2)))
        .unwrap();
    editor.delete_fragment().unwrap();
    assert_eq!(editor.children(), &[para(vec![text("helrld")])]);
    let selection = editor.selection.clone().unwrap();
    assert!(selection.is_collapsed());
    assert_eq!(selection.anchor, Point::new(vec![0, 0], 3));
}

#[test]
fn delete_backward_removes_one_character() {
    let mut editor = editor_with(vec![para(vec![text("abc")])]);
    editor.select(Point::new(vec![0, 0], 3)).unwrap();
    editor.delete_backward(TextUnit::Character).unwrap();
    assert_eq!(editor.children(), &[para(vec![text("ab")])]);
}

#[test]
fn delete_within_one_leaf() {
    let mut editor = editor_with(vec![para(vec![text("abcd")])]);
    editor
        .select(Range::new(Point::new(vec![0, 0], 1), Point::new(vec![0, 0], 3)))
        .unwrap();
    editor.delete_fragment().unwrap();
    assert_eq!(editor.children(), &[para(vec![text("ad")])]);
}

#[test]
fn add_mark_splits_the_selected_span() {
    let mut editor = editor_with(vec![para(vec![text("abcd")])]);
    editor
        .select(Range::new(Point::new(vec![0, 0], 1), Point::new(vec![0, 0], 3)))
        .unwrap();
    editor.add_mark("bold", json!(true)).unwrap();
    assert_eq!(
        editor.children(),
        &[para(vec![text("a"), marked("bc", "bold", json!(true)), text("d")])],
    );
}

#[test]
fn remove_mark_unsets_across_the_selection() {
    let mut editor = editor_with(vec![para(vec![marked("ab", "bold", json!(true))])]);
    editor
        .select(Range::new(Point::new(vec![0, 0], 0), Point::new(vec![0, 0], 2)))
        .unwrap();
    editor.remove_mark("bold").unwrap();
    assert_eq!(editor.children(), &[para(vec![text("ab")])]);
}

#[test]
fn pending_mark_applies_to_the_next_insertion() {
    let mut editor = editor_with(vec![para(vec![text("a")])]);
    editor.select(Point::new(vec![0, 0], 1)).unwrap();
    editor.add_mark("bold", json!(true)).unwrap();
    assert!(editor.children() == &[para(vec![text("a")])]);
    editor.insert_text("hi").unwrap();
    assert_eq!(
        editor.children(),
        &[para(vec![text("a"), marked("hi", "bold", json!(true))])],
    );
}

#[test]
fn wrap_then_unwrap_is_identity() {
    let original = vec![para(vec![text("a")]), para(vec![text("b")])];
    let mut editor = editor_with(original.clone());
    editor
        .select(Range::new(Point::new(vec![0, 0], 0), Point::new(vec![1, 0], 1)))
        .unwrap();

    let mut props = Props::new();
    props.insert("kind".into(), json!("quote"));
    editor
        .wrap_nodes(Element::with_props(vec![], props), WrapNodesOptions::default())
        .unwrap();
    assert_eq!(
        editor.children(),
        &[quote(vec![para(vec![text("a")]), para(vec![text("b")])])],
    );

    editor
        .unwrap_nodes(UnwrapNodesOptions {
            at: Some(vec![0].into()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(editor.children(), original.as_slice());
}

#[test]
fn lift_middle_child_splits_its_parent() {
    let mut editor = editor_with(vec![quote(vec![
        para(vec![text("a")]),
        para(vec![text("b")]),
        para(vec![text("c")]),
    ])]);
    editor
        .lift_nodes(LiftNodesOptions { at: Some(vec![0, 1].into()), ..Default::default() })
        .unwrap();
    assert_eq!(
        editor.children(),
        &[
            quote(vec![para(vec![text("a")])]),
            para(vec![text("b")]),
            quote(vec![para(vec![text("c")])]),
        ],
    );
}

#[test]
fn lift_first_and_last_children() {
    let mut editor = editor_with(vec![quote(vec![
        para(vec![text("a")]),
        para(vec![text("b")]),
    ])]);
    editor
        .lift_nodes(LiftNodesOptions { at: Some(vec![0, 0].into()), ..Default::default() })
        .unwrap();
    assert_eq!(
        editor.children(),
        &[para(vec![text("a")]), quote(vec![para(vec![text("b")])])],
    );
    editor
        .lift_nodes(LiftNodesOptions { at: Some(vec![1, 0].into()), ..Default::default() })
        .unwrap();
    assert_eq!(editor.children(), &[para(vec![text("a")]), para(vec![text("b")])]);
}

#[test]
fn merging_out_of_a_void_wrapper_removes_the_husk() {
    let mut editor =
        void_editor(vec![para(vec![text("a")]), figure(vec![para(vec![text("b")])])]);
    editor
        .merge_nodes(MergeNodesOptions {
            at: Some(Point::new(vec![1, 0, 0], 0).into()),
            voids: true,
            ..Default::default()
        })
        .unwrap();
    // The emptied wrapper is removed whole, never merged into.
    assert_eq!(editor.children(), &[para(vec![text("ab")])]);
}

#[test]
fn move_nodes_reorders_blocks() {
    let mut editor = editor_with(vec![
        para(vec![text("a")]),
        para(vec![text("b")]),
        para(vec![text("c")]),
    ]);
    editor
        .move_nodes(MoveNodesOptions {
            at: Some(vec![0].into()),
            to: vec![2].into(),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(
        editor.children(),
        &[para(vec![text("b")]), para(vec![text("c")]), para(vec![text("a")])],
    );
}

#[test]
fn insert_fragment_merges_inline_content() {
    let mut editor = editor_with(vec![para(vec![text("hello")])]);
    editor.select(Point::new(vec![0, 0], 2)).unwrap();
    editor.insert_fragment(vec![para(vec![text("X")])]).unwrap();
    assert_eq!(editor.children(), &[para(vec![text("heXllo")])]);
}

#[test]
fn insert_fragment_appends_extra_blocks() {
    let mut editor = editor_with(vec![para(vec![text("hello")])]);
    editor.select(Point::new(vec![0, 0], 5)).unwrap();
    editor
        .insert_fragment(vec![para(vec![text("A")]), para(vec![text("B")])])
        .unwrap();
    assert_eq!(
        editor.children(),
        &[para(vec![text("helloA")]), para(vec![text("B")])],
    );
}

#[test]
fn before_and_after_clamp_to_the_document_edges() {
    let editor = editor_with(vec![para(vec![text("ab")])]);
    assert_eq!(
        editor.before(Point::new(vec![0, 0], 1), 5, TextUnit::Offset).unwrap(),
        Some(Point::new(vec![0, 0], 0)),
    );
    assert_eq!(editor.before(Point::new(vec![0, 0], 0), 1, TextUnit::Offset).unwrap(), None);
    assert_eq!(
        editor.after(Point::new(vec![0, 0], 1), 5, TextUnit::Offset).unwrap(),
        Some(Point::new(vec![0, 0], 2)),
    );
    assert_eq!(editor.after(Point::new(vec![0, 0], 2), 1, TextUnit::Offset).unwrap(), None);
}

#[test]
fn string_spans_block_boundaries() {
    let mut editor =
        editor_with(vec![para(vec![text("hello")]), para(vec![text("world")])]);
    editor
        .select(Range::new(Point::new(vec![0, 0], 2), Point::new(vec![1, 0], 2)))
        .unwrap();
    let range = editor.selection.clone().unwrap();
    assert_eq!(editor.string(range, false).unwrap(), "llowo");
}

#[test]
fn fragment_returns_the_selected_slice() {
    let editor =
        editor_with(vec![para(vec![text("hello")]), para(vec![text("world")])]);
    let range = Range::new(Point::new(vec![0, 0], 3), Point::new(vec![1, 0], 2));
    assert_eq!(
        editor.fragment(range).unwrap(),
        vec![para(vec![text("lo")]), para(vec![text("wo")])],
    );
}
