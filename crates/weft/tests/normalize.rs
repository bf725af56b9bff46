//! The self-healing loop: built-in structural rules, custom hooks, and the
//! iteration cap.

mod common;

use pretty_assertions::assert_eq;
use serde_json::json;

use common::{editor_with, inline_editor, link, marked, para, text};
use weft::{
    Editor, EditorConfig, Element, Node, NodeRef, Path, Props, RemoveNodesOptions,
    SetNodesOptions, WeftError,
};

#[test]
fn childless_element_gains_an_empty_leaf() {
    let mut editor = editor_with(vec![Node::Element(Element::new(vec![]))]);
    editor.normalize(true).unwrap();
    assert_eq!(editor.children(), &[Node::Element(Element::new(vec![text("")]))]);
}

#[test]
fn adjacent_loose_equal_leaves_merge() {
    let mut editor = editor_with(vec![para(vec![text("foo"), text("bar")])]);
    editor.normalize(true).unwrap();
    assert_eq!(editor.children(), &[para(vec![text("foobar")])]);
}

#[test]
fn leaves_with_distinct_marks_stay_apart() {
    let children = vec![para(vec![marked("a", "bold", json!(true)), text("b")])];
    let mut editor = editor_with(children.clone());
    editor.normalize(true).unwrap();
    assert_eq!(editor.children(), children.as_slice());
}

#[test]
fn redundant_empty_leaves_are_dropped() {
    // An empty leaf between distinct neighbors carries no content.
    let mut editor =
        editor_with(vec![para(vec![marked("", "bold", json!(true)), text("x")])]);
    editor.normalize(true).unwrap();
    assert_eq!(editor.children(), &[para(vec![text("x")])]);

    // Same for a trailing empty leaf.
    let mut editor =
        editor_with(vec![para(vec![text("x"), marked("", "bold", json!(true))])]);
    editor.normalize(true).unwrap();
    assert_eq!(editor.children(), &[para(vec![text("x")])]);
}

#[test]
fn inline_elements_get_text_borders() {
    let mut editor = inline_editor(vec![para(vec![link(vec![text("a")])])]);
    editor.normalize(true).unwrap();
    assert_eq!(editor.children(), &[para(vec![text(""), link(vec![text("a")]), text("")])]);
}

#[test]
fn adjacent_inline_elements_get_a_separator_leaf() {
    let mut editor =
        inline_editor(vec![para(vec![link(vec![text("a")]), link(vec![text("b")])])]);
    editor.normalize(true).unwrap();
    assert_eq!(
        editor.children(),
        &[para(vec![
            text(""),
            link(vec![text("a")]),
            text(""),
            link(vec![text("b")]),
            text(""),
        ])],
    );
}

#[test]
fn block_sibling_in_inline_context_is_removed() {
    let mut editor = editor_with(vec![para(vec![text("a"), para(vec![text("b")])])]);
    editor.normalize(true).unwrap();
    assert_eq!(editor.children(), &[para(vec![text("a")])]);
}

#[test]
fn normalization_is_idempotent() {
    let mut editor = editor_with(vec![
        para(vec![text("foo"), text("bar"), marked("", "bold", json!(true))]),
        para(vec![text("x"), para(vec![text("y")])]),
    ]);
    editor.normalize(true).unwrap();
    let settled = editor.children().to_vec();
    editor.normalize(true).unwrap();
    assert_eq!(editor.children(), settled.as_slice());
}

#[test]
fn hook_can_enforce_a_schema() {
    let config = EditorConfig {
        normalize_node: Some(Box::new(|editor, path| {
            let banned = matches!(
                editor.root().get(path)?,
                NodeRef::Element(element) if element.props.get("banned") == Some(&json!(true))
            );
            if banned {
                editor.remove_nodes(RemoveNodesOptions {
                    at: Some(path.clone().into()),
                    ..Default::default()
                })?;
            }
            Ok(())
        })),
        ..Default::default()
    };
    let mut banned_props = Props::new();
    banned_props.insert("banned".into(), json!(true));
    let mut editor = Editor::with_children(
        config,
        vec![
            para(vec![text("keep")]),
            Node::Element(Element::with_props(vec![text("drop")], banned_props)),
        ],
    );
    editor.normalize(true).unwrap();
    assert_eq!(editor.children(), &[para(vec![text("keep")])]);
}

#[test]
fn runaway_hook_trips_the_iteration_cap() {
    let mut revision = 0u64;
    let config = EditorConfig {
        // Re-stamps the block on every pass, so the block never settles.
        normalize_node: Some(Box::new(move |editor, path| {
            if path.as_slice() == [0] {
                revision += 1;
                let mut props = Props::new();
                props.insert("rev".into(), json!(revision));
                editor.set_nodes(
                    props,
                    SetNodesOptions { at: Some(Path::from(vec![0]).into()), ..Default::default() },
                )?;
            }
            Ok(())
        })),
        ..Default::default()
    };
    let mut editor = Editor::with_children(config, vec![para(vec![text("x")])]);
    let err = editor.normalize(true).unwrap_err();
    assert!(matches!(err, WeftError::NormalizationLoop { .. }));
}
