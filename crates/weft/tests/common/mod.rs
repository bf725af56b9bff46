#![allow(dead_code)]

use serde_json::{json, Value};

use weft::{Editor, EditorConfig, Element, Node, Props, Text};

pub fn text(s: &str) -> Node {
    Node::Text(Text::new(s))
}

pub fn marked(s: &str, key: &str, value: Value) -> Node {
    let mut marks = Props::new();
    marks.insert(key.to_string(), value);
    Node::Text(Text::with_marks(s, marks))
}

pub fn para(children: Vec<Node>) -> Node {
    let mut props = Props::new();
    props.insert("kind".into(), json!("paragraph"));
    Node::Element(Element::with_props(children, props))
}

pub fn quote(children: Vec<Node>) -> Node {
    let mut props = Props::new();
    props.insert("kind".into(), json!("quote"));
    Node::Element(Element::with_props(children, props))
}

pub fn link(children: Vec<Node>) -> Node {
    let mut props = Props::new();
    props.insert("kind".into(), json!("link"));
    props.insert("inline".into(), json!(true));
    Node::Element(Element::with_props(children, props))
}

pub fn figure(children: Vec<Node>) -> Node {
    let mut props = Props::new();
    props.insert("kind".into(), json!("figure"));
    props.insert("void".into(), json!(true));
    Node::Element(Element::with_props(children, props))
}

pub fn editor_with(children: Vec<Node>) -> Editor {
    Editor::with_children(EditorConfig::default(), children)
}

/// An editor that treats elements tagged `"void": true` as void.
pub fn void_editor(children: Vec<Node>) -> Editor {
    let config = EditorConfig {
        is_void: Box::new(|element| element.props.get("void") == Some(&Value::Bool(true))),
        ..Default::default()
    };
    Editor::with_children(config, children)
}

/// An editor that treats elements tagged `"inline": true` as inline.
pub fn inline_editor(children: Vec<Node>) -> Editor {
    let config = EditorConfig {
        is_inline: Box::new(|element| element.props.get("inline") == Some(&Value::Bool(true))),
        ..Default::default()
    };
    Editor::with_children(config, children)
}
