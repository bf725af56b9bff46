//! Generators for normalized document trees and text operations.
//!
//! Generated documents are stable under normalization: every block holds at
//! least one non-empty leaf, and adjacent leaves carry distinct marks so the
//! merge rule never fires. That makes them safe snapshots for
//! apply-then-invert comparisons.

use serde_json::{json, Value};

use weft::{Element, Node, Operation, Path, Point, Props, Root, Text};

use crate::Fuzzer;

/// A document of `blocks` top-level paragraph elements.
pub fn document(fuzzer: &Fuzzer, blocks: usize) -> Vec<Node> {
    fuzzer.repeat(blocks, || block(fuzzer))
}

/// One paragraph with one to three leaves. Each leaf is tagged with its
/// index under a `"run"` mark, which keeps adjacent leaves loose-distinct.
pub fn block(fuzzer: &Fuzzer) -> Node {
    let leaves = fuzzer.random_int(1, 3) as usize;
    let children = (0..leaves)
        .map(|i| {
            let mut marks = Props::new();
            marks.insert("run".into(), Value::from(i as u64));
            Node::Text(Text::with_marks(fuzzer.random_word(), marks))
        })
        .collect();
    let mut props = Props::new();
    props.insert("kind".into(), json!("paragraph"));
    Node::Element(Element::with_props(children, props))
}

/// A random cursor position: some leaf of `root` with a random offset.
pub fn leaf_point(fuzzer: &Fuzzer, root: &Root) -> Option<Point> {
    let leaves: Vec<(usize, Path)> = root.texts().map(|(t, p)| (t.len_chars(), p)).collect();
    if leaves.is_empty() {
        return None;
    }
    let (len, path) = fuzzer.pick(&leaves).clone();
    let offset = fuzzer.random_int(0, len as i64) as usize;
    Some(Point::new(path, offset))
}

/// An `insert_text` at a random leaf position.
pub fn insert_text_op(fuzzer: &Fuzzer, root: &Root) -> Option<Operation> {
    let point = leaf_point(fuzzer, root)?;
    Some(Operation::InsertText {
        path: point.path,
        offset: point.offset,
        text: fuzzer.random_word(),
    })
}

/// A `remove_text` covering a random span of a random non-empty leaf.
pub fn remove_text_op(fuzzer: &Fuzzer, root: &Root) -> Option<Operation> {
    let leaves: Vec<(String, Path)> = root
        .texts()
        .filter(|(t, _)| t.len_chars() > 0)
        .map(|(t, p)| (t.text.clone(), p))
        .collect();
    if leaves.is_empty() {
        return None;
    }
    let (text, path) = fuzzer.pick(&leaves).clone();
    let len = text.chars().count();
    let offset = fuzzer.random_int(0, (len - 1) as i64) as usize;
    let count = fuzzer.random_int(1, (len - offset) as i64) as usize;
    let removed: String = text.chars().skip(offset).take(count).collect();
    Some(Operation::RemoveText { path, offset, text: removed })
}

/// Either an insert or a remove, weighted toward inserts so documents grow.
pub fn text_op(fuzzer: &Fuzzer, root: &Root) -> Option<Operation> {
    if fuzzer.random_bool(0.6) {
        insert_text_op(fuzzer, root)
    } else {
        remove_text_op(fuzzer, root).or_else(|| insert_text_op(fuzzer, root))
    }
}
