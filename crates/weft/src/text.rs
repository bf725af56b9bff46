//! Text leaves: a string plus arbitrary formatting marks.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Property map carried by elements (props) and text leaves (marks).
pub type Props = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Text {
    pub text: String,
    #[serde(flatten)]
    pub marks: Props,
}

impl Text {
    pub fn new(text: impl Into<String>) -> Self {
        Text { text: text.into(), marks: Props::new() }
    }

    pub fn with_marks(text: impl Into<String>, marks: Props) -> Self {
        Text { text: text.into(), marks }
    }

    /// Length in characters, not bytes.
    pub fn len_chars(&self) -> usize {
        self.text.chars().count()
    }

    /// Mark equality ignoring the text content. Two loose-equal adjacent
    /// leaves can be merged without losing formatting.
    pub fn equals_loose(&self, other: &Text) -> bool {
        self.marks == other.marks
    }

    /// True if every entry of `props` is present in this leaf's marks with
    /// the same value.
    pub fn matches(&self, props: &Props) -> bool {
        props.iter().all(|(k, v)| self.marks.get(k) == Some(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn loose_equality_ignores_text() {
        let mut a = Text::new("foo");
        let mut b = Text::new("bar");
        assert!(a.equals_loose(&b));
        a.marks.insert("bold".into(), json!(true));
        assert!(!a.equals_loose(&b));
        b.marks.insert("bold".into(), json!(true));
        assert!(a.equals_loose(&b));
    }

    #[test]
    fn subset_match() {
        let mut leaf = Text::new("x");
        leaf.marks.insert("bold".into(), json!(true));
        leaf.marks.insert("lang".into(), json!("en"));
        let mut probe = Props::new();
        assert!(leaf.matches(&probe));
        probe.insert("bold".into(), json!(true));
        assert!(leaf.matches(&probe));
        probe.insert("italic".into(), json!(true));
        assert!(!leaf.matches(&probe));
    }

    #[test]
    fn serializes_flat() {
        let mut leaf = Text::new("hi");
        leaf.marks.insert("bold".into(), json!(true));
        let v = serde_json::to_value(&leaf).unwrap();
        assert_eq!(v, json!({"text": "hi", "bold": true}));
        let back: Text = serde_json::from_value(v).unwrap();
        assert_eq!(back, leaf);
    }
}
