//! Elements: the branch nodes of the document tree.

use serde::{Deserialize, Serialize};

use crate::node::Node;
use crate::text::Props;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Element {
    pub children: Vec<Node>,
    #[serde(flatten)]
    pub props: Props,
}

impl Element {
    pub fn new(children: Vec<Node>) -> Self {
        Element { children, props: Props::new() }
    }

    pub fn with_props(children: Vec<Node>, props: Props) -> Self {
        Element { children, props }
    }

    /// True if every entry of `props` is present on this element with the
    /// same value.
    pub fn matches(&self, props: &Props) -> bool {
        props.iter().all(|(k, v)| self.props.get(k) == Some(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::Text;
    use serde_json::json;

    #[test]
    fn serializes_flat() {
        let mut el = Element::new(vec![Node::Text(Text::new("a"))]);
        el.props.insert("kind".into(), json!("quote"));
        let v = serde_json::to_value(&el).unwrap();
        assert_eq!(v, json!({"children": [{"text": "a"}], "kind": "quote"}));
        let back: Element = serde_json::from_value(v).unwrap();
        assert_eq!(back, el);
    }

    #[test]
    fn subset_match() {
        let mut el = Element::new(vec![]);
        el.props.insert("kind".into(), json!("list"));
        let mut probe = Props::new();
        probe.insert("kind".into(), json!("list"));
        assert!(el.matches(&probe));
        probe.insert("depth".into(), json!(2));
        assert!(!el.matches(&probe));
    }
}
