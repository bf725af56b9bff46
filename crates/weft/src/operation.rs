//! The nine primitive operations.
//!
//! Every edit to the tree or the selection is expressed as one of these
//! variants, each carrying exactly the fields needed to apply it and to
//! compute its inverse. The type-tagged serde form makes the operation log
//! directly usable as a wire protocol for an external transport.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::WeftError;
use crate::node::Node;
use crate::path::Path;
use crate::point::Point;
use crate::text::Props;

/// A partial range: the shape carried by `set_selection`. Absent fields are
/// left untouched when the operation is applied to an existing selection.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SelectionProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<Point>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus: Option<Point>,
    #[serde(flatten)]
    pub props: Map<String, Value>,
}

impl SelectionProps {
    /// True if both points are present, i.e. this describes a full range.
    pub fn is_complete(&self) -> bool {
        self.anchor.is_some() && self.focus.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    InsertNode {
        path: Path,
        node: Node,
    },
    InsertText {
        path: Path,
        /// Character offset into the leaf.
        offset: usize,
        text: String,
    },
    MergeNode {
        path: Path,
        /// Child count (or char count) of the previous sibling before the
        /// merge; the split position of the inverse.
        position: usize,
        /// Properties of the node that disappears, kept for inversion.
        properties: Props,
    },
    MoveNode {
        path: Path,
        new_path: Path,
    },
    RemoveNode {
        path: Path,
        /// The removed subtree, kept for inversion.
        node: Node,
    },
    RemoveText {
        path: Path,
        offset: usize,
        text: String,
    },
    SetNode {
        path: Path,
        /// Prior values of every touched key, kept for inversion.
        properties: Props,
        new_properties: Props,
    },
    SetSelection {
        /// Prior values of the touched selection fields; `None` when the
        /// selection was previously unset.
        properties: Option<SelectionProps>,
        /// `None` unsets the selection entirely.
        new_properties: Option<SelectionProps>,
    },
    SplitNode {
        path: Path,
        /// Child index (or char offset) at which the node splits.
        position: usize,
        /// Properties given to the newly created right-hand node.
        properties: Props,
    },
}

impl Operation {
    /// The name under the `type` tag on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::InsertNode { .. } => "insert_node",
            Operation::InsertText { .. } => "insert_text",
            Operation::MergeNode { .. } => "merge_node",
            Operation::MoveNode { .. } => "move_node",
            Operation::RemoveNode { .. } => "remove_node",
            Operation::RemoveText { .. } => "remove_text",
            Operation::SetNode { .. } => "set_node",
            Operation::SetSelection { .. } => "set_selection",
            Operation::SplitNode { .. } => "split_node",
        }
    }

    pub fn is_selection_operation(&self) -> bool {
        matches!(self, Operation::SetSelection { .. })
    }

    pub fn is_node_operation(&self) -> bool {
        !self.is_selection_operation()
    }

    pub fn is_text_operation(&self) -> bool {
        matches!(self, Operation::InsertText { .. } | Operation::RemoveText { .. })
    }

    /// True for the five structural operations that can change what other
    /// paths point at.
    pub fn can_transform_paths(&self) -> bool {
        matches!(
            self,
            Operation::InsertNode { .. }
                | Operation::RemoveNode { .. }
                | Operation::MergeNode { .. }
                | Operation::SplitNode { .. }
                | Operation::MoveNode { .. }
        )
    }

    /// The structurally paired operation that undoes this one. Applying an
    /// operation and then its inverse restores both tree and selection.
    pub fn inverse(&self) -> Result<Operation, WeftError> {
        Ok(match self {
            Operation::InsertNode { path, node } => {
                Operation::RemoveNode { path: path.clone(), node: node.clone() }
            }
            Operation::RemoveNode { path, node } => {
                Operation::InsertNode { path: path.clone(), node: node.clone() }
            }
            Operation::InsertText { path, offset, text } => {
                Operation::RemoveText { path: path.clone(), offset: *offset, text: text.clone() }
            }
            Operation::RemoveText { path, offset, text } => {
                Operation::InsertText { path: path.clone(), offset: *offset, text: text.clone() }
            }
            Operation::MergeNode { path, position, properties } => Operation::SplitNode {
                path: path.previous()?,
                position: *position,
                properties: properties.clone(),
            },
            Operation::SplitNode { path, position, properties } => Operation::MergeNode {
                path: path.next()?,
                position: *position,
                properties: properties.clone(),
            },
            Operation::SetNode { path, properties, new_properties } => Operation::SetNode {
                path: path.clone(),
                properties: new_properties.clone(),
                new_properties: properties.clone(),
            },
            Operation::MoveNode { path, new_path } => {
                if path == new_path {
                    return Ok(self.clone());
                }
                if path.is_sibling(new_path) {
                    return Ok(Operation::MoveNode {
                        path: new_path.clone(),
                        new_path: path.clone(),
                    });
                }
                // The source shifted when the node left; recover the true
                // pre-image by transforming through the move itself.
                let inverse_path = path
                    .transform(self)
                    .ok_or_else(|| WeftError::NotFound(path.clone()))?;
                let inverse_new_path = path
                    .next()?
                    .transform(self)
                    .ok_or_else(|| WeftError::NotFound(new_path.clone()))?;
                Operation::MoveNode { path: inverse_path, new_path: inverse_new_path }
            }
            Operation::SetSelection { properties, new_properties } => match (properties, new_properties) {
                (None, np) => {
                    Operation::SetSelection { properties: np.clone(), new_properties: None }
                }
                (p, None) => {
                    Operation::SetSelection { properties: None, new_properties: p.clone() }
                }
                (p, np) => {
                    Operation::SetSelection { properties: np.clone(), new_properties: p.clone() }
                }
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::Text;
    use serde_json::json;

    #[test]
    fn wire_form_is_type_tagged() {
        let op = Operation::InsertText { path: Path::from(vec![0, 0]), offset: 1, text: "ar".into() };
        let v = serde_json::to_value(&op).unwrap();
        assert_eq!(v, json!({"type": "insert_text", "path": [0, 0], "offset": 1, "text": "ar"}));
        let back: Operation = serde_json::from_value(v).unwrap();
        assert_eq!(back, op);
    }

    #[test]
    fn classification() {
        let insert = Operation::InsertNode {
            path: Path::from(vec![0]),
            node: Node::Text(Text::new("")),
        };
        let select = Operation::SetSelection { properties: None, new_properties: None };
        let set = Operation::SetNode {
            path: Path::from(vec![0]),
            properties: Props::new(),
            new_properties: Props::new(),
        };
        assert!(insert.is_node_operation() && insert.can_transform_paths());
        assert!(select.is_selection_operation() && !select.can_transform_paths());
        assert!(set.is_node_operation() && !set.can_transform_paths());
    }

    #[test]
    fn structural_inverses_pair_up() {
        let insert = Operation::InsertNode {
            path: Path::from(vec![1]),
            node: Node::Text(Text::new("x")),
        };
        let remove = insert.inverse().unwrap();
        assert_eq!(
            remove,
            Operation::RemoveNode { path: Path::from(vec![1]), node: Node::Text(Text::new("x")) }
        );
        assert_eq!(remove.inverse().unwrap(), insert);

        let split = Operation::SplitNode {
            path: Path::from(vec![0, 1]),
            position: 2,
            properties: Props::new(),
        };
        assert_eq!(
            split.inverse().unwrap(),
            Operation::MergeNode {
                path: Path::from(vec![0, 2]),
                position: 2,
                properties: Props::new(),
            }
        );
    }

    #[test]
    fn move_inverse_recovers_preimage() {
        // Sibling move: a plain swap.
        let swap = Operation::MoveNode { path: Path::from(vec![0, 2]), new_path: Path::from(vec![0, 0]) };
        assert_eq!(
            swap.inverse().unwrap(),
            Operation::MoveNode { path: Path::from(vec![0, 0]), new_path: Path::from(vec![0, 2]) }
        );
        // Cross-branch move: the source index shifted when the node left.
        let cross = Operation::MoveNode { path: Path::from(vec![0]), new_path: Path::from(vec![2, 0]) };
        let inverse = cross.inverse().unwrap();
        assert_eq!(
            inverse,
            Operation::MoveNode { path: Path::from(vec![1, 0]), new_path: Path::from(vec![0]) }
        );
    }

    #[test]
    fn set_selection_inverse() {
        let props = SelectionProps {
            anchor: Some(Point::new(vec![0, 0], 0)),
            focus: Some(Point::new(vec![0, 0], 2)),
            props: Map::new(),
        };
        let set = Operation::SetSelection { properties: None, new_properties: Some(props.clone()) };
        assert_eq!(
            set.inverse().unwrap(),
            Operation::SetSelection { properties: Some(props), new_properties: None }
        );
    }
}
