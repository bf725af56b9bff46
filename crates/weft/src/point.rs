//! Points address cursor positions: a path to a text leaf plus a character
//! offset into it.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::operation::Operation;
use crate::path::{Affinity, Path};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub path: Path,
    /// Offset in characters, not bytes.
    pub offset: usize,
}

impl Point {
    pub fn new(path: impl Into<Path>, offset: usize) -> Self {
        Point { path: path.into(), offset }
    }

    /// Compare two points by document order.
    pub fn compare(&self, other: &Point) -> Ordering {
        match self.path.compare(&other.path) {
            Ordering::Equal => self.offset.cmp(&other.offset),
            ord => ord,
        }
    }

    pub fn is_before(&self, other: &Point) -> bool {
        self.compare(other) == Ordering::Less
    }

    pub fn is_after(&self, other: &Point) -> bool {
        self.compare(other) == Ordering::Greater
    }

    /// Transform this point by an operation, with forward affinity.
    pub fn transform(&self, op: &Operation) -> Option<Point> {
        self.transform_with(op, Some(Affinity::Forward))
    }

    /// Transform this point by an operation.
    ///
    /// Layers the path transform with offset arithmetic for the text-level
    /// operations. Returns `None` when the point's leaf was removed, or when
    /// it sat exactly at a split position with no affinity to pick a side.
    pub fn transform_with(&self, op: &Operation, affinity: Option<Affinity>) -> Option<Point> {
        let mut point = self.clone();
        match op {
            Operation::InsertNode { .. } | Operation::MoveNode { .. } => {
                point.path = self.path.transform_with(op, affinity)?;
            }
            Operation::InsertText { path, offset, text } => {
                if *path == point.path
                    && (*offset < point.offset
                        || (*offset == point.offset && affinity == Some(Affinity::Forward)))
                {
                    point.offset += text.chars().count();
                }
            }
            Operation::RemoveText { path, offset, text } => {
                if *path == point.path && *offset <= point.offset {
                    point.offset -= (point.offset - offset).min(text.chars().count());
                }
            }
            Operation::MergeNode { path, position, .. } => {
                if *path == point.path {
                    point.offset += position;
                }
                point.path = self.path.transform_with(op, affinity)?;
            }
            Operation::RemoveNode { path, .. } => {
                if *path == point.path || path.is_ancestor(&point.path) {
                    return None;
                }
                point.path = self.path.transform_with(op, affinity)?;
            }
            Operation::SplitNode { path, position, .. } => {
                if *path == point.path {
                    if *position == point.offset && affinity.is_none() {
                        return None;
                    } else if *position < point.offset
                        || (*position == point.offset && affinity == Some(Affinity::Forward))
                    {
                        point.offset -= position;
                        point.path = self.path.transform_with(op, Some(Affinity::Forward))?;
                    } else {
                        point.path = self.path.transform_with(op, affinity)?;
                    }
                } else {
                    point.path = self.path.transform_with(op, affinity)?;
                }
            }
            Operation::SetNode { .. } | Operation::SetSelection { .. } => {}
        }
        Some(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;
    use crate::text::Text;

    fn pt(path: &[usize], offset: usize) -> Point {
        Point::new(path.to_vec(), offset)
    }

    #[test]
    fn ordering() {
        assert!(pt(&[0, 0], 3).is_before(&pt(&[0, 1], 0)));
        assert!(pt(&[0, 0], 3).is_before(&pt(&[0, 0], 4)));
        assert!(pt(&[1], 0).is_after(&pt(&[0, 5], 9)));
        assert_eq!(pt(&[2], 1).compare(&pt(&[2], 1)), std::cmp::Ordering::Equal);
    }

    #[test]
    fn insert_text_shifts_offset() {
        let op = Operation::InsertText {
            path: Path::from(vec![0, 0]),
            offset: 1,
            text: "ar".into(),
        };
        assert_eq!(pt(&[0, 0], 3).transform(&op), Some(pt(&[0, 0], 5)));
        assert_eq!(pt(&[0, 0], 0).transform(&op), Some(pt(&[0, 0], 0)));
        // At the insertion offset, affinity decides.
        assert_eq!(pt(&[0, 0], 1).transform(&op), Some(pt(&[0, 0], 3)));
        assert_eq!(
            pt(&[0, 0], 1).transform_with(&op, Some(Affinity::Backward)),
            Some(pt(&[0, 0], 1))
        );
        // Other leaves are untouched.
        assert_eq!(pt(&[0, 1], 2).transform(&op), Some(pt(&[0, 1], 2)));
    }

    #[test]
    fn remove_text_shifts_offset() {
        let op = Operation::RemoveText {
            path: Path::from(vec![0, 0]),
            offset: 1,
            text: "bc".into(),
        };
        assert_eq!(pt(&[0, 0], 4).transform(&op), Some(pt(&[0, 0], 2)));
        // Inside the removed span, the point clamps to its start.
        assert_eq!(pt(&[0, 0], 2).transform(&op), Some(pt(&[0, 0], 1)));
        assert_eq!(pt(&[0, 0], 0).transform(&op), Some(pt(&[0, 0], 0)));
    }

    #[test]
    fn split_node_redistributes() {
        let op = Operation::SplitNode {
            path: Path::from(vec![0, 0]),
            position: 2,
            properties: Default::default(),
        };
        assert_eq!(pt(&[0, 0], 4).transform(&op), Some(pt(&[0, 1], 2)));
        assert_eq!(pt(&[0, 0], 1).transform(&op), Some(pt(&[0, 0], 1)));
        assert_eq!(pt(&[0, 0], 2).transform(&op), Some(pt(&[0, 1], 0)));
        assert_eq!(
            pt(&[0, 0], 2).transform_with(&op, Some(Affinity::Backward)),
            Some(pt(&[0, 0], 2))
        );
        assert_eq!(pt(&[0, 0], 2).transform_with(&op, None), None);
    }

    #[test]
    fn merge_node_accumulates_offset() {
        let op = Operation::MergeNode {
            path: Path::from(vec![0, 1]),
            position: 3,
            properties: Default::default(),
        };
        assert_eq!(pt(&[0, 1], 2).transform(&op), Some(pt(&[0, 0], 5)));
        assert_eq!(pt(&[0, 0], 2).transform(&op), Some(pt(&[0, 0], 2)));
    }

    #[test]
    fn remove_node_nulls_points_inside() {
        let op = Operation::RemoveNode {
            path: Path::from(vec![0]),
            node: Node::Text(Text::new("")),
        };
        assert_eq!(pt(&[0, 1], 2).transform(&op), None);
        assert_eq!(pt(&[0], 0).transform(&op), None);
        assert_eq!(pt(&[1, 0], 2).transform(&op), Some(pt(&[0, 0], 2)));
    }
}
