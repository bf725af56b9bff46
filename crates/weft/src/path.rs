//! Paths address nodes in the document tree.
//!
//! A path is a list of child indices descending from the root: `[]` is the
//! root itself, `[0]` the root's first child, `[0, 2]` that child's third
//! child, and so on. Besides the relational queries, this module implements
//! [`Path::transform`] — the function that maps a stored path through an
//! [`Operation`] so that positions recorded before an edit stay meaningful
//! after it.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::WeftError;
use crate::operation::Operation;

/// Tie-break direction used when a transform is ambiguous at an exact
/// boundary, e.g. a path pointing at the very node being split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Affinity {
    Forward,
    Backward,
}

/// A list of indices locating a node from the root of the tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(pub Vec<usize>);

impl Path {
    /// The root path, `[]`.
    pub fn root() -> Self {
        Path(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// Append one more index, descending a level.
    pub fn child(&self, index: usize) -> Path {
        let mut p = self.0.clone();
        p.push(index);
        Path(p)
    }

    /// Compare two paths by document order. Unlike `Ord`, a path and any of
    /// its descendants compare `Equal` here — they occupy the same position
    /// at the shallower path's depth.
    pub fn compare(&self, other: &Path) -> Ordering {
        let min = self.0.len().min(other.0.len());
        for i in 0..min {
            match self.0[i].cmp(&other.0[i]) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }

    /// True if `self` comes strictly before `other` in document order.
    pub fn is_before(&self, other: &Path) -> bool {
        self.compare(other) == Ordering::Less
    }

    /// True if `self` comes strictly after `other` in document order.
    pub fn is_after(&self, other: &Path) -> bool {
        self.compare(other) == Ordering::Greater
    }

    /// True if `self` is a proper ancestor of `other`.
    pub fn is_ancestor(&self, other: &Path) -> bool {
        self.0.len() < other.0.len() && self.0[..] == other.0[..self.0.len()]
    }

    /// True if `self` is a proper descendant of `other`.
    pub fn is_descendant(&self, other: &Path) -> bool {
        other.is_ancestor(self)
    }

    /// True if `self` is the immediate parent of `other`.
    pub fn is_parent(&self, other: &Path) -> bool {
        self.0.len() + 1 == other.0.len() && self.is_ancestor(other)
    }

    /// True if `self` is an immediate child of `other`.
    pub fn is_child(&self, other: &Path) -> bool {
        other.is_parent(self)
    }

    /// True if the two paths share a parent but are not the same path.
    pub fn is_sibling(&self, other: &Path) -> bool {
        if self.0.len() != other.0.len() || self.0.is_empty() {
            return false;
        }
        let depth = self.0.len() - 1;
        self.0[..depth] == other.0[..depth] && self.0[depth] != other.0[depth]
    }

    /// True if `self` is an ancestor of `other` or equal to it.
    pub fn is_common(&self, other: &Path) -> bool {
        self == other || self.is_ancestor(other)
    }

    /// The longest shared prefix of the two paths.
    pub fn common(&self, other: &Path) -> Path {
        let mut prefix = Vec::new();
        for (a, b) in self.0.iter().zip(other.0.iter()) {
            if a != b {
                break;
            }
            prefix.push(*a);
        }
        Path(prefix)
    }

    /// All proper ancestors of this path, from the root down to the parent.
    pub fn ancestors(&self) -> impl Iterator<Item = Path> + '_ {
        (0..self.0.len()).map(move |len| Path(self.0[..len].to_vec()))
    }

    /// Every prefix of this path, from the root down to the path itself.
    pub fn levels(&self) -> impl Iterator<Item = Path> + '_ {
        (0..=self.0.len()).map(move |len| Path(self.0[..len].to_vec()))
    }

    /// The path of the next sibling.
    pub fn next(&self) -> Result<Path, WeftError> {
        match self.0.split_last() {
            Some((last, init)) => {
                let mut p = init.to_vec();
                p.push(last + 1);
                Ok(Path(p))
            }
            None => Err(WeftError::NoRelative(self.clone(), "next sibling")),
        }
    }

    /// The path of the previous sibling.
    pub fn previous(&self) -> Result<Path, WeftError> {
        match self.0.split_last() {
            Some((&last, init)) if last > 0 => {
                let mut p = init.to_vec();
                p.push(last - 1);
                Ok(Path(p))
            }
            _ => Err(WeftError::NoRelative(self.clone(), "previous sibling")),
        }
    }

    /// True if a previous sibling path exists (last index is non-zero).
    pub fn has_previous(&self) -> bool {
        matches!(self.0.last(), Some(&last) if last > 0)
    }

    /// The parent path.
    pub fn parent(&self) -> Result<Path, WeftError> {
        if self.0.is_empty() {
            Err(WeftError::NoRelative(self.clone(), "parent"))
        } else {
            Ok(Path(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// This path re-expressed relative to one of its ancestors.
    pub fn relative(&self, ancestor: &Path) -> Result<Path, WeftError> {
        if !ancestor.is_common(self) {
            return Err(WeftError::NoRelative(self.clone(), "given ancestor"));
        }
        Ok(Path(self.0[ancestor.0.len()..].to_vec()))
    }

    /// True if `self` sits at an earlier index than `other` at `self`'s own
    /// depth, with the same prefix above it. Unlike [`Path::is_before`] this
    /// also holds when `other` is nested below that later sibling.
    pub fn ends_before(&self, other: &Path) -> bool {
        let Some(depth) = self.0.len().checked_sub(1) else {
            return false;
        };
        other.0.len() > depth && self.0[..depth] == other.0[..depth] && self.0[depth] < other.0[depth]
    }

    /// True if `other` is `self` or nested below it, sharing `self`'s full
    /// index sequence.
    pub fn ends_at(&self, other: &Path) -> bool {
        let Some(depth) = self.0.len().checked_sub(1) else {
            return false;
        };
        other.0.len() > depth && self.0[..depth] == other.0[..depth] && self.0[depth] == other.0[depth]
    }

    /// Mirror of [`Path::ends_before`].
    pub fn ends_after(&self, other: &Path) -> bool {
        let Some(depth) = self.0.len().checked_sub(1) else {
            return false;
        };
        other.0.len() > depth && self.0[..depth] == other.0[..depth] && self.0[depth] > other.0[depth]
    }

    /// Transform this path by an operation, with forward affinity.
    pub fn transform(&self, op: &Operation) -> Option<Path> {
        self.transform_with(op, Some(Affinity::Forward))
    }

    /// Transform this path by an operation.
    ///
    /// Returns `None` when the path no longer names a node: its target was
    /// removed, or it pointed exactly at a split node and no affinity was
    /// given to pick a side. The root path is never affected.
    ///
    /// The `move_node` branches below are evaluated in a deliberate order;
    /// same-parent moves at adjacent indices give different results if the
    /// sibling and ancestor cases are checked the other way around.
    pub fn transform_with(&self, op: &Operation, affinity: Option<Affinity>) -> Option<Path> {
        if self.0.is_empty() {
            return Some(self.clone());
        }
        let mut p = self.0.clone();
        match op {
            Operation::InsertNode { path: at, .. } => {
                if at == self || at.ends_before(self) || at.is_ancestor(self) {
                    p[at.0.len() - 1] += 1;
                }
            }
            Operation::RemoveNode { path: at, .. } => {
                if at == self || at.is_ancestor(self) {
                    return None;
                } else if at.ends_before(self) {
                    p[at.0.len() - 1] -= 1;
                }
            }
            Operation::MergeNode { path: at, position, .. } => {
                if at == self || at.ends_before(self) {
                    p[at.0.len() - 1] -= 1;
                } else if at.is_ancestor(self) {
                    p[at.0.len() - 1] -= 1;
                    p[at.0.len()] += position;
                }
            }
            Operation::SplitNode { path: at, position, .. } => {
                if at == self {
                    match affinity {
                        Some(Affinity::Forward) => {
                            let last = p.len() - 1;
                            p[last] += 1;
                        }
                        Some(Affinity::Backward) => {}
                        None => return None,
                    }
                } else if at.ends_before(self) {
                    p[at.0.len() - 1] += 1;
                } else if at.is_ancestor(self) && self.0[at.0.len()] >= *position {
                    p[at.0.len() - 1] += 1;
                    p[at.0.len()] -= position;
                }
            }
            Operation::MoveNode { path: from, new_path: to } => {
                if from == to {
                    return Some(self.clone());
                }
                if from.is_ancestor(self) || from == self {
                    // The path rides along with the moved subtree.
                    let mut copy = to.0.clone();
                    if from.ends_before(to) && from.0.len() < to.0.len() {
                        copy[from.0.len() - 1] -= 1;
                    }
                    copy.extend_from_slice(&self.0[from.0.len()..]);
                    return Some(Path(copy));
                } else if from.is_sibling(to) && (to.is_ancestor(self) || to == self) {
                    if from.ends_before(self) {
                        p[from.0.len() - 1] -= 1;
                    } else {
                        p[from.0.len() - 1] += 1;
                    }
                } else if to.ends_before(self) || to == self || to.is_ancestor(self) {
                    if from.ends_before(self) {
                        p[from.0.len() - 1] -= 1;
                    }
                    p[to.0.len() - 1] += 1;
                } else if from.ends_before(self) {
                    if to == self {
                        p[to.0.len() - 1] += 1;
                    }
                    p[from.0.len() - 1] -= 1;
                }
            }
            Operation::InsertText { .. }
            | Operation::RemoveText { .. }
            | Operation::SetNode { .. }
            | Operation::SetSelection { .. } => {}
        }
        Some(Path(p))
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, idx) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{idx}")?;
        }
        write!(f, "]")
    }
}

impl From<Vec<usize>> for Path {
    fn from(indices: Vec<usize>) -> Self {
        Path(indices)
    }
}

impl From<&[usize]> for Path {
    fn from(indices: &[usize]) -> Self {
        Path(indices.to_vec())
    }
}

impl FromIterator<usize> for Path {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Path(iter.into_iter().collect())
    }
}

impl std::ops::Index<usize> for Path {
    type Output = usize;

    fn index(&self, i: usize) -> &usize {
        &self.0[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;
    use crate::text::Text;

    fn p(indices: &[usize]) -> Path {
        Path::from(indices)
    }

    fn insert_at(at: &[usize]) -> Operation {
        Operation::InsertNode {
            path: p(at),
            node: Node::Text(Text::new("")),
        }
    }

    fn remove_at(at: &[usize]) -> Operation {
        Operation::RemoveNode {
            path: p(at),
            node: Node::Text(Text::new("")),
        }
    }

    fn split_at(at: &[usize], position: usize) -> Operation {
        Operation::SplitNode {
            path: p(at),
            position,
            properties: Default::default(),
        }
    }

    fn merge_at(at: &[usize], position: usize) -> Operation {
        Operation::MergeNode {
            path: p(at),
            position,
            properties: Default::default(),
        }
    }

    fn move_op(from: &[usize], to: &[usize]) -> Operation {
        Operation::MoveNode {
            path: p(from),
            new_path: p(to),
        }
    }

    #[test]
    fn relations() {
        assert!(p(&[0]).is_ancestor(&p(&[0, 1])));
        assert!(!p(&[0, 1]).is_ancestor(&p(&[0, 1])));
        assert!(p(&[0, 1]).is_descendant(&p(&[0])));
        assert!(p(&[0]).is_parent(&p(&[0, 1])));
        assert!(!p(&[0]).is_parent(&p(&[0, 1, 2])));
        assert!(p(&[1, 2]).is_sibling(&p(&[1, 5])));
        assert!(!p(&[1, 2]).is_sibling(&p(&[1, 2])));
        assert!(!p(&[1, 2]).is_sibling(&p(&[2, 2])));
        assert!(p(&[0, 1]).is_before(&p(&[1])));
        assert!(p(&[1, 1]).is_after(&p(&[1, 0, 3])));
        assert_eq!(p(&[0, 1, 2]).common(&p(&[0, 2])), p(&[0]));
    }

    #[test]
    fn compare_treats_descendants_as_equal() {
        assert_eq!(p(&[0, 1]).compare(&p(&[0, 1, 5])), Ordering::Equal);
        assert_eq!(p(&[0, 1]).compare(&p(&[0, 2])), Ordering::Less);
    }

    #[test]
    fn ends_relations() {
        assert!(p(&[1]).ends_before(&p(&[2, 0])));
        assert!(!p(&[1]).ends_before(&p(&[1, 0])));
        assert!(p(&[1]).ends_at(&p(&[1, 0])));
        assert!(p(&[3]).ends_after(&p(&[2])));
        assert!(!p(&[3]).ends_after(&p(&[3])));
        // Root never ends anywhere.
        assert!(!Path::root().ends_before(&p(&[0])));
    }

    #[test]
    fn levels_and_ancestors() {
        let path = p(&[1, 2, 3]);
        let levels: Vec<Path> = path.levels().collect();
        assert_eq!(levels, vec![p(&[]), p(&[1]), p(&[1, 2]), p(&[1, 2, 3])]);
        let ancestors: Vec<Path> = path.ancestors().collect();
        assert_eq!(ancestors, vec![p(&[]), p(&[1]), p(&[1, 2])]);
    }

    #[test]
    fn siblings_and_parent() {
        assert_eq!(p(&[0, 1]).next().unwrap(), p(&[0, 2]));
        assert_eq!(p(&[0, 1]).previous().unwrap(), p(&[0, 0]));
        assert!(p(&[0, 0]).previous().is_err());
        assert!(Path::root().parent().is_err());
        assert_eq!(p(&[0, 1, 2]).relative(&p(&[0])).unwrap(), p(&[1, 2]));
        assert!(p(&[1, 0]).relative(&p(&[0])).is_err());
    }

    #[test]
    fn transform_insert() {
        assert_eq!(p(&[2, 0]).transform(&insert_at(&[1])), Some(p(&[3, 0])));
        assert_eq!(p(&[1]).transform(&insert_at(&[1])), Some(p(&[2])));
        assert_eq!(p(&[1, 2]).transform(&insert_at(&[1])), Some(p(&[2, 2])));
        assert_eq!(p(&[0, 2]).transform(&insert_at(&[1])), Some(p(&[0, 2])));
    }

    #[test]
    fn transform_remove() {
        assert_eq!(p(&[1, 2]).transform(&remove_at(&[1])), None);
        assert_eq!(p(&[1]).transform(&remove_at(&[1])), None);
        assert_eq!(p(&[2, 1]).transform(&remove_at(&[1])), Some(p(&[1, 1])));
        assert_eq!(p(&[0, 1]).transform(&remove_at(&[1])), Some(p(&[0, 1])));
    }

    #[test]
    fn transform_split_affinity() {
        let op = split_at(&[1], 2);
        assert_eq!(p(&[1]).transform_with(&op, Some(Affinity::Forward)), Some(p(&[2])));
        assert_eq!(p(&[1]).transform_with(&op, Some(Affinity::Backward)), Some(p(&[1])));
        assert_eq!(p(&[1]).transform_with(&op, None), None);
        // Descendants redistribute around the split position.
        assert_eq!(p(&[1, 3]).transform(&op), Some(p(&[2, 1])));
        assert_eq!(p(&[1, 1]).transform(&op), Some(p(&[1, 1])));
        assert_eq!(p(&[2]).transform(&op), Some(p(&[3])));
    }

    #[test]
    fn transform_merge() {
        let op = merge_at(&[2], 3);
        assert_eq!(p(&[2]).transform(&op), Some(p(&[1])));
        assert_eq!(p(&[3]).transform(&op), Some(p(&[2])));
        assert_eq!(p(&[2, 1]).transform(&op), Some(p(&[1, 4])));
        assert_eq!(p(&[1]).transform(&op), Some(p(&[1])));
    }

    #[test]
    fn transform_move() {
        // The moved node itself.
        assert_eq!(p(&[1]).transform(&move_op(&[1], &[3])), Some(p(&[3])));
        // Content inside the moved subtree rides along.
        assert_eq!(p(&[1, 4]).transform(&move_op(&[1], &[3])), Some(p(&[3, 4])));
        // A later sibling slides down when an earlier one leaves.
        assert_eq!(p(&[2]).transform(&move_op(&[1], &[5])), Some(p(&[1])));
        // Moving to the same path is a no-op.
        assert_eq!(p(&[2]).transform(&move_op(&[1], &[1])), Some(p(&[2])));
    }

    #[test]
    fn transform_move_adjacent_siblings() {
        // Same-parent moves at adjacent indices; these pin the branch order.
        assert_eq!(p(&[0, 1]).transform(&move_op(&[0, 0], &[0, 1])), Some(p(&[0, 0])));
        assert_eq!(p(&[0, 0]).transform(&move_op(&[0, 1], &[0, 0])), Some(p(&[0, 1])));
        // A third sibling is unaffected by a swap below it.
        assert_eq!(p(&[0, 2]).transform(&move_op(&[0, 0], &[0, 1])), Some(p(&[0, 2])));
        // Moving under a sibling subtree.
        assert_eq!(p(&[0, 1, 0]).transform(&move_op(&[0, 0], &[0, 1, 0])), Some(p(&[0, 0, 1])));
    }

    #[test]
    fn transform_root_is_stable() {
        assert_eq!(Path::root().transform(&remove_at(&[0])), Some(Path::root()));
        assert_eq!(Path::root().transform(&insert_at(&[0])), Some(Path::root()));
    }

    #[test]
    fn unaffected_paths_are_identity() {
        let path = p(&[3, 1]);
        for op in [insert_at(&[0, 0]), remove_at(&[4]), split_at(&[2, 5], 1)] {
            assert_eq!(path.transform(&op), Some(path.clone()));
        }
    }
}
