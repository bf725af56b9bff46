//! The apply step: the single funnel through which every mutation passes.
//!
//! Applying an operation (1) advances all live references, (2) recomputes
//! the dirty-path set, (3) mutates the tree and selection, (4) appends to
//! the operation log, (5) normalizes unless suspended, and (6) schedules the
//! coalesced change notification.

use std::cmp::Ordering;

use indexmap::IndexSet;

use crate::editor::Editor;
use crate::element::Element;
use crate::error::WeftError;
use crate::node::Node;
use crate::operation::Operation;
use crate::path::Path;
use crate::point::Point;
use crate::range::Range;
use crate::text::Text;

impl Editor {
    pub fn apply(&mut self, op: Operation) -> Result<(), WeftError> {
        self.enter_scope();
        let result = self.apply_inner(op);
        self.leave_scope();
        result
    }

    fn apply_inner(&mut self, op: Operation) -> Result<(), WeftError> {
        self.transform_refs(&op);
        self.update_dirty_paths(&op)?;
        self.apply_to_tree(&op)?;
        let clears_marks = op.is_selection_operation();
        self.operations.push(op);
        if clears_marks {
            self.marks = None;
        }
        self.normalize(false)?;
        self.flushing = true;
        Ok(())
    }

    /// Carry previously dirty paths through the operation, then union in
    /// the paths this operation itself dirties.
    fn update_dirty_paths(&mut self, op: &Operation) -> Result<(), WeftError> {
        let mut updated: IndexSet<Path> = if op.can_transform_paths() {
            std::mem::take(&mut self.dirty_paths)
                .into_iter()
                .filter_map(|path| path.transform(op))
                .collect()
        } else {
            std::mem::take(&mut self.dirty_paths)
        };
        for path in new_dirty_paths(op)? {
            updated.insert(path);
        }
        self.dirty_paths = updated;
        Ok(())
    }

    /// Mirror the path/point transform semantics onto the node contents and
    /// the selection.
    fn apply_to_tree(&mut self, op: &Operation) -> Result<(), WeftError> {
        match op {
            Operation::InsertNode { path, node } => {
                let index = last_index(path)?;
                let children = self.root.children_mut(&path.parent()?)?;
                if index > children.len() {
                    return Err(WeftError::OutOfBounds { path: path.clone(), index });
                }
                children.insert(index, node.clone());
                self.transform_selection(op);
            }
            Operation::InsertText { path, offset, text } => {
                let leaf = self.root.text_mut(path)?;
                let before: String = leaf.text.chars().take(*offset).collect();
                let after: String = leaf.text.chars().skip(*offset).collect();
                leaf.text = before + text + &after;
                self.transform_selection(op);
            }
            Operation::RemoveText { path, offset, text } => {
                let removed = text.chars().count();
                let leaf = self.root.text_mut(path)?;
                let before: String = leaf.text.chars().take(*offset).collect();
                let after: String = leaf.text.chars().skip(offset + removed).collect();
                leaf.text = before + &after;
                self.transform_selection(op);
            }
            Operation::MergeNode { path, .. } => {
                let index = last_index(path)?;
                let prev_path = path.previous()?;
                let target_is_text = self.root.node(path)?.is_text();
                let prev_is_text = self.root.node(&prev_path)?.is_text();
                if target_is_text != prev_is_text {
                    return Err(WeftError::IncompatibleMerge(path.clone()));
                }
                let parent = self.root.children_mut(&path.parent()?)?;
                let node = parent.remove(index);
                match (self.root.node_mut(&prev_path)?, node) {
                    (Node::Text(prev), Node::Text(next)) => prev.text.push_str(&next.text),
                    (Node::Element(prev), Node::Element(next)) => {
                        prev.children.extend(next.children)
                    }
                    _ => return Err(WeftError::IncompatibleMerge(path.clone())),
                }
                self.transform_selection(op);
            }
            Operation::MoveNode { path, new_path } => {
                if path.is_ancestor(new_path) {
                    return Err(WeftError::MoveInsideSelf {
                        from: path.clone(),
                        to: new_path.clone(),
                    });
                }
                let index = last_index(path)?;
                let parent = self.root.children_mut(&path.parent()?)?;
                if index >= parent.len() {
                    return Err(WeftError::NotFound(path.clone()));
                }
                let node = parent.remove(index);
                // The source's departure may have shifted the destination;
                // the landing path is the move's own transform of its source.
                let true_path = path.transform(op).ok_or_else(|| WeftError::NotFound(new_path.clone()))?;
                let new_index = last_index(&true_path)?;
                let destination = self.root.children_mut(&true_path.parent()?)?;
                if new_index > destination.len() {
                    return Err(WeftError::OutOfBounds { path: true_path.clone(), index: new_index });
                }
                destination.insert(new_index, node);
                self.transform_selection(op);
            }
            Operation::RemoveNode { path, .. } => {
                let index = last_index(path)?;
                let parent = self.root.children_mut(&path.parent()?)?;
                if index >= parent.len() {
                    return Err(WeftError::NotFound(path.clone()));
                }
                parent.remove(index);
                self.repair_selection_after_remove(op, path);
            }
            Operation::SetNode { path, properties, new_properties } => {
                if path.is_empty() {
                    return Err(WeftError::Root("set properties of"));
                }
                for key in new_properties.keys() {
                    if key == "children" || key == "text" {
                        return Err(WeftError::ProtectedProperty(key.clone()));
                    }
                }
                let props = self.root.node_mut(path)?.props_mut();
                for (key, value) in new_properties {
                    if value.is_null() {
                        props.remove(key);
                    } else {
                        props.insert(key.clone(), value.clone());
                    }
                }
                // Keys recorded with a prior value but absent from the new
                // set were removed outright.
                for key in properties.keys() {
                    if !new_properties.contains_key(key) {
                        props.remove(key);
                    }
                }
            }
            Operation::SetSelection { new_properties, .. } => match new_properties {
                None => self.selection = None,
                Some(props) => match self.selection.as_mut() {
                    None => {
                        let (Some(anchor), Some(focus)) = (props.anchor.clone(), props.focus.clone())
                        else {
                            return Err(WeftError::NoSelection);
                        };
                        let mut range = Range::new(anchor, focus);
                        for (key, value) in &props.props {
                            if !value.is_null() {
                                range.props.insert(key.clone(), value.clone());
                            }
                        }
                        self.selection = Some(range);
                    }
                    Some(selection) => {
                        if let Some(anchor) = &props.anchor {
                            selection.anchor = anchor.clone();
                        }
                        if let Some(focus) = &props.focus {
                            selection.focus = focus.clone();
                        }
                        for (key, value) in &props.props {
                            if value.is_null() {
                                selection.props.remove(key);
                            } else {
                                selection.props.insert(key.clone(), value.clone());
                            }
                        }
                    }
                },
            },
            Operation::SplitNode { path, position, properties } => {
                if path.is_empty() {
                    return Err(WeftError::Root("split"));
                }
                let index = last_index(path)?;
                let new_node = match self.root.node_mut(path)? {
                    Node::Text(leaf) => {
                        let before: String = leaf.text.chars().take(*position).collect();
                        let after: String = leaf.text.chars().skip(*position).collect();
                        leaf.text = before;
                        Node::Text(Text::with_marks(after, properties.clone()))
                    }
                    Node::Element(element) => {
                        if *position > element.children.len() {
                            return Err(WeftError::OutOfBounds {
                                path: path.clone(),
                                index: *position,
                            });
                        }
                        let after = element.children.split_off(*position);
                        Node::Element(Element::with_props(after, properties.clone()))
                    }
                };
                let parent = self.root.children_mut(&path.parent()?)?;
                parent.insert(index + 1, new_node);
                self.transform_selection(op);
            }
        }
        Ok(())
    }

    /// Carry the selection's points through a structural or text operation.
    fn transform_selection(&mut self, op: &Operation) {
        if let Some(selection) = self.selection.as_mut() {
            if let Some(anchor) = selection.anchor.transform(op) {
                selection.anchor = anchor;
            }
            if let Some(focus) = selection.focus.transform(op) {
                selection.focus = focus;
            }
        }
    }

    /// After a removal, points inside the removed subtree snap to the
    /// nearest surviving leaf: the previous one when it shares more context
    /// with the removed path, otherwise the next; with no leaves left the
    /// selection is dropped entirely.
    fn repair_selection_after_remove(&mut self, op: &Operation, removed: &Path) {
        let Some(selection) = self.selection.take() else {
            return;
        };
        let mut repaired = Some(selection);
        for pick_anchor in [true, false] {
            let Some(range) = repaired.as_mut() else { break };
            let point = if pick_anchor { range.anchor.clone() } else { range.focus.clone() };
            let result = match point.transform(op) {
                Some(point) => Some(point),
                None => {
                    let mut prev: Option<(Path, usize)> = None;
                    let mut next: Option<Path> = None;
                    for (leaf, path) in self.root.texts() {
                        if path.compare(removed) == Ordering::Less {
                            prev = Some((path, leaf.len_chars()));
                        } else {
                            next = Some(path);
                            break;
                        }
                    }
                    let prefer_next = match (&prev, &next) {
                        (Some((prev_path, _)), Some(next_path)) => {
                            if next_path == removed {
                                !next_path.has_previous()
                            } else {
                                prev_path.common(removed).len() < next_path.common(removed).len()
                            }
                        }
                        _ => false,
                    };
                    match (prev, next, prefer_next) {
                        (Some((path, len)), _, false) => Some(Point::new(path, len)),
                        (_, Some(path), _) => Some(Point::new(path, 0)),
                        (Some((path, len)), None, true) => Some(Point::new(path, len)),
                        (None, None, _) => None,
                    }
                }
            };
            match result {
                Some(point) => {
                    if pick_anchor {
                        range.anchor = point;
                    } else {
                        range.focus = point;
                    }
                }
                None => repaired = None,
            }
        }
        self.selection = repaired;
    }
}

fn last_index(path: &Path) -> Result<usize, WeftError> {
    path.as_slice()
        .last()
        .copied()
        .ok_or_else(|| WeftError::NotFound(path.clone()))
}

/// The paths an operation makes dirty, before deduplication.
fn new_dirty_paths(op: &Operation) -> Result<Vec<Path>, WeftError> {
    Ok(match op {
        Operation::InsertText { path, .. }
        | Operation::RemoveText { path, .. }
        | Operation::SetNode { path, .. } => path.levels().collect(),
        Operation::InsertNode { path, node } => {
            let mut paths: Vec<Path> = path.levels().collect();
            // Every node of the inserted subtree needs validation too; the
            // path itself is already among the levels.
            for relative in node.descendant_paths() {
                if relative.is_empty() {
                    continue;
                }
                let mut absolute = path.0.clone();
                absolute.extend_from_slice(relative.as_slice());
                paths.push(Path(absolute));
            }
            paths
        }
        Operation::RemoveNode { path, .. } => path.ancestors().collect(),
        Operation::MergeNode { path, .. } => {
            let mut paths: Vec<Path> = path.ancestors().collect();
            paths.push(path.previous()?);
            paths
        }
        Operation::SplitNode { path, .. } => {
            let mut paths: Vec<Path> = path.levels().collect();
            paths.push(path.next()?);
            paths
        }
        Operation::MoveNode { path, new_path } => {
            if path == new_path {
                return Ok(Vec::new());
            }
            let mut paths: Vec<Path> = Vec::new();
            for ancestor in path.ancestors() {
                if let Some(p) = ancestor.transform(op) {
                    paths.push(p);
                }
            }
            let mut new_ancestors: Vec<Path> = Vec::new();
            for ancestor in new_path.ancestors() {
                if let Some(p) = ancestor.transform(op) {
                    new_ancestors.push(p);
                }
            }
            let landing = match new_ancestors.last() {
                Some(new_parent) => new_parent.child(*new_path.as_slice().last().ok_or_else(
                    || WeftError::NotFound(new_path.clone()),
                )?),
                None => new_path.clone(),
            };
            paths.extend(new_ancestors);
            paths.push(landing);
            paths
        }
        Operation::SetSelection { .. } => Vec::new(),
    })
}
