//! The self-healing loop that drives the tree back into a valid shape.
//!
//! Each apply leaves behind dirty paths; normalization pops them one at a
//! time, runs the built-in structural rules and then the external
//! `normalize_node` hook on each, and keeps going as corrective operations
//! re-dirty parts of the tree. The loop is bounded: a hook that never settles
//! trips the iteration cap instead of spinning forever.

use crate::editor::Editor;
use crate::error::WeftError;
use crate::node::{Node, NodeRef, TraverseOptions};
use crate::path::Path;
use crate::text::Text;
use crate::transforms::{InsertNodesOptions, MergeNodesOptions, RemoveNodesOptions};

/// A misbehaving hook gets this many passes per initially-dirty path before
/// normalization is declared non-terminating.
const MAX_ITERATIONS_PER_DIRTY_PATH: usize = 42;

impl Editor {
    /// True when applies normalize eagerly; false inside a
    /// [`Editor::without_normalizing`] batch.
    pub fn is_normalizing(&self) -> bool {
        self.normalizing
    }

    /// Drain the dirty set, validating and repairing each path. With
    /// `force`, every path in the tree is re-marked dirty first.
    pub fn normalize(&mut self, force: bool) -> Result<(), WeftError> {
        if !self.normalizing {
            return Ok(());
        }
        if force {
            let all: Vec<Path> =
                self.root.nodes(TraverseOptions::default()).map(|(_, path)| path).collect();
            self.dirty_paths = all.into_iter().collect();
        }
        if self.dirty_paths.is_empty() {
            return Ok(());
        }
        self.without_normalizing(|editor| {
            // Fix zero-child elements up front: every later rule assumes a
            // node has at least one child to look at.
            let dirty: Vec<Path> = editor.dirty_paths.iter().cloned().collect();
            for path in dirty {
                if !editor.root.has(&path) {
                    continue;
                }
                let childless = matches!(
                    editor.root.get(&path)?,
                    NodeRef::Element(element) if element.children.is_empty()
                );
                if childless {
                    editor.run_normalize_node(&path)?;
                }
            }
            let max_iterations = editor.dirty_paths.len() * MAX_ITERATIONS_PER_DIRTY_PATH;
            let mut iteration = 0;
            while let Some(path) = editor.dirty_paths.pop() {
                if iteration > max_iterations {
                    return Err(WeftError::NormalizationLoop { iterations: iteration });
                }
                // A dirty path whose node is gone needs no validation.
                if editor.root.has(&path) {
                    editor.run_normalize_node(&path)?;
                }
                iteration += 1;
            }
            Ok(())
        })
    }

    /// Built-in rules first, then the external hook.
    fn run_normalize_node(&mut self, path: &Path) -> Result<(), WeftError> {
        self.normalize_builtin(path)?;
        if let Some(mut hook) = self.hooks.normalize_node.take() {
            let result = if self.root.has(path) { hook(self, path) } else { Ok(()) };
            self.hooks.normalize_node = Some(hook);
            result?;
        }
        Ok(())
    }

    /// The structural invariants every document obeys regardless of schema:
    /// elements are never childless, siblings are homogeneously block or
    /// inline, inline elements are bordered by text, and adjacent texts are
    /// merged or dropped when redundant.
    fn normalize_builtin(&mut self, path: &Path) -> Result<(), WeftError> {
        let info = match self.root.get(path)? {
            NodeRef::Text(_) => return Ok(()),
            NodeRef::Element(element) if element.children.is_empty() => None,
            NodeRef::Root(root) => Some((root.children.clone(), false)),
            NodeRef::Element(element) => {
                let should_have_inlines = self.is_inline(element)
                    || match &element.children[0] {
                        Node::Text(_) => true,
                        Node::Element(first) => self.is_inline(first),
                    };
                Some((element.children.clone(), should_have_inlines))
            }
        };
        let Some((snapshot, should_have_inlines)) = info else {
            return self.insert_nodes(
                vec![Node::Text(Text::new(""))],
                InsertNodesOptions {
                    at: Some(path.child(0).into()),
                    voids: true,
                    ..Default::default()
                },
            );
        };
        // Walk the pre-fix snapshot while tracking `n`, the child's index in
        // the tree as fixes shift it. Mirrors how each correction moves the
        // cursor: removals and merges keep it in place, insertions push it.
        let mut n: isize = 0;
        for (i, child) in snapshot.iter().enumerate() {
            if self.root.get(path)?.is_text() {
                break;
            }
            let prev: Option<Node> = if n > 0 {
                self.root.children_of(path)?.get(n as usize - 1).cloned()
            } else {
                None
            };
            let is_last = i == snapshot.len() - 1;
            let is_inline_or_text = match child {
                Node::Text(_) => true,
                Node::Element(element) => self.is_inline(element),
            };
            if is_inline_or_text != should_have_inlines {
                self.remove_nodes(RemoveNodesOptions {
                    at: Some(path.child(n as usize).into()),
                    voids: true,
                    ..Default::default()
                })?;
                n -= 1;
            } else if let Node::Element(element) = child {
                if self.is_inline(element) {
                    match &prev {
                        Some(Node::Text(_)) => {
                            if is_last {
                                self.insert_nodes(
                                    vec![Node::Text(Text::new(""))],
                                    InsertNodesOptions {
                                        at: Some(path.child(n as usize + 1).into()),
                                        voids: true,
                                        ..Default::default()
                                    },
                                )?;
                                n += 1;
                            }
                        }
                        _ => {
                            self.insert_nodes(
                                vec![Node::Text(Text::new(""))],
                                InsertNodesOptions {
                                    at: Some(path.child(n as usize).into()),
                                    voids: true,
                                    ..Default::default()
                                },
                            )?;
                            n += 1;
                        }
                    }
                }
            } else if let (Node::Text(leaf), Some(Node::Text(prev_leaf))) = (child, &prev) {
                if leaf.equals_loose(prev_leaf) {
                    self.merge_nodes(MergeNodesOptions {
                        at: Some(path.child(n as usize).into()),
                        voids: true,
                        ..Default::default()
                    })?;
                    n -= 1;
                } else if prev_leaf.text.is_empty() {
                    self.remove_nodes(RemoveNodesOptions {
                        at: Some(path.child(n as usize - 1).into()),
                        voids: true,
                        ..Default::default()
                    })?;
                    n -= 1;
                } else if is_last && leaf.text.is_empty() {
                    self.remove_nodes(RemoveNodesOptions {
                        at: Some(path.child(n as usize).into()),
                        voids: true,
                        ..Default::default()
                    })?;
                    n -= 1;
                }
            }
            n += 1;
        }
        Ok(())
    }

    /// Walk every level above `path` and re-dirty it, cheapest way for a
    /// hook to request another look at a subtree it rewrote.
    pub fn mark_dirty(&mut self, path: &Path) {
        for level in path.levels() {
            self.dirty_paths.insert(level);
        }
    }

    /// The paths currently pending validation, in insertion order.
    pub fn dirty_snapshot(&self) -> Vec<Path> {
        self.dirty_paths.iter().cloned().collect()
    }
}
