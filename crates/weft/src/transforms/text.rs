//! Text verbs: deletion across arbitrary ranges, plain text insertion, and
//! fragment pasting, plus the cursor-level commands built on them.

use std::cmp::Ordering;

use crate::editor::{Editor, Mode, NodesOptions, PathRef, TextUnit};
use crate::error::WeftError;
use crate::location::Location;
use crate::node::{Node, NodeRef, Root, TraverseOptions};
use crate::operation::{Operation, SelectionProps};
use crate::path::Path;
use crate::point::Point;
use crate::range::Range;
use crate::text::Text;
use crate::transforms::node::FallbackMatch;
use crate::transforms::{
    DeleteOptions, InsertNodesOptions, MergeNodesOptions, RemoveNodesOptions, SplitNodesOptions,
    TextInsertOptions,
};

/// The leaf-most path at the near or far edge of a detached fragment.
fn fragment_edge_path(fragment: &[Node], last: bool) -> Path {
    let mut path = Vec::new();
    let mut nodes = fragment;
    loop {
        if nodes.is_empty() {
            break;
        }
        let index = if last { nodes.len() - 1 } else { 0 };
        path.push(index);
        match &nodes[index] {
            Node::Element(element) if !element.children.is_empty() => nodes = &element.children,
            _ => break,
        }
    }
    Path(path)
}

impl Editor {
    /// Collapse a range by deleting its content; the result is the point
    /// where the content used to start.
    pub(crate) fn delete_range(&mut self, range: Range) -> Result<Option<Point>, WeftError> {
        if range.is_collapsed() {
            return Ok(Some(range.anchor));
        }
        let end = range.end().clone();
        let point_ref = self.point_ref(end);
        self.delete_at(DeleteOptions { at: Some(range.into()), ..Default::default() })?;
        Ok(point_ref.unref(self))
    }

    /// Delete content at a location. A collapsed range or point expands by
    /// `distance` units in the given direction; a path removes that node
    /// outright. Deleting across blocks merges the halves afterwards.
    pub fn delete_at(&mut self, options: DeleteOptions) -> Result<(), WeftError> {
        self.without_normalizing(|editor| {
            let at = options.at.clone().or_else(|| editor.selection.clone().map(Location::Range));
            let Some(mut at) = at else { return Ok(()) };
            let mut hanging = options.hanging;
            if let Location::Range(range) = &at {
                if range.is_collapsed() {
                    at = Location::Point(range.anchor.clone());
                }
            }
            at = match at {
                Location::Point(point) => {
                    let furthest_void =
                        editor.void_node(point.clone(), Mode::Highest)?.map(|(_, p)| p);
                    match furthest_void {
                        Some(void_path) if !options.voids => Location::Path(void_path),
                        _ => {
                            let target = if options.reverse {
                                match editor.before(
                                    point.clone(),
                                    options.distance,
                                    options.unit,
                                )? {
                                    Some(target) => target,
                                    None => editor.start(Path::root())?,
                                }
                            } else {
                                match editor.after(point.clone(), options.distance, options.unit)?
                                {
                                    Some(target) => target,
                                    None => editor.end(Path::root())?,
                                }
                            };
                            hanging = true;
                            Location::Range(Range::new(point, target))
                        }
                    }
                }
                other => other,
            };
            if let Location::Path(path) = at {
                return editor.remove_nodes(RemoveNodesOptions {
                    at: Some(path.into()),
                    voids: options.voids,
                    ..Default::default()
                });
            }
            let Location::Range(mut range) = at else { return Ok(()) };
            if range.is_collapsed() {
                return Ok(());
            }
            if !hanging {
                // A range hanging to the very end of the document has no
                // next text to pull back to.
                let end_of_doc = editor.end(Path::root())?;
                if *range.end() != end_of_doc {
                    range = editor.unhang_range(&range, options.voids)?;
                }
            }
            let (mut start, mut end) = (range.start().clone(), range.end().clone());
            let (start_block, end_block) = {
                let block = |node: NodeRef<'_>, _: &Path| {
                    matches!(node.as_element(), Some(element) if editor.is_block(element))
                };
                let start_block = editor
                    .above(start.clone(), Some(&block), Mode::Lowest, options.voids)?
                    .map(|(_, p)| p);
                let end_block = editor
                    .above(end.clone(), Some(&block), Mode::Lowest, options.voids)?
                    .map(|(_, p)| p);
                (start_block, end_block)
            };
            let is_across_blocks =
                matches!((&start_block, &end_block), (Some(s), Some(e)) if s != e);
            let is_single_text = start.path == end.path;
            let start_void = if options.voids {
                None
            } else {
                editor.void_node(start.clone(), Mode::Highest)?.map(|(_, p)| p)
            };
            let end_void = if options.voids {
                None
            } else {
                editor.void_node(end.clone(), Mode::Highest)?.map(|(_, p)| p)
            };
            // An edge inside a void cannot take a partial text removal;
            // nudge it to the nearest position in the same block.
            if start_void.is_some() {
                if let (Some(before), Some(start_block)) =
                    (editor.before(start.clone(), 1, TextUnit::Offset)?, &start_block)
                {
                    if start_block.is_ancestor(&before.path) {
                        start = before;
                    }
                }
            }
            if end_void.is_some() {
                if let (Some(after), Some(end_block)) =
                    (editor.after(end.clone(), 1, TextUnit::Offset)?, &end_block)
                {
                    if end_block.is_ancestor(&after.path) {
                        end = after;
                    }
                }
            }
            // Highest nodes fully inside the range get removed whole; the
            // boundary leaves get partial text removals instead.
            let matched: Vec<Path> = {
                let mut out: Vec<Path> = Vec::new();
                let mut last: Option<Path> = None;
                let entries = editor.nodes(NodesOptions {
                    at: Some(Location::Range(range.clone())),
                    voids: options.voids,
                    ..Default::default()
                })?;
                for (node, path) in entries {
                    if last.as_ref().is_some_and(|lp| path.compare(lp) == Ordering::Equal) {
                        continue;
                    }
                    let is_void = !options.voids
                        && matches!(node.as_element(), Some(element) if editor.is_void(element));
                    let covered = !path.is_common(&start.path) && !path.is_common(&end.path);
                    if is_void || covered {
                        out.push(path.clone());
                        last = Some(path);
                    }
                }
                out
            };
            let path_refs: Vec<PathRef> =
                matched.into_iter().map(|p| editor.path_ref(p)).collect();
            let start_ref = editor.point_ref(start.clone());
            let end_ref = editor.point_ref(end.clone());
            if !is_single_text && start_void.is_none() {
                if let Some(point) = start_ref.current(editor).cloned() {
                    let leaf = editor.root.leaf(&point.path)?;
                    let text: String = leaf.text.chars().skip(start.offset).collect();
                    if !text.is_empty() {
                        editor.apply(Operation::RemoveText {
                            path: point.path,
                            offset: start.offset,
                            text,
                        })?;
                    }
                }
            }
            for path_ref in path_refs {
                if let Some(path) = path_ref.unref(editor) {
                    editor.remove_nodes(RemoveNodesOptions {
                        at: Some(path.into()),
                        voids: options.voids,
                        ..Default::default()
                    })?;
                }
            }
            if end_void.is_none() {
                if let Some(point) = end_ref.current(editor).cloned() {
                    let leaf = editor.root.leaf(&point.path)?;
                    let offset = if is_single_text { start.offset } else { 0 };
                    let text: String = leaf
                        .text
                        .chars()
                        .skip(offset)
                        .take(end.offset.saturating_sub(offset))
                        .collect();
                    if !text.is_empty() {
                        editor.apply(Operation::RemoveText { path: point.path, offset, text })?;
                    }
                }
            }
            if !is_single_text && is_across_blocks {
                if let (Some(end_point), Some(_)) =
                    (end_ref.current(editor).cloned(), start_ref.current(editor).cloned())
                {
                    editor.merge_nodes(MergeNodesOptions {
                        at: Some(end_point.into()),
                        hanging: true,
                        voids: options.voids,
                        ..Default::default()
                    })?;
                }
            }
            let start_point = start_ref.unref(editor);
            let end_point = end_ref.unref(editor);
            let point = if options.reverse {
                start_point.or(end_point)
            } else {
                end_point.or(start_point)
            };
            if options.at.is_none() {
                if let Some(point) = point {
                    editor.select(point)?;
                }
            }
            Ok(())
        })
    }

    /// Insert plain text at a location, deleting range content first.
    pub fn insert_text_at(
        &mut self,
        text: &str,
        options: TextInsertOptions,
    ) -> Result<(), WeftError> {
        self.without_normalizing(|editor| {
            let at = options.at.clone().or_else(|| editor.selection.clone().map(Location::Range));
            let Some(mut at) = at else { return Ok(()) };
            at = match at {
                Location::Path(path) => Location::Range(editor.range(path, None)?),
                other => other,
            };
            at = match at {
                Location::Range(range) => {
                    if range.is_collapsed() {
                        Location::Point(range.anchor)
                    } else {
                        let end = range.end().clone();
                        if !options.voids
                            && editor.void_node(end.clone(), Mode::Lowest)?.is_some()
                        {
                            return Ok(());
                        }
                        let start = range.start().clone();
                        let start_ref = editor.point_ref(start);
                        let end_ref = editor.point_ref(end);
                        editor.delete_at(DeleteOptions {
                            at: Some(range.into()),
                            voids: options.voids,
                            ..Default::default()
                        })?;
                        let start_point = start_ref.unref(editor);
                        let end_point = end_ref.unref(editor);
                        let Some(point) = start_point.or(end_point) else { return Ok(()) };
                        editor.set_selection(SelectionProps {
                            anchor: Some(point.clone()),
                            focus: Some(point.clone()),
                            ..Default::default()
                        })?;
                        Location::Point(point)
                    }
                }
                other => other,
            };
            let Location::Point(point) = at else { return Ok(()) };
            if !options.voids && editor.void_node(point.clone(), Mode::Lowest)?.is_some() {
                return Ok(());
            }
            if !text.is_empty() {
                editor.apply(Operation::InsertText {
                    path: point.path,
                    offset: point.offset,
                    text: text.to_string(),
                })?;
            }
            Ok(())
        })
    }

    /// Insert a fragment of nodes at a location. Leading and trailing
    /// inline content merges into the surrounding blocks; whole blocks land
    /// between them.
    pub fn insert_fragment_at(
        &mut self,
        fragment: Vec<Node>,
        options: TextInsertOptions,
    ) -> Result<(), WeftError> {
        self.without_normalizing(|editor| {
            if fragment.is_empty() {
                return Ok(());
            }
            let at = options.at.clone().or_else(|| {
                if let Some(selection) = editor.selection.clone() {
                    Some(selection.into())
                } else if editor.root.children.is_empty() {
                    Some(Path(vec![0]).into())
                } else {
                    editor.end(Path::root()).ok().map(Location::Point)
                }
            });
            let Some(mut at) = at else { return Ok(()) };
            at = match at {
                Location::Range(range) => {
                    let range = if options.hanging {
                        range
                    } else {
                        editor.unhang_range(&range, options.voids)?
                    };
                    if range.is_collapsed() {
                        Location::Point(range.anchor)
                    } else {
                        let end = range.end().clone();
                        if !options.voids
                            && editor.void_node(end.clone(), Mode::Lowest)?.is_some()
                        {
                            return Ok(());
                        }
                        let end_ref = editor.point_ref(end);
                        editor.delete_at(DeleteOptions {
                            at: Some(range.into()),
                            ..Default::default()
                        })?;
                        match end_ref.unref(editor) {
                            Some(end) => Location::Point(end),
                            None => return Ok(()),
                        }
                    }
                }
                Location::Path(path) => Location::Point(editor.start(path)?),
                other => other,
            };
            let Location::Point(mut point) = at else { return Ok(()) };
            if !options.voids && editor.void_node(point.clone(), Mode::Lowest)?.is_some() {
                return Ok(());
            }
            // A point at the edge of an inline element steps outside it so
            // the fragment never lands inside the inline's borders.
            let inline_above = {
                let inline = |node: NodeRef<'_>, _: &Path| {
                    matches!(node.as_element(), Some(element) if editor.is_inline(element))
                };
                editor
                    .above(point.clone(), Some(&inline), Mode::Highest, options.voids)?
                    .map(|(_, p)| p)
            };
            if let Some(inline_path) = inline_above {
                if editor.is_end(&point, inline_path.clone())? {
                    if let Some(after) = editor.after(inline_path, 1, TextUnit::Offset)? {
                        point = after;
                    }
                } else if editor.is_start(&point, inline_path.clone())? {
                    if let Some(before) = editor.before(inline_path, 1, TextUnit::Offset)? {
                        point = before;
                    }
                }
            }
            let block_path = {
                let block = |node: NodeRef<'_>, _: &Path| {
                    matches!(node.as_element(), Some(element) if editor.is_block(element))
                };
                editor
                    .above(point.clone(), Some(&block), Mode::Lowest, options.voids)?
                    .map(|(_, p)| p)
            };
            let Some(block_path) = block_path else { return Ok(()) };
            let is_block_start = editor.is_start(&point, block_path.clone())?;
            let is_block_end = editor.is_end(&point, block_path.clone())?;
            let is_block_empty = is_block_start && is_block_end;
            let merge_start = !is_block_start || is_block_empty;
            let merge_end = !is_block_end;
            let first_path = fragment_edge_path(&fragment, false);
            let last_path = fragment_edge_path(&fragment, true);
            // Blocks at the fragment's mergeable edges dissolve into their
            // children; everything else is inserted as-is.
            let kept: Vec<Node> = {
                let holder = Root::new(fragment);
                let keep = |node: NodeRef<'_>, path: &Path| {
                    if path.is_empty() {
                        return false;
                    }
                    if is_block_empty {
                        return true;
                    }
                    let is_plain_block = matches!(node.as_element(), Some(element)
                        if !editor.is_void(element) && !editor.is_inline(element));
                    if merge_start && path.is_ancestor(&first_path) && is_plain_block {
                        return false;
                    }
                    if merge_end && path.is_ancestor(&last_path) && is_plain_block {
                        return false;
                    }
                    true
                };
                let mut kept: Vec<Node> = Vec::new();
                let walk = holder.nodes(TraverseOptions {
                    pass: Some(&keep),
                    ..Default::default()
                });
                for (node, path) in walk {
                    if !keep(node, &path) {
                        continue;
                    }
                    match node {
                        NodeRef::Text(leaf) => kept.push(Node::Text(leaf.clone())),
                        NodeRef::Element(element) => kept.push(Node::Element(element.clone())),
                        NodeRef::Root(_) => {}
                    }
                }
                kept
            };
            let mut starts: Vec<Node> = Vec::new();
            let mut middles: Vec<Node> = Vec::new();
            let mut ends: Vec<Node> = Vec::new();
            let mut starting = true;
            let mut has_blocks = false;
            for node in kept {
                match &node {
                    Node::Element(element) if !editor.is_inline(element) => {
                        starting = false;
                        has_blocks = true;
                        middles.push(node);
                    }
                    _ if starting => starts.push(node),
                    _ => ends.push(node),
                }
            }
            let inline_path = editor
                .resolve_matches(
                    &point.clone().into(),
                    None,
                    &FallbackMatch::InlineOrText,
                    Mode::Highest,
                    options.voids,
                )?
                .into_iter()
                .next();
            let Some(inline_path) = inline_path else { return Ok(()) };
            let is_inline_start = editor.is_start(&point, inline_path.clone())?;
            let is_inline_end = editor.is_end(&point, inline_path.clone())?;
            let (starts_empty, middles_empty, ends_empty) =
                (starts.is_empty(), middles.is_empty(), ends.is_empty());
            let middle_target =
                if is_block_end && ends_empty { block_path.next()? } else { block_path.clone() };
            let middle_ref = editor.path_ref(middle_target);
            let end_target =
                if is_inline_end { inline_path.next()? } else { inline_path.clone() };
            let end_ref = editor.path_ref(end_target);
            let split_fallback =
                if has_blocks { FallbackMatch::Block } else { FallbackMatch::InlineOrText };
            let split_mode = if has_blocks { Mode::Lowest } else { Mode::Highest };
            let always = has_blocks
                && (!is_block_start || !starts_empty)
                && (!is_block_end || !ends_empty);
            editor.split_nodes_inner(
                SplitNodesOptions {
                    at: Some(point.clone().into()),
                    mode: split_mode,
                    always,
                    voids: options.voids,
                    ..Default::default()
                },
                Some(split_fallback),
            )?;
            let start_target = if !is_inline_start || is_inline_end {
                inline_path.next()?
            } else {
                inline_path.clone()
            };
            let start_ref = editor.path_ref(start_target);
            if !starts_empty {
                if let Some(target) = start_ref.current(editor).cloned() {
                    editor.insert_nodes(
                        starts,
                        InsertNodesOptions {
                            at: Some(target.into()),
                            voids: options.voids,
                            ..Default::default()
                        },
                    )?;
                }
            }
            if is_block_empty && starts_empty && !middles_empty && ends_empty {
                editor.delete_at(DeleteOptions {
                    at: Some(block_path.clone().into()),
                    voids: options.voids,
                    ..Default::default()
                })?;
            }
            if !middles_empty {
                if let Some(target) = middle_ref.current(editor).cloned() {
                    editor.insert_nodes(
                        middles,
                        InsertNodesOptions {
                            at: Some(target.into()),
                            voids: options.voids,
                            ..Default::default()
                        },
                    )?;
                }
            }
            if !ends_empty {
                if let Some(target) = end_ref.current(editor).cloned() {
                    editor.insert_nodes(
                        ends,
                        InsertNodesOptions {
                            at: Some(target.into()),
                            voids: options.voids,
                            ..Default::default()
                        },
                    )?;
                }
            }
            if options.at.is_none() {
                let landing = if !ends_empty {
                    end_ref.current(editor).map(|p| p.previous()).transpose()?
                } else if !middles_empty {
                    middle_ref.current(editor).map(|p| p.previous()).transpose()?
                } else {
                    start_ref.current(editor).map(|p| p.previous()).transpose()?
                };
                if let Some(landing) = landing {
                    let end = editor.end(landing)?;
                    editor.select(end)?;
                }
            }
            start_ref.unref(editor);
            middle_ref.unref(editor);
            end_ref.unref(editor);
            Ok(())
        })
    }

    // ── Cursor-level commands ────────────────────────────────────────────

    /// Insert text at the selection, applying any pending marks.
    pub fn insert_text(&mut self, text: &str) -> Result<(), WeftError> {
        if self.selection.is_none() {
            return Ok(());
        }
        if let Some(marks) = self.marks.clone() {
            let leaf = Text::with_marks(text, marks);
            self.insert_nodes(vec![Node::Text(leaf)], InsertNodesOptions::default())?;
        } else {
            self.insert_text_at(text, TextInsertOptions::default())?;
        }
        self.marks = None;
        Ok(())
    }

    /// Insert a single node at the selection.
    pub fn insert_node(&mut self, node: Node) -> Result<(), WeftError> {
        self.insert_nodes(vec![node], InsertNodesOptions::default())
    }

    /// Insert a fragment at the selection.
    pub fn insert_fragment(&mut self, fragment: Vec<Node>) -> Result<(), WeftError> {
        self.insert_fragment_at(fragment, TextInsertOptions::default())
    }

    /// Split the block at the cursor, like pressing Enter.
    pub fn insert_break(&mut self) -> Result<(), WeftError> {
        self.split_nodes(SplitNodesOptions { always: true, ..Default::default() })
    }

    /// Delete one unit behind a collapsed selection.
    pub fn delete_backward(&mut self, unit: TextUnit) -> Result<(), WeftError> {
        if self.selection.as_ref().is_some_and(Range::is_collapsed) {
            self.delete_at(DeleteOptions { unit, reverse: true, ..Default::default() })
        } else {
            Ok(())
        }
    }

    /// Delete one unit ahead of a collapsed selection.
    pub fn delete_forward(&mut self, unit: TextUnit) -> Result<(), WeftError> {
        if self.selection.as_ref().is_some_and(Range::is_collapsed) {
            self.delete_at(DeleteOptions { unit, ..Default::default() })
        } else {
            Ok(())
        }
    }

    /// Delete the content of an expanded selection.
    pub fn delete_fragment(&mut self) -> Result<(), WeftError> {
        if self.selection.as_ref().is_some_and(Range::is_expanded) {
            self.delete_at(DeleteOptions::default())
        } else {
            Ok(())
        }
    }
}
