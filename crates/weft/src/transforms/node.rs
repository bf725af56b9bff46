//! Structural verbs: insert, remove, merge, split, move, set, wrap, unwrap
//! and lift, each decomposed into primitive operations.

use std::cmp::Ordering;

use serde_json::Value;

use crate::editor::{Edge, Editor, Mode, NodeMatch, NodesOptions, PathRef, TextUnit};
use crate::element::Element;
use crate::error::WeftError;
use crate::location::{Location, Span};
use crate::node::{Node, NodeRef};
use crate::operation::Operation;
use crate::path::{Affinity, Path};
use crate::range::RangeAffinity;
use crate::text::{Props, Text};
use crate::transforms::{
    DeleteOptions, InsertNodesOptions, LiftNodesOptions, MergeNodesOptions, MoveNodesOptions,
    RemoveNodesOptions, SetNodesOptions, SplitNodesOptions, UnwrapNodesOptions, WrapNodesOptions,
};

/// The predicate a verb falls back to when no explicit matcher was given.
/// Kept as data rather than a closure so verbs can hand their fallback to
/// the sub-verbs they delegate to.
#[derive(Debug, Clone)]
pub(crate) enum FallbackMatch {
    /// Block elements.
    Block,
    /// Text leaves and inline elements.
    InlineOrText,
    /// Text leaves only.
    Text,
    /// Exactly the node at this path.
    AtPath(Path),
    /// Immediate children of the node at this path.
    ChildrenOf(Path),
    /// The document root only.
    RootOnly,
}

impl Editor {
    fn matches_fallback(&self, fallback: &FallbackMatch, node: NodeRef<'_>, path: &Path) -> bool {
        match fallback {
            FallbackMatch::Block => {
                matches!(node.as_element(), Some(element) if self.is_block(element))
            }
            FallbackMatch::InlineOrText => {
                node.is_text()
                    || matches!(node.as_element(), Some(element) if self.is_inline(element))
            }
            FallbackMatch::Text => node.is_text(),
            FallbackMatch::AtPath(target) => path == target,
            FallbackMatch::ChildrenOf(parent) => parent.is_parent(path),
            FallbackMatch::RootOnly => path.is_empty(),
        }
    }

    /// Paths of the nodes a verb acts on: the explicit matcher when given,
    /// the verb's fallback otherwise.
    pub(crate) fn resolve_matches(
        &self,
        at: &Location,
        matcher: Option<NodeMatch<'_>>,
        fallback: &FallbackMatch,
        mode: Mode,
        voids: bool,
    ) -> Result<Vec<Path>, WeftError> {
        let fallback_fn =
            |node: NodeRef<'_>, path: &Path| self.matches_fallback(fallback, node, path);
        let matcher: NodeMatch = match matcher {
            Some(matcher) => matcher,
            None => &fallback_fn,
        };
        Ok(self
            .nodes(NodesOptions {
                at: Some(at.clone()),
                matcher: Some(matcher),
                mode,
                voids,
                ..Default::default()
            })?
            .into_iter()
            .map(|(_, path)| path)
            .collect())
    }

    /// Path of the closest matching node strictly before the location.
    pub(crate) fn resolve_previous(
        &self,
        at: &Location,
        matcher: Option<NodeMatch<'_>>,
        fallback: &FallbackMatch,
        mode: Mode,
        voids: bool,
    ) -> Result<Option<Path>, WeftError> {
        let Some(point) = self.before(at.clone(), 1, TextUnit::Offset)? else {
            return Ok(None);
        };
        let (_, to) = self.root.first(&Path::root())?;
        let fallback_fn =
            |node: NodeRef<'_>, path: &Path| self.matches_fallback(fallback, node, path);
        let matcher: NodeMatch = match matcher {
            Some(matcher) => matcher,
            None => &fallback_fn,
        };
        let entries = self.nodes(NodesOptions {
            span: Some(Span(point.path, to)),
            matcher: Some(matcher),
            mode,
            reverse: true,
            voids,
            ..Default::default()
        })?;
        Ok(entries.into_iter().next().map(|(_, path)| path))
    }

    /// True for a chain of single children ending in a text leaf, the shape
    /// a merge would leave behind as an empty husk. A void element counts as
    /// a nest no matter its children: merging into one is never meaningful,
    /// so the husk is removed whole instead.
    fn has_single_child_nest(&self, element: &Element) -> bool {
        if self.is_void(element) {
            return true;
        }
        match element.children.as_slice() {
            [Node::Text(_)] => true,
            [Node::Element(child)] => self.has_single_child_nest(child),
            _ => false,
        }
    }

    // ── Verbs ────────────────────────────────────────────────────────────

    /// Insert nodes at a location. A range target is collapsed by deleting
    /// its content first; a point target splits the surrounding structure so
    /// the nodes land between clean boundaries.
    pub fn insert_nodes(
        &mut self,
        nodes: Vec<Node>,
        options: InsertNodesOptions<'_>,
    ) -> Result<(), WeftError> {
        self.without_normalizing(|editor| {
            if nodes.is_empty() {
                return Ok(());
            }
            let mut select = options.select;
            let mut at: Location = match options.at.clone() {
                Some(at) => at,
                None => {
                    if select.is_none() {
                        select = Some(true);
                    }
                    match editor.selection.clone() {
                        Some(selection) => selection.into(),
                        None if editor.root.children.is_empty() => Path(vec![0]).into(),
                        None => editor.end(Path::root())?.into(),
                    }
                }
            };
            let select = select.unwrap_or(false);
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
                other => other,
            };
            at = match at {
                Location::Point(point) => {
                    let fallback = match &nodes[0] {
                        Node::Text(_) => FallbackMatch::Text,
                        Node::Element(element) if editor.is_inline(element) => {
                            FallbackMatch::InlineOrText
                        }
                        Node::Element(_) => FallbackMatch::Block,
                    };
                    let found = editor
                        .resolve_matches(
                            &point.path.clone().into(),
                            options.matcher,
                            &fallback,
                            options.mode,
                            options.voids,
                        )?
                        .into_iter()
                        .next();
                    let Some(match_path) = found else { return Ok(()) };
                    let path_ref = editor.path_ref(match_path.clone());
                    let is_at_end = editor.is_end(&point, match_path)?;
                    editor.split_nodes_inner(
                        SplitNodesOptions {
                            at: Some(point.into()),
                            matcher: options.matcher,
                            mode: options.mode,
                            voids: options.voids,
                            ..Default::default()
                        },
                        Some(fallback),
                    )?;
                    let Some(path) = path_ref.unref(editor) else { return Ok(()) };
                    Location::Path(if is_at_end { path.next()? } else { path })
                }
                other => other,
            };
            let Location::Path(mut at_path) = at else { return Ok(()) };
            let parent_path = at_path.parent()?;
            let mut index = *at_path
                .as_slice()
                .last()
                .ok_or_else(|| WeftError::NotFound(at_path.clone()))?;
            if !options.voids && editor.void_node(parent_path.clone(), Mode::Lowest)?.is_some() {
                return Ok(());
            }
            for node in nodes {
                let path = parent_path.child(index);
                index += 1;
                editor.apply(Operation::InsertNode { path, node })?;
                at_path = at_path.next()?;
            }
            at_path = at_path.previous()?;
            if select {
                if let Ok(point) = editor.end(at_path) {
                    editor.select(point)?;
                }
            }
            Ok(())
        })
    }

    /// Remove every matching node in scope.
    pub fn remove_nodes(&mut self, options: RemoveNodesOptions<'_>) -> Result<(), WeftError> {
        self.without_normalizing(|editor| {
            let at = options.at.clone().or_else(|| editor.selection.clone().map(Location::Range));
            let Some(mut at) = at else { return Ok(()) };
            let fallback = match &at {
                Location::Path(path) => FallbackMatch::AtPath(path.clone()),
                _ => FallbackMatch::Block,
            };
            if !options.hanging {
                if let Location::Range(range) = &at {
                    at = Location::Range(editor.unhang_range(range, options.voids)?);
                }
            }
            let paths = editor.resolve_matches(
                &at,
                options.matcher,
                &fallback,
                options.mode,
                options.voids,
            )?;
            let refs: Vec<PathRef> = paths.into_iter().map(|p| editor.path_ref(p)).collect();
            for path_ref in refs {
                let Some(path) = path_ref.unref(editor) else { continue };
                if !editor.root.has(&path) {
                    continue;
                }
                let node = editor.root.node(&path)?.clone();
                editor.apply(Operation::RemoveNode { path, node })?;
            }
            Ok(())
        })
    }

    /// Update the properties of matching nodes. A `null` value removes the
    /// key. With `split`, boundary leaves are split first so the change
    /// applies to exactly the targeted range.
    pub fn set_nodes(
        &mut self,
        props: Props,
        options: SetNodesOptions<'_>,
    ) -> Result<(), WeftError> {
        self.without_normalizing(|editor| {
            let at = options.at.clone().or_else(|| editor.selection.clone().map(Location::Range));
            let Some(mut at) = at else { return Ok(()) };
            let fallback = match &at {
                Location::Path(path) => FallbackMatch::AtPath(path.clone()),
                _ => FallbackMatch::Block,
            };
            if !options.hanging {
                if let Location::Range(range) = &at {
                    at = Location::Range(editor.unhang_range(range, options.voids)?);
                }
            }
            if options.split {
                if let Location::Range(range) = &at {
                    let range = range.clone();
                    if range.is_collapsed()
                        && editor.root.leaf(&range.anchor.path)?.len_chars() > 0
                    {
                        // An empty-leaf cursor still takes marks; a cursor in
                        // real text has nothing to split around.
                        return Ok(());
                    }
                    let range_ref = editor.range_ref_with(range.clone(), RangeAffinity::Inward);
                    let (start, end) = (range.start().clone(), range.end().clone());
                    let split_mode = if options.mode == Mode::Lowest {
                        Mode::Lowest
                    } else {
                        Mode::Highest
                    };
                    let end_at_end = editor.is_end(&end, end.path.clone())?;
                    editor.split_nodes_inner(
                        SplitNodesOptions {
                            at: Some(end.into()),
                            matcher: options.matcher,
                            mode: split_mode,
                            voids: options.voids,
                            always: !end_at_end,
                            ..Default::default()
                        },
                        Some(fallback.clone()),
                    )?;
                    let start_at_start = editor.is_start(&start, start.path.clone())?;
                    editor.split_nodes_inner(
                        SplitNodesOptions {
                            at: Some(start.into()),
                            matcher: options.matcher,
                            mode: split_mode,
                            voids: options.voids,
                            always: !start_at_start,
                            ..Default::default()
                        },
                        Some(fallback.clone()),
                    )?;
                    match range_ref.unref(editor) {
                        Some(range) => {
                            at = Location::Range(range.clone());
                            if options.at.is_none() {
                                editor.select(range)?;
                            }
                        }
                        None => return Ok(()),
                    }
                }
            }
            let paths = editor.resolve_matches(
                &at,
                options.matcher,
                &fallback,
                options.mode,
                options.voids,
            )?;
            for path in paths {
                if path.is_empty() {
                    continue;
                }
                let node_props: Props = match editor.root.get(&path)? {
                    NodeRef::Text(leaf) => leaf.marks.clone(),
                    NodeRef::Element(element) => element.props.clone(),
                    NodeRef::Root(_) => continue,
                };
                let mut properties = Props::new();
                let mut new_properties = Props::new();
                let mut has_changes = false;
                for (key, value) in &props {
                    if key == "children" || key == "text" {
                        continue;
                    }
                    if node_props.get(key.as_str()) != Some(value) {
                        has_changes = true;
                        if let Some(old) = node_props.get(key.as_str()) {
                            properties.insert(key.clone(), old.clone());
                        }
                        if !value.is_null() {
                            new_properties.insert(key.clone(), value.clone());
                        }
                    }
                }
                if has_changes {
                    editor.apply(Operation::SetNode { path, properties, new_properties })?;
                }
            }
            Ok(())
        })
    }

    /// Remove the given property keys from matching nodes.
    pub fn unset_nodes(
        &mut self,
        keys: &[&str],
        options: SetNodesOptions<'_>,
    ) -> Result<(), WeftError> {
        let mut props = Props::new();
        for key in keys {
            props.insert((*key).to_string(), Value::Null);
        }
        self.set_nodes(props, options)
    }

    /// Merge the matching node with the matching node before it. Non-sibling
    /// targets are moved next to each other first, and an ancestor chain
    /// emptied by the merge is removed afterwards.
    pub fn merge_nodes(&mut self, options: MergeNodesOptions<'_>) -> Result<(), WeftError> {
        self.without_normalizing(|editor| {
            let at = options.at.clone().or_else(|| editor.selection.clone().map(Location::Range));
            let Some(mut at) = at else { return Ok(()) };
            let fallback = match &at {
                Location::Path(path) => FallbackMatch::ChildrenOf(path.parent()?),
                _ => FallbackMatch::Block,
            };
            if !options.hanging {
                if let Location::Range(range) = &at {
                    at = Location::Range(editor.unhang_range(range, options.voids)?);
                }
            }
            at = match at {
                Location::Range(range) => {
                    if range.is_collapsed() {
                        Location::Point(range.anchor)
                    } else {
                        let end = range.end().clone();
                        let end_ref = editor.point_ref(end);
                        editor.delete_at(DeleteOptions {
                            at: Some(range.into()),
                            ..Default::default()
                        })?;
                        let Some(end) = end_ref.unref(editor) else { return Ok(()) };
                        if options.at.is_none() {
                            editor.select(end.clone())?;
                        }
                        Location::Point(end)
                    }
                }
                other => other,
            };
            let current = editor
                .resolve_matches(&at, options.matcher, &fallback, options.mode, options.voids)?
                .into_iter()
                .next();
            let prev = editor.resolve_previous(
                &at,
                options.matcher,
                &fallback,
                options.mode,
                options.voids,
            )?;
            let (Some(path), Some(prev_path)) = (current, prev) else { return Ok(()) };
            if path.is_empty() || prev_path.is_empty() {
                return Ok(());
            }
            let new_path = prev_path.next()?;
            let common = path.common(&prev_path);
            let is_previous_sibling = path.is_sibling(&prev_path);
            let level_paths: Vec<Path> = path
                .levels()
                .filter(|p| p.len() >= common.len() && p.len() < path.len())
                .collect();
            let empty_ancestor: Option<Path> = {
                let matcher = |node: NodeRef<'_>, p: &Path| {
                    level_paths.contains(p)
                        && matches!(node.as_element(), Some(element)
                            if editor.has_single_child_nest(element))
                };
                editor.above(path.clone(), Some(&matcher), Mode::Highest, false)?.map(|(_, p)| p)
            };
            let empty_ref = empty_ancestor.map(|p| editor.path_ref(p));
            let (position, properties, prev_removable) = {
                let node = editor.root.node(&path)?;
                let prev_node = editor.root.node(&prev_path)?;
                let removable = match prev_node {
                    Node::Element(element) => editor.is_empty(element),
                    Node::Text(leaf) => {
                        leaf.text.is_empty() && prev_path.as_slice().last() != Some(&0)
                    }
                };
                match (node, prev_node) {
                    (Node::Text(leaf), Node::Text(prev_leaf)) => {
                        (prev_leaf.len_chars(), leaf.marks.clone(), removable)
                    }
                    (Node::Element(element), Node::Element(prev_element)) => {
                        (prev_element.children.len(), element.props.clone(), removable)
                    }
                    _ => return Err(WeftError::IncompatibleMerge(path.clone())),
                }
            };
            if !is_previous_sibling {
                editor.move_nodes(MoveNodesOptions {
                    at: Some(path.clone().into()),
                    to: new_path,
                    voids: options.voids,
                    ..Default::default()
                })?;
            }
            if let Some(empty_ref) = empty_ref {
                if let Some(empty_path) = empty_ref.current(editor).cloned() {
                    editor.remove_nodes(RemoveNodesOptions {
                        at: Some(empty_path.into()),
                        voids: options.voids,
                        ..Default::default()
                    })?;
                }
            }
            if prev_removable {
                editor.remove_nodes(RemoveNodesOptions {
                    at: Some(prev_path.clone().into()),
                    voids: options.voids,
                    ..Default::default()
                })?;
            } else {
                editor.apply(Operation::MergeNode {
                    path: prev_path.next()?,
                    position,
                    properties,
                })?;
            }
            if let Some(empty_ref) = empty_ref {
                empty_ref.unref(editor);
            }
            Ok(())
        })
    }

    /// Split the nodes above a point so content can be divided there.
    pub fn split_nodes(&mut self, options: SplitNodesOptions<'_>) -> Result<(), WeftError> {
        self.split_nodes_inner(options, None)
    }

    pub(crate) fn split_nodes_inner(
        &mut self,
        options: SplitNodesOptions<'_>,
        fallback: Option<FallbackMatch>,
    ) -> Result<(), WeftError> {
        self.without_normalizing(|editor| {
            let mut always = options.always;
            let mut height = options.height;
            let mut fallback = fallback.unwrap_or(FallbackMatch::Block);
            let at = options.at.clone().or_else(|| editor.selection.clone().map(Location::Range));
            let Some(mut at) = at else { return Ok(()) };
            at = match at {
                Location::Range(range) => match editor.delete_range(range)? {
                    Some(point) => Location::Point(point),
                    None => return Ok(()),
                },
                other => other,
            };
            at = match at {
                Location::Path(path) => {
                    // Splitting "at a path" means splitting the parent so
                    // the node becomes the head of the second half.
                    let point = editor.point(path.clone(), Edge::Start)?;
                    fallback = FallbackMatch::AtPath(path.parent()?);
                    height = point.path.len() - path.len() + 1;
                    always = true;
                    Location::Point(point)
                }
                other => other,
            };
            let Location::Point(mut at) = at else { return Ok(()) };
            let before_ref = editor.point_ref_with(at.clone(), Some(Affinity::Backward));
            let highest = editor
                .resolve_matches(
                    &Location::Point(at.clone()),
                    options.matcher,
                    &fallback,
                    options.mode,
                    options.voids,
                )?
                .into_iter()
                .next();
            let Some(highest_path) = highest else {
                before_ref.unref(editor);
                return Ok(());
            };
            if !options.voids {
                let void_match = editor
                    .void_node(at.clone(), Mode::Highest)?
                    .map(|(node, path)| {
                        let inline =
                            matches!(node.as_element(), Some(element) if editor.is_inline(element));
                        (inline, path)
                    });
                if let Some((is_inline_void, void_path)) = void_match {
                    if is_inline_void {
                        let after = match editor.after(void_path.clone(), 1, TextUnit::Offset)? {
                            Some(point) => point,
                            None => {
                                let after_path = void_path.next()?;
                                editor.insert_nodes(
                                    vec![Node::Text(Text::new(""))],
                                    InsertNodesOptions {
                                        at: Some(after_path.clone().into()),
                                        voids: options.voids,
                                        ..Default::default()
                                    },
                                )?;
                                editor.point(after_path, Edge::Start)?
                            }
                        };
                        at = after;
                    }
                    height = at.path.len() - void_path.len() + 1;
                    always = true;
                }
            }
            let after_ref = editor.point_ref(at.clone());
            let depth = at.path.len().saturating_sub(height);
            let lowest_path = Path(at.path.as_slice()[..depth].to_vec());
            let mut position = if height == 0 { at.offset } else { at.path.as_slice()[depth] };
            let levels: Vec<(Path, Props, bool)> = editor
                .levels(lowest_path, None, true, options.voids)?
                .into_iter()
                .map(|(node, path)| {
                    let props = match node {
                        NodeRef::Text(leaf) => leaf.marks.clone(),
                        NodeRef::Element(element) => element.props.clone(),
                        NodeRef::Root(_) => Props::new(),
                    };
                    let is_void =
                        matches!(node.as_element(), Some(element) if editor.is_void(element));
                    (path, props, is_void)
                })
                .collect();
            for (path, properties, is_void) in levels {
                if path.len() < highest_path.len()
                    || path.is_empty()
                    || (!options.voids && is_void)
                {
                    break;
                }
                let Some(point) = before_ref.current(editor).cloned() else { break };
                let is_end = editor.is_end(&point, path.clone())?;
                let split = always || !editor.is_edge(&point, path.clone())?;
                if split {
                    editor.apply(Operation::SplitNode {
                        path: path.clone(),
                        position,
                        properties,
                    })?;
                }
                // The divider at the next level up sits after this node when
                // it was split, or when the point hangs off its far edge.
                position = *path
                    .as_slice()
                    .last()
                    .ok_or_else(|| WeftError::NotFound(path.clone()))?
                    + usize::from(split || is_end);
            }
            if options.at.is_none() {
                let point = match after_ref.current(editor).cloned() {
                    Some(point) => point,
                    None => editor.end(Path::root())?,
                };
                editor.select(point)?;
            }
            before_ref.unref(editor);
            after_ref.unref(editor);
            Ok(())
        })
    }

    /// Move every matching node to a new destination.
    pub fn move_nodes(&mut self, options: MoveNodesOptions<'_>) -> Result<(), WeftError> {
        self.without_normalizing(|editor| {
            let at = options.at.clone().or_else(|| editor.selection.clone().map(Location::Range));
            let Some(at) = at else { return Ok(()) };
            let fallback = match &at {
                Location::Path(path) => FallbackMatch::AtPath(path.clone()),
                _ => FallbackMatch::Block,
            };
            let to_ref = editor.path_ref(options.to.clone());
            let paths = editor.resolve_matches(
                &at,
                options.matcher,
                &fallback,
                options.mode,
                options.voids,
            )?;
            let refs: Vec<PathRef> = paths.into_iter().map(|p| editor.path_ref(p)).collect();
            for path_ref in refs {
                let Some(path) = path_ref.unref(editor) else { continue };
                let Some(new_path) = to_ref.current(editor).cloned() else { continue };
                if !path.is_empty() {
                    editor.apply(Operation::MoveNode {
                        path: path.clone(),
                        new_path: new_path.clone(),
                    })?;
                }
                // A node dropped into a later sibling slot consumes it, so
                // the next move lands one further on.
                if new_path.is_sibling(&path) && new_path.compare(&path) == Ordering::Greater {
                    if let Some(entry) = editor.path_refs.get_mut(&to_ref.0) {
                        entry.current = entry.current.next()?;
                    }
                }
            }
            to_ref.unref(editor);
            Ok(())
        })
    }

    /// Wrap every matching node (per bounding block) in a fresh element.
    pub fn wrap_nodes(
        &mut self,
        element: Element,
        options: WrapNodesOptions<'_>,
    ) -> Result<(), WeftError> {
        self.without_normalizing(|editor| {
            let at = options.at.clone().or_else(|| editor.selection.clone().map(Location::Range));
            let Some(mut at) = at else { return Ok(()) };
            let wrapper_is_inline = editor.is_inline(&element);
            let fallback = match &at {
                Location::Path(path) => FallbackMatch::AtPath(path.clone()),
                _ if wrapper_is_inline => FallbackMatch::InlineOrText,
                _ => FallbackMatch::Block,
            };
            if options.split {
                if let Location::Range(range) = &at {
                    let range = range.clone();
                    let (start, end) = (range.start().clone(), range.end().clone());
                    let range_ref = editor.range_ref_with(range, RangeAffinity::Inward);
                    editor.split_nodes_inner(
                        SplitNodesOptions {
                            at: Some(end.into()),
                            matcher: options.matcher,
                            voids: options.voids,
                            ..Default::default()
                        },
                        Some(fallback.clone()),
                    )?;
                    editor.split_nodes_inner(
                        SplitNodesOptions {
                            at: Some(start.into()),
                            matcher: options.matcher,
                            voids: options.voids,
                            ..Default::default()
                        },
                        Some(fallback.clone()),
                    )?;
                    match range_ref.unref(editor) {
                        Some(range) => {
                            at = Location::Range(range.clone());
                            if options.at.is_none() {
                                editor.select(range)?;
                            }
                        }
                        None => return Ok(()),
                    }
                }
            }
            // An inline wrapper nests inside each block; a block wrapper
            // nests directly under the root.
            let root_fallback =
                if wrapper_is_inline { FallbackMatch::Block } else { FallbackMatch::RootOnly };
            let roots =
                editor.resolve_matches(&at, None, &root_fallback, Mode::Lowest, options.voids)?;
            for root_path in roots {
                let scope: Option<Location> = match &at {
                    Location::Range(range) => editor
                        .range(root_path.clone(), None)?
                        .intersection(range)
                        .map(Location::Range),
                    other => Some(other.clone()),
                };
                let Some(scope) = scope else { continue };
                let matches = editor.resolve_matches(
                    &scope,
                    options.matcher,
                    &fallback,
                    options.mode,
                    options.voids,
                )?;
                let (Some(first_path), Some(last_path)) =
                    (matches.first().cloned(), matches.last().cloned())
                else {
                    continue;
                };
                if first_path.is_empty() && last_path.is_empty() {
                    continue;
                }
                let common_path = if first_path == last_path {
                    first_path.parent()?
                } else {
                    first_path.common(&last_path)
                };
                let range = editor.range(first_path, Some(last_path.clone().into()))?;
                let depth = common_path.len() + 1;
                let wrapper_path = Path(last_path.as_slice()[..depth].to_vec()).next()?;
                let mut wrapper = element.clone();
                wrapper.children = Vec::new();
                editor.insert_nodes(
                    vec![Node::Element(wrapper)],
                    InsertNodesOptions {
                        at: Some(wrapper_path.clone().into()),
                        voids: options.voids,
                        ..Default::default()
                    },
                )?;
                editor.move_nodes_inner(
                    MoveNodesOptions {
                        at: Some(range.into()),
                        to: wrapper_path.child(0),
                        voids: options.voids,
                        ..Default::default()
                    },
                    Some(FallbackMatch::ChildrenOf(common_path)),
                )?;
            }
            Ok(())
        })
    }

    /// Unwrap matching nodes by lifting their children out and removing the
    /// then-empty shells.
    pub fn unwrap_nodes(&mut self, options: UnwrapNodesOptions<'_>) -> Result<(), WeftError> {
        self.without_normalizing(|editor| {
            let at = options.at.clone().or_else(|| editor.selection.clone().map(Location::Range));
            let Some(mut at) = at else { return Ok(()) };
            let fallback = match &at {
                Location::Path(path) => FallbackMatch::AtPath(path.clone()),
                _ => FallbackMatch::Block,
            };
            at = match at {
                Location::Path(path) => Location::Range(editor.range(path, None)?),
                other => other,
            };
            let range_ref = match &at {
                Location::Range(range) => Some(editor.range_ref(range.clone())),
                _ => None,
            };
            let paths = editor.resolve_matches(
                &at,
                options.matcher,
                &fallback,
                options.mode,
                options.voids,
            )?;
            let mut refs: Vec<PathRef> = paths.into_iter().map(|p| editor.path_ref(p)).collect();
            refs.reverse();
            for path_ref in refs {
                let Some(path) = path_ref.unref(editor) else { continue };
                let mut range = editor.range(path.clone(), None)?;
                if options.split {
                    if let Some(range_ref) = range_ref {
                        let Some(current) = range_ref.current(editor) else { continue };
                        match current.intersection(&range) {
                            Some(clipped) => range = clipped,
                            None => continue,
                        }
                    }
                }
                editor.lift_nodes_inner(
                    LiftNodesOptions {
                        at: Some(range.into()),
                        voids: options.voids,
                        ..Default::default()
                    },
                    Some(FallbackMatch::ChildrenOf(path)),
                )?;
            }
            if let Some(range_ref) = range_ref {
                range_ref.unref(editor);
            }
            Ok(())
        })
    }

    /// Lift matching nodes one level up, splitting or removing their parent
    /// as needed to keep siblings intact.
    pub fn lift_nodes(&mut self, options: LiftNodesOptions<'_>) -> Result<(), WeftError> {
        self.lift_nodes_inner(options, None)
    }

    fn move_nodes_inner(
        &mut self,
        options: MoveNodesOptions<'_>,
        fallback: Option<FallbackMatch>,
    ) -> Result<(), WeftError> {
        match fallback {
            None => self.move_nodes(options),
            Some(fallback) => self.without_normalizing(|editor| {
                let at = options
                    .at
                    .clone()
                    .or_else(|| editor.selection.clone().map(Location::Range));
                let Some(at) = at else { return Ok(()) };
                let to_ref = editor.path_ref(options.to.clone());
                let paths = editor.resolve_matches(
                    &at,
                    options.matcher,
                    &fallback,
                    options.mode,
                    options.voids,
                )?;
                let refs: Vec<PathRef> = paths.into_iter().map(|p| editor.path_ref(p)).collect();
                for path_ref in refs {
                    let Some(path) = path_ref.unref(editor) else { continue };
                    let Some(new_path) = to_ref.current(editor).cloned() else { continue };
                    if !path.is_empty() {
                        editor.apply(Operation::MoveNode {
                            path: path.clone(),
                            new_path: new_path.clone(),
                        })?;
                    }
                    if new_path.is_sibling(&path) && new_path.compare(&path) == Ordering::Greater {
                        if let Some(entry) = editor.path_refs.get_mut(&to_ref.0) {
                            entry.current = entry.current.next()?;
                        }
                    }
                }
                to_ref.unref(editor);
                Ok(())
            }),
        }
    }

    pub(crate) fn lift_nodes_inner(
        &mut self,
        options: LiftNodesOptions<'_>,
        fallback: Option<FallbackMatch>,
    ) -> Result<(), WeftError> {
        self.without_normalizing(|editor| {
            let at = options.at.clone().or_else(|| editor.selection.clone().map(Location::Range));
            let Some(at) = at else { return Ok(()) };
            let fallback = match fallback {
                Some(fallback) => fallback,
                None => match &at {
                    Location::Path(path) => FallbackMatch::AtPath(path.clone()),
                    _ => FallbackMatch::Block,
                },
            };
            let paths = editor.resolve_matches(
                &at,
                options.matcher,
                &fallback,
                options.mode,
                options.voids,
            )?;
            let refs: Vec<PathRef> = paths.into_iter().map(|p| editor.path_ref(p)).collect();
            for path_ref in refs {
                let Some(path) = path_ref.unref(editor) else { continue };
                if path.len() < 2 {
                    return Err(WeftError::ShallowLift(path));
                }
                let parent_path = path.parent()?;
                let sibling_count = editor.root.children_of(&parent_path)?.len();
                let index = *path
                    .as_slice()
                    .last()
                    .ok_or_else(|| WeftError::NotFound(path.clone()))?;
                if sibling_count == 1 {
                    let to_path = parent_path.next()?;
                    editor.move_nodes(MoveNodesOptions {
                        at: Some(path.into()),
                        to: to_path,
                        voids: options.voids,
                        ..Default::default()
                    })?;
                    editor.remove_nodes(RemoveNodesOptions {
                        at: Some(parent_path.into()),
                        voids: options.voids,
                        ..Default::default()
                    })?;
                } else if index == 0 {
                    editor.move_nodes(MoveNodesOptions {
                        at: Some(path.into()),
                        to: parent_path,
                        voids: options.voids,
                        ..Default::default()
                    })?;
                } else if index == sibling_count - 1 {
                    editor.move_nodes(MoveNodesOptions {
                        at: Some(path.into()),
                        to: parent_path.next()?,
                        voids: options.voids,
                        ..Default::default()
                    })?;
                } else {
                    let split_path = path.next()?;
                    let to_path = parent_path.next()?;
                    editor.split_nodes(SplitNodesOptions {
                        at: Some(split_path.into()),
                        voids: options.voids,
                        ..Default::default()
                    })?;
                    editor.move_nodes(MoveNodesOptions {
                        at: Some(path.into()),
                        to: to_path,
                        voids: options.voids,
                        ..Default::default()
                    })?;
                }
            }
            Ok(())
        })
    }
}
