//! Read-side queries over the editor: resolving locations to concrete
//! paths and points, walking matching nodes, and enumerating cursor
//! positions by unit.

use std::cmp::Ordering;

use unicode_segmentation::UnicodeSegmentation;

use crate::editor::Editor;
use crate::error::WeftError;
use crate::location::{Location, Span};
use crate::node::{Node, NodeEntry, NodeRef, TraverseOptions};
use crate::path::Path;
use crate::point::Point;
use crate::range::Range;
use crate::text::Props;

/// Which matching ancestor a verb acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Every match along the way.
    #[default]
    All,
    /// The shallowest match only.
    Highest,
    /// The deepest match only.
    Lowest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Start,
    End,
}

/// The unit a cursor travels by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextUnit {
    #[default]
    Offset,
    /// One user-perceived character (a grapheme cluster).
    Character,
    Word,
    /// The rest of the block.
    Line,
}

/// Node-matching predicate used by queries and transform verbs.
pub type NodeMatch<'m> = &'m dyn Fn(NodeRef<'_>, &Path) -> bool;

pub struct NodesOptions<'m> {
    /// Defaults to the selection.
    pub at: Option<Location>,
    /// A concrete path span overriding `at` when present.
    pub span: Option<Span>,
    /// Defaults to matching every node.
    pub matcher: Option<NodeMatch<'m>>,
    pub mode: Mode,
    /// Return matches only if every text node in scope is covered by one.
    pub universal: bool,
    pub reverse: bool,
    /// Descend into void elements.
    pub voids: bool,
}

impl Default for NodesOptions<'_> {
    fn default() -> Self {
        NodesOptions {
            at: None,
            span: None,
            matcher: None,
            mode: Mode::All,
            universal: false,
            reverse: false,
            voids: false,
        }
    }
}

pub struct PositionsOptions {
    /// Defaults to the selection.
    pub at: Option<Location>,
    pub unit: TextUnit,
    pub reverse: bool,
    pub voids: bool,
}

impl Default for PositionsOptions {
    fn default() -> Self {
        PositionsOptions { at: None, unit: TextUnit::Offset, reverse: false, voids: false }
    }
}

impl Editor {
    // ── Location resolution ──────────────────────────────────────────────

    /// The path a location refers to: a range resolves to the common
    /// ancestor of its edges, a point to its leaf.
    pub fn path(&self, at: impl Into<Location>) -> Result<Path, WeftError> {
        self.path_with(at, None, None)
    }

    pub fn path_with(
        &self,
        at: impl Into<Location>,
        depth: Option<usize>,
        edge: Option<Edge>,
    ) -> Result<Path, WeftError> {
        let mut path = match at.into() {
            Location::Path(path) => match edge {
                Some(Edge::Start) => self.root.first(&path)?.1,
                Some(Edge::End) => self.root.last(&path)?.1,
                None => path,
            },
            Location::Point(point) => point.path,
            Location::Range(range) => match edge {
                Some(Edge::Start) => range.start().path.clone(),
                Some(Edge::End) => range.end().path.clone(),
                None => range.anchor.path.common(&range.focus.path),
            },
        };
        if let Some(depth) = depth {
            path = Path(path.as_slice()[..depth.min(path.len())].to_vec());
        }
        Ok(path)
    }

    /// The start or end point of a location.
    pub fn point(&self, at: impl Into<Location>, edge: Edge) -> Result<Point, WeftError> {
        match at.into() {
            Location::Path(path) => match edge {
                Edge::Start => {
                    let (node, first) = self.root.first(&path)?;
                    if !node.is_text() {
                        return Err(WeftError::NotText(first));
                    }
                    Ok(Point::new(first, 0))
                }
                Edge::End => {
                    let (node, last) = self.root.last(&path)?;
                    let leaf = node.as_text().ok_or(WeftError::NotText(last.clone()))?;
                    Ok(Point::new(last, leaf.len_chars()))
                }
            },
            Location::Point(point) => Ok(point),
            Location::Range(range) => Ok(match edge {
                Edge::Start => range.start().clone(),
                Edge::End => range.end().clone(),
            }),
        }
    }

    pub fn start(&self, at: impl Into<Location>) -> Result<Point, WeftError> {
        self.point(at, Edge::Start)
    }

    pub fn end(&self, at: impl Into<Location>) -> Result<Point, WeftError> {
        self.point(at, Edge::End)
    }

    pub fn edges(&self, at: impl Into<Location>) -> Result<(Point, Point), WeftError> {
        let at = at.into();
        Ok((self.start(at.clone())?, self.end(at)?))
    }

    /// The range a location spans; `to` extends it when given.
    pub fn range(
        &self,
        at: impl Into<Location>,
        to: Option<Location>,
    ) -> Result<Range, WeftError> {
        let at = at.into();
        if to.is_none() {
            if let Location::Range(range) = at {
                return Ok(range);
            }
        }
        let start = self.start(at.clone())?;
        let end = self.end(to.unwrap_or(at))?;
        Ok(Range::new(start, end))
    }

    // ── Node resolution ──────────────────────────────────────────────────

    pub fn node(&self, at: impl Into<Location>) -> Result<NodeEntry<'_>, WeftError> {
        let path = self.path(at)?;
        Ok((self.root.get(&path)?, path))
    }

    pub fn leaf_at(&self, at: impl Into<Location>) -> Result<(&crate::text::Text, Path), WeftError> {
        let path = self.path(at)?;
        Ok((self.root.leaf(&path)?, path))
    }

    pub fn parent(&self, at: impl Into<Location>) -> Result<NodeEntry<'_>, WeftError> {
        let path = self.path(at)?.parent()?;
        Ok((self.root.get(&path)?, path))
    }

    pub fn first(&self, at: impl Into<Location>) -> Result<NodeEntry<'_>, WeftError> {
        let path = self.path(at)?;
        self.root.first(&path)
    }

    pub fn last(&self, at: impl Into<Location>) -> Result<NodeEntry<'_>, WeftError> {
        let path = self.path(at)?;
        self.root.last(&path)
    }

    pub fn has_path(&self, path: &Path) -> bool {
        self.root.has(path)
    }

    /// The slice of the document a location spans, as detached nodes.
    pub fn fragment(&self, at: impl Into<Location>) -> Result<Vec<Node>, WeftError> {
        let range = self.range(at, None)?;
        self.root.fragment(&range)
    }

    /// The text a location spans, boundary leaves trimmed.
    pub fn string(&self, at: impl Into<Location>, voids: bool) -> Result<String, WeftError> {
        let range = self.range(at, None)?;
        let (start, end) = range.edges();
        let (start, end) = (start.clone(), end.clone());
        let matcher: NodeMatch = &|node, _| node.is_text();
        let entries = self.nodes(NodesOptions {
            at: Some(range.into()),
            matcher: Some(matcher),
            voids,
            ..Default::default()
        })?;
        let mut out = String::new();
        for (node, path) in entries {
            let Some(leaf) = node.as_text() else { continue };
            let mut chars: Vec<char> = leaf.text.chars().collect();
            if path == end.path {
                chars.truncate(end.offset);
            }
            if path == start.path {
                chars.drain(..start.offset.min(chars.len()));
            }
            out.extend(chars);
        }
        Ok(out)
    }

    // ── Matching walks ───────────────────────────────────────────────────

    /// All matching entries in scope, honoring `mode` so that nested
    /// matches collapse to the highest or lowest of each chain.
    pub fn nodes<'a>(&'a self, options: NodesOptions<'_>) -> Result<Vec<NodeEntry<'a>>, WeftError> {
        let at = match options.at.or_else(|| self.selection.clone().map(Location::Range)) {
            Some(at) => at,
            None => return Ok(Vec::new()),
        };
        let (from, to) = match options.span {
            Some(Span(from, to)) => (from, to),
            None => {
                let first = self.path_with(at.clone(), None, Some(Edge::Start))?;
                let last = self.path_with(at, None, Some(Edge::End))?;
                if options.reverse {
                    (last, first)
                } else {
                    (first, last)
                }
            }
        };
        let voids = options.voids;
        let pass = |node: NodeRef<'_>, _: &Path| match node.as_element() {
            Some(element) if !voids => self.is_void(element),
            _ => false,
        };
        let walk = self.root.nodes(TraverseOptions {
            from,
            to: Some(to),
            reverse: options.reverse,
            pass: Some(&pass),
        });
        let default_matcher = |_: NodeRef<'_>, _: &Path| true;
        let matcher: NodeMatch = match options.matcher {
            Some(matcher) => matcher,
            None => &default_matcher,
        };
        let mut emitted: Vec<NodeEntry<'a>> = Vec::new();
        let mut hit: Option<NodeEntry<'a>> = None;
        for (node, path) in walk {
            let is_lower =
                hit.as_ref().is_some_and(|(_, h)| path.compare(h) == Ordering::Equal);
            if options.mode == Mode::Highest && is_lower {
                continue;
            }
            if !matcher(node, &path) {
                // A universal walk fails as soon as one leaf is uncovered.
                if options.universal && !is_lower && node.is_text() {
                    return Ok(Vec::new());
                }
                continue;
            }
            if options.mode == Mode::Lowest && is_lower {
                hit = Some((node, path));
                continue;
            }
            if options.mode == Mode::Lowest {
                if let Some(previous) = hit.take() {
                    emitted.push(previous);
                }
                hit = Some((node, path));
            } else {
                emitted.push((node, path.clone()));
                hit = Some((node, path));
            }
        }
        if options.mode == Mode::Lowest {
            if let Some(entry) = hit {
                emitted.push(entry);
            }
        }
        Ok(emitted)
    }

    /// The entries at every prefix of the location's path, root first,
    /// stopping at a void unless told otherwise.
    pub fn levels<'a>(
        &'a self,
        at: impl Into<Location>,
        matcher: Option<NodeMatch<'_>>,
        reverse: bool,
        voids: bool,
    ) -> Result<Vec<NodeEntry<'a>>, WeftError> {
        let default_matcher = |_: NodeRef<'_>, _: &Path| true;
        let matcher: NodeMatch = match matcher {
            Some(matcher) => matcher,
            None => &default_matcher,
        };
        let path = self.path(at)?;
        let mut levels: Vec<NodeEntry<'a>> = Vec::new();
        for prefix in path.levels() {
            let node = self.root.get(&prefix)?;
            if !matcher(node, &prefix) {
                continue;
            }
            levels.push((node, prefix));
            if let Some(element) = node.as_element() {
                if !voids && self.is_void(element) {
                    break;
                }
            }
        }
        if reverse {
            levels.reverse();
        }
        Ok(levels)
    }

    /// The closest matching ancestor strictly above the location.
    pub fn above<'a>(
        &'a self,
        at: impl Into<Location>,
        matcher: Option<NodeMatch<'_>>,
        mode: Mode,
        voids: bool,
    ) -> Result<Option<NodeEntry<'a>>, WeftError> {
        let at = at.into();
        let path = self.path(at.clone())?;
        let reverse = mode == Mode::Lowest;
        for (node, p) in self.levels(path.clone(), matcher, reverse, voids)? {
            if node.is_text() {
                continue;
            }
            match &at {
                Location::Range(range) => {
                    if p.is_ancestor(&range.start().path) && p.is_ancestor(&range.end().path) {
                        return Ok(Some((node, p)));
                    }
                }
                _ => {
                    if p != path {
                        return Ok(Some((node, p)));
                    }
                }
            }
        }
        Ok(None)
    }

    /// The closest void ancestor, if the location is inside one.
    pub fn void_node(
        &self,
        at: impl Into<Location>,
        mode: Mode,
    ) -> Result<Option<NodeEntry<'_>>, WeftError> {
        let matcher: NodeMatch = &|node, _| {
            matches!(node.as_element(), Some(element) if self.is_void(element))
        };
        self.above(at, Some(matcher), mode, true)
    }

    /// The previous matching entry before the location, if any.
    pub fn previous_node(
        &self,
        at: impl Into<Location>,
        matcher: Option<NodeMatch<'_>>,
        mode: Mode,
    ) -> Result<Option<NodeEntry<'_>>, WeftError> {
        let Some(point) = self.before(at, 1, TextUnit::Offset)? else {
            return Ok(None);
        };
        let (_, to) = self.root.first(&Path::root())?;
        let entries = self.nodes(NodesOptions {
            span: Some(Span(point.path, to)),
            matcher,
            mode,
            reverse: true,
            ..Default::default()
        })?;
        Ok(entries.into_iter().next().map(|(n, p)| (n, p)))
    }

    /// The next matching entry after the location, if any.
    pub fn next_node(
        &self,
        at: impl Into<Location>,
        matcher: Option<NodeMatch<'_>>,
        mode: Mode,
    ) -> Result<Option<NodeEntry<'_>>, WeftError> {
        let Some(point) = self.after(at, 1, TextUnit::Offset)? else {
            return Ok(None);
        };
        let (_, to) = self.root.last(&Path::root())?;
        let entries = self.nodes(NodesOptions {
            span: Some(Span(point.path, to)),
            matcher,
            mode,
            ..Default::default()
        })?;
        Ok(entries.into_iter().next().map(|(n, p)| (n, p)))
    }

    // ── Point arithmetic ─────────────────────────────────────────────────

    /// Every cursor position in scope, in travel order for the given unit.
    pub fn positions(&self, options: PositionsOptions) -> Result<Vec<Point>, WeftError> {
        let at = match options.at.or_else(|| self.selection.clone().map(Location::Range)) {
            Some(at) => at,
            None => return Ok(Vec::new()),
        };
        let reverse = options.reverse;
        let unit = options.unit;
        let range = self.range(at, None)?;
        let (start, end) = range.edges();
        let (start, end) = (start.clone(), end.clone());
        let first = if reverse { end.clone() } else { start.clone() };
        let mut out: Vec<Point> = Vec::new();
        let mut is_new_block = false;
        let mut block_text = String::new();
        let mut distance = 0usize;
        let mut leaf_remaining = 0isize;
        let mut leaf_offset = 0usize;
        let entries = self.nodes(NodesOptions {
            at: Some(range.clone().into()),
            reverse,
            voids: options.voids,
            ..Default::default()
        })?;
        for (node, path) in entries {
            if let Some(element) = node.as_element() {
                // A void is a single opaque position.
                if !options.voids && self.is_void(element) {
                    out.push(self.start(path)?);
                    continue;
                }
                if self.is_inline(element) {
                    continue;
                }
                if self.has_inlines(element) {
                    let block_end = if path.is_ancestor(&end.path) {
                        end.clone()
                    } else {
                        self.end(path.clone())?
                    };
                    let block_start = if path.is_ancestor(&start.path) {
                        start.clone()
                    } else {
                        self.start(path.clone())?
                    };
                    block_text = self
                        .string(Range::new(block_start, block_end), options.voids)?;
                    is_new_block = true;
                }
                continue;
            }
            let Some(leaf) = node.as_text() else { continue };
            let is_first = path == first.path;
            let leaf_len = leaf.len_chars();
            if is_first {
                leaf_remaining =
                    if reverse { first.offset as isize } else { (leaf_len - first.offset) as isize };
                leaf_offset = first.offset;
            } else {
                leaf_remaining = leaf_len as isize;
                leaf_offset = if reverse { leaf_len } else { 0 };
            }
            if is_first || is_new_block || unit == TextUnit::Offset {
                out.push(Point::new(path.clone(), leaf_offset));
                is_new_block = false;
            }
            loop {
                if distance == 0 {
                    if block_text.is_empty() {
                        break;
                    }
                    distance = calc_distance(&block_text, unit, reverse);
                    block_text = strip_chars(&block_text, distance, reverse);
                }
                leaf_remaining -= distance as isize;
                if leaf_remaining < 0 {
                    // The unit continues into the next leaf.
                    distance = (-leaf_remaining) as usize;
                    break;
                }
                leaf_offset =
                    if reverse { leaf_offset - distance } else { leaf_offset + distance };
                distance = 0;
                out.push(Point::new(path.clone(), leaf_offset));
            }
        }
        Ok(out)
    }

    /// The point `distance` units before the location. Clamps to the
    /// furthest reachable position; `None` only when no position precedes
    /// the location at all.
    pub fn before(
        &self,
        at: impl Into<Location>,
        distance: usize,
        unit: TextUnit,
    ) -> Result<Option<Point>, WeftError> {
        let anchor = self.start(Path::root())?;
        let focus = self.point(at, Edge::Start)?;
        let range = Range::new(anchor, focus);
        let positions = self.positions(PositionsOptions {
            at: Some(range.into()),
            unit,
            reverse: true,
            ..Default::default()
        })?;
        // The first position is the location itself.
        Ok(positions.into_iter().skip(1).take(distance).last())
    }

    /// The point `distance` units after the location, clamped like
    /// [`Editor::before`].
    pub fn after(
        &self,
        at: impl Into<Location>,
        distance: usize,
        unit: TextUnit,
    ) -> Result<Option<Point>, WeftError> {
        let anchor = self.point(at, Edge::End)?;
        let focus = self.end(Path::root())?;
        let range = Range::new(anchor, focus);
        let positions = self.positions(PositionsOptions {
            at: Some(range.into()),
            unit,
            ..Default::default()
        })?;
        Ok(positions.into_iter().skip(1).take(distance).last())
    }

    pub fn is_start(&self, point: &Point, at: impl Into<Location>) -> Result<bool, WeftError> {
        // Cheap reject before resolving the location's own start.
        if point.offset != 0 {
            return Ok(false);
        }
        Ok(*point == self.start(at)?)
    }

    pub fn is_end(&self, point: &Point, at: impl Into<Location>) -> Result<bool, WeftError> {
        Ok(*point == self.end(at)?)
    }

    pub fn is_edge(&self, point: &Point, at: impl Into<Location>) -> Result<bool, WeftError> {
        let at = at.into();
        Ok(self.is_start(point, at.clone())? || self.is_end(point, at)?)
    }

    /// Pull a range's trailing edge back out of a block it only "hangs"
    /// into: a range ending at offset 0 of a later block really means it
    /// ends at the end of the previous text.
    pub fn unhang_range(&self, range: &Range, voids: bool) -> Result<Range, WeftError> {
        let (start, end) = range.edges();
        let (start, mut end) = (start.clone(), end.clone());
        if start.offset != 0 || end.offset != 0 || range.is_collapsed() || end.path.has_previous()
        {
            return Ok(range.clone());
        }
        let block = self.above(
            end.clone(),
            Some(&|node, _| {
                matches!(node.as_element(), Some(element) if self.is_block(element))
            }),
            Mode::Lowest,
            voids,
        )?;
        let block_path = block.map(|(_, p)| p).unwrap_or_else(Path::root);
        let first = self.start(start.path.clone())?;
        let before = Range::new(first, end.clone());
        let matcher: NodeMatch = &|node, _| node.is_text();
        let entries = self.nodes(NodesOptions {
            at: Some(before.into()),
            matcher: Some(matcher),
            reverse: true,
            voids,
            ..Default::default()
        })?;
        let mut skip = true;
        for (node, path) in entries {
            if skip {
                skip = false;
                continue;
            }
            let Some(leaf) = node.as_text() else { continue };
            if !leaf.text.is_empty() || path.is_before(&block_path) {
                end = Point::new(path, leaf.len_chars());
                break;
            }
        }
        Ok(Range::new(start, end))
    }

    /// The marks that would apply to text typed at the selection: the
    /// pending set if any, otherwise those of the leaf behind the cursor.
    pub fn current_marks(&self) -> Result<Option<Props>, WeftError> {
        let Some(selection) = self.selection.clone() else {
            return Ok(None);
        };
        if let Some(marks) = &self.marks {
            return Ok(Some(marks.clone()));
        }
        if selection.is_expanded() {
            let matcher: NodeMatch = &|node, _| node.is_text();
            let entries = self.nodes(NodesOptions {
                matcher: Some(matcher),
                ..Default::default()
            })?;
            return Ok(entries
                .first()
                .and_then(|(node, _)| node.as_text())
                .map(|leaf| leaf.marks.clone()));
        }
        let anchor = &selection.anchor;
        let mut marks = self.root.leaf(&anchor.path)?.marks.clone();
        if anchor.offset == 0 {
            let matcher: NodeMatch = &|node, _| node.is_text();
            let prev = self.previous_node(anchor.path.clone(), Some(matcher), Mode::Lowest)?;
            let marked_void = self.above(
                anchor.clone(),
                Some(&|node, _| {
                    matches!(node.as_element(), Some(element)
                        if self.is_void(element) && self.is_markable_void(element))
                }),
                Mode::Lowest,
                true,
            )?;
            if marked_void.is_none() {
                let block = self.above(
                    anchor.clone(),
                    Some(&|node, _| {
                        matches!(node.as_element(), Some(element) if self.is_block(element))
                    }),
                    Mode::Lowest,
                    false,
                )?;
                if let (Some((prev_node, prev_path)), Some((_, block_path))) = (prev, block) {
                    // Typing at a leaf start extends the previous leaf's
                    // formatting, as long as it sits in the same block.
                    if block_path.is_ancestor(&prev_path) {
                        if let Some(prev_leaf) = prev_node.as_text() {
                            marks = prev_leaf.marks.clone();
                        }
                    }
                }
            }
        }
        Ok(Some(marks))
    }
}

/// Char length of the next unit step at the near edge of `text`.
fn calc_distance(text: &str, unit: TextUnit, reverse: bool) -> usize {
    match unit {
        TextUnit::Offset => 1,
        TextUnit::Character => {
            let mut graphemes = text.graphemes(true);
            let grapheme = if reverse { graphemes.next_back() } else { graphemes.next() };
            grapheme.map(|g| g.chars().count()).unwrap_or(0).max(1)
        }
        TextUnit::Word => word_distance(text, reverse).max(1),
        TextUnit::Line => text.chars().count().max(1),
    }
}

/// Chars until the end of the adjacent word, leading separators included.
fn word_distance(text: &str, reverse: bool) -> usize {
    let segments: Vec<&str> = text.split_word_bounds().collect();
    let mut distance = 0;
    let mut in_word = false;
    let iter: Box<dyn Iterator<Item = &&str>> = if reverse {
        Box::new(segments.iter().rev())
    } else {
        Box::new(segments.iter())
    };
    for segment in iter {
        let is_word = segment.chars().any(char::is_alphanumeric);
        if is_word {
            in_word = true;
            distance += segment.chars().count();
        } else if in_word {
            break;
        } else {
            distance += segment.chars().count();
        }
    }
    distance
}

/// Drop `distance` chars from the near edge of `text`.
fn strip_chars(text: &str, distance: usize, reverse: bool) -> String {
    if reverse {
        let len = text.chars().count();
        text.chars().take(len.saturating_sub(distance)).collect()
    } else {
        text.chars().skip(distance).collect()
    }
}
