//! The document tree and its traversal.
//!
//! A document is a [`Root`] owning a list of [`Node`]s; every node is either
//! an [`Element`] (which owns further children) or a [`Text`] leaf. There are
//! no parent pointers — all addressing is top-down via [`Path`] — so the
//! shape is a strict tree by construction. [`NodeRef`] is the borrowed view
//! that unifies the root and the two node kinds for read-side traversal.

use serde::{Deserialize, Serialize};

use crate::element::Element;
use crate::error::WeftError;
use crate::path::Path;
use crate::range::Range;
use crate::text::{Props, Text};

/// A descendant node: a branch element or a text leaf.
///
/// Serialized untagged: an element is `{"children": [...], ...props}` and a
/// leaf is `{"text": "...", ...marks}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Element(Element),
    Text(Text),
}

impl Node {
    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text(_))
    }

    pub fn is_element(&self) -> bool {
        matches!(self, Node::Element(_))
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Node::Text(t) => Some(t),
            Node::Element(_) => None,
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        }
    }

    pub fn children(&self) -> Option<&Vec<Node>> {
        match self {
            Node::Element(e) => Some(&e.children),
            Node::Text(_) => None,
        }
    }

    /// The concatenated text content of this subtree.
    pub fn string(&self) -> String {
        match self {
            Node::Text(t) => t.text.clone(),
            Node::Element(e) => e.children.iter().map(Node::string).collect(),
        }
    }

    /// The property map of either kind: props for an element, marks for a
    /// leaf.
    pub fn props(&self) -> &Props {
        match self {
            Node::Element(e) => &e.props,
            Node::Text(t) => &t.marks,
        }
    }

    pub fn props_mut(&mut self) -> &mut Props {
        match self {
            Node::Element(e) => &mut e.props,
            Node::Text(t) => &mut t.marks,
        }
    }

    /// The relative paths of this node (`[]`) and every descendant, in
    /// document pre-order.
    pub fn descendant_paths(&self) -> Vec<Path> {
        fn walk(node: &Node, prefix: &Path, out: &mut Vec<Path>) {
            out.push(prefix.clone());
            if let Node::Element(e) = node {
                for (i, child) in e.children.iter().enumerate() {
                    walk(child, &prefix.child(i), out);
                }
            }
        }
        let mut out = Vec::new();
        walk(self, &Path::root(), &mut out);
        out
    }
}

/// The single owner of a document's top-level children.
///
/// Kept distinct from [`Node`] so that a root can never appear nested inside
/// an element. Serialized transparently as the children array, which is the
/// interchange form of a whole document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Root {
    pub children: Vec<Node>,
}

/// Borrowed view of any position in the tree, the root included.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Root(&'a Root),
    Element(&'a Element),
    Text(&'a Text),
}

impl<'a> NodeRef<'a> {
    pub fn is_text(&self) -> bool {
        matches!(self, NodeRef::Text(_))
    }

    pub fn is_element(&self) -> bool {
        matches!(self, NodeRef::Element(_))
    }

    pub fn as_text(&self) -> Option<&'a Text> {
        match self {
            NodeRef::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_element(&self) -> Option<&'a Element> {
        match self {
            NodeRef::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Children of the root or an element; `None` for a leaf.
    pub fn children(&self) -> Option<&'a Vec<Node>> {
        match self {
            NodeRef::Root(r) => Some(&r.children),
            NodeRef::Element(e) => Some(&e.children),
            NodeRef::Text(_) => None,
        }
    }

    pub fn string(&self) -> String {
        match self {
            NodeRef::Root(r) => r.children.iter().map(Node::string).collect(),
            NodeRef::Element(e) => e.children.iter().map(Node::string).collect(),
            NodeRef::Text(t) => t.text.clone(),
        }
    }
}

/// A node paired with its path, the unit yielded by traversal.
pub type NodeEntry<'a> = (NodeRef<'a>, Path);

/// Bounds and filters for [`Root::nodes`].
#[derive(Default)]
pub struct TraverseOptions<'p> {
    /// Start the walk descending toward this path (the root and the spine
    /// above `from` are still visited).
    pub from: Path,
    /// Stop once past this path (before it, when walking in reverse).
    pub to: Option<Path>,
    pub reverse: bool,
    /// Prune descent into any subtree whose root entry matches; the matched
    /// node itself is still yielded. Used to skip void subtrees.
    pub pass: Option<&'p dyn Fn(NodeRef<'_>, &Path) -> bool>,
}

impl Root {
    pub fn new(children: Vec<Node>) -> Self {
        Root { children }
    }

    /// Resolve a path to a borrowed view; `[]` resolves to the root itself.
    pub fn get(&self, path: &Path) -> Result<NodeRef<'_>, WeftError> {
        let mut node: Option<&Node> = None;
        for &index in path.as_slice() {
            let children = match node {
                None => &self.children,
                Some(Node::Element(e)) => &e.children,
                Some(Node::Text(_)) => return Err(WeftError::NotFound(path.clone())),
            };
            node = Some(children.get(index).ok_or_else(|| WeftError::NotFound(path.clone()))?);
        }
        Ok(match node {
            None => NodeRef::Root(self),
            Some(Node::Element(e)) => NodeRef::Element(e),
            Some(Node::Text(t)) => NodeRef::Text(t),
        })
    }

    pub fn has(&self, path: &Path) -> bool {
        self.get(path).is_ok()
    }

    /// Resolve a non-root path to the concrete node.
    pub fn node(&self, path: &Path) -> Result<&Node, WeftError> {
        let parent = self.children_of(&path.parent()?)?;
        let index = *path.as_slice().last().ok_or_else(|| WeftError::NotFound(path.clone()))?;
        parent.get(index).ok_or_else(|| WeftError::NotFound(path.clone()))
    }

    /// Resolve a path that must address a text leaf.
    pub fn leaf(&self, path: &Path) -> Result<&Text, WeftError> {
        self.get(path)?.as_text().ok_or_else(|| WeftError::NotText(path.clone()))
    }

    /// The parent entry of the node at `path`.
    pub fn parent(&self, path: &Path) -> Result<NodeRef<'_>, WeftError> {
        self.get(&path.parent()?)
    }

    /// The children list of the root or element at `path`.
    pub fn children_of(&self, path: &Path) -> Result<&Vec<Node>, WeftError> {
        self.get(path)?.children().ok_or_else(|| WeftError::NotElement(path.clone()))
    }

    /// The first node of the subtree at `path`, descending first children.
    pub fn first(&self, path: &Path) -> Result<(NodeRef<'_>, Path), WeftError> {
        let mut p = path.clone();
        let mut n = self.get(&p)?;
        while let Some(children) = n.children() {
            if children.is_empty() {
                break;
            }
            p = p.child(0);
            n = self.get(&p)?;
        }
        Ok((n, p))
    }

    /// The last node of the subtree at `path`, descending last children.
    pub fn last(&self, path: &Path) -> Result<(NodeRef<'_>, Path), WeftError> {
        let mut p = path.clone();
        let mut n = self.get(&p)?;
        while let Some(children) = n.children() {
            if children.is_empty() {
                break;
            }
            p = p.child(children.len() - 1);
            n = self.get(&p)?;
        }
        Ok((n, p))
    }

    /// The deepest common ancestor entry of two paths.
    pub fn common(&self, a: &Path, b: &Path) -> Result<(NodeRef<'_>, Path), WeftError> {
        let path = a.common(b);
        let node = self.get(&path)?;
        Ok((node, path))
    }

    // ── Mutable access, used by the apply engine ─────────────────────────

    pub fn node_mut(&mut self, path: &Path) -> Result<&mut Node, WeftError> {
        let (&first, rest) =
            path.as_slice().split_first().ok_or_else(|| WeftError::NotFound(path.clone()))?;
        let mut node =
            self.children.get_mut(first).ok_or_else(|| WeftError::NotFound(path.clone()))?;
        for &index in rest {
            let children = match node {
                Node::Element(e) => &mut e.children,
                Node::Text(_) => return Err(WeftError::NotFound(path.clone())),
            };
            node = children.get_mut(index).ok_or_else(|| WeftError::NotFound(path.clone()))?;
        }
        Ok(node)
    }

    pub fn children_mut(&mut self, path: &Path) -> Result<&mut Vec<Node>, WeftError> {
        if path.is_empty() {
            return Ok(&mut self.children);
        }
        match self.node_mut(path)? {
            Node::Element(e) => Ok(&mut e.children),
            Node::Text(_) => Err(WeftError::NotElement(path.clone())),
        }
    }

    pub fn text_mut(&mut self, path: &Path) -> Result<&mut Text, WeftError> {
        match self.node_mut(path)? {
            Node::Text(t) => Ok(t),
            Node::Element(_) => Err(WeftError::NotText(path.clone())),
        }
    }

    // ── Traversal ────────────────────────────────────────────────────────

    /// Walk the tree depth-first in pre-order (parents before children),
    /// lazily. Each call starts a fresh, independent walk.
    pub fn nodes<'a, 'p>(&'a self, options: TraverseOptions<'p>) -> NodeIter<'a, 'p> {
        NodeIter {
            root: self,
            from: options.from,
            to: options.to,
            reverse: options.reverse,
            pass: options.pass,
            current: None,
            started: false,
            done: false,
        }
    }

    /// Every node except the root itself.
    pub fn descendants(&self) -> impl Iterator<Item = NodeEntry<'_>> {
        self.nodes(TraverseOptions::default()).filter(|(_, p)| !p.is_empty())
    }

    /// Every text leaf, in document order.
    pub fn texts(&self) -> impl Iterator<Item = (&Text, Path)> {
        self.nodes(TraverseOptions::default())
            .filter_map(|(n, p)| n.as_text().map(|t| (t, p)))
    }

    /// Every element, in document order.
    pub fn elements(&self) -> impl Iterator<Item = (&Element, Path)> {
        self.nodes(TraverseOptions::default())
            .filter_map(|(n, p)| n.as_element().map(|e| (e, p)))
    }

    /// The proper ancestor entries of `path`, root first.
    pub fn ancestors<'a>(
        &'a self,
        path: &Path,
    ) -> impl Iterator<Item = Result<NodeEntry<'a>, WeftError>> + 'a {
        let prefixes: Vec<Path> = path.ancestors().collect();
        prefixes.into_iter().map(move |p| Ok((self.get(&p)?, p)))
    }

    /// The entries at every prefix of `path`, root first, `path` included.
    pub fn levels<'a>(
        &'a self,
        path: &Path,
    ) -> impl Iterator<Item = Result<NodeEntry<'a>, WeftError>> + 'a {
        let prefixes: Vec<Path> = path.levels().collect();
        prefixes.into_iter().map(move |p| Ok((self.get(&p)?, p)))
    }

    /// The immediate children of the node at `path`, paired with paths.
    pub fn child_entries<'a>(&'a self, path: &Path) -> Result<Vec<(&'a Node, Path)>, WeftError> {
        let children = self.children_of(path)?;
        Ok(children.iter().enumerate().map(|(i, n)| (n, path.child(i))).collect())
    }

    /// The concatenated text content of the whole document.
    pub fn string(&self) -> String {
        self.children.iter().map(Node::string).collect()
    }

    /// Clone the slice of the tree spanned by `range`: everything outside
    /// the range is deleted and the boundary leaves are trimmed to the
    /// range's offsets. The result seeds copy/cut and fragment insertion.
    pub fn fragment(&self, range: &Range) -> Result<Vec<Node>, WeftError> {
        let mut root = self.clone();
        let (start, end) = range.edges();
        let (start, end) = (start.clone(), end.clone());
        // Walk in reverse so earlier indices stay valid while later siblings
        // are spliced out. Subtrees wholly outside the range are pruned and
        // removed as a unit.
        let pass = |_: NodeRef<'_>, p: &Path| !range.includes(p.clone());
        let visited: Vec<Path> = root
            .nodes(TraverseOptions { reverse: true, pass: Some(&pass), ..Default::default() })
            .map(|(_, p)| p)
            .filter(|p| !p.is_empty())
            .collect();
        for path in visited {
            if !range.includes(path.clone()) {
                if let Some((&index, _)) = path.as_slice().split_last() {
                    let parent = root.children_mut(&path.parent()?)?;
                    parent.remove(index);
                }
                continue;
            }
            if path == end.path {
                let leaf = root.text_mut(&path)?;
                leaf.text = leaf.text.chars().take(end.offset).collect();
            }
            if path == start.path {
                let leaf = root.text_mut(&path)?;
                leaf.text = leaf.text.chars().skip(start.offset).collect();
            }
        }
        Ok(root.children)
    }
}

/// Lazy depth-first pre-order traversal over a [`Root`]. Restartable in the
/// sense that every [`Root::nodes`] call builds an independent iterator.
pub struct NodeIter<'a, 'p> {
    root: &'a Root,
    from: Path,
    to: Option<Path>,
    reverse: bool,
    pass: Option<&'p dyn Fn(NodeRef<'_>, &Path) -> bool>,
    current: Option<Path>,
    started: bool,
    done: bool,
}

impl<'a, 'p> NodeIter<'a, 'p> {
    /// The path visited after `path`, or `None` when the walk is over.
    fn successor(&self, path: &Path) -> Option<Path> {
        let node = self.root.get(path).ok()?;
        let descend = match node.children() {
            Some(children) if !children.is_empty() => {
                !self.pass.map_or(false, |pass| pass(node, path))
            }
            _ => false,
        };
        if descend {
            let children = node.children()?;
            let index = if path.is_ancestor(&self.from) {
                self.from[path.len()]
            } else if self.reverse {
                children.len() - 1
            } else {
                0
            };
            return Some(path.child(index));
        }
        // No descent: go to a sibling, climbing as needed.
        let mut p = path.clone();
        loop {
            if p.is_empty() {
                return None;
            }
            if !self.reverse {
                let next = p.next().ok()?;
                if self.root.has(&next) {
                    return Some(next);
                }
            } else if p.has_previous() {
                return p.previous().ok();
            }
            p = p.parent().ok()?;
        }
    }
}

impl<'a, 'p> Iterator for NodeIter<'a, 'p> {
    type Item = NodeEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let candidate = if !self.started {
            self.started = true;
            Path::root()
        } else {
            match self.current.take().and_then(|p| self.successor(&p)) {
                Some(p) => p,
                None => {
                    self.done = true;
                    return None;
                }
            }
        };
        if let Some(to) = &self.to {
            let past = if self.reverse { candidate.is_before(to) } else { candidate.is_after(to) };
            if past {
                self.done = true;
                return None;
            }
        }
        let node = match self.root.get(&candidate) {
            Ok(n) => n,
            Err(_) => {
                self.done = true;
                return None;
            }
        };
        self.current = Some(candidate.clone());
        Some((node, candidate))
    }
}
