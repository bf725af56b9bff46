//! The editor instance: one document tree, one selection, one operation log,
//! and the registries that keep live references and dirty paths current.
//!
//! All mutation funnels through [`Editor::apply`]. Consecutive applies inside
//! one outermost editing scope coalesce into a single `on_change`
//! notification, and normalization runs once per batch rather than once per
//! primitive operation.

mod apply;
mod normalize;
mod query;
mod refs;

pub use query::{Edge, Mode, NodeMatch, NodesOptions, PositionsOptions, TextUnit};
pub use refs::{PathRef, PointRef, RangeRef};

use indexmap::{IndexMap, IndexSet};

use crate::element::Element;
use crate::error::WeftError;
use crate::node::{Node, Root};
use crate::operation::Operation;
use crate::path::Path;
use crate::range::Range;
use crate::text::Props;

use refs::{PathRefEntry, PointRefEntry, RangeRefEntry};

/// Hook invoked for each dirty path during normalization, after the built-in
/// rules have run. May call back into `apply` and the transform verbs to fix
/// the node; issuing no operations accepts it as valid.
pub type NormalizeHook = Box<dyn FnMut(&mut Editor, &Path) -> Result<(), WeftError>>;

/// Invoked once per coalesced batch with the operations that were applied.
pub type OnChangeHook = Box<dyn FnMut(&Editor, &[Operation])>;

/// Classification predicate over elements.
pub type ElementPredicate = Box<dyn Fn(&Element) -> bool>;

/// The strategy object supplied at construction. Classification and
/// validation are composed in rather than overridden, so one editor type
/// serves every schema.
pub struct EditorConfig {
    /// Whether an element flows inline with text rather than as a block.
    pub is_inline: ElementPredicate,
    /// Whether an element's content is opaque to editing.
    pub is_void: ElementPredicate,
    /// Whether a void element still accepts formatting marks.
    pub markable_void: ElementPredicate,
    pub normalize_node: Option<NormalizeHook>,
    pub on_change: Option<OnChangeHook>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        EditorConfig {
            is_inline: Box::new(|_| false),
            is_void: Box::new(|_| false),
            markable_void: Box::new(|_| false),
            normalize_node: None,
            on_change: None,
        }
    }
}

pub struct Editor {
    pub(crate) root: Root,
    pub selection: Option<Range>,
    /// Operations applied in the current batch; drained when the batch
    /// flushes.
    pub operations: Vec<Operation>,
    /// Formatting to apply to the next inserted text; cleared whenever the
    /// selection moves.
    pub marks: Option<Props>,
    pub(crate) hooks: EditorConfig,
    /// Paths whose subtrees still need re-validation, deduplicated, popped
    /// from the back by the normalization loop.
    pub(crate) dirty_paths: IndexSet<Path>,
    pub(crate) path_refs: IndexMap<u64, PathRefEntry>,
    pub(crate) point_refs: IndexMap<u64, PointRefEntry>,
    pub(crate) range_refs: IndexMap<u64, RangeRefEntry>,
    pub(crate) next_ref_id: u64,
    /// False while a batch has suspended normalization.
    pub(crate) normalizing: bool,
    /// True once an apply in the current batch has scheduled a flush.
    pub(crate) flushing: bool,
    /// Nesting depth of editing scopes; the batch flushes at zero.
    pub(crate) scope_depth: usize,
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        Editor::with_children(config, Vec::new())
    }

    pub fn with_children(config: EditorConfig, children: Vec<Node>) -> Self {
        Editor {
            root: Root::new(children),
            selection: None,
            operations: Vec::new(),
            marks: None,
            hooks: config,
            dirty_paths: IndexSet::new(),
            path_refs: IndexMap::new(),
            point_refs: IndexMap::new(),
            range_refs: IndexMap::new(),
            next_ref_id: 0,
            normalizing: true,
            flushing: false,
            scope_depth: 0,
        }
    }

    pub fn root(&self) -> &Root {
        &self.root
    }

    pub fn children(&self) -> &[Node] {
        &self.root.children
    }

    // ── Classification ───────────────────────────────────────────────────

    pub fn is_inline(&self, element: &Element) -> bool {
        (self.hooks.is_inline)(element)
    }

    pub fn is_block(&self, element: &Element) -> bool {
        !self.is_inline(element)
    }

    pub fn is_void(&self, element: &Element) -> bool {
        (self.hooks.is_void)(element)
    }

    pub fn is_markable_void(&self, element: &Element) -> bool {
        (self.hooks.markable_void)(element)
    }

    /// True if the element has no content: no children, or a single empty
    /// non-void text leaf.
    pub fn is_empty(&self, element: &Element) -> bool {
        match element.children.as_slice() {
            [] => true,
            [Node::Text(t)] => t.text.is_empty() && !self.is_void(element),
            _ => false,
        }
    }

    pub fn has_blocks(&self, element: &Element) -> bool {
        element.children.iter().any(|child| match child {
            Node::Element(e) => self.is_block(e),
            Node::Text(_) => false,
        })
    }

    pub fn has_inlines(&self, element: &Element) -> bool {
        element.children.iter().any(|child| match child {
            Node::Element(e) => self.is_inline(e),
            Node::Text(_) => true,
        })
    }

    pub fn has_texts(&self, element: &Element) -> bool {
        element.children.iter().all(Node::is_text) && !element.children.is_empty()
    }

    // ── Batching ─────────────────────────────────────────────────────────

    pub(crate) fn enter_scope(&mut self) {
        self.scope_depth += 1;
    }

    /// Close one editing scope; the outermost close flushes the pending
    /// notification and drains the operation log.
    pub(crate) fn leave_scope(&mut self) {
        self.scope_depth -= 1;
        if self.scope_depth == 0 && self.flushing {
            self.flushing = false;
            let batch = std::mem::take(&mut self.operations);
            if let Some(mut hook) = self.hooks.on_change.take() {
                hook(self, &batch);
                self.hooks.on_change = Some(hook);
            }
        }
    }

    /// Run `f` with normalization suspended, then normalize once. Nesting is
    /// fine; only the outermost scope triggers the deferred pass.
    pub fn without_normalizing<R>(
        &mut self,
        f: impl FnOnce(&mut Editor) -> Result<R, WeftError>,
    ) -> Result<R, WeftError> {
        self.enter_scope();
        let prev = self.normalizing;
        self.normalizing = false;
        let result = f(self);
        self.normalizing = prev;
        let result = result.and_then(|value| {
            self.normalize(false)?;
            Ok(value)
        });
        self.leave_scope();
        result
    }
}
