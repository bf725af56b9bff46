//! Composite editing verbs built from repeated primitive applies.
//!
//! Every verb resolves its target [`Location`] to concrete paths, wraps its
//! applies in a normalization-suspension scope, and leans on live references
//! to keep later steps addressed correctly while earlier steps shift the
//! tree.

mod node;
mod selection;
mod text;

pub use selection::CollapseEdge;

use crate::editor::{Mode, NodeMatch, TextUnit};
use crate::location::Location;
use crate::path::Path;

/// Options shared by [`crate::Editor::insert_nodes`].
pub struct InsertNodesOptions<'m> {
    /// Defaults to the selection, or the end of the document without one.
    pub at: Option<Location>,
    pub matcher: Option<NodeMatch<'m>>,
    pub mode: Mode,
    /// Keep a hanging range as-is instead of pulling its edge back.
    pub hanging: bool,
    /// Move the selection to the end of the inserted content. Defaults to
    /// true when inserting at the selection, false otherwise.
    pub select: Option<bool>,
    pub voids: bool,
}

impl Default for InsertNodesOptions<'_> {
    fn default() -> Self {
        InsertNodesOptions {
            at: None,
            matcher: None,
            mode: Mode::Lowest,
            hanging: false,
            select: None,
            voids: false,
        }
    }
}

pub struct RemoveNodesOptions<'m> {
    pub at: Option<Location>,
    pub matcher: Option<NodeMatch<'m>>,
    pub mode: Mode,
    pub hanging: bool,
    pub voids: bool,
}

impl Default for RemoveNodesOptions<'_> {
    fn default() -> Self {
        RemoveNodesOptions {
            at: None,
            matcher: None,
            mode: Mode::Lowest,
            hanging: false,
            voids: false,
        }
    }
}

pub struct SetNodesOptions<'m> {
    pub at: Option<Location>,
    pub matcher: Option<NodeMatch<'m>>,
    pub mode: Mode,
    pub hanging: bool,
    /// Split boundary nodes so the change applies exactly to the range.
    pub split: bool,
    pub voids: bool,
}

impl Default for SetNodesOptions<'_> {
    fn default() -> Self {
        SetNodesOptions {
            at: None,
            matcher: None,
            mode: Mode::Lowest,
            hanging: false,
            split: false,
            voids: false,
        }
    }
}

pub struct MergeNodesOptions<'m> {
    pub at: Option<Location>,
    pub matcher: Option<NodeMatch<'m>>,
    pub mode: Mode,
    pub hanging: bool,
    pub voids: bool,
}

impl Default for MergeNodesOptions<'_> {
    fn default() -> Self {
        MergeNodesOptions {
            at: None,
            matcher: None,
            mode: Mode::Lowest,
            hanging: false,
            voids: false,
        }
    }
}

pub struct SplitNodesOptions<'m> {
    pub at: Option<Location>,
    pub matcher: Option<NodeMatch<'m>>,
    pub mode: Mode,
    /// Split even when the point sits exactly at a node boundary, where the
    /// split would otherwise be a no-op.
    pub always: bool,
    /// How many levels above the point's leaf the split starts.
    pub height: usize,
    pub voids: bool,
}

impl Default for SplitNodesOptions<'_> {
    fn default() -> Self {
        SplitNodesOptions {
            at: None,
            matcher: None,
            mode: Mode::Lowest,
            always: false,
            height: 0,
            voids: false,
        }
    }
}

pub struct MoveNodesOptions<'m> {
    pub at: Option<Location>,
    pub matcher: Option<NodeMatch<'m>>,
    pub mode: Mode,
    pub to: Path,
    pub voids: bool,
}

impl Default for MoveNodesOptions<'_> {
    fn default() -> Self {
        MoveNodesOptions {
            at: None,
            matcher: None,
            mode: Mode::Lowest,
            to: Path::root(),
            voids: false,
        }
    }
}

pub struct WrapNodesOptions<'m> {
    pub at: Option<Location>,
    pub matcher: Option<NodeMatch<'m>>,
    pub mode: Mode,
    pub split: bool,
    pub voids: bool,
}

impl Default for WrapNodesOptions<'_> {
    fn default() -> Self {
        WrapNodesOptions {
            at: None,
            matcher: None,
            mode: Mode::Lowest,
            split: false,
            voids: false,
        }
    }
}

pub struct UnwrapNodesOptions<'m> {
    pub at: Option<Location>,
    pub matcher: Option<NodeMatch<'m>>,
    pub mode: Mode,
    pub split: bool,
    pub voids: bool,
}

impl Default for UnwrapNodesOptions<'_> {
    fn default() -> Self {
        UnwrapNodesOptions {
            at: None,
            matcher: None,
            mode: Mode::Lowest,
            split: false,
            voids: false,
        }
    }
}

pub struct LiftNodesOptions<'m> {
    pub at: Option<Location>,
    pub matcher: Option<NodeMatch<'m>>,
    pub mode: Mode,
    pub voids: bool,
}

impl Default for LiftNodesOptions<'_> {
    fn default() -> Self {
        LiftNodesOptions { at: None, matcher: None, mode: Mode::Lowest, voids: false }
    }
}

/// Options for [`crate::Editor::delete_at`].
pub struct DeleteOptions {
    pub at: Option<Location>,
    pub distance: usize,
    pub unit: TextUnit,
    pub reverse: bool,
    pub hanging: bool,
    pub voids: bool,
}

impl Default for DeleteOptions {
    fn default() -> Self {
        DeleteOptions {
            at: None,
            distance: 1,
            unit: TextUnit::Character,
            reverse: false,
            hanging: false,
            voids: false,
        }
    }
}

/// Options for [`crate::Editor::insert_text_at`] and
/// [`crate::Editor::insert_fragment_at`].
pub struct TextInsertOptions {
    pub at: Option<Location>,
    pub hanging: bool,
    pub voids: bool,
}

impl Default for TextInsertOptions {
    fn default() -> Self {
        TextInsertOptions { at: None, hanging: false, voids: false }
    }
}

/// Options for [`crate::Editor::move_selection`].
pub struct MoveSelectionOptions {
    pub distance: usize,
    pub unit: TextUnit,
    pub reverse: bool,
    /// Move only this edge of the selection.
    pub edge: Option<CollapseEdge>,
}

impl Default for MoveSelectionOptions {
    fn default() -> Self {
        MoveSelectionOptions {
            distance: 1,
            unit: TextUnit::Character,
            reverse: false,
            edge: None,
        }
    }
}
