//! Error type shared by the whole crate.
//!
//! Structural and programmer errors (bad paths, incompatible merges, edits
//! addressed at the root) are returned as `Err` from [`crate::Editor::apply`]
//! and from the transform verbs, and are never recovered internally.
//! Validation failures found during normalization are *data*, not errors —
//! they are repaired by corrective operations instead.

use thiserror::Error;

use crate::path::Path;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WeftError {
    /// A path addressed a node that does not exist.
    #[error("no node at path {0:?}")]
    NotFound(Path),

    /// A text leaf was required but the path addressed an element or the root.
    #[error("no text leaf at path {0:?}")]
    NotText(Path),

    /// An element (or the root) was required but the path addressed a text leaf.
    #[error("no element at path {0:?}")]
    NotElement(Path),

    /// A relative of a path was requested that does not exist, e.g. the
    /// parent of the root or the previous sibling of a first child.
    #[error("path {0:?} has no {1}")]
    NoRelative(Path, &'static str),

    /// The operation is not applicable at the root path.
    #[error("cannot {0} the root node")]
    Root(&'static str),

    /// An insertion index past the end of the parent's children.
    #[error("insert index {index} is out of bounds at path {path:?}")]
    OutOfBounds { path: Path, index: usize },

    /// `merge_node` across different node kinds (text vs element).
    #[error("cannot merge nodes of different kinds at path {0:?}")]
    IncompatibleMerge(Path),

    /// `move_node` whose destination lies inside the moved subtree.
    #[error("cannot move node at {from:?} into its own subtree at {to:?}")]
    MoveInsideSelf { from: Path, to: Path },

    /// `set_node` (or a selection update) touched a key that is structural
    /// and may not be edited as a property.
    #[error("cannot set the {0:?} property of a node")]
    ProtectedProperty(String),

    /// `lift_nodes` on a node with no grandparent to lift into.
    #[error("cannot lift node at {0:?}: its depth is less than 2")]
    ShallowLift(Path),

    /// A partial `set_selection` was applied while no selection exists.
    #[error("cannot update a selection that does not exist")]
    NoSelection,

    /// The normalization loop failed to settle within its iteration cap,
    /// which indicates a misbehaving `normalize_node` hook.
    #[error("normalization did not settle after {iterations} iterations")]
    NormalizationLoop { iterations: usize },
}
