//! A tree-structured rich-document model.
//!
//! Documents are trees of [`Element`] and [`Text`] nodes addressed by
//! [`Path`]s. Every edit is one of nine invertible primitive
//! [`Operation`]s, applied through an [`Editor`] that keeps the selection,
//! live references, and structural invariants consistent: each apply marks
//! the touched region dirty, and a bounded normalization loop repairs the
//! tree before control returns to the caller.
//!
//! The transform verbs ([`Editor::insert_nodes`], [`Editor::delete_at`],
//! [`Editor::wrap_nodes`], ...) compose primitives into the edits an
//! application actually wants, batching the resulting operations into a
//! single change notification.

pub mod editor;
pub mod element;
pub mod error;
pub mod location;
pub mod node;
pub mod operation;
pub mod path;
pub mod point;
pub mod range;
pub mod text;
pub mod transforms;

pub use editor::{
    Edge, Editor, EditorConfig, Mode, NodeMatch, NodesOptions, PathRef, PointRef,
    PositionsOptions, RangeRef, TextUnit,
};
pub use element::Element;
pub use error::WeftError;
pub use location::{Location, Span};
pub use node::{Node, NodeEntry, NodeRef, Root, TraverseOptions};
pub use operation::{Operation, SelectionProps};
pub use path::{Affinity, Path};
pub use point::Point;
pub use range::{Range, RangeAffinity};
pub use text::{Props, Text};
pub use transforms::{
    CollapseEdge, DeleteOptions, InsertNodesOptions, LiftNodesOptions, MergeNodesOptions,
    MoveNodesOptions, MoveSelectionOptions, RemoveNodesOptions, SetNodesOptions,
    SplitNodesOptions, TextInsertOptions, UnwrapNodesOptions, WrapNodesOptions,
};

/// Returns the crate version at compile time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
