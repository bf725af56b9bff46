//! Selection verbs. All of them funnel through [`Editor::set_selection`],
//! which diffs against the current selection and emits a single partial
//! `set_selection` operation carrying only the fields that changed.

use serde_json::Value;

use crate::editor::Editor;
use crate::error::WeftError;
use crate::location::Location;
use crate::node::NodeRef;
use crate::operation::{Operation, SelectionProps};
use crate::path::Path;
use crate::point::Point;
use crate::text::Props;
use crate::transforms::{MoveSelectionOptions, SetNodesOptions};

/// An edge of the selection, named either by role (anchor/focus) or by
/// document order (start/end).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollapseEdge {
    Anchor,
    Focus,
    Start,
    End,
}

impl Editor {
    /// Set the selection to a new location.
    pub fn select(&mut self, target: impl Into<Location>) -> Result<(), WeftError> {
        let range = self.range(target, None)?;
        if self.selection.is_some() {
            return self.set_selection(SelectionProps {
                anchor: Some(range.anchor),
                focus: Some(range.focus),
                props: range.props,
            });
        }
        self.apply(Operation::SetSelection {
            properties: None,
            new_properties: Some(SelectionProps {
                anchor: Some(range.anchor),
                focus: Some(range.focus),
                props: range.props,
            }),
        })
    }

    /// Unset the selection.
    pub fn deselect(&mut self) -> Result<(), WeftError> {
        let Some(selection) = self.selection.clone() else {
            return Ok(());
        };
        self.apply(Operation::SetSelection {
            properties: Some(SelectionProps {
                anchor: Some(selection.anchor),
                focus: Some(selection.focus),
                props: selection.props,
            }),
            new_properties: None,
        })
    }

    /// Collapse the selection to one of its edges.
    pub fn collapse(&mut self, edge: CollapseEdge) -> Result<(), WeftError> {
        let Some(selection) = self.selection.clone() else {
            return Ok(());
        };
        let point = match edge {
            CollapseEdge::Anchor => selection.anchor,
            CollapseEdge::Focus => selection.focus,
            CollapseEdge::Start => selection.start().clone(),
            CollapseEdge::End => selection.end().clone(),
        };
        self.select(point)
    }

    /// Move the selection's points by a distance of units. With an `edge`,
    /// only that edge moves and the selection expands or shrinks.
    pub fn move_selection(&mut self, options: MoveSelectionOptions) -> Result<(), WeftError> {
        let Some(selection) = self.selection.clone() else {
            return Ok(());
        };
        let edge = options.edge.map(|edge| self.resolve_edge(edge, selection.is_backward()));
        let mut props = SelectionProps::default();
        if matches!(edge, None | Some(CollapseEdge::Anchor)) {
            let point = if options.reverse {
                self.before(selection.anchor.clone(), options.distance, options.unit)?
            } else {
                self.after(selection.anchor.clone(), options.distance, options.unit)?
            };
            props.anchor = point;
        }
        if matches!(edge, None | Some(CollapseEdge::Focus)) {
            let point = if options.reverse {
                self.before(selection.focus.clone(), options.distance, options.unit)?
            } else {
                self.after(selection.focus.clone(), options.distance, options.unit)?
            };
            props.focus = point;
        }
        self.set_selection(props)
    }

    /// Replace a single edge of the selection.
    pub fn set_point(&mut self, point: Point, edge: CollapseEdge) -> Result<(), WeftError> {
        let Some(selection) = self.selection.clone() else {
            return Ok(());
        };
        let edge = self.resolve_edge(edge, selection.is_backward());
        let props = match edge {
            CollapseEdge::Anchor => SelectionProps { anchor: Some(point), ..Default::default() },
            _ => SelectionProps { focus: Some(point), ..Default::default() },
        };
        self.set_selection(props)
    }

    /// Update the existing selection with a partial set of fields, emitting
    /// an operation only for what actually changed. A no-op without a
    /// selection; use [`Editor::select`] to create one.
    pub fn set_selection(&mut self, props: SelectionProps) -> Result<(), WeftError> {
        let Some(selection) = self.selection.clone() else {
            return Ok(());
        };
        let mut old = SelectionProps::default();
        let mut new = SelectionProps::default();
        let mut changed = false;
        if let Some(anchor) = props.anchor {
            if anchor != selection.anchor {
                old.anchor = Some(selection.anchor.clone());
                new.anchor = Some(anchor);
                changed = true;
            }
        }
        if let Some(focus) = props.focus {
            if focus != selection.focus {
                old.focus = Some(selection.focus.clone());
                new.focus = Some(focus);
                changed = true;
            }
        }
        for (key, value) in props.props {
            if selection.props.get(key.as_str()) != Some(&value) {
                // Record a prior `null` for keys that did not exist, so the
                // inverse removes them again.
                old.props.insert(
                    key.clone(),
                    selection.props.get(key.as_str()).cloned().unwrap_or(Value::Null),
                );
                new.props.insert(key, value);
                changed = true;
            }
        }
        if changed {
            self.apply(Operation::SetSelection {
                properties: Some(old),
                new_properties: Some(new),
            })?;
        }
        Ok(())
    }

    /// Add a formatting mark. An expanded selection marks its text right
    /// away; a collapsed one stores the mark for the next insertion.
    pub fn add_mark(&mut self, key: &str, value: Value) -> Result<(), WeftError> {
        let Some(selection) = self.selection.clone() else {
            return Ok(());
        };
        if selection.is_expanded() {
            let mut props = Props::new();
            props.insert(key.to_string(), value);
            let matcher = |node: NodeRef<'_>, _: &Path| node.is_text();
            return self.set_nodes(
                props,
                SetNodesOptions { matcher: Some(&matcher), split: true, ..Default::default() },
            );
        }
        let mut marks = match self.marks.clone() {
            Some(marks) => marks,
            None => self.current_marks()?.unwrap_or_default(),
        };
        marks.insert(key.to_string(), value);
        self.enter_scope();
        self.marks = Some(marks);
        self.flushing = true;
        self.leave_scope();
        Ok(())
    }

    /// Remove a formatting mark, or cancel a pending one.
    pub fn remove_mark(&mut self, key: &str) -> Result<(), WeftError> {
        let Some(selection) = self.selection.clone() else {
            return Ok(());
        };
        if selection.is_expanded() {
            let matcher = |node: NodeRef<'_>, _: &Path| node.is_text();
            return self.unset_nodes(
                &[key],
                SetNodesOptions { matcher: Some(&matcher), split: true, ..Default::default() },
            );
        }
        let mut marks = match self.marks.clone() {
            Some(marks) => marks,
            None => self.current_marks()?.unwrap_or_default(),
        };
        marks.remove(key);
        self.enter_scope();
        self.marks = Some(marks);
        self.flushing = true;
        self.leave_scope();
        Ok(())
    }

    fn resolve_edge(&self, edge: CollapseEdge, backward: bool) -> CollapseEdge {
        match edge {
            CollapseEdge::Start => {
                if backward {
                    CollapseEdge::Focus
                } else {
                    CollapseEdge::Anchor
                }
            }
            CollapseEdge::End => {
                if backward {
                    CollapseEdge::Anchor
                } else {
                    CollapseEdge::Focus
                }
            }
            other => other,
        }
    }
}
