//! Live references: path, point, and range handles that stay correct as the
//! tree changes underneath them.
//!
//! A reference is an opaque id into an editor-owned registry. Every apply
//! transforms each registered value by the operation; a value that transforms
//! to nothing unregisters itself, so a stale handle simply reads back `None`
//! instead of pointing somewhere wrong.

use crate::editor::Editor;
use crate::operation::Operation;
use crate::path::{Affinity, Path};
use crate::point::Point;
use crate::range::{Range, RangeAffinity};

#[derive(Debug)]
pub(crate) struct PathRefEntry {
    pub current: Path,
    pub affinity: Option<Affinity>,
}

#[derive(Debug)]
pub(crate) struct PointRefEntry {
    pub current: Point,
    pub affinity: Option<Affinity>,
}

#[derive(Debug)]
pub(crate) struct RangeRefEntry {
    pub current: Range,
    pub affinity: RangeAffinity,
}

/// Handle to a live path; read with [`PathRef::current`], dispose with
/// [`PathRef::unref`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PathRef(pub(crate) u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointRef(pub(crate) u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RangeRef(pub(crate) u64);

impl PathRef {
    /// The tracked path, or `None` once its target was deleted.
    pub fn current(self, editor: &Editor) -> Option<&Path> {
        editor.path_refs.get(&self.0).map(|entry| &entry.current)
    }

    /// Unregister the reference and return its final value.
    pub fn unref(self, editor: &mut Editor) -> Option<Path> {
        editor.path_refs.shift_remove(&self.0).map(|entry| entry.current)
    }
}

impl PointRef {
    pub fn current(self, editor: &Editor) -> Option<&Point> {
        editor.point_refs.get(&self.0).map(|entry| &entry.current)
    }

    pub fn unref(self, editor: &mut Editor) -> Option<Point> {
        editor.point_refs.shift_remove(&self.0).map(|entry| entry.current)
    }
}

impl RangeRef {
    pub fn current(self, editor: &Editor) -> Option<&Range> {
        editor.range_refs.get(&self.0).map(|entry| &entry.current)
    }

    pub fn unref(self, editor: &mut Editor) -> Option<Range> {
        editor.range_refs.shift_remove(&self.0).map(|entry| entry.current)
    }
}

impl Editor {
    /// Track a path across edits, leaning forward at ambiguous boundaries.
    pub fn path_ref(&mut self, path: Path) -> PathRef {
        self.path_ref_with(path, Some(Affinity::Forward))
    }

    pub fn path_ref_with(&mut self, path: Path, affinity: Option<Affinity>) -> PathRef {
        let id = self.next_ref_id;
        self.next_ref_id += 1;
        self.path_refs.insert(id, PathRefEntry { current: path, affinity });
        PathRef(id)
    }

    /// Track a point across edits, leaning forward at ambiguous boundaries.
    pub fn point_ref(&mut self, point: Point) -> PointRef {
        self.point_ref_with(point, Some(Affinity::Forward))
    }

    pub fn point_ref_with(&mut self, point: Point, affinity: Option<Affinity>) -> PointRef {
        let id = self.next_ref_id;
        self.next_ref_id += 1;
        self.point_refs.insert(id, PointRefEntry { current: point, affinity });
        PointRef(id)
    }

    /// Track a range across edits.
    pub fn range_ref(&mut self, range: Range) -> RangeRef {
        self.range_ref_with(range, RangeAffinity::Explicit(Some(Affinity::Forward)))
    }

    pub fn range_ref_with(&mut self, range: Range, affinity: RangeAffinity) -> RangeRef {
        let id = self.next_ref_id;
        self.next_ref_id += 1;
        self.range_refs.insert(id, RangeRefEntry { current: range, affinity });
        RangeRef(id)
    }

    /// Advance every registered reference past `op`, dropping the ones whose
    /// targets no longer exist.
    pub(crate) fn transform_refs(&mut self, op: &Operation) {
        let mut dead: Vec<u64> = Vec::new();
        for (id, entry) in self.path_refs.iter_mut() {
            match entry.current.transform_with(op, entry.affinity) {
                Some(path) => entry.current = path,
                None => dead.push(*id),
            }
        }
        for id in dead.drain(..) {
            self.path_refs.shift_remove(&id);
        }
        for (id, entry) in self.point_refs.iter_mut() {
            match entry.current.transform_with(op, entry.affinity) {
                Some(point) => entry.current = point,
                None => dead.push(*id),
            }
        }
        for id in dead.drain(..) {
            self.point_refs.shift_remove(&id);
        }
        for (id, entry) in self.range_refs.iter_mut() {
            match entry.current.transform_with(op, entry.affinity) {
                Some(range) => entry.current = range,
                None => dead.push(*id),
            }
        }
        for id in dead.drain(..) {
            self.range_refs.shift_remove(&id);
        }
    }
}
