//! Locations: the union of the three ways to address a place in a document.
//!
//! Every transform verb takes its `at` target as a [`Location`] so callers
//! can pass a path, a point, or a range interchangeably.

use serde::{Deserialize, Serialize};

use crate::path::Path;
use crate::point::Point;
use crate::range::Range;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Location {
    Range(Range),
    Point(Point),
    Path(Path),
}

impl From<Path> for Location {
    fn from(path: Path) -> Self {
        Location::Path(path)
    }
}

impl From<Vec<usize>> for Location {
    fn from(indices: Vec<usize>) -> Self {
        Location::Path(Path(indices))
    }
}

impl From<Point> for Location {
    fn from(point: Point) -> Self {
        Location::Point(point)
    }
}

impl From<Range> for Location {
    fn from(range: Range) -> Self {
        Location::Range(range)
    }
}

impl Location {
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Location::Path(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_range(&self) -> Option<&Range> {
        match self {
            Location::Range(r) => Some(r),
            _ => None,
        }
    }
}

/// A pair of paths bounding a walk, start and end inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span(pub Path, pub Path);
