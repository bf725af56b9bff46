//! Ranges are directional selections: an anchor point where the selection
//! began and a focus point where it ends, in either document order.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::location::Location;
use crate::operation::Operation;
use crate::path::{Affinity, Path};
use crate::point::Point;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub anchor: Point,
    pub focus: Point,
    /// Extra attributes (decoration metadata and the like); carried through
    /// every transform unchanged.
    #[serde(flatten)]
    pub props: Map<String, Value>,
}

/// How a range's two points travel when an edit lands exactly on one of
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RangeAffinity {
    /// Both points lean into the range, so a collapsed range cannot invert.
    #[default]
    Inward,
    /// Both points lean away from the range, so an expanded range does not
    /// shrink at its own edit boundary.
    Outward,
    /// The same explicit affinity for both points.
    Explicit(Option<Affinity>),
}

impl Range {
    pub fn new(anchor: Point, focus: Point) -> Self {
        Range { anchor, focus, props: Map::new() }
    }

    /// A collapsed range with both points at `point`.
    pub fn collapsed(point: Point) -> Self {
        Range::new(point.clone(), point)
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor.path == self.focus.path && self.anchor.offset == self.focus.offset
    }

    pub fn is_expanded(&self) -> bool {
        !self.is_collapsed()
    }

    /// True if the anchor comes before (or at) the focus.
    pub fn is_forward(&self) -> bool {
        !self.is_backward()
    }

    pub fn is_backward(&self) -> bool {
        self.anchor.is_after(&self.focus)
    }

    /// The start and end points in document order.
    pub fn edges(&self) -> (&Point, &Point) {
        if self.is_backward() {
            (&self.focus, &self.anchor)
        } else {
            (&self.anchor, &self.focus)
        }
    }

    pub fn start(&self) -> &Point {
        self.edges().0
    }

    pub fn end(&self) -> &Point {
        self.edges().1
    }

    /// True if the range touches the node (or point) at the target.
    pub fn includes(&self, target: impl Into<Location>) -> bool {
        let (start, end) = self.edges();
        match target.into() {
            Location::Path(path) => {
                path.compare(&start.path) != std::cmp::Ordering::Less
                    && path.compare(&end.path) != std::cmp::Ordering::Greater
            }
            Location::Point(point) => !point.is_before(start) && !point.is_after(end),
            Location::Range(range) => {
                self.includes(range.anchor.clone()) || self.includes(range.focus.clone())
            }
        }
    }

    /// The overlap of two ranges, if any.
    pub fn intersection(&self, other: &Range) -> Option<Range> {
        let (s1, e1) = self.edges();
        let (s2, e2) = other.edges();
        let start = if s1.is_before(s2) { s2 } else { s1 };
        let end = if e1.is_before(e2) { e1 } else { e2 };
        if end.is_before(start) {
            None
        } else {
            let mut range = Range::new(start.clone(), end.clone());
            range.props = other.props.clone();
            Some(range)
        }
    }

    /// Transform the range by an operation with the default inward policy.
    pub fn transform(&self, op: &Operation) -> Option<Range> {
        self.transform_with(op, RangeAffinity::Inward)
    }

    /// Transform the range by an operation. Either point vanishing nulls
    /// the whole range; extra props survive unchanged.
    pub fn transform_with(&self, op: &Operation, affinity: RangeAffinity) -> Option<Range> {
        let (anchor_affinity, focus_affinity) = match affinity {
            RangeAffinity::Inward => {
                let collapsed = self.is_collapsed();
                if self.is_forward() {
                    (
                        Some(Affinity::Forward),
                        if collapsed { Some(Affinity::Forward) } else { Some(Affinity::Backward) },
                    )
                } else {
                    (
                        Some(Affinity::Backward),
                        if collapsed { Some(Affinity::Backward) } else { Some(Affinity::Forward) },
                    )
                }
            }
            RangeAffinity::Outward => {
                if self.is_forward() {
                    (Some(Affinity::Backward), Some(Affinity::Forward))
                } else {
                    (Some(Affinity::Forward), Some(Affinity::Backward))
                }
            }
            RangeAffinity::Explicit(a) => (a, a),
        };
        let anchor = self.anchor.transform_with(op, anchor_affinity)?;
        let focus = self.focus.transform_with(op, focus_affinity)?;
        Some(Range { anchor, focus, props: self.props.clone() })
    }
}

impl Range {
    /// Both points of the range, anchor first.
    pub fn points(&self) -> [&Point; 2] {
        [&self.anchor, &self.focus]
    }
}
