//! Directed edges in device space built from flattened paths
use crate::{BBox, Path, Point, Scalar, Transform};

/// Non-horizontal line segment with `p0.y < p1.y`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    /// Top end of the edge
    pub p0: Point,
    /// Bottom end of the edge
    pub p1: Point,
    /// `1.0` if original segment was directed downwards and `-1.0` otherwise
    pub winding: Scalar,
    /// Creation order, used to break ties while sorting
    pub id: usize,
}

impl Edge {
    /// Create edge from a directed segment, horizontal and non-finite segments are discarded
    pub fn new(start: Point, end: Point, id: usize) -> Option<Self> {
        if !start.is_finite() || !end.is_finite() || start.y() == end.y() {
            return None;
        }
        let (p0, p1, winding) = if start.y() < end.y() {
            (start, end, 1.0)
        } else {
            (end, start, -1.0)
        };
        Some(Self {
            p0,
            p1,
            winding,
            id,
        })
    }

    /// X coordinate of the edge at `y` (clamped to the edge extent)
    ///
    /// Always evaluated from the end points, so it does not accumulate error
    /// across rows.
    #[inline]
    pub fn x_at(&self, y: Scalar) -> Scalar {
        let Self { p0, p1, .. } = *self;
        if y <= p0.y() {
            return p0.x();
        }
        if y >= p1.y() {
            return p1.x();
        }
        let t = (y - p0.y()) / (p1.y() - p0.y());
        let x = p0.x() + (p1.x() - p0.x()) * t;
        // rounding must not move x outside of the edge extent
        x.max(p0.x().min(p1.x())).min(p0.x().max(p1.x()))
    }
}

/// List of edges representing a closed area with a winding number
#[derive(Debug, Clone, Default)]
pub struct EdgeList {
    edges: Vec<Edge>,
    bbox: Option<BBox>,
}

impl EdgeList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.edges.clear();
        self.bbox = None;
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Bounding box of all edges
    pub fn bbox(&self) -> Option<BBox> {
        self.bbox
    }

    /// Add directed segment from `start` to `end`
    pub fn push_line(&mut self, start: Point, end: Point) {
        if let Some(edge) = Edge::new(start, end, self.edges.len()) {
            let bbox = BBox::new(edge.p0, edge.p1);
            self.bbox = Some(bbox.union_opt(self.bbox));
            self.edges.push(edge);
        }
    }

    /// Add closed polygon, last point is connected to the first one
    pub fn push_polygon(&mut self, points: impl IntoIterator<Item = Point>) {
        let mut points = points.into_iter().filter(|p| p.is_finite());
        let Some(first) = points.next() else {
            return;
        };
        let mut prev = first;
        for point in points {
            self.push_line(prev, point);
            prev = point;
        }
        self.push_line(prev, first);
    }

    /// Add all sub-paths of the path transformed by `tr`
    ///
    /// Every sub-path is treated as closed, since fill area of an open sub-path
    /// is bounded by an implicit closing segment.
    pub fn extend_path(&mut self, path: &Path, tr: Transform, flatness: Scalar) {
        for subpath in path.subpaths() {
            let start = tr.apply(subpath.start());
            self.push_polygon(std::iter::once(start).chain(subpath.flatten(tr, flatness)));
        }
    }
}
