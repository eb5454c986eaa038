//! Line and cubic bezier segments and their flattening

use crate::{BBox, Point, Scalar, Transform, EPSILON};
use std::fmt;

/// Maximum number of bisections applied to a single cubic while flattening
pub const FLATTEN_MAX_DEPTH: usize = 10;

/// Set of operations common to all segment types.
pub trait Curve: Sized + Into<Segment> {
    /// Convert curve into device space points with desired flatness.
    ///
    /// Start point is not included, since it is always the end of the previous segment.
    fn flatten(&self, tr: Transform, flatness: Scalar) -> CurveFlattenIter {
        CurveFlattenIter::new(self.transform(tr), flatness)
    }

    /// Correspond to maximum diviation of the curve from the straight line
    /// `f = max |curve(t) - line(curve_start, curve_end)(t)|`. This function
    /// actually returns `16.0 * f^2` to avoid unneeded division and square root.
    fn flatness(&self) -> Scalar;

    /// Apply affine transformation to the curve
    fn transform(&self, tr: Transform) -> Self;

    /// Point at which curve starts
    fn start(&self) -> Point;

    /// Point at which curve ends
    fn end(&self) -> Point;

    /// Evaluate curve at parameter value `t` in (0.0..=1.0)
    fn at(&self, t: Scalar) -> Point;

    /// Split the curve at parameter value `0.5`
    fn split(&self) -> (Self, Self);

    /// Extend provided `init` bounding box with the bounding box of the curve
    fn bbox(&self, init: Option<BBox>) -> BBox;

    /// Identical curve but directed from end to start, instead of start to end.
    fn reverse(&self) -> Self;

    /// All points are finite
    fn is_finite(&self) -> bool;
}

/// Iterator over the end points of the line segments approximating a curve
pub struct CurveFlattenIter {
    flatness: Scalar,
    stack: Vec<(Segment, usize)>,
}

impl CurveFlattenIter {
    pub fn new(segment: impl Into<Segment>, flatness: Scalar) -> Self {
        Self {
            flatness: 16.0 * flatness * flatness,
            stack: vec![(segment.into(), 0)],
        }
    }
}

impl Iterator for CurveFlattenIter {
    type Item = Point;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (segment, depth) = self.stack.pop()?;
            // NaN flatness ends subdivision immediately
            if depth >= FLATTEN_MAX_DEPTH || !(segment.flatness() > self.flatness) {
                return Some(segment.end());
            }
            let (s0, s1) = segment.split();
            self.stack.push((s1, depth + 1));
            self.stack.push((s0, depth + 1));
        }
    }
}

// -----------------------------------------------------------------------------
// Line
// -----------------------------------------------------------------------------

/// Line segment curve
#[derive(Clone, Copy, PartialEq)]
pub struct Line(pub [Point; 2]);

impl fmt::Debug for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Line([p0, p1]) = self;
        write!(f, "Line {:?} {:?}", p0, p1)
    }
}

impl Line {
    pub fn new(p0: impl Into<Point>, p1: impl Into<Point>) -> Self {
        Self([p0.into(), p1.into()])
    }

    /// Length of the line
    pub fn length(&self) -> Scalar {
        let Self([p0, p1]) = self;
        p0.dist(*p1)
    }

    /// Start and end points of the line
    pub fn points(&self) -> [Point; 2] {
        self.0
    }

    /// Direction vector of the line
    pub fn direction(&self) -> Point {
        self.end() - self.start()
    }
}

impl Curve for Line {
    fn flatness(&self) -> Scalar {
        0.0
    }

    fn transform(&self, tr: Transform) -> Self {
        let Line([p0, p1]) = self;
        Self([tr.apply(*p0), tr.apply(*p1)])
    }

    fn start(&self) -> Point {
        self.0[0]
    }

    fn end(&self) -> Point {
        self.0[1]
    }

    fn at(&self, t: Scalar) -> Point {
        let Self([p0, p1]) = self;
        (1.0 - t) * *p0 + t * *p1
    }

    fn split(&self) -> (Self, Self) {
        let Self([p0, p1]) = *self;
        let mid = self.at(0.5);
        (Self([p0, mid]), Self([mid, p1]))
    }

    fn bbox(&self, init: Option<BBox>) -> BBox {
        let Self([p0, p1]) = *self;
        BBox::new(p0, p1).union_opt(init)
    }

    fn reverse(&self) -> Self {
        let Self([p0, p1]) = *self;
        Self([p1, p0])
    }

    fn is_finite(&self) -> bool {
        self.0.iter().all(|p| p.is_finite())
    }
}

// -----------------------------------------------------------------------------
// Cubic
// -----------------------------------------------------------------------------

/// Cubic bezier curve
#[derive(Clone, Copy, PartialEq)]
pub struct Cubic(pub [Point; 4]);

impl fmt::Debug for Cubic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Cubic([p0, p1, p2, p3]) = self;
        write!(f, "Cubic {:?} {:?} {:?} {:?}", p0, p1, p2, p3)
    }
}

impl Cubic {
    pub fn new(
        p0: impl Into<Point>,
        p1: impl Into<Point>,
        p2: impl Into<Point>,
        p3: impl Into<Point>,
    ) -> Self {
        Self([p0.into(), p1.into(), p2.into(), p3.into()])
    }

    /// Cubic which exactly represents quadratic bezier curve `p0, p1, p2`
    pub fn from_quad(p0: impl Into<Point>, p1: impl Into<Point>, p2: impl Into<Point>) -> Self {
        let (p0, p1, p2) = (p0.into(), p1.into(), p2.into());
        Self([
            p0,
            (1.0 / 3.0) * p0 + (2.0 / 3.0) * p1,
            (2.0 / 3.0) * p1 + (1.0 / 3.0) * p2,
            p2,
        ])
    }

    pub fn points(&self) -> [Point; 4] {
        self.0
    }

    /// Find smooth point used by SVG parser
    pub fn smooth(&self) -> Point {
        let Cubic([_p0, _p1, p2, p3]) = self;
        2.0 * *p3 - *p2
    }

    /// Parameter values at which `curve'(t)_x = 0 || curve'(t)_y = 0`
    fn extremities(&self) -> impl Iterator<Item = Scalar> {
        let Self([p0, p1, p2, p3]) = *self;
        let Point([a0, a1]) = -1.0 * p0 + 3.0 * p1 - 3.0 * p2 + p3;
        let Point([b0, b1]) = 2.0 * p0 - 4.0 * p1 + 2.0 * p2;
        let Point([c0, c1]) = p1 - p0;
        quadratic_solve(a0, b0, c0)
            .into_iter()
            .chain(quadratic_solve(a1, b1, c1))
            .flatten()
            .filter(|t| (0.0..=1.0).contains(t))
    }
}

impl Curve for Cubic {
    /// Flattness criteria for the cubic curve
    /// This function actually returns `16 * flatness^2`
    ///
    /// It is equal to `f = max d(t) where d(t) = |c(t) - l(t)|, l(t) = (1 - t) * c0 + t * c3`
    /// for c(t) bezier3 curve with c{0..3} control points, in other words maximum distance
    /// from parametric line to bezier3 curve for the same parameter t. It is shown in the article
    /// that:
    ///     f^2 <= 1/16 (max{u_x^2, v_x^2} + max{u_y^2, v_y^2})
    /// where:
    ///     u = 3 * b1 - 2 * b0 - b3
    ///     v = 3 * b2 - b0 - 2 * b3
    ///
    /// [Linear Approximation of Bezier Curve](https://hcklbrrfnn.files.wordpress.com/2012/08/bez.pdf)
    fn flatness(&self) -> Scalar {
        let Self([p0, p1, p2, p3]) = *self;
        let u = 3.0 * p1 - 2.0 * p0 - p3;
        let v = 3.0 * p2 - p0 - 2.0 * p3;
        (u.x() * u.x()).max(v.x() * v.x()) + (u.y() * u.y()).max(v.y() * v.y())
    }

    fn transform(&self, tr: Transform) -> Self {
        let Cubic([p0, p1, p2, p3]) = self;
        Self([tr.apply(*p0), tr.apply(*p1), tr.apply(*p2), tr.apply(*p3)])
    }

    fn start(&self) -> Point {
        self.0[0]
    }

    fn end(&self) -> Point {
        self.0[3]
    }

    fn at(&self, t: Scalar) -> Point {
        let Self([p0, p1, p2, p3]) = *self;
        let (t1, t_1) = (t, 1.0 - t);
        let (t2, t_2) = (t1 * t1, t_1 * t_1);
        let (t3, t_3) = (t2 * t1, t_2 * t_1);
        t_3 * p0 + 3.0 * t1 * t_2 * p1 + 3.0 * t2 * t_1 * p2 + t3 * p3
    }

    fn split(&self) -> (Self, Self) {
        let Self([p0, p1, p2, p3]) = *self;
        let mid = 0.125 * p0 + 0.375 * p1 + 0.375 * p2 + 0.125 * p3;
        let c0 = Self([
            p0,
            0.5 * p0 + 0.5 * p1,
            0.25 * p0 + 0.5 * p1 + 0.25 * p2,
            mid,
        ]);
        let c1 = Self([
            mid,
            0.25 * p1 + 0.5 * p2 + 0.25 * p3,
            0.5 * p2 + 0.5 * p3,
            p3,
        ]);
        (c0, c1)
    }

    fn bbox(&self, init: Option<BBox>) -> BBox {
        let Self([p0, p1, p2, p3]) = *self;
        let bbox = BBox::new(p0, p3).union_opt(init);
        if bbox.contains(p1) && bbox.contains(p2) {
            return bbox;
        }
        self.extremities()
            .fold(bbox, |bbox, t| bbox.extend(self.at(t)))
    }

    fn reverse(&self) -> Self {
        let Self([p0, p1, p2, p3]) = *self;
        Self([p3, p2, p1, p0])
    }

    fn is_finite(&self) -> bool {
        self.0.iter().all(|p| p.is_finite())
    }
}

/// Solve quadratic equation `a * t ^ 2 + b * t + c = 0` for `t`
fn quadratic_solve(a: Scalar, b: Scalar, c: Scalar) -> [Option<Scalar>; 2] {
    if a.abs() < EPSILON {
        if b.abs() > EPSILON {
            return [Some(-c / b), None];
        }
        return [None, None];
    }
    let disc = b * b - 4.0 * a * c;
    if disc.abs() < EPSILON {
        [Some(-b / (2.0 * a)), None]
    } else if disc > 0.0 {
        let sq = disc.sqrt();
        // More stable solution than generic formula:
        // https://people.csail.mit.edu/bkph/articles/Quadratics.pdf
        if b >= 0.0 {
            let mul = -b - sq;
            [Some(mul / (2.0 * a)), Some(2.0 * c / mul)]
        } else {
            let mul = -b + sq;
            [Some(2.0 * c / mul), Some(mul / (2.0 * a))]
        }
    } else {
        [None, None]
    }
}

// -----------------------------------------------------------------------------
// Segment
// -----------------------------------------------------------------------------

/// Single segment of a sub-path
#[derive(Clone, Copy, PartialEq)]
pub enum Segment {
    Line(Line),
    Cubic(Cubic),
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Line(line) => line.fmt(f),
            Segment::Cubic(cubic) => cubic.fmt(f),
        }
    }
}

impl Segment {
    /// Segment as a cubic, lines are converted to the straight cubics
    pub fn to_cubic(&self) -> Cubic {
        match self {
            Segment::Line(Line([p0, p1])) => {
                Cubic([*p0, (2.0 * *p0 + *p1) / 3.0, (*p0 + 2.0 * *p1) / 3.0, *p1])
            }
            Segment::Cubic(cubic) => *cubic,
        }
    }
}

impl Curve for Segment {
    fn flatness(&self) -> Scalar {
        match self {
            Segment::Line(line) => line.flatness(),
            Segment::Cubic(cubic) => cubic.flatness(),
        }
    }

    fn transform(&self, tr: Transform) -> Self {
        match self {
            Segment::Line(line) => line.transform(tr).into(),
            Segment::Cubic(cubic) => cubic.transform(tr).into(),
        }
    }

    fn start(&self) -> Point {
        match self {
            Segment::Line(line) => line.start(),
            Segment::Cubic(cubic) => cubic.start(),
        }
    }

    fn end(&self) -> Point {
        match self {
            Segment::Line(line) => line.end(),
            Segment::Cubic(cubic) => cubic.end(),
        }
    }

    fn at(&self, t: Scalar) -> Point {
        match self {
            Segment::Line(line) => line.at(t),
            Segment::Cubic(cubic) => cubic.at(t),
        }
    }

    fn split(&self) -> (Self, Self) {
        match self {
            Segment::Line(line) => {
                let (l0, l1) = line.split();
                (l0.into(), l1.into())
            }
            Segment::Cubic(cubic) => {
                let (c0, c1) = cubic.split();
                (c0.into(), c1.into())
            }
        }
    }

    fn bbox(&self, init: Option<BBox>) -> BBox {
        match self {
            Segment::Line(line) => line.bbox(init),
            Segment::Cubic(cubic) => cubic.bbox(init),
        }
    }

    fn reverse(&self) -> Self {
        match self {
            Segment::Line(line) => line.reverse().into(),
            Segment::Cubic(cubic) => cubic.reverse().into(),
        }
    }

    fn is_finite(&self) -> bool {
        match self {
            Segment::Line(line) => line.is_finite(),
            Segment::Cubic(cubic) => cubic.is_finite(),
        }
    }
}

impl From<Line> for Segment {
    fn from(line: Line) -> Self {
        Self::Line(line)
    }
}

impl From<Cubic> for Segment {
    fn from(cubic: Cubic) -> Self {
        Self::Cubic(cubic)
    }
}
