//! Stroke outline expansion
//!
//! Every open sub-path becomes a single closed outline: offset to one side going
//! forward, cap, offset to the other side going backward, cap. Closed sub-paths
//! become two loops traversed in opposite directions. Joins are only inserted on the
//! outer side of a turn, on the inner side offsets are trimmed at their intersection,
//! so the outline boundary is crossed once and its non-zero fill covers every pixel
//! of the stroke exactly once.
use crate::{EPSILON, Line, LineCap, LineJoin, PI, Path, Point, Scalar, StrokeStyle, SubPath};

/// Upper bound on the number of segments used to approximate a single arc
const ARC_MAX_SEGMENTS: Scalar = 1024.0;

impl Path {
    /// Stroke path
    ///
    /// Path is flattened with provided `flatness` in its local coordinates, so callers
    /// that render stroke with a transform should divide device flatness by the
    /// transform scale.
    pub fn stroke(&self, style: StrokeStyle, flatness: Scalar) -> Path {
        let half_width = style.width / 2.0;
        if !half_width.is_finite() || half_width <= 0.0 {
            return Path::empty();
        }
        // largest angle of an arc chord which deviates from the arc by at most `flatness`
        let arc_step = 2.0 * (1.0 - flatness / half_width).clamp(-1.0, 1.0).acos();
        let mut stroker = Stroker {
            style,
            half_width,
            flatness,
            arc_step,
            subpaths: Vec::new(),
        };
        for subpath in self.subpaths() {
            stroker.subpath(subpath);
        }
        Path::new(stroker.subpaths)
    }
}

/// Unit direction and length of a polyline segment
type Direction = (Point, Scalar);

struct Stroker {
    style: StrokeStyle,
    half_width: Scalar,
    flatness: Scalar,
    arc_step: Scalar,
    subpaths: Vec<SubPath>,
}

impl Stroker {
    fn subpath(&mut self, subpath: &SubPath) {
        let mut points = subpath.polyline(self.flatness);
        let closed = subpath.closed();
        if closed && points.len() > 1 {
            if let (Some(first), Some(last)) = (points.first(), points.last()) {
                if first.is_close_to(*last) {
                    points.pop();
                }
            }
        }
        match points.len() {
            0 => return,
            1 => return self.dot(points[0]),
            _ => {}
        }
        let Some(forward) = directions(&points, closed) else {
            return;
        };

        let mut outline = Vec::new();
        if closed {
            self.offset(&points, &forward, true, &mut outline);
            self.emit(&mut outline);
            // both sides of a flat loop are already covered by the forward offset
            let flat = forward
                .windows(2)
                .all(|pair| pair[0].0.cross(pair[1].0).abs() < EPSILON);
            if flat {
                return;
            }
            points.reverse();
            if let Some(backward) = directions(&points, true) {
                self.offset(&points, &backward, true, &mut outline);
                self.emit(&mut outline);
            }
        } else {
            self.offset(&points, &forward, false, &mut outline);
            if let (Some(end), Some((dir, _))) = (points.last(), forward.last()) {
                self.cap(&mut outline, *end, *dir);
            }
            points.reverse();
            let Some(backward) = directions(&points, false) else {
                return;
            };
            self.offset(&points, &backward, false, &mut outline);
            if let (Some(start), Some((dir, _))) = (points.last(), backward.last()) {
                self.cap(&mut outline, *start, *dir);
            }
            self.emit(&mut outline);
        }
    }

    /// Offset polyline to the side of segment normals, with joins between segments
    fn offset(&self, points: &[Point], dirs: &[Direction], closed: bool, out: &mut Vec<Point>) {
        let count = points.len();
        if closed {
            for index in 0..count {
                let prev = dirs[(index + count - 1) % count];
                self.join(out, points[index], prev, dirs[index]);
            }
        } else {
            let (Some((first, _)), Some((last, _))) = (dirs.first(), dirs.last()) else {
                return;
            };
            push(out, points[0] + self.half_width * first.normal());
            for index in 1..count - 1 {
                self.join(out, points[index], dirs[index - 1], dirs[index]);
            }
            push(out, points[count - 1] + self.half_width * last.normal());
        }
    }

    /// Join at `point` between segments with directions `d0` and `d1`
    fn join(&self, out: &mut Vec<Point>, point: Point, (d0, l0): Direction, (d1, l1): Direction) {
        let hw = self.half_width;
        let (n0, n1) = (d0.normal(), d1.normal());
        let a = point + hw * n0;
        let b = point + hw * n1;
        let cross = d0.cross(d1);
        let dot = d0.dot(d1);
        if cross.abs() < EPSILON && dot > 0.0 {
            push(out, a);
            return;
        }
        // offset lines on either side intersect at `point + hw * (n0 + n1) / (1 + d0·d1)`
        if cross < 0.0 {
            // inner side, trimmed at the intersection unless it lies beyond the middle
            // of either segment, otherwise routed through the pivot
            if hw * cross.abs() <= (1.0 + dot) * l0.min(l1) / 2.0 {
                push(out, point + (hw / (1.0 + dot)) * (n0 + n1));
            } else {
                push(out, a);
                push(out, point);
                push(out, b);
            }
            return;
        }
        push(out, a);
        match self.style.line_join {
            LineJoin::Bevel => {}
            LineJoin::Round => self.arc(out, point, n0, cross.abs().atan2(dot)),
            LineJoin::Miter(limit) => {
                // miter_length / stroke_width = 1 / cos(turn / 2) = 2 / |n0 + n1|
                let length = (2.0 + 2.0 * dot).max(0.0).sqrt();
                if length > EPSILON && 2.0 / length <= limit {
                    push(out, point + (hw / (1.0 + dot)) * (n0 + n1));
                }
            }
        }
        push(out, b);
    }

    /// Cap at the `point` where the segment with direction `dir` ends
    ///
    /// Goes from the positive offset side to the negative one.
    fn cap(&self, out: &mut Vec<Point>, point: Point, dir: Point) {
        let hw = self.half_width;
        let normal = dir.normal();
        push(out, point + hw * normal);
        match self.style.line_cap {
            LineCap::Butt => {}
            LineCap::Square => {
                push(out, point + hw * normal + hw * dir);
                push(out, point - hw * normal + hw * dir);
            }
            LineCap::Round => self.arc(out, point, normal, PI),
        }
        push(out, point - hw * normal);
    }

    /// Zero length sub-path
    fn dot(&mut self, point: Point) {
        if matches!(self.style.line_cap, LineCap::Butt) {
            return;
        }
        let mut outline = Vec::new();
        self.cap(&mut outline, point, Point::new(1.0, 0.0));
        self.cap(&mut outline, point, Point::new(-1.0, 0.0));
        self.emit(&mut outline);
    }

    /// Arc around `center` starting at unit vector `from` and rotating by `angle`,
    /// end points are not included
    fn arc(&self, out: &mut Vec<Point>, center: Point, from: Point, angle: Scalar) {
        let count = (angle / self.arc_step).ceil();
        let count = if count.is_finite() {
            count.clamp(1.0, ARC_MAX_SEGMENTS)
        } else {
            ARC_MAX_SEGMENTS
        };
        for index in 1..count as usize {
            let (sin, cos) = (angle * index as Scalar / count).sin_cos();
            let offset = Point::new(
                from.x() * cos - from.y() * sin,
                from.x() * sin + from.y() * cos,
            );
            push(out, center + self.half_width * offset);
        }
    }

    /// Convert collected points into a closed sub-path and reset them
    fn emit(&mut self, points: &mut Vec<Point>) {
        if let (Some(first), Some(last)) = (points.first(), points.last()) {
            if points.len() > 1 && first.is_close_to(*last) {
                points.pop();
            }
        }
        if points.len() >= 3 {
            let segments = points
                .windows(2)
                .map(|pair| Line::new(pair[0], pair[1]).into())
                .collect();
            self.subpaths.extend(SubPath::new(segments, true));
        }
        points.clear();
    }
}

/// Directions of the polyline segments, including closing segment if `closed`
fn directions(points: &[Point], closed: bool) -> Option<Vec<Direction>> {
    let count = points.len();
    let segments = if closed { count } else { count - 1 };
    (0..segments)
        .map(|index| {
            let direction = Line::new(points[index], points[(index + 1) % count]).direction();
            Some((direction.normalize()?, direction.length()))
        })
        .collect()
}

fn push(out: &mut Vec<Point>, point: Point) {
    if out.last().is_none_or(|last| !last.is_close_to(point)) {
        out.push(point);
    }
}
