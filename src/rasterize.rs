//! Scanline rasterizer with exact signed area coverage
use crate::{Edge, EdgeList, Error, Scalar, utils::try_vec};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Rule which determines whether a point is inside of the path
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

impl FillRule {
    /// Convert accumulated signed area into coverage in `[0, 1]`
    #[inline]
    pub fn coverage(self, acc: Scalar) -> Scalar {
        match self {
            FillRule::NonZero => {
                let value = acc.abs();
                if value > 1.0 {
                    1.0
                } else if value < 1e-6 {
                    0.0
                } else {
                    value
                }
            }
            FillRule::EvenOdd => {
                let value = ((acc + 1.0).rem_euclid(2.0) - 1.0).abs();
                if value < 1e-6 { 0.0 } else { value }
            }
        }
    }
}

/// Reusable state of the scanline rasterizer
///
/// Rows are processed from top to bottom, for each row edges crossing it are
/// sorted by `(x at the top of the row, id)` and their signed area is added to
/// the row accumulator, prefix sum of the accumulator gives the winding area.
#[derive(Debug, Default)]
pub struct Rasterizer {
    /// Edge indices sorted by top y coordinate
    order: Vec<usize>,
    /// Edge indices crossing current row
    active: Vec<usize>,
    /// Row accumulator, index `0` corresponds to the first visible column
    acc: Vec<Scalar>,
}

impl Rasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rasterize edges into an area of `width x height` pixels
    ///
    /// `emit(row, col, coverage)` is called for every row intersecting edges
    /// bounding box, `coverage[i]` is a coverage of the pixel `(row, col + i)`.
    /// Everything outside of the area is cropped.
    pub fn rasterize<F>(
        &mut self,
        edges: &EdgeList,
        fill_rule: FillRule,
        width: usize,
        height: usize,
        mut emit: F,
    ) -> Result<(), Error>
    where
        F: FnMut(usize, usize, &[Scalar]),
    {
        let Some(bbox) = edges.bbox() else {
            return Ok(());
        };
        let width_f = width as Scalar;
        let height_f = height as Scalar;
        let row_start = bbox.min().y().max(0.0).floor();
        let row_end = bbox.max().y().min(height_f).ceil();
        let col_start = bbox.min().x().max(0.0).floor();
        let col_end = bbox.max().x().min(width_f).ceil();
        if row_start >= row_end || col_start >= col_end {
            // everything left of the buffer cancels out, since edges are closed
            return Ok(());
        }
        let (row_start, row_end) = (row_start as usize, row_end as usize);
        let (col_start, col_end) = (col_start as usize, col_end as usize);
        let cols = col_end - col_start;

        // two extra cells absorb coverage spilled past the last visible column
        if self.acc.len() < cols + 2 {
            self.acc = try_vec(cols + 2, 0.0)?;
        }
        let edges = edges.edges();
        self.order.clear();
        self.order.extend(0..edges.len());
        self.order.sort_by(|i0, i1| {
            let (e0, e1) = (&edges[*i0], &edges[*i1]);
            e0.p0.y().total_cmp(&e1.p0.y()).then(e0.id.cmp(&e1.id))
        });
        self.active.clear();

        let mut next = 0;
        for row in row_start..row_end {
            let y_top = row as Scalar;
            let y_bottom = y_top + 1.0;

            // update active edges
            self.active.retain(|index| edges[*index].p1.y() > y_top);
            while let Some(index) = self.order.get(next) {
                let edge = &edges[*index];
                if edge.p0.y() >= y_bottom {
                    break;
                }
                if edge.p1.y() > y_top {
                    self.active.push(*index);
                }
                next += 1;
            }
            if self.active.is_empty() {
                continue;
            }
            self.active.sort_by(|i0, i1| edge_order(&edges[*i0], &edges[*i1], y_top));

            let acc = &mut self.acc[..cols + 2];
            for index in self.active.iter() {
                let edge = &edges[*index];
                let y0 = edge.p0.y().max(y_top);
                let y1 = edge.p1.y().min(y_bottom);
                if y1 <= y0 {
                    continue;
                }
                let x0 = edge.x_at(y0);
                let x1 = edge.x_at(y1);
                for (x0, y0, x1, y1) in clip_horizontal(x0, y0, x1, y1, width_f) {
                    signed_difference_line(
                        acc,
                        x0 - col_start as Scalar,
                        y0 - y_top,
                        x1 - col_start as Scalar,
                        y1 - y_top,
                        edge.winding,
                    );
                }
            }

            // accumulate and resolve fill rule
            let mut winding = 0.0;
            for cell in acc[..cols].iter_mut() {
                winding += *cell;
                *cell = fill_rule.coverage(winding);
            }
            emit(row, col_start, &acc[..cols]);
            acc.fill(0.0);
        }
        Ok(())
    }
}

/// Order of active edges inside of the row starting at `y`
fn edge_order(e0: &Edge, e1: &Edge, y: Scalar) -> Ordering {
    let x0 = e0.x_at(y.max(e0.p0.y()));
    let x1 = e1.x_at(y.max(e1.p0.y()));
    x0.total_cmp(&x1).then(e0.id.cmp(&e1.id))
}

/// Split segment `(x0, y0) -> (x1, y1)` by vertical lines `x = 0` and `x = width`
///
/// Parts left of `x = 0` are replaced by vertical segments at `x = 0` spanning the
/// same rows, since they cover every visible pixel in the row. Parts right of
/// `x = width` are dropped.
fn clip_horizontal(
    x0: Scalar,
    y0: Scalar,
    x1: Scalar,
    y1: Scalar,
    width: Scalar,
) -> impl Iterator<Item = (Scalar, Scalar, Scalar, Scalar)> {
    // split parameters sorted in increasing order
    let mut ts = [0.0, 1.0, 1.0, 1.0];
    let mut count = 1;
    for boundary in [0.0, width] {
        if (x0 < boundary && boundary < x1) || (x1 < boundary && boundary < x0) {
            ts[count] = (boundary - x0) / (x1 - x0);
            count += 1;
        }
    }
    if count == 3 && ts[1] > ts[2] {
        ts.swap(1, 2);
    }
    ts[count] = 1.0;
    (0..count).filter_map(move |index| {
        let (t0, t1) = (ts[index], ts[index + 1]);
        let ya = y0 + (y1 - y0) * t0;
        let yb = y0 + (y1 - y0) * t1;
        let xa = x0 + (x1 - x0) * t0;
        let xb = x0 + (x1 - x0) * t1;
        let x_mid = 0.5 * (xa + xb);
        if x_mid > width {
            None
        } else if x_mid < 0.0 {
            Some((0.0, ya, 0.0, yb))
        } else {
            Some((xa.clamp(0.0, width), ya, xb.clamp(0.0, width), yb))
        }
    })
}

/// Add signed difference introduced by a segment to the row accumulator
///
/// Segment must be contained in a single row (`0 <= y0 <= y1 <= 1`) and have
/// non-negative x coordinates. Signed difference is a difference between
/// adjacent pixels introduced by the segment.
pub(crate) fn signed_difference_line(
    acc: &mut [Scalar],
    x: Scalar,
    y0: Scalar,
    x_next: Scalar,
    y1: Scalar,
    winding: Scalar,
) {
    let dy = y1 - y0;
    if dy <= 0.0 {
        return;
    }
    let d = winding * dy;
    let mut add = |index: i64, value: Scalar| {
        if let Some(cell) = usize::try_from(index).ok().and_then(|i| acc.get_mut(i)) {
            *cell += value;
        }
    };
    // order (x, x_next) from smaller value x0 to bigger x1
    let (x0, x1) = if x < x_next { (x, x_next) } else { (x_next, x) };
    // lower bound of effected x pixels
    let x0_floor = x0.floor().max(0.0);
    let x0i = x0_floor as i64;
    // upper bound of effected x pixels
    let x1_ceil = x1.ceil();
    let x1i = x1_ceil as i64;
    if x1i <= x0i + 1 {
        // only goes through one pixel (with the total coverage of `d` spread over two pixels)
        let xmf = 0.5 * (x + x_next) - x0_floor;
        add(x0i, d * (1.0 - xmf));
        add(x0i + 1, d * xmf);
    } else {
        let s = (x1 - x0).recip();
        let x0f = x0 - x0_floor; // fractional part of x0
        let x1f = x1 - x1_ceil + 1.0; // fractional part of x1
        let a0 = 0.5 * s * (1.0 - x0f) * (1.0 - x0f); // area of the pixel with smallest x
        let am = 0.5 * s * x1f * x1f; // area of the pixel with largest x
        add(x0i, d * a0);
        if x1i == x0i + 2 {
            // only two pixels are covered
            add(x0i + 1, d * (1.0 - a0 - am));
        } else {
            // second pixel
            let a1 = s * (1.5 - x0f);
            add(x0i + 1, d * (a1 - a0));
            // (second, last) pixels
            for xi in x0i + 2..x1i - 1 {
                add(xi, d * s);
            }
            // last pixel
            let a2 = a1 + (x1i - x0i - 3) as Scalar * s;
            add(x1i - 1, d * (1.0 - a2 - am));
        }
        add(x1i, d * am);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{assert_approx_eq, Image, Mask, Path, Point, Transform, PI};

    /// Apply directed line spanning a single row to the accumulator
    fn line(acc: &mut [Scalar], p0: (Scalar, Scalar), p1: (Scalar, Scalar)) {
        let (winding, p0, p1) = if p0.1 < p1.1 {
            (1.0, p0, p1)
        } else {
            (-1.0, p1, p0)
        };
        signed_difference_line(acc, p0.0, p0.1, p1.0, p1.1, winding);
    }

    #[test]
    fn test_signed_difference_line() {
        let mut acc = [0.0; 5];

        // line covers many columns but just one row
        line(&mut acc, (0.5, 1.0), (3.5, 0.0));
        // covered areas per-pixel
        let a0 = (0.5 * (1.0 / 6.0)) / 2.0;
        let a1 = ((1.0 / 6.0) + (3.0 / 6.0)) / 2.0;
        let a2 = ((3.0 / 6.0) + (5.0 / 6.0)) / 2.0;
        assert_approx_eq!(acc[0], -a0);
        assert_approx_eq!(acc[1], a0 - a1);
        assert_approx_eq!(acc[2], a1 - a2);
        assert_approx_eq!(acc[3], a0 - a1);
        assert_approx_eq!(acc[4], -a0);
        // total difference
        let a: Scalar = acc.iter().sum();
        assert_approx_eq!(a, -1.0);
        acc.fill(0.0);

        // only two pixels covered
        line(&mut acc, (0.1, 0.1), (1.9, 0.9));
        assert_approx_eq!(acc[0], 0.18);
        assert_approx_eq!(acc[1], 0.44);
        assert_approx_eq!(acc[2], 0.18);
        acc.fill(0.0);

        // single pixel covered
        line(&mut acc, (0.1, 0.1), (0.9, 0.9));
        assert_approx_eq!(acc[0], 0.4);
        assert_approx_eq!(acc[1], 0.8 - 0.4);
        acc.fill(0.0);

        // vertical line on the pixel boundary
        line(&mut acc, (2.0, 0.25), (2.0, 0.75));
        assert_approx_eq!(acc[2], 0.5);
        assert_approx_eq!(acc[3], 0.0);
    }

    #[test]
    fn test_clip_horizontal() {
        // crosses left boundary
        let parts: Vec<_> = clip_horizontal(-1.0, 0.0, 1.0, 1.0, 4.0).collect();
        assert_eq!(parts, vec![(0.0, 0.0, 0.0, 0.5), (0.0, 0.5, 1.0, 1.0)]);

        // crosses both boundaries right to left
        let parts: Vec<_> = clip_horizontal(6.0, 0.0, -2.0, 1.0, 4.0).collect();
        assert_eq!(parts, vec![(4.0, 0.25, 0.0, 0.75), (0.0, 0.75, 0.0, 1.0)]);

        // completely right of the area
        assert_eq!(clip_horizontal(5.0, 0.0, 6.0, 1.0, 4.0).count(), 0);
    }

    #[test]
    fn test_rasterize_crossing_left() {
        // triangle with most of its area left of the visible area
        let path: Path = "M-1,0 L1,1 L-1,2 Z".parse().unwrap();
        let mut mask = Mask::new(2, 2).unwrap();
        path.rasterize_to(Transform::identity(), FillRule::NonZero, &mut mask)
            .unwrap();
        assert_approx_eq!(mask.get(0, 0).unwrap(), 0.25, 1e-9);
        assert_approx_eq!(mask.get(0, 1).unwrap(), 0.0);
        assert_approx_eq!(mask.get(1, 0).unwrap(), 0.25, 1e-9);
        assert_approx_eq!(mask.get(1, 1).unwrap(), 0.0);

        // completely left of the visible area
        let path: Path = "M-5,0 L-1,1 L-5,2 Z".parse().unwrap();
        mask.clear();
        path.rasterize_to(Transform::identity(), FillRule::NonZero, &mut mask)
            .unwrap();
        assert_approx_eq!(mask.sum(), 0.0);
    }

    #[test]
    fn test_rasterize_rect() {
        let path: Path = "M1.5,0.5 h2 v3 h-2 Z".parse().unwrap();
        let mut mask = Mask::new(6, 5).unwrap();
        path.rasterize_to(Transform::identity(), FillRule::NonZero, &mut mask)
            .unwrap();
        assert_approx_eq!(mask.get(0, 1).unwrap(), 0.25, 1e-9);
        assert_approx_eq!(mask.get(0, 2).unwrap(), 0.5, 1e-9);
        assert_approx_eq!(mask.get(1, 2).unwrap(), 1.0, 1e-9);
        assert_approx_eq!(mask.get(1, 3).unwrap(), 0.5, 1e-9);
        assert_approx_eq!(mask.get(3, 3).unwrap(), 0.25, 1e-9);
        assert_approx_eq!(mask.get(2, 4).unwrap(), 0.0);
        assert_approx_eq!(mask.sum(), 6.0, 1e-9);
    }

    #[test]
    fn test_circle_area() {
        let path = Path::builder().move_to((32.0, 32.0)).circle(20.0).build();
        let mut mask = Mask::new(64, 64).unwrap();
        path.rasterize_to(Transform::identity(), FillRule::NonZero, &mut mask)
            .unwrap();
        let area = PI * 20.0 * 20.0;
        assert!((mask.sum() - area).abs() / area < 0.01);
        assert_approx_eq!(mask.get(32, 32).unwrap(), 1.0, 1e-9);
        assert_approx_eq!(mask.get(0, 0).unwrap(), 0.0);
    }

    #[test]
    fn test_scale_area() {
        let path = Path::builder().move_to((10.0, 10.0)).circle(7.0).build();
        let area = |k: Scalar| {
            let mut mask = Mask::new(80, 80).unwrap();
            path.rasterize_to(Transform::new_scale(k, k), FillRule::NonZero, &mut mask)
                .unwrap();
            mask.sum()
        };
        let a1 = area(1.0);
        let a3 = area(3.0);
        assert!((a3 / a1 - 9.0).abs() < 9.0 * 0.01);
    }

    #[test]
    fn test_fill_rule() {
        // two overlapping circles with the same direction
        let path = Path::builder()
            .move_to((20.0, 20.0))
            .circle(10.0)
            .move_to((30.0, 20.0))
            .circle(10.0)
            .build();
        let nonzero = path
            .mask(Transform::identity(), FillRule::NonZero)
            .unwrap();
        let evenodd = path
            .mask(Transform::identity(), FillRule::EvenOdd)
            .unwrap();
        assert_eq!(nonzero.shape(), evenodd.shape());
        // mask has one pixel border around the bounding box with origin at (10, 10),
        // pixel (11, 16) covers [25, 26] x [20, 21] inside of the overlap
        let (row, col) = (11, 16);
        assert_approx_eq!(nonzero.get(row, col).unwrap(), 1.0, 1e-9);
        assert_approx_eq!(evenodd.get(row, col).unwrap(), 0.0, 1e-9);
        // pixel (11, 6) covers [15, 16] x [20, 21] inside of the first circle only
        let col = 6;
        assert_approx_eq!(nonzero.get(row, col).unwrap(), 1.0, 1e-9);
        assert_approx_eq!(evenodd.get(row, col).unwrap(), 1.0, 1e-9);
        assert!(nonzero.sum() > evenodd.sum());
    }

    #[test]
    fn test_fill_rule_star() {
        let path: Path = r#"
            M50,0 21,90 98,35 2,35 79,90z
            M110,0 h90 v90 h-90z
            M130,20 h50 v50 h-50 z
            M210,0  h90 v90 h-90 z
            M230,20 v50 h50 v-50 z
        "#
        .parse()
        .unwrap();
        let y = 50;
        let mut mask = Mask::new(310, 100).unwrap();
        path.rasterize_to(Transform::identity(), FillRule::EvenOdd, &mut mask)
            .unwrap();
        assert_approx_eq!(mask.get(y, 50).unwrap(), 0.0, 1e-9);
        assert_approx_eq!(mask.get(y, 150).unwrap(), 0.0, 1e-9);
        assert_approx_eq!(mask.get(y, 250).unwrap(), 0.0, 1e-9);
        assert_approx_eq!(mask.sum(), 13130.0, 1.0);

        mask.clear();
        path.rasterize_to(Transform::identity(), FillRule::NonZero, &mut mask)
            .unwrap();
        assert_approx_eq!(mask.get(y, 50).unwrap(), 1.0, 1e-9);
        assert_approx_eq!(mask.get(y, 150).unwrap(), 1.0, 1e-9);
        assert_approx_eq!(mask.get(y, 250).unwrap(), 0.0, 1e-9);
        assert_approx_eq!(mask.sum(), 16492.5, 1.0);
    }

    #[test]
    fn test_edge_order_ties() {
        let e0 = Edge::new(Point::new(1.0, 0.0), Point::new(1.0, 2.0), 1).unwrap();
        let e1 = Edge::new(Point::new(1.0, 0.0), Point::new(3.0, 2.0), 0).unwrap();
        assert_eq!(edge_order(&e0, &e1, 0.0), Ordering::Greater);
        assert_eq!(edge_order(&e0, &e1, 1.0), Ordering::Less);
    }
}
