use crate::{Color, Point, PremulColor, RGBA, Scalar, Transform, utils::clamp, EPSILON};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Coordinate system in which gradient geometry is specified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Units {
    /// Local coordinates of the shape
    #[default]
    UserSpaceOnUse,
    /// Unit square is mapped onto the bounding box of the shape
    BoundingBox,
}

/// Gradient spread logic for the parameter smaller than 0 and greater than 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum GradSpread {
    /// Use the same colors as the edge of the gradient
    #[default]
    Pad,
    /// Repeat gradient
    Repeat,
    /// Repeat gradient but alternate reflected and non reflected versions
    Reflect,
}

impl GradSpread {
    /// Map gradient parameter value to the range of [0, 1]
    pub fn at(&self, t: Scalar) -> Scalar {
        let t = match self {
            GradSpread::Pad => t,
            GradSpread::Repeat => t.rem_euclid(1.0),
            GradSpread::Reflect => ((t + 1.0).rem_euclid(2.0) - 1.0).abs(),
        };
        clamp(t, 0.0, 1.0)
    }
}

/// Color space in which colors of the stops are interpolated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ColorInterpolation {
    /// Interpolate sRGB encoded values
    #[default]
    Srgb,
    /// Interpolate linear light values
    LinearRgb,
}

/// Specifies color at a particular parameter offset of the gradient
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GradStop {
    pub offset: Scalar,
    pub color: RGBA,
}

impl GradStop {
    pub fn new(offset: Scalar, color: RGBA) -> Self {
        Self { offset, color }
    }
}

/// Stops normalized for evaluation
///
/// Offsets are clamped to `[0, 1]` and made non-decreasing in document order,
/// colors are premultiplied and converted to the interpolation color space.
#[derive(Debug, Clone, PartialEq)]
pub struct GradStops {
    stops: Vec<(Scalar, PremulColor)>,
    interpolation: ColorInterpolation,
}

impl GradStops {
    pub fn new(stops: &[GradStop], interpolation: ColorInterpolation) -> Self {
        let mut prev = 0.0;
        let stops = stops
            .iter()
            .map(|stop| {
                let offset = if stop.offset.is_nan() {
                    prev
                } else {
                    clamp(stop.offset, 0.0, 1.0).max(prev)
                };
                prev = offset;
                let color = PremulColor::from(stop.color);
                let color = match interpolation {
                    ColorInterpolation::Srgb => color,
                    ColorInterpolation::LinearRgb => color.into_linear(),
                };
                (offset, color)
            })
            .collect();
        Self {
            stops,
            interpolation,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Color of the last stop, used by degenerate gradients
    pub fn last(&self) -> Option<PremulColor> {
        let (_, color) = self.stops.last()?;
        Some(self.output(*color))
    }

    /// Interpolated color at the offset `t` in `[0, 1]`
    ///
    /// When several stops share an offset, the later one is used at that offset.
    pub fn at(&self, t: Scalar) -> PremulColor {
        let index = self.stops.partition_point(|(offset, _)| *offset <= t);
        let color = match (index.checked_sub(1), self.stops.get(index)) {
            (None, Some((_, color))) => *color,
            (Some(prev), Some((o1, c1))) => {
                let (o0, c0) = self.stops[prev];
                c0.lerp(*c1, (t - o0) / (o1 - o0))
            }
            (Some(prev), None) => self.stops[prev].1,
            (None, None) => PremulColor::TRANSPARENT,
        };
        self.output(color)
    }

    fn output(&self, color: PremulColor) -> PremulColor {
        match self.interpolation {
            ColorInterpolation::Srgb => color,
            ColorInterpolation::LinearRgb => color.into_srgb(),
        }
    }
}

/// Linear gradient
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinearGradient {
    pub start: Point,
    pub end: Point,
    pub stops: Vec<GradStop>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub units: Units,
    #[cfg_attr(feature = "serde", serde(default))]
    pub spread: GradSpread,
    #[cfg_attr(feature = "serde", serde(default))]
    pub transform: Transform,
    #[cfg_attr(feature = "serde", serde(default))]
    pub interpolation: ColorInterpolation,
}

impl LinearGradient {
    pub fn new(start: impl Into<Point>, end: impl Into<Point>, stops: Vec<GradStop>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            stops,
            units: Units::default(),
            spread: GradSpread::default(),
            transform: Transform::identity(),
            interpolation: ColorInterpolation::default(),
        }
    }

    /// Gradient parameter of a point in gradient space, `None` for zero length gradients
    ///
    /// `t = (point - start) . (end - start) / |end - start| ^ 2`
    pub fn offset(&self, point: Point) -> Option<Scalar> {
        let dir = self.end - self.start;
        let len2 = dir.dot(dir);
        if !(len2 > EPSILON) || !len2.is_finite() {
            return None;
        }
        Some((point - self.start).dot(dir) / len2)
    }

    pub fn is_finite(&self) -> bool {
        self.start.is_finite() && self.end.is_finite() && self.transform.is_finite()
    }
}

/// Radial gradient
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RadialGradient {
    pub center: Point,
    pub radius: Scalar,
    pub stops: Vec<GradStop>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub units: Units,
    #[cfg_attr(feature = "serde", serde(default))]
    pub spread: GradSpread,
    #[cfg_attr(feature = "serde", serde(default))]
    pub transform: Transform,
    #[cfg_attr(feature = "serde", serde(default))]
    pub interpolation: ColorInterpolation,
}

impl RadialGradient {
    pub fn new(center: impl Into<Point>, radius: Scalar, stops: Vec<GradStop>) -> Self {
        Self {
            center: center.into(),
            radius,
            stops,
            units: Units::default(),
            spread: GradSpread::default(),
            transform: Transform::identity(),
            interpolation: ColorInterpolation::default(),
        }
    }

    /// Gradient parameter of a point in gradient space, `None` for zero radius gradients
    ///
    /// `t = |point - center| / radius`
    pub fn offset(&self, point: Point) -> Option<Scalar> {
        if !(self.radius > EPSILON) || !self.radius.is_finite() {
            return None;
        }
        Some(point.dist(self.center) / self.radius)
    }

    pub fn is_finite(&self) -> bool {
        self.center.is_finite() && self.radius.is_finite() && self.transform.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_approx_eq;

    const RED: RGBA = RGBA::new(255, 0, 0, 255);
    const GREEN: RGBA = RGBA::new(0, 255, 0, 255);
    const BLUE: RGBA = RGBA::new(0, 0, 255, 255);

    #[test]
    fn test_spread() {
        use GradSpread::*;
        assert_approx_eq!(Reflect.at(0.3), 0.3, 1e-6);
        assert_approx_eq!(Reflect.at(-0.3), 0.3, 1e-6);
        assert_approx_eq!(Reflect.at(1.3), 0.7, 1e-6);
        assert_approx_eq!(Reflect.at(-1.3), 0.7, 1e-6);

        assert_approx_eq!(Repeat.at(0.3), 0.3);
        assert_approx_eq!(Repeat.at(-0.3), 0.7);

        assert_approx_eq!(Pad.at(-0.3), 0.0);
        assert_approx_eq!(Pad.at(1.3), 1.0);
    }

    #[test]
    fn test_grad_stops() {
        let stops = GradStops::new(
            &[
                GradStop::new(0.0, RED),
                GradStop::new(0.5, GREEN),
                GradStop::new(1.0, BLUE),
            ],
            ColorInterpolation::Srgb,
        );
        assert_eq!(stops.at(0.0), PremulColor::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(stops.at(0.25), PremulColor::new(0.5, 0.5, 0.0, 1.0));
        assert_eq!(stops.at(0.75), PremulColor::new(0.0, 0.5, 0.5, 1.0));
        assert_eq!(stops.at(1.0), PremulColor::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(stops.at(0.5), PremulColor::new(0.0, 1.0, 0.0, 1.0));
    }

    #[test]
    fn test_stops_normalize() {
        // out of order offset is raised to its predecessor, later stop wins at ties
        let stops = GradStops::new(
            &[
                GradStop::new(-1.0, RED),
                GradStop::new(0.6, GREEN),
                GradStop::new(0.4, BLUE),
                GradStop::new(2.0, RED),
            ],
            ColorInterpolation::Srgb,
        );
        assert_eq!(stops.at(0.0), PremulColor::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(stops.at(0.6), PremulColor::new(0.0, 0.0, 1.0, 1.0));
        let mid = stops.at(0.8);
        assert_approx_eq!(mid.red(), 0.5, 1e-9);
        assert_approx_eq!(mid.blue(), 0.5, 1e-9);
        assert_eq!(stops.last(), Some(PremulColor::new(1.0, 0.0, 0.0, 1.0)));

        let empty = GradStops::new(&[], ColorInterpolation::Srgb);
        assert!(empty.is_empty());
        assert_eq!(empty.last(), None);
    }

    #[test]
    fn test_midpoint_interpolation() {
        let stops = [GradStop::new(0.0, RED), GradStop::new(1.0, BLUE)];
        let srgb = GradStops::new(&stops, ColorInterpolation::Srgb);
        assert_eq!(srgb.at(0.5).to_bytes(), [128, 0, 128, 255]);

        // linear light midpoint is brighter once encoded back to sRGB
        let linear = GradStops::new(&stops, ColorInterpolation::LinearRgb);
        let [r, g, b, a] = linear.at(0.5).to_bytes();
        assert_eq!([g, a], [0, 255]);
        assert_eq!(r, b);
        assert_eq!(r, 188);
    }

    #[test]
    fn test_linear_offset() {
        let grad = LinearGradient::new((0.0, 0.0), (2.0, 2.0), vec![]);
        assert_approx_eq!(grad.offset(Point::new(1.0, 1.0)).unwrap(), 0.5);
        assert_approx_eq!(grad.offset(Point::new(2.0, 0.0)).unwrap(), 0.5);
        assert_approx_eq!(grad.offset(Point::new(-1.0, -1.0)).unwrap(), -0.5);
        let degenerate = LinearGradient::new((1.0, 1.0), (1.0, 1.0), vec![]);
        assert!(degenerate.offset(Point::new(1.0, 1.0)).is_none());
    }

    #[test]
    fn test_radial_offset() {
        let grad = RadialGradient::new((0.5, 0.5), 0.5, vec![]);
        assert_approx_eq!(grad.offset(Point::new(0.5, 0.5)).unwrap(), 0.0);
        assert_approx_eq!(grad.offset(Point::new(1.0, 0.5)).unwrap(), 1.0);
        assert_approx_eq!(grad.offset(Point::new(0.5, 0.75)).unwrap(), 0.5);
        let degenerate = RadialGradient::new((0.5, 0.5), 0.0, vec![]);
        assert!(degenerate.offset(Point::new(0.5, 0.5)).is_none());
    }
}
