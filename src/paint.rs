//! Paint resolution and "over" compositing of coverage spans
use crate::{
    BBox, Color, EPSILON, GradSpread, GradStops, LinearGradient, PixelFormat, Point, PremulColor, RGBA,
    RadialGradient, Scalar, Transform, Units,
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Paint used to fill or stroke a shape
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Paint {
    #[default]
    None,
    Solid(RGBA),
    LinearGradient(LinearGradient),
    RadialGradient(RadialGradient),
}

impl Paint {
    pub fn is_none(&self) -> bool {
        matches!(self, Paint::None)
    }

    /// All geometry of the paint is finite
    pub fn is_finite(&self) -> bool {
        match self {
            Paint::None | Paint::Solid(_) => true,
            Paint::LinearGradient(grad) => grad.is_finite(),
            Paint::RadialGradient(grad) => grad.is_finite(),
        }
    }
}

impl From<RGBA> for Paint {
    fn from(color: RGBA) -> Self {
        Paint::Solid(color)
    }
}

impl From<LinearGradient> for Paint {
    fn from(grad: LinearGradient) -> Self {
        Paint::LinearGradient(grad)
    }
}

impl From<RadialGradient> for Paint {
    fn from(grad: RadialGradient) -> Self {
        Paint::RadialGradient(grad)
    }
}

/// Paint prepared for evaluation in device space
#[derive(Debug, Clone)]
pub enum Shader<'a> {
    Solid(PremulColor),
    Linear {
        grad: &'a LinearGradient,
        inverse: Transform,
        stops: GradStops,
        opacity: Scalar,
    },
    Radial {
        grad: &'a RadialGradient,
        inverse: Transform,
        stops: GradStops,
        opacity: Scalar,
    },
}

impl<'a> Shader<'a> {
    /// Prepare paint for rendering
    ///
    /// `tr` maps local coordinates of the shape into device space and `bbox` is the
    /// local bounding box of the shape. Returns `None` if paint would not change
    /// any pixel.
    pub fn new(paint: &'a Paint, tr: Transform, bbox: Option<BBox>, opacity: Scalar) -> Option<Self> {
        if !(opacity > 0.0) {
            return None;
        }
        let shader = match paint {
            Paint::None => return None,
            Paint::Solid(color) => Shader::Solid(PremulColor::from(*color).with_alpha(opacity)),
            Paint::LinearGradient(grad) => {
                if empty_bbox_units(grad.units, bbox) {
                    tracing::trace!("linear gradient relative to an empty bounding box");
                    return None;
                }
                let stops = GradStops::new(&grad.stops, grad.interpolation);
                let inverse = gradient_inverse(tr, grad.units, grad.transform, bbox);
                match inverse {
                    Some(inverse) if grad.offset(grad.end).is_some() => Shader::Linear {
                        grad,
                        inverse,
                        stops,
                        opacity,
                    },
                    _ => {
                        tracing::trace!("degenerate linear gradient");
                        Shader::Solid(stops.last()?.with_alpha(opacity))
                    }
                }
            }
            Paint::RadialGradient(grad) => {
                if empty_bbox_units(grad.units, bbox) {
                    tracing::trace!("radial gradient relative to an empty bounding box");
                    return None;
                }
                let stops = GradStops::new(&grad.stops, grad.interpolation);
                let inverse = gradient_inverse(tr, grad.units, grad.transform, bbox);
                match inverse {
                    Some(inverse) if grad.offset(grad.center).is_some() => Shader::Radial {
                        grad,
                        inverse,
                        stops,
                        opacity,
                    },
                    _ => {
                        tracing::trace!("degenerate radial gradient");
                        Shader::Solid(stops.last()?.with_alpha(opacity))
                    }
                }
            }
        };
        match shader {
            Shader::Linear { ref stops, .. } | Shader::Radial { ref stops, .. }
                if stops.is_empty() =>
            {
                None
            }
            shader => Some(shader),
        }
    }

    /// Color of the pixel at `row` and `col`, evaluated at the pixel center
    pub fn at(&self, row: usize, col: usize) -> PremulColor {
        let point = || Point::new(col as Scalar + 0.5, row as Scalar + 0.5);
        match self {
            Shader::Solid(color) => *color,
            Shader::Linear {
                grad,
                inverse,
                stops,
                opacity,
            } => {
                let t = grad.offset(inverse.apply(point())).unwrap_or(1.0);
                stops.at(spread(grad.spread, t)).with_alpha(*opacity)
            }
            Shader::Radial {
                grad,
                inverse,
                stops,
                opacity,
            } => {
                let t = grad.offset(inverse.apply(point())).unwrap_or(1.0);
                stops.at(spread(grad.spread, t)).with_alpha(*opacity)
            }
        }
    }

    /// Composite coverage span into the row of pixels stored in `format`
    ///
    /// `coverage[i]` corresponds to `pixels[col + i]`, pixels with zero coverage
    /// are not touched.
    pub fn composite(
        &self,
        pixels: &mut [[u8; 4]],
        format: PixelFormat,
        row: usize,
        col: usize,
        coverage: &[Scalar],
    ) {
        let Some(pixels) = pixels.get_mut(col..) else {
            return;
        };
        for (offset, (pixel, value)) in pixels.iter_mut().zip(coverage).enumerate() {
            if !(*value > 0.0) {
                continue;
            }
            let src = match self {
                Shader::Solid(color) => *color,
                _ => self.at(row, col + offset),
            };
            let dst = PremulColor::from_bytes(format.decode(*pixel));
            *pixel = format.encode(dst.blend_over(src.with_alpha(value.min(1.0))).to_bytes());
        }
    }
}

/// Map gradient parameter with spread method, non-finite parameters use the end color
fn spread(spread: GradSpread, t: Scalar) -> Scalar {
    if t.is_finite() { spread.at(t) } else { 1.0 }
}

/// Bounding box units are undefined when the box has zero width or height
fn empty_bbox_units(units: Units, bbox: Option<BBox>) -> bool {
    matches!(units, Units::BoundingBox)
        && !bbox.is_some_and(|bbox| bbox.width() > EPSILON && bbox.height() > EPSILON)
}

/// Inverse of `tr * units * grad_tr`, maps device points into gradient space
fn gradient_inverse(
    tr: Transform,
    units: Units,
    grad_tr: Transform,
    bbox: Option<BBox>,
) -> Option<Transform> {
    let units = match units {
        Units::UserSpaceOnUse => Transform::identity(),
        Units::BoundingBox => bbox?.unit_transform(),
    };
    (tr * units * grad_tr).invert()
}
