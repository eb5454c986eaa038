//! Anti-aliased rasterizer for vector scenes.
//!
//! Main features:
//!  - SVG path data parsing and generation
//!  - Exact signed area scanline coverage with non-zero and even-odd fill rules
//!  - Stroking with miter, bevel and round joins and butt, square and round caps
//!  - Solid colors and linear/radial gradients composited with "over" operator
//!  - Rendering of a scene into RGBA/BGRA buffers with arbitrary row stride
//!
mod color;
mod curve;
mod edge;
mod error;
mod geometry;
mod grad;
mod image;
mod paint;
mod path;
mod rasterize;
mod render;
mod scene;
mod stroke;
mod utils;

pub use color::{Color, PremulColor, RGBA, linear_to_srgb, quantize, srgb_to_linear};
pub use curve::{Cubic, Curve, CurveFlattenIter, FLATTEN_MAX_DEPTH, Line, Segment};
pub use edge::{Edge, EdgeList};
pub use error::Error;
pub use geometry::{BBox, EPSILON, EPSILON_SQRT, PI, Point, Scalar, Transform, scalar_fmt};
pub use grad::{
    ColorInterpolation, GradSpread, GradStop, GradStops, LinearGradient, RadialGradient, Units,
};
pub use image::{
    AlphaMode, Buffer, BufferMut, ChannelOrder, Image, ImageIter, ImageMut, Mask, PIXEL_SIZE,
    PixelBuffer, PixelFormat, Shape as ImageShape, premultiply, unpremultiply,
};
pub use paint::{Paint, Shader};
pub use path::{
    DEFAULT_FLATNESS, LineCap, LineJoin, Path, PathBuilder, StrokeStyle, SubPath,
};
pub use rasterize::{FillRule, Rasterizer};
pub use render::{OutputSize, RenderOptions, Renderer, rasterize, rasterize_with};
pub use scene::{Group, Node, Scene, Shape, ShapeIter};
