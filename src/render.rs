//! Scene to raster orchestration
use crate::{
    BBox, Buffer, DEFAULT_FLATNESS, EdgeList, Error, FillRule, ImageMut, Paint, Path, PixelBuffer,
    PixelFormat, PremulColor, RGBA, Rasterizer, Scalar, Scene, Shader, StrokeStyle, Transform,
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Rendering configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RenderOptions {
    /// Maximum distance in device pixels between a curve and its flattened version
    pub flatness: Scalar,
    /// Color used to clear the buffer, transparent if not specified
    pub background: Option<RGBA>,
    /// Layout of the pixels of the resulting buffer
    pub format: PixelFormat,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            flatness: DEFAULT_FLATNESS,
            background: None,
            format: PixelFormat::default(),
        }
    }
}

/// Size of the output image
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum OutputSize {
    /// Uniform scale of the scene size
    Scale(Scalar),
    /// Width in pixels, height keeps aspect ratio
    Width(usize),
    /// Height in pixels, width keeps aspect ratio
    Height(usize),
    /// Exact size in pixels, scene is stretched to fit
    Exact(usize, usize),
}

impl Default for OutputSize {
    fn default() -> Self {
        Self::Scale(1.0)
    }
}

impl OutputSize {
    /// Resolve into `(width, height, scale_x, scale_y)` for a scene of the given size
    pub fn resolve(
        &self,
        scene_width: Scalar,
        scene_height: Scalar,
    ) -> Result<(usize, usize, Scalar, Scalar), Error> {
        if !(scene_width.is_finite() && scene_width > 0.0)
            || !(scene_height.is_finite() && scene_height > 0.0)
        {
            return Err(Error::input(format!(
                "invalid scene size: {}x{}",
                scene_width, scene_height
            )));
        }
        match *self {
            OutputSize::Scale(scale) => {
                if !(scale.is_finite() && scale > 0.0) {
                    return Err(Error::input(format!("invalid scale: {}", scale)));
                }
                let width = pixels(scene_width * scale)?;
                let height = pixels(scene_height * scale)?;
                Ok((width, height, scale, scale))
            }
            OutputSize::Width(width) => {
                let scale = width as Scalar / scene_width;
                let height = pixels(scene_height * scale)?;
                Ok((pixels(width as Scalar)?, height, scale, scale))
            }
            OutputSize::Height(height) => {
                let scale = height as Scalar / scene_height;
                let width = pixels(scene_width * scale)?;
                Ok((width, pixels(height as Scalar)?, scale, scale))
            }
            OutputSize::Exact(width, height) => Ok((
                pixels(width as Scalar)?,
                pixels(height as Scalar)?,
                width as Scalar / scene_width,
                height as Scalar / scene_height,
            )),
        }
    }
}

/// Round size to the nearest number of pixels, which must be at least one
fn pixels(size: Scalar) -> Result<usize, Error> {
    let size = size.round();
    if !size.is_finite() {
        return Err(Error::input(format!("invalid output size: {}", size)));
    }
    if size < 1.0 {
        return Err(Error::input("output size is zero"));
    }
    if size > usize::MAX as Scalar {
        return Err(Error::Resource {
            reason: format!("output size is too large: {}", size),
        });
    }
    Ok(size as usize)
}

/// Renderer with reusable scratch buffers
#[derive(Debug)]
pub struct Renderer {
    flatness: Scalar,
    edges: EdgeList,
    rasterizer: Rasterizer,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(DEFAULT_FLATNESS)
    }
}

impl Renderer {
    pub fn new(flatness: Scalar) -> Self {
        Self {
            flatness,
            edges: EdgeList::new(),
            rasterizer: Rasterizer::new(),
        }
    }

    /// Composite scene transformed by `tr` into an image
    ///
    /// Pixels are decoded from and encoded back into the format of the image.
    /// Shapes are painted in document order, fill first and then stroke. Pixels which
    /// are not covered by any shape are not modified.
    pub fn render_into<I>(
        &mut self,
        scene: &Scene,
        tr: Transform,
        image: &mut I,
    ) -> Result<(), Error>
    where
        I: PixelBuffer,
    {
        scene.validate()?;
        if !tr.is_finite() {
            return Err(Error::input("render transform is not finite"));
        }
        if !(self.flatness.is_finite() && self.flatness > 0.0) {
            return Err(Error::input(format!("invalid flatness: {}", self.flatness)));
        }
        let (width, height) = (image.width(), image.height());
        let _span = tracing::debug_span!("[render]", width, height).entered();
        let mut count = 0usize;
        for (shape, shape_tr, opacity) in scene.shapes(tr) {
            if opacity <= 0.0 || shape.path.is_empty() {
                tracing::trace!(id = ?shape.id, "skipping invisible shape");
                continue;
            }
            let _span = tracing::debug_span!("[shape]", id = ?shape.id).entered();
            let bbox = shape.path.bbox(Transform::identity());
            if !shape.fill.is_none() {
                self.fill_path(
                    &shape.path,
                    shape_tr,
                    shape.fill_rule,
                    &shape.fill,
                    bbox,
                    opacity,
                    image,
                )?;
            }
            if !shape.stroke.is_none() && shape.stroke_style.width > 0.0 {
                self.stroke_path(
                    &shape.path,
                    shape_tr,
                    shape.stroke_style,
                    &shape.stroke,
                    bbox,
                    opacity,
                    image,
                )?;
            }
            count += 1;
        }
        tracing::debug!("[render:shapes] {}", count);
        Ok(())
    }

    /// Fill path transformed by `tr` with the paint
    ///
    /// `bbox` is the local bounding box used by gradients with bounding box units.
    #[allow(clippy::too_many_arguments)]
    pub fn fill_path<I>(
        &mut self,
        path: &Path,
        tr: Transform,
        fill_rule: FillRule,
        paint: &Paint,
        bbox: Option<BBox>,
        opacity: Scalar,
        image: &mut I,
    ) -> Result<(), Error>
    where
        I: PixelBuffer,
    {
        let Some(shader) = Shader::new(paint, tr, bbox, opacity) else {
            return Ok(());
        };
        self.edges.clear();
        self.edges.extend_path(path, tr, self.flatness);
        self.composite(&shader, fill_rule, image)
    }

    /// Stroke path transformed by `tr` with the paint
    #[allow(clippy::too_many_arguments)]
    pub fn stroke_path<I>(
        &mut self,
        path: &Path,
        tr: Transform,
        style: StrokeStyle,
        paint: &Paint,
        bbox: Option<BBox>,
        opacity: Scalar,
        image: &mut I,
    ) -> Result<(), Error>
    where
        I: PixelBuffer,
    {
        let scale = tr.max_scale();
        if !(scale > 0.0) {
            return Ok(());
        }
        let Some(shader) = Shader::new(paint, tr, bbox, opacity) else {
            return Ok(());
        };
        let flatness = self.flatness / scale;
        let stroke = tracing::debug_span!("[stroke]").in_scope(|| path.stroke(style, flatness));
        tracing::trace!("[stroke:segments_count] {}", stroke.segments_count());
        self.edges.clear();
        self.edges.extend_path(&stroke, tr, self.flatness);
        self.composite(&shader, FillRule::NonZero, image)
    }

    fn composite<I>(
        &mut self,
        shader: &Shader<'_>,
        fill_rule: FillRule,
        image: &mut I,
    ) -> Result<(), Error>
    where
        I: PixelBuffer,
    {
        if self.edges.is_empty() {
            return Ok(());
        }
        let (width, height) = (image.width(), image.height());
        let format = image.format();
        self.rasterizer
            .rasterize(&self.edges, fill_rule, width, height, |row, col, coverage| {
                if let Some(pixels) = image.row_mut(row) {
                    shader.composite(pixels, format, row, col, coverage);
                }
            })
    }
}

/// Rasterize scene into a straight alpha RGBA buffer of `width x height` pixels
///
/// Scene coordinates are scaled by `scale_x` and `scale_y`.
pub fn rasterize(
    scene: &Scene,
    width: usize,
    height: usize,
    scale_x: Scalar,
    scale_y: Scalar,
) -> Result<Buffer, Error> {
    if width == 0 || height == 0 {
        return Err(Error::input(format!("output size is zero: {}x{}", width, height)));
    }
    if !(scale_x.is_finite() && scale_x > 0.0) || !(scale_y.is_finite() && scale_y > 0.0) {
        return Err(Error::input(format!("invalid scale: {}x{}", scale_x, scale_y)));
    }
    render_buffer(
        scene,
        width,
        height,
        Transform::new_scale(scale_x, scale_y),
        &RenderOptions::default(),
    )
}

/// Rasterize scene into a buffer of the requested size and format
pub fn rasterize_with(
    scene: &Scene,
    size: OutputSize,
    options: &RenderOptions,
) -> Result<Buffer, Error> {
    scene.validate()?;
    let (width, height, scale_x, scale_y) = size.resolve(scene.width, scene.height)?;
    render_buffer(
        scene,
        width,
        height,
        Transform::new_scale(scale_x, scale_y),
        options,
    )
}

fn render_buffer(
    scene: &Scene,
    width: usize,
    height: usize,
    tr: Transform,
    options: &RenderOptions,
) -> Result<Buffer, Error> {
    scene.validate()?;
    let mut buffer = Buffer::new(width, height, PixelFormat::RENDER)?;
    if let Some(background) = options.background {
        buffer.fill(PremulColor::from(background).to_bytes());
    }
    Renderer::new(options.flatness).render_into(scene, tr, &mut buffer)?;
    buffer.encode(options.format);
    Ok(buffer)
}
