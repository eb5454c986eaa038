//! Row addressed images: coverage masks and 8-bit RGBA/BGRA pixel buffers
use crate::{
    Error, Scalar,
    utils::{buffer_len, try_vec},
};

/// Size of a single pixel in bytes for all byte buffers
pub const PIXEL_SIZE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    /// Width of the image
    pub width: usize,
    /// Height of the image
    pub height: usize,
    /// How many elements we need to skip to get to the next row.
    pub row_stride: usize,
    /// How many elements we need to skip to get to the next column.
    pub col_stride: usize,
}

impl Shape {
    #[inline]
    pub fn offset(&self, row: usize, col: usize) -> usize {
        row * self.row_stride + col * self.col_stride
    }

    #[inline]
    pub fn nth(&self, n: usize) -> Option<(usize, usize)> {
        if self.width == 0 {
            return None;
        }
        let row = n / self.width;
        let col = n - row * self.width;
        (row < self.height).then_some((row, col))
    }
}

/// Image which can be accessed one row at a time
pub trait Image {
    type Pixel: Copy;

    fn shape(&self) -> Shape;

    /// Pixels of the row, `None` if row is out of bounds
    fn row(&self, row: usize) -> Option<&[Self::Pixel]>;

    fn width(&self) -> usize {
        self.shape().width
    }

    fn height(&self) -> usize {
        self.shape().height
    }

    fn get(&self, row: usize, col: usize) -> Option<Self::Pixel> {
        self.row(row)?.get(col).copied()
    }

    /// Iterate over all pixels in row major order
    fn iter(&self) -> ImageIter<'_, Self>
    where
        Self: Sized,
    {
        ImageIter {
            index: 0,
            image: self,
        }
    }
}

pub struct ImageIter<'a, I> {
    index: usize,
    image: &'a I,
}

impl<'a, I: Image> ImageIter<'a, I> {
    pub fn position(&self) -> (usize, usize) {
        self.image
            .shape()
            .nth(self.index)
            .unwrap_or((self.image.height(), 0))
    }
}

impl<'a, I: Image> Iterator for ImageIter<'a, I> {
    type Item = I::Pixel;

    fn next(&mut self) -> Option<Self::Item> {
        let (row, col) = self.image.shape().nth(self.index)?;
        self.index += 1;
        self.image.get(row, col)
    }
}

pub trait ImageMut: Image {
    fn row_mut(&mut self, row: usize) -> Option<&mut [Self::Pixel]>;

    fn get_mut(&mut self, row: usize, col: usize) -> Option<&mut Self::Pixel> {
        self.row_mut(row)?.get_mut(col)
    }

    /// Set all pixels to the provided value, bytes between rows are not touched
    fn fill(&mut self, value: Self::Pixel) {
        for row in 0..self.height() {
            if let Some(pixels) = self.row_mut(row) {
                pixels.fill(value);
            }
        }
    }
}

impl<I: Image + ?Sized> Image for &I {
    type Pixel = I::Pixel;

    fn shape(&self) -> Shape {
        (**self).shape()
    }

    fn row(&self, row: usize) -> Option<&[Self::Pixel]> {
        (**self).row(row)
    }
}

impl<I: Image + ?Sized> Image for &mut I {
    type Pixel = I::Pixel;

    fn shape(&self) -> Shape {
        (**self).shape()
    }

    fn row(&self, row: usize) -> Option<&[Self::Pixel]> {
        (**self).row(row)
    }
}

impl<I: ImageMut + ?Sized> ImageMut for &mut I {
    fn row_mut(&mut self, row: usize) -> Option<&mut [Self::Pixel]> {
        (**self).row_mut(row)
    }
}

// -----------------------------------------------------------------------------
// Mask
// -----------------------------------------------------------------------------

/// Coverage mask with a single `[0, 1]` value per pixel
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    width: usize,
    height: usize,
    data: Vec<Scalar>,
}

impl Mask {
    /// Allocate zero filled mask
    pub fn new(width: usize, height: usize) -> Result<Self, Error> {
        let len = buffer_len(height, width, width)?;
        Ok(Self {
            width,
            height,
            data: try_vec(len, 0.0)?,
        })
    }

    pub fn data(&self) -> &[Scalar] {
        &self.data
    }

    /// Total coverage of all pixels
    pub fn sum(&self) -> Scalar {
        self.data.iter().sum()
    }

    pub fn clear(&mut self) {
        self.data.fill(0.0);
    }
}

impl Image for Mask {
    type Pixel = Scalar;

    fn shape(&self) -> Shape {
        Shape {
            width: self.width,
            height: self.height,
            row_stride: self.width,
            col_stride: 1,
        }
    }

    fn row(&self, row: usize) -> Option<&[Scalar]> {
        if row >= self.height {
            return None;
        }
        let start = row * self.width;
        self.data.get(start..start + self.width)
    }
}

impl ImageMut for Mask {
    fn row_mut(&mut self, row: usize) -> Option<&mut [Scalar]> {
        if row >= self.height {
            return None;
        }
        let start = row * self.width;
        self.data.get_mut(start..start + self.width)
    }
}

// -----------------------------------------------------------------------------
// Byte buffers
// -----------------------------------------------------------------------------

/// Order of the color channels inside of a pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChannelOrder {
    #[default]
    Rgba,
    Bgra,
}

/// Whether color channels are multiplied by alpha
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AlphaMode {
    #[default]
    Straight,
    Premultiplied,
}

/// Memory layout of the pixels stored in a byte buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PixelFormat {
    pub order: ChannelOrder,
    pub alpha: AlphaMode,
}

impl PixelFormat {
    /// Format used while compositing
    pub const RENDER: PixelFormat = PixelFormat {
        order: ChannelOrder::Rgba,
        alpha: AlphaMode::Premultiplied,
    };

    /// Convert pixel stored in this format into the `target` format
    pub fn convert(&self, pixel: [u8; 4], target: PixelFormat) -> [u8; 4] {
        if *self == target {
            return pixel;
        }
        let rgba = self.order.swap(pixel);
        let rgba = match (self.alpha, target.alpha) {
            (AlphaMode::Straight, AlphaMode::Premultiplied) => premultiply(rgba),
            (AlphaMode::Premultiplied, AlphaMode::Straight) => unpremultiply(rgba),
            _ => rgba,
        };
        target.order.swap(rgba)
    }

    /// Convert pixel from the render format (premultiplied RGBA) into this format
    pub fn encode(&self, pixel: [u8; 4]) -> [u8; 4] {
        Self::RENDER.convert(pixel, *self)
    }

    /// Convert pixel in this format into the render format (premultiplied RGBA)
    pub fn decode(&self, pixel: [u8; 4]) -> [u8; 4] {
        self.convert(pixel, Self::RENDER)
    }

    /// Convert pixel in this format to straight RGBA
    pub fn to_straight_rgba(&self, pixel: [u8; 4]) -> [u8; 4] {
        self.convert(pixel, PixelFormat::default())
    }
}

impl ChannelOrder {
    /// Swap channels between RGBA and this order, the conversion is its own inverse
    fn swap(self, [c0, c1, c2, c3]: [u8; 4]) -> [u8; 4] {
        match self {
            ChannelOrder::Rgba => [c0, c1, c2, c3],
            ChannelOrder::Bgra => [c2, c1, c0, c3],
        }
    }
}

/// Multiply color channels by alpha, rounding to nearest
pub fn premultiply([r, g, b, a]: [u8; 4]) -> [u8; 4] {
    let mul = |c: u8| ((c as u32 * a as u32 + 127) / 255) as u8;
    [mul(r), mul(g), mul(b), a]
}

/// Undo alpha multiplication of the color channels, rounding to nearest
pub fn unpremultiply([r, g, b, a]: [u8; 4]) -> [u8; 4] {
    if a == 0 {
        return [0, 0, 0, 0];
    }
    if a == 255 {
        return [r, g, b, a];
    }
    let div = |c: u8| ((c as u32 * 255 + a as u32 / 2) / a as u32).min(255) as u8;
    [div(r), div(g), div(b), a]
}

/// Validate byte buffer layout
fn check_layout(data_len: usize, width: usize, height: usize, stride: usize) -> Result<(), Error> {
    let row_len = width.checked_mul(PIXEL_SIZE).ok_or_else(|| Error::Resource {
        reason: format!("row size overflow: width {}", width),
    })?;
    if stride < row_len {
        return Err(Error::input(format!(
            "stride {} is smaller than row size {}",
            stride, row_len
        )));
    }
    let len = buffer_len(height, stride, row_len)?;
    if data_len < len {
        return Err(Error::input(format!(
            "buffer of {} bytes is too small for {}x{} image with stride {}",
            data_len, width, height, stride
        )));
    }
    Ok(())
}

/// Pixels of a row inside a stride addressed byte buffer
fn row_pixels(data: &[u8], width: usize, height: usize, stride: usize, row: usize) -> Option<&[[u8; 4]]> {
    if row >= height {
        return None;
    }
    let start = row * stride;
    let bytes = data.get(start..start + width * PIXEL_SIZE)?;
    Some(bytemuck::cast_slice(bytes))
}

fn row_pixels_mut(
    data: &mut [u8],
    width: usize,
    height: usize,
    stride: usize,
    row: usize,
) -> Option<&mut [[u8; 4]]> {
    if row >= height {
        return None;
    }
    let start = row * stride;
    let bytes = data.get_mut(start..start + width * PIXEL_SIZE)?;
    Some(bytemuck::cast_slice_mut(bytes))
}

/// Owned 8-bit per channel pixel buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buffer {
    pub data: Vec<u8>,
    pub width: usize,
    pub height: usize,
    /// Distance between the starts of two consecutive rows in bytes
    pub stride: usize,
    pub format: PixelFormat,
}

impl Buffer {
    /// Allocate transparent buffer with tightly packed rows
    pub fn new(width: usize, height: usize, format: PixelFormat) -> Result<Self, Error> {
        let stride = width.checked_mul(PIXEL_SIZE).ok_or_else(|| Error::Resource {
            reason: format!("row size overflow: width {}", width),
        })?;
        let len = buffer_len(height, stride, stride)?;
        Ok(Self {
            data: try_vec(len, 0)?,
            width,
            height,
            stride,
            format,
        })
    }

    /// Wrap existing bytes, layout is validated
    pub fn from_data(
        data: Vec<u8>,
        width: usize,
        height: usize,
        stride: usize,
        format: PixelFormat,
    ) -> Result<Self, Error> {
        check_layout(data.len(), width, height, stride)?;
        Ok(Self {
            data,
            width,
            height,
            stride,
            format,
        })
    }

    /// Mutable view of the buffer
    pub fn as_mut(&mut self) -> BufferMut<'_> {
        BufferMut {
            data: &mut self.data,
            width: self.width,
            height: self.height,
            stride: self.stride,
            format: self.format,
        }
    }

    /// Convert all pixels from the current format into `format`
    pub fn encode(&mut self, format: PixelFormat) {
        self.as_mut().encode(format);
        self.format = format;
    }

    /// Pixels as straight alpha RGBA rows without padding
    pub fn to_straight_rgba(&self) -> Vec<u8> {
        let mut output = Vec::with_capacity(self.width * self.height * PIXEL_SIZE);
        for row in 0..self.height {
            for pixel in self.row(row).unwrap_or_default() {
                output.extend_from_slice(&self.format.to_straight_rgba(*pixel));
            }
        }
        output
    }

    /// Write buffer in PNG format, always encoded as straight alpha RGBA
    #[cfg(feature = "png")]
    pub fn write_png(&self, out: impl std::io::Write) -> Result<(), Error> {
        let encode_error = |error: png::EncodingError| Error::Encode {
            reason: error.to_string(),
        };
        let width = u32::try_from(self.width).map_err(|_| Error::Encode {
            reason: format!("width {} is too large for png", self.width),
        })?;
        let height = u32::try_from(self.height).map_err(|_| Error::Encode {
            reason: format!("height {} is too large for png", self.height),
        })?;
        let mut encoder = png::Encoder::new(out, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().map_err(encode_error)?;
        writer
            .write_image_data(&self.to_straight_rgba())
            .map_err(encode_error)?;
        writer.finish().map_err(encode_error)?;
        Ok(())
    }
}

impl Image for Buffer {
    type Pixel = [u8; 4];

    fn shape(&self) -> Shape {
        Shape {
            width: self.width,
            height: self.height,
            row_stride: self.stride,
            col_stride: PIXEL_SIZE,
        }
    }

    fn row(&self, row: usize) -> Option<&[[u8; 4]]> {
        row_pixels(&self.data, self.width, self.height, self.stride, row)
    }
}

impl ImageMut for Buffer {
    fn row_mut(&mut self, row: usize) -> Option<&mut [[u8; 4]]> {
        row_pixels_mut(&mut self.data, self.width, self.height, self.stride, row)
    }
}

/// Pixel buffer over caller owned bytes with an explicit row stride
#[derive(Debug)]
pub struct BufferMut<'a> {
    data: &'a mut [u8],
    width: usize,
    height: usize,
    stride: usize,
    format: PixelFormat,
}

impl<'a> BufferMut<'a> {
    /// Wrap caller bytes, fails if `stride < width * 4` or data is too short
    pub fn new(
        data: &'a mut [u8],
        width: usize,
        height: usize,
        stride: usize,
        format: PixelFormat,
    ) -> Result<Self, Error> {
        check_layout(data.len(), width, height, stride)?;
        Ok(Self {
            data,
            width,
            height,
            stride,
            format,
        })
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Convert all pixels from the current format into `format`
    pub fn encode(&mut self, format: PixelFormat) {
        let current = self.format;
        if current != format {
            for row in 0..self.height {
                if let Some(pixels) = self.row_mut(row) {
                    for pixel in pixels {
                        *pixel = current.convert(*pixel, format);
                    }
                }
            }
        }
        self.format = format;
    }
}

/// Pixel buffer which knows the format of its pixels
pub trait PixelBuffer: ImageMut<Pixel = [u8; 4]> {
    fn format(&self) -> PixelFormat;
}

impl PixelBuffer for Buffer {
    fn format(&self) -> PixelFormat {
        self.format
    }
}

impl PixelBuffer for BufferMut<'_> {
    fn format(&self) -> PixelFormat {
        self.format
    }
}

impl<I: PixelBuffer + ?Sized> PixelBuffer for &mut I {
    fn format(&self) -> PixelFormat {
        (**self).format()
    }
}

impl Image for BufferMut<'_> {
    type Pixel = [u8; 4];

    fn shape(&self) -> Shape {
        Shape {
            width: self.width,
            height: self.height,
            row_stride: self.stride,
            col_stride: PIXEL_SIZE,
        }
    }

    fn row(&self, row: usize) -> Option<&[[u8; 4]]> {
        row_pixels(self.data, self.width, self.height, self.stride, row)
    }
}

impl ImageMut for BufferMut<'_> {
    fn row_mut(&mut self, row: usize) -> Option<&mut [[u8; 4]]> {
        row_pixels_mut(self.data, self.width, self.height, self.stride, row)
    }
}
