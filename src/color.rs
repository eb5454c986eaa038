use crate::{Error, Scalar, utils::clamp};
use std::{
    fmt,
    ops::{Add, Mul},
    str::FromStr,
};

/// Common interface to all color representations
pub trait Color: Copy {
    /// Blend other color on top of this color
    fn blend_over(self, other: Self) -> Self;

    /// Scale opacity of the color by `alpha`
    fn with_alpha(self, alpha: Scalar) -> Self;

    /// Convert color to sRGBA list
    fn to_rgba(self) -> [u8; 4];

    /// Linear interpolation between self and other colors.
    fn lerp(self, other: Self, t: Scalar) -> Self;
}

/// Convert color channel from `[0, 1]` into a byte, rounding to nearest
#[inline]
pub fn quantize(value: Scalar) -> u8 {
    (clamp(value, 0.0, 1.0) * 255.0 + 0.5).floor() as u8
}

/// ABGR color packed as u32 value (most of the platforms are little-endian)
///
/// Channels are sRGB encoded and are not multiplied by alpha.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct RGBA(u32);

impl RGBA {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self(((a as u32) << 24) | ((b as u32) << 16) | ((g as u32) << 8) | (r as u32))
    }

    pub const fn alpha(self) -> u8 {
        ((self.0 >> 24) & 0xff) as u8
    }

    pub const fn blue(self) -> u8 {
        ((self.0 >> 16) & 0xff) as u8
    }

    pub const fn green(self) -> u8 {
        ((self.0 >> 8) & 0xff) as u8
    }

    pub const fn red(self) -> u8 {
        (self.0 & 0xff) as u8
    }
}

impl Color for RGBA {
    fn to_rgba(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    fn blend_over(self, other: Self) -> Self {
        PremulColor::from(self)
            .blend_over(PremulColor::from(other))
            .into()
    }

    fn with_alpha(self, alpha: Scalar) -> Self {
        PremulColor::from(self).with_alpha(alpha).into()
    }

    fn lerp(self, other: Self, t: Scalar) -> Self {
        PremulColor::from(self)
            .lerp(PremulColor::from(other), t)
            .into()
    }
}

impl From<PremulColor> for RGBA {
    fn from(color: PremulColor) -> Self {
        let PremulColor([r, g, b, a]) = color.unmultiply();
        RGBA::new(quantize(r), quantize(g), quantize(b), quantize(a))
    }
}

impl fmt::Debug for RGBA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RGBA({})", self)
    }
}

impl fmt::Display for RGBA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.to_rgba();
        write!(f, "#{:02x}{:02x}{:02x}", r, g, b)?;
        if a != 255 {
            write!(f, "{:02x}", a)?;
        }
        Ok(())
    }
}

impl FromStr for RGBA {
    type Err = Error;

    fn from_str(color: &str) -> Result<Self, Self::Err> {
        let color = color.trim();
        let bytes = color.as_bytes();
        if !(bytes.first() == Some(&b'#') && (bytes.len() == 7 || bytes.len() == 9)) {
            return Err(Error::Parse {
                reason: format!("color expected to be #RRGGBB(AA): {:?}", color),
                offset: 0,
            });
        }
        let digit = |offset: usize| match bytes[offset] {
            byte @ b'A'..=b'F' => Ok(byte - b'A' + 10),
            byte @ b'a'..=b'f' => Ok(byte - b'a' + 10),
            byte @ b'0'..=b'9' => Ok(byte - b'0'),
            _ => Err(Error::Parse {
                reason: "hexadecimal digit expected".to_owned(),
                offset,
            }),
        };
        let channel = |index: usize| -> Result<u8, Error> {
            let offset = 1 + 2 * index;
            if offset + 1 >= bytes.len() {
                return Ok(255);
            }
            Ok((digit(offset)? << 4) | digit(offset + 1)?)
        };
        Ok(RGBA::new(channel(0)?, channel(1)?, channel(2)?, channel(3)?))
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for RGBA {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for RGBA {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let color = String::deserialize(deserializer)?;
        RGBA::from_str(&color).map_err(serde::de::Error::custom)
    }
}

/// Alpha premultiplied RGBA color with sRGB encoded channels in `[0, 1]`
///
/// This is the representation used for compositing, "over" operator is applied
/// directly to the encoded values.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PremulColor(pub [Scalar; 4]);

impl PremulColor {
    pub const TRANSPARENT: PremulColor = PremulColor([0.0; 4]);

    #[inline]
    pub fn new(r: Scalar, g: Scalar, b: Scalar, a: Scalar) -> Self {
        Self([r, g, b, a])
    }

    #[inline]
    pub fn red(self) -> Scalar {
        self.0[0]
    }

    #[inline]
    pub fn green(self) -> Scalar {
        self.0[1]
    }

    #[inline]
    pub fn blue(self) -> Scalar {
        self.0[2]
    }

    #[inline]
    pub fn alpha(self) -> Scalar {
        self.0[3]
    }

    /// Create from premultiplied RGBA bytes
    #[inline]
    pub fn from_bytes([r, g, b, a]: [u8; 4]) -> Self {
        const SCALE: Scalar = 1.0 / 255.0;
        Self([
            r as Scalar * SCALE,
            g as Scalar * SCALE,
            b as Scalar * SCALE,
            a as Scalar * SCALE,
        ])
    }

    /// Quantize into premultiplied RGBA bytes
    #[inline]
    pub fn to_bytes(self) -> [u8; 4] {
        let Self([r, g, b, a]) = self;
        [quantize(r), quantize(g), quantize(b), quantize(a)]
    }

    /// Color is by default pre-multiplied by alpha, this function removes
    /// pre-multiplication.
    pub fn unmultiply(self) -> Self {
        let Self([r, g, b, a]) = self;
        if a <= 1e-9 {
            Self::TRANSPARENT
        } else {
            Self([r / a, g / a, b / a, a])
        }
    }

    /// Convert color channels from sRGB encoding into linear light
    pub(crate) fn into_linear(self) -> Self {
        self.map_unmultiplied(srgb_to_linear)
    }

    /// Convert color channels from linear light into sRGB encoding
    pub(crate) fn into_srgb(self) -> Self {
        self.map_unmultiplied(linear_to_srgb)
    }

    fn map_unmultiplied(self, f: impl Fn(Scalar) -> Scalar) -> Self {
        let Self([r, g, b, a]) = self.unmultiply();
        Self([f(r) * a, f(g) * a, f(b) * a, a])
    }
}

impl Color for PremulColor {
    fn to_rgba(self) -> [u8; 4] {
        RGBA::from(self).to_rgba()
    }

    #[inline]
    fn blend_over(self, other: Self) -> Self {
        other + self * (1.0 - other.alpha())
    }

    #[inline]
    fn with_alpha(self, alpha: Scalar) -> Self {
        self * alpha
    }

    #[inline]
    fn lerp(self, other: Self, t: Scalar) -> Self {
        other * t + self * (1.0 - t)
    }
}

impl Add<Self> for PremulColor {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self::Output {
        let Self([r0, g0, b0, a0]) = self;
        let Self([r1, g1, b1, a1]) = other;
        Self([r0 + r1, g0 + g1, b0 + b1, a0 + a1])
    }
}

impl Mul<Scalar> for PremulColor {
    type Output = Self;

    #[inline]
    fn mul(self, scale: Scalar) -> Self::Output {
        let Self([r, g, b, a]) = self;
        Self([r * scale, g * scale, b * scale, a * scale])
    }
}

impl From<RGBA> for PremulColor {
    fn from(color: RGBA) -> Self {
        let [r, g, b, a] = color.to_rgba();
        let a = a as Scalar / 255.0;
        Self([
            r as Scalar / 255.0 * a,
            g as Scalar / 255.0 * a,
            b as Scalar / 255.0 * a,
            a,
        ])
    }
}

/// Convert Linear RGB color component into a SRGB color component.
#[inline]
pub fn linear_to_srgb(value: Scalar) -> Scalar {
    if value <= 0.0031308 {
        value * 12.92
    } else {
        1.055 * value.powf(1.0 / 2.4) - 0.055
    }
}

/// Convert SRGB color component into a Linear RGB color component.
#[inline]
pub fn srgb_to_linear(value: Scalar) -> Scalar {
    if value <= 0.04045 {
        value / 12.92
    } else {
        ((value + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_approx_eq;

    #[test]
    fn test_color_u8() {
        let c = RGBA::new(1, 2, 3, 4);
        assert_eq!([1, 2, 3, 4], c.to_rgba());
        assert_eq!(1, c.red());
        assert_eq!(2, c.green());
        assert_eq!(3, c.blue());
        assert_eq!(4, c.alpha());
    }

    #[test]
    fn test_color_u8_parse() -> Result<(), Error> {
        assert_eq!(RGBA::new(1, 2, 3, 4), "#01020304".parse::<RGBA>()?);
        assert_eq!(RGBA::new(170, 187, 204, 255), "#aabbcc".parse::<RGBA>()?);
        assert_eq!(RGBA::new(0, 0, 0, 255), "#000000".parse::<RGBA>()?);
        assert!(matches!(
            "#00zz00".parse::<RGBA>(),
            Err(Error::Parse { offset: 3, .. })
        ));
        assert!("red".parse::<RGBA>().is_err());
        Ok(())
    }

    #[test]
    fn test_conversion() -> Result<(), Error> {
        let c: RGBA = "#ff804010".parse()?;
        let p: PremulColor = c.into();
        let r: RGBA = p.into();
        assert_eq!(c, r);

        let p = PremulColor::from(RGBA::new(255, 0, 0, 128));
        assert_eq!(p.to_bytes(), [128, 0, 0, 128]);
        assert_eq!(p.to_rgba(), [255, 0, 0, 128]);
        Ok(())
    }

    #[test]
    fn test_blend_over() {
        let dst = PremulColor::from(RGBA::new(0, 0, 255, 255));
        let src = PremulColor::from(RGBA::new(255, 0, 0, 255)).with_alpha(0.5);
        assert_eq!(dst.blend_over(src).to_bytes(), [128, 0, 128, 255]);

        let transparent = PremulColor::TRANSPARENT;
        assert_eq!(dst.blend_over(transparent), dst);
        assert_eq!(quantize(0.5), 128);
        assert_eq!(quantize(-1.0), 0);
        assert_eq!(quantize(Scalar::INFINITY), 255);
    }

    #[test]
    fn test_lin_and_srgb() {
        for i in 0..255 {
            let v = i as Scalar / 255.0;
            assert_approx_eq!(v, linear_to_srgb(srgb_to_linear(v)), 1e-9);
            assert_approx_eq!(v, srgb_to_linear(linear_to_srgb(v)), 1e-9);
        }
        let c = PremulColor::new(0.25, 0.5, 0.0, 0.5);
        let r = c.into_linear().into_srgb();
        assert_approx_eq!(r.red(), 0.25, 1e-9);
        assert_approx_eq!(r.green(), 0.5, 1e-9);
        assert_approx_eq!(r.alpha(), 0.5, 1e-9);
    }

    #[test]
    fn test_display_parse() -> Result<(), Error> {
        let c: RGBA = "#01020304".parse()?;
        assert_eq!(c, RGBA::new(1, 2, 3, 4));
        assert_eq!(c.to_string(), "#01020304");

        let c: RGBA = "#010203".parse()?;
        assert_eq!(c, RGBA::new(1, 2, 3, 255));
        assert_eq!(c.to_string(), "#010203");

        Ok(())
    }
}
