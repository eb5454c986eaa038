use crate::{
    BBox, Cubic, Curve, EdgeList, Error, FillRule, Image, ImageMut, Line, Mask, Point, Rasterizer,
    Scalar, Segment, Transform, geometry::scalar_fmt,
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Flatness of 0.1px gives a good accuracy tradeoff
pub const DEFAULT_FLATNESS: Scalar = 0.1;

/// Shape used at the corners of stroked paths
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LineJoin {
    /// Sharp corner, falls back to bevel if miter length exceeds `limit * width / 2`
    Miter(Scalar),
    Bevel,
    Round,
}

impl Default for LineJoin {
    fn default() -> Self {
        Self::Miter(4.0)
    }
}

/// Shape used at the ends of open stroked sub-paths
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LineCap {
    #[default]
    Butt,
    Square,
    Round,
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StrokeStyle {
    pub width: Scalar,
    pub line_join: LineJoin,
    pub line_cap: LineCap,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            width: 1.0,
            line_join: LineJoin::default(),
            line_cap: LineCap::default(),
        }
    }
}

/// Non-empty collections of segments where end of each segments conisides with the start of the next one.
#[derive(Clone, PartialEq)]
pub struct SubPath {
    /// List of segments representing SubPath
    segments: Vec<Segment>,
    /// Whether SubPath contains an implicit line segment connecting start and the end of it.
    closed: bool,
}

impl fmt::Debug for SubPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in self.segments.iter() {
            writeln!(f, "{:?}", segment)?;
        }
        if self.closed {
            writeln!(f, "Close")?;
        } else {
            writeln!(f, "End")?
        }
        Ok(())
    }
}

impl SubPath {
    pub fn new(segments: Vec<Segment>, closed: bool) -> Option<Self> {
        if segments.is_empty() {
            None
        } else {
            Some(Self { segments, closed })
        }
    }

    pub fn closed(&self) -> bool {
        self.closed
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn start(&self) -> Point {
        self.segments.first().map_or_else(Point::default, Segment::start)
    }

    pub fn end(&self) -> Point {
        self.segments.last().map_or_else(Point::default, Segment::end)
    }

    /// Flatten sub-path into points transformed by `tr`, start point is not included
    pub fn flatten(&self, tr: Transform, flatness: Scalar) -> impl Iterator<Item = Point> + '_ {
        self.segments
            .iter()
            .flat_map(move |segment| segment.flatten(tr, flatness))
    }

    /// Sub-path as a polyline in local coordinates with duplicated points removed
    pub fn polyline(&self, flatness: Scalar) -> Vec<Point> {
        let mut points = vec![self.start()];
        for point in self.flatten(Transform::identity(), flatness) {
            if points.last().is_none_or(|last| !last.is_close_to(point)) {
                points.push(point);
            }
        }
        points
    }

    /// Extend provided `init` bounding box with the bounding box of the sub-path
    pub fn bbox(&self, init: Option<BBox>, tr: Transform) -> Option<BBox> {
        self.segments
            .iter()
            .fold(init, |bbox, seg| Some(seg.transform(tr).bbox(bbox)))
    }

    pub fn is_finite(&self) -> bool {
        self.segments.iter().all(Segment::is_finite)
    }
}

/// Collection of the SubPath treated as a signle unit
#[derive(Clone, PartialEq, Default)]
pub struct Path {
    subpaths: Vec<SubPath>,
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.subpaths.is_empty() {
            write!(f, "Empty")?;
        } else {
            for subpath in self.subpaths.iter() {
                subpath.fmt(f)?
            }
        }
        Ok(())
    }
}

impl Path {
    /// Create path from the list of subpaths
    pub fn new(subpaths: Vec<SubPath>) -> Self {
        Self { subpaths }
    }

    pub fn empty() -> Self {
        Self {
            subpaths: Default::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.subpaths.is_empty()
    }

    pub fn subpaths(&self) -> &[SubPath] {
        &self.subpaths
    }

    /// Convenience method to create `PathBuilder`
    pub fn builder() -> PathBuilder {
        PathBuilder::new()
    }

    pub fn segments_count(&self) -> usize {
        self.subpaths
            .iter()
            .fold(0usize, |acc, subpath| acc + subpath.segments().len())
    }

    /// Convert path to an iterator over flattened sub-paths, each starting with its first point
    pub fn flatten(
        &self,
        tr: Transform,
        flatness: Scalar,
    ) -> impl Iterator<Item = impl Iterator<Item = Point> + '_> + '_ {
        self.subpaths.iter().map(move |subpath| {
            std::iter::once(tr.apply(subpath.start())).chain(subpath.flatten(tr, flatness))
        })
    }

    /// Bounding box of the path after provided transformation is applied.
    pub fn bbox(&self, tr: Transform) -> Option<BBox> {
        self.subpaths
            .iter()
            .fold(None, |bbox, subpath| subpath.bbox(bbox, tr))
    }

    /// All coordinates are finite
    pub fn is_finite(&self) -> bool {
        self.subpaths.iter().all(SubPath::is_finite)
    }

    /// Rasterize mask for the path into a provided mask.
    ///
    /// Everything that is outside of the mask will be cropped. Coverage is added to
    /// the existing values of the mask.
    pub fn rasterize_to(
        &self,
        tr: Transform,
        fill_rule: FillRule,
        mask: &mut Mask,
    ) -> Result<(), Error> {
        let mut edges = EdgeList::new();
        edges.extend_path(self, tr, DEFAULT_FLATNESS);
        let (width, height) = (mask.width(), mask.height());
        Rasterizer::new().rasterize(&edges, fill_rule, width, height, |row, col, coverage| {
            if let Some(pixels) = mask.row_mut(row) {
                for (pixel, value) in pixels.iter_mut().skip(col).zip(coverage) {
                    *pixel += value;
                }
            }
        })
    }

    /// Rasterize mask for the path into an allocated mask.
    ///
    /// Mask of required size will be allocated, with one pixel border around
    /// the path bounding box.
    pub fn mask(&self, tr: Transform, fill_rule: FillRule) -> Result<Mask, Error> {
        let mut edges = EdgeList::new();
        edges.extend_path(self, tr, DEFAULT_FLATNESS);
        let Some(bbox) = edges.bbox() else {
            return Mask::new(0, 0);
        };
        // one pixel border to account for anti-aliasing
        let width = (bbox.width() + 2.0).ceil() as usize;
        let height = (bbox.height() + 2.0).ceil() as usize;
        let mut mask = Mask::new(width, height)?;
        let shift = Transform::new_translate(1.0 - bbox.x(), 1.0 - bbox.y());
        self.rasterize_to(shift * tr, fill_rule, &mut mask)?;
        Ok(mask)
    }

    /// Load path from SVG path representation
    pub fn from_svg_path(text: &str) -> Result<Self, Error> {
        text.parse()
    }
}

impl fmt::Display for Path {
    /// Format path in SVG path format
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let point = |f: &mut fmt::Formatter<'_>, point: Point| {
            scalar_fmt(f, point.x())?;
            write!(f, ",")?;
            scalar_fmt(f, point.y())
        };
        for (index, subpath) in self.subpaths.iter().enumerate() {
            if index != 0 {
                write!(f, " ")?;
            }
            write!(f, "M")?;
            point(f, subpath.start())?;
            let mut segment_type: Option<u8> = None;
            for segment in subpath.segments().iter() {
                match segment {
                    Segment::Line(line) => {
                        if segment_type.replace(b'L') != Some(b'L') {
                            write!(f, " L")?;
                        } else {
                            write!(f, " ")?;
                        }
                        point(f, line.end())?;
                    }
                    Segment::Cubic(cubic) => {
                        let [_, p1, p2, p3] = cubic.points();
                        if segment_type.replace(b'C') != Some(b'C') {
                            write!(f, " C")?;
                        } else {
                            write!(f, " ")?;
                        }
                        point(f, p1)?;
                        write!(f, " ")?;
                        point(f, p2)?;
                        write!(f, " ")?;
                        point(f, p3)?;
                    }
                }
            }
            if subpath.closed() {
                write!(f, " Z")?;
            }
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = Error;

    fn from_str(text: &str) -> Result<Path, Self::Err> {
        let mut builder = PathBuilder::new();
        builder.append_svg_path(text)?;
        Ok(builder.build())
    }
}

#[cfg(feature = "serde")]
impl Serialize for Path {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for Path {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Path::from_str(&text).map_err(serde::de::Error::custom)
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a SubPath;
    type IntoIter = <&'a Vec<SubPath> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.subpaths.iter()
    }
}

impl Extend<SubPath> for Path {
    fn extend<T: IntoIterator<Item = SubPath>>(&mut self, iter: T) {
        self.subpaths.extend(iter)
    }
}

/// Path builder similar to Canvas/Cairo interface.
#[derive(Clone, Default)]
pub struct PathBuilder {
    position: Point,
    subpath: Vec<Segment>,
    subpaths: Vec<SubPath>,
    /// Control point of the last quadratic segment, used by smooth quadratic segments
    quad_control: Option<Point>,
    /// Reflected control point of the last cubic segment, used by smooth cubic segments
    cubic_smooth: Option<Point>,
}

impl PathBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build path
    pub fn build(&mut self) -> Path {
        let PathBuilder {
            subpath,
            mut subpaths,
            ..
        } = std::mem::take(self);
        subpaths.extend(SubPath::new(subpath, false));
        Path::new(subpaths)
    }

    /// Extend path from string, which is specified in the same format as SVGs path element.
    pub fn append_svg_path(&mut self, string: impl AsRef<[u8]>) -> Result<&mut Self, Error> {
        let parser = PathParser::new(string.as_ref());
        parser.parse(self)?;
        Ok(self)
    }

    /// Move current position, ending current subpath
    pub fn move_to(&mut self, p: impl Into<Point>) -> &mut Self {
        let subpath = std::mem::take(&mut self.subpath);
        self.subpaths.extend(SubPath::new(subpath, false));
        self.position = p.into();
        self.quad_control = None;
        self.cubic_smooth = None;
        self
    }

    /// Close current subpath
    pub fn close(&mut self) -> &mut Self {
        let subpath = std::mem::take(&mut self.subpath);
        if let Some(seg) = subpath.first() {
            self.position = seg.start();
        }
        self.subpaths.extend(SubPath::new(subpath, true));
        self.quad_control = None;
        self.cubic_smooth = None;
        self
    }

    /// Add line from the current position to the specified point
    ///
    /// Zero length line is only kept if it is the first segment of a sub-path, so
    /// `M x,y L x,y` still produces a dot when stroked with round or square caps.
    pub fn line_to(&mut self, p: impl Into<Point>) -> &mut Self {
        let p = p.into();
        if self.subpath.is_empty() || !self.position.is_close_to(p) {
            let line = Line::new(self.position, p);
            self.position = line.end();
            self.subpath.push(line.into());
        }
        self.quad_control = None;
        self.cubic_smooth = None;
        self
    }

    /// Add quadratic bezier curve, it is stored as an equivalent cubic
    pub fn quad_to(&mut self, p1: impl Into<Point>, p2: impl Into<Point>) -> &mut Self {
        let p1 = p1.into();
        let cubic = Cubic::from_quad(self.position, p1, p2);
        self.position = cubic.end();
        self.subpath.push(cubic.into());
        self.quad_control = Some(p1);
        self.cubic_smooth = None;
        self
    }

    /// Add smooth quadratic bezier curve
    pub fn quad_smooth_to(&mut self, p2: impl Into<Point>) -> &mut Self {
        let p1 = match self.quad_control {
            Some(control) => 2.0 * self.position - control,
            None => self.position,
        };
        self.quad_to(p1, p2)
    }

    /// Add cubic beizer curve
    pub fn cubic_to(
        &mut self,
        p1: impl Into<Point>,
        p2: impl Into<Point>,
        p3: impl Into<Point>,
    ) -> &mut Self {
        let cubic = Cubic::new(self.position, p1, p2, p3);
        self.position = cubic.end();
        self.subpath.push(cubic.into());
        self.quad_control = None;
        self.cubic_smooth = Some(cubic.smooth());
        self
    }

    /// Add smooth cubic bezier curve
    pub fn cubic_smooth_to(&mut self, p2: impl Into<Point>, p3: impl Into<Point>) -> &mut Self {
        let p1 = self.cubic_smooth.unwrap_or(self.position);
        self.cubic_to(p1, p2, p3)
    }

    /// Add circle with the center at current position and provided radius.
    ///
    /// Current position is not changed after invocation.
    pub fn circle(&mut self, radius: Scalar) -> &mut Self {
        let center = self.position();
        self.ellipse((radius, radius)).move_to(center)
    }

    /// Add ellipse with the center at current position and provided radii.
    pub fn ellipse(&mut self, radii: impl Into<Point>) -> &mut Self {
        // https://stackoverflow.com/questions/1734745/how-to-create-circle-with-b%C3%A9zier-curves
        // (4/3)*tan(pi/8) = 4*(sqrt(2)-1)/3 = 0.5522847498307935
        let Point([rx, ry]) = radii.into();
        let x_offset = Point::new(0.5522847498307935 * rx, 0.0);
        let y_offset = Point::new(0.0, 0.5522847498307935 * ry);
        let center = self.position();
        let p0 = center - Point::new(rx, 0.0);
        let p1 = center - Point::new(0.0, ry);
        let p2 = center + Point::new(rx, 0.0);
        let p3 = center + Point::new(0.0, ry);

        self.move_to(p0)
            .cubic_to(p0 - y_offset, p1 - x_offset, p1)
            .cubic_to(p1 + x_offset, p2 - y_offset, p2)
            .cubic_to(p2 + y_offset, p3 + x_offset, p3)
            .cubic_to(p3 - x_offset, p0 + y_offset, p0)
            .close()
    }

    /// Add box with rounded corners, with current position being low-x and low-y coordinate
    pub fn rbox(&mut self, size: impl Into<Point>, radii: impl Into<Point>) -> &mut Self {
        let Point([rx, ry]) = radii.into();
        let rx = rx.abs();
        let ry = ry.abs();

        let size = size.into();
        let lx = self.position.x();
        let ly = self.position.y();
        let hx = lx + size.x().abs();
        let hy = ly + size.y().abs();
        let rx = rx.min((hx - lx) / 2.0);
        let ry = ry.min((hy - ly) / 2.0);
        // corner is approximated by a quarter of an ellipse
        let kx = 0.5522847498307935 * rx;
        let ky = 0.5522847498307935 * ry;

        self.move_to((lx + rx, ly)).line_to((hx - rx, ly));
        if rx > 0.0 && ry > 0.0 {
            self.cubic_to((hx - rx + kx, ly), (hx, ly + ry - ky), (hx, ly + ry));
        }
        self.line_to((hx, hy - ry));
        if rx > 0.0 && ry > 0.0 {
            self.cubic_to((hx, hy - ry + ky), (hx - rx + kx, hy), (hx - rx, hy));
        }
        self.line_to((lx + rx, hy));
        if rx > 0.0 && ry > 0.0 {
            self.cubic_to((lx + rx - kx, hy), (lx, hy - ry + ky), (lx, hy - ry));
        }
        self.line_to((lx, ly + ry));
        if rx > 0.0 && ry > 0.0 {
            self.cubic_to((lx, ly + ry - ky), (lx + rx - kx, ly), (lx + rx, ly));
        }
        self.close().move_to(Point::new(lx, ly))
    }

    /// Current possition of the builder
    pub fn position(&self) -> Point {
        self.position
    }
}

#[derive(Debug)]
struct PathParser<'a> {
    // text containing unparsed path
    text: &'a [u8],
    // current offset in the text
    offset: usize,
    // previous command
    prev_cmd: Option<u8>,
    // current position from which next curve will start
    position: Point,
}

impl<'a> PathParser<'a> {
    fn new(text: &'a [u8]) -> PathParser<'a> {
        Self {
            text,
            offset: 0,
            prev_cmd: None,
            position: Point::new(0.0, 0.0),
        }
    }

    /// Error construction helper
    fn error<S: Into<String>>(&self, reason: S) -> Error {
        Error::Parse {
            offset: self.offset,
            reason: reason.into(),
        }
    }

    /// Byte at the current position
    fn current(&self) -> Result<u8, Error> {
        match self.text.get(self.offset) {
            Some(byte) => Ok(*byte),
            None => Err(self.error("unexpected end of input")),
        }
    }

    /// Advance current position by `count` bytes
    fn advance(&mut self, count: usize) {
        self.offset += count;
    }

    /// Check if end of file is reached
    fn is_eof(&self) -> bool {
        self.offset >= self.text.len()
    }

    /// Consume insignificant separators
    fn parse_separators(&mut self) {
        while let Some(b' ' | b'\t' | b'\r' | b'\n' | b',') = self.text.get(self.offset) {
            self.offset += 1;
        }
    }

    /// Consume digits under the cursor, returns true if at least one digit was found
    fn parse_digits(&mut self) -> bool {
        let mut found = false;
        while let Some(b'0'..=b'9') = self.text.get(self.offset) {
            self.advance(1);
            found = true;
        }
        found
    }

    /// Consume `+|-` sign
    fn parse_sign(&mut self) {
        if let Some(b'-' | b'+') = self.text.get(self.offset) {
            self.advance(1);
        }
    }

    /// Parse single scalar
    fn parse_scalar(&mut self) -> Result<Scalar, Error> {
        self.parse_separators();
        let start = self.offset;
        self.parse_sign();
        let whole = self.parse_digits();
        let fraction = match self.text.get(self.offset) {
            Some(b'.') => {
                self.advance(1);
                self.parse_digits()
            }
            _ => false,
        };
        if !whole && !fraction {
            return Err(self.error("failed to parse scalar"));
        }
        if let Some(b'e' | b'E') = self.text.get(self.offset) {
            self.advance(1);
            self.parse_sign();
            if !self.parse_digits() {
                return Err(self.error("failed to parse scalar exponent"));
            }
        }
        std::str::from_utf8(&self.text[start..self.offset])
            .ok()
            .and_then(|scalar| Scalar::from_str(scalar).ok())
            .ok_or_else(|| self.error("failed to parse scalar"))
    }

    /// Parse pair of scalars and convert it to a point
    fn parse_point(&mut self) -> Result<Point, Error> {
        let x = self.parse_scalar()?;
        let y = self.parse_scalar()?;
        let is_relative = match self.prev_cmd {
            Some(cmd) => cmd.is_ascii_lowercase(),
            None => false,
        };
        if is_relative {
            Ok(Point([x, y]) + self.position)
        } else {
            Ok(Point([x, y]))
        }
    }

    /// Parse SVG command
    fn parse_cmd(&mut self) -> Result<u8, Error> {
        let cmd = self.current()?;
        match cmd {
            b'M' | b'm' | b'L' | b'l' | b'V' | b'v' | b'H' | b'h' | b'C' | b'c' | b'S' | b's'
            | b'Q' | b'q' | b'T' | b't' | b'Z' | b'z' => {
                self.advance(1);
                self.prev_cmd = if cmd == b'm' {
                    Some(b'l')
                } else if cmd == b'M' {
                    Some(b'L')
                } else if cmd == b'Z' || cmd == b'z' {
                    None
                } else {
                    Some(cmd)
                };
                Ok(cmd)
            }
            b'A' | b'a' => Err(self.error("elliptic arc commands are not supported")),
            _ => match self.prev_cmd {
                Some(cmd) => Ok(cmd),
                None => Err(self.error("failed to parse path cmd")),
            },
        }
    }

    /// Parse SVG path and apply changes to the path builder.
    fn parse(mut self, builder: &mut PathBuilder) -> Result<(), Error> {
        loop {
            self.parse_separators();
            if self.is_eof() {
                break;
            }
            self.position = builder.position();
            let cmd = self.parse_cmd()?;
            match cmd {
                b'M' | b'm' => {
                    builder.move_to(self.parse_point()?);
                }
                b'L' | b'l' => {
                    builder.line_to(self.parse_point()?);
                }
                b'V' | b'v' => {
                    let y = self.parse_scalar()?;
                    let p0 = builder.position();
                    let p1 = if cmd == b'v' {
                        Point::new(p0.x(), p0.y() + y)
                    } else {
                        Point::new(p0.x(), y)
                    };
                    builder.line_to(p1);
                }
                b'H' | b'h' => {
                    let x = self.parse_scalar()?;
                    let p0 = builder.position();
                    let p1 = if cmd == b'h' {
                        Point::new(p0.x() + x, p0.y())
                    } else {
                        Point::new(x, p0.y())
                    };
                    builder.line_to(p1);
                }
                b'Q' | b'q' => {
                    builder.quad_to(self.parse_point()?, self.parse_point()?);
                }
                b'T' | b't' => {
                    builder.quad_smooth_to(self.parse_point()?);
                }
                b'C' | b'c' => {
                    builder.cubic_to(
                        self.parse_point()?,
                        self.parse_point()?,
                        self.parse_point()?,
                    );
                }
                b'S' | b's' => {
                    builder.cubic_smooth_to(self.parse_point()?, self.parse_point()?);
                }
                b'Z' | b'z' => {
                    builder.close();
                }
                _ => return Err(self.error("unexpected path cmd")),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{assert_approx_eq, PI};

    #[test]
    fn test_bbox() {
        let path: Path = SQUIRREL.parse().unwrap();
        let bbox = path.bbox(Transform::default()).unwrap();
        assert_approx_eq!(bbox.x(), 0.25);
        assert_approx_eq!(bbox.y(), 1.0);
        assert_approx_eq!(bbox.width(), 15.75);
        assert_approx_eq!(bbox.height(), 14.0);
    }

    const SQUIRREL: &str = r#"
    M12 1C9.79 1 8 2.31 8 3.92c0 1.94.5 3.03 0 6.08 0-4.5-2.77-6.34-4-6.34.05-.5-.48
    -.66-.48-.66s-.22.11-.3.34c-.27-.31-.56-.27-.56-.27l-.13.58S.7 4.29 .68 6.87c.2.33
    1.53.6 2.47.43.89.05.67.79.47.99C2.78 9.13 2 8 1 8S0 9 1 9s1 1 3 1c-3.09 1.2 0 4 0 4
    H3c-1 0-1 1-1 1h6c3 0 5-1 5-3.47 0-.85-.43-1.79 -1-2.53-1.11-1.46.23-2.68 1-2
    .77.68 3 1 3-2 0-2.21-1.79-4-4-4zM2.5 6 c-.28 0-.5-.22-.5-.5s.22-.5.5-.5.5.22.5.5
    -.22.5-.5.5z
    "#;

    #[test]
    fn test_path_parse() -> Result<(), Error> {
        let path: Path = SQUIRREL.parse()?;
        let reference = Path::builder()
            .move_to((12.0, 1.0))
            .cubic_to((9.79, 1.0), (8.0, 2.31), (8.0, 3.92))
            .cubic_to((8.0, 5.86), (8.5, 6.95), (8.0, 10.0))
            .cubic_to((8.0, 5.5), (5.23, 3.66), (4.0, 3.66))
            .cubic_to((4.05, 3.16), (3.52, 3.0), (3.52, 3.0))
            .cubic_to((3.52, 3.0), (3.3, 3.11), (3.22, 3.34))
            .cubic_to((2.95, 3.03), (2.66, 3.07), (2.66, 3.07))
            .line_to((2.53, 3.65))
            .cubic_to((2.53, 3.65), (0.7, 4.29), (0.68, 6.87))
            .cubic_to((0.88, 7.2), (2.21, 7.47), (3.15, 7.3))
            .cubic_to((4.04, 7.35), (3.82, 8.09), (3.62, 8.29))
            .cubic_to((2.78, 9.13), (2.0, 8.0), (1.0, 8.0))
            .cubic_to((0.0, 8.0), (0.0, 9.0), (1.0, 9.0))
            .cubic_to((2.0, 9.0), (2.0, 10.0), (4.0, 10.0))
            .cubic_to((0.91, 11.2), (4.0, 14.0), (4.0, 14.0))
            .line_to((3.0, 14.0))
            .cubic_to((2.0, 14.0), (2.0, 15.0), (2.0, 15.0))
            .line_to((8.0, 15.0))
            .cubic_to((11.0, 15.0), (13.0, 14.0), (13.0, 11.53))
            .cubic_to((13.0, 10.68), (12.57, 9.74), (12.0, 9.0))
            .cubic_to((10.89, 7.54), (12.23, 6.32), (13.0, 7.0))
            .cubic_to((13.77, 7.68), (16.0, 8.0), (16.0, 5.0))
            .cubic_to((16.0, 2.79), (14.21, 1.0), (12.0, 1.0))
            .close()
            .move_to((2.5, 6.0))
            .cubic_to((2.22, 6.0), (2.0, 5.78), (2.0, 5.5))
            .cubic_to((2.0, 5.22), (2.22, 5.0), (2.5, 5.0))
            .cubic_to((2.78, 5.0), (3.0, 5.22), (3.0, 5.5))
            .cubic_to((3.0, 5.78), (2.78, 6.0), (2.5, 6.0))
            .close()
            .build();
        assert_eq!(format!("{:?}", path), format!("{:?}", reference));

        let path: Path = " M0,0L1-1L1,0ZL0,1 L1,1Z ".parse()?;
        let reference = Path::new(vec![
            SubPath::new(
                vec![
                    Line::new((0.0, 0.0), (1.0, -1.0)).into(),
                    Line::new((1.0, -1.0), (1.0, 0.0)).into(),
                ],
                true,
            )
            .unwrap(),
            SubPath::new(
                vec![
                    Line::new((0.0, 0.0), (0.0, 1.0)).into(),
                    Line::new((0.0, 1.0), (1.0, 1.0)).into(),
                ],
                true,
            )
            .unwrap(),
        ]);
        assert_eq!(format!("{:?}", path), format!("{:?}", reference));
        Ok(())
    }

    #[test]
    fn test_path_parse_errors() {
        match "M0,0 L1,1 A1,1 0 0 1 2,2".parse::<Path>() {
            Err(Error::Parse { offset, .. }) => assert_eq!(offset, 10),
            result => panic!("arc must be rejected: {:?}", result),
        }
        assert!(matches!("M0,0 L1".parse::<Path>(), Err(Error::Parse { .. })));
        assert!(matches!("0,0 L1,1".parse::<Path>(), Err(Error::Parse { .. })));
        assert!(matches!("M0,0 L1e,1".parse::<Path>(), Err(Error::Parse { .. })));
        assert!("".parse::<Path>().unwrap().is_empty());
    }

    #[test]
    fn test_quad_smooth() -> Result<(), Error> {
        let path: Path = "M0,0 Q1,1 2,0 T4,0".parse()?;
        let reference = Path::builder()
            .move_to((0.0, 0.0))
            .quad_to((1.0, 1.0), (2.0, 0.0))
            .quad_to((3.0, -1.0), (4.0, 0.0))
            .build();
        assert_eq!(path, reference);
        Ok(())
    }

    #[test]
    fn test_display_parse() -> Result<(), Error> {
        let path: Path = SQUIRREL.parse()?;
        let text = path.to_string();
        let path_load: Path = text.parse()?;
        assert_eq!(format!("{:?}", path), format!("{:?}", path_load));

        let path: Path = "M0,0 L1,1 2,0 Z M3.5,1 C4,2 5,2 6,1".parse()?;
        assert_eq!(path.to_string(), "M0,0 L1,1 2,0 Z M3.5,1 C4,2 5,2 6,1");
        Ok(())
    }

    #[test]
    fn test_flatten() -> Result<(), Error> {
        let path: Path = SQUIRREL.parse()?;
        let tr = Transform::default()
            .rotate(PI / 3.0)
            .translate(-10.0, -20.0);
        let subpaths: Vec<Vec<Point>> = path
            .flatten(tr, DEFAULT_FLATNESS)
            .map(|points| points.collect())
            .collect();
        assert_eq!(subpaths.len(), 2);
        for (subpath, points) in path.subpaths().iter().zip(subpaths.iter()) {
            assert!(points[0].is_close_to(tr.apply(subpath.start())));
            let last = points.last().unwrap();
            assert_approx_eq!(last.dist(tr.apply(subpath.end())), 0.0, 1e-9);
        }
        Ok(())
    }

    #[test]
    fn test_zero_length_subpath() -> Result<(), Error> {
        let path: Path = "M1,1 L1,1 M2,2 Z".parse()?;
        assert_eq!(path.subpaths().len(), 1);
        assert_eq!(path.subpaths()[0].polyline(DEFAULT_FLATNESS).len(), 1);
        Ok(())
    }

    #[test]
    fn test_rbox() {
        let path = Path::builder()
            .move_to((1.0, 2.0))
            .rbox((10.0, 6.0), (2.0, 2.0))
            .build();
        let bbox = path.bbox(Transform::identity()).unwrap();
        assert_approx_eq!(bbox.x(), 1.0);
        assert_approx_eq!(bbox.y(), 2.0);
        assert_approx_eq!(bbox.width(), 10.0);
        assert_approx_eq!(bbox.height(), 6.0);
        assert_eq!(path.segments_count(), 8);
    }

    #[test]
    fn test_mask() -> Result<(), Error> {
        let path: Path = "M0,0 h4 v2 h-4 Z".parse()?;
        let mask = path.mask(Transform::new_translate(10.0, 10.0), FillRule::NonZero)?;
        assert_eq!((mask.width(), mask.height()), (6, 4));
        assert_approx_eq!(mask.sum(), 8.0, 1e-9);
        assert_approx_eq!(mask.get(1, 1).unwrap(), 1.0, 1e-9);
        assert_approx_eq!(mask.get(0, 0).unwrap(), 0.0);

        let empty = Path::empty().mask(Transform::identity(), FillRule::NonZero)?;
        assert_eq!(empty.width(), 0);
        Ok(())
    }
}
