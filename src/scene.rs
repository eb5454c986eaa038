//! Scene model consumed by the renderer
use crate::{Error, FillRule, Paint, Path, RGBA, Scalar, StrokeStyle, Transform, utils::clamp};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Vector scene of the given size in user units
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Scene {
    pub width: Scalar,
    pub height: Scalar,
    #[cfg_attr(feature = "serde", serde(default))]
    pub children: Vec<Node>,
}

/// Element of the scene tree
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Node {
    Shape(Shape),
    Group(Group),
}

impl From<Shape> for Node {
    fn from(shape: Shape) -> Self {
        Node::Shape(shape)
    }
}

impl From<Group> for Node {
    fn from(group: Group) -> Self {
        Node::Group(group)
    }
}

/// Group of nodes sharing transform and opacity
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Group {
    pub transform: Transform,
    /// Multiplied into the opacity of every descendant shape
    pub opacity: Scalar,
    pub children: Vec<Node>,
}

impl Default for Group {
    fn default() -> Self {
        Self {
            transform: Transform::identity(),
            opacity: 1.0,
            children: Vec::new(),
        }
    }
}

impl Group {
    pub fn new(children: Vec<Node>) -> Self {
        Self {
            children,
            ..Default::default()
        }
    }

    pub fn with_transform(self, transform: Transform) -> Self {
        Self { transform, ..self }
    }

    pub fn with_opacity(self, opacity: Scalar) -> Self {
        Self { opacity, ..self }
    }
}

/// Path with its fill and stroke paints
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Shape {
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub id: Option<String>,
    pub path: Arc<Path>,
    pub fill: Paint,
    pub fill_rule: FillRule,
    pub stroke: Paint,
    pub stroke_style: StrokeStyle,
    pub opacity: Scalar,
    /// Transform relative to the parent node
    pub transform: Transform,
    /// Invisible shapes are skipped by the renderer
    pub visible: bool,
}

impl Default for Shape {
    fn default() -> Self {
        Self {
            id: None,
            path: Arc::default(),
            fill: Paint::Solid(RGBA::new(0, 0, 0, 255)),
            fill_rule: FillRule::default(),
            stroke: Paint::None,
            stroke_style: StrokeStyle::default(),
            opacity: 1.0,
            transform: Transform::identity(),
            visible: true,
        }
    }
}

impl Shape {
    /// Shape filled with black and without stroke
    pub fn new(path: impl Into<Arc<Path>>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_id(self, id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..self
        }
    }

    pub fn with_fill(self, fill: impl Into<Paint>) -> Self {
        Self {
            fill: fill.into(),
            ..self
        }
    }

    pub fn with_fill_rule(self, fill_rule: FillRule) -> Self {
        Self { fill_rule, ..self }
    }

    pub fn with_stroke(self, stroke: impl Into<Paint>, stroke_style: StrokeStyle) -> Self {
        Self {
            stroke: stroke.into(),
            stroke_style,
            ..self
        }
    }

    pub fn with_opacity(self, opacity: Scalar) -> Self {
        Self { opacity, ..self }
    }

    pub fn with_transform(self, transform: Transform) -> Self {
        Self { transform, ..self }
    }

    pub fn with_visible(self, visible: bool) -> Self {
        Self { visible, ..self }
    }

    fn validate(&self) -> Result<(), Error> {
        let name = self.id.as_deref().unwrap_or("<anonymous>");
        if !self.opacity.is_finite() {
            return Err(Error::input(format!("shape {name}: opacity is not finite")));
        }
        if !self.transform.is_finite() {
            return Err(Error::input(format!("shape {name}: transform is not finite")));
        }
        if !self.path.is_finite() {
            return Err(Error::input(format!("shape {name}: path is not finite")));
        }
        if !self.fill.is_finite() || !self.stroke.is_finite() {
            return Err(Error::input(format!("shape {name}: paint is not finite")));
        }
        let width = self.stroke_style.width;
        if !width.is_finite() {
            return Err(Error::input(format!("shape {name}: stroke width is not finite")));
        }
        if let crate::LineJoin::Miter(limit) = self.stroke_style.line_join {
            if limit.is_nan() {
                return Err(Error::input(format!("shape {name}: miter limit is NaN")));
            }
        }
        Ok(())
    }
}

impl Scene {
    pub fn new(width: Scalar, height: Scalar) -> Self {
        Self {
            width,
            height,
            children: Vec::new(),
        }
    }

    /// Append node to the end of the scene
    pub fn push(&mut self, node: impl Into<Node>) -> &mut Self {
        self.children.push(node.into());
        self
    }

    /// Check that scene only contains finite values and has positive size
    pub fn validate(&self) -> Result<(), Error> {
        if !(self.width.is_finite() && self.width > 0.0) {
            return Err(Error::input(format!("invalid scene width: {}", self.width)));
        }
        if !(self.height.is_finite() && self.height > 0.0) {
            return Err(Error::input(format!(
                "invalid scene height: {}",
                self.height
            )));
        }
        let mut stack: Vec<&Node> = self.children.iter().collect();
        while let Some(node) = stack.pop() {
            match node {
                Node::Shape(shape) => shape.validate()?,
                Node::Group(group) => {
                    if !group.transform.is_finite() {
                        return Err(Error::input("group transform is not finite"));
                    }
                    if !group.opacity.is_finite() {
                        return Err(Error::input("group opacity is not finite"));
                    }
                    stack.extend(group.children.iter());
                }
            }
        }
        Ok(())
    }

    /// Iterate over visible shapes in document order
    ///
    /// Each shape is paired with its transform relative to the scene (parent
    /// transforms composed with its own) and its effective opacity.
    pub fn shapes(&self, tr: Transform) -> ShapeIter<'_> {
        ShapeIter {
            stack: vec![(self.children.iter(), tr, 1.0)],
        }
    }

    /// Load scene from JSON text
    #[cfg(feature = "serde")]
    pub fn from_json(text: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load scene from JSON reader
    #[cfg(feature = "serde")]
    pub fn from_reader(reader: impl std::io::Read) -> Result<Self, Error> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Serialize scene into JSON text
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Depth first iterator over visible shapes of the scene
pub struct ShapeIter<'a> {
    stack: Vec<(std::slice::Iter<'a, Node>, Transform, Scalar)>,
}

impl<'a> Iterator for ShapeIter<'a> {
    type Item = (&'a Shape, Transform, Scalar);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (children, tr, opacity) = self.stack.last_mut()?;
            let (tr, opacity) = (*tr, *opacity);
            let Some(node) = children.next() else {
                self.stack.pop();
                continue;
            };
            match node {
                Node::Shape(shape) => {
                    if shape.visible {
                        let opacity = opacity * clamp(shape.opacity, 0.0, 1.0);
                        return Some((shape, tr * shape.transform, opacity));
                    }
                }
                Node::Group(group) => {
                    let opacity = opacity * clamp(group.opacity, 0.0, 1.0);
                    self.stack
                        .push((group.children.iter(), tr * group.transform, opacity));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LineCap, LineJoin, Point, assert_approx_eq};

    fn rect() -> Path {
        Path::builder()
            .move_to((0.0, 0.0))
            .line_to((4.0, 0.0))
            .line_to((4.0, 4.0))
            .line_to((0.0, 4.0))
            .close()
            .build()
    }

    #[test]
    fn test_shapes_order() {
        let mut scene = Scene::new(10.0, 10.0);
        scene
            .push(Shape::new(rect()).with_id("a"))
            .push(
                Group::new(vec![
                    Shape::new(rect())
                        .with_id("b")
                        .with_opacity(0.5)
                        .with_transform(Transform::new_scale(2.0, 2.0))
                        .into(),
                    Shape::new(rect()).with_id("hidden").with_visible(false).into(),
                    Group::new(vec![Shape::new(rect()).with_id("c").into()])
                        .with_opacity(0.5)
                        .into(),
                ])
                .with_transform(Transform::new_translate(1.0, 2.0))
                .with_opacity(0.8),
            )
            .push(Shape::new(rect()).with_id("d"));

        let shapes: Vec<_> = scene.shapes(Transform::identity()).collect();
        let ids: Vec<_> = shapes
            .iter()
            .map(|(shape, _, _)| shape.id.as_deref().unwrap_or(""))
            .collect();
        assert_eq!(ids, ["a", "b", "c", "d"]);

        let (_, tr, opacity) = shapes[1];
        assert_approx_eq!(opacity, 0.4);
        let p = tr.apply(Point::new(1.0, 1.0));
        assert_approx_eq!(p.x(), 3.0);
        assert_approx_eq!(p.y(), 4.0);

        let (_, tr, opacity) = shapes[2];
        assert_approx_eq!(opacity, 0.4);
        assert_approx_eq!(tr.apply(Point::new(0.0, 0.0)).y(), 2.0);

        let (_, _, opacity) = shapes[3];
        assert_approx_eq!(opacity, 1.0);
    }

    #[test]
    fn test_validate() {
        let scene = Scene::new(10.0, 10.0);
        assert!(scene.validate().is_ok());
        assert!(matches!(Scene::new(0.0, 10.0).validate(), Err(Error::Input { .. })));
        assert!(matches!(
            Scene::new(10.0, Scalar::NAN).validate(),
            Err(Error::Input { .. })
        ));

        let mut scene = Scene::new(10.0, 10.0);
        scene.push(Group::new(vec![
            Shape::new(rect()).with_opacity(Scalar::INFINITY).into(),
        ]));
        assert!(matches!(scene.validate(), Err(Error::Input { .. })));

        let mut scene = Scene::new(10.0, 10.0);
        scene.push(Shape::new(rect()).with_transform(Transform::new_scale(Scalar::NAN, 1.0)));
        assert!(matches!(scene.validate(), Err(Error::Input { .. })));

        let mut scene = Scene::new(10.0, 10.0);
        let path = Path::builder()
            .move_to((0.0, 0.0))
            .line_to((Scalar::INFINITY, 1.0))
            .build();
        scene.push(Shape::new(path));
        assert!(matches!(scene.validate(), Err(Error::Input { .. })));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_json() -> Result<(), Error> {
        let text = r##"{
            "width": 20,
            "height": 10,
            "children": [
                {"shape": {"id": "bg", "path": "M0,0 H20 V10 H0 Z", "fill": {"solid": "#ff0000"}}},
                {"group": {
                    "opacity": 0.5,
                    "transform": [1, 0, 5, 0, 1, 0],
                    "children": [
                        {"shape": {
                            "path": "M0,0 L4,4",
                            "fill": "none",
                            "stroke": {"linear_gradient": {
                                "start": [0, 0],
                                "end": [4, 0],
                                "stops": [
                                    {"offset": 0, "color": "#ff0000"},
                                    {"offset": 1, "color": "#0000ff80"}
                                ],
                                "spread": "reflect"
                            }},
                            "stroke_style": {"width": 2, "line_cap": "round", "line_join": {"miter": 3}}
                        }}
                    ]
                }}
            ]
        }"##;
        let scene = Scene::from_json(text)?;
        scene.validate()?;
        assert_eq!(scene.children.len(), 2);
        let Node::Shape(bg) = &scene.children[0] else {
            panic!("shape expected");
        };
        assert_eq!(bg.fill, Paint::Solid(RGBA::new(255, 0, 0, 255)));
        assert_eq!(bg.stroke, Paint::None);
        assert_eq!(bg.path.to_string(), "M0,0 L20,0 20,10 0,10 Z");

        let shapes: Vec<_> = scene.shapes(Transform::identity()).collect();
        let (line, tr, opacity) = shapes[1];
        assert_approx_eq!(opacity, 0.5);
        assert_approx_eq!(tr.apply(Point::new(0.0, 0.0)).x(), 5.0);
        assert!(line.fill.is_none());
        assert_eq!(line.stroke_style.line_cap, LineCap::Round);
        assert_eq!(line.stroke_style.line_join, LineJoin::Miter(3.0));

        let loaded = Scene::from_json(&scene.to_json()?)?;
        assert_eq!(loaded, scene);

        assert!(matches!(
            Scene::from_json(r#"{"width": 1, "height": 1, "children": [{"shape": {"path": "M0,0 A"}}]}"#),
            Err(Error::Json(_))
        ));
        Ok(())
    }
}
