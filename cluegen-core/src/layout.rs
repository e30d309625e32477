//! Renderer-agnostic draw lists.

use serde::{Deserialize, Serialize};

use crate::style::Rgba;

/// Pixel position on the canvas, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    TopLeft,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Stroke {
    pub width: u32,
    pub color: Rgba,
}

impl Stroke {
    pub const fn new(width: u32, color: Rgba) -> Self {
        Self { width, color }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "primitive", rename_all = "snake_case")]
pub enum Primitive {
    Text {
        content: String,
        font_family: String,
        size: u32,
        color: Rgba,
        position: Point,
        anchor: Anchor,
        stroke: Option<Stroke>,
        emphasis: bool,
    },
    Rect {
        top_left: Point,
        bottom_right: Point,
        fill: Option<Rgba>,
        outline: Option<Stroke>,
        corner_radius: u32,
        emphasis: bool,
    },
    Line {
        from: Point,
        to: Point,
        stroke: Stroke,
        emphasis: bool,
    },
    Ellipse {
        top_left: Point,
        bottom_right: Point,
        fill: Option<Rgba>,
        outline: Option<Stroke>,
        emphasis: bool,
    },
    Polygon {
        points: Vec<Point>,
        fill: Option<Rgba>,
        outline: Option<Stroke>,
        emphasis: bool,
    },
}

impl Primitive {
    pub fn name(&self) -> &'static str {
        match self {
            Primitive::Text { .. } => "text",
            Primitive::Rect { .. } => "rect",
            Primitive::Line { .. } => "line",
            Primitive::Ellipse { .. } => "ellipse",
            Primitive::Polygon { .. } => "polygon",
        }
    }

    pub fn is_emphasized(&self) -> bool {
        match self {
            Primitive::Text { emphasis, .. }
            | Primitive::Rect { emphasis, .. }
            | Primitive::Line { emphasis, .. }
            | Primitive::Ellipse { emphasis, .. }
            | Primitive::Polygon { emphasis, .. } => *emphasis,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Primitive::Text { content, .. } => Some(content.as_str()),
            _ => None,
        }
    }
}

/// Everything to draw for one slot, in paint order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutSpec {
    pub slot_id: String,
    pub width: u32,
    pub height: u32,
    pub primitives: Vec<Primitive>,
}

impl LayoutSpec {
    pub fn new(slot_id: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            slot_id: slot_id.into(),
            width,
            height,
            primitives: Vec::new(),
        }
    }

    pub fn push(&mut self, primitive: Primitive) {
        self.primitives.push(primitive);
    }

    pub fn center(&self) -> Point {
        Point::new(self.width as i32 / 2, self.height as i32 / 2)
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.primitives.iter().filter_map(Primitive::text)
    }

    pub fn emphasized(&self) -> impl Iterator<Item = &Primitive> {
        self.primitives.iter().filter(|p| p.is_emphasized())
    }

    /// Serialized form handed to renderers and hashed for fingerprints.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
