//! Renderer seam and the reference SVG renderer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::layout::{Anchor, LayoutSpec, Point, Primitive, Stroke};
use crate::style::Rgba;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Invalid {primitive} primitive in slot {slot_id}: {reason}")]
    InvalidPrimitive {
        slot_id: String,
        primitive: &'static str,
        reason: String,
    },

    #[error("Render failed for slot {slot_id}: {reason}")]
    Failed { slot_id: String, reason: String },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Svg,
    Png,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Svg => "svg",
            ImageFormat::Png => "png",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "svg" => Some(ImageFormat::Svg),
            "png" => Some(ImageFormat::Png),
            _ => None,
        }
    }
}

/// Encoded image bytes as produced by a renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub format: ImageFormat,
    pub data: Vec<u8>,
}

/// Turns a draw list into image bytes.
pub trait Renderer {
    fn format(&self) -> ImageFormat;
    fn draw(&self, layout: &LayoutSpec) -> Result<RasterImage, RenderError>;
}

/// Writes the draw list as an SVG document, one element per primitive.
#[derive(Debug, Clone, Copy, Default)]
pub struct SvgRenderer;

impl Renderer for SvgRenderer {
    fn format(&self) -> ImageFormat {
        ImageFormat::Svg
    }

    fn draw(&self, layout: &LayoutSpec) -> Result<RasterImage, RenderError> {
        let mut svg = String::new();
        svg.push_str(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = layout.width,
            h = layout.height
        ));
        for primitive in &layout.primitives {
            svg.push('\n');
            svg.push_str(&element(&layout.slot_id, primitive)?);
        }
        svg.push_str("\n</svg>\n");
        Ok(RasterImage {
            format: ImageFormat::Svg,
            data: svg.into_bytes(),
        })
    }
}

fn paint(attr: &str, color: Option<Rgba>) -> String {
    match color {
        Some(Rgba(r, g, b, a)) if a == 255 => format!(r#" {attr}="rgb({r},{g},{b})""#),
        Some(Rgba(r, g, b, a)) => format!(
            r#" {attr}="rgb({r},{g},{b})" {attr}-opacity="{:.3}""#,
            f64::from(a) / 255.0
        ),
        None => format!(r#" {attr}="none""#),
    }
}

fn stroke_attrs(stroke: Option<Stroke>) -> String {
    match stroke {
        Some(s) => format!(r#"{} stroke-width="{}""#, paint("stroke", Some(s.color)), s.width),
        None => String::new(),
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}

fn invalid(slot_id: &str, primitive: &Primitive, reason: impl Into<String>) -> RenderError {
    RenderError::InvalidPrimitive {
        slot_id: slot_id.to_string(),
        primitive: primitive.name(),
        reason: reason.into(),
    }
}

fn ordered(a: Point, b: Point) -> (Point, Point) {
    (
        Point::new(a.x.min(b.x), a.y.min(b.y)),
        Point::new(a.x.max(b.x), a.y.max(b.y)),
    )
}

fn element(slot_id: &str, primitive: &Primitive) -> Result<String, RenderError> {
    let svg = match primitive {
        Primitive::Text {
            content,
            font_family,
            size,
            color,
            position,
            anchor,
            stroke,
            emphasis,
        } => {
            let align = match anchor {
                Anchor::Center => r#" text-anchor="middle" dominant-baseline="middle""#,
                Anchor::TopLeft => r#" dominant-baseline="hanging""#,
            };
            let outline = match stroke {
                Some(_) => format!(r#"{} paint-order="stroke""#, stroke_attrs(*stroke)),
                None => String::new(),
            };
            let weight = if *emphasis { r#" font-weight="bold""# } else { "" };
            format!(
                r#"<text x="{}" y="{}" font-family="{}" font-size="{}"{}{}{}{}>{}</text>"#,
                position.x,
                position.y,
                escape(font_family),
                size,
                paint("fill", Some(*color)),
                outline,
                align,
                weight,
                escape(content)
            )
        }
        Primitive::Rect {
            top_left,
            bottom_right,
            fill,
            outline,
            corner_radius,
            ..
        } => {
            let (tl, br) = ordered(*top_left, *bottom_right);
            let radius = if *corner_radius > 0 {
                format!(r#" rx="{}""#, corner_radius)
            } else {
                String::new()
            };
            format!(
                r#"<rect x="{}" y="{}" width="{}" height="{}"{}{}{}/>"#,
                tl.x,
                tl.y,
                br.x - tl.x,
                br.y - tl.y,
                radius,
                paint("fill", *fill),
                stroke_attrs(*outline)
            )
        }
        Primitive::Line { from, to, stroke, .. } => format!(
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}"{}/>"#,
            from.x,
            from.y,
            to.x,
            to.y,
            stroke_attrs(Some(*stroke))
        ),
        Primitive::Ellipse {
            top_left,
            bottom_right,
            fill,
            outline,
            ..
        } => {
            let (tl, br) = ordered(*top_left, *bottom_right);
            // Half-pixel radii keep odd-sized boxes exact.
            let rx = f64::from(br.x - tl.x) / 2.0;
            let ry = f64::from(br.y - tl.y) / 2.0;
            format!(
                r#"<ellipse cx="{}" cy="{}" rx="{}" ry="{}"{}{}/>"#,
                f64::from(tl.x) + rx,
                f64::from(tl.y) + ry,
                rx,
                ry,
                paint("fill", *fill),
                stroke_attrs(*outline)
            )
        }
        Primitive::Polygon {
            points,
            fill,
            outline,
            ..
        } => {
            if points.len() < 3 {
                return Err(invalid(
                    slot_id,
                    primitive,
                    format!("needs at least 3 points, got {}", points.len()),
                ));
            }
            let pts: Vec<String> = points.iter().map(|p| format!("{},{}", p.x, p.y)).collect();
            format!(
                r#"<polygon points="{}"{}{}/>"#,
                pts.join(" "),
                paint("fill", *fill),
                stroke_attrs(*outline)
            )
        }
    };
    Ok(svg)
}
