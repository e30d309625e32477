//! Compositor - turns one plan entry into a draw list.
//!
//! `compose` is a pure function of `(entry, style)`: no I/O, no clock, and
//! randomness only from `style.texture_seed`. Calling it twice yields the
//! same `LayoutSpec`. Styles that fail `StyleConfig::validate` are rejected
//! before anything is drawn.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::ConfigError;
use crate::layout::{Anchor, LayoutSpec, Point, Primitive, Stroke};
use crate::plan::LayerPlanEntry;
use crate::schemes::Payload;
use crate::style::{Palette, Rgba, StyleConfig};

/// Sizes below are authored against a 1080 px short side.
const REFERENCE_SIDE: i32 = 1080;
const TEXTURE_SPOTS: usize = 20;
const DECOY_RED: Rgba = Rgba::opaque(200, 50, 50);
const MARK_RED: Rgba = Rgba::opaque(255, 0, 0);

const ORDINALS: [&str; 10] = [
    "FIRST", "SECOND", "THIRD", "FOURTH", "FIFTH", "SIXTH", "SEVENTH", "EIGHTH", "NINTH", "TENTH",
];

struct Frame<'a> {
    style: &'a StyleConfig,
    palette: Palette,
    width: i32,
    height: i32,
    center: Point,
    short_side: i32,
}

impl Frame<'_> {
    fn px(&self, v: i32) -> i32 {
        v * self.short_side / REFERENCE_SIDE
    }

    fn font(&self, v: i32) -> u32 {
        self.px(v).max(8) as u32
    }

    fn text(&self, content: impl Into<String>, size: i32, color: Rgba, position: Point) -> Primitive {
        Primitive::Text {
            content: content.into(),
            font_family: self.style.font_family.clone(),
            size: self.font(size),
            color,
            position,
            anchor: Anchor::Center,
            stroke: None,
            emphasis: false,
        }
    }

    /// The text that carries the hidden letter.
    fn letter_text(&self, content: impl Into<String>, size: i32, position: Point) -> Primitive {
        let emphasize = self.style.emphasize_letter;
        let size = if emphasize { size * 7 / 5 } else { size };
        Primitive::Text {
            content: content.into(),
            font_family: self.style.font_family.clone(),
            size: self.font(size),
            color: self.palette.text,
            position,
            anchor: Anchor::Center,
            stroke: emphasize.then(|| Stroke::new(self.px(2).max(1) as u32, self.palette.panel)),
            emphasis: emphasize,
        }
    }
}

pub fn compose(entry: &LayerPlanEntry, style: &StyleConfig) -> Result<LayoutSpec, ConfigError> {
    style.validate()?;
    let [width, height] = style.canvas;
    let mut layout = LayoutSpec::new(entry.slot_id.clone(), width, height);
    let frame = Frame {
        style,
        palette: style.background_tone.palette(),
        width: width as i32,
        height: height as i32,
        center: layout.center(),
        short_side: width.min(height) as i32,
    };

    draw_background(&mut layout, &frame);
    if let Some(seed) = style.texture_seed {
        draw_texture(&mut layout, &frame, seed, &entry.slot_id);
    }
    draw_border(&mut layout, &frame);
    layout.push(frame.text(
        ordinal_title(entry.position),
        80,
        frame.palette.muted,
        Point::new(frame.center.x, frame.px(180)),
    ));

    match &entry.payload {
        Payload::Grid { .. } => compose_grid(&mut layout, &frame, &entry.payload),
        Payload::Cipher { text } => compose_cipher(&mut layout, &frame, text),
        Payload::Geo { coordinate } => compose_geo(&mut layout, &frame, coordinate),
        Payload::Clue { sentence } => compose_clue(&mut layout, &frame, sentence),
    }

    if style.decoy_marker && entry.is_decoy {
        layout.push(frame.text(
            "FAKE",
            60,
            DECOY_RED,
            Point::new(frame.center.x, frame.height - frame.px(150)),
        ));
    }

    tracing::trace!(
        slot_id = %entry.slot_id,
        primitives = layout.primitives.len(),
        "composed layer"
    );
    Ok(layout)
}

pub fn ordinal_title(position: usize) -> String {
    match ORDINALS.get(position) {
        Some(word) => format!("{} LETTER", word),
        None => format!("LETTER {}", position + 1),
    }
}

fn draw_background(layout: &mut LayoutSpec, frame: &Frame) {
    if let Some(fill) = frame.palette.background {
        layout.push(Primitive::Rect {
            top_left: Point::new(0, 0),
            bottom_right: Point::new(frame.width, frame.height),
            fill: Some(fill),
            outline: None,
            corner_radius: 0,
            emphasis: false,
        });
    }
}

fn draw_border(layout: &mut LayoutSpec, frame: &Frame) {
    let color = frame.style.border_color.with_alpha(255);
    for (inset, width) in [(40, 8), (55, 3)] {
        let inset = frame.px(inset);
        layout.push(Primitive::Rect {
            top_left: Point::new(inset, inset),
            bottom_right: Point::new(frame.width - inset, frame.height - inset),
            fill: None,
            outline: Some(Stroke::new(frame.px(width).max(1) as u32, color)),
            corner_radius: 0,
            emphasis: false,
        });
    }
}

fn draw_texture(layout: &mut LayoutSpec, frame: &Frame, seed: u64, slot_id: &str) {
    // Per-slot stream so neighbouring slots do not share the same spots.
    let slot_salt = slot_id
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325u64, |h, b| (h ^ u64::from(b)).wrapping_mul(0x100_0000_01b3));
    let mut rng = StdRng::seed_from_u64(seed ^ slot_salt);
    let margin = frame.px(60).max(1);
    if frame.width <= 2 * margin || frame.height <= 2 * margin {
        return;
    }
    for _ in 0..TEXTURE_SPOTS {
        let x = rng.random_range(margin..frame.width - margin);
        let y = rng.random_range(margin..frame.height - margin);
        let r = rng.random_range(3..=8);
        layout.push(Primitive::Ellipse {
            top_left: Point::new(x, y),
            bottom_right: Point::new(x + r, y + r),
            fill: Some(Rgba(139, 69, 19, 30)),
            outline: None,
            emphasis: false,
        });
    }
}

fn draw_x_mark(layout: &mut LayoutSpec, at: Point, half: i32, stroke: Stroke) {
    layout.push(Primitive::Line {
        from: at.offset(-half, -half),
        to: at.offset(half, half),
        stroke,
        emphasis: false,
    });
    layout.push(Primitive::Line {
        from: at.offset(-half, half),
        to: at.offset(half, -half),
        stroke,
        emphasis: false,
    });
}

fn compose_grid(layout: &mut LayoutSpec, frame: &Frame, payload: &Payload) {
    let ruling = Stroke::new(1, frame.palette.panel);
    let step = frame.px(40).max(4);
    let mut y = step;
    while y < frame.height {
        layout.push(Primitive::Line {
            from: Point::new(0, y),
            to: Point::new(frame.width, y),
            stroke: ruling,
            emphasis: false,
        });
        y += step;
    }

    let corner = frame.px(90);
    let mark = Stroke::new(frame.px(4).max(1) as u32, frame.style.border_color.with_alpha(255));
    for at in [
        Point::new(corner, corner),
        Point::new(frame.width - corner, corner),
        Point::new(corner, frame.height - corner),
        Point::new(frame.width - corner, frame.height - corner),
    ] {
        draw_x_mark(layout, at, frame.px(30), mark);
    }

    layout.push(frame.letter_text(payload.display_text(), 100, frame.center.offset(0, -frame.px(50))));
}

fn compose_cipher(layout: &mut LayoutSpec, frame: &Frame, text: &str) {
    let half_w = frame.px(300);
    let half_h = frame.px(150);
    let top_left = frame.center.offset(-half_w, -half_h);
    let bottom_right = frame.center.offset(half_w, half_h);
    layout.push(Primitive::Rect {
        top_left,
        bottom_right,
        fill: Some(frame.palette.panel),
        outline: Some(Stroke::new(frame.px(3).max(1) as u32, frame.style.border_color.with_alpha(255))),
        corner_radius: 0,
        emphasis: false,
    });

    // Torn paper edge along the top and bottom of the panel.
    let tooth = frame.px(20).max(2);
    let depth = frame.px(8).max(1);
    let mut x = top_left.x;
    while x + tooth <= bottom_right.x {
        for (edge, dir) in [(top_left.y, 1), (bottom_right.y, -1)] {
            layout.push(Primitive::Polygon {
                points: vec![
                    Point::new(x, edge),
                    Point::new(x + tooth / 2, edge + dir * depth),
                    Point::new(x + tooth, edge),
                ],
                fill: Some(frame.palette.panel),
                outline: None,
                emphasis: false,
            });
        }
        x += tooth;
    }

    layout.push(frame.text(
        "~ ENCODED MESSAGE ~",
        24,
        frame.palette.muted,
        frame.center.offset(0, -frame.px(80)),
    ));
    layout.push(frame.letter_text(text, 96, frame.center));
    layout.push(frame.text(
        "Decipher to find the treasure",
        18,
        frame.palette.muted,
        frame.center.offset(0, frame.px(80)),
    ));
}

fn compose_geo(layout: &mut LayoutSpec, frame: &Frame, coordinate: &str) {
    let half_w = frame.px(300);
    let half_h = frame.px(175);
    let device_tl = frame.center.offset(-half_w, -half_h);
    let device_br = frame.center.offset(half_w, half_h);
    layout.push(Primitive::Rect {
        top_left: device_tl,
        bottom_right: device_br,
        fill: Some(frame.palette.panel),
        outline: Some(Stroke::new(frame.px(3).max(1) as u32, Rgba::opaque(100, 100, 120))),
        corner_radius: frame.px(15).max(1) as u32,
        emphasis: false,
    });
    let inset = frame.px(30);
    layout.push(Primitive::Rect {
        top_left: device_tl.offset(inset, inset),
        bottom_right: device_br.offset(-inset, -inset),
        fill: Some(Rgba(10, 30, 20, 250)),
        outline: Some(Stroke::new(frame.px(2).max(1) as u32, Rgba(0, 255, 100, 200))),
        corner_radius: 0,
        emphasis: false,
    });

    // Satellite icon: ring and dot.
    let sat = frame.center.offset(0, -frame.px(100));
    let ring = frame.px(15).max(2);
    let dot = frame.px(5).max(1);
    layout.push(Primitive::Ellipse {
        top_left: sat.offset(-ring, -ring),
        bottom_right: sat.offset(ring, ring),
        fill: None,
        outline: Some(Stroke::new(frame.px(2).max(1) as u32, frame.palette.accent)),
        emphasis: false,
    });
    layout.push(Primitive::Ellipse {
        top_left: sat.offset(-dot, -dot),
        bottom_right: sat.offset(dot, dot),
        fill: Some(frame.palette.accent),
        outline: None,
        emphasis: false,
    });

    layout.push(frame.text(
        "COORDINATES:",
        28,
        frame.palette.accent,
        frame.center.offset(0, -frame.px(50)),
    ));

    let mut lines = coordinate.splitn(2, ", ");
    let first = lines.next().unwrap_or(coordinate);
    layout.push(frame.letter_text(first, 44, frame.center.offset(0, frame.px(10))));
    if let Some(second) = lines.next() {
        layout.push(frame.letter_text(second, 44, frame.center.offset(0, frame.px(60))));
    }
}

fn compose_clue(layout: &mut LayoutSpec, frame: &Frame, sentence: &str) {
    let mark = Stroke::new(frame.px(4).max(1) as u32, MARK_RED);
    let half = frame.px(20);
    let at = frame.center.offset(0, -frame.px(120));
    draw_x_mark(layout, at, half, mark);
    layout.push(Primitive::Ellipse {
        top_left: at.offset(-half - 10, -half - 10),
        bottom_right: at.offset(half + 10, half + 10),
        fill: None,
        outline: Some(Stroke::new(frame.px(3).max(1) as u32, MARK_RED)),
        emphasis: false,
    });
    layout.push(frame.letter_text(sentence, 56, frame.center.offset(0, frame.px(40))));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::LayerPlanEntry;
    use crate::schemes::{
        CaesarCipher, CoordinateGrid, DirectWord, EncodingScheme, GeoCoordinate, Scheme,
    };
    use crate::style::{BackgroundTone, MIN_CANVAS};
    use std::sync::Arc;

    fn entry(scheme: Scheme, letter: char, is_decoy: bool) -> LayerPlanEntry {
        let name = scheme.kind();
        LayerPlanEntry::encode("nft_5_layer_1", name, Arc::new(scheme), letter, 0, is_decoy).unwrap()
    }

    #[test]
    fn grid_layout_prints_row_and_column() {
        let layout = compose(
            &entry(Scheme::CoordinateGrid(CoordinateGrid::default()), 'D', false),
            &StyleConfig::default(),
        )
        .unwrap();
        assert!(layout.texts().any(|t| t == "ROW 1, COLUMN 4"));
        assert!(layout.texts().any(|t| t == "FIRST LETTER"));
    }

    #[test]
    fn letter_text_carries_emphasis_flag() {
        let e = entry(Scheme::Caesar(CaesarCipher::new(1)), 'B', false);
        let emphasized = compose(&e, &StyleConfig::default()).unwrap();
        let flagged: Vec<_> = emphasized.emphasized().filter_map(Primitive::text).collect();
        assert_eq!(flagged, ["C"]);

        let plain = StyleConfig {
            emphasize_letter: false,
            ..StyleConfig::default()
        };
        assert_eq!(compose(&e, &plain).unwrap().emphasized().count(), 0);
    }

    #[test]
    fn geo_coordinate_splits_into_two_lines() {
        let layout = compose(
            &entry(Scheme::GeoCoordinate(GeoCoordinate::default()), 'B', false),
            &StyleConfig::overlay(),
        )
        .unwrap();
        assert!(layout.texts().any(|t| t == "4.6097° S"));
        assert!(layout.texts().any(|t| t == "55.4263° E"));
    }

    #[test]
    fn decoy_marker_only_on_decoys_when_enabled() {
        let proof = StyleConfig {
            decoy_marker: true,
            ..StyleConfig::default()
        };
        let decoy = entry(Scheme::DirectWord(DirectWord::default()), 'X', true);
        let real = entry(Scheme::DirectWord(DirectWord::default()), 'D', false);
        assert!(compose(&decoy, &proof).unwrap().texts().any(|t| t == "FAKE"));
        assert!(!compose(&real, &proof).unwrap().texts().any(|t| t == "FAKE"));
        assert!(!compose(&decoy, &StyleConfig::default())
            .unwrap()
            .texts()
            .any(|t| t == "FAKE"));
    }

    #[test]
    fn texture_requires_seed_and_is_reproducible() {
        let e = entry(Scheme::CoordinateGrid(CoordinateGrid::default()), 'A', false);
        let count_spots = |layout: &LayoutSpec| {
            layout
                .primitives
                .iter()
                .filter(|p| matches!(p, Primitive::Ellipse { fill: Some(Rgba(139, 69, 19, 30)), .. }))
                .count()
        };

        assert_eq!(count_spots(&compose(&e, &StyleConfig::default()).unwrap()), 0);

        let seeded = StyleConfig {
            texture_seed: Some(42),
            ..StyleConfig::default()
        };
        let a = compose(&e, &seeded).unwrap();
        let b = compose(&e, &seeded).unwrap();
        assert_eq!(count_spots(&a), TEXTURE_SPOTS);
        assert_eq!(a, b);
    }

    #[test]
    fn dark_tone_has_no_full_canvas_fill() {
        let style = StyleConfig {
            background_tone: BackgroundTone::Dark,
            ..StyleConfig::overlay()
        };
        let layout = compose(&entry(Scheme::Caesar(CaesarCipher::new(1)), 'A', false), &style).unwrap();
        let full = Primitive::Rect {
            top_left: Point::new(0, 0),
            bottom_right: Point::new(800, 800),
            fill: Some(Rgba::opaque(245, 235, 215)),
            outline: None,
            corner_radius: 0,
            emphasis: false,
        };
        assert!(!layout.primitives.contains(&full));
    }

    #[test]
    fn invalid_canvas_is_a_config_error() {
        let e = entry(Scheme::CoordinateGrid(CoordinateGrid::default()), 'A', false);
        let tiny = StyleConfig {
            canvas: [1, 1],
            texture_seed: Some(1),
            ..StyleConfig::default()
        };
        assert!(matches!(compose(&e, &tiny), Err(ConfigError::InvalidStyle(_))));

        let huge = StyleConfig {
            canvas: [u32::MAX, 1080],
            ..StyleConfig::default()
        };
        assert!(matches!(compose(&e, &huge), Err(ConfigError::InvalidStyle(_))));
    }

    #[test]
    fn smallest_canvas_with_texture_still_composes() {
        let e = entry(Scheme::Caesar(CaesarCipher::new(1)), 'A', false);
        let style = StyleConfig {
            canvas: MIN_CANVAS,
            texture_seed: Some(9),
            ..StyleConfig::default()
        };
        let layout = compose(&e, &style).unwrap();
        assert_eq!((layout.width, layout.height), (320, 240));
    }

    #[test]
    fn ordinals_fall_back_to_numbers() {
        assert_eq!(ordinal_title(0), "FIRST LETTER");
        assert_eq!(ordinal_title(9), "TENTH LETTER");
        assert_eq!(ordinal_title(11), "LETTER 12");
    }
}
