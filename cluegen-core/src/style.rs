//! Style configuration for composed layers.
//!
//! The tone decides the palette, so callers pick one enum value instead of
//! threading colors through every drawing call.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn with_alpha(self, a: u8) -> Rgba {
        Rgba(self.0, self.1, self.2, a)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba(pub u8, pub u8, pub u8, pub u8);

impl Rgba {
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Rgba(r, g, b, 255)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundTone {
    /// Beige paper filling the whole canvas
    #[default]
    Parchment,
    /// Transparent canvas with a dark translucent backdrop behind the content
    Dark,
    /// Deep blue chart background
    Nautical,
    /// Nothing behind the content; for stacking over finished art
    Transparent,
}

/// Colors derived from a tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: Option<Rgba>,
    pub panel: Rgba,
    pub text: Rgba,
    pub muted: Rgba,
    pub accent: Rgba,
}

impl BackgroundTone {
    pub fn palette(self) -> Palette {
        match self {
            BackgroundTone::Parchment => Palette {
                background: Some(Rgba::opaque(245, 235, 215)),
                panel: Rgba(235, 225, 205, 255),
                text: Rgba::opaque(101, 67, 33),
                muted: Rgba::opaque(120, 90, 60),
                accent: Rgba::opaque(40, 20, 0),
            },
            BackgroundTone::Dark => Palette {
                background: None,
                panel: Rgba(25, 20, 15, 220),
                text: Rgba::opaque(255, 215, 0),
                muted: Rgba::opaque(200, 170, 130),
                accent: Rgba::opaque(255, 255, 255),
            },
            BackgroundTone::Nautical => Palette {
                background: Some(Rgba(20, 30, 50, 200)),
                panel: Rgba(20, 20, 25, 240),
                text: Rgba::opaque(255, 255, 255),
                muted: Rgba::opaque(150, 150, 150),
                accent: Rgba::opaque(0, 255, 100),
            },
            BackgroundTone::Transparent => Palette {
                background: None,
                panel: Rgba(0, 0, 0, 192),
                text: Rgba::opaque(255, 215, 0),
                muted: Rgba::opaque(160, 140, 100),
                accent: Rgba::opaque(255, 255, 255),
            },
        }
    }
}

pub const MIN_CANVAS: [u32; 2] = [320, 240];
pub const MAX_CANVAS: u32 = 8192;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StyleConfig {
    #[serde(default)]
    pub background_tone: BackgroundTone,
    #[serde(default = "default_border_color")]
    pub border_color: Rgb,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default = "default_true")]
    pub emphasize_letter: bool,
    /// Mark decoys as FAKE. For proof sheets only, never for published art.
    #[serde(default)]
    pub decoy_marker: bool,
    #[serde(default = "default_canvas")]
    pub canvas: [u32; 2],
    /// Paper-texture spots are drawn only when a seed is given.
    #[serde(default)]
    pub texture_seed: Option<u64>,
}

fn default_true() -> bool {
    true
}

fn default_border_color() -> Rgb {
    Rgb(139, 90, 43)
}

fn default_font_family() -> String {
    "Georgia".to_string()
}

fn default_canvas() -> [u32; 2] {
    [1920, 1080]
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            background_tone: BackgroundTone::default(),
            border_color: default_border_color(),
            font_family: default_font_family(),
            emphasize_letter: true,
            decoy_marker: false,
            canvas: default_canvas(),
            texture_seed: None,
        }
    }
}

impl StyleConfig {
    /// Overlay preset: square transparent canvas with a dark backdrop.
    pub fn overlay() -> Self {
        Self {
            background_tone: BackgroundTone::Dark,
            border_color: Rgb(80, 60, 40),
            font_family: "Arial".to_string(),
            canvas: [800, 800],
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let [w, h] = self.canvas;
        if w < MIN_CANVAS[0] || h < MIN_CANVAS[1] {
            return Err(ConfigError::style(format!(
                "canvas {}x{} is below the {}x{} minimum",
                w, h, MIN_CANVAS[0], MIN_CANVAS[1]
            )));
        }
        if w > MAX_CANVAS || h > MAX_CANVAS {
            return Err(ConfigError::style(format!(
                "canvas {}x{} exceeds {} pixels per side",
                w, h, MAX_CANVAS
            )));
        }
        let family = self.font_family.trim();
        if family.is_empty() {
            return Err(ConfigError::style("font family is empty"));
        }
        if family.chars().any(|c| matches!(c, '"' | '<' | '>' | '&' | ';')) {
            return Err(ConfigError::style(format!(
                "font family {:?} contains reserved characters",
                self.font_family
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_style_is_valid() {
        assert!(StyleConfig::default().validate().is_ok());
        assert!(StyleConfig::overlay().validate().is_ok());
    }

    #[test]
    fn tiny_canvas_is_rejected() {
        let style = StyleConfig {
            canvas: [100, 100],
            ..StyleConfig::default()
        };
        assert!(matches!(style.validate(), Err(ConfigError::InvalidStyle(_))));
    }

    #[test]
    fn unknown_option_fails_to_parse() {
        let parsed = serde_json::from_str::<StyleConfig>(r#"{"glitter": true}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn partial_json_uses_defaults() {
        let style: StyleConfig =
            serde_json::from_str(r#"{"backgroundTone": "nautical", "borderColor": [1, 2, 3]}"#).unwrap();
        assert_eq!(style.background_tone, BackgroundTone::Nautical);
        assert_eq!(style.border_color, Rgb(1, 2, 3));
        assert_eq!(style.font_family, "Georgia");
        assert!(style.emphasize_letter);
        assert_eq!(style.texture_seed, None);
    }

    #[test]
    fn font_family_with_markup_is_rejected() {
        let style = StyleConfig {
            font_family: "Arial\"><script".into(),
            ..StyleConfig::default()
        };
        assert!(style.validate().is_err());
    }
}
