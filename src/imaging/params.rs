//! Parameter types for a showcase render.
//!
//! These structs describe *what* to render, not *how*. The orchestrator
//! builds a [`RenderRequest`] from the config and the selected candidate; the
//! [`Renderer`](super::render::Renderer) turns it into pixels and the cache
//! fingerprints it. Two equal requests always produce identical PNG bytes.
//!
//! ## Types
//!
//! - [`Rgb`]: an opaque color, written as `[r, g, b]` in `settings.toml`.
//! - [`TextPosition`]: one of five caption anchors. Unknown names fall back to bottom-left.
//! - [`RenderRequest`]: full specification of one render.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Largest accepted canvas side, in pixels.
pub const MAX_CANVAS_SIDE: u32 = 8192;

/// Largest accepted caption size, in pixels.
pub const MAX_FONT_SIZE: f32 = 512.0;

/// An opaque RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn white() -> Self {
        Self::new(255, 255, 255)
    }

    pub const fn black() -> Self {
        Self::new(0, 0, 0)
    }

    /// Components in `r, g, b` order.
    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::new(r, g, b)
    }
}

impl From<Rgb> for [u8; 3] {
    fn from(color: Rgb) -> Self {
        color.to_array()
    }
}

/// Where the caption is anchored on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TextPosition {
    TopLeft,
    TopRight,
    Center,
    #[default]
    BottomLeft,
    BottomRight,
}

impl TextPosition {
    /// Parse a position name, case-insensitively.
    ///
    /// Anything unrecognized becomes [`TextPosition::BottomLeft`].
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "top-left" => Self::TopLeft,
            "top-right" => Self::TopRight,
            "center" => Self::Center,
            "bottom-right" => Self::BottomRight,
            _ => Self::BottomLeft,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::TopLeft => "top-left",
            Self::TopRight => "top-right",
            Self::Center => "center",
            Self::BottomLeft => "bottom-left",
            Self::BottomRight => "bottom-right",
        }
    }
}

impl From<String> for TextPosition {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl From<TextPosition> for String {
    fn from(position: TextPosition) -> Self {
        position.as_str().to_string()
    }
}

impl fmt::Display for TextPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full specification of one showcase render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub image_path: PathBuf,
    /// Caption text. Empty means no caption.
    pub credit: String,
    /// Canvas width.
    pub width: u32,
    /// Canvas height.
    pub height: u32,
    /// Caption size in pixels.
    pub font_size: f32,
    /// Caption rotation in degrees, counter-clockwise.
    pub angle: f32,
    pub font_color: Rgb,
    pub shadow_color: Rgb,
    pub position: TextPosition,
    /// Distance of the caption from the canvas edges.
    pub padding: u32,
    /// Identity of the TrueType font the renderer draws with, `None` for the
    /// built-in bitmap font.
    pub typeface: Option<String>,
}
