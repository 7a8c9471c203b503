//! The render engine: source bytes in, captioned PNG out.
//!
//! | Step | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, WebP) | `image::load_from_memory` |
//! | Fit geometry | [`fit_within`](super::calculations::fit_within) |
//! | Resize | `image::imageops::resize` with `Lanczos3` filter |
//! | Composite | `image::imageops::replace` onto a transparent canvas |
//! | Caption (TrueType) | `ab_glyph` via [`TextMask`] |
//! | Caption (no font) | [`bitmap_font`](super::bitmap_font) |
//! | Encode | PNG via `DynamicImage::write_to` |

use super::bitmap_font;
use super::calculations::{fit_within, text_origin};
use super::params::{MAX_CANVAS_SIDE, RenderRequest};
use super::text::{TextMask, load_font};
use ab_glyph::FontVec;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, RgbaImage};
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to decode image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("Failed to encode PNG: {0}")]
    Encode(#[source] image::ImageError),
    #[error("Canvas {width}x{height} exceeds the maximum canvas side")]
    CanvasTooLarge { width: u32, height: u32 },
}

struct LoadedFont {
    font: FontVec,
    typeface: String,
}

/// Draws showcase images.
///
/// Holds the caption font, loaded once. Without a TrueType font every caption
/// falls back to the built-in bitmap font.
pub struct Renderer {
    font: Option<LoadedFont>,
}

impl Renderer {
    /// Renderer that always uses the built-in bitmap font.
    pub fn builtin() -> Self {
        Self { font: None }
    }

    /// Load the caption font from `path`.
    ///
    /// A missing or unparseable font is not fatal: it is logged and the
    /// renderer degrades to the bitmap font.
    pub fn with_font_file(path: &Path) -> Self {
        match load_font(path) {
            Ok(font) => {
                debug!(font = %path.display(), "Loaded caption font");
                Self {
                    font: Some(LoadedFont {
                        font,
                        typeface: path.to_string_lossy().into_owned(),
                    }),
                }
            }
            Err(e) => {
                warn!(
                    font = %path.display(),
                    error = %e,
                    "Caption font unavailable, using built-in bitmap font"
                );
                Self::builtin()
            }
        }
    }

    /// Identity of the loaded TrueType font, `None` for the bitmap font.
    ///
    /// Goes into every [`RenderRequest`] so cache keys change with the font.
    pub fn typeface(&self) -> Option<String> {
        self.font.as_ref().map(|f| f.typeface.clone())
    }

    /// Render `source` per `req` and encode the result as PNG.
    pub fn render(&self, req: &RenderRequest, source: &[u8]) -> Result<Vec<u8>, RenderError> {
        let canvas = self.render_canvas(req, source)?;
        let mut buf = Vec::new();
        DynamicImage::ImageRgba8(canvas)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .map_err(RenderError::Encode)?;
        Ok(buf)
    }

    /// Render `source` per `req` without encoding.
    pub fn render_canvas(
        &self,
        req: &RenderRequest,
        source: &[u8],
    ) -> Result<RgbaImage, RenderError> {
        if req.width > MAX_CANVAS_SIDE || req.height > MAX_CANVAS_SIDE {
            return Err(RenderError::CanvasTooLarge {
                width: req.width,
                height: req.height,
            });
        }
        let img = image::load_from_memory(source).map_err(RenderError::Decode)?;
        let fit = fit_within((img.width(), img.height()), (req.width, req.height));
        let resized = imageops::resize(&img.to_rgba8(), fit.width, fit.height, FilterType::Lanczos3);

        let mut canvas = RgbaImage::new(req.width, req.height);
        imageops::replace(&mut canvas, &resized, fit.x as i64, fit.y as i64);

        if !req.credit.is_empty() {
            self.draw_caption(&mut canvas, req);
        }
        Ok(canvas)
    }

    fn draw_caption(&self, canvas: &mut RgbaImage, req: &RenderRequest) {
        match &self.font {
            Some(loaded) => {
                let Some(mask) = TextMask::layout(&loaded.font, &req.credit, req.font_size) else {
                    return;
                };
                let size = mask.rotated_size(req.angle);
                let (x, y) = text_origin(req.position, (req.width, req.height), size, req.padding);
                mask.draw(canvas, (x + 1, y + 1), req.angle, req.shadow_color);
                mask.draw(canvas, (x, y), req.angle, req.font_color);
            }
            None => {
                // The bitmap caption always sits bottom-left, whatever the anchor.
                let x = req.padding as i32;
                let y = req.height as i32 - req.padding as i32 - bitmap_font::LINE_HEIGHT as i32;
                bitmap_font::draw_text(canvas, &req.credit, x + 1, y + 1, req.shadow_color);
                bitmap_font::draw_text(canvas, &req.credit, x, y, req.font_color);
            }
        }
    }
}
