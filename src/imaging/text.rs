//! TrueType caption rendering.
//!
//! A caption is laid out once into a coverage mask (glyph ink relative to the
//! baseline origin), measured as a possibly rotated bounding box, and then
//! drawn onto the canvas twice: shadow first, text on top.
//!
//! Rotation happens at draw time by inverse-mapping every canvas pixel in the
//! rotated box back into the mask, so the baseline origin stays fixed and the
//! caption pivots around it.

use super::calculations::{rotate_point, rotated_text_size};
use super::params::Rgb;
use ab_glyph::{Font, FontVec, PxScale, ScaleFont, point};
use image::{Rgba, RgbaImage};
use std::path::Path;
use thiserror::Error;

/// Upper bound on caption mask pixels; larger layouts are refused.
const MAX_MASK_PIXELS: usize = 1 << 25;

#[derive(Error, Debug)]
pub enum FontError {
    #[error("Font file unreadable: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid font data: {0}")]
    Invalid(#[from] ab_glyph::InvalidFont),
}

/// Load a TrueType/OpenType font from disk.
pub fn load_font(path: &Path) -> Result<FontVec, FontError> {
    let data = std::fs::read(path)?;
    Ok(FontVec::try_from_vec(data)?)
}

/// Rasterized caption ink, positioned relative to its baseline origin.
#[derive(Debug, Clone)]
pub struct TextMask {
    width: u32,
    height: u32,
    /// Coverage per pixel in `0.0..=1.0`, row-major.
    coverage: Vec<f32>,
    /// Ink extents relative to the baseline origin.
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl TextMask {
    /// Lay out `text` at `size` pixels. Returns `None` when nothing has ink
    /// (empty or whitespace-only text) or the mask would be unreasonably large.
    pub fn layout(font: &FontVec, text: &str, size: f32) -> Option<Self> {
        let scale = PxScale::from(size);
        let scaled = font.as_scaled(scale);

        let mut outlined = Vec::new();
        let mut caret = 0.0f32;
        let mut prev: Option<ab_glyph::GlyphId> = None;
        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(prev) = prev {
                caret += scaled.kern(prev, id);
            }
            let glyph = id.with_scale_and_position(scale, point(caret, 0.0));
            caret += scaled.h_advance(id);
            prev = Some(id);
            if let Some(o) = font.outline_glyph(glyph) {
                outlined.push(o);
            }
        }

        let first = outlined.first()?.px_bounds();
        let (mut min_x, mut min_y, mut max_x, mut max_y) =
            (first.min.x, first.min.y, first.max.x, first.max.y);
        for o in &outlined[1..] {
            let b = o.px_bounds();
            min_x = min_x.min(b.min.x);
            min_y = min_y.min(b.min.y);
            max_x = max_x.max(b.max.x);
            max_y = max_y.max(b.max.y);
        }

        let width = (max_x - min_x).ceil().max(1.0) as u32;
        let height = (max_y - min_y).ceil().max(1.0) as u32;
        let area = (width as usize)
            .checked_mul(height as usize)
            .filter(|&area| area <= MAX_MASK_PIXELS)?;
        let mut coverage = vec![0.0f32; area];

        for o in &outlined {
            let b = o.px_bounds();
            let off_x = (b.min.x - min_x).round() as i64;
            let off_y = (b.min.y - min_y).round() as i64;
            o.draw(|x, y, c| {
                let mx = off_x + x as i64;
                let my = off_y + y as i64;
                if mx >= 0 && my >= 0 && mx < width as i64 && my < height as i64 {
                    let idx = my as usize * width as usize + mx as usize;
                    coverage[idx] = (coverage[idx] + c).min(1.0);
                }
            });
        }

        Some(Self {
            width,
            height,
            coverage,
            min_x,
            min_y,
            max_x,
            max_y,
        })
    }

    /// Bounding box size after rotating by `angle` degrees.
    pub fn rotated_size(&self, angle: f32) -> (u32, u32) {
        rotated_text_size((self.min_x, self.min_y, self.max_x, self.max_y), angle)
    }

    fn sample(&self, u: f32, v: f32) -> f32 {
        let mx = (u - self.min_x).floor();
        let my = (v - self.min_y).floor();
        if mx < 0.0 || my < 0.0 || mx >= self.width as f32 || my >= self.height as f32 {
            return 0.0;
        }
        self.coverage[my as usize * self.width as usize + mx as usize]
    }

    /// Blend the caption onto `canvas` with its baseline origin at `origin`,
    /// rotated counter-clockwise by `angle` degrees.
    pub fn draw(&self, canvas: &mut RgbaImage, origin: (i32, i32), angle: f32, color: Rgb) {
        let (ox, oy) = (origin.0 as f32, origin.1 as f32);
        let corners = [
            rotate_point(self.min_x, self.min_y, angle),
            rotate_point(self.max_x, self.min_y, angle),
            rotate_point(self.min_x, self.max_y, angle),
            rotate_point(self.max_x, self.max_y, angle),
        ];
        let lo_x = corners.iter().map(|c| c.0).fold(f32::INFINITY, f32::min) + ox;
        let hi_x = corners.iter().map(|c| c.0).fold(f32::NEG_INFINITY, f32::max) + ox;
        let lo_y = corners.iter().map(|c| c.1).fold(f32::INFINITY, f32::min) + oy;
        let hi_y = corners.iter().map(|c| c.1).fold(f32::NEG_INFINITY, f32::max) + oy;

        let x_start = lo_x.floor().max(0.0) as u32;
        let y_start = lo_y.floor().max(0.0) as u32;
        let x_end = (hi_x.ceil().max(0.0) as u32).min(canvas.width());
        let y_end = (hi_y.ceil().max(0.0) as u32).min(canvas.height());

        // Inverse rotation: canvas offset → text space
        let (sin, cos) = angle.to_radians().sin_cos();
        for py in y_start..y_end {
            for px in x_start..x_end {
                let a = px as f32 + 0.5 - ox;
                let b = py as f32 + 0.5 - oy;
                let u = a * cos - b * sin;
                let v = a * sin + b * cos;
                let alpha = self.sample(u, v);
                if alpha > 0.0 {
                    blend_over(canvas.get_pixel_mut(px, py), color, alpha);
                }
            }
        }
    }
}

/// Source-over blend of an opaque color at `alpha` coverage.
pub(crate) fn blend_over(dst: &mut Rgba<u8>, color: Rgb, alpha: f32) {
    let top_a = alpha.clamp(0.0, 1.0);
    let bottom_a = dst[3] as f32 / 255.0;
    let out_a = top_a + bottom_a * (1.0 - top_a);
    if out_a <= f32::EPSILON {
        return;
    }
    let mix = |top: u8, bottom: u8| -> u8 {
        let v = (top as f32 * top_a + bottom as f32 * bottom_a * (1.0 - top_a)) / out_a;
        v.round().clamp(0.0, 255.0) as u8
    };
    *dst = Rgba([
        mix(color.r, dst[0]),
        mix(color.g, dst[1]),
        mix(color.b, dst[2]),
        (out_a * 255.0).round() as u8,
    ]);
}
