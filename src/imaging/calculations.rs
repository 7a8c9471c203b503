//! Pure geometry for the showcase canvas.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::TextPosition;

/// Where and how large the source image lands on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitPlacement {
    pub width: u32,
    pub height: u32,
    pub x: u32,
    pub y: u32,
}

/// Fit `source` inside `target` preserving aspect ratio, centered.
///
/// The scale is `min(target_w / source_w, target_h / source_h)`; the new size
/// is the floor of the scaled source and the offset the floor of half the
/// leftover space. Exact integer arithmetic, so 300/1000 never drifts to 299.
/// Each axis keeps at least one pixel.
///
/// # Examples
/// ```
/// # use simple_showcase::imaging::calculations::{fit_within, FitPlacement};
/// // 1000x500 into 300x300: scale 0.3 → 300x150, offset (0, 75)
/// assert_eq!(
///     fit_within((1000, 500), (300, 300)),
///     FitPlacement { width: 300, height: 150, x: 0, y: 75 }
/// );
/// ```
pub fn fit_within(source: (u32, u32), target: (u32, u32)) -> FitPlacement {
    let (src_w, src_h) = (source.0.max(1) as u64, source.1.max(1) as u64);
    let (tgt_w, tgt_h) = (target.0 as u64, target.1 as u64);

    // tgt_w / src_w <= tgt_h / src_h  ⇔  tgt_w * src_h <= tgt_h * src_w
    let (new_w, new_h) = if tgt_w * src_h <= tgt_h * src_w {
        // Width is the binding axis
        (tgt_w, src_h * tgt_w / src_w)
    } else {
        // Height is the binding axis
        (src_w * tgt_h / src_h, tgt_h)
    };
    let new_w = new_w.max(1).min(tgt_w.max(1));
    let new_h = new_h.max(1).min(tgt_h.max(1));

    FitPlacement {
        width: new_w as u32,
        height: new_h as u32,
        x: (tgt_w.saturating_sub(new_w) / 2) as u32,
        y: (tgt_h.saturating_sub(new_h) / 2) as u32,
    }
}

/// Baseline-left origin of a caption with the given box size.
///
/// `text` is the `(width, height)` of the caption's rotated bounding box.
/// Coordinates may be negative when the caption is larger than the canvas.
pub fn text_origin(
    position: TextPosition,
    canvas: (u32, u32),
    text: (u32, u32),
    padding: u32,
) -> (i32, i32) {
    let (w, h) = (canvas.0 as i32, canvas.1 as i32);
    let (tw, th) = (text.0 as i32, text.1 as i32);
    let p = padding as i32;

    match position {
        TextPosition::TopLeft => (p, p + th),
        TextPosition::TopRight => (w - p - tw, p + th),
        TextPosition::Center => ((w - tw) / 2, (h + th) / 2),
        TextPosition::BottomLeft => (p, h - p),
        TextPosition::BottomRight => (w - p - tw, h - p),
    }
}

/// Rotate a point around the origin, counter-clockwise on screen (y down).
pub fn rotate_point(x: f32, y: f32, degrees: f32) -> (f32, f32) {
    let (sin, cos) = degrees.to_radians().sin_cos();
    (x * cos + y * sin, -x * sin + y * cos)
}

/// Width and height of a caption's bounding box after rotation.
///
/// `bounds` is `(min_x, min_y, max_x, max_y)` of the unrotated ink relative to
/// the baseline origin. Width is measured along the rotated bottom edge
/// (lower-left to lower-right), height along the rotated left edge
/// (lower-left to upper-left).
pub fn rotated_text_size(bounds: (f32, f32, f32, f32), degrees: f32) -> (u32, u32) {
    let (min_x, min_y, max_x, max_y) = bounds;
    let lower_left = rotate_point(min_x, max_y, degrees);
    let lower_right = rotate_point(max_x, max_y, degrees);
    let upper_left = rotate_point(min_x, min_y, degrees);

    let width = (lower_right.0 - lower_left.0).abs().round() as u32;
    let height = (upper_left.1 - lower_left.1).abs().round() as u32;
    (width, height)
}
