//! Image rendering in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::load_from_memory` |
//! | **Fit + center** | integer math in [`calculations`] |
//! | **Resize** | `image::imageops::resize` (Lanczos3) |
//! | **Caption** | `ab_glyph` (TrueType) or a built-in 5×7 bitmap font |
//! | **Encode** | PNG |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for canvas and caption geometry (unit testable)
//! - **Parameters**: Data structures describing one render
//! - **Text / bitmap font**: Caption rasterization
//! - **Render**: [`Renderer`], which combines all of the above

mod bitmap_font;
pub mod calculations;
mod params;
mod render;
pub(crate) mod text;

pub use params::{MAX_CANVAS_SIDE, MAX_FONT_SIZE, RenderRequest, Rgb, TextPosition};
pub use render::{RenderError, Renderer};
pub use text::FontError;
