//! # Simple Showcase
//!
//! An embeddable "image showcase" widget. Point it at a folder of images and
//! every request gets one of them, picked at random, fitted onto a fixed-size
//! transparent canvas and captioned with the artist's credit taken from the
//! filename. Rendered images are cached on disk for a configurable time.
//!
//! # Architecture: One Request, One Pipeline
//!
//! ```text
//! select   images/  →  Candidate        (random pick, credit from filename)
//! cache    Candidate → fingerprint      (hit → done)
//! render   source   →  PNG              (fit, caption, encode)
//! store    PNG      →  cache/<key>.png
//! ```
//!
//! GIFs skip the last three steps and are served byte-for-byte. When the
//! chosen image can't be read or decoded, the fallback image takes its place
//! exactly once.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`credit`] | `<artist>__<title>.jpg` filename convention → credit text |
//! | [`select`] | Lists the image folder, picks a candidate, resolves the fallback |
//! | [`cache`] | Render fingerprints and the TTL-bounded flat-file cache |
//! | [`imaging`] | Decode, fit, caption (TrueType or bitmap font), encode |
//! | [`pipeline`] | Sequences a request and handles every failure branch |
//! | [`config`] | `settings.toml` loading, validation and path resolution |
//! | [`server`] | HTTP front end (axum) |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## The Filesystem Is the Database
//!
//! Credits live in filenames, the cache is a folder of `<sha256>.png` files,
//! and the configuration is one TOML file. Adding an image is copying a file;
//! clearing the cache is deleting a folder.
//!
//! ## Explicit Configuration
//!
//! [`config::ShowcaseConfig`] is resolved once and passed into
//! [`pipeline::Showcase`]. Nothing reads settings from global state, so tests
//! build a showcase in a temp folder and exercise the real pipeline.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, resampling (Lanczos3), and PNG encoding use the `image` crate;
//! captions are rasterized with `ab_glyph`. When no TrueType font is available
//! a built-in bitmap font takes over, so a caption is always drawn.

pub mod cache;
pub mod config;
pub mod credit;
pub mod imaging;
pub mod output;
pub mod pipeline;
pub mod select;
pub mod server;

#[cfg(test)]
pub(crate) mod test_helpers;
