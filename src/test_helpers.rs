//! Shared test utilities for the simple-showcase test suite.
//!
//! Builds throwaway showcase folders on disk: synthetic images encoded with the
//! `image` crate, a `settings.toml`, and the usual `images/` layout.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let show = ShowcaseFixture::new();
//! show.image("bob__sunset.jpg", &jpeg_bytes(&solid_rgb(600, 300, [255, 128, 0])));
//! show.settings("output_width = 300\noutput_height = 300\n");
//! let config = show.config();
//! ```

use crate::config::ShowcaseConfig;
use image::{DynamicImage, ImageFormat, RgbImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Bytes that look like a GIF to anything checking only the extension.
/// The pipeline never decodes GIFs, so this is enough for passthrough tests.
pub const GIF_BYTES: &[u8] = b"GIF89a\x01\x00\x01\x00\x80\x00\x00\xff\xff\xff\x00\x00\x00!\xf9\x04\x01\x00\x00\x00\x00,\x00\x00\x00\x00\x01\x00\x01\x00\x00\x02\x02D\x01\x00;";

// =========================================================================
// Synthetic images
// =========================================================================

/// A single-color RGB image.
pub fn solid_rgb(width: u32, height: u32, color: [u8; 3]) -> RgbImage {
    RgbImage::from_pixel(width, height, image::Rgb(color))
}

fn encode(img: &RgbImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img.clone())
        .write_to(&mut Cursor::new(&mut buf), format)
        .unwrap();
    buf
}

pub fn png_bytes(img: &RgbImage) -> Vec<u8> {
    encode(img, ImageFormat::Png)
}

pub fn jpeg_bytes(img: &RgbImage) -> Vec<u8> {
    encode(img, ImageFormat::Jpeg)
}

// =========================================================================
// Showcase folder fixture
// =========================================================================

/// A temporary showcase folder with an `images/` subfolder.
pub struct ShowcaseFixture {
    pub tmp: TempDir,
}

impl ShowcaseFixture {
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("images")).unwrap();
        Self { tmp }
    }

    pub fn root(&self) -> &Path {
        self.tmp.path()
    }

    /// Write a file at `rel` below the showcase root, creating parents.
    pub fn file(&self, rel: &str, bytes: &[u8]) -> PathBuf {
        let path = self.root().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, bytes).unwrap();
        path
    }

    /// Write an image into `images/`.
    pub fn image(&self, name: &str, bytes: &[u8]) -> PathBuf {
        self.file(&format!("images/{name}"), bytes)
    }

    pub fn settings(&self, toml: &str) -> PathBuf {
        self.file(crate::config::SETTINGS_FILENAME, toml.as_bytes())
    }

    /// Load the resolved config. Panics if settings are missing or invalid.
    pub fn config(&self) -> ShowcaseConfig {
        ShowcaseConfig::load(self.root())
            .unwrap_or_else(|e| panic!("fixture config failed to load: {e}"))
    }

    /// Names of the files currently in the cache directory.
    pub fn cache_entries(&self) -> Vec<String> {
        let dir = self.config().cache_dir;
        let Ok(entries) = std::fs::read_dir(dir) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}
