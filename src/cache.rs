//! Rendered-image cache.
//!
//! Resizing and captioning is the expensive part of a request. This module
//! lets the pipeline skip it when the same render was produced recently.
//!
//! # Design
//!
//! ## Cache keys
//!
//! The cache is **content-addressed by parameters**: the key is a SHA-256
//! fingerprint of every field of a [`RenderRequest`] that affects pixels
//! (source path, credit, canvas size, font size, angle, both colors, anchor,
//! padding, typeface). Two requests with the same fingerprint produce the same
//! PNG, so one file serves both.
//!
//! Source *contents* are not hashed. Replacing an image in place is picked up
//! once the entry expires.
//!
//! ## Expiry
//!
//! An entry is `<cache_dir>/<fingerprint>.png` and is valid while its age in
//! whole seconds is `<= ttl`. Stale entries are never deleted; the next render
//! overwrites them.
//!
//! ## Concurrency
//!
//! No locking. Two requests missing on the same key both render and both
//! write; the content is identical, so the last writer wins harmlessly.

use crate::imaging::RenderRequest;
use sha2::{Digest, Sha256};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

/// Extension of every cache entry.
const ENTRY_EXTENSION: &str = "png";

fn update_str(hasher: &mut Sha256, value: &str) {
    hasher.update((value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

/// SHA-256 fingerprint of a render request, returned as a hex string.
///
/// Every field is length-prefixed or fixed-width, so adjacent fields can't
/// run into each other.
pub fn fingerprint(req: &RenderRequest) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"showcase\0");
    update_str(&mut hasher, &req.image_path.to_string_lossy());
    update_str(&mut hasher, &req.credit);
    hasher.update(req.width.to_le_bytes());
    hasher.update(req.height.to_le_bytes());
    hasher.update(req.font_size.to_le_bytes());
    hasher.update(req.angle.to_le_bytes());
    hasher.update(req.font_color.to_array());
    hasher.update(req.shadow_color.to_array());
    update_str(&mut hasher, req.position.as_str());
    hasher.update(req.padding.to_le_bytes());
    match &req.typeface {
        Some(typeface) => {
            hasher.update(b"\x01");
            update_str(&mut hasher, typeface);
        }
        None => {
            hasher.update(b"\x00");
        }
    }
    format!("{:x}", hasher.finalize())
}

/// Flat-file store of rendered PNGs with a time-to-live.
#[derive(Debug, Clone)]
pub struct RenderCache {
    dir: PathBuf,
    ttl_secs: u64,
}

impl RenderCache {
    pub fn new(dir: impl Into<PathBuf>, ttl_secs: u64) -> Self {
        Self {
            dir: dir.into(),
            ttl_secs,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Path of the entry for `key`, whether or not it exists.
    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{ENTRY_EXTENSION}"))
    }

    /// Cached bytes for `key` if a fresh entry exists.
    pub fn lookup(&self, key: &str) -> Option<Vec<u8>> {
        self.lookup_at(key, SystemTime::now())
    }

    /// Like [`lookup`](Self::lookup) with an explicit clock.
    pub fn lookup_at(&self, key: &str, now: SystemTime) -> Option<Vec<u8>> {
        let path = self.entry_path(key);
        let modified = std::fs::metadata(&path).and_then(|m| m.modified()).ok()?;
        // mtime in the future counts as brand new
        let age = now
            .duration_since(modified)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        if age > self.ttl_secs {
            debug!(key, age, ttl = self.ttl_secs, "Cache entry stale");
            return None;
        }
        std::fs::read(&path).ok()
    }

    /// Write (or overwrite) the entry for `key`.
    pub fn store(&self, key: &str, bytes: &[u8]) -> io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.entry_path(key), bytes)
    }
}

/// Summary of a cache warm-up run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub rendered: u32,
    pub passthrough: u32,
    pub failed: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn render(&mut self) {
        self.rendered += 1;
    }

    pub fn pass(&mut self) {
        self.passthrough += 1;
    }

    pub fn fail(&mut self) {
        self.failed += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.rendered + self.passthrough + self.failed
    }

    /// Combine two tallies; used to reduce parallel results.
    pub fn merge(self, other: Self) -> Self {
        Self {
            hits: self.hits + other.hits,
            rendered: self.rendered + other.rendered,
            passthrough: self.passthrough + other.passthrough,
            failed: self.failed + other.failed,
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits > 0 {
            write!(
                f,
                "{} cached, {} rendered ({} total)",
                self.hits,
                self.rendered,
                self.total()
            )?;
        } else {
            write!(f, "{} rendered", self.rendered)?;
        }
        if self.passthrough > 0 {
            write!(f, ", {} passed through", self.passthrough)?;
        }
        if self.failed > 0 {
            write!(f, ", {} failed", self.failed)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::{Rgb, TextPosition};
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn request() -> RenderRequest {
        RenderRequest {
            image_path: PathBuf::from("/show/images/bob__sunset.jpg"),
            credit: "bob".to_string(),
            width: 300,
            height: 300,
            font_size: 16.0,
            angle: 0.0,
            font_color: Rgb::white(),
            shadow_color: Rgb::black(),
            position: TextPosition::BottomLeft,
            padding: 10,
            typeface: Some("/show/fonts/OpenSans-Regular.ttf".to_string()),
        }
    }

    // =========================================================================
    // fingerprint
    // =========================================================================

    #[test]
    fn fingerprint_deterministic() {
        let h1 = fingerprint(&request());
        let h2 = fingerprint(&request());
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64); // SHA-256 hex is 64 chars
    }

    #[test]
    fn fingerprint_varies_with_each_field() {
        let base = fingerprint(&request());
        let variants: Vec<(&str, Box<dyn Fn(&mut RenderRequest)>)> = vec![
            ("path", Box::new(|r| r.image_path = PathBuf::from("/show/images/x.jpg"))),
            ("credit", Box::new(|r| r.credit = "alice".to_string())),
            ("width", Box::new(|r| r.width = 301)),
            ("height", Box::new(|r| r.height = 299)),
            ("font_size", Box::new(|r| r.font_size = 16.5)),
            ("angle", Box::new(|r| r.angle = 15.0)),
            ("font_color", Box::new(|r| r.font_color = Rgb::new(255, 255, 254))),
            ("shadow_color", Box::new(|r| r.shadow_color = Rgb::new(1, 0, 0))),
            ("position", Box::new(|r| r.position = TextPosition::TopRight)),
            ("padding", Box::new(|r| r.padding = 11)),
            ("typeface", Box::new(|r| r.typeface = None)),
        ];
        for (name, mutate) in variants {
            let mut req = request();
            mutate(&mut req);
            assert_ne!(fingerprint(&req), base, "{name} should change the key");
        }
    }

    #[test]
    fn fingerprint_fields_do_not_bleed() {
        // "ab" + "c" must not collide with "a" + "bc"
        let mut a = request();
        a.image_path = PathBuf::from("ab");
        a.credit = "c".to_string();
        let mut b = request();
        b.image_path = PathBuf::from("a");
        b.credit = "bc".to_string();
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    // =========================================================================
    // RenderCache
    // =========================================================================

    #[test]
    fn entry_path_is_key_dot_png() {
        let cache = RenderCache::new("/show/cache", 60);
        assert_eq!(
            cache.entry_path("abc"),
            PathBuf::from("/show/cache/abc.png")
        );
    }

    #[test]
    fn lookup_absent_misses() {
        let tmp = TempDir::new().unwrap();
        let cache = RenderCache::new(tmp.path(), 3600);
        assert_eq!(cache.lookup("nope"), None);
    }

    #[test]
    fn store_creates_dir_and_lookup_hits() {
        let tmp = TempDir::new().unwrap();
        let cache = RenderCache::new(tmp.path().join("nested/cache"), 3600);
        cache.store("k", b"png bytes").unwrap();
        assert_eq!(cache.lookup("k"), Some(b"png bytes".to_vec()));
    }

    #[test]
    fn store_overwrites() {
        let tmp = TempDir::new().unwrap();
        let cache = RenderCache::new(tmp.path(), 3600);
        cache.store("k", b"old").unwrap();
        cache.store("k", b"new").unwrap();
        assert_eq!(cache.lookup("k"), Some(b"new".to_vec()));
    }

    #[test]
    fn ttl_boundaries() {
        let tmp = TempDir::new().unwrap();
        let cache = RenderCache::new(tmp.path(), 100);
        cache.store("k", b"data").unwrap();
        let written = fs::metadata(cache.entry_path("k"))
            .unwrap()
            .modified()
            .unwrap();

        let at = |secs| written + Duration::from_secs(secs);
        assert!(cache.lookup_at("k", at(99)).is_some());
        assert!(cache.lookup_at("k", at(100)).is_some());
        assert!(cache.lookup_at("k", at(101)).is_none());
    }

    #[test]
    fn stale_entry_is_kept_on_disk() {
        let tmp = TempDir::new().unwrap();
        let cache = RenderCache::new(tmp.path(), 0);
        cache.store("k", b"data").unwrap();
        let written = fs::metadata(cache.entry_path("k"))
            .unwrap()
            .modified()
            .unwrap();
        assert!(cache.lookup_at("k", written + Duration::from_secs(5)).is_none());
        assert!(cache.entry_path("k").exists());
    }

    #[test]
    fn future_mtime_counts_as_fresh() {
        let tmp = TempDir::new().unwrap();
        let cache = RenderCache::new(tmp.path(), 0);
        cache.store("k", b"data").unwrap();
        let past = SystemTime::now() - Duration::from_secs(3600);
        assert!(cache.lookup_at("k", past).is_some());
    }

    // =========================================================================
    // CacheStats
    // =========================================================================

    #[test]
    fn cache_stats_display_with_hits() {
        let s = CacheStats {
            hits: 5,
            rendered: 2,
            ..Default::default()
        };
        assert_eq!(format!("{}", s), "5 cached, 2 rendered (7 total)");
    }

    #[test]
    fn cache_stats_display_no_hits() {
        let s = CacheStats {
            rendered: 3,
            ..Default::default()
        };
        assert_eq!(format!("{}", s), "3 rendered");
    }

    #[test]
    fn cache_stats_display_passthrough_and_failures() {
        let s = CacheStats {
            hits: 1,
            rendered: 1,
            passthrough: 2,
            failed: 1,
        };
        assert_eq!(
            format!("{}", s),
            "1 cached, 1 rendered (5 total), 2 passed through, 1 failed"
        );
    }

    #[test]
    fn cache_stats_merge_adds() {
        let mut a = CacheStats::default();
        a.hit();
        a.render();
        let mut b = CacheStats::default();
        b.pass();
        b.fail();
        let merged = a.merge(b);
        assert_eq!(merged.total(), 4);
        assert_eq!(merged.passthrough, 1);
    }
}
