//! Request pipeline: pick an image, return display-ready bytes.
//!
//! ```text
//! select ──► GIF? ──yes──► read ──► Passthrough
//!              │
//!              no
//!              ▼
//!        cache lookup ──hit──► Cache
//!              │
//!             miss
//!              ▼
//!   read ──► decode ──► fit ──► caption ──► encode ──► store ──► Rendered
//! ```
//!
//! ## Failure handling
//!
//! A read or render failure on a regular candidate is retried exactly once
//! with the fallback image. If the fallback fails too (or was the candidate in
//! the first place) the request fails with [`ShowcaseError::NoValidImage`].
//! Failing to write the cache is only logged; the fresh image is still served.
//!
//! ## Parallel warm-up
//!
//! [`Showcase::warm`] renders every candidate into the cache using
//! [rayon](https://docs.rs/rayon). The pool size comes from
//! `[processing] max_processes`.

use crate::cache::{CacheStats, RenderCache, fingerprint};
use crate::config::{ConfigError, ShowcaseConfig};
use crate::imaging::{RenderError, RenderRequest, Renderer};
use crate::select::{
    Candidate, DirectoryLister, FsLister, SelectError, resolve_fallback, scan_candidates,
    select_candidate,
};
use rand::Rng;
use rayon::prelude::*;
use std::path::PathBuf;
use std::time::SystemTime;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ShowcaseError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Select(#[from] SelectError),
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to render {}: {source}", path.display())]
    Render {
        path: PathBuf,
        #[source]
        source: RenderError,
    },
    #[error("Failed to write cache entry {}: {source}", path.display())]
    CacheWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("No valid image to display: {0}")]
    NoValidImage(#[source] Box<ShowcaseError>),
}

impl ShowcaseError {
    /// Generic text safe to show to clients. Details stay in the logs.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::Config(ConfigError::Missing(_)) => "Settings file missing in showcase folder.",
            Self::Config(_) => "Invalid settings in showcase folder.",
            Self::Select(_) => "Fallback image missing.",
            Self::Read { .. } => "Failed to fetch image.",
            Self::Render { .. } | Self::CacheWrite { .. } => "Failed to process image.",
            Self::NoValidImage(_) => "No valid image to display.",
        }
    }
}

/// How a response body was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeOrigin {
    /// Fresh entry from the render cache.
    Cache,
    /// Rendered for this request.
    Rendered,
    /// Source bytes served unmodified (GIF).
    Passthrough,
}

impl ServeOrigin {
    /// Value for the `X-Cache` response header.
    pub fn cache_header(self) -> &'static str {
        match self {
            Self::Cache => "HIT",
            Self::Rendered => "MISS",
            Self::Passthrough => "PASS",
        }
    }
}

/// A response ready to hand to the client.
#[derive(Debug, Clone)]
pub struct Served {
    pub body: Vec<u8>,
    pub content_type: &'static str,
    pub origin: ServeOrigin,
    /// Source image that was shown.
    pub image: PathBuf,
    pub credit: String,
}

/// A configured showcase. Shared across requests; every method takes `&self`.
pub struct Showcase<L: DirectoryLister = FsLister> {
    config: ShowcaseConfig,
    lister: L,
    renderer: Renderer,
    cache: RenderCache,
}

impl Showcase<FsLister> {
    pub fn new(config: ShowcaseConfig) -> Self {
        Self::with_lister(config, FsLister)
    }
}

impl<L: DirectoryLister> Showcase<L> {
    /// Build a showcase over a custom directory lister.
    ///
    /// Loads the caption font once; a missing font degrades to the bitmap font.
    pub fn with_lister(config: ShowcaseConfig, lister: L) -> Self {
        let renderer = Renderer::with_font_file(&config.font_path);
        let cache = RenderCache::new(config.cache_dir.clone(), config.cache_ttl);
        Self {
            config,
            lister,
            renderer,
            cache,
        }
    }

    pub fn config(&self) -> &ShowcaseConfig {
        &self.config
    }

    pub fn cache(&self) -> &RenderCache {
        &self.cache
    }

    /// The loaded caption font, `None` when captions use the bitmap font.
    pub fn typeface(&self) -> Option<String> {
        self.renderer.typeface()
    }

    /// Serve one request with the thread-local RNG and the current time.
    pub fn serve(&self) -> Result<Served, ShowcaseError> {
        self.serve_with(&mut rand::thread_rng(), SystemTime::now())
    }

    /// Serve one request with an explicit RNG and clock.
    pub fn serve_with<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        now: SystemTime,
    ) -> Result<Served, ShowcaseError> {
        let selection = self.config.selection();
        let candidate = select_candidate(&self.lister, &selection, rng)?;

        match self.serve_candidate(&candidate, now) {
            Ok(served) => Ok(served),
            Err(e) if candidate.is_fallback => Err(ShowcaseError::NoValidImage(Box::new(e))),
            Err(e) => {
                warn!(
                    image = %candidate.path.display(),
                    error = %e,
                    "Image failed, substituting fallback"
                );
                let fallback = resolve_fallback(&self.lister, &selection)
                    .map_err(|e| ShowcaseError::NoValidImage(Box::new(e.into())))?;
                self.serve_candidate(&fallback, now)
                    .map_err(|e| ShowcaseError::NoValidImage(Box::new(e)))
            }
        }
    }

    /// Produce the response body for one candidate, without fallback handling.
    pub fn serve_candidate(
        &self,
        candidate: &Candidate,
        now: SystemTime,
    ) -> Result<Served, ShowcaseError> {
        if candidate.is_gif() {
            let body = self.read_source(candidate)?;
            debug!(image = %candidate.path.display(), "Passing GIF through");
            return Ok(Served {
                body,
                content_type: "image/gif",
                origin: ServeOrigin::Passthrough,
                image: candidate.path.clone(),
                credit: candidate.credit.clone(),
            });
        }

        let req = self.request_for(candidate);
        let key = fingerprint(&req);
        if let Some(body) = self.cache.lookup_at(&key, now) {
            debug!(image = %candidate.path.display(), key = %key, "Cache hit");
            return Ok(Served {
                body,
                content_type: "image/png",
                origin: ServeOrigin::Cache,
                image: req.image_path,
                credit: req.credit,
            });
        }

        let body = self.render(candidate, &req)?;
        if let Err(e) = self.cache.store(&key, &body) {
            warn!(
                dir = %self.cache.dir().display(),
                error = %e,
                "Failed to write cache entry"
            );
        }
        debug!(image = %candidate.path.display(), key = %key, "Rendered");
        Ok(Served {
            body,
            content_type: "image/png",
            origin: ServeOrigin::Rendered,
            image: req.image_path,
            credit: req.credit,
        })
    }

    /// The render request for `candidate` under this showcase's settings.
    pub fn request_for(&self, candidate: &Candidate) -> RenderRequest {
        let c = &self.config;
        RenderRequest {
            image_path: candidate.path.clone(),
            credit: candidate.credit.clone(),
            width: c.width,
            height: c.height,
            font_size: c.font_size,
            angle: c.angle,
            font_color: c.font_color,
            shadow_color: c.shadow_color,
            position: c.position,
            padding: c.padding,
            typeface: self.renderer.typeface(),
        }
    }

    /// Every candidate the selector could return, plus the fallback if present.
    pub fn inventory(&self) -> Vec<Candidate> {
        let selection = self.config.selection();
        let mut all: Vec<Candidate> = scan_candidates(&self.lister, &selection)
            .into_iter()
            .map(|(path, credit)| Candidate {
                path,
                credit,
                is_fallback: false,
            })
            .collect();
        if let Ok(fallback) = resolve_fallback(&self.lister, &selection) {
            all.push(fallback);
        }
        all
    }

    /// Render every candidate into the cache in parallel.
    ///
    /// Fresh entries are left alone, GIFs are counted and skipped, and
    /// failures are logged and counted rather than aborting the run.
    pub fn warm(&self) -> CacheStats {
        let now = SystemTime::now();
        let candidates = self.inventory();
        info!(count = candidates.len(), "Warming cache");

        candidates
            .par_iter()
            .map(|candidate| {
                let mut stats = CacheStats::default();
                if candidate.is_gif() {
                    stats.pass();
                    return stats;
                }
                let req = self.request_for(candidate);
                let key = fingerprint(&req);
                if self.cache.lookup_at(&key, now).is_some() {
                    stats.hit();
                    return stats;
                }
                match self
                    .render(candidate, &req)
                    .and_then(|body| self.store(&key, &body))
                {
                    Ok(()) => stats.render(),
                    Err(e) => {
                        warn!(image = %candidate.path.display(), error = %e, "Warm-up failed");
                        stats.fail();
                    }
                }
                stats
            })
            .reduce(CacheStats::default, CacheStats::merge)
    }

    fn read_source(&self, candidate: &Candidate) -> Result<Vec<u8>, ShowcaseError> {
        std::fs::read(&candidate.path).map_err(|source| ShowcaseError::Read {
            path: candidate.path.clone(),
            source,
        })
    }

    fn render(&self, candidate: &Candidate, req: &RenderRequest) -> Result<Vec<u8>, ShowcaseError> {
        let source = self.read_source(candidate)?;
        self.renderer
            .render(req, &source)
            .map_err(|source| ShowcaseError::Render {
                path: candidate.path.clone(),
                source,
            })
    }

    fn store(&self, key: &str, body: &[u8]) -> Result<(), ShowcaseError> {
        self.cache
            .store(key, body)
            .map_err(|source| ShowcaseError::CacheWrite {
                path: self.cache.entry_path(key),
                source,
            })
    }
}
