//! Candidate selection: which image does this request show?
//!
//! The image folder is listed non-recursively through a [`DirectoryLister`].
//! Every regular file with an allowed extension becomes a candidate, except the
//! fallback image itself (it may live in the same folder). One candidate is
//! drawn uniformly at random; an empty folder yields the fallback candidate.
//!
//! ```text
//! images/
//! ├── alice__cat.png      → candidate, credit "alice"
//! ├── bob__sunset.jpg     → candidate, credit "bob"
//! ├── fallback.png        → skipped (same name as the fallback image)
//! ├── notes.txt           → skipped (extension)
//! └── archive/            → skipped (not a file)
//! ```
//!
//! ## Failure policy
//!
//! - A missing image folder is logged and treated as empty.
//! - The fallback is only resolved when it is needed. If it is not a file at
//!   that point, selection fails with [`SelectError::FallbackMissing`]: there
//!   is nothing left to show.

use crate::credit::extract_credit;
use rand::Rng;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Extensions (lowercase) eligible for the showcase.
pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif"];

#[derive(Error, Debug)]
pub enum SelectError {
    #[error("Fallback image not found: {0}")]
    FallbackMissing(PathBuf),
}

/// Directory access used by the selector.
///
/// The production implementation is [`FsLister`]; tests use an in-memory
/// fixture so selection logic runs without touching the filesystem.
pub trait DirectoryLister: Sync {
    /// Names of the regular files directly inside `dir`.
    ///
    /// Returns `Err` with [`io::ErrorKind::NotFound`] when `dir` does not exist.
    fn list_files(&self, dir: &Path) -> io::Result<Vec<String>>;

    /// Whether `path` is an existing regular file.
    fn is_file(&self, path: &Path) -> bool;
}

/// Filesystem lister backed by `walkdir` at depth 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLister;

impl DirectoryLister for FsLister {
    fn list_files(&self, dir: &Path) -> io::Result<Vec<String>> {
        if !dir.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("not a directory: {}", dir.display()),
            ));
        }
        let mut names = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
        {
            let entry = match entry {
                Ok(entry) => entry,
                // The folder itself is unreadable
                Err(e) if e.depth() == 0 => return Err(io::Error::other(e)),
                // One bad entry (e.g. a dangling symlink) only hides itself
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable directory entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            match entry.file_name().to_str() {
                Some(name) => names.push(name.to_string()),
                None => debug!(
                    name = %entry.file_name().to_string_lossy(),
                    "Skipping file name that is not valid UTF-8"
                ),
            }
        }
        Ok(names)
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }
}

/// The image chosen for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    /// Attribution text; empty means no caption.
    pub credit: String,
    /// Whether this is the configured fallback image.
    pub is_fallback: bool,
}

impl Candidate {
    /// GIFs are served as-is, never re-encoded.
    pub fn is_gif(&self) -> bool {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("gif"))
    }
}

/// Everything the selector needs to know, resolved from the showcase config.
#[derive(Debug, Clone)]
pub struct SelectionConfig {
    pub image_folder: PathBuf,
    pub fallback_image: PathBuf,
    /// Explicit fallback credit. `None` derives it from the fallback filename.
    pub fallback_credit: Option<String>,
    pub delimiter: String,
    pub use_prefix: bool,
}

fn has_allowed_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| ALLOWED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
}

/// Scan the image folder into a `path → credit` map.
///
/// Keyed by full path, so duplicate entries collapse. A missing or unreadable
/// folder is logged and produces an empty map.
pub fn scan_candidates(
    lister: &impl DirectoryLister,
    config: &SelectionConfig,
) -> BTreeMap<PathBuf, String> {
    let fallback_name = config
        .fallback_image
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    let names = match lister.list_files(&config.image_folder) {
        Ok(names) => names,
        Err(e) => {
            warn!(
                folder = %config.image_folder.display(),
                kind = ?e.kind(),
                error = %e,
                "Image directory could not be listed"
            );
            return BTreeMap::new();
        }
    };

    names
        .into_iter()
        .filter(|name| has_allowed_extension(name) && name != fallback_name)
        .filter_map(|name| {
            let path = config.image_folder.join(&name);
            if !lister.is_file(&path) {
                return None;
            }
            let credit = extract_credit(&name, &config.delimiter, config.use_prefix);
            Some((path, credit))
        })
        .collect()
}

/// Resolve the fallback candidate.
///
/// The credit is the configured one, or derived from the fallback filename
/// when none is configured.
pub fn resolve_fallback(
    lister: &impl DirectoryLister,
    config: &SelectionConfig,
) -> Result<Candidate, SelectError> {
    let path = &config.fallback_image;
    if !lister.is_file(path) {
        return Err(SelectError::FallbackMissing(path.clone()));
    }
    let credit = match &config.fallback_credit {
        Some(credit) => credit.clone(),
        None => path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|name| extract_credit(name, &config.delimiter, config.use_prefix))
            .unwrap_or_default(),
    };
    Ok(Candidate {
        path: path.clone(),
        credit,
        is_fallback: true,
    })
}

/// Pick the image for one request.
pub fn select_candidate<R: Rng + ?Sized>(
    lister: &impl DirectoryLister,
    config: &SelectionConfig,
    rng: &mut R,
) -> Result<Candidate, SelectError> {
    let candidates = scan_candidates(lister, config);
    if candidates.is_empty() {
        warn!(
            folder = %config.image_folder.display(),
            "No images found, using fallback"
        );
        return resolve_fallback(lister, config);
    }

    let index = rng.gen_range(0..candidates.len());
    let Some((path, credit)) = candidates.into_iter().nth(index) else {
        return resolve_fallback(lister, config);
    };
    debug!(image = %path.display(), credit = %credit, "Selected candidate");
    Ok(Candidate {
        path,
        credit,
        is_fallback: false,
    })
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::{HashMap, HashSet};

    /// In-memory lister: directories map to file names, plus a set of loose
    /// files that exist outside any listed directory.
    #[derive(Default)]
    pub struct MemoryLister {
        pub dirs: HashMap<PathBuf, Vec<String>>,
        pub files: HashSet<PathBuf>,
    }

    impl MemoryLister {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_dir(mut self, dir: &str, names: &[&str]) -> Self {
            let dir = PathBuf::from(dir);
            for name in names {
                self.files.insert(dir.join(name));
            }
            self.dirs
                .insert(dir, names.iter().map(|n| n.to_string()).collect());
            self
        }

        pub fn with_file(mut self, path: &str) -> Self {
            self.files.insert(PathBuf::from(path));
            self
        }
    }

    impl DirectoryLister for MemoryLister {
        fn list_files(&self, dir: &Path) -> io::Result<Vec<String>> {
            self.dirs
                .get(dir)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such directory"))
        }

        fn is_file(&self, path: &Path) -> bool {
            self.files.contains(path)
        }
    }

    fn selection() -> SelectionConfig {
        SelectionConfig {
            image_folder: PathBuf::from("/show/images"),
            fallback_image: PathBuf::from("/show/fallback/pexels__fallback.jpg"),
            fallback_credit: None,
            delimiter: "__".to_string(),
            use_prefix: true,
        }
    }

    // =========================================================================
    // scan_candidates
    // =========================================================================

    #[test]
    fn scan_filters_extensions_case_insensitively() {
        let lister = MemoryLister::new().with_dir(
            "/show/images",
            &["alice__cat.PNG", "bob__sunset.jpg", "notes.txt", "README"],
        );
        let found = scan_candidates(&lister, &selection());
        let names: Vec<_> = found.keys().map(|p| p.file_name().unwrap()).collect();
        assert_eq!(names, vec!["alice__cat.PNG", "bob__sunset.jpg"]);
    }

    #[test]
    fn scan_extracts_credits() {
        let lister = MemoryLister::new().with_dir("/show/images", &["alice__cat.png", "plain.webp"]);
        let found = scan_candidates(&lister, &selection());
        assert_eq!(found[Path::new("/show/images/alice__cat.png")], "alice");
        assert_eq!(found[Path::new("/show/images/plain.webp")], "");
    }

    #[test]
    fn scan_excludes_fallback_by_name() {
        let lister = MemoryLister::new()
            .with_dir("/show/images", &["pexels__fallback.jpg", "dave__river.jpeg"]);
        let found = scan_candidates(&lister, &selection());
        assert_eq!(found.len(), 1);
        assert!(found.contains_key(Path::new("/show/images/dave__river.jpeg")));
    }

    #[test]
    fn scan_skips_entries_that_are_not_files() {
        let mut lister = MemoryLister::new().with_dir("/show/images", &["a.png", "b.png"]);
        lister.files.remove(Path::new("/show/images/b.png"));
        let found = scan_candidates(&lister, &selection());
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn scan_missing_folder_is_empty() {
        let lister = MemoryLister::new();
        assert!(scan_candidates(&lister, &selection()).is_empty());
    }

    #[test]
    fn scan_collapses_duplicate_paths() {
        let lister = MemoryLister::new().with_dir("/show/images", &["a.png", "a.png"]);
        assert_eq!(scan_candidates(&lister, &selection()).len(), 1);
    }

    // =========================================================================
    // resolve_fallback / select_candidate
    // =========================================================================

    #[test]
    fn empty_folder_selects_fallback_with_derived_credit() {
        let lister = MemoryLister::new()
            .with_dir("/show/images", &[])
            .with_file("/show/fallback/pexels__fallback.jpg");
        let mut rng = StdRng::seed_from_u64(1);
        let chosen = select_candidate(&lister, &selection(), &mut rng).unwrap();
        assert_eq!(
            chosen,
            Candidate {
                path: PathBuf::from("/show/fallback/pexels__fallback.jpg"),
                credit: "pexels".to_string(),
                is_fallback: true,
            }
        );
    }

    #[test]
    fn explicit_fallback_credit_wins() {
        let lister = MemoryLister::new().with_file("/show/fallback/pexels__fallback.jpg");
        let mut config = selection();
        config.fallback_credit = Some("Stock Photo".to_string());
        let chosen = resolve_fallback(&lister, &config).unwrap();
        assert_eq!(chosen.credit, "Stock Photo");
    }

    #[test]
    fn missing_folder_falls_through_to_fallback() {
        let lister = MemoryLister::new().with_file("/show/fallback/pexels__fallback.jpg");
        let mut rng = StdRng::seed_from_u64(1);
        let chosen = select_candidate(&lister, &selection(), &mut rng).unwrap();
        assert!(chosen.is_fallback);
    }

    #[test]
    fn empty_folder_and_missing_fallback_is_an_error() {
        let lister = MemoryLister::new().with_dir("/show/images", &[]);
        let mut rng = StdRng::seed_from_u64(1);
        let result = select_candidate(&lister, &selection(), &mut rng);
        assert!(matches!(result, Err(SelectError::FallbackMissing(_))));
    }

    #[test]
    fn missing_fallback_is_ignored_while_candidates_exist() {
        let lister = MemoryLister::new().with_dir("/show/images", &["bob__sunset.jpg"]);
        let mut rng = StdRng::seed_from_u64(1);
        let chosen = select_candidate(&lister, &selection(), &mut rng).unwrap();
        assert_eq!(chosen.credit, "bob");
        assert!(!chosen.is_fallback);
    }

    #[test]
    fn selection_reaches_every_candidate() {
        let lister = MemoryLister::new()
            .with_dir("/show/images", &["a__1.png", "b__2.png", "c__3.png"]);
        let mut rng = StdRng::seed_from_u64(42);
        let seen: HashSet<String> = (0..200)
            .map(|_| select_candidate(&lister, &selection(), &mut rng).unwrap().credit)
            .collect();
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn same_seed_same_choice() {
        let lister = MemoryLister::new()
            .with_dir("/show/images", &["a__1.png", "b__2.png", "c__3.png"]);
        let first = select_candidate(&lister, &selection(), &mut StdRng::seed_from_u64(7)).unwrap();
        let second = select_candidate(&lister, &selection(), &mut StdRng::seed_from_u64(7)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn gif_detection_ignores_case() {
        let candidate = Candidate {
            path: PathBuf::from("/show/images/loop.GIF"),
            credit: String::new(),
            is_fallback: false,
        };
        assert!(candidate.is_gif());
    }

    // =========================================================================
    // FsLister
    // =========================================================================

    #[test]
    fn fs_lister_lists_only_top_level_files() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("a.png"), b"x").unwrap();
        std::fs::create_dir(tmp.path().join("nested")).unwrap();
        std::fs::write(tmp.path().join("nested/b.png"), b"x").unwrap();

        let mut names = FsLister.list_files(tmp.path()).unwrap();
        names.sort();
        assert_eq!(names, vec!["a.png"]);
    }

    #[cfg(unix)]
    #[test]
    fn fs_lister_skips_dangling_symlink() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("bob__sunset.png"), b"x").unwrap();
        std::os::unix::fs::symlink(
            tmp.path().join("missing.png"),
            tmp.path().join("old__link.png"),
        )
        .unwrap();

        let names = FsLister.list_files(tmp.path()).unwrap();
        assert_eq!(names, vec!["bob__sunset.png"]);

        let config = SelectionConfig {
            image_folder: tmp.path().to_path_buf(),
            fallback_image: tmp.path().join("fallback.png"),
            ..selection()
        };
        let chosen = select_candidate(&FsLister, &config, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(chosen.credit, "bob");
        assert!(!chosen.is_fallback);
    }

    #[test]
    fn fs_lister_missing_dir_is_not_found() {
        let tmp = tempfile::TempDir::new().unwrap();
        let err = FsLister.list_files(&tmp.path().join("nope")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
