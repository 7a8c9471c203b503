//! CLI output formatting.
//!
//! # Information-First Display
//!
//! The primary display for every image is its credit, the thing a visitor
//! sees. Filesystem paths are secondary context on indented `Source:` lines,
//! relative to the showcase folder.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Images (3)
//! 001 alice
//!     Source: images/alice__cat.png
//! 002 (plain.webp)
//!     Source: images/plain.webp
//! 003 carol [gif, passed through]
//!     Source: images/carol__loop.gif
//!
//! Fallback
//!     Credit: pexels
//!     Source: fallback.png
//!
//! Caption
//!     Font: fonts/OpenSans-Regular.ttf
//!     bottom-left, 16px, padding 10
//!
//! Cache
//!     cache/ (ttl 3600s)
//! ```
//!
//! ## Render
//!
//! ```text
//! bob → images/bob__sunset.jpg (rendered, 48213 bytes)
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns lines) for testability and
//! a `print_*` wrapper that does the writing. Format functions are pure: no
//! I/O, no side effects.

use crate::config::ShowcaseConfig;
use crate::pipeline::{ServeOrigin, Served};
use crate::select::Candidate;
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `path` relative to `root` when it lives below it, as-is otherwise.
fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

/// Image line: credited images show the credit, uncredited show the filename.
///
/// ```text
/// 001 alice          // credited
/// 002 (plain.webp)   // uncredited, filename is the identity
/// ```
fn image_line(index: usize, candidate: &Candidate) -> String {
    let label = if candidate.credit.is_empty() {
        let name = candidate
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("({})", name)
    } else {
        candidate.credit.clone()
    };
    if candidate.is_gif() {
        format!("{} {} [gif, passed through]", format_index(index), label)
    } else {
        format!("{} {}", format_index(index), label)
    }
}

/// Inventory report for the `check` command.
///
/// `inventory` is every selectable image followed by the fallback (if found),
/// as returned by [`Showcase::inventory`](crate::pipeline::Showcase::inventory).
/// `typeface` is the loaded caption font, `None` for the bitmap font.
pub fn format_check_output(
    config: &ShowcaseConfig,
    inventory: &[Candidate],
    typeface: Option<&str>,
) -> Vec<String> {
    let root = config.root.as_path();
    let mut lines = Vec::new();

    let images: Vec<&Candidate> = inventory.iter().filter(|c| !c.is_fallback).collect();
    lines.push(format!("Images ({})", images.len()));
    if images.is_empty() {
        lines.push(format!(
            "{}none in {}",
            indent(1),
            display_path(&config.image_folder, root)
        ));
    }
    for (i, candidate) in images.iter().enumerate() {
        lines.push(image_line(i + 1, candidate));
        lines.push(format!(
            "{}Source: {}",
            indent(1),
            display_path(&candidate.path, root)
        ));
    }

    lines.push(String::new());
    lines.push("Fallback".to_string());
    match inventory.iter().find(|c| c.is_fallback) {
        Some(fallback) => {
            if !fallback.credit.is_empty() {
                lines.push(format!("{}Credit: {}", indent(1), fallback.credit));
            }
            lines.push(format!(
                "{}Source: {}",
                indent(1),
                display_path(&fallback.path, root)
            ));
        }
        None => lines.push(format!(
            "{}Missing: {}",
            indent(1),
            display_path(&config.fallback_image, root)
        )),
    }

    lines.push(String::new());
    lines.push("Caption".to_string());
    match typeface {
        Some(font) => lines.push(format!(
            "{}Font: {}",
            indent(1),
            display_path(Path::new(font), root)
        )),
        None => lines.push(format!(
            "{}Font: built-in bitmap ({} not loaded)",
            indent(1),
            display_path(&config.font_path, root)
        )),
    }
    lines.push(format!(
        "{}{}, {}px, padding {}",
        indent(1),
        config.position,
        config.font_size,
        config.padding
    ));

    lines.push(String::new());
    lines.push("Cache".to_string());
    lines.push(format!(
        "{}{}/ (ttl {}s)",
        indent(1),
        display_path(&config.cache_dir, root),
        config.cache_ttl
    ));

    lines
}

/// Print the `check` report to stdout.
pub fn print_check_output(config: &ShowcaseConfig, inventory: &[Candidate], typeface: Option<&str>) {
    for line in format_check_output(config, inventory, typeface) {
        println!("{}", line);
    }
}

/// One-line summary of a served request.
///
/// ```text
/// bob → images/bob__sunset.jpg (cached, 48213 bytes)
/// (no credit) → fallback.png (rendered, 9120 bytes)
/// ```
pub fn format_served(served: &Served, root: &Path) -> String {
    let origin = match served.origin {
        ServeOrigin::Cache => "cached",
        ServeOrigin::Rendered => "rendered",
        ServeOrigin::Passthrough => "passed through",
    };
    let credit = if served.credit.is_empty() {
        "(no credit)"
    } else {
        served.credit.as_str()
    };
    format!(
        "{} → {} ({}, {} bytes)",
        credit,
        display_path(&served.image, root),
        origin,
        served.body.len()
    )
}

/// Print the served summary to stderr, keeping stdout free for image bytes.
pub fn print_served(served: &Served, root: &Path) {
    eprintln!("{}", format_served(served, root));
}
