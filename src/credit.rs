//! Attribution parsing for the `<credit><delimiter><rest>` filename convention.
//!
//! Showcase images carry their artist credit in the filename. Depending on
//! `use_artist_prefix`, the credit is either the part before the delimiter or
//! the part after it:
//!
//! - prefix mode: `alice__cat.png` → "alice"
//! - suffix mode: `cat__alice.png` → "alice"
//!
//! In suffix mode the credit sits next to the extension, so a trailing image
//! extension is dropped before trimming. Files without the delimiter get no
//! credit at all.

use crate::select::ALLOWED_EXTENSIONS;

/// Extract the artist credit from a filename.
///
/// Splits at the first occurrence of `delimiter`. Returns an empty string when
/// the delimiter is absent or the chosen side is blank after trimming.
pub fn extract_credit(filename: &str, delimiter: &str, use_prefix: bool) -> String {
    if delimiter.is_empty() {
        return String::new();
    }
    let Some((head, tail)) = filename.split_once(delimiter) else {
        return String::new();
    };
    let part = if use_prefix {
        head
    } else {
        strip_image_extension(tail)
    };
    part.trim().to_string()
}

/// Drop a trailing `.png`/`.jpg`/... from `name`, leaving anything else alone.
///
/// Only known image extensions are stripped so that credits containing dots
/// ("J. Smith") survive intact.
fn strip_image_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, ext))
            if ALLOWED_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed)) =>
        {
            stem
        }
        _ => name,
    }
}
