//! Derivative filenames and the mime ↔ extension mapping.
//!
//! A derivative saved without an explicit filename lands next to its source,
//! named after the source stem plus its pixel size:
//! - `cat.gif` at 150×150 → `cat-150x150.gif`
//! - `uploads/2024/spin.GIF` at 300×169 → `uploads/2024/spin-300x169.gif`
//!
//! The extension always follows the mime type being written, never the
//! source's own extension.

use crate::imaging::Dimensions;
use std::path::{Path, PathBuf};

/// Mime types this crate can write, with their canonical extension.
const MIME_EXTENSIONS: &[(&str, &str)] = &[
    ("image/gif", "gif"),
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/webp", "webp"),
];

/// Canonical file extension for a mime type.
pub fn extension_for_mime(mime_type: &str) -> Option<&'static str> {
    MIME_EXTENSIONS
        .iter()
        .find(|(mime, _)| mime.eq_ignore_ascii_case(mime_type))
        .map(|(_, ext)| *ext)
}

/// Mime type for a file extension (case-insensitive, `jpeg` accepted).
pub fn mime_for_extension(extension: &str) -> Option<&'static str> {
    let ext = extension.to_ascii_lowercase();
    let ext = if ext == "jpeg" { "jpg" } else { ext.as_str() };
    MIME_EXTENSIONS
        .iter()
        .find(|(_, e)| *e == ext)
        .map(|(mime, _)| *mime)
}

/// File stem of the source, or a placeholder when it has none.
fn source_stem(source: &Path) -> String {
    source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "image".to_string())
}

/// Path for a derivative of `source` at `size`, in the source's directory.
pub fn derivative_filename(source: &Path, size: Dimensions, extension: &str) -> PathBuf {
    let name = format!(
        "{}-{}x{}.{}",
        source_stem(source),
        size.width,
        size.height,
        extension
    );
    match source.parent() {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}
