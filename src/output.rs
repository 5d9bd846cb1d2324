//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Every entity leads with its identity (file name, or size name for batch
//! entries), with details as indented context lines.
//!
//! # Output Format
//!
//! ## Probe
//!
//! ```text
//! spin.gif
//!     Size: 480x270
//!     Type: image/gif, animated (24 frames)
//! ```
//!
//! ## Save
//!
//! ```text
//! spin-300x169.gif (300x169)
//!     Path: uploads/spin-300x169.gif
//!     Type: image/gif
//! ```
//!
//! ## Multi-resize
//!
//! ```text
//! spin.gif: 3 of 4 sizes
//!     large → spin-1024x576.gif (1024x576)
//!     medium → spin-300x169.gif (300x169)
//!     thumbnail → spin-150x150.gif (150x150)
//!     medium_large: skipped
//! ```
//!
//! # Architecture
//!
//! Each display has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::editor::ImageKind;
use crate::imaging::Dimensions;
use crate::types::{DerivativeInfo, SavedImage};
use std::collections::BTreeMap;
use std::path::Path;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// File name of a path, falling back to the whole path.
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// What `probe` reports about an image.
#[derive(Debug, Clone)]
pub struct ProbeSummary<'a> {
    pub file: &'a Path,
    pub dimensions: Dimensions,
    pub mime_type: &'a str,
    pub kind: ImageKind,
    pub frames: usize,
}

// ============================================================================
// Probe
// ============================================================================

pub fn format_probe(summary: &ProbeSummary<'_>) -> Vec<String> {
    let kind = match summary.kind {
        ImageKind::Animated => format!("animated ({} frames)", summary.frames),
        ImageKind::Static => "still".to_string(),
    };
    vec![
        display_name(summary.file),
        format!("{}Size: {}", indent(1), summary.dimensions),
        format!("{}Type: {}, {}", indent(1), summary.mime_type, kind),
    ]
}

pub fn print_probe(summary: &ProbeSummary<'_>) {
    for line in format_probe(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Save
// ============================================================================

pub fn format_saved(saved: &SavedImage) -> Vec<String> {
    vec![
        format!("{} ({}x{})", saved.file, saved.width, saved.height),
        format!("{}Path: {}", indent(1), saved.path.display()),
        format!("{}Type: {}", indent(1), saved.mime_type),
    ]
}

pub fn print_saved(saved: &SavedImage) {
    for line in format_saved(saved) {
        println!("{}", line);
    }
}

// ============================================================================
// Multi-resize
// ============================================================================

/// Format batch results. `requested` lists every size name that was asked
/// for, in order; names absent from `results` are shown as skipped.
pub fn format_batch(
    source: &Path,
    requested: &[String],
    results: &BTreeMap<String, DerivativeInfo>,
) -> Vec<String> {
    let mut lines = vec![format!(
        "{}: {} of {} sizes",
        display_name(source),
        results.len(),
        requested.len()
    )];

    for (name, info) in results {
        lines.push(format!(
            "{}{} → {} ({}x{})",
            indent(1),
            name,
            info.file,
            info.width,
            info.height
        ));
    }
    for name in requested.iter().filter(|n| !results.contains_key(*n)) {
        lines.push(format!("{}{}: skipped", indent(1), name));
    }
    lines
}

pub fn print_batch(
    source: &Path,
    requested: &[String],
    results: &BTreeMap<String, DerivativeInfo>,
) {
    for line in format_batch(source, requested, results) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn info(file: &str, width: u32, height: u32) -> DerivativeInfo {
        DerivativeInfo {
            file: file.into(),
            width,
            height,
            mime_type: "image/gif".into(),
        }
    }

    #[test]
    fn probe_animated() {
        let lines = format_probe(&ProbeSummary {
            file: Path::new("/uploads/spin.gif"),
            dimensions: Dimensions::new(480, 270),
            mime_type: "image/gif",
            kind: ImageKind::Animated,
            frames: 24,
        });
        assert_eq!(
            lines,
            vec![
                "spin.gif",
                "    Size: 480x270",
                "    Type: image/gif, animated (24 frames)",
            ]
        );
    }

    #[test]
    fn probe_still() {
        let lines = format_probe(&ProbeSummary {
            file: Path::new("logo.png"),
            dimensions: Dimensions::new(64, 64),
            mime_type: "image/png",
            kind: ImageKind::Static,
            frames: 1,
        });
        assert_eq!(lines[2], "    Type: image/png, still");
    }

    #[test]
    fn saved_lines() {
        let lines = format_saved(&SavedImage {
            path: PathBuf::from("uploads/spin-300x169.gif"),
            file: "spin-300x169.gif".into(),
            width: 300,
            height: 169,
            mime_type: "image/gif".into(),
        });
        assert_eq!(
            lines,
            vec![
                "spin-300x169.gif (300x169)",
                "    Path: uploads/spin-300x169.gif",
                "    Type: image/gif",
            ]
        );
    }

    #[test]
    fn batch_lists_results_then_skipped() {
        let requested: Vec<String> = ["thumbnail", "medium", "large"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mut results = BTreeMap::new();
        results.insert("thumbnail".to_string(), info("spin-150x150.gif", 150, 150));
        results.insert("medium".to_string(), info("spin-300x169.gif", 300, 169));

        let lines = format_batch(Path::new("spin.gif"), &requested, &results);
        assert_eq!(
            lines,
            vec![
                "spin.gif: 2 of 3 sizes",
                "    medium → spin-300x169.gif (300x169)",
                "    thumbnail → spin-150x150.gif (150x150)",
                "    large: skipped",
            ]
        );
    }

    #[test]
    fn batch_with_nothing_produced() {
        let lines = format_batch(
            Path::new("a.gif"),
            &["large".to_string()],
            &BTreeMap::new(),
        );
        assert_eq!(lines, vec!["a.gif: 0 of 1 sizes", "    large: skipped"]);
    }
}
