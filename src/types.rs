//! Records exchanged with callers of the editor.
//!
//! These types are serialized to JSON by the CLI (`multi-resize --json`) and
//! are the shape a host framework stores as attachment metadata.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A named target size for the batch path.
///
/// A `None` or `0` dimension is unbounded. A spec with no bounded dimension
/// at all is skipped rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSizeSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default)]
    pub crop: bool,
}

impl TargetSizeSpec {
    pub fn new(name: &str, width: Option<u32>, height: Option<u32>, crop: bool) -> Self {
        Self {
            name: name.to_string(),
            width,
            height,
            crop,
        }
    }

    /// Width bound, with `0` treated as absent.
    pub fn max_width(&self) -> Option<u32> {
        self.width.filter(|&w| w > 0)
    }

    /// Height bound, with `0` treated as absent.
    pub fn max_height(&self) -> Option<u32> {
        self.height.filter(|&h| h > 0)
    }

    /// True when the spec bounds neither dimension.
    pub fn is_unbounded(&self) -> bool {
        self.max_width().is_none() && self.max_height().is_none()
    }
}

/// A derivative written to storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedImage {
    /// Full path of the written file.
    pub path: PathBuf,
    /// Base name of the written file.
    pub file: String,
    pub width: u32,
    pub height: u32,
    pub mime_type: String,
}

/// Batch result entry: a [`SavedImage`] without its filesystem path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivativeInfo {
    pub file: String,
    pub width: u32,
    pub height: u32,
    pub mime_type: String,
}

impl From<SavedImage> for DerivativeInfo {
    fn from(saved: SavedImage) -> Self {
        Self {
            file: saved.file,
            width: saved.width,
            height: saved.height,
            mime_type: saved.mime_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_dimensions_are_unbounded() {
        let spec = TargetSizeSpec::new("off", Some(0), Some(0), false);
        assert!(spec.is_unbounded());
        assert!(TargetSizeSpec::new("none", None, None, true).is_unbounded());
        assert!(!TargetSizeSpec::new("wide", Some(768), Some(0), false).is_unbounded());
    }

    #[test]
    fn derivative_info_drops_path() {
        let info = DerivativeInfo::from(SavedImage {
            path: PathBuf::from("/u/cat-150x150.gif"),
            file: "cat-150x150.gif".into(),
            width: 150,
            height: 150,
            mime_type: "image/gif".into(),
        });
        let json = serde_json::to_value(&info).unwrap();
        assert!(json.get("path").is_none());
        assert_eq!(json["file"], "cat-150x150.gif");
        assert_eq!(json["mime_type"], "image/gif");
    }
}
