//! Image codec backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the decode/encode capability the derivative
//! pipeline depends on: probing a source, decoding its frames, encoding a
//! frame set back into a looping animation, and the whole-image path for
//! still sources. Geometry and per-frame pixel work live outside the backend
//! (see [`operations`](super::operations)), so every backend shares them.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate's GIF codec.

use super::frames::{Frame, RawFrames};
use super::params::{EncodeParams, Geometry, Resample};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Seek};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Pixel dimensions of an image or frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Where encoded image bytes come from.
///
/// Cloning is cheap: in-memory data is shared, never copied.
#[derive(Debug, Clone)]
pub enum Source {
    File(PathBuf),
    Memory(Arc<[u8]>),
}

/// Buffered, seekable reader over a [`Source`].
pub trait SourceReader: BufRead + Seek {}

impl<T: BufRead + Seek> SourceReader for T {}

impl Source {
    pub fn open(&self) -> std::io::Result<Box<dyn SourceReader>> {
        match self {
            Source::File(path) => Ok(Box::new(BufReader::new(File::open(path)?))),
            Source::Memory(bytes) => Ok(Box::new(Cursor::new(Arc::clone(bytes)))),
        }
    }

    /// The complete encoded bytes.
    pub fn read_all(&self) -> std::io::Result<Vec<u8>> {
        match self {
            Source::File(path) => std::fs::read(path),
            Source::Memory(bytes) => Ok(bytes.to_vec()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Source::File(path) => Some(path),
            Source::Memory(_) => None,
        }
    }
}

impl From<Vec<u8>> for Source {
    fn from(bytes: Vec<u8>) -> Self {
        Source::Memory(bytes.into())
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::File(path) => write!(f, "{}", path.display()),
            Source::Memory(bytes) => write!(f, "<{} bytes in memory>", bytes.len()),
        }
    }
}

/// Result of probing a source without decoding its pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInfo {
    pub dimensions: Dimensions,
    /// Mime type of the decoded container format (not of the file extension).
    pub mime_type: String,
    /// More than one frame is present.
    pub animated: bool,
}

/// Trait for codec backends.
///
/// Implementations must be `Sync`: the batch path shares one backend across
/// rayon workers.
pub trait ImageBackend: Sync {
    /// Identify format and dimensions, and count frames far enough to tell
    /// a still from an animation.
    fn probe(&self, source: &Source) -> Result<SourceInfo, BackendError>;

    /// Open the source's frames for decoding, in order.
    fn frames(&self, source: &Source) -> Result<RawFrames, BackendError>;

    /// Encode frames and their durations into one infinitely looping animation.
    ///
    /// All frames must share the same dimensions.
    fn encode_animation(
        &self,
        frames: Vec<Frame>,
        params: EncodeParams,
    ) -> Result<Vec<u8>, BackendError>;

    /// Whole-image path for still sources: decode, crop and scale per
    /// `geometry`, then re-encode in the source's own format.
    fn render_still(
        &self,
        source: &Source,
        geometry: &Geometry,
        filter: Resample,
    ) -> Result<Vec<u8>, BackendError>;
}
