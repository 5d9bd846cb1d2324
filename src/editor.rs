//! Derivative orchestration: the editor a host framework drives.
//!
//! An [`Editor`] is loaded from a file or an in-memory buffer, probed once,
//! and classified as [`ImageKind::Static`] or [`ImageKind::Animated`]. The
//! kind picks the render path for every later request, exclusively:
//!
//! ```text
//! Static    decode still → crop/scale → encode in the source format
//! Animated  extract frames → transform each → reassemble looping GIF
//! ```
//!
//! ## Single-size path
//!
//! [`Editor::resize`] and [`Editor::crop`] resolve geometry against the
//! *current* size, render from the current image (the last pending result,
//! or the loaded source), and keep the encoded bytes pending until
//! [`Editor::save`] or [`Editor::stream`]. Requesting the current size is a
//! no-op that decodes nothing.
//!
//! ## Batch path
//!
//! [`Editor::multi_resize`] renders every [`TargetSizeSpec`] from the loaded
//! original, in parallel. Each spec resolves its geometry from an immutable
//! snapshot of the original dimensions, so siblings never compound and the
//! editor's own current size and pending result are left as they were.
//! Failures are logged and omitted from the result; an all-failing batch
//! yields an empty map, not an error.

use crate::config::EditorConfig;
use crate::imaging::{
    CropRequest, Dimensions, EncodeParams, Geometry, GeometryError, ImageBackend, Resample,
    Source, assemble, crop_geometry, extract, is_multiframe, resolve_geometry, transform_all,
};
use crate::naming::{derivative_filename, extension_for_mime, mime_for_extension};
use crate::store::{DerivativeStore, OutputChannel, SaveRequest};
use crate::types::{DerivativeInfo, SavedImage, TargetSizeSpec};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// The only mime type the frame pipeline accepts.
pub const ANIMATED_MIME_TYPE: &str = "image/gif";

/// Errors from editor operations. Every variant names the source file.
#[derive(Error, Debug)]
pub enum EditorError {
    #[error("{file}: {source}", file = .path.display())]
    Dimension {
        path: PathBuf,
        #[source]
        source: GeometryError,
    },
    #[error("{file}: could not load image: {message}", file = .path.display())]
    Load { path: PathBuf, message: String },
    #[error("{file}: no frames could be extracted: {message}", file = .path.display())]
    Extract { path: PathBuf, message: String },
    #[error("{file}: no frames survived the transform ({dropped} dropped)", file = .path.display())]
    Transform { path: PathBuf, dropped: usize },
    #[error("{file}: encoding failed: {message}", file = .path.display())]
    Encode { path: PathBuf, message: String },
    #[error("{file}: could not save image: {message}", file = .path.display())]
    Save { path: PathBuf, message: String },
    #[error("{file}: could not stream image: {message}", file = .path.display())]
    Stream { path: PathBuf, message: String },
}

/// How a loaded image is rendered, decided once at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Static,
    Animated,
}

/// Rendering options shared by every request of one editor.
#[derive(Debug, Clone, Copy, Default)]
pub struct EditOptions {
    pub filter: Resample,
    pub encode: EncodeParams,
}

impl EditOptions {
    pub fn from_config(config: &EditorConfig) -> Self {
        Self {
            filter: config.resample.filter,
            encode: config.encode_params(),
        }
    }
}

/// Whether the frame pipeline handles this mime type.
pub fn supports_mime_type(mime_type: &str) -> bool {
    mime_type.eq_ignore_ascii_case(ANIMATED_MIME_TYPE)
}

/// Whether the file at `path` holds more than one frame.
pub fn probe_animated(backend: &impl ImageBackend, path: &Path) -> Result<bool, EditorError> {
    is_multiframe(backend, &Source::File(path.to_path_buf())).map_err(|e| EditorError::Load {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// An image being edited, plus the collaborators it renders and saves with.
pub struct Editor<'a, B: ImageBackend, S: DerivativeStore> {
    backend: &'a B,
    store: &'a S,
    options: EditOptions,
    file: PathBuf,
    /// Path the origin was loaded as; batch derivatives are named after it.
    origin_file: PathBuf,
    mime_type: String,
    kind: ImageKind,
    origin: Source,
    original: Dimensions,
    size: Dimensions,
    pending: Option<Arc<[u8]>>,
}

impl<'a, B: ImageBackend, S: DerivativeStore> Editor<'a, B, S> {
    /// Load and probe an image file.
    pub fn load(
        backend: &'a B,
        store: &'a S,
        options: EditOptions,
        path: impl Into<PathBuf>,
    ) -> Result<Self, EditorError> {
        let path = path.into();
        let origin = Source::File(path.clone());
        Self::open(backend, store, options, path, origin)
    }

    /// Load and probe an in-memory image. `name` stands in for the file path
    /// in diagnostics and generated filenames.
    pub fn load_from_memory(
        backend: &'a B,
        store: &'a S,
        options: EditOptions,
        name: impl Into<PathBuf>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Result<Self, EditorError> {
        Self::open(backend, store, options, name.into(), Source::Memory(bytes.into()))
    }

    fn open(
        backend: &'a B,
        store: &'a S,
        options: EditOptions,
        file: PathBuf,
        origin: Source,
    ) -> Result<Self, EditorError> {
        let info = backend.probe(&origin).map_err(|e| EditorError::Load {
            path: file.clone(),
            message: e.to_string(),
        })?;
        let kind = if info.animated {
            ImageKind::Animated
        } else {
            ImageKind::Static
        };
        debug!(
            file = %file.display(),
            size = %info.dimensions,
            mime = %info.mime_type,
            ?kind,
            "loaded image"
        );

        Ok(Self {
            backend,
            store,
            options,
            origin_file: file.clone(),
            file,
            mime_type: info.mime_type,
            kind,
            origin,
            original: info.dimensions,
            size: info.dimensions,
            pending: None,
        })
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn kind(&self) -> ImageKind {
        self.kind
    }

    /// Size of the current image (after any resize/crop).
    pub fn size(&self) -> Dimensions {
        self.size
    }

    /// Size of the image as loaded.
    pub fn original_size(&self) -> Dimensions {
        self.original
    }

    /// True when a resize/crop result is waiting to be saved or streamed.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Number of decodable frames in the current image.
    pub fn frame_count(&self) -> Result<usize, EditorError> {
        if self.kind == ImageKind::Static {
            return Ok(1);
        }
        let sequence = extract(self.backend, &self.working_source())
            .map_err(|e| self.extract_error(e.to_string()))?;
        Ok(sequence.count())
    }

    /// Scale the current image to fit (or, with `crop`, fill) the box.
    ///
    /// `None` or `0` leaves an edge free. Asking for exactly the current size
    /// succeeds without decoding anything.
    pub fn resize(
        &mut self,
        max_w: Option<u32>,
        max_h: Option<u32>,
        crop: bool,
    ) -> Result<(), EditorError> {
        let max_w = max_w.filter(|&w| w > 0);
        let max_h = max_h.filter(|&h| h > 0);
        if max_w == Some(self.size.width) && max_h == Some(self.size.height) {
            debug!(file = %self.file.display(), size = %self.size, "already at requested size");
            return Ok(());
        }

        let geometry = resolve_geometry(self.size.as_tuple(), max_w, max_h, crop)
            .map_err(|e| self.dimension_error(e))?;
        self.apply(&geometry)
    }

    /// Cut a region out of the current image, optionally scaling it.
    pub fn crop(&mut self, request: &CropRequest) -> Result<(), EditorError> {
        let geometry =
            crop_geometry(self.size.as_tuple(), request).map_err(|e| self.dimension_error(e))?;
        self.apply(&geometry)
    }

    fn apply(&mut self, geometry: &Geometry) -> Result<(), EditorError> {
        let bytes = self.render(&self.working_source(), geometry)?;
        self.pending = Some(bytes.into());
        self.size = Dimensions::new(geometry.dest_w, geometry.dest_h);
        Ok(())
    }

    /// Render one derivative per spec from the loaded original and save each.
    ///
    /// Specs with no dimension, specs that resolve to the original size, and
    /// specs that fail are absent from the result.
    pub fn multi_resize(&self, specs: &[TargetSizeSpec]) -> BTreeMap<String, DerivativeInfo> {
        let original = self.original;
        specs
            .par_iter()
            .filter_map(|spec| {
                if spec.is_unbounded() {
                    debug!(size = %spec.name, "skipping size with no dimensions");
                    return None;
                }
                match self.derive(spec, original) {
                    Ok(Some(info)) => Some((spec.name.clone(), info)),
                    Ok(None) => {
                        debug!(size = %spec.name, "skipping size equal to the original");
                        None
                    }
                    Err(e) => {
                        warn!(size = %spec.name, error = %e, "skipping size that failed");
                        None
                    }
                }
            })
            .collect()
    }

    fn derive(
        &self,
        spec: &TargetSizeSpec,
        original: Dimensions,
    ) -> Result<Option<DerivativeInfo>, EditorError> {
        let geometry = match resolve_geometry(
            original.as_tuple(),
            spec.max_width(),
            spec.max_height(),
            spec.crop,
        ) {
            Ok(geometry) => geometry,
            Err(GeometryError::Unchanged(..)) => return Ok(None),
            Err(e) => return Err(self.dimension_error(e)),
        };

        let bytes = self.render(&self.origin, &geometry)?;
        let dimensions = Dimensions::new(geometry.dest_w, geometry.dest_h);
        let extension = self.extension_for(&self.mime_type)?;
        let path = derivative_filename(&self.origin_file, dimensions, extension);
        let saved = self.write(&path, &bytes, dimensions, &self.mime_type)?;
        Ok(Some(saved.into()))
    }

    /// Persist the current image.
    ///
    /// Without a filename the image is written next to the source as
    /// `{stem}-{w}x{h}.{ext}`. With nothing pending, the current image's own
    /// bytes are written. Afterwards the editor's file and mime type follow
    /// the saved output.
    pub fn save(
        &mut self,
        filename: Option<&Path>,
        mime_type: Option<&str>,
    ) -> Result<SavedImage, EditorError> {
        // An explicit filename's extension counts as a requested type
        let requested = mime_type.or_else(|| {
            filename
                .and_then(Path::extension)
                .and_then(|ext| ext.to_str())
                .and_then(mime_for_extension)
        });
        let mime_type = self
            .output_mime(requested)
            .map_err(|message| self.save_error(message))?;
        let path = match filename {
            Some(path) => path.to_path_buf(),
            None => {
                let extension = self.extension_for(&mime_type)?;
                derivative_filename(&self.file, self.size, extension)
            }
        };
        let bytes = self
            .current_bytes()
            .map_err(|e| self.save_error(e.to_string()))?;

        let saved = self.write(&path, &bytes, self.size, &mime_type)?;
        self.file = saved.path.clone();
        self.mime_type = saved.mime_type.clone();
        Ok(saved)
    }

    /// Send the current image to `channel` with its content type.
    pub fn stream(
        &self,
        mime_type: Option<&str>,
        channel: &mut impl OutputChannel,
    ) -> Result<(), EditorError> {
        let mime_type = self
            .output_mime(mime_type)
            .map_err(|message| self.stream_error(message))?;
        let bytes = self
            .current_bytes()
            .map_err(|e| self.stream_error(e.to_string()))?;
        channel
            .send(&mime_type, &bytes)
            .map_err(|e| self.stream_error(e.to_string()))
    }

    fn working_source(&self) -> Source {
        match &self.pending {
            Some(bytes) => Source::Memory(Arc::clone(bytes)),
            None => self.origin.clone(),
        }
    }

    fn current_bytes(&self) -> std::io::Result<Arc<[u8]>> {
        match &self.pending {
            Some(bytes) => Ok(Arc::clone(bytes)),
            None => match &self.origin {
                Source::Memory(bytes) => Ok(Arc::clone(bytes)),
                source => source.read_all().map(Arc::from),
            },
        }
    }

    /// Format conversion is not supported: only the current mime type goes out.
    fn output_mime(&self, requested: Option<&str>) -> Result<String, String> {
        match requested {
            None => Ok(self.mime_type.clone()),
            Some(mime) if mime.eq_ignore_ascii_case(&self.mime_type) => {
                Ok(self.mime_type.clone())
            }
            Some(mime) => Err(format!(
                "cannot convert {} to {}",
                self.mime_type, mime
            )),
        }
    }

    fn extension_for(&self, mime_type: &str) -> Result<&'static str, EditorError> {
        extension_for_mime(mime_type)
            .ok_or_else(|| self.save_error(format!("no file extension for {mime_type}")))
    }

    fn write(
        &self,
        path: &Path,
        bytes: &[u8],
        dimensions: Dimensions,
        mime_type: &str,
    ) -> Result<SavedImage, EditorError> {
        let saved = self
            .store
            .save(&SaveRequest {
                path,
                bytes,
                dimensions,
                mime_type,
            })
            .map_err(|e| self.save_error(e.to_string()))?;
        info!(path = %saved.path.display(), size = %dimensions, "saved derivative");
        Ok(saved)
    }

    fn render(&self, source: &Source, geometry: &Geometry) -> Result<Vec<u8>, EditorError> {
        match self.kind {
            ImageKind::Static => self
                .backend
                .render_still(source, geometry, self.options.filter)
                .map_err(|e| self.encode_error(e.to_string())),
            ImageKind::Animated => self.render_frames(source, geometry),
        }
    }

    /// Extract, transform and reassemble every frame of `source`.
    fn render_frames(&self, source: &Source, geometry: &Geometry) -> Result<Vec<u8>, EditorError> {
        let mut sequence =
            extract(self.backend, source).map_err(|e| self.extract_error(e.to_string()))?;
        let transformed = transform_all(sequence.by_ref(), geometry, self.options.filter);

        if sequence.decoded() == 0 {
            return Err(self.extract_error("source has no decodable frames".into()));
        }
        if transformed.frames.is_empty() {
            return Err(EditorError::Transform {
                path: self.file.clone(),
                dropped: transformed.dropped,
            });
        }

        let frames = transformed.frames.len();
        let dropped = sequence.dropped() + transformed.dropped;
        drop(sequence);

        let bytes = assemble(self.backend, transformed.frames, self.options.encode)
            .map_err(|e| self.encode_error(e.to_string()))?;
        info!(
            file = %self.file.display(),
            width = geometry.dest_w,
            height = geometry.dest_h,
            frames,
            dropped,
            "encoded animation"
        );
        Ok(bytes)
    }

    fn dimension_error(&self, source: GeometryError) -> EditorError {
        EditorError::Dimension {
            path: self.file.clone(),
            source,
        }
    }

    fn extract_error(&self, message: String) -> EditorError {
        EditorError::Extract {
            path: self.file.clone(),
            message,
        }
    }

    fn encode_error(&self, message: String) -> EditorError {
        EditorError::Encode {
            path: self.file.clone(),
            message,
        }
    }

    fn save_error(&self, message: String) -> EditorError {
        EditorError::Save {
            path: self.file.clone(),
            message,
        }
    }

    fn stream_error(&self, message: String) -> EditorError {
        EditorError::Stream {
            path: self.file.clone(),
            message,
        }
    }
}
