//! Persistence and streaming collaborators.
//!
//! The editor decides *what* to write and *where*; a [`DerivativeStore`]
//! performs the write and reports the saved record, and an [`OutputChannel`]
//! carries streamed bytes with their content type. Both are injected so the
//! editor never touches the filesystem or stdout directly.
//!
//! [`FileStore`] writes to disk and normalizes permission bits to match the
//! containing directory (read/write bits only). [`HeaderedWriter`] writes a
//! `Content-Type` header block followed by the body to any `Write`.

use crate::imaging::Dimensions;
use crate::types::SavedImage;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Not a file path: {0}")]
    InvalidPath(PathBuf),
}

/// One derivative to persist.
#[derive(Debug, Clone, Copy)]
pub struct SaveRequest<'a> {
    pub path: &'a Path,
    pub bytes: &'a [u8],
    pub dimensions: Dimensions,
    pub mime_type: &'a str,
}

/// Writes derivative bytes and reports what was saved.
///
/// Implementations must be `Sync`: the batch path saves from rayon workers.
pub trait DerivativeStore: Sync {
    fn save(&self, request: &SaveRequest<'_>) -> Result<SavedImage, StoreError>;
}

/// Build the saved record for a request.
fn saved_record(request: &SaveRequest<'_>) -> Result<SavedImage, StoreError> {
    let file = request
        .path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| StoreError::InvalidPath(request.path.to_path_buf()))?;
    Ok(SavedImage {
        path: request.path.to_path_buf(),
        file,
        width: request.dimensions.width,
        height: request.dimensions.height,
        mime_type: request.mime_type.to_string(),
    })
}

/// Filesystem-backed store.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileStore;

impl FileStore {
    pub fn new() -> Self {
        Self
    }
}

impl DerivativeStore for FileStore {
    fn save(&self, request: &SaveRequest<'_>) -> Result<SavedImage, StoreError> {
        let record = saved_record(request)?;
        let io_err = |source| StoreError::Io {
            path: request.path.to_path_buf(),
            source,
        };

        if let Some(dir) = request.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(io_err)?;
        }
        fs::write(request.path, request.bytes).map_err(io_err)?;
        normalize_permissions(request.path);
        Ok(record)
    }
}

/// Set the file's mode to its directory's mode with execute bits stripped.
///
/// Best-effort: a failed lookup or chmod leaves the file as written.
#[cfg(unix)]
pub fn normalize_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    let dir = match path.parent() {
        Some(d) if !d.as_os_str().is_empty() => d,
        _ => Path::new("."),
    };
    let Ok(dir_meta) = fs::metadata(dir) else {
        return;
    };
    let mode = dir_meta.permissions().mode() & 0o666;
    let _ = fs::set_permissions(path, fs::Permissions::from_mode(mode));
}

#[cfg(not(unix))]
pub fn normalize_permissions(_path: &Path) {}

/// Destination for streamed image bytes.
pub trait OutputChannel {
    fn send(&mut self, content_type: &str, body: &[u8]) -> io::Result<()>;
}

/// Writes `Content-Type: <mime>` and a blank line, then the body.
pub struct HeaderedWriter<W: Write> {
    inner: W,
}

impl<W: Write> HeaderedWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> OutputChannel for HeaderedWriter<W> {
    fn send(&mut self, content_type: &str, body: &[u8]) -> io::Result<()> {
        write!(self.inner, "Content-Type: {content_type}\r\n\r\n")?;
        self.inner.write_all(body)?;
        self.inner.flush()
    }
}
