//! Frame-by-frame image processing, pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Probe** | `ImageReader::with_guessed_format` + GIF frame count |
//! | **Extract** | `GifDecoder::into_frames` (full-canvas RGBA) |
//! | **Transform** | `imageops::crop_imm` + `imageops::resize` |
//! | **Reassemble** | `GifEncoder` with `Repeat::Infinite` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for geometry math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Frames**: Lazy frame sequences over a decoded source
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: Per-frame transform and reassembly

pub mod backend;
mod calculations;
pub mod frames;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend, Source, SourceInfo};
pub use calculations::{
    GeometryError, MAX_FRAME_BYTES, check_frame_size, constrain_dimensions, crop_geometry,
    resolve_geometry,
};
pub use frames::{Frame, FrameSequence, extract, is_multiframe};
pub use operations::{Transformed, assemble, transform_all, transform_frame};
pub use params::{CropRequest, EncodeParams, Geometry, Resample};
pub use rust_backend::RustBackend;
