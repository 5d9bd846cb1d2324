//! Per-frame transform and animation reassembly.
//!
//! These functions sit between frame extraction and the codec backend:
//! [`transform_all`] applies one resolved [`Geometry`] to every frame of a
//! sequence, and [`assemble`] hands the survivors to the backend encoder.
//!
//! A frame that cannot be transformed is dropped and counted, never fatal on
//! its own. Whether an empty result is an error is the caller's decision.

use super::backend::{BackendError, ImageBackend};
use super::calculations::check_frame_size;
use super::frames::Frame;
use super::params::{EncodeParams, Geometry, Resample};
use image::imageops;
use tracing::debug;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Frames that survived a transform, plus how many were lost on the way.
#[derive(Debug, Default)]
pub struct Transformed {
    pub frames: Vec<Frame>,
    pub dropped: usize,
}

/// Crop and scale one frame to `geometry`.
///
/// Consumes the frame so its source buffer is released as soon as the crop
/// region has been copied out. Pixels are resampled per channel, alpha
/// included, with no blending against a background.
pub fn transform_frame(frame: Frame, geometry: &Geometry, filter: Resample) -> Result<Frame> {
    let (width, height) = frame.dimensions();
    let right = u64::from(geometry.src_x) + u64::from(geometry.src_w);
    let bottom = u64::from(geometry.src_y) + u64::from(geometry.src_h);
    if right > u64::from(width) || bottom > u64::from(height) {
        return Err(BackendError::ProcessingFailed(format!(
            "crop region {}x{}+{}+{} exceeds {}x{} frame",
            geometry.src_w, geometry.src_h, geometry.src_x, geometry.src_y, width, height
        )));
    }
    if geometry.dest_w == 0 || geometry.dest_h == 0 {
        return Err(BackendError::ProcessingFailed(
            "destination has no area".into(),
        ));
    }
    check_frame_size(geometry.dest_w, geometry.dest_h)
        .map_err(|e| BackendError::ProcessingFailed(e.to_string()))?;

    let Frame { buffer, duration } = frame;
    let region = imageops::crop_imm(
        &buffer,
        geometry.src_x,
        geometry.src_y,
        geometry.src_w,
        geometry.src_h,
    )
    .to_image();
    drop(buffer);

    let buffer = if geometry.is_pure_crop() {
        region
    } else {
        imageops::resize(&region, geometry.dest_w, geometry.dest_h, filter.into())
    };
    Ok(Frame::new(buffer, duration))
}

/// Transform every frame in order, dropping the ones that fail.
pub fn transform_all(
    frames: impl IntoIterator<Item = Frame>,
    geometry: &Geometry,
    filter: Resample,
) -> Transformed {
    let mut out = Transformed::default();
    for (index, frame) in frames.into_iter().enumerate() {
        match transform_frame(frame, geometry, filter) {
            Ok(frame) => out.frames.push(frame),
            Err(e) => {
                out.dropped += 1;
                debug!(index, error = %e, "dropping frame that failed to transform");
            }
        }
    }
    out
}

/// Encode transformed frames into one looping animation.
///
/// Durations travel with their frames; nothing is redistributed.
pub fn assemble(
    backend: &impl ImageBackend,
    frames: Vec<Frame>,
    params: EncodeParams,
) -> Result<Vec<u8>> {
    if frames.is_empty() {
        return Err(BackendError::ProcessingFailed(
            "no frames to assemble".into(),
        ));
    }
    backend.encode_animation(frames, params)
}
