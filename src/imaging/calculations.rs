//! Pure calculation functions for derivative geometry.
//!
//! All functions here are pure and testable without any I/O or images. They
//! follow the conventions CMS media libraries use for "resize dimensions":
//!
//! - Never upscale. Requested sizes larger than the source are clamped.
//! - Without crop, the whole source is scaled into the requested box.
//! - With crop, the source region matching the target aspect is centered on
//!   the axis that has to give up pixels.
//! - A result within one pixel of the source size is rejected; there is
//!   nothing to derive.

use super::params::{CropRequest, Geometry};
use thiserror::Error;

/// Largest RGBA destination frame, in bytes, a request may ask for.
///
/// Matches the default allocation budget of `image::Limits` (512 MiB).
pub const MAX_FRAME_BYTES: u64 = 512 * 1024 * 1024;

/// Why no geometry could be resolved for a request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    #[error("source has zero width or height")]
    EmptySource,
    #[error("neither a width nor a height was requested")]
    NoTarget,
    #[error("resolved region has zero area")]
    EmptyRegion,
    #[error("crop region {x},{y} {w}x{h} lies outside the {width}x{height} source")]
    OutOfBounds {
        x: u32,
        y: u32,
        w: u32,
        h: u32,
        width: u32,
        height: u32,
    },
    #[error("resolved size {0}x{1} is the same as the source")]
    Unchanged(u32, u32),
    #[error("destination {width}x{height} exceeds the {limit}-byte frame limit", limit = MAX_FRAME_BYTES)]
    TooLarge { width: u32, height: u32 },
}

/// Check that a `width × height` RGBA frame fits in [`MAX_FRAME_BYTES`].
pub fn check_frame_size(width: u32, height: u32) -> Result<(), GeometryError> {
    let bytes = u64::from(width)
        .checked_mul(u64::from(height))
        .and_then(|pixels| pixels.checked_mul(4));
    match bytes {
        Some(bytes) if bytes <= MAX_FRAME_BYTES => Ok(()),
        _ => Err(GeometryError::TooLarge { width, height }),
    }
}

/// Scale `current` down so that it fits inside `max`, preserving aspect ratio.
///
/// A `max` component of 0 means "unbounded". Sizes already inside the box
/// are returned unchanged. Results are at least 1×1, and a one-pixel rounding
/// shortfall on a constrained edge is snapped back to the limit.
///
/// # Examples
/// ```
/// # use gif_derive::imaging::constrain_dimensions;
/// assert_eq!(constrain_dimensions((1000, 750), (300, 0)), (300, 225));
/// assert_eq!(constrain_dimensions((465, 700), (177, 177)), (118, 177));
/// ```
pub fn constrain_dimensions(current: (u32, u32), max: (u32, u32)) -> (u32, u32) {
    let (cur_w, cur_h) = current;
    let (max_w, max_h) = max;

    if max_w == 0 && max_h == 0 {
        return current;
    }

    let mut width_ratio = 1.0_f64;
    let mut height_ratio = 1.0_f64;
    let mut did_width = false;
    let mut did_height = false;

    if max_w > 0 && cur_w > 0 && cur_w > max_w {
        width_ratio = max_w as f64 / cur_w as f64;
        did_width = true;
    }
    if max_h > 0 && cur_h > 0 && cur_h > max_h {
        height_ratio = max_h as f64 / cur_h as f64;
        did_height = true;
    }

    let smaller_ratio = width_ratio.min(height_ratio);
    let larger_ratio = width_ratio.max(height_ratio);

    // An unbounded edge (limit 0) always "overflows" here, which selects the
    // smaller ratio: the bounded edge drives the scale.
    let ratio = if (cur_w as f64 * larger_ratio).round() > max_w as f64
        || (cur_h as f64 * larger_ratio).round() > max_h as f64
    {
        smaller_ratio
    } else {
        larger_ratio
    };

    let mut w = ((cur_w as f64 * ratio).round() as u32).max(1);
    let mut h = ((cur_h as f64 * ratio).round() as u32).max(1);

    if did_width && w + 1 == max_w {
        w = max_w;
    }
    if did_height && h + 1 == max_h {
        h = max_h;
    }

    (w, h)
}

/// Two sizes that differ by at most one pixel are treated as equal.
fn fuzzy_eq(a: u32, b: u32) -> bool {
    a.abs_diff(b) <= 1
}

/// Resolve the source region and destination size for a resize request.
///
/// `max_w`/`max_h` of `None` (or `Some(0)`) leave that edge free; it is then
/// derived from the source aspect ratio. At least one must be given.
///
/// # Arguments
/// * `source` - Source dimensions (width, height)
/// * `max_w`, `max_h` - Requested bounding box
/// * `crop` - Fill the box exactly by cropping the source, instead of fitting inside it
///
/// # Examples
/// ```
/// # use gif_derive::imaging::resolve_geometry;
/// // 100x50 cropped to a 50x50 square keeps the horizontal center.
/// let g = resolve_geometry((100, 50), Some(50), Some(50), true).unwrap();
/// assert_eq!((g.src_x, g.src_y, g.src_w, g.src_h), (25, 0, 50, 50));
/// ```
pub fn resolve_geometry(
    source: (u32, u32),
    max_w: Option<u32>,
    max_h: Option<u32>,
    crop: bool,
) -> Result<Geometry, GeometryError> {
    let (orig_w, orig_h) = source;
    if orig_w == 0 || orig_h == 0 {
        return Err(GeometryError::EmptySource);
    }

    let dest_w = max_w.unwrap_or(0);
    let dest_h = max_h.unwrap_or(0);
    if dest_w == 0 && dest_h == 0 {
        return Err(GeometryError::NoTarget);
    }

    let (new_w, new_h, src_x, src_y, src_w, src_h) = if crop {
        let aspect = orig_w as f64 / orig_h as f64;

        let mut new_w = dest_w.min(orig_w);
        let mut new_h = dest_h.min(orig_h);
        if new_w == 0 {
            new_w = (new_h as f64 * aspect).round() as u32;
        }
        if new_h == 0 {
            new_h = (new_w as f64 / aspect).round() as u32;
        }
        if new_w == 0 || new_h == 0 {
            return Err(GeometryError::EmptyRegion);
        }

        let size_ratio = (new_w as f64 / orig_w as f64).max(new_h as f64 / orig_h as f64);
        let crop_w = ((new_w as f64 / size_ratio).round() as u32).min(orig_w);
        let crop_h = ((new_h as f64 / size_ratio).round() as u32).min(orig_h);

        let src_x = (orig_w - crop_w) / 2;
        let src_y = (orig_h - crop_h) / 2;

        (new_w, new_h, src_x, src_y, crop_w, crop_h)
    } else {
        let (new_w, new_h) = constrain_dimensions(source, (dest_w, dest_h));
        (new_w, new_h, 0, 0, orig_w, orig_h)
    };

    if new_w == 0 || new_h == 0 || src_w == 0 || src_h == 0 {
        return Err(GeometryError::EmptyRegion);
    }

    if fuzzy_eq(new_w, orig_w) && fuzzy_eq(new_h, orig_h) {
        return Err(GeometryError::Unchanged(new_w, new_h));
    }

    Ok(Geometry {
        src_x,
        src_y,
        src_w,
        src_h,
        dest_w: new_w,
        dest_h: new_h,
    })
}

/// Turn an explicit crop request into a geometry against `source`.
///
/// Far-edge (`absolute`) coordinates are converted first; destination size
/// defaults to the region size. The region must lie inside the source, and
/// the destination must fit [`MAX_FRAME_BYTES`]: unlike resizing, a crop may
/// scale up.
pub fn crop_geometry(source: (u32, u32), request: &CropRequest) -> Result<Geometry, GeometryError> {
    let (orig_w, orig_h) = source;
    if orig_w == 0 || orig_h == 0 {
        return Err(GeometryError::EmptySource);
    }

    let (src_w, src_h) = if request.absolute {
        match (
            request.src_w.checked_sub(request.src_x),
            request.src_h.checked_sub(request.src_y),
        ) {
            (Some(w), Some(h)) => (w, h),
            _ => return Err(GeometryError::EmptyRegion),
        }
    } else {
        (request.src_w, request.src_h)
    };

    if src_w == 0 || src_h == 0 {
        return Err(GeometryError::EmptyRegion);
    }

    let dest_w = request.dst_w.filter(|&w| w > 0).unwrap_or(src_w);
    let dest_h = request.dst_h.filter(|&h| h > 0).unwrap_or(src_h);
    check_frame_size(dest_w, dest_h)?;

    let right = u64::from(request.src_x) + u64::from(src_w);
    let bottom = u64::from(request.src_y) + u64::from(src_h);
    if right > u64::from(orig_w) || bottom > u64::from(orig_h) {
        return Err(GeometryError::OutOfBounds {
            x: request.src_x,
            y: request.src_y,
            w: src_w,
            h: src_h,
            width: orig_w,
            height: orig_h,
        });
    }

    Ok(Geometry {
        src_x: request.src_x,
        src_y: request.src_y,
        src_w,
        src_h,
        dest_w,
        dest_h,
    })
}
