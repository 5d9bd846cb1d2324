//! Parameter types for frame operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the [`calculations`](super::calculations) module (which
//! decides the rectangles), the [`operations`](super::operations) module
//! (which moves pixels) and the [`backend`](super::backend) (which encodes).
//!
//! ## Types
//!
//! - [`Geometry`]: Source crop rectangle plus destination size for one request.
//! - [`CropRequest`]: Caller-supplied crop rectangle, optionally in far-edge coordinates.
//! - [`Resample`]: Antialiasing filter applied when scaling each frame.
//! - [`EncodeParams`]: GIF quantizer speed. Clamped on construction.

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

/// Resolved geometry for one transform request.
///
/// The region `(src_x, src_y, src_w, src_h)` of every source frame is scaled
/// to exactly `dest_w × dest_h`. Whenever a `Geometry` exists, all six values
/// describe a non-empty area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub src_x: u32,
    pub src_y: u32,
    pub src_w: u32,
    pub src_h: u32,
    pub dest_w: u32,
    pub dest_h: u32,
}

impl Geometry {
    /// True when the source region is used at its own size.
    pub fn is_pure_crop(&self) -> bool {
        self.src_w == self.dest_w && self.src_h == self.dest_h
    }
}

/// A crop request as received from the host.
///
/// With `absolute` set, `src_w`/`src_h` are far-edge coordinates and are
/// turned into a width/height by subtracting `src_x`/`src_y`. A missing
/// destination dimension defaults to the source region's width or height
/// after that conversion, never to the raw far-edge coordinate: a far-edge
/// request of `(10, 20)..(60, 70)` with no destination yields `50×50`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRequest {
    pub src_x: u32,
    pub src_y: u32,
    pub src_w: u32,
    pub src_h: u32,
    pub dst_w: Option<u32>,
    pub dst_h: Option<u32>,
    pub absolute: bool,
}

/// Resampling filter used when scaling frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resample {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    #[default]
    Lanczos3,
}

impl From<Resample> for FilterType {
    fn from(filter: Resample) -> Self {
        match filter {
            Resample::Nearest => FilterType::Nearest,
            Resample::Triangle => FilterType::Triangle,
            Resample::CatmullRom => FilterType::CatmullRom,
            Resample::Gaussian => FilterType::Gaussian,
            Resample::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// GIF encoder settings.
///
/// `speed` trades quantization quality for throughput (1 = best, 30 = fastest).
/// The loop count is not a parameter: animations are always written to loop forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeParams {
    speed: i32,
}

impl EncodeParams {
    pub fn new(speed: i32) -> Self {
        Self {
            speed: speed.clamp(1, 30),
        }
    }

    pub fn speed(self) -> i32 {
        self.speed
    }
}

impl Default for EncodeParams {
    fn default() -> Self {
        Self { speed: 10 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_speed_clamps_to_valid_range() {
        assert_eq!(EncodeParams::new(0).speed(), 1);
        assert_eq!(EncodeParams::new(12).speed(), 12);
        assert_eq!(EncodeParams::new(99).speed(), 30);
    }

    #[test]
    fn encode_speed_default_is_10() {
        assert_eq!(EncodeParams::default().speed(), 10);
    }

    #[test]
    fn resample_defaults_to_lanczos() {
        assert_eq!(Resample::default(), Resample::Lanczos3);
        assert_eq!(FilterType::from(Resample::default()), FilterType::Lanczos3);
    }

    #[test]
    fn resample_parses_snake_case() {
        let filter: Resample = serde_json::from_str("\"catmull_rom\"").unwrap();
        assert_eq!(filter, Resample::CatmullRom);
    }

    #[test]
    fn pure_crop_detection() {
        let g = Geometry {
            src_x: 10,
            src_y: 0,
            src_w: 50,
            src_h: 50,
            dest_w: 50,
            dest_h: 50,
        };
        assert!(g.is_pure_crop());
        assert!(
            !Geometry {
                dest_w: 25,
                dest_h: 25,
                ..g
            }
            .is_pure_crop()
        );
    }
}
