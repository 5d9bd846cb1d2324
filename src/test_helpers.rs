//! Shared test utilities for the gif-derive test suite.
//!
//! Synthesizes real GIF and PNG files in memory so backend and editor tests
//! run against the actual codecs instead of checked-in fixtures.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = tempfile::TempDir::new().unwrap();
//! let path = write_gif(tmp.path(), "loop.gif", 40, 20, &[10, 20, 30]);
//!
//! let frames = read_gif(&std::fs::read(&path).unwrap());
//! assert_eq!(frame_durations(&frames), vec![10, 20, 30]);
//! ```

use image::codecs::gif::{GifDecoder, GifEncoder, Repeat};
use image::{AnimationDecoder, Delay, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};

// =========================================================================
// Fixture synthesis
// =========================================================================

/// Distinct solid color for frame `index`, so frames are distinguishable.
pub fn frame_color(index: usize) -> Rgba<u8> {
    let palette = [
        [220, 40, 40, 255],
        [40, 200, 60, 255],
        [40, 60, 220, 255],
        [230, 210, 30, 255],
    ];
    Rgba(palette[index % palette.len()])
}

/// Encode a looping GIF with one solid frame per duration (centiseconds).
pub fn gif_bytes(width: u32, height: u32, durations: &[u16]) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut encoder = GifEncoder::new_with_speed(&mut out, 30);
        encoder.set_repeat(Repeat::Infinite).unwrap();
        for (i, &cs) in durations.iter().enumerate() {
            let buffer = RgbaImage::from_pixel(width, height, frame_color(i));
            let delay = Delay::from_numer_denom_ms(u32::from(cs) * 10, 1);
            encoder
                .encode_frame(image::Frame::from_parts(buffer, 0, 0, delay))
                .unwrap();
        }
    }
    out
}

/// Encode a single-image PNG.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
    });
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

/// Write a GIF fixture into `dir` and return its path.
pub fn write_gif(dir: &Path, name: &str, width: u32, height: u32, durations: &[u16]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, gif_bytes(width, height, durations)).unwrap();
    path
}

/// Write a PNG fixture into `dir` and return its path.
pub fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, png_bytes(width, height)).unwrap();
    path
}

// =========================================================================
// Output inspection
// =========================================================================

/// A decoded output frame: size plus duration in centiseconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    pub width: u32,
    pub height: u32,
    pub duration: u16,
}

/// Decode every frame of an encoded GIF. Panics on malformed input.
pub fn read_gif(bytes: &[u8]) -> Vec<DecodedFrame> {
    let decoder = GifDecoder::new(Cursor::new(bytes)).unwrap();
    decoder
        .into_frames()
        .map(|frame| {
            let frame = frame.unwrap();
            let (numer, denom) = frame.delay().numer_denom_ms();
            let buffer = frame.into_buffer();
            DecodedFrame {
                width: buffer.width(),
                height: buffer.height(),
                duration: ((numer as f64 / denom as f64) / 10.0).round() as u16,
            }
        })
        .collect()
}

pub fn frame_durations(frames: &[DecodedFrame]) -> Vec<u16> {
    frames.iter().map(|f| f.duration).collect()
}

/// Assert every frame has the given size.
pub fn assert_frame_size(frames: &[DecodedFrame], width: u32, height: u32) {
    assert!(!frames.is_empty(), "expected at least one frame");
    for (i, f) in frames.iter().enumerate() {
        assert_eq!(
            (f.width, f.height),
            (width, height),
            "frame {i} has the wrong size"
        );
    }
}

/// True when the bytes carry a NETSCAPE2.0 application extension, which is
/// how GIF encodes a loop count.
pub fn has_loop_extension(bytes: &[u8]) -> bool {
    bytes.windows(11).any(|w| w == b"NETSCAPE2.0")
}
