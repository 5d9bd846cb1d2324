//! Pure Rust codec backend built on the `image` crate.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Format sniffing | `image::ImageReader::with_guessed_format` |
//! | Frame decode | `image::codecs::gif::GifDecoder` + `AnimationDecoder::into_frames` |
//! | Animation encode | `image::codecs::gif::GifEncoder` (NeuQuant, `Repeat::Infinite`) |
//! | Still crop/scale | `DynamicImage::crop_imm` + `resize_exact` |
//!
//! The GIF decoder composes every frame onto the full logical screen, so
//! frames arrive as full-canvas RGBA with transparency intact.

use super::backend::{BackendError, Dimensions, ImageBackend, Source, SourceInfo, SourceReader};
use super::calculations::check_frame_size;
use super::frames::{Frame, RawFrames};
use super::params::{EncodeParams, Geometry, Resample};
use image::codecs::gif::{GifDecoder, GifEncoder, Repeat};
use image::{
    AnimationDecoder, Delay, DynamicImage, ImageDecoder, ImageError, ImageFormat, ImageReader,
};
use std::io::Cursor;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_failed(source: &Source, e: ImageError) -> BackendError {
    match e {
        ImageError::IoError(io) => BackendError::Io(io),
        other => BackendError::ProcessingFailed(format!("Failed to decode {source}: {other}")),
    }
}

/// Sniff the container format from the leading bytes.
fn guess_format(source: &Source) -> Result<ImageFormat, BackendError> {
    ImageReader::new(source.open()?)
        .with_guessed_format()?
        .format()
        .ok_or_else(|| BackendError::ProcessingFailed(format!("Unrecognized image format: {source}")))
}

fn gif_decoder(source: &Source) -> Result<GifDecoder<Box<dyn SourceReader>>, BackendError> {
    GifDecoder::new(source.open()?).map_err(|e| decode_failed(source, e))
}

fn decode_image(source: &Source) -> Result<DynamicImage, BackendError> {
    ImageReader::new(source.open()?)
        .with_guessed_format()?
        .decode()
        .map_err(|e| decode_failed(source, e))
}

/// GIF delays are stored in whole centiseconds.
fn delay_to_centis(delay: Delay) -> u16 {
    let (numer, denom) = delay.numer_denom_ms();
    if denom == 0 {
        return 0;
    }
    let centis = (f64::from(numer) / f64::from(denom) / 10.0).round();
    centis.clamp(0.0, f64::from(u16::MAX)) as u16
}

fn centis_to_delay(centis: u16) -> Delay {
    Delay::from_numer_denom_ms(u32::from(centis) * 10, 1)
}

impl ImageBackend for RustBackend {
    fn probe(&self, source: &Source) -> Result<SourceInfo, BackendError> {
        let format = guess_format(source)?;
        let mime_type = format.to_mime_type().to_string();

        if format == ImageFormat::Gif {
            let decoder = gif_decoder(source)?;
            let (width, height) = decoder.dimensions();
            let animated = decoder.into_frames().take(2).count() > 1;
            return Ok(SourceInfo {
                dimensions: Dimensions { width, height },
                mime_type,
                animated,
            });
        }

        let (width, height) = ImageReader::with_format(source.open()?, format)
            .into_dimensions()
            .map_err(|e| decode_failed(source, e))?;
        Ok(SourceInfo {
            dimensions: Dimensions { width, height },
            mime_type,
            animated: false,
        })
    }

    fn frames(&self, source: &Source) -> Result<RawFrames, BackendError> {
        if guess_format(source)? != ImageFormat::Gif {
            // Any other format is a single still frame.
            let frame = Frame::new(decode_image(source)?.to_rgba8(), 0);
            return Ok(Box::new(std::iter::once(Ok(frame))));
        }

        let label = source.to_string();
        let frames = gif_decoder(source)?.into_frames().map(move |result| {
            result
                .map(|frame| {
                    let duration = delay_to_centis(frame.delay());
                    Frame::new(frame.into_buffer(), duration)
                })
                .map_err(|e| {
                    BackendError::ProcessingFailed(format!("Failed to decode frame of {label}: {e}"))
                })
        });
        Ok(Box::new(frames))
    }

    fn encode_animation(
        &self,
        frames: Vec<Frame>,
        params: EncodeParams,
    ) -> Result<Vec<u8>, BackendError> {
        let Some(first) = frames.first() else {
            return Err(BackendError::ProcessingFailed(
                "Cannot encode an animation with no frames".into(),
            ));
        };
        let size = first.dimensions();
        if let Some(odd) = frames.iter().position(|f| f.dimensions() != size) {
            return Err(BackendError::ProcessingFailed(format!(
                "Frame {odd} does not match the {}x{} canvas",
                size.0, size.1
            )));
        }

        let mut out = Vec::new();
        {
            let mut encoder = GifEncoder::new_with_speed(&mut out, params.speed());
            encoder
                .set_repeat(Repeat::Infinite)
                .map_err(|e| BackendError::ProcessingFailed(format!("GIF encode failed: {e}")))?;
            for frame in frames {
                let delay = centis_to_delay(frame.duration);
                encoder
                    .encode_frame(image::Frame::from_parts(frame.buffer, 0, 0, delay))
                    .map_err(|e| {
                        BackendError::ProcessingFailed(format!("GIF encode failed: {e}"))
                    })?;
            }
        }
        Ok(out)
    }

    fn render_still(
        &self,
        source: &Source,
        geometry: &Geometry,
        filter: Resample,
    ) -> Result<Vec<u8>, BackendError> {
        check_frame_size(geometry.dest_w, geometry.dest_h)
            .map_err(|e| BackendError::ProcessingFailed(e.to_string()))?;
        let format = guess_format(source)?;
        let img = decode_image(source)?;
        let region = img.crop_imm(geometry.src_x, geometry.src_y, geometry.src_w, geometry.src_h);
        let scaled = if geometry.is_pure_crop() {
            region
        } else {
            region.resize_exact(geometry.dest_w, geometry.dest_h, filter.into())
        };

        // JPEG has no alpha channel.
        let scaled = if format == ImageFormat::Jpeg {
            DynamicImage::ImageRgb8(scaled.to_rgb8())
        } else {
            scaled
        };

        let mut out = Cursor::new(Vec::new());
        scaled.write_to(&mut out, format).map_err(|e| {
            BackendError::ProcessingFailed(format!("{format:?} encode failed: {e}"))
        })?;
        Ok(out.into_inner())
    }
}
