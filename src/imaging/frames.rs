//! Frame extraction: a lazy, single-pass view over an animation's frames.
//!
//! A [`FrameSequence`] wraps the raw decoder iterator of a backend and turns
//! it into a plain `Iterator<Item = Frame>`:
//!
//! - Frames come out strictly in source order.
//! - A frame the decoder cannot parse is dropped and counted; the sequence
//!   keeps going. Deciding whether "zero usable frames" is fatal is left to
//!   the caller, after iteration.
//! - If the *first* frame cannot be decoded, [`extract`] fails outright:
//!   nothing is extractable at all.
//!
//! A sequence is not restartable. Every derivative re-extracts from its
//! source, and dropping the sequence releases the decoder.

use super::backend::{BackendError, ImageBackend, Source};
use image::RgbaImage;
use tracing::{debug, warn};

/// Decoders that fail this many frames in a row are treated as exhausted;
/// a corrupt stream can otherwise keep reporting errors forever.
const MAX_CONSECUTIVE_FAILURES: usize = 8;

/// One still image plus its display duration.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Full-canvas RGBA pixels.
    pub buffer: RgbaImage,
    /// Display duration in centiseconds, as stored by the GIF container.
    pub duration: u16,
}

impl Frame {
    pub fn new(buffer: RgbaImage, duration: u16) -> Self {
        Self { buffer, duration }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.buffer.dimensions()
    }
}

/// Raw per-frame decode results as produced by a backend.
pub type RawFrames = Box<dyn Iterator<Item = Result<Frame, BackendError>>>;

/// Lazy, ordered, non-restartable sequence of decoded frames.
pub struct FrameSequence {
    inner: RawFrames,
    first: Option<Frame>,
    decoded: usize,
    dropped: usize,
    consecutive_failures: usize,
    exhausted: bool,
}

impl FrameSequence {
    /// Wrap a backend's raw frames. Fails when the first frame is undecodable.
    pub fn open(mut inner: RawFrames) -> Result<Self, BackendError> {
        let first = match inner.next() {
            Some(Ok(frame)) => Some(frame),
            Some(Err(e)) => return Err(e),
            None => None,
        };
        let exhausted = first.is_none();
        Ok(Self {
            inner,
            first,
            decoded: 0,
            dropped: 0,
            consecutive_failures: 0,
            exhausted,
        })
    }

    /// Frames handed out so far.
    pub fn decoded(&self) -> usize {
        self.decoded
    }

    /// Frames skipped so far because they failed to decode.
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

impl Iterator for FrameSequence {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        if let Some(frame) = self.first.take() {
            self.decoded += 1;
            return Some(frame);
        }
        if self.exhausted {
            return None;
        }

        loop {
            match self.inner.next() {
                Some(Ok(frame)) => {
                    self.consecutive_failures = 0;
                    self.decoded += 1;
                    return Some(frame);
                }
                Some(Err(e)) => {
                    let index = self.decoded + self.dropped;
                    self.dropped += 1;
                    self.consecutive_failures += 1;
                    debug!(index, error = %e, "dropping undecodable frame");

                    if self.consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
                        warn!(
                            failures = self.consecutive_failures,
                            "decoder keeps failing; ending frame sequence early"
                        );
                        self.exhausted = true;
                        return None;
                    }
                }
                None => {
                    self.exhausted = true;
                    return None;
                }
            }
        }
    }
}

/// Open a frame sequence over `source`.
pub fn extract(backend: &impl ImageBackend, source: &Source) -> Result<FrameSequence, BackendError> {
    FrameSequence::open(backend.frames(source)?)
}

/// Whether `source` holds more than one frame.
///
/// This is the authority on animation: a GIF mime type alone says nothing
/// about the frame count.
pub fn is_multiframe(backend: &impl ImageBackend, source: &Source) -> Result<bool, BackendError> {
    Ok(backend.probe(source)?.animated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(duration: u16) -> Result<Frame, BackendError> {
        Ok(Frame::new(
            RgbaImage::from_pixel(4, 4, Rgba([9, 9, 9, 255])),
            duration,
        ))
    }

    fn broken() -> Result<Frame, BackendError> {
        Err(BackendError::ProcessingFailed("bad LZW block".into()))
    }

    fn raw(items: Vec<Result<Frame, BackendError>>) -> RawFrames {
        Box::new(items.into_iter())
    }

    #[test]
    fn yields_frames_in_order() {
        let seq = FrameSequence::open(raw(vec![solid(10), solid(20), solid(15)])).unwrap();
        let durations: Vec<u16> = seq.map(|f| f.duration).collect();
        assert_eq!(durations, vec![10, 20, 15]);
    }

    #[test]
    fn drops_failed_frames_and_continues() {
        let mut seq =
            FrameSequence::open(raw(vec![solid(1), broken(), solid(3), broken(), solid(5)]))
                .unwrap();
        let durations: Vec<u16> = seq.by_ref().map(|f| f.duration).collect();
        assert_eq!(durations, vec![1, 3, 5]);
        assert_eq!(seq.decoded(), 3);
        assert_eq!(seq.dropped(), 2);
    }

    #[test]
    fn first_frame_failure_is_an_error() {
        let result = FrameSequence::open(raw(vec![broken(), solid(2)]));
        assert!(result.is_err());
    }

    #[test]
    fn empty_source_opens_with_no_frames() {
        let mut seq = FrameSequence::open(raw(Vec::new())).unwrap();
        assert!(seq.next().is_none());
        assert_eq!(seq.decoded(), 0);
    }

    #[test]
    fn stops_after_repeated_failures() {
        let mut items = vec![solid(1)];
        items.extend((0..MAX_CONSECUTIVE_FAILURES + 5).map(|_| broken()));
        items.push(solid(9));

        let mut seq = FrameSequence::open(raw(items)).unwrap();
        let count = seq.by_ref().count();
        assert_eq!(count, 1);
        assert_eq!(seq.dropped(), MAX_CONSECUTIVE_FAILURES);
    }

    #[test]
    fn exhausted_sequence_stays_exhausted() {
        let mut seq = FrameSequence::open(raw(vec![solid(1)])).unwrap();
        assert!(seq.next().is_some());
        assert!(seq.next().is_none());
        assert!(seq.next().is_none());
    }
}
