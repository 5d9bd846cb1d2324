//! # gif-derive
//!
//! Resize and crop animated GIFs frame by frame, for the derivative sizes a
//! CMS media library generates on upload. A plain image library flattens an
//! animation to its first frame; this crate keeps every frame and its delay.
//!
//! # Architecture: Frame Pipeline
//!
//! Every derivative of an animated source goes through the same stages:
//!
//! ```text
//! 1. Resolve    source size + request  →  Geometry     (pure arithmetic)
//! 2. Extract    source bytes           →  Frame stream (buffer + delay)
//! 3. Transform  each Frame             →  cropped/scaled Frame
//! 4. Assemble   transformed Frames     →  looping GIF bytes
//! ```
//!
//! Geometry is computed once per request and applied identically to every
//! frame. Frames are pulled and transformed one at a time, and each source
//! buffer is released as soon as its transformed copy exists.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`editor`] | Loads a source, dispatches still vs animated, runs single and batch requests |
//! | [`imaging`] | Geometry, frame extraction, per-frame transform, reassembly, `image` backend |
//! | [`store`] | Saving derivatives (with permission normalization) and streaming bytes |
//! | [`config`] | `gif-derive.toml` loading, merging onto stock defaults, validation |
//! | [`types`] | Serializable records: target sizes, saved images, batch entries |
//! | [`naming`] | `{stem}-{w}x{h}.{ext}` derivative names and mime ↔ extension mapping |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Backend Trait
//!
//! Decoding and encoding live behind [`imaging::ImageBackend`]. The pure-Rust
//! [`imaging::RustBackend`] uses the `image` crate; tests use a recording mock
//! so properties like "no frame was decoded" are directly checkable.
//!
//! ## Exclusive Dispatch
//!
//! A source is classified once, at load, by probing its frame count rather
//! than trusting its mime type. Single-frame sources take the still path and
//! never enter the frame pipeline.
//!
//! ## Batch From the Original
//!
//! [`editor::Editor::multi_resize`] renders each named size from the loaded
//! original in parallel (rayon). Sizes never compound, and a failing size is
//! logged and left out rather than aborting its siblings.

pub mod config;
pub mod editor;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
