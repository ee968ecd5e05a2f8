//! Encoding sinks and chunk stitching.
//!
//! Sinks consume rendered frames in tick order, one sink per render chunk. Stitchers join the
//! finished chunk files into the final output without re-encoding.

/// `ffmpeg`-based MP4 sink.
pub mod ffmpeg;
/// Raw RGBA stream sink.
pub mod raw;
/// Sink trait, factories and the in-memory sink.
pub mod sink;
/// Joining chunk outputs.
pub mod stitch;
