//! Turning resolved frames into pixels.

/// Backend trait and the captured frame type.
pub mod backend;
/// Layer compositing with blend modes.
pub mod composite;
/// In-process CPU backend.
pub mod cpu;
/// Backend that drives an external render host process.
pub mod host;
/// Whole-frame post effects.
pub mod post;
