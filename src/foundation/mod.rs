//! Types shared by every layer of the crate.

/// Ticks, frame rates, canvases and pixel types.
pub mod core;
/// Error taxonomy and result alias.
pub mod error;
/// Hashing and integer blend helpers.
pub mod math;
/// Deterministic LCG and interpolation helpers.
pub mod rng;
