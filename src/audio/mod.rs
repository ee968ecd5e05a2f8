//! Audio analysis for audio-reactive clips.

/// Per-tick volume and spectrum windows.
pub mod analyze;
/// Audio file decoding through `ffmpeg`.
pub mod decode;
/// Radix-2 FFT magnitudes.
pub mod fft;
/// Threshold triggers that turn analysis into keyframe pulses.
pub mod triggers;
