//! Parallel chunked rendering.
//!
//! A [`job::RenderJob`] splits `[0, total_ticks)` into one contiguous chunk per worker, renders
//! every chunk with its own backend and sink, then stitches the chunk files in index order.

/// Cooperative job cancellation.
pub mod cancel;
/// Chunk sizing and planning.
pub mod chunk;
/// The parallel render job.
pub mod job;
/// Progress events.
pub mod progress;
