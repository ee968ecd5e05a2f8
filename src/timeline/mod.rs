//! Clips on layers and the per-tick timeline engine.

/// Clip, transition and blend mode definitions.
pub mod clip;
/// Timeline state and per-tick frame resolution.
pub mod engine;
/// Camera and effects state mutable per tick.
pub mod scene;
/// Entry and exit transition state.
pub mod transitions;
