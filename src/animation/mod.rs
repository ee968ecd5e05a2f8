//! Animated property values.

/// Easing curves addressable by name.
pub mod ease;
/// Keyframe tracks and their resolution at a tick.
pub mod keyframes;
/// Property values, colors and prop bags.
pub mod value;
