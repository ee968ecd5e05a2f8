//! Blueprints: named drawing routines that paint one clip into its own surface.

/// Built-in blueprints registered by [`registry::BlueprintRegistry::with_builtins`].
pub mod builtin;
/// Blueprint trait, draw context and registry.
pub mod registry;
/// Per-clip drawing surface.
pub mod surface;
