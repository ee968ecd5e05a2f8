//! Blueprints are the caller-supplied drawing callbacks clips refer to by id.
//!
//! A [`BlueprintRegistry`] is an ordinary value built per job and handed to the
//! [`Timeline`](crate::Timeline); there is no process-wide registry, so parallel workers can hold
//! independent registries.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::animation::value::{Color, PropValue, Props};
use crate::assets::store::{AssetStore, ImageAsset};
use crate::audio::analyze::AudioFrameData;
use crate::blueprint::surface::Surface;
use crate::foundation::core::Tick;
use crate::foundation::error::TickreelResult;
use crate::foundation::rng::Rng;

/// Everything a blueprint sees while drawing one clip at one tick.
pub struct DrawContext<'a> {
    /// Isolated target owned by this clip for this tick.
    pub surface: &'a mut Surface,
    /// Global tick.
    pub tick: Tick,
    /// Tick relative to the clip start.
    pub local_tick: u64,
    /// `local_tick / duration_ticks`, always in `[0, 1)`.
    pub local_time: f64,
    /// Surface width in pixels.
    pub width: u32,
    /// Surface height in pixels.
    pub height: u32,
    /// Generator keyed on `(job seed, clip id, tick)`.
    pub rng: Rng,
    /// This tick's frame of the clip's audio track, if any.
    pub audio: Option<&'a AudioFrameData>,
    /// Static props merged with animated values.
    pub props: &'a Props,
    assets: &'a AssetStore,
}

impl<'a> DrawContext<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        surface: &'a mut Surface,
        tick: Tick,
        local_tick: u64,
        local_time: f64,
        rng: Rng,
        audio: Option<&'a AudioFrameData>,
        props: &'a Props,
        assets: &'a AssetStore,
    ) -> Self {
        let (width, height) = (surface.width(), surface.height());
        Self {
            surface,
            tick,
            local_tick,
            local_time,
            width,
            height,
            rng,
            audio,
            props,
            assets,
        }
    }

    /// Look up a decoded image by asset id.
    pub fn image(&self, id: &str) -> Option<&ImageAsset> {
        self.assets.image(id)
    }

    /// Raw prop value.
    pub fn prop(&self, name: &str) -> Option<&PropValue> {
        self.props.get(name)
    }

    /// Numeric prop, or `default` when missing or not a number.
    pub fn number(&self, name: &str, default: f64) -> f64 {
        self.prop(name).and_then(PropValue::as_f64).unwrap_or(default)
    }

    /// Color prop, or `default` when missing or not a color.
    pub fn color(&self, name: &str, default: Color) -> Color {
        self.prop(name).and_then(PropValue::as_color).unwrap_or(default)
    }

    /// String prop, if present.
    pub fn string(&self, name: &str) -> Option<&str> {
        self.prop(name).and_then(PropValue::as_str)
    }

    /// Boolean prop, or `default` when missing or not a boolean.
    pub fn flag(&self, name: &str, default: bool) -> bool {
        self.prop(name).and_then(PropValue::as_bool).unwrap_or(default)
    }
}

/// A drawing callback. Implemented for plain closures.
pub trait Blueprint: Send + Sync {
    /// Draw into `ctx.surface`. Errors fail the tick.
    fn draw(&self, ctx: &mut DrawContext<'_>) -> TickreelResult<()>;
}

impl<F> Blueprint for F
where
    F: Fn(&mut DrawContext<'_>) -> TickreelResult<()> + Send + Sync,
{
    fn draw(&self, ctx: &mut DrawContext<'_>) -> TickreelResult<()> {
        self(ctx)
    }
}

/// Blueprints addressable by id.
#[derive(Clone, Default)]
pub struct BlueprintRegistry {
    entries: BTreeMap<String, Arc<dyn Blueprint>>,
}

impl std::fmt::Debug for BlueprintRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlueprintRegistry")
            .field("ids", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl BlueprintRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the primitives in [`crate::blueprint::builtin`].
    pub fn with_builtins() -> Self {
        let mut reg = Self::new();
        crate::blueprint::builtin::register_builtins(&mut reg);
        reg
    }

    /// Register `blueprint` under `id`, replacing any previous entry.
    pub fn register(&mut self, id: impl Into<String>, blueprint: impl Blueprint + 'static) {
        self.entries.insert(id.into(), Arc::new(blueprint));
    }

    /// Blueprint registered under `id`.
    pub fn get(&self, id: &str) -> Option<&Arc<dyn Blueprint>> {
        self.entries.get(id)
    }

    /// Return `true` when `id` is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Registered ids in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/blueprint/registry.rs"]
mod tests;
