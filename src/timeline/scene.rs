//! Per-tick mutable scene state: camera and global effects.
//!
//! This is the only state a per-tick hook may change. Every worker owns its own copy.

use std::collections::BTreeMap;

use crate::animation::keyframes::{Keyframe, resolve_number};
use crate::foundation::core::{Affine, Canvas, Vec2};
use crate::foundation::error::{TickreelError, TickreelResult};
use crate::foundation::rng::Rng;

/// Camera keyframe tracks keyed by property (`x`, `y`, `zoom`, `shake`). Ticks are job ticks.
pub type CameraTracks = BTreeMap<String, Vec<Keyframe>>;

/// Properties a camera track may drive.
pub const CAMERA_PROPS: [&str; 4] = ["x", "y", "zoom", "shake"];

/// Virtual camera applied on top of every layer.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CameraConfig {
    /// Horizontal pan in pixels.
    pub x: f64,
    /// Vertical pan in pixels.
    pub y: f64,
    /// Zoom about the frame center; 1 is unscaled.
    pub zoom: f64,
    /// Maximum shake offset in pixels.
    pub shake: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
            shake: 0.0,
        }
    }
}

impl CameraConfig {
    /// Override fields with the values `tracks` resolve to at `tick`.
    pub fn with_tracks(mut self, tracks: &CameraTracks, tick: u64) -> Self {
        for (prop, kfs) in tracks {
            let Some(v) = resolve_number(kfs, tick) else {
                continue;
            };
            match prop.as_str() {
                "x" => self.x = v,
                "y" => self.y = v,
                "zoom" => self.zoom = v,
                "shake" => self.shake = v,
                _ => {}
            }
        }
        self
    }

    /// Reject non-finite values and a non-positive zoom.
    pub fn validate(&self) -> TickreelResult<()> {
        require_finite("camera.x", self.x)?;
        require_finite("camera.y", self.y)?;
        require_finite("camera.zoom", self.zoom)?;
        require_finite("camera.shake", self.shake)?;
        if self.zoom <= 0.0 {
            return Err(TickreelError::config("camera.zoom must be > 0"));
        }
        if self.shake < 0.0 {
            return Err(TickreelError::config("camera.shake must be >= 0"));
        }
        Ok(())
    }

    /// View transform: pan by `(-x, -y)` plus shake, then zoom about the canvas center.
    ///
    /// Shake offsets come from a generator keyed on `(seed, "camera", tick)`.
    pub fn to_affine(&self, canvas: Canvas, seed: u64, tick: u64) -> Affine {
        let mut pan = Vec2::new(-self.x, -self.y);
        if self.shake > 0.0 {
            let mut rng = Rng::for_clip(seed, "camera", tick);
            pan.x += rng.range(-self.shake, self.shake);
            pan.y += rng.range(-self.shake, self.shake);
        }
        let c = canvas.center().to_vec2();
        let zoom = if self.zoom.is_finite() && self.zoom > 0.0 {
            self.zoom
        } else {
            1.0
        };
        Affine::translate(c) * Affine::scale(zoom) * Affine::translate(-c) * Affine::translate(pan)
    }
}

fn require_finite(what: &str, v: f64) -> TickreelResult<()> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(TickreelError::config(format!("{what} must be finite, got {v}")))
    }
}

/// Check that every camera track holds numbers for a known camera property.
pub fn validate_camera_tracks(tracks: &CameraTracks) -> TickreelResult<()> {
    for (prop, kfs) in tracks {
        if !CAMERA_PROPS.contains(&prop.as_str()) {
            return Err(TickreelError::validation(format!(
                "unknown camera track '{prop}' (expected one of {CAMERA_PROPS:?})"
            )));
        }
        if kfs.iter().any(|k| k.value.as_f64().is_none()) {
            return Err(TickreelError::animation(format!(
                "camera track '{prop}' must contain numbers only"
            )));
        }
    }
    Ok(())
}

#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// Whole-frame effect intensities.
pub struct EffectsConfig {
    /// Radial darkening strength in `[0, 1]`.
    pub vignette: f64,
    /// Red/blue channel offset in pixels.
    pub chromatic_aberration: f64,
}

impl EffectsConfig {
    /// Reject non-finite intensities and a vignette outside `[0, 1]`.
    pub fn validate(&self) -> TickreelResult<()> {
        require_finite("effects.vignette", self.vignette)?;
        require_finite("effects.chromaticAberration", self.chromatic_aberration)?;
        if !(0.0..=1.0).contains(&self.vignette) {
            return Err(TickreelError::config("effects.vignette must be within [0, 1]"));
        }
        Ok(())
    }
}

/// Per-tick mutable state: what a tick hook may change.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SceneConfig {
    /// Camera for the tick.
    pub camera: CameraConfig,
    /// Post effects for the tick.
    pub effects: EffectsConfig,
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/scene.rs"]
mod tests;
