//! JSON job manifest: configuration, clips, audio and image sources.
//!
//! ```json
//! {
//!   "config": { "width": 1280, "height": 720, "fps": 30, "durationSeconds": 4, "concurrency": 4 },
//!   "clips": [ { "id": "bg", "blueprintId": "solid", "startTick": 0, "durationTicks": 120 } ],
//!   "audioData": { "music": [ { "volume": 0.4, "frequencies": [0.1, 0.3] } ] },
//!   "images": { "logo": "assets/logo.png" }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;

use crate::assets::store::AssetStore;
use crate::audio::analyze::{AudioFrameData, DEFAULT_BINS};
use crate::audio::decode::analyze_file;
use crate::blueprint::registry::BlueprintRegistry;
use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{TickreelError, TickreelResult};
use crate::timeline::clip::Clip;
use crate::timeline::engine::Timeline;
use crate::timeline::scene::{CameraConfig, CameraTracks, EffectsConfig, SceneConfig};

fn default_concurrency() -> usize {
    1
}

/// Job-wide settings under `config`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JobConfig {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Integer frames per second.
    pub fps: u32,
    /// Job length; `totalTicks = ceil(durationSeconds × fps)`.
    pub duration_seconds: f64,
    /// Render workers and chunks; defaults to 1.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Base camera.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera: Option<CameraConfig>,
    /// Base post effects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effects: Option<EffectsConfig>,
    /// Seed for per-clip generators and camera shake.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Camera keyframe tracks in job ticks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_tracks: Option<CameraTracks>,
}

/// A complete render job description.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Manifest {
    /// Job-wide settings.
    pub config: JobConfig,
    /// Clips in any order.
    #[serde(default)]
    pub clips: Vec<Clip>,
    /// Pre-analyzed audio, per track, one entry per tick.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub audio_data: BTreeMap<String, Vec<AudioFrameData>>,
    /// Audio files analyzed at load time, per track.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub audio_files: BTreeMap<String, String>,
    /// Image asset id to location.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub images: BTreeMap<String, String>,
}

impl Manifest {
    /// Parse a manifest without validating it.
    pub fn from_json_str(s: &str) -> TickreelResult<Self> {
        serde_json::from_str(s).map_err(|e| TickreelError::serde(format!("invalid manifest: {e}")))
    }

    /// Read and parse a manifest file.
    pub fn load(path: &Path) -> TickreelResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    /// Serialize back to indented JSON.
    pub fn to_json_pretty(&self) -> TickreelResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| TickreelError::serde(e.to_string()))
    }

    /// Output size.
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.config.width,
            height: self.config.height,
        }
    }

    /// Frame rate as a rational.
    pub fn fps(&self) -> TickreelResult<Fps> {
        Fps::new(self.config.fps, 1)
    }

    /// `ceil(durationSeconds × fps)`.
    pub fn total_ticks(&self) -> TickreelResult<u64> {
        Ok(self.fps()?.total_ticks(self.config.duration_seconds))
    }

    /// Base scene every tick starts from.
    pub fn scene(&self) -> SceneConfig {
        SceneConfig {
            camera: self.config.camera.unwrap_or_default(),
            effects: self.config.effects.unwrap_or_default(),
        }
    }

    /// Check configuration and clips; clip errors name the clip.
    pub fn validate(&self) -> TickreelResult<()> {
        let c = &self.config;
        if c.width == 0 || c.height == 0 {
            return Err(TickreelError::config("width/height must be > 0"));
        }
        if c.width > u32::from(u16::MAX) || c.height > u32::from(u16::MAX) {
            return Err(TickreelError::config(format!(
                "width/height must be <= {}",
                u16::MAX
            )));
        }
        if c.fps == 0 {
            return Err(TickreelError::config("fps must be > 0"));
        }
        if !c.duration_seconds.is_finite() || c.duration_seconds <= 0.0 {
            return Err(TickreelError::config("durationSeconds must be finite and > 0"));
        }
        if c.concurrency == 0 {
            return Err(TickreelError::config("concurrency must be >= 1"));
        }
        if let Some(camera) = &c.camera {
            camera.validate()?;
        }
        if let Some(effects) = &c.effects {
            effects.validate()?;
        }
        for clip in &self.clips {
            clip.validate()?;
        }
        let mut seen = std::collections::BTreeSet::new();
        for clip in &self.clips {
            if !seen.insert(clip.id.as_str()) {
                return Err(TickreelError::validation(format!(
                    "duplicate clip id '{}'",
                    clip.id
                )));
            }
            if let Some(track) = clip.audio_track.as_deref()
                && !self.audio_data.contains_key(track)
                && !self.audio_files.contains_key(track)
            {
                return Err(TickreelError::validation(format!(
                    "clip '{}' references unknown audio track '{track}'",
                    clip.id
                )));
            }
        }
        if let Some(tracks) = &c.camera_tracks {
            crate::timeline::scene::validate_camera_tracks(tracks)?;
        }
        Ok(())
    }

    /// Validate, load images and audio relative to `base_dir`, and assemble a [`Timeline`].
    #[tracing::instrument(skip(self, registry), fields(clips = self.clips.len()))]
    pub fn build_timeline(&self, registry: BlueprintRegistry, base_dir: &Path) -> TickreelResult<Timeline> {
        self.validate()?;
        let fps = self.fps()?;
        let total = self.total_ticks()?;

        let assets = AssetStore::load(&self.images, base_dir)?;
        let mut timeline = Timeline::new(self.canvas(), fps, registry)
            .with_seed(self.config.seed.unwrap_or(0))
            .with_assets(Arc::new(assets));

        for (track, frames) in &self.audio_data {
            if (frames.len() as u64) < total {
                tracing::debug!(track = %track, frames = frames.len(), total, "audio track shorter than the job");
            }
            timeline.add_audio_track(track.clone(), frames.clone());
        }
        for (track, location) in &self.audio_files {
            let path = resolve_audio_path(base_dir, location);
            let frames = analyze_file(&path, fps, total, DEFAULT_BINS)?;
            timeline.add_audio_track(track.clone(), frames);
        }
        if let Some(tracks) = &self.config.camera_tracks {
            timeline.set_camera_tracks(tracks.clone())?;
        }
        for clip in &self.clips {
            timeline.add_clip(clip.clone())?;
        }
        Ok(timeline)
    }
}

fn resolve_audio_path(base_dir: &Path, location: &str) -> PathBuf {
    let location = location.strip_prefix("file://").unwrap_or(location);
    let p = Path::new(location);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

#[cfg(test)]
#[path = "../tests/unit/manifest.rs"]
mod tests;
