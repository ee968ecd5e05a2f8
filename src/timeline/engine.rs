use std::collections::BTreeMap;
use std::sync::Arc;

use crate::animation::keyframes::resolve;
use crate::animation::value::Props;
use crate::assets::store::AssetStore;
use crate::audio::analyze::AudioFrameData;
use crate::blueprint::registry::{BlueprintRegistry, DrawContext};
use crate::blueprint::surface::Surface;
use crate::foundation::core::{Affine, Canvas, Fps, Tick, Vec2};
use crate::foundation::error::{TickreelError, TickreelResult};
use crate::foundation::rng::Rng;
use crate::render::backend::FrameRGBA;
use crate::timeline::clip::{BlendMode, Clip};
use crate::timeline::scene::{CameraConfig, CameraTracks, SceneConfig, validate_camera_tracks};
use crate::timeline::transitions::transition_state;

/// Translation plus uniform scale about the frame center.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct LayerTransform {
    /// Offset of the layer in pixels.
    pub translate: Vec2,
    /// Uniform scale about the frame center.
    pub scale: f64,
}

impl Default for LayerTransform {
    fn default() -> Self {
        Self {
            translate: Vec2::ZERO,
            scale: 1.0,
        }
    }
}

impl LayerTransform {
    /// Affine map from surface to frame coordinates.
    pub fn to_affine(self, canvas: Canvas) -> Affine {
        let c = canvas.center().to_vec2();
        Affine::translate(c + self.translate) * Affine::scale(self.scale) * Affine::translate(-c)
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
/// One active clip at one tick, before drawing.
pub struct ResolvedClip {
    /// Id of the clip.
    pub clip_id: String,
    /// Blueprint that draws it.
    pub blueprint_id: String,
    /// Composite layer.
    pub layer: i32,
    /// Ticks since the clip started.
    pub local_tick: u64,
    /// `local_tick / duration_ticks`, in `[0, 1)`.
    pub local_time: f64,
    /// Final opacity in `[0, 1]`.
    pub opacity: f64,
    /// Placement from transitions.
    pub transform: LayerTransform,
    /// Blend mode.
    pub blend: BlendMode,
    /// Static props overridden by animated values.
    pub props: Props,
    /// This tick's frame of the clip's audio track.
    pub audio: Option<AudioFrameData>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
/// Everything the engine decides for one tick, in composite order.
pub struct ResolvedFrame {
    /// Tick resolved.
    pub tick: Tick,
    /// Camera after tracks were applied.
    pub camera: CameraConfig,
    /// Active, drawable clips in composite order.
    pub clips: Vec<ResolvedClip>,
    /// Ids of active clips whose blueprint is not registered.
    pub skipped: Vec<String>,
}

/// One drawn clip ready for compositing.
#[derive(Clone, Debug)]
pub struct Layer {
    /// Resolution the surface was drawn from.
    pub clip: ResolvedClip,
    /// The clip's isolated surface, rasterized.
    pub surface: FrameRGBA,
}

#[derive(Clone, Debug)]
/// Output of [`Timeline::compute_frame`]: the compositor's input.
pub struct FrameLayers {
    /// Tick computed.
    pub tick: Tick,
    /// Camera after tracks were applied.
    pub camera: CameraConfig,
    /// Drawn clips in composite order.
    pub layers: Vec<Layer>,
    /// Ids of active clips whose blueprint is not registered.
    pub skipped: Vec<String>,
}

/// Clip scheduling and per-tick evaluation.
///
/// Clips stay sorted by `(layer, start_tick)`; equal keys keep insertion order. Everything here is
/// read-only during rendering and cheap to clone into workers.
#[derive(Clone, Debug)]
pub struct Timeline {
    canvas: Canvas,
    fps: Fps,
    seed: u64,
    clips: Vec<Clip>,
    audio: BTreeMap<String, Arc<Vec<AudioFrameData>>>,
    assets: Arc<AssetStore>,
    camera_tracks: CameraTracks,
    registry: BlueprintRegistry,
}

impl Timeline {
    /// Empty timeline with seed 0 and no assets.
    pub fn new(canvas: Canvas, fps: Fps, registry: BlueprintRegistry) -> Self {
        Self {
            canvas,
            fps,
            seed: 0,
            clips: Vec::new(),
            audio: BTreeMap::new(),
            assets: Arc::new(AssetStore::empty()),
            camera_tracks: CameraTracks::new(),
            registry,
        }
    }

    /// Seed for clip generators and camera shake.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Image store handed to blueprints.
    pub fn with_assets(mut self, assets: Arc<AssetStore>) -> Self {
        self.assets = assets;
        self
    }

    /// Insert a clip and re-establish `(layer, start_tick)` order.
    ///
    /// Audio triggers are expanded here, so the clip's audio track must already be added.
    pub fn add_clip(&mut self, mut clip: Clip) -> TickreelResult<()> {
        clip.validate()?;
        if self.clips.iter().any(|c| c.id == clip.id) {
            return Err(TickreelError::validation(format!(
                "duplicate clip id '{}'",
                clip.id
            )));
        }
        if !clip.audio_triggers.is_empty() {
            let track = clip.audio_track.clone().unwrap_or_default();
            let frames = self.audio.get(&track).cloned().ok_or_else(|| {
                TickreelError::validation(format!(
                    "clip '{}' triggers on audio track '{track}', which is not loaded",
                    clip.id
                ))
            })?;
            clip.expand_audio_triggers(&frames);
        }
        self.clips.push(clip);
        self.clips.sort_by_key(|c| (c.layer, c.start_tick));
        Ok(())
    }

    /// Register per-tick audio frames under `id`, replacing any previous track.
    pub fn add_audio_track(&mut self, id: impl Into<String>, frames: Vec<AudioFrameData>) {
        self.audio.insert(id.into(), Arc::new(frames));
    }

    /// Replace the camera keyframe tracks (job ticks).
    pub fn set_camera_tracks(&mut self, tracks: CameraTracks) -> TickreelResult<()> {
        validate_camera_tracks(&tracks)?;
        self.camera_tracks = tracks;
        Ok(())
    }

    /// Clips in `(layer, start_tick)` order.
    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    /// Output size.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Frame rate.
    pub fn fps(&self) -> Fps {
        self.fps
    }

    /// Job seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Image store.
    pub fn assets(&self) -> &Arc<AssetStore> {
        &self.assets
    }

    /// Blueprint registry.
    pub fn registry(&self) -> &BlueprintRegistry {
        &self.registry
    }

    /// Frame of `track` at `tick`, if the track is that long.
    pub fn audio_frame(&self, track: &str, tick: Tick) -> Option<&AudioFrameData> {
        let idx = usize::try_from(tick.0).ok()?;
        self.audio.get(track)?.get(idx)
    }

    /// Camera for `tick`: `base` overridden by the camera tracks.
    pub fn resolve_camera(&self, tick: Tick, base: &CameraConfig) -> CameraConfig {
        base.with_tracks(&self.camera_tracks, tick.0)
    }

    /// Decide which clips are active at `tick` and how they look, without drawing.
    #[tracing::instrument(skip(self, scene))]
    pub fn resolve_frame(&self, tick: Tick, scene: &SceneConfig) -> ResolvedFrame {
        let camera = self.resolve_camera(tick, &scene.camera);
        let height = f64::from(self.canvas.height);

        let mut clips = Vec::new();
        let mut skipped = Vec::new();
        // self.clips is already in (layer, start) order, so the active subset is too
        for clip in self.clips.iter().filter(|c| c.is_active(tick)) {
            if !self.registry.contains(&clip.blueprint_id) {
                tracing::warn!(
                    clip = %clip.id,
                    blueprint = %clip.blueprint_id,
                    tick = tick.0,
                    "unresolved blueprint; clip skipped for this tick"
                );
                skipped.push(clip.id.clone());
                continue;
            }

            let local_tick = tick.0 - clip.start_tick;
            let local_time = local_tick as f64 / clip.duration_ticks as f64;
            let tr = transition_state(clip, local_tick, height);

            let mut props = clip.static_props.clone();
            for (name, kfs) in &clip.animated_props {
                if let Some(v) = resolve(kfs, local_tick) {
                    props.insert(name.clone(), v);
                }
            }

            let audio = clip
                .audio_track
                .as_deref()
                .and_then(|track| self.audio_frame(track, tick))
                .cloned();

            clips.push(ResolvedClip {
                clip_id: clip.id.clone(),
                blueprint_id: clip.blueprint_id.clone(),
                layer: clip.layer,
                local_tick,
                local_time,
                opacity: tr.opacity.clamp(0.0, 1.0),
                transform: LayerTransform {
                    translate: tr.offset,
                    scale: tr.scale,
                },
                blend: clip.blend_mode,
                props,
                audio,
            });
        }

        ResolvedFrame {
            tick,
            camera,
            clips,
            skipped,
        }
    }

    /// Resolve `tick` and draw every active clip into its own surface.
    #[tracing::instrument(skip(self, scene))]
    pub fn compute_frame(&self, tick: Tick, scene: &SceneConfig) -> TickreelResult<FrameLayers> {
        let resolved = self.resolve_frame(tick, scene);
        let mut layers = Vec::with_capacity(resolved.clips.len());
        for clip in resolved.clips {
            let Some(blueprint) = self.registry.get(&clip.blueprint_id) else {
                continue;
            };
            let mut surface = Surface::new(self.canvas.width, self.canvas.height)?;
            {
                let mut ctx = DrawContext::new(
                    &mut surface,
                    tick,
                    clip.local_tick,
                    clip.local_time,
                    Rng::for_clip(self.seed, &clip.clip_id, tick.0),
                    clip.audio.as_ref(),
                    &clip.props,
                    &self.assets,
                );
                blueprint.draw(&mut ctx).map_err(|e| {
                    TickreelError::evaluation(format!(
                        "blueprint '{}' failed for clip '{}' at tick {}: {e}",
                        clip.blueprint_id, clip.clip_id, tick.0
                    ))
                })?;
            }
            layers.push(Layer {
                surface: surface.finish()?,
                clip,
            });
        }

        Ok(FrameLayers {
            tick,
            camera: resolved.camera,
            layers,
            skipped: resolved.skipped,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/engine.rs"]
mod tests;
