use std::sync::Arc;

use crate::foundation::core::Tick;
use crate::foundation::error::{TickreelError, TickreelResult};
use crate::render::backend::{BackendFactory, FrameRGBA, RenderBackend};
use crate::render::composite::Compositor;
use crate::render::post::apply_post;
use crate::timeline::engine::Timeline;
use crate::timeline::scene::SceneConfig;

/// How render workers get their decoded assets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AssetSharing {
    /// All workers read one decoded store.
    #[default]
    Shared,
    /// Every worker decodes its own copy from the original sources.
    PerWorker,
}

/// In-process backend: engine, compositor and post stage on the calling thread.
pub struct CpuBackend {
    timeline: Arc<Timeline>,
    compositor: Compositor,
    pending: Option<FrameRGBA>,
    last_tick: Option<Tick>,
}

impl CpuBackend {
    /// Backend over `timeline` using its canvas and seed.
    pub fn new(timeline: Arc<Timeline>) -> Self {
        let compositor = Compositor::new(timeline.canvas(), timeline.seed());
        Self {
            timeline,
            compositor,
            pending: None,
            last_tick: None,
        }
    }

    /// Timeline this backend renders.
    pub fn timeline(&self) -> &Arc<Timeline> {
        &self.timeline
    }

    /// Compute, composite and post-process `tick` in one call.
    pub fn render_tick(&self, tick: Tick, config: &SceneConfig) -> TickreelResult<FrameRGBA> {
        let layers = self.timeline.compute_frame(tick, config)?;
        let mut frame = self.compositor.composite(&layers)?;
        apply_post(&mut frame, &config.effects)?;
        Ok(frame)
    }
}

impl RenderBackend for CpuBackend {
    fn seek(&mut self, tick: Tick, config: &SceneConfig) -> TickreelResult<()> {
        self.pending = Some(self.render_tick(tick, config)?);
        self.last_tick = Some(tick);
        Ok(())
    }

    fn capture_frame(&mut self) -> TickreelResult<FrameRGBA> {
        self.pending.take().ok_or_else(|| {
            TickreelError::capture(match self.last_tick {
                Some(t) => format!("tick {} was already captured", t.0),
                None => "capture_frame called before seek".to_string(),
            })
        })
    }

    fn shutdown(&mut self) -> TickreelResult<()> {
        self.pending = None;
        Ok(())
    }
}

/// Builds a [`CpuBackend`] per worker over a shared timeline.
#[derive(Clone, Debug)]
pub struct CpuBackendFactory {
    timeline: Arc<Timeline>,
    sharing: AssetSharing,
}

impl CpuBackendFactory {
    /// Factory handing every worker `timeline`, with assets per `sharing`.
    pub fn new(timeline: Arc<Timeline>, sharing: AssetSharing) -> Self {
        Self { timeline, sharing }
    }
}

impl BackendFactory for CpuBackendFactory {
    fn create(&self, worker: usize) -> TickreelResult<Box<dyn RenderBackend>> {
        let timeline = match self.sharing {
            AssetSharing::Shared => Arc::clone(&self.timeline),
            AssetSharing::PerWorker => {
                let assets = Arc::new(self.timeline.assets().reload()?);
                tracing::debug!(worker, assets = assets.len(), "reloaded assets for worker");
                Arc::new(self.timeline.as_ref().clone().with_assets(assets))
            }
        };
        Ok(Box::new(CpuBackend::new(timeline)))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
