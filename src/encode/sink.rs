use std::path::Path;

use crate::foundation::core::{Fps, Tick};
use crate::foundation::error::{TickreelError, TickreelResult};
use crate::render::backend::FrameRGBA;

/// Configuration provided to a [`FrameSink`] before the first frame of a chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frames-per-second.
    pub fps: Fps,
}

impl SinkConfig {
    /// Bytes in one RGBA8 frame.
    pub fn frame_len(&self) -> usize {
        (self.width as usize) * (self.height as usize) * 4
    }
}

/// Sink contract for consuming rendered frames in timeline order.
///
/// Ordering contract: `push_frame` is called in strictly increasing tick order between `begin`
/// and `end`. `abort` may be called at any point and must leave no partial output behind.
pub trait FrameSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> TickreelResult<()>;
    /// Push one frame in strictly increasing tick order.
    fn push_frame(&mut self, tick: Tick, frame: &FrameRGBA) -> TickreelResult<()>;
    /// Called once after the last frame is pushed; the output is complete afterwards.
    fn end(&mut self) -> TickreelResult<()>;
    /// Stop immediately and discard partial output. Never fails.
    fn abort(&mut self);
}

/// Creates one sink per render chunk.
pub trait SinkFactory: Send + Sync {
    /// File extension of the chunk files this factory's sinks write (without the dot).
    fn extension(&self) -> &str;
    /// Sink writing chunk `index` to `out_path`.
    fn create(&self, index: usize, out_path: &Path) -> TickreelResult<Box<dyn FrameSink>>;
}

/// Shared tick-order bookkeeping for sinks.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct TickOrder {
    last: Option<Tick>,
}

impl TickOrder {
    pub(crate) fn reset(&mut self) {
        self.last = None;
    }

    pub(crate) fn advance(&mut self, tick: Tick, sink: &str) -> TickreelResult<()> {
        if let Some(last) = self.last
            && tick <= last
        {
            return Err(TickreelError::encode(format!(
                "{sink} sink received tick {} after tick {}",
                tick.0, last.0
            )));
        }
        self.last = Some(tick);
        Ok(())
    }
}

/// Check a frame against the sink configuration.
pub(crate) fn check_frame(cfg: &SinkConfig, frame: &FrameRGBA) -> TickreelResult<()> {
    if frame.width != cfg.width || frame.height != cfg.height {
        return Err(TickreelError::validation(format!(
            "frame size mismatch: got {}x{}, expected {}x{}",
            frame.width, frame.height, cfg.width, cfg.height
        )));
    }
    if frame.data.len() != cfg.frame_len() {
        return Err(TickreelError::validation(
            "frame.data size mismatch with width*height*4",
        ));
    }
    Ok(())
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    order: TickOrder,
    frames: Vec<(Tick, FrameRGBA)>,
    finished: bool,
}

impl InMemorySink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the sink configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    /// Captured frames in tick order.
    pub fn frames(&self) -> &[(Tick, FrameRGBA)] {
        &self.frames
    }

    /// Return `true` once `end` succeeded.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> TickreelResult<()> {
        self.cfg = Some(cfg);
        self.order.reset();
        self.frames.clear();
        self.finished = false;
        Ok(())
    }

    fn push_frame(&mut self, tick: Tick, frame: &FrameRGBA) -> TickreelResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| TickreelError::encode("in-memory sink not started"))?;
        check_frame(cfg, frame)?;
        self.order.advance(tick, "in-memory")?;
        self.frames.push((tick, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> TickreelResult<()> {
        if self.cfg.is_none() {
            return Err(TickreelError::encode("in-memory sink not started"));
        }
        self.finished = true;
        Ok(())
    }

    fn abort(&mut self) {
        self.frames.clear();
        self.cfg = None;
        self.finished = false;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
