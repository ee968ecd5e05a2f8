use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::encode::ffmpeg::ensure_parent_dir;
use crate::encode::sink::{FrameSink, SinkConfig, SinkFactory, TickOrder, check_frame};
use crate::foundation::core::Tick;
use crate::foundation::error::{TickreelError, TickreelResult};
use crate::render::backend::FrameRGBA;

/// Writes frames as a headerless stream of premultiplied RGBA8, one frame after another.
///
/// Chunk files concatenated byte-wise give the same stream a single sink would have written,
/// which makes this sink the reference for determinism checks.
pub struct RawFileSink {
    out_path: PathBuf,
    writer: Option<BufWriter<File>>,
    cfg: Option<SinkConfig>,
    order: TickOrder,
    frames: u64,
}

impl RawFileSink {
    /// Sink writing to `out_path`; the file is created in `begin`.
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            writer: None,
            cfg: None,
            order: TickOrder::default(),
            frames: 0,
        }
    }

    /// Destination path.
    pub fn out_path(&self) -> &Path {
        &self.out_path
    }

    /// Frames written since `begin`.
    pub fn frames_written(&self) -> u64 {
        self.frames
    }
}

impl FrameSink for RawFileSink {
    fn begin(&mut self, cfg: SinkConfig) -> TickreelResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(TickreelError::validation(
                "raw sink width/height must be non-zero",
            ));
        }
        ensure_parent_dir(&self.out_path)?;
        let file = File::create(&self.out_path)
            .with_context(|| format!("failed to create '{}'", self.out_path.display()))?;
        self.writer = Some(BufWriter::new(file));
        self.cfg = Some(cfg);
        self.order.reset();
        self.frames = 0;
        Ok(())
    }

    fn push_frame(&mut self, tick: Tick, frame: &FrameRGBA) -> TickreelResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| TickreelError::encode("raw sink not started"))?;
        check_frame(cfg, frame)?;
        self.order.advance(tick, "raw")?;
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| TickreelError::encode("raw sink is already finalized"))?;
        writer.write_all(&frame.data).map_err(|e| {
            TickreelError::encode(format!(
                "failed to write frame to '{}': {e}",
                self.out_path.display()
            ))
        })?;
        self.frames += 1;
        Ok(())
    }

    fn end(&mut self) -> TickreelResult<()> {
        let writer = self
            .writer
            .take()
            .ok_or_else(|| TickreelError::encode("raw sink not started"))?;
        let file = writer.into_inner().map_err(|e| {
            TickreelError::encode(format!(
                "failed to flush '{}': {}",
                self.out_path.display(),
                e.error()
            ))
        })?;
        file.sync_all()
            .with_context(|| format!("failed to sync '{}'", self.out_path.display()))?;
        self.cfg = None;
        tracing::debug!(path = %self.out_path.display(), frames = self.frames, "raw sink finished");
        Ok(())
    }

    fn abort(&mut self) {
        drop(self.writer.take());
        self.cfg = None;
        if let Err(e) = std::fs::remove_file(&self.out_path)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!(path = %self.out_path.display(), error = %e, "failed to remove partial raw output");
        }
    }
}

/// Creates a [`RawFileSink`] per chunk.
#[derive(Clone, Copy, Debug, Default)]
pub struct RawSinkFactory;

impl SinkFactory for RawSinkFactory {
    fn extension(&self) -> &str {
        "rgba"
    }

    fn create(&self, _index: usize, out_path: &Path) -> TickreelResult<Box<dyn FrameSink>> {
        Ok(Box::new(RawFileSink::new(out_path)))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/raw.rs"]
mod tests;
