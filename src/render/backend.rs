use crate::foundation::core::{Canvas, Tick};
use crate::foundation::error::{TickreelError, TickreelResult};
use crate::orchestrate::cancel::CancelToken;
use crate::timeline::scene::SceneConfig;

/// A rendered frame as RGBA8 pixels.
///
/// Frames are **premultiplied alpha** unless `premultiplied` says otherwise.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Fully transparent premultiplied frame of `canvas` size.
    pub fn transparent(canvas: Canvas) -> Self {
        Self {
            width: canvas.width,
            height: canvas.height,
            data: vec![0; canvas.byte_len()],
            premultiplied: true,
        }
    }

    /// Frame dimensions.
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    /// Check the buffer length against the declared size.
    pub fn validate(&self) -> TickreelResult<()> {
        let expected = self.canvas().byte_len();
        if self.data.len() != expected {
            return Err(TickreelError::capture(format!(
                "frame buffer holds {} bytes, expected {expected} for {}x{}",
                self.data.len(),
                self.width,
                self.height
            )));
        }
        Ok(())
    }

    /// Copy of the pixels with straight (non-premultiplied) alpha.
    pub fn to_straight_rgba(&self) -> Vec<u8> {
        if !self.premultiplied {
            return self.data.clone();
        }
        let mut out = self.data.clone();
        for px in out.chunks_exact_mut(4) {
            let a = u16::from(px[3]);
            if a == 0 {
                px[..3].fill(0);
                continue;
            }
            for c in &mut px[..3] {
                *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
            }
        }
        out
    }

    /// Pixel at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }
}

/// Something that turns a tick's scene into pixels.
///
/// Ordering contract: callers alternate `seek` and `capture_frame`, one tick at a time, in
/// increasing tick order. `seek` returns only once the tick is fully drawn.
pub trait RenderBackend: Send {
    /// Materialize `tick` with the given per-tick scene configuration.
    fn seek(&mut self, tick: Tick, config: &SceneConfig) -> TickreelResult<()>;

    /// Read back the frame produced by the last `seek`.
    fn capture_frame(&mut self) -> TickreelResult<FrameRGBA>;

    /// Token to poll while blocked on external work; a cancelled wait fails with
    /// [`TickreelError::Cancelled`]. Backends that never block ignore it.
    fn watch_cancel(&mut self, _token: CancelToken) {}

    /// Release external resources after the last capture.
    ///
    /// Workers that fail or are cancelled drop the backend instead; implementations holding
    /// external processes must terminate them on drop.
    fn shutdown(&mut self) -> TickreelResult<()> {
        Ok(())
    }
}

/// Creates one independent backend per render worker.
pub trait BackendFactory: Send + Sync {
    /// Backend for worker `worker`; called once per chunk attempt.
    fn create(&self, worker: usize) -> TickreelResult<Box<dyn RenderBackend>>;
}

impl<F> BackendFactory for F
where
    F: Fn(usize) -> TickreelResult<Box<dyn RenderBackend>> + Send + Sync,
{
    fn create(&self, worker: usize) -> TickreelResult<Box<dyn RenderBackend>> {
        self(worker)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/backend.rs"]
mod tests;
