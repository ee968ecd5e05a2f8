use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;

use anyhow::Context as _;

use crate::encode::sink::{FrameSink, SinkConfig, SinkFactory, TickOrder, check_frame};
use crate::foundation::core::Tick;
use crate::foundation::error::{TickreelError, TickreelResult};
use crate::foundation::math::mul_div255_u16;
use crate::render::backend::FrameRGBA;

/// Options for [`FfmpegSink`] MP4 output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FfmpegSinkOpts {
    /// Destination MP4.
    pub out_path: PathBuf,
    /// Replace `out_path` if it exists; otherwise `begin` fails.
    pub overwrite: bool,
    /// Straight-alpha color that translucent pixels are flattened onto.
    pub bg_rgba: [u8; 4],
    /// libx264 constant rate factor.
    pub crf: u8,
    /// libx264 preset name.
    pub preset: String,
}

impl FfmpegSinkOpts {
    /// Defaults: overwrite, opaque black background, crf 18, `medium`.
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
            bg_rgba: [0, 0, 0, 255],
            crf: 18,
            preset: "medium".to_string(),
        }
    }

    /// Set the flatten color.
    pub fn with_background(mut self, bg_rgba: [u8; 4]) -> Self {
        self.bg_rgba = bg_rgba;
        self
    }
}

/// Arguments for one chunk encode: raw RGBA on stdin, H.264/yuv420p MP4 out.
///
/// Only the output path differs between chunks of a job, which is what lets the concat demuxer
/// join them with `-c copy`.
pub(crate) fn encoder_args(opts: &FfmpegSinkOpts, cfg: SinkConfig) -> Vec<String> {
    let mut args: Vec<String> = vec![
        if opts.overwrite { "-y" } else { "-n" }.into(),
        "-loglevel".into(),
        "error".into(),
        "-f".into(),
        "rawvideo".into(),
        "-pix_fmt".into(),
        "rgba".into(),
        "-s".into(),
        format!("{}x{}", cfg.width, cfg.height),
        // rawvideo takes its rate from -r before -i
        "-r".into(),
        format!("{}/{}", cfg.fps.num, cfg.fps.den),
        "-i".into(),
        "pipe:0".into(),
        "-an".into(),
        "-c:v".into(),
        "libx264".into(),
        "-preset".into(),
        opts.preset.clone(),
        "-crf".into(),
        opts.crf.to_string(),
        "-pix_fmt".into(),
        "yuv420p".into(),
        "-movflags".into(),
        "+faststart".into(),
    ];
    args.push(opts.out_path.display().to_string());
    args
}

/// A running `ffmpeg` with piped stdin and a thread collecting its stderr.
struct EncoderProcess {
    child: Child,
    stdin: Option<ChildStdin>,
    stderr: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
}

impl EncoderProcess {
    fn spawn(args: &[String]) -> TickreelResult<Self> {
        let mut child = Command::new("ffmpeg")
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| TickreelError::encode(format!("failed to spawn ffmpeg: {e}")))?;

        let stdin = child.stdin.take();
        let stderr = child.stderr.take().map(|mut pipe| {
            std::thread::spawn(move || {
                let mut bytes = Vec::new();
                pipe.read_to_end(&mut bytes)?;
                Ok(bytes)
            })
        });
        if stdin.is_none() || stderr.is_none() {
            let _ = child.kill();
            let _ = child.wait();
            return Err(TickreelError::encode("ffmpeg pipes could not be opened"));
        }
        Ok(Self {
            child,
            stdin,
            stderr,
        })
    }

    fn write(&mut self, bytes: &[u8]) -> TickreelResult<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| TickreelError::encode("ffmpeg stdin is closed"))?;
        stdin
            .write_all(bytes)
            .map_err(|e| TickreelError::encode(format!("failed to write frame to ffmpeg: {e}")))
    }

    /// Close stdin, wait for exit and return the status with collected stderr.
    fn finish(mut self) -> TickreelResult<(ExitStatus, String)> {
        drop(self.stdin.take());
        let status = self
            .child
            .wait()
            .map_err(|e| TickreelError::encode(format!("failed to wait for ffmpeg: {e}")))?;
        let stderr = match self.stderr.take().map(JoinHandle::join) {
            Some(Ok(Ok(bytes))) => String::from_utf8_lossy(&bytes).trim().to_string(),
            Some(Ok(Err(e))) => format!("<stderr unreadable: {e}>"),
            Some(Err(_)) => "<stderr reader panicked>".to_string(),
            None => String::new(),
        };
        Ok((status, stderr))
    }

    fn kill(mut self) {
        drop(self.stdin.take());
        let _ = self.child.kill();
        let _ = self.child.wait();
        if let Some(h) = self.stderr.take() {
            let _ = h.join();
        }
    }
}

/// Sink that streams flattened RGBA frames into a system `ffmpeg` (libx264, yuv420p).
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,
    process: Option<EncoderProcess>,
    scratch: Vec<u8>,
    cfg: Option<SinkConfig>,
    order: TickOrder,
}

impl FfmpegSink {
    /// Sink that spawns its encoder in `begin`.
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            process: None,
            scratch: Vec::new(),
            cfg: None,
            order: TickOrder::default(),
        }
    }

    fn remove_output(&self) {
        if let Err(e) = std::fs::remove_file(&self.opts.out_path)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!(path = %self.opts.out_path.display(), error = %e, "failed to remove partial ffmpeg output");
        }
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> TickreelResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(TickreelError::validation("ffmpeg sink needs a non-empty frame size"));
        }
        // yuv420p subsamples chroma 2x2
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(TickreelError::validation(format!(
                "ffmpeg sink needs even dimensions for yuv420p, got {}x{}",
                cfg.width, cfg.height
            )));
        }
        if !self.opts.overwrite && self.opts.out_path.exists() {
            return Err(TickreelError::validation(format!(
                "output file '{}' already exists",
                self.opts.out_path.display()
            )));
        }
        ensure_parent_dir(&self.opts.out_path)?;
        if !is_ffmpeg_on_path() {
            return Err(TickreelError::encode("ffmpeg was not found on PATH"));
        }

        self.process = Some(EncoderProcess::spawn(&encoder_args(&self.opts, cfg))?);
        self.scratch = vec![0; cfg.frame_len()];
        self.cfg = Some(cfg);
        self.order.reset();
        tracing::debug!(path = %self.opts.out_path.display(), "ffmpeg sink started");
        Ok(())
    }

    fn push_frame(&mut self, tick: Tick, frame: &FrameRGBA) -> TickreelResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| TickreelError::encode("ffmpeg sink not started"))?;
        check_frame(cfg, frame)?;
        self.order.advance(tick, "ffmpeg")?;
        flatten_onto(&mut self.scratch, frame, self.opts.bg_rgba)?;

        let process = self
            .process
            .as_mut()
            .ok_or_else(|| TickreelError::encode("ffmpeg sink is already finalized"))?;
        process.write(&self.scratch)
    }

    fn end(&mut self) -> TickreelResult<()> {
        let process = self
            .process
            .take()
            .ok_or_else(|| TickreelError::encode("ffmpeg sink not started"))?;
        self.cfg = None;
        let (status, stderr) = process.finish()?;
        if !status.success() {
            self.remove_output();
            return Err(TickreelError::encode(format!(
                "ffmpeg exited with {status}: {stderr}"
            )));
        }
        Ok(())
    }

    fn abort(&mut self) {
        if let Some(process) = self.process.take() {
            process.kill();
        }
        self.cfg = None;
        self.remove_output();
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        if self.process.is_some() {
            self.abort();
        }
    }
}

/// Composite `frame` over an opaque `bg` into `dst` (opaque RGBA8).
fn flatten_onto(dst: &mut [u8], frame: &FrameRGBA, bg: [u8; 4]) -> TickreelResult<()> {
    if dst.len() != frame.data.len() || !dst.len().is_multiple_of(4) {
        return Err(TickreelError::validation(format!(
            "cannot flatten {} frame bytes into a {} byte buffer",
            frame.data.len(),
            dst.len()
        )));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(frame.data.chunks_exact(4)) {
        let a = u16::from(s[3]);
        let inv = 255 - a;
        for c in 0..3 {
            let src = if frame.premultiplied {
                u16::from(s[c])
            } else {
                mul_div255_u16(u16::from(s[c]), a)
            };
            d[c] = (src + mul_div255_u16(u16::from(bg[c]), inv)).min(255) as u8;
        }
        d[3] = 255;
    }
    Ok(())
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> TickreelResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg -version` runs successfully.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|s| s.success())
}

/// Creates an [`FfmpegSink`] per chunk, all with the same encoder settings.
#[derive(Clone, Debug)]
pub struct FfmpegSinkFactory {
    /// Straight-alpha flatten color.
    pub bg_rgba: [u8; 4],
    /// libx264 constant rate factor.
    pub crf: u8,
    /// libx264 preset name.
    pub preset: String,
}

impl Default for FfmpegSinkFactory {
    fn default() -> Self {
        let opts = FfmpegSinkOpts::new(PathBuf::new());
        Self {
            bg_rgba: opts.bg_rgba,
            crf: opts.crf,
            preset: opts.preset,
        }
    }
}

impl SinkFactory for FfmpegSinkFactory {
    fn extension(&self) -> &str {
        "mp4"
    }

    fn create(&self, _index: usize, out_path: &Path) -> TickreelResult<Box<dyn FrameSink>> {
        let mut opts = FfmpegSinkOpts::new(out_path).with_background(self.bg_rgba);
        opts.crf = self.crf;
        opts.preset = self.preset.clone();
        Ok(Box::new(FfmpegSink::new(opts)))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
