//! Out-of-process render host.
//!
//! A host is any program that speaks a line-oriented JSON protocol on stdio:
//!
//! - On start the host writes `{"ok":true,"ready":true,"width":W,"height":H}`.
//! - `{"cmd":"seek","tick":N,"config":{...}}` is answered with `{"ok":true,"tick":N}` once tick `N`
//!   is fully drawn.
//! - `{"cmd":"capture"}` is answered with `{"ok":true,"width":W,"height":H,"bytes":L}` followed by
//!   exactly `L` bytes of premultiplied RGBA8.
//! - `{"cmd":"shutdown"}` is answered with `{"ok":true}` and the host exits.
//!
//! Failures are reported as `{"ok":false,"error":"..."}`. [`serve_host`] implements the host side
//! over any [`RenderBackend`]; the `tickreel host` subcommand exposes it.

use std::io::{BufRead, BufReader, Read, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

use crate::foundation::core::{Canvas, Tick};
use crate::foundation::error::{TickreelError, TickreelResult};
use crate::orchestrate::cancel::CancelToken;
use crate::render::backend::{BackendFactory, FrameRGBA, RenderBackend};
use crate::timeline::scene::SceneConfig;

/// Default budget for a seek or capture reply.
pub const DEFAULT_SEEK_TIMEOUT: Duration = Duration::from_secs(30);
/// Default budget for the ready line.
pub const DEFAULT_LAUNCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest stretch a blocked wait goes without looking at the cancel token.
const CANCEL_POLL: Duration = Duration::from_millis(25);

/// How to launch a render host.
#[derive(Clone, Debug)]
pub struct HostOpts {
    /// Host executable.
    pub program: PathBuf,
    /// Arguments passed to the host.
    pub args: Vec<String>,
    /// Budget for a seek (and for a capture) to be acknowledged.
    pub seek_timeout: Duration,
    /// Budget for the ready line after spawn.
    pub launch_timeout: Duration,
}

impl HostOpts {
    /// Launch `program` with no arguments and default timeouts.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            seek_timeout: DEFAULT_SEEK_TIMEOUT,
            launch_timeout: DEFAULT_LAUNCH_TIMEOUT,
        }
    }

    /// Replace the host arguments.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set the seek and capture budget.
    pub fn with_seek_timeout(mut self, timeout: Duration) -> Self {
        self.seek_timeout = timeout;
        self
    }
}

/// Request line sent to a host.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "cmd", rename_all = "camelCase")]
pub enum HostRequest {
    /// Draw `tick` with `config`.
    Seek {
        /// Tick to draw.
        tick: u64,
        /// Scene state after the per-tick hook.
        config: SceneConfig,
    },
    /// Send the last drawn frame.
    Capture,
    /// Exit after replying.
    Shutdown,
}

/// Reply line written by a host.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostReply {
    /// `false` when the request failed.
    pub ok: bool,
    /// Failure message when `ok` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Set on the line announcing a started host.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub ready: bool,
    /// Tick a seek settled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tick: Option<u64>,
    /// Frame width, on ready and capture replies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Frame height, on ready and capture replies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Length of the raw frame following a capture reply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes: Option<usize>,
}

impl HostReply {
    fn ok() -> Self {
        Self {
            ok: true,
            ..Self::default()
        }
    }

    fn failed(msg: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(msg.into()),
            ..Self::default()
        }
    }
}

enum Incoming {
    Reply(HostReply, Vec<u8>),
    Closed(String),
}

enum Waited {
    Got(Incoming),
    TimedOut,
    Cancelled,
}

/// [`RenderBackend`] that drives a spawned render host process.
pub struct HostProcessBackend {
    opts: HostOpts,
    child: Child,
    stdin: Option<ChildStdin>,
    rx: mpsc::Receiver<Incoming>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,
    canvas: Option<Canvas>,
    cancel: Option<CancelToken>,
    finished: bool,
}

impl HostProcessBackend {
    /// Spawn the host and wait for its ready line.
    pub fn launch(opts: HostOpts) -> TickreelResult<Self> {
        let mut child = Command::new(&opts.program)
            .args(&opts.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                TickreelError::host_launch(format!(
                    "failed to spawn render host '{}': {e}",
                    opts.program.display()
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| TickreelError::host_launch("failed to open render host stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TickreelError::host_launch("failed to open render host stdout"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| TickreelError::host_launch("failed to open render host stderr"))?;

        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || read_replies(BufReader::new(stdout), tx));
        let stderr_drain = std::thread::spawn(move || {
            let mut bytes = Vec::new();
            stderr.read_to_end(&mut bytes)?;
            Ok(bytes)
        });

        let mut backend = Self {
            opts,
            child,
            stdin: Some(stdin),
            rx,
            stderr_drain: Some(stderr_drain),
            canvas: None,
            cancel: None,
            finished: false,
        };

        let ready = match backend.rx.recv_timeout(backend.opts.launch_timeout) {
            Ok(Incoming::Reply(reply, _)) if reply.ok && reply.ready => reply,
            Ok(Incoming::Reply(reply, _)) => {
                backend.kill();
                return Err(TickreelError::host_launch(format!(
                    "render host did not report ready: {}",
                    reply.error.unwrap_or_else(|| "unexpected reply".to_string())
                )));
            }
            Ok(Incoming::Closed(msg)) => {
                let stderr = backend.kill();
                return Err(TickreelError::host_launch(format!(
                    "render host exited during startup ({msg}): {stderr}"
                )));
            }
            Err(_) => {
                backend.kill();
                return Err(TickreelError::host_launch(format!(
                    "render host was not ready within {} ms",
                    backend.opts.launch_timeout.as_millis()
                )));
            }
        };
        if let (Some(width), Some(height)) = (ready.width, ready.height) {
            backend.canvas = Some(Canvas { width, height });
        }
        tracing::debug!(program = %backend.opts.program.display(), "render host ready");
        Ok(backend)
    }

    fn send(&mut self, req: &HostRequest) -> std::io::Result<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| std::io::Error::other("render host stdin already closed"))?;
        let mut line = serde_json::to_vec(req).map_err(std::io::Error::other)?;
        line.push(b'\n');
        stdin.write_all(&line)?;
        stdin.flush()
    }

    /// Wait up to `timeout` for the next reply, checking the cancel token between short slices.
    fn wait(&mut self, timeout: Duration) -> Waited {
        let deadline = Instant::now() + timeout;
        loop {
            if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
                let stderr = self.kill();
                tracing::debug!(stderr = %stderr, "render host killed on cancellation");
                return Waited::Cancelled;
            }
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                return Waited::TimedOut;
            }
            match self.rx.recv_timeout(left.min(CANCEL_POLL)) {
                Ok(msg) => return Waited::Got(msg),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    return Waited::Got(Incoming::Closed("render host reader stopped".to_string()));
                }
            }
        }
    }

    /// Kill the host and return whatever it wrote to stderr.
    fn kill(&mut self) -> String {
        self.finished = true;
        drop(self.stdin.take());
        let _ = self.child.kill();
        let _ = self.child.wait();
        self.stderr_drain
            .take()
            .and_then(|h| h.join().ok())
            .and_then(Result::ok)
            .map(|b| String::from_utf8_lossy(&b).trim().to_string())
            .unwrap_or_default()
    }
}

impl RenderBackend for HostProcessBackend {
    fn watch_cancel(&mut self, token: CancelToken) {
        self.cancel = Some(token);
    }

    fn seek(&mut self, tick: Tick, config: &SceneConfig) -> TickreelResult<()> {
        self.send(&HostRequest::Seek {
            tick: tick.0,
            config: *config,
        })
        .map_err(|e| TickreelError::evaluation(format!("failed to send seek to render host: {e}")))?;

        match self.wait(self.opts.seek_timeout) {
            Waited::Got(Incoming::Reply(reply, _)) if reply.ok => match reply.tick {
                Some(t) if t != tick.0 => Err(TickreelError::evaluation(format!(
                    "render host acknowledged tick {t}, expected {}",
                    tick.0
                ))),
                _ => Ok(()),
            },
            Waited::Got(Incoming::Reply(reply, _)) => Err(TickreelError::evaluation(format!(
                "render host failed to seek tick {}: {}",
                tick.0,
                reply.error.unwrap_or_default()
            ))),
            Waited::Got(Incoming::Closed(msg)) => Err(TickreelError::evaluation(format!(
                "render host went away during seek: {msg}"
            ))),
            Waited::Cancelled => Err(TickreelError::Cancelled),
            Waited::TimedOut => Err(TickreelError::SeekTimeout {
                tick: tick.0,
                timeout_ms: self.opts.seek_timeout.as_millis() as u64,
            }),
        }
    }

    fn capture_frame(&mut self) -> TickreelResult<FrameRGBA> {
        self.send(&HostRequest::Capture)
            .map_err(|e| TickreelError::capture(format!("failed to send capture to render host: {e}")))?;

        let (reply, payload) = match self.wait(self.opts.seek_timeout) {
            Waited::Got(Incoming::Reply(reply, payload)) => (reply, payload),
            Waited::Got(Incoming::Closed(msg)) => {
                return Err(TickreelError::capture(format!(
                    "render host went away during capture: {msg}"
                )));
            }
            Waited::Cancelled => return Err(TickreelError::Cancelled),
            Waited::TimedOut => {
                return Err(TickreelError::capture(format!(
                    "render host did not deliver a frame within {} ms",
                    self.opts.seek_timeout.as_millis()
                )));
            }
        };
        if !reply.ok {
            return Err(TickreelError::capture(reply.error.unwrap_or_default()));
        }
        let (Some(width), Some(height)) = (reply.width, reply.height) else {
            return Err(TickreelError::capture("render host frame header lacks width/height"));
        };
        if let Some(canvas) = self.canvas
            && (canvas.width != width || canvas.height != height)
        {
            return Err(TickreelError::capture(format!(
                "render host frame is {width}x{height}, announced {}x{}",
                canvas.width, canvas.height
            )));
        }
        let frame = FrameRGBA {
            width,
            height,
            data: payload,
            premultiplied: true,
        };
        frame.validate()?;
        Ok(frame)
    }

    fn shutdown(&mut self) -> TickreelResult<()> {
        if self.finished {
            return Ok(());
        }
        let _ = self.send(&HostRequest::Shutdown);
        drop(self.stdin.take());
        let acked = matches!(
            self.rx.recv_timeout(self.opts.seek_timeout),
            Ok(Incoming::Reply(ref reply, _)) if reply.ok
        );
        if !acked {
            let stderr = self.kill();
            tracing::warn!(stderr = %stderr, "render host did not acknowledge shutdown; killed");
            return Ok(());
        }
        self.finished = true;
        let status = self
            .child
            .wait()
            .map_err(|e| TickreelError::evaluation(format!("failed to wait for render host: {e}")))?;
        if let Some(h) = self.stderr_drain.take() {
            let _ = h.join();
        }
        if !status.success() {
            tracing::warn!(%status, "render host exited unsuccessfully");
        }
        Ok(())
    }
}

impl Drop for HostProcessBackend {
    fn drop(&mut self) {
        if !self.finished {
            self.kill();
        }
    }
}

/// Byte count of the payload following `reply`, checked before anything is allocated.
///
/// A payload must be exactly one frame of the size in the reply header, and of the canvas the
/// host announced on startup once it has.
pub(crate) fn payload_len(reply: &HostReply, announced: Option<Canvas>) -> Result<usize, String> {
    let Some(bytes) = reply.bytes.filter(|&b| b > 0) else {
        return Ok(0);
    };
    let (Some(width), Some(height)) = (reply.width, reply.height) else {
        return Err(format!("payload of {bytes} bytes without frame width/height"));
    };
    let header = Canvas { width, height };
    if let Some(canvas) = announced
        && canvas != header
    {
        return Err(format!(
            "frame is {width}x{height}, announced {}x{}",
            canvas.width, canvas.height
        ));
    }
    if bytes != header.byte_len() {
        return Err(format!(
            "payload of {bytes} bytes does not match a {width}x{height} frame ({} bytes)",
            header.byte_len()
        ));
    }
    Ok(bytes)
}

fn read_replies<R: BufRead>(mut reader: R, tx: mpsc::Sender<Incoming>) {
    let mut line = String::new();
    let mut announced = None;
    loop {
        line.clear();
        let msg = match reader.read_line(&mut line) {
            Ok(0) => Incoming::Closed("render host closed stdout".to_string()),
            Ok(_) => match serde_json::from_str::<HostReply>(line.trim_end()) {
                Ok(reply) => {
                    if reply.ready
                        && let (Some(width), Some(height)) = (reply.width, reply.height)
                    {
                        announced = Some(Canvas { width, height });
                    }
                    match payload_len(&reply, announced) {
                        Ok(len) => {
                            let mut payload = vec![0u8; len];
                            match reader.read_exact(&mut payload) {
                                Ok(()) => Incoming::Reply(reply, payload),
                                Err(e) => Incoming::Closed(format!("short frame payload: {e}")),
                            }
                        }
                        Err(msg) => Incoming::Closed(format!("rejected frame header: {msg}")),
                    }
                }
                Err(e) => Incoming::Closed(format!("malformed reply '{}': {e}", line.trim_end())),
            },
            Err(e) => Incoming::Closed(format!("failed to read from render host: {e}")),
        };
        let stop = matches!(msg, Incoming::Closed(_));
        if tx.send(msg).is_err() || stop {
            return;
        }
    }
}

/// Host side of the protocol: answer requests from `input` by driving `backend`.
///
/// Returns after a shutdown request or when `input` ends.
pub fn serve_host<R: BufRead, W: Write>(
    backend: &mut dyn RenderBackend,
    canvas: Canvas,
    input: R,
    mut output: W,
) -> TickreelResult<()> {
    write_reply(
        &mut output,
        &HostReply {
            ready: true,
            width: Some(canvas.width),
            height: Some(canvas.height),
            ..HostReply::ok()
        },
        None,
    )?;

    for line in input.lines() {
        let line = line.map_err(|e| TickreelError::evaluation(format!("render host input: {e}")))?;
        if line.trim().is_empty() {
            continue;
        }
        let req: HostRequest = match serde_json::from_str(&line) {
            Ok(r) => r,
            Err(e) => {
                write_reply(&mut output, &HostReply::failed(format!("bad request: {e}")), None)?;
                continue;
            }
        };
        match req {
            HostRequest::Seek { tick, config } => {
                let reply = match backend.seek(Tick(tick), &config) {
                    Ok(()) => HostReply {
                        tick: Some(tick),
                        ..HostReply::ok()
                    },
                    Err(e) => HostReply::failed(e.to_string()),
                };
                write_reply(&mut output, &reply, None)?;
            }
            HostRequest::Capture => match backend.capture_frame() {
                Ok(frame) => {
                    let reply = HostReply {
                        width: Some(frame.width),
                        height: Some(frame.height),
                        bytes: Some(frame.data.len()),
                        ..HostReply::ok()
                    };
                    write_reply(&mut output, &reply, Some(&frame.data))?;
                }
                Err(e) => write_reply(&mut output, &HostReply::failed(e.to_string()), None)?,
            },
            HostRequest::Shutdown => {
                backend.shutdown()?;
                write_reply(&mut output, &HostReply::ok(), None)?;
                return Ok(());
            }
        }
    }
    backend.shutdown()
}

fn write_reply<W: Write>(out: &mut W, reply: &HostReply, payload: Option<&[u8]>) -> TickreelResult<()> {
    let mut line = serde_json::to_vec(reply).map_err(|e| TickreelError::serde(e.to_string()))?;
    line.push(b'\n');
    let io = |e: std::io::Error| TickreelError::evaluation(format!("render host output: {e}"));
    out.write_all(&line).map_err(io)?;
    if let Some(bytes) = payload {
        out.write_all(bytes).map_err(io)?;
    }
    out.flush().map_err(io)
}

/// Launches one [`HostProcessBackend`] per worker.
#[derive(Clone, Debug)]
pub struct HostBackendFactory {
    opts: HostOpts,
}

impl HostBackendFactory {
    /// Factory launching hosts with `opts`.
    pub fn new(opts: HostOpts) -> Self {
        Self { opts }
    }
}

impl BackendFactory for HostBackendFactory {
    fn create(&self, worker: usize) -> TickreelResult<Box<dyn RenderBackend>> {
        tracing::debug!(worker, program = %self.opts.program.display(), "launching render host");
        Ok(Box::new(HostProcessBackend::launch(self.opts.clone())?))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/host.rs"]
mod tests;
