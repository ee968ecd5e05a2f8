use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::Context;
use rayon::prelude::*;

use crate::encode::sink::{SinkConfig, SinkFactory};
use crate::encode::stitch::Stitcher;
use crate::foundation::core::{Canvas, Fps, Tick};
use crate::foundation::error::{TickreelError, TickreelResult};
use crate::orchestrate::cancel::CancelToken;
use crate::orchestrate::chunk::{ChunkState, RenderChunk, plan_chunks};
use crate::orchestrate::progress::{ProgressEvent, ProgressReporter};
use crate::render::backend::BackendFactory;
use crate::timeline::scene::SceneConfig;

/// Per-tick scene hook, called with a fresh copy of the job's base scene before every seek.
pub type TickHook = Arc<dyn Fn(Tick, &mut SceneConfig) + Send + Sync>;

/// Output, parallelism and retry settings of a [`RenderJob`].
#[derive(Clone, Debug)]
pub struct RenderJobOpts {
    /// Number of chunks, and of concurrently running workers.
    pub concurrency: usize,
    /// Final stitched output.
    pub out_path: PathBuf,
    /// Where chunk files go. A fresh directory under the system temp dir when unset.
    pub temp_dir: Option<PathBuf>,
    /// Extra attempts per failed chunk. `0` fails the job on the first chunk error.
    pub max_chunk_retries: u32,
    /// Emit a progress event every this many finished frames.
    pub progress_every: u64,
}

impl RenderJobOpts {
    /// Options with no retries, a fresh temp dir and progress every 10 frames.
    pub fn new(out_path: impl Into<PathBuf>, concurrency: usize) -> Self {
        Self {
            concurrency,
            out_path: out_path.into(),
            temp_dir: None,
            max_chunk_retries: 0,
            progress_every: 10,
        }
    }
}

/// Summary of a finished job.
#[derive(Clone, Debug)]
pub struct RenderReport {
    /// Ticks rendered.
    pub total_ticks: u64,
    /// Chunks in stitch order, all `encoded`.
    pub chunks: Vec<RenderChunk>,
    /// Stitched output.
    pub out_path: PathBuf,
    /// Wall time of the whole job.
    pub elapsed: Duration,
}

/// One render of `[0, total_ticks)` into `opts.out_path`.
pub struct RenderJob {
    canvas: Canvas,
    fps: Fps,
    total_ticks: u64,
    scene: SceneConfig,
    backends: Arc<dyn BackendFactory>,
    sinks: Arc<dyn SinkFactory>,
    stitcher: Arc<dyn Stitcher>,
    hook: Option<TickHook>,
    progress: Option<Sender<ProgressEvent>>,
    cancel: CancelToken,
    opts: RenderJobOpts,
}

impl RenderJob {
    /// Job over `[0, total_ticks)` with the default scene, no hook and a fresh cancel token.
    pub fn new(
        canvas: Canvas,
        fps: Fps,
        total_ticks: u64,
        backends: Arc<dyn BackendFactory>,
        sinks: Arc<dyn SinkFactory>,
        stitcher: Arc<dyn Stitcher>,
        opts: RenderJobOpts,
    ) -> Self {
        Self {
            canvas,
            fps,
            total_ticks,
            scene: SceneConfig::default(),
            backends,
            sinks,
            stitcher,
            hook: None,
            progress: None,
            cancel: CancelToken::new(),
            opts,
        }
    }

    /// Base scene every tick starts from.
    pub fn with_scene(mut self, scene: SceneConfig) -> Self {
        self.scene = scene;
        self
    }

    /// Run `hook` on a fresh copy of the base scene before every seek.
    pub fn with_hook(mut self, hook: impl Fn(Tick, &mut SceneConfig) + Send + Sync + 'static) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Send [`ProgressEvent`]s to `tx`.
    pub fn with_progress(mut self, tx: Sender<ProgressEvent>) -> Self {
        self.progress = Some(tx);
        self
    }

    /// Share cancellation with an existing token.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that cancels this job.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Job options.
    pub fn opts(&self) -> &RenderJobOpts {
        &self.opts
    }

    fn validate(&self) -> TickreelResult<()> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(TickreelError::config("canvas width/height must be > 0"));
        }
        if self.total_ticks == 0 {
            return Err(TickreelError::config("render job has no ticks"));
        }
        if self.opts.concurrency == 0 {
            return Err(TickreelError::config("concurrency must be >= 1"));
        }
        Ok(())
    }

    /// Render every chunk in parallel, stitch them in index order and remove the chunk files.
    ///
    /// Any chunk failure fails the whole job; the other workers stop at their next tick.
    #[tracing::instrument(skip(self), fields(total_ticks = self.total_ticks, concurrency = self.opts.concurrency))]
    pub fn run(&self) -> TickreelResult<RenderReport> {
        self.validate()?;
        self.cancel.check()?;
        let started = Instant::now();

        let mut temp = TempGuard::default();
        let dir = match &self.opts.temp_dir {
            Some(dir) => dir.clone(),
            None => {
                let dir = std::env::temp_dir().join(format!(
                    "tickreel-{}-{}",
                    std::process::id(),
                    std::time::SystemTime::now()
                        .duration_since(std::time::UNIX_EPOCH)
                        .map(|d| d.as_nanos())
                        .unwrap_or(0)
                ));
                temp.dir = Some(dir.clone());
                dir
            }
        };
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create chunk directory '{}'", dir.display()))?;

        let mut chunks = plan_chunks(self.total_ticks, self.opts.concurrency, &dir, self.sinks.extension())?;
        temp.files = chunks.iter().map(|c| c.output_path.clone()).collect();
        tracing::info!(chunks = chunks.len(), dir = %dir.display(), "render job started");

        let pool = build_thread_pool(Some(chunks.len()))?;
        let reporter = ProgressReporter::new(self.progress.clone(), self.total_ticks, self.opts.progress_every);
        let states = Mutex::new(vec![ChunkState::Pending; chunks.len()]);
        let ctx = WorkerCtx {
            job: self,
            reporter: &reporter,
            states: &states,
            halt: self.cancel.child(),
        };

        let results = pool.install(|| {
            chunks
                .par_iter()
                .map(|chunk| ctx.render_chunk_with_retries(chunk))
                .collect::<Vec<_>>()
        });

        for (chunk, state) in chunks.iter_mut().zip(lock(&states).iter()) {
            chunk.state = *state;
        }
        if let Some(err) = pick_error(results) {
            tracing::warn!(error = %err, "render job failed");
            return Err(err);
        }
        self.cancel.check()?;

        let parts: Vec<PathBuf> = chunks.iter().map(|c| c.output_path.clone()).collect();
        self.stitcher.stitch(&parts, &self.opts.out_path)?;
        drop(temp);

        let elapsed = started.elapsed();
        tracing::info!(
            out = %self.opts.out_path.display(),
            frames = reporter.done(),
            elapsed_ms = elapsed.as_millis() as u64,
            "render job finished"
        );
        Ok(RenderReport {
            total_ticks: self.total_ticks,
            chunks,
            out_path: self.opts.out_path.clone(),
            elapsed,
        })
    }
}

/// Prefer a real failure (lowest chunk index first) over the cancellations it caused.
fn pick_error(results: Vec<TickreelResult<()>>) -> Option<TickreelError> {
    let mut cancelled = None;
    for r in results {
        match r {
            Ok(()) => {}
            Err(e) if e.is_cancelled() => cancelled = Some(e),
            Err(e) => return Some(e),
        }
    }
    cancelled
}

struct WorkerCtx<'a> {
    job: &'a RenderJob,
    reporter: &'a ProgressReporter,
    states: &'a Mutex<Vec<ChunkState>>,
    /// Set by the first failing chunk; also observes the job's cancel token.
    halt: CancelToken,
}

impl WorkerCtx<'_> {
    fn should_stop(&self) -> bool {
        self.halt.is_cancelled()
    }

    fn set_state(&self, index: usize, state: ChunkState) {
        if let Some(slot) = lock(self.states).get_mut(index) {
            *slot = state;
        }
    }

    fn render_chunk_with_retries(&self, chunk: &RenderChunk) -> TickreelResult<()> {
        let mut attempt = 0;
        loop {
            self.set_state(chunk.index, ChunkState::Rendering);
            let mut frames = 0;
            match self.render_chunk(chunk, &mut frames) {
                Ok(()) => {
                    self.set_state(chunk.index, ChunkState::Encoded);
                    return Ok(());
                }
                Err(e) if e.is_cancelled() => {
                    self.set_state(chunk.index, ChunkState::Failed);
                    return Err(e);
                }
                Err(e) if attempt < self.job.opts.max_chunk_retries && !self.should_stop() => {
                    attempt += 1;
                    tracing::warn!(chunk = chunk.index, attempt, error = %e, "chunk failed; retrying");
                    self.reporter.rewind(frames);
                }
                Err(e) => {
                    self.set_state(chunk.index, ChunkState::Failed);
                    self.halt.cancel();
                    return Err(e);
                }
            }
        }
    }

    /// Strict per-tick order: hook, seek, capture, push.
    fn render_chunk(&self, chunk: &RenderChunk, frames: &mut u64) -> TickreelResult<()> {
        let job = self.job;
        let index = chunk.index;
        let mut backend = job
            .backends
            .create(index)
            .map_err(|e| e.in_chunk(index, None))?;
        backend.watch_cancel(self.halt.clone());
        let mut sink = job
            .sinks
            .create(index, &chunk.output_path)
            .map_err(|e| e.in_chunk(index, None))?;
        let cfg = SinkConfig {
            width: job.canvas.width,
            height: job.canvas.height,
            fps: job.fps,
        };
        if let Err(e) = sink.begin(cfg) {
            sink.abort();
            return Err(e.in_chunk(index, None));
        }
        tracing::debug!(chunk = index, start = chunk.start_tick.0, end = chunk.end_tick_exclusive.0, "chunk started");

        for tick in chunk.range().iter() {
            if self.should_stop() {
                sink.abort();
                return Err(TickreelError::Cancelled);
            }
            let mut scene = job.scene;
            if let Some(hook) = job.hook.as_ref() {
                hook(tick, &mut scene);
            }
            let step = backend
                .seek(tick, &scene)
                .and_then(|()| backend.capture_frame())
                .and_then(|frame| sink.push_frame(tick, &frame));
            if let Err(e) = step {
                sink.abort();
                return Err(e.in_chunk(index, Some(tick.0)));
            }
            *frames += 1;
            self.reporter.frame_done();
        }

        if let Err(e) = sink.end() {
            sink.abort();
            return Err(e.in_chunk(index, None));
        }
        if let Err(e) = backend.shutdown() {
            tracing::warn!(chunk = index, error = %e, "backend shutdown failed");
        }
        tracing::debug!(chunk = index, frames = *frames, "chunk encoded");
        Ok(())
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

pub(crate) fn build_thread_pool(threads: Option<usize>) -> TickreelResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(TickreelError::config("worker thread count must be >= 1 when set"));
    }

    let mut builder = rayon::ThreadPoolBuilder::new().thread_name(|i| format!("tickreel-worker-{i}"));
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| TickreelError::evaluation(format!("failed to build rayon thread pool: {e}")))
}

/// Removes chunk files, and the chunk directory when the job created it.
#[derive(Default)]
struct TempGuard {
    files: Vec<PathBuf>,
    dir: Option<PathBuf>,
}

impl Drop for TempGuard {
    fn drop(&mut self) {
        for path in self.files.drain(..) {
            remove_quietly(&path);
        }
        if let Some(dir) = self.dir.take()
            && let Err(e) = std::fs::remove_dir_all(&dir)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!(dir = %dir.display(), error = %e, "failed to remove chunk directory");
        }
    }
}

fn remove_quietly(path: &Path) {
    if let Err(e) = std::fs::remove_file(path)
        && e.kind() != std::io::ErrorKind::NotFound
    {
        tracing::warn!(path = %path.display(), error = %e, "failed to remove chunk file");
    }
}

#[cfg(test)]
#[path = "../../tests/unit/orchestrate/job.rs"]
mod tests;
