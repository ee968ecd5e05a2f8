use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use tickreel::audio::analyze::AudioFrameData;
use tickreel::audio::decode::analyze_file;
use tickreel::audio::triggers::generate_pulses;
use tickreel::render::host::serve_host;
use tickreel::{
    AssetSharing, BackendFactory, BlueprintRegistry, ByteConcatStitcher, CpuBackend,
    CpuBackendFactory, FfmpegConcatStitcher, FfmpegSinkFactory, Fps, HostBackendFactory, HostOpts,
    Manifest, RawSinkFactory, RenderBackend, RenderJob, RenderJobOpts, SinkFactory, Stitcher, Tick,
    Timeline, TriggerConfig,
};

#[derive(Parser, Debug)]
#[command(name = "tickreel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a manifest in parallel chunks and stitch the result.
    Render(RenderArgs),
    /// Render a single tick as a PNG.
    Frame(FrameArgs),
    /// Analyze an audio file into per-tick volume and spectrum data.
    Analyze(AnalyzeArgs),
    /// Serve the render-host protocol on stdin/stdout for one manifest.
    Host(HostArgs),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// H.264 chunks joined with the ffmpeg concat demuxer (requires `ffmpeg` on PATH).
    Mp4,
    /// Headerless premultiplied RGBA8 frames, joined byte for byte.
    Raw,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum BackendKind {
    /// Render on worker threads in this process.
    Cpu,
    /// Launch one `tickreel host` process per worker.
    Process,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input manifest JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output path.
    #[arg(long)]
    out: PathBuf,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Mp4)]
    format: OutputFormat,

    /// Override the manifest's worker count.
    #[arg(long)]
    concurrency: Option<usize>,

    /// Where each worker's frames are drawn.
    #[arg(long, value_enum, default_value_t = BackendKind::Cpu)]
    backend: BackendKind,

    /// Retries per failed chunk before the job fails.
    #[arg(long, default_value_t = 0)]
    retries: u32,

    /// Decode a private copy of the image assets for every worker.
    #[arg(long, default_value_t = false)]
    per_worker_assets: bool,

    /// Directory for chunk files (a temporary one is used otherwise).
    #[arg(long)]
    temp_dir: Option<PathBuf>,

    /// Report progress every N frames.
    #[arg(long, default_value_t = 10)]
    progress_every: u64,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input manifest JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Tick index (0-based).
    #[arg(long)]
    tick: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct AnalyzeArgs {
    /// Audio file (anything `ffmpeg` can decode).
    audio: PathBuf,

    /// Frames per second of the target timeline.
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Duration to analyze, in seconds.
    #[arg(long)]
    duration: f64,

    /// Frequency bins per frame.
    #[arg(long, default_value_t = tickreel::audio::analyze::DEFAULT_BINS)]
    bins: usize,

    /// Also emit volume pulses for this threshold.
    #[arg(long)]
    pulse_threshold: Option<f64>,

    /// Minimum ticks between pulses.
    #[arg(long, default_value_t = 10)]
    cooldown: u64,

    /// Pulse length in ticks.
    #[arg(long, default_value_t = 8)]
    reaction: u64,

    /// Write JSON here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct HostArgs {
    /// Input manifest JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisOutput {
    fps: u32,
    frames: Vec<AudioFrameData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pulses: Option<Vec<tickreel::Keyframe>>,
}

fn main() -> anyhow::Result<()> {
    // stdout carries data for `analyze` and `host`; logs always go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Analyze(args) => cmd_analyze(args),
        Command::Host(args) => cmd_host(args),
    }
}

fn load_timeline(in_path: &Path) -> anyhow::Result<(Manifest, Timeline)> {
    let manifest = Manifest::load(in_path)?;
    let base_dir = in_path.parent().unwrap_or_else(|| Path::new("."));
    let timeline = manifest.build_timeline(BlueprintRegistry::with_builtins(), base_dir)?;
    Ok((manifest, timeline))
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let (manifest, timeline) = load_timeline(&args.in_path)?;
    let concurrency = args.concurrency.unwrap_or(manifest.config.concurrency);

    let backends: Arc<dyn BackendFactory> = match args.backend {
        BackendKind::Cpu => {
            let sharing = if args.per_worker_assets {
                AssetSharing::PerWorker
            } else {
                AssetSharing::Shared
            };
            Arc::new(CpuBackendFactory::new(Arc::new(timeline), sharing))
        }
        BackendKind::Process => {
            let exe = std::env::current_exe().context("locate tickreel executable")?;
            let manifest_path = std::fs::canonicalize(&args.in_path)
                .with_context(|| format!("resolve manifest '{}'", args.in_path.display()))?;
            let opts = HostOpts::new(exe)
                .with_args(["host".to_string(), "--in".to_string(), manifest_path.display().to_string()]);
            Arc::new(HostBackendFactory::new(opts))
        }
    };
    let (sinks, stitcher): (Arc<dyn SinkFactory>, Arc<dyn Stitcher>) = match args.format {
        OutputFormat::Mp4 => (
            Arc::new(FfmpegSinkFactory::default()),
            Arc::new(FfmpegConcatStitcher::default()),
        ),
        OutputFormat::Raw => (Arc::new(RawSinkFactory), Arc::new(ByteConcatStitcher)),
    };

    let mut opts = RenderJobOpts::new(&args.out, concurrency);
    opts.temp_dir = args.temp_dir;
    opts.max_chunk_retries = args.retries;
    opts.progress_every = args.progress_every;

    let (tx, rx) = std::sync::mpsc::channel();
    let job = RenderJob::new(
        manifest.canvas(),
        manifest.fps()?,
        manifest.total_ticks()?,
        backends,
        sinks,
        stitcher,
        opts,
    )
    .with_scene(manifest.scene())
    .with_progress(tx);

    let printer = std::thread::spawn(move || {
        for ev in rx {
            tracing::info!(
                frame = ev.frame,
                total = ev.total,
                percent = format_args!("{:.1}", ev.percent),
                "progress"
            );
        }
    });
    let result = job.run();
    drop(job);
    let _ = printer.join();

    let report = result?;
    eprintln!(
        "wrote {} ({} ticks, {} chunks, {:.2}s)",
        report.out_path.display(),
        report.total_ticks,
        report.chunks.len(),
        report.elapsed.as_secs_f64()
    );
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let (manifest, timeline) = load_timeline(&args.in_path)?;
    let total = manifest.total_ticks()?;
    anyhow::ensure!(
        args.tick < total,
        "tick {} is out of range (job has {total} ticks)",
        args.tick
    );

    let backend = CpuBackend::new(Arc::new(timeline));
    let frame = backend.render_tick(Tick(args.tick), &manifest.scene())?;

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        &frame.to_straight_rgba(),
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_analyze(args: AnalyzeArgs) -> anyhow::Result<()> {
    let fps = Fps::new(args.fps, 1)?;
    anyhow::ensure!(
        args.duration.is_finite() && args.duration > 0.0,
        "duration must be finite and > 0"
    );
    let frames = analyze_file(&args.audio, fps, fps.total_ticks(args.duration), args.bins)?;
    let pulses = args
        .pulse_threshold
        .map(|threshold| generate_pulses(&frames, &TriggerConfig::on_volume(threshold, args.cooldown, args.reaction)));

    let json = serde_json::to_string_pretty(&AnalysisOutput {
        fps: args.fps,
        frames,
        pulses,
    })?;
    match args.out {
        Some(path) => {
            std::fs::write(&path, json).with_context(|| format!("write '{}'", path.display()))?;
            eprintln!("wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn cmd_host(args: HostArgs) -> anyhow::Result<()> {
    let (_manifest, timeline) = load_timeline(&args.in_path)?;
    let canvas = timeline.canvas();
    let mut backend = CpuBackend::new(Arc::new(timeline));
    tracing::debug!(pid = std::process::id(), "render host ready");

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    serve_host(
        &mut backend as &mut dyn RenderBackend,
        canvas,
        stdin.lock(),
        stdout.lock(),
    )?;
    Ok(())
}
