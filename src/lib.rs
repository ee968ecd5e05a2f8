//! tickreel is a deterministic motion-graphics timeline engine.
//!
//! A [`Timeline`] of [`Clip`]s is resolved tick by tick into layers that a
//! [`RenderBackend`] rasterizes. A [`RenderJob`] splits the tick range into
//! chunks, renders them in parallel with one backend and one [`FrameSink`] per
//! worker, and stitches the chunk outputs losslessly in index order.
//!
//! - Describe a job with a [`Manifest`] (or build a [`Timeline`] directly)
//! - Register drawing code in a [`BlueprintRegistry`]
//! - Run a [`RenderJob`] with backend, sink and stitcher factories
#![forbid(unsafe_code)]
#![deny(missing_docs)]

/// Keyframes, easing curves and animated property values.
pub mod animation;
/// Image asset loading and premultiplied decoding.
pub mod assets;
/// Audio decoding, spectral analysis and trigger pulses.
pub mod audio;
/// Named drawing routines and the surfaces they draw into.
pub mod blueprint;
/// Frame sinks and chunk stitchers.
pub mod encode;
/// Core types, errors, math helpers and the seeded RNG.
pub mod foundation;
/// JSON job manifests.
pub mod manifest;
/// Chunk planning, parallel workers, progress and cancellation.
pub mod orchestrate;
/// Render backends, layer compositing and post effects.
pub mod render;
/// Clips, transitions and the per-tick timeline engine.
pub mod timeline;

pub use crate::foundation::core::{Canvas, Fps, Rgba8Premul, Tick, TickRange};
pub use crate::foundation::error::{TickreelError, TickreelResult};
pub use crate::foundation::rng::Rng;

pub use crate::animation::ease::Ease;
pub use crate::animation::keyframes::Keyframe;
pub use crate::animation::value::{Color, PropValue, Props};

pub use crate::audio::analyze::AudioFrameData;
pub use crate::audio::triggers::{TriggerConfig, TriggerSource};

pub use crate::assets::store::AssetStore;

pub use crate::blueprint::registry::{Blueprint, BlueprintRegistry, DrawContext};
pub use crate::blueprint::surface::Surface;

pub use crate::timeline::clip::{BlendMode, Clip, Transition, TransitionKind};
pub use crate::timeline::engine::{FrameLayers, Layer, ResolvedClip, ResolvedFrame, Timeline};
pub use crate::timeline::scene::{CameraConfig, EffectsConfig, SceneConfig};

pub use crate::render::backend::{BackendFactory, FrameRGBA, RenderBackend};
pub use crate::render::cpu::{AssetSharing, CpuBackend, CpuBackendFactory};
pub use crate::render::host::{HostBackendFactory, HostOpts, HostProcessBackend};

pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkFactory, FfmpegSinkOpts};
pub use crate::encode::raw::{RawFileSink, RawSinkFactory};
pub use crate::encode::sink::{FrameSink, InMemorySink, SinkConfig, SinkFactory};
pub use crate::encode::stitch::{ByteConcatStitcher, FfmpegConcatStitcher, Stitcher};

pub use crate::manifest::{JobConfig, Manifest};
pub use crate::orchestrate::cancel::CancelToken;
pub use crate::orchestrate::chunk::{ChunkState, RenderChunk};
pub use crate::orchestrate::job::{RenderJob, RenderJobOpts, RenderReport, TickHook};
pub use crate::orchestrate::progress::ProgressEvent;
