/// Convenience result type used across tickreel.
pub type TickreelResult<T> = Result<T, TickreelError>;

/// Top-level error taxonomy used by engine, render and orchestration APIs.
#[derive(thiserror::Error, Debug)]
pub enum TickreelError {
    /// Invalid user-provided clip, keyframe or manifest data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Invalid job configuration (dimensions, fps, duration, concurrency).
    #[error("config error: {0}")]
    Config(String),

    /// Errors while resolving keyframe tracks.
    #[error("animation error: {0}")]
    Animation(String),

    /// Errors while computing, compositing or capturing a tick.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// A render host could not be started.
    #[error("render host launch failed: {0}")]
    HostLaunch(String),

    /// A render host did not acknowledge a seek in time.
    #[error("render host did not settle tick {tick} within {timeout_ms} ms")]
    SeekTimeout {
        /// Tick that was requested.
        tick: u64,
        /// Timeout that elapsed, in milliseconds.
        timeout_ms: u64,
    },

    /// Frame capture failed or returned malformed data.
    #[error("frame capture failed: {0}")]
    Capture(String),

    /// Encoder process could not be driven or exited non-zero.
    #[error("encode process error: {0}")]
    EncodeProcess(String),

    /// Lossless concatenation of chunk outputs failed.
    #[error("stitch error: {0}")]
    Stitch(String),

    /// Audio source could not be decoded to PCM.
    #[error("audio decode error: {0}")]
    AudioDecode(String),

    /// The job was cancelled before it completed.
    #[error("render job cancelled")]
    Cancelled,

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// A failure inside one chunk worker, with the position it happened at.
    #[error("chunk {index} failed{}: {source}", tick_suffix(.tick))]
    Chunk {
        /// Chunk index.
        index: usize,
        /// Tick being processed when the failure happened, if any.
        tick: Option<u64>,
        /// Underlying failure.
        source: Box<TickreelError>,
    },

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TickreelError {
    /// Build a [`TickreelError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`TickreelError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`TickreelError::Animation`] value.
    pub fn animation(msg: impl Into<String>) -> Self {
        Self::Animation(msg.into())
    }

    /// Build a [`TickreelError::Evaluation`] value.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    /// Build a [`TickreelError::HostLaunch`] value.
    pub fn host_launch(msg: impl Into<String>) -> Self {
        Self::HostLaunch(msg.into())
    }

    /// Build a [`TickreelError::Capture`] value.
    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture(msg.into())
    }

    /// Build a [`TickreelError::EncodeProcess`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::EncodeProcess(msg.into())
    }

    /// Build a [`TickreelError::Stitch`] value.
    pub fn stitch(msg: impl Into<String>) -> Self {
        Self::Stitch(msg.into())
    }

    /// Build a [`TickreelError::AudioDecode`] value.
    pub fn audio_decode(msg: impl Into<String>) -> Self {
        Self::AudioDecode(msg.into())
    }

    /// Build a [`TickreelError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Attach chunk/tick context to an error raised inside a worker.
    ///
    /// Already-contextualized errors and cancellations pass through unchanged.
    pub fn in_chunk(self, index: usize, tick: Option<u64>) -> Self {
        match self {
            Self::Chunk { .. } | Self::Cancelled => self,
            other => Self::Chunk {
                index,
                tick,
                source: Box::new(other),
            },
        }
    }

    /// Return `true` for [`TickreelError::Cancelled`].
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

fn tick_suffix<T: std::borrow::Borrow<Option<u64>>>(tick: T) -> String {
    match tick.borrow() {
        Some(t) => format!(" at tick {t}"),
        None => String::new(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
