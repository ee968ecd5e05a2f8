use std::path::{Path, PathBuf};

use crate::foundation::core::{Tick, TickRange};
use crate::foundation::error::{TickreelError, TickreelResult};

/// Lifecycle of one chunk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkState {
    /// Planned, not started.
    #[default]
    Pending,
    /// A worker is rendering it.
    Rendering,
    /// Sink closed successfully.
    Encoded,
    /// Rendering or encoding failed.
    Failed,
}

/// A contiguous tick range rendered by one worker into one file.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderChunk {
    /// Position in stitch order.
    pub index: usize,
    /// First tick.
    pub start_tick: Tick,
    /// One past the last tick.
    pub end_tick_exclusive: Tick,
    /// Chunk file written by the sink.
    pub output_path: PathBuf,
    /// Current lifecycle state.
    pub state: ChunkState,
}

impl RenderChunk {
    /// Ticks covered by the chunk.
    pub fn range(&self) -> TickRange {
        TickRange {
            start: self.start_tick,
            end: self.end_tick_exclusive,
        }
    }

    /// Number of ticks in the chunk.
    pub fn len_ticks(&self) -> u64 {
        self.range().len_ticks()
    }
}

/// `ceil(total_ticks / concurrency)`.
pub fn chunk_size(total_ticks: u64, concurrency: usize) -> TickreelResult<u64> {
    if concurrency == 0 {
        return Err(TickreelError::config("concurrency must be >= 1"));
    }
    Ok(total_ticks.div_ceil(concurrency as u64).max(1))
}

/// Split `[0, total_ticks)` into at most `concurrency` contiguous chunks writing into `dir`.
///
/// Every tick belongs to exactly one chunk; when the division is uneven the last chunk is shorter
/// and trailing workers get no chunk at all.
pub fn plan_chunks(
    total_ticks: u64,
    concurrency: usize,
    dir: &Path,
    extension: &str,
) -> TickreelResult<Vec<RenderChunk>> {
    if total_ticks == 0 {
        return Err(TickreelError::config("render job has no ticks"));
    }
    let size = chunk_size(total_ticks, concurrency)?;
    let mut chunks = Vec::with_capacity(total_ticks.div_ceil(size) as usize);
    let mut start = 0;
    while start < total_ticks {
        let end = start.saturating_add(size).min(total_ticks);
        let index = chunks.len();
        chunks.push(RenderChunk {
            index,
            start_tick: Tick(start),
            end_tick_exclusive: Tick(end),
            output_path: dir.join(format!("chunk-{index:05}.{extension}")),
            state: ChunkState::Pending,
        });
        start = end;
    }
    Ok(chunks)
}

#[cfg(test)]
#[path = "../../tests/unit/orchestrate/chunk.rs"]
mod tests;
