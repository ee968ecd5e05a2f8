use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::time::Instant;

/// Job progress, counted in frames finished across all workers.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    /// Frames finished so far.
    pub frame: u64,
    /// Frames in the whole job.
    pub total: u64,
    /// `frame / total` in percent.
    pub percent: f64,
    /// Wall time since the job started.
    pub elapsed_seconds: f64,
}

/// Counts finished frames and forwards an event every `every` frames and on the last one.
pub(crate) struct ProgressReporter {
    tx: Option<Sender<ProgressEvent>>,
    total: u64,
    every: u64,
    done: AtomicU64,
    started: Instant,
}

impl ProgressReporter {
    pub(crate) fn new(tx: Option<Sender<ProgressEvent>>, total: u64, every: u64) -> Self {
        Self {
            tx,
            total,
            every: every.max(1),
            done: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    pub(crate) fn frame_done(&self) {
        let done = self.done.fetch_add(1, Ordering::SeqCst) + 1;
        if done.is_multiple_of(self.every) || done == self.total {
            self.emit(done);
        }
    }

    /// Forget `frames` finished frames, for a chunk that is rendered again.
    pub(crate) fn rewind(&self, frames: u64) {
        let _ = self
            .done
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |d| Some(d.saturating_sub(frames)));
    }

    pub(crate) fn done(&self) -> u64 {
        self.done.load(Ordering::SeqCst)
    }

    fn emit(&self, done: u64) {
        let Some(tx) = self.tx.as_ref() else {
            return;
        };
        let percent = if self.total == 0 {
            100.0
        } else {
            done as f64 * 100.0 / self.total as f64
        };
        // a dropped receiver only means nobody is listening
        let _ = tx.send(ProgressEvent {
            frame: done,
            total: self.total,
            percent,
            elapsed_seconds: self.started.elapsed().as_secs_f64(),
        });
    }
}

#[cfg(test)]
#[path = "../../tests/unit/orchestrate/progress.rs"]
mod tests;
