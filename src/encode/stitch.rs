//! Lossless concatenation of chunk outputs, in chunk index order.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::Context;

use crate::encode::ffmpeg::{ensure_parent_dir, is_ffmpeg_on_path};
use crate::foundation::error::{TickreelError, TickreelResult};

/// Joins finished chunk files into one output.
pub trait Stitcher: Send + Sync {
    /// Concatenate `parts` (already in index order) into `out`.
    fn stitch(&self, parts: &[PathBuf], out: &Path) -> TickreelResult<()>;
}

fn check_parts(parts: &[PathBuf]) -> TickreelResult<()> {
    if parts.is_empty() {
        return Err(TickreelError::stitch("no chunk outputs to stitch"));
    }
    if let Some(missing) = parts.iter().find(|p| !p.is_file()) {
        return Err(TickreelError::stitch(format!(
            "chunk output '{}' is missing",
            missing.display()
        )));
    }
    Ok(())
}

/// Stream copy through the `ffmpeg` concat demuxer (`-f concat -c copy`); nothing is re-encoded.
#[derive(Clone, Debug)]
pub struct FfmpegConcatStitcher {
    /// Replace an existing output file.
    pub overwrite: bool,
}

impl Default for FfmpegConcatStitcher {
    fn default() -> Self {
        Self { overwrite: true }
    }
}

/// Render the concat demuxer list for `parts`.
pub fn concat_list(parts: &[PathBuf]) -> String {
    let mut list = String::new();
    for p in parts {
        // concat list quoting: close the quote, escaped quote, reopen
        let escaped = p.to_string_lossy().replace('\'', r"'\''");
        list.push_str(&format!("file '{escaped}'\n"));
    }
    list
}

impl Stitcher for FfmpegConcatStitcher {
    #[tracing::instrument(skip(self, parts), fields(parts = parts.len(), out = %out.display()))]
    fn stitch(&self, parts: &[PathBuf], out: &Path) -> TickreelResult<()> {
        check_parts(parts)?;
        ensure_parent_dir(out)?;
        if !self.overwrite && out.exists() {
            return Err(TickreelError::stitch(format!(
                "output file '{}' already exists",
                out.display()
            )));
        }
        if !is_ffmpeg_on_path() {
            return Err(TickreelError::stitch(
                "ffmpeg is required to stitch MP4 chunks, but was not found on PATH",
            ));
        }

        let list_dir = parts[0].parent().unwrap_or_else(|| Path::new("."));
        let list_path = list_dir.join("concat-list.txt");
        // the demuxer resolves relative entries against the list's own directory
        let absolute = parts
            .iter()
            .map(|p| {
                std::fs::canonicalize(p)
                    .with_context(|| format!("failed to resolve '{}'", p.display()))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        std::fs::write(&list_path, concat_list(&absolute))
            .with_context(|| format!("failed to write '{}'", list_path.display()))?;

        let output = Command::new("ffmpeg")
            .arg(if self.overwrite { "-y" } else { "-n" })
            .args(["-loglevel", "error", "-f", "concat", "-safe", "0", "-i"])
            .arg(&list_path)
            .args(["-c", "copy", "-movflags", "+faststart"])
            .arg(out)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output();
        let _ = std::fs::remove_file(&list_path);

        let output =
            output.map_err(|e| TickreelError::stitch(format!("failed to run ffmpeg concat: {e}")))?;
        if !output.status.success() {
            let _ = std::fs::remove_file(out);
            return Err(TickreelError::stitch(format!(
                "ffmpeg concat exited with status {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        tracing::info!("stitched chunk outputs");
        Ok(())
    }
}

/// Byte-wise concatenation, for headerless streams such as [`crate::encode::raw::RawFileSink`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ByteConcatStitcher;

impl Stitcher for ByteConcatStitcher {
    #[tracing::instrument(skip(self, parts), fields(parts = parts.len(), out = %out.display()))]
    fn stitch(&self, parts: &[PathBuf], out: &Path) -> TickreelResult<()> {
        check_parts(parts)?;
        ensure_parent_dir(out)?;
        let result = (|| -> std::io::Result<u64> {
            let mut writer = BufWriter::new(File::create(out)?);
            let mut total = 0;
            for p in parts {
                total += std::io::copy(&mut File::open(p)?, &mut writer)?;
            }
            writer.flush()?;
            Ok(total)
        })();
        match result {
            Ok(bytes) => {
                tracing::debug!(bytes, "stitched chunk outputs");
                Ok(())
            }
            Err(e) => {
                let _ = std::fs::remove_file(out);
                Err(TickreelError::stitch(format!(
                    "failed to concatenate into '{}': {e}",
                    out.display()
                )))
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/stitch.rs"]
mod tests;
