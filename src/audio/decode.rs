use crate::audio::analyze::{AudioFrameData, analyze_pcm};
use crate::foundation::core::Fps;
use crate::foundation::error::{TickreelError, TickreelResult};
use std::path::Path;

/// Default decode rate for analysis.
pub const ANALYSIS_SAMPLE_RATE: u32 = 44_100;

/// Decoded mono PCM.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AudioPcm {
    /// Samples per second.
    pub sample_rate: u32,
    /// Mono samples in `[-1, 1]`.
    pub samples: Vec<f32>,
}

/// Decode any ffmpeg-readable audio source to mono `f32` PCM at `sample_rate`.
///
/// Sources without an audio stream decode to empty PCM.
pub fn decode_audio_mono(path: &Path, sample_rate: u32) -> TickreelResult<AudioPcm> {
    if sample_rate == 0 {
        return Err(TickreelError::config("audio sample rate must be > 0"));
    }
    if !path.exists() {
        return Err(TickreelError::audio_decode(format!(
            "audio source '{}' does not exist",
            path.display()
        )));
    }

    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(path)
        .args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            "1",
            "-ar",
            &sample_rate.to_string(),
            "pipe:1",
        ])
        .output()
        .map_err(|e| TickreelError::audio_decode(format!("failed to run ffmpeg for audio decode: {e}")))?;

    if !out.status.success() {
        let msg = String::from_utf8_lossy(&out.stderr);
        if msg.contains("matches no streams")
            || msg.contains("Output file #0 does not contain any stream")
        {
            return Ok(AudioPcm {
                sample_rate,
                samples: Vec::new(),
            });
        }
        return Err(TickreelError::audio_decode(format!(
            "ffmpeg audio decode failed for '{}': {}",
            path.display(),
            msg.trim()
        )));
    }

    Ok(AudioPcm {
        sample_rate,
        samples: pcm_from_f32le(&out.stdout)?,
    })
}

fn pcm_from_f32le(bytes: &[u8]) -> TickreelResult<Vec<f32>> {
    if !bytes.len().is_multiple_of(4) {
        return Err(TickreelError::audio_decode(
            "decoded audio byte length is not aligned to f32 samples",
        ));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Decode `path` and analyze it into `total_ticks` frames.
pub fn analyze_file(
    path: &Path,
    fps: Fps,
    total_ticks: u64,
    bins: usize,
) -> TickreelResult<Vec<AudioFrameData>> {
    let pcm = decode_audio_mono(path, ANALYSIS_SAMPLE_RATE)?;
    tracing::debug!(
        path = %path.display(),
        samples = pcm.samples.len(),
        "decoded audio for analysis"
    );
    analyze_pcm(&pcm.samples, pcm.sample_rate, fps, total_ticks, bins)
}

#[cfg(test)]
#[path = "../../tests/unit/audio/decode.rs"]
mod tests;
