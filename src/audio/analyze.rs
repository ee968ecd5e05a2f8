use crate::audio::fft::{floor_pow2, half_spectrum_magnitudes};
use crate::foundation::core::Fps;
use crate::foundation::error::{TickreelError, TickreelResult};

/// Default number of frequency bins per frame.
pub const DEFAULT_BINS: usize = 32;

/// Loudness and spectrum summary for one tick.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioFrameData {
    /// RMS of the window, `0..~1` for normalized PCM.
    pub volume: f64,
    /// Averaged magnitude bins, lowest frequencies first.
    pub frequencies: Vec<f64>,
}

impl AudioFrameData {
    /// Zero volume with `bins` zeroed bins.
    pub fn silent(bins: usize) -> Self {
        Self {
            volume: 0.0,
            frequencies: vec![0.0; bins],
        }
    }

    /// Mean of bins `[start, end)`; missing bins count as silence.
    pub fn band_average(&self, start: usize, end: usize) -> f64 {
        if end <= start {
            return 0.0;
        }
        let sum: f64 = (start..end)
            .map(|i| self.frequencies.get(i).copied().unwrap_or(0.0))
            .sum();
        sum / (end - start) as f64
    }
}

/// Summarize mono PCM into one [`AudioFrameData`] per tick.
///
/// Window `t` starts at sample `round(t × sample_rate / fps)` and spans `floor(sample_rate / fps)`
/// samples; samples past the end of `samples` read as silence. The spectrum uses the largest
/// power of two that fits in the window.
#[tracing::instrument(skip(samples), fields(n_samples = samples.len()))]
pub fn analyze_pcm(
    samples: &[f32],
    sample_rate: u32,
    fps: Fps,
    total_ticks: u64,
    bins: usize,
) -> TickreelResult<Vec<AudioFrameData>> {
    if sample_rate == 0 {
        return Err(TickreelError::config("audio sample rate must be > 0"));
    }
    if bins == 0 {
        return Err(TickreelError::config("audio bin count must be > 0"));
    }

    let samples_per_tick = f64::from(sample_rate) / fps.as_f64();
    let window_len = (samples_per_tick.floor() as usize).max(1);
    let fft_len = floor_pow2(window_len);

    let mut window = vec![0f32; window_len];
    let mut out = Vec::with_capacity(total_ticks as usize);
    for t in 0..total_ticks {
        let start = (t as f64 * samples_per_tick).round() as usize;
        if start >= samples.len() {
            out.push(AudioFrameData::silent(bins));
            continue;
        }

        window.fill(0.0);
        let avail = (samples.len() - start).min(window_len);
        window[..avail].copy_from_slice(&samples[start..start + avail]);

        let sum_sq: f64 = window.iter().map(|&s| f64::from(s) * f64::from(s)).sum();
        let volume = (sum_sq / window_len as f64).sqrt();

        let mags = half_spectrum_magnitudes(&window[..fft_len]);
        out.push(AudioFrameData {
            volume,
            frequencies: bin_average(&mags, bins),
        });
    }
    Ok(out)
}

/// Split `mags` into `bins` contiguous blocks and average each.
fn bin_average(mags: &[f64], bins: usize) -> Vec<f64> {
    let n = mags.len();
    (0..bins)
        .map(|i| {
            let lo = i * n / bins;
            let hi = (i + 1) * n / bins;
            if hi <= lo {
                return 0.0;
            }
            mags[lo..hi].iter().sum::<f64>() / (hi - lo) as f64
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/audio/analyze.rs"]
mod tests;
