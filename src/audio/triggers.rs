//! Audio-reactive pulse generation.
//!
//! Scans analyzer frames and emits keyframe pulses whenever the selected signal crosses a
//! threshold, with a cooldown between consecutive triggers.

use crate::animation::ease::Ease;
use crate::animation::keyframes::Keyframe;
use crate::audio::analyze::AudioFrameData;
use crate::foundation::error::{TickreelError, TickreelResult};

/// Signal a trigger listens to.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TriggerSource {
    /// RMS volume.
    #[default]
    Volume,
    /// One frequency bin.
    Bin {
        /// Bin index; out-of-range bins read as 0.
        index: usize,
    },
    /// Mean of bins `[start, end)`.
    BandAverage {
        /// First bin.
        start: usize,
        /// One past the last bin.
        end: usize,
    },
}

impl TriggerSource {
    /// Read the signal from one analyzer frame.
    pub fn sample(self, frame: &AudioFrameData) -> f64 {
        match self {
            Self::Volume => frame.volume,
            Self::Bin { index } => frame.frequencies.get(index).copied().unwrap_or(0.0),
            Self::BandAverage { start, end } => frame.band_average(start, end),
        }
    }
}

/// When a trigger fires and the pulse it produces.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerConfig {
    /// Signal compared against `threshold`. Defaults to volume.
    #[serde(default)]
    pub source: TriggerSource,
    /// Fires when the signal reaches this value.
    pub threshold: f64,
    /// Minimum ticks between two firings.
    pub cooldown_ticks: u64,
    /// Length of one pulse in ticks.
    pub reaction_ticks: u64,
    /// Value before and after a pulse.
    pub base_value: f64,
    /// Value at the top of a pulse.
    pub peak_value: f64,
    /// Curve into the peak.
    #[serde(default = "default_rise")]
    pub rise: Ease,
    /// Curve back to the base.
    #[serde(default = "default_fall")]
    pub fall: Ease,
}

fn default_rise() -> Ease {
    Ease::OutQuad
}

fn default_fall() -> Ease {
    Ease::InQuad
}

impl TriggerConfig {
    /// Volume trigger pulsing between 0 and 1.
    pub fn on_volume(threshold: f64, cooldown_ticks: u64, reaction_ticks: u64) -> Self {
        Self {
            source: TriggerSource::Volume,
            threshold,
            cooldown_ticks,
            reaction_ticks,
            base_value: 1.0,
            peak_value: 1.2,
            rise: default_rise(),
            fall: default_fall(),
        }
    }

    /// Reject non-finite levels and zero-length pulses.
    pub fn validate(&self) -> TickreelResult<()> {
        for (name, v) in [
            ("threshold", self.threshold),
            ("baseValue", self.base_value),
            ("peakValue", self.peak_value),
        ] {
            if !v.is_finite() {
                return Err(TickreelError::validation(format!("trigger {name} must be finite")));
            }
        }
        if self.reaction_ticks == 0 {
            return Err(TickreelError::validation("trigger reactionTicks must be > 0"));
        }
        if let TriggerSource::BandAverage { start, end } = self.source
            && start >= end
        {
            return Err(TickreelError::validation(format!(
                "trigger band [{start}, {end}) is empty"
            )));
        }
        Ok(())
    }
}

/// Ticks at which the trigger fires. Consecutive entries are at least `cooldown_ticks` apart.
pub fn fired_ticks(frames: &[AudioFrameData], cfg: &TriggerConfig) -> Vec<u64> {
    let cooldown = i128::from(cfg.cooldown_ticks);
    let mut last_trigger = -cooldown;
    let mut fired = Vec::new();
    for (t, frame) in frames.iter().enumerate() {
        let t = t as i128;
        if cfg.source.sample(frame) >= cfg.threshold && t - last_trigger >= cooldown {
            last_trigger = t;
            fired.push(t as u64);
        }
    }
    fired
}

/// Three keyframes per fired trigger (base, peak, base), sorted by tick.
///
/// Ticks are indices into `frames`; pass the slice starting at a clip's first tick to get
/// clip-local keyframes.
pub fn generate_pulses(frames: &[AudioFrameData], cfg: &TriggerConfig) -> Vec<Keyframe> {
    let peak_offset = (0.2 * cfg.reaction_ticks as f64).ceil() as u64;
    let mut out = Vec::new();
    for t in fired_ticks(frames, cfg) {
        out.push(Keyframe::new(t, cfg.base_value));
        out.push(Keyframe::new(t + peak_offset, cfg.peak_value).eased(cfg.rise));
        out.push(Keyframe::new(t + cfg.reaction_ticks, cfg.base_value).eased(cfg.fall));
    }
    out.sort_by_key(|k| k.tick);
    tracing::debug!(pulses = out.len() / 3, "generated audio pulses");
    out
}

#[cfg(test)]
#[path = "../../tests/unit/audio/triggers.rs"]
mod tests;
