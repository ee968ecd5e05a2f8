//! Keyframe tracks.

use crate::animation::ease::Ease;
use crate::animation::value::PropValue;
use crate::foundation::error::{TickreelError, TickreelResult};
use crate::foundation::rng::lerp;

/// One sample of an animated property. `tick` is clip-local.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Keyframe {
    /// Clip-local tick.
    pub tick: u64,
    /// Value held at `tick`.
    pub value: PropValue,
    /// Curve used to approach this keyframe from the previous one. Defaults to linear.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub easing: Option<Ease>,
}

impl Keyframe {
    /// Keyframe with linear easing.
    pub fn new(tick: u64, value: impl Into<PropValue>) -> Self {
        Self {
            tick,
            value: value.into(),
            easing: None,
        }
    }

    /// Set the curve used to approach this keyframe.
    pub fn eased(mut self, ease: Ease) -> Self {
        self.easing = Some(ease);
        self
    }
}

/// Resolve an animated property at clip-local `tick`.
///
/// Input order does not matter: keyframes are stably sorted by tick on every call without touching
/// the caller's slice. Ticks at or before the first keyframe yield its value, ticks at or after the
/// last keyframe yield the last value. Inside a bracket `k1.tick <= tick < k2.tick` the eased
/// progress comes from `k2.easing`; numbers interpolate, every other kind holds `k1` and switches
/// to `k2` only once the eased progress reaches 1.
///
/// Returns `None` for an empty track so callers fall back to the static prop.
pub fn resolve(keyframes: &[Keyframe], tick: u64) -> Option<PropValue> {
    let mut sorted: Vec<&Keyframe> = keyframes.iter().collect();
    sorted.sort_by_key(|k| k.tick);

    let first = *sorted.first()?;
    let last = *sorted.last()?;
    if tick <= first.tick {
        return Some(first.value.clone());
    }
    if tick >= last.tick {
        return Some(last.value.clone());
    }

    let (k1, k2) = sorted
        .windows(2)
        .map(|w| (w[0], w[1]))
        .find(|(k1, k2)| k1.tick <= tick && tick < k2.tick)?;

    let span = (k2.tick - k1.tick) as f64;
    let t = (tick - k1.tick) as f64 / span;
    let eased = k2.easing.unwrap_or_default().apply(t);

    match (&k1.value, &k2.value) {
        (PropValue::Number(a), PropValue::Number(b)) => Some(PropValue::Number(lerp(*a, *b, eased))),
        _ if eased >= 1.0 => Some(k2.value.clone()),
        _ => Some(k1.value.clone()),
    }
}

/// Numeric view of [`resolve`]; `None` for empty tracks or non-numeric results.
pub fn resolve_number(keyframes: &[Keyframe], tick: u64) -> Option<f64> {
    resolve(keyframes, tick).and_then(|v| v.as_f64())
}

/// Check a track against the clip it animates.
pub fn validate_keyframes(prop: &str, keyframes: &[Keyframe], duration_ticks: u64) -> TickreelResult<()> {
    for k in keyframes {
        if k.tick > duration_ticks {
            return Err(TickreelError::animation(format!(
                "keyframe for '{prop}' at tick {} lies outside the clip (duration {duration_ticks})",
                k.tick
            )));
        }
        if let PropValue::Number(v) = k.value
            && !v.is_finite()
        {
            return Err(TickreelError::animation(format!(
                "keyframe for '{prop}' at tick {} is not finite",
                k.tick
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/animation/keyframes.rs"]
mod tests;
