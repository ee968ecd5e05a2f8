use std::collections::BTreeMap;

use crate::animation::ease::Ease;
use crate::animation::keyframes::{Keyframe, validate_keyframes};
use crate::animation::value::{PropValue, Props};
use crate::audio::analyze::AudioFrameData;
use crate::audio::triggers::{TriggerConfig, generate_pulses};
use crate::foundation::core::{Tick, TickRange};
use crate::foundation::error::{TickreelError, TickreelResult};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
/// Rule for combining a clip's pixels with what is already composited.
pub enum BlendMode {
    /// Premultiplied source-over.
    #[default]
    Normal,
    /// Destination times source.
    Multiply,
    /// Inverse multiply; always lightens.
    Screen,
    /// Saturating sum.
    Add,
    /// Multiply in the darks, screen in the lights (keyed on the destination).
    Overlay,
}

/// Shape of an entry or exit transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionKind {
    /// Opacity ramps with the eased progress.
    Fade,
    /// Vertical offset of a tenth of the frame height.
    Slide,
    /// Scale from one half to full size.
    Zoom,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// Built-in entry/exit effect.
pub struct Transition {
    /// Transition shape; `type` in JSON.
    #[serde(rename = "type")]
    pub kind: TransitionKind,
    /// Ticks the transition lasts.
    pub duration_ticks: u64,
    /// Defaults to `easeOutQuad`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub easing: Option<Ease>,
}

impl Transition {
    /// Transition with the default easing.
    pub fn new(kind: TransitionKind, duration_ticks: u64) -> Self {
        Self {
            kind,
            duration_ticks,
            easing: None,
        }
    }

    /// Easing in effect, `easeOutQuad` unless set.
    pub fn ease(self) -> Ease {
        self.easing.unwrap_or(Ease::OutQuad)
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// A time-boxed unit of visual content bound to a blueprint.
pub struct Clip {
    /// Unique id within a timeline; also keys the clip's random generator.
    pub id: String,
    /// Blueprint drawing this clip.
    pub blueprint_id: String,
    /// First active tick.
    pub start_tick: u64,
    /// Active ticks; must be > 0.
    pub duration_ticks: u64,
    /// Composite layer; higher layers draw on top.
    #[serde(default)]
    pub layer: i32,
    /// Props that hold for the whole clip.
    #[serde(default)]
    pub static_props: Props,
    /// Keyframe tracks by prop name, in clip-local ticks.
    #[serde(default)]
    pub animated_props: BTreeMap<String, Vec<Keyframe>>,
    /// Transition over the first ticks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_transition: Option<Transition>,
    /// Transition over the last ticks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_transition: Option<Transition>,
    /// How the clip combines with lower layers.
    #[serde(default)]
    pub blend_mode: BlendMode,
    /// Audio track whose per-tick frame is handed to the blueprint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_track: Option<String>,
    /// Props driven by trigger pulses on `audio_track`, expanded into keyframe tracks when the
    /// clip joins a [`Timeline`](crate::Timeline).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub audio_triggers: BTreeMap<String, TriggerConfig>,
}

impl Clip {
    /// Clip on layer 0 with no props, transitions or audio.
    pub fn new(
        id: impl Into<String>,
        blueprint_id: impl Into<String>,
        start_tick: u64,
        duration_ticks: u64,
    ) -> Self {
        Self {
            id: id.into(),
            blueprint_id: blueprint_id.into(),
            start_tick,
            duration_ticks,
            layer: 0,
            static_props: Props::new(),
            animated_props: BTreeMap::new(),
            entry_transition: None,
            exit_transition: None,
            blend_mode: BlendMode::Normal,
            audio_track: None,
            audio_triggers: BTreeMap::new(),
        }
    }

    /// Set the composite layer.
    pub fn on_layer(mut self, layer: i32) -> Self {
        self.layer = layer;
        self
    }

    /// Set a static prop.
    pub fn with_prop(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.static_props.insert(name.into(), value.into());
        self
    }

    /// Set the keyframe track for a prop.
    pub fn with_track(mut self, name: impl Into<String>, keyframes: Vec<Keyframe>) -> Self {
        self.animated_props.insert(name.into(), keyframes);
        self
    }

    /// Set the entry transition.
    pub fn with_entry(mut self, t: Transition) -> Self {
        self.entry_transition = Some(t);
        self
    }

    /// Set the exit transition.
    pub fn with_exit(mut self, t: Transition) -> Self {
        self.exit_transition = Some(t);
        self
    }

    /// Set the blend mode.
    pub fn with_blend(mut self, blend: BlendMode) -> Self {
        self.blend_mode = blend;
        self
    }

    /// Hand the blueprint this audio track's frame each tick.
    pub fn with_audio_track(mut self, track: impl Into<String>) -> Self {
        self.audio_track = Some(track.into());
        self
    }

    /// Drive `prop` with pulses fired by `trigger` on the clip's audio track.
    pub fn with_audio_trigger(mut self, prop: impl Into<String>, trigger: TriggerConfig) -> Self {
        self.audio_triggers.insert(prop.into(), trigger);
        self
    }

    /// Turn `audio_triggers` into keyframe tracks. `frames` is the whole audio track, indexed by
    /// job tick.
    ///
    /// Pulses are computed over the clip's own ticks, so they come out clip-local, and are cut at
    /// the clip end. A trigger that never fires holds its base value.
    pub fn expand_audio_triggers(&mut self, frames: &[AudioFrameData]) {
        let triggers = std::mem::take(&mut self.audio_triggers);
        if triggers.is_empty() {
            return;
        }
        let to_index = |t: u64| usize::try_from(t).unwrap_or(usize::MAX).min(frames.len());
        let start = to_index(self.start_tick);
        let end = to_index(self.start_tick.saturating_add(self.duration_ticks));
        let window = &frames[start..end];
        for (prop, trigger) in triggers {
            let mut keyframes = generate_pulses(window, &trigger);
            keyframes.retain(|k| k.tick <= self.duration_ticks);
            if keyframes.is_empty() {
                keyframes.push(Keyframe::new(0, trigger.base_value));
            }
            self.animated_props.insert(prop, keyframes);
        }
    }

    /// Active ticks `[start_tick, start_tick + duration_ticks)`.
    pub fn range(&self) -> TickRange {
        TickRange {
            start: Tick(self.start_tick),
            end: Tick(self.start_tick.saturating_add(self.duration_ticks)),
        }
    }

    /// `start_tick <= tick < start_tick + duration_ticks`.
    pub fn is_active(&self, tick: Tick) -> bool {
        self.range().contains(tick)
    }

    /// Check ids, duration, keyframes, static props and audio triggers.
    pub fn validate(&self) -> TickreelResult<()> {
        if self.id.trim().is_empty() {
            return Err(TickreelError::validation("clip id must be non-empty"));
        }
        if self.blueprint_id.trim().is_empty() {
            return Err(TickreelError::validation(format!(
                "clip '{}' blueprintId must be non-empty",
                self.id
            )));
        }
        if self.duration_ticks == 0 {
            return Err(TickreelError::validation(format!(
                "clip '{}' durationTicks must be > 0",
                self.id
            )));
        }
        for (name, kfs) in &self.animated_props {
            validate_keyframes(name, kfs, self.duration_ticks)?;
        }
        if !self.audio_triggers.is_empty() && self.audio_track.is_none() {
            return Err(TickreelError::validation(format!(
                "clip '{}' has audioTriggers but no audioTrack",
                self.id
            )));
        }
        for (prop, trigger) in &self.audio_triggers {
            if self.animated_props.contains_key(prop) {
                return Err(TickreelError::validation(format!(
                    "clip '{}' animates '{prop}' with both keyframes and an audio trigger",
                    self.id
                )));
            }
            trigger
                .validate()
                .map_err(|e| TickreelError::validation(format!("clip '{}' trigger '{prop}': {e}", self.id)))?;
        }
        for v in self.static_props.values() {
            if let PropValue::Number(n) = v
                && !n.is_finite()
            {
                return Err(TickreelError::validation(format!(
                    "clip '{}' has a non-finite static prop",
                    self.id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/clip.rs"]
mod tests;
