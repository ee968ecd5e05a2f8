use crate::foundation::core::Vec2;
use crate::timeline::clip::{Clip, Transition, TransitionKind};

/// Share of the frame height a slide travels.
pub const SLIDE_DISTANCE: f64 = 0.1;
/// Scale a zoom starts from.
pub const ZOOM_FROM: f64 = 0.5;

/// Transition-driven opacity and transform for one clip at one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransitionState {
    /// Opacity factor in `[0, 1]`.
    pub opacity: f64,
    /// Offset in pixels, applied before scaling about the frame center.
    pub offset: Vec2,
    /// Scale factor about the frame center.
    pub scale: f64,
}

impl Default for TransitionState {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            offset: Vec2::ZERO,
            scale: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Edge {
    Entry,
    Exit,
}

/// Apply a clip's entry and exit transitions at clip-local `local_tick`.
///
/// Entry covers local ticks `[0, d)` with `t = local_tick / d`; exit covers the last `d` ticks with
/// `t = (duration - local_tick) / d`. When both windows overlap both effects apply: fades take the
/// more transparent value, slides add, zooms multiply.
pub fn transition_state(clip: &Clip, local_tick: u64, frame_height: f64) -> TransitionState {
    let mut state = TransitionState::default();
    if let Some(entry) = clip.entry_transition.as_ref()
        && let Some(e) = entry_progress(entry, local_tick)
    {
        apply(&mut state, entry.kind, e, Edge::Entry, frame_height);
    }
    if let Some(exit) = clip.exit_transition.as_ref()
        && let Some(e) = exit_progress(exit, local_tick, clip.duration_ticks)
    {
        apply(&mut state, exit.kind, e, Edge::Exit, frame_height);
    }
    state
}

fn entry_progress(t: &Transition, local_tick: u64) -> Option<f64> {
    if t.duration_ticks == 0 || local_tick >= t.duration_ticks {
        return None;
    }
    Some(t.ease().apply(local_tick as f64 / t.duration_ticks as f64))
}

fn exit_progress(t: &Transition, local_tick: u64, clip_duration: u64) -> Option<f64> {
    if t.duration_ticks == 0 || local_tick >= clip_duration {
        return None;
    }
    let remaining = clip_duration - local_tick;
    if remaining > t.duration_ticks {
        return None;
    }
    Some(t.ease().apply(remaining as f64 / t.duration_ticks as f64))
}

fn apply(state: &mut TransitionState, kind: TransitionKind, eased: f64, edge: Edge, height: f64) {
    match kind {
        TransitionKind::Fade => state.opacity = state.opacity.min(eased),
        TransitionKind::Slide => {
            let dist = (1.0 - eased) * SLIDE_DISTANCE * height;
            // entry rises from below, exit leaves upwards
            state.offset.y += match edge {
                Edge::Entry => dist,
                Edge::Exit => -dist,
            };
        }
        TransitionKind::Zoom => state.scale *= ZOOM_FROM + (1.0 - ZOOM_FROM) * eased,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/transitions.rs"]
mod tests;
