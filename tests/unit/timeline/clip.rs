use super::*;

#[test]
fn active_window_is_half_open() {
    let clip = Clip::new("a", "solid", 10, 5);
    assert!(!clip.is_active(Tick(9)));
    assert!(clip.is_active(Tick(10)));
    assert!(clip.is_active(Tick(14)));
    assert!(!clip.is_active(Tick(15)));
    assert_eq!(clip.range().len_ticks(), 5);
}

#[test]
fn zero_duration_is_rejected() {
    let err = Clip::new("a", "solid", 0, 0).validate().unwrap_err();
    assert!(matches!(err, TickreelError::Validation(_)));
    assert!(err.to_string().contains("durationTicks"));
}

#[test]
fn empty_ids_are_rejected() {
    assert!(Clip::new(" ", "solid", 0, 1).validate().is_err());
    assert!(Clip::new("a", "", 0, 1).validate().is_err());
}

#[test]
fn keyframes_past_the_clip_are_rejected() {
    let clip = Clip::new("a", "solid", 0, 10).with_track("x", vec![Keyframe::new(12, 1.0)]);
    assert!(clip.validate().is_err());
}

#[test]
fn non_finite_static_number_is_rejected() {
    let clip = Clip::new("a", "solid", 0, 10).with_prop("x", f64::NAN);
    assert!(clip.validate().is_err());
}

#[test]
fn json_uses_camel_case_and_defaults() {
    let clip: Clip = serde_json::from_value(serde_json::json!({
        "id": "title",
        "blueprintId": "solid",
        "startTick": 3,
        "durationTicks": 12,
        "staticProps": { "color": "#ff0000", "width": 40 },
        "animatedProps": { "x": [ { "tick": 0, "value": 0 }, { "tick": 11, "value": 100, "easing": "easeInQuad" } ] },
        "entryTransition": { "type": "fade", "durationTicks": 4 },
        "blendMode": "screen"
    }))
    .unwrap();
    assert_eq!(clip.layer, 0);
    assert_eq!(clip.blend_mode, BlendMode::Screen);
    assert_eq!(
        clip.static_props.get("color").and_then(PropValue::as_color),
        Some(crate::animation::value::Color::rgba(255, 0, 0, 255))
    );
    let entry = clip.entry_transition.unwrap();
    assert_eq!(entry.kind, TransitionKind::Fade);
    assert_eq!(entry.ease(), Ease::OutQuad);
    assert_eq!(clip.animated_props["x"][1].easing, Some(Ease::InQuad));
    assert!(clip.exit_transition.is_none());
    clip.validate().unwrap();
}

#[test]
fn unknown_blend_mode_fails_to_parse() {
    let r: Result<BlendMode, _> = serde_json::from_str("\"difference\"");
    assert!(r.is_err());
}

fn loud_at(ticks: &[usize], len: usize) -> Vec<AudioFrameData> {
    (0..len)
        .map(|t| AudioFrameData {
            volume: if ticks.contains(&t) { 0.9 } else { 0.0 },
            frequencies: Vec::new(),
        })
        .collect()
}

#[test]
fn audio_triggers_expand_into_clip_local_pulses() {
    // job ticks 12 and 27 are loud; the clip covers [10, 25)
    let frames = loud_at(&[12, 27], 30);
    let mut clip = Clip::new("a", "circle", 10, 15)
        .with_audio_track("music")
        .with_audio_trigger("radius", TriggerConfig::on_volume(0.5, 1, 5));
    clip.validate().unwrap();
    clip.expand_audio_triggers(&frames);

    assert!(clip.audio_triggers.is_empty());
    let track = &clip.animated_props["radius"];
    let ticks: Vec<u64> = track.iter().map(|k| k.tick).collect();
    assert_eq!(ticks, vec![2, 3, 7]);
    assert_eq!(track[1].value, PropValue::Number(1.2));
    clip.validate().unwrap();
}

#[test]
fn audio_pulses_are_cut_at_the_clip_end() {
    let frames = loud_at(&[12], 30);
    let mut clip = Clip::new("a", "circle", 10, 4)
        .with_audio_track("music")
        .with_audio_trigger("radius", TriggerConfig::on_volume(0.5, 1, 5));
    clip.expand_audio_triggers(&frames);
    let ticks: Vec<u64> = clip.animated_props["radius"].iter().map(|k| k.tick).collect();
    assert_eq!(ticks, vec![2, 3]);
    clip.validate().unwrap();
}

#[test]
fn silent_trigger_holds_the_base_value() {
    let mut clip = Clip::new("a", "circle", 0, 8)
        .with_audio_track("music")
        .with_audio_trigger("radius", TriggerConfig::on_volume(0.5, 1, 5));
    clip.expand_audio_triggers(&loud_at(&[], 3));
    assert_eq!(
        clip.animated_props["radius"],
        vec![Keyframe::new(0, 1.0)]
    );
}

#[test]
fn audio_trigger_misuse_is_rejected() {
    let trigger = TriggerConfig::on_volume(0.5, 1, 5);
    let no_track = Clip::new("a", "circle", 0, 8).with_audio_trigger("radius", trigger.clone());
    assert!(no_track.validate().unwrap_err().to_string().contains("audioTrack"));

    let both = Clip::new("a", "circle", 0, 8)
        .with_audio_track("music")
        .with_track("radius", vec![Keyframe::new(0, 1.0)])
        .with_audio_trigger("radius", trigger.clone());
    assert!(both.validate().is_err());

    let instant = Clip::new("a", "circle", 0, 8)
        .with_audio_track("music")
        .with_audio_trigger("radius", TriggerConfig::on_volume(0.5, 1, 0));
    assert!(matches!(instant.validate(), Err(TickreelError::Validation(_))));
}
