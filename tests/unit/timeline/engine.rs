use super::*;
use crate::animation::keyframes::Keyframe;
use crate::animation::value::{Color, PropValue};
use crate::timeline::clip::{Transition, TransitionKind};

fn timeline(w: u32, h: u32, fps: u32) -> Timeline {
    Timeline::new(
        Canvas {
            width: w,
            height: h,
        },
        Fps::new(fps, 1).unwrap(),
        BlueprintRegistry::with_builtins(),
    )
}

fn ids(frame: &ResolvedFrame) -> Vec<&str> {
    frame.clips.iter().map(|c| c.clip_id.as_str()).collect()
}

#[test]
fn clips_stay_sorted_by_layer_then_start() {
    let mut tl = timeline(8, 8, 30);
    tl.add_clip(Clip::new("top", "solid", 0, 10).on_layer(2)).unwrap();
    tl.add_clip(Clip::new("late", "solid", 5, 10)).unwrap();
    tl.add_clip(Clip::new("early", "solid", 0, 10)).unwrap();
    tl.add_clip(Clip::new("tie", "solid", 0, 10)).unwrap();
    let order: Vec<&str> = tl.clips().iter().map(|c| c.id.as_str()).collect();
    assert_eq!(order, vec!["early", "tie", "late", "top"]);

    let frame = tl.resolve_frame(Tick(6), &SceneConfig::default());
    assert_eq!(ids(&frame), vec!["early", "tie", "late", "top"]);
}

#[test]
fn invalid_and_duplicate_clips_are_rejected() {
    let mut tl = timeline(8, 8, 30);
    assert!(tl.add_clip(Clip::new("a", "solid", 0, 0)).is_err());
    tl.add_clip(Clip::new("a", "solid", 0, 4)).unwrap();
    let err = tl.add_clip(Clip::new("a", "solid", 2, 4)).unwrap_err();
    assert!(err.to_string().contains("duplicate clip id"));
    assert_eq!(tl.clips().len(), 1);
}

#[test]
fn two_second_clip_with_entry_fade() {
    let mut tl = timeline(16, 16, 10);
    let total = tl.fps().total_ticks(2.0);
    assert_eq!(total, 20);
    tl.add_clip(
        Clip::new("intro", "solid", 0, total).with_entry(Transition {
            kind: TransitionKind::Fade,
            duration_ticks: 10,
            easing: Some(crate::animation::ease::Ease::Linear),
        }),
    )
    .unwrap();

    let scene = SceneConfig::default();
    for t in 0..total {
        assert_eq!(tl.resolve_frame(Tick(t), &scene).clips.len(), 1, "tick {t}");
    }
    assert!(tl.resolve_frame(Tick(total), &scene).clips.is_empty());

    assert_eq!(tl.resolve_frame(Tick(0), &scene).clips[0].opacity, 0.0);
    assert_eq!(tl.resolve_frame(Tick(10), &scene).clips[0].opacity, 1.0);
    let mid = &tl.resolve_frame(Tick(5), &scene).clips[0];
    assert!((mid.opacity - 0.5).abs() < 1e-12);
    assert!((mid.local_time - 0.25).abs() < 1e-12);
}

#[test]
fn animated_props_override_static_ones() {
    let mut tl = timeline(8, 8, 30);
    tl.add_clip(
        Clip::new("a", "solid", 10, 20)
            .with_prop("x", 5.0)
            .with_prop("label", "hello")
            .with_track("x", vec![Keyframe::new(10, 100.0), Keyframe::new(0, 0.0)]),
    )
    .unwrap();
    let frame = tl.resolve_frame(Tick(15), &SceneConfig::default());
    let clip = &frame.clips[0];
    assert_eq!(clip.local_tick, 5);
    assert_eq!(clip.props.get("x"), Some(&PropValue::Number(50.0)));
    assert_eq!(clip.props.get("label"), Some(&PropValue::Str("hello".into())));
    // the clip's own track stays in insertion order
    assert_eq!(tl.clips()[0].animated_props["x"][0].tick, 10);
}

#[test]
fn unresolved_blueprint_is_skipped_not_fatal() {
    let mut tl = timeline(8, 8, 30);
    tl.add_clip(Clip::new("ghost", "no-such-blueprint", 0, 5)).unwrap();
    tl.add_clip(Clip::new("real", "solid", 0, 5)).unwrap();
    let scene = SceneConfig::default();
    let frame = tl.resolve_frame(Tick(1), &scene);
    assert_eq!(ids(&frame), vec!["real"]);
    assert_eq!(frame.skipped, vec!["ghost".to_string()]);

    let layers = tl.compute_frame(Tick(1), &scene).unwrap();
    assert_eq!(layers.layers.len(), 1);
    assert_eq!(layers.skipped, vec!["ghost".to_string()]);
}

#[test]
fn audio_frames_follow_the_global_tick() {
    let mut tl = timeline(8, 8, 30);
    tl.add_audio_track(
        "music",
        vec![
            AudioFrameData {
                volume: 0.1,
                frequencies: vec![0.1],
            },
            AudioFrameData {
                volume: 0.9,
                frequencies: vec![0.9],
            },
        ],
    );
    tl.add_clip(Clip::new("viz", "spectrum", 1, 5).with_audio_track("music"))
        .unwrap();
    let scene = SceneConfig::default();
    let at1 = tl.resolve_frame(Tick(1), &scene);
    assert_eq!(at1.clips[0].audio.as_ref().map(|a| a.volume), Some(0.9));
    // past the analyzed range: tolerated, no frame
    let at3 = tl.resolve_frame(Tick(3), &scene);
    assert!(at3.clips[0].audio.is_none());
}

#[test]
fn camera_tracks_resolve_per_tick() {
    let mut tl = timeline(8, 8, 30);
    let mut tracks = CameraTracks::new();
    tracks.insert("x".into(), vec![Keyframe::new(0, 0.0), Keyframe::new(10, 20.0)]);
    tl.set_camera_tracks(tracks).unwrap();
    let frame = tl.resolve_frame(Tick(5), &SceneConfig::default());
    assert!((frame.camera.x - 10.0).abs() < 1e-12);
}

#[test]
fn compute_frame_draws_each_clip_in_isolation() {
    let mut tl = timeline(4, 4, 30);
    tl.add_clip(Clip::new("red", "solid", 0, 3).with_prop("color", Color::rgba(255, 0, 0, 255)))
        .unwrap();
    tl.add_clip(
        Clip::new("blue", "solid", 0, 3)
            .on_layer(1)
            .with_prop("color", Color::rgba(0, 0, 255, 255))
            .with_prop("width", 2.0),
    )
    .unwrap();
    let frame = tl.compute_frame(Tick(0), &SceneConfig::default()).unwrap();
    assert_eq!(frame.layers.len(), 2);
    let red = &frame.layers[0].surface;
    let blue = &frame.layers[1].surface;
    assert_eq!(red.pixel(3, 3), Some([255, 0, 0, 255]));
    assert_eq!(blue.pixel(0, 0), Some([0, 0, 255, 255]));
    // blue only covers the left half; its surface is transparent elsewhere
    assert_eq!(blue.pixel(3, 0), Some([0, 0, 0, 0]));
}

#[test]
fn blueprint_errors_carry_clip_context() {
    let mut tl = timeline(4, 4, 30);
    tl.add_clip(Clip::new("pic", "image", 0, 3).with_prop("asset", "missing"))
        .unwrap();
    let err = tl.compute_frame(Tick(2), &SceneConfig::default()).unwrap_err();
    assert!(matches!(err, TickreelError::Evaluation(_)));
    let msg = err.to_string();
    assert!(msg.contains("'pic'") && msg.contains("tick 2"), "{msg}");
}

#[test]
fn layer_transform_scales_about_center() {
    let canvas = Canvas {
        width: 10,
        height: 10,
    };
    let t = LayerTransform {
        translate: Vec2::new(0.0, 2.0),
        scale: 0.5,
    };
    let p = t.to_affine(canvas) * kurbo::Point::new(10.0, 5.0);
    assert!((p.x - 7.5).abs() < 1e-12 && (p.y - 7.0).abs() < 1e-12);
}

#[test]
fn audio_triggers_drive_props_at_job_ticks() {
    let mut tl = timeline(8, 8, 30);
    let frames = (0..20)
        .map(|t| AudioFrameData {
            volume: if t == 6 { 1.0 } else { 0.0 },
            frequencies: Vec::new(),
        })
        .collect();
    tl.add_audio_track("music", frames);
    let trigger = crate::audio::triggers::TriggerConfig::on_volume(0.5, 1, 5);
    tl.add_clip(
        Clip::new("dot", "circle", 4, 10)
            .with_prop("radius", 3.0)
            .with_audio_track("music")
            .with_audio_trigger("radius", trigger.clone()),
    )
    .unwrap();

    let scene = SceneConfig::default();
    let radius = |t: u64| tl.resolve_frame(Tick(t), &scene).clips[0].props["radius"].clone();
    assert_eq!(radius(4), PropValue::Number(1.0));
    // fired at job tick 6, peak one tick later
    assert_eq!(radius(7), PropValue::Number(1.2));
    assert_eq!(radius(11), PropValue::Number(1.0));

    let err = tl
        .add_clip(
            Clip::new("late", "circle", 0, 5)
                .with_audio_track("drums")
                .with_audio_trigger("radius", trigger),
        )
        .unwrap_err();
    assert!(err.to_string().contains("not loaded"), "{err}");
}

#[test]
fn local_time_stays_in_unit_interval_for_every_active_tick() {
    let mut tl = timeline(8, 8, 30);
    let clips = [("one", 3, 1), ("two", 0, 2), ("seven", 5, 7), ("long", 1, 40), ("blip", 39, 1)];
    for (id, start, duration) in clips {
        tl.add_clip(Clip::new(id, "solid", start, duration)).unwrap();
    }
    let scene = SceneConfig::default();
    let mut seen = BTreeMap::new();
    for t in 0..45 {
        for clip in tl.resolve_frame(Tick(t), &scene).clips {
            assert!(
                (0.0..1.0).contains(&clip.local_time),
                "{} at tick {t}: {}",
                clip.clip_id,
                clip.local_time
            );
            *seen.entry(clip.clip_id).or_insert(0u64) += 1;
        }
    }
    for (id, _, duration) in clips {
        assert_eq!(seen.get(id), Some(&duration), "{id}");
    }
    let one = &tl.resolve_frame(Tick(3), &scene).clips;
    assert_eq!(one.iter().find(|c| c.clip_id == "one").map(|c| c.local_time), Some(0.0));
}
