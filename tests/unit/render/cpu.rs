use super::*;
use crate::animation::value::Color;
use crate::blueprint::registry::BlueprintRegistry;
use crate::foundation::core::{Canvas, Fps};
use crate::timeline::clip::Clip;

fn timeline() -> Arc<Timeline> {
    let mut tl = Timeline::new(
        Canvas {
            width: 6,
            height: 4,
        },
        Fps::new(24, 1).unwrap(),
        BlueprintRegistry::with_builtins(),
    )
    .with_seed(11);
    tl.add_clip(Clip::new("bg", "solid", 0, 10).with_prop("color", Color::rgba(0, 0, 80, 255)))
        .unwrap();
    tl.add_clip(
        Clip::new("dots", "particles", 2, 6)
            .on_layer(1)
            .with_prop("count", 4.0),
    )
    .unwrap();
    Arc::new(tl)
}

#[test]
fn capture_requires_a_seek() {
    let mut b = CpuBackend::new(timeline());
    let err = b.capture_frame().unwrap_err();
    assert!(err.to_string().contains("before seek"));

    b.seek(Tick(0), &SceneConfig::default()).unwrap();
    let frame = b.capture_frame().unwrap();
    assert_eq!(frame.pixel(0, 0), Some([0, 0, 80, 255]));
    assert!(b.capture_frame().unwrap_err().to_string().contains("already captured"));
}

#[test]
fn seek_capture_matches_render_tick() {
    let tl = timeline();
    let mut b = CpuBackend::new(Arc::clone(&tl));
    let scene = SceneConfig::default();
    b.seek(Tick(3), &scene).unwrap();
    assert_eq!(b.capture_frame().unwrap(), b.render_tick(Tick(3), &scene).unwrap());
}

#[test]
fn ticks_render_independently_of_history() {
    let tl = timeline();
    let scene = SceneConfig::default();
    let mut sequential = CpuBackend::new(Arc::clone(&tl));
    let mut last = None;
    for t in 0..6 {
        sequential.seek(Tick(t), &scene).unwrap();
        last = Some(sequential.capture_frame().unwrap());
    }
    let mut fresh = CpuBackend::new(tl);
    fresh.seek(Tick(5), &scene).unwrap();
    assert_eq!(fresh.capture_frame().unwrap(), last.unwrap());
}

#[test]
fn per_worker_assets_render_identically() {
    let tl = timeline();
    let shared = CpuBackendFactory::new(Arc::clone(&tl), AssetSharing::Shared);
    let owned = CpuBackendFactory::new(tl, AssetSharing::PerWorker);
    let scene = SceneConfig::default();
    let mut a = shared.create(0).unwrap();
    let mut b = owned.create(1).unwrap();
    a.seek(Tick(4), &scene).unwrap();
    b.seek(Tick(4), &scene).unwrap();
    assert_eq!(a.capture_frame().unwrap(), b.capture_frame().unwrap());
}

#[test]
fn post_effects_follow_the_scene() {
    let tl = timeline();
    let b = CpuBackend::new(tl);
    let mut scene = SceneConfig::default();
    let plain = b.render_tick(Tick(0), &scene).unwrap();
    scene.effects.vignette = 1.0;
    let dark = b.render_tick(Tick(0), &scene).unwrap();
    let (p, d) = (plain.pixel(0, 0).unwrap(), dark.pixel(0, 0).unwrap());
    assert!(d[2] < p[2]);
    assert_eq!(d[3], p[3]);
}
