use super::*;

const MINIMAL: &str = r##"{
  "config": { "width": 64, "height": 32, "fps": 10, "durationSeconds": 2 },
  "clips": [
    { "id": "bg", "blueprintId": "solid", "startTick": 0, "durationTicks": 20,
      "staticProps": { "color": "#102030" } },
    { "id": "viz", "blueprintId": "spectrum", "startTick": 5, "durationTicks": 10, "layer": 1,
      "audioTrack": "music", "blendMode": "add" }
  ],
  "audioData": { "music": [ { "volume": 0.5, "frequencies": [0.2, 0.4] } ] }
}"##;

#[test]
fn parses_and_derives_totals() {
    let m = Manifest::from_json_str(MINIMAL).unwrap();
    m.validate().unwrap();
    assert_eq!(m.total_ticks().unwrap(), 20);
    assert_eq!(m.config.concurrency, 1);
    assert_eq!(m.canvas(), Canvas { width: 64, height: 32 });
    assert_eq!(m.scene(), SceneConfig::default());
}

#[test]
fn builds_a_sorted_timeline() {
    let m = Manifest::from_json_str(MINIMAL).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let tl = m
        .build_timeline(BlueprintRegistry::with_builtins(), dir.path())
        .unwrap();
    assert_eq!(tl.clips().len(), 2);
    assert_eq!(tl.clips()[0].id, "bg");
    assert!(tl.audio_frame("music", crate::foundation::core::Tick(0)).is_some());
    assert!(tl.audio_frame("music", crate::foundation::core::Tick(1)).is_none());
}

#[test]
fn bad_config_is_a_config_error() {
    for (field, value) in [
        ("width", "0"),
        ("fps", "0"),
        ("durationSeconds", "-1"),
        ("concurrency", "0"),
    ] {
        let mut v: serde_json::Value = serde_json::from_str(MINIMAL).unwrap();
        v["config"][field] = serde_json::from_str(value).unwrap();
        let m: Manifest = serde_json::from_value(v).unwrap();
        assert!(
            matches!(m.validate(), Err(TickreelError::Config(_))),
            "{field}={value}"
        );
    }
}

#[test]
fn camera_and_effects_values_are_checked() {
    let mut m = Manifest::from_json_str(MINIMAL).unwrap();
    m.config.effects = Some(EffectsConfig {
        vignette: 0.0,
        chromatic_aberration: f64::INFINITY,
    });
    assert!(matches!(m.validate(), Err(TickreelError::Config(_))));

    let mut m = Manifest::from_json_str(MINIMAL).unwrap();
    m.config.camera = Some(CameraConfig {
        zoom: -2.0,
        ..CameraConfig::default()
    });
    assert!(matches!(m.validate(), Err(TickreelError::Config(_))));
}

#[test]
fn unknown_audio_track_and_duplicates_are_rejected() {
    let mut m = Manifest::from_json_str(MINIMAL).unwrap();
    m.audio_data.clear();
    assert!(m.validate().unwrap_err().to_string().contains("unknown audio track"));

    let mut m = Manifest::from_json_str(MINIMAL).unwrap();
    let dup = m.clips[0].clone();
    m.clips.push(dup);
    assert!(m.validate().unwrap_err().to_string().contains("duplicate clip id"));
}

#[test]
fn malformed_json_is_a_serde_error() {
    assert!(matches!(
        Manifest::from_json_str("{\"config\": 1}"),
        Err(TickreelError::Serde(_))
    ));
    let unknown = MINIMAL.replace("\"durationSeconds\"", "\"duration\"");
    assert!(Manifest::from_json_str(&unknown).is_err());
}

#[test]
fn camera_effects_and_tracks_parse() {
    let json = r#"{
      "config": { "width": 8, "height": 8, "fps": 30, "durationSeconds": 1, "concurrency": 2,
        "seed": 9, "camera": { "zoom": 2 }, "effects": { "vignette": 0.3 },
        "cameraTracks": { "x": [ { "tick": 0, "value": 0 }, { "tick": 29, "value": 10 } ] } },
      "clips": []
    }"#;
    let m = Manifest::from_json_str(json).unwrap();
    m.validate().unwrap();
    let scene = m.scene();
    assert_eq!(scene.camera.zoom, 2.0);
    assert_eq!(scene.effects.vignette, 0.3);
    let dir = tempfile::tempdir().unwrap();
    let tl = m
        .build_timeline(BlueprintRegistry::new(), dir.path())
        .unwrap();
    assert_eq!(tl.seed(), 9);
    let cam = tl.resolve_camera(crate::foundation::core::Tick(29), &scene.camera);
    assert_eq!(cam.x, 10.0);
}

#[test]
fn audio_triggers_become_keyframe_tracks() {
    let json = r#"{
      "config": { "width": 8, "height": 8, "fps": 10, "durationSeconds": 1 },
      "clips": [
        { "id": "dot", "blueprintId": "circle", "startTick": 2, "durationTicks": 8,
          "audioTrack": "kick",
          "audioTriggers": { "radius": { "threshold": 0.5, "cooldownTicks": 2, "reactionTicks": 3,
                                         "baseValue": 2, "peakValue": 4 } } }
      ],
      "audioData": { "kick": [] }
    }"#;
    let mut m = Manifest::from_json_str(json).unwrap();
    let kick = (0..10)
        .map(|t| AudioFrameData {
            volume: if t == 3 { 0.8 } else { 0.0 },
            frequencies: Vec::new(),
        })
        .collect();
    m.audio_data.insert("kick".to_string(), kick);
    let dir = tempfile::tempdir().unwrap();
    let tl = m
        .build_timeline(BlueprintRegistry::with_builtins(), dir.path())
        .unwrap();
    let track = &tl.clips()[0].animated_props["radius"];
    let ticks: Vec<u64> = track.iter().map(|k| k.tick).collect();
    assert_eq!(ticks, vec![1, 2, 4]);
    assert!(tl.clips()[0].audio_triggers.is_empty());
    // the manifest itself keeps the declarative form
    assert!(m.to_json_pretty().unwrap().contains("audioTriggers"));
}

#[test]
fn round_trips_through_pretty_json() {
    let m = Manifest::from_json_str(MINIMAL).unwrap();
    let again = Manifest::from_json_str(&m.to_json_pretty().unwrap()).unwrap();
    assert_eq!(m, again);
}

#[test]
fn audio_paths_resolve_against_base_dir() {
    assert_eq!(
        resolve_audio_path(Path::new("/proj"), "music/a.wav"),
        PathBuf::from("/proj/music/a.wav")
    );
    assert_eq!(
        resolve_audio_path(Path::new("/proj"), "file:///abs/a.wav"),
        PathBuf::from("/abs/a.wav")
    );
}
