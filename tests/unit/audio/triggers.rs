use super::*;
use crate::animation::value::PropValue;

fn volumes(v: &[f64]) -> Vec<AudioFrameData> {
    v.iter()
        .map(|&volume| AudioFrameData {
            volume,
            frequencies: vec![volume * 2.0, 0.0],
        })
        .collect()
}

#[test]
fn cooldown_spaces_out_triggers() {
    let frames = volumes(&[0.9; 20]);
    let cfg = TriggerConfig::on_volume(0.5, 4, 6);
    let fired = fired_ticks(&frames, &cfg);
    assert_eq!(fired, vec![0, 4, 8, 12, 16]);
    for w in fired.windows(2) {
        assert!(w[1] - w[0] >= cfg.cooldown_ticks);
    }
}

#[test]
fn below_threshold_never_fires() {
    let frames = volumes(&[0.1, 0.2, 0.49]);
    let cfg = TriggerConfig::on_volume(0.5, 1, 3);
    assert!(fired_ticks(&frames, &cfg).is_empty());
    assert!(generate_pulses(&frames, &cfg).is_empty());
}

#[test]
fn pulse_shape_is_base_peak_base() {
    let frames = volumes(&[0.0, 0.0, 1.0, 0.0, 0.0]);
    let mut cfg = TriggerConfig::on_volume(0.5, 10, 10);
    cfg.base_value = 1.0;
    cfg.peak_value = 2.0;
    let kfs = generate_pulses(&frames, &cfg);
    assert_eq!(kfs.len(), 3);
    assert_eq!(kfs[0].tick, 2);
    assert_eq!(kfs[0].value, PropValue::Number(1.0));
    assert_eq!(kfs[1].tick, 4);
    assert_eq!(kfs[1].easing, Some(Ease::OutQuad));
    assert_eq!(kfs[1].value, PropValue::Number(2.0));
    assert_eq!(kfs[2].tick, 12);
    assert_eq!(kfs[2].easing, Some(Ease::InQuad));
}

#[test]
fn overlapping_pulses_come_out_sorted() {
    let frames = volumes(&[1.0, 1.0, 1.0, 1.0]);
    let cfg = TriggerConfig::on_volume(0.5, 1, 5);
    let kfs = generate_pulses(&frames, &cfg);
    assert_eq!(kfs.len(), 12);
    assert!(kfs.windows(2).all(|w| w[0].tick <= w[1].tick));
}

#[test]
fn bin_and_band_sources() {
    let frames = volumes(&[0.1, 0.3]);
    let mut cfg = TriggerConfig::on_volume(0.5, 1, 2);
    cfg.source = TriggerSource::Bin { index: 0 };
    assert_eq!(fired_ticks(&frames, &cfg), vec![1]);
    cfg.source = TriggerSource::Bin { index: 9 };
    assert!(fired_ticks(&frames, &cfg).is_empty());
    cfg.source = TriggerSource::BandAverage { start: 0, end: 2 };
    cfg.threshold = 0.3;
    assert_eq!(fired_ticks(&frames, &cfg), vec![1]);
}

#[test]
fn config_validation_rejects_degenerate_triggers() {
    TriggerConfig::on_volume(0.5, 2, 4).validate().unwrap();
    let mut cfg = TriggerConfig::on_volume(f64::NAN, 2, 4);
    assert!(cfg.validate().is_err());
    cfg.threshold = 0.5;
    cfg.source = TriggerSource::BandAverage { start: 3, end: 3 };
    assert!(cfg.validate().is_err());
}

#[test]
fn source_defaults_to_volume_in_json() {
    let cfg: TriggerConfig = serde_json::from_str(
        r#"{"threshold":0.4,"cooldownTicks":2,"reactionTicks":3,"baseValue":1,"peakValue":2}"#,
    )
    .unwrap();
    assert_eq!(cfg.source, TriggerSource::Volume);
    assert_eq!(cfg.rise, Ease::OutQuad);
}
