use super::*;

#[test]
fn floor_pow2_picks_largest_fitting_power() {
    assert_eq!(floor_pow2(0), 0);
    assert_eq!(floor_pow2(1), 1);
    assert_eq!(floor_pow2(1470), 1024);
    assert_eq!(floor_pow2(2048), 2048);
}

#[test]
fn impulse_has_flat_spectrum() {
    let mut buf = vec![Complex::default(); 8];
    buf[0].re = 1.0;
    fft_in_place(&mut buf);
    for c in buf {
        assert!((c.re - 1.0).abs() < 1e-12);
        assert!(c.im.abs() < 1e-12);
    }
}

#[test]
fn sine_peaks_at_its_bin() {
    let n = 64;
    let k = 5;
    let samples: Vec<f32> = (0..n)
        .map(|i| (2.0 * std::f64::consts::PI * k as f64 * i as f64 / n as f64).sin() as f32)
        .collect();
    let mags = half_spectrum_magnitudes(&samples);
    assert_eq!(mags.len(), n / 2);
    let peak = mags
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
        .unwrap();
    assert_eq!(peak, k);
    assert!((mags[k] - 1.0).abs() < 1e-3);
}
