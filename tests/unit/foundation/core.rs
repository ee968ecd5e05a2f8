use super::*;

#[test]
fn tick_range_contains_boundaries() {
    let r = TickRange::new(Tick(2), Tick(5)).unwrap();
    assert!(!r.contains(Tick(1)));
    assert!(r.contains(Tick(2)));
    assert!(r.contains(Tick(4)));
    assert!(!r.contains(Tick(5)));
    assert_eq!(r.len_ticks(), 3);
    assert_eq!(r.iter().collect::<Vec<_>>(), vec![Tick(2), Tick(3), Tick(4)]);
}

#[test]
fn tick_range_rejects_inverted_bounds() {
    assert!(TickRange::new(Tick(5), Tick(2)).is_err());
    assert!(TickRange::new(Tick(3), Tick(3)).unwrap().is_empty());
}

#[test]
fn total_ticks_is_ceiling_of_duration_times_fps() {
    let fps = Fps::new(10, 1).unwrap();
    assert_eq!(fps.total_ticks(2.0), 20);
    assert_eq!(fps.total_ticks(2.05), 21);
    assert_eq!(fps.total_ticks(0.0), 0);

    // 0.1 * 30 is 3.0000000000000004 in binary floating point.
    let fps = Fps::new(30, 1).unwrap();
    assert_eq!(fps.total_ticks(0.1), 3);
}

#[test]
fn fps_rejects_zero_parts() {
    assert!(matches!(Fps::new(0, 1), Err(TickreelError::Config(_))));
    assert!(matches!(Fps::new(30, 0), Err(TickreelError::Config(_))));
}

#[test]
fn premultiply_rounds_to_nearest() {
    let c = Rgba8Premul::from_straight_rgba(255, 128, 0, 128);
    assert_eq!(c.to_array(), [128, 64, 0, 128]);
}
