use super::*;

#[test]
fn fnv_incremental_writes_match_one_shot() {
    let mut a = Fnv1a64::new_default();
    a.write_bytes(b"tickreel");
    let mut b = Fnv1a64::new_default();
    b.write_bytes(b"tick");
    b.write_bytes(b"reel");
    assert_eq!(a.finish(), b.finish());
}

#[test]
fn fnv_str_boundaries_are_distinct() {
    let mut a = Fnv1a64::new_default();
    a.write_str("ab");
    a.write_str("c");
    let mut b = Fnv1a64::new_default();
    b.write_str("a");
    b.write_str("bc");
    assert_ne!(a.finish(), b.finish());
}

#[test]
fn mul_div255_variants_align() {
    for x in [0u16, 1, 127, 255] {
        for y in [0u16, 1, 127, 255] {
            assert_eq!(u16::from(mul_div255_u8(x, y)), mul_div255_u16(x, y));
        }
    }
}

#[test]
fn unit_to_u8_clamps_and_rounds() {
    assert_eq!(unit_to_u8(-1.0), 0);
    assert_eq!(unit_to_u8(0.5), 128);
    assert_eq!(unit_to_u8(2.0), 255);
    assert_eq!(unit_to_u8(f64::NAN), 0);
}
