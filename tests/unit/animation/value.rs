use super::*;

#[test]
fn json_boundary_converts_closed_set() {
    let v: PropValue = serde_json::from_str("3.5").unwrap();
    assert_eq!(v, PropValue::Number(3.5));
    let v: PropValue = serde_json::from_str("true").unwrap();
    assert_eq!(v, PropValue::Bool(true));
    let v: PropValue = serde_json::from_str("\"hello\"").unwrap();
    assert_eq!(v, PropValue::Str("hello".to_owned()));
    let v: PropValue = serde_json::from_str("\"#ff8000\"").unwrap();
    assert_eq!(v, PropValue::Color(Color::rgba(255, 128, 0, 255)));
    let v: PropValue = serde_json::from_str("\"#ff800080\"").unwrap();
    assert_eq!(v, PropValue::Color(Color::rgba(255, 128, 0, 128)));
}

#[test]
fn json_boundary_rejects_other_shapes() {
    assert!(serde_json::from_str::<PropValue>("null").is_err());
    assert!(serde_json::from_str::<PropValue>("[1,2]").is_err());
    assert!(serde_json::from_str::<PropValue>("{\"a\":1}").is_err());
}

#[test]
fn hash_prefixed_non_colors_stay_strings() {
    let v: PropValue = serde_json::from_str("\"#1 hit\"").unwrap();
    assert_eq!(v.as_str(), Some("#1 hit"));
}

#[test]
fn color_hex_round_trip() {
    let c = Color::parse_hex("#0a0b0c").unwrap();
    assert_eq!(c.to_hex(), "#0a0b0c");
    let c = Color::parse_hex("#0a0b0c7f").unwrap();
    assert_eq!(c.to_hex(), "#0a0b0c7f");
    assert!(Color::parse_hex("0a0b0c").is_err());
    assert!(Color::parse_hex("#zzzzzz").is_err());
}

#[test]
fn serializes_back_to_json() {
    let v = PropValue::Color(Color::rgba(1, 2, 3, 255));
    assert_eq!(serde_json::to_string(&v).unwrap(), "\"#010203\"");
    let v = PropValue::from(2.0);
    assert_eq!(serde_json::to_string(&v).unwrap(), "2.0");
}
