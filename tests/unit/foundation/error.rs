use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        TickreelError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(TickreelError::config("x").to_string().contains("config error:"));
    assert!(
        TickreelError::encode("x")
            .to_string()
            .contains("encode process error:")
    );
    assert!(
        TickreelError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = TickreelError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn chunk_context_names_chunk_and_tick() {
    let err = TickreelError::capture("short read").in_chunk(2, Some(41));
    let msg = err.to_string();
    assert!(msg.contains("chunk 2"));
    assert!(msg.contains("at tick 41"));
    assert!(msg.contains("short read"));

    let err = TickreelError::encode("exit 1").in_chunk(0, None);
    assert!(!err.to_string().contains("at tick"));
}

#[test]
fn chunk_context_is_not_nested_and_cancel_passes_through() {
    let err = TickreelError::capture("x").in_chunk(1, Some(3)).in_chunk(7, None);
    match err {
        TickreelError::Chunk { index, tick, .. } => {
            assert_eq!(index, 1);
            assert_eq!(tick, Some(3));
        }
        other => panic!("unexpected error: {other}"),
    }

    assert!(TickreelError::Cancelled.in_chunk(0, Some(1)).is_cancelled());
}

#[test]
fn seek_timeout_reports_tick_and_budget() {
    let err = TickreelError::SeekTimeout {
        tick: 9,
        timeout_ms: 250,
    };
    assert_eq!(
        err.to_string(),
        "render host did not settle tick 9 within 250 ms"
    );
}
