use super::*;

fn covered(chunks: &[RenderChunk]) -> Vec<u64> {
    chunks
        .iter()
        .flat_map(|c| c.range().iter().map(|t| t.0))
        .collect()
}

#[test]
fn chunk_size_rounds_up() {
    assert_eq!(chunk_size(100, 4).unwrap(), 25);
    assert_eq!(chunk_size(10, 4).unwrap(), 3);
    assert_eq!(chunk_size(3, 8).unwrap(), 1);
    assert!(matches!(chunk_size(10, 0), Err(TickreelError::Config(_))));
}

#[test]
fn chunks_cover_every_tick_once() {
    let dir = Path::new("/tmp/job");
    for (total, conc) in [(1, 1), (10, 4), (100, 4), (7, 3), (5, 8), (99, 1)] {
        let chunks = plan_chunks(total, conc, dir, "rgba").unwrap();
        assert!(chunks.len() <= conc);
        assert_eq!(covered(&chunks), (0..total).collect::<Vec<_>>(), "{total}/{conc}");
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.index, i);
            assert_eq!(c.state, ChunkState::Pending);
            assert!(c.len_ticks() > 0);
        }
    }
}

#[test]
fn uneven_split_shortens_the_last_chunk() {
    let chunks = plan_chunks(10, 4, Path::new("out"), "mp4").unwrap();
    let bounds: Vec<(u64, u64)> = chunks
        .iter()
        .map(|c| (c.start_tick.0, c.end_tick_exclusive.0))
        .collect();
    assert_eq!(bounds, vec![(0, 3), (3, 6), (6, 9), (9, 10)]);
    assert_eq!(chunks[2].output_path, Path::new("out").join("chunk-00002.mp4"));
}

#[test]
fn empty_job_is_a_config_error() {
    assert!(matches!(
        plan_chunks(0, 2, Path::new("x"), "rgba"),
        Err(TickreelError::Config(_))
    ));
}

#[test]
fn oversized_concurrency_yields_one_tick_chunks() {
    let chunks = plan_chunks(20, usize::MAX / 2, Path::new("out"), "rgba").unwrap();
    assert_eq!(chunks.len(), 20);
    assert!(chunks.iter().all(|c| c.len_ticks() == 1));
    assert_eq!(covered(&chunks), (0..20).collect::<Vec<_>>());
}
