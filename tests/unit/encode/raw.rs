use super::*;
use crate::foundation::core::Fps;

fn cfg() -> SinkConfig {
    SinkConfig {
        width: 1,
        height: 2,
        fps: Fps::new(24, 1).unwrap(),
    }
}

fn frame(v: u8) -> FrameRGBA {
    FrameRGBA {
        width: 1,
        height: 2,
        data: vec![v; 8],
        premultiplied: true,
    }
}

#[test]
fn writes_frames_back_to_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("chunk.rgba");
    let mut sink = RawFileSink::new(&path);
    sink.begin(cfg()).unwrap();
    sink.push_frame(Tick(0), &frame(1)).unwrap();
    sink.push_frame(Tick(1), &frame(2)).unwrap();
    sink.end().unwrap();
    assert_eq!(sink.frames_written(), 2);

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes.len(), 16);
    assert!(bytes[..8].iter().all(|&b| b == 1));
    assert!(bytes[8..].iter().all(|&b| b == 2));
}

#[test]
fn abort_removes_partial_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chunk.rgba");
    let mut sink = RawFileSink::new(&path);
    sink.begin(cfg()).unwrap();
    sink.push_frame(Tick(0), &frame(1)).unwrap();
    assert!(path.exists());
    sink.abort();
    assert!(!path.exists());
    // aborting twice is harmless
    sink.abort();
}

#[test]
fn rejects_backwards_ticks() {
    let dir = tempfile::tempdir().unwrap();
    let mut sink = RawFileSink::new(dir.path().join("c.rgba"));
    sink.begin(cfg()).unwrap();
    sink.push_frame(Tick(4), &frame(0)).unwrap();
    assert!(sink.push_frame(Tick(3), &frame(0)).is_err());
}

#[test]
fn factory_uses_the_chunk_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chunk-0003.rgba");
    let factory = RawSinkFactory;
    assert_eq!(factory.extension(), "rgba");
    let mut sink = factory.create(3, &path).unwrap();
    sink.begin(cfg()).unwrap();
    sink.push_frame(Tick(9), &frame(7)).unwrap();
    sink.end().unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), vec![7; 8]);
}
