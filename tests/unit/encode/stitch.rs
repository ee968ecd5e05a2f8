use super::*;

#[test]
fn concat_list_quotes_paths() {
    let list = concat_list(&[PathBuf::from("/tmp/a.mp4"), PathBuf::from("/tmp/it's.mp4")]);
    assert_eq!(list, "file '/tmp/a.mp4'\nfile '/tmp/it'\\''s.mp4'\n");
}

#[test]
fn byte_concat_preserves_order() {
    let dir = tempfile::tempdir().unwrap();
    let parts: Vec<PathBuf> = (0..3)
        .map(|i| {
            let p = dir.path().join(format!("chunk-{i}.rgba"));
            std::fs::write(&p, [i as u8; 3]).unwrap();
            p
        })
        .collect();
    let out = dir.path().join("out").join("all.rgba");
    ByteConcatStitcher.stitch(&parts, &out).unwrap();
    assert_eq!(std::fs::read(&out).unwrap(), vec![0, 0, 0, 1, 1, 1, 2, 2, 2]);
}

#[test]
fn missing_or_empty_parts_are_stitch_errors() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("all.rgba");
    assert!(matches!(
        ByteConcatStitcher.stitch(&[], &out),
        Err(TickreelError::Stitch(_))
    ));
    let err = ByteConcatStitcher
        .stitch(&[dir.path().join("nope.rgba")], &out)
        .unwrap_err();
    assert!(err.to_string().contains("missing"));
    assert!(!out.exists());
}

#[test]
fn ffmpeg_concat_joins_chunks_when_available() {
    use crate::encode::ffmpeg::FfmpegSinkFactory;
    use crate::encode::sink::{SinkConfig, SinkFactory};
    use crate::foundation::core::{Fps, Tick};
    use crate::render::backend::FrameRGBA;

    if !is_ffmpeg_on_path() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let cfg = SinkConfig {
        width: 16,
        height: 16,
        fps: Fps::new(10, 1).unwrap(),
    };
    let frame = FrameRGBA {
        width: 16,
        height: 16,
        data: [0, 0, 255, 255].repeat(256),
        premultiplied: true,
    };
    let mut parts = Vec::new();
    for chunk in 0..2u64 {
        let p = dir.path().join(format!("chunk-{chunk}.mp4"));
        let mut sink = FfmpegSinkFactory::default().create(chunk as usize, &p).unwrap();
        sink.begin(cfg).unwrap();
        for t in 0..5 {
            sink.push_frame(Tick(chunk * 5 + t), &frame).unwrap();
        }
        sink.end().unwrap();
        parts.push(p);
    }
    let out = dir.path().join("final.mp4");
    FfmpegConcatStitcher::default().stitch(&parts, &out).unwrap();
    assert!(std::fs::metadata(&out).unwrap().len() > 0);
    assert!(!dir.path().join("concat-list.txt").exists());
}
