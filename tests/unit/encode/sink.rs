use super::*;

fn cfg(audio: Option<AudioInputConfig>) -> SinkConfig {
    SinkConfig {
        width: 2,
        height: 2,
        fps: Fps::new(25, 1).unwrap(),
        total_frames: 2,
        audio,
    }
}

fn frame() -> FrameRGBA {
    FrameRGBA::from_premul(2, 2, vec![1; 16]).unwrap()
}

#[test]
fn captures_frames_in_order() {
    let mut s = InMemorySink::new();
    s.begin(cfg(None)).unwrap();
    s.push_frame(FrameIndex(0), &frame()).unwrap();
    s.push_frame(FrameIndex(1), &frame()).unwrap();
    s.end().unwrap();
    assert_eq!(s.frames().len(), 2);
    assert!(s.ended());
    assert!(s.audio_samples().is_none());
}

#[test]
fn rejects_out_of_order_frames() {
    let mut s = InMemorySink::new();
    s.begin(cfg(None)).unwrap();
    s.push_frame(FrameIndex(1), &frame()).unwrap();
    let err = s.push_frame(FrameIndex(1), &frame()).unwrap_err();
    assert!(matches!(err, ReelError::Encode(_)));
}

#[test]
fn abort_discards_frames() {
    let mut s = InMemorySink::new();
    s.begin(cfg(None)).unwrap();
    s.push_frame(FrameIndex(0), &frame()).unwrap();
    s.abort();
    assert!(s.frames().is_empty());
    assert!(s.aborted());
}

#[test]
fn reads_audio_input_at_begin() {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("target/unit-sink");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("a.f32le");
    let mut bytes = Vec::new();
    for v in [0.25f32, -0.5] {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    std::fs::write(&path, bytes).unwrap();

    let mut s = InMemorySink::new();
    s.begin(cfg(Some(AudioInputConfig {
        path,
        sample_rate: 48_000,
        channels: 2,
    })))
    .unwrap();
    assert_eq!(s.audio_samples(), Some(&[0.25f32, -0.5][..]));
}
