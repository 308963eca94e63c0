use super::*;

fn ramp_pcm(frames: usize, sample_rate: u32) -> AudioPcm {
    let mut interleaved_f32 = Vec::with_capacity(frames * 2);
    for i in 0..frames {
        let v = i as f32 / frames as f32;
        interleaved_f32.push(v);
        interleaved_f32.push(-v);
    }
    AudioPcm {
        sample_rate,
        channels: 2,
        interleaved_f32,
    }
}

fn opts(total_samples: u64, fit: AudioFit) -> AudioMixOpts {
    AudioMixOpts {
        sample_rate: 100,
        channels: 2,
        total_samples,
        fit,
        fade_out_sec: 0.0,
    }
}

#[test]
fn frame_to_sample_uses_rational_fps() {
    let fps = Fps {
        num: 30_000,
        den: 1001,
    };
    assert_eq!(frame_to_sample(0, fps, 48_000), 0);
    assert!(frame_to_sample(1, fps, 48_000) > 0);
    assert_eq!(frame_to_sample(500, Fps::new(25, 1).unwrap(), 48_000), 960_000);
}

#[test]
fn trim_cuts_longer_audio_to_timeline() {
    let src = ramp_pcm(300, 100);
    let out = mix_to_timeline(&src, opts(200, AudioFit::Trim)).unwrap();
    assert_eq!(out.len(), 400);
    assert!((out[2 * 199] - 199.0 / 300.0).abs() < 1e-6);
}

#[test]
fn trim_pads_shorter_audio_with_silence() {
    let src = ramp_pcm(50, 100);
    let out = mix_to_timeline(&src, opts(200, AudioFit::Trim)).unwrap();
    assert_eq!(out.len(), 400);
    assert!(out[2 * 49] > 0.0);
    assert!(out[2 * 50..].iter().all(|&s| s == 0.0));
}

#[test]
fn loop_repeats_source() {
    let src = ramp_pcm(50, 100);
    let out = mix_to_timeline(&src, opts(200, AudioFit::Loop)).unwrap();
    for k in [0usize, 10, 49] {
        assert_eq!(out[2 * k], out[2 * (k + 50)]);
        assert_eq!(out[2 * k], out[2 * (k + 150)]);
    }
}

#[test]
fn pad_rejects_longer_audio() {
    let src = ramp_pcm(300, 100);
    let err = mix_to_timeline(&src, opts(200, AudioFit::Pad)).unwrap_err();
    assert!(matches!(err, ReelError::Validation(_)));

    let short = ramp_pcm(100, 100);
    let out = mix_to_timeline(&short, opts(200, AudioFit::Pad)).unwrap();
    assert!(out[2 * 100..].iter().all(|&s| s == 0.0));
}

#[test]
fn mono_source_is_duplicated_to_both_channels() {
    let src = AudioPcm {
        sample_rate: 100,
        channels: 1,
        interleaved_f32: vec![0.25; 10],
    };
    let out = mix_to_timeline(&src, opts(10, AudioFit::Trim)).unwrap();
    assert!(out.iter().all(|&s| (s - 0.25).abs() < 1e-6));
}

#[test]
fn resamples_when_rates_differ() {
    let src = ramp_pcm(50, 50);
    let out = mix_to_timeline(&src, opts(100, AudioFit::Trim)).unwrap();
    assert!((out[2 * 2] - 1.0 / 50.0).abs() < 1e-6);
    assert!((out[2 * 3] - 1.5 / 50.0).abs() < 1e-6);
}

#[test]
fn fade_out_reaches_silence_at_end() {
    let src = AudioPcm {
        sample_rate: 100,
        channels: 2,
        interleaved_f32: vec![0.5; 400],
    };
    let mut o = opts(200, AudioFit::Trim);
    o.fade_out_sec = 1.0;
    let out = mix_to_timeline(&src, o).unwrap();
    assert!((out[0] - 0.5).abs() < 1e-6);
    assert_eq!(out[2 * 199], 0.0);
    assert!(out[2 * 150] < 0.5 && out[2 * 150] > 0.0);
}

#[test]
fn f32le_file_round_trips_bytes() {
    let dir = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("target/unit-audio-mix");
    let path = dir.join("mix.f32le");
    write_mix_to_f32le_file(&[0.5, -0.25], &path).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes.len(), 8);
    assert_eq!(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]), 0.5);
}

#[test]
fn oversized_timeline_is_an_error_not_an_abort() {
    let src = ramp_pcm(50, 100);
    let err = mix_to_timeline(&src, opts(u64::MAX, AudioFit::Trim)).unwrap_err();
    assert!(matches!(err, ReelError::Validation(_)), "{err}");
}
