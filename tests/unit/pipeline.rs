use std::path::PathBuf;

use super::*;
use crate::animation::fade::FadeIn;
use crate::animation::motion::Motion;
use crate::assets::fonts::FontSource;
use crate::encode::sink::InMemorySink;
use crate::foundation::core::Canvas;
use crate::layers::overlay::OverlayAnimation;
use crate::test_support::FakeDecoder;

fn assets_root(name: &str) -> PathBuf {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("target/unit-pipeline")
        .join(name);
    std::fs::create_dir_all(root.join("assets")).unwrap();
    image::RgbaImage::from_pixel(8, 16, image::Rgba([250, 200, 10, 255]))
        .save(root.join("assets/baby.png"))
        .unwrap();
    root
}

/// Small reel with the default structure, or `None` when no font is installed.
fn small_config() -> Option<ReelConfig> {
    let family = FontResolver::with_system_fonts().first_family()?;
    let mut cfg = ReelConfig::default();
    cfg.canvas = Canvas {
        width: 64,
        height: 96,
    };
    cfg.background.window.end_sec = 2.0;
    cfg.overlay.height_px = 24;
    cfg.overlay.animation = OverlayAnimation {
        y: Motion::sine(45.0, 2.0, 0.5),
        angle_deg: Motion::sine(0.0, 3.0, 0.8),
        duration_sec: 2.0,
        fade_in: FadeIn::linear(1.0),
    };
    cfg.caption.font = FontSource::System {
        family,
        weight: 400,
        italic: false,
    };
    cfg.caption.size_px = 12.0;
    cfg.caption.box_width = 64;
    cfg.caption.y_px = 5;
    cfg.caption.duration_sec = 2.0;
    Some(cfg)
}

#[test]
fn run_emits_every_frame_at_canvas_size() {
    let Some(cfg) = small_config() else {
        eprintln!("no system fonts installed; skipping");
        return;
    };
    let root = assets_root("frames");
    let mut dec = FakeDecoder::new(1_000);
    let mut sink = InMemorySink::new();
    let stats = run(&cfg, &root, &mut dec, &mut sink).unwrap();

    assert_eq!(stats.frames_rendered, 50);
    assert_eq!(sink.frames().len(), 50);
    assert!(
        sink.frames()
            .iter()
            .all(|(_, f)| f.width == 64 && f.height == 96)
    );
    assert_eq!(dec.opened[0].path, root.join("assets/happy_birthday_full.mp4"));
}

#[test]
fn run_is_deterministic() {
    let Some(cfg) = small_config() else {
        return;
    };
    let root = assets_root("determinism");
    let mut a = InMemorySink::new();
    let mut b = InMemorySink::new();
    run(&cfg, &root, &mut FakeDecoder::new(1_000), &mut a).unwrap();
    run(&cfg, &root, &mut FakeDecoder::new(1_000), &mut b).unwrap();
    assert_eq!(a.frames(), b.frames());
    assert_eq!(a.audio_samples(), b.audio_samples());
}

#[test]
fn audio_gain_reaches_the_sink() {
    let Some(cfg) = small_config() else {
        return;
    };
    let root = assets_root("gain");
    let mut dec = FakeDecoder::new(1_000);
    let mut sink = InMemorySink::new();
    run(&cfg, &root, &mut dec, &mut sink).unwrap();

    let peak = sink
        .audio_samples()
        .unwrap()
        .iter()
        .fold(0.0f32, |m, s| m.max(s.abs()));
    assert!((peak - 0.5 * 0.8).abs() < 1e-6, "{peak}");
}

#[test]
fn missing_background_fails_before_the_sink_starts() {
    let mut cfg = ReelConfig::default();
    cfg.caption.font = FontSource::from_face_name("Definitely-Not-Installed");
    let root = assets_root("missing");
    let mut dec = FakeDecoder::new(10).with_missing("assets/happy_birthday_full.mp4");
    let mut sink = InMemorySink::new();

    let err = run(&cfg, &root, &mut dec, &mut sink).unwrap_err();
    assert!(matches!(err, ReelError::Asset(_)), "{err}");
    assert!(sink.config().is_none());
    assert!(sink.frames().is_empty());
}

#[test]
fn unknown_font_is_reported_as_font_error() {
    let Some(mut cfg) = small_config() else {
        return;
    };
    cfg.caption.font = FontSource::from_face_name("Definitely-Not-Installed-Bold");
    let root = assets_root("font");
    let err = build_composite(&cfg, &root, &mut FakeDecoder::new(100), &FontResolver::empty())
        .unwrap_err();
    assert!(matches!(err, ReelError::Font(_)), "{err}");
}

#[test]
fn preview_frame_is_written_as_png() {
    let Some(cfg) = small_config() else {
        return;
    };
    let root = assets_root("preview");
    let fonts = FontResolver::with_system_fonts();
    let out = root.join("out/frame_30.png");
    let frame = render_preview_frame(
        &cfg,
        &root,
        &mut FakeDecoder::new(1_000),
        &fonts,
        FrameIndex(30),
        Some(&out),
    )
    .unwrap();
    assert_eq!((frame.width, frame.height), (64, 96));
    assert!(out.is_file());

    let err = render_preview_frame(
        &cfg,
        &root,
        &mut FakeDecoder::new(1_000),
        &fonts,
        FrameIndex(50),
        None,
    )
    .unwrap_err();
    assert!(matches!(err, ReelError::Validation(_)));
}
