use super::*;
use crate::test_support::{FakeDecoder, fake_pixel};

fn canvas() -> Canvas {
    Canvas {
        width: 4,
        height: 6,
    }
}

fn fps() -> Fps {
    Fps::new(25, 1).unwrap()
}

fn window(start_sec: f64, end_sec: f64) -> TimeWindow {
    TimeWindow { start_sec, end_sec }
}

#[test]
fn window_validation() {
    assert!(window(0.0, 20.0).validate().is_ok());
    assert!(window(5.0, 5.0).validate().is_err());
    assert!(window(-1.0, 2.0).validate().is_err());
    assert!(window(0.0, f64::NAN).validate().is_err());
}

#[test]
fn twenty_second_window_is_five_hundred_frames() {
    let mut dec = FakeDecoder::new(1_000);
    let bg = load_background(
        &mut dec,
        Path::new("assets/happy_birthday_full.mp4"),
        canvas(),
        fps(),
        window(0.0, 20.0),
    )
    .unwrap();
    assert_eq!(bg.duration_frames(), 500);
    assert_eq!(dec.opened.len(), 1);
    assert_eq!(dec.opened[0].canvas, canvas());
    assert_eq!(dec.opened[0].duration_sec, 20.0);
}

#[test]
fn frames_are_delivered_in_order_and_can_skip_ahead() {
    let mut dec = FakeDecoder::new(100);
    let mut bg = load_background(
        &mut dec,
        Path::new("bg.mp4"),
        canvas(),
        fps(),
        window(0.0, 2.0),
    )
    .unwrap();
    let mut buf = vec![0u8; canvas().rgba_len()];

    bg.frame_into(FrameIndex(0), &mut buf).unwrap();
    assert_eq!(&buf[..4], &fake_pixel(0));
    bg.frame_into(FrameIndex(0), &mut buf).unwrap();
    assert_eq!(&buf[..4], &fake_pixel(0));
    bg.frame_into(FrameIndex(7), &mut buf).unwrap();
    assert_eq!(&buf[..4], &fake_pixel(7));

    let err = bg.frame_into(FrameIndex(3), &mut buf).unwrap_err();
    assert!(matches!(err, ReelError::Validation(_)));
    let err = bg.frame_into(FrameIndex(50), &mut buf).unwrap_err();
    assert!(matches!(err, ReelError::Validation(_)));
}

#[test]
fn short_source_holds_last_frame() {
    let mut dec = FakeDecoder::new(3);
    let mut bg = load_background(
        &mut dec,
        Path::new("bg.mp4"),
        canvas(),
        fps(),
        window(0.0, 1.0),
    )
    .unwrap();
    let mut buf = vec![0u8; canvas().rgba_len()];
    bg.frame_into(FrameIndex(24), &mut buf).unwrap();
    assert_eq!(&buf[..4], &fake_pixel(2));
    assert_eq!(bg.held_frames(), 22);
}

#[test]
fn empty_source_is_an_asset_error() {
    let mut dec = FakeDecoder::new(0);
    let err = load_background(
        &mut dec,
        Path::new("bg.mp4"),
        canvas(),
        fps(),
        window(0.0, 1.0),
    )
    .unwrap_err();
    assert!(matches!(err, ReelError::Asset(_)), "{err}");
}

#[test]
fn missing_source_is_an_asset_error() {
    let mut dec = FakeDecoder::new(10).with_missing("bg.mp4");
    let err = load_background(
        &mut dec,
        Path::new("bg.mp4"),
        canvas(),
        fps(),
        window(0.0, 1.0),
    )
    .unwrap_err();
    assert!(matches!(err, ReelError::Asset(_)));
    assert!(dec.opened.is_empty());
}
