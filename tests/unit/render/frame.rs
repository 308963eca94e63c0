use super::*;

#[test]
fn transparent_frame_matches_canvas() {
    let f = FrameRGBA::transparent(Canvas {
        width: 6,
        height: 4,
    });
    assert_eq!(f.data.len(), 6 * 4 * 4);
    assert!(f.premultiplied);
    assert_eq!(f.pixel(5, 3), Some([0, 0, 0, 0]));
    assert_eq!(f.pixel(6, 0), None);
}

#[test]
fn from_premul_checks_length() {
    assert!(FrameRGBA::from_premul(2, 2, vec![0; 16]).is_ok());
    let err = FrameRGBA::from_premul(2, 2, vec![0; 15]).unwrap_err();
    assert!(matches!(err, ReelError::Validation(_)));
}

#[test]
fn unpremultiply_restores_straight_color() {
    let mut px = vec![64, 32, 0, 128, 10, 20, 30, 255, 9, 9, 9, 0];
    unpremultiply_rgba8_in_place(&mut px);
    assert_eq!(&px[..4], &[128, 64, 0, 128]);
    assert_eq!(&px[4..8], &[10, 20, 30, 255]);
    assert_eq!(&px[8..], &[9, 9, 9, 0]);
}

#[test]
fn save_png_writes_file() {
    let dir = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("target/unit-frame-png");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("px.png");
    let f = FrameRGBA::from_premul(1, 1, vec![255, 0, 0, 255]).unwrap();
    f.save_png(&path).unwrap();
    let img = image::open(&path).unwrap().to_rgba8();
    assert_eq!(img.get_pixel(0, 0).0, [255, 0, 0, 255]);
}
