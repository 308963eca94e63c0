use std::io::Cursor;

use super::*;

fn png_bytes(img: image::RgbaImage) -> Vec<u8> {
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn decode_image_png_dimensions_and_premul() {
    let img = image::RgbaImage::from_raw(1, 1, vec![100u8, 50u8, 200u8, 128u8]).unwrap();
    let prepared = decode_image(&png_bytes(img)).unwrap();
    assert_eq!(prepared.width, 1);
    assert_eq!(prepared.height, 1);
    assert_eq!(
        prepared.rgba8_premul.as_slice(),
        &[
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128u8
        ]
    );
}

#[test]
fn garbage_bytes_are_an_asset_error() {
    let err = decode_image(b"definitely not a png").unwrap_err();
    assert!(matches!(err, ReelError::Asset(_)));
}

#[test]
fn scale_to_height_preserves_aspect() {
    let img = image::RgbaImage::from_pixel(40, 20, image::Rgba([255, 0, 0, 255]));
    let prepared = decode_image_to_height(&png_bytes(img), 60).unwrap();
    assert_eq!(prepared.height, 60);
    assert_eq!(prepared.width, 120);
    assert_eq!(prepared.rgba8_premul.len(), 120 * 60 * 4);
    // Opaque input stays opaque after resampling.
    let mid = ((30 * 120 + 60) * 4) as usize;
    assert_eq!(prepared.rgba8_premul[mid + 3], 255);
}

#[test]
fn scale_to_same_height_is_passthrough() {
    let img = image::RgbaImage::from_pixel(3, 600, image::Rgba([1, 2, 3, 255]));
    let prepared = decode_image_to_height(&png_bytes(img), 600).unwrap();
    assert_eq!((prepared.width, prepared.height), (3, 600));
}

#[test]
fn scaled_width_never_collapses_to_zero() {
    assert_eq!(scaled_width(1, 1000, 10), 1);
    assert_eq!(scaled_width(1000, 1500, 600), 400);
}

#[test]
fn zero_height_is_rejected() {
    let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([0, 0, 0, 255]));
    assert!(decode_image_to_height(&png_bytes(img), 0).is_err());
}
