use super::*;
use crate::assets::fonts::{FontResolver, FontSource};
use crate::assets::text::TextLayoutEngine;

fn solid_image(w: u32, h: u32, px: [u8; 4]) -> PreparedImage {
    let mut bytes = vec![0u8; (w as usize) * (h as usize) * 4];
    for c in bytes.chunks_exact_mut(4) {
        c.copy_from_slice(&px);
    }
    PreparedImage {
        width: w,
        height: h,
        rgba8_premul: Arc::new(bytes),
    }
}

fn canvas(w: u32, h: u32) -> Canvas {
    Canvas {
        width: w,
        height: h,
    }
}

#[test]
fn draw_image_identity_covers_its_box_only() {
    let mut r = CpuRasterizer::new();
    let paint = ImagePaint::from_prepared(&solid_image(2, 2, [255, 0, 0, 255])).unwrap();
    let mut dst = FrameRGBA::transparent(canvas(4, 4));
    r.draw_image(&mut dst, &paint, Affine::IDENTITY, 1.0).unwrap();

    assert_eq!(dst.pixel(0, 0), Some([255, 0, 0, 255]));
    assert_eq!(dst.pixel(1, 1), Some([255, 0, 0, 255]));
    assert_eq!(dst.pixel(3, 3), Some([0, 0, 0, 0]));
}

#[test]
fn draw_image_honors_translation_and_opacity() {
    let mut r = CpuRasterizer::new();
    let paint = ImagePaint::from_prepared(&solid_image(2, 2, [0, 0, 255, 255])).unwrap();
    let mut dst = FrameRGBA::transparent(canvas(4, 4));
    r.draw_image(&mut dst, &paint, Affine::translate((2.0, 2.0)), 0.5)
        .unwrap();

    assert_eq!(dst.pixel(0, 0), Some([0, 0, 0, 0]));
    let px = dst.pixel(3, 3).unwrap();
    assert!((127..=129).contains(&px[3]), "{px:?}");
    assert_eq!(px[2], px[3]);
}

#[test]
fn zero_opacity_leaves_destination_untouched() {
    let mut r = CpuRasterizer::new();
    let paint = ImagePaint::from_prepared(&solid_image(4, 4, [255, 255, 255, 255])).unwrap();
    let mut dst = FrameRGBA::transparent(canvas(4, 4));
    r.draw_image(&mut dst, &paint, Affine::IDENTITY, 0.0).unwrap();
    assert!(dst.data.iter().all(|&b| b == 0));
}

#[test]
fn rasterizer_reuses_context_across_sizes() {
    let mut r = CpuRasterizer::new();
    let paint = ImagePaint::from_prepared(&solid_image(1, 1, [9, 9, 9, 255])).unwrap();
    let mut a = FrameRGBA::transparent(canvas(3, 3));
    let mut b = FrameRGBA::transparent(canvas(5, 2));
    r.draw_image(&mut a, &paint, Affine::IDENTITY, 1.0).unwrap();
    r.draw_image(&mut b, &paint, Affine::IDENTITY, 1.0).unwrap();
    assert_eq!(a.pixel(0, 0), Some([9, 9, 9, 255]));
    assert_eq!(b.pixel(0, 0), Some([9, 9, 9, 255]));
    assert_eq!(b.pixel(4, 1), Some([0, 0, 0, 0]));
}

#[test]
fn oversized_canvas_is_rejected() {
    assert!(canvas_dims_u16(canvas(70_000, 10)).is_err());
    assert!(canvas_dims_u16(canvas(0, 10)).is_err());
    assert_eq!(canvas_dims_u16(canvas(1080, 1920)).unwrap(), (1080, 1920));
}

#[test]
fn text_rasterizes_to_box_width_when_a_system_font_exists() {
    let resolver = FontResolver::with_system_fonts();
    let Some(family) = resolver.first_family() else {
        eprintln!("no system fonts installed; skipping");
        return;
    };
    let font = resolver
        .resolve(
            &FontSource::System {
                family,
                weight: 400,
                italic: false,
            },
            std::path::Path::new("."),
        )
        .unwrap();
    let mut engine = TextLayoutEngine::new();
    let brush = TextBrushRgba8 {
        r: 255,
        g: 255,
        b: 255,
        a: 255,
    };
    let layout = engine
        .layout_plain("Hello hello hello", &font, 32.0, brush, Some(120.0))
        .unwrap();

    let mut r = CpuRasterizer::new();
    let img = r.rasterize_text(&layout, &font, 120, true).unwrap();
    assert_eq!(img.width, 120);
    assert!(img.height >= 32, "wrapped text should span lines");
    assert!(img.rgba8_premul.chunks_exact(4).any(|px| px[3] > 0));
}
