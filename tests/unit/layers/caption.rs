use std::sync::Arc;

use super::*;

fn canvas() -> Canvas {
    Canvas {
        width: 1080,
        height: 1920,
    }
}

fn style(text: &str, font: FontSource) -> CaptionStyle {
    CaptionStyle {
        text: text.to_string(),
        font,
        size_px: 72.0,
        color: TextColor::WHITE,
        box_width: 1080,
        wrap: WrapMode::Caption,
    }
}

fn any_system_font() -> Option<(FontResolver, FontSource)> {
    let resolver = FontResolver::with_system_fonts();
    let family = resolver.first_family()?;
    Some((
        resolver,
        FontSource::System {
            family,
            weight: 400,
            italic: false,
        },
    ))
}

#[test]
fn anchor_serde_forms() {
    let c: HorizontalAnchor = serde_json::from_str("\"center\"").unwrap();
    assert_eq!(c, HorizontalAnchor::Center);
    let l: HorizontalAnchor = serde_json::from_str("{\"left\": 12}").unwrap();
    assert_eq!(l, HorizontalAnchor::Left(12));
}

#[test]
fn empty_text_is_a_validation_error() {
    let err = render_caption(
        &style("   ", FontSource::from_face_name("Arial-Bold")),
        HorizontalAnchor::Center,
        150,
        20.0,
        canvas(),
        &FontResolver::empty(),
        Path::new("."),
    )
    .unwrap_err();
    assert!(matches!(err, ReelError::Validation(_)));
}

#[test]
fn unknown_font_is_a_font_error() {
    let err = render_caption(
        &style("Happy", FontSource::from_face_name("Arial-Bold")),
        HorizontalAnchor::Center,
        150,
        20.0,
        canvas(),
        &FontResolver::empty(),
        Path::new("."),
    )
    .unwrap_err();
    assert!(matches!(err, ReelError::Font(_)), "{err}");
}

#[test]
fn caption_box_spans_width_and_sits_at_y() {
    let Some((resolver, font)) = any_system_font() else {
        eprintln!("no system fonts installed; skipping");
        return;
    };
    let layer = render_caption(
        &style("Happy 10th Birthday, Dashenka!", font),
        HorizontalAnchor::Center,
        150,
        20.0,
        canvas(),
        &resolver,
        Path::new("."),
    )
    .unwrap();
    assert_eq!(layer.size().0, 1080);
    assert_eq!(layer.position(), (0, 150));
    assert!(layer.is_active_at(19.96));
    assert!(!layer.is_active_at(20.0));

    let mut frame = FrameRGBA::transparent(canvas());
    layer.draw_into(&mut frame).unwrap();
    let (_, h) = layer.size();
    let rows_with_ink = (150..150 + h)
        .filter(|&y| (0..1080).any(|x| frame.pixel(x, y).unwrap()[3] > 0))
        .count();
    assert!(rows_with_ink > 0);
    assert!((0..150).all(|y| (0..1080).step_by(7).all(|x| frame.pixel(x, y).unwrap()[3] == 0)));
}

#[test]
fn long_caption_wraps_to_more_lines_than_label() {
    let Some((resolver, font)) = any_system_font() else {
        eprintln!("no system fonts installed; skipping");
        return;
    };
    let text = "one two three four five six seven eight nine ten eleven twelve thirteen";
    let mut s = style(text, font);
    s.box_width = 300;
    let wrapped = render_caption(
        &s,
        HorizontalAnchor::Center,
        0,
        1.0,
        canvas(),
        &resolver,
        Path::new("."),
    )
    .unwrap();
    s.wrap = WrapMode::Label;
    let label = render_caption(
        &s,
        HorizontalAnchor::Left(5),
        0,
        1.0,
        canvas(),
        &resolver,
        Path::new("."),
    )
    .unwrap();
    assert_eq!(wrapped.size().0, 300);
    assert!(wrapped.size().1 > label.size().1);
    assert!(label.size().0 > 300);
    assert_eq!(label.position(), (5, 0));
}

#[test]
fn from_image_blits_at_position() {
    let layer = CaptionLayer::from_image(
        "x",
        PreparedImage {
            width: 1,
            height: 1,
            rgba8_premul: Arc::new(vec![255, 255, 255, 255]),
        },
        3,
        2,
        1.0,
    );
    let mut frame = FrameRGBA::transparent(Canvas {
        width: 4,
        height: 4,
    });
    layer.draw_into(&mut frame).unwrap();
    assert_eq!(frame.pixel(3, 2), Some([255, 255, 255, 255]));
    assert_eq!(frame.pixel(2, 2), Some([0, 0, 0, 0]));
}
