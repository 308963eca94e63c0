use std::path::Path;

use crate::assets::color::TextColor;
use crate::assets::decode::PreparedImage;
use crate::assets::fonts::{FontResolver, FontSource};
use crate::assets::text::{TextBrushRgba8, TextLayoutEngine};
use crate::compose::blend::blit_premul_over;
use crate::foundation::core::Canvas;
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::cpu::CpuRasterizer;
use crate::render::frame::FrameRGBA;

/// How caption text is broken into lines.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WrapMode {
    /// Word-wrap to the box width, grow downwards, center each line.
    #[default]
    Caption,
    /// One line at its natural width.
    Label,
}

/// Horizontal placement of a layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HorizontalAnchor {
    /// Centered on the canvas.
    #[default]
    Center,
    /// Left edge at this many pixels from the canvas left.
    Left(i64),
}

/// Text, font and box of a caption.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CaptionStyle {
    /// UTF-8 text; emoji render only when the resolved font has glyphs for them.
    pub text: String,
    /// Font to shape with.
    pub font: FontSource,
    /// Font size in pixels.
    pub size_px: f32,
    /// Fill color.
    pub color: TextColor,
    /// Box width for [`WrapMode::Caption`].
    pub box_width: u32,
    /// Line breaking mode.
    pub wrap: WrapMode,
}

/// Rasterized text placed on the canvas for a fixed duration.
#[derive(Clone, Debug)]
pub struct CaptionLayer {
    text: String,
    image: PreparedImage,
    x: i64,
    y: i64,
    duration_sec: f64,
}

/// Lay out and rasterize `style`, placing its box at (`x`, `y_px`) for `duration_sec`.
#[tracing::instrument(skip(style, resolver), fields(font = ?style.font))]
pub fn render_caption(
    style: &CaptionStyle,
    x: HorizontalAnchor,
    y_px: i64,
    duration_sec: f64,
    canvas: Canvas,
    resolver: &FontResolver,
    assets_root: &Path,
) -> ReelResult<CaptionLayer> {
    if style.text.trim().is_empty() {
        return Err(ReelError::validation("caption text must not be empty"));
    }
    if !duration_sec.is_finite() || duration_sec <= 0.0 {
        return Err(ReelError::validation(
            "caption duration must be finite and > 0",
        ));
    }
    if style.wrap == WrapMode::Caption && style.box_width == 0 {
        return Err(ReelError::validation("caption box width must be > 0"));
    }

    let font = resolver.resolve(&style.font, assets_root)?;
    let brush = TextBrushRgba8 {
        r: style.color.r,
        g: style.color.g,
        b: style.color.b,
        a: style.color.a,
    };

    let mut engine = TextLayoutEngine::new();
    let mut raster = CpuRasterizer::new();
    let image = match style.wrap {
        WrapMode::Caption => {
            let layout = engine.layout_plain(
                &style.text,
                &font,
                style.size_px,
                brush,
                Some(style.box_width as f32),
            )?;
            raster.rasterize_text(&layout, &font, style.box_width, true)?
        }
        WrapMode::Label => {
            let layout = engine.layout_plain(&style.text, &font, style.size_px, brush, None)?;
            let width = (layout.width().ceil() as u32).max(1);
            raster.rasterize_text(&layout, &font, width, false)?
        }
    };

    let x = match x {
        HorizontalAnchor::Center => (i64::from(canvas.width) - i64::from(image.width)) / 2,
        HorizontalAnchor::Left(px) => px,
    };
    tracing::info!(
        family = %font.family,
        width = image.width,
        height = image.height,
        x,
        y = y_px,
        "caption rasterized"
    );

    Ok(CaptionLayer {
        text: style.text.clone(),
        image,
        x,
        y: y_px,
        duration_sec,
    })
}

impl CaptionLayer {
    /// Build a caption from an already rasterized image.
    pub fn from_image(
        text: impl Into<String>,
        image: PreparedImage,
        x: i64,
        y: i64,
        duration_sec: f64,
    ) -> Self {
        Self {
            text: text.into(),
            image,
            x,
            y,
            duration_sec,
        }
    }

    /// Source text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Top-left corner of the text box in canvas pixels.
    pub fn position(&self) -> (i64, i64) {
        (self.x, self.y)
    }

    /// Rasterized box size `(width, height)`.
    pub fn size(&self) -> (u32, u32) {
        (self.image.width, self.image.height)
    }

    /// Clip length in seconds.
    pub fn duration_sec(&self) -> f64 {
        self.duration_sec
    }

    /// Whether the clip covers clip-local time `t`.
    pub fn is_active_at(&self, t: f64) -> bool {
        (0.0..self.duration_sec).contains(&t)
    }

    pub(crate) fn draw_into(&self, dst: &mut FrameRGBA) -> ReelResult<()> {
        blit_premul_over(
            &mut dst.data,
            dst.width,
            dst.height,
            &self.image.rgba8_premul,
            self.image.width,
            self.image.height,
            self.x,
            self.y,
            1.0,
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layers/caption.rs"]
mod tests;
