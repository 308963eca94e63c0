use std::sync::Arc;

use crate::assets::decode::PreparedImage;
use crate::assets::fonts::ResolvedFont;
use crate::assets::text::{TextBrushRgba8, line_extents};
use crate::compose::blend::premul_over_in_place_opacity;
use crate::foundation::core::{Affine, Canvas};
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::frame::FrameRGBA;

/// Image uploaded once as a `vello_cpu` paint.
#[derive(Clone)]
pub(crate) struct ImagePaint {
    pub(crate) paint: vello_cpu::Image,
    pub(crate) w: u32,
    pub(crate) h: u32,
}

impl ImagePaint {
    pub(crate) fn from_prepared(img: &PreparedImage) -> ReelResult<Self> {
        let pixmap = pixmap_from_premul_bytes(&img.rgba8_premul, img.width, img.height)?;
        Ok(Self {
            paint: vello_cpu::Image {
                image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
                sampler: vello_cpu::peniko::ImageSampler::default(),
            },
            w: img.width,
            h: img.height,
        })
    }
}

/// CPU rasterizer powered by `vello_cpu`.
///
/// Keeps one render context and one scratch pixmap alive across frames; both are rebuilt only
/// when the target size changes.
#[derive(Default)]
pub(crate) struct CpuRasterizer {
    ctx: Option<vello_cpu::RenderContext>,
    scratch: Option<vello_cpu::Pixmap>,
}

impl CpuRasterizer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn with_ctx_mut<R>(
        &mut self,
        width: u16,
        height: u16,
        f: impl FnOnce(&mut vello_cpu::RenderContext) -> ReelResult<R>,
    ) -> ReelResult<R> {
        let mut ctx = match self.ctx.take() {
            None => vello_cpu::RenderContext::new(width, height),
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            Some(_) => vello_cpu::RenderContext::new(width, height),
        };
        ctx.reset();
        let out = f(&mut ctx)?;
        self.ctx = Some(ctx);
        Ok(out)
    }

    /// Draw `image` with `transform` (image space to frame space) over `dst`.
    pub(crate) fn draw_image(
        &mut self,
        dst: &mut FrameRGBA,
        image: &ImagePaint,
        transform: Affine,
        opacity: f32,
    ) -> ReelResult<()> {
        let opacity = opacity.clamp(0.0, 1.0);
        if opacity <= 0.0 {
            return Ok(());
        }
        let (w, h) = dims_u16(dst.width, dst.height)?;

        let mut scratch = match self.scratch.take() {
            Some(p) if p.width() == w && p.height() == h => p,
            _ => vello_cpu::Pixmap::new(w, h),
        };
        scratch.data_as_u8_slice_mut().fill(0);

        let result = self.with_ctx_mut(w, h, |ctx| {
            ctx.set_transform(affine_to_cpu(transform));
            ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_paint(image.paint.clone());
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                0.0,
                f64::from(image.w),
                f64::from(image.h),
            ));
            ctx.flush();
            ctx.render_to_pixmap(&mut scratch);
            Ok(())
        });
        let composited = result.and_then(|()| {
            premul_over_in_place_opacity(&mut dst.data, scratch.data_as_u8_slice(), opacity)
        });
        self.scratch = Some(scratch);
        composited
    }

    /// Rasterize a laid-out text block into a `box_width` wide premultiplied image.
    ///
    /// Each line is shifted so its glyph extent is centered in the box when `center_lines` is
    /// set; otherwise lines start at x = 0.
    pub(crate) fn rasterize_text(
        &mut self,
        layout: &parley::Layout<TextBrushRgba8>,
        font: &ResolvedFont,
        box_width: u32,
        center_lines: bool,
    ) -> ReelResult<PreparedImage> {
        let height = (layout.height().ceil() as u32).max(1);
        let (w, h) = dims_u16(box_width, height)?;
        let font_data = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(font.bytes.as_ref().clone()),
            font.index,
        );
        let extents = line_extents(layout);

        let mut pixmap = vello_cpu::Pixmap::new(w, h);
        self.with_ctx_mut(w, h, |ctx| {
            for (line, (min_x, max_x)) in layout.lines().zip(extents) {
                let dx = if center_lines {
                    (f64::from(box_width) - f64::from(max_x - min_x)) / 2.0 - f64::from(min_x)
                } else {
                    0.0
                };
                ctx.set_transform(vello_cpu::kurbo::Affine::translate((dx, 0.0)));
                for item in line.items() {
                    let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                        continue;
                    };
                    let brush = run.style().brush;
                    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                        brush.r, brush.g, brush.b, brush.a,
                    ));
                    let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                        id: g.id,
                        x: g.x,
                        y: g.y,
                    });
                    ctx.glyph_run(&font_data)
                        .font_size(run.run().font_size())
                        .fill_glyphs(glyphs);
                }
            }
            ctx.flush();
            ctx.render_to_pixmap(&mut pixmap);
            Ok(())
        })?;

        Ok(PreparedImage {
            width: box_width,
            height,
            rgba8_premul: Arc::new(pixmap.data_as_u8_slice().to_vec()),
        })
    }
}

fn dims_u16(width: u32, height: u32) -> ReelResult<(u16, u16)> {
    let w: u16 = width
        .try_into()
        .map_err(|_| ReelError::validation("raster width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| ReelError::validation("raster height exceeds u16"))?;
    if w == 0 || h == 0 {
        return Err(ReelError::validation("raster size must be non-zero"));
    }
    Ok((w, h))
}

pub(crate) fn canvas_dims_u16(canvas: Canvas) -> ReelResult<(u16, u16)> {
    dims_u16(canvas.width, canvas.height)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn pixmap_from_premul_bytes(bytes: &[u8], width: u32, height: u32) -> ReelResult<vello_cpu::Pixmap> {
    let (w, h) = dims_u16(width, height)?;
    if bytes.len() != (width as usize) * (height as usize) * 4 {
        return Err(ReelError::validation("pixmap byte len mismatch"));
    }
    let pixels = bytes
        .chunks_exact(4)
        .map(|px| vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]]))
        .collect::<Vec<_>>();
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, true))
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
