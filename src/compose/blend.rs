use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::{add_sat_u8, mul_div255_u8};

pub(crate) type PremulRgba8 = [u8; 4];

/// Source-over for one premultiplied pixel, with the source scaled by `op` (0..=255).
pub(crate) fn over_px(dst: PremulRgba8, src: PremulRgba8, op: u16) -> PremulRgba8 {
    let sa = mul_div255_u8(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }
    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = add_sat_u8(sa, mul_div255_u8(u16::from(dst[3]), inv));
    for c in 0..3 {
        let sc = mul_div255_u8(u16::from(src[c]), op);
        let dc = mul_div255_u8(u16::from(dst[c]), inv);
        out[c] = add_sat_u8(sc, dc);
    }
    out
}

fn opacity_to_u8_scale(opacity: f32) -> u16 {
    ((opacity.clamp(0.0, 1.0) * 255.0).round() as i32).clamp(0, 255) as u16
}

/// Composite equal-sized premultiplied buffers: `dst = src * opacity over dst`.
pub(crate) fn premul_over_in_place_opacity(
    dst: &mut [u8],
    src: &[u8],
    opacity: f32,
) -> ReelResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(ReelError::validation(
            "premul_over_in_place_opacity expects equal-length rgba8 buffers",
        ));
    }
    let op = opacity_to_u8_scale(opacity);
    if op == 0 {
        return Ok(());
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = over_px([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], op);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Composite a smaller premultiplied image onto `dst` with its top-left corner at `(x, y)`.
///
/// Parts of `src` falling outside `dst` are clipped.
#[allow(clippy::too_many_arguments)]
pub(crate) fn blit_premul_over(
    dst: &mut [u8],
    dst_width: u32,
    dst_height: u32,
    src: &[u8],
    src_width: u32,
    src_height: u32,
    x: i64,
    y: i64,
    opacity: f32,
) -> ReelResult<()> {
    if dst.len() != (dst_width as usize) * (dst_height as usize) * 4
        || src.len() != (src_width as usize) * (src_height as usize) * 4
    {
        return Err(ReelError::validation(
            "blit_premul_over expects buffers matching width*height*4",
        ));
    }
    let op = opacity_to_u8_scale(opacity);
    if op == 0 {
        return Ok(());
    }

    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + i64::from(src_width)).min(i64::from(dst_width));
    let y1 = (y + i64::from(src_height)).min(i64::from(dst_height));
    if x0 >= x1 || y0 >= y1 {
        return Ok(());
    }

    let dst_stride = dst_width as usize * 4;
    let src_stride = src_width as usize * 4;
    let span = (x1 - x0) as usize * 4;
    for dy in y0..y1 {
        let sy = (dy - y) as usize;
        let sx = (x0 - x) as usize;
        let d_start = dy as usize * dst_stride + x0 as usize * 4;
        let s_start = sy * src_stride + sx * 4;
        let drow = &mut dst[d_start..d_start + span];
        let srow = &src[s_start..s_start + span];
        for (d, s) in drow.chunks_exact_mut(4).zip(srow.chunks_exact(4)) {
            let out = over_px([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], op);
            d.copy_from_slice(&out);
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/compose/blend.rs"]
mod tests;
