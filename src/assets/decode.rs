use std::sync::Arc;

use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::premultiply_rgba8_in_place;

#[derive(Clone, Debug)]
/// Raster image in premultiplied RGBA8 form.
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

/// Decode encoded image bytes and convert to premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> ReelResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| ReelError::asset(format!("failed to decode image: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

/// Decode encoded image bytes and scale to `height` pixels, preserving aspect ratio.
///
/// Resampling happens on premultiplied pixels so transparent edges do not bleed dark fringes.
pub fn decode_image_to_height(bytes: &[u8], height: u32) -> ReelResult<PreparedImage> {
    if height == 0 {
        return Err(ReelError::validation("target image height must be > 0"));
    }
    let src = decode_image(bytes)?;
    if src.height == height {
        return Ok(src);
    }

    let width = scaled_width(src.width, src.height, height);
    let buf = image::RgbaImage::from_raw(src.width, src.height, src.rgba8_premul.to_vec())
        .ok_or_else(|| ReelError::asset("decoded image buffer does not match its dimensions"))?;
    let resized = image::imageops::resize(
        &buf,
        width,
        height,
        image::imageops::FilterType::Lanczos3,
    );

    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(resized.into_raw()),
    })
}

fn scaled_width(src_w: u32, src_h: u32, dst_h: u32) -> u32 {
    let w = (f64::from(src_w) * f64::from(dst_h) / f64::from(src_h.max(1))).round();
    (w as u32).max(1)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
