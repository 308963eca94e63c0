use std::path::Path;

use crate::animation::fade::FadeIn;
use crate::animation::motion::Motion;
use crate::assets::decode::{PreparedImage, decode_image_to_height};
use crate::assets::store::read_asset_bytes;
use crate::foundation::core::{Affine, Canvas, Rect, Vec2};
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::cpu::ImagePaint;

/// Time-varying placement of an overlay image.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OverlayAnimation {
    /// Top edge of the bounding box, in pixels.
    pub y: Motion,
    /// Rotation in degrees; positive turns counter-clockwise on screen.
    pub angle_deg: Motion,
    /// Clip length in seconds.
    pub duration_sec: f64,
    /// Opacity ramp at the start of the clip.
    pub fade_in: FadeIn,
}

impl OverlayAnimation {
    /// Check motions are finite and the fade fits in the clip.
    pub fn validate(&self) -> ReelResult<()> {
        if !self.duration_sec.is_finite() || self.duration_sec <= 0.0 {
            return Err(ReelError::validation(
                "overlay duration must be finite and > 0",
            ));
        }
        self.y.validate("overlay y")?;
        self.angle_deg.validate("overlay angle")?;
        self.fade_in.validate(self.duration_sec)
    }
}

/// Scaled still image with its animation attached.
///
/// Horizontally the bounding box of the rotated image is centered on the canvas; vertically its
/// top edge follows `y(t)`.
pub struct OverlayLayer {
    image: PreparedImage,
    pub(crate) paint: ImagePaint,
    anim: OverlayAnimation,
    canvas: Canvas,
}

impl std::fmt::Debug for OverlayLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayLayer")
            .field("width", &self.image.width)
            .field("height", &self.image.height)
            .field("anim", &self.anim)
            .finish()
    }
}

/// Load `path`, scale it to `height_px` tall and attach `anim`.
#[tracing::instrument(skip(anim), fields(path = %path.display()))]
pub fn animate_overlay(
    path: &Path,
    canvas: Canvas,
    height_px: u32,
    anim: OverlayAnimation,
) -> ReelResult<OverlayLayer> {
    anim.validate()?;
    let bytes = read_asset_bytes(path, "overlay image")?;
    let image = decode_image_to_height(&bytes, height_px)
        .map_err(|e| ReelError::asset(format!("overlay '{}': {e}", path.display())))?;
    tracing::info!(
        width = image.width,
        height = image.height,
        "overlay image prepared"
    );
    OverlayLayer::from_image(image, canvas, anim)
}

impl OverlayLayer {
    /// Wrap an already prepared image.
    pub fn from_image(
        image: PreparedImage,
        canvas: Canvas,
        anim: OverlayAnimation,
    ) -> ReelResult<Self> {
        anim.validate()?;
        let paint = ImagePaint::from_prepared(&image)?;
        Ok(Self {
            image,
            paint,
            anim,
            canvas,
        })
    }

    /// Canvas the overlay is centered on.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Scaled image size `(width, height)`.
    pub fn image_size(&self) -> (u32, u32) {
        (self.image.width, self.image.height)
    }

    /// Animation parameters.
    pub fn animation(&self) -> &OverlayAnimation {
        &self.anim
    }

    /// Clip length in seconds.
    pub fn duration_sec(&self) -> f64 {
        self.anim.duration_sec
    }

    /// Whether the clip covers clip-local time `t`.
    pub fn is_active_at(&self, t: f64) -> bool {
        (0.0..self.anim.duration_sec).contains(&t)
    }

    /// Top edge of the bounding box at `t`.
    pub fn y_at(&self, t: f64) -> f64 {
        self.anim.y.sample(t)
    }

    /// Rotation in degrees at `t`.
    pub fn angle_deg_at(&self, t: f64) -> f64 {
        self.anim.angle_deg.sample(t)
    }

    /// Opacity at `t`; zero outside the clip.
    pub fn opacity_at(&self, t: f64) -> f32 {
        if !self.is_active_at(t) {
            return 0.0;
        }
        self.anim.fade_in.opacity_at(t)
    }

    fn rotated_extent(&self, angle_deg: f64) -> (f64, f64) {
        let (s, c) = angle_deg.to_radians().sin_cos();
        let w = f64::from(self.image.width);
        let h = f64::from(self.image.height);
        ((w * c).abs() + (h * s).abs(), (w * s).abs() + (h * c).abs())
    }

    /// Axis-aligned bounding box of the rotated image at `t`, in canvas pixels.
    pub fn bounding_box_at(&self, t: f64) -> Rect {
        let (bw, bh) = self.rotated_extent(self.angle_deg_at(t));
        let x0 = (f64::from(self.canvas.width) - bw) / 2.0;
        let y0 = self.y_at(t);
        Rect::new(x0, y0, x0 + bw, y0 + bh)
    }

    /// Map from image pixel space to canvas pixel space at `t`.
    pub fn transform_at(&self, t: f64) -> Affine {
        let angle = self.angle_deg_at(t);
        let center = self.bounding_box_at(t).center();
        let half = Vec2::new(
            f64::from(self.image.width) / 2.0,
            f64::from(self.image.height) / 2.0,
        );
        // Canvas y points down, so a visually counter-clockwise turn is a negative kurbo angle.
        Affine::translate(center.to_vec2())
            * Affine::rotate(-angle.to_radians())
            * Affine::translate(-half)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layers/overlay.rs"]
mod tests;
