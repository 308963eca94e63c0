use crate::foundation::core::{Canvas, Fps, FrameIndex, FrameRange};
use crate::foundation::error::{ReelError, ReelResult};
use crate::layers::audio::AudioTrack;
use crate::layers::background::BackgroundLayer;
use crate::layers::caption::CaptionLayer;
use crate::layers::overlay::OverlayLayer;
use crate::render::cpu::{CpuRasterizer, canvas_dims_u16};
use crate::render::frame::FrameRGBA;

/// Visual layers in bottom-to-top order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayerKind {
    /// Full-canvas video.
    Background,
    /// Animated still image.
    Overlay,
    /// Rasterized text.
    Caption,
}

/// Z-order used by [`Composite::render_frame`].
pub const LAYER_ORDER: [LayerKind; 3] = [LayerKind::Background, LayerKind::Overlay, LayerKind::Caption];

/// Background, overlay and caption stacked on one timeline, plus the audio that replaces any
/// audio of the visual sources.
pub struct Composite {
    canvas: Canvas,
    fps: Fps,
    duration_frames: u64,
    background: BackgroundLayer,
    overlay: OverlayLayer,
    caption: CaptionLayer,
    audio: Option<AudioTrack>,
    raster: CpuRasterizer,
}

impl std::fmt::Debug for Composite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Composite")
            .field("canvas", &self.canvas)
            .field("fps", &self.fps)
            .field("duration_frames", &self.duration_frames)
            .field("has_audio", &self.audio.is_some())
            .finish()
    }
}

impl Composite {
    /// Stack the layers, checking they all cover the background's duration.
    pub fn new(
        background: BackgroundLayer,
        overlay: OverlayLayer,
        caption: CaptionLayer,
    ) -> ReelResult<Self> {
        let canvas = background.canvas();
        let fps = background.fps();
        canvas_dims_u16(canvas)?;
        if overlay.canvas() != canvas {
            return Err(ReelError::validation(format!(
                "overlay is placed on a {}x{} canvas but the background is {}x{}",
                overlay.canvas().width,
                overlay.canvas().height,
                canvas.width,
                canvas.height
            )));
        }

        let duration_frames = background.duration_frames();
        if duration_frames == 0 {
            return Err(ReelError::validation("composite duration must be > 0 frames"));
        }
        let overlay_frames = fps.secs_to_frames_round(overlay.duration_sec());
        if overlay_frames != duration_frames {
            return Err(ReelError::validation(format!(
                "overlay lasts {overlay_frames} frames but the background lasts {duration_frames}"
            )));
        }
        let caption_frames = fps.secs_to_frames_round(caption.duration_sec());
        if caption_frames != duration_frames {
            return Err(ReelError::validation(format!(
                "caption lasts {caption_frames} frames but the background lasts {duration_frames}"
            )));
        }

        Ok(Self {
            canvas,
            fps,
            duration_frames,
            background,
            overlay,
            caption,
            audio: None,
            raster: CpuRasterizer::new(),
        })
    }

    /// Attach `audio`, replacing any previously attached track.
    pub fn with_audio(mut self, audio: AudioTrack) -> Self {
        self.audio = Some(audio);
        self
    }

    /// Output frame size.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Output frame rate.
    pub fn fps(&self) -> Fps {
        self.fps
    }

    /// Timeline length in frames.
    pub fn duration_frames(&self) -> u64 {
        self.duration_frames
    }

    /// Timeline length in seconds.
    pub fn duration_sec(&self) -> f64 {
        self.fps.frames_to_secs(self.duration_frames)
    }

    /// Full timeline as a frame range.
    pub fn range(&self) -> FrameRange {
        FrameRange {
            start: FrameIndex(0),
            end: FrameIndex(self.duration_frames),
        }
    }

    /// Attached audio track.
    pub fn audio(&self) -> Option<&AudioTrack> {
        self.audio.as_ref()
    }

    /// Background layer.
    pub fn background(&self) -> &BackgroundLayer {
        &self.background
    }

    /// Overlay layer.
    pub fn overlay(&self) -> &OverlayLayer {
        &self.overlay
    }

    /// Caption layer.
    pub fn caption(&self) -> &CaptionLayer {
        &self.caption
    }

    /// Layers that contribute to frame `idx`, bottom to top.
    pub fn visible_layers_at(&self, idx: FrameIndex) -> Vec<LayerKind> {
        if !self.range().contains(idx) {
            return Vec::new();
        }
        let t = self.fps.frames_to_secs(idx.0);
        LAYER_ORDER
            .into_iter()
            .filter(|kind| match kind {
                LayerKind::Background => true,
                LayerKind::Overlay => self.overlay.opacity_at(t) > 0.0,
                LayerKind::Caption => self.caption.is_active_at(t),
            })
            .collect()
    }

    /// Render frame `idx` into a new buffer.
    pub fn render_frame(&mut self, idx: FrameIndex) -> ReelResult<FrameRGBA> {
        let mut frame = FrameRGBA::transparent(self.canvas);
        self.render_frame_into(idx, &mut frame)?;
        Ok(frame)
    }

    /// Render frame `idx` into `dst`, which must be canvas-sized.
    ///
    /// Frames must be rendered in non-decreasing order because the background is streamed.
    pub fn render_frame_into(&mut self, idx: FrameIndex, dst: &mut FrameRGBA) -> ReelResult<()> {
        if dst.width != self.canvas.width || dst.height != self.canvas.height {
            return Err(ReelError::validation(format!(
                "frame buffer is {}x{}, expected {}x{}",
                dst.width, dst.height, self.canvas.width, self.canvas.height
            )));
        }
        self.background.frame_into(idx, &mut dst.data)?;
        dst.premultiplied = true;

        let t = self.fps.frames_to_secs(idx.0);
        let opacity = self.overlay.opacity_at(t);
        if opacity > 0.0 {
            let transform = self.overlay.transform_at(t);
            self.raster
                .draw_image(dst, &self.overlay.paint, transform, opacity)?;
        }
        if self.caption.is_active_at(t) {
            self.caption.draw_into(dst)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/composite.rs"]
mod tests;
