use std::path::Path;

use crate::assets::media::{MediaDecoder, VideoFrameStream, VideoSourceInfo, VideoStreamRequest};
use crate::foundation::core::{Canvas, Fps, FrameIndex};
use crate::foundation::error::{ReelError, ReelResult};

/// Source time window `[start_sec, end_sec)`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimeWindow {
    /// Window start in source seconds.
    pub start_sec: f64,
    /// Window end in source seconds (exclusive).
    pub end_sec: f64,
}

impl TimeWindow {
    /// Window length in seconds.
    pub fn duration_sec(self) -> f64 {
        self.end_sec - self.start_sec
    }

    /// Reject non-finite, negative, or empty windows.
    pub fn validate(self) -> ReelResult<()> {
        if !self.start_sec.is_finite() || !self.end_sec.is_finite() {
            return Err(ReelError::validation("time window bounds must be finite"));
        }
        if self.start_sec < 0.0 {
            return Err(ReelError::validation("time window start must be >= 0"));
        }
        if self.end_sec <= self.start_sec {
            return Err(ReelError::validation(format!(
                "time window end ({}) must be greater than start ({})",
                self.end_sec, self.start_sec
            )));
        }
        Ok(())
    }
}

/// Background video scaled to the canvas and trimmed to a window.
///
/// Frames are decoded on demand in timeline order. When the source runs out before the window
/// does, the last decoded frame is held.
pub struct BackgroundLayer {
    source: VideoSourceInfo,
    canvas: Canvas,
    fps: Fps,
    window: TimeWindow,
    duration_frames: u64,
    stream: Box<dyn VideoFrameStream>,
    current: Vec<u8>,
    next: Vec<u8>,
    decoded: u64,
    exhausted_at: Option<u64>,
}

impl std::fmt::Debug for BackgroundLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundLayer")
            .field("source", &self.source.source_path)
            .field("canvas", &self.canvas)
            .field("fps", &self.fps)
            .field("window", &self.window)
            .field("duration_frames", &self.duration_frames)
            .field("decoded", &self.decoded)
            .finish()
    }
}

/// Open `path`, scale it to `canvas` and trim it to `window` at `fps`.
#[tracing::instrument(skip(decoder), fields(path = %path.display()))]
pub fn load_background(
    decoder: &mut dyn MediaDecoder,
    path: &Path,
    canvas: Canvas,
    fps: Fps,
    window: TimeWindow,
) -> ReelResult<BackgroundLayer> {
    window.validate()?;
    if canvas.width == 0 || canvas.height == 0 {
        return Err(ReelError::validation("canvas width/height must be non-zero"));
    }

    let source = decoder.probe_video(path)?;
    tracing::info!(
        width = source.width,
        height = source.height,
        duration_sec = ?source.duration_sec,
        "background source probed"
    );
    if let Some(d) = source.duration_sec
        && d < window.end_sec
    {
        tracing::warn!(
            source_sec = d,
            window_end_sec = window.end_sec,
            "background is shorter than the requested window; the last frame will be held"
        );
    }

    let mut stream = decoder.open_video(&VideoStreamRequest {
        path: path.to_path_buf(),
        canvas,
        fps,
        start_sec: window.start_sec,
        duration_sec: window.duration_sec(),
    })?;

    let mut current = vec![0u8; canvas.rgba_len()];
    if !stream.read_frame(&mut current)? {
        return Err(ReelError::asset(format!(
            "'{}' has no decodable frames in [{}, {}) s",
            path.display(),
            window.start_sec,
            window.end_sec
        )));
    }

    Ok(BackgroundLayer {
        source,
        canvas,
        fps,
        window,
        duration_frames: fps.secs_to_frames_round(window.duration_sec()),
        stream,
        next: vec![0u8; canvas.rgba_len()],
        current,
        decoded: 1,
        exhausted_at: None,
    })
}

impl BackgroundLayer {
    /// Probed metadata of the source file.
    pub fn source(&self) -> &VideoSourceInfo {
        &self.source
    }

    /// Output frame size.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Output frame rate.
    pub fn fps(&self) -> Fps {
        self.fps
    }

    /// Source window this layer plays.
    pub fn window(&self) -> TimeWindow {
        self.window
    }

    /// Layer duration in seconds.
    pub fn duration_sec(&self) -> f64 {
        self.window.duration_sec()
    }

    /// Layer duration in output frames.
    pub fn duration_frames(&self) -> u64 {
        self.duration_frames
    }

    /// Number of frames that repeat the last decoded source frame so far.
    pub fn held_frames(&self) -> u64 {
        match self.exhausted_at {
            Some(at) => self.decoded.saturating_sub(at),
            None => 0,
        }
    }

    /// Copy frame `idx` into `dst` (opaque RGBA8, canvas-sized).
    ///
    /// Frames must be requested in non-decreasing order; the same frame may be requested again.
    pub fn frame_into(&mut self, idx: FrameIndex, dst: &mut [u8]) -> ReelResult<()> {
        if idx.0 >= self.duration_frames {
            return Err(ReelError::validation(format!(
                "background frame {} is outside the layer ({} frames)",
                idx.0, self.duration_frames
            )));
        }
        if dst.len() != self.current.len() {
            return Err(ReelError::validation(
                "background destination must match canvas width*height*4",
            ));
        }
        if idx.0 + 1 < self.decoded {
            return Err(ReelError::validation(format!(
                "background frames must be read in order (asked for {}, already at {})",
                idx.0,
                self.decoded - 1
            )));
        }
        while self.decoded <= idx.0 {
            self.advance()?;
        }
        dst.copy_from_slice(&self.current);
        Ok(())
    }

    fn advance(&mut self) -> ReelResult<()> {
        if self.exhausted_at.is_none() {
            if self.stream.read_frame(&mut self.next)? {
                std::mem::swap(&mut self.current, &mut self.next);
            } else {
                tracing::warn!(
                    frame = self.decoded,
                    "background source ended early; holding last frame"
                );
                self.exhausted_at = Some(self.decoded);
            }
        }
        self.decoded += 1;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layers/background.rs"]
mod tests;
