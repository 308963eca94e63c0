//! Reel configuration.
//!
//! Every field defaults to the values of the stock birthday reel, so an empty JSON object
//! (or no config file at all) renders that video.

use std::path::Path;

use crate::animation::fade::FadeIn;
use crate::animation::motion::Motion;
use crate::assets::color::TextColor;
use crate::assets::fonts::FontSource;
use crate::assets::store::normalize_rel_path;
use crate::audio::mix::AudioFit;
use crate::encode::ffmpeg::FfmpegSinkOpts;
use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{ReelError, ReelResult};
use crate::layers::background::TimeWindow;
use crate::layers::caption::{CaptionStyle, HorizontalAnchor, WrapMode};
use crate::layers::overlay::OverlayAnimation;

/// Longest timeline a reel may describe, in seconds.
pub const MAX_TIMELINE_SEC: f64 = 3600.0;

/// Complete description of one reel.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReelConfig {
    /// Output frame size.
    pub canvas: Canvas,
    /// Output frame rate.
    pub fps: Fps,
    /// Encoder settings and output path.
    pub output: FfmpegSinkOpts,
    /// Background video.
    pub background: BackgroundConfig,
    /// Music track.
    pub audio: AudioConfig,
    /// Animated overlay image.
    pub overlay: OverlayConfig,
    /// Caption text.
    pub caption: CaptionConfig,
}

/// Background video source and window.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackgroundConfig {
    /// Path relative to the assets root.
    pub source: String,
    /// Source window to play.
    pub window: TimeWindow,
}

/// Music track source and mixing.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AudioConfig {
    /// Path relative to the assets root.
    pub source: String,
    /// Linear gain.
    pub gain: f32,
    /// Length reconciliation with the visual timeline.
    pub fit: AudioFit,
    /// Fade-out length at the end of the timeline, in seconds.
    pub fade_out_sec: f64,
}

/// Overlay image source and animation.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OverlayConfig {
    /// Path relative to the assets root.
    pub source: String,
    /// Display height in pixels; width follows the aspect ratio.
    pub height_px: u32,
    /// Position, rotation, duration and fade.
    pub animation: OverlayAnimation,
}

/// Caption text, style and placement.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptionConfig {
    /// UTF-8 text.
    pub text: String,
    /// Font family or file.
    pub font: FontSource,
    /// Extra font directories, relative to the assets root; missing ones are skipped.
    pub font_dirs: Vec<String>,
    /// Font size in pixels.
    pub size_px: f32,
    /// Fill color.
    pub color: TextColor,
    /// Wrap box width in pixels.
    pub box_width: u32,
    /// Line breaking mode.
    pub wrap: WrapMode,
    /// Horizontal placement.
    pub x: HorizontalAnchor,
    /// Top edge in pixels.
    pub y_px: i64,
    /// Clip length in seconds.
    pub duration_sec: f64,
}

impl Default for ReelConfig {
    fn default() -> Self {
        Self {
            canvas: Canvas {
                width: 1080,
                height: 1920,
            },
            fps: Fps { num: 25, den: 1 },
            output: FfmpegSinkOpts::default(),
            background: BackgroundConfig::default(),
            audio: AudioConfig::default(),
            overlay: OverlayConfig::default(),
            caption: CaptionConfig::default(),
        }
    }
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            source: "assets/happy_birthday_full.mp4".to_string(),
            window: TimeWindow {
                start_sec: 0.0,
                end_sec: 20.0,
            },
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            source: "assets/happy_birthday.mp3".to_string(),
            gain: 0.8,
            fit: AudioFit::Trim,
            fade_out_sec: 0.0,
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            source: "assets/baby.png".to_string(),
            height_px: 600,
            animation: OverlayAnimation {
                y: Motion::sine(900.0, 20.0, 0.5),
                angle_deg: Motion::sine(0.0, 3.0, 0.8),
                duration_sec: 20.0,
                fade_in: FadeIn::linear(1.0),
            },
        }
    }
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            text: "🎂 Happy 10th Birthday, Dashenka! 💖".to_string(),
            font: FontSource::from_face_name("Arial-Bold"),
            font_dirs: vec!["fonts".to_string()],
            size_px: 72.0,
            color: TextColor::WHITE,
            box_width: 1080,
            wrap: WrapMode::Caption,
            x: HorizontalAnchor::Center,
            y_px: 150,
            duration_sec: 20.0,
        }
    }
}

impl CaptionConfig {
    /// Text and font part of the caption.
    pub fn style(&self) -> CaptionStyle {
        CaptionStyle {
            text: self.text.clone(),
            font: self.font.clone(),
            size_px: self.size_px,
            color: self.color,
            box_width: self.box_width,
            wrap: self.wrap,
        }
    }
}

impl ReelConfig {
    /// Load and validate a JSON config file.
    pub fn from_path(path: &Path) -> ReelResult<Self> {
        use anyhow::Context as _;
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config '{}'", path.display()))?;
        let cfg = Self::from_json(&text)
            .map_err(|e| ReelError::validation(format!("{}: {e}", path.display())))?;
        Ok(cfg)
    }

    /// Parse and validate a JSON config.
    pub fn from_json(text: &str) -> ReelResult<Self> {
        let cfg: Self = serde_json::from_str(text)
            .map_err(|e| ReelError::validation(format!("invalid config json: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Pretty JSON form.
    pub fn to_json_pretty(&self) -> ReelResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ReelError::Other(anyhow::anyhow!("failed to serialize config: {e}")))
    }

    /// Visual timeline length in frames.
    pub fn duration_frames(&self) -> u64 {
        self.fps.secs_to_frames_round(self.background.window.duration_sec())
    }

    /// Check every value before any asset is touched.
    pub fn validate(&self) -> ReelResult<()> {
        let Canvas { width, height } = self.canvas;
        if width == 0 || height == 0 {
            return Err(ReelError::validation("canvas width/height must be > 0"));
        }
        if width > u32::from(u16::MAX) || height > u32::from(u16::MAX) {
            return Err(ReelError::validation(format!(
                "canvas {width}x{height} exceeds {} pixels per side",
                u16::MAX
            )));
        }
        if self.output.pix_fmt == "yuv420p"
            && (!width.is_multiple_of(2) || !height.is_multiple_of(2))
        {
            return Err(ReelError::validation(format!(
                "canvas {width}x{height} must have even dimensions for yuv420p output"
            )));
        }
        Fps::new(self.fps.num, self.fps.den)?;
        if self.output.out_path.as_os_str().is_empty() {
            return Err(ReelError::validation("output path must not be empty"));
        }

        normalize_rel_path(&self.background.source)?;
        self.background.window.validate()?;
        if self.background.window.duration_sec() > MAX_TIMELINE_SEC {
            return Err(ReelError::validation(format!(
                "background window lasts {}s; reels are limited to {MAX_TIMELINE_SEC}s",
                self.background.window.duration_sec()
            )));
        }
        let frames = self.duration_frames();
        if frames == 0 {
            return Err(ReelError::validation(
                "background window is shorter than one frame",
            ));
        }
        let timeline_sec = self.fps.frames_to_secs(frames);

        normalize_rel_path(&self.audio.source)?;
        if !self.audio.gain.is_finite() || self.audio.gain < 0.0 {
            return Err(ReelError::validation("audio gain must be finite and >= 0"));
        }
        if !self.audio.fade_out_sec.is_finite()
            || self.audio.fade_out_sec < 0.0
            || self.audio.fade_out_sec > timeline_sec
        {
            return Err(ReelError::validation(format!(
                "audio fade_out_sec must be within [0, {timeline_sec}]"
            )));
        }

        normalize_rel_path(&self.overlay.source)?;
        if self.overlay.height_px == 0 {
            return Err(ReelError::validation("overlay height_px must be > 0"));
        }
        self.overlay.animation.validate()?;
        self.same_length("overlay", self.overlay.animation.duration_sec, frames)?;

        let c = &self.caption;
        if c.text.trim().is_empty() {
            return Err(ReelError::validation("caption text must not be empty"));
        }
        if !c.size_px.is_finite() || c.size_px <= 0.0 {
            return Err(ReelError::validation("caption size_px must be finite and > 0"));
        }
        if c.box_width == 0 {
            return Err(ReelError::validation("caption box_width must be > 0"));
        }
        if let FontSource::File { path, .. } = &c.font {
            normalize_rel_path(path)?;
        }
        for dir in &c.font_dirs {
            normalize_rel_path(dir)?;
        }
        if !c.duration_sec.is_finite() || c.duration_sec <= 0.0 {
            return Err(ReelError::validation(
                "caption duration must be finite and > 0",
            ));
        }
        self.same_length("caption", c.duration_sec, frames)?;
        Ok(())
    }

    fn same_length(&self, what: &str, secs: f64, frames: u64) -> ReelResult<()> {
        let layer_frames = self.fps.secs_to_frames_round(secs);
        if layer_frames != frames {
            return Err(ReelError::validation(format!(
                "{what} lasts {layer_frames} frames but the background lasts {frames}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
