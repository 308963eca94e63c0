//! reelcake composes a short personalized greeting video.
//!
//! A reel is a fixed stack of layers on one timeline:
//!
//! - a background video, scaled to the canvas and trimmed to a window
//! - an animated still image that bobs, rocks and fades in
//! - a caption of text
//! - a music track that replaces the background's own audio
//!
//! [`run`] loads everything described by a [`ReelConfig`], builds a [`Composite`] and streams its
//! frames into a [`FrameSink`], normally an [`FfmpegSink`] writing H.264/AAC MP4.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod foundation;

pub(crate) mod animation;
pub(crate) mod audio;
pub(crate) mod compose;
pub mod config;
pub mod encode;
pub(crate) mod export;
pub(crate) mod layers;
pub(crate) mod pipeline;
pub(crate) mod render;

#[cfg(test)]
#[path = "../tests/unit/support.rs"]
pub(crate) mod test_support;

pub use crate::foundation::core::{Affine, Canvas, Fps, FrameIndex, FrameRange, Point, Rect, Vec2};
pub use crate::foundation::error::{ReelError, ReelResult};

pub use crate::animation::fade::{FadeCurve, FadeIn};
pub use crate::animation::motion::Motion;
pub use crate::assets::color::TextColor;
pub use crate::assets::decode::{PreparedImage, decode_image, decode_image_to_height};
pub use crate::assets::fonts::{FontResolver, FontSource, ResolvedFont};
pub use crate::assets::media::{
    AudioPcm, FfmpegDecoder, MIX_SAMPLE_RATE, MediaDecoder, VideoFrameStream, VideoSourceInfo,
    VideoStreamRequest, decode_audio_f32_stereo, ffmpeg_tools_available, probe_video,
};
pub use crate::assets::store::{normalize_rel_path, resolve_asset_path};
pub use crate::audio::mix::AudioFit;
pub use crate::compose::composite::{Composite, LAYER_ORDER, LayerKind};
pub use crate::config::ReelConfig;
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
pub use crate::encode::sink::{AudioInputConfig, FrameSink, InMemorySink, SinkConfig};
pub use crate::export::{AudioExportOpts, RenderStats, export_composite};
pub use crate::layers::audio::{AudioTrack, load_audio};
pub use crate::layers::background::{BackgroundLayer, TimeWindow, load_background};
pub use crate::layers::caption::{
    CaptionLayer, CaptionStyle, HorizontalAnchor, WrapMode, render_caption,
};
pub use crate::layers::overlay::{OverlayAnimation, OverlayLayer, animate_overlay};
pub use crate::pipeline::{build_composite, font_resolver_for, render_preview_frame, run};
pub use crate::render::frame::FrameRGBA;
