use std::path::Path;

use crate::assets::fonts::FontResolver;
use crate::assets::media::MediaDecoder;
use crate::assets::store::resolve_asset_path;
use crate::compose::composite::Composite;
use crate::config::ReelConfig;
use crate::encode::sink::FrameSink;
use crate::export::{AudioExportOpts, RenderStats, export_composite};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{ReelError, ReelResult};
use crate::layers::audio::load_audio;
use crate::layers::background::load_background;
use crate::layers::caption::render_caption;
use crate::layers::overlay::animate_overlay;
use crate::render::frame::FrameRGBA;

/// System fonts plus the config's extra font directories under `assets_root`.
pub fn font_resolver_for(cfg: &ReelConfig, assets_root: &Path) -> ReelResult<FontResolver> {
    let mut fonts = FontResolver::with_system_fonts();
    for dir in &cfg.caption.font_dirs {
        fonts.load_dir(&resolve_asset_path(assets_root, dir)?);
    }
    tracing::debug!(faces = fonts.face_count(), "font database ready");
    Ok(fonts)
}

/// Load every asset and stack the layers.
///
/// Nothing is written anywhere; a missing or broken asset fails here.
#[tracing::instrument(skip(cfg, decoder, fonts), fields(root = %assets_root.display()))]
pub fn build_composite(
    cfg: &ReelConfig,
    assets_root: &Path,
    decoder: &mut dyn MediaDecoder,
    fonts: &FontResolver,
) -> ReelResult<Composite> {
    cfg.validate()?;

    tracing::info!(stage = "background", "loading");
    let background = load_background(
        decoder,
        &resolve_asset_path(assets_root, &cfg.background.source)?,
        cfg.canvas,
        cfg.fps,
        cfg.background.window,
    )?;

    tracing::info!(stage = "audio", "loading");
    let audio = load_audio(
        decoder,
        &resolve_asset_path(assets_root, &cfg.audio.source)?,
        cfg.audio.gain,
    )?;

    tracing::info!(stage = "overlay", "loading");
    let overlay = animate_overlay(
        &resolve_asset_path(assets_root, &cfg.overlay.source)?,
        cfg.canvas,
        cfg.overlay.height_px,
        cfg.overlay.animation,
    )?;

    tracing::info!(stage = "caption", "rendering");
    let caption = render_caption(
        &cfg.caption.style(),
        cfg.caption.x,
        cfg.caption.y_px,
        cfg.caption.duration_sec,
        cfg.canvas,
        fonts,
        assets_root,
    )?;

    tracing::info!(stage = "composite", "stacking layers");
    Ok(Composite::new(background, overlay, caption)?.with_audio(audio))
}

/// Run the whole reel: load, compose, export into `sink`.
#[tracing::instrument(skip(cfg, decoder, sink), fields(root = %assets_root.display()))]
pub fn run(
    cfg: &ReelConfig,
    assets_root: &Path,
    decoder: &mut dyn MediaDecoder,
    sink: &mut dyn FrameSink,
) -> ReelResult<RenderStats> {
    cfg.validate()?;
    let fonts = font_resolver_for(cfg, assets_root)?;
    let mut comp = build_composite(cfg, assets_root, decoder, &fonts)?;

    tracing::info!(stage = "export", frames = comp.duration_frames(), "encoding");
    export_composite(
        &mut comp,
        sink,
        AudioExportOpts {
            fit: cfg.audio.fit,
            fade_out_sec: cfg.audio.fade_out_sec,
        },
    )
}

/// Render frame `frame` of the reel and optionally save it as PNG, without encoding.
#[tracing::instrument(skip(cfg, decoder, fonts, out_png))]
pub fn render_preview_frame(
    cfg: &ReelConfig,
    assets_root: &Path,
    decoder: &mut dyn MediaDecoder,
    fonts: &FontResolver,
    frame: FrameIndex,
    out_png: Option<&Path>,
) -> ReelResult<FrameRGBA> {
    if frame.0 >= cfg.duration_frames() {
        return Err(ReelError::validation(format!(
            "frame {} is outside the reel ({} frames)",
            frame.0,
            cfg.duration_frames()
        )));
    }
    let mut comp = build_composite(cfg, assets_root, decoder, fonts)?;
    let out = comp.render_frame(frame)?;
    if let Some(path) = out_png {
        crate::encode::ffmpeg::ensure_parent_dir(path)?;
        out.save_png(path)?;
        tracing::info!(path = %path.display(), frame = frame.0, "preview frame written");
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../tests/unit/pipeline.rs"]
mod tests;
