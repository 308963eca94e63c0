use std::path::PathBuf;

use crate::assets::media::MIX_SAMPLE_RATE;
use crate::audio::mix::{AudioFit, AudioMixOpts, frame_to_sample, mix_to_timeline, write_mix_to_f32le_file};
use crate::compose::composite::Composite;
use crate::encode::sink::{AudioInputConfig, FrameSink, SinkConfig};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::ReelResult;
use crate::render::frame::FrameRGBA;

const MIX_CHANNELS: u16 = 2;

/// Audio handling for [`export_composite`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AudioExportOpts {
    /// Length reconciliation with the visual timeline.
    pub fit: AudioFit,
    /// Fade-out length at the end of the timeline, in seconds.
    pub fade_out_sec: f64,
}

/// Counters reported by an export.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Frames in the timeline.
    pub frames_total: u64,
    /// Frames rendered and pushed to the sink.
    pub frames_rendered: u64,
    /// Frames that repeated the last background frame because the source ran out.
    pub background_frames_held: u64,
    /// Audio sample frames handed to the sink.
    pub audio_samples: u64,
}

/// Render every frame of `comp` into `sink`, with the composite's audio mixed to length.
///
/// On any error after the sink was started, the sink is aborted so it can discard partial output.
#[tracing::instrument(skip_all, fields(frames = comp.duration_frames()))]
pub fn export_composite(
    comp: &mut Composite,
    sink: &mut dyn FrameSink,
    audio_opts: AudioExportOpts,
) -> ReelResult<RenderStats> {
    let total = comp.duration_frames();
    let mut stats = RenderStats {
        frames_total: total,
        ..RenderStats::default()
    };

    let mut audio_tmp = TempFileGuard(None);
    let audio_cfg = match comp.audio() {
        Some(track) => {
            let total_samples = frame_to_sample(total, comp.fps(), MIX_SAMPLE_RATE);
            let mixed = mix_to_timeline(
                &track.pcm,
                AudioMixOpts {
                    sample_rate: MIX_SAMPLE_RATE,
                    channels: MIX_CHANNELS,
                    total_samples,
                    fit: audio_opts.fit,
                    fade_out_sec: audio_opts.fade_out_sec,
                },
            )?;
            let path = temp_audio_path();
            audio_tmp.0 = Some(path.clone());
            write_mix_to_f32le_file(&mixed, &path)?;
            stats.audio_samples = total_samples;
            tracing::info!(
                samples = total_samples,
                source_sec = track.duration_sec(),
                fit = ?audio_opts.fit,
                "audio mixed to timeline"
            );
            Some(AudioInputConfig {
                path,
                sample_rate: MIX_SAMPLE_RATE,
                channels: MIX_CHANNELS,
            })
        }
        None => None,
    };

    let cfg = SinkConfig {
        width: comp.canvas().width,
        height: comp.canvas().height,
        fps: comp.fps(),
        total_frames: total,
        audio: audio_cfg,
    };

    let result = (|| -> ReelResult<()> {
        sink.begin(cfg)?;
        let mut frame = FrameRGBA::transparent(comp.canvas());
        for i in 0..total {
            let idx = FrameIndex(i);
            comp.render_frame_into(idx, &mut frame)?;
            sink.push_frame(idx, &frame)?;
            stats.frames_rendered += 1;
            if i > 0 && i % 100 == 0 {
                tracing::debug!(frame = i, total, "export progress");
            }
        }
        sink.end()
    })();

    if let Err(e) = result {
        tracing::error!(error = %e, "export failed; aborting sink");
        sink.abort();
        return Err(e);
    }
    stats.background_frames_held = comp.background().held_frames();
    tracing::info!(
        frames = stats.frames_rendered,
        held = stats.background_frames_held,
        "export complete"
    );
    Ok(stats)
}

fn temp_audio_path() -> PathBuf {
    std::env::temp_dir().join(format!(
        "reelcake_audio_mix_{}_{}.f32le",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0)
    ))
}

struct TempFileGuard(Option<PathBuf>);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/export.rs"]
mod tests;
