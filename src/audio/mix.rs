use std::path::Path;

use crate::assets::media::AudioPcm;
use crate::foundation::core::Fps;
use crate::foundation::error::{ReelError, ReelResult};

/// How an audio track is reconciled with a visual timeline of a different length.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioFit {
    /// Cut audio at the visual end; silence after shorter audio.
    #[default]
    Trim,
    /// Repeat the source until the visual end, then cut.
    Loop,
    /// Pad shorter audio with silence; longer audio is rejected.
    Pad,
}

/// Parameters for laying a track onto the output timeline.
#[derive(Clone, Copy, Debug)]
pub(crate) struct AudioMixOpts {
    pub(crate) sample_rate: u32,
    pub(crate) channels: u16,
    pub(crate) total_samples: u64,
    pub(crate) fit: AudioFit,
    pub(crate) fade_out_sec: f64,
}

/// Mix `src` into an interleaved buffer of exactly `opts.total_samples` sample frames.
///
/// The source is resampled linearly when its rate differs from the output rate. Output is clamped
/// to `[-1, 1]`.
pub(crate) fn mix_to_timeline(src: &AudioPcm, opts: AudioMixOpts) -> ReelResult<Vec<f32>> {
    if opts.sample_rate == 0 || opts.channels == 0 {
        return Err(ReelError::validation(
            "audio mix sample_rate and channels must be non-zero",
        ));
    }
    if src.channels == 0 || src.sample_rate == 0 {
        return Err(ReelError::validation(
            "audio source sample_rate and channels must be non-zero",
        ));
    }
    let out_channels = usize::from(opts.channels);
    let out_len = usize::try_from(opts.total_samples)
        .ok()
        .and_then(|n| n.checked_mul(out_channels))
        .ok_or_else(|| ReelError::validation("audio mix length overflows usize"))?;
    let mut out = Vec::new();
    out.try_reserve_exact(out_len).map_err(|e| {
        ReelError::validation(format!("cannot allocate {out_len} audio samples: {e}"))
    })?;
    out.resize(out_len, 0.0f32);

    let src_frames = src.frames();
    if src_frames == 0 || opts.total_samples == 0 {
        return Ok(out);
    }

    let timeline_sec = opts.total_samples as f64 / f64::from(opts.sample_rate);
    let src_sec = src.duration_secs();
    if opts.fit == AudioFit::Pad && src_sec > timeline_sec + 1.0 / f64::from(opts.sample_rate) {
        return Err(ReelError::validation(format!(
            "audio track is {src_sec:.3}s but the timeline is {timeline_sec:.3}s; \
             use the `trim` or `loop` fit to shorten it"
        )));
    }

    let data = src.interleaved_f32.as_slice();
    let src_channels = usize::from(src.channels);
    let rate_ratio = f64::from(src.sample_rate) / f64::from(opts.sample_rate);

    for dst_sample in 0..opts.total_samples {
        let mut src_pos = dst_sample as f64 * rate_ratio;
        if opts.fit == AudioFit::Loop {
            src_pos %= src_frames as f64;
        }
        let src_frame0 = src_pos.floor() as usize;
        if src_frame0 >= src_frames {
            break;
        }
        let src_frame1 = if opts.fit == AudioFit::Loop {
            (src_frame0 + 1) % src_frames
        } else {
            (src_frame0 + 1).min(src_frames - 1)
        };
        let frac = (src_pos - src_frame0 as f64) as f32;

        let gain = fade_out_gain(dst_sample, opts);
        let dst_idx = dst_sample as usize * out_channels;
        let i0 = src_frame0 * src_channels;
        let i1 = src_frame1 * src_channels;
        for c in 0..out_channels {
            let sc = c.min(src_channels - 1);
            let v0 = data[i0 + sc];
            let v1 = data[i1 + sc];
            out[dst_idx + c] = ((v0 + (v1 - v0) * frac) * gain).clamp(-1.0, 1.0);
        }
    }
    Ok(out)
}

fn fade_out_gain(dst_sample: u64, opts: AudioMixOpts) -> f32 {
    if opts.fade_out_sec <= 0.0 {
        return 1.0;
    }
    let rem_samples = opts.total_samples.saturating_sub(dst_sample + 1);
    let rem_sec = rem_samples as f64 / f64::from(opts.sample_rate);
    (rem_sec / opts.fade_out_sec).clamp(0.0, 1.0) as f32
}

/// Write interleaved `f32` PCM samples to raw little-endian `.f32le` file.
pub(crate) fn write_mix_to_f32le_file(samples_interleaved: &[f32], out_path: &Path) -> ReelResult<()> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ReelError::encode(format!(
                "failed to create audio mix output directory '{}': {e}",
                parent.display()
            ))
        })?;
    }

    let mut bytes = Vec::<u8>::with_capacity(samples_interleaved.len() * 4);
    for &sample in samples_interleaved {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    std::fs::write(out_path, bytes).map_err(|e| {
        ReelError::encode(format!(
            "failed to write mixed audio file '{}': {e}",
            out_path.display()
        ))
    })
}

/// Convert a frame count to the nearest sample index at `sample_rate`.
pub(crate) fn frame_to_sample(frames: u64, fps: Fps, sample_rate: u32) -> u64 {
    let num = u128::from(frames) * u128::from(sample_rate) * u128::from(fps.den);
    let den = u128::from(fps.num);
    ((num + (den / 2)) / den) as u64
}

#[cfg(test)]
#[path = "../../tests/unit/audio/mix.rs"]
mod tests;
