use std::path::{Path, PathBuf};

use crate::assets::media::{AudioPcm, MIX_SAMPLE_RATE, MediaDecoder};
use crate::foundation::error::{ReelError, ReelResult};

/// Decoded audio with its gain already applied.
#[derive(Clone, Debug)]
pub struct AudioTrack {
    /// File the samples came from.
    pub source_path: PathBuf,
    /// Linear gain applied at load time.
    pub gain: f32,
    /// Gained PCM at [`MIX_SAMPLE_RATE`].
    pub pcm: AudioPcm,
}

impl AudioTrack {
    /// Native duration of the track in seconds.
    pub fn duration_sec(&self) -> f64 {
        self.pcm.duration_secs()
    }

    /// Largest absolute sample value.
    pub fn peak(&self) -> f32 {
        self.pcm.peak()
    }
}

/// Decode `path` to stereo PCM and scale every sample by `gain`.
#[tracing::instrument(skip(decoder), fields(path = %path.display()))]
pub fn load_audio(decoder: &mut dyn MediaDecoder, path: &Path, gain: f32) -> ReelResult<AudioTrack> {
    if !gain.is_finite() || gain < 0.0 {
        return Err(ReelError::validation(format!(
            "audio gain must be finite and >= 0, got {gain}"
        )));
    }

    let mut pcm = decoder.decode_audio(path, MIX_SAMPLE_RATE)?;
    for s in &mut pcm.interleaved_f32 {
        *s *= gain;
    }
    tracing::info!(
        duration_sec = pcm.duration_secs(),
        sample_rate = pcm.sample_rate,
        channels = pcm.channels,
        gain,
        "audio loaded"
    );

    Ok(AudioTrack {
        source_path: path.to_path_buf(),
        gain,
        pcm,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/layers/audio.rs"]
mod tests;
