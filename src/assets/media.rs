use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};

use crate::assets::store::require_file;
use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{ReelError, ReelResult};

/// Audio sample rate used across decode, mix and encode.
pub const MIX_SAMPLE_RATE: u32 = 48_000;

#[derive(Clone, Debug)]
/// Basic metadata about a source video file.
pub struct VideoSourceInfo {
    /// Source path used for probing/decoding.
    pub source_path: PathBuf,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Container duration in seconds, when reported.
    pub duration_sec: Option<f64>,
    /// Whether the source carries at least one audio stream.
    pub has_audio: bool,
}

#[derive(Clone, Debug)]
/// Decoded interleaved floating-point PCM.
pub struct AudioPcm {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Interleaved `f32` PCM samples.
    pub interleaved_f32: Vec<f32>,
}

impl AudioPcm {
    /// Number of sample frames (one sample per channel).
    pub fn frames(&self) -> usize {
        self.interleaved_f32.len() / usize::from(self.channels.max(1))
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / f64::from(self.sample_rate.max(1))
    }

    /// Largest absolute sample value.
    pub fn peak(&self) -> f32 {
        self.interleaved_f32
            .iter()
            .fold(0.0f32, |acc, s| acc.max(s.abs()))
    }
}

/// Request for a scaled, trimmed, frame-rate-converted video stream.
#[derive(Clone, Debug)]
pub struct VideoStreamRequest {
    /// Source file.
    pub path: PathBuf,
    /// Output frame size; frames are scaled to exactly this size.
    pub canvas: Canvas,
    /// Output frame rate.
    pub fps: Fps,
    /// Source time of the first frame, in seconds.
    pub start_sec: f64,
    /// Length of the stream, in seconds.
    pub duration_sec: f64,
}

/// Sequential reader of RGBA8 frames.
pub trait VideoFrameStream {
    /// Fill `dst` (width*height*4 bytes) with the next frame.
    ///
    /// Returns `Ok(false)` once the stream is exhausted.
    fn read_frame(&mut self, dst: &mut [u8]) -> ReelResult<bool>;
}

/// Decoding backend for time-based media.
///
/// The pipeline talks to media only through this trait, so tests can substitute synthetic
/// sources for real files.
pub trait MediaDecoder {
    /// Check that `path` is a decodable video and report its metadata.
    fn probe_video(&mut self, path: &Path) -> ReelResult<VideoSourceInfo>;
    /// Open a frame stream.
    fn open_video(&mut self, req: &VideoStreamRequest) -> ReelResult<Box<dyn VideoFrameStream>>;
    /// Decode the whole audio track of `path` to interleaved stereo PCM at `sample_rate`.
    fn decode_audio(&mut self, path: &Path, sample_rate: u32) -> ReelResult<AudioPcm>;
}

/// [`MediaDecoder`] backed by the system `ffmpeg`/`ffprobe` binaries.
#[derive(Debug, Default)]
pub struct FfmpegDecoder;

impl FfmpegDecoder {
    /// Create a decoder. Tool availability is checked lazily, per call.
    pub fn new() -> Self {
        Self
    }
}

impl MediaDecoder for FfmpegDecoder {
    fn probe_video(&mut self, path: &Path) -> ReelResult<VideoSourceInfo> {
        require_file(path, "background video")?;
        probe_video(path)
    }

    fn open_video(&mut self, req: &VideoStreamRequest) -> ReelResult<Box<dyn VideoFrameStream>> {
        Ok(Box::new(FfmpegVideoStream::spawn(req)?))
    }

    fn decode_audio(&mut self, path: &Path, sample_rate: u32) -> ReelResult<AudioPcm> {
        require_file(path, "audio track")?;
        decode_audio_f32_stereo(path, sample_rate)
    }
}

/// Probe source video metadata through `ffprobe`.
pub fn probe_video(source_path: &Path) -> ReelResult<VideoSourceInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let out = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(source_path)
        .output()
        .map_err(|e| ReelError::asset(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(ReelError::asset(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| ReelError::asset(format!("ffprobe json parse failed: {e}")))?;
    let video_stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| {
            ReelError::asset(format!(
                "no video stream found in '{}'",
                source_path.display()
            ))
        })?;
    let width = video_stream
        .width
        .ok_or_else(|| ReelError::asset("missing video width from ffprobe"))?;
    let height = video_stream
        .height
        .ok_or_else(|| ReelError::asset("missing video height from ffprobe"))?;
    let has_audio = parsed
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));
    let duration_sec = parsed
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0);

    Ok(VideoSourceInfo {
        source_path: source_path.to_path_buf(),
        width,
        height,
        duration_sec,
        has_audio,
    })
}

/// Build the `ffmpeg` argument list for a [`VideoStreamRequest`].
pub(crate) fn video_stream_args(req: &VideoStreamRequest) -> Vec<String> {
    vec![
        "-v".into(),
        "error".into(),
        "-ss".into(),
        format!("{:.6}", req.start_sec),
        "-t".into(),
        format!("{:.6}", req.duration_sec),
        "-i".into(),
        req.path.to_string_lossy().into_owned(),
        "-an".into(),
        "-vf".into(),
        format!(
            "scale={}:{}:flags=bicubic,fps={}/{}",
            req.canvas.width, req.canvas.height, req.fps.num, req.fps.den
        ),
        "-f".into(),
        "rawvideo".into(),
        "-pix_fmt".into(),
        "rgba".into(),
        "pipe:1".into(),
    ]
}

/// Streaming `ffmpeg` decoder child.
///
/// The child process is killed and reaped on drop if it is still running.
pub struct FfmpegVideoStream {
    source: PathBuf,
    child: Option<Child>,
    stdout: Option<ChildStdout>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,
    frame_len: usize,
    finished: bool,
}

impl FfmpegVideoStream {
    /// Spawn `ffmpeg` for `req`.
    pub fn spawn(req: &VideoStreamRequest) -> ReelResult<Self> {
        if req.canvas.width == 0 || req.canvas.height == 0 {
            return Err(ReelError::validation(
                "video stream width/height must be non-zero",
            ));
        }
        let args = video_stream_args(req);
        tracing::debug!(args = ?args, "spawning ffmpeg video decoder");

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                ReelError::asset(format!(
                    "failed to spawn ffmpeg for video decode (is it installed and on PATH?): {e}"
                ))
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ReelError::asset("failed to open ffmpeg stdout (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| ReelError::asset("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut bytes = Vec::new();
            stderr.read_to_end(&mut bytes)?;
            Ok(bytes)
        });

        Ok(Self {
            source: req.path.clone(),
            child: Some(child),
            stdout: Some(stdout),
            stderr_drain: Some(stderr_drain),
            frame_len: req.canvas.rgba_len(),
            finished: false,
        })
    }

    fn finish(&mut self) -> ReelResult<()> {
        self.finished = true;
        drop(self.stdout.take());
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        let status = child
            .wait()
            .map_err(|e| ReelError::asset(format!("failed to wait for ffmpeg decoder: {e}")))?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| ReelError::asset("ffmpeg stderr drain thread panicked"))?
                .unwrap_or_default(),
            None => Vec::new(),
        };
        if !status.success() {
            return Err(ReelError::asset(format!(
                "ffmpeg video decode failed for '{}' ({status}): {}",
                self.source.display(),
                String::from_utf8_lossy(&stderr_bytes).trim()
            )));
        }
        Ok(())
    }
}

impl VideoFrameStream for FfmpegVideoStream {
    fn read_frame(&mut self, dst: &mut [u8]) -> ReelResult<bool> {
        if dst.len() != self.frame_len {
            return Err(ReelError::validation(format!(
                "frame buffer is {} bytes, expected {}",
                dst.len(),
                self.frame_len
            )));
        }
        if self.finished {
            return Ok(false);
        }
        let Some(stdout) = self.stdout.as_mut() else {
            return Ok(false);
        };

        let mut filled = 0usize;
        while filled < dst.len() {
            match stdout.read(&mut dst[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(ReelError::asset(format!(
                        "failed reading decoded frames from ffmpeg: {e}"
                    )));
                }
            }
        }

        if filled == dst.len() {
            return Ok(true);
        }
        self.finish()?;
        if filled != 0 {
            return Err(ReelError::asset(format!(
                "ffmpeg produced a truncated frame ({filled} of {} bytes)",
                dst.len()
            )));
        }
        Ok(false)
    }
}

impl Drop for FfmpegVideoStream {
    fn drop(&mut self) {
        drop(self.stdout.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        if let Some(handle) = self.stderr_drain.take() {
            let _ = handle.join();
        }
    }
}

/// Decode audio from a media file to stereo interleaved `f32` PCM.
pub fn decode_audio_f32_stereo(path: &Path, sample_rate: u32) -> ReelResult<AudioPcm> {
    if sample_rate == 0 {
        return Err(ReelError::validation("audio sample_rate must be non-zero"));
    }
    let out = Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(path)
        .args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            "2",
            "-ar",
            &sample_rate.to_string(),
            "pipe:1",
        ])
        .output()
        .map_err(|e| ReelError::asset(format!("failed to run ffmpeg for audio decode: {e}")))?;

    if !out.status.success() {
        return Err(ReelError::asset(format!(
            "ffmpeg audio decode failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let interleaved_f32 = f32le_bytes_to_samples(&out.stdout)?;
    if interleaved_f32.is_empty() {
        return Err(ReelError::asset(format!(
            "'{}' contains no audio samples",
            path.display()
        )));
    }

    Ok(AudioPcm {
        sample_rate,
        channels: 2,
        interleaved_f32,
    })
}

pub(crate) fn f32le_bytes_to_samples(bytes: &[u8]) -> ReelResult<Vec<f32>> {
    if !bytes.len().is_multiple_of(4) {
        return Err(ReelError::asset(
            "decoded audio byte length is not aligned to f32 samples",
        ));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Return `true` when both `ffmpeg` and `ffprobe` can be invoked from `PATH`.
pub fn ffmpeg_tools_available() -> bool {
    ["ffmpeg", "ffprobe"].iter().all(|tool| {
        Command::new(tool)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    })
}

#[cfg(test)]
#[path = "../../tests/unit/assets/media.rs"]
mod tests;
