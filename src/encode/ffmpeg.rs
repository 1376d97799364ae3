use crate::encode::sink::{Blob, EncodeConfig, FrameEncoder};
use crate::foundation::error::{MorphError, MorphResult};
use crate::foundation::math::mul_div255_u16;
use crate::render::backend::FrameRGBA;
use std::collections::BTreeSet;
use std::io::{Read as _, Write as _};
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;

/// Video codecs driven through the system `ffmpeg` binary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VideoCodec {
    /// H.264 in fragmented MP4.
    H264,
    /// VP9 in WebM.
    Vp9,
    /// MPEG-4 Part 2 in fragmented MP4.
    Mpeg4,
}

impl VideoCodec {
    /// `ffmpeg -c:v` encoder name.
    pub fn encoder_name(self) -> &'static str {
        match self {
            Self::H264 => "libx264",
            Self::Vp9 => "libvpx-vp9",
            Self::Mpeg4 => "mpeg4",
        }
    }

    /// `ffmpeg -f` muxer name.
    pub fn muxer(self) -> &'static str {
        match self {
            Self::H264 | Self::Mpeg4 => "mp4",
            Self::Vp9 => "webm",
        }
    }

    /// MIME type of the muxed output.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::H264 | Self::Mpeg4 => "video/mp4",
            Self::Vp9 => "video/webm",
        }
    }
}

/// Return `true` when an `ffmpeg` binary can be executed from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Names of the video encoders reported by `ffmpeg -encoders`.
pub fn probe_video_encoders() -> MorphResult<BTreeSet<String>> {
    let output = Command::new("ffmpeg")
        .args(["-hide_banner", "-encoders"])
        .stdin(Stdio::null())
        .output()
        .map_err(|e| {
            MorphError::encoder_configuration(format!(
                "failed to run ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
    if !output.status.success() {
        return Err(MorphError::encoder_configuration(format!(
            "ffmpeg -encoders exited with status {}",
            output.status
        )));
    }
    Ok(parse_video_encoders(&String::from_utf8_lossy(
        &output.stdout,
    )))
}

/// Parse the listing printed by `ffmpeg -encoders`, keeping video entries.
///
/// Entries follow a ` ------` separator and look like ` V....D libx264  description`.
pub fn parse_video_encoders(listing: &str) -> BTreeSet<String> {
    listing
        .lines()
        .skip_while(|l| !l.trim_start().starts_with("---"))
        .skip(1)
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let flags = parts.next()?;
            let name = parts.next()?;
            flags.starts_with('V').then(|| name.to_string())
        })
        .collect()
}

/// Create the parent directory of `path` if needed.
pub fn ensure_parent_dir(path: &Path) -> MorphResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// A running `ffmpeg` reading raw RGBA frames on stdin and muxing to stdout.
pub(crate) struct FfmpegProcess {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    stderr: Option<JoinHandle<String>>,
}

impl FfmpegProcess {
    pub(crate) fn spawn(cfg: &EncodeConfig, codec: VideoCodec) -> MorphResult<Self> {
        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd.args([
            "-hide_banner",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-r",
            &cfg.fps.to_string(),
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            codec.encoder_name(),
            "-pix_fmt",
            "yuv420p",
            "-b:v",
            &cfg.bitrate.to_string(),
            "-g",
            &(cfg.fps.saturating_mul(2)).to_string(),
        ]);
        if codec.muxer() == "mp4" {
            // Non-seekable output needs a fragmented MP4.
            cmd.args(["-movflags", "frag_keyframe+empty_moov+default_base_moof"]);
        }
        cmd.args(["-f", codec.muxer(), "pipe:1"]);

        tracing::debug!(
            codec = codec.encoder_name(),
            width = cfg.width,
            height = cfg.height,
            fps = cfg.fps,
            bitrate = cfg.bitrate,
            "spawning ffmpeg"
        );
        let mut child = cmd.spawn().map_err(|e| {
            MorphError::encoder_configuration(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| MorphError::encode("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| MorphError::encode("failed to open ffmpeg stdout (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| MorphError::encode("failed to open ffmpeg stderr (unexpected)"))?;

        // Both pipes are drained on threads so ffmpeg never blocks on a full pipe.
        let stdout = std::thread::spawn(move || {
            let mut buf = Vec::new();
            stdout.read_to_end(&mut buf).map(|_| buf)
        });
        let stderr = std::thread::spawn(move || {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf);
            buf
        });

        Ok(Self {
            child,
            stdin: Some(stdin),
            stdout: Some(stdout),
            stderr: Some(stderr),
        })
    }

    pub(crate) fn write(&mut self, bytes: &[u8]) -> MorphResult<()> {
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(MorphError::encode("ffmpeg encoder is already finalized"));
        };
        stdin
            .write_all(bytes)
            .map_err(|e| MorphError::encode(format!("failed to write frame to ffmpeg stdin: {e}")))
    }

    pub(crate) fn finish(mut self) -> MorphResult<Vec<u8>> {
        drop(self.stdin.take());
        let status = self
            .child
            .wait()
            .map_err(|e| MorphError::encode(format!("failed to wait for ffmpeg to finish: {e}")))?;
        let stderr = self
            .stderr
            .take()
            .and_then(|h| h.join().ok())
            .unwrap_or_default();
        let stdout = self
            .stdout
            .take()
            .ok_or_else(|| MorphError::encode("ffmpeg stdout already collected"))?
            .join()
            .map_err(|_| MorphError::encode("ffmpeg stdout reader panicked"))?
            .map_err(|e| MorphError::encode(format!("failed to read ffmpeg output: {e}")))?;

        if !status.success() {
            return Err(MorphError::encode(format!(
                "ffmpeg exited with status {status}: {}",
                stderr.trim()
            )));
        }
        Ok(stdout)
    }

    pub(crate) fn kill(mut self) {
        drop(self.stdin.take());
        if let Err(err) = self.child.kill() {
            tracing::debug!(error = %err, "ffmpeg already exited");
        }
        let _ = self.child.wait();
    }
}

/// Streaming encoder: frames are piped to `ffmpeg` as they arrive.
pub struct StreamingEncoder {
    codec: VideoCodec,
    cfg: Option<EncodeConfig>,
    process: Option<FfmpegProcess>,
    scratch: Vec<u8>,
    last_ts: Option<u64>,
}

impl StreamingEncoder {
    /// Encoder for `codec`. `ffmpeg` is spawned in [`FrameEncoder::begin`].
    pub fn new(codec: VideoCodec) -> Self {
        Self {
            codec,
            cfg: None,
            process: None,
            scratch: Vec::new(),
            last_ts: None,
        }
    }
}

impl FrameEncoder for StreamingEncoder {
    fn begin(&mut self, cfg: EncodeConfig) -> MorphResult<()> {
        cfg.validate()?;
        if let Some(old) = self.process.take() {
            old.kill();
        }
        self.process = Some(FfmpegProcess::spawn(&cfg, self.codec)?);
        self.scratch = vec![0u8; cfg.frame_len()];
        self.cfg = Some(cfg);
        self.last_ts = None;
        Ok(())
    }

    fn push_frame(&mut self, frame: &FrameRGBA, timestamp_us: u64) -> MorphResult<()> {
        let cfg = self
            .cfg
            .ok_or_else(|| MorphError::encode("push_frame called before begin"))?;
        cfg.check_frame(frame)?;
        if self.last_ts.is_some_and(|t| t >= timestamp_us) {
            return Err(MorphError::encode("timestamps must be strictly increasing"));
        }
        self.last_ts = Some(timestamp_us);

        flatten_to_opaque_rgba8(
            &mut self.scratch,
            &frame.data,
            frame.premultiplied,
            cfg.background,
        )?;
        let process = self
            .process
            .as_mut()
            .ok_or_else(|| MorphError::encode("ffmpeg encoder is already finalized"))?;
        process.write(&self.scratch)
    }

    fn finish(&mut self, progress: &mut dyn FnMut(f64)) -> MorphResult<Blob> {
        let process = self
            .process
            .take()
            .ok_or_else(|| MorphError::encode("ffmpeg encoder is already finalized"))?;
        let bytes = process.finish()?;
        progress(1.0);
        Ok(Blob::new(self.codec.mime_type(), bytes))
    }

    fn abort(&mut self) {
        if let Some(process) = self.process.take() {
            process.kill();
        }
    }
}

impl Drop for StreamingEncoder {
    fn drop(&mut self) {
        self.abort();
    }
}

/// Composite `src` over an opaque `bg_rgba` into `dst`.
pub(crate) fn flatten_to_opaque_rgba8(
    dst: &mut [u8],
    src: &[u8],
    src_is_premul: bool,
    bg_rgba: [u8; 4],
) -> MorphResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(MorphError::validation(
            "flatten_to_opaque_rgba8 expects equal-length rgba8 buffers",
        ));
    }

    let bg = [
        u16::from(bg_rgba[0]),
        u16::from(bg_rgba[1]),
        u16::from(bg_rgba[2]),
    ];

    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }
        let inv = 255 - a;
        for c in 0..3 {
            let fg = if src_is_premul {
                u16::from(s[c])
            } else {
                mul_div255_u16(u16::from(s[c]), a)
            };
            d[c] = (fg + mul_div255_u16(bg[c], inv)).min(255) as u8;
        }
        d[3] = 255;
    }

    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
