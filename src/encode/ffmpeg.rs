use std::io::Read;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;

use crate::encode::sink::{
    EncodedClip, Recorder, RecorderConfig, check_frame, flatten_premul_over_bg_to_opaque_rgba8,
};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{ClipError, ClipResult};
use crate::render::backend::FrameRGBA;

pub const MP4_MIME: &str = "video/mp4";

type Drain = JoinHandle<std::io::Result<Vec<u8>>>;

/// Recorder that spawns the system `ffmpeg`, streams raw frames to stdin and collects a
/// fragmented MP4 from stdout.
#[derive(Default)]
pub struct FfmpegRecorder {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout_drain: Option<Drain>,
    stderr_drain: Option<Drain>,

    scratch: Vec<u8>,
    cfg: Option<RecorderConfig>,
    last_idx: Option<FrameIndex>,
}

impl FfmpegRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    fn release(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        for handle in [self.stdout_drain.take(), self.stderr_drain.take()]
            .into_iter()
            .flatten()
        {
            let _ = handle.join();
        }
        self.scratch = Vec::new();
        self.cfg = None;
        self.last_idx = None;
    }
}

impl Recorder for FfmpegRecorder {
    fn begin(&mut self, cfg: RecorderConfig) -> ClipResult<()> {
        if cfg.fps.num == 0 || cfg.fps.den == 0 {
            return Err(ClipError::validation("fps must be non-zero"));
        }
        if cfg.width == 0 || cfg.height == 0 {
            return Err(ClipError::validation(
                "ffmpeg recorder width/height must be non-zero",
            ));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(ClipError::validation(
                "ffmpeg recorder width/height must be even (required for yuv420p output)",
            ));
        }
        if self.child.is_some() {
            return Err(ClipError::capture("ffmpeg recorder already started"));
        }

        if !is_ffmpeg_on_path() {
            return Err(ClipError::unsupported(
                "ffmpeg is required for video capture, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Frames are flattened to opaque RGBA before they reach stdin (push_frame).
        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
        ]);
        push_input_fps(&mut cmd, cfg.fps);
        cmd.args(["-i", "pipe:0"]);

        // stdout is not seekable: fragmented MP4 keeps the moov atom up front.
        cmd.args([
            "-an",
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "frag_keyframe+empty_moov+default_base_moof",
            "-f",
            "mp4",
            "pipe:1",
        ]);

        let mut child = cmd.spawn().map_err(|e| {
            ClipError::unsupported(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (Some(stdin), Some(stdout), Some(stderr)) = (stdin, stdout, stderr) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ClipError::capture("failed to open ffmpeg pipes (unexpected)"));
        };

        self.stdout_drain = Some(drain(stdout));
        self.stderr_drain = Some(drain(stderr));
        self.scratch = vec![0u8; (cfg.width as usize) * (cfg.height as usize) * 4];
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.cfg = Some(cfg);
        self.last_idx = None;
        tracing::debug!(width = cfg.width, height = cfg.height, "ffmpeg session started");
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ClipResult<()> {
        let cfg = self
            .cfg
            .ok_or_else(|| ClipError::capture("ffmpeg recorder not started"))?;
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(ClipError::capture(
                "ffmpeg recorder received out-of-order frame index",
            ));
        }
        self.last_idx = Some(idx);
        check_frame(&cfg, frame)?;

        let bg = cfg.background;
        flatten_premul_over_bg_to_opaque_rgba8(&mut self.scratch, &frame.data, [bg.r, bg.g, bg.b, 255])?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(ClipError::capture("ffmpeg recorder is already finalized"));
        };

        use std::io::Write as _;
        stdin.write_all(&self.scratch).map_err(|e| {
            ClipError::capture(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    fn finish(&mut self) -> ClipResult<EncodedClip> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| ClipError::capture("ffmpeg recorder not started"))?;

        let status = child
            .wait()
            .map_err(|e| ClipError::capture(format!("failed to wait for ffmpeg to finish: {e}")));
        let stdout = join_drain(self.stdout_drain.take(), "stdout");
        let stderr = join_drain(self.stderr_drain.take(), "stderr");
        self.release();

        let status = status?;
        let stdout = stdout?;
        if !status.success() {
            let stderr = stderr.unwrap_or_default();
            return Err(ClipError::capture(format!(
                "ffmpeg exited with status {}: {}",
                status,
                String::from_utf8_lossy(&stderr).trim()
            )));
        }
        if stdout.is_empty() {
            return Err(ClipError::capture("ffmpeg produced no output"));
        }

        Ok(EncodedClip {
            bytes: stdout,
            mime: MP4_MIME,
            extension: "mp4",
        })
    }

    fn abort(&mut self) {
        if self.child.is_some() {
            tracing::debug!("aborting ffmpeg session");
        }
        self.release();
    }
}

impl Drop for FfmpegRecorder {
    fn drop(&mut self) {
        self.release();
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> Drain {
    std::thread::spawn(move || {
        let mut bytes = Vec::new();
        pipe.read_to_end(&mut bytes)?;
        Ok(bytes)
    })
}

fn join_drain(handle: Option<Drain>, name: &str) -> ClipResult<Vec<u8>> {
    match handle {
        Some(handle) => handle
            .join()
            .map_err(|_| ClipError::capture(format!("ffmpeg {name} drain thread panicked")))?
            .map_err(|e| ClipError::capture(format!("ffmpeg {name} read failed: {e}"))),
        None => Ok(Vec::new()),
    }
}

fn push_input_fps(cmd: &mut Command, fps: Fps) {
    // For rawvideo input, `-r` before `-i` sets the input framerate.
    cmd.args(["-r", &format!("{}/{}", fps.num, fps.den)]);
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
