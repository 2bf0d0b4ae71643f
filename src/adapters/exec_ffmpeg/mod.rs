//! FFmpeg execution adapter
//!
//! Runs encode jobs through the `ffmpeg` binary and lists the encoders it
//! was built with.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::domain::errors::*;
use crate::engine::job::EncodeJob;
use crate::ports::*;

/// Lines of engine stderr kept in an error
const STDERR_TAIL_LINES: usize = 20;

/// Synthetic source for the one-frame encoder check
const TRIAL_SOURCE: &str = "nullsrc=s=256x256:d=0.04";

/// FFmpeg-based execution adapter
pub struct FfmpegAdapter {
    binary: PathBuf,
}

impl FfmpegAdapter {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl EncodePort for FfmpegAdapter {
    async fn run(&self, job: &EncodeJob) -> Result<(), DomainError> {
        let args = job.args();
        debug!(binary = %self.binary.display(), ?args, "Running ffmpeg");
        let started = Instant::now();

        let output = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                DomainError::encoder_failure(
                    job.codec_label(),
                    format!("failed to launch {}: {}", self.binary.display(), e),
                )
            })?;

        if output.status.success() {
            debug!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                output = %job.output().display(),
                "ffmpeg finished"
            );
            return Ok(());
        }

        let diagnostic = stderr_tail(&output.stderr);
        warn!(
            codec = job.codec_label(),
            status = %output.status,
            stderr = %diagnostic,
            "ffmpeg failed"
        );
        Err(DomainError::encoder_failure(
            job.codec_label(),
            format!("ffmpeg exited with {}: {}", output.status, diagnostic),
        ))
    }
}

#[async_trait]
impl EncoderCatalogPort for FfmpegAdapter {
    async fn video_encoders(&self) -> Result<Vec<String>, DomainError> {
        let output = Command::new(&self.binary)
            .args(["-hide_banner", "-encoders"])
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| DomainError::ProbeFailure(format!("Failed to list encoders: {}", e)))?;

        if !output.status.success() {
            return Err(DomainError::ProbeFailure(format!(
                "Failed to list encoders: {}",
                stderr_tail(&output.stderr)
            )));
        }
        Ok(parse_encoder_list(&String::from_utf8_lossy(&output.stdout)))
    }

    async fn try_encode(&self, codec: &str) -> Result<(), DomainError> {
        let output = Command::new(&self.binary)
            .args(trial_encode_args(codec))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| DomainError::encoder_failure(codec, format!("failed to launch: {}", e)))?;

        if output.status.success() {
            debug!(codec, "Trial encode succeeded");
            return Ok(());
        }
        Err(DomainError::encoder_failure(
            codec,
            format!("trial encode exited with {}: {}", output.status, stderr_tail(&output.stderr)),
        ))
    }
}

/// Arguments encoding one frame of a null source into the null muxer
fn trial_encode_args(codec: &str) -> Vec<String> {
    [
        "-hide_banner",
        "-loglevel",
        "error",
        "-f",
        "lavfi",
        "-i",
        TRIAL_SOURCE,
        "-frames:v",
        "1",
        "-c:v",
        codec,
        "-f",
        "null",
        "-",
    ]
    .iter()
    .map(|arg| arg.to_string())
    .collect()
}

/// Video encoder names from `ffmpeg -encoders` output.
///
/// Entries look like ` V....D h264_nvenc   NVIDIA NVENC H.264 encoder`; the
/// legend above the `------` separator is skipped.
fn parse_encoder_list(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .skip_while(|line| !line.trim_start().starts_with("---"))
        .skip(1)
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let flags = fields.next()?;
            let name = fields.next()?;
            flags.starts_with('V').then(|| name.to_string())
        })
        .collect()
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENCODERS: &str = "Encoders:
 V..... = Video
 A..... = Audio
 S..... = Subtitle
 .F.... = Frame-level multithreading
 ------
 V....D libx264              libx264 H.264 / AVC / MPEG-4 AVC (codec h264)
 V....D h264_nvenc           NVIDIA NVENC H.264 encoder (codec h264)
 V..... h264_qsv             H.264 / AVC / MPEG-4 AVC (Intel Quick Sync Video acceleration) (codec h264)
 A....D aac                  AAC (Advanced Audio Coding)
 S..... srt                  SubRip subtitle
";

    #[test]
    fn test_parse_encoder_list() {
        assert_eq!(
            parse_encoder_list(ENCODERS),
            vec!["libx264", "h264_nvenc", "h264_qsv"]
        );
        assert!(parse_encoder_list("").is_empty());
    }

    #[test]
    fn test_trial_encode_args() {
        let args = trial_encode_args("h264_qsv");
        let codec = args.iter().position(|a| a == "-c:v").unwrap();
        assert_eq!(args[codec + 1], "h264_qsv");
        assert!(args.contains(&TRIAL_SOURCE.to_string()));
        assert_eq!(&args[args.len() - 3..], ["-f", "null", "-"]);
    }

    #[test]
    fn test_stderr_tail_keeps_last_lines() {
        let stderr: String = (0..30).map(|i| format!("line {}\n", i)).collect();
        let tail = stderr_tail(stderr.as_bytes());
        assert!(tail.starts_with("line 10"));
        assert!(tail.ends_with("line 29"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_an_encoder_failure() {
        use crate::domain::model::EncoderProfile;
        use crate::engine::job::JobInput;
        use crate::planner::Pipeline;

        let adapter = FfmpegAdapter::new("/nonexistent/ffmpeg");
        let job = EncodeJob::encode(
            vec![JobInput::file("in.mp4")],
            Pipeline::new(false).into_graph(0),
            EncoderProfile::default_software(),
            "out.mp4",
        );
        let result = adapter.run(&job).await;
        assert!(matches!(result, Err(DomainError::EncoderFailure { ref codec, .. }) if codec == "libx264"));
    }
}
