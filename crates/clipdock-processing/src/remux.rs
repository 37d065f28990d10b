//! Container remuxing via ffmpeg

use crate::error::ProcessingError;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Rewrites a staged file's container without re-encoding.
///
/// Injectable so the pipeline can be tested without external binaries.
#[async_trait]
pub trait Remuxer: Send + Sync {
    /// Copy all streams from `input` into a fast-start MP4 at `output`,
    /// overwriting any existing file at `output`.
    async fn remux_faststart(&self, input: &Path, output: &Path) -> Result<(), ProcessingError>;
}

/// ffmpeg-backed [`Remuxer`].
///
/// Moves the moov atom to the front of the container so playback can start
/// before the full file downloads.
pub struct FfmpegRemuxer {
    ffmpeg_path: String,
}

impl FfmpegRemuxer {
    pub fn new(ffmpeg_path: String) -> Self {
        Self { ffmpeg_path }
    }
}

#[async_trait]
impl Remuxer for FfmpegRemuxer {
    #[tracing::instrument(skip(self), fields(
        process.executable.path = %self.ffmpeg_path,
        process.command = "ffmpeg",
        ffmpeg.operation = "remux"
    ))]
    async fn remux_faststart(&self, input: &Path, output: &Path) -> Result<(), ProcessingError> {
        let start = std::time::Instant::now();

        // -y keeps the run non-interactive when the output path exists.
        let result = Command::new(&self.ffmpeg_path)
            .arg("-y")
            .arg("-i")
            .arg(input)
            .args(["-c", "copy", "-movflags", "faststart", "-f", "mp4"])
            .arg(output)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| ProcessingError::Launch {
                tool: "ffmpeg",
                source: e,
            })?;

        if !result.status.success() {
            return Err(ProcessingError::ToolFailed {
                tool: "ffmpeg",
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        // A zero-byte output means ffmpeg exited cleanly without writing
        // anything usable; treat it the same as a missing file.
        let size = match tokio::fs::metadata(output).await {
            Ok(metadata) => metadata.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
            Err(e) => return Err(ProcessingError::Io(e)),
        };
        if size == 0 {
            return Err(ProcessingError::EmptyOutput);
        }

        tracing::info!(
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            output_bytes = size,
            "Fast-start remux completed"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_binary_reports_launch_failure() {
        let remuxer = FfmpegRemuxer::new("/nonexistent/ffmpeg".to_string());
        let dir = tempfile::tempdir().unwrap();

        let result = remuxer
            .remux_faststart(&dir.path().join("in.mp4"), &dir.path().join("out.mp4"))
            .await;

        assert!(matches!(
            result,
            Err(ProcessingError::Launch { tool: "ffmpeg", .. })
        ));
    }
}
