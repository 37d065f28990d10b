//! Stream inspection via ffprobe

use crate::error::ProcessingError;
use async_trait::async_trait;
use clipdock_core::AspectClass;
use serde::Deserialize;
use std::path::Path;
use tokio::process::Command;

/// Pixel geometry of the primary video stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamGeometry {
    pub width: u32,
    pub height: u32,
}

impl StreamGeometry {
    pub fn aspect_class(&self) -> AspectClass {
        AspectClass::from_dimensions(self.width, self.height)
    }
}

/// Read-only inspection of a staged media file.
///
/// Injectable so the pipeline can be tested without external binaries.
#[async_trait]
pub trait StreamProbe: Send + Sync {
    /// Report the pixel geometry of the primary video stream of the file
    /// at `path`.
    ///
    /// A file without any dimensioned stream is an error, never a default
    /// geometry.
    async fn geometry(&self, path: &Path) -> Result<StreamGeometry, ProcessingError>;
}

/// ffprobe-backed [`StreamProbe`].
pub struct FfprobeStreamProbe {
    ffprobe_path: String,
}

impl FfprobeStreamProbe {
    pub fn new(ffprobe_path: String) -> Self {
        Self { ffprobe_path }
    }
}

#[async_trait]
impl StreamProbe for FfprobeStreamProbe {
    #[tracing::instrument(skip(self), fields(
        process.executable.path = %self.ffprobe_path,
        process.command = "ffprobe",
        ffmpeg.operation = "probe"
    ))]
    async fn geometry(&self, path: &Path) -> Result<StreamGeometry, ProcessingError> {
        let start = std::time::Instant::now();

        let output = Command::new(&self.ffprobe_path)
            .args(["-v", "error", "-print_format", "json", "-show_streams"])
            .arg(path)
            .output()
            .await
            .map_err(|e| ProcessingError::Launch {
                tool: "ffprobe",
                source: e,
            })?;

        if !output.status.success() {
            return Err(ProcessingError::ToolFailed {
                tool: "ffprobe",
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let geometry = parse_geometry(&output.stdout)?;

        tracing::info!(
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            width = geometry.width,
            height = geometry.height,
            "Stream probe completed"
        );

        Ok(geometry)
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
}

/// Extract the first dimensioned stream from ffprobe JSON.
///
/// Audio streams report no width/height and are skipped.
fn parse_geometry(stdout: &[u8]) -> Result<StreamGeometry, ProcessingError> {
    let parsed: ProbeOutput = serde_json::from_slice(stdout)
        .map_err(|e| ProcessingError::MalformedOutput(e.to_string()))?;

    parsed
        .streams
        .iter()
        .find_map(|stream| match (stream.width, stream.height) {
            (Some(width), Some(height)) => Some(StreamGeometry { width, height }),
            _ => None,
        })
        .ok_or(ProcessingError::NoVideoStream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_video_stream_dimensions() {
        let stdout = br#"{
            "streams": [
                {"index": 0, "codec_type": "video", "width": 1920, "height": 1080},
                {"index": 1, "codec_type": "audio", "sample_rate": "48000"}
            ]
        }"#;

        let geometry = parse_geometry(stdout).unwrap();
        assert_eq!(
            geometry,
            StreamGeometry {
                width: 1920,
                height: 1080
            }
        );
        assert_eq!(geometry.aspect_class(), AspectClass::Landscape);
    }

    #[test]
    fn test_skips_streams_without_dimensions() {
        let stdout = br#"{
            "streams": [
                {"index": 0, "codec_type": "audio", "sample_rate": "44100"},
                {"index": 1, "codec_type": "video", "width": 1080, "height": 1920}
            ]
        }"#;

        let geometry = parse_geometry(stdout).unwrap();
        assert_eq!(geometry.aspect_class(), AspectClass::Portrait);
    }

    #[test]
    fn test_empty_stream_list_is_an_error() {
        let result = parse_geometry(br#"{"streams": []}"#);
        assert!(matches!(result, Err(ProcessingError::NoVideoStream)));

        let result = parse_geometry(br#"{}"#);
        assert!(matches!(result, Err(ProcessingError::NoVideoStream)));
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let result = parse_geometry(b"not json at all");
        assert!(matches!(result, Err(ProcessingError::MalformedOutput(_))));
    }

    #[tokio::test]
    async fn test_missing_binary_reports_launch_failure() {
        let probe = FfprobeStreamProbe::new("/nonexistent/ffprobe".to_string());
        let result = probe.geometry(Path::new("/tmp/whatever.mp4")).await;
        assert!(matches!(
            result,
            Err(ProcessingError::Launch { tool: "ffprobe", .. })
        ));
    }
}
