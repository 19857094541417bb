//! # FFmpeg Source
//!
//! Pulls the telemetry track out of a video container with the external
//! `ffprobe` and `ffmpeg` tools.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info};

use super::RawSource;
use crate::error::{Result, TrackError};

/// Codec tag of the metadata track
const TELEMETRY_CODEC_TAG: &str = "gpmd";

/// Handler name of the metadata track
const TELEMETRY_HANDLER: &str = "GoPro MET";

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    index: u32,

    #[serde(default)]
    codec_tag_string: String,

    #[serde(default)]
    tags: HashMap<String, String>,
}

impl ProbeStream {
    fn is_telemetry(&self) -> bool {
        self.codec_tag_string == TELEMETRY_CODEC_TAG
            || self
                .tags
                .get("handler_name")
                .is_some_and(|h| h.contains(TELEMETRY_HANDLER))
    }
}

/// Find the index of the telemetry stream in `ffprobe -print_format json` output
///
/// # Returns
///
/// * `Result<Option<u32>>` - Stream index, or `None` if there is no telemetry track
pub fn find_telemetry_stream(probe_json: &str) -> Result<Option<u32>> {
    let probe: ProbeOutput = serde_json::from_str(probe_json)?;
    Ok(probe.streams.iter().find(|s| s.is_telemetry()).map(|s| s.index))
}

/// Extracts telemetry from video files through ffprobe/ffmpeg
#[derive(Debug, Clone)]
pub struct FfmpegSource {
    ffmpeg: String,
    ffprobe: String,
}

impl FfmpegSource {
    /// Create a source using the given tool executables
    pub fn new(ffmpeg: impl Into<String>, ffprobe: impl Into<String>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    /// Build the ffprobe argument list
    fn probe_args(path: &Path) -> Vec<String> {
        vec![
            "-v".into(),
            "quiet".into(),
            "-print_format".into(),
            "json".into(),
            "-show_streams".into(),
            path.display().to_string(),
        ]
    }

    /// Build the ffmpeg argument list copying stream `index` to stdout
    fn extract_args(path: &Path, index: u32) -> Vec<String> {
        vec![
            "-y".into(),
            "-v".into(),
            "error".into(),
            "-i".into(),
            path.display().to_string(),
            "-codec".into(),
            "copy".into(),
            "-map".into(),
            format!("0:{}", index),
            "-f".into(),
            "rawvideo".into(),
            "pipe:1".into(),
        ]
    }

    async fn run(program: &str, args: &[String]) -> Result<Vec<u8>> {
        debug!("Running {} {}", program, args.join(" "));

        let output = Command::new(program)
            .args(args)
            .output()
            .await
            .map_err(|e| TrackError::Tool(format!("Failed to run {}: {}", program, e)))?;

        if !output.status.success() {
            return Err(TrackError::Tool(format!(
                "{} exited with {}: {}",
                program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl RawSource for FfmpegSource {
    async fn read_telemetry(&self, path: &Path) -> Result<Vec<u8>> {
        let probe = Self::run(&self.ffprobe, &Self::probe_args(path)).await?;
        let index = find_telemetry_stream(&String::from_utf8_lossy(&probe))?
            .ok_or_else(|| TrackError::NoTelemetryStream(path.to_path_buf()))?;

        info!("Extracting telemetry stream 0:{} from {}", index, path.display());
        let data = Self::run(&self.ffmpeg, &Self::extract_args(path, index)).await?;
        debug!("Extracted {} bytes", data.len());
        Ok(data)
    }
}
