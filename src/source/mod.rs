//! # Raw Source Module
//!
//! Supplies one raw telemetry buffer per input file.
//!
//! This module handles:
//! - Reading raw metadata dumps
//! - Extracting the metadata track from video files with ffprobe/ffmpeg

pub mod ffmpeg;

use async_trait::async_trait;
use std::path::Path;
use tracing::debug;

use crate::error::Result;

pub use ffmpeg::FfmpegSource;

/// Trait for raw telemetry sources
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RawSource: Send + Sync {
    /// Read the complete telemetry byte stream for one input
    async fn read_telemetry(&self, path: &Path) -> Result<Vec<u8>>;
}

/// Reads files that already contain the raw metadata stream
#[derive(Debug, Default, Clone, Copy)]
pub struct BinaryDumpSource;

#[async_trait]
impl RawSource for BinaryDumpSource {
    async fn read_telemetry(&self, path: &Path) -> Result<Vec<u8>> {
        let data = tokio::fs::read(path).await?;
        debug!("Read {} bytes from {}", data.len(), path.display());
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_binary_dump_source_reads_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[1, 2, 3, 4]).unwrap();
        file.flush().unwrap();

        let data = BinaryDumpSource.read_telemetry(file.path()).await.unwrap();
        assert_eq!(data, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_binary_dump_source_missing_file() {
        let result = tokio_test::block_on(
            BinaryDumpSource.read_telemetry(Path::new("/nonexistent/telemetry.bin")),
        );
        assert!(matches!(result, Err(crate::error::TrackError::Io(_))));
    }
}
