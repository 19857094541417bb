//! # Output Module
//!
//! Serializes reconstructed tracks and sensor rows.
//!
//! This module handles:
//! - GPX tracks named by device
//! - KML line strings
//! - CSV point tables and sensor rows
//! - JSONL point logs

pub mod gpx;
pub mod kml;
pub mod csv;
pub mod jsonl;

use serde::Deserialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::Result;
use crate::track::GpsTrack;

pub use self::csv::{write_points_csv, write_rows_csv};
pub use gpx::render_gpx;
pub use jsonl::write_points_jsonl;
pub use kml::render_kml;

/// Output format for GPS tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Gpx,
    Kml,
    Csv,
    Jsonl,
}

impl OutputFormat {
    /// File extension, without the dot
    pub fn extension(self) -> &'static str {
        match self {
            Self::Gpx => "gpx",
            Self::Kml => "kml",
            Self::Csv => "csv",
            Self::Jsonl => "jsonl",
        }
    }
}

/// Escape text for XML element content and attributes
pub(crate) fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

/// Append `.ext` to `base` without replacing an existing extension
fn with_extension(base: &Path, ext: &str) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

/// Write `track` once per format as `<base>.<ext>`
///
/// # Returns
///
/// * `Result<Vec<PathBuf>>` - Paths written, in format order
pub fn write_track(track: &GpsTrack, base: &Path, formats: &[OutputFormat]) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(formats.len());

    for &format in formats {
        let path = with_extension(base, format.extension());
        match format {
            OutputFormat::Gpx => std::fs::write(&path, render_gpx(track))?,
            OutputFormat::Kml => std::fs::write(&path, render_kml(&track.device_name, &track.points))?,
            OutputFormat::Csv => write_points_csv(BufWriter::new(File::create(&path)?), &track.points)?,
            OutputFormat::Jsonl => write_points_jsonl(BufWriter::new(File::create(&path)?), &track.points)?,
        }
        info!("Wrote {} points to {}", track.points.len(), path.display());
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::{AcceptanceStats, GeodeticPoint};

    #[test]
    fn test_xml_escape() {
        assert_eq!(xml_escape("a<b>&\"c'"), "a&lt;b&gt;&amp;&quot;c&apos;");
        assert_eq!(xml_escape("HERO9 Black"), "HERO9 Black");
    }

    #[test]
    fn test_with_extension_keeps_existing_suffix() {
        assert_eq!(with_extension(Path::new("out/ride.v2"), "gpx"), PathBuf::from("out/ride.v2.gpx"));
    }

    #[test]
    fn test_write_track_all_formats() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("ride");
        let track = GpsTrack {
            points: vec![GeodeticPoint {
                latitude: 1.0,
                longitude: 2.0,
                altitude: 3.0,
                time: None,
                speed: 0.0,
            }],
            start_time: None,
            device_name: "HERO".to_string(),
            stats: AcceptanceStats::default(),
        };

        let formats = [OutputFormat::Gpx, OutputFormat::Kml, OutputFormat::Csv, OutputFormat::Jsonl];
        let written = write_track(&track, &base, &formats).unwrap();

        assert_eq!(written.len(), 4);
        for (path, format) in written.iter().zip(formats) {
            assert_eq!(path.extension().unwrap(), format.extension());
            assert!(std::fs::metadata(path).unwrap().len() > 0);
        }
    }

    #[test]
    fn test_output_format_deserialize() {
        #[derive(Deserialize)]
        struct Wrapper {
            formats: Vec<OutputFormat>,
        }
        let w: Wrapper = toml::from_str("formats = [\"gpx\", \"jsonl\"]").unwrap();
        assert_eq!(w.formats, vec![OutputFormat::Gpx, OutputFormat::Jsonl]);
    }
}
