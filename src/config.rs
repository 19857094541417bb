//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::Deserialize;
use serde::de::Error;
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::output::OutputFormat;
use crate::track::GpsOptions;

/// Main configuration structure
#[derive(Debug, Default, Deserialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub gps: GpsConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// External tool configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ToolsConfig {
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,

    #[serde(default = "default_ffprobe")]
    pub ffprobe: String,
}

/// GPS reconstruction configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct GpsConfig {
    #[serde(default)]
    pub skip_bad_fix: bool,

    #[serde(default = "default_sample_rate_hz")]
    pub sample_rate_hz: f64,
}

/// Output configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct OutputConfig {
    #[serde(default = "default_formats")]
    pub formats: Vec<OutputFormat>,

    #[serde(default)]
    pub dump_binary: bool,
}

// Default value functions
fn default_ffmpeg() -> String { "ffmpeg".to_string() }
fn default_ffprobe() -> String { "ffprobe".to_string() }

fn default_sample_rate_hz() -> f64 { crate::track::builder::DEFAULT_GPS_SAMPLE_RATE_HZ }

fn default_formats() -> Vec<OutputFormat> { vec![OutputFormat::Gpx, OutputFormat::Kml] }

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
            ffprobe: default_ffprobe(),
        }
    }
}

impl Default for GpsConfig {
    fn default() -> Self {
        Self {
            skip_bad_fix: false,
            sample_rate_hz: default_sample_rate_hz(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            formats: default_formats(),
            dump_binary: false,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tcf_track::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration text
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Options for the GPS point builder
    pub fn gps_options(&self) -> GpsOptions {
        GpsOptions {
            skip_bad_fix: self.gps.skip_bad_fix,
            sample_rate_hz: self.gps.sample_rate_hz,
        }
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.tools.ffmpeg.is_empty() {
            return Err(crate::error::TrackError::Config(
                toml::de::Error::custom("tools.ffmpeg cannot be empty")
            ));
        }

        if self.tools.ffprobe.is_empty() {
            return Err(crate::error::TrackError::Config(
                toml::de::Error::custom("tools.ffprobe cannot be empty")
            ));
        }

        if !(self.gps.sample_rate_hz > 0.0 && self.gps.sample_rate_hz <= 1000.0) {
            return Err(crate::error::TrackError::Config(
                toml::de::Error::custom("sample_rate_hz must be greater than 0 and at most 1000")
            ));
        }

        if self.output.formats.is_empty() {
            return Err(crate::error::TrackError::Config(
                toml::de::Error::custom("output.formats cannot be empty")
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.gps_options(), GpsOptions::default());
    }

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[tools]
ffmpeg = "/opt/ffmpeg/bin/ffmpeg"

[gps]
skip_bad_fix = true

[output]
formats = ["gpx", "csv"]
dump_binary = true
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.tools.ffmpeg, "/opt/ffmpeg/bin/ffmpeg");
        assert_eq!(config.tools.ffprobe, "ffprobe");
        assert!(config.gps.skip_bad_fix);
        assert_eq!(config.gps.sample_rate_hz, 18.0);
        assert_eq!(config.output.formats, vec![OutputFormat::Gpx, OutputFormat::Csv]);
        assert!(config.output.dump_binary);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            Config::load("/nonexistent/tcf-track.toml"),
            Err(crate::error::TrackError::Io(_))
        ));
    }

    #[test]
    fn test_empty_ffmpeg() {
        let mut config = Config::default();
        config.tools.ffmpeg = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_ffprobe() {
        let mut config = Config::default();
        config.tools.ffprobe = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sample_rate_zero() {
        let mut config = Config::default();
        config.gps.sample_rate_hz = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sample_rate_too_high() {
        let mut config = Config::default();
        config.gps.sample_rate_hz = 1000.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sample_rate_nan() {
        let mut config = Config::default();
        config.gps.sample_rate_hz = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_formats() {
        assert!(Config::parse("[output]\nformats = []\n").is_err());
    }

    #[test]
    fn test_unknown_format() {
        assert!(matches!(
            Config::parse("[output]\nformats = [\"shp\"]\n"),
            Err(crate::error::TrackError::Config(_))
        ));
    }

    #[test]
    fn test_default_functions() {
        assert_eq!(default_ffmpeg(), "ffmpeg");
        assert_eq!(default_ffprobe(), "ffprobe");
        assert_eq!(default_sample_rate_hz(), 18.0);
        assert_eq!(default_formats(), vec![OutputFormat::Gpx, OutputFormat::Kml]);
    }
}
