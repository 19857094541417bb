//! # TCF Track
//!
//! Extract GPS tracks and motion telemetry from action camera metadata streams.
//!
//! This application reads the telemetry track of one or more recordings (or
//! raw metadata dumps) and writes a GPS track or a single sensor channel.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn, Level};

use tcf_track::config::Config;
use tcf_track::error::TrackError;
use tcf_track::output::{write_rows_csv, write_track, OutputFormat};
use tcf_track::pipeline::load_records;
use tcf_track::source::{BinaryDumpSource, FfmpegSource, RawSource};
use tcf_track::track::{build_gps_points, extract_channel, SensorChannel};

/// Verbosity level at which raw buffers are dumped next to the output
const DUMP_VERBOSITY: u8 = 2;

/// Command line arguments
#[derive(Debug, Parser)]
#[command(name = "tcf-track", version, about)]
struct Cli {
    /// Increase output verbosity (-v debug, -vv trace and raw dumps)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Read inputs as raw metadata dumps instead of video files
    #[arg(short, long)]
    binary: bool,

    /// Skip bad points (no GPS lock)
    #[arg(short, long)]
    skip: bool,

    /// Extract a single sensor channel to CSV instead of a GPS track
    #[arg(short = 't', long = "type", value_enum, ignore_case = true)]
    channel: Option<SensorChannel>,

    /// Configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Track output formats (overrides the configuration)
    #[arg(short, long, value_enum, num_args = 1..)]
    format: Vec<OutputFormat>,

    /// ffmpeg executable
    #[arg(long, env = "TCF_TRACK_FFMPEG")]
    ffmpeg: Option<String>,

    /// ffprobe executable
    #[arg(long, env = "TCF_TRACK_FFPROBE")]
    ffprobe: Option<String>,

    /// Video files or raw metadata dumps, processed in order
    #[arg(required = true, num_args = 1..)]
    files: Vec<PathBuf>,

    /// Output file (base name for track formats)
    #[arg(required = true)]
    output: PathBuf,
}

impl Cli {
    /// Load the configuration file, or defaults, and apply command line overrides
    fn resolve_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => Config::default(),
        };

        if self.skip {
            config.gps.skip_bad_fix = true;
        }
        if let Some(ffmpeg) = &self.ffmpeg {
            config.tools.ffmpeg = ffmpeg.clone();
        }
        if let Some(ffprobe) = &self.ffprobe {
            config.tools.ffprobe = ffprobe.clone();
        }
        if !self.format.is_empty() {
            config.output.formats = self.format.clone();
        }
        if self.verbose >= DUMP_VERBOSITY {
            config.output.dump_binary = true;
        }

        config.validate()?;
        Ok(config)
    }

    fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}

/// Main entry point for TCF Track
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Parse arguments and set up logging on stderr
///    - Load configuration and apply overrides
///
/// 2. **Loading**
///    - Read every input in order, skipping inputs that fail
///    - Optionally dump each raw buffer to `<output>.NN.bin`
///
/// 3. **Output**
///    - Channel mode: scaled rows written to `<output>` as CSV
///    - GPS mode: track written to `<output>.<ext>` per configured format
///
/// # Errors
///
/// Returns error if:
/// - Configuration cannot be loaded or is invalid
/// - Output files cannot be written
///
/// A recording without GPS fixes is not an error: nothing is written.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let (writer, _guard) = tracing_appender::non_blocking(std::io::stderr());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(cli.log_level().into())
        )
        .with_writer(writer)
        .init();

    info!("TCF Track v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = cli.resolve_config()?;

    let source: Box<dyn RawSource> = if cli.binary {
        Box::new(BinaryDumpSource)
    } else {
        Box::new(FfmpegSource::new(&config.tools.ffmpeg, &config.tools.ffprobe))
    };

    let dump_base = config.output.dump_binary.then_some(cli.output.as_path());
    let loaded = load_records(source.as_ref(), &cli.files, dump_base).await;
    if !loaded.failed.is_empty() {
        warn!("{} of {} inputs could not be read", loaded.failed.len(), cli.files.len());
    }

    if let Some(channel) = cli.channel {
        let rows = extract_channel(&loaded.records, channel)?;
        let file = std::fs::File::create(&cli.output)
            .with_context(|| format!("Failed to create {}", cli.output.display()))?;
        write_rows_csv(std::io::BufWriter::new(file), &rows)?;
        info!("Wrote {} {} rows to {}", rows.len(), channel, cli.output.display());
        return Ok(());
    }

    let track = match build_gps_points(&loaded.records, config.gps_options()).require_points() {
        Ok(track) => track,
        Err(TrackError::EmptyResult(stats)) => {
            info!(
                "Can't create file. No GPS info in {:?} ({}). Nothing to write",
                cli.files, stats
            );
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    for path in write_track(&track, &cli.output, &config.output.formats)? {
        info!("Wrote {}", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_files_then_output() {
        let cli = Cli::try_parse_from(["tcf-track", "a.mp4", "b.mp4", "track"]).unwrap();
        assert_eq!(cli.files, vec![PathBuf::from("a.mp4"), PathBuf::from("b.mp4")]);
        assert_eq!(cli.output, PathBuf::from("track"));
        assert_eq!(cli.verbose, 0);
        assert!(cli.channel.is_none());
    }

    #[test]
    fn test_cli_requires_input_and_output() {
        assert!(Cli::try_parse_from(["tcf-track", "track"]).is_err());
        assert!(Cli::try_parse_from(["tcf-track"]).is_err());
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::try_parse_from([
            "tcf-track", "-vv", "-b", "-s", "-t", "accl", "dump.bin", "out.csv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(cli.binary);
        assert!(cli.skip);
        assert_eq!(cli.channel, Some(SensorChannel::Acceleration));
        assert_eq!(cli.log_level(), Level::TRACE);
    }

    #[test]
    fn test_cli_rejects_unknown_channel() {
        assert!(Cli::try_parse_from(["tcf-track", "-t", "MAGN", "a.bin", "out"]).is_err());
    }

    #[test]
    fn test_resolve_config_overrides() {
        let cli = Cli::try_parse_from([
            "tcf-track", "-s", "-vv", "--ffmpeg", "/opt/ffmpeg", "-f", "csv", "jsonl", "--",
            "a.mp4", "out",
        ])
        .unwrap();
        let config = cli.resolve_config().unwrap();
        assert!(config.gps.skip_bad_fix);
        assert!(config.output.dump_binary);
        assert_eq!(config.tools.ffmpeg, "/opt/ffmpeg");
        assert_eq!(config.output.formats, vec![OutputFormat::Csv, OutputFormat::Jsonl]);
    }

    #[test]
    fn test_resolve_config_defaults() {
        let cli = Cli::try_parse_from(["tcf-track", "a.mp4", "out"]).unwrap();
        let config = cli.resolve_config().unwrap();
        assert!(!config.gps.skip_bad_fix);
        assert!(!config.output.dump_binary);
        assert_eq!(config.output.formats, Config::default().output.formats);
    }

    #[test]
    fn test_raw_dump_needs_double_verbose() {
        let cli = Cli::try_parse_from(["tcf-track", "-v", "a.mp4", "out"]).unwrap();
        assert_eq!(cli.log_level(), Level::DEBUG);
        assert!(!cli.resolve_config().unwrap().output.dump_binary);

        let cli = Cli::try_parse_from(["tcf-track", "-vv", "a.mp4", "out"]).unwrap();
        assert!(cli.resolve_config().unwrap().output.dump_binary);
    }
}
