//! # Pipeline
//!
//! Reads and decodes every input in order and concatenates the records.

use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::error::TrackError;
use crate::source::RawSource;
use crate::tcf::stream::{RecordStream, TelemetryRecord};

/// Records loaded from all inputs, plus the inputs that failed
#[derive(Debug, Default)]
pub struct LoadedTelemetry {
    /// Records of every successful input, in input order
    pub records: Vec<TelemetryRecord>,

    /// Inputs that could not be read or decoded
    pub failed: Vec<(PathBuf, TrackError)>,
}

/// Path of the raw dump for input number `index`
pub fn dump_path(base: &Path, index: usize) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".{:02}.bin", index));
    PathBuf::from(name)
}

/// Read and decode `files` strictly in order
///
/// A failing input is logged and recorded in [`LoadedTelemetry::failed`];
/// it never aborts later inputs nor removes records of earlier ones. When
/// `dump_base` is set each raw buffer is also written to
/// `<dump_base>.NN.bin`.
pub async fn load_records(
    source: &dyn RawSource,
    files: &[PathBuf],
    dump_base: Option<&Path>,
) -> LoadedTelemetry {
    let mut stream = RecordStream::new();
    let mut failed = Vec::new();

    for (index, file) in files.iter().enumerate() {
        let raw = match source.read_telemetry(file).await {
            Ok(raw) => raw,
            Err(e) => {
                error!("Failed to read {}: {}", file.display(), e);
                failed.push((file.clone(), e));
                continue;
            }
        };

        if let Some(base) = dump_base {
            let path = dump_path(base, index);
            info!("Creating output file for binary data: {}", path.display());
            if let Err(e) = tokio::fs::write(&path, &raw).await {
                error!("Failed to write {}: {}", path.display(), e);
            }
        }

        match stream.push_buffer(&raw) {
            Ok(count) => info!("{}: {} records", file.display(), count),
            Err(e) => {
                error!("Failed to decode {}: {}", file.display(), e);
                failed.push((file.clone(), e));
            }
        }
    }

    LoadedTelemetry {
        records: stream.into_records(),
        failed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MockRawSource;
    use crate::tcf::encoder::*;
    use crate::tcf::protocol::tags;
    use crate::tcf::stream::RecordData;
    use crate::track::{build_gps_points, GpsOptions};
    use chrono::{TimeZone, Utc};

    fn capture(anchor: &str, device: &str) -> Vec<u8> {
        encode_container(
            tags::DEVC,
            &[
                encode_text(tags::DVNM, device),
                encode_container(
                    tags::STRM,
                    &[
                        encode_gps_time(anchor),
                        encode_u32(tags::GPSF, 3),
                        encode_i32s(tags::SCAL, &[&[10_000_000], &[10_000_000], &[1000], &[1000], &[100]]),
                        encode_i32s(
                            tags::GPS5,
                            &[&[404_168_000, -37_038_000, 667_000, 1500, 150]],
                        ),
                    ],
                ),
            ],
        )
    }

    fn mock_with(files: Vec<(&'static str, Vec<u8>)>) -> MockRawSource {
        let mut mock = MockRawSource::new();
        mock.expect_read_telemetry().returning(move |path| {
            files
                .iter()
                .find(|(name, _)| path == Path::new(name))
                .map(|(_, data)| Ok(data.clone()))
                .unwrap_or_else(|| Err(TrackError::NoTelemetryStream(path.to_path_buf())))
        });
        mock
    }

    #[tokio::test]
    async fn test_inputs_are_concatenated_in_order() {
        let source = mock_with(vec![
            ("a.bin", capture("200101100000.000", "first")),
            ("b.bin", capture("200101110000.000", "second")),
        ]);
        let files = vec![PathBuf::from("a.bin"), PathBuf::from("b.bin")];

        let loaded = load_records(&source, &files, None).await;
        assert!(loaded.failed.is_empty());

        let names: Vec<&RecordData> = loaded
            .records
            .iter()
            .filter(|r| r.tag == tags::DVNM)
            .map(|r| &r.data)
            .collect();
        assert_eq!(
            names,
            vec![
                &RecordData::DeviceName("first".into()),
                &RecordData::DeviceName("second".into()),
            ]
        );

        let track = build_gps_points(&loaded.records, GpsOptions::default());
        assert_eq!(track.points.len(), 2);
        assert_eq!(track.start_time, Some(Utc.with_ymd_and_hms(2020, 1, 1, 10, 0, 0).unwrap()));
        assert_eq!(track.device_name, "second");
        assert!((track.points[0].latitude - 40.4168).abs() < 1e-9);
        assert!((track.points[0].longitude - (-3.7038)).abs() < 1e-9);
        assert_eq!(track.points[0].altitude, 667.0);
        assert_eq!(track.points[0].speed, 1.5);
    }

    #[tokio::test]
    async fn test_swapping_inputs_changes_start_time() {
        let source = mock_with(vec![
            ("a.bin", capture("200101100000.000", "cam")),
            ("b.bin", capture("200101110000.000", "cam")),
        ]);
        let files = vec![PathBuf::from("b.bin"), PathBuf::from("a.bin")];

        let loaded = load_records(&source, &files, None).await;
        let track = build_gps_points(&loaded.records, GpsOptions::default());
        assert_eq!(track.start_time, Some(Utc.with_ymd_and_hms(2020, 1, 1, 11, 0, 0).unwrap()));
    }

    #[tokio::test]
    async fn test_corrupt_input_does_not_abort_others() {
        let mut corrupt = capture("200101100000.000", "bad");
        corrupt.truncate(corrupt.len() - 10);

        let source = mock_with(vec![
            ("good1.bin", capture("200101100000.000", "good")),
            ("bad.bin", corrupt),
            ("good2.bin", capture("200101120000.000", "good")),
        ]);
        let files = vec![
            PathBuf::from("good1.bin"),
            PathBuf::from("bad.bin"),
            PathBuf::from("missing.bin"),
            PathBuf::from("good2.bin"),
        ];

        let loaded = load_records(&source, &files, None).await;
        assert_eq!(loaded.failed.len(), 2);
        assert_eq!(loaded.failed[0].0, PathBuf::from("bad.bin"));
        assert!(matches!(loaded.failed[0].1, TrackError::MalformedPayload { .. }));
        assert_eq!(loaded.failed[1].0, PathBuf::from("missing.bin"));

        let track = build_gps_points(&loaded.records, GpsOptions::default());
        assert_eq!(track.points.len(), 2);
    }

    #[tokio::test]
    async fn test_raw_buffers_are_dumped() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("out");
        let data = capture("200101100000.000", "cam");
        let source = mock_with(vec![("a.bin", data.clone())]);

        load_records(&source, &[PathBuf::from("a.bin")], Some(&base)).await;

        let dumped = std::fs::read(dir.path().join("out.00.bin")).unwrap();
        assert_eq!(dumped, data);
    }

    #[test]
    fn test_dump_path() {
        assert_eq!(dump_path(Path::new("track"), 3), PathBuf::from("track.03.bin"));
    }
}
