//! # CSV Writers
//!
//! Point tables and headerless rows for single-channel sensor extraction.

use chrono::SecondsFormat;
use std::io::Write;

use crate::error::Result;
use crate::track::GeodeticPoint;

/// Write one row per point with a header line
pub fn write_points_csv<W: Write>(writer: W, points: &[GeodeticPoint]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["time", "latitude", "longitude", "altitude", "speed"])?;

    for p in points {
        let time = p
            .time
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
            .unwrap_or_default();
        csv.write_record([
            time,
            p.latitude.to_string(),
            p.longitude.to_string(),
            p.altitude.to_string(),
            p.speed.to_string(),
        ])?;
    }

    csv.flush()?;
    Ok(())
}

/// Write scaled sensor rows, no header
pub fn write_rows_csv<W: Write>(writer: W, rows: &[Vec<f64>]) -> Result<()> {
    let mut csv = csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_writer(writer);

    for row in rows {
        csv.write_record(row.iter().map(|v| v.to_string()))?;
    }

    csv.flush()?;
    Ok(())
}
