//! # JSONL Writer
//!
//! One JSON object per point, one point per line.

use std::io::Write;

use crate::error::Result;
use crate::track::GeodeticPoint;

/// Write points as JSON Lines
pub fn write_points_jsonl<W: Write>(mut writer: W, points: &[GeodeticPoint]) -> Result<()> {
    for p in points {
        serde_json::to_writer(&mut writer, p)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}
