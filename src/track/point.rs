//! # Track Types
//!
//! Geodetic points, acceptance counters and the result of a GPS pass.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::error::{Result, TrackError};

/// Fix quality code meaning "no lock"
pub const FIX_NO_LOCK: u32 = 0;

/// Human-readable label for a fix quality code
pub fn fix_label(code: u32) -> &'static str {
    match code {
        0 => "No lock",
        2 => "2D lock",
        3 => "3D lock",
        _ => "Unknown",
    }
}

/// One reconstructed GPS fix, scale-corrected
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeodeticPoint {
    /// Latitude in decimal degrees
    pub latitude: f64,

    /// Longitude in decimal degrees
    pub longitude: f64,

    /// Altitude in meters
    pub altitude: f64,

    /// Absolute sample time, if an anchor was known
    pub time: Option<DateTime<Utc>>,

    /// Ground speed in m/s
    pub speed: f64,
}

/// Counters for one point-building pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AcceptanceStats {
    /// Points emitted
    pub ok: u64,

    /// Samples seen while the fix was "no lock"
    pub badfix: u64,

    /// Bad-fix samples dropped because skipping was enabled
    pub badfixskip: u64,

    /// Samples with all-zero coordinates
    pub empty: u64,

    /// Samples dropped because the scale vector did not cover them
    pub scale_mismatch: u64,
}

impl AcceptanceStats {
    /// Sum of all counters
    pub fn total(&self) -> u64 {
        self.ok + self.badfix + self.badfixskip + self.empty + self.scale_mismatch
    }

    /// Multi-line report for the end of a pass
    pub fn summary(&self, device: &str) -> String {
        format!(
            "Device: {}\n\
             - Ok:              {:5}\n\
             - GPSFIX=0 (bad):  {:5} (skipped: {})\n\
             - Empty (No data): {:5}\n\
             - Scale mismatch:  {:5}\n\
             Total points:      {:5}",
            device,
            self.ok,
            self.badfix,
            self.badfixskip,
            self.empty,
            self.scale_mismatch,
            self.total()
        )
    }
}

impl fmt::Display for AcceptanceStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ok={} badfix={} badfixskip={} empty={} scale_mismatch={}",
            self.ok, self.badfix, self.badfixskip, self.empty, self.scale_mismatch
        )
    }
}

/// Result of a GPS point-building pass
#[derive(Debug, Clone, PartialEq)]
pub struct GpsTrack {
    /// Emitted points in stream order
    pub points: Vec<GeodeticPoint>,

    /// First `GPSU` seen
    pub start_time: Option<DateTime<Utc>>,

    /// Last `DVNM` seen
    pub device_name: String,

    /// Acceptance counters
    pub stats: AcceptanceStats,
}

impl GpsTrack {
    /// Whether no points were emitted
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Require at least one point
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::EmptyResult`] carrying the stats when the pass
    /// emitted nothing.
    pub fn require_points(self) -> Result<Self> {
        if self.is_empty() {
            return Err(TrackError::EmptyResult(self.stats));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fix_labels() {
        assert_eq!(fix_label(FIX_NO_LOCK), "No lock");
        assert_eq!(fix_label(2), "2D lock");
        assert_eq!(fix_label(3), "3D lock");
        assert_eq!(fix_label(7), "Unknown");
    }

    #[test]
    fn test_stats_total_and_display() {
        let stats = AcceptanceStats { ok: 5, badfix: 2, badfixskip: 1, empty: 3, scale_mismatch: 4 };
        assert_eq!(stats.total(), 15);
        assert_eq!(stats.to_string(), "ok=5 badfix=2 badfixskip=1 empty=3 scale_mismatch=4");
        assert!(stats.summary("HERO8").contains("Scale mismatch:      4"));
        assert!(stats.summary("HERO8").contains("Device: HERO8"));
    }

    #[test]
    fn test_require_points_on_empty_track() {
        let track = GpsTrack {
            points: Vec::new(),
            start_time: None,
            device_name: "Unknown".to_string(),
            stats: AcceptanceStats { empty: 4, ..Default::default() },
        };

        match track.require_points() {
            Err(TrackError::EmptyResult(stats)) => assert_eq!(stats.empty, 4),
            other => panic!("Expected EmptyResult, got: {:?}", other),
        }
    }
}
