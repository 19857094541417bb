//! # GPS Point Builder
//!
//! Single forward pass over the flattened record sequence that rebuilds a
//! timed sequence of geodetic fixes.
//!
//! ## State
//!
//! | Slot | Set by | Initial |
//! |------|--------|---------|
//! | scale vector | `SCAL`, per container | neutral |
//! | device name | `DVNM` | `Unknown` |
//! | time anchor | `GPSU` | unset |
//! | fix quality | `GPSF` | no lock |
//! | system clock | `SYST` | 0 / 0 |
//! | sample counter | `TSMP` | 0 |
//!
//! `GPS5` and `GPRI` records emit points; every other tag only updates state
//! or is ignored. There is no backtracking: each record is visited once, and
//! no record ends the pass early. A scale vector only applies to records of
//! the container that declared it.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use super::point::{fix_label, AcceptanceStats, GeodeticPoint, GpsTrack, FIX_NO_LOCK};
use super::scale::{ScaleVector, ScopedScale};
use crate::tcf::protocol::{gpri, tags, FourCC};
use crate::tcf::stream::{Gps5Sample, RecordData, SystSample, TelemetryRecord};

/// GPS5 samples written per anchor second
pub const DEFAULT_GPS_SAMPLE_RATE_HZ: f64 = 18.0;

/// Device name before any `DVNM` is seen
pub const UNKNOWN_DEVICE: &str = "Unknown";

/// Options for a point-building pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpsOptions {
    /// Drop samples taken without a GPS lock instead of keeping them
    pub skip_bad_fix: bool,

    /// GPS5 samples per anchor second, used for intra-burst timing
    pub sample_rate_hz: f64,
}

impl Default for GpsOptions {
    fn default() -> Self {
        Self {
            skip_bad_fix: false,
            sample_rate_hz: DEFAULT_GPS_SAMPLE_RATE_HZ,
        }
    }
}

/// What to do with a sample after the rejection checks
enum Verdict {
    Accept,
    Reject,
}

/// Running state of one pass
#[derive(Debug, Clone)]
pub struct GpsPointBuilder {
    options: GpsOptions,
    scale: ScopedScale,
    device_name: String,
    anchor: Option<DateTime<Utc>>,
    start_time: Option<DateTime<Utc>>,
    fix: u32,
    syst: SystSample,
    sample_counter: i64,
    points: Vec<GeodeticPoint>,
    stats: AcceptanceStats,
}

impl GpsPointBuilder {
    /// Create a builder in the all-defaults state
    pub fn new(options: GpsOptions) -> Self {
        Self {
            options,
            scale: ScopedScale::default(),
            device_name: UNKNOWN_DEVICE.to_string(),
            anchor: None,
            start_time: None,
            fix: FIX_NO_LOCK,
            syst: SystSample {
                seconds: 0.0,
                milliseconds: 0.0,
            },
            sample_counter: 0,
            points: Vec::new(),
            stats: AcceptanceStats::default(),
        }
    }

    /// Apply one record
    ///
    /// Samples the current scale vector cannot cover are logged, counted in
    /// [`AcceptanceStats::scale_mismatch`] and skipped.
    pub fn step(&mut self, record: &TelemetryRecord) {
        let scale = self.scale.for_scope(record.scope).clone();

        match &record.data {
            RecordData::Scale(divisors) => {
                self.scale.set(record.scope, divisors.clone());
            }
            RecordData::DeviceName(name) => {
                self.device_name = name.clone();
            }
            RecordData::GpsTime(time) => {
                self.anchor = Some(*time);
                if self.start_time.is_none() {
                    self.start_time = Some(*time);
                }
            }
            RecordData::GpsFix(fix) => {
                if *fix != self.fix {
                    info!("GPSFIX change to {} [{}]", fix, fix_label(*fix));
                }
                self.fix = *fix;
            }
            RecordData::SampleCount(count) => {
                // Counters past i64::MAX wrap instead of overflowing
                let count = *count as i64;
                self.sample_counter = if self.sample_counter == 0 {
                    count
                } else {
                    count.wrapping_sub(self.sample_counter)
                };
            }
            RecordData::Gps5(samples) => self.push_gps5(&scale, samples),
            RecordData::SystemTime(syst) => {
                match scale.apply(tags::SYST, &[syst.seconds, syst.milliseconds]) {
                    Ok(scaled) if scaled[0] != 0.0 && scaled[1] != 0.0 => {
                        self.syst = SystSample {
                            seconds: scaled[0],
                            milliseconds: scaled[1],
                        };
                    }
                    Ok(_) => {}
                    Err(e) => warn!("Ignoring SYST: {}", e),
                }
            }
            RecordData::KarmaFix(fields) => self.push_karma(&scale, fields),
            _ => {}
        }
    }

    fn push_gps5(&mut self, scale: &ScaleVector, samples: &[Gps5Sample]) {
        for (index, sample) in samples.iter().enumerate() {
            if let Verdict::Reject = self.screen(sample.lat, sample.lon, sample.alt) {
                continue;
            }

            let Some(fields) = self.scaled(scale, tags::GPS5, &sample.fields()) else {
                continue;
            };
            let scaled = Gps5Sample::from_fields([fields[0], fields[1], fields[2], fields[3], fields[4]]);
            let offset_ns = (index as f64 * 1e9 / self.options.sample_rate_hz).round() as i64;

            self.points.push(GeodeticPoint {
                latitude: scaled.lat,
                longitude: scaled.lon,
                altitude: scaled.alt,
                time: self.anchor.map(|t| t + Duration::nanoseconds(offset_ns)),
                speed: scaled.speed_2d,
            });
            self.stats.ok += 1;
        }
    }

    fn push_karma(&mut self, scale: &ScaleVector, fields: &[f64]) {
        if fields.len() < gpri::MIN_FIELDS {
            debug!("Ignoring GPRI with {} fields", fields.len());
            return;
        }

        if let Verdict::Reject = self.screen(fields[gpri::LAT], fields[gpri::LON], fields[gpri::ALT]) {
            return;
        }

        let Some(scaled) = self.scaled(scale, tags::GPRI, fields) else {
            return;
        };

        // Points before a valid SYST have no clock and are dropped
        if self.syst.seconds == 0.0 || self.syst.milliseconds == 0.0 {
            debug!("Dropping GPRI fix: no system time yet");
            return;
        }

        let Some(time) = epoch_seconds(self.syst.milliseconds) else {
            debug!("Dropping GPRI fix: system time {} out of range", self.syst.milliseconds);
            return;
        };

        self.points.push(GeodeticPoint {
            latitude: scaled[gpri::LAT],
            longitude: scaled[gpri::LON],
            altitude: scaled[gpri::ALT],
            time: Some(time),
            speed: scaled[gpri::SPEED],
        });
        self.stats.ok += 1;
    }

    /// Scale one sample, counting it as a mismatch if the vector is too short
    fn scaled(&mut self, scale: &ScaleVector, tag: FourCC, fields: &[f64]) -> Option<Vec<f64>> {
        match scale.apply(tag, fields) {
            Ok(scaled) => Some(scaled),
            Err(e) => {
                warn!("Skipping sample: {}", e);
                self.stats.scale_mismatch += 1;
                None
            }
        }
    }

    /// Empty and bad-fix checks shared by both GPS dialects
    fn screen(&mut self, lat: f64, lon: f64, alt: f64) -> Verdict {
        if lat == 0.0 && lon == 0.0 && alt == 0.0 {
            debug!("Skipping empty point");
            self.stats.empty += 1;
            return Verdict::Reject;
        }

        if self.fix == FIX_NO_LOCK {
            self.stats.badfix += 1;
            if self.options.skip_bad_fix {
                debug!("Skipping point due GPSFIX==0");
                self.stats.badfixskip += 1;
                return Verdict::Reject;
            }
        }

        Verdict::Accept
    }

    /// Current acceptance counters
    pub fn stats(&self) -> AcceptanceStats {
        self.stats
    }

    /// Current `TSMP` counter state
    ///
    /// Tracked for timing refinement but not used when emitting points.
    pub fn sample_counter(&self) -> i64 {
        self.sample_counter
    }

    /// End the pass
    pub fn finish(self) -> GpsTrack {
        for line in self.stats.summary(&self.device_name).lines() {
            info!("{}", line);
        }

        GpsTrack {
            points: self.points,
            start_time: self.start_time,
            device_name: self.device_name,
            stats: self.stats,
        }
    }
}

fn epoch_seconds(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    let whole = seconds.floor();
    let nanos = ((seconds - whole) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::<Utc>::from_timestamp(whole as i64, nanos)
}

/// Run a full pass over `records`
///
/// The whole sequence is always consumed and the stats are always returned;
/// zero points is not an error here (see [`GpsTrack::require_points`]).
pub fn build_gps_points<'a, I>(records: I, options: GpsOptions) -> GpsTrack
where
    I: IntoIterator<Item = &'a TelemetryRecord>,
{
    records
        .into_iter()
        .fold(GpsPointBuilder::new(options), |mut builder, record| {
            builder.step(record);
            builder
        })
        .finish()
}
