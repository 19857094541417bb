//! # Record Stream Builder
//!
//! Flattens decoded record trees from one or more inputs into a single
//! ordered sequence of typed telemetry records.
//!
//! Container records (`DEVC`, `STRM`, ...) are dropped once their children
//! have been flattened; each record keeps the id of the container it came
//! from in [`TelemetryRecord::scope`]. Order is preserved within and across
//! inputs; it is the only ordering signal downstream consumers get.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{debug, warn};

use super::codec::Value;
use super::decoder::{decode_buffer, Klv, KlvBody};
use super::protocol::*;
use crate::error::Result;

/// Format of `GPSU` timestamps
const GPSU_FORMAT: &str = "%y%m%d%H%M%S%.f";

/// One GPS5 sample, raw (unscaled)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gps5Sample {
    pub lat: f64,
    pub lon: f64,
    pub alt: f64,
    pub speed_2d: f64,
    pub speed_3d: f64,
}

impl Gps5Sample {
    /// Fields in stream order
    pub fn fields(&self) -> [f64; GPS5_FIELDS] {
        [self.lat, self.lon, self.alt, self.speed_2d, self.speed_3d]
    }

    /// Build a sample from fields in stream order
    pub fn from_fields(f: [f64; GPS5_FIELDS]) -> Self {
        Self {
            lat: f[0],
            lon: f[1],
            alt: f[2],
            speed_2d: f[3],
            speed_3d: f[4],
        }
    }
}

/// Legacy system clock sample, raw (unscaled)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystSample {
    pub seconds: f64,
    pub milliseconds: f64,
}

/// Typed payload of a telemetry record
#[derive(Debug, Clone, PartialEq)]
pub enum RecordData {
    /// `SCAL` divisors
    Scale(Vec<f64>),
    /// `DVNM`
    DeviceName(String),
    /// `GPSU`
    GpsTime(DateTime<Utc>),
    /// `GPSF`
    GpsFix(u32),
    /// `TSMP`
    SampleCount(u64),
    /// `GPS5`
    Gps5(Vec<Gps5Sample>),
    /// `SYST`
    SystemTime(SystSample),
    /// `GPRI` fields in stream order
    KarmaFix(Vec<f64>),
    /// `CORI` quaternions
    Orientation(Vec<[f64; 4]>),
    /// `GRAV` / `ACCL` vectors
    Vector3(Vec<[f64; 3]>),
    /// Anything else, one tuple per element
    Raw(Vec<Vec<Value>>),
}

/// One record of the flattened stream
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryRecord {
    /// Record tag
    pub tag: FourCC,

    /// Header type code
    pub type_code: TypeCode,

    /// Header element size
    pub element_size: u8,

    /// Header repeat count
    pub repeat: u16,

    /// Enclosing container, unique per container entry in a stream
    pub scope: u32,

    /// Typed payload
    pub data: RecordData,
}

impl TelemetryRecord {
    /// Build a typed record from a decoded leaf found in container `scope`
    pub fn from_tuples(header: &RecordHeader, scope: u32, tuples: Vec<Vec<Value>>) -> Self {
        let data = match RecordData::from_tuples(header.tag, &tuples) {
            Some(data) => data,
            None => {
                if is_known(header.tag) {
                    warn!(
                        "'{}' payload does not match its layout (type={:?} size={} repeat={}), keeping raw",
                        header.tag, header.type_code, header.element_size, header.repeat
                    );
                }
                RecordData::Raw(tuples)
            }
        };

        Self {
            tag: header.tag,
            type_code: header.type_code,
            element_size: header.element_size,
            repeat: header.repeat,
            scope,
            data,
        }
    }
}

impl RecordData {
    /// Interpret tuples according to the known layout of `tag`
    ///
    /// Returns `None` for unknown tags and for known tags whose tuples do not
    /// fit the layout.
    pub fn from_tuples(tag: FourCC, tuples: &[Vec<Value>]) -> Option<Self> {
        let data = match tag {
            tags::SCAL => {
                let scale = numbers(tuples.iter().flatten())?;
                if scale.is_empty() {
                    return None;
                }
                RecordData::Scale(scale)
            }
            tags::DVNM => RecordData::DeviceName(first(tuples)?.as_str()?.to_string()),
            tags::GPSU => {
                let text = first(tuples)?.as_str()?;
                match NaiveDateTime::parse_from_str(text.trim(), GPSU_FORMAT) {
                    Ok(naive) => RecordData::GpsTime(naive.and_utc()),
                    Err(e) => {
                        warn!("Unparseable GPSU '{}': {}", text, e);
                        return None;
                    }
                }
            }
            tags::GPSF => RecordData::GpsFix(u32::try_from(first(tuples)?.as_u64()?).ok()?),
            tags::TSMP => RecordData::SampleCount(first(tuples)?.as_u64()?),
            tags::GPS5 => RecordData::Gps5(
                tuples
                    .iter()
                    .map(|t| fixed::<GPS5_FIELDS>(t).map(Gps5Sample::from_fields))
                    .collect::<Option<_>>()?,
            ),
            tags::SYST => {
                let fields = numbers(tuples.first()?)?;
                match fields.as_slice() {
                    [seconds, milliseconds, ..] => RecordData::SystemTime(SystSample {
                        seconds: *seconds,
                        milliseconds: *milliseconds,
                    }),
                    _ => return None,
                }
            }
            tags::GPRI => {
                let fields = numbers(tuples.first()?)?;
                if fields.len() < gpri::MIN_FIELDS {
                    return None;
                }
                RecordData::KarmaFix(fields)
            }
            tags::CORI => RecordData::Orientation(
                tuples.iter().map(|t| fixed::<4>(t)).collect::<Option<_>>()?,
            ),
            tags::GRAV | tags::ACCL => RecordData::Vector3(
                tuples.iter().map(|t| fixed::<3>(t)).collect::<Option<_>>()?,
            ),
            _ => return None,
        };

        Some(data)
    }
}

fn is_known(tag: FourCC) -> bool {
    [
        tags::SCAL,
        tags::DVNM,
        tags::GPSU,
        tags::GPSF,
        tags::TSMP,
        tags::GPS5,
        tags::SYST,
        tags::GPRI,
        tags::CORI,
        tags::GRAV,
        tags::ACCL,
    ]
    .contains(&tag)
}

fn first(tuples: &[Vec<Value>]) -> Option<&Value> {
    tuples.first()?.first()
}

fn numbers<'a>(values: impl IntoIterator<Item = &'a Value>) -> Option<Vec<f64>> {
    values.into_iter().map(Value::as_f64).collect()
}

fn fixed<const N: usize>(tuple: &[Value]) -> Option<[f64; N]> {
    if tuple.len() != N {
        return None;
    }
    let mut out = [0.0; N];
    for (dst, value) in out.iter_mut().zip(tuple) {
        *dst = value.as_f64()?;
    }
    Some(out)
}

/// Flatten a decoded tree into `out`, depth first, in document order
///
/// Top-level records get `scope`; every container entered gets the next
/// unused id from `next_scope`.
pub fn flatten(records: Vec<Klv>, scope: u32, next_scope: &mut u32, out: &mut Vec<TelemetryRecord>) {
    for record in records {
        match record.body {
            KlvBody::Nested(children) => {
                let child_scope = *next_scope;
                *next_scope += 1;
                flatten(children, child_scope, next_scope, out);
            }
            KlvBody::Tuples(tuples) => {
                out.push(TelemetryRecord::from_tuples(&record.header, scope, tuples))
            }
        }
    }
}

/// Decode one raw buffer into a flat record sequence
///
/// # Errors
///
/// Returns error if the buffer is malformed; no partial result is returned.
pub fn parse_stream(buf: &[u8]) -> Result<Vec<TelemetryRecord>> {
    let mut stream = RecordStream::new();
    stream.push_buffer(buf)?;
    Ok(stream.into_records())
}

/// Ordered record sequence accumulated across inputs
#[derive(Debug, Default, Clone)]
pub struct RecordStream {
    records: Vec<TelemetryRecord>,
    next_scope: u32,
}

impl RecordStream {
    /// Create an empty stream
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `buf` and append its records
    ///
    /// Either every record of `buf` is appended or none is, so a corrupt
    /// input never disturbs records from earlier inputs.
    ///
    /// # Returns
    ///
    /// * `Result<usize>` - Number of records appended
    pub fn push_buffer(&mut self, buf: &[u8]) -> Result<usize> {
        let tree = decode_buffer(buf)?;

        // Top-level records of each input get a scope of their own
        let top = self.next_scope;
        self.next_scope += 1;

        let before = self.records.len();
        flatten(tree, top, &mut self.next_scope, &mut self.records);
        let count = self.records.len() - before;
        debug!("Decoded {} records from {} bytes", count, buf.len());
        Ok(count)
    }

    /// Records accumulated so far
    pub fn records(&self) -> &[TelemetryRecord] {
        &self.records
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no records have been accumulated
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Consume the stream
    pub fn into_records(self) -> Vec<TelemetryRecord> {
        self.records
    }
}
