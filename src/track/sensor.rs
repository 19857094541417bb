//! # Sensor Channel Extraction
//!
//! Single-channel mode: scale every sample of one motion tag and return
//! rows, with no timing or fix filtering.

use clap::ValueEnum;
use std::fmt;

use super::scale::ScopedScale;
use crate::error::Result;
use crate::tcf::protocol::{tags, FourCC};
use crate::tcf::stream::{RecordData, TelemetryRecord};

/// Motion channel selectable for extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SensorChannel {
    /// `CORI` camera orientation quaternion
    #[value(name = "CORI")]
    Orientation,

    /// `GRAV` gravity vector
    #[value(name = "GRAV")]
    Gravity,

    /// `ACCL` accelerometer
    #[value(name = "ACCL")]
    Acceleration,
}

impl SensorChannel {
    /// Tag carrying this channel
    pub fn tag(self) -> FourCC {
        match self {
            Self::Orientation => tags::CORI,
            Self::Gravity => tags::GRAV,
            Self::Acceleration => tags::ACCL,
        }
    }
}

impl fmt::Display for SensorChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Scale every sample of `channel` by the `SCAL` preceding it in its container
///
/// # Errors
///
/// Returns error if a multi-component scale vector is shorter than a sample.
pub fn extract_channel<'a, I>(records: I, channel: SensorChannel) -> Result<Vec<Vec<f64>>>
where
    I: IntoIterator<Item = &'a TelemetryRecord>,
{
    let tag = channel.tag();
    let mut scale = ScopedScale::default();
    let mut rows = Vec::new();

    for record in records {
        match &record.data {
            RecordData::Scale(divisors) => scale.set(record.scope, divisors.clone()),
            RecordData::Orientation(samples) if record.tag == tag => {
                for sample in samples {
                    rows.push(scale.for_scope(record.scope).apply(tag, sample)?);
                }
            }
            RecordData::Vector3(samples) if record.tag == tag => {
                for sample in samples {
                    rows.push(scale.for_scope(record.scope).apply(tag, sample)?);
                }
            }
            _ => {}
        }
    }

    Ok(rows)
}
