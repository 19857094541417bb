//! # Track Module
//!
//! Turns the flattened record sequence into output-ready data.
//!
//! This module handles:
//! - Scale-vector tracking and per-axis division
//! - GPS point reconstruction for the `GPS5`/`GPSU` and legacy `GPRI`/`SYST` dialects
//! - Fix-quality filtering and acceptance statistics
//! - Single-channel motion extraction (`CORI`, `GRAV`, `ACCL`)

pub mod scale;
pub mod point;
pub mod builder;
pub mod sensor;

pub use builder::{build_gps_points, GpsOptions, GpsPointBuilder};
pub use point::{AcceptanceStats, GeodeticPoint, GpsTrack};
pub use scale::{ScaleVector, ScopedScale};
pub use sensor::{extract_channel, SensorChannel};
