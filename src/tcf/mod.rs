//! # TCF Module
//!
//! Decoder for the Telemetry Container Format, the nested KLV metadata
//! track written by action cameras.
//!
//! This module handles:
//! - Scalar decoding for every header type code
//! - Recursive record decoding with alignment-preserving cursor advance
//! - Flattening decoded trees into typed, ordered telemetry records
//! - Encoding records for fixtures

pub mod protocol;
pub mod codec;
pub mod decoder;
pub mod encoder;
pub mod stream;

pub use protocol::{tags, FourCC, TypeCode};
pub use stream::{parse_stream, RecordData, RecordStream, TelemetryRecord};
