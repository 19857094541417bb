//! # Error Types
//!
//! Custom error types for TCF Track using `thiserror`.

use std::path::PathBuf;
use thiserror::Error;

use crate::tcf::protocol::FourCC;
use crate::track::AcceptanceStats;

/// Main error type for TCF Track
#[derive(Debug, Error)]
pub enum TrackError {
    /// Not enough bytes left for a declared record
    #[error("Malformed payload in '{tag}' at byte offset {offset}: needed {needed} bytes, {available} available")]
    MalformedPayload {
        tag: FourCC,
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// Containers nested deeper than the decoder accepts
    #[error("Container nesting exceeds {depth} levels at byte offset {offset}")]
    NestingTooDeep { depth: usize, offset: usize },

    /// Scale vector cannot cover the fields of a record
    #[error("Scale vector has {components} components but '{tag}' has {fields} fields")]
    ScaleMismatch {
        tag: FourCC,
        fields: usize,
        components: usize,
    },

    /// The GPS pass accepted no points
    #[error("No GPS points accepted ({0})")]
    EmptyResult(AcceptanceStats),

    /// Input has no telemetry track
    #[error("No telemetry stream found in {}", .0.display())]
    NoTelemetryStream(PathBuf),

    /// External tool failed
    #[error("External tool error: {0}")]
    Tool(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for TCF Track
pub type Result<T> = std::result::Result<T, TrackError>;
