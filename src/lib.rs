//! # TCF Track Library
//!
//! Extract GPS tracks and motion telemetry from action camera metadata streams.
//!
//! This library decodes the tag-length-value telemetry format embedded in
//! camera recordings and rebuilds georeferenced tracks and sensor tables
//! from the decoded record sequence.

pub mod config;
pub mod error;
pub mod tcf;
pub mod track;
pub mod output;
pub mod source;
pub mod pipeline;
