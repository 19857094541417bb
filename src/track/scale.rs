//! # Scale Vector
//!
//! Per-axis divisors from the most recent `SCAL` record of a container.

use crate::error::{Result, TrackError};
use crate::tcf::protocol::FourCC;

/// Divisors applied to raw samples
///
/// A single component applies to every field. Otherwise there must be at
/// least one component per field.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleVector(Vec<f64>);

impl Default for ScaleVector {
    fn default() -> Self {
        Self::neutral()
    }
}

impl ScaleVector {
    /// Neutral scale (1.0 on every axis)
    pub fn neutral() -> Self {
        Self(vec![1.0])
    }

    /// Scale from `SCAL` divisors; an empty list is neutral
    pub fn new(divisors: Vec<f64>) -> Self {
        if divisors.is_empty() {
            Self::neutral()
        } else {
            Self(divisors)
        }
    }

    /// Divisors
    pub fn components(&self) -> &[f64] {
        &self.0
    }

    /// Divide `fields` element-wise
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::ScaleMismatch`] if there are fewer components
    /// than fields (and more than one).
    pub fn apply(&self, tag: FourCC, fields: &[f64]) -> Result<Vec<f64>> {
        match self.0.as_slice() {
            [divisor] => Ok(fields.iter().map(|f| f / divisor).collect()),
            divisors if divisors.len() >= fields.len() => {
                Ok(fields.iter().zip(divisors).map(|(f, d)| f / d).collect())
            }
            divisors => Err(TrackError::ScaleMismatch {
                tag,
                fields: fields.len(),
                components: divisors.len(),
            }),
        }
    }
}

/// Most recent scale vector, bound to the container that declared it
///
/// Records from any other container see the neutral scale.
#[derive(Debug, Clone, Default)]
pub struct ScopedScale {
    scope: u32,
    current: ScaleVector,
    neutral: ScaleVector,
}

impl ScopedScale {
    /// Replace the scale of container `scope`
    pub fn set(&mut self, scope: u32, divisors: Vec<f64>) {
        self.scope = scope;
        self.current = ScaleVector::new(divisors);
    }

    /// Scale in effect for a record of container `scope`
    pub fn for_scope(&self, scope: u32) -> &ScaleVector {
        if scope == self.scope {
            &self.current
        } else {
            &self.neutral
        }
    }
}
