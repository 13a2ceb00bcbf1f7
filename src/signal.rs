//! Occupant-facing signal derived from the optimal reallocation.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::series::HOURS_PER_DAY;

/// Unit-norm vector of desired relative load per hour.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Signal([f64; HOURS_PER_DAY]);

impl Signal {
    /// Normalizes `x` to unit Euclidean length.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DegenerateSignal`] if `x` is the zero vector (or its
    /// norm is not a finite positive number), instead of emitting NaN.
    pub fn from_reallocation(x: &[f64; HOURS_PER_DAY]) -> Result<Self> {
        let norm = euclidean_norm(x);
        if !(norm.is_finite() && norm > 0.0) {
            return Err(Error::DegenerateSignal);
        }
        Ok(Self(x.map(|v| v / norm)))
    }

    pub fn values(&self) -> &[f64; HOURS_PER_DAY] {
        &self.0
    }

    /// Euclidean norm; 1 up to rounding.
    pub fn norm(&self) -> f64 {
        euclidean_norm(&self.0)
    }
}

/// Euclidean norm, scaled by the largest magnitude so squares cannot overflow.
fn euclidean_norm(x: &[f64]) -> f64 {
    let largest = x.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    if largest == 0.0 || !largest.is_finite() {
        return largest;
    }
    largest * x.iter().map(|v| (v / largest).powi(2)).sum::<f64>().sqrt()
}
