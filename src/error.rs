//! Error types shared across the pipeline.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;

/// Convenience alias used throughout the library.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Fatal pipeline errors.
///
/// Solver non-convergence is deliberately absent: it is reported through
/// [`crate::optimizer::SolverStatus`] so callers can decide whether to retry.
#[derive(Debug, Error)]
pub enum Error {
    /// A required numeric field (price or PV) is missing or malformed, or a
    /// present demand field is malformed.
    #[error("parse error at line {line}, column `{column}`: {message}")]
    Parse {
        /// 1-based line in the file; the header is line 1.
        line: usize,
        /// Column name as configured in the schema.
        column: String,
        message: String,
    },

    /// The requested day window falls outside the loaded series.
    #[error("day {day} selects samples [{start}, {end}) but only {len} samples are loaded")]
    OutOfRange {
        day: usize,
        /// Signed, since the window may start before the first sample.
        start: i64,
        end: i64,
        len: usize,
    },

    /// The window holds NaN or infinite values, so nothing was optimized.
    #[error("day {day} window contains non-finite price or net demand values")]
    NonFiniteInput { day: usize },

    /// Signal normalization attempted on an all-zero reallocation.
    #[error("cannot normalize a zero reallocation vector into a signal")]
    DegenerateSignal,

    /// Parallel series disagree in length.
    #[error("series length mismatch: {0}")]
    LengthMismatch(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
