//! Error types for the annealer.

use thiserror::Error;

/// Errors raised while constructing, driving or persisting an annealer.
#[derive(Debug, Error)]
pub enum AnnealError {
    /// No parameters were given.
    #[error("parameter vector is empty")]
    Empty,

    /// The number of ranges differs from the number of initial parameters.
    #[error("dimension mismatch: {params} initial parameters but {ranges} ranges")]
    DimensionMismatch { params: usize, ranges: usize },

    /// A range is inverted or has a non-finite bound.
    #[error("invalid range for parameter {index}: [{min}, {max}]")]
    InvalidRange { index: usize, min: f64, max: f64 },

    /// An initial parameter lies outside its range.
    #[error("initial parameter {index} = {value} lies outside [{min}, {max}]")]
    OutOfRange {
        index: usize,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The caller did something the current state does not allow.
    #[error("protocol violation: {0}")]
    Protocol(String),

    #[error("objective value is NaN")]
    NanObjective,

    /// A tangent estimated during reannealing was NaN or infinite.
    #[error("non-finite tangent {value} for parameter {index}")]
    NonFiniteTangent { index: usize, value: f64 },

    /// A reannealed temperature was zero, negative or non-finite. This
    /// usually points at bad scale parameters.
    #[error("reannealed temperature {value} for parameter {index} is not positive")]
    NonPositiveTemperature { index: usize, value: f64 },

    /// Candidate generation kept landing out of bounds.
    #[error("no in-bounds candidate after {attempts} attempts")]
    GenerationExhausted { attempts: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AnnealError>;
