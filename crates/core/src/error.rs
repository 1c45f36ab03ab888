//! Error types for travesia

use thiserror::Error;

/// Main error type for travesia operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Raster size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// Fewer anchor points than the operation needs.
    #[error("Insufficient input: {required} points required, {provided} provided")]
    InsufficientInput { required: usize, provided: usize },

    /// A corridor refinement round selected no cell at all.
    ///
    /// Recoverable: retry with a wider tolerance or a finer first round.
    #[error("No convergence in round {round}: no cell within {tolerance} of minimum cost {min_cost}")]
    NoConvergence {
        round: usize,
        min_cost: f64,
        tolerance: f64,
    },

    #[error("Algorithm error: {0}")]
    Algorithm(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether the caller may retry with relaxed parameters.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::NoConvergence { .. })
    }
}

/// Result type alias for travesia operations
pub type Result<T> = std::result::Result<T, Error>;
