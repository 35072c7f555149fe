//! Error type shared by every pipeline phase.
//!
//! Structural faults (a matrix that does not match its declared version, a
//! contour walk that fails to close) and policy violations that should have
//! been resolved before the core runs (smoothing intensity out of range, a
//! shape kind with no registered renderer) are both reported here. Each
//! variant carries the coordinate or parameter that triggered it.
//! Degenerate-but-valid input (an empty matrix, an empty cluster) is never
//! an error.

use crate::shapes::ShapeKind;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// A row of the input does not have as many cells as there are rows.
    #[error("matrix is not square: row {row} has {actual} cells, expected {expected}")]
    NotSquare {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// The matrix side does not match the declared symbol version.
    #[error("{version} expects a {expected}x{expected} matrix, got {actual}x{actual}")]
    SizeMismatch {
        version: String,
        expected: usize,
        actual: usize,
    },

    /// The declared version number is outside the supported range.
    #[error("invalid symbol version {version}")]
    InvalidVersion { version: String },

    /// A boundary walk ran out of edges before returning to its start, or
    /// a cluster cell lies outside the cluster's recorded bounds.
    #[error("contour starting near cell ({row}, {col}) does not close")]
    OpenContour { row: usize, col: usize },

    /// A cluster names a flat cell index past the end of the matrix.
    #[error("cluster cell {index} lies outside a {size}x{size} matrix")]
    CellOutOfRange { index: usize, size: usize },

    /// Smoothing intensity outside `[0, 1]` (or NaN).
    #[error("smoothing intensity {value} is outside [0, 1]")]
    SmoothingOutOfRange { value: f64 },

    /// Module pitch must be finite and positive.
    #[error("module pitch {value} must be finite and positive")]
    InvalidPitch { value: f64 },

    /// A shape parameter (`scale`, `roundness`) outside `[0, 1]` (or NaN).
    #[error("shape parameter `{name}` = {value} is outside [0, 1]")]
    ShapeParamOutOfRange { name: &'static str, value: f64 },

    /// The minimum merged-cluster size must be at least one module.
    #[error("minimum cluster size must be at least 1, got {value}")]
    InvalidClusterSize { value: usize },

    /// No renderer is registered for the requested shape kind.
    #[error("no renderer registered for shape `{kind}` (cell ({row}, {col}))")]
    UnregisteredShape {
        kind: ShapeKind,
        row: usize,
        col: usize,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
