//! Error types for the core geometry crate.

use thiserror::Error;

/// Errors raised by region algebra and curve conversion.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// A loop that must carry vertices has none.
    #[error("Curve has no vertices")]
    EmptyCurve,

    /// An operation produced or received geometry it cannot work with.
    #[error("Degenerate geometry: {0}")]
    Degenerate(String),

    /// The underlying contour kernel failed.
    #[error("Geometry kernel failure: {0}")]
    Kernel(String),
}

/// Top-level error for core operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    /// Work was abandoned because its cancellation token fired.
    #[error("Operation cancelled")]
    Cancelled,
}

/// Result type alias for geometry operations.
pub type GeometryResult<T> = Result<T, GeometryError>;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
