//! Error types for toolpath planning.
//!
//! Parameter problems are rejected before any motion is planned. Geometry and
//! medial-axis failures abort planning of the region they occur in only.

use pocketkit_core::{CoreError, GeometryError};
use thiserror::Error;

/// Errors that can occur while planning a pocket.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolpathError {
    /// Invalid parameters were provided to a planner.
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// A parameter validation error occurred.
    #[error("Parameter error: {0}")]
    Parameter(#[from] ParameterError),

    /// The geometry kernel returned a degenerate or unexpected result.
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    /// Trochoidal planning could not build a medial axis.
    #[error("Medial axis error: {0}")]
    MedialAxis(#[from] MedialAxisError),

    /// Planning stopped because its cancellation token fired.
    #[error("Planning cancelled")]
    Cancelled,
}

/// Errors related to planning parameter validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    /// A parameter value is out of the valid range.
    #[error("Parameter '{name}' out of range: {value} (valid: {min}..{max})")]
    OutOfRange {
        name: String,
        value: f64,
        min: f64,
        max: f64,
    },

    /// A parameter value is invalid.
    #[error("Invalid value for '{name}': {reason}")]
    InvalidValue { name: String, reason: String },

    /// The depth schedule is empty or not monotonic.
    #[error("Invalid depth sequence: {0}")]
    InvalidDepths(String),
}

/// Errors raised while building the trochoidal skeleton.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MedialAxisError {
    #[error("Region has no boundary spans")]
    NoBoundarySpans,

    #[error("No inscribed circle converged for {0} candidates")]
    NoInscribedCircle(usize),
}

impl From<CoreError> for ToolpathError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Geometry(e) => ToolpathError::Geometry(e),
            CoreError::Cancelled => ToolpathError::Cancelled,
        }
    }
}

/// Result type alias for planning operations.
pub type ToolpathResult<T> = Result<T, ToolpathError>;

/// Result type alias for parameter validation.
pub type ParameterResult<T> = Result<T, ParameterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toolpath_error_display() {
        let err = ToolpathError::InvalidParameters("stepover must be positive".to_string());
        assert_eq!(err.to_string(), "Invalid parameters: stepover must be positive");
        assert_eq!(ToolpathError::Cancelled.to_string(), "Planning cancelled");
    }

    #[test]
    fn test_parameter_error_display() {
        let err = ParameterError::OutOfRange {
            name: "stepover".to_string(),
            value: -1.0,
            min: 0.0,
            max: f64::INFINITY,
        };
        assert_eq!(
            err.to_string(),
            "Parameter 'stepover' out of range: -1 (valid: 0..inf)"
        );
        let err = ParameterError::InvalidDepths("empty".to_string());
        assert_eq!(err.to_string(), "Invalid depth sequence: empty");
    }

    #[test]
    fn test_error_conversion() {
        let err: ToolpathError = MedialAxisError::NoBoundarySpans.into();
        assert!(matches!(err, ToolpathError::MedialAxis(_)));
        let err: ToolpathError = CoreError::Cancelled.into();
        assert_eq!(err, ToolpathError::Cancelled);
        let err: ToolpathError = CoreError::Geometry(GeometryError::EmptyCurve).into();
        assert_eq!(err, ToolpathError::Geometry(GeometryError::EmptyCurve));
    }
}
