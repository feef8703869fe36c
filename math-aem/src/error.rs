//! Error types for the analytic element solver.
//!
//! Configuration problems (misplaced elements, bad inputs) are kept apart from
//! numerical failures (singular systems) so callers can report the former as
//! user-facing setup issues.

use crate::solver::LuError;
use thiserror::Error;

/// Errors that can occur while building, solving or querying a model.
#[derive(Debug, Error)]
pub enum AemError {
    /// An element was placed where its physics does not apply.
    #[error("invalid placement of {element}: {reason}")]
    InvalidPlacement {
        /// Display form of the offending element
        element: String,
        /// Why the placement was rejected
        reason: String,
    },

    /// The assembled system is singular or ill-posed.
    #[error("model not solvable: {0}")]
    NotSolvable(String),

    /// An equation block or the global system has the wrong shape.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Expected size
        expected: usize,
        /// Actual size
        got: usize,
    },

    /// The solve was cancelled or ran past its deadline.
    #[error("solve cancelled")]
    Cancelled,

    /// Invalid physical or geometric input.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// A head or potential query named a layer the aquifer does not have.
    #[error("layer {layer} out of range for aquifer with {naq} layer(s)")]
    LayerOutOfRange {
        /// Requested layer
        layer: usize,
        /// Number of layers in the aquifer at the query point
        naq: usize,
    },

    /// IO error while reading or writing a configuration
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized `Result` type for AEM operations.
pub type Result<T> = std::result::Result<T, AemError>;

impl AemError {
    /// Returns `true` for errors caused by the model setup rather than numerics.
    ///
    /// This includes placement, parameter, layer and configuration file errors.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            AemError::InvalidPlacement { .. }
                | AemError::InvalidParameters(_)
                | AemError::LayerOutOfRange { .. }
                | AemError::Io(_)
                | AemError::Json(_)
        )
    }

    /// Returns `true` for failures of the linear system itself.
    pub fn is_numerical_error(&self) -> bool {
        matches!(
            self,
            AemError::NotSolvable(_) | AemError::DimensionMismatch { .. }
        )
    }
}

impl From<LuError> for AemError {
    fn from(err: LuError) -> Self {
        match err {
            LuError::SingularMatrix => AemError::NotSolvable(
                "singular system; add a reference point or remove a duplicate constant-head element"
                    .to_string(),
            ),
            LuError::DimensionMismatch { expected, got } => {
                AemError::DimensionMismatch { expected, got }
            }
            LuError::Cancelled => AemError::Cancelled,
        }
    }
}
