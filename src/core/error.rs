use std::fmt;
use std::time::Duration;

/// Failures surfaced by the capture pipeline.
///
/// Validation variants are returned synchronously and never change state.
/// Transient variants come back from the dispatch boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureError {
    /// Recording started without a label
    MissingLabel,
    /// Recording started while no hand was in view
    NoHandDetected,
    /// Command issued while the session is in a state that cannot accept it
    Busy(&'static str),
    /// Completed sequence contained no detected hand at all
    EmptySequence,
    /// Frame or sequence shape does not match the configured geometry
    ShapeMismatch { expected: usize, actual: usize },
    /// Upload or prediction request failed
    Transient(String),
    /// Upload or prediction request did not complete in time
    Timeout(Duration),
}

impl CaptureError {
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CaptureError::MissingLabel
                | CaptureError::NoHandDetected
                | CaptureError::Busy(_)
                | CaptureError::EmptySequence
        )
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, CaptureError::Transient(_) | CaptureError::Timeout(_))
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::MissingLabel => write!(f, "a gesture label is required"),
            CaptureError::NoHandDetected => write!(f, "no hand detected"),
            CaptureError::Busy(state) => write!(f, "session busy ({state})"),
            CaptureError::EmptySequence => {
                write!(f, "sequence contains no detected hand")
            }
            CaptureError::ShapeMismatch { expected, actual } => {
                write!(f, "shape mismatch: expected {expected}, got {actual}")
            }
            CaptureError::Transient(msg) => write!(f, "request failed: {msg}"),
            CaptureError::Timeout(after) => {
                write!(f, "request timed out after {}ms", after.as_millis())
            }
        }
    }
}

impl std::error::Error for CaptureError {}
