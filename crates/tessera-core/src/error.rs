//! Error types for kernel dispatch and batch construction
//!
//! Provides a unified error type for all tessera crates.

use crate::backend::StatusCode;
use thiserror::Error;

/// Core error type for tessera operations
#[derive(Error, Debug)]
pub enum Error {
    /// Operand shapes violate a kernel precondition
    #[error("Dimension mismatch in {operation}: expected {expected}, got {actual}")]
    DimensionMismatch {
        operation: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Storage geometry that does not describe an addressable region
    #[error("Invalid layout: {0}")]
    InvalidLayout(String),

    /// A native routine reported a non-success status
    #[error("Backend call {routine} failed with status {status}")]
    BackendCall {
        routine: &'static str,
        status: StatusCode,
    },

    /// Elements of a sparse range disagree on their declared dimension
    #[error("Sparse construction: element {index} has dimension {actual}, expected {expected}")]
    SparseConstruction {
        index: usize,
        expected: usize,
        actual: usize,
    },

    /// A batch was requested from a range that has no elements
    #[error("Empty range: {0} requires at least one element")]
    EmptyRange(&'static str),

    /// The device queue is shut down or its worker is gone
    #[error("Queue error: {0}")]
    Queue(String),

    /// IO error (worker thread spawn)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an error for mismatching operand sizes
    pub fn dimension_mismatch(operation: &'static str, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            operation,
            expected,
            actual,
        }
    }

    /// Create an error for a failed native routine
    pub fn backend_call(routine: &'static str, status: StatusCode) -> Self {
        Self::BackendCall { routine, status }
    }

    /// Whether the error leaves the operation without any recovery path
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::BackendCall { .. } | Self::Queue(_))
    }
}
