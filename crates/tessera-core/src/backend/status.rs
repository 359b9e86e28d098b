//! Status codes returned across the native routine boundary

use std::fmt;

/// Outcome of a native routine or of a queued device command
///
/// Mirrors the status set of native BLAS libraries: argument validation
/// failures are reported before any work is issued, execution failures are
/// reported through the completion event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StatusCode {
    Success,
    /// A dimension argument is inconsistent with the other arguments
    InvalidDimension,
    InvalidLeadingDimensionA,
    InvalidLeadingDimensionC,
    /// Vector increment of zero
    InvalidIncrement,
    /// Buffer of the first operand is too small for offset and geometry
    InsufficientMemoryA,
    /// Buffer of the second operand is too small for offset and geometry
    InsufficientMemoryB,
    /// Buffer of the output operand is too small for offset and geometry
    InsufficientMemoryC,
    /// The queue is shut down or its worker is gone
    InvalidQueue,
    /// A command panicked or a buffer lock was poisoned
    InternalError,
}

impl StatusCode {
    #[inline]
    pub fn is_success(self) -> bool {
        self == StatusCode::Success
    }

    /// Convert into a `Result`, keeping the failing code as the error
    #[inline]
    pub fn into_result(self) -> std::result::Result<(), StatusCode> {
        if self.is_success() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StatusCode::Success => "success",
            StatusCode::InvalidDimension => "invalid dimension",
            StatusCode::InvalidLeadingDimensionA => "invalid leading dimension of A",
            StatusCode::InvalidLeadingDimensionC => "invalid leading dimension of C",
            StatusCode::InvalidIncrement => "invalid increment",
            StatusCode::InsufficientMemoryA => "insufficient memory for A",
            StatusCode::InsufficientMemoryB => "insufficient memory for B",
            StatusCode::InsufficientMemoryC => "insufficient memory for C",
            StatusCode::InvalidQueue => "invalid queue",
            StatusCode::InternalError => "internal error",
        };
        f.write_str(text)
    }
}
