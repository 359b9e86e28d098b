//! Dense containers
//!
//! Both containers own exactly one backend buffer and describe it with a
//! packed storage descriptor (offset 0, minimal leading dimension).

mod matrix;
mod vector;

pub use matrix::DenseMatrix;
pub use vector::DenseVector;
