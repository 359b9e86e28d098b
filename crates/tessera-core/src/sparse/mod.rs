//! Sparse containers
//!
//! [`CompressedVector`] is the sparse counterpart of a dense vector and
//! [`CompressedMatrix`] stores many of them as the rows of one CSR
//! structure.

mod matrix;
mod rows;
mod vector;

pub use matrix::CompressedMatrix;
pub use rows::{SparseRow, SparseRowIter, SparseRowIterMut, SparseRowMut};
pub use vector::CompressedVector;
