//! Core types for backend-generic dense and sparse linear algebra
//!
//! This crate holds everything a kernel needs to know about its operands
//! before it calls a native routine.
//!
//! # Architecture Overview
//!
//! 1. **Tags** - zero-size markers for backend, storage category,
//!    orientation and triangle half, all resolved at compile time
//! 2. **Storage descriptors** - validated buffer + offset + leading
//!    dimension triples, the only form in which kernels see memory
//! 3. **Expressions** - traits tagging matrices and vectors with element
//!    type, backend, orientation and category, plus the evaluate-if-needed
//!    adapter
//! 4. **Containers** - dense and compressed vectors and matrices, with row
//!    views that let a matrix act as a sequence of vectors
//! 5. **Backends** - the host backend and an in-process compute device with
//!    a single in-order queue
//!
//! # Example
//!
//! ```rust
//! use tessera_core::prelude::*;
//!
//! let m = DenseMatrix::<f64>::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
//! let desc = m.raw_storage();
//! assert_eq!(desc.leading_dimension(), 3);
//!
//! // The transposed view reads the same buffer in the other orientation
//! let t = m.t();
//! assert_eq!(t.shape(), (3, 2));
//! assert_eq!(t.raw_storage().leading_dimension(), 3);
//!
//! for row in &m {
//!     assert_eq!(row.len(), 3);
//! }
//! ```

pub mod backend;
pub mod dense;
pub mod error;
pub mod expression;
pub mod numeric;
pub mod rows;
pub mod sparse;
pub mod storage;
pub mod tags;

pub use error::{Error, Result};

pub use backend::{
    Backend, BackendKind, Completion, Device, DeviceBuffer, Event, EventStatus, ExecutionStrategy,
    Host, HostContext, Queue, QueueConfig, StatusCode,
};
pub use dense::{DenseMatrix, DenseVector};
pub use expression::{
    DenseStorage, DenseStorageMut, DenseVectorStorage, Evaluate, Evaluated, MatrixExpression,
    Scaled, Transposed, VectorExpression,
};
pub use numeric::Numeric;
pub use rows::{MatrixRow, MatrixRowMut, RowIter, RowIterMut};
pub use sparse::{
    CompressedMatrix, CompressedVector, SparseRow, SparseRowIter, SparseRowIterMut, SparseRowMut,
};
pub use storage::{StorageDescriptor, StorageDescriptorMut, VectorDescriptor};
pub use tags::{
    transpose_between, ColumnMajor, Dense, Layout, Lower, Orientation, RowMajor, Sparse,
    StorageCategory, StorageKind, Transpose, Triangle, TriangleTag, Upper,
};

/// Common imports for users of the containers and expression traits
pub mod prelude {
    pub use crate::backend::{Backend, Completion, Device, Host, HostContext, Queue};
    pub use crate::dense::{DenseMatrix, DenseVector};
    pub use crate::expression::{
        DenseStorage, DenseStorageMut, DenseVectorStorage, Evaluate, Evaluated,
        MatrixExpression, VectorExpression,
    };
    pub use crate::numeric::Numeric;
    pub use crate::sparse::{CompressedMatrix, CompressedVector};
    pub use crate::tags::{ColumnMajor, Lower, RowMajor, Upper};
    pub use crate::{Error, Result};
}
