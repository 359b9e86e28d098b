//! Backend-generic dense kernels and batch containers
//!
//! This crate re-exports the workspace members:
//!
//! - [`tessera_core`]: backend tags, containers, expressions and the device queue
//! - [`tessera_kernels`]: `syrk` and `dot` dispatch over host and device backends
//! - [`tessera_batch`]: batch aggregates for scalars, dense and sparse vectors
//!
//! # Example
//!
//! ```rust
//! use tessera::prelude::*;
//!
//! let points = vec![
//!     DenseVector::from_slice(&[1.0, 0.0]),
//!     DenseVector::from_slice(&[0.0, 2.0]),
//! ];
//! let batch = Batch::create_from_range(&points).unwrap();
//!
//! // Gram matrix of the batch rows, upper half only
//! let mut gram = DenseMatrix::<f64>::new(2, 2);
//! syrk::<Upper, _, _>(&batch, &mut gram, 1.0).unwrap();
//! assert_eq!(gram.as_slice(), &[1.0, 0.0, 0.0, 4.0]);
//! ```

pub use tessera_batch;
pub use tessera_core;
pub use tessera_kernels;

pub use tessera_core::{Error, Result};

pub mod prelude {
    pub use tessera_batch::{Batch, BatchAggregate, BatchElement, BatchOf};
    pub use tessera_core::prelude::*;
    pub use tessera_kernels::{dot, inner, syrk};
}
