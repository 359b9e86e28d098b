//! Kernel dispatch for dense linear algebra across host and device backends
//!
//! Dispatch functions take expressions from `tessera-core`, check shapes,
//! turn type-level facts (orientation, triangle half, backend) into the
//! flat argument list of a native routine, and issue it.
//!
//! # Architecture Overview
//!
//! 1. **Primitives** - dot products per element type, scalar or AVX2
//! 2. **Native routines** - BLAS-style entry points for the host and the
//!    device queue, reporting [`StatusCode`](tessera_core::StatusCode)s
//! 3. **Dispatch** - [`syrk`] and [`dot`], generic over expressions and
//!    specialized per backend through [`SyrkBackend`] and [`DotBackend`]
//!
//! # Example
//!
//! ```rust
//! use tessera_core::prelude::*;
//! use tessera_kernels::{dot, syrk};
//!
//! let queue = Queue::with_defaults().unwrap();
//! let a = DenseMatrix::<f64, Device>::from_rows(&queue, &[[1.0, 0.0], [2.0, 1.0]]).unwrap();
//! let mut c = DenseMatrix::<f64, Device>::zeros(&queue, 2, 2).unwrap();
//!
//! // Issued on the queue; the read below is ordered after it
//! let pending = syrk::<Lower, _, _>(&a, &mut c, 1.0).unwrap();
//! assert_eq!(c.to_vec().unwrap(), vec![1.0, 0.0, 2.0, 5.0]);
//! assert!(pending.is_complete());
//!
//! let x = DenseVector::<f64, Device>::from_vec(&queue, vec![1.0, 2.0]).unwrap();
//! let mut result = 0.0;
//! dot(&x, &x, &mut result).unwrap();
//! assert_eq!(result, 5.0);
//! ```

pub mod dot;
pub mod native;
pub mod primitives;
pub mod syrk;

pub use dot::{dot, inner, DotBackend};
pub use primitives::{
    primitives_name, Avx2Primitives, DotPrimitives, ScalarPrimitives, SelectPrimitives,
};
pub use syrk::{syrk, SyrkBackend};
