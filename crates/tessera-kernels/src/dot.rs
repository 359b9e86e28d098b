//! Inner product of two dense vectors
//!
//! The reduction runs where the operands live. On the device backend it is
//! issued on the operands' queue and the call blocks until it has run, so
//! the result always reflects earlier commands that wrote `x` or `y`.

use crate::native;
use crate::primitives::SelectPrimitives;
use tessera_core::{
    Backend, DenseVectorStorage, Device, DeviceBuffer, Error, Host, HostContext, Queue, Result,
    StatusCode, VectorExpression,
};
use tracing::{debug, warn};

/// Backends with a native range reduction
pub trait DotBackend: Backend {
    /// Strided inner product of `n` elements on raw buffers
    #[allow(clippy::too_many_arguments)]
    fn inner_product<T: SelectPrimitives>(
        context: &Self::Context,
        n: usize,
        x: &Self::Buffer<T>,
        x_offset: usize,
        incx: usize,
        y: &Self::Buffer<T>,
        y_offset: usize,
        incy: usize,
    ) -> std::result::Result<T, StatusCode>;
}

impl DotBackend for Host {
    #[allow(clippy::too_many_arguments)]
    fn inner_product<T: SelectPrimitives>(
        _context: &HostContext,
        n: usize,
        x: &Vec<T>,
        x_offset: usize,
        incx: usize,
        y: &Vec<T>,
        y_offset: usize,
        incy: usize,
    ) -> std::result::Result<T, StatusCode> {
        native::host::inner_product(n, x, x_offset, incx, y, y_offset, incy)
    }
}

impl DotBackend for Device {
    #[allow(clippy::too_many_arguments)]
    fn inner_product<T: SelectPrimitives>(
        context: &Queue,
        n: usize,
        x: &DeviceBuffer<T>,
        x_offset: usize,
        incx: usize,
        y: &DeviceBuffer<T>,
        y_offset: usize,
        incy: usize,
    ) -> std::result::Result<T, StatusCode> {
        native::device::inner_product(n, x, x_offset, incx, y, y_offset, incy, context)
    }
}

/// `result <- sum(x[i] * y[i])` over the length of `x`
///
/// Accumulation starts from zero; whatever `result` held before is
/// replaced. Equal lengths are the caller's responsibility: a `y` shorter
/// than `x` is only caught by the native routine, as a backend failure.
///
/// # Example
///
/// ```rust
/// use tessera_core::prelude::*;
/// use tessera_kernels::dot;
///
/// let x = DenseVector::from_slice(&[1.0, 2.0, 3.0]);
/// let y = DenseVector::from_slice(&[4.0, 5.0, 6.0]);
/// let mut result = 0.0;
/// dot(&x, &y, &mut result).unwrap();
/// assert_eq!(result, 32.0);
/// ```
pub fn dot<X, Y>(x: &X, y: &Y, result: &mut X::Value) -> Result<()>
where
    X: DenseVectorStorage,
    X::Value: SelectPrimitives,
    X::Backend: DotBackend,
    Y: DenseVectorStorage<Value = X::Value, Backend = X::Backend>,
{
    *result = inner(x, y)?;
    Ok(())
}

/// Like [`dot`], returning the value
pub fn inner<X, Y>(x: &X, y: &Y) -> Result<X::Value>
where
    X: DenseVectorStorage,
    X::Value: SelectPrimitives,
    X::Backend: DotBackend,
    Y: DenseVectorStorage<Value = X::Value, Backend = X::Backend>,
{
    let n = x.len();
    let xs = x.raw_storage();
    let ys = y.raw_storage();

    debug!(
        backend = <X::Backend as Backend>::NAME,
        n,
        incx = xs.stride(),
        incy = ys.stride(),
        "dot"
    );

    <X::Backend as DotBackend>::inner_product(
        x.context(),
        n,
        xs.buffer(),
        xs.offset(),
        xs.stride(),
        ys.buffer(),
        ys.offset(),
        ys.stride(),
    )
    .map_err(|status| {
        warn!(%status, n, "native inner product failed");
        Error::backend_call("dot", status)
    })
}
