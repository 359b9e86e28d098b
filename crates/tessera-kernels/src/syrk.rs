//! Symmetric rank-k update
//!
//! `C <- C + alpha * A * Aᵀ` on the declared half of a dense square `C`.
//!
//! Every flag the native routine needs is derived from types:
//!
//! - **layout** from the orientation of `C`
//! - **transpose** from comparing the orientations of `A` and `C`; an `A`
//!   stored the other way round is the same data read transposed
//! - **triangle** from the [`TriangleTag`] type parameter
//!
//! Shapes are checked before anything is evaluated or issued, so a mismatch
//! never leaves a trace on `C` or on a device queue.

use crate::native;
use crate::primitives::SelectPrimitives;
use tessera_core::{
    transpose_between, Backend, Completion, DenseStorageMut, Device, DeviceBuffer, Error,
    Evaluate, Host, HostContext, Layout, MatrixExpression, Orientation, Queue, Result,
    StatusCode, Transpose, Triangle, TriangleTag,
};
use tracing::{debug, warn};

/// Backends with a native syrk routine
pub trait SyrkBackend: Backend {
    /// Issue the native routine on raw buffers
    ///
    /// Arguments follow the flat BLAS convention of [`native::host::syrk`].
    #[allow(clippy::too_many_arguments)]
    fn syrk<T: SelectPrimitives>(
        context: &Self::Context,
        layout: Layout,
        triangle: Triangle,
        transpose: Transpose,
        n: usize,
        k: usize,
        alpha: T,
        a: &Self::Buffer<T>,
        a_offset: usize,
        lda: usize,
        beta: T,
        c: &mut Self::Buffer<T>,
        c_offset: usize,
        ldc: usize,
    ) -> std::result::Result<Completion, StatusCode>;
}

impl SyrkBackend for Host {
    #[allow(clippy::too_many_arguments)]
    fn syrk<T: SelectPrimitives>(
        context: &HostContext,
        layout: Layout,
        triangle: Triangle,
        transpose: Transpose,
        n: usize,
        k: usize,
        alpha: T,
        a: &Vec<T>,
        a_offset: usize,
        lda: usize,
        beta: T,
        c: &mut Vec<T>,
        c_offset: usize,
        ldc: usize,
    ) -> std::result::Result<Completion, StatusCode> {
        native::host::syrk(
            context, layout, triangle, transpose, n, k, alpha, a, a_offset, lda, beta, c,
            c_offset, ldc,
        )
        .into_result()?;
        Ok(Completion::ready())
    }
}

impl SyrkBackend for Device {
    #[allow(clippy::too_many_arguments)]
    fn syrk<T: SelectPrimitives>(
        context: &Queue,
        layout: Layout,
        triangle: Triangle,
        transpose: Transpose,
        n: usize,
        k: usize,
        alpha: T,
        a: &DeviceBuffer<T>,
        a_offset: usize,
        lda: usize,
        beta: T,
        c: &mut DeviceBuffer<T>,
        c_offset: usize,
        ldc: usize,
    ) -> std::result::Result<Completion, StatusCode> {
        native::device::syrk(
            layout, triangle, transpose, n, k, alpha, a, a_offset, lda, beta, c, c_offset, ldc,
            context,
        )
        .map(Completion::in_flight)
    }
}

/// `C <- C + alpha * A * Aᵀ`, writing only the `Tri` half of `C`
///
/// `A` is `n x k` and `C` is `n x n`. `A` may be any dense expression; one
/// that is not backed by storage is evaluated into a temporary first.
/// Existing contents of `C` are always accumulated into, never overwritten.
///
/// On the device backend the returned [`Completion`] is in flight: later
/// commands on the same queue observe the result, host code must call
/// [`Completion::wait`] (or read through the queue) first.
///
/// # Errors
///
/// - [`Error::DimensionMismatch`] if `A.rows != C.rows` or `C` is not
///   square; nothing is evaluated or issued in that case
/// - [`Error::BackendCall`] if the native routine rejects the call
///
/// # Example
///
/// ```rust
/// use tessera_core::prelude::*;
/// use tessera_kernels::syrk;
///
/// let a = DenseMatrix::<f64>::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]).unwrap();
/// let mut c = DenseMatrix::<f64>::new(2, 2);
/// syrk::<Upper, _, _>(&a, &mut c, 1.0).unwrap().wait().unwrap();
///
/// // Upper half of A·Aᵀ; the strictly lower part stays zero
/// assert_eq!(c.as_slice(), &[5.0, 11.0, 0.0, 25.0]);
/// ```
pub fn syrk<Tri, A, C>(a: &A, c: &mut C, alpha: C::Value) -> Result<Completion>
where
    Tri: TriangleTag,
    C: DenseStorageMut,
    C::Value: SelectPrimitives,
    C::Backend: SyrkBackend,
    A: Evaluate<Value = C::Value, Backend = C::Backend>,
{
    let n = c.rows();
    let k = a.cols();
    if a.rows() != n {
        return Err(Error::dimension_mismatch("syrk", n, a.rows()));
    }
    if c.cols() != n {
        return Err(Error::dimension_mismatch("syrk", n, c.cols()));
    }

    let layout = <C::Orientation as Orientation>::LAYOUT;
    let transpose = transpose_between::<A::Orientation, C::Orientation>();
    let triangle = Tri::TRIANGLE;

    let evaluated = a.evaluate()?;
    let a_storage = evaluated.storage();
    let context = c.context().clone();
    let mut c_storage = c.raw_storage_mut();
    let (c_offset, ldc) = (c_storage.offset(), c_storage.leading_dimension());

    debug!(
        backend = <C::Backend as Backend>::NAME,
        ty = <C::Value as tessera_core::Numeric>::NAME,
        ?layout,
        ?triangle,
        ?transpose,
        n,
        k,
        lda = a_storage.leading_dimension(),
        ldc,
        materialized = evaluated.is_materialized(),
        "syrk"
    );

    <C::Backend as SyrkBackend>::syrk(
        &context,
        layout,
        triangle,
        transpose,
        n,
        k,
        alpha,
        a_storage.buffer(),
        a_storage.offset(),
        a_storage.leading_dimension(),
        <C::Value as num_traits::One>::one(),
        c_storage.buffer_mut(),
        c_offset,
        ldc,
    )
    .map_err(|status| {
        warn!(%status, n, k, "native syrk failed");
        Error::backend_call("syrk", status)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tessera_core::{ColumnMajor, DenseMatrix, Lower, RowMajor, Scaled, Transposed, Upper};

    fn reference(a: &[f64], k: usize, i: usize, j: usize) -> f64 {
        (0..k).map(|p| a[i * k + p] * a[j * k + p]).sum()
    }

    #[test]
    fn test_syrk_upper_row_major() {
        let a = DenseMatrix::<f64>::from_row_slice(3, 2, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let mut c = DenseMatrix::<f64>::from_fn(3, 3, |_, _| 1.0).unwrap();
        syrk::<Upper, _, _>(&a, &mut c, 2.0).unwrap().wait().unwrap();

        let values = a.as_slice().to_vec();
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i <= j {
                    1.0 + 2.0 * reference(&values, 2, i, j)
                } else {
                    1.0
                };
                assert_relative_eq!(c[(i, j)], expected);
            }
        }
    }

    #[test]
    fn test_syrk_mixed_orientation_reads_transposed() {
        // Same A stored column-major, C row-major: transpose flag flips
        let a = DenseMatrix::<f64, Host, ColumnMajor>::from_fn(3, 2, |i, j| (i * 2 + j + 1) as f64).unwrap();
        let mut c = DenseMatrix::<f64>::new(3, 3);
        assert_eq!(
            transpose_between::<ColumnMajor, RowMajor>(),
            Transpose::Yes
        );
        syrk::<Lower, _, _>(&a, &mut c, 1.0).unwrap();

        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        for i in 0..3 {
            for j in 0..=i {
                assert_relative_eq!(c[(i, j)], reference(&values, 2, i, j));
            }
        }
        assert_eq!(c[(0, 2)], 0.0);
    }

    #[test]
    fn test_syrk_transposed_view() {
        // Aᵀ of a 2x3 matrix is the 3x2 operand
        let at = DenseMatrix::<f64>::from_row_slice(2, 3, &[1.0, 3.0, 5.0, 2.0, 4.0, 6.0]).unwrap();
        let mut c = DenseMatrix::<f64>::new(3, 3);
        syrk::<Upper, _, _>(&Transposed::new(&at), &mut c, 1.0).unwrap();
        assert_relative_eq!(c[(0, 0)], 5.0);
        assert_relative_eq!(c[(0, 2)], 17.0);
        assert_relative_eq!(c[(2, 2)], 61.0);
        assert_eq!(c[(2, 0)], 0.0);
    }

    #[test]
    fn test_syrk_lazy_operand_is_materialized() {
        let a = DenseMatrix::<f64>::from_row_slice(2, 1, &[1.0, 2.0]).unwrap();
        let mut c = DenseMatrix::<f64>::new(2, 2);
        syrk::<Lower, _, _>(&Scaled::new(3.0, &a), &mut c, 1.0).unwrap();
        // (3A)(3A)ᵀ = 9 * [[1, 2], [2, 4]]
        assert_eq!(c.as_slice(), &[9.0, 0.0, 18.0, 36.0]);
    }

    #[test]
    fn test_syrk_dimension_mismatch_leaves_c() {
        let a = DenseMatrix::<f64>::from_fn(2, 4, |_, _| 1.0).unwrap();
        let mut c = DenseMatrix::<f64>::from_fn(3, 3, |i, j| (i + j) as f64).unwrap();
        let before = c.clone();
        let err = syrk::<Upper, _, _>(&a, &mut c, 1.0).unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch {
                operation: "syrk",
                expected: 3,
                actual: 2
            }
        ));
        assert_eq!(c, before);

        let mut not_square = DenseMatrix::<f64>::new(2, 3);
        assert!(syrk::<Upper, _, _>(&a, &mut not_square, 1.0).is_err());
    }

    #[test]
    fn test_syrk_on_device() {
        let queue = Queue::with_defaults().unwrap();
        let a = DenseMatrix::<f32, Device>::from_vec(&queue, 2, 2, vec![1.0, 2.0, 3.0, 4.0])
            .unwrap();
        let mut c = DenseMatrix::<f32, Device>::zeros(&queue, 2, 2).unwrap();
        let done = syrk::<Upper, _, _>(&a, &mut c, 1.0).unwrap();
        done.wait().unwrap();
        assert_eq!(c.to_vec().unwrap(), vec![5.0, 11.0, 0.0, 25.0]);
    }

    #[test]
    fn test_syrk_device_reads_are_ordered() {
        // Two updates issued back to back, read without an explicit wait
        let queue = Queue::with_defaults().unwrap();
        let a = DenseMatrix::<f64, Device>::from_vec(&queue, 1, 1, vec![2.0]).unwrap();
        let mut c = DenseMatrix::<f64, Device>::zeros(&queue, 1, 1).unwrap();
        let _first = syrk::<Lower, _, _>(&a, &mut c, 1.0).unwrap();
        let _second = syrk::<Lower, _, _>(&a, &mut c, 0.5).unwrap();
        assert_eq!(c.to_vec().unwrap(), vec![6.0]);
    }
}
