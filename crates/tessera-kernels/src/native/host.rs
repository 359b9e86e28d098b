//! Host reference routines
//!
//! Same argument lists as the device library, executed on the calling
//! thread (or the rayon pool, when the context asks for it and the
//! `parallel` feature is on).

use super::{pack_op_a, validate_inner_product, validate_syrk, SyrkPlan};
use crate::primitives::{DotPrimitives, SelectPrimitives};
use tessera_core::{HostContext, Layout, StatusCode, Transpose, Triangle};
use tracing::{instrument, trace};

/// Multiply-adds of a triangle update, roughly `n * n * k / 2`, saturating
fn syrk_work(n: usize, k: usize) -> usize {
    n.saturating_mul(n).saturating_mul(k) / 2
}

/// `C <- alpha * op(A) * op(A)ᵀ + beta * C` on one triangle of C
#[allow(clippy::too_many_arguments)]
#[instrument(level = "trace", skip_all, fields(?layout, ?triangle, ?transpose, n, k))]
pub fn syrk<T: SelectPrimitives>(
    context: &HostContext,
    layout: Layout,
    triangle: Triangle,
    transpose: Transpose,
    n: usize,
    k: usize,
    alpha: T,
    a: &[T],
    a_offset: usize,
    lda: usize,
    beta: T,
    c: &mut [T],
    c_offset: usize,
    ldc: usize,
) -> StatusCode {
    let status = validate_syrk(
        layout,
        transpose,
        n,
        k,
        a.len(),
        a_offset,
        lda,
        c.len(),
        c_offset,
        ldc,
    );
    if !status.is_success() {
        return status;
    }

    let packed = pack_op_a(layout, transpose, n, k, a, a_offset, lda);
    let plan = SyrkPlan {
        primitives: T::primitives(),
        layout,
        triangle,
        n,
        k,
        alpha,
        beta,
        packed: &packed,
    };
    let parallel = cfg!(feature = "parallel") && context.prefers_parallel(syrk_work(n, k));
    trace!(
        n,
        k,
        parallel,
        primitives = plan.primitives.backend_name(),
        "host syrk"
    );
    plan.run(&mut c[c_offset..], ldc, parallel);
    StatusCode::Success
}

/// Strided inner product of `n` elements
#[allow(clippy::too_many_arguments)]
pub fn inner_product<T: SelectPrimitives>(
    n: usize,
    x: &[T],
    x_offset: usize,
    incx: usize,
    y: &[T],
    y_offset: usize,
    incy: usize,
) -> Result<T, StatusCode> {
    let status = validate_inner_product(n, x.len(), x_offset, incx, y.len(), y_offset, incy);
    if !status.is_success() {
        return Err(status);
    }
    Ok(T::primitives().dot_strided(n, x, x_offset, incx, y, y_offset, incy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_work_estimate_saturates() {
        assert_eq!(syrk_work(4, 3), 24);
        assert_eq!(syrk_work(0, 1 << 20), 0);
        assert_eq!(syrk_work(usize::MAX, 2), usize::MAX / 2);
        assert_eq!(syrk_work(usize::MAX / 3, 4), usize::MAX / 2);
        assert!(HostContext::default().prefers_parallel(syrk_work(usize::MAX, usize::MAX)));
    }

    #[test]
    fn test_host_syrk_upper_column_major() {
        // A = [[1, 2], [3, 4], [5, 6]] column-major, C = 0
        let a = [1.0, 3.0, 5.0, 2.0, 4.0, 6.0];
        let mut c = vec![0.0; 9];
        let status = syrk(
            &HostContext::sequential(),
            Layout::ColumnMajor,
            Triangle::Upper,
            Transpose::No,
            3,
            2,
            1.0,
            &a,
            0,
            3,
            1.0,
            &mut c,
            0,
            3,
        );
        assert_eq!(status, StatusCode::Success);
        // A·Aᵀ = [[5, 11, 17], [11, 25, 39], [17, 39, 61]]; upper half only
        let expected = [5.0, 0.0, 0.0, 11.0, 25.0, 0.0, 17.0, 39.0, 61.0];
        for (got, want) in c.iter().zip(expected.iter()) {
            assert_relative_eq!(*got, *want);
        }
    }

    #[test]
    fn test_host_syrk_with_offsets() {
        // C is the 2x2 block at offset 1 of a 3-wide row-major buffer
        let a = [9, 1, 2, 3, 4];
        let mut c = vec![7, 1, 1, 7, 1, 1];
        let status = syrk(
            &HostContext::default(),
            Layout::RowMajor,
            Triangle::Lower,
            Transpose::No,
            2,
            2,
            2,
            &a,
            1,
            2,
            1,
            &mut c,
            1,
            3,
        );
        assert_eq!(status, StatusCode::Success);
        // 2·A·Aᵀ = [[10, 22], [22, 50]]
        assert_eq!(c, vec![7, 11, 1, 7, 23, 51]);
    }

    #[test]
    fn test_host_syrk_reports_bad_arguments() {
        let a = [1.0f32; 4];
        let mut c = vec![0.0f32; 4];
        let status = syrk(
            &HostContext::default(),
            Layout::RowMajor,
            Triangle::Upper,
            Transpose::No,
            2,
            2,
            1.0,
            &a,
            1,
            2,
            1.0,
            &mut c,
            0,
            2,
        );
        assert_eq!(status, StatusCode::InsufficientMemoryA);
        assert_eq!(c, vec![0.0; 4]);
    }

    #[test]
    fn test_host_inner_product() {
        let x = [1i64, 2, 3];
        let y = [4i64, 0, 5, 0, 6];
        assert_eq!(inner_product(3, &x, 0, 1, &y, 0, 2), Ok(32));
        assert_eq!(inner_product(0, &x, 0, 1, &y, 0, 1), Ok(0));
        assert_eq!(
            inner_product(3, &x, 1, 1, &y, 0, 2),
            Err(StatusCode::InsufficientMemoryA)
        );
    }
}
