//! Native routine boundary
//!
//! Routines here take the flat argument lists of a BLAS library: layout
//! and triangle/transpose flags, dimensions, scalar coefficients, and for
//! every operand a buffer, an offset and a leading dimension or increment.
//! They report failures as [`StatusCode`]s, never as panics.
//!
//! `op(A)` is the `n x k` matrix `A` when `transpose` is [`Transpose::No`]
//! and `Aᵀ` when it is [`Transpose::Yes`]; in the latter case the buffer
//! holds a `k x n` matrix in `layout`.

pub mod device;
pub mod host;

use crate::primitives::DotPrimitives;
use tessera_core::{Layout, Numeric, StatusCode, Transpose, Triangle};

/// Elements spanned by `major` lines of `minor` elements, `ld` apart
fn span(major: usize, minor: usize, ld: usize) -> Option<usize> {
    if major == 0 || minor == 0 {
        return Some(0);
    }
    (major - 1).checked_mul(ld)?.checked_add(minor)
}

/// Shape of the stored A as (rows, cols)
fn stored_a_shape(transpose: Transpose, n: usize, k: usize) -> (usize, usize) {
    match transpose {
        Transpose::No => (n, k),
        Transpose::Yes => (k, n),
    }
}

/// (major lines, minor extent) of a `rows x cols` matrix in `layout`
fn lines(layout: Layout, rows: usize, cols: usize) -> (usize, usize) {
    match layout {
        Layout::RowMajor => (rows, cols),
        Layout::ColumnMajor => (cols, rows),
    }
}

/// Argument checks shared by every syrk implementation
#[allow(clippy::too_many_arguments)]
pub(crate) fn validate_syrk(
    layout: Layout,
    transpose: Transpose,
    n: usize,
    k: usize,
    a_len: usize,
    a_offset: usize,
    lda: usize,
    c_len: usize,
    c_offset: usize,
    ldc: usize,
) -> StatusCode {
    let (rows, cols) = stored_a_shape(transpose, n, k);
    let (a_major, a_minor) = lines(layout, rows, cols);
    if lda < a_minor.max(1) {
        return StatusCode::InvalidLeadingDimensionA;
    }
    if ldc < n.max(1) {
        return StatusCode::InvalidLeadingDimensionC;
    }
    match span(a_major, a_minor, lda).and_then(|s| s.checked_add(a_offset)) {
        Some(end) if end <= a_len => {}
        Some(_) => return StatusCode::InsufficientMemoryA,
        None => return StatusCode::InvalidDimension,
    }
    match span(n, n, ldc).and_then(|s| s.checked_add(c_offset)) {
        Some(end) if end <= c_len => {}
        Some(_) => return StatusCode::InsufficientMemoryC,
        None => return StatusCode::InvalidDimension,
    }
    StatusCode::Success
}

/// Argument checks for a strided range reduction
#[allow(clippy::too_many_arguments)]
pub(crate) fn validate_inner_product(
    n: usize,
    x_len: usize,
    x_offset: usize,
    incx: usize,
    y_len: usize,
    y_offset: usize,
    incy: usize,
) -> StatusCode {
    if n > 1 && (incx == 0 || incy == 0) {
        return StatusCode::InvalidIncrement;
    }
    let fits = |len: usize, offset: usize, inc: usize| {
        span(n, 1, inc)
            .and_then(|s| s.checked_add(offset))
            .map(|end| end <= len)
    };
    match fits(x_len, x_offset, incx) {
        Some(true) => {}
        Some(false) => return StatusCode::InsufficientMemoryA,
        None => return StatusCode::InvalidDimension,
    }
    match fits(y_len, y_offset, incy) {
        Some(true) => {}
        Some(false) => return StatusCode::InsufficientMemoryB,
        None => return StatusCode::InvalidDimension,
    }
    StatusCode::Success
}

/// Copy `op(A)` into a contiguous row-major `n x k` block
///
/// Row `i` of the result is row `i` of `op(A)`, so every product in the
/// update becomes a dot product of two contiguous slices.
pub(crate) fn pack_op_a<T: Numeric>(
    layout: Layout,
    transpose: Transpose,
    n: usize,
    k: usize,
    a: &[T],
    a_offset: usize,
    lda: usize,
) -> Vec<T> {
    let mut packed = Vec::with_capacity(n * k);
    for i in 0..n {
        for p in 0..k {
            // Element (i, p) of op(A) is element (r, c) of the stored matrix
            let (r, c) = match transpose {
                Transpose::No => (i, p),
                Transpose::Yes => (p, i),
            };
            let index = match layout {
                Layout::RowMajor => r * lda + c,
                Layout::ColumnMajor => c * lda + r,
            };
            packed.push(a[a_offset + index]);
        }
    }
    packed
}

/// Coefficients and packed operand of one syrk call
pub(crate) struct SyrkPlan<'a, T: Numeric, P: DotPrimitives<T>> {
    pub primitives: P,
    pub layout: Layout,
    pub triangle: Triangle,
    pub n: usize,
    pub k: usize,
    pub alpha: T,
    pub beta: T,
    pub packed: &'a [T],
}

impl<T: Numeric, P: DotPrimitives<T>> SyrkPlan<'_, T, P> {
    /// Update the declared half of major line `line` of C
    ///
    /// `values` holds the first `n` elements of the line.
    pub fn update_line(&self, line: usize, values: &mut [T]) {
        let k = self.k;
        for (q, value) in values.iter_mut().enumerate().take(self.n) {
            let (i, j) = match self.layout {
                Layout::RowMajor => (line, q),
                Layout::ColumnMajor => (q, line),
            };
            if !self.triangle.contains(i, j) {
                continue;
            }
            let scaled = if self.beta.is_zero() {
                T::zero()
            } else {
                self.beta * *value
            };
            *value = if self.alpha.is_zero() {
                scaled
            } else {
                let product = self.primitives.dot_product(
                    &self.packed[i * k..(i + 1) * k],
                    &self.packed[j * k..(j + 1) * k],
                );
                scaled + self.alpha * product
            };
        }
    }

    /// Run the update over every major line of `c`
    ///
    /// `c` starts at the first element of C and spans its last line.
    pub fn run(&self, c: &mut [T], ldc: usize, parallel: bool) {
        if self.n == 0 {
            return;
        }
        let region = &mut c[..(self.n - 1) * ldc + self.n];

        #[cfg(feature = "parallel")]
        if parallel {
            use rayon::prelude::*;
            region
                .par_chunks_mut(ldc)
                .enumerate()
                .for_each(|(line, values)| self.update_line(line, values));
            return;
        }
        #[cfg(not(feature = "parallel"))]
        let _ = parallel;

        region
            .chunks_mut(ldc)
            .enumerate()
            .for_each(|(line, values)| self.update_line(line, values));
    }
}
