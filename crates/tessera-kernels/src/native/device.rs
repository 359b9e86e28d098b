//! Device library routines
//!
//! Each routine validates its arguments on the calling thread and enqueues
//! the computation on the given queue. Arguments are checked the way a
//! native BLAS does it, so a bad call fails with a status code before
//! anything reaches the queue.

use super::{pack_op_a, validate_inner_product, validate_syrk, SyrkPlan};
use crate::primitives::{DotPrimitives, SelectPrimitives};
use std::sync::{Arc, Mutex, PoisonError};
use tessera_core::{DeviceBuffer, Event, Layout, Queue, StatusCode, Transpose, Triangle};
use tracing::trace;

fn check_queue<T: tessera_core::Numeric>(queue: &Queue, buffer: &DeviceBuffer<T>) -> StatusCode {
    if queue.is_open() && buffer.queue_id() == queue.id() {
        StatusCode::Success
    } else {
        StatusCode::InvalidQueue
    }
}

/// Enqueue `C <- alpha * op(A) * op(A)ᵀ + beta * C` on one triangle of C
///
/// Returns the event of the enqueued command. C is written when the
/// command runs, after every command submitted to `queue` before it.
#[allow(clippy::too_many_arguments)]
pub fn syrk<T: SelectPrimitives>(
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
    c: &DeviceBuffer<T>,
    c_offset: usize,
    ldc: usize,
    queue: &Queue,
) -> Result<Event, StatusCode> {
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
        return Err(status);
    }
    for status in [check_queue(queue, a), check_queue(queue, c)] {
        if !status.is_success() {
            return Err(status);
        }
    }

    let source = a.clone();
    let target = c.clone();
    queue
        .enqueue("syrk", move || {
            // Packing copies A, so the write lock on C never overlaps a read
            // lock on the same allocation.
            let packed = match source.lock_read() {
                Ok(data) => pack_op_a(layout, transpose, n, k, &data, a_offset, lda),
                Err(status) => return status,
            };
            let mut data = match target.lock_write() {
                Ok(data) => data,
                Err(status) => return status,
            };
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
            trace!(n, k, primitives = plan.primitives.backend_name(), "device syrk");
            plan.run(&mut data[c_offset..], ldc, false);
            StatusCode::Success
        })
        .map_err(|_| StatusCode::InvalidQueue)
}

/// Strided inner product of `n` elements, computed on the queue
///
/// Blocks until the reduction has run, so the result reflects every
/// command submitted before it.
#[allow(clippy::too_many_arguments)]
pub fn inner_product<T: SelectPrimitives>(
    n: usize,
    x: &DeviceBuffer<T>,
    x_offset: usize,
    incx: usize,
    y: &DeviceBuffer<T>,
    y_offset: usize,
    incy: usize,
    queue: &Queue,
) -> Result<T, StatusCode> {
    let status = validate_inner_product(n, x.len(), x_offset, incx, y.len(), y_offset, incy);
    if !status.is_success() {
        return Err(status);
    }
    for status in [check_queue(queue, x), check_queue(queue, y)] {
        if !status.is_success() {
            return Err(status);
        }
    }

    let slot = Arc::new(Mutex::new(None));
    let out = Arc::clone(&slot);
    let (x, y) = (x.clone(), y.clone());
    let event = queue
        .enqueue("inner_product", move || {
            let (x_data, y_data) = match (x.lock_read(), y.lock_read()) {
                (Ok(x_data), Ok(y_data)) => (x_data, y_data),
                (Err(status), _) | (_, Err(status)) => return status,
            };
            let value =
                T::primitives().dot_strided(n, &x_data, x_offset, incx, &y_data, y_offset, incy);
            *out.lock().unwrap_or_else(PoisonError::into_inner) = Some(value);
            StatusCode::Success
        })
        .map_err(|_| StatusCode::InvalidQueue)?;

    match event.wait() {
        StatusCode::Success => slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(StatusCode::InternalError),
        status => Err(status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_syrk_runs_on_queue() {
        let queue = Queue::with_defaults().unwrap();
        // A = [[1, 2], [3, 4]] row-major
        let a = DeviceBuffer::from_vec(&queue, vec![1.0f64, 2.0, 3.0, 4.0]);
        let c = DeviceBuffer::from_vec(&queue, vec![1.0f64; 4]);
        let event = syrk(
            Layout::RowMajor,
            Triangle::Upper,
            Transpose::No,
            2,
            2,
            1.0,
            &a,
            0,
            2,
            1.0,
            &c,
            0,
            2,
            &queue,
        )
        .unwrap();
        assert_eq!(event.wait(), StatusCode::Success);
        assert_eq!(c.read(&queue).unwrap(), vec![6.0, 12.0, 1.0, 26.0]);
    }

    #[test]
    fn test_device_syrk_rejects_foreign_buffers() {
        let queue = Queue::with_defaults().unwrap();
        let other = Queue::with_defaults().unwrap();
        let a = DeviceBuffer::from_vec(&other, vec![1.0f32; 4]);
        let c = DeviceBuffer::from_vec(&queue, vec![0.0f32; 4]);
        let err = syrk(
            Layout::RowMajor,
            Triangle::Lower,
            Transpose::No,
            2,
            2,
            1.0,
            &a,
            0,
            2,
            1.0,
            &c,
            0,
            2,
            &queue,
        )
        .unwrap_err();
        assert_eq!(err, StatusCode::InvalidQueue);
        assert_eq!(queue.submitted(), 0);
    }

    #[test]
    fn test_device_syrk_aliasing_buffers() {
        // A and C share one allocation: A in the first 2 elements, C after
        let queue = Queue::with_defaults().unwrap();
        let buffer = DeviceBuffer::from_vec(&queue, vec![1i32, 2, 0, 0, 0, 0]);
        let event = syrk(
            Layout::ColumnMajor,
            Triangle::Lower,
            Transpose::No,
            2,
            1,
            1,
            &buffer,
            0,
            2,
            1,
            &buffer,
            2,
            2,
            &queue,
        )
        .unwrap();
        assert_eq!(event.wait(), StatusCode::Success);
        // A·Aᵀ = [[1, 2], [2, 4]] column-major, lower half
        assert_eq!(buffer.read(&queue).unwrap(), vec![1, 2, 1, 2, 0, 4]);
    }

    #[test]
    fn test_device_inner_product_orders_after_writes() {
        let queue = Queue::with_defaults().unwrap();
        let x = DeviceBuffer::from_vec(&queue, vec![1.0f64, 2.0, 3.0]);
        let target = x.clone();
        queue
            .enqueue("double", move || {
                let Ok(mut data) = target.lock_write() else {
                    return StatusCode::InternalError;
                };
                data.iter_mut().for_each(|v| *v *= 2.0);
                StatusCode::Success
            })
            .unwrap();
        // Sees the doubled values: 2*1 + 4*2 + 6*3
        assert_eq!(inner_product(3, &x, 0, 1, &x, 0, 1, &queue), Ok(56.0));
        assert_eq!(inner_product(0, &x, 0, 1, &x, 0, 1, &queue), Ok(0.0));
    }

    #[test]
    fn test_device_inner_product_validates() {
        let queue = Queue::with_defaults().unwrap();
        let x = DeviceBuffer::from_vec(&queue, vec![1u32; 3]);
        let y = DeviceBuffer::from_vec(&queue, vec![1u32; 2]);
        assert_eq!(
            inner_product(3, &x, 0, 1, &y, 0, 1, &queue),
            Err(StatusCode::InsufficientMemoryB)
        );
        queue.shutdown();
        assert_eq!(
            inner_product(2, &x, 0, 1, &y, 0, 1, &queue),
            Err(StatusCode::InvalidQueue)
        );
    }
}
