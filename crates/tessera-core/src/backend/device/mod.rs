//! Device backend: one in-order compute queue per context
//!
//! Buffers live behind [`DeviceBuffer`] handles and are only touched by
//! commands running on a [`Queue`]. Issuing work never blocks the calling
//! thread; host-side reads go through the queue and therefore observe every
//! command submitted before them.

mod buffer;
mod queue;

pub use buffer::DeviceBuffer;
pub use queue::{Event, EventStatus, Queue, QueueConfig};

use super::{scale_region, Backend, BackendKind, Completion, StatusCode};
use crate::numeric::Numeric;
use crate::storage::{StorageDescriptor, StorageDescriptorMut};
use crate::tags::{sealed, Orientation};
use crate::{Error, Result};
use tracing::warn;

/// Device execution backend tag
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Device;

impl sealed::Sealed for Device {}

impl Backend for Device {
    const NAME: &'static str = "device";
    const KIND: BackendKind = BackendKind::Device;

    type Context = Queue;
    type Buffer<T: Numeric> = DeviceBuffer<T>;

    fn allocate<T: Numeric>(context: &Queue, len: usize) -> Result<DeviceBuffer<T>> {
        Ok(DeviceBuffer::zeros(context, len))
    }

    fn upload<T: Numeric>(context: &Queue, data: Vec<T>) -> Result<DeviceBuffer<T>> {
        Ok(DeviceBuffer::from_vec(context, data))
    }

    fn download<T: Numeric>(context: &Queue, buffer: &DeviceBuffer<T>) -> Result<Vec<T>> {
        buffer.read(context)
    }

    fn buffer_len<T: Numeric>(buffer: &DeviceBuffer<T>) -> usize {
        buffer.len()
    }

    fn copy_scaled<T: Numeric, OS: Orientation, OD: Orientation>(
        context: &Queue,
        alpha: T,
        src: StorageDescriptor<'_, Self, T, OS>,
        dst: StorageDescriptorMut<'_, Self, T, OD>,
    ) -> Result<Completion> {
        // Both operands must be ordered by the queue that runs the copy
        let foreign = [src.buffer().queue_id(), dst.buffer().queue_id()]
            .into_iter()
            .find(|&id| id != context.id());
        if let Some(queue_id) = foreign {
            warn!(queue = context.id(), buffer_queue = queue_id, "copy_scaled on a foreign buffer");
            return Err(Error::backend_call("copy_scaled", StatusCode::InvalidQueue));
        }

        let (rows, cols) = (src.rows(), src.cols());
        let (src_offset, src_ld) = (src.offset(), src.leading_dimension());
        let (dst_offset, dst_ld) = (dst.offset(), dst.leading_dimension());
        let source = src.buffer().clone();
        let target = dst.buffer().clone();

        let event = context.enqueue("copy_scaled", move || {
            // Snapshot the source when both handles alias one allocation
            let snapshot;
            let guard;
            let src_data: &[T] = if source.same_buffer(&target) {
                snapshot = match source.lock_read() {
                    Ok(data) => data.clone(),
                    Err(status) => return status,
                };
                &snapshot
            } else {
                guard = match source.lock_read() {
                    Ok(data) => data,
                    Err(status) => return status,
                };
                &guard
            };
            let mut dst_data = match target.lock_write() {
                Ok(data) => data,
                Err(status) => return status,
            };
            scale_region::<T, OS, OD>(
                alpha,
                rows,
                cols,
                src_data,
                src_offset,
                src_ld,
                &mut dst_data,
                dst_offset,
                dst_ld,
            );
            StatusCode::Success
        })?;
        Ok(Completion::in_flight(event))
    }
}
