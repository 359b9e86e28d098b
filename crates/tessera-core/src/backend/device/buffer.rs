//! Device-resident buffers
//!
//! A [`DeviceBuffer`] is a shared handle: cloning it never copies data.
//! Contents are only touched by commands running on a queue, so host code
//! reads them through [`DeviceBuffer::read`], which is itself a queued
//! command.

use super::queue::Queue;
use crate::backend::StatusCode;
use crate::numeric::Numeric;
use crate::{Error, Result};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Handle to a buffer of `T` living on the device
pub struct DeviceBuffer<T: Numeric> {
    id: u64,
    queue_id: u64,
    len: usize,
    data: Arc<RwLock<Vec<T>>>,
}

impl<T: Numeric> Clone for DeviceBuffer<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            queue_id: self.queue_id,
            len: self.len,
            data: Arc::clone(&self.data),
        }
    }
}

impl<T: Numeric> std::fmt::Debug for DeviceBuffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceBuffer")
            .field("id", &self.id)
            .field("queue", &self.queue_id)
            .field("len", &self.len)
            .field("type", &T::NAME)
            .finish()
    }
}

impl<T: Numeric> DeviceBuffer<T> {
    /// Allocate a zero-filled buffer
    pub fn zeros(queue: &Queue, len: usize) -> Self {
        Self::from_vec(queue, vec![T::zero(); len])
    }

    /// Move host data into a new device buffer
    pub fn from_vec(queue: &Queue, data: Vec<T>) -> Self {
        Self {
            id: queue.next_buffer_id(),
            queue_id: queue.id(),
            len: data.len(),
            data: Arc::new(RwLock::new(data)),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Id of the queue the buffer was created on
    pub fn queue_id(&self) -> u64 {
        self.queue_id
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether both handles refer to the same allocation
    pub fn same_buffer(&self, other: &DeviceBuffer<T>) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Copy the contents back to the host
    ///
    /// The copy is queued behind every command submitted before it and the
    /// call blocks until it has run.
    pub fn read(&self, queue: &Queue) -> Result<Vec<T>> {
        if self.queue_id != queue.id() {
            return Err(Error::backend_call("read_buffer", StatusCode::InvalidQueue));
        }
        let slot = Arc::new(Mutex::new(None));
        let out = Arc::clone(&slot);
        let source = self.clone();
        let event = queue.enqueue("read_buffer", move || match source.lock_read() {
            Ok(data) => {
                *out.lock().unwrap_or_else(PoisonError::into_inner) = Some(data.clone());
                StatusCode::Success
            }
            Err(status) => status,
        })?;

        match event.wait() {
            StatusCode::Success => {
                let data = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
                data.ok_or_else(|| Error::backend_call("read_buffer", StatusCode::InternalError))
            }
            status => Err(Error::backend_call("read_buffer", status)),
        }
    }

    /// Shared access for a command running on the queue
    pub fn lock_read(&self) -> std::result::Result<RwLockReadGuard<'_, Vec<T>>, StatusCode> {
        self.data.read().map_err(|_| StatusCode::InternalError)
    }

    /// Exclusive access for a command running on the queue
    pub fn lock_write(&self) -> std::result::Result<RwLockWriteGuard<'_, Vec<T>>, StatusCode> {
        self.data.write().map_err(|_| StatusCode::InternalError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_through_queue() {
        let queue = Queue::with_defaults().unwrap();
        let buffer = DeviceBuffer::from_vec(&queue, vec![1.0f32, 2.0, 3.0]);
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.read(&queue).unwrap(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_read_is_ordered_after_writes() {
        let queue = Queue::with_defaults().unwrap();
        let buffer = DeviceBuffer::<i32>::zeros(&queue, 4);
        let target = buffer.clone();
        queue
            .enqueue("fill", move || match target.lock_write() {
                Ok(mut data) => {
                    data.iter_mut().for_each(|x| *x = 9);
                    StatusCode::Success
                }
                Err(status) => status,
            })
            .unwrap();

        // No explicit wait: the read is queued behind the fill
        assert_eq!(buffer.read(&queue).unwrap(), vec![9; 4]);
    }

    #[test]
    fn test_read_through_foreign_queue_fails() {
        let home = Queue::with_defaults().unwrap();
        let other = Queue::with_defaults().unwrap();
        let buffer = DeviceBuffer::from_vec(&home, vec![1u32, 2]);
        assert!(matches!(
            buffer.read(&other),
            Err(Error::BackendCall { status: StatusCode::InvalidQueue, .. })
        ));
        assert_eq!(other.submitted(), 0);
    }

    #[test]
    fn test_handles_share_allocation() {
        let queue = Queue::with_defaults().unwrap();
        let a = DeviceBuffer::<f64>::zeros(&queue, 2);
        let b = a.clone();
        let c = DeviceBuffer::<f64>::zeros(&queue, 2);
        assert!(a.same_buffer(&b));
        assert!(!a.same_buffer(&c));
        assert_ne!(a.id(), c.id());
    }
}
