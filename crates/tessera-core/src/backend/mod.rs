//! Execution backends
//!
//! A backend is a zero-size tag ([`Host`] or [`Device`]) that fixes, at
//! compile time, where buffers live, which execution context accompanies
//! them and how basic data movement is carried out. Kernels are specialized
//! per backend through traits implemented for exactly these two tags.

pub mod device;
pub mod host;
mod status;

pub use device::{Device, DeviceBuffer, Event, EventStatus, Queue, QueueConfig};
pub use host::{ExecutionStrategy, Host, HostContext};
pub use status::StatusCode;

use crate::numeric::Numeric;
use crate::storage::{StorageDescriptor, StorageDescriptorMut};
use crate::tags::{sealed, Orientation};
use crate::{Error, Result};
use std::fmt::Debug;

/// Identifies the backend a buffer or expression belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Host,
    Device,
}

/// Compile-time execution backend
pub trait Backend: sealed::Sealed + Copy + Default + Debug + Send + Sync + 'static {
    /// Name used in log output
    const NAME: &'static str;

    const KIND: BackendKind;

    /// Execution context carried by every expression of this backend
    type Context: Clone + Debug + Send + Sync;

    /// Backend-native buffer handle
    type Buffer<T: Numeric>: Debug + Send + Sync;

    /// Allocate a zero-filled buffer of `len` elements
    fn allocate<T: Numeric>(context: &Self::Context, len: usize) -> Result<Self::Buffer<T>>;

    /// Move host data into a backend buffer
    fn upload<T: Numeric>(context: &Self::Context, data: Vec<T>) -> Result<Self::Buffer<T>>;

    /// Copy a buffer back to host memory, ordered after pending work
    fn download<T: Numeric>(context: &Self::Context, buffer: &Self::Buffer<T>) -> Result<Vec<T>>;

    /// Number of elements in a buffer
    fn buffer_len<T: Numeric>(buffer: &Self::Buffer<T>) -> usize;

    /// `dst <- alpha * src` over two regions of equal shape
    fn copy_scaled<T: Numeric, OS: Orientation, OD: Orientation>(
        context: &Self::Context,
        alpha: T,
        src: StorageDescriptor<'_, Self, T, OS>,
        dst: StorageDescriptorMut<'_, Self, T, OD>,
    ) -> Result<Completion>;
}

/// Handle for an issued operation
///
/// Host operations are complete when the call returns. Device operations
/// are in flight on a queue until their event completes; later commands on
/// the same queue are ordered after them without an explicit wait.
#[derive(Clone, Debug)]
pub struct Completion {
    event: Option<Event>,
}

impl Completion {
    /// An operation that has already finished
    pub fn ready() -> Self {
        Self { event: None }
    }

    /// An operation running on a device queue
    pub fn in_flight(event: Event) -> Self {
        Self { event: Some(event) }
    }

    pub fn event(&self) -> Option<&Event> {
        self.event.as_ref()
    }

    /// Poll without blocking
    pub fn is_complete(&self) -> bool {
        self.event.as_ref().map_or(true, Event::is_complete)
    }

    /// Block until the operation has run and surface its status
    pub fn wait(self) -> Result<()> {
        match self.event {
            None => Ok(()),
            Some(event) => match event.wait() {
                StatusCode::Success => Ok(()),
                status => Err(Error::backend_call(event.label(), status)),
            },
        }
    }
}

/// `dst[i, j] = alpha * src[i, j]` for raw regions of a `rows x cols` matrix
#[allow(clippy::too_many_arguments)]
pub(crate) fn scale_region<T: Numeric, OS: Orientation, OD: Orientation>(
    alpha: T,
    rows: usize,
    cols: usize,
    src: &[T],
    src_offset: usize,
    src_ld: usize,
    dst: &mut [T],
    dst_offset: usize,
    dst_ld: usize,
) {
    for i in 0..rows {
        for j in 0..cols {
            let value = src[src_offset + OS::index(i, j, src_ld)];
            dst[dst_offset + OD::index(i, j, dst_ld)] = alpha * value;
        }
    }
}
