//! In-order command queue and completion events
//!
//! A [`Queue`] owns one worker thread that executes submitted commands in
//! submission order. Submission never blocks on execution (unless a bounded
//! capacity is configured and full); ordering with host-side reads is only
//! guaranteed through [`Event::wait`] or [`Queue::finish`].
//!
//! # Thread Safety
//!
//! `Queue` is a cheap handle around shared state and can be cloned into
//! several expressions. Commands from all clones land on the same worker,
//! so commands issued to one queue never overlap.

use crate::backend::StatusCode;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, SyncSender};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::{debug, trace, warn};

/// Queue construction parameters
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Name of the worker thread, also used in log output
    pub label: String,
    /// Maximum number of commands waiting for execution; `None` is unbounded
    pub capacity: Option<usize>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            label: "tessera-device-queue".to_string(),
            capacity: None,
        }
    }
}

impl QueueConfig {
    /// Set the worker label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Bound the number of pending commands
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }
}

/// Execution state of a submitted command
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventStatus {
    Queued,
    Running,
    Complete(StatusCode),
}

#[derive(Debug)]
struct EventInner {
    id: u64,
    label: &'static str,
    state: Mutex<EventStatus>,
    changed: Condvar,
}

/// Completion signal of one queued command
#[derive(Clone, Debug)]
pub struct Event {
    inner: Arc<EventInner>,
}

impl Event {
    fn new(id: u64, label: &'static str) -> Self {
        Self {
            inner: Arc::new(EventInner {
                id,
                label,
                state: Mutex::new(EventStatus::Queued),
                changed: Condvar::new(),
            }),
        }
    }

    /// Submission index on the owning queue
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Name of the command this event belongs to
    pub fn label(&self) -> &'static str {
        self.inner.label
    }

    /// Current state, without blocking
    pub fn status(&self) -> EventStatus {
        *self
            .inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.status(), EventStatus::Complete(_))
    }

    /// Block until the command has run and return its status
    pub fn wait(&self) -> StatusCode {
        let mut state = self
            .inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        loop {
            if let EventStatus::Complete(code) = *state {
                return code;
            }
            state = self
                .inner
                .changed
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn set(&self, status: EventStatus) {
        let mut state = self
            .inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *state = status;
        self.inner.changed.notify_all();
    }
}

type Work = Box<dyn FnOnce() -> StatusCode + Send + 'static>;

struct Command {
    work: Work,
    event: Event,
}

enum Submitter {
    Unbounded(Sender<Command>),
    Bounded(SyncSender<Command>),
}

impl Submitter {
    fn send(&self, command: Command) -> std::result::Result<(), Command> {
        match self {
            Submitter::Unbounded(tx) => tx.send(command).map_err(|e| e.0),
            Submitter::Bounded(tx) => tx.send(command).map_err(|e| e.0),
        }
    }
}

struct QueueInner {
    id: u64,
    config: QueueConfig,
    submitter: Mutex<Option<Submitter>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    next_command: AtomicU64,
    next_buffer: AtomicU64,
}

impl Drop for QueueInner {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain and exit
        self.submitter
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = self
            .worker
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}

static NEXT_QUEUE_ID: AtomicU64 = AtomicU64::new(0);

/// Single in-order compute queue of the device backend
#[derive(Clone)]
pub struct Queue {
    inner: Arc<QueueInner>,
}

impl std::fmt::Debug for Queue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Queue")
            .field("id", &self.inner.id)
            .field("label", &self.inner.config.label)
            .finish()
    }
}

impl Queue {
    /// Create a queue and start its worker thread
    pub fn new(config: QueueConfig) -> Result<Self> {
        let (submitter, receiver) = match config.capacity {
            Some(capacity) => {
                let (tx, rx) = mpsc::sync_channel(capacity);
                (Submitter::Bounded(tx), rx)
            }
            None => {
                let (tx, rx) = mpsc::channel();
                (Submitter::Unbounded(tx), rx)
            }
        };

        let label = config.label.clone();
        let worker = thread::Builder::new()
            .name(label.clone())
            .spawn(move || run_worker(label, receiver))?;

        let id = NEXT_QUEUE_ID.fetch_add(1, Ordering::Relaxed);
        debug!(queue = id, label = %config.label, capacity = ?config.capacity, "device queue started");

        Ok(Self {
            inner: Arc::new(QueueInner {
                id,
                config,
                submitter: Mutex::new(Some(submitter)),
                worker: Mutex::new(Some(worker)),
                next_command: AtomicU64::new(0),
                next_buffer: AtomicU64::new(0),
            }),
        })
    }

    /// Create a queue with default configuration
    pub fn with_defaults() -> Result<Self> {
        Self::new(QueueConfig::default())
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn config(&self) -> &QueueConfig {
        &self.inner.config
    }

    /// Whether both handles refer to the same queue
    pub fn same_queue(&self, other: &Queue) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of commands submitted so far
    pub fn submitted(&self) -> u64 {
        self.inner.next_command.load(Ordering::Acquire)
    }

    pub(crate) fn next_buffer_id(&self) -> u64 {
        self.inner.next_buffer.fetch_add(1, Ordering::Relaxed)
    }

    /// Whether the queue still accepts commands
    pub fn is_open(&self) -> bool {
        self.inner
            .submitter
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Submit a command; it runs after every command submitted before it
    pub fn enqueue<F>(&self, label: &'static str, work: F) -> Result<Event>
    where
        F: FnOnce() -> StatusCode + Send + 'static,
    {
        let guard = self
            .inner
            .submitter
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let submitter = guard
            .as_ref()
            .ok_or_else(|| Error::Queue(format!("queue {} is shut down", self.inner.id)))?;

        let id = self.inner.next_command.fetch_add(1, Ordering::AcqRel);
        let event = Event::new(id, label);
        trace!(queue = self.inner.id, command = id, label, "enqueue");

        submitter
            .send(Command {
                work: Box::new(work),
                event: event.clone(),
            })
            .map_err(|_| Error::Queue(format!("worker of queue {} is gone", self.inner.id)))?;
        Ok(event)
    }

    /// Block until every command submitted so far has run
    pub fn finish(&self) -> Result<()> {
        let marker = self.enqueue("finish", || StatusCode::Success)?;
        match marker.wait() {
            StatusCode::Success => Ok(()),
            status => Err(Error::backend_call("finish", status)),
        }
    }

    /// Stop accepting commands and wait for the pending ones to drain
    pub fn shutdown(&self) {
        self.inner
            .submitter
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let handle = self
            .inner
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.thread().id() != thread::current().id() && handle.join().is_err() {
                warn!(queue = self.inner.id, "device queue worker panicked");
            }
        }
        debug!(queue = self.inner.id, "device queue shut down");
    }
}

fn run_worker(label: String, receiver: Receiver<Command>) {
    for Command { work, event } in receiver {
        event.set(EventStatus::Running);
        let status = panic::catch_unwind(AssertUnwindSafe(work)).unwrap_or_else(|_| {
            warn!(queue = %label, command = event.id(), "command panicked");
            StatusCode::InternalError
        });
        trace!(queue = %label, command = event.id(), label = event.label(), %status, "complete");
        event.set(EventStatus::Complete(status));
    }
}
