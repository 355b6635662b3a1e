use arc_swap::ArcSwapOption;
use mpmcbuf::{MpmcBufError, Queue};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Samples,
    Events,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::Samples => f.write_str("sample"),
            StreamKind::Events => f.write_str("event"),
        }
    }
}

/// One buffered stream of a buffer instance.
///
/// Dispatch only reaches the queue while `active` is set. The queue slot is
/// swapped atomically, so a dispatch that loaded the queue right before it is
/// deleted still pushes into live memory.
pub(crate) struct Stream<T> {
    kind: StreamKind,
    active: AtomicBool,
    queue: ArcSwapOption<Queue<T>>,
    dropped: AtomicU64,
}

impl<T> Stream<T> {
    pub(crate) fn new(kind: StreamKind) -> Self {
        Stream {
            kind,
            active: AtomicBool::new(false),
            queue: ArcSwapOption::empty(),
            dropped: AtomicU64::new(0),
        }
    }

    /// Dispatch entry point. Never blocks; a full queue drops `value`.
    #[inline]
    pub(crate) fn offer(&self, value: T) {
        if !self.active.load(Ordering::Acquire) {
            return;
        }
        let queue = self.queue.load();
        if let Some(queue) = &*queue {
            if queue.push(value).is_err() {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                trace!(stream = %self.kind, dropped, "queue full, dropping newest");
            }
        }
    }

    /// Creates the queue unless one already exists. Returns whether a new
    /// queue was allocated.
    pub(crate) fn ensure_queue(&self, capacity: usize) -> Result<bool, MpmcBufError> {
        if self.queue.load().is_some() {
            return Ok(false);
        }
        self.queue.store(Some(Arc::new(Queue::with_capacity(capacity)?)));
        Ok(true)
    }

    pub(crate) fn take_queue(&self) -> Option<Arc<Queue<T>>> {
        self.queue.swap(None)
    }

    /// Returns the previous state.
    pub(crate) fn set_active(&self, active: bool) -> bool {
        self.active.swap(active, Ordering::AcqRel)
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub(crate) fn drain(&self) -> Vec<T> {
        match self.queue.load_full() {
            Some(queue) => queue.drain().collect(),
            None => Vec::new(),
        }
    }

    pub(crate) fn clear(&self) -> usize {
        match self.queue.load_full() {
            Some(queue) => queue.drain().count(),
            None => 0,
        }
    }

    pub(crate) fn pending(&self) -> usize {
        self.queue.load().as_deref().map_or(0, Queue::len)
    }

    pub(crate) fn capacity(&self) -> Option<usize> {
        self.queue.load().as_deref().map(Queue::capacity)
    }

    pub(crate) fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
