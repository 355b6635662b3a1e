//! # mpmcbuf - Bounded Multi-Producer Multi-Consumer Queue
//!
//! Fixed-capacity ring buffer supporting any number of concurrent producers
//! and consumers. Each slot carries a sequence stamp that hands ownership back
//! and forth between the two sides, so the hot path is a single CAS plus a
//! release store, with no locks.
//!
//! Both operations return immediately. A full queue rejects the new element
//! instead of waiting for space, which makes the queue suitable for producers
//! that must never stall, such as driver callbacks.
//!
//! ## Creating a Queue
//!
//! ```rust
//! use mpmcbuf::Queue;
//!
//! let queue: Queue<u32> = Queue::with_capacity(1000)?;
//! assert_eq!(queue.capacity(), 1024); // rounded up to a power of two
//! # Ok::<(), mpmcbuf::MpmcBufError>(())
//! ```
//!
//! ## Pushing
//!
//! ```rust
//! # use mpmcbuf::Queue;
//! let queue = Queue::with_capacity(2)?;
//! assert!(queue.push(1).is_ok());
//! assert!(queue.push(2).is_ok());
//!
//! // Full: the rejected value is handed back.
//! assert_eq!(queue.push(3), Err(3));
//! # Ok::<(), mpmcbuf::MpmcBufError>(())
//! ```
//!
//! ## Draining
//!
//! ```rust
//! # use mpmcbuf::Queue;
//! let queue = Queue::with_capacity(8)?;
//! for i in 0..5 {
//!     let _ = queue.push(i);
//! }
//!
//! let first = queue.pop();
//! let rest: Vec<_> = queue.drain().collect();
//! assert_eq!(first, Some(0));
//! assert_eq!(rest, vec![1, 2, 3, 4]);
//! # Ok::<(), mpmcbuf::MpmcBufError>(())
//! ```
//!
//! ## Ordering
//!
//! Values pushed by one thread are popped in the order they were pushed.
//! No ordering is defined between values pushed by different threads.

pub use error::MpmcBufError;
pub use queue::{Drain, Queue};

pub(crate) mod common;
pub mod error;
#[cfg(all(test, feature = "loom"))]
pub(crate) mod loom;
pub(crate) mod queue;
pub(crate) mod sync;
mod trace_macro;
