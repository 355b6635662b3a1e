//! # sensorbuf - Fan-out Buffering for Driver-Pushed Sensor Streams
//!
//! A device driver delivers samples and discrete events by invoking one
//! process-wide callback per stream kind, on its own threads, at its own pace.
//! `sensorbuf` decouples that producer from any number of consumers:
//!
//! - each [`BufferInstance`] owns a bounded lock-free queue per stream,
//! - a [`Registry`] tracks live instances behind a reader-writer lock,
//! - stateless trampolines installed with the driver copy every payload into
//!   every buffering instance's queue.
//!
//! The driver thread never blocks on a consumer. When a queue is full the
//! newest payload is dropped for that instance and counted.
//!
//! ## Buffering Samples
//!
//! ```rust
//! use sensorbuf::sim::{synthetic_sample, SimDriver};
//! use sensorbuf::BufferInstance;
//! use std::sync::Arc;
//!
//! sensorbuf::registry!(static REGISTRY);
//!
//! let driver = Arc::new(SimDriver::new());
//! let buffer = BufferInstance::with_registry(driver.clone(), &REGISTRY);
//!
//! buffer.start_sample_buffering_with_capacity(1024)?;
//! driver.emit_sample(synthetic_sample(0));
//! driver.emit_sample(synthetic_sample(1));
//!
//! let samples = buffer.get_samples();
//! assert_eq!(samples, vec![synthetic_sample(0), synthetic_sample(1)]);
//! # Ok::<(), sensorbuf::SensorBufError>(())
//! ```
//!
//! ## Several Consumers
//!
//! Every instance receives its own copy of each payload:
//!
//! ```rust
//! # use sensorbuf::sim::{synthetic_event, SimDriver};
//! # use sensorbuf::BufferInstance;
//! # use std::sync::Arc;
//! # sensorbuf::registry!(static REGISTRY);
//! # let driver = Arc::new(SimDriver::new());
//! let recorder = BufferInstance::with_registry(driver.clone(), &REGISTRY);
//! let monitor = BufferInstance::with_registry(driver.clone(), &REGISTRY);
//! recorder.start_event_buffering_with_capacity(64)?;
//! monitor.start_event_buffering_with_capacity(64)?;
//!
//! driver.emit_event(synthetic_event(7));
//!
//! assert_eq!(recorder.get_events(), vec![synthetic_event(7)]);
//! assert_eq!(monitor.get_events(), vec![synthetic_event(7)]);
//! # Ok::<(), sensorbuf::SensorBufError>(())
//! ```
//!
//! ## Stopping
//!
//! `stop_*_buffering(false)` keeps unread data for a later `get_*` or a
//! restart; `stop_*_buffering(true)` discards the queue. Dropping an instance
//! stops both streams and removes it from the registry.
//!
//! ## Real Drivers
//!
//! Implement [`Driver`] over the vendor's registration functions and use
//! [`BufferInstance::new`], which attaches to the process-wide registry whose
//! entry points are [`sample_trampoline`] and [`event_trampoline`].

pub use config::{BufferConfig, Config};
pub use driver::{Driver, EventCallback, SampleCallback, RET_SUCCESS};
pub use error::{Result, SensorBufError};
pub use instance::BufferInstance;
pub use payload::{ChannelData, DiscreteEvent, SampleEvent};
pub use registry::{event_trampoline, sample_trampoline, Registry, Trampolines};
pub use stream::StreamKind;

pub mod config;
pub mod driver;
pub mod error;
pub(crate) mod instance;
pub mod payload;
pub(crate) mod registry;
pub mod sim;
pub(crate) mod stream;
