use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::config::BufferConfig;
use crate::driver::Driver;
use crate::payload::{DiscreteEvent, SampleEvent};
use crate::registry::{Registry, Subscriber};
use crate::stream::{Stream, StreamKind};
use crate::Result;

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// Buffers the driver's sample and event streams for one consumer.
///
/// Each stream is either stopped or buffering, independently of the other.
/// While buffering, every payload the driver pushes is copied into this
/// instance's queue; consumers drain it with [`get_samples`] and
/// [`get_events`] from any thread.
///
/// [`get_samples`]: BufferInstance::get_samples
/// [`get_events`]: BufferInstance::get_events
pub struct BufferInstance {
    subscriber: Arc<Subscriber>,
    registry: &'static Registry,
    driver: Arc<dyn Driver>,
    config: BufferConfig,
    lifecycle: Mutex<()>,
}

impl BufferInstance {
    /// Creates an instance attached to the process-wide registry.
    pub fn new(driver: Arc<dyn Driver>) -> Self {
        Self::with_registry(driver, Registry::global())
    }

    pub fn with_registry(driver: Arc<dyn Driver>, registry: &'static Registry) -> Self {
        Self::with_config(driver, registry, BufferConfig::default())
    }

    pub fn with_config(
        driver: Arc<dyn Driver>,
        registry: &'static Registry,
        config: BufferConfig,
    ) -> Self {
        let id = NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed);
        let subscriber = Arc::new(Subscriber::new(id));
        registry.register(subscriber.clone());

        BufferInstance {
            subscriber,
            registry,
            driver,
            config,
            lifecycle: Mutex::new(()),
        }
    }

    pub fn id(&self) -> u64 {
        self.subscriber.id
    }

    pub fn start_sample_buffering(&self) -> Result<()> {
        self.start_sample_buffering_with_capacity(self.config.sample_capacity)
    }

    /// Starts buffering samples. An existing queue is reused as is, in which
    /// case `capacity` is ignored.
    ///
    /// Fails with [`SensorBufError::DriverMismatch`] if other instances of the
    /// registry are buffering samples through a different driver.
    ///
    /// [`SensorBufError::DriverMismatch`]: crate::SensorBufError::DriverMismatch
    pub fn start_sample_buffering_with_capacity(&self, capacity: usize) -> Result<()> {
        self.start(&self.subscriber.samples, StreamKind::Samples, capacity)
    }

    pub fn start_event_buffering(&self) -> Result<()> {
        self.start_event_buffering_with_capacity(self.config.event_capacity)
    }

    /// Starts buffering events. An existing queue is reused as is, in which
    /// case `capacity` is ignored.
    pub fn start_event_buffering_with_capacity(&self, capacity: usize) -> Result<()> {
        self.start(&self.subscriber.events, StreamKind::Events, capacity)
    }

    /// Stops receiving samples. Once this returns no further sample reaches
    /// the queue. With `delete_buffer`, unread samples are discarded together
    /// with the queue.
    pub fn stop_sample_buffering(&self, delete_buffer: bool) {
        self.stop(&self.subscriber.samples, StreamKind::Samples, delete_buffer);
    }

    pub fn stop_event_buffering(&self, delete_buffer: bool) {
        self.stop(&self.subscriber.events, StreamKind::Events, delete_buffer);
    }

    pub fn clear_sample_buffer(&self) {
        let discarded = self.subscriber.samples.clear();
        debug!(instance = self.id(), discarded, "cleared sample buffer");
    }

    pub fn clear_event_buffer(&self) {
        let discarded = self.subscriber.events.clear();
        debug!(instance = self.id(), discarded, "cleared event buffer");
    }

    /// Drains every buffered sample, oldest first.
    pub fn get_samples(&self) -> Vec<SampleEvent> {
        self.subscriber.samples.drain()
    }

    /// Drains every buffered event, oldest first.
    pub fn get_events(&self) -> Vec<DiscreteEvent> {
        self.subscriber.events.drain()
    }

    pub fn is_sample_buffering(&self) -> bool {
        self.subscriber.samples.is_active()
    }

    pub fn is_event_buffering(&self) -> bool {
        self.subscriber.events.is_active()
    }

    pub fn pending_samples(&self) -> usize {
        self.subscriber.samples.pending()
    }

    pub fn pending_events(&self) -> usize {
        self.subscriber.events.pending()
    }

    /// Samples discarded because the queue was full.
    pub fn dropped_samples(&self) -> u64 {
        self.subscriber.samples.dropped()
    }

    /// Events discarded because the queue was full.
    pub fn dropped_events(&self) -> u64 {
        self.subscriber.events.dropped()
    }

    pub fn sample_capacity(&self) -> Option<usize> {
        self.subscriber.samples.capacity()
    }

    pub fn event_capacity(&self) -> Option<usize> {
        self.subscriber.events.capacity()
    }

    fn start<T>(&self, stream: &Stream<T>, kind: StreamKind, capacity: usize) -> Result<()> {
        let _guard = self.lifecycle.lock();
        if stream.is_active() {
            return Ok(());
        }

        let created = stream.ensure_queue(capacity)?;
        self.registry.subscribe(kind, &self.driver)?;
        stream.set_active(true);

        debug!(
            instance = self.id(),
            stream = %kind,
            capacity = stream.capacity(),
            created,
            "buffering started"
        );
        Ok(())
    }

    fn stop<T>(&self, stream: &Stream<T>, kind: StreamKind, delete_buffer: bool) {
        let _guard = self.lifecycle.lock();
        if stream.set_active(false) {
            self.registry.unsubscribe(kind);
            self.registry.quiesce();
            debug!(instance = self.id(), stream = %kind, "buffering stopped");
        }
        if delete_buffer {
            if let Some(queue) = stream.take_queue() {
                debug!(
                    instance = self.id(),
                    stream = %kind,
                    discarded = queue.len(),
                    "buffer deleted"
                );
            }
        }
    }
}

impl Drop for BufferInstance {
    fn drop(&mut self) {
        self.stop_sample_buffering(false);
        self.stop_event_buffering(false);
        self.registry.deregister(self.subscriber.id);
        self.stop_sample_buffering(true);
        self.stop_event_buffering(true);
    }
}
